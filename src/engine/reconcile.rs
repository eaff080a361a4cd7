use log::debug;

use crate::model::game_state::{Character, GameState};
use crate::model::update::StoryUpdate;

/// Merges a turn payload into the previous state under per-field trust rules.
///
/// Quests, world info and the map are cumulative ledgers the producer is
/// expected to resend in full every turn. When one of them arrives empty the
/// producer forgot it, so the previous value is retained; treating empty as
/// "cleared" would silently lose world state. No such protection exists for
/// characters, inventory or status effects; those take whatever the payload
/// says, including nothing.
///
/// `resolved_characters` is the update's roster after the portrait merge;
/// the payload's own `characters` field is not consulted here.
pub fn reconcile(
    previous: &GameState,
    update: StoryUpdate,
    resolved_characters: Vec<Character>,
) -> GameState {
    let retained_quests = update.quests.is_empty();
    let retained_world_info = update.world_info.is_empty();

    let quests = if retained_quests {
        previous.quests.clone()
    } else {
        update.quests
    };
    let world_info = if retained_world_info {
        previous.world_info.clone()
    } else {
        update.world_info
    };
    let map_data = match update.map_data {
        Some(map) if !map.locations.is_empty() => map,
        _ => previous.map_data.clone(),
    };

    if retained_quests || retained_world_info {
        debug!(
            "producer omitted cumulative fields (quests: {}, worldInfo: {}); retaining previous",
            retained_quests, retained_world_info
        );
    }

    GameState {
        player_status: update
            .player_status
            .unwrap_or_else(|| previous.player_status.clone()),
        characters: resolved_characters,
        quests,
        world_info,
        game_time: update.game_time.unwrap_or_default(),
        story: update.story.unwrap_or_default(),
        map_data,
        dialogue: update.dialogue,
        allow_character_customization: update.allow_character_customization,
        casino_available: update.casino_available.unwrap_or(false),
        // Sticky: never taken from a turn payload.
        location_image_url: previous.location_image_url.clone(),
    }
}
