use serde_json::{json, Value};

use crate::model::avatar::PlayerAvatar;
use crate::model::message::{Author, StoryMessage};

/// Fixed instruction sent with every turn. The producer is told to answer in
/// JSON matching [`response_field_shape`], to keep dialogue out of the story
/// text, and to resend the cumulative ledgers (quests, world info, map) in
/// full each turn.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a text-based adventure game master.
- You must always respond with a single JSON object following the provided schema.
- The user input is ALWAYS an action, never dialogue. NEVER create dialogue for the player character; the 'dialogue' array is for NPCs only.
- The 'story' field contains only narration. All spoken lines go into the 'dialogue' array as objects with 'characterName' and 'text'.
- Update 'playerStatus' (health 0-100, resolve 0-100, currency, inventory, statusEffects, injuries) as the story progresses. When health reaches 0, the game is over.
- When updating quests, injuries, worldInfo or mapData you MUST include all previously established entries, not just the changed ones.
- Every time the player enters a new area, add it to 'mapData.locations' with a unique id, 0-100 x/y coordinates, a 'type' from: settlement, dungeon, landmark, natural, interior, poi, and set 'isCurrent' on exactly one location. Record travel between known locations in 'mapData.connections'.
- In the story text, wrap significant moments in tags: [EVENT: ...] for major turning points, [DISCOVERY: ...] for pivotal finds, [COMBAT: ...] for the start of a conflict, [LOCATION: ...] for a new key area.
- Do not wrap character names in tags like [CHARACTER: ...]; state them plainly.
- When a new character is introduced, give a rich physical description suitable for portrait generation. If a character dies, set their status to 'deceased'.
- If the player can change their appearance, include 'allowCharacterCustomization' with 'enabled' and 'reason'. If gambling is available, set 'casinoAvailable' to true.
- Keep 'gameTime' descriptive and consistent, e.g. 'Day 3, Dusk'.
";

/// The turn payload field shape, sent to the producer alongside the system
/// instruction so it knows which keys to emit.
pub fn response_field_shape() -> Value {
    json!({
        "type": "object",
        "properties": {
            "story": { "type": "string" },
            "gameTime": { "type": "string" },
            "playerStatus": {
                "type": "object",
                "properties": {
                    "health": { "type": "integer" },
                    "resolve": { "type": "integer" },
                    "currency": { "type": "integer" },
                    "inventory": { "type": "array" },
                    "statusEffects": { "type": "array" },
                    "injuries": { "type": "array" }
                }
            },
            "characters": { "type": "array" },
            "quests": { "type": "array" },
            "worldInfo": { "type": "array" },
            "dialogue": { "type": "array" },
            "allowCharacterCustomization": { "type": "object" },
            "casinoAvailable": { "type": "boolean" },
            "mapData": {
                "type": "object",
                "properties": {
                    "locations": { "type": "array" },
                    "connections": { "type": "array" }
                }
            }
        },
        "required": ["story", "gameTime", "playerStatus", "characters", "quests", "worldInfo"]
    })
}

/// Hidden system note describing the avatar's current appearance, prefixed
/// to every outgoing action so the producer keeps the narration consistent
/// with what the player looks like.
pub fn character_preamble(avatar: Option<&PlayerAvatar>) -> String {
    let Some(avatar) = avatar else {
        return String::new();
    };

    let mut summary = format!(
        "My character's current appearance is: {}.",
        avatar.appearance_summary
    );
    let equipped = avatar.equipped_summary();
    if !equipped.is_empty() {
        summary.push_str(&format!(" Equipped items: {equipped}."));
    }

    format!(
        "(System Note: This is a note to you, the AI. Do not repeat it to the player. \
         {summary} Ensure the story reflects this current state.)"
    )
}

/// Composes the first action of a brand-new game.
pub fn new_game_prompt(preamble: &str, scenario: &str) -> String {
    let mut prompt = String::new();
    if !preamble.is_empty() {
        prompt.push_str(preamble);
        prompt.push(' ');
    }
    prompt.push_str("Start a new game with this scenario: ");
    prompt.push_str(scenario);
    prompt
}

/// Prefixes a regular action with the appearance preamble.
pub fn turn_prompt(preamble: &str, action: &str) -> String {
    if preamble.is_empty() {
        action.to_string()
    } else {
        format!("{preamble} {action}")
    }
}

/// One prior exchange as the narrative service expects it: thinking
/// placeholders and attributed dialogue lines are dropped, narrator turns are
/// re-wrapped as minimal payloads so the producer sees its own format back.
pub fn history_for_service(history: &[StoryMessage]) -> Vec<(String, String)> {
    history
        .iter()
        .filter(|m| !m.thinking && m.author != Author::Character)
        .map(|m| match m.author {
            Author::User => ("user".to_string(), m.text.clone()),
            _ => (
                "assistant".to_string(),
                json!({ "story": m.text }).to_string(),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game_state::{EquipSlot, InventoryItem};

    #[test]
    fn preamble_mentions_equipped_items() {
        let mut avatar = PlayerAvatar {
            appearance_summary: "A tall figure in a gray coat".into(),
            ..PlayerAvatar::default()
        };
        avatar.equipped_items.insert(
            EquipSlot::Head,
            InventoryItem {
                name: "Iron Helm".into(),
                description: String::new(),
                equippable: Some(true),
                slot: Some(EquipSlot::Head),
            },
        );

        let preamble = character_preamble(Some(&avatar));
        assert!(preamble.contains("A tall figure in a gray coat"));
        assert!(preamble.contains("head: Iron Helm"));
        assert!(preamble.starts_with("(System Note:"));
    }

    #[test]
    fn no_avatar_means_no_preamble() {
        assert!(character_preamble(None).is_empty());
        assert_eq!(turn_prompt("", "Look around"), "Look around");
    }

    #[test]
    fn history_drops_thinking_and_dialogue_lines() {
        let history = vec![
            StoryMessage::user("Open the door"),
            StoryMessage::narrator("The door creaks open."),
            StoryMessage::character("Kara", "Careful now.", None),
            StoryMessage::thinking(),
        ];
        let wire = history_for_service(&history);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0], ("user".to_string(), "Open the door".to_string()));
        assert_eq!(wire[1].0, "assistant");
        assert!(wire[1].1.contains("The door creaks open."));
    }
}
