use serde::Deserialize;

use crate::model::game_state::{
    Character, CustomizationGate, DialogueLine, MapData, PlayerStatus, Quest, WorldInfo,
};

/// The untrusted decoded turn payload. Structurally a `GameState` minus the
/// sticky fields, but every field is optional: the producer forgets things,
/// and a missing field must never fail the decode. Trust decisions live in
/// the reconciler, not here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryUpdate {
    pub player_status: Option<PlayerStatus>,
    pub characters: Vec<Character>,
    pub quests: Vec<Quest>,
    pub world_info: Vec<WorldInfo>,
    pub game_time: Option<String>,
    pub story: Option<String>,
    pub map_data: Option<MapData>,
    pub dialogue: Vec<DialogueLine>,
    pub allow_character_customization: Option<CustomizationGate>,
    pub casino_available: Option<bool>,
}
