use serde::{Deserialize, Serialize};

/// The authoritative per-session game state. Owned by the orchestrator,
/// mutated only through reconciliation, persisted after each completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player_status: PlayerStatus,
    pub characters: Vec<Character>,
    pub quests: Vec<Quest>,
    pub world_info: Vec<WorldInfo>,
    pub game_time: String,
    pub story: String,
    #[serde(default)]
    pub map_data: MapData,
    /// Transient NPC lines for the latest turn only.
    #[serde(default)]
    pub dialogue: Vec<DialogueLine>,
    #[serde(default)]
    pub allow_character_customization: Option<CustomizationGate>,
    #[serde(default)]
    pub casino_available: bool,
    /// Sticky: set once at game start, never taken from a turn payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_image_url: Option<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            player_status: PlayerStatus::default(),
            characters: Vec::new(),
            quests: Vec::new(),
            world_info: Vec::new(),
            game_time: "Day 1, Morning".to_string(),
            story: String::new(),
            map_data: MapData::default(),
            dialogue: Vec::new(),
            allow_character_customization: None,
            casino_available: false,
            location_image_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub health: i32,
    pub resolve: i32,
    pub currency: i64,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    #[serde(default)]
    pub injuries: Vec<Injury>,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            health: 100,
            resolve: 100,
            currency: 0,
            inventory: Vec::new(),
            status_effects: Vec::new(),
            injuries: Vec::new(),
        }
    }
}

/// Item names are not guaranteed unique; equip logic keys by slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equippable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<EquipSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    Head,
    Accessory,
    Weapon,
    Torso,
}

impl EquipSlot {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Accessory => "accessory",
            Self::Weapon => "weapon",
            Self::Torso => "torso",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffect {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: EffectKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Positive,
    #[default]
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Injury {
    pub location: InjuryLocation,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: InjurySeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InjuryLocation {
    Head,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjurySeverity {
    #[default]
    Minor,
    Moderate,
    Critical,
}

/// One known character. Keyed by `name`: exact-case in storage,
/// case-insensitive when matched against narrative text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CharacterStatus,
    #[serde(default)]
    pub known_information: Vec<String>,
    /// Resolved by the portrait resolver; never supplied by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    Friendly,
    Neutral,
    Hostile,
    #[default]
    Unknown,
    Deceased,
}

/// Quests are keyed by `title`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub title: String,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInfo {
    pub topic: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    #[serde(default)]
    pub locations: Vec<MapLocation>,
    #[serde(default)]
    pub connections: Vec<MapConnection>,
}

/// Map locations are keyed by `id`; at most one carries `is_current`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<LocationKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Settlement,
    Dungeon,
    Landmark,
    Natural,
    Interior,
    Poi,
}

/// Unordered pair of location ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConnection {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    pub character_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationGate {
    pub enabled: bool,
    #[serde(default)]
    pub reason: String,
}
