use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::game_state::{EquipSlot, InventoryItem};

/// The player's customized avatar. Feeds portrait generation and the hidden
/// appearance preamble sent with every action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAvatar {
    pub name: String,
    pub pronouns: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    pub appearance_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_url: Option<String>,
    #[serde(default)]
    pub equipped_items: BTreeMap<EquipSlot, InventoryItem>,
}

impl PlayerAvatar {
    /// "head: Iron Helm, weapon: Short Sword" or empty when nothing is worn.
    pub fn equipped_summary(&self) -> String {
        self.equipped_items
            .iter()
            .map(|(slot, item)| format!("{}: {}", slot.as_str(), item.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
