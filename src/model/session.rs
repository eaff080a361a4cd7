use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::game_state::GameState;
use crate::model::message::StoryMessage;

/// One persisted session record. Written wholesale after every completed
/// turn; `last_played` orders the load-game list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub title: String,
    pub last_played: DateTime<Utc>,
    pub game_state: GameState,
    pub history: Vec<StoryMessage>,
    #[serde(default)]
    pub time_played: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_title: Option<String>,
}

impl GameSession {
    /// Session ids only need to be unique per store; wall-clock millis plus
    /// a random suffix is enough.
    pub fn new_id() -> String {
        format!("{}-{:04x}", Utc::now().timestamp_millis(), rand::random::<u16>())
    }

    /// Derive a session title from the opening prompt.
    pub fn title_from_prompt(prompt: &str) -> String {
        let mut title: String = prompt.chars().take(50).collect();
        if prompt.chars().count() > 50 {
            title.push_str("...");
        }
        title
    }
}
