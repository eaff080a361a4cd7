use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Narrator,
    Character,
}

/// One append-only story history entry.
///
/// While a turn is in flight the history carries exactly one `thinking`
/// placeholder, which is replaced (or removed) when the turn resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMessage {
    pub author: Author,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thinking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_time: Option<String>,
}

impl StoryMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            text: text.into(),
            thinking: false,
            character_name: None,
            character_image_url: None,
            game_time: None,
        }
    }

    pub fn narrator(text: impl Into<String>) -> Self {
        Self {
            author: Author::Narrator,
            text: text.into(),
            thinking: false,
            character_name: None,
            character_image_url: None,
            game_time: None,
        }
    }

    pub fn thinking() -> Self {
        Self {
            author: Author::Narrator,
            text: "...".to_string(),
            thinking: true,
            character_name: None,
            character_image_url: None,
            game_time: None,
        }
    }

    pub fn character(
        name: impl Into<String>,
        text: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            author: Author::Character,
            text: text.into(),
            thinking: false,
            character_name: Some(name.into()),
            character_image_url: image_url,
            game_time: None,
        }
    }
}
