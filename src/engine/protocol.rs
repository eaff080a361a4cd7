use crate::engine::delta::TurnDelta;
use crate::engine::orchestrator::{NewGameOptions, Phase};
use crate::model::game_state::GameState;
use crate::model::message::StoryMessage;

/// Commands a front-end sends to the engine loop.
pub enum EngineCommand {
    NewGame {
        scenario: String,
        options: NewGameOptions,
    },
    LoadGame {
        id: String,
    },
    Submit(String),
    Reroll,
    ReturnToMenu,
    Shutdown,
}

/// Notifications the engine loop sends back after handling a command.
pub enum EngineResponse {
    History(Vec<StoryMessage>),
    State(Box<GameState>),
    Phase(Phase),
    /// A turn finished; carries its delta and fresh action suggestions.
    TurnCompleted {
        delta: TurnDelta,
        suggestions: Vec<String>,
    },
    /// A turn failed; the history already carries the player-facing message.
    TurnFailed(String),
}
