//! Storyloom: the ingestion and state-reconciliation engine behind an
//! LLM-driven interactive narrative client.
//!
//! A turn flows: player action -> narrative service -> stream accumulation
//! -> payload extraction -> portrait resolution -> state reconciliation ->
//! delta computation -> persistence. The producer is untrusted: it forgets
//! fields, wraps its JSON in prose, and occasionally dies mid-stream, and
//! none of that may lose previously established world state.

pub mod engine;
pub mod model;
pub mod storage;

pub use engine::delta::{diff, TurnDelta, VignetteColor};
pub use engine::error::{ParseError, StorageError, TransportError, TurnError};
pub use engine::orchestrator::{NewGameOptions, Phase, SessionOrchestrator, TurnOutcome};
pub use engine::parser::parse_story_update;
pub use engine::portraits::{PortraitResolver, PortraitService};
pub use engine::reconcile::reconcile;
pub use engine::tokenizer::{tokenize, EntityKind, MarkerCategory, Segment};
pub use model::game_state::GameState;
pub use model::update::StoryUpdate;
