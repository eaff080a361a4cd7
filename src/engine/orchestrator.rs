use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, warn};

use crate::engine::delta::{diff, TurnDelta};
use crate::engine::error::{StorageError, TurnError};
use crate::engine::parser::parse_story_update;
use crate::engine::portraits::{PortraitResolver, PortraitService};
use crate::engine::prompt::{
    character_preamble, history_for_service, new_game_prompt, turn_prompt,
};
use crate::engine::reconcile::reconcile;
use crate::engine::stream::{accumulate, InlineImage, NarrativeService, TurnRequest};
use crate::model::avatar::PlayerAvatar;
use crate::model::game_state::GameState;
use crate::model::message::{Author, StoryMessage};
use crate::model::session::GameSession;
use crate::model::update::StoryUpdate;
use crate::storage::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
    /// Absorbing: entered when health reaches 0 after a successful turn.
    /// Only the reset transitions leave it.
    GameOver,
}

/// Whether a submission actually ran. Submissions made while a turn is in
/// flight, after game over, or before a game exists are rejected silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Rejected,
}

/// Everything needed to open a new session.
#[derive(Debug, Clone, Default)]
pub struct NewGameOptions {
    pub world_title: Option<String>,
    pub world_image_url: Option<String>,
    /// Seeds the first turn visually; becomes the sticky location image.
    pub location_image: Option<InlineImage>,
}

/// Drives the per-turn lifecycle: submit, stream, parse, reconcile, diff,
/// persist. Owns the authoritative [`GameState`] and the message history;
/// submission is single-flight, with no queue and no reordering.
pub struct SessionOrchestrator {
    narrative: Box<dyn NarrativeService + Send>,
    portraits: PortraitResolver,
    store: SessionStore,
    avatar: Option<PlayerAvatar>,

    state: GameState,
    history: Vec<StoryMessage>,
    phase: Phase,
    session_id: Option<String>,
    session_title: String,
    world_title: Option<String>,
    world_image_url: Option<String>,
    last_delta: Option<TurnDelta>,
    suggestions: Vec<String>,
    time_played: u64,
    clock: Option<Instant>,
}

impl SessionOrchestrator {
    pub fn new(
        narrative: Box<dyn NarrativeService + Send>,
        portrait_service: Arc<dyn PortraitService>,
        store: SessionStore,
        avatar: Option<PlayerAvatar>,
    ) -> Self {
        Self {
            narrative,
            portraits: PortraitResolver::new(portrait_service),
            store,
            avatar,
            state: GameState::default(),
            history: Vec::new(),
            phase: Phase::Idle,
            session_id: None,
            session_title: String::new(),
            world_title: None,
            world_image_url: None,
            last_delta: None,
            suggestions: Vec::new(),
            time_played: 0,
            clock: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &[StoryMessage] {
        &self.history
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The delta computed for the most recent completed turn.
    pub fn last_delta(&self) -> Option<&TurnDelta> {
        self.last_delta.as_ref()
    }

    /// Follow-up action suggestions for the latest story text.
    pub fn suggestions(&self) -> &[String] {
        self.suggestions.as_slice()
    }

    /// Opens a fresh session and plays the opening turn. Valid from any
    /// state; the previous session is discarded entirely.
    pub fn new_game(
        &mut self,
        scenario: &str,
        options: NewGameOptions,
    ) -> Result<TurnOutcome, TurnError> {
        self.return_to_menu();

        self.session_id = Some(GameSession::new_id());
        self.session_title = options
            .world_title
            .clone()
            .unwrap_or_else(|| GameSession::title_from_prompt(scenario));
        self.world_title = options.world_title;
        self.world_image_url = options.world_image_url;
        self.clock = Some(Instant::now());

        let preamble = character_preamble(self.avatar.as_ref());
        let (visible_text, action) = match &options.location_image {
            Some(image) => {
                self.state.location_image_url = Some(format!(
                    "data:{};base64,{}",
                    image.mime_type, image.data_base64
                ));
                let visible = "I look around and take in my surroundings.".to_string();
                let action = format!(
                    "{preamble} (System Note: Start the story based on the provided image. \
                     My first action is: \"{visible}\")"
                );
                (visible, action)
            }
            None => (scenario.to_string(), new_game_prompt(&preamble, scenario)),
        };

        self.history.push(StoryMessage::user(visible_text));
        self.history.push(StoryMessage::thinking());
        self.persist();

        self.run_turn(TurnRequest {
            history: Vec::new(),
            action,
            image: options.location_image,
        })
    }

    /// Restores a persisted session.
    pub fn load_game(&mut self, id: &str) -> Result<(), StorageError> {
        let session = self.store.load(id)?;
        self.return_to_menu();

        self.state = session.game_state;
        self.history = session.history;
        // A stale placeholder can only mean the session was saved mid-crash;
        // no turn is in flight now.
        self.history.retain(|m| !m.thinking);
        self.session_id = Some(session.id);
        self.session_title = session.title;
        self.world_title = session.world_title;
        self.world_image_url = session.world_image_url;
        self.time_played = session.time_played;
        self.clock = Some(Instant::now());
        self.phase = if self.state.player_status.health <= 0 {
            Phase::GameOver
        } else {
            Phase::Idle
        };
        Ok(())
    }

    /// Submits a player action. A no-op unless the session is idle: calls
    /// made while a turn is in flight, after game over, or before a game
    /// has started are rejected silently.
    pub fn submit(&mut self, action: &str) -> Result<TurnOutcome, TurnError> {
        if self.phase != Phase::Idle || self.session_id.is_none() {
            debug!("submit ignored (phase {:?})", self.phase);
            return Ok(TurnOutcome::Rejected);
        }

        let wire_history = history_for_service(&self.history);
        self.history.push(StoryMessage::user(action));
        self.history.push(StoryMessage::thinking());

        let preamble = character_preamble(self.avatar.as_ref());
        self.run_turn(TurnRequest {
            history: wire_history,
            action: turn_prompt(&preamble, action),
            image: None,
        })
    }

    /// Discards the latest narrative block and replays the most recent user
    /// action. A no-op while busy, after game over, or when no user message
    /// exists yet.
    pub fn reroll(&mut self) -> Result<TurnOutcome, TurnError> {
        if self.phase != Phase::Idle || self.session_id.is_none() {
            debug!("reroll ignored (phase {:?})", self.phase);
            return Ok(TurnOutcome::Rejected);
        }
        let Some(last_user) = self
            .history
            .iter()
            .rposition(|m| m.author == Author::User)
        else {
            return Ok(TurnOutcome::Rejected);
        };

        let action = self.history[last_user].text.clone();
        self.history.truncate(last_user + 1);
        let wire_history = history_for_service(&self.history[..last_user]);
        self.history.push(StoryMessage::thinking());

        let preamble = character_preamble(self.avatar.as_ref());
        self.run_turn(TurnRequest {
            history: wire_history,
            action: turn_prompt(&preamble, &action),
            image: None,
        })
    }

    /// Abandons the session and resets to defaults. Valid from any state.
    pub fn return_to_menu(&mut self) {
        self.state = GameState::default();
        self.history.clear();
        self.phase = Phase::Idle;
        self.session_id = None;
        self.session_title.clear();
        self.world_title = None;
        self.world_image_url = None;
        self.last_delta = None;
        self.suggestions.clear();
        self.time_played = 0;
        self.clock = None;
    }

    fn run_turn(&mut self, request: TurnRequest) -> Result<TurnOutcome, TurnError> {
        self.phase = Phase::AwaitingResponse;
        self.suggestions.clear();

        match self.execute_turn(&request) {
            Ok(update) => {
                self.apply_update(update);
                Ok(TurnOutcome::Completed)
            }
            Err(err) => {
                warn!("turn failed: {err}");
                self.replace_thinking(vec![StoryMessage::narrator(err.player_message())]);
                self.phase = Phase::Idle;
                Err(err)
            }
        }
    }

    fn execute_turn(&mut self, request: &TurnRequest) -> Result<StoryUpdate, TurnError> {
        let mut stream = self.narrative.stream_turn(request)?;
        let raw = accumulate(stream.as_mut())?;
        Ok(parse_story_update(&raw)?)
    }

    fn apply_update(&mut self, update: StoryUpdate) {
        let roster = update.characters.clone();
        let resolved = self.portraits.resolve(roster, &self.state.characters);
        let next = reconcile(&self.state, update, resolved);
        let delta = diff(&self.state, &next);

        let mut turn_messages = Vec::new();
        if !next.story.is_empty() {
            let mut narration = StoryMessage::narrator(next.story.clone());
            narration.game_time = Some(next.game_time.clone());
            turn_messages.push(narration);
        }
        for line in &next.dialogue {
            // The producer is told never to speak for the player; drop any
            // line that slips through anyway.
            if line.character_name.eq_ignore_ascii_case("you") {
                continue;
            }
            let portrait = next
                .characters
                .iter()
                .find(|c| c.name == line.character_name)
                .and_then(|c| c.image_url.clone());
            turn_messages.push(StoryMessage::character(
                line.character_name.clone(),
                line.text.clone(),
                portrait,
            ));
        }
        self.replace_thinking(turn_messages);

        self.state = next;
        self.last_delta = Some(delta);
        self.phase = if self.state.player_status.health <= 0 {
            Phase::GameOver
        } else {
            Phase::Idle
        };
        self.persist();

        if !self.state.story.is_empty() && self.phase == Phase::Idle {
            match self.narrative.suggest_actions(&self.state.story) {
                Ok(suggestions) => self.suggestions = suggestions,
                Err(err) => warn!("action suggestions unavailable: {err}"),
            }
        }
    }

    /// Swaps the in-flight placeholder for the turn's rendered messages, or
    /// removes it when the turn produced nothing visible.
    fn replace_thinking(&mut self, messages: Vec<StoryMessage>) {
        match self.history.iter().position(|m| m.thinking) {
            Some(index) => {
                self.history.splice(index..=index, messages);
            }
            None => self.history.extend(messages),
        }
    }

    fn persist(&mut self) {
        let Some(id) = self.session_id.clone() else {
            return;
        };
        if let Some(clock) = self.clock.replace(Instant::now()) {
            self.time_played += clock.elapsed().as_secs();
        }
        let session = GameSession {
            id,
            title: self.session_title.clone(),
            last_played: Utc::now(),
            game_state: self.state.clone(),
            history: self.history.clone(),
            time_played: self.time_played,
            world_image_url: self.world_image_url.clone(),
            world_title: self.world_title.clone(),
        };
        if let Err(err) = self.store.save(session) {
            // A failed save must not sink an otherwise successful turn.
            error!("failed to persist session: {err}");
        }
    }
}
