use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;

use log::debug;

use crate::engine::error::TurnError;
use crate::engine::orchestrator::{SessionOrchestrator, TurnOutcome};
use crate::engine::protocol::{EngineCommand, EngineResponse};

/// Hosts a [`SessionOrchestrator`] on its own thread behind a command
/// channel, so a front-end stays responsive while a turn streams.
///
/// Commands are handled strictly in order; because the orchestrator is
/// single-flight by construction, a command arriving while a turn runs
/// simply waits in the channel.
pub struct EngineRuntime {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    orchestrator: SessionOrchestrator,
}

impl EngineRuntime {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        orchestrator: SessionOrchestrator,
    ) -> Self {
        Self {
            rx,
            tx,
            orchestrator,
        }
    }

    /// Spawns the loop on a dedicated thread and hands back its endpoints.
    pub fn spawn(
        orchestrator: SessionOrchestrator,
    ) -> (Sender<EngineCommand>, Receiver<EngineResponse>, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = channel();
        let (resp_tx, resp_rx) = channel();
        let mut runtime = Self::new(cmd_rx, resp_tx, orchestrator);
        let handle = std::thread::spawn(move || runtime.run());
        (cmd_tx, resp_rx, handle)
    }

    pub fn run(&mut self) {
        while let Ok(command) = self.rx.recv() {
            let turn_result = match command {
                EngineCommand::NewGame { scenario, options } => {
                    Some(self.orchestrator.new_game(&scenario, options))
                }
                EngineCommand::LoadGame { id } => {
                    if let Err(err) = self.orchestrator.load_game(&id) {
                        let _ = self.tx.send(EngineResponse::TurnFailed(err.to_string()));
                    }
                    None
                }
                EngineCommand::Submit(action) => Some(self.orchestrator.submit(&action)),
                EngineCommand::Reroll => Some(self.orchestrator.reroll()),
                EngineCommand::ReturnToMenu => {
                    self.orchestrator.return_to_menu();
                    None
                }
                EngineCommand::Shutdown => break,
            };

            if let Some(result) = turn_result {
                self.send_turn_outcome(result);
            }
            self.send_snapshot();
        }
        debug!("engine loop stopped");
    }

    fn send_turn_outcome(&self, result: Result<TurnOutcome, TurnError>) {
        let response = match result {
            Ok(TurnOutcome::Rejected) => return,
            Ok(TurnOutcome::Completed) => {
                let delta = self
                    .orchestrator
                    .last_delta()
                    .cloned()
                    .unwrap_or_default();
                EngineResponse::TurnCompleted {
                    delta,
                    suggestions: self.orchestrator.suggestions().to_vec(),
                }
            }
            Err(err) => EngineResponse::TurnFailed(err.to_string()),
        };
        let _ = self.tx.send(response);
    }

    fn send_snapshot(&self) {
        let _ = self
            .tx
            .send(EngineResponse::History(self.orchestrator.history().to_vec()));
        let _ = self
            .tx
            .send(EngineResponse::State(Box::new(self.orchestrator.state().clone())));
        let _ = self
            .tx
            .send(EngineResponse::Phase(self.orchestrator.phase()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::TransportError;
    use crate::engine::orchestrator::{NewGameOptions, Phase};
    use crate::engine::portraits::{PortraitRequest, PortraitService};
    use crate::engine::stream::{
        NarrativeService, NarrativeStream, ScriptedStream, TurnRequest,
    };
    use crate::storage::SessionStore;
    use std::sync::Arc;

    struct OneShotService;

    impl NarrativeService for OneShotService {
        fn stream_turn(
            &mut self,
            _request: &TurnRequest,
        ) -> Result<Box<dyn NarrativeStream + Send>, TransportError> {
            Ok(Box::new(ScriptedStream::of_text([
                r#"{ "story": "It begins.", "gameTime": "Day 1",
                    "playerStatus": { "health": 100, "resolve": 100, "currency": 0 },
                    "characters": [], "quests": [], "worldInfo": [] }"#,
            ])))
        }

        fn suggest_actions(&mut self, _story: &str) -> Result<Vec<String>, TransportError> {
            Ok(Vec::new())
        }
    }

    struct NoPortraits;

    impl PortraitService for NoPortraits {
        fn generate_portrait(&self, _request: &PortraitRequest) -> anyhow::Result<String> {
            anyhow::bail!("unused")
        }
    }

    #[test]
    fn loop_runs_a_turn_and_reports_back() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = SessionOrchestrator::new(
            Box::new(OneShotService),
            Arc::new(NoPortraits),
            SessionStore::at_path(dir.path().join("sessions.json")),
            None,
        );
        let (tx, rx, handle) = EngineRuntime::spawn(orchestrator);

        tx.send(EngineCommand::NewGame {
            scenario: "It begins.".into(),
            options: NewGameOptions::default(),
        })
        .unwrap();
        tx.send(EngineCommand::Shutdown).unwrap();

        let responses: Vec<EngineResponse> = rx.iter().collect();
        handle.join().unwrap();

        assert!(responses
            .iter()
            .any(|r| matches!(r, EngineResponse::TurnCompleted { .. })));
        assert!(responses.iter().any(
            |r| matches!(r, EngineResponse::State(state) if state.story == "It begins.")
        ));
        assert!(responses
            .iter()
            .any(|r| matches!(r, EngineResponse::Phase(Phase::Idle))));
    }
}
