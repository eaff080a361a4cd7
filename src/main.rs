use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;

use storyloom::engine::client::{ChatClient, ClientConfig, ImageClient};
use storyloom::engine::orchestrator::{NewGameOptions, Phase, SessionOrchestrator};
use storyloom::engine::tokenizer::{tokenize, Segment};
use storyloom::storage::SessionStore;

/// Minimal line-oriented front-end for the engine. Type an action, read the
/// next part of the story; `:reroll`, `:load <id>`, `:quit`.
fn main() -> Result<()> {
    env_logger::init();

    let config = ClientConfig::from_env()?;
    let narrative = ChatClient::new(config.clone())?;
    let portraits = ImageClient::new(config)?;
    let store = SessionStore::open_default()?;

    let mut orchestrator =
        SessionOrchestrator::new(Box::new(narrative), Arc::new(portraits), store, None);

    let stdin = io::stdin();
    print!("Scenario> ");
    io::stdout().flush()?;
    let mut lines = stdin.lock().lines();
    let Some(scenario) = lines.next().transpose()? else {
        return Ok(());
    };

    if let Err(err) = orchestrator.new_game(scenario.trim(), NewGameOptions::default()) {
        eprintln!("could not start the game: {err}");
    }
    render(&orchestrator);

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            ":quit" => break,
            ":reroll" => {
                let _ = orchestrator.reroll();
            }
            _ if line.starts_with(":load ") => {
                if let Err(err) = orchestrator.load_game(line[":load ".len()..].trim()) {
                    eprintln!("{err}");
                    continue;
                }
            }
            action => {
                let _ = orchestrator.submit(action);
            }
        }
        render(&orchestrator);

        if orchestrator.phase() == Phase::GameOver {
            println!("\n-- GAME OVER --");
            break;
        }
    }
    Ok(())
}

fn render(orchestrator: &SessionOrchestrator) {
    let state = orchestrator.state();
    let characters: Vec<&str> = state.characters.iter().map(|c| c.name.as_str()).collect();
    let items: Vec<&str> = state
        .player_status
        .inventory
        .iter()
        .map(|i| i.name.as_str())
        .collect();

    if let Some(message) = orchestrator.history().last() {
        for segment in tokenize(&message.text, &characters, &items) {
            match segment {
                Segment::Text(text) => print!("{text}"),
                Segment::Marker { category, payload } => print!("[{category:?}: {payload}]"),
                Segment::Entity { name, .. } => print!("*{name}*"),
            }
        }
        println!();
    }

    println!(
        "\n[health {} | resolve {} | gold {} | {}]",
        state.player_status.health,
        state.player_status.resolve,
        state.player_status.currency,
        state.game_time
    );
    if !orchestrator.suggestions().is_empty() {
        println!("suggestions: {}", orchestrator.suggestions().join(" / "));
    }
}
