use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::model::game_state::{Character, CharacterStatus};

/// Shown whenever portrait generation fails; the failure never propagates.
pub const PLACEHOLDER_PORTRAIT_URL: &str = "https://picsum.photos/512";

#[derive(Debug, Clone)]
pub struct PortraitRequest {
    pub description: String,
    pub name: String,
    pub pronouns: String,
    pub age: Option<String>,
    pub height: Option<String>,
}

pub trait PortraitService: Send + Sync {
    /// Returns an image reference (URL or data URI) for the described
    /// character.
    fn generate_portrait(&self, request: &PortraitRequest) -> anyhow::Result<String>;
}

/// Fills in missing character images for a turn's roster.
///
/// Images already resolved in the current roster are carried forward by name
/// and never regenerated. The remaining candidates are generated on worker
/// threads, one per character, and the call returns only once every request
/// has finished or fallen back to the placeholder. Narrative rendering is
/// never gated on this: the orchestrator shows text first and calls this as
/// part of producing the merged roster.
pub struct PortraitResolver {
    service: Arc<dyn PortraitService>,
}

impl PortraitResolver {
    pub fn new(service: Arc<dyn PortraitService>) -> Self {
        Self { service }
    }

    pub fn resolve(
        &self,
        new_roster: Vec<Character>,
        current_roster: &[Character],
    ) -> Vec<Character> {
        let existing: HashMap<&str, &str> = current_roster
            .iter()
            .filter_map(|c| {
                c.image_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .map(|url| (c.name.as_str(), url))
            })
            .collect();

        let candidates: Vec<&Character> = new_roster
            .iter()
            .filter(|c| {
                !existing.contains_key(c.name.as_str())
                    && !c.description.is_empty()
                    && c.status != CharacterStatus::Deceased
            })
            .collect();

        let mut generated: HashMap<String, String> = HashMap::new();
        if !candidates.is_empty() {
            debug!("generating {} portrait(s)", candidates.len());
            std::thread::scope(|scope| {
                let handles: Vec<_> = candidates
                    .iter()
                    .map(|character| {
                        let service = Arc::clone(&self.service);
                        let request = PortraitRequest {
                            description: character.description.clone(),
                            name: character.name.clone(),
                            // The turn roster carries no pronoun data.
                            pronouns: "unknown".to_string(),
                            age: None,
                            height: None,
                        };
                        let name = character.name.clone();
                        scope.spawn(move || {
                            let url = service.generate_portrait(&request).unwrap_or_else(|err| {
                                warn!("portrait generation failed for {name}: {err}");
                                PLACEHOLDER_PORTRAIT_URL.to_string()
                            });
                            (name, url)
                        })
                    })
                    .collect();
                for handle in handles {
                    if let Ok((name, url)) = handle.join() {
                        generated.insert(name, url);
                    }
                }
            });
        }

        new_roster
            .into_iter()
            .map(|mut character| {
                character.image_url = existing
                    .get(character.name.as_str())
                    .map(|url| url.to_string())
                    .or_else(|| generated.get(&character.name).cloned())
                    .or(character.image_url);
                character
            })
            .collect()
    }
}
