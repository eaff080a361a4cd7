use std::collections::HashSet;

use crate::model::game_state::{EffectKind, GameState, QuestStatus, StatusEffect};

/// What changed between two completed turns, computed once per transition
/// rather than recomputed reactively by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct TurnDelta {
    /// Item names present now that were absent before.
    pub new_items: Vec<String>,
    /// Full effect objects so callers can inspect `kind`.
    pub new_effects: Vec<StatusEffect>,
    pub new_characters: Vec<String>,
    /// Newly appeared quests, active ones only.
    pub new_quests: Vec<String>,
    /// Drives the transient screen shake.
    pub injury_increase: bool,
    /// `previous.health - next.health`; positive means the player was hurt.
    pub health_delta: i32,
    /// Red damage vignette intensity, when health dropped.
    pub health_vignette: Option<f32>,
    /// Vignette for the first newly appeared negative effect, if any.
    pub effect_vignette: Option<VignetteColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VignetteColor {
    Red,
    /// Used when the effect's name mentions poison.
    Green,
}

const VIGNETTE_BASE: f32 = 0.3;
const VIGNETTE_CAP: f32 = 0.8;
const VIGNETTE_DAMAGE_SCALE: f32 = 50.0;

/// `min(0.8, 0.3 + damage / 50)`, monotonic and bounded.
pub fn vignette_intensity(health_delta: i32) -> f32 {
    (VIGNETTE_BASE + health_delta as f32 / VIGNETTE_DAMAGE_SCALE).min(VIGNETTE_CAP)
}

/// Diffs two state snapshots into "what's new" signals, by natural key.
pub fn diff(previous: &GameState, next: &GameState) -> TurnDelta {
    let prev_items: HashSet<&str> = previous
        .player_status
        .inventory
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    let new_items = next
        .player_status
        .inventory
        .iter()
        .filter(|i| !prev_items.contains(i.name.as_str()))
        .map(|i| i.name.clone())
        .collect();

    let prev_effects: HashSet<&str> = previous
        .player_status
        .status_effects
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    let new_effects: Vec<StatusEffect> = next
        .player_status
        .status_effects
        .iter()
        .filter(|e| !prev_effects.contains(e.name.as_str()))
        .cloned()
        .collect();

    let prev_characters: HashSet<&str> = previous
        .characters
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    let new_characters = next
        .characters
        .iter()
        .filter(|c| !prev_characters.contains(c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();

    let prev_quests: HashSet<&str> = previous.quests.iter().map(|q| q.title.as_str()).collect();
    let new_quests = next
        .quests
        .iter()
        .filter(|q| q.status == QuestStatus::Active && !prev_quests.contains(q.title.as_str()))
        .map(|q| q.title.clone())
        .collect();

    let injury_increase =
        next.player_status.injuries.len() > previous.player_status.injuries.len();

    let health_delta = previous.player_status.health - next.player_status.health;
    let health_vignette = (health_delta > 0).then(|| vignette_intensity(health_delta));

    // First matching negative effect wins if several appear in the same turn.
    let effect_vignette = new_effects
        .iter()
        .find(|e| e.kind == EffectKind::Negative)
        .map(|e| {
            if e.name.to_lowercase().contains("poison") {
                VignetteColor::Green
            } else {
                VignetteColor::Red
            }
        });

    TurnDelta {
        new_items,
        new_effects,
        new_characters,
        new_quests,
        injury_increase,
        health_delta,
        health_vignette,
        effect_vignette,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game_state::{Character, InventoryItem, Injury, Quest};

    fn item(name: &str) -> InventoryItem {
        InventoryItem {
            name: name.to_string(),
            description: String::new(),
            equippable: None,
            slot: None,
        }
    }

    fn effect(name: &str, kind: EffectKind) -> StatusEffect {
        StatusEffect {
            name: name.to_string(),
            description: String::new(),
            kind,
        }
    }

    #[test]
    fn reports_new_names_only() {
        let mut prev = GameState::default();
        prev.player_status.inventory = vec![item("Rope")];
        let mut next = GameState::default();
        next.player_status.inventory = vec![item("Rope"), item("Lantern")];
        next.characters = vec![Character {
            name: "Kara".into(),
            description: String::new(),
            status: Default::default(),
            known_information: Vec::new(),
            image_url: None,
            location: None,
        }];

        let delta = diff(&prev, &next);
        assert_eq!(delta.new_items, vec!["Lantern"]);
        assert_eq!(delta.new_characters, vec!["Kara"]);
    }

    #[test]
    fn new_quests_filtered_to_active() {
        let prev = GameState::default();
        let mut next = GameState::default();
        next.quests = vec![
            Quest {
                title: "Open the vault".into(),
                status: QuestStatus::Active,
                description: String::new(),
                objectives: Vec::new(),
            },
            Quest {
                title: "Old business".into(),
                status: QuestStatus::Completed,
                description: String::new(),
                objectives: Vec::new(),
            },
        ];
        assert_eq!(diff(&prev, &next).new_quests, vec!["Open the vault"]);
    }

    #[test]
    fn vignette_intensity_is_bounded() {
        assert_eq!(vignette_intensity(0), 0.3);
        assert_eq!(vignette_intensity(25), 0.8);
        assert_eq!(vignette_intensity(100), 0.8);
    }

    #[test]
    fn health_loss_triggers_vignette() {
        let prev = GameState::default(); // health 100
        let mut next = GameState::default();
        next.player_status.health = 90;
        let delta = diff(&prev, &next);
        assert_eq!(delta.health_delta, 10);
        let intensity = delta.health_vignette.unwrap();
        assert!((intensity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn health_gain_triggers_nothing() {
        let mut prev = GameState::default();
        prev.player_status.health = 50;
        let next = GameState::default();
        let delta = diff(&prev, &next);
        assert_eq!(delta.health_delta, -50);
        assert!(delta.health_vignette.is_none());
    }

    #[test]
    fn poison_effect_turns_vignette_green() {
        let prev = GameState::default();
        let mut next = GameState::default();
        next.player_status.status_effects = vec![
            effect("Blessed", EffectKind::Positive),
            effect("Spider Poisoning", EffectKind::Negative),
            effect("Bleeding", EffectKind::Negative),
        ];
        // First negative effect wins; "Spider Poisoning" contains "poison".
        assert_eq!(diff(&prev, &next).effect_vignette, Some(VignetteColor::Green));
    }

    #[test]
    fn non_poison_negative_effect_is_red() {
        let prev = GameState::default();
        let mut next = GameState::default();
        next.player_status.status_effects = vec![effect("Bleeding", EffectKind::Negative)];
        assert_eq!(diff(&prev, &next).effect_vignette, Some(VignetteColor::Red));
    }

    #[test]
    fn injury_count_increase_sets_shake() {
        let prev = GameState::default();
        let mut next = GameState::default();
        next.player_status.injuries = vec![Injury {
            location: crate::model::game_state::InjuryLocation::Head,
            description: "A nasty cut.".into(),
            severity: Default::default(),
        }];
        assert!(diff(&prev, &next).injury_increase);
        assert!(!diff(&next, &prev).injury_increase);
    }
}
