use once_cell::sync::Lazy;
use regex::Regex;

/// One typed slice of narrative text, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// An inline `[CATEGORY: payload]` annotation; all four categories are
    /// clickable and differ only in the handler the UI invokes.
    Marker {
        category: MarkerCategory,
        payload: String,
    },
    /// A dictionary keyword found at a word boundary.
    Entity { kind: EntityKind, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerCategory {
    /// Significant plot point; prefills an action suggestion.
    Event,
    /// New pivotal item, clue or information; opens discovery info.
    Discovery,
    /// Start of a conflict; focuses the combat view.
    Combat,
    /// New key area; opens location info.
    Location,
}

impl MarkerCategory {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "EVENT" => Some(Self::Event),
            "DISCOVERY" => Some(Self::Discovery),
            "COMBAT" => Some(Self::Combat),
            "LOCATION" => Some(Self::Location),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Character,
    Item,
}

// Older producer revisions wrapped entities in their own tags; these are
// normalized down to their bare payload before tokenizing.
static DEPRECATED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[(?:CHARACTER|ITEM|CLUE):([^\]]+)\]").unwrap());

const MARKER_PATTERN: &str = r"\[(EVENT|DISCOVERY|COMBAT|LOCATION):([^\]]+)\]";

/// Decomposes narrative text into typed segments.
///
/// Pure and stateless: the UI reveals text incrementally and re-runs this on
/// every growing prefix, so segment boundaries must never depend on anything
/// but the inputs. Marker tags win over dictionary keywords at the same
/// position; a keyword found in both lists resolves as a character.
pub fn tokenize(text: &str, known_characters: &[&str], known_items: &[&str]) -> Vec<Segment> {
    let text = DEPRECATED_TAG.replace_all(text, "$1");

    let keywords: Vec<&str> = known_characters
        .iter()
        .chain(known_items.iter())
        .copied()
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() && !text.contains('[') {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Text(text.into_owned())]
        };
    }

    let pattern = if keywords.is_empty() {
        format!("(?i){MARKER_PATTERN}")
    } else {
        let escaped: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
        format!(r"(?i){MARKER_PATTERN}|\b({})\b", escaped.join("|"))
    };
    // The pattern is built from a fixed skeleton plus escaped literals.
    let combined = Regex::new(&pattern).expect("tokenizer pattern");

    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in combined.captures_iter(&text) {
        let whole = caps.get(0).expect("match");
        if whole.start() > last_end {
            segments.push(Segment::Text(text[last_end..whole.start()].to_string()));
        }

        if let (Some(tag), Some(payload)) = (caps.get(1), caps.get(2)) {
            if let Some(category) = MarkerCategory::from_tag(tag.as_str()) {
                let payload = payload.as_str().trim();
                if !payload.is_empty() {
                    segments.push(Segment::Marker {
                        category,
                        payload: payload.to_string(),
                    });
                }
            }
        } else if let Some(keyword) = caps.get(3) {
            let literal = keyword.as_str();
            let kind = if known_characters
                .iter()
                .any(|c| c.eq_ignore_ascii_case(literal))
            {
                EntityKind::Character
            } else {
                EntityKind::Item
            };
            segments.push(Segment::Entity {
                kind,
                name: literal.to_string(),
            });
        }

        last_end = whole.end();
    }

    if last_end < text.len() {
        segments.push(Segment::Text(text[last_end..].to_string()));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_segment() {
        let segments = tokenize("The rain keeps falling.", &[], &[]);
        assert_eq!(segments, vec![Segment::Text("The rain keeps falling.".into())]);
    }

    #[test]
    fn markers_and_keywords_interleave() {
        let segments = tokenize(
            "You see [LOCATION: Old Mill] and Kara waits.",
            &["Kara"],
            &[],
        );
        assert_eq!(
            segments,
            vec![
                Segment::Text("You see ".into()),
                Segment::Marker {
                    category: MarkerCategory::Location,
                    payload: "Old Mill".into(),
                },
                Segment::Text(" and ".into()),
                Segment::Entity {
                    kind: EntityKind::Character,
                    name: "Kara".into(),
                },
                Segment::Text(" waits.".into()),
            ]
        );
    }

    #[test]
    fn deprecated_tags_are_normalized() {
        let segments = tokenize("[CHARACTER: Kara] nods at the [CLUE: torn map].", &[], &[]);
        assert_eq!(
            segments,
            vec![Segment::Text(" Kara nods at the  torn map.".into())]
        );
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let segments = tokenize("KARA shouts.", &["Kara"], &[]);
        assert_eq!(
            segments[0],
            Segment::Entity {
                kind: EntityKind::Character,
                name: "KARA".into(),
            }
        );
    }

    #[test]
    fn character_wins_over_item_on_tie() {
        let segments = tokenize("The Raven lands.", &["Raven"], &["Raven"]);
        assert!(segments.iter().any(|s| matches!(
            s,
            Segment::Entity {
                kind: EntityKind::Character,
                ..
            }
        )));
    }

    #[test]
    fn marker_wins_over_keyword_in_payload() {
        let segments = tokenize("[LOCATION: Kara's Hideout]", &["Kara"], &[]);
        assert_eq!(
            segments,
            vec![Segment::Marker {
                category: MarkerCategory::Location,
                payload: "Kara's Hideout".into(),
            }]
        );
    }

    #[test]
    fn empty_marker_payload_is_dropped() {
        let segments = tokenize("Nothing here: [EVENT:  ] done.", &[], &[]);
        assert_eq!(
            segments,
            vec![
                Segment::Text("Nothing here: ".into()),
                Segment::Text(" done.".into()),
            ]
        );
    }

    #[test]
    fn all_marker_categories_parse() {
        for (tag, category) in [
            ("EVENT", MarkerCategory::Event),
            ("DISCOVERY", MarkerCategory::Discovery),
            ("COMBAT", MarkerCategory::Combat),
            ("LOCATION", MarkerCategory::Location),
        ] {
            let text = format!("[{tag}: something happens]");
            let segments = tokenize(&text, &[], &[]);
            assert_eq!(
                segments,
                vec![Segment::Marker {
                    category,
                    payload: "something happens".into(),
                }],
                "category {tag}"
            );
        }
    }

    #[test]
    fn prefix_tokenization_is_stable() {
        let full = "You see [LOCATION: Old Mill] and Kara waits by the Lantern.";
        let characters = ["Kara"];
        let items = ["Lantern"];
        let complete = tokenize(full, &characters, &items);

        for cut in (1..full.len()).filter(|i| full.is_char_boundary(*i)) {
            let partial = tokenize(&full[..cut], &characters, &items);
            // Every segment except possibly the trailing one must already
            // appear, unchanged, in the full tokenization.
            for (i, segment) in partial.iter().enumerate() {
                if i + 1 < partial.len() {
                    assert_eq!(segment, &complete[i], "prefix at {cut}");
                }
            }
        }
    }
}
