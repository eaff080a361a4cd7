use log::warn;

use crate::engine::error::ParseError;
use crate::model::update::StoryUpdate;

/// Extracts a turn payload from the accumulated narrative reply.
///
/// The producer wraps its JSON in code fences and stray commentary often
/// enough that strict parsing is useless. Instead: strip fence markers, slice
/// from the first `{` to the last `}`, and decode that span. Nothing beyond
/// decodability is validated here; every field of the result is untrusted.
pub fn parse_story_update(raw: &str) -> Result<StoryUpdate, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let sanitized = raw.replace("```json", "").replace("```", "");
    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let start = sanitized.find('{').ok_or(ParseError::MalformedStructure)?;
    let end = sanitized.rfind('}').ok_or(ParseError::MalformedStructure)?;
    if end < start {
        return Err(ParseError::MalformedStructure);
    }

    let body = &sanitized[start..=end];
    serde_json::from_str(body).map_err(|err| {
        warn!("turn payload failed to decode: {err}");
        ParseError::Decode(err)
    })
}
