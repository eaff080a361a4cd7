use log::debug;

use crate::engine::error::TransportError;

/// One outgoing turn: the full prior conversation, the player's latest
/// action, and optionally an inline image seeding a brand-new game.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// `(role, content)` pairs, oldest first.
    pub history: Vec<(String, String)>,
    pub action: String,
    pub image: Option<InlineImage>,
}

#[derive(Debug, Clone)]
pub struct InlineImage {
    pub data_base64: String,
    pub mime_type: String,
}

/// The narrative-generation service. Transport details (auth, retries,
/// model selection) live behind this seam.
pub trait NarrativeService {
    fn stream_turn(
        &mut self,
        request: &TurnRequest,
    ) -> Result<Box<dyn NarrativeStream + Send>, TransportError>;

    /// Up to three short follow-up actions for the latest story text.
    /// Best-effort: callers treat failures as "no suggestions".
    fn suggest_actions(&mut self, story: &str) -> Result<Vec<String>, TransportError>;
}

/// An in-flight narrative reply: an ordered pull of text fragments.
///
/// `next_fragment` returns `Ok(Some(..))` for each fragment, `Ok(None)` once
/// the producer is done, and `Err` if the transport dies mid-stream.
pub trait NarrativeStream {
    fn next_fragment(&mut self) -> Result<Option<String>, TransportError>;
}

/// Drains a stream into one document.
///
/// Empty fragments are skipped rather than concatenated. A transport failure
/// discards whatever was buffered: a partial document must never reach the
/// parser.
pub fn accumulate(stream: &mut dyn NarrativeStream) -> Result<String, TransportError> {
    let mut buffer = String::new();
    let mut fragments = 0usize;
    loop {
        match stream.next_fragment()? {
            Some(fragment) => {
                if !fragment.is_empty() {
                    buffer.push_str(&fragment);
                    fragments += 1;
                }
            }
            None => break,
        }
    }
    debug!("stream complete: {} fragments, {} bytes", fragments, buffer.len());
    Ok(buffer)
}

/// A pre-scripted stream, used by tests and the offline demo mode.
pub struct ScriptedStream {
    fragments: std::vec::IntoIter<Result<String, TransportError>>,
}

impl ScriptedStream {
    pub fn new<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Result<String, TransportError>>,
    {
        Self {
            fragments: fragments.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }

    pub fn of_text<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            fragments
                .into_iter()
                .map(|s| Ok(s.into()))
                .collect::<Vec<_>>(),
        )
    }
}

impl NarrativeStream for ScriptedStream {
    fn next_fragment(&mut self) -> Result<Option<String>, TransportError> {
        match self.fragments.next() {
            Some(Ok(fragment)) => Ok(Some(fragment)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }
}
