use std::io::{BufRead, BufReader, Lines};

use log::warn;
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};

use crate::engine::error::TransportError;
use crate::engine::portraits::{PortraitRequest, PortraitService};
use crate::engine::prompt::{response_field_shape, SYSTEM_INSTRUCTION};
use crate::engine::stream::{NarrativeService, NarrativeStream, TurnRequest};

/// Endpoint configuration for both services, passed in explicitly rather
/// than read from ambient globals.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// OpenAI-compatible API root, e.g. `http://localhost:1234/v1`.
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub image_model: String,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base = std::env::var("STORYLOOM_API_BASE")
            .unwrap_or_else(|_| "http://localhost:1234/v1".to_string());
        Ok(Self {
            api_base,
            api_key: std::env::var("STORYLOOM_API_KEY").ok(),
            model: std::env::var("STORYLOOM_MODEL").unwrap_or_else(|_| "local-model".to_string()),
            image_model: std::env::var("STORYLOOM_IMAGE_MODEL")
                .unwrap_or_else(|_| "local-image-model".to_string()),
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    /// Either a plain string or an array of content parts (for the
    /// image-seeded first turn).
    content: Value,
}

/// Blocking chat client for the narrative service.
pub struct ChatClient {
    http: Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        // No read timeout: the stream contract has no timeout, and a slow
        // producer must not be cut off mid-document.
        let http = Client::builder().timeout(None).build()?;
        Ok(Self { http, config })
    }

    fn post(&self, request: &ChatCompletionRequest) -> Result<Response, TransportError> {
        let url = format!("{}/chat/completions", self.config.api_base);
        let mut builder = self.http.post(url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send()?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    fn system_message() -> ChatMessage {
        let content = format!(
            "{SYSTEM_INSTRUCTION}\nYour response must be one JSON object with this shape:\n{}",
            response_field_shape()
        );
        ChatMessage {
            role: "system".to_string(),
            content: Value::String(content),
        }
    }

    fn turn_messages(request: &TurnRequest) -> Vec<ChatMessage> {
        let mut messages = vec![Self::system_message()];
        for (role, content) in &request.history {
            messages.push(ChatMessage {
                role: role.clone(),
                content: Value::String(content.clone()),
            });
        }

        let content = match &request.image {
            Some(image) => json!([
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{}", image.mime_type, image.data_base64)
                    }
                },
                { "type": "text", "text": request.action }
            ]),
            None => Value::String(request.action.clone()),
        };
        messages.push(ChatMessage {
            role: "user".to_string(),
            content,
        });
        messages
    }
}

impl NarrativeService for ChatClient {
    fn stream_turn(
        &mut self,
        request: &TurnRequest,
    ) -> Result<Box<dyn NarrativeStream + Send>, TransportError> {
        let response = self.post(&ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: Self::turn_messages(request),
            temperature: 0.7,
            stream: Some(true),
            response_format: Some(json!({ "type": "json_object" })),
        })?;
        Ok(Box::new(SseStream::new(response)))
    }

    fn suggest_actions(&mut self, story: &str) -> Result<Vec<String>, TransportError> {
        let prompt = format!(
            "Based on the following story text, suggest three distinct, short, one-sentence \
             actions the player could take next. Respond with a JSON array of strings only. \
             Story: \"{story}\""
        );
        let response = self.post(&ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Value::String(prompt),
            }],
            temperature: 0.7,
            stream: None,
            response_format: None,
        })?;

        let body: Value = response.json().map_err(TransportError::Request)?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();
        let content = content.replace("```json", "").replace("```", "");
        match serde_json::from_str::<Vec<String>>(content.trim()) {
            Ok(suggestions) => Ok(suggestions),
            Err(err) => {
                // Best-effort call; a malformed list is the same as none.
                warn!("discarding malformed action suggestions: {err}");
                Ok(Vec::new())
            }
        }
    }
}

/// Server-sent-events reader over a blocking chat-completions response.
/// Yields each delta's text content as one fragment.
struct SseStream {
    lines: Lines<BufReader<Response>>,
    done: bool,
}

impl SseStream {
    fn new(response: Response) -> Self {
        Self {
            lines: BufReader::new(response).lines(),
            done: false,
        }
    }
}

impl NarrativeStream for SseStream {
    fn next_fragment(&mut self) -> Result<Option<String>, TransportError> {
        if self.done {
            return Ok(None);
        }
        loop {
            let line = match self.lines.next() {
                Some(line) => line?,
                None => {
                    self.done = true;
                    return Ok(None);
                }
            };
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                self.done = true;
                return Ok(None);
            }
            let chunk: Value = match serde_json::from_str(data) {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!("skipping unreadable stream event: {err}");
                    continue;
                }
            };
            let fragment = chunk["choices"][0]["delta"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            // Absent content (role-only deltas) is a no-op fragment.
            return Ok(Some(fragment));
        }
    }
}

/// Blocking client for the portrait-generation service.
pub struct ImageClient {
    http: Client,
    config: ClientConfig,
}

impl ImageClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::new(),
            config,
        })
    }
}

impl PortraitService for ImageClient {
    fn generate_portrait(&self, request: &PortraitRequest) -> anyhow::Result<String> {
        let prompt = format!(
            "A realistic, gritty, photorealistic portrait of a character for a story game. \
             Grounded and realistic style, not anime or stylized. The background should be \
             simple and dark, focusing entirely on the character.\n\
             - Character Name: {}\n- Pronouns: {}\n- Age: {}\n- Height: {}\n\
             - Detailed Appearance: {}",
            request.name,
            request.pronouns,
            request.age.as_deref().unwrap_or("Not specified"),
            request.height.as_deref().unwrap_or("Not specified"),
            request.description,
        );

        let url = format!("{}/images/generations", self.config.api_base);
        let mut builder = self.http.post(url).json(&json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "n": 1,
            "size": "512x512",
            "response_format": "b64_json",
        }));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let body: Value = builder.send()?.error_for_status()?.json()?;
        let image = body["data"][0]["b64_json"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no image in response"))?;
        Ok(format!("data:image/jpeg;base64,{image}"))
    }
}
