//! Transport-agnostic request/response wrapper around [`ChatPipeline`].
//!
//! Mirrors a `POST /chat` endpoint: `{"message": "..."}` in,
//! `{"response": "..."}` out, with an HTTP-like status code.

use serde::{Deserialize, Serialize};

use crate::pipeline::ChatPipeline;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellReply {
    pub status: u16,
    #[serde(flatten)]
    pub body: ChatResponse,
}

impl ShellReply {
    fn new(status: u16, response: impl Into<String>) -> Self {
        Self { status, body: ChatResponse { response: response.into() } }
    }
}

/// 400 for an absent or empty message, 500 when a collaborator fails,
/// 200 for every pipeline outcome.
pub fn handle(pipeline: &ChatPipeline, request: &ChatRequest) -> ShellReply {
    let message = match request.message.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => return ShellReply::new(400, pipeline.messages().missing_message.clone()),
    };
    match pipeline.reply(message) {
        Ok(reply) => ShellReply::new(200, reply.text),
        Err(e) => {
            tracing::error!(error = %e, external = e.is_external(), "chat request failed");
            ShellReply::new(500, pipeline.messages().service_failure.clone())
        }
    }
}

/// One JSON request line in, one JSON reply line out. Lines that are not a
/// JSON object get a 400.
pub fn handle_json_line(pipeline: &ChatPipeline, line: &str) -> String {
    let reply = match serde_json::from_str::<ChatRequest>(line) {
        Ok(request) => handle(pipeline, &request),
        Err(e) => {
            tracing::debug!(error = %e, "malformed request line");
            ShellReply::new(400, pipeline.messages().missing_message.clone())
        }
    };
    serde_json::to_string(&reply).unwrap_or_else(|_| format!("{{\"status\":{},\"response\":\"\"}}", reply.status))
}
