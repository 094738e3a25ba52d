//! saferide-chat
//!
//! Ties the text, math and model crates into the response-resolution
//! pipeline, plus the canned-response resolver and a thin request shell.

pub mod pipeline;
pub mod resolver;
pub mod shell;

pub use pipeline::{ChatPipeline, Outcome, Reply};
pub use resolver::{Resolved, ResponseResolver};
pub use shell::{handle, handle_json_line, ChatRequest, ChatResponse, ShellReply};
