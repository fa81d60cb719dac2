//! Language-model side of drafting
//!
//! This module turns retrieved templates and a request into a prompt and sends
//! it to an OpenAI-compatible chat completions endpoint:
//! - Prompt assembly with fixed tone exemplars
//! - Completion requests with timeout and bounded retry of 5xx failures
//! - Rate limiting (HTTP 429) reported as a quota outcome, not an error

mod client;
mod prompts;
mod retry;

pub use client::{Completion, CompletionBackend, CompletionClient, normalize_closing};
pub use prompts::{DRAFT_SYSTEM, Tone, build_prompt, template_context, tone_example};
pub use retry::{RetryConfig, with_retry};
