//! Drafting pipeline: retrieve → build prompt → complete → normalize.
//!
//! The pipeline is a fixed call sequence with no tool selection or iteration.
//! The template store behind the [`Retriever`] is shared read-only, so one
//! [`Drafter`] can serve concurrent requests.

mod normalize;

pub use normalize::{ensure_pleasantry, formalize_greeting, normalize, split_signature, strip_reasoning};

use crate::ai::{Completion, CompletionBackend, Tone, build_prompt};
use crate::error::DraftError;
use crate::retrieval::{RelevanceScore, Retriever};

/// One drafting request from the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftRequest {
    pub text: String,
    pub tone: Tone,
    pub recipient: String,
    pub sender: String,
}

impl DraftRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Request text as handed to the prompt builder, with the names appended.
    pub fn prompt_request(&self) -> String {
        let mut request = self.text.trim().to_string();
        let recipient = self.recipient.trim();
        let sender = self.sender.trim();
        if !recipient.is_empty() || !sender.is_empty() {
            request.push('\n');
        }
        if !recipient.is_empty() {
            request.push_str(&format!("\nRecipient Name: {}", recipient));
        }
        if !sender.is_empty() {
            request.push_str(&format!("\nSender Name: {}", sender));
        }
        request
    }
}

/// Finished draft returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct EmailDraft {
    /// Normalized email, or the quota message when `quota_exceeded`
    pub text: String,
    pub quota_exceeded: bool,
    /// Per-template scores; empty unless requested
    pub relevance: Vec<RelevanceScore>,
}

impl EmailDraft {
    /// Text after the first `Subject:` line, if the draft has one.
    pub fn subject(&self) -> Option<&str> {
        self.text
            .lines()
            .find_map(|line| line.trim_start().strip_prefix("Subject:"))
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
    }
}

pub struct Drafter<B> {
    retriever: Retriever,
    backend: B,
    top_k: usize,
    include_relevance: bool,
}

impl<B: CompletionBackend> Drafter<B> {
    pub fn new(retriever: Retriever, backend: B) -> Self {
        Self {
            retriever,
            backend,
            top_k: 1,
            include_relevance: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Attach per-template relevance scores to every draft.
    pub fn with_relevance(mut self, include: bool) -> Self {
        self.include_relevance = include;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn draft(&self, request: &DraftRequest) -> Result<EmailDraft, DraftError> {
        if request.text.trim().is_empty() {
            return Err(DraftError::EmptyRequest);
        }

        let retrieved = self.retriever.retrieve(&request.text, self.top_k);
        let prompt = build_prompt(&request.prompt_request(), request.tone.as_str(), &retrieved);
        tracing::debug!(
            "Built prompt ({} chars) with templates {:?}",
            prompt.len(),
            retrieved.names()
        );

        let (text, quota_exceeded) = match self.backend.send(&prompt).await? {
            Completion::Text(raw) => (normalize(&raw, &request.recipient, &request.sender), false),
            Completion::QuotaExceeded => (Completion::QuotaExceeded.into_text(), true),
        };

        let relevance = if self.include_relevance {
            self.retriever.relevance(&request.text)
        } else {
            Vec::new()
        };

        Ok(EmailDraft {
            text,
            quota_exceeded,
            relevance,
        })
    }
}
