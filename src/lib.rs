//! Draft emails from a short request.
//!
//! A small set of template texts is loaded once into a [`TemplateStore`]. For
//! each request the [`Retriever`] picks the most relevant templates, the prompt
//! builder embeds them with a tone exemplar, a [`CompletionClient`] sends the
//! prompt to a chat completions endpoint, and the output is normalized into a
//! well-formed email.
//!
//! ```ignore
//! let store = Arc::new(TemplateStore::load(Path::new("templates"), "txt", ReadErrorPolicy::Skip)?);
//! let retriever = Retriever::new(store, RetrievalStrategy::Overlap);
//! let client = CompletionClient::new(api_key, &config.ai)?;
//! let draft = Drafter::new(retriever, client)
//!     .draft(&DraftRequest::new("follow up on the invoice").recipient("Alice").sender("Bob"))
//!     .await?;
//! ```

pub mod ai;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod draft;
pub mod error;
pub mod retrieval;
pub mod templates;

pub use ai::{Completion, CompletionBackend, CompletionClient, Tone, build_prompt};
pub use config::Config;
pub use draft::{DraftRequest, Drafter, EmailDraft, normalize};
pub use error::{CompletionError, ConfigError, DraftError, StoreLoadError};
pub use retrieval::{RelevanceScore, RetrievalResult, RetrievalStrategy, Retriever, ScoredTemplate};
pub use templates::{LoadWarning, ReadErrorPolicy, TemplateStore};
