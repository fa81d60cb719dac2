//! Template retrieval for a free-text request
//!
//! Three strategies are available, selected once per [`Retriever`] so that
//! retrieval and the relevance scores shown to the user always agree:
//! - `overlap`: count of shared lower-cased words
//! - `trigger`: phrase shortcuts to a named template, otherwise `overlap`
//! - `fuzzy`: sequence similarity plus a keyword bonus, as a percentage
//!
//! Ties are broken by template name, ascending.

mod fuzzy;
mod overlap;
mod triggers;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::templates::TemplateStore;

pub use fuzzy::{fuzzy_score, keyword_bonus, similarity_ratio};
pub use overlap::{overlap_score, word_set};
pub use triggers::TriggerMatcher;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    #[default]
    Overlap,
    Trigger,
    Fuzzy,
}

impl std::str::FromStr for RetrievalStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overlap" => Ok(Self::Overlap),
            "trigger" => Ok(Self::Trigger),
            "fuzzy" => Ok(Self::Fuzzy),
            other => Err(format!(
                "unknown retrieval strategy '{}' (expected overlap, trigger or fuzzy)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTemplate {
    pub score: f64,
    pub name: String,
    pub content: String,
}

/// Retrieved templates, best first. Empty means nothing relevant was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub matches: Vec<ScoredTemplate>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredTemplate> {
        self.matches.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Score of one template for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceScore {
    pub name: String,
    pub score: f64,
    pub strategy: RetrievalStrategy,
}

impl RelevanceScore {
    /// `follow_up` becomes `Follow Up`.
    pub fn display_name(&self) -> String {
        self.name
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for RelevanceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.strategy {
            RetrievalStrategy::Fuzzy => write!(f, "{}: {:.1}%", self.display_name(), self.score),
            _ => write!(f, "{}: {}", self.display_name(), self.score),
        }
    }
}

/// Scores templates from a shared, read-only [`TemplateStore`].
#[derive(Debug, Clone)]
pub struct Retriever {
    store: Arc<TemplateStore>,
    strategy: RetrievalStrategy,
    /// Word sets aligned with `store.iter()`
    word_sets: Vec<HashSet<String>>,
    triggers: TriggerMatcher,
}

impl Retriever {
    pub fn new(store: Arc<TemplateStore>, strategy: RetrievalStrategy) -> Self {
        let word_sets = store.iter().map(|(_, content)| word_set(content)).collect();
        Self {
            store,
            strategy,
            word_sets,
            triggers: TriggerMatcher::new(),
        }
    }

    pub fn strategy(&self) -> RetrievalStrategy {
        self.strategy
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Return at most `top_k` templates, best first.
    ///
    /// There is no minimum score: weak matches are returned when nothing
    /// better exists. Under the `trigger` strategy a triggered query returns
    /// exactly the named template, or nothing if that template is not loaded.
    pub fn retrieve(&self, query: &str, top_k: usize) -> RetrievalResult {
        if self.strategy == RetrievalStrategy::Trigger
            && let Some(name) = self.triggers.triggered_template(query)
        {
            tracing::debug!("Query triggered template '{}'", name);
            let matches: Vec<ScoredTemplate> = self
                .store
                .get(name)
                .filter(|_| top_k > 0)
                .map(|content| ScoredTemplate {
                    score: overlap_score(&word_set(query), &word_set(content)) as f64,
                    name: name.to_string(),
                    content: content.to_string(),
                })
                .into_iter()
                .collect();
            if !self.store.contains(name) {
                tracing::debug!("Triggered template '{}' is not loaded", name);
            }
            return RetrievalResult { matches };
        }

        let mut matches = self.rank(query);
        matches.truncate(top_k);
        tracing::debug!(
            "Retrieved {:?} for query ({} templates scored)",
            matches.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            self.store.len()
        );
        RetrievalResult { matches }
    }

    /// Score every template, in ranking order.
    pub fn relevance(&self, query: &str) -> Vec<RelevanceScore> {
        self.rank(query)
            .into_iter()
            .map(|m| RelevanceScore {
                name: m.name,
                score: m.score,
                strategy: self.strategy,
            })
            .collect()
    }

    fn rank(&self, query: &str) -> Vec<ScoredTemplate> {
        let query_words = word_set(query);
        let mut scored: Vec<ScoredTemplate> = self
            .store
            .iter()
            .zip(&self.word_sets)
            .map(|((name, content), words)| {
                let score = match self.strategy {
                    RetrievalStrategy::Overlap | RetrievalStrategy::Trigger => {
                        overlap_score(&query_words, words) as f64
                    }
                    RetrievalStrategy::Fuzzy => fuzzy_score(query, name, content),
                };
                ScoredTemplate {
                    score,
                    name: name.to_string(),
                    content: content.to_string(),
                }
            })
            .collect();

        // Stable sort keeps the store's name order among equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> Arc<TemplateStore> {
        Arc::new(TemplateStore::from_templates([
            (
                "follow_up",
                "Dear [Recipient Name],\nI wanted to follow up on my previous email regarding the project status.\nBest regards,\n[Your Name]",
            ),
            (
                "meeting_request",
                "Dear [Recipient Name],\nI would like to schedule a meeting to discuss the project.\nBest regards,\n[Your Name]",
            ),
            (
                "thank_you",
                "Dear [Recipient Name],\nThank you for your help with the project.\nBest regards,\n[Your Name]",
            ),
            (
                "apology",
                "Dear [Recipient Name],\nI apologize for the delay in my response.\nBest regards,\n[Your Name]",
            ),
        ]))
    }

    fn assert_sorted(result: &RetrievalResult) {
        for pair in result.matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_overlap_returns_best_match() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Overlap);
        let result = retriever.retrieve("schedule a meeting to discuss budget", 1);
        assert_eq!(result.names(), vec!["meeting_request"]);
        assert!(result.matches[0].score >= 1.0);
    }

    #[test]
    fn test_results_bounded_by_top_k_and_sorted() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Overlap);
        for top_k in 0..6 {
            let result = retriever.retrieve("the project status update", top_k);
            assert!(result.len() <= top_k);
            assert_eq!(result.len(), top_k.min(4));
            assert_sorted(&result);
        }
    }

    #[test]
    fn test_low_relevance_still_returned() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Overlap);
        let result = retriever.retrieve("zebra quantum", 2);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.score == 0.0));
    }

    #[test]
    fn test_ties_break_by_name() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Overlap);
        // Every template shares exactly "dear" and "regards,"
        let result = retriever.retrieve("dear regards,", 4);
        assert_eq!(
            result.names(),
            vec!["apology", "follow_up", "meeting_request", "thank_you"]
        );
    }

    #[test]
    fn test_shared_word_scores_at_least_one() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Overlap);
        for (name, content) in retriever.store().iter() {
            let word = content.split_whitespace().next().unwrap();
            let scores = retriever.relevance(&format!("xyzzy {}", word));
            let score = scores.iter().find(|s| s.name == name).unwrap();
            assert!(score.score >= 1.0, "{name} scored {}", score.score);
        }
    }

    #[test]
    fn test_trigger_returns_only_named_template() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Trigger);
        // Overlap alone would prefer meeting_request
        let result = retriever.retrieve("follow up: schedule a meeting to discuss the project", 3);
        assert_eq!(result.names(), vec!["follow_up"]);

        let result = retriever.retrieve("quick follow-up", 3);
        assert_eq!(result.names(), vec!["follow_up"]);
    }

    #[test]
    fn test_trigger_match_carries_overlap_score() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Trigger);
        // "follow", "up" and "project" are shared with the follow_up template
        let result = retriever.retrieve("follow up project", 2);
        assert_eq!(result.names(), vec!["follow_up"]);
        assert_eq!(result.matches[0].score, 3.0);
        assert_eq!(result.matches[0].content, retriever.store().get("follow_up").unwrap());

        assert!(retriever.retrieve("follow up project", 0).is_empty());
    }

    #[test]
    fn test_trigger_with_missing_template_finds_nothing() {
        let store = Arc::new(TemplateStore::from_templates([(
            "meeting_request",
            "Let us meet",
        )]));
        let retriever = Retriever::new(store, RetrievalStrategy::Trigger);
        let result = retriever.retrieve("sorry about yesterday", 1);
        assert!(result.is_empty());
    }

    #[test]
    fn test_trigger_falls_back_to_overlap() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Trigger);
        let result = retriever.retrieve("regarding the delay in my response", 1);
        assert_eq!(result.names(), vec!["apology"]);
    }

    #[test]
    fn test_fuzzy_keyword_bonus_ranks_named_template_first() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Fuzzy);
        let result = retriever.retrieve("thank the team", 4);
        assert_eq!(result.matches[0].name, "thank_you");
        assert!(result.matches[0].score <= 100.0);
        assert_sorted(&result);
    }

    #[test]
    fn test_relevance_uses_retrieval_strategy() {
        let retriever = Retriever::new(sample_store(), RetrievalStrategy::Fuzzy);
        let scores = retriever.relevance("apologize for missing the call");
        assert_eq!(scores.len(), 4);
        assert_eq!(scores[0].name, "apology");
        assert!(scores.iter().all(|s| s.strategy == RetrievalStrategy::Fuzzy));
        assert!(scores[0].to_string().starts_with("Apology: "));
        assert!(scores[0].to_string().ends_with('%'));
    }

    #[test]
    fn test_fuzzy_bonus_applies_to_every_named_keyword() {
        let store = Arc::new(TemplateStore::from_templates([
            ("follow_up", "I wanted to follow up about the project."),
            ("meeting_request", "Could we book a call next week?"),
            ("thank_you", "Thanks for your help."),
        ]));
        let retriever = Retriever::new(store, RetrievalStrategy::Fuzzy);
        let scores = retriever.relevance("follow up about the meeting");

        assert_eq!(scores[0].name, "follow_up");
        let score_of = |name: &str| scores.iter().find(|s| s.name == name).unwrap().score;
        assert!(score_of("follow_up") >= 50.0);
        assert!(score_of("meeting_request") >= 50.0);
        assert!(score_of("thank_you") < 50.0);
    }

    #[test]
    fn test_empty_store_returns_empty_result() {
        let retriever = Retriever::new(Arc::new(TemplateStore::default()), RetrievalStrategy::Overlap);
        assert!(retriever.retrieve("anything", 3).is_empty());
        assert!(retriever.relevance("anything").is_empty());
    }

    #[test]
    fn test_display_name() {
        let score = RelevanceScore {
            name: "meeting_request".to_string(),
            score: 3.0,
            strategy: RetrievalStrategy::Overlap,
        };
        assert_eq!(score.display_name(), "Meeting Request");
        assert_eq!(score.to_string(), "Meeting Request: 3");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Fuzzy".parse::<RetrievalStrategy>(), Ok(RetrievalStrategy::Fuzzy));
        assert!("vector".parse::<RetrievalStrategy>().is_err());
    }
}
