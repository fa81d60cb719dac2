//! Phrase triggers that short-circuit retrieval to a named template.
//!
//! Rules are checked in declaration order; the first rule with any phrase present
//! in the query wins, regardless of where in the query the phrase occurs.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// `(phrases, template name)` pairs, highest priority first.
const TRIGGER_RULES: &[(&[&str], &str)] = &[
    (&["follow up", "follow-up"], "follow_up"),
    (&["meeting", "schedule"], "meeting_request"),
    (&["thank"], "thank_you"),
    (&["apolog", "sorry"], "apology"),
];

/// Case-insensitive matcher over every trigger phrase.
#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    automaton: Option<AhoCorasick>,
    /// Rule index for each pattern id
    pattern_rule: Vec<usize>,
}

impl Default for TriggerMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerMatcher {
    pub fn new() -> Self {
        let mut patterns = Vec::new();
        let mut pattern_rule = Vec::new();
        for (rule, (phrases, _)) in TRIGGER_RULES.iter().enumerate() {
            for phrase in phrases.iter() {
                patterns.push(*phrase);
                pattern_rule.push(rule);
            }
        }

        let automaton = match AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&patterns)
        {
            Ok(ac) => Some(ac),
            Err(e) => {
                tracing::warn!("Failed to build trigger matcher: {}", e);
                None
            }
        };

        Self {
            automaton,
            pattern_rule,
        }
    }

    /// Template name of the highest-priority rule triggered by `query`.
    pub fn triggered_template(&self, query: &str) -> Option<&'static str> {
        let ac = self.automaton.as_ref()?;
        ac.find_overlapping_iter(query)
            .map(|m| self.pattern_rule[m.pattern().as_usize()])
            .min()
            .map(|rule| TRIGGER_RULES[rule].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_rule_maps_to_its_template() {
        let matcher = TriggerMatcher::new();
        assert_eq!(
            matcher.triggered_template("please follow up with Dana"),
            Some("follow_up")
        );
        assert_eq!(
            matcher.triggered_template("Follow-Up on invoice"),
            Some("follow_up")
        );
        assert_eq!(
            matcher.triggered_template("Schedule a call"),
            Some("meeting_request")
        );
        assert_eq!(
            matcher.triggered_template("THANKS for the help"),
            Some("thank_you")
        );
        assert_eq!(
            matcher.triggered_template("I apologize for the delay"),
            Some("apology")
        );
        assert_eq!(matcher.triggered_template("so sorry"), Some("apology"));
    }

    #[test]
    fn test_rule_order_beats_position() {
        let matcher = TriggerMatcher::new();
        // "thank" appears first but the follow-up rule has priority
        assert_eq!(
            matcher.triggered_template("thank them and follow up next week"),
            Some("follow_up")
        );
    }

    #[test]
    fn test_no_trigger() {
        let matcher = TriggerMatcher::new();
        assert_eq!(matcher.triggered_template("request sick leave"), None);
        assert_eq!(matcher.triggered_template(""), None);
    }
}
