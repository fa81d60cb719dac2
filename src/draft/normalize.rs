//! Best-effort cleanup of generated email text.
//!
//! These are text heuristics, not a parser. Rules run in this order and each
//! is idempotent on its own output:
//! 1. Drop reasoning lines that precede the first `Subject:` line
//! 2. `Hello {recipient},` becomes `Dear {recipient},`
//! 3. `{closing}, {sender}` on one line is split onto two lines
//! 4. Short drafts get a pleasantry after the greeting line

use regex::{Captures, Regex};

use crate::constants::{CLOSING_PHRASES, MIN_EMAIL_LINES, PLEASANTRY};

/// Apply every rule. Never fails; text that matches no rule comes back unchanged.
pub fn normalize(raw: &str, recipient: &str, sender: &str) -> String {
    let recipient = recipient.trim();
    let sender = sender.trim();

    let text = strip_reasoning(raw);
    let text = formalize_greeting(&text, recipient);
    let text = split_signature(&text, sender);
    ensure_pleasantry(&text, recipient)
}

/// Keep only the email proper when the model leaked its reasoning.
///
/// Reasoning is assumed when the text has a `Subject:` together with either
/// `I will` or `Action:`; everything before the first line starting with
/// `Subject:` is discarded.
pub fn strip_reasoning(text: &str) -> String {
    let has_reasoning =
        text.contains("Subject:") && (text.contains("I will") || text.contains("Action:"));
    if !has_reasoning {
        return text.to_string();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    match lines
        .iter()
        .position(|line| line.trim_start().starts_with("Subject:"))
    {
        Some(start) if start > 0 => lines[start..].join("\n").trim().to_string(),
        _ => text.to_string(),
    }
}

pub fn formalize_greeting(text: &str, recipient: &str) -> String {
    if recipient.is_empty() {
        return text.to_string();
    }
    text.replace(
        &format!("Hello {},", recipient),
        &format!("Dear {},", recipient),
    )
}

/// Move the sender name after a closing phrase onto its own line.
/// Matching is case-insensitive; the sender is written as supplied.
pub fn split_signature(text: &str, sender: &str) -> String {
    if sender.is_empty() {
        return text.to_string();
    }

    let pattern = format!(
        r"(?i)({}),[ \t]*{}",
        CLOSING_PHRASES.join("|"),
        regex::escape(sender)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("Skipping signature normalization: {}", e);
            return text.to_string();
        }
    };

    re.replace_all(text, |caps: &Captures| format!("{},\n{}", &caps[1], sender))
        .into_owned()
}

/// Insert [`PLEASANTRY`] after the `Dear {recipient},` line of short drafts.
pub fn ensure_pleasantry(text: &str, recipient: &str) -> String {
    if recipient.is_empty() || text.contains(PLEASANTRY) {
        return text.to_string();
    }

    let content_lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    if content_lines >= MIN_EMAIL_LINES {
        return text.to_string();
    }

    let greeting = format!("Dear {},", recipient);
    let mut lines: Vec<&str> = text.split('\n').collect();
    let Some(index) = lines
        .iter()
        .position(|line| line.trim_start().starts_with(&greeting))
    else {
        return text.to_string();
    };

    lines.insert(index + 1, PLEASANTRY);
    lines.insert(index + 1, "");
    lines.join("\n")
}
