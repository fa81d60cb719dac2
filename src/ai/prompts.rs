//! Prompt text and prompt assembly for email drafting

use serde::{Deserialize, Serialize};

use crate::constants::NO_TEMPLATE_FOUND;
use crate::retrieval::RetrievalResult;

/// System message sent alongside every drafting prompt
pub const DRAFT_SYSTEM: &str = "You help users draft clear and professional emails.";

const ROLE: &str = "You are an AI email drafting assistant.";

const FORMAL_EXAMPLE: &str = "Dear Mr. Smith,\n\
I hope this email finds you well. I am writing to follow up on our last discussion.\n";

const CASUAL_EXAMPLE: &str = "Hey John!\n\
Just checking in to see if you had a chance to look at my previous message.\n";

const PROFESSIONAL_EXAMPLE: &str = "Hello Team,\n\
I wanted to follow up regarding the project update we discussed earlier.\n";

const INSTRUCTIONS: &str = r#"Instructions:
- Write a complete, polished email
- Keep the tone consistent
- Rephrase informal or short user requests into professional language
- Replace placeholders like [Recipient Name] and [Your Name]
  using the provided Recipient Name and Sender Name
- Include a clear and appropriate subject line
- Format the closing signature on separate lines, for example:
  Best regards,
  Sender Name"#;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    #[default]
    Professional,
    Casual,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Professional => "professional",
            Tone::Casual => "casual",
        }
    }

    /// Fixed exemplar shown to the model for this tone
    pub fn example(self) -> &'static str {
        match self {
            Tone::Formal => FORMAL_EXAMPLE,
            Tone::Professional => PROFESSIONAL_EXAMPLE,
            Tone::Casual => CASUAL_EXAMPLE,
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "formal" => Ok(Tone::Formal),
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            other => Err(format!(
                "unknown tone '{}' (expected formal, professional or casual)",
                other
            )),
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exemplar for a tone label, or an empty string if the label is not recognized.
pub fn tone_example(tone: &str) -> &'static str {
    tone.parse::<Tone>().map(Tone::example).unwrap_or("")
}

/// `Template (name):` blocks separated by blank lines.
pub fn template_context(retrieved: &RetrievalResult) -> String {
    if retrieved.is_empty() {
        return NO_TEMPLATE_FOUND.to_string();
    }
    retrieved
        .iter()
        .map(|t| format!("Template ({}):\n{}", t.name, t.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assemble the drafting prompt. Pure: identical inputs give an identical prompt.
///
/// The tone label is embedded verbatim even when it has no exemplar.
pub fn build_prompt(request: &str, tone: &str, retrieved: &RetrievalResult) -> String {
    let prompt = format!(
        "{ROLE}\n\n\
         Tone: {tone}\n\n\
         Example of tone:\n{example}\n\n\
         Relevant email template(s):\n{context}\n\n\
         User request and context:\n{request}\n\n\
         {INSTRUCTIONS}",
        example = tone_example(tone),
        context = template_context(retrieved),
    );
    prompt.trim().to_string()
}
