//! Assistant capability interface.
//!
//! Summaries, question answering and embeddings behind one trait, with the
//! implementation picked by [`AssistantKind`]. Only the extractive local
//! assistant ships here; hosted model backends plug in as further variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compose::smart_truncate;
use crate::error::Result;
use crate::shared::SharedVectorizer;
use crate::similarity::Document;
use crate::tokenizer::split_sentences;
use crate::vectorizer::Embedding;

/// Sentences kept when answering from context.
const ANSWER_SENTENCES: usize = 3;

pub trait Assistant: Send + Sync {
    fn name(&self) -> &str;
    fn summarize(&self, text: &str, max_chars: usize) -> Result<String>;
    fn answer_question(&self, question: &str, context: &str) -> Result<String>;
    fn embed(&self, text: &str) -> Result<Embedding>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantKind {
    #[default]
    Local,
}

impl AssistantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantKind::Local => "local",
        }
    }
}

impl fmt::Display for AssistantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssistantKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(AssistantKind::Local),
            other => Err(format!("unknown assistant '{other}'")),
        }
    }
}

/// Build the assistant selected by `kind`.
pub fn assistant_for(kind: AssistantKind, vectorizer: SharedVectorizer) -> Box<dyn Assistant> {
    match kind {
        AssistantKind::Local => Box::new(LocalAssistant::new(vectorizer)),
    }
}

/// Extractive assistant: summaries are lead paragraphs, answers are the
/// context sentences closest to the question.
pub struct LocalAssistant {
    vectorizer: SharedVectorizer,
}

impl LocalAssistant {
    pub fn new(vectorizer: SharedVectorizer) -> Self {
        Self { vectorizer }
    }
}

impl Assistant for LocalAssistant {
    fn name(&self) -> &str {
        AssistantKind::Local.as_str()
    }

    fn summarize(&self, text: &str, max_chars: usize) -> Result<String> {
        Ok(smart_truncate(text.trim(), max_chars))
    }

    fn answer_question(&self, question: &str, context: &str) -> Result<String> {
        let sentences: Vec<Document> = split_sentences(context)
            .into_iter()
            .enumerate()
            .map(|(i, s)| Document::new(i.to_string(), s))
            .collect();

        let mut best = self
            .vectorizer
            .find_similar(question, &sentences, ANSWER_SENTENCES)?;
        best.retain(|item| item.score > 0.0);
        // Present the chosen sentences in reading order
        best.sort_by_key(|item| item.index);

        Ok(best
            .iter()
            .map(|item| sentences[item.index].text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.vectorizer.embed(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> Box<dyn Assistant> {
        assistant_for(AssistantKind::Local, SharedVectorizer::default())
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Local".parse::<AssistantKind>(), Ok(AssistantKind::Local));
        assert!("remote".parse::<AssistantKind>().is_err());
        assert_eq!(AssistantKind::Local.to_string(), "local");
    }

    #[test]
    fn test_summarize_keeps_lead_paragraph() {
        let text = format!("Lead paragraph.\n\n{}", "tail ".repeat(100));
        let summary = local().summarize(&text, 40).unwrap();
        assert_eq!(summary, "Lead paragraph.");
    }

    #[test]
    fn test_answer_picks_related_sentence() {
        let context = "The deadline is next week. Bananas are yellow. Penguins live south.";
        let answer = local().answer_question("deadline", context).unwrap();
        assert!(answer.contains("The deadline is next week."), "{answer}");
    }

    #[test]
    fn test_answer_empty_context() {
        assert_eq!(local().answer_question("anything", "").unwrap(), "");
    }

    #[test]
    fn test_embed_matches_vectorizer() {
        let shared = SharedVectorizer::default();
        let assistant = LocalAssistant::new(shared.clone());
        assert_eq!(assistant.embed("weekly review").unwrap(), shared.embed("weekly review"));
        assert_eq!(assistant.name(), "local");
    }
}
