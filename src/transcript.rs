//! Picking the enhanced transcript out of agent output
//!
//! The agent does not label which of its outputs is the enhanced script, so
//! the choice is heuristic. Candidates are the job's top-level output
//! followed by every step output, in order. Strategies run in the
//! configured order and the first match wins; when none matches, a
//! non-empty top-level output is used as-is.

use serde::{Deserialize, Serialize};

/// One rule for recognising the enhanced transcript among candidate texts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptStrategy {
    /// First candidate with more characters than the submitted script
    LongerThanInput,
    /// Longest non-empty candidate; earlier candidates win ties
    Longest,
    /// First candidate longer than `min_len` mentioning any keyword
    Keywords {
        /// Minimum length in characters (exclusive)
        min_len: usize,
        /// Case-insensitive keywords
        keywords: Vec<String>,
    },
}

impl TranscriptStrategy {
    /// `keywords` with the stock word list
    pub fn default_keywords() -> Self {
        TranscriptStrategy::Keywords {
            min_len: 50,
            keywords: vec!["enhanced".into(), "script".into(), "text".into()],
        }
    }

    /// Apply this strategy to `candidates`
    pub fn pick<'a>(&self, candidates: &[&'a str], input: &str) -> Option<&'a str> {
        match self {
            TranscriptStrategy::LongerThanInput => {
                let input_len = input.chars().count();
                candidates
                    .iter()
                    .copied()
                    .find(|text| text.chars().count() > input_len)
            }
            TranscriptStrategy::Longest => candidates
                .iter()
                .copied()
                .filter(|text| !text.is_empty())
                .fold(None, |best: Option<&str>, text| match best {
                    Some(b) if b.chars().count() >= text.chars().count() => Some(b),
                    _ => Some(text),
                }),
            TranscriptStrategy::Keywords { min_len, keywords } => {
                let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
                candidates.iter().copied().find(|text| {
                    if text.chars().count() <= *min_len {
                        return false;
                    }
                    let lower = text.to_lowercase();
                    keywords.iter().any(|k| lower.contains(k.as_str()))
                })
            }
        }
    }
}

/// Select the enhanced transcript
///
/// `candidates[0]` is treated as the top-level output for the fallback.
pub fn select(strategies: &[TranscriptStrategy], candidates: &[&str], input: &str) -> Option<String> {
    for strategy in strategies {
        if let Some(text) = strategy.pick(candidates, input) {
            tracing::debug!(?strategy, chars = text.chars().count(), "selected enhanced transcript");
            return Some(text.to_string());
        }
    }

    let fallback = candidates.first().copied().filter(|text| !text.is_empty());
    if fallback.is_none() {
        tracing::debug!("no enhanced transcript found in agent output");
    }
    fallback.map(str::to_string)
}
