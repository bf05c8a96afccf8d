//! Keyword verification of assistant responses
//!
//! Matching is case-insensitive substring containment; how many keywords
//! must match is a per-use-case [`MatchPolicy`] because a generative
//! responder paraphrases rather than echoing terms.

use serde::{Deserialize, Serialize};

/// Minimum number of expected keywords a response must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MatchPolicy {
    /// At least one keyword
    #[default]
    Lenient,
    /// At least half of the keywords, rounded up
    Strict,
    /// Fixed minimum, capped at the number of keywords
    AtLeast(usize),
}

impl MatchPolicy {
    /// Matches required for a keyword set of the given size
    pub fn required(&self, keyword_count: usize) -> usize {
        match self {
            MatchPolicy::Lenient => keyword_count.min(1),
            MatchPolicy::Strict => keyword_count.div_ceil(2),
            MatchPolicy::AtLeast(n) => (*n).min(keyword_count),
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Lenient => write!(f, "lenient"),
            MatchPolicy::Strict => write!(f, "strict"),
            MatchPolicy::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub matched: Vec<String>,
    pub missed: Vec<String>,
    pub required: usize,
    pub passed: bool,
}

impl VerificationResult {
    pub fn summary(&self) -> String {
        let total = self.matched.len() + self.missed.len();
        let mut s = format!("Keywords matched: {}/{}", self.matched.len(), total);
        if !self.missed.is_empty() {
            s.push_str(&format!(" (missing: {})", self.missed.join(", ")));
        }
        s
    }
}

/// Score a response against expected keywords
///
/// Every non-blank keyword lands in exactly one of `matched` or `missed`,
/// in the order given. Blank keywords are ignored.
pub fn score(response: &str, expected: &[String], policy: MatchPolicy) -> VerificationResult {
    let haystack = response.to_lowercase();
    let (matched, missed): (Vec<String>, Vec<String>) = expected
        .iter()
        .filter(|k| !k.trim().is_empty())
        .cloned()
        .partition(|k| haystack.contains(&k.to_lowercase()));

    let total = matched.len() + missed.len();
    let required = policy.required(total);
    VerificationResult {
        passed: total > 0 && matched.len() >= required,
        matched,
        missed,
        required,
    }
}
