//! Fuzzy Passage Matcher.
//!
//! Attributes a retrieved chunk to one of a set of known passages by the
//! length of the longest common contiguous substring. A candidate replaces the
//! running best only if its score is strictly greater than both the best so
//! far and the threshold, so among equal scores the first inserted candidate
//! wins.
//!
//! Two policies are in use:
//!
//! - [`PassageMatcher::unthresholded`]: any non-zero overlap is credited.
//! - [`PassageMatcher::default`]: at least [`DEFAULT_MATCH_THRESHOLD`] + 1
//!   shared characters are needed, against the gold passages of the query's
//!   own record.
//!
//! An unattributable chunk is an ordinary `None`, never an error.

pub mod candidates;
pub mod lcs;


pub use candidates::CandidateSet;
pub use lcs::longest_common_substring;

use tracing::debug;

use crate::constants::DEFAULT_MATCH_THRESHOLD;

/// Winning candidate of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageMatch<'a> {
    pub document_id: u64,
    /// Candidate text as stored in the [`CandidateSet`].
    pub text: &'a str,
    /// Longest common substring length, in characters.
    pub score: usize,
    /// A later candidate from a different document scored the same.
    pub ambiguous: bool,
}

/// Threshold-gated longest-common-substring matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageMatcher {
    min_score: usize,
}

impl Default for PassageMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl PassageMatcher {
    /// Scores must strictly exceed `min_score` to count.
    pub fn new(min_score: usize) -> Self {
        Self { min_score }
    }

    pub fn unthresholded() -> Self {
        Self::new(0)
    }

    pub fn min_score(&self) -> usize {
        self.min_score
    }

    pub fn find<'a>(&self, chunk: &str, candidates: &'a CandidateSet) -> Option<PassageMatch<'a>> {
        best_match(chunk, candidates, self.min_score)
    }

    /// Document id of the best match, if any candidate clears the bar.
    pub fn attribute(&self, chunk: &str, candidates: &CandidateSet) -> Option<u64> {
        self.find(chunk, candidates).map(|m| m.document_id)
    }
}

/// Finds the candidate sharing the longest contiguous run with `chunk`.
pub fn best_match<'a>(
    chunk: &str,
    candidates: &'a CandidateSet,
    min_score: usize,
) -> Option<PassageMatch<'a>> {
    let chunk_chars: Vec<char> = chunk.chars().collect();
    let mut best: Option<PassageMatch<'a>> = None;

    for (text, document_id) in candidates.iter() {
        let text_chars: Vec<char> = text.chars().collect();

        // The score can never exceed the shorter side; skip hopeless candidates
        // but still score those that could tie the current best.
        let ceiling = chunk_chars.len().min(text_chars.len());
        if ceiling <= min_score || best.is_some_and(|b| ceiling < b.score) {
            continue;
        }

        let score = lcs::lcs_chars(&chunk_chars, &text_chars);
        if score <= min_score {
            continue;
        }

        match best.as_mut() {
            Some(current) if score > current.score => {
                *current = PassageMatch {
                    document_id,
                    text,
                    score,
                    ambiguous: false,
                };
            }
            Some(current) => {
                if score == current.score && document_id != current.document_id {
                    current.ambiguous = true;
                }
            }
            None => {
                best = Some(PassageMatch {
                    document_id,
                    text,
                    score,
                    ambiguous: false,
                });
            }
        }
    }

    if let Some(found) = best.as_ref().filter(|m| m.ambiguous) {
        debug!(
            document_id = found.document_id,
            score = found.score,
            "Chunk ties gold passages from different documents; keeping first"
        );
    }

    best
}
