//! Composite candidate scoring and final ranking.
//!
//! The score combines log-scaled word frequency, edit-distance and
//! length penalties, bigram context, keyboard proximity, path bonuses
//! (transliteration, native script, exact match) and the user-dictionary
//! boost. All weights come from `ScoreWeights` and are tunable.

use crate::candidates::RawCandidate;
use crate::lexicon::Lexicon;
use crate::userdict::UserDict;
use crate::{utils, Config, ScoreWeights};

/// A ranked suggestion. Ephemeral: recomputed per query, retained only by
/// the suggestion cache until the next learning event.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub word: String,
    pub score: f32,
    /// True when the suggestion differs from what was typed.
    pub is_correction: bool,
    pub source_language: String,
}

/// Query-level signals that apply to every candidate of one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreSignals<'a> {
    /// Previous word, for bigram context.
    pub prev_word: Option<&'a str>,
    /// Candidate came through the transliteration path.
    pub is_transliteration_path: bool,
    /// Target language is a native (non-Latin) script.
    pub is_native_script: bool,
}

/// Scores raw candidates and produces the final ranking.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoreWeights,
    max_suggestions: usize,
}

impl Scorer {
    pub fn new(config: &Config) -> Self {
        Self {
            weights: config.weights.clone(),
            max_suggestions: config.max_suggestions,
        }
    }

    /// Composite score for one candidate against the typed token.
    ///
    /// `token` must be in folded form (see `utils::fold`).
    pub fn score(
        &self,
        lexicon: &Lexicon,
        userdict: &UserDict,
        token: &str,
        candidate: &RawCandidate,
        signals: &ScoreSignals,
    ) -> f32 {
        let w = &self.weights;
        let freq = lexicon.frequency(&candidate.word) as f32;
        let mut score = w.frequency * ((1.0 + freq).ln() + candidate.freq_boost);

        score -= w.edit_distance * candidate.edit_distance as f32;

        let len_diff = candidate
            .word
            .chars()
            .count()
            .abs_diff(token.chars().count());
        score -= w.length_diff * len_diff as f32;

        if let Some(prev) = signals.prev_word {
            let bigram = lexicon.bigram_count(&utils::fold(prev), &candidate.word) as f32;
            if bigram > 0.0 {
                score += w.bigram * (1.0 + bigram).ln();
            }
        }

        score += w.keyboard_proximity * candidate.proximity;

        if signals.is_transliteration_path {
            score += w.transliteration;
        }
        if signals.is_native_script {
            score += w.native_script;
        }
        if candidate.word == token {
            score += w.exact_match;
        }

        if let Some(entry) = userdict.entry(&candidate.word) {
            score += w.user_base
                + (entry.count as f32 * w.user_per_use).min(w.user_per_use_cap);
        }

        score
    }

    /// Sort descending by score, drop case-insensitive duplicates keeping
    /// the best-scored one, cap to the configured maximum.
    pub fn rank(&self, mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut seen: Vec<String> = Vec::new();
        suggestions.retain(|s| {
            let key = s.word.to_lowercase();
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });
        suggestions.truncate(self.max_suggestions);
        suggestions
    }
}
