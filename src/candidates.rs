//! Fuzzy correction-candidate generation.
//!
//! Independent passes over the lexicon and the user dictionary, unioned
//! and deduplicated by lowercase word before scoring:
//! 1. exact match (distance 0)
//! 2. Damerau-Levenshtein neighbors within the edit budget, scanning only
//!    words whose length is within that budget of the token
//! 3. keyboard-proximity score attached to every candidate
//! 4. character-set (Jaccard) pattern matches, which admit candidates the
//!    edit budget rejects (heavy transpositions, doubled letters)
//! 5. user-dictionary words under the same fuzzy criteria, carrying a
//!    usage-based frequency boost
//!
//! The lexicon is scanned in frequency order and the scan stops after
//! `max_raw_candidates` hits, so the cap keeps the most frequent words.

use crate::fuzzy::{edit_distance, jaccard_chars, QWERTY};
use crate::lexicon::Lexicon;
use crate::userdict::UserDict;
use crate::{utils, Config};
use ahash::AHashMap;

/// Which pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    ExactMatch,
    EditDistance,
    PatternMatch,
    UserDictionary,
}

/// An unscored candidate with its raw signals.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub word: String,
    pub edit_distance: usize,
    /// Keyboard-proximity score in `[0, 1]`.
    pub proximity: f32,
    /// Generation-time frequency boost (user-dictionary candidates).
    pub freq_boost: f32,
    pub source: CandidateSource,
}

/// Stateless generator parameterized by the engine config.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    max_edit_distance: usize,
    min_token_length: usize,
    pattern_threshold: f32,
    max_raw_candidates: usize,
    user_freq_boost_per_use: f32,
    user_freq_boost_cap: f32,
}

impl CandidateGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            max_edit_distance: config.max_edit_distance,
            min_token_length: config.min_token_length,
            pattern_threshold: config.pattern_threshold,
            max_raw_candidates: config.max_raw_candidates,
            user_freq_boost_per_use: config.weights.user_freq_boost_per_use,
            user_freq_boost_cap: config.weights.user_freq_boost_cap,
        }
    }

    /// Generate deduplicated raw candidates for a typed token.
    ///
    /// Tokens shorter than the minimum length yield nothing.
    pub fn generate(
        &self,
        lexicon: &Lexicon,
        userdict: &UserDict,
        token: &str,
    ) -> Vec<RawCandidate> {
        let token = utils::fold(token);
        let token_len = token.chars().count();
        if token_len < self.min_token_length {
            return Vec::new();
        }

        let mut out: Vec<RawCandidate> = Vec::new();
        let mut seen: AHashMap<String, usize> = AHashMap::new();

        if lexicon.contains(&token) {
            seen.insert(token.clone(), out.len());
            out.push(RawCandidate {
                word: token.clone(),
                edit_distance: 0,
                proximity: 1.0,
                freq_boost: 0.0,
                source: CandidateSource::ExactMatch,
            });
        }

        // Scan same-length words first, then fan out one length at a time.
        'scan: for delta in 0..=self.max_edit_distance {
            let mut lens = vec![token_len + delta];
            if delta > 0 && token_len > delta {
                lens.push(token_len - delta);
            }
            for len in lens {
                for &idx in lexicon.indices_with_len(len) {
                    let Some(entry) = lexicon.entry_at(idx) else {
                        continue;
                    };
                    if seen.contains_key(&entry.word) {
                        continue;
                    }
                    let Some(candidate) = self.classify(&token, &entry.word) else {
                        continue;
                    };
                    seen.insert(entry.word.clone(), out.len());
                    out.push(candidate);
                    if out.len() >= self.max_raw_candidates {
                        break 'scan;
                    }
                }
            }
        }

        for (word, entry) in userdict.words_snapshot() {
            let boost = (entry.count as f32 * self.user_freq_boost_per_use)
                .min(self.user_freq_boost_cap);
            if let Some(&idx) = seen.get(&word) {
                out[idx].freq_boost += boost;
                continue;
            }
            let word_len = word.chars().count();
            if word_len.abs_diff(token_len) > self.max_edit_distance {
                continue;
            }
            let Some(mut candidate) = self.classify(&token, &word) else {
                continue;
            };
            candidate.freq_boost = boost;
            candidate.source = CandidateSource::UserDictionary;
            seen.insert(word, out.len());
            out.push(candidate);
        }

        out
    }

    /// Apply the fuzzy and pattern criteria to one pair; `None` when the
    /// word does not qualify as a candidate.
    fn classify(&self, token: &str, word: &str) -> Option<RawCandidate> {
        if word == token {
            return Some(RawCandidate {
                word: word.to_string(),
                edit_distance: 0,
                proximity: 1.0,
                freq_boost: 0.0,
                source: CandidateSource::ExactMatch,
            });
        }
        let dist = edit_distance(token, word);
        let within_budget = dist <= self.max_edit_distance;
        let pattern = jaccard_chars(token, word);
        if !within_budget && pattern <= self.pattern_threshold {
            return None;
        }
        Some(RawCandidate {
            word: word.to_string(),
            edit_distance: dist,
            proximity: QWERTY.proximity_score(token, word),
            freq_boost: 0.0,
            source: if within_budget {
                CandidateSource::EditDistance
            } else {
                CandidateSource::PatternMatch
            },
        })
    }
}
