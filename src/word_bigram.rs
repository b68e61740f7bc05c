// src/word_bigram.rs
//
// Word-level bigram and trigram co-occurrence tables. Counts are observed
// as text is learned and bias suggestions toward contextually likely
// words; individual entries are never deleted, only bulk-reset.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entry in a word's follower distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerEntry {
    pub word: String,
    pub count: u32,
}

/// Word-pair co-occurrence counts: word1 -> [(word2, count), ...].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordBigram {
    data: HashMap<String, Vec<FollowerEntry>>,
}

impl WordBigram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed count for the pair, 0 if absent.
    pub fn count(&self, word1: &str, word2: &str) -> u32 {
        self.data
            .get(word1)
            .and_then(|entries| entries.iter().find(|e| e.word == word2))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Record an observation, incrementing an existing pair's count.
    pub fn observe(&mut self, word1: &str, word2: &str, count: u32) {
        let entries = self.data.entry(word1.to_string()).or_default();
        if let Some(e) = entries.iter_mut().find(|e| e.word == word2) {
            e.count = e.count.saturating_add(count);
        } else {
            entries.push(FollowerEntry {
                word: word2.to_string(),
                count,
            });
        }
    }

    /// Most frequent followers of `word1`, count-descending.
    pub fn next_words(&self, word1: &str, limit: usize) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .data
            .get(word1)
            .map(|entries| entries.iter().map(|e| (e.word.clone(), e.count)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out.truncate(limit);
        out
    }

    /// Number of distinct first words.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of distinct pairs.
    pub fn total_pairs(&self) -> usize {
        self.data.values().map(|v| v.len()).sum()
    }

    /// Bulk reset.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Word-triple co-occurrence counts keyed on the leading pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordTrigram {
    data: HashMap<(String, String), Vec<FollowerEntry>>,
}

impl WordTrigram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed count for the triple, 0 if absent.
    pub fn count(&self, word1: &str, word2: &str, word3: &str) -> u32 {
        self.data
            .get(&(word1.to_string(), word2.to_string()))
            .and_then(|entries| entries.iter().find(|e| e.word == word3))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Record an observation, incrementing an existing triple's count.
    pub fn observe(&mut self, word1: &str, word2: &str, word3: &str, count: u32) {
        let entries = self
            .data
            .entry((word1.to_string(), word2.to_string()))
            .or_default();
        if let Some(e) = entries.iter_mut().find(|e| e.word == word3) {
            e.count = e.count.saturating_add(count);
        } else {
            entries.push(FollowerEntry {
                word: word3.to_string(),
                count,
            });
        }
    }

    /// Most frequent followers of the pair, count-descending.
    pub fn next_words(&self, word1: &str, word2: &str, limit: usize) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .data
            .get(&(word1.to_string(), word2.to_string()))
            .map(|entries| entries.iter().map(|e| (e.word.clone(), e.count)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out.truncate(limit);
        out
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
