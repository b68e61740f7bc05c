//! User dictionary and rejection blacklist.
//!
//! Two backends behind the `UserDict` enum:
//! - `InMemory`: thread-safe map, used by tests and ephemeral sessions.
//! - `Redb`: persistent, transactional storage. This is the only state in
//!   the engine that must survive process restarts, so every write commits
//!   its own transaction.
//!
//! The facade is infallible: storage errors are logged and degrade to
//! no-op writes / empty reads so a failing disk never interrupts typing.
//!
//! Rejections are keyed on the exact `(original, candidate)` pair, both
//! lowercased. Rejecting one correction does not blacklist the candidate
//! word in general.

use crate::utils;
use ahash::AHashMap;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// word -> (usage count, last-used epoch seconds, user-added flag)
const WORDS_TABLE: TableDefinition<&str, (u64, u64, u8)> = TableDefinition::new("user_words");
/// (original, rejected candidate) -> ()
const REJECTIONS_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("rejected_corrections");

/// A learned word's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWordEntry {
    /// Times the word was used or accepted. Starts at 1, never decreases.
    pub count: u64,
    /// Last use, epoch seconds.
    pub last_used: u64,
    /// True for explicit additions, false for implicit learning.
    pub user_added: bool,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Words under 2 chars or containing digits are noise, not vocabulary.
fn learnable(word: &str) -> bool {
    word.chars().count() >= 2 && !word.chars().any(|c| c.is_ascii_digit())
}

/// Thread-safe in-memory user dictionary.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserDict {
    words: Arc<RwLock<AHashMap<String, UserWordEntry>>>,
    rejections: Arc<RwLock<HashSet<(String, String)>>>,
}

impl InMemoryUserDict {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert(&self, word: &str, user_added: bool) {
        if let Ok(mut words) = self.words.write() {
            words
                .entry(word.to_string())
                .and_modify(|e| {
                    e.count = e.count.saturating_add(1);
                    e.last_used = now_secs();
                    e.user_added |= user_added;
                })
                .or_insert_with(|| UserWordEntry {
                    count: 1,
                    last_used: now_secs(),
                    user_added,
                });
        }
    }

    fn entry(&self, word: &str) -> Option<UserWordEntry> {
        self.words.read().ok()?.get(word).cloned()
    }

    fn snapshot(&self) -> Vec<(String, UserWordEntry)> {
        self.words
            .read()
            .map(|w| w.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.words.read().map(|w| w.len()).unwrap_or(0)
    }

    fn clear_words(&self) {
        if let Ok(mut words) = self.words.write() {
            words.clear();
        }
    }

    fn add_rejection(&self, original: &str, candidate: &str) {
        if let Ok(mut r) = self.rejections.write() {
            r.insert((original.to_string(), candidate.to_string()));
        }
    }

    fn has_rejection(&self, original: &str, candidate: &str) -> bool {
        self.rejections
            .read()
            .map(|r| r.contains(&(original.to_string(), candidate.to_string())))
            .unwrap_or(false)
    }

    fn rejection_count(&self) -> usize {
        self.rejections.read().map(|r| r.len()).unwrap_or(0)
    }

    fn clear_rejections(&self) {
        if let Ok(mut r) = self.rejections.write() {
            r.clear();
        }
    }
}

/// Redb-backed user dictionary. Each write is its own committed
/// transaction, so state is crash-safe without an explicit flush.
#[derive(Clone)]
pub struct RedbUserDict {
    db: Arc<Database>,
}

impl RedbUserDict {
    /// Create or open the database at `path`, ensuring both tables exist.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, redb::Error> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = Database::create(path.as_ref())?;
        let txn = db.begin_write()?;
        {
            txn.open_table(WORDS_TABLE)?;
            txn.open_table(REJECTIONS_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn upsert(&self, word: &str, user_added: bool) -> Result<(), redb::Error> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(WORDS_TABLE)?;
            let existing = table.get(word)?.map(|g| g.value());
            let next = match existing {
                Some((count, _, added)) => (
                    count.saturating_add(1),
                    now_secs(),
                    if user_added { 1 } else { added },
                ),
                None => (1, now_secs(), u8::from(user_added)),
            };
            table.insert(word, next)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn entry(&self, word: &str) -> Result<Option<UserWordEntry>, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(WORDS_TABLE)?;
        Ok(table.get(word)?.map(|g| {
            let (count, last_used, added) = g.value();
            UserWordEntry {
                count,
                last_used,
                user_added: added != 0,
            }
        }))
    }

    fn snapshot(&self) -> Result<Vec<(String, UserWordEntry)>, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(WORDS_TABLE)?;
        let mut out = Vec::new();
        for item in table.iter()? {
            let (k, v) = item?;
            let (count, last_used, added) = v.value();
            out.push((
                k.value().to_string(),
                UserWordEntry {
                    count,
                    last_used,
                    user_added: added != 0,
                },
            ));
        }
        Ok(out)
    }

    fn len(&self) -> Result<u64, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(WORDS_TABLE)?;
        Ok(table.len()?)
    }

    fn clear_words(&self) -> Result<(), redb::Error> {
        let txn = self.db.begin_write()?;
        txn.delete_table(WORDS_TABLE)?;
        txn.open_table(WORDS_TABLE)?;
        txn.commit()?;
        Ok(())
    }

    fn add_rejection(&self, original: &str, candidate: &str) -> Result<(), redb::Error> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REJECTIONS_TABLE)?;
            table.insert((original, candidate), ())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn has_rejection(&self, original: &str, candidate: &str) -> Result<bool, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REJECTIONS_TABLE)?;
        Ok(table.get((original, candidate))?.is_some())
    }

    fn rejection_count(&self) -> Result<u64, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REJECTIONS_TABLE)?;
        Ok(table.len()?)
    }

    fn clear_rejections(&self) -> Result<(), redb::Error> {
        let txn = self.db.begin_write()?;
        txn.delete_table(REJECTIONS_TABLE)?;
        txn.open_table(REJECTIONS_TABLE)?;
        txn.commit()?;
        Ok(())
    }
}

/// Backend-switching user dictionary handle. Cheap to clone; clones share
/// state.
#[derive(Clone)]
pub enum UserDict {
    InMemory(InMemoryUserDict),
    Redb(RedbUserDict),
}

impl UserDict {
    /// In-memory dictionary for tests and ephemeral sessions.
    pub fn new_in_memory() -> Self {
        UserDict::InMemory(InMemoryUserDict::new())
    }

    /// Persistent dictionary at `path`.
    pub fn new_redb<P: AsRef<Path>>(path: P) -> Result<Self, redb::Error> {
        Ok(UserDict::Redb(RedbUserDict::new(path)?))
    }

    /// Record an implicit use of a word: increments its count or inserts
    /// it with count 1, updating the last-used timestamp.
    pub fn learn_word(&self, word: &str) {
        let word = utils::fold(word);
        if !learnable(&word) {
            debug!("not learnable, skipping: '{word}'");
            return;
        }
        match self {
            UserDict::InMemory(m) => m.upsert(&word, false),
            UserDict::Redb(r) => {
                if let Err(e) = r.upsert(&word, false) {
                    warn!("user dict write failed for '{word}': {e}");
                }
            }
        }
    }

    /// Explicitly add a word on the user's behalf; marks it `user_added`.
    pub fn add_word(&self, word: &str) {
        let word = utils::fold(word);
        if !learnable(&word) {
            debug!("not learnable, skipping: '{word}'");
            return;
        }
        match self {
            UserDict::InMemory(m) => m.upsert(&word, true),
            UserDict::Redb(r) => {
                if let Err(e) = r.upsert(&word, true) {
                    warn!("user dict write failed for '{word}': {e}");
                }
            }
        }
    }

    /// Full entry for a word, if learned.
    pub fn entry(&self, word: &str) -> Option<UserWordEntry> {
        let word = utils::fold(word);
        match self {
            UserDict::InMemory(m) => m.entry(&word),
            UserDict::Redb(r) => r.entry(&word).unwrap_or_else(|e| {
                warn!("user dict read failed for '{word}': {e}");
                None
            }),
        }
    }

    pub fn has_learned_word(&self, word: &str) -> bool {
        self.entry(word).is_some()
    }

    /// Usage count, 0 when the word was never learned.
    pub fn get_word_count(&self, word: &str) -> u64 {
        self.entry(word).map(|e| e.count).unwrap_or(0)
    }

    /// All learned words with metadata.
    pub fn words_snapshot(&self) -> Vec<(String, UserWordEntry)> {
        match self {
            UserDict::InMemory(m) => m.snapshot(),
            UserDict::Redb(r) => r.snapshot().unwrap_or_else(|e| {
                warn!("user dict snapshot failed: {e}");
                Vec::new()
            }),
        }
    }

    /// Most-used learned words, count-descending.
    pub fn top_words(&self, limit: usize) -> Vec<String> {
        let mut words = self.words_snapshot();
        words.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        words.truncate(limit);
        words.into_iter().map(|(w, _)| w).collect()
    }

    pub fn word_count_total(&self) -> usize {
        match self {
            UserDict::InMemory(m) => m.len(),
            UserDict::Redb(r) => r.len().unwrap_or(0) as usize,
        }
    }

    /// Remove every learned word. Rejections are kept.
    pub fn clear_all_words(&self) {
        match self {
            UserDict::InMemory(m) => m.clear_words(),
            UserDict::Redb(r) => {
                if let Err(e) = r.clear_words() {
                    warn!("user dict clear failed: {e}");
                }
            }
        }
    }

    /// Record that the user rejected `candidate` as a correction of
    /// `original`. Additive and permanent until `clear_rejections`.
    pub fn record_rejection(&self, original: &str, candidate: &str) {
        let (original, candidate) = (utils::fold(original), utils::fold(candidate));
        debug!("rejected correction '{original}' -> '{candidate}'");
        match self {
            UserDict::InMemory(m) => m.add_rejection(&original, &candidate),
            UserDict::Redb(r) => {
                if let Err(e) = r.add_rejection(&original, &candidate) {
                    warn!("rejection write failed: {e}");
                }
            }
        }
    }

    /// True only for the exact rejected pair.
    pub fn is_blacklisted(&self, original: &str, candidate: &str) -> bool {
        let (original, candidate) = (utils::fold(original), utils::fold(candidate));
        match self {
            UserDict::InMemory(m) => m.has_rejection(&original, &candidate),
            UserDict::Redb(r) => r.has_rejection(&original, &candidate).unwrap_or_else(|e| {
                warn!("rejection read failed: {e}");
                false
            }),
        }
    }

    pub fn rejection_count(&self) -> usize {
        match self {
            UserDict::InMemory(m) => m.rejection_count(),
            UserDict::Redb(r) => r.rejection_count().unwrap_or(0) as usize,
        }
    }

    pub fn clear_rejections(&self) {
        match self {
            UserDict::InMemory(m) => m.clear_rejections(),
            UserDict::Redb(r) => {
                if let Err(e) = r.clear_rejections() {
                    warn!("rejection clear failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learn_word_counts_uses() {
        let d = UserDict::new_in_memory();
        assert!(!d.has_learned_word("banana"));
        d.learn_word("banana");
        d.learn_word("banana");
        d.learn_word("banana");
        assert!(d.has_learned_word("banana"));
        assert_eq!(d.get_word_count("banana"), 3);
        let entry = d.entry("banana").unwrap();
        assert!(!entry.user_added);
        assert!(entry.last_used > 0);
    }

    #[test]
    fn short_or_numeric_words_are_ignored() {
        let d = UserDict::new_in_memory();
        d.learn_word("a");
        d.learn_word("h4x");
        assert_eq!(d.word_count_total(), 0);
    }

    #[test]
    fn add_word_sets_user_added_flag() {
        let d = UserDict::new_in_memory();
        d.learn_word("squee");
        assert!(!d.entry("squee").unwrap().user_added);
        d.add_word("squee");
        let entry = d.entry("squee").unwrap();
        assert!(entry.user_added);
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn blacklist_matches_exact_pair_only() {
        let d = UserDict::new_in_memory();
        d.record_rejection("teh", "the");
        assert!(d.is_blacklisted("teh", "the"));
        assert!(d.is_blacklisted("Teh", "THE"));
        // Only the exact pair is suppressed, not the candidate in general.
        assert!(!d.is_blacklisted("hte", "the"));
        assert!(!d.is_blacklisted("teh", "then"));

        d.clear_rejections();
        assert!(!d.is_blacklisted("teh", "the"));
    }

    #[test]
    fn top_words_sorted_by_count() {
        let d = UserDict::new_in_memory();
        for _ in 0..3 {
            d.learn_word("gamma");
        }
        d.learn_word("delta");
        let top = d.top_words(1);
        assert_eq!(top, vec!["gamma"]);
    }

    #[test]
    fn redb_backend_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("keycorrect_ud_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("userdict.redb");

        {
            let d = UserDict::new_redb(&path).unwrap();
            d.learn_word("persistent");
            d.learn_word("persistent");
            d.record_rejection("teh", "the");
        }

        let d = UserDict::new_redb(&path).unwrap();
        assert_eq!(d.get_word_count("persistent"), 2);
        assert!(d.is_blacklisted("teh", "the"));
        assert_eq!(d.rejection_count(), 1);

        d.clear_all_words();
        assert_eq!(d.word_count_total(), 0);
        assert!(d.is_blacklisted("teh", "the"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
