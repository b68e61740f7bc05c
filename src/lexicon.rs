//! Per-language lexicon storage and the multi-language store.
//!
//! A `Lexicon` holds one language's word/frequency table behind an `fst`
//! index (exact and prefix lookups), length buckets for fuzzy scans, a
//! misspelling -> correction map, bigram/trigram co-occurrence tables and,
//! for non-Latin languages, a romanization table.
//!
//! `LexiconStore` is the per-language registry. Languages load lazily on
//! background threads; a query against a language that is still loading
//! returns a best-effort empty result instead of blocking the typing path.
//! Missing or corrupt assets fall back to a small built-in vocabulary for
//! the default language and are logged as warnings, never surfaced as
//! errors to the caller.
//!
//! Asset layout per language under one directory:
//! - `{lang}_words.tsv`        word `\t` frequency
//! - `{lang}_bigrams.tsv`      word1 `\t` word2 `\t` frequency
//! - `{lang}_corrections.json` `{"corrections": {"typo": "fix", ...}}`
//! - `{lang}_translit.tsv`     roman `\t` native (optional)

use crate::translit::TranslitTable;
use crate::utils;
use crate::word_bigram::{WordBigram, WordTrigram};
use ahash::AHashMap;
use anyhow::{bail, Context as _, Result};
use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Map, Streamer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// A single lexicon entry. Words are stored lowercase-normalized and are
/// unique within a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexEntry {
    pub word: String,
    pub freq: u32,
}

/// Fallback vocabulary installed for the default language when its assets
/// are missing or unreadable. Frequencies are relative, not corpus-exact.
const CORE_VOCABULARY: &[(&str, u32)] = &[
    ("the", 25000),
    ("to", 23000),
    ("and", 22000),
    ("of", 21000),
    ("a", 20000),
    ("in", 17000),
    ("is", 12000),
    ("it", 11000),
    ("you", 10500),
    ("that", 10000),
    ("he", 9500),
    ("was", 9200),
    ("for", 9000),
    ("on", 8700),
    ("are", 8500),
    ("with", 8200),
    ("as", 8000),
    ("his", 7500),
    ("they", 7200),
    ("be", 7000),
    ("at", 6800),
    ("one", 6600),
    ("have", 6400),
    ("this", 6200),
    ("from", 6000),
    ("had", 5600),
    ("not", 5200),
    ("but", 5000),
    ("what", 4800),
    ("all", 4600),
    ("were", 4400),
    ("when", 4200),
    ("your", 4000),
    ("can", 3800),
    ("said", 3600),
    ("there", 3400),
    ("use", 3200),
    ("each", 3000),
    ("which", 2900),
    ("she", 2800),
    ("how", 2700),
    ("their", 2600),
    ("will", 2500),
    ("other", 2400),
    ("about", 2300),
    ("out", 2200),
    ("many", 2100),
    ("then", 2000),
    ("them", 1900),
    ("these", 1800),
    ("some", 1700),
    ("would", 1600),
    ("time", 1500),
    ("want", 1400),
    ("because", 1300),
    ("could", 1200),
    ("should", 1100),
    ("friend", 1000),
    ("receive", 950),
    ("separate", 900),
    ("definitely", 850),
    ("beginning", 800),
    ("occurred", 750),
    ("quick", 700),
    ("hello", 650),
    ("world", 600),
];

/// Common-typo pairs shipped with the engine. These double as the
/// corrections map of the built-in fallback vocabulary and as the last
/// resort of `CorrectionEngine::get_best_suggestion` for the default
/// language.
pub(crate) const BUILTIN_TYPOS: &[(&str, &str)] = &[
    ("teh", "the"),
    ("hte", "the"),
    ("adn", "and"),
    ("nad", "and"),
    ("taht", "that"),
    ("thta", "that"),
    ("waht", "what"),
    ("wnat", "want"),
    ("tiem", "time"),
    ("thier", "their"),
    ("recieve", "receive"),
    ("recive", "receive"),
    ("seperate", "separate"),
    ("definately", "definitely"),
    ("occured", "occurred"),
    ("begining", "beginning"),
    ("wich", "which"),
    ("whcih", "which"),
    ("freind", "friend"),
    ("frined", "friend"),
    ("becuase", "because"),
    ("becasue", "because"),
    ("coudl", "could"),
    ("woudl", "would"),
    ("shoudl", "should"),
    ("dont", "don't"),
    ("cant", "can't"),
    ("wont", "won't"),
    ("didnt", "didn't"),
    ("doesnt", "doesn't"),
    ("isnt", "isn't"),
    ("arent", "aren't"),
    ("wasnt", "wasn't"),
    ("werent", "weren't"),
    ("hasnt", "hasn't"),
    ("havent", "haven't"),
    ("hadnt", "hadn't"),
    ("youre", "you're"),
    ("theyre", "they're"),
];

/// Serializable form of a lexicon, used for compiled snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LexiconData {
    words: Vec<LexEntry>,
    corrections: HashMap<String, String>,
    bigrams: WordBigram,
    trigrams: WordTrigram,
    translit: Option<TranslitTable>,
}

/// One language's word and frequency tables.
#[derive(Debug)]
pub struct Lexicon {
    /// Entries in descending frequency order as loaded; the fst index maps
    /// words to positions in this vector.
    entries: Vec<LexEntry>,
    index: Map<Vec<u8>>,
    /// Char-length -> entry positions, in the same frequency order.
    by_len: AHashMap<usize, Vec<u32>>,
    corrections: HashMap<String, String>,
    bigrams: WordBigram,
    trigrams: WordTrigram,
    translit: Option<TranslitTable>,
    max_freq: u32,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: Map::default(),
            by_len: AHashMap::new(),
            corrections: HashMap::new(),
            bigrams: WordBigram::new(),
            trigrams: WordTrigram::new(),
            translit: None,
            max_freq: 0,
        }
    }
}

impl Lexicon {
    /// Build a lexicon from raw word/frequency pairs.
    ///
    /// Words are lowercase-normalized; duplicates merge by summing their
    /// frequencies, preserving the per-(language, word) uniqueness rule.
    pub fn from_entries<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        Self::from_parts(
            words,
            HashMap::new(),
            WordBigram::new(),
            WordTrigram::new(),
            None,
        )
    }

    fn from_parts<I, S>(
        words: I,
        corrections: HashMap<String, String>,
        bigrams: WordBigram,
        trigrams: WordTrigram,
        translit: Option<TranslitTable>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut merged: AHashMap<String, u32> = AHashMap::new();
        for (word, freq) in words {
            let word = utils::fold(word.as_ref());
            if word.is_empty() {
                continue;
            }
            let slot = merged.entry(word).or_insert(0);
            *slot = slot.saturating_add(freq.max(1));
        }

        let mut entries: Vec<LexEntry> = merged
            .into_iter()
            .map(|(word, freq)| LexEntry { word, freq })
            .collect();
        entries.sort_by(|a, b| b.freq.cmp(&a.freq).then_with(|| a.word.cmp(&b.word)));

        let mut keyed: Vec<(String, u64)> = entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.word.clone(), idx as u64))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let index = Map::from_iter(keyed).context("building lexicon word index")?;

        let mut by_len: AHashMap<usize, Vec<u32>> = AHashMap::new();
        for (idx, e) in entries.iter().enumerate() {
            by_len
                .entry(e.word.chars().count())
                .or_default()
                .push(idx as u32);
        }

        let max_freq = entries.iter().map(|e| e.freq).max().unwrap_or(0);

        Ok(Self {
            entries,
            index,
            by_len,
            corrections,
            bigrams,
            trigrams,
            translit,
            max_freq,
        })
    }

    /// The built-in core vocabulary with the shipped typo table.
    pub fn builtin_core() -> Self {
        let corrections = BUILTIN_TYPOS
            .iter()
            .map(|(typo, fix)| (typo.to_string(), fix.to_string()))
            .collect();
        match Self::from_parts(
            CORE_VOCABULARY.iter().map(|&(w, f)| (w, f)),
            corrections,
            WordBigram::new(),
            WordTrigram::new(),
            None,
        ) {
            Ok(lex) => lex,
            Err(e) => {
                warn!("built-in vocabulary failed to index: {e}");
                Self::default()
            }
        }
    }

    /// Load one language's assets from `asset_dir`.
    ///
    /// The words file is required; bigrams, corrections and translit rules
    /// are optional. Malformed lines/files are skipped and counted, the
    /// rest of each file still loads.
    pub fn load_dir(asset_dir: &Path, language: &str) -> Result<Self> {
        let words_path = asset_dir.join(format!("{language}_words.tsv"));
        let content = std::fs::read_to_string(&words_path)
            .with_context(|| format!("reading {}", words_path.display()))?;

        let mut words: Vec<(String, u32)> = Vec::new();
        let mut skipped = 0usize;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('\t') {
                Some((word, freq)) => match freq.trim().parse::<u32>() {
                    Ok(freq) if !word.trim().is_empty() => {
                        words.push((word.trim().to_string(), freq));
                    }
                    _ => skipped += 1,
                },
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("{language}: skipped {skipped} malformed word entries");
        }
        if words.is_empty() {
            bail!("{} contains no usable entries", words_path.display());
        }

        let corrections = Self::load_corrections(asset_dir, language);
        let bigrams = Self::load_bigrams(asset_dir, language);
        let translit = Self::load_translit(asset_dir, language);

        Self::from_parts(words, corrections, bigrams, WordTrigram::new(), translit)
    }

    fn load_corrections(asset_dir: &Path, language: &str) -> HashMap<String, String> {
        #[derive(Deserialize)]
        struct CorrectionsFile {
            corrections: HashMap<String, String>,
        }

        let path = asset_dir.join(format!("{language}_corrections.json"));
        if !path.exists() {
            return HashMap::new();
        }
        let parsed: Result<CorrectionsFile> = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str(&s).map_err(anyhow::Error::from));
        match parsed {
            Ok(file) => file
                .corrections
                .into_iter()
                .map(|(k, v)| (utils::fold(&k), utils::fold(&v)))
                .collect(),
            Err(e) => {
                warn!("{language}: corrections file unusable: {e}");
                HashMap::new()
            }
        }
    }

    fn load_bigrams(asset_dir: &Path, language: &str) -> WordBigram {
        let path = asset_dir.join(format!("{language}_bigrams.tsv"));
        let mut bigrams = WordBigram::new();
        let Ok(content) = std::fs::read_to_string(&path) else {
            return bigrams;
        };
        let mut skipped = 0usize;
        for line in content.lines() {
            let mut parts = line.trim().split('\t');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(w1), Some(w2), Some(freq)) if !w1.is_empty() && !w2.is_empty() => {
                    match freq.trim().parse::<u32>() {
                        Ok(freq) => bigrams.observe(&utils::fold(w1), &utils::fold(w2), freq),
                        Err(_) => skipped += 1,
                    }
                }
                _ => {
                    if !line.trim().is_empty() {
                        skipped += 1;
                    }
                }
            }
        }
        if skipped > 0 {
            debug!("{language}: skipped {skipped} malformed bigram entries");
        }
        bigrams
    }

    fn load_translit(asset_dir: &Path, language: &str) -> Option<TranslitTable> {
        let path = asset_dir.join(format!("{language}_translit.tsv"));
        let content = std::fs::read_to_string(&path).ok()?;
        let pairs: Vec<(String, String)> = content
            .lines()
            .filter_map(|line| {
                let (roman, native) = line.trim().split_once('\t')?;
                if roman.is_empty() || native.is_empty() {
                    return None;
                }
                Some((roman.to_lowercase(), native.to_string()))
            })
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(TranslitTable::from_rules(pairs))
        }
    }

    /// Save a compiled snapshot with bincode.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = LexiconData {
            words: self.entries.clone(),
            corrections: self.corrections.clone(),
            bigrams: self.bigrams.clone(),
            trigrams: self.trigrams.clone(),
            translit: self.translit.clone(),
        };
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &data)?;
        Ok(())
    }

    /// Load a compiled snapshot produced by `save_bincode`.
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let data: LexiconData = bincode::deserialize_from(reader)?;
        Self::from_parts(
            data.words.into_iter().map(|e| (e.word, e.freq)),
            data.corrections,
            data.bigrams,
            data.trigrams,
            data.translit,
        )
    }

    /// Whether the word (folded form) is present.
    pub fn contains(&self, word: &str) -> bool {
        self.index.get(word).is_some()
    }

    /// Word frequency, 0 if absent. Loaded words always have freq >= 1.
    pub fn frequency(&self, word: &str) -> u32 {
        self.index
            .get(word)
            .and_then(|idx| self.entries.get(idx as usize))
            .map(|e| e.freq)
            .unwrap_or(0)
    }

    /// Highest frequency in the lexicon.
    pub fn max_frequency(&self) -> u32 {
        self.max_freq
    }

    /// Increment a word's frequency in place. Returns false when the word
    /// is not in the lexicon; new words belong in the user dictionary.
    pub fn increment_frequency(&mut self, word: &str, delta: u32) -> bool {
        let Some(idx) = self.index.get(word) else {
            return false;
        };
        if let Some(entry) = self.entries.get_mut(idx as usize) {
            entry.freq = entry.freq.saturating_add(delta);
            self.max_freq = self.max_freq.max(entry.freq);
            true
        } else {
            false
        }
    }

    /// Prefix completions ordered by frequency descending.
    pub fn prefix_candidates(&self, prefix: &str, limit: usize) -> Vec<String> {
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }
        let matcher = Str::new(prefix).starts_with();
        let mut stream = self.index.search(matcher).into_stream();
        let mut hits: Vec<u32> = Vec::new();
        while let Some((_, idx)) = stream.next() {
            hits.push(idx as u32);
        }
        hits.sort_by(|&a, &b| {
            let (fa, fb) = (self.entries[a as usize].freq, self.entries[b as usize].freq);
            fb.cmp(&fa)
        });
        hits.truncate(limit);
        hits.into_iter()
            .map(|idx| self.entries[idx as usize].word.clone())
            .collect()
    }

    /// All entries, in load (frequency-descending) order.
    pub fn entries(&self) -> &[LexEntry] {
        &self.entries
    }

    /// Entry positions for words of exactly `len` chars, frequency order.
    pub fn indices_with_len(&self, len: usize) -> &[u32] {
        self.by_len.get(&len).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entry at a position returned by `indices_with_len`.
    pub fn entry_at(&self, idx: u32) -> Option<&LexEntry> {
        self.entries.get(idx as usize)
    }

    /// Correction-table hit for a misspelling.
    pub fn correction_for(&self, word: &str) -> Option<&str> {
        self.corrections.get(word).map(String::as_str)
    }

    pub fn corrections_len(&self) -> usize {
        self.corrections.len()
    }

    pub fn bigram_count(&self, w1: &str, w2: &str) -> u32 {
        self.bigrams.count(w1, w2)
    }

    pub fn observe_bigram(&mut self, w1: &str, w2: &str) {
        self.bigrams.observe(w1, w2, 1);
    }

    pub fn trigram_count(&self, w1: &str, w2: &str, w3: &str) -> u32 {
        self.trigrams.count(w1, w2, w3)
    }

    pub fn observe_trigram(&mut self, w1: &str, w2: &str, w3: &str) {
        self.trigrams.observe(w1, w2, w3, 1);
    }

    /// Most frequent bigram followers of `prev`.
    pub fn next_words(&self, prev: &str, limit: usize) -> Vec<(String, u32)> {
        self.bigrams.next_words(prev, limit)
    }

    /// Romanization table for transliterated languages.
    pub fn translit(&self) -> Option<&TranslitTable> {
        self.translit.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
enum LanguageSlot {
    Loading,
    Ready(Arc<RwLock<Lexicon>>),
}

struct StoreInner {
    asset_dir: PathBuf,
    default_language: String,
    languages: RwLock<AHashMap<String, LanguageSlot>>,
    /// Bumped whenever a language becomes ready or is cleared; the engine
    /// uses it to drop cached suggestions computed against older state.
    generation: AtomicU64,
}

/// Per-language lexicon registry with lazy background loading.
///
/// Cheap to clone; clones share state. All query methods are best-effort:
/// an unloaded language triggers a background load and yields an empty
/// result immediately.
#[derive(Clone)]
pub struct LexiconStore {
    inner: Arc<StoreInner>,
}

impl LexiconStore {
    pub fn new<P: Into<PathBuf>>(asset_dir: P, default_language: &str) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                asset_dir: asset_dir.into(),
                default_language: default_language.to_string(),
                languages: RwLock::new(AHashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start loading a language in the background. Idempotent; returns
    /// immediately. Callers observing an unloaded language should return
    /// best-effort results rather than wait.
    pub fn load(&self, language: &str) {
        {
            let Ok(mut langs) = self.inner.languages.write() else {
                return;
            };
            if langs.contains_key(language) {
                return;
            }
            langs.insert(language.to_string(), LanguageSlot::Loading);
        }

        let store = self.clone();
        let language = language.to_string();
        std::thread::spawn(move || {
            let lexicon = store.load_or_fallback(&language);
            store.finish_load(&language, lexicon);
        });
    }

    /// Load a language on the calling thread. Used by tests and tools;
    /// the request-serving path uses `load`.
    pub fn load_blocking(&self, language: &str) {
        if self.is_loaded(language) {
            return;
        }
        let lexicon = self.load_or_fallback(language);
        self.finish_load(language, lexicon);
    }

    /// Install a pre-built lexicon, replacing any existing one. Embedders
    /// with compiled snapshots use this instead of asset loading.
    pub fn install(&self, language: &str, lexicon: Lexicon) {
        self.finish_load(language, lexicon);
    }

    fn load_or_fallback(&self, language: &str) -> Lexicon {
        match Lexicon::load_dir(&self.inner.asset_dir, language) {
            Ok(lexicon) => {
                debug!("{language}: loaded {} words", lexicon.len());
                lexicon
            }
            Err(e) => {
                warn!("{language}: dictionary assets unusable ({e}); using fallback");
                if language == self.inner.default_language {
                    Lexicon::builtin_core()
                } else {
                    Lexicon::default()
                }
            }
        }
    }

    fn finish_load(&self, language: &str, lexicon: Lexicon) {
        if let Ok(mut langs) = self.inner.languages.write() {
            langs.insert(
                language.to_string(),
                LanguageSlot::Ready(Arc::new(RwLock::new(lexicon))),
            );
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Monotonic counter of load/clear events.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self, language: &str) -> bool {
        self.inner
            .languages
            .read()
            .map(|langs| matches!(langs.get(language), Some(LanguageSlot::Ready(_))))
            .unwrap_or(false)
    }

    pub fn loaded_languages(&self) -> Vec<String> {
        self.inner
            .languages
            .read()
            .map(|langs| {
                langs
                    .iter()
                    .filter(|(_, slot)| matches!(slot, LanguageSlot::Ready(_)))
                    .map(|(lang, _)| lang.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn slot(&self, language: &str) -> Option<LanguageSlot> {
        self.inner
            .languages
            .read()
            .ok()
            .and_then(|langs| langs.get(language).cloned())
    }

    /// Run `f` against a loaded lexicon. Returns `None` (and kicks off a
    /// background load) when the language is not ready yet.
    pub fn with_lexicon<R>(&self, language: &str, f: impl FnOnce(&Lexicon) -> R) -> Option<R> {
        match self.slot(language) {
            Some(LanguageSlot::Ready(lex)) => lex.read().ok().map(|guard| f(&guard)),
            Some(LanguageSlot::Loading) => None,
            None => {
                self.load(language);
                None
            }
        }
    }

    /// Mutable variant of `with_lexicon`, for learning writes.
    pub fn with_lexicon_mut<R>(
        &self,
        language: &str,
        f: impl FnOnce(&mut Lexicon) -> R,
    ) -> Option<R> {
        match self.slot(language) {
            Some(LanguageSlot::Ready(lex)) => lex.write().ok().map(|mut guard| f(&mut guard)),
            Some(LanguageSlot::Loading) => None,
            None => {
                self.load(language);
                None
            }
        }
    }

    /// Word frequency, 0 when the word or language is absent.
    pub fn get_frequency(&self, language: &str, word: &str) -> u32 {
        let word = utils::fold(word);
        self.with_lexicon(language, |lex| lex.frequency(&word))
            .unwrap_or(0)
    }

    /// Bigram count, 0 when the pair or language is absent.
    pub fn get_bigram_frequency(&self, language: &str, w1: &str, w2: &str) -> u32 {
        let (w1, w2) = (utils::fold(w1), utils::fold(w2));
        self.with_lexicon(language, |lex| lex.bigram_count(&w1, &w2))
            .unwrap_or(0)
    }

    /// Prefix completions ordered by frequency descending.
    pub fn candidates(&self, prefix: &str, language: &str, limit: usize) -> Vec<String> {
        let prefix = utils::fold(prefix);
        self.with_lexicon(language, |lex| lex.prefix_candidates(&prefix, limit))
            .unwrap_or_default()
    }

    /// Bigram-based next-word predictions.
    pub fn next_words(&self, language: &str, prev: &str, limit: usize) -> Vec<String> {
        let prev = utils::fold(prev);
        self.with_lexicon(language, |lex| {
            lex.next_words(&prev, limit)
                .into_iter()
                .map(|(w, _)| w)
                .collect()
        })
        .unwrap_or_default()
    }

    /// Number of words loaded for a language, 0 when not ready.
    pub fn word_count(&self, language: &str) -> usize {
        self.with_lexicon(language, |lex| lex.len()).unwrap_or(0)
    }

    /// Drop a language entirely; the next query reloads it from assets.
    pub fn clear_language(&self, language: &str) {
        if let Ok(mut langs) = self.inner.languages.write() {
            langs.remove(language);
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }
}
