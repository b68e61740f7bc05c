//! keycorrect
//!
//! On-device correction, prediction and swipe-decoding core for keyboard
//! frontends. The crate owns the linguistic intelligence of a keyboard
//! (lexicons, fuzzy correction candidates, swipe path decoding, ranking,
//! the user-adaptation feedback loop) and leaves rendering, input capture
//! and platform plumbing to the embedder.
//!
//! Public API:
//! - `CorrectionEngine` - orchestrator exposing the correction/prediction API
//! - `LexiconStore` / `Lexicon` - per-language word and frequency tables
//! - `UserDict` - persistent user learning and rejection blacklist
//! - `CandidateGenerator` - fuzzy correction-candidate generation
//! - `SwipeDecoder` - gesture path to word candidates
//! - `Scorer` - multi-factor ranking
//! - `Config` - configuration and scoring weights

use serde::{Deserialize, Serialize};

pub mod fuzzy;
pub use fuzzy::{edit_distance, jaccard_chars, lcs_ratio, KeyGeometry};

pub mod word_bigram;
pub use word_bigram::{WordBigram, WordTrigram};

pub mod lexicon;
pub use lexicon::{LexEntry, Lexicon, LexiconStore};

pub mod userdict;
pub use userdict::{UserDict, UserWordEntry};

pub mod candidates;
pub use candidates::{CandidateGenerator, CandidateSource, RawCandidate};

pub mod swipe;
pub use swipe::{KeyboardBounds, SwipeDecoder};

pub mod score;
pub use score::{ScoreSignals, Scorer, Suggestion};

pub mod translit;
pub use translit::{detect_script, Script, TranslitTable};

pub mod engine;
pub use engine::{CorrectionEngine, EngineStats};

/// Weights of the composite suggestion score.
///
/// These are tunable parameters, not physical constants: the defaults match
/// the shipped ranking model, but embedders may recalibrate them and load
/// the result from TOML alongside the rest of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the (log-scaled) word frequency.
    pub frequency: f32,
    /// Penalty per unit of edit distance.
    pub edit_distance: f32,
    /// Penalty per character of length difference.
    pub length_diff: f32,
    /// Weight of the (log-scaled) bigram count with the previous word.
    pub bigram: f32,
    /// Weight of the keyboard-proximity score in `[0, 1]`.
    pub keyboard_proximity: f32,
    /// Flat bonus for candidates found through the transliteration path.
    pub transliteration: f32,
    /// Flat bonus when the target language is a native (non-Latin) script.
    pub native_script: f32,
    /// Flat bonus when the candidate equals the typed token.
    pub exact_match: f32,
    /// Base bonus for words present in the user dictionary.
    pub user_base: f32,
    /// Additional user-dictionary bonus per recorded use.
    pub user_per_use: f32,
    /// Cap on the per-use part of the user-dictionary bonus.
    pub user_per_use_cap: f32,
    /// Frequency boost per use for user-dictionary candidates during
    /// candidate generation.
    pub user_freq_boost_per_use: f32,
    /// Cap on the generation-time user frequency boost.
    pub user_freq_boost_cap: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            frequency: 0.7,
            edit_distance: 1.2,
            length_diff: 0.1,
            bigram: 0.8,
            keyboard_proximity: 0.5,
            transliteration: 0.5,
            native_script: 0.3,
            exact_match: 1.0,
            user_base: 0.8,
            user_per_use: 0.05,
            user_per_use_cap: 0.5,
            user_freq_boost_per_use: 0.1,
            user_freq_boost_cap: 2.0,
        }
    }
}

/// Engine configuration.
///
/// Deserializable from TOML. All fields have defaults matching the shipped
/// behavior; embedders typically override the language lists and cache size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language the engine falls back to and learns typo patterns for.
    pub default_language: String,

    /// Languages whose lexicons are keyed in a non-Latin script. Latin
    /// input for these languages is routed through the transliteration
    /// path before dictionary lookup.
    pub transliterated_languages: Vec<String>,

    /// Maximum Damerau-Levenshtein distance for fuzzy candidates.
    pub max_edit_distance: usize,

    /// Tokens shorter than this produce no fuzzy candidates.
    pub min_token_length: usize,

    /// Maximum number of ranked suggestions returned per query.
    pub max_suggestions: usize,

    /// Fuzzy scan stops after this many qualifying raw candidates. The
    /// lexicon is scanned in frequency order, so the cap keeps the best.
    pub max_raw_candidates: usize,

    /// Jaccard character-set similarity above which a candidate qualifies
    /// even when outside the edit-distance budget.
    pub pattern_threshold: f32,

    /// Maximum number of swipe candidates returned per gesture.
    pub swipe_limit: usize,

    /// Minimum word length considered by the swipe decoder.
    pub min_swipe_word_length: usize,

    /// Maximum number of entries in the suggestion cache.
    pub max_cache_size: usize,

    /// Composite score weights.
    pub weights: ScoreWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            transliterated_languages: vec![
                "hi".to_string(),
                "te".to_string(),
                "ta".to_string(),
                "ml".to_string(),
                "bn".to_string(),
                "gu".to_string(),
                "kn".to_string(),
                "pa".to_string(),
                "ur".to_string(),
                "ne".to_string(),
            ],
            max_edit_distance: 2,
            min_token_length: 2,
            max_suggestions: 5,
            max_raw_candidates: 50,
            pattern_threshold: 0.6,
            swipe_limit: 5,
            min_swipe_word_length: 2,
            max_cache_size: 1000,
            weights: ScoreWeights::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Whether `language` is matched against a non-Latin-script lexicon.
    pub fn is_transliterated(&self, language: &str) -> bool {
        self.transliterated_languages.iter().any(|l| l == language)
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }

    /// Canonical token form: normalized and lowercased. Lexicon entries,
    /// user words and rejection pairs are all keyed on this form.
    pub fn fold(s: &str) -> String {
        normalize(s).to_lowercase()
    }
}
