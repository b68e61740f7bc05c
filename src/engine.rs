//! Correction orchestrator.
//!
//! `CorrectionEngine` routes requests between the standard and
//! transliteration correction paths, caches ranked suggestions, owns the
//! best-suggestion/confidence policy and runs the learning feedback loop.
//! It is constructed once by the composition root and shared by reference;
//! every method takes `&self` and the engine is `Send + Sync`.
//!
//! No public entry point propagates an internal fault: queries against
//! unloaded languages, missing assets or failing storage degrade to
//! empty or neutral results so the typing pipeline is never interrupted.

use crate::candidates::CandidateGenerator;
use crate::fuzzy::edit_distance;
use crate::lexicon::{LexiconStore, BUILTIN_TYPOS};
use crate::score::{ScoreSignals, Scorer, Suggestion};
use crate::swipe::{KeyboardBounds, SwipeDecoder};
use crate::translit::{detect_script, Script};
use crate::userdict::UserDict;
use crate::{utils, Config};
use ahash::AHashMap;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use tracing::debug;

/// Last-resort typo lookup for the default language.
fn builtin_typo_correction(word: &str) -> Option<&'static str> {
    BUILTIN_TYPOS
        .iter()
        .find(|(typo, _)| *typo == word)
        .map(|(_, fix)| *fix)
}

/// Engine counters, for diagnostics.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub cached_suggestions: usize,
    pub loaded_languages: Vec<String>,
    pub user_words: usize,
    pub learned_corrections: usize,
    pub rejections: usize,
}

/// The correction/prediction engine.
pub struct CorrectionEngine {
    config: Config,
    store: LexiconStore,
    userdict: UserDict,
    generator: CandidateGenerator,
    scorer: Scorer,
    swipe: SwipeDecoder,
    /// Typo -> fix pairs learned from the user, default language only.
    learned_corrections: RwLock<AHashMap<String, String>>,
    /// (token, language, context) -> ranked suggestions. Cleared wholesale
    /// on every learning event and whenever the store generation moves.
    cache: Mutex<LruCache<String, Vec<Suggestion>>>,
    cache_generation: AtomicU64,
}

impl CorrectionEngine {
    pub fn new(store: LexiconStore, userdict: UserDict, config: Config) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            generator: CandidateGenerator::new(&config),
            scorer: Scorer::new(&config),
            swipe: SwipeDecoder::new(&config),
            learned_corrections: RwLock::new(AHashMap::new()),
            cache: Mutex::new(LruCache::new(capacity)),
            cache_generation: AtomicU64::new(store.generation()),
            config,
            store,
            userdict,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &LexiconStore {
        &self.store
    }

    pub fn userdict(&self) -> &UserDict {
        &self.userdict
    }

    // ========== Loading ==========

    /// Start loading a language in the background.
    pub fn load_language(&self, language: &str) {
        self.store.load(language);
    }

    /// Kick off background loads for several languages.
    pub fn preload_languages(&self, languages: &[&str]) {
        for language in languages {
            self.store.load(language);
        }
    }

    pub fn is_language_loaded(&self, language: &str) -> bool {
        self.store.is_loaded(language)
    }

    /// True once at least one language dictionary is usable.
    pub fn is_ready(&self) -> bool {
        !self.store.loaded_languages().is_empty()
    }

    // ========== Queries ==========

    /// Ranked correction suggestions for a typed word, at most
    /// `max_suggestions`, cached by (word, language, context).
    pub fn get_corrections(
        &self,
        word: &str,
        language: &str,
        context: &[String],
    ) -> Vec<Suggestion> {
        let token = utils::fold(word);
        if token.is_empty() {
            return Vec::new();
        }
        self.sync_cache_generation();

        let key = format!("{token}:{language}:{}", context.join(","));
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        let scored = if self.config.is_transliterated(language) {
            self.transliterated_corrections(&token, language, context)
        } else {
            self.standard_corrections(&token, language, context)
        };
        let ranked = self.scorer.rank(scored);

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, ranked.clone());
        }
        ranked
    }

    /// Standard path: candidates come from the target lexicon only.
    fn standard_corrections(
        &self,
        token: &str,
        language: &str,
        context: &[String],
    ) -> Vec<Suggestion> {
        let prev_word = context.last().map(String::as_str);
        self.store
            .with_lexicon(language, |lex| {
                let signals = ScoreSignals {
                    prev_word,
                    is_transliteration_path: false,
                    is_native_script: false,
                };
                self.generator
                    .generate(lex, &self.userdict, token)
                    .into_iter()
                    .map(|c| Suggestion {
                        score: self.scorer.score(lex, &self.userdict, token, &c, &signals),
                        is_correction: c.edit_distance > 0,
                        word: c.word,
                        source_language: language.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Transliteration path for non-Latin target languages: romanized
    /// input is transliterated and matched against the native lexicon
    /// (path A) while the raw input is matched directly in case it is
    /// already native script (path B); both sets merge before ranking.
    fn transliterated_corrections(
        &self,
        token: &str,
        language: &str,
        context: &[String],
    ) -> Vec<Suggestion> {
        let prev_word = context.last().map(String::as_str);
        self.store
            .with_lexicon(language, |lex| {
                let mut out: Vec<Suggestion> = Vec::new();

                if detect_script(token) == Script::Latin {
                    if let Some(table) = lex.translit() {
                        let native = table.transliterate(token);
                        if !native.is_empty() && native != token {
                            debug!("transliterated '{token}' -> '{native}'");
                            let signals = ScoreSignals {
                                prev_word,
                                is_transliteration_path: true,
                                is_native_script: true,
                            };
                            out.extend(
                                self.generator
                                    .generate(lex, &self.userdict, &native)
                                    .into_iter()
                                    .map(|c| Suggestion {
                                        score: self.scorer.score(
                                            lex,
                                            &self.userdict,
                                            &native,
                                            &c,
                                            &signals,
                                        ),
                                        is_correction: c.edit_distance > 0,
                                        word: c.word,
                                        source_language: language.to_string(),
                                    }),
                            );
                        }
                    }
                }

                let signals = ScoreSignals {
                    prev_word,
                    is_transliteration_path: false,
                    is_native_script: true,
                };
                out.extend(
                    self.generator
                        .generate(lex, &self.userdict, token)
                        .into_iter()
                        .map(|c| Suggestion {
                            score: self.scorer.score(lex, &self.userdict, token, &c, &signals),
                            is_correction: c.edit_distance > 0,
                            word: c.word,
                            source_language: language.to_string(),
                        }),
                );
                out
            })
            .unwrap_or_default()
    }

    /// Top suggestion words, a convenience over `get_corrections`.
    pub fn get_suggestions(&self, input: &str, language: &str, limit: usize) -> Vec<String> {
        self.get_corrections(input, language, &[])
            .into_iter()
            .take(limit)
            .map(|s| s.word)
            .collect()
    }

    /// Prefix completions for the suggestion strip: learned words first,
    /// then lexicon words by frequency, deduplicated.
    pub fn get_candidates(&self, prefix: &str, language: &str, limit: usize) -> Vec<String> {
        let prefix = utils::fold(prefix);
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }
        let mut out: Vec<String> = self
            .userdict
            .top_words(usize::MAX)
            .into_iter()
            .filter(|w| w.starts_with(&prefix))
            .take(limit / 2)
            .collect();
        for word in self.store.candidates(&prefix, language, limit) {
            if !out.contains(&word) {
                out.push(word);
            }
        }
        out.truncate(limit);
        out
    }

    /// The single best correction, resolved by strict priority:
    /// correction table, then top-ranked dictionary suggestion, then (for
    /// the default language) the built-in typo table. A blacklisted hit
    /// at any tier suppresses the whole lookup rather than falling
    /// through to a lower tier.
    pub fn get_best_suggestion(&self, word: &str, language: &str) -> Option<String> {
        let normalized = utils::fold(word);
        if normalized.is_empty() {
            return None;
        }

        if let Some(fix) = self.correction_table_lookup(language, &normalized) {
            if self.userdict.is_blacklisted(&normalized, &fix) {
                debug!("suppressing rejected correction '{normalized}' -> '{fix}'");
                return None;
            }
            return Some(fix);
        }

        if let Some(best) = self.get_corrections(word, language, &[]).into_iter().next() {
            if self.userdict.is_blacklisted(&normalized, &best.word) {
                debug!("suppressing rejected suggestion '{normalized}' -> '{}'", best.word);
                return None;
            }
            return Some(best.word);
        }

        if language == self.config.default_language {
            if let Some(fix) = builtin_typo_correction(&normalized) {
                if self.userdict.is_blacklisted(&normalized, fix) {
                    return None;
                }
                return Some(fix.to_string());
            }
        }

        None
    }

    /// Correction-table entry for a misspelling: user-learned pairs (for
    /// the default language) take precedence over the shipped table.
    fn correction_table_lookup(&self, language: &str, word: &str) -> Option<String> {
        if language == self.config.default_language {
            if let Ok(learned) = self.learned_corrections.read() {
                if let Some(fix) = learned.get(word) {
                    return Some(fix.clone());
                }
            }
        }
        self.store
            .with_lexicon(language, |lex| lex.correction_for(word).map(str::to_string))
            .flatten()
    }

    /// Deterministic confidence in `[0, 1]` that `suggestion` is the word
    /// the user meant when typing `input`.
    pub fn get_confidence(&self, input: &str, suggestion: &str) -> f32 {
        if input.is_empty() || suggestion.is_empty() {
            return 0.0;
        }
        let input_l = utils::fold(input);
        let sugg_l = utils::fold(suggestion);
        if input_l == sugg_l {
            return 1.0;
        }

        let table_hit = self
            .correction_table_lookup(&self.config.default_language, &input_l)
            .map(|fix| fix == sugg_l)
            .unwrap_or(false)
            || builtin_typo_correction(&input_l) == Some(sugg_l.as_str());
        if table_hit {
            return 0.8;
        }

        let a: Vec<char> = input_l.chars().collect();
        let b: Vec<char> = sugg_l.chars().collect();
        if a.len() == b.len() {
            let mut diff_count = 0;
            let mut transposition = false;
            for i in 0..a.len() {
                if a[i] != b[i] {
                    diff_count += 1;
                    if i + 1 < a.len() && a[i] == b[i + 1] && a[i + 1] == b[i] {
                        transposition = true;
                    }
                }
            }
            if transposition && diff_count == 2 {
                return 0.85;
            }
        }

        let max_len = a.len().max(b.len()) as f32;
        let distance = edit_distance(&input_l, &sugg_l);
        let edit_confidence = 1.0 - distance as f32 / max_len;

        let typo_bonus = match distance {
            1 if a.len() == b.len() => 0.3,
            1 => 0.2,
            2 if a.len() >= 4 => 0.15,
            _ => 0.0,
        };
        let length_penalty = if a.len().abs_diff(b.len()) > 2 { 0.1 } else { 0.0 };

        (edit_confidence + typo_bonus - length_penalty).clamp(0.0, 1.0)
    }

    /// Decode a swipe gesture into ranked word suggestions.
    pub fn decode_swipe_path(
        &self,
        points: &[(f32, f32)],
        bounds: &KeyboardBounds,
        language: &str,
    ) -> Vec<Suggestion> {
        self.store
            .with_lexicon(language, |lex| {
                self.swipe
                    .decode(lex, points, bounds)
                    .into_iter()
                    .map(|(word, score)| Suggestion {
                        word,
                        score,
                        is_correction: false,
                        source_language: language.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bigram-based next-word predictions after a committed word.
    pub fn next_word_predictions(&self, previous: &str, language: &str, limit: usize) -> Vec<String> {
        if utils::fold(previous).is_empty() {
            return Vec::new();
        }
        self.store.next_words(language, previous, limit)
    }

    // ========== Learning ==========

    /// Record that the user replaced `original` with `corrected`. The
    /// corrected word is learned; a pair with a corrected word of three or
    /// more chars also becomes a correction-table entry for the default
    /// language.
    pub fn learn_from_user(&self, original: &str, corrected: &str, language: &str) {
        let original = utils::fold(original);
        let corrected = utils::fold(corrected);
        if corrected.is_empty() || original == corrected {
            return;
        }

        self.userdict.learn_word(&corrected);

        if language == self.config.default_language && corrected.chars().count() >= 3 {
            if let Ok(mut learned) = self.learned_corrections.write() {
                learned.insert(original.clone(), corrected.clone());
            }
        }
        debug!("learned correction '{original}' -> '{corrected}' ({language})");
        self.invalidate_cache();
    }

    /// The user accepted a surfaced suggestion; reinforce it.
    pub fn on_correction_accepted(&self, original: &str, accepted: &str, language: &str) {
        self.userdict.learn_word(accepted);
        if utils::fold(original) != utils::fold(accepted) {
            self.learn_from_user(original, accepted, language);
        } else {
            self.invalidate_cache();
        }
    }

    /// The user rejected a surfaced correction. Suppresses exactly the
    /// `original -> rejected` pair; the rejected word stays a valid
    /// candidate everywhere else.
    pub fn record_rejection(&self, original: &str, rejected: &str) {
        self.userdict.record_rejection(original, rejected);
        self.invalidate_cache();
    }

    /// Clear all recorded rejections.
    pub fn clear_rejections(&self) {
        self.userdict.clear_rejections();
        self.invalidate_cache();
    }

    /// Explicitly add a word to the user dictionary.
    pub fn add_user_word(&self, word: &str) {
        self.userdict.add_word(word);
        self.invalidate_cache();
    }

    /// Learn from a committed sentence: word frequencies, bigrams and
    /// trigrams, plus implicit user-dictionary reinforcement.
    pub fn learn_sentence(&self, words: &[&str], language: &str) {
        let folded: Vec<String> = words
            .iter()
            .map(|w| utils::fold(w))
            .filter(|w| !w.is_empty())
            .collect();
        if folded.is_empty() {
            return;
        }

        self.store.with_lexicon_mut(language, |lex| {
            for word in &folded {
                lex.increment_frequency(word, 1);
            }
            for pair in folded.windows(2) {
                lex.observe_bigram(&pair[0], &pair[1]);
            }
            for triple in folded.windows(3) {
                lex.observe_trigram(&triple[0], &triple[1], &triple[2]);
            }
        });
        for word in &folded {
            self.userdict.learn_word(word);
        }
        self.invalidate_cache();
    }

    // ========== Cache ==========

    /// Drop every cached suggestion list.
    pub fn clear_cache(&self) {
        self.invalidate_cache();
    }

    fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Cached results are only valid for the store state they were
    /// computed against; drop them when a load or clear completed since.
    fn sync_cache_generation(&self) {
        let generation = self.store.generation();
        if self.cache_generation.swap(generation, Ordering::SeqCst) != generation {
            self.invalidate_cache();
        }
    }

    /// Diagnostics snapshot.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cached_suggestions: self.cache.lock().map(|c| c.len()).unwrap_or(0),
            loaded_languages: self.store.loaded_languages(),
            user_words: self.userdict.word_count_total(),
            learned_corrections: self
                .learned_corrections
                .read()
                .map(|m| m.len())
                .unwrap_or(0),
            rejections: self.userdict.rejection_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn engine_with_builtin() -> CorrectionEngine {
        let store = LexiconStore::new(std::env::temp_dir().join("keycorrect_no_assets"), "en");
        store.install("en", Lexicon::builtin_core());
        CorrectionEngine::new(store, UserDict::new_in_memory(), Config::default())
    }

    #[test]
    fn cache_returns_identical_results() {
        let engine = engine_with_builtin();
        let first = engine.get_corrections("teh", "en", &[]);
        let second = engine.get_corrections("teh", "en", &[]);
        assert_eq!(first, second);
        assert!(engine.stats().cached_suggestions >= 1);
    }

    #[test]
    fn learning_invalidates_cache() {
        let engine = engine_with_builtin();
        let _ = engine.get_corrections("teh", "en", &[]);
        assert!(engine.stats().cached_suggestions >= 1);
        engine.learn_from_user("teh", "the", "en");
        assert_eq!(engine.stats().cached_suggestions, 0);
    }

    #[test]
    fn unknown_language_degrades_to_empty() {
        let engine = engine_with_builtin();
        assert!(engine.get_corrections("bonjour", "fr", &[]).is_empty());
        assert!(engine
            .decode_swipe_path(
                &[(10.0, 10.0), (20.0, 20.0)],
                &KeyboardBounds::new(0.0, 0.0, 100.0, 100.0),
                "fr",
            )
            .is_empty());
    }

    #[test]
    fn builtin_typo_table_is_last_resort() {
        let store = LexiconStore::new(std::env::temp_dir().join("keycorrect_no_assets"), "en");
        // Empty lexicon: no corrections map, no dictionary candidates.
        store.install("en", Lexicon::default());
        let engine = CorrectionEngine::new(store, UserDict::new_in_memory(), Config::default());
        assert_eq!(engine.get_best_suggestion("adn", "en"), Some("and".to_string()));
        // Non-default languages never use the built-in table.
        store_is_empty_for(&engine, "fr");
    }

    fn store_is_empty_for(engine: &CorrectionEngine, language: &str) {
        assert_eq!(engine.get_best_suggestion("adn", language), None);
    }

    #[test]
    fn stats_reflect_state() {
        let engine = engine_with_builtin();
        engine.add_user_word("squee");
        engine.record_rejection("teh", "thee");
        let stats = engine.stats();
        assert_eq!(stats.user_words, 1);
        assert_eq!(stats.rejections, 1);
        assert!(stats.loaded_languages.contains(&"en".to_string()));
        assert!(engine.is_ready());
    }
}
