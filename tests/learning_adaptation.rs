// tests/learning_adaptation.rs
//
// Integration tests for the learning feedback loop and durable user
// state: usage counters, sentence learning, persistence across reopen,
// and background loading behavior.

use keycorrect::{Config, CorrectionEngine, Lexicon, LexiconStore, UserDict};
use std::path::PathBuf;

fn scratch(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "keycorrect_learn_{tag}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn engine_with_words(tag: &str, words: &[(&str, u32)]) -> CorrectionEngine {
    let store = LexiconStore::new(scratch(tag), "en");
    store.install("en", Lexicon::from_entries(words.iter().copied()).unwrap());
    CorrectionEngine::new(store, UserDict::new_in_memory(), Config::default())
}

#[test]
fn repeated_learning_accumulates_usage() {
    let engine = engine_with_words("usage", &[("banana", 100)]);
    for _ in 0..3 {
        engine.userdict().learn_word("banana");
    }
    assert!(engine.userdict().has_learned_word("banana"));
    assert_eq!(engine.userdict().get_word_count("banana"), 3);
}

#[test]
fn learned_words_outrank_equally_distant_neighbors() {
    let engine = engine_with_words("boost", &[("mat", 100), ("hat", 100)]);
    // "aat" is one substitution from both; reinforce one of them.
    for _ in 0..5 {
        engine.on_correction_accepted("aat", "hat", "en");
    }
    let top = engine.get_corrections("aat", "en", &[]);
    assert_eq!(top[0].word, "hat");
}

#[test]
fn sentence_learning_feeds_ngrams_and_user_dict() {
    let engine = engine_with_words(
        "sentence",
        &[("see", 50), ("you", 80), ("tomorrow", 30)],
    );
    let before = engine.store().get_frequency("en", "see");
    engine.learn_sentence(&["see", "you", "tomorrow"], "en");

    assert_eq!(engine.store().get_frequency("en", "see"), before + 1);
    assert_eq!(engine.store().get_bigram_frequency("en", "see", "you"), 1);
    assert_eq!(engine.store().get_bigram_frequency("en", "you", "tomorrow"), 1);
    // Words not in the lexicon are ignored there but still learned.
    engine.learn_sentence(&["see", "ya"], "en");
    assert_eq!(engine.store().get_frequency("en", "ya"), 0);
    assert!(engine.userdict().has_learned_word("ya"));
}

#[test]
fn user_state_survives_reopen() {
    let dir = scratch("persist");
    let db_path = dir.join("userdict.redb");

    {
        let store = LexiconStore::new(&dir, "en");
        store.install("en", Lexicon::from_entries([("quick", 100u32)]).unwrap());
        let userdict = UserDict::new_redb(&db_path).unwrap();
        let engine = CorrectionEngine::new(store, userdict, Config::default());
        engine.learn_from_user("quikc", "quick", "en");
        engine.record_rejection("teh", "the");
        engine.add_user_word("covfefe");
    }

    let userdict = UserDict::new_redb(&db_path).unwrap();
    assert_eq!(userdict.get_word_count("quick"), 1);
    assert!(userdict.is_blacklisted("teh", "the"));
    let covfefe = userdict.entry("covfefe").unwrap();
    assert!(covfefe.user_added);
    assert_eq!(covfefe.count, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn acceptance_reinforces_while_rejection_suppresses() {
    let engine = engine_with_words("feedback", &[("their", 100), ("there", 100)]);

    engine.record_rejection("thier", "there");
    engine.on_correction_accepted("thier", "their", "en");

    // The accepted pair became a learned correction and wins tier 1.
    assert_eq!(
        engine.get_best_suggestion("thier", "en"),
        Some("their".to_string())
    );
    // The rejected pair stays suppressed even though the word is valid.
    assert!(engine.userdict().is_blacklisted("thier", "there"));
    assert!(!engine.userdict().is_blacklisted("their", "there"));
}

#[test]
fn background_load_never_blocks_queries() {
    let dir = scratch("bg");
    std::fs::write(dir.join("en_words.tsv"), "hello\t10\n").unwrap();
    let store = LexiconStore::new(&dir, "en");
    let engine = CorrectionEngine::new(store, UserDict::new_in_memory(), Config::default());

    // First query triggers the load and returns immediately, possibly
    // empty; once the load completes, results appear.
    let _ = engine.get_corrections("hello", "en", &[]);
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while !engine.is_language_loaded("en") {
        assert!(std::time::Instant::now() < deadline, "load never completed");
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    let results = engine.get_corrections("hello", "en", &[]);
    assert_eq!(results[0].word, "hello");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn explicit_additions_clear_cached_results() {
    let engine = engine_with_words("cacheinv", &[("mat", 100)]);
    let before = engine.get_corrections("matx", "en", &[]);
    assert!(before.iter().all(|s| s.word != "matx"));

    engine.add_user_word("matx");
    let after = engine.get_corrections("matx", "en", &[]);
    assert!(after.iter().any(|s| s.word == "matx"));
    assert_eq!(after[0].word, "matx");
}
