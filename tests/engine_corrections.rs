// tests/engine_corrections.rs
//
// Integration tests for the correction engine over a real asset
// directory: dictionary loading, best-suggestion priority, confidence,
// transliteration routing and swipe decoding.

use keycorrect::{Config, CorrectionEngine, KeyboardBounds, LexiconStore, UserDict};
use std::path::PathBuf;

fn write_assets(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "keycorrect_it_{tag}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    std::fs::write(
        dir.join("en_words.tsv"),
        "the\t1000\n\
         that\t800\n\
         this\t700\n\
         they\t600\n\
         then\t500\n\
         good\t450\n\
         receive\t400\n\
         quick\t350\n\
         want\t300\n\
         what\t290\n\
         time\t280\n\
         their\t270\n\
         hello\t260\n\
         world\t250\n\
         banana\t240\n\
         because\t230\n\
         morning\t220\n\
         mourning\t20\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("en_corrections.json"),
        r#"{"corrections": {"teh": "the", "recieve": "receive", "wnat": "want"}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("en_bigrams.tsv"),
        "good\tmorning\t30\ngood\tnight\t10\n",
    )
    .unwrap();

    std::fs::write(
        dir.join("hi_words.tsv"),
        "नमस्ते\t100\nधन्यवाद\t80\nनमक\t60\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("hi_translit.tsv"),
        "na\tन\nma\tम\nste\tस्ते\nk\tक\n",
    )
    .unwrap();

    dir
}

fn engine(tag: &str) -> CorrectionEngine {
    let dir = write_assets(tag);
    let store = LexiconStore::new(dir, "en");
    store.load_blocking("en");
    store.load_blocking("hi");
    CorrectionEngine::new(store, UserDict::new_in_memory(), Config::default())
}

#[test]
fn loaded_words_have_positive_frequencies() {
    let engine = engine("freqs");
    for word in ["the", "banana", "mourning"] {
        assert!(engine.store().get_frequency("en", word) >= 1, "{word}");
    }
    assert_eq!(engine.store().get_frequency("en", "notaword"), 0);
}

#[test]
fn best_suggestion_resolves_common_misspellings() {
    let engine = engine("best");
    assert_eq!(
        engine.get_best_suggestion("recieve", "en"),
        Some("receive".to_string())
    );
    assert_eq!(engine.get_best_suggestion("teh", "en"), Some("the".to_string()));
}

#[test]
fn corrections_are_capped_and_unique() {
    let engine = engine("cap");
    let results = engine.get_corrections("teh", "en", &[]);
    assert!(!results.is_empty());
    assert!(results.len() <= 5);
    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            assert!(!a.word.eq_ignore_ascii_case(&b.word));
        }
        assert_eq!(a.source_language, "en");
    }
    // Ranking is score-descending.
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn confidence_is_exact_for_identical_words() {
    let engine = engine("conf_id");
    for word in ["x", "hello", "The"] {
        assert_eq!(engine.get_confidence(word, word), 1.0);
    }
    assert_eq!(engine.get_confidence("Hello", "hello"), 1.0);
    assert_eq!(engine.get_confidence("", "the"), 0.0);
}

#[test]
fn confidence_tiers_match_policy() {
    let engine = engine("conf_tiers");
    // Correction-table hit.
    assert_eq!(engine.get_confidence("teh", "the"), 0.8);
    // Adjacent transposition outside the table.
    assert_eq!(engine.get_confidence("tihs", "this"), 0.85);
    // Everything else stays within (0, 1): two substitutions in a
    // six-letter word.
    let c = engine.get_confidence("bxnxna", "banana");
    assert!(c > 0.0 && c < 1.0);
}

#[test]
fn rejection_suppresses_exact_pair_until_cleared() {
    let engine = engine("reject");
    assert_eq!(engine.get_best_suggestion("teh", "en"), Some("the".to_string()));

    engine.record_rejection("teh", "the");
    assert_eq!(engine.get_best_suggestion("teh", "en"), None);
    // "the" is still a perfectly good dictionary word elsewhere.
    assert!(engine
        .get_corrections("hte", "en", &[])
        .iter()
        .any(|s| s.word == "the"));

    engine.clear_rejections();
    assert_eq!(engine.get_best_suggestion("teh", "en"), Some("the".to_string()));
}

#[test]
fn learned_corrections_surface_for_new_typos() {
    let engine = engine("learn");
    assert_eq!(engine.get_best_suggestion("quikc", "en"), Some("quick".to_string()));
    // Teach an unseen pattern and expect it at top priority afterwards.
    engine.learn_from_user("qzk", "quick", "en");
    assert_eq!(engine.get_best_suggestion("qzk", "en"), Some("quick".to_string()));
    assert!(engine.userdict().has_learned_word("quick"));
}

#[test]
fn bigram_context_promotes_likely_followers() {
    let engine = engine("bigram");
    let context = vec!["good".to_string()];
    let with_ctx = engine.get_corrections("mornin", "en", &context);
    assert_eq!(with_ctx[0].word, "morning");
    assert_eq!(
        engine.next_word_predictions("good", "en", 2),
        vec!["morning".to_string(), "night".to_string()]
    );
}

#[test]
fn prefix_candidates_are_frequency_ordered_and_merge_user_words() {
    let engine = engine("prefix");
    let words = engine.get_candidates("th", "en", 10);
    assert_eq!(words[0], "the");
    assert!(words.contains(&"their".to_string()));

    engine.add_user_word("thorin");
    let words = engine.get_candidates("tho", "en", 4);
    assert!(words.contains(&"thorin".to_string()));
}

#[test]
fn transliteration_path_reaches_native_lexicon() {
    let engine = engine("translit");
    // Romanized input: transliterated to native script, then matched.
    let romanized = engine.get_corrections("namaste", "hi", &[]);
    assert!(romanized.iter().any(|s| s.word == "नमस्ते"));
    // Native input: matched directly.
    let native = engine.get_corrections("नमस्ते", "hi", &[]);
    assert!(native.iter().any(|s| s.word == "नमस्ते"));
    assert!(native.len() <= 5);
}

#[test]
fn swipe_decoding_is_total_and_capped() {
    let engine = engine("swipe");
    let bounds = KeyboardBounds::new(0.0, 0.0, 1000.0, 300.0);

    assert!(engine.decode_swipe_path(&[], &bounds, "en").is_empty());
    assert!(engine
        .decode_swipe_path(&[(500.0, 150.0)], &bounds, "en")
        .is_empty());

    // Two points starting on 'h': at least "hello" starts there.
    let out = engine.decode_swipe_path(&[(610.0, 150.0), (300.0, 60.0)], &bounds, "en");
    assert!(!out.is_empty());
    assert!(out.len() <= 5);
    assert!(out.iter().all(|s| s.word.starts_with('h')));
}

#[test]
fn cached_queries_are_stable_until_learning() {
    let engine = engine("cache");
    let first = engine.get_corrections("teh", "en", &[]);
    assert_eq!(first, engine.get_corrections("teh", "en", &[]));
    assert!(engine.stats().cached_suggestions >= 1);

    engine.record_rejection("banana", "bananas");
    assert_eq!(engine.stats().cached_suggestions, 0);
}
