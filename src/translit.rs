//! Script detection and romanization for non-Latin target languages.
//!
//! Latin input for a non-Latin language is transliterated to the native
//! script before dictionary lookup. Transliteration is data-driven: a
//! table of roman -> native rules applied greedily, longest roman prefix
//! first, with unknown characters passed through unchanged.

use serde::{Deserialize, Serialize};

/// Coarse script class of an input token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    NonLatin,
}

/// Classify a token as romanized Latin text or native script.
///
/// A token is Latin when every character is printable ASCII; a single
/// non-ASCII character marks the whole token as native script.
pub fn detect_script(s: &str) -> Script {
    if s.chars().all(|c| (' '..='~').contains(&c)) {
        Script::Latin
    } else {
        Script::NonLatin
    }
}

/// Rule table mapping roman sequences to native-script output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslitTable {
    // Sorted by roman-key length descending so greedy matching prefers
    // the longest applicable rule ("kha" before "kh" before "k").
    rules: Vec<(String, String)>,
}

impl TranslitTable {
    /// Build a table from (roman, native) rule pairs.
    pub fn from_rules<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut rules: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(a, b)| (a.into(), b.into()))
            .filter(|(a, _)| !a.is_empty())
            .collect();
        rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Transliterate a roman string to native script.
    ///
    /// Walks the input left to right, consuming the longest roman rule
    /// matching at the cursor; characters no rule covers are copied.
    pub fn transliterate(&self, roman: &str) -> String {
        let mut out = String::with_capacity(roman.len());
        let mut rest = roman;
        'outer: while !rest.is_empty() {
            for (from, to) in &self.rules {
                if rest.starts_with(from.as_str()) {
                    out.push_str(to);
                    rest = &rest[from.len()..];
                    continue 'outer;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devanagari_table() -> TranslitTable {
        TranslitTable::from_rules([
            ("kha", "खा"),
            ("kh", "ख"),
            ("k", "क"),
            ("na", "ना"),
            ("n", "न"),
            ("ma", "मा"),
            ("m", "म"),
            ("s", "स"),
            ("te", "ते"),
            ("a", "अ"),
        ])
    }

    #[test]
    fn detect_script_splits_latin_and_native() {
        assert_eq!(detect_script("namaste"), Script::Latin);
        assert_eq!(detect_script("नमस्ते"), Script::NonLatin);
        assert_eq!(detect_script("mix नम"), Script::NonLatin);
    }

    #[test]
    fn longest_rule_wins() {
        let t = devanagari_table();
        // "kha" must consume as one rule, not "kh" + "a".
        assert_eq!(t.transliterate("kha"), "खा");
        assert_eq!(t.transliterate("kh"), "ख");
    }

    #[test]
    fn unknown_characters_pass_through() {
        let t = devanagari_table();
        assert_eq!(t.transliterate("k-x"), "क-x");
    }

    #[test]
    fn empty_table_is_identity() {
        let t = TranslitTable::default();
        assert!(t.is_empty());
        assert_eq!(t.transliterate("abc"), "abc");
    }
}
