//! Swipe-gesture path decoding.
//!
//! A gesture arrives as raw pixel coordinates plus the keyboard's pixel
//! bounding box. Points are normalized to the unit square, the starting
//! letter is estimated from the first point, and lexicon words starting
//! with that letter are scored by how well their length matches the path
//! and how frequent they are. Degenerate gestures (fewer than two points)
//! decode to an empty list, never an error.

use crate::fuzzy::QWERTY;
use crate::lexicon::Lexicon;
use crate::Config;

/// How many frequency-ordered prefix matches to score per gesture.
const SCAN_LIMIT: usize = 100;

/// Pixel bounding box of the keyboard as rendered by the frontend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl KeyboardBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Map a pixel coordinate into the unit square, clamped.
    fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        let nx = if self.width > 0.0 {
            (x - self.left) / self.width
        } else {
            0.0
        };
        let ny = if self.height > 0.0 {
            (y - self.top) / self.height
        } else {
            0.0
        };
        (nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
    }
}

/// Decodes swipe paths against a lexicon.
#[derive(Debug, Clone)]
pub struct SwipeDecoder {
    limit: usize,
    min_word_length: usize,
}

impl SwipeDecoder {
    pub fn new(config: &Config) -> Self {
        Self {
            limit: config.swipe_limit,
            min_word_length: config.min_swipe_word_length,
        }
    }

    /// Decode a gesture into ranked `(word, score)` candidates.
    pub fn decode(
        &self,
        lexicon: &Lexicon,
        points: &[(f32, f32)],
        bounds: &KeyboardBounds,
    ) -> Vec<(String, f32)> {
        if points.len() < 2 {
            return Vec::new();
        }
        let (x, y) = points[0];
        let (nx, ny) = bounds.normalize(x, y);
        let Some(start) = QWERTY.nearest_key(nx, ny) else {
            return Vec::new();
        };

        let max_freq = lexicon.max_frequency();
        let freq_norm = (1.0 + max_freq as f32).ln();
        let path_len = points.len() as f32;

        let mut scored: Vec<(String, f32)> = lexicon
            .prefix_candidates(&start.to_string(), SCAN_LIMIT)
            .into_iter()
            .filter(|word| word.chars().count() >= self.min_word_length)
            .map(|word| {
                let length_score = (word.chars().count() as f32 / path_len).min(1.0);
                let freq_score = if freq_norm > 0.0 {
                    (1.0 + lexicon.frequency(&word) as f32).ln() / freq_norm
                } else {
                    0.0
                };
                let score = 0.5 * length_score + 0.5 * freq_score;
                (word, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.limit);
        scored
    }

    /// Collapse a gesture into the ordered sequence of keys it crossed.
    ///
    /// Each point maps to its nearest key; consecutive repeats merge. Used
    /// for exact key-path matching and diagnostics.
    pub fn resolve_key_sequence(
        &self,
        points: &[(f32, f32)],
        bounds: &KeyboardBounds,
    ) -> Vec<char> {
        let mut keys: Vec<char> = Vec::new();
        for &(x, y) in points {
            let (nx, ny) = bounds.normalize(x, y);
            if let Some(key) = QWERTY.nearest_key(nx, ny) {
                if keys.last() != Some(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> KeyboardBounds {
        KeyboardBounds::new(0.0, 0.0, 1000.0, 300.0)
    }

    fn lexicon() -> Lexicon {
        Lexicon::from_entries([
            ("hello", 500u32),
            ("help", 300),
            ("hear", 200),
            ("he", 800),
            ("world", 400),
        ])
        .unwrap()
    }

    #[test]
    fn degenerate_gestures_decode_to_empty() {
        let d = SwipeDecoder::new(&Config::default());
        assert!(d.decode(&lexicon(), &[], &bounds()).is_empty());
        assert!(d.decode(&lexicon(), &[(500.0, 150.0)], &bounds()).is_empty());
    }

    #[test]
    fn two_point_path_finds_words_by_start_letter() {
        let d = SwipeDecoder::new(&Config::default());
        // 'h' sits mid middle-row: x ≈ 0.61, y ≈ 0.5.
        let path = [(610.0, 150.0), (300.0, 80.0)];
        let out = d.decode(&lexicon(), &path, &bounds());
        assert!(!out.is_empty());
        assert!(out.iter().all(|(w, _)| w.starts_with('h')));
        assert!(out.len() <= 5);
    }

    #[test]
    fn longer_paths_prefer_longer_words() {
        let d = SwipeDecoder::new(&Config::default());
        // Six points: "hello" (5 chars) fits the path better than "he".
        let path = [
            (610.0, 150.0),
            (250.0, 50.0),
            (800.0, 150.0),
            (820.0, 150.0),
            (840.0, 160.0),
            (850.0, 60.0),
        ];
        let out = d.decode(&lexicon(), &path, &bounds());
        let hello_pos = out.iter().position(|(w, _)| w == "hello");
        let he_pos = out.iter().position(|(w, _)| w == "he");
        match (hello_pos, he_pos) {
            (Some(a), Some(b)) => assert!(a < b),
            (Some(_), None) => {}
            other => panic!("unexpected ranking: {other:?}"),
        }
    }

    #[test]
    fn key_sequence_collapses_repeats() {
        let d = SwipeDecoder::new(&Config::default());
        // Hover around 'q', slide to 'w'.
        let path = [
            (30.0, 30.0),
            (40.0, 35.0),
            (50.0, 30.0),
            (150.0, 30.0),
            (155.0, 32.0),
        ];
        let seq = d.resolve_key_sequence(&path, &bounds());
        assert_eq!(seq, vec!['q', 'w']);
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let d = SwipeDecoder::new(&Config::default());
        let path = [(610.0, 150.0), (300.0, 80.0), (400.0, 90.0)];
        for (_, score) in d.decode(&lexicon(), &path, &bounds()) {
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
