//! String-similarity metrics and keyboard geometry.
//!
//! Three complementary signals feed candidate generation and scoring:
//! - Damerau-Levenshtein edit distance (insert, delete, substitute,
//!   adjacent transposition, each cost 1)
//! - longest-common-subsequence ratio for unequal-length pairs
//! - Jaccard similarity over character sets, which catches transpositions
//!   and omissions edit distance prices too high
//!
//! `KeyGeometry` maps characters to positions on a fixed QWERTY layout and
//! turns physical key distance into a `[0, 1]` proximity score.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Damerau-Levenshtein distance over chars.
///
/// Adjacent transpositions cost 1, so `distance("the", "teh") == 1`.
/// Symmetric in its arguments.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        dp[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(dp[i - 2][j - 2] + 1);
            }
            dp[i][j] = best;
        }
    }
    dp[n][m]
}

/// Longest-common-subsequence length divided by the longer length.
///
/// Returns a ratio in `[0, 1]`; 1.0 for two empty strings.
pub fn lcs_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 && m == 0 {
        return 1.0;
    }
    if n == 0 || m == 0 {
        return 0.0;
    }

    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=m {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }
    dp[n][m] as f32 / n.max(m) as f32
}

/// Jaccard similarity of the two words' character sets.
pub fn jaccard_chars(a: &str, b: &str) -> f32 {
    let sa: HashSet<char> = a.chars().collect();
    let sb: HashSet<char> = b.chars().collect();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 1.0;
    }
    let inter = sa.intersection(&sb).count();
    inter as f32 / union as f32
}

/// Physical layout of a three-row keyboard.
///
/// Holds per-character grid coordinates (column, row) for proximity
/// scoring, and resolves normalized `[0,1]²` touch points to keys by
/// partitioning each row into equal-width columns.
#[derive(Debug, Clone)]
pub struct KeyGeometry {
    rows: Vec<Vec<char>>,
    coords: AHashMap<char, (f32, f32)>,
}

/// Distance at which two keys stop contributing any proximity.
const MAX_KEY_DISTANCE: f32 = 3.0;

/// The standard QWERTY layout.
pub static QWERTY: Lazy<KeyGeometry> = Lazy::new(|| {
    KeyGeometry::from_rows(&["qwertyuiop", "asdfghjkl", "zxcvbnm"])
});

impl KeyGeometry {
    /// Build a geometry from row strings, top row first.
    pub fn from_rows(rows: &[&str]) -> Self {
        let rows: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
        let mut coords = AHashMap::new();
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, ch) in row.iter().enumerate() {
                coords.insert(*ch, (col_idx as f32, row_idx as f32));
            }
        }
        Self { rows, coords }
    }

    /// Grid coordinate of a character, if it is on the layout.
    pub fn coord(&self, ch: char) -> Option<(f32, f32)> {
        self.coords.get(&ch).copied()
    }

    /// Euclidean grid distance between two keys. Characters not on the
    /// layout count as maximally distant.
    pub fn key_distance(&self, a: char, b: char) -> f32 {
        match (self.coord(a), self.coord(b)) {
            (Some((ax, ay)), Some((bx, by))) => ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt(),
            _ => MAX_KEY_DISTANCE,
        }
    }

    /// Keyboard-proximity score in `[0, 1]` for a token/candidate pair.
    ///
    /// Equal lengths: average per-position key distance, normalized via
    /// `max(0, 1 - avg / 3)`. Unequal lengths: LCS ratio, which degrades
    /// gracefully for insertions and deletions.
    pub fn proximity_score(&self, token: &str, candidate: &str) -> f32 {
        let ta: Vec<char> = token.chars().collect();
        let ca: Vec<char> = candidate.chars().collect();
        if ta.is_empty() || ca.is_empty() {
            return 0.0;
        }
        if ta.len() != ca.len() {
            return lcs_ratio(token, candidate);
        }
        let total: f32 = ta
            .iter()
            .zip(ca.iter())
            .map(|(&a, &b)| self.key_distance(a, b))
            .sum();
        let avg = total / ta.len() as f32;
        (1.0 - avg / MAX_KEY_DISTANCE).max(0.0)
    }

    /// Resolve a normalized `[0,1]²` point to the nearest key.
    ///
    /// The row is chosen by y-third, the column by equal-width x partition
    /// of that row. Returns `None` for an empty geometry.
    pub fn nearest_key(&self, x: f32, y: f32) -> Option<char> {
        if self.rows.is_empty() {
            return None;
        }
        let y = y.clamp(0.0, 1.0);
        let row_idx = ((y * self.rows.len() as f32) as usize).min(self.rows.len() - 1);
        let row = &self.rows[row_idx];
        if row.is_empty() {
            return None;
        }
        let x = x.clamp(0.0, 1.0);
        let col = ((x * row.len() as f32) as usize).min(row.len() - 1);
        Some(row[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_counts_transposition_as_one() {
        assert_eq!(edit_distance("the", "teh"), 1);
        assert_eq!(edit_distance("taht", "that"), 1);
    }

    #[test]
    fn distance_matches_classic_example() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn distance_is_symmetric() {
        for (a, b) in [("the", "teh"), ("kitten", "sitting"), ("", "abc"), ("ab", "ba")] {
            assert_eq!(edit_distance(a, b), edit_distance(b, a));
        }
    }

    #[test]
    fn distance_identity_is_zero() {
        assert_eq!(edit_distance("hello", "hello"), 0);
        assert_eq!(edit_distance("", ""), 0);
    }

    #[test]
    fn lcs_ratio_bounds() {
        assert_eq!(lcs_ratio("abc", "abc"), 1.0);
        assert_eq!(lcs_ratio("abc", "xyz"), 0.0);
        let r = lcs_ratio("hello", "helo");
        assert!(r > 0.7 && r < 1.0);
    }

    #[test]
    fn jaccard_catches_transpositions() {
        // Same character set, different order.
        assert_eq!(jaccard_chars("teh", "the"), 1.0);
        assert!(jaccard_chars("abc", "abd") > 0.4);
        assert_eq!(jaccard_chars("", ""), 1.0);
    }

    #[test]
    fn proximity_adjacent_keys_score_high() {
        // q and w are adjacent; q and p are across the row.
        let near = QWERTY.proximity_score("qat", "wat");
        let far = QWERTY.proximity_score("qat", "pat");
        assert!(near > far);
        assert!(near > 0.0 && near <= 1.0);
    }

    #[test]
    fn proximity_identity_is_one() {
        assert!((QWERTY.proximity_score("hello", "hello") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn proximity_unequal_lengths_uses_lcs() {
        let s = QWERTY.proximity_score("helo", "hello");
        assert!((s - lcs_ratio("helo", "hello")).abs() < f32::EPSILON);
    }

    #[test]
    fn nearest_key_partitions_rows() {
        assert_eq!(QWERTY.nearest_key(0.05, 0.1), Some('q'));
        assert_eq!(QWERTY.nearest_key(0.95, 0.1), Some('p'));
        assert_eq!(QWERTY.nearest_key(0.05, 0.5), Some('a'));
        assert_eq!(QWERTY.nearest_key(0.5, 0.9), Some('v'));
        // Out-of-range points clamp instead of failing.
        assert_eq!(QWERTY.nearest_key(1.5, -0.2), Some('p'));
    }
}
