//! Feature extraction for the duplicate-question classifier.
//!
//! Maps an ordered pair of question strings to a fixed-width numeric vector:
//! handcrafted lexical/fuzzy signals followed by a hashed bag-of-words
//! embedding of each question. The vector width is a compile-time constant;
//! the trained classifier artifact is versioned against this exact schema.
//!
//! Pure and deterministic: no I/O, and identical inputs always produce
//! bit-identical output (token hashing uses FNV-1a, not a randomized hasher).

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Number of handcrafted lexical/fuzzy features at the front of the vector.
pub const HANDCRAFTED_FEATURES: usize = 12;

/// Buckets in the hashed bag-of-words embedding of a single question.
pub const BOW_BUCKETS: usize = 256;

/// Total feature-vector width consumed by the classifier.
pub const FEATURE_DIMENSIONS: usize = HANDCRAFTED_FEATURES + 2 * BOW_BUCKETS;

pub type FeatureVector = Vec<f32>;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Invalid input: both questions are empty")]
    InvalidInput,
}

/// Build the feature vector for a question pair.
///
/// Layout:
/// - `[0]`  shared distinct-token count
/// - `[1]`  absolute token-count difference
/// - `[2]`  mean token count
/// - `[3]`  shared tokens / min token count
/// - `[4]`  shared tokens / max token count
/// - `[5]`  first tokens equal (0/1)
/// - `[6]`  last tokens equal (0/1)
/// - `[7]`  absolute character-length difference
/// - `[8]`  min char length / max char length
/// - `[9]`  normalized Levenshtein ratio over the raw strings
/// - `[10]` longest-common-substring length / min char length
/// - `[11]` Levenshtein ratio over sorted-token joins
/// - `[12..12+256]`   hashed bag-of-words of `a`
/// - `[12+256..524]`  hashed bag-of-words of `b`
///
/// Fails with `FeatureError::InvalidInput` only when both strings are empty
/// after trimming; an empty-vs-nonempty pair yields a valid low-similarity
/// vector.
pub fn extract(a: &str, b: &str) -> Result<FeatureVector, FeatureError> {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a.is_empty() && b.is_empty() {
        return Err(FeatureError::InvalidInput);
    }

    let tokens_a = tokenize(&a);
    let tokens_b = tokenize(&b);

    let mut features = Vec::with_capacity(FEATURE_DIMENSIONS);
    features.extend_from_slice(&lexical_features(&a, &b, &tokens_a, &tokens_b));
    features.extend_from_slice(&bag_of_words(&tokens_a));
    features.extend_from_slice(&bag_of_words(&tokens_b));

    debug_assert_eq!(features.len(), FEATURE_DIMENSIONS);
    Ok(features)
}

/// Lowercase, strip punctuation, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    let punct = PUNCT.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]+").unwrap());

    punct
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

fn lexical_features(
    a: &str,
    b: &str,
    tokens_a: &[String],
    tokens_b: &[String],
) -> [f32; HANDCRAFTED_FEATURES] {
    use std::collections::HashSet;

    let set_a: HashSet<&str> = tokens_a.iter().map(|t| t.as_str()).collect();
    let set_b: HashSet<&str> = tokens_b.iter().map(|t| t.as_str()).collect();
    let common = set_a.intersection(&set_b).count() as f32;

    let count_a = tokens_a.len() as f32;
    let count_b = tokens_b.len() as f32;
    let min_count = count_a.min(count_b);
    let max_count = count_a.max(count_b);

    let first_eq = match (tokens_a.first(), tokens_b.first()) {
        (Some(x), Some(y)) if x == y => 1.0,
        _ => 0.0,
    };
    let last_eq = match (tokens_a.last(), tokens_b.last()) {
        (Some(x), Some(y)) if x == y => 1.0,
        _ => 0.0,
    };

    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let len_a = chars_a.len() as f32;
    let len_b = chars_b.len() as f32;
    let min_len = len_a.min(len_b);
    let max_len = len_a.max(len_b);

    let sorted_join_a = sorted_token_join(tokens_a);
    let sorted_join_b = sorted_token_join(tokens_b);

    [
        common,
        (count_a - count_b).abs(),
        (count_a + count_b) / 2.0,
        if min_count > 0.0 { common / min_count } else { 0.0 },
        if max_count > 0.0 { common / max_count } else { 0.0 },
        first_eq,
        last_eq,
        (len_a - len_b).abs(),
        if max_len > 0.0 { min_len / max_len } else { 0.0 },
        levenshtein_ratio(&chars_a, &chars_b),
        if min_len > 0.0 {
            longest_common_substring(&chars_a, &chars_b) as f32 / min_len
        } else {
            0.0
        },
        levenshtein_ratio(
            &sorted_join_a.chars().collect::<Vec<_>>(),
            &sorted_join_b.chars().collect::<Vec<_>>(),
        ),
    ]
}

fn sorted_token_join(tokens: &[String]) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

/// Hashed bag-of-words: each token increments one of `BOW_BUCKETS` counters,
/// selected by FNV-1a. The same scheme is applied to both questions.
fn bag_of_words(tokens: &[String]) -> [f32; BOW_BUCKETS] {
    let mut buckets = [0.0f32; BOW_BUCKETS];
    for token in tokens {
        let bucket = (fnv1a(token.as_bytes()) % BOW_BUCKETS as u64) as usize;
        buckets[bucket] += 1.0;
    }
    buckets
}

/// FNV-1a 64-bit. Stable across platforms and releases, unlike the standard
/// library's randomized `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// 1 - edit_distance / max_len. Both empty → 1.0, one empty → 0.0.
fn levenshtein_ratio(a: &[char], b: &[char]) -> f32 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / max_len as f32
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn longest_common_substring(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    let mut best = 0;

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                curr[j + 1] = prev[j] + 1;
                best = best.max(curr[j + 1]);
            } else {
                curr[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_width_regardless_of_input() {
        let inputs = [
            ("How do I reset my password?", "How can I reset my password?"),
            ("a", "a very much longer question about something else entirely"),
            ("", "non-empty"),
            ("¿Cómo estás?", "what is déjà vu"),
        ];
        for (a, b) in inputs {
            let v = extract(a, b).unwrap();
            assert_eq!(v.len(), FEATURE_DIMENSIONS, "width changed for {a:?}/{b:?}");
        }
    }

    #[test]
    fn test_identical_strings_score_maximum_similarity() {
        let q = "How do I reset my password?";
        let v = extract(q, q).unwrap();

        // Every ratio/equality sub-feature must be at its maximum.
        for idx in [3, 4, 5, 6, 8, 9, 10, 11] {
            assert!(
                (v[idx] - 1.0).abs() < f32::EPSILON,
                "feature [{idx}] = {} for identical inputs",
                v[idx]
            );
        }
        // And the difference features at their minimum.
        assert_eq!(v[1], 0.0);
        assert_eq!(v[7], 0.0);
    }

    #[test]
    fn test_both_empty_is_invalid_input() {
        assert!(matches!(extract("", ""), Err(FeatureError::InvalidInput)));
        assert!(matches!(extract("   ", "\t"), Err(FeatureError::InvalidInput)));
    }

    #[test]
    fn test_empty_vs_nonempty_yields_low_similarity() {
        let v = extract("", "how do magnets work").unwrap();
        assert_eq!(v.len(), FEATURE_DIMENSIONS);

        assert_eq!(v[0], 0.0, "no shared tokens");
        for idx in [3, 4, 5, 6, 8, 9, 10, 11] {
            assert_eq!(v[idx], 0.0, "feature [{idx}] should carry no similarity");
        }
        // The non-empty side still contributes to its bag-of-words half.
        let b_half: f32 = v[HANDCRAFTED_FEATURES + BOW_BUCKETS..].iter().sum();
        assert!(b_half > 0.0);
        let a_half: f32 = v[HANDCRAFTED_FEATURES..HANDCRAFTED_FEATURES + BOW_BUCKETS]
            .iter()
            .sum();
        assert_eq!(a_half, 0.0);
    }

    #[test]
    fn test_deterministic_bit_identical() {
        let a = "Why is the sky blue?";
        let b = "What makes the sky look blue?";
        let v1 = extract(a, b).unwrap();
        let v2 = extract(a, b).unwrap();
        assert_eq!(v1, v2);

        let bits1: Vec<u32> = v1.iter().map(|f| f.to_bits()).collect();
        let bits2: Vec<u32> = v2.iter().map(|f| f.to_bits()).collect();
        assert_eq!(bits1, bits2);
    }

    #[test]
    fn test_near_duplicates_score_high_fuzzy_ratios() {
        let v = extract(
            "How do I reset my password?",
            "How can I reset my password?",
        )
        .unwrap();

        assert!(v[9] > 0.8, "levenshtein ratio was {}", v[9]);
        assert!(v[11] > 0.8, "token-sort ratio was {}", v[11]);
        assert!(v[3] > 0.8, "shared-token ratio was {}", v[3]);
    }

    #[test]
    fn test_unrelated_questions_score_low_fuzzy_ratios() {
        let v = extract(
            "How do I reset my password?",
            "What is the boiling point of nitrogen?",
        )
        .unwrap();

        assert!(v[9] < 0.5, "levenshtein ratio was {}", v[9]);
        assert!(v[3] < 0.5, "shared-token ratio was {}", v[3]);
    }

    #[test]
    fn test_tokenize_strips_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("How do I reset my PASSWORD?!"),
            vec!["how", "do", "i", "reset", "my", "password"]
        );
        assert_eq!(tokenize("???"), Vec::<String>::new());
    }

    #[test]
    fn test_levenshtein_basics() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&a, &b), 3);
        assert_eq!(levenshtein(&a, &a), 0);
        assert_eq!(levenshtein(&a, &[]), 6);
    }

    #[test]
    fn test_longest_common_substring_basics() {
        let a: Vec<char> = "reset my password".chars().collect();
        let b: Vec<char> = "please reset my passphrase".chars().collect();
        // "reset my pass" is common
        assert_eq!(longest_common_substring(&a, &b), 13);
        assert_eq!(longest_common_substring(&a, &[]), 0);
    }
}
