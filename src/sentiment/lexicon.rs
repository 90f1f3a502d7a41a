//! Financial slang lexicon scoring.
//!
//! Terms are counted as plain substrings of the lowercased text, so `long`
//! also matches inside `longer` and `btc` inside `wbtc`. Downstream weights
//! were tuned against this counting, keep it literal.

/// Signed weight per lowercase term. Iteration order is fixed so the float sum
/// is reproducible.
pub const FINANCIAL_LEXICON: &[(&str, f64)] = &[
    ("bullish", 1.5),
    ("moon", 2.0),
    ("rally", 1.7),
    ("long", 1.3),
    ("bearish", -1.5),
    ("crash", -2.0),
    ("dump", -1.8),
    ("short", -1.3),
    ("btc", 0.8),
    ("bitcoin", 0.9),
    ("halving", 1.2),
    ("fud", -1.4),
    ("pump", 1.6),
    ("hodl", 0.7),
];

/// Contribution of a single occurrence, relative to the term weight.
pub const OCCURRENCE_WEIGHT: f64 = 0.15;

/// Sum over terms of `weight * occurrences * 0.15`. Returns 0 for text without terms.
pub fn lexicon_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    FINANCIAL_LEXICON
        .iter()
        .map(|(term, weight)| {
            let count = lower.matches(term).count();
            if count == 0 {
                0.0
            } else {
                weight * (count as f64 * OCCURRENCE_WEIGHT)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_term() {
        assert!(approx(lexicon_score("to the moon"), 0.3));
        assert!(approx(lexicon_score("MOON"), 0.3));
    }

    #[test]
    fn test_repeated_and_mixed_terms() {
        // moon x2 -> 2.0 * 0.30, crash x1 -> -2.0 * 0.15
        assert!(approx(lexicon_score("moon, moon, then crash"), 0.6 - 0.3));
    }

    #[test]
    fn test_empty_and_irrelevant_text() {
        assert_eq!(lexicon_score(""), 0.0);
        assert_eq!(lexicon_score("quiet session for equities"), 0.0);
    }

    #[test]
    fn test_substring_counting_is_literal() {
        // "longer" contains "long"
        assert!(approx(lexicon_score("longer"), 1.3 * 0.15));
        // "bitcoin" does not contain "btc", so only bitcoin counts
        assert!(approx(lexicon_score("bitcoin"), 0.9 * 0.15));
    }
}
