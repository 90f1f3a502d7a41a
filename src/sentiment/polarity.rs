//! Averaged word polarity.
//!
//! Every sentiment-bearing word contributes its polarity, scaled by a
//! preceding intensifier and flipped at half strength by a preceding
//! negation. The result is the mean contribution, clamped to [-1, 1].

use crate::core::error::ScoreError;
use crate::sentiment::lexical::LexicalScorer;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Factor applied to a word's polarity when it follows a negation.
const NEGATION_FACTOR: f64 = -0.5;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[a-z]+(?:'[a-z]+)?").unwrap();

    static ref POLARITY: HashMap<&'static str, f64> = {
        let words = [
            // positive
            ("good", 0.7), ("great", 0.8), ("excellent", 1.0), ("amazing", 0.6),
            ("awesome", 1.0), ("best", 1.0), ("better", 0.5), ("positive", 0.23),
            ("strong", 0.43), ("stronger", 0.5), ("solid", 0.4), ("happy", 0.8),
            ("nice", 0.6), ("wonderful", 1.0), ("perfect", 1.0), ("fantastic", 0.4),
            ("impressive", 1.0), ("optimistic", 0.5), ("confident", 0.5),
            ("healthy", 0.5), ("high", 0.16), ("higher", 0.25), ("record", 0.2),
            ("profitable", 0.5), ("successful", 0.75), ("new", 0.14),
            ("robust", 0.4), ("bright", 0.7), ("safe", 0.5), ("secure", 0.4),
            ("favorable", 0.5), ("huge", 0.4), ("massive", 0.2), ("exciting", 0.3),
            ("remarkable", 0.75), ("stable", 0.3),
            // negative
            ("bad", -0.7), ("terrible", -1.0), ("awful", -1.0), ("worst", -1.0),
            ("worse", -0.4), ("poor", -0.4), ("weak", -0.38), ("weaker", -0.4),
            ("negative", -0.3), ("sad", -0.5), ("horrible", -1.0), ("ugly", -0.7),
            ("low", -0.1), ("lower", -0.2), ("dangerous", -0.6), ("risky", -0.5),
            ("volatile", -0.3), ("uncertain", -0.2), ("worried", -0.5),
            ("pessimistic", -0.5), ("disappointing", -0.6), ("wrong", -0.5),
            ("scary", -0.5), ("fake", -0.5), ("stupid", -0.8), ("dead", -0.2),
            ("painful", -0.7), ("broken", -0.4), ("illegal", -0.5),
            ("fraudulent", -0.8), ("empty", -0.1), ("severe", -0.6),
        ];
        words.iter().cloned().collect()
    };

    static ref INTENSIFIERS: HashMap<&'static str, f64> = {
        let words = [
            ("very", 1.3), ("really", 1.3), ("extremely", 1.5), ("incredibly", 1.4),
            ("super", 1.3), ("so", 1.2), ("highly", 1.3), ("quite", 1.1),
            ("slightly", 0.6), ("somewhat", 0.7), ("barely", 0.5),
        ];
        words.iter().cloned().collect()
    };

    static ref NEGATIONS: Vec<&'static str> = vec![
        "not", "no", "never", "nothing", "hardly", "isn't", "aren't", "wasn't",
        "weren't", "don't", "doesn't", "didn't", "won't", "can't", "cannot",
        "shouldn't", "wouldn't", "couldn't",
    ];
}

#[derive(Default)]
pub struct PolarityScorer;

impl PolarityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn polarity(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();

        let mut contributions = Vec::new();
        let mut intensity = 1.0;
        let mut negated = false;

        for m in WORD_RE.find_iter(&lower) {
            let word = m.as_str();

            if NEGATIONS.iter().any(|n| *n == word) {
                negated = true;
                continue;
            }
            if let Some(factor) = INTENSIFIERS.get(word) {
                intensity *= factor;
                continue;
            }

            if let Some(&polarity) = POLARITY.get(word) {
                let mut value = (polarity * intensity).clamp(-1.0, 1.0);
                if negated {
                    value *= NEGATION_FACTOR;
                }
                contributions.push(value);
            }

            // modifiers only reach the next word
            intensity = 1.0;
            negated = false;
        }

        if contributions.is_empty() {
            return 0.0;
        }
        let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

impl LexicalScorer for PolarityScorer {
    fn name(&self) -> &'static str {
        "polarity"
    }

    fn score(&self, text: &str) -> Result<f64, ScoreError> {
        Ok(self.polarity(text))
    }
}
