// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of importance ratings returned by the generation provider.
//!
//! The provider answers on a 1-10 scale, often with surrounding words.
//! Every digit and decimal point in the answer is kept, the result is read
//! as a number, divided by ten and clamped into `[0.1, 1.0]`.

use thiserror::Error;

/// Lowest importance a rated memory can start with.
pub const MIN_IMPORTANCE: f64 = 0.1;

/// Highest importance a rated memory can start with.
pub const MAX_IMPORTANCE: f64 = 1.0;

/// A rating parsed from provider output, on the provider's 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating(f64);

impl Rating {
    /// The number as the provider wrote it.
    pub fn raw(self) -> f64 {
        self.0
    }

    /// The rating mapped onto importance.
    pub fn importance(self) -> f64 {
        (self.0 / 10.0).clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
    }
}

/// Why a rating answer could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingParseError {
    #[error("rating answer contains no digits: {0:?}")]
    NoDigits(String),
    #[error("rating answer is not a number: {0:?}")]
    NotANumber(String),
}

/// Parse a rating answer.
pub fn parse_rating(answer: &str) -> Result<Rating, RatingParseError> {
    let kept: String = answer
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return Err(RatingParseError::NoDigits(answer.to_string()));
    }
    kept.parse::<f64>()
        .map(Rating)
        .map_err(|_| RatingParseError::NotANumber(answer.to_string()))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn plain_number() {
        assert_eq!(parse_rating("8").unwrap().importance(), 0.8);
    }

    #[test]
    fn number_with_words() {
        let rating = parse_rating("I'd rate this a 7.").unwrap();
        assert_eq!(rating.raw(), 7.0);
        assert!((rating.importance() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn decimal_rating() {
        assert!((parse_rating("6.5").unwrap().importance() - 0.65).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(parse_rating("0").unwrap().importance(), MIN_IMPORTANCE);
        assert_eq!(parse_rating("42").unwrap().importance(), MAX_IMPORTANCE);
        // Digits are concatenated, so "8/10" reads as 810.
        assert_eq!(parse_rating("8/10").unwrap().importance(), MAX_IMPORTANCE);
    }

    #[test]
    fn no_digits_is_an_error() {
        assert_eq!(
            parse_rating("very important"),
            Err(RatingParseError::NoDigits("very important".into()))
        );
        assert!(matches!(parse_rating("..."), Err(RatingParseError::NoDigits(_))));
    }

    #[test]
    fn several_decimal_points_is_an_error() {
        assert!(matches!(
            parse_rating("1.2.3"),
            Err(RatingParseError::NotANumber(_))
        ));
    }

    proptest! {
        #[test]
        fn importance_always_in_range(answer in ".{0,40}") {
            if let Ok(rating) = parse_rating(&answer) {
                let importance = rating.importance();
                prop_assert!((MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&importance));
            }
        }

        #[test]
        fn integer_ratings_map_to_tenths(n in 1u32..=10) {
            let importance = parse_rating(&n.to_string()).unwrap().importance();
            prop_assert!((importance - f64::from(n) / 10.0).abs() < 1e-12);
        }
    }
}
