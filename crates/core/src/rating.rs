//! Product ratings.

use serde::{Deserialize, Serialize};

/// Longest comment kept with a rating.
pub const MAX_COMMENT_LENGTH: usize = 1_000;

/// Why a rating was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("stars must be between 1 and 5")]
    StarsOutOfRange,
    #[error("comment must be at most {max} characters")]
    CommentTooLong { max: usize },
    /// Only buyers with a delivered order containing the product may rate it.
    #[error("only buyers who received this product can rate it")]
    NotPurchased,
}

/// A 1 to 5 star score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    /// # Errors
    ///
    /// Returns [`RatingError::StarsOutOfRange`] unless `1 <= value <= 5`.
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value >= 1 && value <= 5 {
            Ok(Self(value))
        } else {
            Err(RatingError::StarsOutOfRange)
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

/// Trim a comment and drop it if blank.
///
/// # Errors
///
/// Returns [`RatingError::CommentTooLong`] past [`MAX_COMMENT_LENGTH`] characters.
pub fn clean_comment(comment: Option<&str>) -> Result<Option<String>, RatingError> {
    let Some(text) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_COMMENT_LENGTH {
        return Err(RatingError::CommentTooLong {
            max: MAX_COMMENT_LENGTH,
        });
    }
    Ok(Some(text.to_owned()))
}

/// Average and count of a product's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

impl RatingSummary {
    /// Build a summary from a star total and count as returned by SQL aggregates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Rating counts never approach 2^52
    pub fn from_totals(star_total: i64, count: i64) -> Self {
        let average = (count > 0).then(|| {
            let raw = star_total as f64 / count as f64;
            (raw * 10.0).round() / 10.0
        });
        Self { average, count }
    }
}
