//! Series models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ModelResult;
use crate::ids::SeriesId;

/// Lowest number of videos a series may publish per day.
pub const MIN_POSTS_PER_DAY: i32 = 1;

/// Highest number of videos a series may publish per day.
pub const MAX_POSTS_PER_DAY: i32 = 3;

/// A content series owned by a user.
///
/// Series rows are written by the request-serving side; the pipeline only
/// reads them for generation context and batch sizing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Series {
    pub id: SeriesId,

    /// Owning user
    pub user_id: i64,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Videos produced per daily batch
    #[validate(range(min = 1, max = 3))]
    pub posts_per_day: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Series {
    /// Create a new active series with the current timestamp.
    pub fn new(
        id: SeriesId,
        user_id: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        posts_per_day: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            title: title.into(),
            description: description.into(),
            posts_per_day,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the series invariants (posts per day within bounds).
    pub fn check(&self) -> ModelResult<()> {
        self.validate()?;
        Ok(())
    }

    /// Whether a posts-per-day value is within the allowed range.
    pub fn posts_per_day_in_range(posts_per_day: i32) -> bool {
        (MIN_POSTS_PER_DAY..=MAX_POSTS_PER_DAY).contains(&posts_per_day)
    }
}
