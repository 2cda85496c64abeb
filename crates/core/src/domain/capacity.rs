// Slot Capacity Model

use crate::domain::booking::PostNumber;

/// Default number of service posts per calendar day
pub const DEFAULT_POSTS_PER_DAY: i64 = 5;

/// Fixed daily capacity: N posts, numbered 1..=N
///
/// Pure function of configuration; no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    posts_per_day: i64,
}

impl Default for CapacityPlan {
    fn default() -> Self {
        Self {
            posts_per_day: DEFAULT_POSTS_PER_DAY,
        }
    }
}

impl CapacityPlan {
    pub fn new(posts_per_day: i64) -> crate::domain::error::Result<Self> {
        if posts_per_day < 1 {
            return Err(crate::domain::error::DomainError::InvalidCapacity(
                posts_per_day,
            ));
        }
        Ok(Self { posts_per_day })
    }

    pub fn posts_per_day(&self) -> i64 {
        self.posts_per_day
    }

    /// Whether a post number is within the configured range
    pub fn contains(&self, post: PostNumber) -> bool {
        (1..=self.posts_per_day).contains(&post)
    }

    /// Smallest post in 1..=N absent from `occupied`, or None when full.
    ///
    /// Lowest-numbered free post wins: assignment is deterministic and
    /// reproducible across callers.
    pub fn lowest_free_post(&self, occupied: &[PostNumber]) -> Option<PostNumber> {
        (1..=self.posts_per_day).find(|post| !occupied.contains(post))
    }

    /// A date is available while fewer than N posts are taken
    pub fn has_free_post(&self, occupied_count: i64) -> bool {
        occupied_count < self.posts_per_day
    }
}
