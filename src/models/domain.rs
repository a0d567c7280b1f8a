use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Coarse judgment a user gives a place before the pairwise comparisons.
///
/// Buckets are laid out in declaration order: every `Liked` review ranks
/// above every `Neutral` one, which rank above every `Disliked` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Liked,
    Neutral,
    Disliked,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Liked, Category::Neutral, Category::Disliked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Liked => "liked",
            Category::Neutral => "neutral",
            Category::Disliked => "disliked",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "liked" => Ok(Category::Liked),
            "neutral" => Ok(Category::Neutral),
            "disliked" => Ok(Category::Disliked),
            other => Err(format!(
                "unknown category '{}', expected one of: liked, neutral, disliked",
                other
            )),
        }
    }
}

/// Result of one head-to-head judgment, from the point of view of the
/// place being reviewed.
///
/// During replay a `Win` moves the search past the opponent (the place lands
/// at a later rank) and a `Loss` keeps it at or before the opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    /// Win and loss assert a preference; a tie does not.
    pub fn is_strict(&self) -> bool {
        !matches!(self, Outcome::Tie)
    }

    pub fn opposite(&self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Tie => Outcome::Tie,
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            "tie" => Ok(Outcome::Tie),
            other => Err(format!("unknown outcome '{}', expected one of: win, loss, tie", other)),
        }
    }
}

/// One pairwise judgment submitted during a review session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(rename = "placeId")]
    pub place_id: String,
    #[serde(rename = "opponentPlaceId")]
    pub opponent_place_id: String,
    pub outcome: Outcome,
}

impl Comparison {
    pub fn new(place_id: impl Into<String>, opponent_place_id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            place_id: place_id.into(),
            opponent_place_id: opponent_place_id.into(),
            outcome,
        }
    }
}

/// A user's review of a place, positioned in their personal ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "placeId")]
    pub place_id: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub category: Category,
    #[serde(rename = "rankPosition")]
    pub rank_position: usize,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Review {
    /// Build a fresh review; the store assigns the final rank position on insert
    pub fn new(
        user_id: impl Into<String>,
        place_id: impl Into<String>,
        category: Category,
        comment: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            place_id: place_id.into(),
            comment,
            category,
            rank_position: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields of an existing review rewritten when it is re-ranked
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewUpdate {
    pub category: Category,
    pub comment: Option<String>,
}

/// Inclusive range of rank positions occupied by one category.
///
/// An empty bucket has `high == low - 1`; `low` is then the position a new
/// review of that category would take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub low: i64,
    pub high: i64,
}

impl Bucket {
    pub fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    pub fn empty_at(anchor: i64) -> Self {
        Self { low: anchor, high: anchor - 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.high < self.low
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.high - self.low + 1) as usize
        }
    }

    /// The bucket after one more review has been placed inside it
    pub fn grown(&self) -> Self {
        Self { low: self.low, high: self.high + 1 }
    }
}

/// Review paired with the rating derived from its position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedReview {
    #[serde(flatten)]
    pub review: Review,
    pub rating: f64,
}
