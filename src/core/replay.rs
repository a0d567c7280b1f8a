use std::collections::HashMap;

use crate::error::{RankError, Result};
use crate::models::{Bucket, Comparison, Outcome, Review};

/// Result of replaying one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub final_position: usize,
    /// Comparisons that narrowed the interval
    pub narrowing_steps: usize,
    pub ties: usize,
}

/// Binary-insertion state for one place being ranked.
///
/// The interval starts as the category's bucket and narrows with every
/// comparison against its midpoint: `Win` and `Tie` set `low = mid + 1`,
/// `Loss` sets `high = mid - 1`. Once `low > high` the position is settled;
/// later comparisons are only checked for consistency with it.
#[derive(Debug)]
pub struct Replay<'a> {
    frame: &'a [Review],
    place_id: &'a str,
    bucket: Bucket,
    low: i64,
    high: i64,
    asserted: HashMap<&'a str, Outcome>,
    narrowing_steps: usize,
    ties: usize,
}

impl<'a> Replay<'a> {
    /// `frame` must not contain `place_id` and must be numbered `0..n`.
    pub fn new(frame: &'a [Review], place_id: &'a str, bucket: Bucket) -> Self {
        Self {
            frame,
            place_id,
            bucket,
            low: bucket.low,
            high: bucket.high,
            asserted: HashMap::new(),
            narrowing_steps: 0,
            ties: 0,
        }
    }

    pub fn interval(&self) -> (i64, i64) {
        (self.low, self.high)
    }

    pub fn is_settled(&self) -> bool {
        self.low > self.high
    }

    pub fn midpoint(&self) -> Option<usize> {
        if self.is_settled() {
            return None;
        }
        Some((self.low + self.high).div_euclid(2) as usize)
    }

    /// The review the next comparison has to be made against
    pub fn next_opponent(&self) -> Option<&'a Review> {
        self.midpoint().and_then(|mid| self.frame.get(mid))
    }

    pub fn apply(&mut self, comparison: &'a Comparison) -> Result<()> {
        if comparison.place_id != self.place_id {
            return Err(RankError::InvalidComparison(format!(
                "comparison is for place {} but {} is being ranked",
                comparison.place_id, self.place_id
            )));
        }

        let opponent = comparison.opponent_place_id.as_str();
        if opponent == self.place_id {
            return Err(RankError::InvalidComparison(format!(
                "place {} cannot be compared with itself",
                opponent
            )));
        }

        let position = self
            .frame
            .iter()
            .position(|r| r.place_id == opponent)
            .ok_or_else(|| {
                RankError::InvalidComparison(format!(
                    "place {} is not in the user's ranked list",
                    opponent
                ))
            })? as i64;

        if comparison.outcome.is_strict() {
            match self.asserted.get(opponent) {
                Some(previous) if *previous == comparison.outcome.opposite() => {
                    return Err(RankError::InvalidComparison(format!(
                        "{:?} against {} contradicts an earlier {:?} in the same submission",
                        comparison.outcome, opponent, previous
                    )));
                }
                Some(_) => {}
                None => {
                    self.asserted.insert(opponent, comparison.outcome);
                }
            }
        }

        if self.is_settled() {
            if position < self.bucket.low || position > self.bucket.high {
                return Err(RankError::InvalidComparison(format!(
                    "place {} at rank {} is outside the bucket [{}, {}]",
                    opponent, position, self.bucket.low, self.bucket.high
                )));
            }
            let agrees = match comparison.outcome {
                Outcome::Win => position < self.low,
                Outcome::Loss => position >= self.low,
                Outcome::Tie => true,
            };
            if !agrees {
                return Err(RankError::InvalidComparison(format!(
                    "{:?} against {} contradicts the settled position {}",
                    comparison.outcome, opponent, self.low
                )));
            }
            return Ok(());
        }

        if position < self.low || position > self.high {
            return Err(RankError::InvalidComparison(format!(
                "place {} at rank {} is outside the search interval [{}, {}]",
                opponent, position, self.low, self.high
            )));
        }

        let mid = (self.low + self.high).div_euclid(2);
        if position != mid {
            return Err(RankError::InvalidComparison(format!(
                "expected a comparison against rank {} ({}), got {} at rank {}",
                mid, self.frame[mid as usize].place_id, opponent, position
            )));
        }

        match comparison.outcome {
            Outcome::Win => self.low = mid + 1,
            Outcome::Tie => {
                self.low = mid + 1;
                self.ties += 1;
            }
            Outcome::Loss => self.high = mid - 1,
        }
        self.narrowing_steps += 1;

        tracing::trace!(
            "Replayed {:?} against {}: interval now [{}, {}]",
            comparison.outcome,
            opponent,
            self.low,
            self.high
        );

        Ok(())
    }

    /// Insertion index, clamped to `[0, n]`
    pub fn final_position(&self) -> usize {
        self.low.clamp(0, self.frame.len() as i64) as usize
    }

    pub fn finish(self) -> ReplayOutcome {
        ReplayOutcome {
            final_position: self.final_position(),
            narrowing_steps: self.narrowing_steps,
            ties: self.ties,
        }
    }
}

/// Replay a full submission and return where the place lands
pub fn replay<'a>(
    frame: &'a [Review],
    place_id: &'a str,
    bucket: Bucket,
    comparisons: &'a [Comparison],
) -> Result<ReplayOutcome> {
    let mut state = Replay::new(frame, place_id, bucket);
    for comparison in comparisons {
        state.apply(comparison)?;
    }
    Ok(state.finish())
}
