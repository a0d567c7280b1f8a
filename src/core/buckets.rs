use crate::models::{Bucket, Category, Review};

/// Compute the positions a category occupies in an ordered review list.
///
/// A populated category spans from its first to its last review. An empty
/// category is anchored where its reviews would go: after every review of a
/// more preferred category. That puts an empty `liked` bucket at rank 0, an
/// empty `disliked` bucket at rank `n`, and an empty `neutral` bucket between
/// the liked and disliked ranges.
pub fn bucket_of(ordered: &[Review], category: Category) -> Bucket {
    let mut low: Option<usize> = None;
    let mut high: Option<usize> = None;
    let mut anchor = 0i64;

    for review in ordered {
        if review.category == category {
            low = Some(low.map_or(review.rank_position, |l| l.min(review.rank_position)));
            high = Some(high.map_or(review.rank_position, |h| h.max(review.rank_position)));
        } else if review.category < category {
            anchor += 1;
        }
    }

    match (low, high) {
        (Some(low), Some(high)) => Bucket::new(low as i64, high as i64),
        _ => Bucket::empty_at(anchor),
    }
}

/// Split a user's list into the reviews a resolution ranks against and the
/// existing review of the place being resolved, if any.
///
/// The returned frame is renumbered so positions stay contiguous once the
/// existing review is taken out.
pub fn frame_without(ordered: &[Review], place_id: &str) -> (Vec<Review>, Option<Review>) {
    let mut existing = None;
    let mut frame = Vec::with_capacity(ordered.len());

    for review in ordered {
        if review.place_id == place_id {
            existing = Some(review.clone());
        } else {
            let mut review = review.clone();
            review.rank_position = frame.len();
            frame.push(review);
        }
    }

    (frame, existing)
}
