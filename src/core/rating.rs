use crate::core::buckets::bucket_of;
use crate::models::{Bucket, Category, RankedReview, Review};

/// Score band (min, max) on the 0-10 scale owned by each category
#[inline]
fn band(category: Category) -> (f64, f64) {
    match category {
        Category::Liked => (6.7, 10.0),
        Category::Neutral => (3.4, 6.6),
        Category::Disliked => (0.0, 3.3),
    }
}

/// Derive a 0-10 rating from a review's place inside its bucket
///
/// The top of the bucket gets the band maximum and the bottom the band
/// minimum, interpolated linearly in between. A single-member bucket gets
/// the band maximum.
pub fn derive_rating(position: usize, bucket: Bucket, category: Category) -> f64 {
    let (min, max) = band(category);
    let len = bucket.len();
    if len <= 1 {
        return max;
    }

    let offset = (position as i64 - bucket.low).clamp(0, len as i64 - 1) as f64;
    let fraction = offset / (len - 1) as f64;
    let rating = max - fraction * (max - min);

    (rating * 10.0).round() / 10.0
}

/// Attach derived ratings to a whole ordered list
pub fn rate_all(ordered: &[Review]) -> Vec<RankedReview> {
    let buckets: Vec<(Category, Bucket)> = Category::ALL
        .iter()
        .map(|c| (*c, bucket_of(ordered, *c)))
        .collect();

    ordered
        .iter()
        .map(|review| {
            let bucket = buckets
                .iter()
                .find(|(c, _)| *c == review.category)
                .map(|(_, b)| *b)
                .unwrap_or_else(|| Bucket::new(review.rank_position as i64, review.rank_position as i64));

            RankedReview {
                rating: derive_rating(review.rank_position, bucket, review.category),
                review: review.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_member_gets_band_max() {
        assert_eq!(derive_rating(0, Bucket::new(0, 0), Category::Liked), 10.0);
        assert_eq!(derive_rating(4, Bucket::new(4, 4), Category::Disliked), 3.3);
    }

    #[test]
    fn test_bucket_interpolation() {
        let bucket = Bucket::new(2, 4);
        assert_eq!(derive_rating(2, bucket, Category::Neutral), 6.6);
        assert_eq!(derive_rating(3, bucket, Category::Neutral), 5.0);
        assert_eq!(derive_rating(4, bucket, Category::Neutral), 3.4);
    }

    #[test]
    fn test_ratings_descend_with_rank() {
        let ordered: Vec<Review> = [Category::Liked, Category::Liked, Category::Neutral, Category::Disliked]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut review = Review::new("u1", format!("p{}", i), *c, None);
                review.rank_position = i;
                review
            })
            .collect();

        let rated = rate_all(&ordered);
        for pair in rated.windows(2) {
            assert!(pair[0].rating >= pair[1].rating);
        }
    }
}
