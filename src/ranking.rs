//! Ranking Optimizer Module
//!
//! Caps candidate lists (e.g. map markers) by a weighted score of rating and
//! distance.

use std::cmp::Ordering;

// == Rankable ==
/// A candidate exposing the two scoring inputs. Missing values count as 0.
pub trait Rankable {
    fn rating(&self) -> Option<f64>;
    fn distance(&self) -> Option<f64>;
}

impl<T: Rankable + ?Sized> Rankable for &T {
    fn rating(&self) -> Option<f64> {
        (**self).rating()
    }

    fn distance(&self) -> Option<f64> {
        (**self).distance()
    }
}

// == Weights ==
/// Score weights.
///
/// Distance is weighted positively by default, so farther candidates score
/// higher. Pass a negative `distance` weight to prefer closer ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub rating: f64,
    pub distance: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            rating: 0.7,
            distance: 0.3,
        }
    }
}

// == Ranking Optimizer ==
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingOptimizer {
    weights: Weights,
}

impl RankingOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: Weights) -> Self {
        Self { weights }
    }

    /// `rating * w_rating + distance * w_distance`, missing fields as 0.
    pub fn score<T: Rankable>(&self, item: &T) -> f64 {
        item.rating().unwrap_or(0.0) * self.weights.rating
            + item.distance().unwrap_or(0.0) * self.weights.distance
    }

    // == Optimize ==
    /// Returns at most `max_count` items.
    ///
    /// Lists already within the cap come back untouched. Longer lists are
    /// stably sorted by descending score (ties keep their input order) and
    /// truncated. NaN scores sort last.
    pub fn optimize<T: Rankable>(&self, items: Vec<T>, max_count: usize) -> Vec<T> {
        if items.len() <= max_count {
            return items;
        }

        let mut scored: Vec<(f64, T)> = items
            .into_iter()
            .map(|item| (self.score(&item), item))
            .collect();
        scored.sort_by(|(a, _), (b, _)| descending(*a, *b));
        scored.truncate(max_count);
        scored.into_iter().map(|(_, item)| item).collect()
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
