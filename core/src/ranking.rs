//! Ranking assigner: competition ranking within one cohort.
//!
//! Points [100, 100, 95, 90, 90, 80] rank as [1, 1, 3, 4, 4, 6]:
//! ties share a rank and the next distinct point takes its 1-based
//! position. Ties keep their input order.

use crate::types::{Point, Rank};

/// Anything that carries a point and can receive a rank.
pub trait Ranked {
    fn point(&self) -> Point;
    fn set_rank(&mut self, rank: Rank);
}

/// Sort `cohort` by point descending (stable) and assign ranks in place.
///
/// Call once per period, after every point in that period is final.
pub fn assign_ranks<T: Ranked>(cohort: &mut [T]) {
    cohort.sort_by(|a, b| b.point().cmp(&a.point()));

    let mut previous: Option<(Point, Rank)> = None;
    for (i, record) in cohort.iter_mut().enumerate() {
        let point = record.point();
        let rank = match previous {
            Some((prev_point, prev_rank)) if prev_point == point => prev_rank,
            _ => i as Rank + 1,
        };
        record.set_rank(rank);
        previous = Some((point, rank));
    }
}

/// Competition ranks for `points`, returned in input order.
pub fn competition_ranks(points: &[Point]) -> Vec<Rank> {
    struct Slot {
        index: usize,
        point: Point,
        rank:  Rank,
    }

    impl Ranked for Slot {
        fn point(&self) -> Point { self.point }
        fn set_rank(&mut self, rank: Rank) { self.rank = rank; }
    }

    let mut slots: Vec<Slot> = points
        .iter()
        .enumerate()
        .map(|(index, &point)| Slot { index, point, rank: 0 })
        .collect();
    assign_ranks(&mut slots);

    let mut ranks = vec![0; points.len()];
    for slot in slots {
        ranks[slot.index] = slot.rank;
    }
    ranks
}
