//! Ranking assigner tests: competition ranking with ties.

use scorecard_core::{
    ranking::{assign_ranks, competition_ranks, Ranked},
    types::{Point, Rank},
};

#[derive(Debug)]
struct Entry {
    name:  &'static str,
    point: Point,
    rank:  Rank,
}

impl Ranked for Entry {
    fn point(&self) -> Point { self.point }
    fn set_rank(&mut self, rank: Rank) { self.rank = rank; }
}

fn entries(points: &[(&'static str, Point)]) -> Vec<Entry> {
    points.iter().map(|&(name, point)| Entry { name, point, rank: 0 }).collect()
}

#[test]
fn ties_share_rank_and_skip_the_next() {
    assert_eq!(competition_ranks(&[100, 100, 95, 90]), vec![1, 1, 3, 4]);
    assert_eq!(competition_ranks(&[100, 100, 95, 90, 90, 80]), vec![1, 1, 3, 4, 4, 6]);
}

#[test]
fn ranks_are_returned_in_input_order() {
    assert_eq!(competition_ranks(&[40, 90, 40, 70]), vec![3, 1, 3, 2]);
}

#[test]
fn three_way_tie_pushes_next_rank_by_three() {
    assert_eq!(competition_ranks(&[60, 80, 80, 80, 50]), vec![5, 1, 1, 1, 6]);
}

#[test]
fn empty_and_single_cohorts() {
    assert!(competition_ranks(&[]).is_empty());
    assert_eq!(competition_ranks(&[0]), vec![1]);
}

/// Slice ranking sorts best-first and keeps input order among ties.
#[test]
fn assign_ranks_sorts_stably() {
    let mut cohort = entries(&[("a", 70), ("b", 95), ("c", 70), ("d", 95), ("e", 10)]);
    assign_ranks(&mut cohort);

    let order: Vec<&str> = cohort.iter().map(|e| e.name).collect();
    assert_eq!(order, vec!["b", "d", "a", "c", "e"]);

    let ranks: Vec<Rank> = cohort.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 1, 3, 3, 5]);
}

/// Ranking law: equal points ⇒ equal ranks; higher point ⇒ strictly
/// better rank.
#[test]
fn ranking_law_holds_for_mixed_cohort() {
    let points: Vec<Point> = vec![55, 85, 85, 12, 100, 55, 55, 0, 100, 73];
    let ranks = competition_ranks(&points);

    for i in 0..points.len() {
        for j in 0..points.len() {
            if points[i] == points[j] {
                assert_eq!(ranks[i], ranks[j], "equal points {} got ranks {} and {}", points[i], ranks[i], ranks[j]);
            } else if points[i] > points[j] {
                assert!(ranks[i] < ranks[j], "point {} ranked {} not better than point {} ranked {}",
                    points[i], ranks[i], points[j], ranks[j]);
            }
        }
    }
    // Rank equals 1 + number of strictly higher points.
    for (i, &p) in points.iter().enumerate() {
        let higher = points.iter().filter(|&&q| q > p).count() as Rank;
        assert_eq!(ranks[i], higher + 1);
    }
}
