//! Batch orchestrator tests: carry-over, clamping, ordering, error policy.

use scorecard_core::{
    config::ScoringConfig,
    engine::{ErrorPolicy, ScoringEngine},
    error::ScoringError,
    event::{ScoringEvent, TierMovement},
    performance_calculator::ProviderCounters,
    period_chain::PeriodChain,
    potential_calculator::ClientCounters,
    record::InputRecord,
    summary::BatchSummary,
    types::{Period, SubjectKind},
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn p(month: u8, year: i32) -> Period {
    Period::new(month, year).unwrap()
}

fn engine(policy: ErrorPolicy) -> ScoringEngine {
    init_logging();
    ScoringEngine::new("engine-test".into(), ScoringConfig::default())
        .expect("default config is valid")
        .with_policy(policy)
}

fn client(subject: &str, period: Period, requests: u32, spending: f64, cancelled: u32) -> InputRecord<ClientCounters> {
    InputRecord::new(
        subject,
        period,
        ClientCounters {
            booking_requests:        requests,
            spending,
            cancellations_by_client: cancelled,
        },
    )
}

/// The provider reference counters: weighted sum 86.
fn strong_provider(subject: &str, period: Period) -> InputRecord<ProviderCounters> {
    InputRecord::new(
        subject,
        period,
        ProviderCounters {
            packages_delivered:             5,
            avg_rating:                     4.5,
            ratings_count:                  10,
            bookings_total:                 8,
            bookings_completed:             7,
            bookings_cancelled_by_provider: 1,
            revenue:                        600_000.0,
        },
    )
}

#[test]
fn prior_tier_floor_carries_into_next_month() {
    let input = vec![
        client("c-1", p(1, 2025), 12, 1_200_000.0, 0),
        client("c-1", p(2, 2025), 0, 0.0, 0),
    ];
    let out = engine(ErrorPolicy::FailFast)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    let jan = out.find("c-1", p(1, 2025)).unwrap();
    assert_eq!((jan.prior_tier, jan.point, jan.tier), (0, 76, 2));

    // Floor of tier 2 (70) plus this month's 25.
    let feb = out.find("c-1", p(2, 2025)).unwrap();
    assert_eq!((feb.prior_tier, feb.point, feb.tier), (2, 95, 3));
}

#[test]
fn gap_month_resets_the_carry_over() {
    let input = vec![
        client("c-1", p(1, 2025), 12, 1_200_000.0, 0),
        client("c-1", p(3, 2025), 0, 0.0, 0),
    ];
    let out = engine(ErrorPolicy::FailFast)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    let mar = out.find("c-1", p(3, 2025)).unwrap();
    assert_eq!(mar.prior_tier, 0);
    assert_eq!(mar.point, 25);
}

#[test]
fn point_is_clamped_to_ceiling() {
    let input = vec![strong_provider("p-1", p(1, 2025)), strong_provider("p-1", p(2, 2025))];
    let out = engine(ErrorPolicy::FailFast)
        .score_providers(&input, PeriodChain::new())
        .unwrap();

    assert_eq!(out.find("p-1", p(1, 2025)).unwrap().point, 86);
    let feb = out.find("p-1", p(2, 2025)).unwrap();
    assert_eq!(feb.prior_tier, 3);
    assert_eq!(feb.point, 100, "85 + 86 must clamp to 100");
}

/// Input order across periods must not matter: January is always
/// scored before February.
#[test]
fn unsorted_input_scores_like_sorted_input() {
    let sorted = vec![
        client("c-1", p(1, 2025), 12, 1_200_000.0, 0),
        client("c-2", p(1, 2025), 2, 100_000.0, 1),
        client("c-1", p(2, 2025), 0, 0.0, 0),
        client("c-2", p(2, 2025), 3, 900_000.0, 0),
    ];
    let shuffled = vec![sorted[3].clone(), sorted[0].clone(), sorted[2].clone(), sorted[1].clone()];

    let e = engine(ErrorPolicy::FailFast);
    let a = e.score_clients(&sorted, PeriodChain::new()).unwrap();
    let b = e.score_clients(&shuffled, PeriodChain::new()).unwrap();

    for rec in &a.records {
        let other = b.find(&rec.subject_id, rec.period).unwrap();
        assert_eq!(rec.point, other.point, "{} {}", rec.subject_id, rec.period);
        assert_eq!(rec.rank, other.rank);
    }
    assert_eq!(b.find("c-1", p(2, 2025)).unwrap().point, 95);
}

#[test]
fn output_is_period_ascending_then_rank() {
    let input = vec![
        client("c-low", p(2, 2025), 0, 0.0, 0),
        client("c-high", p(2, 2025), 12, 1_200_000.0, 0),
        client("c-low", p(1, 2025), 1, 0.0, 5),
        client("c-mid", p(1, 2025), 2, 200_000.0, 0),
    ];
    let out = engine(ErrorPolicy::FailFast)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    let keys: Vec<(Period, &str, u32)> = out
        .records
        .iter()
        .map(|r| (r.period, r.subject_id.as_str(), r.rank))
        .collect();
    assert_eq!(
        keys,
        vec![
            (p(1, 2025), "c-mid", 1),
            (p(1, 2025), "c-low", 2),
            (p(2, 2025), "c-high", 1),
            (p(2, 2025), "c-low", 2),
        ]
    );
    assert_eq!(out.cohort(p(2, 2025)).count(), 2);
}

#[test]
fn equal_points_share_rank_in_input_order() {
    let input = vec![
        client("c-b", p(4, 2025), 0, 0.0, 0),
        client("c-a", p(4, 2025), 0, 0.0, 0),
        client("c-c", p(4, 2025), 12, 1_200_000.0, 0),
    ];
    let out = engine(ErrorPolicy::FailFast)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    let ranked: Vec<(&str, u32)> = out.records.iter().map(|r| (r.subject_id.as_str(), r.rank)).collect();
    assert_eq!(ranked, vec![("c-c", 1), ("c-b", 2), ("c-a", 2)]);
}

#[test]
fn same_input_same_output() {
    let input = vec![
        strong_provider("p-1", p(11, 2024)),
        strong_provider("p-2", p(12, 2024)),
        strong_provider("p-1", p(12, 2024)),
    ];
    let e = engine(ErrorPolicy::FailFast);
    let a = e.score_providers(&input, PeriodChain::new()).unwrap();
    let b = e.score_providers(&input, PeriodChain::new()).unwrap();
    assert_eq!(a.records, b.records);
    assert_eq!(a.events, b.events);
}

#[test]
fn duplicate_key_fails_fast() {
    let input = vec![
        client("c-1", p(1, 2025), 1, 0.0, 0),
        client("c-1", p(1, 2025), 2, 0.0, 0),
    ];
    let err = engine(ErrorPolicy::FailFast)
        .score_clients(&input, PeriodChain::new())
        .unwrap_err();
    assert!(matches!(err, ScoringError::DuplicateKey { ref subject_id, .. } if subject_id == "c-1"));
}

#[test]
fn duplicate_key_isolates_only_that_subject() {
    let input = vec![
        client("c-1", p(1, 2025), 1, 0.0, 0),
        client("c-2", p(1, 2025), 3, 0.0, 0),
        client("c-1", p(2, 2025), 1, 0.0, 0),
        client("c-1", p(2, 2025), 2, 0.0, 0),
    ];
    let out = engine(ErrorPolicy::IsolateSubject)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    assert!(out.records.iter().all(|r| r.subject_id == "c-2"));
    assert_eq!(out.rejections.len(), 1);
    assert_eq!(out.rejections[0].subject_id, "c-1");
    assert!(matches!(out.rejections[0].error, ScoringError::DuplicateKey { .. }));
}

#[test]
fn out_of_table_carry_in_tier_fails_fast() {
    let chain = PeriodChain::with_history(vec![("c-1".to_string(), p(12, 2024), 7)]);
    let input = vec![client("c-1", p(1, 2025), 1, 0.0, 0)];
    let err = engine(ErrorPolicy::FailFast)
        .score_clients(&input, chain)
        .unwrap_err();
    assert!(matches!(err, ScoringError::InvalidTier { tier: 7 }), "got {err}");
}

#[test]
fn isolation_drops_subject_from_failing_period_onward() {
    let chain = PeriodChain::with_history(vec![("c-bad".to_string(), p(12, 2024), 7)]);
    let input = vec![
        client("c-bad", p(1, 2025), 1, 0.0, 0),
        client("c-ok", p(1, 2025), 1, 0.0, 0),
        client("c-bad", p(2, 2025), 1, 0.0, 0),
        client("c-ok", p(2, 2025), 1, 0.0, 0),
    ];
    let out = engine(ErrorPolicy::IsolateSubject).score_clients(&input, chain).unwrap();

    assert_eq!(out.records.len(), 2);
    assert!(out.records.iter().all(|r| r.subject_id == "c-ok"));
    assert_eq!(out.rejections.len(), 1);
    assert_eq!(out.rejections[0].period, p(1, 2025));
}

#[test]
fn isolation_keeps_periods_finalized_before_the_failure() {
    let input = vec![
        client("c-1", p(1, 2025), 12, 1_200_000.0, 0),
        client("c-1", p(2, 2025), 1, f64::NAN, 0),
        client("c-1", p(3, 2025), 1, 0.0, 0),
    ];
    let out = engine(ErrorPolicy::IsolateSubject)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].period, p(1, 2025));
    assert_eq!(out.rejections[0].period, p(2, 2025));
    assert!(matches!(out.rejections[0].error, ScoringError::InvalidCounter { counter: "spending", .. }));
}

#[test]
fn carry_in_history_seeds_the_first_month() {
    let chain = PeriodChain::with_history(vec![("c-1".to_string(), p(12, 2024), 3)]);
    let input = vec![client("c-1", p(1, 2025), 0, 0.0, 0)];
    let out = engine(ErrorPolicy::FailFast).score_clients(&input, chain).unwrap();

    let jan = &out.records[0];
    assert_eq!(jan.prior_tier, 3);
    assert_eq!(jan.point, 100, "85 + 25 clamps to 100");
}

#[test]
fn events_trace_the_batch() {
    let input = vec![
        client("c-1", p(1, 2025), 12, 1_200_000.0, 0),
        client("c-2", p(1, 2025), 0, 0.0, 0),
        client("c-1", p(2, 2025), 1, 0.0, 5),
    ];
    let out = engine(ErrorPolicy::FailFast)
        .score_clients(&input, PeriodChain::new())
        .unwrap();

    let types: Vec<&str> = out.events.iter().map(|e| e.type_name()).collect();
    assert_eq!(
        types,
        vec![
            "run_started",
            "subject_scored",
            "subject_scored",
            "cohort_ranked",
            "subject_scored",
            "cohort_ranked",
            "run_completed",
        ]
    );

    // c-1 in February: floor 70 plus a -96 sum clamps to 0.
    let demoted = out.events.iter().find_map(|e| match e {
        ScoringEvent::SubjectScored { subject_id, period, movement, .. }
            if subject_id == "c-1" && *period == p(2, 2025) => Some(*movement),
        _ => None,
    });
    assert_eq!(demoted, Some(TierMovement::Demoted));

    match out.events.last() {
        Some(ScoringEvent::RunCompleted { scored, rejected, kind, .. }) => {
            assert_eq!((*scored, *rejected, *kind), (3, 0, SubjectKind::Client));
        }
        other => panic!("expected RunCompleted last, got {other:?}"),
    }
}

#[test]
fn summary_counts_tiers_highest_first() {
    let input = vec![
        client("c-1", p(1, 2025), 12, 1_200_000.0, 0),
        client("c-2", p(1, 2025), 0, 0.0, 0),
        client("c-1", p(2, 2025), 0, 0.0, 0),
    ];
    let e = engine(ErrorPolicy::FailFast);
    let out = e.score_clients(&input, PeriodChain::new()).unwrap();
    let summary = BatchSummary::from_outcome(SubjectKind::Client, &out, &e.config().tiers).unwrap();

    assert_eq!(summary.records, 3);
    assert_eq!(summary.subjects, 2);
    assert_eq!(summary.cohorts, 2);
    assert_eq!(summary.first_period, Some(p(1, 2025)));
    assert_eq!(summary.last_period, Some(p(2, 2025)));

    let counts: Vec<(u8, &str, usize)> = summary
        .tiers
        .iter()
        .map(|t| (t.tier, t.label.as_str(), t.count))
        .collect();
    assert_eq!(
        counts,
        vec![(3, "VIP", 1), (2, "PREMIUM", 1), (1, "STANDARD", 0), (0, "CASUAL", 1)]
    );
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let mut config = ScoringConfig::default();
    config.client.weights.loyalty = 0.9;
    assert!(matches!(
        ScoringEngine::new("bad".into(), config),
        Err(ScoringError::InvalidConfig { .. })
    ));
}
