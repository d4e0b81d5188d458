//! scorecard-runner: headless batch runner for the marketplace scorecard.
//!
//! Usage:
//!   scorecard-runner --providers providers.json --clients clients.json --out ./out
//!   scorecard-runner --synthesize --seed 12345 --subjects 40 --months 12 --start 2025-01 --db scores.db
//!   scorecard-runner --providers p.json --db scores.db --carry-in --policy isolate

use anyhow::{bail, Result};
use chrono::Utc;
use scorecard_core::{
    codec::{self, ClientRow, ProviderRow},
    config::ScoringConfig,
    engine::{BatchOutcome, ErrorPolicy, ScoringEngine},
    performance_calculator::ProviderCounters,
    period_chain::PeriodChain,
    potential_calculator::ClientCounters,
    record::{self, InputRecord},
    store::{RunMeta, ScoreStore},
    summary::BatchSummary,
    synthetic::{self, Population},
    types::{Period, SubjectKind},
};
use std::env;
use std::path::Path;

#[derive(serde::Serialize)]
struct RunSummary {
    run_id:    String,
    scored_at: String,
    policy:    String,
    providers: BatchSummary,
    clients:   BatchSummary,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let subjects = parse_arg(&args, "--subjects", 40usize);
    let months = parse_arg(&args, "--months", 12usize);
    let synthesize = args.iter().any(|a| a == "--synthesize");
    let carry_in = args.iter().any(|a| a == "--carry-in");
    let providers_path = arg_str(&args, "--providers");
    let clients_path = arg_str(&args, "--clients");
    let config_path = arg_str(&args, "--config");
    let out_dir = arg_str(&args, "--out");
    let db = arg_str(&args, "--db");
    let start = Period::parse(arg_str(&args, "--start").unwrap_or("2025-01"))?;
    let policy = match arg_str(&args, "--policy").unwrap_or("fail-fast") {
        "fail-fast" => ErrorPolicy::FailFast,
        "isolate"   => ErrorPolicy::IsolateSubject,
        other       => bail!("unknown --policy '{other}', expected fail-fast or isolate"),
    };

    check_flags(
        synthesize,
        providers_path.is_some() || clients_path.is_some(),
        carry_in,
        db.is_some(),
    )?;

    let config = match config_path {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };

    // Load or synthesize the input snapshot.
    let (providers, clients): (Vec<InputRecord<ProviderCounters>>, Vec<InputRecord<ClientCounters>>) =
        if synthesize {
            let population = Population { seed, subjects, months, start };
            (synthetic::providers(&population), synthetic::clients(&population))
        } else {
            let providers = match providers_path {
                Some(path) => codec::read_rows::<ProviderRow>(path)?,
                None => Vec::new(),
            };
            let clients = match clients_path {
                Some(path) => codec::read_rows::<ClientRow>(path)?,
                None => Vec::new(),
            };
            (providers, clients)
        };

    let scored_at = Utc::now();
    let run_id = format!("score-{}", scored_at.format("%Y%m%dT%H%M%S%3f"));

    println!("Marketplace scorecard: scorecard-runner");
    println!("  run_id:     {run_id}");
    println!("  providers:  {} records", providers.len());
    println!("  clients:    {} records", clients.len());
    println!("  policy:     {policy:?}");
    println!("  db:         {}", db.unwrap_or("(none)"));
    println!();

    let store = match db {
        Some(path) => {
            let store = ScoreStore::open(path)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };
    // Refuse a clashing run id before any snapshot is written.
    if let Some(store) = &store {
        if store.run_scored_at(&run_id)?.is_some() {
            bail!("run {run_id} already exists in the database; retry");
        }
    }

    let provider_chain = chain_for(store.as_ref(), carry_in, SubjectKind::Provider, &providers)?;
    let client_chain = chain_for(store.as_ref(), carry_in, SubjectKind::Client, &clients)?;

    let engine = ScoringEngine::new(run_id.clone(), config)?.with_policy(policy);
    let provider_outcome = engine.score_providers(&providers, provider_chain)?;
    let client_outcome = engine.score_clients(&clients, client_chain)?;

    let tiers = &engine.config().tiers;
    let summary = RunSummary {
        run_id:    run_id.clone(),
        scored_at: scored_at.to_rfc3339(),
        policy:    format!("{policy:?}"),
        providers: BatchSummary::from_outcome(SubjectKind::Provider, &provider_outcome, tiers)?,
        clients:   BatchSummary::from_outcome(SubjectKind::Client, &client_outcome, tiers)?,
    };

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
        let path = |name: &str| Path::new(dir).join(name).to_string_lossy().into_owned();
        if synthesize {
            std::fs::write(path("providers_input.json"), codec::input_to_json(&providers)?)?;
            std::fs::write(path("clients_input.json"), codec::input_to_json(&clients)?)?;
        }
        codec::write_scored(&path("providers_scored.json"), SubjectKind::Provider, &provider_outcome.records, tiers)?;
        codec::write_scored(&path("clients_scored.json"), SubjectKind::Client, &client_outcome.records, tiers)?;
        std::fs::write(path("summary.json"), serde_json::to_string_pretty(&summary)?)?;
    }

    if let Some(store) = &store {
        let meta = RunMeta {
            run_id:    &run_id,
            version:   env!("CARGO_PKG_VERSION"),
            policy,
            scored_at,
        };
        store.save_run(&meta, &provider_outcome, &client_outcome)?;
    }

    print_summary(&summary.providers);
    print_rejections(&provider_outcome);
    print_summary(&summary.clients);
    print_rejections(&client_outcome);
    Ok(())
}

/// Reject flag combinations that would silently do nothing.
fn check_flags(synthesize: bool, has_input: bool, carry_in: bool, has_db: bool) -> Result<()> {
    if !synthesize && !has_input {
        bail!("nothing to score: pass --providers/--clients or --synthesize");
    }
    if carry_in && !has_db {
        bail!("--carry-in reads prior tiers from the database: pass --db as well");
    }
    Ok(())
}

/// Seed the period chain from the store when --carry-in is set.
fn chain_for<C>(
    store:    Option<&ScoreStore>,
    carry_in: bool,
    kind:     SubjectKind,
    input:    &[InputRecord<C>],
) -> Result<PeriodChain> {
    let (Some(store), true) = (store, carry_in) else {
        return Ok(PeriodChain::new());
    };
    let cutoffs = record::first_periods(input);
    let history = store.carry_in_history(kind, &cutoffs)?;
    log::info!("{}: carrying in {} prior tiers", kind.name(), history.len());
    Ok(PeriodChain::with_history(history))
}

fn print_summary(summary: &BatchSummary) {
    println!("=== {} SUMMARY ===", summary.kind.name().to_uppercase());
    println!("  records:   {}", summary.records);
    println!("  subjects:  {}", summary.subjects);
    println!("  cohorts:   {}", summary.cohorts);
    println!("  rejected:  {}", summary.rejected);
    if let (Some(first), Some(last)) = (summary.first_period, summary.last_period) {
        println!("  periods:   {first} .. {last}");
    }
    for t in &summary.tiers {
        println!("  tier {} ({:<12}): {:>5}", t.tier, t.label, t.count);
    }
    println!();
}

fn print_rejections<C>(outcome: &BatchOutcome<C>) {
    for r in &outcome.rejections {
        println!("  rejected {} from {}: {}", r.subject_id, r.period, r.error);
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn arg_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
