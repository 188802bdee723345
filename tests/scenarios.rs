//! End-to-end scenario tests exercising whole subsystems together rather
//! than single functions, seeded from the concrete walkthroughs used to
//! validate the executor during design.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;

use dexarb_executor::bundle::BundleBuilder;
use dexarb_executor::domain::edge::Edge;
use dexarb_executor::domain::opportunity::{Complexity, Opportunity};
use dexarb_executor::domain::risk::BreakerPhase;
use dexarb_executor::domain::router::{Router, RouterKind};
use dexarb_executor::domain::trade::TradeRecord;
use dexarb_executor::pathfinder::{CandidateKind, Pathfinder};
use dexarb_executor::risk::{RiskConfig, RiskManager};
use dexarb_executor::scheduler::{Scheduler, SchedulerConfig, WorkerTasks};
use dexarb_executor::threshold::{MarketRegime, ProfitThresholder};

fn router(addr_byte: u8, liquidity_score: f64) -> Router {
    Router {
        kind: RouterKind::V2Amm,
        name: format!("router-{addr_byte}"),
        chain_id: 42161,
        address: Address::repeat_byte(addr_byte),
        factory: None,
        fee_tiers_bps: vec![],
        liquidity_score,
    }
}

/// Scenario 1: happy dual-router. R2 buys W->U cheaper than R1 sells it
/// back, round-tripping W at a profit; the Pathfinder must surface it as a
/// Direct candidate and the Bundle Builder must select it for submission.
#[test]
fn happy_dual_router() {
    let w = Address::repeat_byte(1);
    let u = Address::repeat_byte(2);
    let r1 = router(10, 0.8);
    let r2 = router(20, 0.8);

    let edges = vec![
        Edge::new(w, u, r2.clone(), 2001.0, 0.003, U256::from(1u64), U256::from(1u64), 0),
        Edge::new(u, w, r1.clone(), 1.0 / 1999.5, 0.003, U256::from(1u64), U256::from(1u64), 0),
    ];

    let candidates = Pathfinder::find_candidates(edges);
    let direct = candidates
        .iter()
        .find(|c| c.kind == CandidateKind::Direct)
        .expect("direct dual-router opportunity must be found");
    assert!(direct.score.profit_margin > 0.0);
    assert_eq!(direct.tokens.len(), 3);
    assert_eq!(direct.tokens.first(), direct.tokens.last());
    assert!(direct.tokens.iter().all(|t| *t == w || *t == u));

    let ranked = BundleBuilder::rank(candidates);
    let selected = BundleBuilder::select_non_conflicting(ranked);
    assert_eq!(selected.len(), 1);
}

/// Scenario 2: triangular opportunity via a three-token negative cycle.
/// W -> U -> D -> W compounds to slightly above 1, which Bellman-Ford must
/// surface as a triangular candidate with reduced (but nonzero) confidence.
#[test]
fn triangular_negative_cycle() {
    let w = Address::repeat_byte(1);
    let u = Address::repeat_byte(2);
    let d = Address::repeat_byte(3);
    let r1 = router(10, 0.8);
    let r2 = router(20, 0.7);

    let edges = vec![
        Edge::new(w, u, r1.clone(), 2000.0, 0.0, U256::from(1u64), U256::from(1u64), 0),
        Edge::new(u, d, r2.clone(), 0.9995, 0.0, U256::from(1u64), U256::from(1u64), 0),
        Edge::new(d, w, r1.clone(), 1.0 / 1997.0, 0.0, U256::from(1u64), U256::from(1u64), 0),
    ];

    let candidates = Pathfinder::find_candidates(edges);
    let triangular = candidates
        .iter()
        .find(|c| c.kind == CandidateKind::Triangular)
        .expect("triangular opportunity must be detected");
    assert!(triangular.score.profit_margin > 0.0);
    assert!(triangular.score.confidence < 0.95);
    assert_eq!(triangular.tokens.len() - 1, 3);
    assert_eq!(Complexity::classify(0.002, 0.1, 0.003), Complexity::Complex);
}

/// Scenario 3: an opportunity whose profit sits below the adaptive floor
/// must never clear `Opportunity::is_profitable`, regardless of how the
/// floor was computed.
#[test]
fn threshold_veto() {
    let floor = ProfitThresholder::min_profit_usd(4_000.0, MarketRegime::Normal, 0.1);
    let opportunity_profit_usd = 1.50; // a thin opportunity, below the adaptive floor
    assert!(opportunity_profit_usd < floor, "floor ({floor}) must exceed the thin opportunity's profit");

    let opportunity = sample_opportunity(opportunity_profit_usd);
    assert!(!opportunity.is_profitable(floor));
}

/// Scenario 4: five consecutive failed trades must trip the circuit
/// breaker, and every subsequent gate check must refuse execution.
#[test]
fn circuit_breaker_trips_on_consecutive_failures() {
    let mut risk = RiskManager::new(RiskConfig {
        max_consecutive_failures: 5,
        starting_equity_usd: 10.0 * 3_000.0, // 10 native at a nominal $3000/native reference
        ..Default::default()
    });

    for i in 0..5 {
        risk.update_and_check(loss_record(i, 0.01 * 3_000.0));
    }

    assert_eq!(risk.state().phase, BreakerPhase::Tripped);
    assert!(risk
        .state()
        .reasons
        .iter()
        .any(|r| r == "Too many consecutive failures: 5"));
    assert!(risk.check_gate().is_err());
}

/// Scenario 5: a trade whose gas cost is a large fraction of its own
/// expected profit must be refused by the per-trade gate, independent of
/// the breaker's cumulative state.
#[test]
fn gas_ratio_rejection() {
    let risk = RiskManager::new(RiskConfig {
        max_gas_to_profit_ratio: 0.25,
        starting_equity_usd: 1_000.0,
        ..Default::default()
    });

    let profit_usd = 0.02 * 3_000.0;
    let gas_usd = 0.007 * 3_000.0; // ratio ~0.35, above the 0.25 floor
    assert!(gas_usd / profit_usd > 0.25);

    let assessment =
        risk.assess_trade_risk(500.0, gas_usd, profit_usd, Address::repeat_byte(9), 42161);

    assert!(!assessment.approved);
    assert!(assessment
        .reasons
        .iter()
        .any(|r| r == "Gas ratio too high: 35% > 25%"));
}

struct CountingTasks {
    scans: AtomicUsize,
    reports: AtomicUsize,
}

#[async_trait]
impl WorkerTasks for CountingTasks {
    async fn scan(&self, _worker_id: usize) -> usize {
        self.scans.fetch_add(1, Ordering::SeqCst);
        0
    }

    async fn execute(&self, _worker_id: usize, opportunity: Opportunity) -> TradeRecord {
        TradeRecord {
            opportunity_id: opportunity.id,
            chain_id: opportunity.chain_id,
            token: opportunity.input_token,
            trade_size_usd: opportunity.trade_size_usd,
            tx_hash: None,
            submitted_at: Utc::now(),
            success: true,
            realized_profit: alloy::primitives::I256::ZERO,
            realized_profit_usd: 0.0,
            gas_used: U256::ZERO,
            gas_cost_usd: 0.0,
            error: None,
        }
    }

    async fn report(&self, _worker_id: usize) {
        self.reports.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scenario 6: shutdown safety. A multi-worker scheduler must terminate
/// promptly on a shutdown signal, without hanging, even with ticks in
/// flight.
#[tokio::test]
async fn shutdown_terminates_all_workers_promptly() {
    let tasks = Arc::new(CountingTasks {
        scans: AtomicUsize::new(0),
        reports: AtomicUsize::new(0),
    });
    let scheduler = Scheduler::new(
        SchedulerConfig {
            worker_count: 4,
            scan_interval: Duration::from_millis(20),
            report_interval: Duration::from_millis(50),
        },
        tasks,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        let _ = shutdown_tx.send(());
    });

    let result = tokio::time::timeout(Duration::from_secs(5), scheduler.run(shutdown_rx)).await;
    assert!(result.is_ok(), "scheduler must shut down within the timeout");
}

fn sample_opportunity(expected_profit_usd: f64) -> Opportunity {
    Opportunity {
        id: "sample".into(),
        chain_id: 42161,
        path: None,
        token_path_symbols: vec!["WETH".into(), "USDC".into(), "WETH".into()],
        input_token: Address::ZERO,
        input_amount: U256::from(1u64),
        expected_output: U256::from(1u64),
        expected_profit: alloy::primitives::I256::ZERO,
        expected_profit_usd,
        trade_size_usd: 500.0,
        slippage_bps: 50,
        complexity: Complexity::Simple,
        confidence: 0.9,
        valid_until_block: 100,
        gas: dexarb_executor::domain::gas::GasSettings {
            max_fee_per_gas: U256::from(1u64),
            max_priority_fee_per_gas: U256::from(1u64),
            gas_limit: 200_000,
            l1_data_cost_wei: U256::ZERO,
        },
        discovered_at_block: 99,
    }
}

fn loss_record(index: u32, gas_cost_usd: f64) -> TradeRecord {
    TradeRecord {
        opportunity_id: format!("loss-{index}"),
        chain_id: 42161,
        token: Address::repeat_byte(7),
        trade_size_usd: 500.0,
        tx_hash: None,
        submitted_at: Utc::now(),
        success: false,
        realized_profit: alloy::primitives::I256::try_from(-1_i64).unwrap(),
        realized_profit_usd: -gas_cost_usd,
        gas_used: U256::from(100_000u64),
        gas_cost_usd,
        error: Some("reverted".into()),
    }
}
