//! Look-ahead contamination tests.
//!
//! Invariant: nothing computed for day t may depend on prices from day t+1
//! or later.
//!
//! Method: run each stage on a truncated series (days 0..k) and on the full
//! series (days 0..n). Everything up to day k must be identical between both
//! runs. Any difference means future data is leaking into past values.

use chrono::NaiveDate;
use crosslab_core::domain::PriceSeries;
use crosslab_core::engine::{simulate_strategy, EquityCurve};
use crosslab_core::indicators::Sma;
use crosslab_core::signal::generate_positions;

/// Deterministic pseudo-random walk using a simple LCG.
fn make_test_series(n: usize) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut price = 100.0;
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = (price + change).max(10.0);
            price
        })
        .collect();
    PriceSeries::from_closes("TEST", base_date, &closes).unwrap()
}

fn truncate(series: &PriceSeries, len: usize) -> PriceSeries {
    let end = series.points()[len - 1].date;
    let start = series.points()[0].date;
    series.slice(start, end)
}

#[test]
fn sma_has_no_lookahead() {
    let full = make_test_series(300);
    for &window in &[1, 5, 20, 50] {
        for &k in &[60, 137, 200] {
            let short = truncate(&full, k);
            let sma = Sma::new(window).unwrap();
            let on_full = sma.compute(&full).unwrap();
            let on_short = sma.compute(&short).unwrap();
            assert_eq!(on_short.len(), k);
            for i in 0..k {
                assert_eq!(
                    on_short.points[i], on_full.points[i],
                    "SMA({window}) differs at index {i} when truncated at {k}"
                );
            }
        }
    }
}

#[test]
fn positions_have_no_lookahead() {
    let full = make_test_series(300);
    let (s, l) = (Sma::new(10).unwrap(), Sma::new(30).unwrap());
    let full_pos = generate_positions(&s.compute(&full).unwrap(), &l.compute(&full).unwrap())
        .unwrap();

    for &k in &[31, 100, 250] {
        let short = truncate(&full, k);
        let pos = generate_positions(&s.compute(&short).unwrap(), &l.compute(&short).unwrap())
            .unwrap();
        assert_eq!(pos.as_slice(), &full_pos[..pos.len()]);
    }
}

#[test]
fn strategy_curve_has_no_lookahead() {
    let full = make_test_series(300);
    let run = |series: &PriceSeries| {
        let s = Sma::new(5).unwrap().compute(series).unwrap();
        let l = Sma::new(20).unwrap().compute(series).unwrap();
        let positions = generate_positions(&s, &l).unwrap();
        let sim = simulate_strategy(&positions, &series.daily_returns()).unwrap();
        EquityCurve::build(series.points()[0].date, &sim.returns, 1.0).unwrap()
    };

    let full_curve = run(&full);
    let short_curve = run(&truncate(&full, 150));
    assert_eq!(short_curve.points.as_slice(), &full_curve.points[..150]);
}

/// Changing tomorrow's price must not change today's strategy value, only
/// tomorrow's (and only if the strategy is Long going into tomorrow).
#[test]
fn perturbing_last_price_only_affects_last_point() {
    let base = make_test_series(120);
    let mut closes: Vec<f64> = base.closes().collect();
    let last = closes.len() - 1;
    closes[last] *= 1.5;
    let bumped = PriceSeries::from_closes("TEST", base.points()[0].date, &closes).unwrap();

    let run = |series: &PriceSeries| {
        let s = Sma::new(5).unwrap().compute(series).unwrap();
        let l = Sma::new(20).unwrap().compute(series).unwrap();
        let positions = generate_positions(&s, &l).unwrap();
        let sim = simulate_strategy(&positions, &series.daily_returns()).unwrap();
        (
            positions,
            EquityCurve::build(series.points()[0].date, &sim.returns, 1.0).unwrap(),
        )
    };

    let (pos_a, curve_a) = run(&base);
    let (pos_b, curve_b) = run(&bumped);
    assert_eq!(&curve_a.points[..last], &curve_b.points[..last]);

    let held_into_last = pos_a[pos_a.len() - 2].position;
    assert_eq!(held_into_last, pos_b[pos_b.len() - 2].position);
    if held_into_last.is_long() {
        assert!(curve_b.points[last].value > curve_a.points[last].value);
    } else {
        assert_eq!(curve_b.points[last].value, curve_a.points[last].value);
    }
}
