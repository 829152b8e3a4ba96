//! Property tests for the evaluator.

use chrono::NaiveDate;
use crosslab_core::domain::ReturnPoint;
use crosslab_core::engine::EquityCurve;
use crosslab_runner::metrics::{evaluate, max_drawdown, EvaluationParams};
use proptest::prelude::*;

fn curve(returns: &[f64]) -> EquityCurve {
    let anchor = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let points: Vec<ReturnPoint> = returns
        .iter()
        .enumerate()
        .map(|(i, &value)| ReturnPoint {
            date: anchor + chrono::Duration::days(i as i64 + 1),
            value,
        })
        .collect();
    EquityCurve::build(anchor, &points, 1.0).unwrap()
}

fn returns_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.2..0.2f64, 2..300)
}

proptest! {
    #[test]
    fn drawdown_never_positive(returns in returns_strategy()) {
        let s = evaluate(&curve(&returns), &EvaluationParams::default()).unwrap();
        prop_assert!(s.max_drawdown <= 0.0);
        prop_assert!(s.max_drawdown >= -1.0);
    }

    #[test]
    fn total_return_is_compounded_product(returns in returns_strategy()) {
        let s = evaluate(&curve(&returns), &EvaluationParams::default()).unwrap();
        let product: f64 = returns.iter().map(|r| 1.0 + r).product();
        prop_assert!((s.total_return - (product - 1.0)).abs() < 1e-9);
        prop_assert_eq!(s.number_of_days, returns.len());
    }

    #[test]
    fn volatility_non_negative(returns in returns_strategy()) {
        let s = evaluate(&curve(&returns), &EvaluationParams::default()).unwrap();
        prop_assert!(s.annualized_volatility >= 0.0);
    }

    #[test]
    fn constant_returns_have_no_sharpe(r in -0.05..0.05f64, n in 2usize..200) {
        let s = evaluate(&curve(&vec![r; n]), &EvaluationParams::default()).unwrap();
        prop_assert_eq!(s.sharpe_ratio, None);
    }

    #[test]
    fn drawdown_invariant_to_scale(values in prop::collection::vec(1.0..1000.0f64, 1..100), k in 0.1..100.0f64) {
        let scaled: Vec<f64> = values.iter().map(|v| v * k).collect();
        prop_assert!((max_drawdown(&values) - max_drawdown(&scaled)).abs() < 1e-9);
    }
}
