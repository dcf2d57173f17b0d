//! Integration tests for the indicator and backtest engines.
//!
//! Tests cover:
//! - Hand-checked crossover results on a short fixed series
//! - Degenerate inputs: flat prices, monotone rises, tiny series
//! - Data port plumbing with a mock source
//! - Properties over random price paths: alignment, no look-ahead,
//!   equity recurrence, drawdown bounds, idempotence

mod common;

use approx::assert_relative_eq;
use barlytics::domain::backtest::{evaluate_crossover, run_crossover, CrossoverConfig};
use barlytics::domain::error::BarlyticsError;
use barlytics::domain::indicator::{calculate_ema, calculate_rsi, calculate_sma, IndicatorType};
use barlytics::domain::indicator_table::{apply_indicators, IndicatorConfig};
use barlytics::domain::metrics::Summary;
use barlytics::ports::data_port::{DataPort, KlineRequest};
use common::*;
use proptest::prelude::*;

fn ema_by_recurrence(closes: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = vec![closes[0]];
    for &x in &closes[1..] {
        let prev = out[out.len() - 1];
        out.push(alpha * x + (1.0 - alpha) * prev);
    }
    out
}

mod crossover_regression {
    use super::*;

    #[test]
    fn emas_match_recurrence() {
        let run = run_crossover(
            &make_series(&REGRESSION_CLOSES),
            &CrossoverConfig::new(2, 4).unwrap(),
        )
        .unwrap();

        let fast = ema_by_recurrence(&REGRESSION_CLOSES, 2);
        let slow = ema_by_recurrence(&REGRESSION_CLOSES, 4);
        for t in 0..REGRESSION_CLOSES.len() {
            assert_relative_eq!(run.frame.ema_fast[t], fast[t], epsilon = 1e-9);
            assert_relative_eq!(run.frame.ema_slow[t], slow[t], epsilon = 1e-9);
        }
        assert_relative_eq!(run.frame.ema_fast[1], 101.0 + 1.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(run.frame.ema_slow[1], 100.8, epsilon = 1e-9);
    }

    #[test]
    fn signals_positions_and_summary() {
        let run = run_crossover(
            &make_series(&REGRESSION_CLOSES),
            &CrossoverConfig::new(2, 4).unwrap(),
        )
        .unwrap();

        assert_eq!(run.frame.signal, vec![0, 1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(run.frame.position, vec![0, 0, 1, 1, 1, 1, 1, 1]);

        let r = &run.result;
        assert_eq!((r.fast, r.slow), (2, 4));
        assert_relative_eq!(r.total_return, 111.0 / 102.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(r.max_drawdown, 107.0 / 110.0 - 1.0, epsilon = 1e-12);
        assert_eq!(r.trade_count, 1);
        assert_eq!(r.win_rate, Some(0.5));
    }

    #[test]
    fn result_serializes_with_public_field_names() {
        let config = CrossoverConfig::new(2, 4).unwrap();
        let result = evaluate_crossover(&make_series(&REGRESSION_CLOSES), &config).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["trades"], 1);
        assert_eq!(json["fast"], 2);
        assert!(json.get("trade_count").is_none());
    }
}

mod degenerate_inputs {
    use super::*;

    #[test]
    fn flat_prices_never_trade() {
        let series = make_series(&[50.0; 30]);
        let run = run_crossover(&series, &CrossoverConfig::default()).unwrap();

        assert!(run.frame.signal.iter().all(|&s| s == 0));
        assert_eq!(run.result.total_return, 0.0);
        assert_eq!(run.result.max_drawdown, 0.0);
        assert_eq!(run.result.trade_count, 0);
        assert_eq!(run.result.win_rate, None);
    }

    #[test]
    fn ten_flat_bars_at_one_hundred() {
        let series = make_series(&[100.0; 10]);
        let result = evaluate_crossover(&series, &CrossoverConfig::new(2, 4).unwrap()).unwrap();
        assert_eq!(result.total_return, 0.0);
        assert_eq!(result.max_drawdown, 0.0);
        assert_eq!(result.trade_count, 0);

        // constant input is a fixed point of the recurrence
        let ema = calculate_ema(&series, 4).values;
        assert!(ema.iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn flat_prices_have_zero_volatility_and_undefined_rsi() {
        let series = make_series(&[50.0; 30]);
        let table = apply_indicators(&series, &IndicatorConfig::default()).unwrap();

        let vol = table.column("vol_20").unwrap();
        assert!(vol[..20].iter().all(Option::is_none));
        assert!(vol[20..].iter().all(|v| *v == Some(0.0)));

        let rsi = table.column("rsi_14").unwrap();
        assert!(rsi.iter().all(Option::is_none));

        let upper = table.column("bb_up_20").unwrap();
        assert_eq!(upper[19], Some(50.0));
    }

    #[test]
    fn rising_series_rsi_is_undefined_without_losses() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&make_series(&closes), 5);
        assert_eq!(rsi.indicator_type, IndicatorType::Rsi(5));
        assert!(rsi.values.iter().all(Option::is_none));
    }

    #[test]
    fn single_bar_series() {
        let series = make_series(&[42.0]);
        let run = run_crossover(&series, &CrossoverConfig::default()).unwrap();
        assert_eq!(run.frame.position, vec![0]);
        assert_eq!(run.result.total_return, 0.0);

        let summary = Summary::compute(&series);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.last_price, Some(42.0));
        assert_eq!(summary.mean_return, None);
        assert_eq!(summary.volatility_std, None);
    }

    #[test]
    fn empty_series_is_not_an_error() {
        let series = PriceSeries::default();
        let run = run_crossover(&series, &CrossoverConfig::default()).unwrap();
        assert!(run.frame.equity.is_empty());
        assert_eq!(run.result.total_return, 0.0);
        assert_eq!(run.result.win_rate, None);

        let table = apply_indicators(&series, &IndicatorConfig::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(Summary::compute(&series).rows, 0);
    }

    #[test]
    fn window_longer_than_series() {
        let series = make_series(&[1.0, 2.0, 3.0]);
        assert!(calculate_sma(&series, 10).values.iter().all(Option::is_none));
        // EMA is defined from the first bar regardless of span
        assert_eq!(calculate_ema(&series, 10).values[0], Some(1.0));
    }

    #[test]
    fn zero_span_is_rejected() {
        let err = CrossoverConfig::new(0, 5).unwrap_err();
        assert!(matches!(err, BarlyticsError::ConfigInvalid { ref key, .. } if key == "fast"));
    }
}

mod data_port_plumbing {
    use super::*;

    #[test]
    fn mock_port_feeds_backtest() {
        let port = MockDataPort::new().with_series("BTCUSDT", make_series(&REGRESSION_CLOSES));

        let series = port
            .fetch_series(&KlineRequest::new("btcusdt").with_limit(5))
            .unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(port.requests.borrow()[0].symbol, "BTCUSDT");

        let result = evaluate_crossover(&series, &CrossoverConfig::new(2, 4).unwrap()).unwrap();
        assert_eq!(result.fast, 2);
    }

    #[test]
    fn mock_port_errors_propagate() {
        let port = MockDataPort::new().with_error("ETHUSDT", "boom");
        let err = port.fetch_series(&KlineRequest::new("ETHUSDT")).unwrap_err();
        assert!(matches!(err, BarlyticsError::Fetch { .. }));
    }
}

fn price_path() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.05f64..0.05, 1..120).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|s| {
                price *= 1.0 + s;
                price
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn indicator_columns_align_with_input(closes in price_path()) {
        let table = apply_indicators(&make_series(&closes), &IndicatorConfig::default()).unwrap();
        for (_, values) in table.columns() {
            prop_assert_eq!(values.len(), closes.len());
        }
        prop_assert_eq!(table.column("return").unwrap()[0], None);
    }

    #[test]
    fn rolling_indicators_have_warmup(closes in price_path(), window in 1usize..30) {
        let sma = calculate_sma(&make_series(&closes), window).values;
        for (t, v) in sma.iter().enumerate() {
            prop_assert_eq!(v.is_some(), t + 1 >= window);
        }
    }

    #[test]
    fn backtest_has_no_look_ahead(closes in price_path(), cut in 0usize..120) {
        let cut = cut.min(closes.len() - 1);
        let config = CrossoverConfig::new(3, 8).unwrap();
        let full = run_crossover(&make_series(&closes), &config).unwrap();
        let prefix = run_crossover(&make_series(&closes[..=cut]), &config).unwrap();

        prop_assert_eq!(&full.frame.position[..=cut], &prefix.frame.position[..]);
        prop_assert_eq!(&full.frame.signal[..=cut], &prefix.frame.signal[..]);
        prop_assert_eq!(&full.frame.equity[..=cut], &prefix.frame.equity[..]);
    }

    #[test]
    fn equity_follows_recurrence(closes in price_path()) {
        let config = CrossoverConfig::new(2, 5).unwrap();
        let run = run_crossover(&make_series(&closes), &config).unwrap();
        let f = &run.frame;
        prop_assert_eq!(f.position[0], 0);
        prop_assert_eq!(f.equity[0], 1.0);
        for t in 1..closes.len() {
            prop_assert_eq!(f.position[t], f.signal[t - 1]);
            prop_assert_eq!(f.equity[t], f.equity[t - 1] * (1.0 + f.strategy_return[t]));
        }
        prop_assert_eq!(run.result.total_return, f.equity[closes.len() - 1] - 1.0);
    }

    #[test]
    fn drawdown_is_bounded(closes in price_path()) {
        let run = run_crossover(&make_series(&closes), &CrossoverConfig::default()).unwrap();
        prop_assert!(run.frame.drawdown.iter().all(|&d| d <= 0.0 && d > -1.0));
        prop_assert!(run.result.max_drawdown <= 0.0);
        if let Some(w) = run.result.win_rate {
            prop_assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn computations_are_idempotent(closes in price_path()) {
        let series = make_series(&closes);
        let config = IndicatorConfig::default();
        prop_assert_eq!(
            apply_indicators(&series, &config).unwrap(),
            apply_indicators(&series, &config).unwrap()
        );
        let bt = CrossoverConfig::default();
        prop_assert_eq!(
            evaluate_crossover(&series, &bt).unwrap(),
            evaluate_crossover(&series, &bt).unwrap()
        );
    }
}
