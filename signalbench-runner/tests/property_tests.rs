//! Property tests for the runner's glue formats.
//!
//! Uses proptest to verify:
//! 1. Epoch-millisecond and text timestamps parse to the same instant; signed
//!    millisecond values are rejected
//! 2. Run ids are stable for equal configs and move when a trade setting changes

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use signalbench_runner::config::BacktestConfig;
use signalbench_runner::data_loader::parse_time;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Epoch milliseconds between 1970 and 2100.
fn arb_epoch_millis() -> impl Strategy<Value = i64> {
    0..4_102_444_800_000_i64
}

fn arb_symbols() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z][A-Z0-9]{2,9}", 1..6)
        .prop_map(|set| set.into_iter().collect())
}

fn config_toml(symbols: &[String], take_profit_pct: f64) -> String {
    let symbols = symbols
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
[backtest]
symbols = [{symbols}]

[strategy]
preset = "cci_rsi_reversal"

[trade]
take_profit_pct = {take_profit_pct:?}
"#
    )
}

// ── 1. Timestamp parsing ─────────────────────────────────────────────

proptest! {
    #[test]
    fn epoch_and_text_timestamps_agree(millis in arb_epoch_millis()) {
        let from_epoch = parse_time(&millis.to_string());
        prop_assert!(from_epoch.is_some());
        let t = from_epoch.unwrap();

        let expected = DateTime::<Utc>::from_timestamp_millis(millis).unwrap().naive_utc();
        prop_assert_eq!(t, expected);

        let spaced = t.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let iso = t.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        prop_assert_eq!(parse_time(&spaced), Some(t));
        prop_assert_eq!(parse_time(&iso), Some(t));
    }

    #[test]
    fn signed_millis_are_rejected(millis in arb_epoch_millis()) {
        prop_assert_eq!(parse_time(&format!("-{millis}")), None);
    }
}

// ── 2. Run id ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn run_id_is_stable_and_sensitive(
        symbols in arb_symbols(),
        take_profit_pct in 0.001..0.5_f64,
    ) {
        let toml = config_toml(&symbols, take_profit_pct);
        let a = BacktestConfig::from_toml_str(&toml).unwrap();
        let b = BacktestConfig::from_toml_str(&toml).unwrap();
        prop_assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());

        let moved = BacktestConfig::from_toml_str(
            &config_toml(&symbols, take_profit_pct + 0.25),
        )
        .unwrap();
        prop_assert_ne!(a.run_id().unwrap(), moved.run_id().unwrap());
    }
}
