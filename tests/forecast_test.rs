//! Forecaster integration tests: trait-level behavior and the persistence
//! round-trip law

use chrono::{Duration, TimeZone, Utc};
use mb_forecast::config::{ForecastConfig, ForecastStrategy};
use mb_forecast::forecast::{build_forecaster, ArtifactStore, Prediction};
use mb_forecast::market::{PricePoint, SaleHistory};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

fn history(world: &str, item_id: u32, prices: &[i64]) -> SaleHistory {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, p)| PricePoint {
            timestamp: base + Duration::hours(i as i64),
            price: Decimal::from(*p),
        })
        .collect();
    SaleHistory::new(world, item_id, points)
}

fn price_of(prediction: Prediction) -> Decimal {
    match prediction {
        Prediction::Price(p) => p,
        other => panic!("expected a price, got {:?}", other),
    }
}

#[test]
fn test_sequence_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = ForecastConfig::default();
    let data = history("Leviathan", 5057, &[100, 200, 150, 300, 250, 400, 380, 420, 390]);

    let store = Arc::new(ArtifactStore::new(dir.path()));
    let forecaster = build_forecaster(&config, store);
    forecaster.fit(&[data.clone()]).unwrap();
    let before = price_of(forecaster.predict(&data).unwrap());

    // A fresh forecaster over the same artifact directory must agree
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let reloaded = build_forecaster(&config, store);
    let after = price_of(reloaded.predict(&data).unwrap());

    let delta = (before.to_f64().unwrap() - after.to_f64().unwrap()).abs();
    assert!(delta < 1e-9, "{} vs {}", before, after);
}

#[test]
fn test_tabular_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = ForecastConfig {
        strategy: ForecastStrategy::Tabular,
        ..Default::default()
    };
    let data = history("Leviathan", 5057, &[100, 110, 120, 130]);

    let store = Arc::new(ArtifactStore::new(dir.path()));
    let forecaster = build_forecaster(&config, store);
    forecaster.fit(&[data.clone()]).unwrap();
    let before = price_of(forecaster.predict(&data).unwrap());

    let store = Arc::new(ArtifactStore::new(dir.path()));
    let reloaded = build_forecaster(&config, store);
    let after = price_of(reloaded.predict(&data).unwrap());

    let delta = (before.to_f64().unwrap() - after.to_f64().unwrap()).abs();
    assert!(delta < 1e-9, "{} vs {}", before, after);
}

#[test]
fn test_strategies_share_one_contract() {
    let dir = tempfile::tempdir().unwrap();
    let data = history("Leviathan", 5057, &[100, 200, 150, 300, 250, 400]);

    for strategy in [ForecastStrategy::Sequence, ForecastStrategy::Tabular] {
        let config = ForecastConfig {
            strategy,
            ..Default::default()
        };
        let store = Arc::new(ArtifactStore::new(dir.path().join(format!("{:?}", strategy))));
        let forecaster = build_forecaster(&config, store);

        forecaster.fit(&[data.clone()]).unwrap();
        let prediction = forecaster.predict(&data).unwrap();
        assert!(matches!(prediction, Prediction::Price(_)));
    }
}

#[test]
fn test_tabular_unseen_world_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let config = ForecastConfig {
        strategy: ForecastStrategy::Tabular,
        ..Default::default()
    };
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let forecaster = build_forecaster(&config, store);

    forecaster
        .fit(&[
            history("Leviathan", 5057, &[100, 110, 120]),
            history("Cactuar", 5057, &[95, 105, 115]),
        ])
        .unwrap();

    // A world the encoder never saw must still yield a finite price
    let prediction = forecaster
        .predict(&history("Zalera", 5057, &[100, 110]))
        .unwrap();
    assert!(matches!(prediction, Prediction::Price(_)));
}

#[test]
fn test_sequence_incremental_update_keeps_predicting() {
    let dir = tempfile::tempdir().unwrap();
    let config = ForecastConfig::default();
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let forecaster = build_forecaster(&config, store);

    forecaster
        .fit(&[history("Leviathan", 5057, &[100, 200, 150, 300, 250, 400])])
        .unwrap();

    // Second fit updates the saved weights rather than starting over
    let updated = history("Leviathan", 5057, &[400, 380, 420, 390, 410, 430, 405]);
    let summary = forecaster.fit(&[updated.clone()]).unwrap();
    assert!(summary.updated);

    let prediction = forecaster.predict(&updated).unwrap();
    assert!(matches!(prediction, Prediction::Price(_)));
}
