//! End-to-end tests for the store → features → dual inference pipeline

use anyhow::Result;
use async_trait::async_trait;
use pdm_core::{
    FeatureVector, InferenceOrchestrator, ModelSet, PredictError, PredictResult, PredictionResult,
    RawReading, ReadingFields, ReadingParser, Scorer, SensorReading, SqliteStore, TelemetryStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// `classify` stub: anomalous iff vibration > 0.5
struct VibrationClassifier {
    calls: AtomicUsize,
    seen: Mutex<Vec<FeatureVector>>,
}

impl VibrationClassifier {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Scorer for VibrationClassifier {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(*features);
        Ok(if features.vibration > 0.5 { 1.0 } else { 0.0 })
    }

    fn name(&self) -> &str {
        "stub-classifier"
    }
}

/// `estimate_remaining_life` stub: 100 - vibration * 10
struct VibrationRegressor {
    calls: AtomicUsize,
    seen: Mutex<Vec<FeatureVector>>,
}

impl VibrationRegressor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Scorer for VibrationRegressor {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(*features);
        Ok(100.0 - features.vibration * 10.0)
    }

    fn name(&self) -> &str {
        "stub-regressor"
    }
}

struct FailingScorer;

impl Scorer for FailingScorer {
    fn score(&self, _features: &FeatureVector) -> Result<f64> {
        anyhow::bail!("incompatible model schema: expected 6 inputs")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct PanickingScorer;

impl Scorer for PanickingScorer {
    fn score(&self, _features: &FeatureVector) -> Result<f64> {
        panic!("weights corrupted")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Store whose reads always fail
struct BrokenStore;

#[async_trait]
impl TelemetryStore for BrokenStore {
    async fn insert(&self, _fields: ReadingFields) -> PredictResult<SensorReading> {
        Err(PredictError::StorageFault("database is locked".to_string()))
    }

    async fn query_recent(&self, _limit: usize) -> PredictResult<Vec<SensorReading>> {
        Err(PredictError::StorageFault("database is locked".to_string()))
    }

    async fn query_all_ordered(&self) -> PredictResult<Vec<SensorReading>> {
        Err(PredictError::StorageFault("database is locked".to_string()))
    }

    async fn count(&self) -> PredictResult<u64> {
        Err(PredictError::StorageFault("database is locked".to_string()))
    }
}

fn reading(vibration: f64) -> ReadingFields {
    ReadingFields {
        temperature: 65.0,
        humidity: 48.0,
        vibration,
        current: 2.2,
        voltage: 230.0,
    }
}

fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().unwrap())
}

#[tokio::test]
async fn test_empty_store_reports_no_data() {
    let models = ModelSet::new(
        Arc::new(VibrationClassifier::new()),
        Arc::new(VibrationRegressor::new()),
    );
    let orchestrator = InferenceOrchestrator::new(store(), models);

    let err = orchestrator.predict_latest().await.unwrap_err();
    assert_eq!(err, PredictError::NoDataAvailable);
}

#[tokio::test]
async fn test_dual_inference_on_latest_reading() {
    let store = store();
    store.insert(reading(0.1)).await.unwrap();
    store.insert(reading(0.6)).await.unwrap();

    let classifier = Arc::new(VibrationClassifier::new());
    let regressor = Arc::new(VibrationRegressor::new());
    let orchestrator = InferenceOrchestrator::new(
        store.clone(),
        ModelSet::new(classifier.clone(), regressor.clone()),
    );

    let result = orchestrator.predict_latest().await.unwrap();
    assert_eq!(result.anomaly, 1);
    assert!((result.time_to_failure - 94.0).abs() < 1e-9);

    // Both models saw the very same vector, built from the latest reading
    let class_seen = classifier.seen.lock().unwrap().clone();
    let reg_seen = regressor.seen.lock().unwrap().clone();
    assert_eq!(class_seen.len(), 1);
    assert_eq!(class_seen, reg_seen);
    assert_eq!(class_seen[0].pressure, 48.0);
    assert_eq!(class_seen[0].vibration, 0.6);
}

#[tokio::test]
async fn test_normal_reading_is_not_anomalous() {
    let store = store();
    store.insert(reading(0.2)).await.unwrap();

    let orchestrator = InferenceOrchestrator::new(
        store,
        ModelSet::new(
            Arc::new(VibrationClassifier::new()),
            Arc::new(VibrationRegressor::new()),
        ),
    );

    let result = orchestrator.predict_latest().await.unwrap();
    assert_eq!(
        result,
        PredictionResult {
            anomaly: 0,
            time_to_failure: 98.0
        }
    );
}

#[tokio::test]
async fn test_classifier_failure_skips_regressor_and_leaves_store_untouched() {
    let store = store();
    store.insert(reading(0.6)).await.unwrap();
    let before = store.query_all_ordered().await.unwrap();

    let regressor = Arc::new(VibrationRegressor::new());
    let orchestrator = InferenceOrchestrator::new(
        store.clone(),
        ModelSet::new(Arc::new(FailingScorer), regressor.clone()),
    );

    let err = orchestrator.predict_latest().await.unwrap_err();
    match err {
        PredictError::InferenceFailure(msg) => {
            assert!(msg.contains("incompatible model schema"), "message was {msg}")
        }
        other => panic!("expected InferenceFailure, got {other:?}"),
    }
    assert_eq!(regressor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.query_all_ordered().await.unwrap(), before);
}

#[tokio::test]
async fn test_regressor_failure_is_inference_failure() {
    let store = store();
    store.insert(reading(0.6)).await.unwrap();

    let orchestrator = InferenceOrchestrator::new(
        store,
        ModelSet::new(Arc::new(VibrationClassifier::new()), Arc::new(FailingScorer)),
    );

    assert!(matches!(
        orchestrator.predict_latest().await,
        Err(PredictError::InferenceFailure(_))
    ));
}

#[tokio::test]
async fn test_scorer_panic_is_contained_and_orchestrator_stays_usable() {
    let store = store();
    store.insert(reading(0.6)).await.unwrap();

    let orchestrator = InferenceOrchestrator::new(
        store.clone(),
        ModelSet::new(Arc::new(PanickingScorer), Arc::new(VibrationRegressor::new())),
    );

    for _ in 0..2 {
        match orchestrator.predict_latest().await {
            Err(PredictError::InferenceFailure(msg)) => assert!(msg.contains("weights corrupted")),
            other => panic!("expected InferenceFailure, got {other:?}"),
        }
    }

    // Ingestion is unaffected by the failed predictions
    store.insert(reading(0.1)).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_storage_fault_surfaces_as_storage_fault() {
    let orchestrator = InferenceOrchestrator::new(
        Arc::new(BrokenStore),
        ModelSet::new(
            Arc::new(VibrationClassifier::new()),
            Arc::new(VibrationRegressor::new()),
        ),
    );

    assert!(matches!(
        orchestrator.predict_latest().await,
        Err(PredictError::StorageFault(_))
    ));
}

#[tokio::test]
async fn test_permissive_ingest_then_predict() {
    let store = store();
    let raw = RawReading {
        vibration: Some("0.6".to_string()),
        temperature: Some("not-a-number".to_string()),
        ..Default::default()
    };
    let fields = ReadingParser::permissive().parse(&raw).unwrap();
    let stored = store.insert(fields).await.unwrap();
    assert_eq!(stored.temperature, 0.0);

    let orchestrator = InferenceOrchestrator::new(
        store,
        ModelSet::new(
            Arc::new(VibrationClassifier::new()),
            Arc::new(VibrationRegressor::new()),
        ),
    );
    assert_eq!(orchestrator.predict_latest().await.unwrap().anomaly, 1);
}
