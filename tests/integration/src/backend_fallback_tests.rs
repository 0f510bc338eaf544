//! Backend selection and fallback tests
//!
//! The orchestrator must keep proving when the compiled backend cannot be
//! loaded, and both backends must agree on every public input.

use crate::test_utils::{
    compiled_orchestrator, init_tracing, ramp, NotFoundSource, ReferenceEngine,
};
use effortproof_core::{Config, SessionConfig, SessionLimits};
use effortproof_crypto::zk::ArtifactSource;
use effortproof_crypto::{
    BackendKind, CircuitType, ProofInput, ProofOrchestrator, ProofOutput, ProvingEngine,
};
use effortproof_domain::DisclosureVerifier;
use effortproof_stream::TelemetrySession;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn long_ride_input() -> ProofInput {
    let series: Vec<u32> = (0..600).map(|i| 140 + (i % 40)).collect();
    ProofInput::new("spin-101", 150, 10)
        .with_rider("rider-42")
        .with_heart_rate(179)
        .with_power(Some(240))
        .with_cadence(92)
        .with_elapsed_seconds(435)
        .with_series(series)
}

#[tokio::test]
async fn test_missing_artifact_falls_back_to_simulated() {
    init_tracing();
    let source = Arc::new(NotFoundSource::default());
    let orchestrator = ProofOrchestrator::new(
        &Config::default(),
        Some(Arc::new(ReferenceEngine::default()) as Arc<dyn ProvingEngine>),
        Some(source.clone() as Arc<dyn ArtifactSource>),
    );
    orchestrator.ready().await;

    let info = orchestrator.backend_info().await;
    assert_eq!(info.kind, BackendKind::Simulated);
    assert!(!info.initialized);
    assert!(info
        .unavailable_reason
        .as_deref()
        .is_some_and(|reason| reason.contains("404")));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    let proof = orchestrator
        .prove_effort_threshold(&long_ride_input())
        .await
        .unwrap();
    assert_eq!(proof.backend(), BackendKind::Simulated);
    assert!(orchestrator.verify_proof(&proof).await.unwrap());
}

#[tokio::test]
async fn test_compiled_and_simulated_agree_on_public_inputs() {
    let engine = Arc::new(ReferenceEngine::default());
    let orchestrator = compiled_orchestrator(Arc::clone(&engine)).await;
    let info = orchestrator.backend_info().await;
    assert_eq!(info.kind, BackendKind::Compiled);
    assert_eq!(info.engine.as_deref(), Some("reference"));
    assert_eq!(info.circuit_version.as_deref(), Some("test-bundle"));

    let input = long_ride_input();
    let compiled = orchestrator.prove_effort_threshold(&input).await.unwrap();
    orchestrator.force_simulated(true);
    let simulated = orchestrator.prove_effort_threshold(&input).await.unwrap();
    orchestrator.force_simulated(false);

    assert_eq!(compiled.backend(), BackendKind::Compiled);
    assert_eq!(simulated.backend(), BackendKind::Simulated);
    assert_eq!(compiled.public_inputs(), simulated.public_inputs());
    assert_ne!(compiled.proof(), simulated.proof());
    let output = ProofOutput::from_proof(&compiled).unwrap();
    assert_eq!(
        ProofOutput {
            proof_hash: None,
            ..output
        },
        ProofOutput::evaluate(&input)
    );

    assert!(orchestrator.verify_proof(&compiled).await.unwrap());
    assert!(orchestrator.verify_proof(&simulated).await.unwrap());
}

#[tokio::test]
async fn test_compiled_witness_is_packed_to_capacity() {
    let engine = Arc::new(ReferenceEngine::default());
    let orchestrator = compiled_orchestrator(Arc::clone(&engine)).await;

    orchestrator
        .prove_effort_threshold(&long_ride_input())
        .await
        .unwrap();
    orchestrator
        .prove(
            &ProofInput::new("spin-101", 150, 10)
                .with_heart_rate(155)
                .with_series(vec![155; 12]),
            CircuitType::EffortThreshold,
        )
        .await
        .unwrap();

    let seen = engine.witnesses.lock().unwrap().clone();
    assert_eq!(seen, vec![60, 60]);
}

#[tokio::test]
async fn test_composite_routes_through_compiled_backend() {
    let orchestrator = compiled_orchestrator(Arc::new(ReferenceEngine::default())).await;
    let input = long_ride_input().with_composite_targets(220, 90);

    let proof = orchestrator.prove_composite(&input).await.unwrap();
    assert_eq!(proof.backend(), BackendKind::Compiled);
    assert_eq!(proof.public_inputs().len(), 11);

    let output = ProofOutput::from_proof(&proof).unwrap();
    assert_eq!(output.power_met, Some(true));
    assert_eq!(output.cadence_met, Some(true));
}

#[tokio::test]
async fn test_compiled_session_end_to_end() {
    let orchestrator = compiled_orchestrator(Arc::new(ReferenceEngine::default())).await;
    let session = TelemetrySession::new(Arc::clone(&orchestrator), SessionLimits::default());
    session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 5));
    for point in ramp(600, 150, 180) {
        session.add_telemetry(point);
    }

    let result = session.end_session().await.unwrap();
    assert_eq!(result.metadata.backend, BackendKind::Compiled);
    assert_eq!(result.proof.proof().len(), 128);
    assert_eq!(
        result.disclosure.public.proof_hash.as_deref(),
        Some(result.proof.proof_hash().as_str())
    );

    let verifier = DisclosureVerifier::new(orchestrator);
    assert!(verifier
        .verify(&result.disclosure, &result.proof)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_compiled_proof_unverifiable_without_compiled_backend() {
    let orchestrator = compiled_orchestrator(Arc::new(ReferenceEngine::default())).await;
    let proof = orchestrator
        .prove_effort_threshold(&long_ride_input())
        .await
        .unwrap();

    let fallback = ProofOrchestrator::simulated_only(&Config::default());
    assert!(fallback.verify_proof(&proof).await.is_err());
}
