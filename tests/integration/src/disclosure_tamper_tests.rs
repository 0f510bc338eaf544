//! Disclosure tamper tests
//!
//! A disclosure travels without its telemetry, so every revealed value
//! must be checked against the proof it claims to come from.

use crate::test_utils::{init_tracing, simulated_session};
use effortproof_core::{Config, SessionConfig, TelemetryPoint};
use effortproof_crypto::{ProofInput, ProofOrchestrator, ZkProof};
use effortproof_domain::{
    calculate_privacy_score, get_privacy_level, DisclosureBuilder, DisclosureError,
    DisclosureField, DisclosureMetadata, DisclosurePolicy, DisclosureVerifier, PrivacyLevel,
    SelectiveDisclosure,
};
use effortproof_stream::SessionProof;
use std::sync::Arc;

async fn session_proof(rider: &str, bpm: u32) -> (Arc<ProofOrchestrator>, SessionProof) {
    let (orchestrator, session) = simulated_session();
    session.start_session(SessionConfig::new("spin-101", rider, 150, 5));
    for s in 0..420u64 {
        session.add_telemetry(TelemetryPoint::new(s * 1000, bpm, 90).with_power(250));
    }
    let result = session.end_session().await.unwrap();
    (orchestrator, result)
}

fn tampered(
    disclosure: &SelectiveDisclosure,
    edit: impl FnOnce(&mut serde_json::Value),
) -> SelectiveDisclosure {
    let mut value = serde_json::to_value(disclosure).unwrap();
    edit(&mut value);
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_honest_disclosure_verifies() {
    init_tracing();
    let (orchestrator, result) = session_proof("rider-42", 172).await;
    let verifier = DisclosureVerifier::new(orchestrator);
    assert!(verifier
        .verify(&result.disclosure, &result.proof)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_inflated_score_rejected() {
    let (orchestrator, result) = session_proof("rider-42", 160).await;
    let verifier = DisclosureVerifier::new(orchestrator);

    let score = result.disclosure.revealed.effort_score;
    let inflated = tampered(&result.disclosure, |v| {
        v["revealed"]["effortScore"] = serde_json::json!(score + 100);
    });
    assert!(!verifier.verify(&inflated, &result.proof).await.unwrap());
}

#[tokio::test]
async fn test_promoted_zone_rejected() {
    let (orchestrator, result) = session_proof("rider-42", 151).await;
    let verifier = DisclosureVerifier::new(orchestrator);
    assert_eq!(result.disclosure.revealed.zone, "Endurance");

    let promoted = tampered(&result.disclosure, |v| {
        v["revealed"]["zone"] = serde_json::json!("Anaerobic");
    });
    assert!(!verifier.verify(&promoted, &result.proof).await.unwrap());
}

#[tokio::test]
async fn test_swapped_proof_rejected() {
    let (orchestrator, hard) = session_proof("rider-42", 180).await;
    let (_, easy) = session_proof("rider-42", 155).await;
    let verifier = DisclosureVerifier::new(orchestrator);

    // Score mismatch.
    assert!(!verifier.verify(&hard.disclosure, &easy.proof).await.unwrap());

    // Same effort, different rider: only the proof hash differs.
    let (_, twin) = session_proof("rider-99", 180).await;
    assert_eq!(
        twin.disclosure.revealed.effort_score,
        hard.disclosure.revealed.effort_score
    );
    assert!(!verifier.verify(&hard.disclosure, &twin.proof).await.unwrap());
}

#[tokio::test]
async fn test_forged_public_inputs_rejected() {
    let (orchestrator, result) = session_proof("rider-42", 165).await;
    let verifier = DisclosureVerifier::new(orchestrator);

    let mut proof = serde_json::to_value(&result.proof).unwrap();
    proof["publicInputs"].as_array_mut().unwrap().truncate(3);
    let forged: ZkProof = serde_json::from_value(proof).unwrap();
    assert!(!verifier.verify(&result.disclosure, &forged).await.unwrap());
}

#[tokio::test]
async fn test_redacted_fields_stay_zero() {
    let orchestrator = Arc::new(ProofOrchestrator::simulated_only(&Config::default()));
    let proof = orchestrator
        .prove_effort_threshold(
            &ProofInput::new("spin-101", 150, 5)
                .with_heart_rate(175)
                .with_power(Some(260))
                .with_elapsed_seconds(400),
        )
        .await
        .unwrap();

    let disclosure = DisclosureBuilder::new(DisclosurePolicy::minimal())
        .with_proof(proof.clone())
        .with_metadata(DisclosureMetadata {
            class_id: "spin-101".to_string(),
            rider_id: "rider-42".to_string(),
            timestamp_ms: 1_700_000_000_000,
            duration_minutes: None,
        })
        .build()
        .unwrap();
    assert!(disclosure.is_redacted(DisclosureField::EffortScore));
    assert_eq!(disclosure.revealed.effort_score, 0);
    assert_eq!(disclosure.revealed.zone, "Hidden");
    assert_eq!(disclosure.revealed.duration_minutes, 0);
    assert_eq!(disclosure.public.rider_id.as_deref(), Some("rider-42"));

    let verifier = DisclosureVerifier::new(Arc::clone(&orchestrator));
    assert!(verifier.verify(&disclosure, &proof).await.unwrap());

    let leaked = tampered(&disclosure, |v| {
        v["revealed"]["effortScore"] = serde_json::json!(400);
    });
    assert!(!verifier.verify(&leaked, &proof).await.unwrap());

    assert_eq!(calculate_privacy_score(&disclosure), 100);
    assert_eq!(get_privacy_level(100), PrivacyLevel::High);
}

#[tokio::test]
async fn test_privacy_score_tracks_disclosure() {
    let (orchestrator, result) = session_proof("rider-42", 170).await;
    let verifier = DisclosureVerifier::new(orchestrator);
    // Score, zone and seven minutes revealed; hidden metrics zeroed.
    assert_eq!(result.disclosure.revealed.duration_minutes, 7);
    assert_eq!(calculate_privacy_score(&result.disclosure), 85);

    let leaky = tampered(&result.disclosure, |v| {
        v["hidden"]["maxHeartRate"] = serde_json::json!(170);
        v["hidden"]["avgPower"] = serde_json::json!(250);
    });
    let score = calculate_privacy_score(&leaky);
    assert_eq!(score, 35);
    assert_eq!(get_privacy_level(score), PrivacyLevel::Low);
    assert!(!verifier.verify(&leaky, &result.proof).await.unwrap());

    let partial = tampered(&result.disclosure, |v| {
        v["hidden"]["rawDataPoints"] = serde_json::json!(420);
    });
    let score = calculate_privacy_score(&partial);
    assert_eq!(score, 60);
    assert_eq!(get_privacy_level(score), PrivacyLevel::Medium);
    assert!(!verifier.verify(&partial, &result.proof).await.unwrap());
}

#[test]
fn test_overlapping_policy_rejected() {
    let json = serde_json::json!({
        "privateFields": ["heartRate", "power"],
        "revealableFields": ["effortScore", "heartRate"],
        "publicFields": ["classId"]
    });
    assert!(serde_json::from_value::<DisclosurePolicy>(json).is_err());

    let err = DisclosurePolicy::new(
        [DisclosureField::Gps],
        [DisclosureField::Zone],
        [DisclosureField::Zone, DisclosureField::ProofHash],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DisclosureError::PolicyOverlap {
            field: DisclosureField::Zone,
            ..
        }
    ));
}
