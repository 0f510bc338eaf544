//! End-to-end session pipeline tests
//!
//! Capture telemetry, end the session and check the proof, the disclosure
//! and the report a UI would receive.

use crate::test_utils::{init_tracing, ramp, simulated_session, RecordingArchive};
use effortproof_core::{GpsFix, SessionConfig, SessionLimits, TelemetryPoint};
use effortproof_crypto::{BackendKind, ProofOutput, PublicSignals};
use effortproof_domain::{calculate_privacy_score, DisclosureVerifier, PrivacyLevel};
use effortproof_stream::{SessionReport, StreamError, TelemetrySession};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_ramp_session_end_to_end() {
    init_tracing();
    let (orchestrator, session) = simulated_session();
    session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 10));
    for point in ramp(600, 120, 170) {
        assert!(session.add_telemetry(point));
    }

    let result = session.end_session().await.unwrap();
    let output = ProofOutput::from_proof(&result.proof).unwrap();

    assert!(output.threshold_met);
    assert!(output.zone_entered);
    // Under four minutes of the ramp sit above 150 bpm.
    assert!(result.metadata.samples_above_threshold < 600);
    assert!(!output.duration_satisfied);
    assert_eq!(
        output.seconds_above as usize,
        result.metadata.samples_above_threshold
    );
    assert_eq!(result.metadata.sample_count, 600);
    assert_eq!(result.metadata.max_heart_rate, 170);
    assert_eq!(result.metadata.backend, BackendKind::Simulated);
    assert_eq!(result.disclosure.revealed.effort_score, output.effort_score);

    let verifier = DisclosureVerifier::new(orchestrator);
    assert!(verifier
        .verify(&result.disclosure, &result.proof)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_sustained_effort_satisfies_duration() {
    let (_, session) = simulated_session();
    session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 10));
    for point in ramp(600, 160, 175) {
        session.add_telemetry(point);
    }

    let result = session.end_session().await.unwrap();
    let output = ProofOutput::from_proof(&result.proof).unwrap();
    assert!(output.duration_satisfied);
    assert_eq!(
        result.disclosure.statement,
        "Heart rate exceeded 150 bpm for at least 10 minutes"
    );
}

#[tokio::test]
async fn test_empty_session_reports_failure() {
    let (_, session) = simulated_session();
    session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 10));

    let result = session.end_session().await;
    assert!(matches!(result, Err(StreamError::NoTelemetry)));

    let report = SessionReport::from(result);
    assert!(!report.success);
    assert!(report.proof.is_none());
    assert!(report.disclosure.is_none());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
    assert!(json.get("proof").is_none());
}

#[tokio::test]
async fn test_buffer_cap_holds_for_long_sessions() {
    let (_, session) = simulated_session();
    session.start_session(SessionConfig::new("endurance-1", "rider-7", 140, 20));
    for point in ramp(3_600, 130, 160) {
        session.add_telemetry(point);
    }

    let stats = session.get_session_stats();
    assert_eq!(stats.sample_count, 600);
    assert!(stats.recording);

    let result = session.end_session().await.unwrap();
    assert_eq!(result.metadata.sample_count, 600);
    // Only the final ten minutes are resident.
    assert_eq!(result.metadata.duration_minutes, 10);
}

#[tokio::test]
async fn test_intermediate_proof_while_ingesting() {
    let (_, session) = simulated_session();
    let session = Arc::new(session);
    session.start_session(SessionConfig::new("spin-202", "rider-3", 150, 5));
    for point in ramp(240, 140, 165) {
        session.add_telemetry(point);
    }
    assert!(matches!(
        session.generate_intermediate_proof().await,
        Err(StreamError::InsufficientData {
            required_minutes: 5,
            ..
        })
    ));

    for point in ramp(420, 140, 165).into_iter().skip(240) {
        session.add_telemetry(point);
    }

    let prover = Arc::clone(&session);
    let pending = tokio::spawn(async move { prover.generate_intermediate_proof().await });
    for i in 420..480u64 {
        session.add_telemetry(TelemetryPoint::new(i * 1000, 166, 90));
    }
    let intermediate = pending.await.unwrap().unwrap();

    assert!(intermediate.metadata.sample_count >= 420);
    assert!(session.is_recording());
    assert_eq!(session.get_session_stats().sample_count, 480);
}

#[tokio::test]
async fn test_archive_receives_series_without_gps() {
    let archive = Arc::new(RecordingArchive::default());
    let (orchestrator, _) = simulated_session();
    let session = TelemetrySession::new(orchestrator, SessionLimits::default())
        .with_archive(archive.clone());
    let id = session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 1));
    for i in 0..120u64 {
        session.add_telemetry(
            TelemetryPoint::new(i * 1000, 155, 90)
                .with_power(230)
                .with_gps(GpsFix {
                    latitude: 40.7,
                    longitude: -74.0,
                }),
        );
    }

    session.end_session().await.unwrap();

    let mut stored = None;
    for _ in 0..50 {
        if let Some(entry) = archive.records.lock().unwrap().first().cloned() {
            stored = Some(entry);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let (session_id, record) = stored.expect("archive was never called");
    assert_eq!(session_id, id);
    assert_eq!(record.heart_rate.len(), 120);
    assert!(!serde_json::to_string(&record).unwrap().contains("40.7"));
}

#[tokio::test]
async fn test_archive_failure_does_not_fail_proof() {
    let archive = Arc::new(RecordingArchive {
        fail: true,
        ..Default::default()
    });
    let (orchestrator, _) = simulated_session();
    let session =
        TelemetrySession::new(orchestrator, SessionLimits::default()).with_archive(archive);
    session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 1));
    for point in ramp(90, 150, 160) {
        session.add_telemetry(point);
    }

    let report = SessionReport::from(session.end_session().await);
    assert!(report.success);
    assert_eq!(report.privacy_level, Some(PrivacyLevel::High));
}

#[tokio::test]
async fn test_disclosure_never_leaks_raw_metrics() {
    let (_, session) = simulated_session();
    session.start_session(SessionConfig::new("spin-101", "rider-42", 150, 5));
    for point in ramp(600, 150, 190) {
        session.add_telemetry(point);
    }

    let result = session.end_session().await.unwrap();
    let disclosure = &result.disclosure;
    assert_eq!(disclosure.hidden.max_heart_rate(), 0);
    assert_eq!(disclosure.hidden.avg_power(), 0);
    assert_eq!(disclosure.hidden.raw_data_points(), 0);

    let json = serde_json::to_value(disclosure).unwrap();
    assert_eq!(json["hidden"]["maxHeartRate"], 0);
    assert!(json.get("rawData").is_none());

    let signals = PublicSignals::new(result.proof.circuit(), result.proof.public_inputs()).unwrap();
    assert_eq!(disclosure.revealed.effort_score, signals.effort_score().unwrap());
    assert!(calculate_privacy_score(disclosure) >= 80);
}
