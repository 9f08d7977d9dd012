//! End-to-end scenarios driven through a monitor session at 1 Hz.

mod common;

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};

use common::{fully_equipped, missing_gloves, scenario_config, settle, Harness};
use ppe_models::{EquipmentCategory, PerceptionResponse};
use ppe_monitor::notification::NO_PERSON_SUBJECT;
use ppe_monitor::testing::{MemoryStorage, RecordingNotifier};
use ppe_monitor::{
    AlertComposer, AlertDispatcher, CaptureOutcome, DispatchOutcome, EvidenceBatchStore,
    MonitorConfig, SkipReason, ViolationEvent, ViolationState, WatchdogEvent,
};

#[tokio::test]
async fn test_scenario_a_sustained_violation_confirms_at_three_seconds() {
    let mut h = Harness::new(scenario_config(), missing_gloves());

    assert_eq!(h.prime().await.violation, ViolationEvent::Started);
    assert_eq!(h.tick_after(1).await.violation, ViolationEvent::Pending);
    assert_eq!(h.tick_after(1).await.violation, ViolationEvent::Pending);

    let at_three = h.tick_after(1).await;
    assert_eq!(at_three.violation, ViolationEvent::Confirmed);
    match h.session.violation_state() {
        ViolationState::Confirmed { missing_items, .. } => {
            assert_eq!(
                *missing_items,
                [EquipmentCategory::HandCover].into_iter().collect()
            );
        }
        other => panic!("expected confirmed, got {:?}", other),
    }

    assert_eq!(h.tick_after(1).await.violation, ViolationEvent::Sustained);
}

#[tokio::test]
async fn test_scenario_b_compliant_frame_restarts_streak() {
    let mut h = Harness::new(scenario_config(), missing_gloves());

    h.prime().await;
    // The call issued at t = 1 answers the frame at t = 2
    h.perception.set_fallback(fully_equipped());
    h.tick_after(1).await;
    h.perception.set_fallback(missing_gloves());

    let at_two = h.tick_after(1).await;
    assert_eq!(
        at_two.violation,
        ViolationEvent::Resolved {
            was_confirmed: false
        }
    );

    assert_eq!(h.tick_after(1).await.violation, ViolationEvent::Started);
    for _ in 0..2 {
        let report = h.tick_after(1).await;
        assert_eq!(report.violation, ViolationEvent::Pending);
        assert!(!h.session.violation_state().is_confirmed());
    }
    assert_eq!(h.tick_after(1).await.violation, ViolationEvent::Confirmed);
}

#[tokio::test]
async fn test_scenario_c_one_batched_alert_then_cooldown() {
    let storage = std::sync::Arc::new(MemoryStorage::new());
    let notifier = std::sync::Arc::new(RecordingNotifier::new());
    let composer = AlertComposer::new(
        storage,
        notifier.clone(),
        "PPE ALERT",
        Duration::from_secs(3600),
        chrono::FixedOffset::east_opt(3 * 3600).unwrap(),
    );
    let mut dispatcher = AlertDispatcher::new(composer, Duration::from_secs(300));

    let confirmed = ViolationState::Confirmed {
        missing_items: [EquipmentCategory::HandCover].into_iter().collect(),
        since: Instant::now(),
    };
    let captured = Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap();
    let mut store = EvidenceBatchStore::new();
    for id in ["f1", "f2"] {
        store.capture(
            id.into(),
            [EquipmentCategory::HandCover].into_iter().collect(),
            captured,
            &confirmed,
        );
    }

    let now = Instant::now();
    let outcome = dispatcher.maybe_dispatch(&mut store, now, captured).await;
    assert_eq!(outcome, DispatchOutcome::Sent { records: 2 });
    assert!(store.is_empty());
    assert_eq!(dispatcher.last_dispatch(), Some(now));

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].body.contains("f1 | 09:00:00 | Missing: Gloves"));
    assert!(messages[0].body.contains("f2 | 09:00:00 | Missing: Gloves"));

    store.capture(
        "f3".into(),
        [EquipmentCategory::HandCover].into_iter().collect(),
        captured,
        &confirmed,
    );
    let later = dispatcher
        .maybe_dispatch(&mut store, now + Duration::from_secs(10), captured)
        .await;
    assert_eq!(later, DispatchOutcome::Skipped(SkipReason::CoolingDown));
    assert_eq!(notifier.attempts(), 1);
}

#[tokio::test]
async fn test_scenario_d_single_no_person_notice() {
    let config = MonitorConfig {
        notify_no_person: true,
        ..scenario_config()
    };
    let mut h = Harness::new(config, PerceptionResponse::empty());

    assert_eq!(h.prime().await.watchdog, WatchdogEvent::Started);
    let mut fired = 0;
    for _ in 0..8 {
        if h.tick_after(1).await.watchdog == WatchdogEvent::Fired {
            fired += 1;
        }
    }
    settle().await;

    assert_eq!(fired, 1);
    assert!(h.session.no_person());
    let notices: Vec<_> = h
        .notifier
        .messages()
        .into_iter()
        .filter(|m| m.subject == NO_PERSON_SUBJECT)
        .collect();
    assert_eq!(notices.len(), 1);
    // The empty streak began on the first observed frame, three seconds
    // before the notice fired.
    assert_eq!(notices[0].body, "No person detected since 09:00:00");
    assert!(h.session.evidence().is_empty());
}

#[tokio::test]
async fn test_resolution_discards_evidence_waiting_out_cooldown() {
    let mut h = Harness::new(scenario_config(), missing_gloves());

    h.prime().await;
    h.tick_after(1).await;
    h.tick_after(1).await;
    let confirmed = h.tick_after(1).await;
    assert_eq!(confirmed.violation, ViolationEvent::Confirmed);
    assert_eq!(confirmed.dispatch, DispatchOutcome::Started { records: 1 });

    let cooling = h.tick_after(1).await;
    assert_eq!(cooling.completed, vec![DispatchOutcome::Sent { records: 1 }]);
    assert_eq!(cooling.capture, Some(CaptureOutcome::Inserted));
    assert_eq!(
        cooling.dispatch,
        DispatchOutcome::Skipped(SkipReason::CoolingDown)
    );

    // The call issued on the next tick answers the one after it
    h.perception.set_fallback(fully_equipped());
    h.tick_after(1).await;
    assert_eq!(h.session.evidence().len(), 2);

    let resolved = h.tick_after(1).await;
    assert_eq!(
        resolved.violation,
        ViolationEvent::Resolved {
            was_confirmed: true
        }
    );
    assert_eq!(resolved.capture, Some(CaptureOutcome::Inactive));
    assert!(h.session.evidence().is_empty());

    let after_cooldown = h.tick_after(300).await;
    assert_eq!(
        after_cooldown.dispatch,
        DispatchOutcome::Skipped(SkipReason::Empty)
    );
    settle().await;
    assert_eq!(h.notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_no_person_only_logged_by_default() {
    let mut h = Harness::new(scenario_config(), PerceptionResponse::empty());

    h.prime().await;
    for _ in 0..5 {
        h.tick_after(1).await;
    }
    settle().await;

    assert!(h.session.no_person());
    assert!(h.notifier.messages().is_empty());
}
