use super::*;
use crate::camera::{CaptureSession, MockMediaDevices};
use crate::config::KioskConfig;
use crate::error::{CameraError, KioskError, SubmissionError, SUBMISSION_FALLBACK_MESSAGE};
use crate::events::{EventBus, KioskEvent};
use crate::geolocation::{resolve_location, FixedGeolocation, Geolocation};
use crate::transport::{MockScanTransport, ScanReply};
use crate::validation::FieldId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

async fn ready_controller(media: &MockMediaDevices) -> (WorkflowController, Arc<EventBus>) {
    let config = KioskConfig::default();
    let event_bus = Arc::new(EventBus::new(128));
    let session = CaptureSession::new(
        Arc::new(media.clone()),
        config.camera.clone(),
        Arc::clone(&event_bus),
    );
    let mut controller = WorkflowController::new(session, &config, Arc::clone(&event_bus));
    controller.start_camera().await;
    (controller, event_bus)
}

fn fill_valid_details(controller: &mut WorkflowController) {
    let values = [
        (FieldId::Name, "Asha Rao"),
        (FieldId::Age, "34"),
        (FieldId::Gender, "Female"),
        (FieldId::Email, "asha@example.com"),
        (FieldId::Phone, "+91 98450 12345"),
        (FieldId::Address, "12 MG Road, Bengaluru"),
        (FieldId::Purpose, "Meeting"),
        (FieldId::PersonToMeet, "Ravi Kumar"),
        (FieldId::PersonEmail, "ravi@example.com"),
        (FieldId::PersonPhone, "080-4123-4567"),
    ];
    for (field, value) in values {
        controller.change_field(field, value);
    }
}

/// Drive a fresh capture through to the registration form
async fn reach_awaiting_details(
    controller: &mut WorkflowController,
    transport: &MockScanTransport,
) -> Option<FollowUp> {
    let pending = controller.capture_now().await.expect("capture should start a scan");
    controller.run_submission(pending, transport).await
}

#[tokio::test]
async fn test_first_time_visitor_registration_flow() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();

    let follow_up = reach_awaiting_details(&mut controller, &transport).await;
    assert_eq!(controller.state(), &WorkflowState::AwaitingDetails);
    assert!(controller.retained_image().is_some());
    assert!(controller.form().is_some());
    assert!(matches!(follow_up, Some(FollowUp::LocateVisitor { .. })));

    fill_valid_details(&mut controller);
    let pending = controller.submit_details().await.unwrap();
    assert_eq!(controller.state(), &WorkflowState::Submitting);

    let follow_up = controller.run_submission(pending, &transport).await;
    assert_eq!(
        controller.state(),
        &WorkflowState::Success("Check-in successful".to_string())
    );
    assert!(matches!(follow_up, Some(FollowUp::ExpireSuccessAt(_))));
    assert!(controller.retained_image().is_none());
    assert!(controller.form().is_none());

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].visitor.is_none());
    let visitor = requests[1].visitor.as_ref().unwrap();
    assert_eq!(visitor.name, "Asha Rao");
    assert_eq!(requests[0].image, requests[1].image);
}

#[tokio::test]
async fn test_location_is_merged_into_the_open_form() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, bus) = ready_controller(&media).await;
    let mut receiver = bus.subscribe();
    let transport = MockScanTransport::new();

    let Some(FollowUp::LocateVisitor { form_id }) =
        reach_awaiting_details(&mut controller, &transport).await
    else {
        panic!("expected a location request");
    };

    controller.on_location(uuid::Uuid::new_v4(), "0, 0".to_string()).await;
    assert_eq!(controller.form().unwrap().location(), "");

    controller.on_location(form_id, "12.97, 77.59".to_string()).await;
    assert_eq!(controller.form().unwrap().location(), "12.97, 77.59");

    let mut saw_location = false;
    while let Ok(event) = receiver.try_recv() {
        if let KioskEvent::LocationResolved { location, .. } = event {
            assert_eq!(location, "12.97, 77.59");
            saw_location = true;
        }
    }
    assert!(saw_location);
}

#[tokio::test]
async fn test_invalid_details_do_not_submit() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    reach_awaiting_details(&mut controller, &transport).await;

    fill_valid_details(&mut controller);
    controller.change_field(FieldId::Email, "not-an-email");

    let result = controller.submit_details().await;
    match result {
        Err(KioskError::Validation(failure)) => {
            assert_eq!(failure.first_field(), Some(FieldId::Email));
        }
        other => panic!("expected validation failure, got {:?}", other.map(|p| p.ticket())),
    }

    assert_eq!(controller.state(), &WorkflowState::AwaitingDetails);
    assert_eq!(transport.request_count(), 1);
    assert!(controller
        .form()
        .unwrap()
        .visible_error(FieldId::Email)
        .is_some());
}

#[tokio::test]
async fn test_need_details_again_reopens_the_same_form() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    reach_awaiting_details(&mut controller, &transport).await;

    fill_valid_details(&mut controller);
    transport.push_reply(Ok(ScanReply::need_details("Still not recognised")));
    let pending = controller.submit_details().await.unwrap();
    let follow_up = controller.run_submission(pending, &transport).await;

    assert_eq!(follow_up, None);
    assert_eq!(controller.state(), &WorkflowState::AwaitingDetails);
    let form = controller.form().unwrap();
    assert!(!form.is_submitting());
    assert_eq!(form.record().name, "Asha Rao");
    assert!(controller.retained_image().is_some());

    // The form is editable again and can be resubmitted
    controller.change_field(FieldId::Name, "Asha R");
    let pending = controller.submit_details().await.unwrap();
    controller.run_submission(pending, &transport).await;
    assert!(matches!(controller.state(), WorkflowState::Success(_)));
}

#[tokio::test]
async fn test_direct_recognition_skips_registration() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    transport.push_reply(Ok(ScanReply::complete("exit", "Goodbye, Asha")));

    reach_awaiting_details(&mut controller, &transport).await;

    assert_eq!(
        controller.state(),
        &WorkflowState::Success("Goodbye, Asha".to_string())
    );
    assert!(controller.retained_image().is_none());
}

#[tokio::test]
async fn test_failure_shows_error_until_try_again() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    transport.push_reply(Err(SubmissionError::Server("No face detected".to_string())));

    reach_awaiting_details(&mut controller, &transport).await;
    assert_eq!(
        controller.state(),
        &WorkflowState::Error("No face detected".to_string())
    );
    assert!(controller.retained_image().is_none());

    // Errors never expire on their own
    assert!(!controller.expire_success(Instant::now() + Duration::from_secs(3600)).await);
    assert!(controller.capture_now().await.is_none());
    assert!(matches!(controller.state(), WorkflowState::Error(_)));

    assert!(controller.try_again().await);
    assert_eq!(controller.state(), &WorkflowState::Idle);
}

#[tokio::test]
async fn test_network_failure_uses_fallback_message() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    transport.push_reply(Err(SubmissionError::Network("connection refused".to_string())));

    reach_awaiting_details(&mut controller, &transport).await;
    assert_eq!(
        controller.state(),
        &WorkflowState::Error(SUBMISSION_FALLBACK_MESSAGE.to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_success_expires_after_window() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    transport.push_reply(Ok(ScanReply::complete("entry", "Welcome back")));

    let follow_up = reach_awaiting_details(&mut controller, &transport).await;
    let Some(FollowUp::ExpireSuccessAt(deadline)) = follow_up else {
        panic!("expected an expiry deadline");
    };
    assert_eq!(deadline, Instant::now() + Duration::from_secs(5));

    assert!(!controller.expire_success(Instant::now()).await);
    assert!(matches!(controller.state(), WorkflowState::Success(_)));

    tokio::time::sleep_until(deadline).await;
    assert!(controller.expire_success(Instant::now()).await);
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert_eq!(controller.success_deadline(), None);
}

#[tokio::test]
async fn test_scan_another_leaves_success_early() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    transport.push_reply(Ok(ScanReply::complete("entry", "Welcome")));
    reach_awaiting_details(&mut controller, &transport).await;

    assert!(controller.scan_another().await);
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(!controller.expire_success(Instant::now() + Duration::from_secs(60)).await);
}

#[tokio::test]
async fn test_result_after_reset_is_dropped() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();

    let pending = controller.capture_now().await.unwrap();
    controller.reset().await;
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.retained_image().is_none());

    let follow_up = controller.run_submission(pending, &transport).await;
    assert_eq!(follow_up, None);
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.form().is_none());
}

#[tokio::test]
async fn test_stale_result_does_not_hijack_new_scan() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();

    let stale = controller.capture_now().await.unwrap();
    controller.reset().await;
    let current = controller.capture_now().await.unwrap();

    transport.push_reply(Ok(ScanReply::complete("entry", "Stale welcome")));
    assert_eq!(controller.run_submission(stale, &transport).await, None);
    assert_eq!(controller.state(), &WorkflowState::Submitting);

    controller.run_submission(current, &transport).await;
    assert_eq!(controller.state(), &WorkflowState::AwaitingDetails);
}

#[tokio::test]
async fn test_capture_ignored_outside_idle() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();

    let pending = controller.capture_now().await.unwrap();
    assert!(controller.capture_now().await.is_none());
    assert!(!controller.capture_with_countdown().await);
    assert_eq!(controller.state(), &WorkflowState::Submitting);

    controller.run_submission(pending, &transport).await;
    assert_eq!(controller.state(), &WorkflowState::AwaitingDetails);
    assert!(controller.capture_now().await.is_none());
    assert_eq!(controller.state(), &WorkflowState::AwaitingDetails);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_capture_while_camera_not_ready_keeps_idle() {
    let media = MockMediaDevices::with_cameras(1);
    media.deny_with(CameraError::PermissionDenied("NotAllowedError".into()));
    let (mut controller, bus) = ready_controller(&media).await;
    let mut receiver = bus.subscribe();

    assert!(controller.capture_now().await.is_none());
    assert!(!controller.capture_with_countdown().await);
    assert_eq!(controller.state(), &WorkflowState::Idle);

    let notices: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok())
        .filter(|event| matches!(event, KioskEvent::CaptureNotice { .. }))
        .collect();
    assert!(!notices.is_empty());
}

#[tokio::test]
async fn test_empty_frame_returns_to_idle() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    media.queue_frame(None);

    assert!(controller.capture_now().await.is_none());
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.retained_image().is_none());
}

#[tokio::test]
async fn test_countdown_produces_exactly_one_submission() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;

    assert!(controller.capture_with_countdown().await);
    assert_eq!(controller.state(), &WorkflowState::Capturing);
    assert!(controller.is_counting_down());
    assert!(!controller.capture_with_countdown().await);

    let mut submissions = Vec::new();
    for _ in 0..5 {
        if let Some(pending) = controller.tick().await {
            submissions.push(pending);
        }
    }

    assert_eq!(submissions.len(), 1);
    assert!(submissions[0].request().visitor.is_none());
    assert_eq!(controller.state(), &WorkflowState::Submitting);
    assert!(!controller.is_counting_down());
}

#[tokio::test]
async fn test_reset_cancels_countdown() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;

    controller.capture_with_countdown().await;
    controller.tick().await;
    controller.reset().await;

    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert_eq!(controller.session().countdown(), None);
    for _ in 0..3 {
        assert!(controller.tick().await.is_none());
    }
}

#[tokio::test]
async fn test_cancel_details_discards_image_and_form() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;
    let transport = MockScanTransport::new();
    reach_awaiting_details(&mut controller, &transport).await;

    assert!(controller.cancel_details().await);
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.retained_image().is_none());
    assert!(controller.form().is_none());
    assert!(!controller.cancel_details().await);
}

#[tokio::test]
async fn test_submit_details_outside_form_is_rejected() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, _bus) = ready_controller(&media).await;

    let result = controller.submit_details().await;
    assert!(matches!(result, Err(KioskError::InvalidTransition { .. })));
    assert_eq!(controller.state(), &WorkflowState::Idle);
}

#[tokio::test]
async fn test_state_changes_are_published() {
    let media = MockMediaDevices::with_cameras(1);
    let (mut controller, bus) = ready_controller(&media).await;
    let mut receiver = bus.subscribe();
    let transport = MockScanTransport::new();

    reach_awaiting_details(&mut controller, &transport).await;

    let transitions: Vec<(String, String)> = std::iter::from_fn(|| receiver.try_recv().ok())
        .filter_map(|event| match event {
            KioskEvent::StateChanged { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();

    assert_eq!(
        transitions,
        vec![
            ("idle".to_string(), "capturing".to_string()),
            ("capturing".to_string(), "submitting".to_string()),
            ("submitting".to_string(), "awaiting_details".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_first_visit_registers_and_checks_in() {
    let media = MockMediaDevices::with_cameras(2);
    let transport = MockScanTransport::new();
    let (mut controller, _bus) = ready_controller(&media).await;

    // Timed capture from the second camera
    controller.switch_device().await;
    assert_eq!(
        controller.session().selected_device().map(|d| d.id.as_str()),
        Some("cam-2")
    );
    assert!(controller.capture_with_countdown().await);
    let mut pending = None;
    while pending.is_none() {
        pending = controller.tick().await;
    }

    let follow_up = controller
        .run_submission(pending.unwrap(), &transport)
        .await;
    let Some(FollowUp::LocateVisitor { form_id }) = follow_up else {
        panic!("expected registration to open");
    };

    let provider: Arc<dyn Geolocation> = Arc::new(FixedGeolocation::new(40.7128, -74.006));
    let location = resolve_location(Some(provider), Duration::from_secs(1)).await;
    controller.on_location(form_id, location).await;

    // Leaving a required field empty blocks submission
    controller.change_field(FieldId::Name, "Lee Chen");
    controller.blur_field(FieldId::Email);
    let error = controller.submit_details().await.err();
    assert!(matches!(error, Some(KioskError::Validation(_))));
    assert_eq!(transport.request_count(), 1);

    for (field, value) in [
        (FieldId::Age, ""),
        (FieldId::Gender, "Other"),
        (FieldId::Email, "lee.chen@example.org"),
        (FieldId::Phone, "(212) 555-0199"),
        (FieldId::Address, "1 Liberty Plaza, New York"),
        (FieldId::Purpose, "Interview"),
        (FieldId::PersonToMeet, "Dana Ortiz"),
        (FieldId::PersonEmail, "dana@example.org"),
        (FieldId::PersonPhone, "+1 212 555 0100"),
    ] {
        controller.change_field(field, value);
    }

    let pending = controller.submit_details().await.unwrap();
    controller.run_submission(pending, &transport).await;

    assert_eq!(
        controller.state(),
        &WorkflowState::Success("Check-in successful".to_string())
    );
    assert!(controller.retained_image().is_none());

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let visitor = requests[1].visitor.as_ref().unwrap();
    assert_eq!(visitor.location, "40.7128, -74.006");
    assert_eq!(visitor.age, "");
    assert_eq!(requests[0].image, requests[1].image);
    assert!(requests[0]
        .image
        .as_data_url()
        .starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_returning_visitor_then_backend_failure() {
    let media = MockMediaDevices::with_cameras(1);
    let transport = MockScanTransport::new();
    transport.push_reply(Ok(ScanReply::complete("exit", "See you soon")));
    transport.push_reply(Err(SubmissionError::Server(String::new())));
    let (mut controller, _bus) = ready_controller(&media).await;

    let pending = controller.capture_now().await.unwrap();
    controller.run_submission(pending, &transport).await;
    assert_eq!(
        controller.state(),
        &WorkflowState::Success("See you soon".to_string())
    );
    assert!(controller.scan_another().await);

    let pending = controller.capture_now().await.unwrap();
    controller.run_submission(pending, &transport).await;
    assert_eq!(
        controller.state(),
        &WorkflowState::Error("Scan failed. Please try again.".to_string())
    );

    assert!(controller.try_again().await);
    assert_eq!(controller.state(), &WorkflowState::Idle);
}
