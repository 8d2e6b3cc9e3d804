use std::sync::Arc;
use std::time::Duration;

use convene_common::{DisplaySource, Notification, Panel};
use convene_session::{
    MediaAccessError, ScriptedFeed, SessionConfig, SessionController, SessionPhase,
    SyntheticBackend, UserAction,
};
use tokio::sync::{broadcast, oneshot};

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn demo_controller(backend: &SyntheticBackend) -> SessionController {
    SessionController::new(
        SessionConfig::default(),
        Arc::new(backend.clone()),
        Box::new(ScriptedFeed::demo()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_demo_meeting_scenario() {
    let backend = SyntheticBackend::new();
    let mut ctl = demo_controller(&backend);
    let mut rx = ctl.subscribe();

    ctl.initialize("m1", "t1").unwrap();
    assert_eq!(ctl.phase(), &SessionPhase::AcquiringMedia);
    ctl.process_next_event().await;
    assert_eq!(ctl.phase(), &SessionPhase::Active);
    assert!(ctl.clock().is_running());
    assert_eq!(ctl.roster().count(), 1);

    // participant1 at 2s
    ctl.process_next_event().await;
    let ids: Vec<_> = ctl.participants().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, ["local", "participant1"]);

    // participant2 at 4s
    ctl.process_next_event().await;
    let jane = ctl.roster().get("participant2").unwrap();
    assert_eq!(jane.name, "Jane Smith");
    assert!(jane.audio_enabled);
    assert!(!jane.video_enabled);
    assert_eq!(ctl.roster().count(), 3);
    assert_eq!(ctl.peers().len(), 2);

    // chat at 5s
    ctl.process_next_event().await;
    assert_eq!(ctl.chat().len(), 1);
    let message = &ctl.chat().all()[0];
    assert_eq!(message.sender, "John Doe");
    assert_eq!(message.text, "Hello everyone!");
    assert_eq!(ctl.clock().label(), "00:05");

    assert!(ctl.leave());
    assert!(!ctl.clock().is_running());
    assert_eq!(ctl.roster().count(), 0);
    assert!(ctl.peers().is_empty());
    assert!(backend.issued().iter().all(|s| !s.is_live()));

    let notes = drain(&mut rx);
    let roster_sizes: Vec<_> = notes
        .iter()
        .filter_map(|n| match n {
            Notification::RosterChanged { participants } => Some(participants.len()),
            _ => None,
        })
        .collect();
    assert_eq!(roster_sizes, [1, 2, 3]);
    assert!(matches!(
        notes.last(),
        Some(Notification::SessionEnded { elapsed }) if elapsed == "00:05"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_drives_actions_and_feed() {
    let backend = SyntheticBackend::new();
    let ctl = demo_controller(&backend);
    let handle = ctl.handle();
    let mut rx = ctl.subscribe();
    let (stop_tx, stop_rx) = oneshot::channel();

    handle.join("m1", "t1");
    handle.send(UserAction::ToggleVideo);
    handle.send(UserAction::OpenPanel(Panel::Chat));
    handle.send(UserAction::SendChat("hi".into()));
    let run = tokio::spawn(ctl.run_with_shutdown(stop_rx));

    tokio::time::sleep(Duration::from_secs(6)).await;
    handle.send(UserAction::ToggleScreenShare);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(backend.last_screen_share().is_some());
    assert!(backend.end_screen_share());
    tokio::time::sleep(Duration::from_millis(10)).await;

    stop_tx.send(()).unwrap();
    let ctl = run.await.unwrap();
    assert_eq!(ctl.phase(), &SessionPhase::Ended);
    assert_eq!(ctl.chat().len(), 2);
    assert_eq!(ctl.open_panel_kind(), Some(Panel::Chat));
    assert!(!ctl.devices().video_enabled());
    assert!(!ctl.is_sharing());

    let notes = drain(&mut rx);
    let shares: Vec<_> = notes
        .iter()
        .filter_map(|n| match n {
            Notification::ShareStateChanged {
                sharing,
                display_source,
            } => Some((*sharing, *display_source)),
            _ => None,
        })
        .collect();
    assert_eq!(
        shares,
        [
            (false, DisplaySource::Capture),
            (true, DisplaySource::ScreenShare),
            (false, DisplaySource::Capture),
        ]
    );
    let ended = notes
        .iter()
        .filter(|n| matches!(n, Notification::SessionEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_has_no_remote_activity() {
    let backend = SyntheticBackend::new();
    backend.fail_next_capture(MediaAccessError::PermissionDenied);
    let mut ctl = demo_controller(&backend);

    ctl.initialize("m1", "t1").unwrap();
    ctl.process_next_event().await;
    assert_eq!(ctl.phase(), &SessionPhase::AwaitingPermission);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(ctl.roster().count(), 0);
    assert!(!ctl.clock().is_started());

    // initialize again doubles as a retry
    ctl.initialize("m1", "t1").unwrap();
    ctl.process_next_event().await;
    assert_eq!(ctl.phase(), &SessionPhase::Active);
    ctl.process_next_event().await;
    assert_eq!(ctl.roster().count(), 2);
}

#[tokio::test]
async fn test_run_exits_on_failure() {
    let backend = SyntheticBackend::new();
    backend.fail_next_capture(MediaAccessError::Other("device busy".into()));
    let ctl = demo_controller(&backend);
    let handle = ctl.handle();

    handle.join("m1", "t1");
    let ctl = ctl.run().await;
    assert_eq!(
        ctl.phase(),
        &SessionPhase::Failed {
            message: "Failed to access camera or microphone: device busy".into()
        }
    );
}
