//! Tests for remote synchronization: pairing, idempotent board ingestion,
//! stale-message discard, and keep-alive renewal.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedService, match_info, matched_status, remote_state, waiting};
use gridmatch::{
    Board, CreateMatchResponse, DeviceHandle, Mark, MatchPhase, MatchService, RemoteSync,
    SessionController, SessionUpdate, StateChange, SyncConfig, SyncEvent, SyncMessage,
};
use tokio::time::timeout;

const RECV_DEADLINE: Duration = Duration::from_secs(5);

fn fast_config() -> SyncConfig {
    SyncConfig::new(
        Duration::from_millis(10),
        Duration::from_millis(10),
        Duration::from_millis(20),
        Duration::from_secs(3600),
    )
}

/// Cadences with polling pushed out of the way, for tests that drive
/// `apply` with hand-built messages.
fn quiet_config() -> SyncConfig {
    SyncConfig::new(
        Duration::from_secs(3600),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    )
}

fn immediate_match(service: &ScriptedService, local_symbol: &str, size: usize) {
    let opponent_symbol = if local_symbol == "X" { "O" } else { "X" };
    *service.create_response.lock().unwrap() = Some(CreateMatchResponse::Matched(match_info(
        "m-1",
        &[("dev-local", local_symbol), ("dev-opp", opponent_symbol)],
        size,
    )));
}

async fn networked_session(
    service: Arc<ScriptedService>,
    local_symbol: &str,
) -> SessionController {
    immediate_match(&service, local_symbol, 3);
    let device = DeviceHandle::from_id("dev-local", Some("Player"));
    let (remote, _rx) = RemoteSync::new(service, device, quiet_config());
    SessionController::networked(remote, 3).await.unwrap()
}

fn state_message(state: gridmatch::RemoteGameState) -> SyncMessage {
    SyncMessage {
        generation: 0,
        event: SyncEvent::State(state),
    }
}

#[tokio::test]
async fn test_identical_remote_board_ingested_once() {
    let service = Arc::new(ScriptedService::default());
    let mut session = networked_session(service, "X").await;

    let state = remote_state(
        &[&["X", "", ""], &["", "", ""], &["", "", ""]],
        "dev-opp",
        None,
    );
    let update = session.handle_sync(state_message(state.clone()));
    assert!(matches!(update, Some(SessionUpdate::BoardChanged)));
    assert_eq!(session.history().len(), 2);

    // The same payload polled again grows nothing.
    let update = session.handle_sync(state_message(state));
    assert!(update.is_none());
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn test_initial_empty_poll_is_redundant() {
    let service = Arc::new(ScriptedService::default());
    let mut session = networked_session(service, "X").await;

    let empty = remote_state(&[&["", "", ""], &["", "", ""], &["", "", ""]], "dev-local", None);
    assert!(session.handle_sync(state_message(empty)).is_none());
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_turn_ownership_recomputed_from_remote_payload() {
    let service = Arc::new(ScriptedService::default());
    // Local plays O; X opens, so the local turn flag starts false.
    let mut session = networked_session(service, "O").await;
    assert!(!session.match_session().unwrap().is_local_turn());

    let state = remote_state(
        &[&["X", "", ""], &["", "", ""], &["", "", ""]],
        "dev-local",
        None,
    );
    session.handle_sync(state_message(state));
    assert!(session.match_session().unwrap().is_local_turn());
}

#[tokio::test]
async fn test_winner_payload_finishes_and_scores_once() {
    let service = Arc::new(ScriptedService::default());
    let mut session = networked_session(service, "X").await;

    let state = remote_state(
        &[&["X", "X", "X"], &["O", "O", ""], &["", "", ""]],
        "dev-opp",
        Some("X"),
    );
    let update = session.handle_sync(state_message(state.clone()));
    match update {
        Some(SessionUpdate::GameFinished { winner }) => assert_eq!(winner, Some(Mark::X)),
        other => panic!("expected GameFinished, got {:?}", other),
    }
    assert_eq!(
        session.match_session().unwrap().phase(),
        MatchPhase::Finished
    );
    assert_eq!(session.scores().wins(Mark::X), 1);

    // A repeated observation of the finished match neither grows history
    // nor scores again.
    assert!(session.handle_sync(state_message(state)).is_none());
    assert_eq!(session.scores().wins(Mark::X), 1);
}

#[tokio::test]
async fn test_draw_payload_finishes_without_scoring() {
    let service = Arc::new(ScriptedService::default());
    let mut session = networked_session(service, "X").await;

    let state = remote_state(
        &[
            &["X", "O", "X"],
            &["X", "O", "O"],
            &["O", "X", "X"],
        ],
        "dev-opp",
        None,
    );
    let update = session.handle_sync(state_message(state));
    assert!(matches!(
        update,
        Some(SessionUpdate::GameFinished { winner: None })
    ));
    assert_eq!(session.scores().wins(Mark::X), 0);
    assert_eq!(session.scores().wins(Mark::O), 0);
}

#[tokio::test]
async fn test_stale_generation_discarded_after_reset() {
    let service = Arc::new(ScriptedService::default());
    immediate_match(&service, "X", 3);
    let device = DeviceHandle::from_id("dev-local", Some("Player"));
    let (mut remote, _rx) = RemoteSync::new(service, device, quiet_config());
    remote.start(3).await.unwrap();
    assert_eq!(remote.session().phase(), MatchPhase::Playing);

    remote.reset(3).await.unwrap();

    let stale = state_message(remote_state(
        &[&["X", "", ""], &["", "", ""], &["", "", ""]],
        "dev-local",
        None,
    ));
    assert!(remote.apply(stale).is_none());
}

#[tokio::test]
async fn test_teardown_discards_in_flight_responses() {
    let service = Arc::new(ScriptedService::default());
    immediate_match(&service, "X", 3);
    let device = DeviceHandle::from_id("dev-local", Some("Player"));
    let (mut remote, _rx) = RemoteSync::new(service, device, quiet_config());
    remote.start(3).await.unwrap();

    remote.teardown();
    assert_eq!(remote.session().phase(), MatchPhase::Idle);
    assert!(remote.session().match_id().is_none());

    let late = state_message(remote_state(
        &[&["X", "", ""], &["", "", ""], &["", "", ""]],
        "dev-local",
        None,
    ));
    assert!(remote.apply(late).is_none());
}

#[tokio::test]
async fn test_waiting_pairing_flow_adopts_board_size() {
    let service = Arc::new(ScriptedService::default());
    // No immediate match; the waiting poller discovers the pairing.
    let info = match_info("m-9", &[("dev-local", "O"), ("dev-opp", "X")], 5);
    *service.waiting_queue.lock().unwrap() = vec![waiting(), matched_status(info)];

    let device = DeviceHandle::from_id("dev-local", Some("Player"));
    let (mut remote, mut rx) = RemoteSync::new(service, device, fast_config());
    remote.start(3).await.unwrap();
    assert_eq!(remote.session().phase(), MatchPhase::Waiting);

    let message = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("pairing message in time")
        .expect("channel open");
    let change = remote.apply(message).expect("pairing applied");
    assert!(matches!(change, StateChange::Matched { board_size: 5 }));

    let session = remote.session();
    assert_eq!(session.phase(), MatchPhase::Playing);
    assert_eq!(session.match_id(), Some("m-9"));
    assert_eq!(session.local_mark(), Some(Mark::O));
    assert!(!session.is_local_turn());
    assert_eq!(remote.board_size(), 5);
}

#[tokio::test]
async fn test_poll_failure_then_recovery() {
    let service = Arc::new(ScriptedService::default());
    immediate_match(&service, "X", 3);
    let device = DeviceHandle::from_id("dev-local", Some("Player"));
    let (_remote, mut rx) = {
        let (mut remote, rx) = RemoteSync::new(
            Arc::clone(&service) as Arc<dyn MatchService>,
            device,
            fast_config(),
        );
        remote.start(3).await.unwrap();
        (remote, rx)
    };

    // Polls fail while nothing is scripted; the loop keeps going.
    tokio::time::sleep(Duration::from_millis(60)).await;
    service.game_states.lock().unwrap().push(remote_state(
        &[&["X", "", ""], &["", "", ""], &["", "", ""]],
        "dev-opp",
        None,
    ));

    let message = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("state message after recovery")
        .expect("channel open");
    assert!(matches!(message.event, SyncEvent::State(_)));
}

#[tokio::test]
async fn test_keep_alive_failure_renews_device() {
    let service = Arc::new(ScriptedService::default());
    immediate_match(&service, "X", 3);
    *service.fail_probe.lock().unwrap() = true;

    let device = DeviceHandle::from_id("dev-0", Some("Player"));
    let config = SyncConfig::new(
        Duration::from_secs(3600),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
        Duration::from_millis(10),
    );
    let (mut remote, mut rx) = RemoteSync::new(
        Arc::clone(&service) as Arc<dyn MatchService>,
        device.clone(),
        config,
    );
    remote.start(3).await.unwrap();

    let message = timeout(RECV_DEADLINE, rx.recv())
        .await
        .expect("renewal message in time")
        .expect("channel open");
    match &message.event {
        SyncEvent::DeviceRenewed(id) => assert_eq!(id, "dev-1"),
        other => panic!("expected DeviceRenewed, got {:?}", other),
    }
    // The probe keeps failing, so renewals may continue; the original
    // identity is gone either way.
    assert_ne!(device.id(), "dev-0");
    assert!(matches!(
        remote.apply(message),
        Some(StateChange::DeviceRenewed { .. })
    ));
}

#[tokio::test]
async fn test_submit_flips_turn_before_and_restores_after_failure() {
    let service = Arc::new(ScriptedService::default());
    immediate_match(&service, "X", 3);
    let device = DeviceHandle::from_id("dev-local", Some("Player"));
    let (mut remote, _rx) = RemoteSync::new(
        Arc::clone(&service) as Arc<dyn MatchService>,
        device,
        quiet_config(),
    );
    remote.start(3).await.unwrap();
    assert!(remote.session().is_local_turn());

    let tentative = Board::new(3);
    *service.fail_submit.lock().unwrap() = true;
    assert!(remote.submit_move(&tentative, 0, 0).await.is_err());
    assert!(remote.session().is_local_turn());

    *service.fail_submit.lock().unwrap() = false;
    remote.submit_move(&tentative, 0, 0).await.unwrap();
    assert!(!remote.session().is_local_turn());
}
