//! Tests for online sessions over the in-process store.

use std::sync::{Arc, Mutex};

use tictactoe_live::remote::{GameStore, MemoryStore, SessionStatus, Snapshot};
use tictactoe_live::storage::{InMemoryStore, KeyValueStore, keys};
use tictactoe_live::{Mark, OnlineSession, Presenter, Screen, SessionError, Theme};

/// Presenter that records every call, for asserting what the subscription
/// painted.
#[derive(Debug, Default)]
struct RecordingPresenter {
    events: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl Presenter for RecordingPresenter {
    fn show_screen(&self, screen: Screen) {
        self.push(format!("screen:{:?}", screen));
    }

    fn clear_board(&self) {
        self.push("clear");
    }

    fn update_cell(&self, cell: usize, mark: Mark) {
        self.push(format!("cell:{}:{}", cell, mark));
    }

    fn update_status(&self, turn: Mark) {
        self.push(format!("status:{}", turn));
    }

    fn show_winner(&self, mark: Mark, line: [usize; 3]) {
        self.push(format!("winner:{}:{:?}", mark, line));
    }

    fn show_draw(&self) {
        self.push("draw");
    }

    fn update_scores(&self, score_x: u32, score_o: u32) {
        self.push(format!("scores:{}:{}", score_x, score_o));
    }

    fn show_session_id(&self, id: &str) {
        self.push(format!("session:{}", id));
    }

    fn show_notice(&self, message: &str) {
        self.push(format!("notice:{}", message));
    }

    fn apply_theme(&self, theme: Theme) {
        self.push(format!("theme:{}", theme.as_str()));
    }
}

/// Waits until the predicate holds over the recorded events, with a bound
/// so a broken subscription fails instead of hanging.
async fn wait_for(presenter: &RecordingPresenter, pred: impl Fn(&[String]) -> bool) {
    for _ in 0..100 {
        if pred(&presenter.events()) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("Condition not met, events: {:?}", presenter.events());
}

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

#[tokio::test]
async fn test_create_registers_host_as_x_waiting() {
    let store = store();
    let session = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");

    assert_eq!(session.local_mark(), Mark::X);

    let record = store
        .get(session.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(record.status, SessionStatus::Waiting);
    assert_eq!(record.players.x.name, "Alice");
    assert!(!record.has_opponent());
}

#[tokio::test]
async fn test_join_registers_o_and_starts_play() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");

    let (joiner, record) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    assert_eq!(joiner.local_mark(), Mark::O);
    assert_eq!(record.status, SessionStatus::Playing);
    assert_eq!(record.players.x.name, "Alice");
    assert_eq!(
        record.players.o.as_ref().map(|slot| slot.name.as_str()),
        Some("Bob")
    );
}

#[tokio::test]
async fn test_join_missing_session_is_not_found() {
    let result = OnlineSession::join(store(), "nope123", "Bob").await;
    assert!(matches!(result, Err(SessionError::NotFound)));
}

#[tokio::test]
async fn test_join_full_session_is_refused() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    let result = OnlineSession::join(store.clone(), host.id(), "Carol").await;
    assert!(matches!(result, Err(SessionError::SessionFull)));
}

#[tokio::test]
async fn test_simultaneous_joins_admit_only_one() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");

    let (bob, carol) = tokio::join!(
        OnlineSession::join(store.clone(), host.id(), "Bob"),
        OnlineSession::join(store.clone(), host.id(), "Carol"),
    );

    let admitted = usize::from(bob.is_ok()) + usize::from(carol.is_ok());
    assert_eq!(admitted, 1, "Exactly one joiner should take the O slot");
    let refused = if bob.is_ok() { carol } else { bob };
    assert!(matches!(refused, Err(SessionError::SessionFull)));

    let record = store
        .get(host.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    let joined = record.players.o.as_ref().expect("No opponent");
    assert!(joined.name == "Bob" || joined.name == "Carol");
    assert_eq!(record.status, SessionStatus::Playing);
}

#[tokio::test]
async fn test_move_before_opponent_joins_is_rejected_without_write() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");

    let before = store.get(host.id()).await.expect("Read failed");
    let committed = host.make_move(0).await.expect("Move failed");

    assert!(!committed);
    assert_eq!(store.get(host.id()).await.expect("Read failed"), before);
}

#[tokio::test]
async fn test_out_of_turn_move_is_rejected_without_write() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    // X moves first; O's attempt must leave the record untouched.
    let before = store.get(host.id()).await.expect("Read failed");
    assert!(!joiner.make_move(0).await.expect("Move failed"));
    assert_eq!(store.get(host.id()).await.expect("Read failed"), before);
}

#[tokio::test]
async fn test_occupied_cell_is_rejected_without_write() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    assert!(host.make_move(4).await.expect("Move failed"));
    assert!(joiner.make_move(0).await.expect("Move failed"));

    let before = store.get(host.id()).await.expect("Read failed");
    assert!(!host.make_move(4).await.expect("Move failed"));
    assert_eq!(store.get(host.id()).await.expect("Read failed"), before);
}

#[tokio::test]
async fn test_moves_alternate_and_advance_the_record() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    assert!(host.make_move(0).await.expect("Move failed"));
    let record = store
        .get(host.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(record.current_player, Mark::O);

    assert!(joiner.make_move(4).await.expect("Move failed"));
    let record = store
        .get(host.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(record.current_player, Mark::X);
    assert_eq!(record.status, SessionStatus::Playing);
}

#[tokio::test]
async fn test_winning_move_finishes_the_session() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    // X takes the top row while O plays below it.
    assert!(host.make_move(0).await.expect("Move failed"));
    assert!(joiner.make_move(3).await.expect("Move failed"));
    assert!(host.make_move(1).await.expect("Move failed"));
    assert!(joiner.make_move(4).await.expect("Move failed"));
    assert!(host.make_move(2).await.expect("Move failed"));

    let record = store
        .get(host.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(record.status, SessionStatus::Finished);
    assert_eq!(record.winner, Some(Mark::X));
    assert!(!record.draw);

    // No further moves in a finished session.
    assert!(!joiner.make_move(5).await.expect("Move failed"));
}

#[tokio::test]
async fn test_drawn_board_finishes_the_session() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    // X O X / O O X / X X O, winnerless.
    for (mark, cell) in [
        (Mark::X, 0),
        (Mark::O, 1),
        (Mark::X, 2),
        (Mark::O, 3),
        (Mark::X, 5),
        (Mark::O, 4),
        (Mark::X, 6),
        (Mark::O, 8),
        (Mark::X, 7),
    ] {
        let session = if mark == Mark::X { &host } else { &joiner };
        assert!(session.make_move(cell).await.expect("Move failed"));
    }

    let record = store
        .get(host.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(record.status, SessionStatus::Finished);
    assert!(record.draw);
    assert_eq!(record.winner, None);
}

#[tokio::test]
async fn test_restart_resets_board_and_keeps_roster() {
    let store = store();
    let host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");
    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");

    assert!(host.make_move(0).await.expect("Move failed"));
    joiner.restart().await.expect("Restart failed");

    let record = store
        .get(host.id())
        .await
        .expect("Read failed")
        .expect("Record missing");
    assert_eq!(record.status, SessionStatus::Playing);
    assert_eq!(record.current_player, Mark::X);
    assert!(record.board.is_empty_cell(0));
    assert!(record.has_opponent());
}

#[tokio::test]
async fn test_subscription_delivers_initial_snapshot_and_updates() {
    let store = store();
    let mut host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");

    let presenter = Arc::new(RecordingPresenter::default());
    host.start_listener(presenter.clone())
        .await
        .expect("Listen failed");

    // The initial snapshot repaints the empty waiting board.
    wait_for(&presenter, |events| {
        events.iter().any(|e| e == "status:X")
    })
    .await;

    let (joiner, _) = OnlineSession::join(store.clone(), host.id(), "Bob")
        .await
        .expect("Join failed");
    assert!(host.make_move(4).await.expect("Move failed"));

    // The host's own committed move comes back through the subscription.
    wait_for(&presenter, |events| {
        events.iter().any(|e| e == "cell:4:X") && events.iter().any(|e| e == "status:O")
    })
    .await;
    drop(joiner);
}

#[tokio::test]
async fn test_deleted_record_tears_the_session_down() {
    let store = store();
    let mut host = OnlineSession::create(store.clone(), "Alice")
        .await
        .expect("Create failed");

    let presenter = Arc::new(RecordingPresenter::default());
    host.start_listener(presenter.clone())
        .await
        .expect("Listen failed");

    store.delete(host.id()).await.expect("Delete failed");

    wait_for(&presenter, |events| {
        events
            .iter()
            .any(|e| e.starts_with("notice:Game not found"))
            && events.iter().any(|e| e == "screen:ModeSelection")
    })
    .await;
}

#[tokio::test]
async fn test_subscription_on_missing_record_reports_deleted() {
    let store = store();
    let mut watcher = store.subscribe("never-created").await.expect("Subscribe failed");
    assert_eq!(watcher.recv().await, Some(Snapshot::Deleted));
    assert_eq!(watcher.recv().await, None);
}

#[tokio::test]
async fn test_session_keys_round_trip() {
    let kv = InMemoryStore::new();
    let store = store();
    let host = OnlineSession::create(store, "Alice")
        .await
        .expect("Create failed");

    host.remember(&kv).expect("Remember failed");
    assert_eq!(
        kv.get(keys::ONLINE_GAME_ID).expect("Get failed").as_deref(),
        Some(host.id())
    );
    assert_eq!(
        kv.get(keys::ONLINE_PLAYER_MARK)
            .expect("Get failed")
            .as_deref(),
        Some("X")
    );

    let recalled = OnlineSession::recall(&kv).expect("Recall failed");
    assert_eq!(recalled, Some((host.id().to_string(), Mark::X)));

    OnlineSession::forget(&kv).expect("Forget failed");
    assert_eq!(OnlineSession::recall(&kv).expect("Recall failed"), None);
}
