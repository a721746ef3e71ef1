//! Tests for the game state engine.

use tictactoe_live::storage::ScoreRecord;
use tictactoe_live::{GameState, Mark, MoveError, Outcome};

/// Plays a sequence of cells, alternating turns, expecting every move to
/// land. Returns the final outcome.
fn play_all(game: &mut GameState, cells: &[usize]) -> Outcome {
    let mut outcome = Outcome::Ongoing;
    for &cell in cells {
        outcome = game.play(cell).expect("Move rejected");
    }
    outcome
}

#[test]
fn test_fresh_game_starts_with_x() {
    let game = GameState::new();
    assert_eq!(game.current_turn(), Mark::X);
    assert!(game.is_active());
    assert_eq!(game.score_x(), 0);
    assert_eq!(game.score_o(), 0);
}

#[test]
fn test_top_row_win_credits_x() {
    let mut game = GameState::new();
    // X: 0, 1, 2; O: 3, 4.
    let outcome = play_all(&mut game, &[0, 3, 1, 4, 2]);
    assert_eq!(
        outcome,
        Outcome::Win {
            mark: Mark::X,
            line: [0, 1, 2]
        }
    );
    assert!(!game.is_active());
    assert_eq!(game.score_x(), 1);
    assert_eq!(game.score_o(), 0);
}

#[test]
fn test_every_winning_line_is_detected() {
    let lines: [[usize; 3]; 8] = [
        [0, 1, 2],
        [3, 4, 5],
        [6, 7, 8],
        [0, 3, 6],
        [1, 4, 7],
        [2, 5, 8],
        [0, 4, 8],
        [2, 4, 6],
    ];

    for line in lines {
        let mut game = GameState::new();
        // X fills the line; O plays two cells off it.
        let spoilers: Vec<usize> = (0..9).filter(|cell| !line.contains(cell)).collect();
        let sequence = [
            line[0],
            spoilers[0],
            line[1],
            spoilers[1],
            line[2],
        ];
        let outcome = play_all(&mut game, &sequence);
        assert_eq!(
            outcome,
            Outcome::Win {
                mark: Mark::X,
                line
            },
            "Line {:?} not detected",
            line
        );
    }
}

#[test]
fn test_o_win_credits_o_not_the_next_mover() {
    let mut game = GameState::new();
    // X: 0, 1, 8; O: 3, 4, 5 completes the middle row.
    let outcome = play_all(&mut game, &[0, 3, 1, 4, 8, 5]);
    assert_eq!(
        outcome,
        Outcome::Win {
            mark: Mark::O,
            line: [3, 4, 5]
        }
    );
    assert_eq!(game.score_o(), 1);
    assert_eq!(game.score_x(), 0);
}

#[test]
fn test_full_board_without_line_is_a_draw() {
    let mut game = GameState::new();
    // X O X / O O X / X X O reading the board row by row.
    let outcome = play_all(&mut game, &[0, 1, 2, 3, 5, 4, 6, 8, 7]);
    assert_eq!(outcome, Outcome::Draw);
    assert!(!game.is_active());
    assert_eq!(game.score_x(), 0);
    assert_eq!(game.score_o(), 0);
}

#[test]
fn test_win_on_the_ninth_move_is_a_win_not_a_draw() {
    let mut game = GameState::new();
    // X X O / O X X / O O X with X's final move at 8 completing the diagonal.
    let outcome = play_all(&mut game, &[0, 2, 4, 3, 1, 7, 5, 6, 8]);
    assert_eq!(
        outcome,
        Outcome::Win {
            mark: Mark::X,
            line: [0, 4, 8]
        }
    );
    assert_eq!(game.score_x(), 1);
}

#[test]
fn test_occupied_cell_is_rejected_without_mutation() {
    let mut game = GameState::new();
    game.play(4).expect("First move rejected");
    assert_eq!(game.current_turn(), Mark::O);

    let result = game.play(4);
    assert_eq!(result, Err(MoveError::CellOccupied));
    // Turn did not advance and the cell still belongs to X.
    assert_eq!(game.current_turn(), Mark::O);
    assert_eq!(game.board().get(4).and_then(|c| c.mark()), Some(Mark::X));
}

#[test]
fn test_out_of_range_cell_is_rejected() {
    let mut game = GameState::new();
    assert_eq!(game.play(9), Err(MoveError::OutOfBounds));
    assert_eq!(game.current_turn(), Mark::X);
}

#[test]
fn test_moves_after_the_game_ends_are_rejected() {
    let mut game = GameState::new();
    play_all(&mut game, &[0, 3, 1, 4, 2]);
    assert_eq!(game.play(8), Err(MoveError::GameOver));
}

#[test]
fn test_settle_does_not_credit_twice() {
    let mut game = GameState::new();
    play_all(&mut game, &[0, 3, 1, 4, 2]);
    assert_eq!(game.score_x(), 1);

    // Settling an already finished board changes nothing.
    let outcome = game.settle();
    assert!(matches!(outcome, Outcome::Win { mark: Mark::X, .. }));
    assert_eq!(game.score_x(), 1);
}

#[test]
fn test_switch_player_is_an_involution() {
    let mut game = GameState::new();
    game.switch_player();
    assert_eq!(game.current_turn(), Mark::O);
    game.switch_player();
    assert_eq!(game.current_turn(), Mark::X);
}

#[test]
fn test_reset_game_keeps_scores_and_names() {
    let mut game = GameState::new();
    game.initialize_players("Alice", "Bob", None);
    play_all(&mut game, &[0, 3, 1, 4, 2]);
    assert_eq!(game.score_x(), 1);

    game.reset_game();
    assert!(game.is_active());
    assert_eq!(game.current_turn(), Mark::X);
    assert_eq!(game.board().get(0).and_then(|c| c.mark()), None);
    assert_eq!(game.score_x(), 1);
    assert_eq!(game.player_x_name(), "Alice");
    assert_eq!(game.player_o_name(), "Bob");
}

#[test]
fn test_initialize_players_adopts_matching_record() {
    let mut game = GameState::new();
    let stored = ScoreRecord::new(3, 2, "Alice".to_string(), "Bob".to_string());
    game.initialize_players("Alice", "Bob", Some(&stored));
    assert_eq!(game.score_x(), 3);
    assert_eq!(game.score_o(), 2);
}

#[test]
fn test_initialize_players_zeroes_on_new_pairing() {
    let mut game = GameState::new();
    let stored = ScoreRecord::new(3, 2, "Alice".to_string(), "Bob".to_string());
    // Same people, swapped markers: not the same pairing.
    game.initialize_players("Bob", "Alice", Some(&stored));
    assert_eq!(game.score_x(), 0);
    assert_eq!(game.score_o(), 0);
}

#[test]
fn test_score_record_round_trips_through_engine() {
    let mut game = GameState::new();
    game.initialize_players("Alice", "Bob", None);
    play_all(&mut game, &[0, 3, 1, 4, 2]);

    let record = game.score_record();
    assert_eq!(*record.score_x(), 1);
    assert_eq!(*record.score_o(), 0);
    assert!(record.matches("Alice", "Bob"));
}
