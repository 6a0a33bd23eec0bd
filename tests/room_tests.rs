use std::sync::{Arc, Barrier};
use std::thread;

use othello::session::{outbox, Outgoing};
use othello::{
    Board, Color, Departure, GameEngine, GameResult, GameRoom, GameState, MoveError, Phase,
    Score, ServerFull, ServerMessage, Slot,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Everything queued so far, and whether the queue ended with a close.
fn take(rx: &mut UnboundedReceiver<Outgoing>) -> (Vec<ServerMessage>, bool) {
    let mut messages = Vec::new();
    let mut closed = false;
    while let Ok(item) = rx.try_recv() {
        match item {
            Outgoing::Message(msg) => {
                assert!(!closed, "message queued after close: {:?}", msg);
                messages.push(msg);
            }
            Outgoing::Close => closed = true,
        }
    }
    (messages, closed)
}

fn seated() -> (
    Arc<GameRoom>,
    UnboundedReceiver<Outgoing>,
    UnboundedReceiver<Outgoing>,
) {
    seated_with(GameEngine::new())
}

fn seated_with(
    engine: GameEngine,
) -> (
    Arc<GameRoom>,
    UnboundedReceiver<Outgoing>,
    UnboundedReceiver<Outgoing>,
) {
    let room = Arc::new(GameRoom::with_engine(engine));
    let (tx1, mut rx1) = outbox();
    let (tx2, mut rx2) = outbox();
    room.join(tx1).unwrap();
    room.join(tx2).unwrap();
    take(&mut rx1);
    take(&mut rx2);
    (room, rx1, rx2)
}

#[test]
fn joining_greets_then_starts() {
    let room = GameRoom::new();
    let (tx1, mut rx1) = outbox();
    let (tx2, mut rx2) = outbox();
    let opening = Score { white: 2, black: 2 };

    assert_eq!(room.join(tx1).unwrap().slot(), Slot::One);
    assert_eq!(
        take(&mut rx1),
        (
            vec![
                ServerMessage::Welcome(Slot::One),
                ServerMessage::Board(Board::new()),
                ServerMessage::Score(opening),
            ],
            false
        )
    );
    assert_eq!(room.phase(), Phase::WaitingForPlayers);

    assert_eq!(room.join(tx2).unwrap().slot(), Slot::Two);
    let started = vec![
        ServerMessage::Score(opening),
        ServerMessage::status("Game started!"),
        ServerMessage::turn(Color::Black),
    ];
    assert_eq!(take(&mut rx1), (started.clone(), false));
    let mut greeted = vec![
        ServerMessage::Welcome(Slot::Two),
        ServerMessage::Board(Board::new()),
    ];
    greeted.extend(started);
    assert_eq!(take(&mut rx2), (greeted, false));
    assert_eq!(room.phase(), Phase::InProgress);

    let (tx3, mut rx3) = outbox();
    assert_eq!(room.join(tx3).unwrap_err(), ServerFull);
    assert_eq!(take(&mut rx3), (vec![], false));
}

#[test]
fn accepted_move_reaches_both_seats() {
    let (room, mut rx1, mut rx2) = seated();

    let outcome = room.play(Slot::One, 2, 3).unwrap();
    let expected = vec![
        ServerMessage::Board(outcome.board),
        ServerMessage::Score(Score { white: 1, black: 4 }),
        ServerMessage::turn(Color::White),
    ];
    assert_eq!(take(&mut rx1), (expected.clone(), false));
    assert_eq!(take(&mut rx2), (expected, false));
}

#[test]
fn refused_move_is_not_broadcast() {
    let (room, mut rx1, mut rx2) = seated();
    let before = room.snapshot();

    assert_eq!(room.play(Slot::Two, 2, 4), Err(MoveError::NotYourTurn));
    assert_eq!(
        room.play(Slot::One, 0, 0),
        Err(MoveError::IllegalMove { x: 0, y: 0 })
    );
    assert_eq!(room.snapshot(), before);
    assert_eq!(take(&mut rx1), (vec![], false));
    assert_eq!(take(&mut rx2), (vec![], false));
}

#[test]
fn chat_is_relayed_to_everyone() {
    let (room, mut rx1, mut rx2) = seated();
    room.chat(Slot::Two, "gl hf".to_string());
    let chat = ServerMessage::Chat {
        from: Slot::Two,
        text: "gl hf".to_string(),
    };
    assert_eq!(take(&mut rx1), (vec![chat.clone()], false));
    assert_eq!(take(&mut rx2), (vec![chat], false));
}

#[test]
fn quit_mid_match_forfeits() {
    let (room, mut rx1, mut rx2) = seated();
    room.play(Slot::One, 2, 3).unwrap();
    take(&mut rx1);
    take(&mut rx2);
    let board = room.snapshot().board;

    room.depart(Slot::One, Departure::Quit);

    assert_eq!(take(&mut rx1), (vec![], true));
    let score = Score { white: 1, black: 4 };
    assert_eq!(
        take(&mut rx2),
        (
            vec![
                ServerMessage::status("Player 1 has left the game."),
                ServerMessage::GameOver(score),
                ServerMessage::winner(&GameResult {
                    score,
                    winner: Some(Color::White),
                    forfeited_by: Some(Color::Black),
                }),
            ],
            true
        )
    );

    let state = room.snapshot();
    assert_eq!(state.phase, Phase::Finished);
    assert_eq!(state.forfeited_by, Some(Color::Black));
    assert_eq!(state.board, board);
    assert!(room.registry().is_empty());

    // Repeated departures are no-ops.
    room.depart(Slot::One, Departure::Quit);
    room.depart(Slot::Two, Departure::ConnectionLost);
    assert_eq!(take(&mut rx2), (vec![], false));
    assert_eq!(room.play(Slot::Two, 2, 2), Err(MoveError::GameOver));
}

#[test]
fn leaving_before_start_frees_the_seat() {
    let room = GameRoom::new();
    let (tx1, mut rx1) = outbox();
    room.join(tx1).unwrap();
    take(&mut rx1);

    room.depart(Slot::One, Departure::ConnectionLost);
    assert_eq!(
        take(&mut rx1),
        (vec![], true),
        "the leaver is closed without a notice to itself"
    );
    assert_eq!(room.phase(), Phase::WaitingForPlayers);

    let (tx2, _rx2) = outbox();
    assert_eq!(room.join(tx2).unwrap().slot(), Slot::One);
}

#[test]
fn dead_peer_is_dropped_on_broadcast() {
    let (room, mut rx1, rx2) = seated();
    drop(rx2);

    room.chat(Slot::One, "anyone there?".to_string());

    let (messages, closed) = take(&mut rx1);
    assert!(closed);
    assert_eq!(
        messages,
        vec![
            ServerMessage::Chat {
                from: Slot::One,
                text: "anyone there?".to_string()
            },
            ServerMessage::status("Player 2 has disconnected."),
            ServerMessage::GameOver(Score { white: 2, black: 2 }),
            ServerMessage::status("Player 1 (Black) wins by forfeit."),
        ]
    );
    assert!(room.is_finished());
}

#[test]
fn last_move_ends_the_match() {
    let state = GameState {
        board: Board::from_rows([
            "BW......",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "BW......",
        ])
        .unwrap(),
        turn: Color::Black,
        phase: Phase::WaitingForPlayers,
        moves_played: 0,
        forfeited_by: None,
    };
    let (room, mut rx1, mut rx2) = seated_with(GameEngine::from_state(state));

    let outcome = room.play(Slot::One, 0, 2).unwrap();
    assert!(outcome.passed);
    let (messages, closed) = take(&mut rx2);
    assert!(!closed);
    assert_eq!(
        messages[2..],
        [
            ServerMessage::pass(Color::Black),
            ServerMessage::turn(Color::Black),
        ]
    );
    take(&mut rx1);

    let outcome = room.play(Slot::One, 7, 2).unwrap();
    let final_score = Score { white: 0, black: 6 };
    let expected = vec![
        ServerMessage::Board(outcome.board),
        ServerMessage::Score(final_score),
        ServerMessage::GameOver(final_score),
        ServerMessage::status("Player 1 (Black) wins."),
    ];
    assert_eq!(take(&mut rx1), (expected.clone(), true));
    assert_eq!(take(&mut rx2), (expected, true));
    assert!(room.is_finished());
    assert!(room.registry().is_empty());
}

#[test]
fn racing_moves_on_one_turn_accept_one() {
    for _ in 0..50 {
        let (room, mut rx1, mut rx2) = seated();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [(2, 3), (3, 2)]
            .into_iter()
            .map(|(x, y)| {
                let room = Arc::clone(&room);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    room.play(Slot::One, x, y).ok().map(|_| (x, y))
                })
            })
            .collect();
        let accepted: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(accepted.len(), 1);

        let (x, y) = accepted[0];
        let mut replay = Board::new();
        replay.apply_move(Color::Black, x, y);
        assert_eq!(room.snapshot().board, replay);
        assert_eq!(room.snapshot().moves_played, 1);
        assert_eq!(take(&mut rx1).0.len(), 3);
        assert_eq!(take(&mut rx2).0.len(), 3);
    }
}

#[test]
fn concurrent_players_see_the_same_sequence() {
    let (room, mut rx1, mut rx2) = seated();

    let handles: Vec<_> = Slot::ALL
        .into_iter()
        .map(|slot| {
            let room = Arc::clone(&room);
            thread::spawn(move || {
                let mut played = 0;
                while !room.is_finished() {
                    let state = room.snapshot();
                    if state.turn != slot.color() {
                        thread::yield_now();
                        continue;
                    }
                    let Some(sq) = state.board.legal_moves(slot.color()).first().copied()
                    else {
                        thread::yield_now();
                        continue;
                    };
                    if room.play(slot, i32::from(sq.x), i32::from(sq.y)).is_ok() {
                        played += 1;
                    }
                }
                played
            })
        })
        .collect();
    let played: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let state = room.snapshot();
    assert_eq!(state.phase, Phase::Finished);
    assert_eq!(played, state.moves_played);

    let (seen1, closed1) = take(&mut rx1);
    let (seen2, closed2) = take(&mut rx2);
    assert!(closed1 && closed2);
    assert_eq!(seen1, seen2);

    let boards: Vec<_> = seen1
        .iter()
        .filter_map(|msg| match msg {
            ServerMessage::Board(board) => Some(*board),
            _ => None,
        })
        .collect();
    assert_eq!(boards.len() as u32, state.moves_played);
    assert_eq!(boards.last(), Some(&state.board));
    assert!(seen1.contains(&ServerMessage::GameOver(state.board.score())));
}

#[test]
fn seat_left_before_start_is_offered_again() {
    let room = GameRoom::new();
    let (tx1, _rx1) = outbox();
    let (tx2, mut rx2) = outbox();
    room.join(tx1).unwrap();

    // Player 2 takes the second seat, then Player 1 leaves before the
    // match is started.
    room.registry().register(tx2).unwrap();
    room.depart(Slot::One, Departure::ConnectionLost);
    assert!(!room.registry().is_sealed());
    assert_eq!(room.phase(), Phase::WaitingForPlayers);
    assert_eq!(
        take(&mut rx2).0,
        vec![ServerMessage::status("Player 1 has disconnected.")]
    );

    let (tx3, mut rx3) = outbox();
    assert_eq!(room.join(tx3).unwrap().slot(), Slot::One);
    assert_eq!(room.phase(), Phase::InProgress);
    assert_eq!(take(&mut rx3).0[0], ServerMessage::Welcome(Slot::One));
    assert_eq!(room.play(Slot::One, 2, 3).map(|o| o.mover), Ok(Color::Black));
}

#[test]
fn racing_join_and_leave_never_wedge_the_room() {
    for _ in 0..200 {
        let room = Arc::new(GameRoom::new());
        let (tx1, _rx1) = outbox();
        room.join(tx1).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let joiner = {
            let room = Arc::clone(&room);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let (tx2, mut rx2) = outbox();
                barrier.wait();
                let joined = room.join(tx2).is_ok();
                (joined, take(&mut rx2).0)
            })
        };
        let leaver = {
            let room = Arc::clone(&room);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                room.depart(Slot::One, Departure::ConnectionLost);
            })
        };
        let (joined, seen) = joiner.join().unwrap();
        leaver.join().unwrap();
        assert!(joined);

        // The newcomer is always greeted before anything else.
        assert!(matches!(seen.first(), Some(ServerMessage::Welcome(_))));

        // A sealed room is a started one; an unstarted room admits again.
        match room.phase() {
            Phase::WaitingForPlayers => {
                assert!(!room.registry().is_sealed());
                let (tx3, _rx3) = outbox();
                room.join(tx3).unwrap();
                assert_eq!(room.phase(), Phase::InProgress);
            }
            Phase::InProgress => panic!("match running with one seat empty"),
            Phase::Finished => assert!(room.registry().is_empty()),
        }
    }
}
