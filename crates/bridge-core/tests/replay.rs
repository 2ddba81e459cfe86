use bridge_core::game::hand_state::HandStateMachine;
use bridge_core::game::serialization::HandSnapshot;
use bridge_core::model::board::Board;
use bridge_core::model::call::Call;
use bridge_core::model::ids::HandId;
use bridge_core::store::{Action, EventStore, LoggedAction, MemoryStore};

const TOURNAMENT: &str = "replay-test";
const SECRET: &str = "replay-secret";

/// Dealer opens 1NT, everyone passes, then every seat plays its first legal card.
fn play_logged(board_number: u32, store: &MemoryStore, hand_id: HandId) -> HandStateMachine {
    let mut hand = HandStateMachine::new(Board::generate(board_number, TOURNAMENT, SECRET));
    let log = |hand: &HandStateMachine, seat, action| {
        store
            .append(
                hand_id,
                &LoggedAction {
                    sequence: hand.next_sequence(),
                    seat,
                    action,
                },
            )
            .unwrap();
    };

    let mut opened = false;
    while let Some(seat) = hand.allowed_caller() {
        let call = if opened { Call::Pass } else { "1NT".parse().unwrap() };
        opened = true;
        log(&hand, seat, Action::Call(call));
        hand.apply_call(seat, call).unwrap();
    }
    while let Some(seat) = hand.allowed_player() {
        let actor = hand.controller_of(seat);
        let card = hand.current_legal_cards(seat)[0];
        log(&hand, actor, Action::Play(card));
        hand.apply_play(actor, card).unwrap();
    }
    hand
}

#[test]
fn replaying_the_stored_log_reproduces_the_hand() {
    let store = MemoryStore::new();
    for number in 1..=4 {
        let hand_id = HandId(number as u64);
        let live = play_logged(number, &store, hand_id);
        assert!(live.is_complete());

        let log = store.load(hand_id).unwrap();
        assert_eq!(log.len(), 4 + 52);
        let replayed =
            HandStateMachine::from_log(Board::generate(number, TOURNAMENT, SECRET), &log).unwrap();
        assert_eq!(replayed.calls(), live.calls());
        assert_eq!(replayed.plays(), live.plays());
        assert_eq!(replayed.tricks_won(), live.tricks_won());
        assert_eq!(replayed.final_score(), live.final_score());
    }
}

#[test]
fn every_prefix_of_the_log_replays() {
    let store = MemoryStore::new();
    let live = play_logged(7, &store, HandId(7));
    let log = store.load(HandId(7)).unwrap();
    for cut in 0..=log.len() {
        let partial =
            HandStateMachine::from_log(Board::generate(7, TOURNAMENT, SECRET), &log[..cut]).unwrap();
        assert_eq!(partial.next_sequence(), cut as u64);
        assert_eq!(partial.is_complete(), cut == log.len());
    }
    assert!(live.is_complete());
}

#[test]
fn tampered_logs_are_rejected() {
    let store = MemoryStore::new();
    play_logged(2, &store, HandId(2));
    let mut log = store.load(HandId(2)).unwrap();
    log.swap(4, 5);
    let board = Board::generate(2, TOURNAMENT, SECRET);
    assert!(HandStateMachine::from_log(board, &log).is_err());
}

#[test]
fn snapshots_survive_a_json_round_trip_mid_play() {
    let store = MemoryStore::new();
    let live = play_logged(3, &store, HandId(3));
    let halfway = HandStateMachine::from_sequences(
        Board::generate(3, TOURNAMENT, SECRET),
        live.calls(),
        &live.plays()[..20],
    )
    .unwrap();

    let json = HandSnapshot::to_json(TOURNAMENT, &halfway).unwrap();
    let restored = HandSnapshot::from_json(&json).unwrap().restore(SECRET).unwrap();
    assert_eq!(restored.plays(), halfway.plays());
    assert_eq!(restored.allowed_player(), halfway.allowed_player());
    assert_eq!(restored.current_trick(), halfway.current_trick());
}
