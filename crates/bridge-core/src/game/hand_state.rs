use crate::model::board::Board;
use crate::model::call::Call;
use crate::model::card::Card;
use crate::model::contract::Contract;
use crate::model::holding::Holding;
use crate::model::seat::{Seat, Side};
use crate::model::suit::Suit;
use crate::model::trick::{Play, Trick};
use crate::rules::auction::{Auction, IllegalCall};
use crate::rules::play::{IllegalCard, check_card, legal_cards};
use crate::rules::score::contract_score;
use crate::store::{Action, LoggedAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use crate::rules::auction::AuctionState;

pub const TRICKS_PER_HAND: usize = 13;
const CARDS_PER_HAND: usize = TRICKS_PER_HAND * 4;

/// One hand of one board at one table. Only the two action logs are stored;
/// every query replays them against the rules.
#[derive(Debug, Clone)]
pub struct HandStateMachine {
    board: Board,
    calls: Vec<Call>,
    plays: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickView {
    pub number: usize,
    pub leader: Seat,
    pub plays: Vec<Play>,
    pub winner: Option<Seat>,
}

/// Final result of a hand. Exactly one of `ns_score`/`ew_score` is non-zero
/// unless the hand scored nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandScore {
    pub contract: Option<Contract>,
    pub declarer_tricks: u8,
    pub ns_score: i32,
    pub ew_score: i32,
}

impl HandScore {
    pub const PASSED_OUT: HandScore = HandScore {
        contract: None,
        declarer_tricks: 0,
        ns_score: 0,
        ew_score: 0,
    };

    fn for_contract(contract: Contract, declarer_tricks: u8, vulnerable: bool) -> Self {
        let declarer_score = contract_score(&contract, declarer_tricks, vulnerable);
        let (gained, lost) = if declarer_score >= 0 {
            (declarer_score, 0)
        } else {
            (0, -declarer_score)
        };
        let (ns_score, ew_score) = match contract.declarer.side() {
            Side::NorthSouth => (gained, lost),
            Side::EastWest => (lost, gained),
        };
        Self {
            contract: Some(contract),
            declarer_tricks,
            ns_score,
            ew_score,
        }
    }

    /// Signed result from `side`'s point of view.
    pub fn net_for(&self, side: Side) -> i32 {
        match side {
            Side::NorthSouth => self.ns_score - self.ew_score,
            Side::EastWest => self.ew_score - self.ns_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HandEvent {
    CallMade { seat: Seat, call: Call },
    ContractSettled { contract: Contract, opening_leader: Seat },
    PassedOut,
    CardPlayed { seat: Seat, card: Card },
    TrickCompleted { number: usize, winner: Seat },
    HandCompleted { score: HandScore },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("hand is already complete")]
    HandComplete,
    #[error("auction is closed")]
    AuctionClosed,
    #[error("{expected} is due to call, not {actual}")]
    OutOfTurn { expected: Seat, actual: Seat },
    #[error("{seat} may not call {call}: {reason}")]
    Illegal {
        seat: Seat,
        call: Call,
        reason: IllegalCall,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("no card may be played yet")]
    NoPlayAllowed,
    #[error("hand is already complete")]
    HandComplete,
    #[error("{expected} is due to play, not {actual}")]
    OutOfTurn { expected: Seat, actual: Seat },
    #[error("{seat} does not hold {card}")]
    CardNotHeld { seat: Seat, card: Card },
    #[error("{seat} must follow {suit}")]
    MustFollowSuit { seat: Seat, suit: Suit },
}

/// A logged action that fails validation during replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("action {sequence} is out of sequence (expected {expected})")]
    Sequence { sequence: u64, expected: u64 },
    #[error("logged call {sequence} rejected: {source}")]
    Call { sequence: u64, source: AuctionError },
    #[error("logged play {sequence} rejected: {source}")]
    Play { sequence: u64, source: PlayError },
}

struct Replay {
    remaining: [Holding; 4],
    completed: Vec<(Trick, Seat)>,
    current: Option<Trick>,
}

impl HandStateMachine {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            calls: Vec::new(),
            plays: Vec::new(),
        }
    }

    /// Rebuilds a hand from its durable log, re-validating every action.
    pub fn from_log(board: Board, log: &[LoggedAction]) -> Result<Self, ReplayError> {
        let mut hand = Self::new(board);
        for (index, entry) in log.iter().enumerate() {
            let expected = index as u64;
            if entry.sequence != expected {
                return Err(ReplayError::Sequence {
                    sequence: entry.sequence,
                    expected,
                });
            }
            match entry.action {
                Action::Call(call) => {
                    hand.apply_call(entry.seat, call)
                        .map_err(|source| ReplayError::Call {
                            sequence: entry.sequence,
                            source,
                        })?;
                }
                Action::Play(card) => {
                    hand.apply_play(entry.seat, card)
                        .map_err(|source| ReplayError::Play {
                            sequence: entry.sequence,
                            source,
                        })?;
                }
            }
        }
        Ok(hand)
    }

    /// Rebuilds a hand from bare call and play sequences, deriving each actor
    /// from the turn order.
    pub fn from_sequences(
        board: Board,
        calls: &[Call],
        plays: &[Card],
    ) -> Result<Self, ReplayError> {
        let mut hand = Self::new(board);
        for &call in calls {
            let sequence = hand.next_sequence();
            let actor = hand.allowed_caller().ok_or(ReplayError::Call {
                sequence,
                source: AuctionError::AuctionClosed,
            })?;
            hand.apply_call(actor, call)
                .map_err(|source| ReplayError::Call { sequence, source })?;
        }
        for &card in plays {
            let sequence = hand.next_sequence();
            let actor = hand
                .allowed_player()
                .map(|seat| hand.controller_of(seat))
                .ok_or(ReplayError::Play {
                    sequence,
                    source: PlayError::NoPlayAllowed,
                })?;
            hand.apply_play(actor, card)
                .map_err(|source| ReplayError::Play { sequence, source })?;
        }
        Ok(hand)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn plays(&self) -> &[Card] {
        &self.plays
    }

    /// Sequence number the next logged action will carry.
    pub fn next_sequence(&self) -> u64 {
        (self.calls.len() + self.plays.len()) as u64
    }

    fn auction(&self) -> Auction<'_> {
        Auction::new(self.board.dealer, &self.calls)
    }

    pub fn auction_state(&self) -> AuctionState {
        self.auction().state()
    }

    pub fn contract(&self) -> Option<Contract> {
        self.auction_state().contract()
    }

    pub fn declarer(&self) -> Option<Seat> {
        self.contract().map(|c| c.declarer)
    }

    pub fn dummy(&self) -> Option<Seat> {
        self.contract().map(|c| c.dummy())
    }

    pub fn opening_leader(&self) -> Option<Seat> {
        self.contract().map(|c| c.opening_leader())
    }

    pub fn is_complete(&self) -> bool {
        match self.auction_state() {
            AuctionState::PassedOut => true,
            AuctionState::Contract(_) => self.plays.len() == CARDS_PER_HAND,
            AuctionState::Incomplete => false,
        }
    }

    pub fn allowed_caller(&self) -> Option<Seat> {
        self.auction().next_to_call()
    }

    pub fn legal_calls(&self) -> Vec<Call> {
        self.auction().legal_calls()
    }

    /// Seat whose card is played next. When dummy is on play this is dummy's
    /// seat; the card is supplied by [`Self::controller_of`] that seat.
    pub fn allowed_player(&self) -> Option<Seat> {
        if self.is_complete() {
            return None;
        }
        self.replay()?.current.and_then(|trick| trick.expected_seat())
    }

    /// Seat that chooses the cards for `seat`: declarer for dummy, otherwise
    /// the seat itself.
    pub fn controller_of(&self, seat: Seat) -> Seat {
        match self.contract() {
            Some(contract) if contract.dummy() == seat => contract.declarer,
            _ => seat,
        }
    }

    /// The trick in progress. Right after a trick closes, the closed trick is
    /// returned with its winner until the next card is led.
    pub fn current_trick(&self) -> Option<TrickView> {
        let replay = self.replay()?;
        let number = replay.completed.len();
        if let Some(trick) = replay.current.filter(|t| !t.plays().is_empty()) {
            return Some(view(number + 1, &trick, None));
        }
        replay
            .completed
            .last()
            .map(|(trick, winner)| view(number, trick, Some(*winner)))
    }

    /// Every completed trick, in order.
    pub fn tricks(&self) -> Vec<TrickView> {
        self.replay()
            .map(|replay| {
                replay
                    .completed
                    .iter()
                    .enumerate()
                    .map(|(index, (trick, winner))| view(index + 1, trick, Some(*winner)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tricks taken so far as `(north_south, east_west)`.
    pub fn tricks_won(&self) -> (u8, u8) {
        let mut ns = 0;
        let mut ew = 0;
        if let Some(replay) = self.replay() {
            for (_, winner) in &replay.completed {
                match winner.side() {
                    Side::NorthSouth => ns += 1,
                    Side::EastWest => ew += 1,
                }
            }
        }
        (ns, ew)
    }

    /// Cards `seat` may play now; empty unless `seat` is on play.
    pub fn current_legal_cards(&self, seat: Seat) -> Vec<Card> {
        if self.allowed_player() != Some(seat) {
            return Vec::new();
        }
        let Some(replay) = self.replay() else {
            return Vec::new();
        };
        let lead = replay.current.as_ref().and_then(Trick::lead_suit);
        legal_cards(&replay.remaining[seat.index()], lead)
    }

    /// Cards not yet played, per seat.
    pub fn remaining(&self, seat: Seat) -> Holding {
        match self.replay() {
            Some(replay) => replay.remaining[seat.index()].clone(),
            None => self.board.holding(seat).clone(),
        }
    }

    /// What `viewer` may see: their own remaining cards, dummy's remaining
    /// cards once the opening lead is down, and the whole deal once the hand
    /// is complete.
    pub fn visible_holdings(&self, viewer: Seat) -> BTreeMap<Seat, Holding> {
        if self.is_complete() {
            return Seat::LOOP
                .iter()
                .map(|seat| (*seat, self.board.holding(*seat).clone()))
                .collect();
        }
        let mut visible = BTreeMap::new();
        visible.insert(viewer, self.remaining(viewer));
        if let Some(dummy) = self.dummy().filter(|_| !self.plays.is_empty()) {
            visible.insert(dummy, self.remaining(dummy));
        }
        visible
    }

    pub fn final_score(&self) -> Option<HandScore> {
        match self.auction_state() {
            AuctionState::PassedOut => Some(HandScore::PASSED_OUT),
            AuctionState::Contract(contract) if self.is_complete() => {
                let (ns, ew) = self.tricks_won();
                let declarer_tricks = match contract.declarer.side() {
                    Side::NorthSouth => ns,
                    Side::EastWest => ew,
                };
                let vulnerable = self
                    .board
                    .vulnerability
                    .is_vulnerable(contract.declarer.side());
                Some(HandScore::for_contract(contract, declarer_tricks, vulnerable))
            }
            _ => None,
        }
    }

    pub fn validate_call(&self, actor: Seat, call: Call) -> Result<(), AuctionError> {
        if self.is_complete() {
            return Err(AuctionError::HandComplete);
        }
        let auction = self.auction();
        let expected = auction.next_to_call().ok_or(AuctionError::AuctionClosed)?;
        if expected != actor {
            return Err(AuctionError::OutOfTurn {
                expected,
                actual: actor,
            });
        }
        auction.check(call).map_err(|reason| AuctionError::Illegal {
            seat: actor,
            call,
            reason,
        })
    }

    pub fn apply_call(&mut self, actor: Seat, call: Call) -> Result<Vec<HandEvent>, AuctionError> {
        self.validate_call(actor, call)?;
        self.calls.push(call);

        let mut events = vec![HandEvent::CallMade { seat: actor, call }];
        match self.auction_state() {
            AuctionState::Incomplete => {}
            AuctionState::Contract(contract) => events.push(HandEvent::ContractSettled {
                contract,
                opening_leader: contract.opening_leader(),
            }),
            AuctionState::PassedOut => {
                events.push(HandEvent::PassedOut);
                events.push(HandEvent::HandCompleted {
                    score: HandScore::PASSED_OUT,
                });
            }
        }
        Ok(events)
    }

    /// Checks a card from `actor`, returning the seat it would be played from.
    pub fn validate_play(&self, actor: Seat, card: Card) -> Result<Seat, PlayError> {
        if self.is_complete() {
            return Err(PlayError::HandComplete);
        }
        let replay = self.replay().ok_or(PlayError::NoPlayAllowed)?;
        let trick = replay.current.as_ref().ok_or(PlayError::NoPlayAllowed)?;
        let seat = trick.expected_seat().ok_or(PlayError::NoPlayAllowed)?;
        let controller = self.controller_of(seat);
        if controller != actor {
            return Err(PlayError::OutOfTurn {
                expected: controller,
                actual: actor,
            });
        }
        check_card(&replay.remaining[seat.index()], trick.lead_suit(), card).map_err(
            |reason| match reason {
                IllegalCard::NotHeld(card) => PlayError::CardNotHeld { seat, card },
                IllegalCard::MustFollowSuit(suit) => PlayError::MustFollowSuit { seat, suit },
            },
        )?;
        Ok(seat)
    }

    pub fn apply_play(&mut self, actor: Seat, card: Card) -> Result<Vec<HandEvent>, PlayError> {
        let seat = self.validate_play(actor, card)?;
        self.plays.push(card);

        let mut events = vec![HandEvent::CardPlayed { seat, card }];
        if self.plays.len() % 4 == 0 {
            if let Some(trick) = self.current_trick() {
                if let Some(winner) = trick.winner {
                    events.push(HandEvent::TrickCompleted {
                        number: trick.number,
                        winner,
                    });
                }
            }
        }
        if let Some(score) = self.final_score() {
            events.push(HandEvent::HandCompleted { score });
        }
        Ok(events)
    }

    /// Replays the play log. `None` until a contract exists.
    fn replay(&self) -> Option<Replay> {
        let contract = self.contract()?;
        let trump = contract.strain.trump();
        let mut remaining = self.board.holdings().clone();
        let mut completed = Vec::with_capacity(TRICKS_PER_HAND);
        let mut trick = Trick::new(contract.opening_leader());

        for &card in &self.plays {
            let Some(seat) = trick.expected_seat() else {
                break;
            };
            remaining[seat.index()].remove(card);
            if trick.play(seat, card).is_err() {
                break;
            }
            if trick.is_complete() {
                let winner = trick.winner(trump).unwrap_or(trick.leader());
                let closed = std::mem::replace(&mut trick, Trick::new(winner));
                completed.push((closed, winner));
            }
        }

        let current = (completed.len() < TRICKS_PER_HAND).then_some(trick);
        Some(Replay {
            remaining,
            completed,
            current,
        })
    }
}

fn view(number: usize, trick: &Trick, winner: Option<Seat>) -> TrickView {
    TrickView {
        number,
        leader: trick.leader(),
        plays: trick.plays().to_vec(),
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::call::Strain;
    use crate::model::contract::Doubled;
    use crate::model::rank::Rank;

    /// North holds every spade, East every heart, South every diamond, West
    /// every club.
    fn suited_board(number: u32) -> Board {
        let holding = |suit: Suit| {
            Holding::with_cards(Rank::ORDERED.iter().map(|r| Card::new(*r, suit)).collect())
        };
        Board::from_holdings(
            number,
            [
                holding(Suit::Spades),
                holding(Suit::Hearts),
                holding(Suit::Diamonds),
                holding(Suit::Clubs),
            ],
        )
    }

    fn call(text: &str) -> Call {
        text.parse().unwrap()
    }

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    /// Board 1: North deals. North opens 1S, everyone passes.
    fn one_spade_by_north() -> HandStateMachine {
        let mut hand = HandStateMachine::new(suited_board(1));
        for (seat, text) in [
            (Seat::North, "1S"),
            (Seat::East, "P"),
            (Seat::South, "P"),
            (Seat::West, "P"),
        ] {
            hand.apply_call(seat, call(text)).unwrap();
        }
        hand
    }

    fn play_out(hand: &mut HandStateMachine) -> Vec<HandEvent> {
        let mut events = Vec::new();
        while let Some(seat) = hand.allowed_player() {
            let card = hand.current_legal_cards(seat)[0];
            let actor = hand.controller_of(seat);
            events.extend(hand.apply_play(actor, card).unwrap());
        }
        events
    }

    #[test]
    fn calls_rotate_from_the_dealer() {
        let mut hand = HandStateMachine::new(suited_board(2));
        assert_eq!(hand.allowed_caller(), Some(Seat::East));
        assert_eq!(
            hand.apply_call(Seat::North, Call::Pass),
            Err(AuctionError::OutOfTurn {
                expected: Seat::East,
                actual: Seat::North
            })
        );
        assert!(hand.calls().is_empty());
        hand.apply_call(Seat::East, call("1H")).unwrap();
        assert_eq!(hand.allowed_caller(), Some(Seat::South));
    }

    #[test]
    fn illegal_calls_leave_the_log_untouched() {
        let mut hand = HandStateMachine::new(suited_board(1));
        hand.apply_call(Seat::North, call("2S")).unwrap();
        let err = hand.apply_call(Seat::East, call("1NT")).unwrap_err();
        assert!(matches!(
            err,
            AuctionError::Illegal {
                reason: IllegalCall::InsufficientBid { .. },
                ..
            }
        ));
        assert_eq!(
            hand.apply_call(Seat::East, Call::Redouble),
            Err(AuctionError::Illegal {
                seat: Seat::East,
                call: Call::Redouble,
                reason: IllegalCall::RedoubleNotAllowed
            })
        );
        assert_eq!(hand.calls().len(), 1);
    }

    #[test]
    fn settling_the_auction_emits_contract_and_leader() {
        let mut hand = HandStateMachine::new(suited_board(1));
        hand.apply_call(Seat::North, call("1S")).unwrap();
        hand.apply_call(Seat::East, Call::Double).unwrap();
        hand.apply_call(Seat::South, Call::Pass).unwrap();
        hand.apply_call(Seat::West, Call::Pass).unwrap();
        let events = hand.apply_call(Seat::North, Call::Pass).unwrap();
        let contract = Contract {
            declarer: Seat::North,
            level: 1,
            strain: Strain::Spades,
            doubled: Doubled::Doubled,
        };
        assert_eq!(
            events,
            vec![
                HandEvent::CallMade {
                    seat: Seat::North,
                    call: Call::Pass
                },
                HandEvent::ContractSettled {
                    contract,
                    opening_leader: Seat::East
                }
            ]
        );
        assert_eq!(hand.allowed_caller(), None);
        assert_eq!(hand.allowed_player(), Some(Seat::East));
        assert_eq!(
            hand.apply_call(Seat::East, Call::Pass),
            Err(AuctionError::AuctionClosed)
        );
    }

    #[test]
    fn four_passes_complete_the_hand() {
        let mut hand = HandStateMachine::new(suited_board(1));
        for seat in [Seat::North, Seat::East, Seat::South] {
            hand.apply_call(seat, Call::Pass).unwrap();
        }
        let events = hand.apply_call(Seat::West, Call::Pass).unwrap();
        assert!(events.contains(&HandEvent::PassedOut));
        assert!(hand.is_complete());
        assert_eq!(hand.final_score(), Some(HandScore::PASSED_OUT));
        assert_eq!(hand.allowed_caller(), None);
        assert_eq!(hand.allowed_player(), None);
        assert_eq!(
            hand.apply_call(Seat::North, Call::Pass),
            Err(AuctionError::HandComplete)
        );
        assert_eq!(
            hand.apply_play(Seat::North, card("AS")),
            Err(PlayError::HandComplete)
        );
    }

    #[test]
    fn no_play_before_the_contract() {
        let hand = HandStateMachine::new(suited_board(1));
        assert_eq!(
            hand.validate_play(Seat::North, card("AS")),
            Err(PlayError::NoPlayAllowed)
        );
    }

    #[test]
    fn declarer_plays_for_dummy() {
        let mut hand = one_spade_by_north();
        // South is dummy; East leads.
        assert_eq!(hand.dummy(), Some(Seat::South));
        assert_eq!(hand.controller_of(Seat::South), Seat::North);
        hand.apply_play(Seat::East, card("AH")).unwrap();
        assert_eq!(hand.allowed_player(), Some(Seat::South));
        assert_eq!(
            hand.apply_play(Seat::South, card("2D")),
            Err(PlayError::OutOfTurn {
                expected: Seat::North,
                actual: Seat::South
            })
        );
        let events = hand.apply_play(Seat::North, card("2D")).unwrap();
        assert_eq!(
            events,
            vec![HandEvent::CardPlayed {
                seat: Seat::South,
                card: card("2D")
            }]
        );
    }

    #[test]
    fn cards_must_be_held_and_follow_suit() {
        // Swap North's 2S for East's 2H so North holds a single heart.
        let mut holdings = suited_board(1).holdings().clone();
        holdings[Seat::East.index()].remove(card("2H"));
        holdings[Seat::East.index()].add(card("2S"));
        holdings[Seat::North.index()].remove(card("2S"));
        holdings[Seat::North.index()].add(card("2H"));
        let mut hand = HandStateMachine::new(Board::from_holdings(1, holdings));
        for (seat, text) in [
            (Seat::North, "1S"),
            (Seat::East, "P"),
            (Seat::South, "P"),
            (Seat::West, "P"),
        ] {
            hand.apply_call(seat, call(text)).unwrap();
        }
        hand.apply_play(Seat::East, card("AH")).unwrap();
        hand.apply_play(Seat::North, card("2D")).unwrap();
        assert_eq!(
            hand.apply_play(Seat::West, card("KH")),
            Err(PlayError::CardNotHeld {
                seat: Seat::West,
                card: card("KH")
            })
        );
        hand.apply_play(Seat::West, card("2C")).unwrap();
        assert_eq!(
            hand.apply_play(Seat::North, card("AS")),
            Err(PlayError::MustFollowSuit {
                seat: Seat::North,
                suit: Suit::Hearts
            })
        );
        assert_eq!(hand.current_legal_cards(Seat::North), vec![card("2H")]);
        assert_eq!(hand.plays().len(), 3);
    }

    #[test]
    fn completed_trick_stays_visible_until_next_lead() {
        let mut hand = one_spade_by_north();
        for (actor, text) in [
            (Seat::East, "AH"),
            (Seat::North, "2D"),
            (Seat::West, "2C"),
        ] {
            hand.apply_play(actor, card(text)).unwrap();
        }
        let events = hand.apply_play(Seat::North, card("2S")).unwrap();
        assert!(events.contains(&HandEvent::TrickCompleted {
            number: 1,
            winner: Seat::North
        }));
        let trick = hand.current_trick().unwrap();
        assert_eq!(trick.number, 1);
        assert_eq!(trick.winner, Some(Seat::North));
        assert_eq!(trick.plays.len(), 4);
        assert_eq!(hand.allowed_player(), Some(Seat::North));

        hand.apply_play(Seat::North, card("AS")).unwrap();
        let trick = hand.current_trick().unwrap();
        assert_eq!(trick.number, 2);
        assert_eq!(trick.winner, None);
        assert_eq!(trick.plays.len(), 1);
        assert_eq!(hand.tricks_won(), (1, 0));
    }

    #[test]
    fn playing_out_produces_one_completion_and_a_zero_side_score() {
        let mut hand = one_spade_by_north();
        let events = play_out(&mut hand);
        let completions: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, HandEvent::HandCompleted { .. }))
            .collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, HandEvent::TrickCompleted { .. }))
                .count(),
            13
        );
        assert!(hand.is_complete());
        let (ns, ew) = hand.tricks_won();
        assert_eq!(ns + ew, 13);

        let score = hand.final_score().unwrap();
        assert_eq!(score.declarer_tricks, ns);
        assert!(score.ns_score == 0 || score.ew_score == 0);
        assert_eq!(hand.tricks().len(), 13);
        assert_eq!(
            hand.apply_play(Seat::North, card("AS")),
            Err(PlayError::HandComplete)
        );
    }

    #[test]
    fn dummy_is_revealed_after_the_opening_lead() {
        let mut hand = one_spade_by_north();
        let before = hand.visible_holdings(Seat::East);
        assert_eq!(before.len(), 1);
        assert!(before.contains_key(&Seat::East));

        hand.apply_play(Seat::East, card("AH")).unwrap();
        let after = hand.visible_holdings(Seat::West);
        assert_eq!(after.len(), 2);
        assert_eq!(after[&Seat::South].len(), 13);
        assert_eq!(hand.visible_holdings(Seat::East)[&Seat::East].len(), 12);

        play_out(&mut hand);
        assert_eq!(hand.visible_holdings(Seat::West).len(), 4);
    }

    #[test]
    fn replaying_a_log_reproduces_the_hand() {
        let mut hand = one_spade_by_north();
        play_out(&mut hand);

        let mut log = Vec::new();
        let mut replayed = HandStateMachine::new(hand.board().clone());
        for &c in hand.calls() {
            let seat = replayed.allowed_caller().unwrap();
            log.push(LoggedAction {
                sequence: replayed.next_sequence(),
                seat,
                action: Action::Call(c),
            });
            replayed.apply_call(seat, c).unwrap();
        }
        for &p in hand.plays() {
            let seat = replayed.controller_of(replayed.allowed_player().unwrap());
            log.push(LoggedAction {
                sequence: replayed.next_sequence(),
                seat,
                action: Action::Play(p),
            });
            replayed.apply_play(seat, p).unwrap();
        }

        let rebuilt = HandStateMachine::from_log(hand.board().clone(), &log).unwrap();
        assert_eq!(rebuilt.final_score(), hand.final_score());
        assert_eq!(rebuilt.tricks(), hand.tricks());
        assert_eq!(rebuilt.current_trick(), hand.current_trick());

        let again = HandStateMachine::from_log(hand.board().clone(), &log).unwrap();
        assert_eq!(again.tricks_won(), rebuilt.tricks_won());
    }

    #[test]
    fn corrupt_logs_are_rejected() {
        let log = vec![
            LoggedAction {
                sequence: 0,
                seat: Seat::North,
                action: Action::Call(call("1S")),
            },
            LoggedAction {
                sequence: 1,
                seat: Seat::South,
                action: Action::Call(Call::Pass),
            },
        ];
        assert!(matches!(
            HandStateMachine::from_log(suited_board(1), &log),
            Err(ReplayError::Call { sequence: 1, .. })
        ));

        let gap = vec![LoggedAction {
            sequence: 3,
            seat: Seat::North,
            action: Action::Call(Call::Pass),
        }];
        assert_eq!(
            HandStateMachine::from_log(suited_board(1), &gap).unwrap_err(),
            ReplayError::Sequence {
                sequence: 3,
                expected: 0
            }
        );
    }

    #[test]
    fn failed_contract_scores_for_the_defenders() {
        // 7NT by North with only spades: East wins every heart trick it leads.
        let mut hand = HandStateMachine::new(suited_board(1));
        for (seat, text) in [
            (Seat::North, "7NT"),
            (Seat::East, "P"),
            (Seat::South, "P"),
            (Seat::West, "P"),
        ] {
            hand.apply_call(seat, call(text)).unwrap();
        }
        play_out(&mut hand);
        let score = hand.final_score().unwrap();
        assert_eq!(score.declarer_tricks, 0);
        assert_eq!(score.ns_score, 0);
        assert_eq!(score.ew_score, 650);
        assert_eq!(score.net_for(Side::NorthSouth), -650);
    }

    type Observed = (Option<Seat>, Option<Seat>, Option<TrickView>, usize, usize);

    /// Queries `hand` twice and checks that nothing moved in between.
    fn observe_twice(hand: &HandStateMachine) -> Observed {
        let look = |hand: &HandStateMachine| {
            (
                hand.allowed_caller(),
                hand.allowed_player(),
                hand.current_trick(),
                hand.calls().len(),
                hand.plays().len(),
            )
        };
        let first = look(hand);
        assert_eq!(look(hand), first);
        first
    }

    fn play_next(hand: &mut HandStateMachine) {
        let seat = hand.allowed_player().unwrap();
        let card = hand.current_legal_cards(seat)[0];
        let actor = hand.controller_of(seat);
        hand.apply_play(actor, card).unwrap();
    }

    #[test]
    fn queries_repeat_identically_at_every_stage() {
        let mut hand = HandStateMachine::new(suited_board(1));
        hand.apply_call(Seat::North, call("1S")).unwrap();
        hand.apply_call(Seat::East, call("P")).unwrap();
        let (caller, player, trick, calls, plays) = observe_twice(&hand);
        assert_eq!((caller, player, trick, calls, plays), (Some(Seat::South), None, None, 2, 0));

        hand.apply_call(Seat::South, call("P")).unwrap();
        hand.apply_call(Seat::West, call("P")).unwrap();
        play_next(&mut hand);
        play_next(&mut hand);
        let (caller, player, trick, _, plays) = observe_twice(&hand);
        assert_eq!(caller, None);
        assert_eq!(player, Some(Seat::West));
        assert_eq!(trick.map(|t| t.plays.len()), Some(2));
        assert_eq!(plays, 2);

        play_next(&mut hand);
        play_next(&mut hand);
        let (_, player, trick, calls, plays) = observe_twice(&hand);
        assert!(player.is_some());
        assert!(trick.and_then(|t| t.winner).is_some());
        assert_eq!((calls, plays), (4, 4));

        play_out(&mut hand);
        let (caller, player, _, calls, plays) = observe_twice(&hand);
        assert_eq!((caller, player), (None, None));
        assert_eq!((calls, plays), (4, 52));
        assert!(hand.is_complete());
    }
}
