//! Thread-safe service in front of a [`Tournament`] and its hands.
//!
//! Each hand has its own lock, so actions at different tables proceed in
//! parallel while actions on one hand are applied strictly in order. An
//! action is validated, appended to the [`EventStore`], and only then
//! applied to the in-memory state. The hand lock is always released before
//! the tournament lock is taken.

use bridge_core::game::HandObserver;
use bridge_core::game::hand_state::{
    AuctionError, HandEvent, HandScore, HandStateMachine, PlayError, ReplayError, TrickView,
};
use bridge_core::model::call::{Call, ParseCallError};
use bridge_core::model::card::{Card, ParseCardError};
use bridge_core::model::holding::Holding;
use bridge_core::model::ids::{HandId, Pair, PairId, PlayerId};
use bridge_core::model::seat::Seat;
use bridge_core::scoring::{RawBoardResult, Standings};
use bridge_core::store::{Action, EventStore, LoggedAction, StoreError};
use bridge_core::tournament::{Advance, HandAssignment, LifecycleError, Phase, Tournament};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Level, event};

/// Events produced by one accepted action.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub hand: HandId,
    pub events: Vec<HandEvent>,
    /// Set when the action completed the hand.
    pub advance: Option<Advance>,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Auction(#[from] AuctionError),
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error("{0} is not an active hand")]
    UnknownHand(HandId),
    #[error("{player} is not seated at {hand}")]
    NotSeated { hand: HandId, player: PlayerId },
    #[error(transparent)]
    ParseCall(#[from] ParseCallError),
    #[error(transparent)]
    ParseCard(#[from] ParseCardError),
    #[error("event store failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("stored log for {hand} does not replay: {source}")]
    Replay {
        hand: HandId,
        #[source]
        source: ReplayError,
    },
    #[error("board {0} is not part of the movement")]
    MissingBoard(u32),
}

struct HandDesk {
    assignment: HandAssignment,
    state: HandStateMachine,
}

pub struct Director {
    tournament: Mutex<Tournament>,
    desks: RwLock<HashMap<HandId, Arc<Mutex<HandDesk>>>>,
    store: Arc<dyn EventStore>,
    observers: Vec<Arc<dyn HandObserver>>,
}

impl Director {
    pub fn new(tournament: Tournament, store: Arc<dyn EventStore>) -> Self {
        Self {
            tournament: Mutex::new(tournament),
            desks: RwLock::new(HashMap::new()),
            store,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn HandObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn sign_up(&self, pair: Pair) -> Result<(), LifecycleError> {
        self.tournament.lock().sign_up(pair)
    }

    pub fn withdraw(&self, pair: &PairId) -> Result<Pair, LifecycleError> {
        self.tournament.lock().withdraw(pair)
    }

    /// Starts play and opens a desk for every first-round hand.
    pub fn close_signup(&self) -> Result<Vec<HandAssignment>, ActionError> {
        let tournament = &mut *self.tournament.lock();
        let assignments = tournament.close_signup()?;
        self.open_desks(tournament, &assignments)?;
        Ok(assignments)
    }

    pub fn apply_call(
        &self,
        hand: HandId,
        actor: &PlayerId,
        serialized_call: &str,
    ) -> Result<Ack, ActionError> {
        let call: Call = serialized_call.parse()?;
        self.act(hand, actor, Action::Call(call))
    }

    pub fn apply_play(
        &self,
        hand: HandId,
        actor: &PlayerId,
        serialized_card: &str,
    ) -> Result<Ack, ActionError> {
        let card: Card = serialized_card.parse()?;
        self.act(hand, actor, Action::Play(card))
    }

    pub fn allowed_caller(&self, hand: HandId) -> Result<Option<Seat>, ActionError> {
        self.with_hand(hand, HandStateMachine::allowed_caller)
    }

    pub fn allowed_player(&self, hand: HandId) -> Result<Option<Seat>, ActionError> {
        self.with_hand(hand, HandStateMachine::allowed_player)
    }

    pub fn current_trick(&self, hand: HandId) -> Result<Option<TrickView>, ActionError> {
        self.with_hand(hand, HandStateMachine::current_trick)
    }

    pub fn is_complete(&self, hand: HandId) -> Result<bool, ActionError> {
        self.with_hand(hand, HandStateMachine::is_complete)
    }

    pub fn final_score(&self, hand: HandId) -> Result<Option<HandScore>, ActionError> {
        self.with_hand(hand, HandStateMachine::final_score)
    }

    /// Holdings `player` may currently see at `hand`.
    pub fn visible_holdings(
        &self,
        hand: HandId,
        player: &PlayerId,
    ) -> Result<BTreeMap<Seat, Holding>, ActionError> {
        let desk = self.desk(hand)?;
        let desk = desk.lock();
        let seat = seat_at(&desk.assignment, player)?;
        Ok(desk.state.visible_holdings(seat))
    }

    /// Runs `f` against the current state of `hand` under its lock.
    pub fn with_hand<R>(
        &self,
        hand: HandId,
        f: impl FnOnce(&HandStateMachine) -> R,
    ) -> Result<R, ActionError> {
        let desk = self.desk(hand)?;
        let desk = desk.lock();
        Ok(f(&desk.state))
    }

    pub fn assignment(&self, hand: HandId) -> Result<HandAssignment, ActionError> {
        let desk = self.desk(hand)?;
        let assignment = desk.lock().assignment.clone();
        Ok(assignment)
    }

    pub fn phase(&self) -> Phase {
        self.tournament.lock().phase()
    }

    pub fn active_hands(&self) -> Vec<HandAssignment> {
        self.tournament
            .lock()
            .active_hands()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Hands whose result has been recorded, in hand order.
    pub fn recorded_hands(&self) -> Vec<HandAssignment> {
        self.tournament
            .lock()
            .recorded_hands()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn results(&self) -> Vec<RawBoardResult> {
        self.tournament.lock().results().cloned().collect()
    }

    pub fn standings(&self) -> Option<Standings> {
        self.tournament.lock().standings().cloned()
    }

    pub fn tournament_id(&self) -> String {
        self.tournament.lock().id().to_string()
    }

    /// Desk for `hand`, opened on demand when the tournament knows the hand
    /// but an earlier failure left it without one.
    fn desk(&self, hand: HandId) -> Result<Arc<Mutex<HandDesk>>, ActionError> {
        if let Some(desk) = self.desks.read().get(&hand).cloned() {
            return Ok(desk);
        }
        let tournament = &mut *self.tournament.lock();
        let assignment = tournament
            .assignment(hand)
            .cloned()
            .ok_or(ActionError::UnknownHand(hand))?;
        self.open_desks(tournament, std::slice::from_ref(&assignment))?;
        self.desks
            .read()
            .get(&hand)
            .cloned()
            .ok_or(ActionError::UnknownHand(hand))
    }

    fn act(&self, hand: HandId, actor: &PlayerId, action: Action) -> Result<Ack, ActionError> {
        let desk = self.desk(hand)?;
        let (events, score) = {
            let mut desk = desk.lock();
            let seat = seat_at(&desk.assignment, actor)?;
            match action {
                Action::Call(call) => desk.state.validate_call(seat, call)?,
                Action::Play(card) => {
                    desk.state.validate_play(seat, card)?;
                }
            }

            let logged = LoggedAction {
                sequence: desk.state.next_sequence(),
                seat,
                action,
            };
            self.store.append(hand, &logged)?;

            let events = match action {
                Action::Call(call) => desk.state.apply_call(seat, call)?,
                Action::Play(card) => desk.state.apply_play(seat, card)?,
            };
            event!(
                target: "bridge_tourney::hand",
                Level::DEBUG,
                hand = %hand,
                sequence = logged.sequence,
                seat = %seat,
                action = ?action,
                "action accepted"
            );
            for observer in &self.observers {
                for hand_event in &events {
                    observer.notify(hand, hand_event);
                }
            }
            let score = events.iter().find_map(|e| match e {
                HandEvent::HandCompleted { score } => Some(*score),
                _ => None,
            });
            (events, score)
        };

        let advance = match score {
            Some(score) => Some(self.record(hand, &score)?),
            None => None,
        };
        Ok(Ack {
            hand,
            events,
            advance,
        })
    }

    fn record(&self, hand: HandId, score: &HandScore) -> Result<Advance, ActionError> {
        let tournament = &mut *self.tournament.lock();
        let advance = self.settle(tournament, hand, score)?;
        self.open_desks(tournament, &new_hands(&advance))?;
        Ok(advance)
    }

    fn settle(
        &self,
        tournament: &mut Tournament,
        hand: HandId,
        score: &HandScore,
    ) -> Result<Advance, ActionError> {
        let advance = tournament.record_result(hand, score)?;
        match &advance {
            Advance::NextRound(next) => event!(
                target: "bridge_tourney::lifecycle",
                Level::INFO,
                tournament = %tournament.id(),
                round = next.first().map_or(0, |a| a.coords.round),
                hands = next.len(),
                "round started"
            ),
            Advance::Completed(standings) => event!(
                target: "bridge_tourney::lifecycle",
                Level::INFO,
                tournament = %tournament.id(),
                pairs = standings.len(),
                "tournament complete"
            ),
            Advance::NextBoard(_) | Advance::AwaitingRound | Advance::AlreadyRecorded => {}
        }
        Ok(advance)
    }

    /// Creates desks for new hands, replaying whatever the store already
    /// holds for them. A hand whose stored log is already complete is
    /// recorded at once, and the hands that unlocks are opened in turn.
    fn open_desks(
        &self,
        tournament: &mut Tournament,
        assignments: &[HandAssignment],
    ) -> Result<(), ActionError> {
        let mut pending: VecDeque<HandAssignment> = assignments.iter().cloned().collect();
        while let Some(assignment) = pending.pop_front() {
            let hand = assignment.hand;
            if self.desks.read().contains_key(&hand) {
                continue;
            }
            let number = assignment.coords.board;
            let board = tournament
                .board(number)
                .ok_or(ActionError::MissingBoard(number))?;
            let log = self.store.load(hand)?;
            let state = HandStateMachine::from_log(board, &log)
                .map_err(|source| ActionError::Replay { hand, source })?;
            let finished = state.final_score();
            self.desks
                .write()
                .entry(hand)
                .or_insert_with(|| Arc::new(Mutex::new(HandDesk { assignment, state })));

            if let Some(score) = finished {
                event!(
                    target: "bridge_tourney::hand",
                    Level::INFO,
                    hand = %hand,
                    actions = log.len(),
                    "hand restored complete from the event log"
                );
                let advance = self.settle(tournament, hand, &score)?;
                pending.extend(new_hands(&advance));
            }
        }
        Ok(())
    }
}

fn new_hands(advance: &Advance) -> Vec<HandAssignment> {
    match advance {
        Advance::NextBoard(next) => vec![next.clone()],
        Advance::NextRound(next) => next.clone(),
        Advance::AwaitingRound | Advance::AlreadyRecorded | Advance::Completed(_) => Vec::new(),
    }
}

fn seat_at(assignment: &HandAssignment, player: &PlayerId) -> Result<Seat, ActionError> {
    assignment
        .seat_of(player)
        .ok_or_else(|| ActionError::NotSeated {
            hand: assignment.hand,
            player: player.clone(),
        })
}
