//! Tournament lifecycle: sign-up, round-by-round hand creation and final
//! scoring. The state machine is pure; callers serialize access to it.

use crate::game::hand_state::HandScore;
use crate::model::board::Board;
use crate::model::ids::{HandId, Pair, PairId, PlayerId};
use crate::model::seat::Seat;
use crate::movement::{BoardInventory, ConfigurationError, Movement, TableRound, schedule_movement};
use crate::scoring::{RawBoardResult, Standings, score_tournament};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    OpenForSignup,
    Running,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSettings {
    pub total_boards: u32,
    pub boards_per_round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandCoords {
    pub table: usize,
    pub round: usize,
    pub board: u32,
}

/// A hand the lifecycle has created: where it is played and who sits where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandAssignment {
    pub hand: HandId,
    pub coords: HandCoords,
    pub ns_pair: PairId,
    pub ew_pair: PairId,
    /// Indexed by [`Seat::index`].
    pub players: [PlayerId; 4],
}

impl HandAssignment {
    pub fn player(&self, seat: Seat) -> &PlayerId {
        &self.players[seat.index()]
    }

    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        Seat::LOOP
            .iter()
            .copied()
            .find(|seat| self.player(*seat) == player)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The same table plays the next board of its group.
    NextBoard(HandAssignment),
    /// This table is done with the round; others are still playing.
    AwaitingRound,
    NextRound(Vec<HandAssignment>),
    Completed(Standings),
    /// The hand's result was already recorded; nothing changed.
    AlreadyRecorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("sign-up is closed")]
    SignupClosed,
    #[error("pair {0} is already signed up")]
    DuplicatePair(PairId),
    #[error("player {0} is already signed up")]
    PlayerAlreadySignedUp(PlayerId),
    #[error("pair {0} is not signed up")]
    UnknownPair(PairId),
    #[error("tournament is not running")]
    NotRunning,
    #[error("{0} is not part of this tournament")]
    UnknownHand(HandId),
    #[error("score for {0} credits both sides")]
    UnbalancedScore(HandId),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug, Clone)]
pub struct Tournament {
    id: String,
    secret: String,
    settings: TournamentSettings,
    phase: Phase,
    roster: Vec<Pair>,
    movement: Option<Movement>,
    hands: BTreeMap<HandId, HandAssignment>,
    results: BTreeMap<HandId, RawBoardResult>,
    standings: Option<Standings>,
    next_hand: u64,
}

impl Tournament {
    pub fn new(id: impl Into<String>, secret: impl Into<String>, settings: TournamentSettings) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            settings,
            phase: Phase::OpenForSignup,
            roster: Vec::new(),
            movement: None,
            hands: BTreeMap::new(),
            results: BTreeMap::new(),
            standings: None,
            next_hand: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> TournamentSettings {
        self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn roster(&self) -> &[Pair] {
        &self.roster
    }

    pub fn movement(&self) -> Option<&Movement> {
        self.movement.as_ref()
    }

    pub fn sign_up(&mut self, pair: Pair) -> Result<(), LifecycleError> {
        if self.phase != Phase::OpenForSignup {
            return Err(LifecycleError::SignupClosed);
        }
        if self.roster.iter().any(|p| p.id == pair.id) {
            return Err(LifecycleError::DuplicatePair(pair.id));
        }
        if let Some(player) = pair
            .players()
            .iter()
            .find(|player| self.roster.iter().any(|p| p.contains(player)))
        {
            return Err(LifecycleError::PlayerAlreadySignedUp(player.clone()));
        }
        event!(
            target: "bridge_core::lifecycle",
            Level::DEBUG,
            tournament = %self.id,
            pair = %pair.id,
            "pair signed up"
        );
        self.roster.push(pair);
        Ok(())
    }

    pub fn withdraw(&mut self, pair: &PairId) -> Result<Pair, LifecycleError> {
        if self.phase != Phase::OpenForSignup {
            return Err(LifecycleError::SignupClosed);
        }
        let index = self
            .roster
            .iter()
            .position(|p| &p.id == pair)
            .ok_or_else(|| LifecycleError::UnknownPair(pair.clone()))?;
        Ok(self.roster.remove(index))
    }

    /// Freezes the roster, builds the movement and creates the first round's
    /// hands. On a configuration error the tournament stays open.
    pub fn close_signup(&mut self) -> Result<Vec<HandAssignment>, LifecycleError> {
        if self.phase != Phase::OpenForSignup {
            return Err(LifecycleError::SignupClosed);
        }
        let ids: Vec<PairId> = self.roster.iter().map(|p| p.id.clone()).collect();
        let movement = schedule_movement(
            &ids,
            BoardInventory {
                total_boards: self.settings.total_boards,
            },
            self.settings.boards_per_round,
        )?;
        event!(
            target: "bridge_core::lifecycle",
            Level::INFO,
            tournament = %self.id,
            pairs = ids.len(),
            tables = movement.num_tables(),
            rounds = movement.num_rounds(),
            "sign-up closed; movement scheduled"
        );
        self.movement = Some(movement);
        self.phase = Phase::Running;
        Ok(self.start_round(1))
    }

    /// Deal for board `number`, regenerated from the tournament seed.
    pub fn board(&self, number: u32) -> Option<Board> {
        let movement = self.movement.as_ref()?;
        movement
            .groups()
            .iter()
            .any(|group| group.contains(number))
            .then(|| Board::generate(number, &self.id, &self.secret))
    }

    pub fn assignment(&self, hand: HandId) -> Option<&HandAssignment> {
        self.hands.get(&hand)
    }

    pub fn results(&self) -> impl Iterator<Item = &RawBoardResult> {
        self.results.values()
    }

    pub fn standings(&self) -> Option<&Standings> {
        self.standings.as_ref()
    }

    /// Hands created but not yet recorded.
    pub fn active_hands(&self) -> Vec<&HandAssignment> {
        self.hands
            .values()
            .filter(|a| !self.results.contains_key(&a.hand))
            .collect()
    }

    /// Hands with a recorded result, in hand order.
    pub fn recorded_hands(&self) -> Vec<&HandAssignment> {
        self.results
            .keys()
            .filter_map(|hand| self.hands.get(hand))
            .collect()
    }

    /// Where `player` is currently seated, if anywhere.
    pub fn seat_of(&self, player: &PlayerId) -> Option<(HandId, Seat)> {
        self.active_hands()
            .into_iter()
            .find_map(|a| a.seat_of(player).map(|seat| (a.hand, seat)))
    }

    fn hands_per_round(&self, movement: &Movement) -> usize {
        let playing = movement.round(1).iter().filter(|a| !a.is_bye()).count();
        playing * movement.boards_per_round() as usize
    }

    /// Round in progress, derived from how many hands have been recorded.
    pub fn current_round(&self) -> Option<usize> {
        if self.phase != Phase::Running {
            return None;
        }
        let movement = self.movement.as_ref()?;
        let per_round = self.hands_per_round(movement).max(1);
        Some((self.results.len() / per_round + 1).min(movement.num_rounds()))
    }

    pub fn record_result(&mut self, hand: HandId, score: &HandScore) -> Result<Advance, LifecycleError> {
        if self.results.contains_key(&hand) {
            return Ok(Advance::AlreadyRecorded);
        }
        if self.phase != Phase::Running {
            return Err(LifecycleError::NotRunning);
        }
        let assignment = self
            .hands
            .get(&hand)
            .cloned()
            .ok_or(LifecycleError::UnknownHand(hand))?;
        if score.ns_score != 0 && score.ew_score != 0 {
            return Err(LifecycleError::UnbalancedScore(hand));
        }

        let coords = assignment.coords;
        self.results.insert(
            hand,
            RawBoardResult {
                board: coords.board,
                round: coords.round,
                ns_pair: assignment.ns_pair.clone(),
                ew_pair: assignment.ew_pair.clone(),
                ns_score: score.ns_score,
                ew_score: score.ew_score,
            },
        );
        event!(
            target: "bridge_core::lifecycle",
            Level::DEBUG,
            tournament = %self.id,
            hand = %hand,
            table = coords.table,
            round = coords.round,
            board = coords.board,
            ns_score = score.ns_score,
            ew_score = score.ew_score,
            "result recorded"
        );

        let Some(movement) = self.movement.as_ref() else {
            return Err(LifecycleError::NotRunning);
        };
        let Some(table_round) = movement.assignment(coords.table, coords.round).cloned() else {
            return Err(LifecycleError::UnknownHand(hand));
        };
        let per_round = self.hands_per_round(movement);
        let num_rounds = movement.num_rounds();
        if coords.board < table_round.group.last {
            if let Some(next) = self.create_hand(&table_round, coords.board + 1) {
                return Ok(Advance::NextBoard(next));
            }
        }

        let recorded_this_round = self
            .results
            .values()
            .filter(|r| r.round == coords.round)
            .count();
        if recorded_this_round < per_round {
            return Ok(Advance::AwaitingRound);
        }

        if coords.round < num_rounds {
            return Ok(Advance::NextRound(self.start_round(coords.round + 1)));
        }

        let results: Vec<RawBoardResult> = self.results.values().cloned().collect();
        let standings = score_tournament(&results);
        self.phase = Phase::Complete;
        self.standings = Some(standings.clone());
        event!(
            target: "bridge_core::lifecycle",
            Level::INFO,
            tournament = %self.id,
            hands = results.len(),
            pairs = standings.len(),
            "tournament complete; all seats released"
        );
        Ok(Advance::Completed(standings))
    }

    fn start_round(&mut self, round: usize) -> Vec<HandAssignment> {
        let tables: Vec<TableRound> = self
            .movement
            .as_ref()
            .map(|m| m.round(round).into_iter().cloned().collect())
            .unwrap_or_default();
        let hands: Vec<HandAssignment> = tables
            .iter()
            .filter_map(|table_round| self.create_hand(table_round, table_round.group.first))
            .collect();
        event!(
            target: "bridge_core::lifecycle",
            Level::INFO,
            tournament = %self.id,
            round,
            hands = hands.len(),
            "round started"
        );
        hands
    }

    /// `None` for a phantom table.
    fn create_hand(&mut self, table_round: &TableRound, board: u32) -> Option<HandAssignment> {
        let ns_pair = table_round.ns.pair()?.clone();
        let ew_pair = table_round.ew.pair()?.clone();
        let [north, south] = self.pair_players(&ns_pair)?;
        let [east, west] = self.pair_players(&ew_pair)?;
        let hand = HandId(self.next_hand);
        self.next_hand += 1;
        let assignment = HandAssignment {
            hand,
            coords: HandCoords {
                table: table_round.table,
                round: table_round.round,
                board,
            },
            ns_pair,
            ew_pair,
            players: [north, east, south, west],
        };
        self.hands.insert(hand, assignment.clone());
        Some(assignment)
    }

    fn pair_players(&self, pair: &PairId) -> Option<[PlayerId; 2]> {
        self.roster
            .iter()
            .find(|p| &p.id == pair)
            .map(|p| p.players().clone())
    }
}

/// Registry allowing at most one tournament that is open or running.
///
/// This is the entry point for hosts that run several sessions in one
/// process. A single-session host, such as the bundled runner, can build a
/// [`Tournament`] directly.
#[derive(Debug, Default)]
pub struct TournamentBook {
    tournaments: BTreeMap<String, Tournament>,
}

impl TournamentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tournament in `OpenForSignup`. Fails while another is
    /// still open or running, or when `id` was used before.
    pub fn open(
        &mut self,
        id: impl Into<String>,
        secret: impl Into<String>,
        settings: TournamentSettings,
    ) -> Result<&mut Tournament, ConfigurationError> {
        if let Some(active) = self.active() {
            return Err(ConfigurationError::TournamentInProgress(active.id.clone()));
        }
        let id = id.into();
        if self.tournaments.contains_key(&id) {
            return Err(ConfigurationError::DuplicateTournament(id));
        }
        Ok(self
            .tournaments
            .entry(id.clone())
            .or_insert_with(|| Tournament::new(id, secret, settings)))
    }

    pub fn active(&self) -> Option<&Tournament> {
        self.tournaments
            .values()
            .find(|t| t.phase() != Phase::Complete)
    }

    pub fn get(&self, id: &str) -> Option<&Tournament> {
        self.tournaments.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Tournament> {
        self.tournaments.get_mut(id)
    }
}
