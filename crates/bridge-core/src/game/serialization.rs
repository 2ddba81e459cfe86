use super::hand_state::{HandStateMachine, ReplayError};
use crate::model::board::Board;
use crate::model::call::Call;
use crate::model::card::Card;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Portable form of a hand: enough to regenerate the board from its seed and
/// replay both logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandSnapshot {
    pub tournament_id: String,
    pub board_number: u32,
    pub calls: Vec<Call>,
    pub plays: Vec<Card>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot json is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot does not replay: {0}")]
    Replay(#[from] ReplayError),
}

impl HandSnapshot {
    pub fn capture(tournament_id: &str, hand: &HandStateMachine) -> Self {
        HandSnapshot {
            tournament_id: tournament_id.to_string(),
            board_number: hand.board().number,
            calls: hand.calls().to_vec(),
            plays: hand.plays().to_vec(),
        }
    }

    /// Regenerates the board with `secret` and replays the logs.
    pub fn restore(&self, secret: &str) -> Result<HandStateMachine, SnapshotError> {
        let board = Board::generate(self.board_number, &self.tournament_id, secret);
        Ok(HandStateMachine::from_sequences(
            board,
            &self.calls,
            &self.plays,
        )?)
    }

    pub fn to_json(tournament_id: &str, hand: &HandStateMachine) -> serde_json::Result<String> {
        let snapshot = Self::capture(tournament_id, hand);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}
