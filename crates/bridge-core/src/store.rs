//! Durable per-hand action logs.

use crate::model::call::Call;
use crate::model::card::Card;
use crate::model::ids::HandId;
use crate::model::seat::Seat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Call(Call),
    Play(Card),
}

/// One accepted action. `seat` is the seat that acted, so declarer's seat
/// for cards played from dummy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedAction {
    pub sequence: u64,
    pub seat: Seat,
    pub action: Action,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{hand} expected sequence {expected}, got {actual}")]
    Sequence {
        hand: HandId,
        expected: u64,
        actual: u64,
    },
    #[error("store is unavailable: {0}")]
    Unavailable(String),
}

/// Append-only storage for hand logs. An append that returns `Ok` is durable.
pub trait EventStore: Send + Sync {
    fn append(&self, hand: HandId, action: &LoggedAction) -> Result<(), StoreError>;
    fn load(&self, hand: HandId) -> Result<Vec<LoggedAction>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    logs: Mutex<HashMap<HandId, Vec<LoggedAction>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryStore {
    fn append(&self, hand: HandId, action: &LoggedAction) -> Result<(), StoreError> {
        let mut logs = self
            .logs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        let log = logs.entry(hand).or_default();
        let expected = log.len() as u64;
        if action.sequence != expected {
            return Err(StoreError::Sequence {
                hand,
                expected,
                actual: action.sequence,
            });
        }
        log.push(*action);
        Ok(())
    }

    fn load(&self, hand: HandId) -> Result<Vec<LoggedAction>, StoreError> {
        let logs = self
            .logs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        Ok(logs.get(&hand).cloned().unwrap_or_default())
    }
}
