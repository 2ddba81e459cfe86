//! Mitchell movement: North-South pairs stay at their table, East-West pairs
//! move one table each round.

use crate::model::ids::PairId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::warn;

pub const MIN_PAIRS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSlot {
    Real(PairId),
    /// The bye added to an odd field. Never plays a hand.
    Phantom,
}

impl PairSlot {
    pub fn pair(&self) -> Option<&PairId> {
        match self {
            PairSlot::Real(id) => Some(id),
            PairSlot::Phantom => None,
        }
    }

    pub fn is_phantom(&self) -> bool {
        matches!(self, PairSlot::Phantom)
    }
}

impl fmt::Display for PairSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairSlot::Real(id) => write!(f, "{id}"),
            PairSlot::Phantom => f.write_str("phantom"),
        }
    }
}

/// A run of consecutive board numbers played as one unit in a round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardGroup {
    pub label: String,
    pub first: u32,
    pub last: u32,
}

impl BoardGroup {
    pub fn boards(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }

    pub fn contains(&self, board: u32) -> bool {
        self.boards().contains(&board)
    }
}

/// Who sits where, playing what, at one table in one round. Tables and
/// rounds are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRound {
    pub table: usize,
    pub round: usize,
    pub ns: PairSlot,
    pub ew: PairSlot,
    pub group: BoardGroup,
}

impl TableRound {
    /// True when one side is the phantom and no hand is played here.
    pub fn is_bye(&self) -> bool {
        self.ns.is_phantom() || self.ew.is_phantom()
    }

    pub fn involves(&self, pair: &PairId) -> bool {
        self.ns.pair() == Some(pair) || self.ew.pair() == Some(pair)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInventory {
    pub total_boards: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("a movement needs at least {MIN_PAIRS} pairs, got {0}")]
    TooFewPairs(usize),
    #[error("boards_per_round must be at least 1")]
    NoBoardsPerRound,
    #[error("{total_boards} boards cannot be split evenly across {tables} tables")]
    BoardsNotDivisible { total_boards: u32, tables: usize },
    #[error("{tables} rounds of {boards_per_round} boards need {needed} boards, only {total_boards} available")]
    NotEnoughBoards {
        total_boards: u32,
        tables: usize,
        boards_per_round: u32,
        needed: u32,
    },
    #[error("pair {0} is listed more than once")]
    DuplicatePair(PairId),
    #[error("tournament {0} is still open or running")]
    TournamentInProgress(String),
    #[error("tournament {0} already exists")]
    DuplicateTournament(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// `tables[t - 1][r - 1]`
    tables: Vec<Vec<TableRound>>,
    groups: Vec<BoardGroup>,
    boards_per_round: u32,
    unused_boards: Vec<u32>,
}

/// Builds a Mitchell movement for `pairs` in roster order.
pub fn schedule_movement(
    pairs: &[PairId],
    inventory: BoardInventory,
    boards_per_round: u32,
) -> Result<Movement, ConfigurationError> {
    if pairs.len() < MIN_PAIRS {
        return Err(ConfigurationError::TooFewPairs(pairs.len()));
    }
    let mut seen = HashSet::with_capacity(pairs.len());
    if let Some(duplicate) = pairs.iter().find(|id| !seen.insert(*id)) {
        return Err(ConfigurationError::DuplicatePair(duplicate.clone()));
    }
    if boards_per_round == 0 {
        return Err(ConfigurationError::NoBoardsPerRound);
    }

    let num_tables = pairs.len().div_ceil(2);
    let total_boards = inventory.total_boards;
    if total_boards % num_tables as u32 != 0 {
        return Err(ConfigurationError::BoardsNotDivisible {
            total_boards,
            tables: num_tables,
        });
    }
    let needed = num_tables as u32 * boards_per_round;
    if total_boards < needed {
        return Err(ConfigurationError::NotEnoughBoards {
            total_boards,
            tables: num_tables,
            boards_per_round,
            needed,
        });
    }

    let mut slots: Vec<PairSlot> = pairs.iter().cloned().map(PairSlot::Real).collect();
    if slots.len() % 2 == 1 {
        slots.push(PairSlot::Phantom);
    }
    let (ns_roster, ew_roster) = slots.split_at(num_tables);

    let groups: Vec<BoardGroup> = (0..num_tables)
        .map(|index| {
            let first = index as u32 * boards_per_round + 1;
            BoardGroup {
                label: group_label(index),
                first,
                last: first + boards_per_round - 1,
            }
        })
        .collect();

    let tables = (0..num_tables)
        .map(|t| {
            (0..num_tables)
                .map(|r| TableRound {
                    table: t + 1,
                    round: r + 1,
                    ns: ns_roster[t].clone(),
                    ew: ew_roster[(t + num_tables - r) % num_tables].clone(),
                    group: groups[r].clone(),
                })
                .collect()
        })
        .collect();

    let unused_boards: Vec<u32> = (needed + 1..=total_boards).collect();
    if !unused_boards.is_empty() {
        warn!(
            unused = unused_boards.len(),
            total_boards, needed, "board inventory exceeds the movement; surplus boards unused"
        );
    }

    Ok(Movement {
        tables,
        groups,
        boards_per_round,
        unused_boards,
    })
}

/// `A`..`Z`, then `AA`, `AB`, ...
fn group_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

impl Movement {
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn num_rounds(&self) -> usize {
        self.groups.len()
    }

    pub fn boards_per_round(&self) -> u32 {
        self.boards_per_round
    }

    pub fn groups(&self) -> &[BoardGroup] {
        &self.groups
    }

    pub fn unused_boards(&self) -> &[u32] {
        &self.unused_boards
    }

    pub fn has_phantom(&self) -> bool {
        self.tables
            .iter()
            .flatten()
            .any(|assignment| assignment.is_bye())
    }

    pub fn table(&self, table: usize) -> Option<&[TableRound]> {
        table
            .checked_sub(1)
            .and_then(|index| self.tables.get(index))
            .map(Vec::as_slice)
    }

    pub fn assignment(&self, table: usize, round: usize) -> Option<&TableRound> {
        self.table(table)?.get(round.checked_sub(1)?)
    }

    /// Every table's assignment for `round`, in table order.
    pub fn round(&self, round: usize) -> Vec<&TableRound> {
        (1..=self.num_tables())
            .filter_map(|table| self.assignment(table, round))
            .collect()
    }

    /// The real pair facing the phantom in `round`, if the field is odd.
    pub fn sitting_out(&self, round: usize) -> Option<&PairId> {
        self.round(round).into_iter().find_map(|assignment| {
            match (&assignment.ns, &assignment.ew) {
                (PairSlot::Real(id), PairSlot::Phantom) | (PairSlot::Phantom, PairSlot::Real(id)) => {
                    Some(id)
                }
                _ => None,
            }
        })
    }

    /// Rounds `pair` is seated for, including its bye, in round order.
    pub fn pair_schedule(&self, pair: &PairId) -> Vec<&TableRound> {
        let mut schedule: Vec<&TableRound> = self
            .tables
            .iter()
            .flatten()
            .filter(|assignment| assignment.involves(pair))
            .collect();
        schedule.sort_by_key(|assignment| assignment.round);
        schedule
    }

    pub fn pairs(&self) -> Vec<&PairId> {
        let mut pairs: Vec<&PairId> = self
            .round(1)
            .into_iter()
            .flat_map(|assignment| [assignment.ns.pair(), assignment.ew.pair()])
            .flatten()
            .collect();
        pairs.sort();
        pairs
    }

    /// Group played in `round`.
    pub fn group(&self, round: usize) -> Option<&BoardGroup> {
        self.groups.get(round.checked_sub(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    fn pairs(count: usize) -> Vec<PairId> {
        (1..=count).map(|n| PairId::new(format!("p{n}"))).collect()
    }

    fn inventory(total_boards: u32) -> BoardInventory {
        BoardInventory { total_boards }
    }

    #[test]
    fn eight_pairs_make_four_tables_and_four_rounds() {
        let movement = schedule_movement(&pairs(8), inventory(8), 2).unwrap();
        assert_eq!(movement.num_tables(), 4);
        assert_eq!(movement.num_rounds(), 4);
        assert!(!movement.has_phantom());
        assert_eq!(
            movement.groups().iter().map(|g| g.label.as_str()).collect::<Vec<_>>(),
            vec!["A", "B", "C", "D"]
        );
        assert_eq!(movement.group(2).unwrap().boards(), 3..=4);

        // NS stays put, EW moves up one table each round.
        let t1r1 = movement.assignment(1, 1).unwrap();
        assert_eq!(t1r1.ns, PairSlot::Real(PairId::new("p1")));
        assert_eq!(t1r1.ew, PairSlot::Real(PairId::new("p5")));
        let t2r2 = movement.assignment(2, 2).unwrap();
        assert_eq!(t2r2.ns, PairSlot::Real(PairId::new("p2")));
        assert_eq!(t2r2.ew, PairSlot::Real(PairId::new("p5")));
        let t1r2 = movement.assignment(1, 2).unwrap();
        assert_eq!(t1r2.ew, PairSlot::Real(PairId::new("p8")));
        assert!(movement.assignment(5, 1).is_none());
        assert!(movement.assignment(1, 0).is_none());
    }

    #[test]
    fn odd_fields_get_one_phantom() {
        let movement = schedule_movement(&pairs(7), inventory(4), 1).unwrap();
        assert_eq!(movement.num_tables(), 4);
        assert!(movement.has_phantom());
        for round in 1..=4 {
            assert_eq!(
                movement.round(round).iter().filter(|a| a.is_bye()).count(),
                1
            );
            assert!(movement.sitting_out(round).is_some());
        }
        let sitters: HashSet<_> = (1..=4).filter_map(|r| movement.sitting_out(r)).collect();
        assert_eq!(sitters.len(), 4);
    }

    #[test]
    fn configuration_errors_are_reported() {
        assert_eq!(
            schedule_movement(&pairs(2), inventory(8), 2),
            Err(ConfigurationError::TooFewPairs(2))
        );
        assert_eq!(
            schedule_movement(&pairs(8), inventory(8), 0),
            Err(ConfigurationError::NoBoardsPerRound)
        );
        assert_eq!(
            schedule_movement(&pairs(8), inventory(10), 2),
            Err(ConfigurationError::BoardsNotDivisible {
                total_boards: 10,
                tables: 4
            })
        );
        assert!(matches!(
            schedule_movement(&pairs(8), inventory(4), 2),
            Err(ConfigurationError::NotEnoughBoards { needed: 8, .. })
        ));
        let mut dup = pairs(4);
        dup.push(PairId::new("p2"));
        assert_eq!(
            schedule_movement(&dup, inventory(6), 1),
            Err(ConfigurationError::DuplicatePair(PairId::new("p2")))
        );
    }

    #[test]
    fn surplus_boards_are_left_unused() {
        let movement = schedule_movement(&pairs(8), inventory(16), 2).unwrap();
        assert_eq!(movement.num_rounds(), 4);
        assert_eq!(movement.groups().last().unwrap().last, 8);
        assert_eq!(movement.unused_boards(), (9..=16).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn group_labels_continue_past_z() {
        assert_eq!(group_label(0), "A");
        assert_eq!(group_label(25), "Z");
        assert_eq!(group_label(26), "AA");
        assert_eq!(group_label(27), "AB");
    }

    proptest! {
        #[test]
        fn mitchell_invariants_hold(count in 3usize..=24, boards_per_round in 1u32..=3, extra in 1u32..=2) {
            let roster = pairs(count);
            let tables = count.div_ceil(2) as u32;
            let movement = schedule_movement(&roster, inventory(tables * boards_per_round * extra), boards_per_round).unwrap();
            let rounds = movement.num_rounds();

            // Every pair sits once per round and so meets every group once.
            for pair in &roster {
                let schedule = movement.pair_schedule(pair);
                prop_assert_eq!(schedule.len(), rounds);
                let labels: HashSet<_> = schedule.iter().map(|a| a.group.label.clone()).collect();
                prop_assert_eq!(labels.len(), rounds);
            }

            // Every NS/EW combination meets exactly once.
            let mut meetings: HashMap<(PairSlot, PairSlot), usize> = HashMap::new();
            for round in 1..=rounds {
                for assignment in movement.round(round) {
                    *meetings.entry((assignment.ns.clone(), assignment.ew.clone())).or_default() += 1;
                }
            }
            prop_assert_eq!(meetings.len(), movement.num_tables() * movement.num_tables());
            prop_assert!(meetings.values().all(|count| *count == 1));

            // At most one bye per round, and one pair sits out only when the field is odd.
            for round in 1..=rounds {
                let byes = movement.round(round).iter().filter(|a| a.is_bye()).count();
                prop_assert_eq!(byes, count % 2);
                prop_assert_eq!(movement.sitting_out(round).is_some(), count % 2 == 1);
            }
        }
    }
}
