//! Matchpoint scoring. A result is compared only with other results on the
//! same board from the same direction.

use crate::model::ids::PairId;
use crate::model::seat::Side;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One played hand, using the zero-side convention: at most one of the two
/// scores is non-zero and it is positive for the side that gained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBoardResult {
    pub board: u32,
    pub round: usize,
    pub ns_pair: PairId,
    pub ew_pair: PairId,
    pub ns_score: i32,
    pub ew_score: i32,
}

impl RawBoardResult {
    /// Signed score from `side`'s point of view.
    pub fn net_for(&self, side: Side) -> i32 {
        match side {
            Side::NorthSouth => self.ns_score - self.ew_score,
            Side::EastWest => self.ew_score - self.ns_score,
        }
    }

    pub fn pair_for(&self, side: Side) -> &PairId {
        match side {
            Side::NorthSouth => &self.ns_pair,
            Side::EastWest => &self.ew_pair,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTally {
    pub matchpoints: u32,
    pub available: u32,
    pub boards: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairTally {
    pub matchpoints: u32,
    pub available: u32,
    /// `NaN` when no board had another result to compare against.
    pub percentage: f64,
    pub boards: u32,
    pub by_round: BTreeMap<usize, RoundTally>,
}

impl Default for PairTally {
    fn default() -> Self {
        Self {
            matchpoints: 0,
            available: 0,
            percentage: f64::NAN,
            boards: 0,
            by_round: BTreeMap::new(),
        }
    }
}

impl PairTally {
    fn add(&mut self, round: usize, matchpoints: u32, available: u32) {
        self.matchpoints += matchpoints;
        self.available += available;
        self.boards += 1;
        let entry = self.by_round.entry(round).or_default();
        entry.matchpoints += matchpoints;
        entry.available += available;
        entry.boards += 1;
    }

    fn finish(&mut self) {
        self.percentage = if self.available == 0 {
            f64::NAN
        } else {
            100.0 * f64::from(self.matchpoints) / f64::from(self.available)
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standings(BTreeMap<PairId, PairTally>);

impl Standings {
    pub fn get(&self, pair: &PairId) -> Option<&PairTally> {
        self.0.get(pair)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairId, &PairTally)> {
        self.0.iter()
    }

    /// Highest percentage first; pairs without a percentage go last; ties
    /// by pair id.
    pub fn ranked(&self) -> Vec<(&PairId, &PairTally)> {
        let mut ranked: Vec<_> = self.0.iter().collect();
        ranked.sort_by(|(a_id, a), (b_id, b)| {
            compare_percentage(a.percentage, b.percentage).then_with(|| a_id.cmp(b_id))
        });
        ranked
    }
}

fn compare_percentage(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    }
}

/// 2 for every strictly worse score, 1 for every tie, 0 for every better one.
fn matchpoints_against(score: i32, field: &[i32]) -> u32 {
    field
        .iter()
        .map(|other| match score.cmp(other) {
            Ordering::Greater => 2,
            Ordering::Equal => 1,
            Ordering::Less => 0,
        })
        .sum()
}

/// Scores every result. Pure: the same results always give the same
/// standings.
pub fn score_tournament(results: &[RawBoardResult]) -> Standings {
    let mut by_board: BTreeMap<u32, Vec<&RawBoardResult>> = BTreeMap::new();
    for result in results {
        by_board.entry(result.board).or_default().push(result);
    }

    let mut tallies: BTreeMap<PairId, PairTally> = BTreeMap::new();
    for board_results in by_board.values() {
        let available = 2 * (board_results.len() as u32 - 1);
        for side in [Side::NorthSouth, Side::EastWest] {
            let nets: Vec<i32> = board_results.iter().map(|r| r.net_for(side)).collect();
            for (index, result) in board_results.iter().enumerate() {
                let others: Vec<i32> = nets
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != index)
                    .map(|(_, net)| *net)
                    .collect();
                let matchpoints = matchpoints_against(nets[index], &others);
                tallies
                    .entry(result.pair_for(side).clone())
                    .or_default()
                    .add(result.round, matchpoints, available);
            }
        }
    }

    for tally in tallies.values_mut() {
        tally.finish();
    }
    Standings(tallies)
}
