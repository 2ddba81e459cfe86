use crate::model::call::{Bid, Call};
use crate::model::contract::{Contract, Doubled};
use crate::model::seat::Seat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of an auction so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionState {
    Incomplete,
    PassedOut,
    Contract(Contract),
}

impl AuctionState {
    pub const fn is_settled(&self) -> bool {
        !matches!(self, AuctionState::Incomplete)
    }

    pub const fn contract(&self) -> Option<Contract> {
        match self {
            AuctionState::Contract(contract) => Some(*contract),
            _ => None,
        }
    }
}

/// Why a call is not allowed at this point of the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalCall {
    #[error("{bid} does not outrank {last}")]
    InsufficientBid { bid: Bid, last: Bid },
    #[error("double is only allowed over an undoubled opponent bid")]
    DoubleNotAllowed,
    #[error("redouble is only allowed over an opponent's double")]
    RedoubleNotAllowed,
}

/// Read-only view of a call sequence starting with `dealer`.
#[derive(Debug, Clone, Copy)]
pub struct Auction<'a> {
    dealer: Seat,
    calls: &'a [Call],
}

impl<'a> Auction<'a> {
    pub fn new(dealer: Seat, calls: &'a [Call]) -> Self {
        Self { dealer, calls }
    }

    pub fn calls(&self) -> &'a [Call] {
        self.calls
    }

    /// Seat that made the call at `index`.
    pub fn seat_of(&self, index: usize) -> Seat {
        self.dealer.advance(index)
    }

    pub fn state(&self) -> AuctionState {
        let Some((bid_index, bid)) = self.last_bid() else {
            return if self.calls.len() >= 4 {
                AuctionState::PassedOut
            } else {
                AuctionState::Incomplete
            };
        };

        let trailing_passes = self.calls[bid_index + 1..]
            .iter()
            .rev()
            .take_while(|call| call.is_pass())
            .count();
        if trailing_passes < 3 {
            return AuctionState::Incomplete;
        }

        let declaring_side = self.seat_of(bid_index).side();
        let declarer = self
            .calls
            .iter()
            .enumerate()
            .find_map(|(index, call)| match call {
                Call::Bid(b)
                    if b.strain == bid.strain && self.seat_of(index).side() == declaring_side =>
                {
                    Some(self.seat_of(index))
                }
                _ => None,
            })
            .unwrap_or_else(|| self.seat_of(bid_index));

        let doubled = self.calls[bid_index + 1..]
            .iter()
            .fold(Doubled::Undoubled, |acc, call| match call {
                Call::Double => Doubled::Doubled,
                Call::Redouble => Doubled::Redoubled,
                _ => acc,
            });

        AuctionState::Contract(Contract {
            declarer,
            level: bid.level,
            strain: bid.strain,
            doubled,
        })
    }

    /// Seat due to call next, or `None` once the auction is settled.
    pub fn next_to_call(&self) -> Option<Seat> {
        match self.state() {
            AuctionState::Incomplete => Some(self.seat_of(self.calls.len())),
            _ => None,
        }
    }

    /// Checks `call` against the calls so far for whoever is next to call.
    pub fn check(&self, call: Call) -> Result<(), IllegalCall> {
        let caller = self.seat_of(self.calls.len());
        match call {
            Call::Pass => Ok(()),
            Call::Bid(bid) => match self.last_bid() {
                Some((_, last)) if bid <= last => Err(IllegalCall::InsufficientBid { bid, last }),
                _ => Ok(()),
            },
            Call::Double => match self.last_action() {
                Some((seat, Call::Bid(_))) if seat.side() != caller.side() => Ok(()),
                _ => Err(IllegalCall::DoubleNotAllowed),
            },
            Call::Redouble => match self.last_action() {
                Some((seat, Call::Double)) if seat.side() != caller.side() => Ok(()),
                _ => Err(IllegalCall::RedoubleNotAllowed),
            },
        }
    }

    /// Every call the next caller may make, `Pass` first.
    pub fn legal_calls(&self) -> Vec<Call> {
        if self.state().is_settled() {
            return Vec::new();
        }
        let mut calls = vec![Call::Pass];
        for call in [Call::Double, Call::Redouble] {
            if self.check(call).is_ok() {
                calls.push(call);
            }
        }
        let floor = self.last_bid().map(|(_, bid)| bid);
        calls.extend(
            Bid::all()
                .filter(|bid| floor.is_none_or(|last| *bid > last))
                .map(Call::Bid),
        );
        calls
    }

    pub fn last_bid(&self) -> Option<(usize, Bid)> {
        self.calls
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, call)| match call {
                Call::Bid(bid) => Some((index, *bid)),
                _ => None,
            })
    }

    fn last_action(&self) -> Option<(Seat, Call)> {
        self.calls
            .iter()
            .enumerate()
            .rev()
            .find(|(_, call)| !call.is_pass())
            .map(|(index, call)| (self.seat_of(index), *call))
    }
}
