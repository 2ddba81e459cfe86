use super::HandShape;
use crate::policy::PolicyContext;
use bridge_core::model::call::{Bid, Call, Strain};
use bridge_core::model::suit::Suit;

/// Simple natural bidding: open on points, raise partner's major with
/// support, bid game with enough combined values, otherwise pass.
pub struct BidPlanner;

impl BidPlanner {
    pub fn choose(ctx: &PolicyContext) -> (Call, &'static str) {
        let shape = HandShape::of(&ctx.hand);
        let (call, reason) = match Self::partner_opening(ctx) {
            _ if Self::has_bid(ctx) => (Call::Pass, "already_bid"),
            None if Self::opponents_bid(ctx) => (Call::Pass, "opponents_opened"),
            None => Self::opening(&shape),
            Some(opening) => Self::response(&shape, opening),
        };
        if call == Call::Pass || ctx.legal_calls.contains(&call) {
            (call, reason)
        } else {
            (Call::Pass, "fallback_illegal")
        }
    }

    fn opening(shape: &HandShape) -> (Call, &'static str) {
        if shape.points < 12 {
            return (Call::Pass, "too_weak_to_open");
        }
        if shape.is_balanced() && (15..=17).contains(&shape.points) {
            return (bid(1, Strain::NoTrump), "balanced_1nt");
        }
        let suit = shape.major_with(5).unwrap_or_else(|| {
            if shape.length(Suit::Diamonds) > shape.length(Suit::Clubs) {
                Suit::Diamonds
            } else {
                Suit::Clubs
            }
        });
        (bid(1, Strain::from_suit(suit)), "open_one_of_a_suit")
    }

    fn response(shape: &HandShape, opening: Bid) -> (Call, &'static str) {
        let points = shape.points;
        if opening.strain == Strain::NoTrump {
            return match points {
                10.. => (bid(3, Strain::NoTrump), "raise_nt_to_game"),
                8..=9 => (bid(2, Strain::NoTrump), "invite_nt"),
                _ => (Call::Pass, "weak_opposite_nt"),
            };
        }

        if let Some(trump) = opening.strain.trump().filter(|s| s.is_major()) {
            if shape.length(trump) >= 3 {
                let level = match points {
                    13.. => 4,
                    10..=12 => 3,
                    6..=9 => 2,
                    _ => return (Call::Pass, "weak_with_support"),
                };
                return (bid(level, opening.strain), "raise_major");
            }
        }

        match points {
            13.. => (bid(3, Strain::NoTrump), "game_values"),
            6..=12 => match shape.major_with(4) {
                Some(major) if Strain::from_suit(major) > opening.strain => {
                    (bid(1, Strain::from_suit(major)), "new_major")
                }
                _ => (bid(1, Strain::NoTrump), "dustbin_1nt"),
            },
            _ => (Call::Pass, "too_weak_to_respond"),
        }
    }

    /// Partner's first bid, if partner opened the auction for our side.
    fn partner_opening(ctx: &PolicyContext) -> Option<Bid> {
        let partner = ctx.seat.partner();
        ctx.calls
            .iter()
            .enumerate()
            .find_map(|(index, call)| match call {
                Call::Bid(b) => Some((ctx.caller_of(index), *b)),
                _ => None,
            })
            .filter(|(seat, _)| *seat == partner)
            .map(|(_, b)| b)
    }

    fn has_bid(ctx: &PolicyContext) -> bool {
        ctx.calls
            .iter()
            .enumerate()
            .any(|(index, call)| matches!(call, Call::Bid(_)) && ctx.caller_of(index) == ctx.seat)
    }

    fn opponents_bid(ctx: &PolicyContext) -> bool {
        let theirs = ctx.seat.side().opponents();
        ctx.calls
            .iter()
            .enumerate()
            .any(|(index, call)| matches!(call, Call::Bid(_)) && theirs.contains(ctx.caller_of(index)))
    }
}

fn bid(level: u8, strain: Strain) -> Call {
    Call::bid(level, strain).unwrap_or(Call::Pass)
}
