use crate::policy::PolicyContext;
use bridge_core::model::card::Card;
use bridge_core::model::rank::Rank;
use bridge_core::model::suit::Suit;
use bridge_core::rules::play::{beats, winning_play};

/// Card play: lead aces or low from length, win as cheaply as possible,
/// duck when partner already has the trick.
pub struct PlayPlanner;

impl PlayPlanner {
    pub fn choose(ctx: &PolicyContext) -> Option<(Card, &'static str)> {
        if ctx.legal_cards.is_empty() {
            return None;
        }
        let trump = ctx.contract.and_then(|c| c.strain.trump());

        let Some(trick) = ctx.trick.as_ref().filter(|t| !t.plays.is_empty()) else {
            return Some(Self::lead(ctx, trump));
        };

        let Some(winning) = winning_play(&trick.plays, trump) else {
            return lowest(&ctx.legal_cards, trump).map(|card| (card, "lowest"));
        };
        if winning.seat == ctx.seat.partner() {
            return lowest(&ctx.legal_cards, trump).map(|card| (card, "partner_winning"));
        }

        let lead = trick.plays[0].card.suit;
        let cheapest_winner = ctx
            .legal_cards
            .iter()
            .copied()
            .filter(|card| beats(*card, winning.card, lead, trump))
            .min_by_key(|card| (Some(card.suit) == trump, card.rank));
        match cheapest_winner {
            Some(card) => Some((card, "cheapest_winner")),
            None => lowest(&ctx.legal_cards, trump).map(|card| (card, "cannot_win")),
        }
    }

    fn lead(ctx: &PolicyContext, trump: Option<Suit>) -> (Card, &'static str) {
        if let Some(ace) = ctx
            .legal_cards
            .iter()
            .copied()
            .filter(|card| card.rank == Rank::Ace && Some(card.suit) != trump)
            .max_by_key(|card| card.suit)
        {
            return (ace, "cash_ace");
        }
        let longest = Suit::ALL
            .iter()
            .copied()
            .filter(|suit| Some(*suit) != trump || ctx.hand.cards().iter().all(|c| c.suit == *suit))
            .max_by_key(|suit| (ctx.hand.suit_length(*suit), *suit));
        let from_length = longest.and_then(|suit| {
            ctx.legal_cards
                .iter()
                .copied()
                .filter(|card| card.suit == suit)
                .min_by_key(|card| card.rank)
        });
        match from_length.or_else(|| lowest(&ctx.legal_cards, trump)) {
            Some(card) => (card, "low_from_length"),
            None => (ctx.legal_cards[0], "first_legal"),
        }
    }
}

/// Lowest card, preferring to keep trumps.
fn lowest(cards: &[Card], trump: Option<Suit>) -> Option<Card> {
    cards
        .iter()
        .copied()
        .min_by_key(|card| (Some(card.suit) == trump, card.rank))
}
