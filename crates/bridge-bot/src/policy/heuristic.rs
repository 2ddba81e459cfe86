use super::{Policy, PolicyContext};
use crate::bot::{BidPlanner, BotStyle, PlayPlanner};
use bridge_core::model::call::Call;
use bridge_core::model::card::Card;
use tracing::{Level, event};

/// Adapter that wraps the planners to implement the Policy trait
pub struct HeuristicPolicy {
    style: BotStyle,
}

impl HeuristicPolicy {
    pub fn new(style: BotStyle) -> Self {
        Self { style }
    }

    pub fn heuristic() -> Self {
        Self::new(BotStyle::Heuristic)
    }

    pub fn passive() -> Self {
        Self::new(BotStyle::Passive)
    }

    pub fn style(&self) -> BotStyle {
        self.style
    }
}

impl Policy for HeuristicPolicy {
    fn choose_call(&mut self, ctx: &PolicyContext) -> Call {
        let (call, reason) = match self.style {
            BotStyle::Passive => (Call::Pass, "passive"),
            BotStyle::Heuristic => BidPlanner::choose(ctx),
        };
        log_call_decision(ctx, self.style, call, reason);
        call
    }

    fn choose_play(&mut self, ctx: &PolicyContext) -> Option<Card> {
        let (card, reason) = match self.style {
            BotStyle::Passive => ctx
                .legal_cards
                .iter()
                .copied()
                .min_by_key(|card| card.rank)
                .map(|card| (card, "passive_lowest"))?,
            BotStyle::Heuristic => PlayPlanner::choose(ctx)?,
        };
        log_play_decision(ctx, self.style, card, reason);
        Some(card)
    }
}

fn log_call_decision(ctx: &PolicyContext, style: BotStyle, chosen: Call, reason: &str) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    event!(
        target: "bridge_bot::call",
        Level::DEBUG,
        seat = %ctx.seat,
        style = %style,
        legal_count = ctx.legal_calls.len(),
        auction_len = ctx.calls.len(),
        chosen = %chosen,
        reason,
    );
}

fn log_play_decision(ctx: &PolicyContext, style: BotStyle, chosen: Card, reason: &str) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let legal_preview = if ctx.legal_cards.len() <= 6 {
        ctx.legal_cards
            .iter()
            .map(|card| card.to_string())
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{} cards", ctx.legal_cards.len())
    };

    event!(
        target: "bridge_bot::play",
        Level::DEBUG,
        seat = %ctx.seat,
        actor = %ctx.actor,
        style = %style,
        legal_count = ctx.legal_cards.len(),
        legal_cards = %legal_preview,
        chosen = %chosen,
        trick_cards = ctx.trick.as_ref().map_or(0, |t| t.plays.len()),
        reason,
    );
}
