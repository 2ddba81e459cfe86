mod heuristic;

pub use heuristic::HeuristicPolicy;

use bridge_core::game::hand_state::{HandStateMachine, TrickView};
use bridge_core::model::call::Call;
use bridge_core::model::card::Card;
use bridge_core::model::contract::Contract;
use bridge_core::model::holding::Holding;
use bridge_core::model::seat::Seat;

/// Everything a seated player may see when making a decision.
#[derive(Debug, Clone)]
pub struct PolicyContext {
    /// Seat the decision is for. When declarer plays from dummy this is
    /// dummy's seat.
    pub seat: Seat,
    /// Seat making the decision.
    pub actor: Seat,
    pub dealer: Seat,
    pub vulnerable: bool,
    pub calls: Vec<Call>,
    pub legal_calls: Vec<Call>,
    /// Remaining cards of `seat`.
    pub hand: Holding,
    /// Dummy's remaining cards once they are on the table.
    pub dummy: Option<(Seat, Holding)>,
    pub contract: Option<Contract>,
    /// The trick in progress; `None` when `seat` is on lead.
    pub trick: Option<TrickView>,
    pub legal_cards: Vec<Card>,
}

impl PolicyContext {
    /// Builds the view `actor` has when deciding for `seat`.
    pub fn observe(hand: &HandStateMachine, seat: Seat) -> Self {
        let actor = hand.controller_of(seat);
        let visible = hand.visible_holdings(actor);
        // Dummy never plays before the opening lead, so declarer can see it.
        let own = visible.get(&seat).cloned().unwrap_or_default();
        let dummy = hand
            .dummy()
            .and_then(|d| visible.get(&d).map(|holding| (d, holding.clone())));
        let trick = hand.current_trick().filter(|t| t.winner.is_none());
        let board = hand.board();
        Self {
            seat,
            actor,
            dealer: board.dealer,
            vulnerable: board.vulnerability.is_vulnerable(seat.side()),
            calls: hand.calls().to_vec(),
            legal_calls: hand.legal_calls(),
            hand: own,
            dummy,
            contract: hand.contract(),
            trick,
            legal_cards: hand.current_legal_cards(seat),
        }
    }

    /// Seat that made the call at `index`.
    pub fn caller_of(&self, index: usize) -> Seat {
        self.dealer.advance(index)
    }
}

/// Decision-making interface for bots.
pub trait Policy: Send {
    /// A legal call for `ctx.seat`. `Pass` is always legal.
    fn choose_call(&mut self, ctx: &PolicyContext) -> Call;

    /// A legal card for `ctx.seat`, or `None` when nothing may be played.
    fn choose_play(&mut self, ctx: &PolicyContext) -> Option<Card>;
}
