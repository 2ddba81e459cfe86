//! Bridge rules: auction legality, legal cards, trick winners and contract
//! scoring. Everything here is a pure function of its inputs.

pub mod auction;
pub mod play;
pub mod score;

pub use auction::{Auction, AuctionState, IllegalCall};
pub use play::{IllegalCard, beats, check_card, legal_cards, winning_play};
pub use score::contract_score;
