pub mod board;
pub mod call;
pub mod card;
pub mod contract;
pub mod deck;
pub mod holding;
pub mod ids;
pub mod rank;
pub mod seat;
pub mod suit;
pub mod trick;
