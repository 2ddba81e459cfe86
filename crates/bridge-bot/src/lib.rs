pub mod bot;
pub mod policy;

pub use bot::{BidPlanner, BotStyle, HandShape, PlayPlanner};
pub use policy::{HeuristicPolicy, Policy, PolicyContext};
