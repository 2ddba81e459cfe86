pub mod game;
pub mod model;
pub mod movement;
pub mod rules;
pub mod scoring;
pub mod store;
pub mod tournament;

pub use game::HandObserver;
pub use game::hand_state::{
    AuctionError, AuctionState, HandEvent, HandScore, HandStateMachine, PlayError, TrickView,
};
pub use movement::{BoardInventory, ConfigurationError, Movement, PairSlot, schedule_movement};
pub use scoring::{PairTally, RawBoardResult, Standings, score_tournament};
pub use store::{Action, EventStore, LoggedAction, MemoryStore, StoreError};
pub use tournament::{Advance, HandAssignment, LifecycleError, Phase, Tournament, TournamentBook};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "bridge-tourney"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
