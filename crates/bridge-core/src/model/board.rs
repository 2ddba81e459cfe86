use crate::model::deck::Deck;
use crate::model::holding::Holding;
use crate::model::seat::{Seat, Side};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vulnerability {
    None,
    NorthSouth,
    EastWest,
    Both,
}

impl Vulnerability {
    /// Standard 16-board duplicate rotation.
    const CYCLE: [Vulnerability; 16] = [
        Vulnerability::None,
        Vulnerability::NorthSouth,
        Vulnerability::EastWest,
        Vulnerability::Both,
        Vulnerability::NorthSouth,
        Vulnerability::EastWest,
        Vulnerability::Both,
        Vulnerability::None,
        Vulnerability::EastWest,
        Vulnerability::Both,
        Vulnerability::None,
        Vulnerability::NorthSouth,
        Vulnerability::Both,
        Vulnerability::None,
        Vulnerability::NorthSouth,
        Vulnerability::EastWest,
    ];

    pub fn for_board(number: u32) -> Self {
        Self::CYCLE[(number.saturating_sub(1) % 16) as usize]
    }

    pub fn is_vulnerable(self, side: Side) -> bool {
        match self {
            Vulnerability::None => false,
            Vulnerability::Both => true,
            Vulnerability::NorthSouth => side == Side::NorthSouth,
            Vulnerability::EastWest => side == Side::EastWest,
        }
    }
}

/// A pre-dealt deal. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub number: u32,
    pub dealer: Seat,
    pub vulnerability: Vulnerability,
    holdings: [Holding; 4],
}

impl Board {
    /// Deals board `number` for a tournament. The same inputs always produce
    /// the same deal.
    pub fn generate(number: u32, tournament_id: &str, secret: &str) -> Self {
        let deck = Deck::shuffled_with_seed(deal_seed(number, tournament_id, secret));
        Self::from_holdings(number, deck.deal())
    }

    /// Builds a board with explicit holdings; dealer and vulnerability still
    /// follow the board number.
    pub fn from_holdings(number: u32, holdings: [Holding; 4]) -> Self {
        let dealer = Seat::LOOP[(number.saturating_sub(1) % 4) as usize];
        Self {
            number,
            dealer,
            vulnerability: Vulnerability::for_board(number),
            holdings,
        }
    }

    pub fn holding(&self, seat: Seat) -> &Holding {
        &self.holdings[seat.index()]
    }

    pub fn holdings(&self) -> &[Holding; 4] {
        &self.holdings
    }
}

/// Seed for a board's shuffle, derived from the board number, tournament id
/// and tournament secret.
pub fn deal_seed(number: u32, tournament_id: &str, secret: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(number.to_le_bytes());
    hasher.update(b":");
    hasher.update(tournament_id.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    let digest = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}
