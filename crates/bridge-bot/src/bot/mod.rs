mod bid;
mod play;

pub use bid::BidPlanner;
pub use play::PlayPlanner;

use bridge_core::model::holding::Holding;
use bridge_core::model::suit::Suit;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotStyle {
    /// Point-count bidding and cheapest-winner card play.
    #[default]
    Heuristic,
    /// Always passes and always plays its lowest legal card.
    Passive,
}

impl BotStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            BotStyle::Heuristic => "heuristic",
            BotStyle::Passive => "passive",
        }
    }
}

impl fmt::Display for BotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotStyle {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "normal" | "default" => Ok(BotStyle::Heuristic),
            "passive" | "easy" => Ok(BotStyle::Passive),
            other => Err(format!("unknown bot style '{other}'")),
        }
    }
}

/// Point count and suit lengths of a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandShape {
    pub points: u32,
    /// Indexed by [`Suit::index`].
    pub lengths: [usize; 4],
}

impl HandShape {
    pub fn of(holding: &Holding) -> Self {
        let mut lengths = [0; 4];
        for suit in Suit::ALL {
            lengths[suit.index()] = holding.suit_length(suit);
        }
        Self {
            points: holding.high_card_points(),
            lengths,
        }
    }

    pub fn length(&self, suit: Suit) -> usize {
        self.lengths[suit.index()]
    }

    /// No singleton or void and at most one doubleton.
    pub fn is_balanced(&self) -> bool {
        let doubletons = self.lengths.iter().filter(|len| **len == 2).count();
        self.lengths.iter().all(|len| *len >= 2) && doubletons <= 1
    }

    /// Longest suit, preferring the higher-ranking suit on ties.
    pub fn longest(&self) -> Suit {
        Suit::ALL
            .iter()
            .copied()
            .max_by_key(|suit| (self.length(*suit), *suit))
            .unwrap_or(Suit::Clubs)
    }

    /// Longest major with at least `min` cards.
    pub fn major_with(&self, min: usize) -> Option<Suit> {
        [Suit::Spades, Suit::Hearts]
            .into_iter()
            .filter(|suit| self.length(*suit) >= min)
            .max_by_key(|suit| self.length(*suit))
    }
}
