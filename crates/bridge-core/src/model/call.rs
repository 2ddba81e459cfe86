use crate::model::suit::Suit;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Denomination of a bid, in ascending rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strain {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
    NoTrump,
}

impl Strain {
    pub const ALL: [Strain; 5] = [
        Strain::Clubs,
        Strain::Diamonds,
        Strain::Hearts,
        Strain::Spades,
        Strain::NoTrump,
    ];

    pub const fn trump(self) -> Option<Suit> {
        match self {
            Strain::Clubs => Some(Suit::Clubs),
            Strain::Diamonds => Some(Suit::Diamonds),
            Strain::Hearts => Some(Suit::Hearts),
            Strain::Spades => Some(Suit::Spades),
            Strain::NoTrump => None,
        }
    }

    pub const fn from_suit(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => Strain::Clubs,
            Suit::Diamonds => Strain::Diamonds,
            Suit::Hearts => Strain::Hearts,
            Suit::Spades => Strain::Spades,
        }
    }

    pub const fn is_minor(self) -> bool {
        matches!(self, Strain::Clubs | Strain::Diamonds)
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_ascii_uppercase().as_str() {
            "C" => Some(Strain::Clubs),
            "D" => Some(Strain::Diamonds),
            "H" => Some(Strain::Hearts),
            "S" => Some(Strain::Spades),
            "N" | "NT" => Some(Strain::NoTrump),
            _ => None,
        }
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trump() {
            Some(suit) => write!(f, "{suit}"),
            None => f.write_str("NT"),
        }
    }
}

/// A contract-level bid. Ordering follows the auction: `1C < 1D < … < 7NT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bid {
    pub level: u8,
    pub strain: Strain,
}

impl Bid {
    pub const MIN_LEVEL: u8 = 1;
    pub const MAX_LEVEL: u8 = 7;

    /// Returns `None` outside levels 1..=7.
    pub const fn new(level: u8, strain: Strain) -> Option<Self> {
        if level >= Self::MIN_LEVEL && level <= Self::MAX_LEVEL {
            Some(Self { level, strain })
        } else {
            None
        }
    }

    /// Every bid in auction order.
    pub fn all() -> impl Iterator<Item = Bid> {
        (Self::MIN_LEVEL..=Self::MAX_LEVEL)
            .flat_map(|level| Strain::ALL.into_iter().map(move |strain| Bid { level, strain }))
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.level, self.strain)
    }
}

/// One call in an auction. Serialized as `"P"`, `"X"`, `"XX"` or a bid like `"3NT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Call {
    Pass,
    Double,
    Redouble,
    Bid(Bid),
}

impl Call {
    pub fn bid(level: u8, strain: Strain) -> Option<Self> {
        Bid::new(level, strain).map(Call::Bid)
    }

    pub const fn is_pass(self) -> bool {
        matches!(self, Call::Pass)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Pass => f.write_str("P"),
            Call::Double => f.write_str("X"),
            Call::Redouble => f.write_str("XX"),
            Call::Bid(bid) => write!(f, "{bid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a call (expected P, X, XX or a bid such as \"4S\")")]
pub struct ParseCallError {
    pub input: String,
}

impl FromStr for Call {
    type Err = ParseCallError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let err = || ParseCallError {
            input: value.to_string(),
        };
        match trimmed.to_ascii_uppercase().as_str() {
            "P" | "PASS" => return Ok(Call::Pass),
            "X" | "DBL" | "DOUBLE" => return Ok(Call::Double),
            "XX" | "RDBL" | "REDOUBLE" => return Ok(Call::Redouble),
            _ => {}
        }

        let mut chars = trimmed.chars();
        let level = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(err)?;
        let strain = Strain::from_symbol(chars.as_str()).ok_or_else(err)?;
        Call::bid(level, strain).ok_or_else(err)
    }
}

impl From<Call> for String {
    fn from(call: Call) -> Self {
        call.to_string()
    }
}

impl TryFrom<String> for Call {
    type Error = ParseCallError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
