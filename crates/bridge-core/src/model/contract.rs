use crate::model::call::Strain;
use crate::model::seat::Seat;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Doubled {
    #[default]
    Undoubled,
    Doubled,
    Redoubled,
}

/// The final contract of a settled auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contract {
    pub declarer: Seat,
    pub level: u8,
    pub strain: Strain,
    pub doubled: Doubled,
}

impl Contract {
    pub const fn dummy(&self) -> Seat {
        self.declarer.partner()
    }

    /// Declarer's left-hand opponent makes the opening lead.
    pub const fn opening_leader(&self) -> Seat {
        self.declarer.next()
    }

    /// Tricks declarer needs to make the contract.
    pub const fn target_tricks(&self) -> u8 {
        self.level + 6
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.level, self.strain)?;
        match self.doubled {
            Doubled::Undoubled => {}
            Doubled::Doubled => f.write_str("X")?,
            Doubled::Redoubled => f.write_str("XX")?,
        }
        write!(f, " by {}", self.declarer)
    }
}
