use crate::model::card::Card;
use crate::model::seat::Seat;
use crate::model::suit::Suit;
use crate::rules::play::winning_play;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trick {
    leader: Seat,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub seat: Seat,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("all four cards of the trick are down")]
    TrickComplete,
    #[error("{expected} plays next, not {actual}")]
    OutOfTurn { expected: Seat, actual: Seat },
}

impl Trick {
    pub fn new(leader: Seat) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
        }
    }

    pub fn leader(&self) -> Seat {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit)
    }

    /// Seat due to play next, or `None` once four cards are down.
    pub fn expected_seat(&self) -> Option<Seat> {
        if self.is_complete() {
            None
        } else {
            Some(self.leader.advance(self.plays.len()))
        }
    }

    pub fn play(&mut self, seat: Seat, card: Card) -> Result<(), TrickError> {
        let expected = self.expected_seat().ok_or(TrickError::TrickComplete)?;
        if expected != seat {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        self.plays.push(Play { seat, card });
        Ok(())
    }

    /// Highest trump, otherwise highest card of the suit led.
    pub fn winner(&self, trump: Option<Suit>) -> Option<Seat> {
        if !self.is_complete() {
            return None;
        }
        winning_play(&self.plays, trump).map(|play| play.seat)
    }
}

#[cfg(test)]
mod tests {
    use super::{Trick, TrickError};
    use crate::model::card::Card;
    use crate::model::seat::Seat;
    use crate::model::suit::Suit;

    fn trick_of(leader: Seat, cards: &str) -> Trick {
        let mut trick = Trick::new(leader);
        for card in cards.split_whitespace() {
            let seat = trick.expected_seat().unwrap();
            trick.play(seat, card.parse::<Card>().unwrap()).unwrap();
        }
        trick
    }

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = trick_of(Seat::North, "2C");
        assert!(matches!(
            trick.play(Seat::South, "3C".parse().unwrap()),
            Err(TrickError::OutOfTurn {
                expected: Seat::East,
                actual: Seat::South
            })
        ));
        assert_eq!(trick.lead_suit(), Some(Suit::Clubs));
        assert_eq!(trick.winner(None), None);
    }

    #[test]
    fn notrump_goes_to_the_highest_card_led() {
        assert_eq!(trick_of(Seat::North, "TC QC 4C AS").winner(None), Some(Seat::East));
    }

    #[test]
    fn any_trump_beats_the_suit_led() {
        let trick = trick_of(Seat::West, "AD 2H KD 5D");
        assert_eq!(trick.winner(Some(Suit::Hearts)), Some(Seat::North));
        // Nobody ruffed in spades, so the ace of the suit led holds.
        assert_eq!(trick.winner(Some(Suit::Spades)), Some(Seat::West));
    }

    #[test]
    fn fifth_card_is_rejected() {
        let mut trick = trick_of(Seat::North, "2C 3C 4C 5C");
        assert_eq!(
            trick.play(Seat::North, "6C".parse().unwrap()),
            Err(TrickError::TrickComplete)
        );
        assert_eq!(trick.expected_seat(), None);
        assert_eq!(trick.winner(None), Some(Seat::West));
    }
}
