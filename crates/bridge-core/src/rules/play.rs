use crate::model::card::Card;
use crate::model::holding::Holding;
use crate::model::suit::Suit;
use crate::model::trick::Play;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalCard {
    #[error("{0} is not held")]
    NotHeld(Card),
    #[error("must follow {0}")]
    MustFollowSuit(Suit),
}

/// Cards `holding` may play to a trick led in `lead` (any card when leading
/// or when void in the suit led).
pub fn legal_cards(holding: &Holding, lead: Option<Suit>) -> Vec<Card> {
    match lead {
        Some(suit) if holding.has_suit(suit) => holding
            .iter()
            .copied()
            .filter(|card| card.suit == suit)
            .collect(),
        _ => holding.cards().to_vec(),
    }
}

pub fn check_card(holding: &Holding, lead: Option<Suit>, card: Card) -> Result<(), IllegalCard> {
    if !holding.contains(card) {
        return Err(IllegalCard::NotHeld(card));
    }
    match lead {
        Some(suit) if card.suit != suit && holding.has_suit(suit) => {
            Err(IllegalCard::MustFollowSuit(suit))
        }
        _ => Ok(()),
    }
}

/// Whether `card` beats `best` in a trick led in `lead`.
pub fn beats(card: Card, best: Card, lead: Suit, trump: Option<Suit>) -> bool {
    if card.suit == best.suit {
        return card.rank > best.rank;
    }
    match trump {
        Some(t) if card.suit == t => true,
        Some(t) if best.suit == t => false,
        _ => card.suit == lead && best.suit != lead,
    }
}

/// The play holding the trick so far; `plays` may be a partial trick.
pub fn winning_play(plays: &[Play], trump: Option<Suit>) -> Option<Play> {
    let lead = plays.first()?.card.suit;
    plays
        .iter()
        .copied()
        .reduce(|best, play| if beats(play.card, best.card, lead, trump) { play } else { best })
}

#[cfg(test)]
mod tests {
    use super::{IllegalCard, beats, check_card, legal_cards, winning_play};
    use crate::model::card::Card;
    use crate::model::holding::Holding;
    use crate::model::rank::Rank;
    use crate::model::seat::Seat;
    use crate::model::suit::Suit;
    use crate::model::trick::Play;

    fn card(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn holding() -> Holding {
        Holding::with_cards(vec![
            Card::new(Rank::Ace, Suit::Spades),
            Card::new(Rank::Two, Suit::Spades),
            Card::new(Rank::King, Suit::Hearts),
        ])
    }

    #[test]
    fn must_follow_when_able() {
        let legal = legal_cards(&holding(), Some(Suit::Spades));
        assert_eq!(legal.len(), 2);
        assert!(legal.iter().all(|c| c.suit == Suit::Spades));
        assert_eq!(
            check_card(&holding(), Some(Suit::Spades), Card::new(Rank::King, Suit::Hearts)),
            Err(IllegalCard::MustFollowSuit(Suit::Spades))
        );
    }

    #[test]
    fn void_or_leading_allows_anything() {
        assert_eq!(legal_cards(&holding(), Some(Suit::Clubs)).len(), 3);
        assert_eq!(legal_cards(&holding(), None).len(), 3);
        assert!(check_card(&holding(), Some(Suit::Clubs), Card::new(Rank::King, Suit::Hearts)).is_ok());
    }

    #[test]
    fn trumps_beat_the_suit_led() {
        assert!(beats(card("2S"), card("AH"), Suit::Hearts, Some(Suit::Spades)));
        assert!(!beats(card("KD"), card("2H"), Suit::Hearts, Some(Suit::Spades)));
        assert!(!beats(card("KH"), card("2S"), Suit::Hearts, Some(Suit::Spades)));
        assert!(beats(card("3H"), card("2H"), Suit::Hearts, None));
    }

    #[test]
    fn partial_tricks_have_a_current_winner() {
        let plays = [
            Play {
                seat: Seat::South,
                card: card("AH"),
            },
            Play {
                seat: Seat::West,
                card: card("2S"),
            },
        ];
        assert_eq!(winning_play(&plays[..1], Some(Suit::Spades)), Some(plays[0]));
        assert_eq!(winning_play(&plays, Some(Suit::Spades)), Some(plays[1]));
        assert_eq!(winning_play(&plays, None), Some(plays[0]));
        assert_eq!(winning_play(&[], None), None);
    }

    #[test]
    fn unheld_cards_are_rejected() {
        let missing = Card::new(Rank::Queen, Suit::Diamonds);
        assert_eq!(
            check_card(&holding(), None, missing),
            Err(IllegalCard::NotHeld(missing))
        );
    }
}
