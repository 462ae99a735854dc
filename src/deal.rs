use std::str::FromStr;

use crate::cards::{Card, CardParseError, Rank, Suit};

/// Seats the result buffer can hold.
pub const MAX_PLAYERS: usize = 5;
/// Community cards in a complete board.
pub const BOARD_CARDS: usize = 5;
/// Private cards per player.
pub const HOLE_CARDS: usize = 2;

/// Largest number of unknown slots a valid deal can have.
pub(crate) const MAX_UNKNOWN: usize = MAX_PLAYERS * HOLE_CARDS + BOARD_CARDS;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DealError {
    #[error("player count out of range: {0}")]
    PlayerCount(usize),
    #[error("missing player count (expected a leading \"<n>p\")")]
    MissingPlayerCount,
    #[error("hole cards given for more seats than declared")]
    TooManySeats,
    #[error("too many hole cards for one player: {0}")]
    TooManyHoleCards(usize),
    #[error("too many board cards: {0}")]
    TooManyBoardCards(usize),
    #[error("duplicate card: {0}")]
    DuplicateCard(Card),
    #[error(transparent)]
    CardParse(#[from] CardParseError),
}

/// A validated equity query: how many players are seated, which of their
/// hole cards are known, and which board cards are known. Everything else
/// is an unknown slot for the simulation engine to complete.
///
/// The text form mirrors the interpreter's spot strings: a player count,
/// one compact hole group per seat (`xx` marks an unknown card, trailing
/// seats may be omitted entirely), then `-` and the known board.
///
/// ```
/// use equity_rs::deal::Deal;
///
/// let deal: Deal = "3p AcAd KsKd - 7h 8h 9h".parse().unwrap();
/// assert_eq!(deal.players(), 3);
/// assert_eq!(deal.unknown(), 4); // third seat's holes + two board cards
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    players: usize,
    holes: Vec<Vec<Card>>,
    board: Vec<Card>,
}

impl Deal {
    /// Build a deal from known cards. `holes` may name fewer seats than
    /// `players`; the rest are fully unknown.
    pub fn new(players: usize, holes: Vec<Vec<Card>>, board: Vec<Card>) -> Result<Self, DealError> {
        if players == 0 || players > MAX_PLAYERS {
            return Err(DealError::PlayerCount(players));
        }
        if holes.len() > players {
            return Err(DealError::TooManySeats);
        }
        if board.len() > BOARD_CARDS {
            return Err(DealError::TooManyBoardCards(board.len()));
        }

        let mut holes = holes;
        holes.resize(players, Vec::new());

        let mut used = 0u64;
        for seat in &holes {
            if seat.len() > HOLE_CARDS {
                return Err(DealError::TooManyHoleCards(seat.len()));
            }
            for &card in seat {
                mark_used(&mut used, card)?;
            }
        }
        for &card in &board {
            mark_used(&mut used, card)?;
        }

        Ok(Self { players, holes, board })
    }

    pub fn players(&self) -> usize {
        self.players
    }

    /// Known hole cards of one seat (0..=2 cards).
    pub fn holes(&self, player: usize) -> &[Card] {
        &self.holes[player]
    }

    /// Known board cards (0..=5 cards).
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    /// Number of card slots left for the engine to complete.
    pub fn unknown(&self) -> usize {
        let known_holes: usize = self.holes.iter().map(Vec::len).sum();
        self.players * HOLE_CARDS - known_holes + (BOARD_CARDS - self.board.len())
    }

    /// The deck minus every known card, in a fixed order.
    pub fn remaining(&self) -> Vec<Card> {
        let mut used = 0u64;
        for seat in &self.holes {
            for &card in seat {
                used |= 1 << card.code();
            }
        }
        for &card in &self.board {
            used |= 1 << card.code();
        }

        let mut deck = Vec::with_capacity(52);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                let card = Card::new(rank, suit);
                if used & (1 << card.code()) == 0 {
                    deck.push(card);
                }
            }
        }
        deck
    }

    /// Completions an exhaustive run has to visit: C(remaining, unknown).
    /// Zero means enumeration cannot be entered.
    pub fn combinations(&self) -> u64 {
        nck(self.remaining().len(), self.unknown())
    }
}

fn mark_used(used: &mut u64, card: Card) -> Result<(), DealError> {
    let bit = 1u64 << card.code();
    if *used & bit != 0 {
        return Err(DealError::DuplicateCard(card));
    }
    *used |= bit;
    Ok(())
}

impl FromStr for Deal {
    type Err = DealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();

        let players = tokens
            .next()
            .and_then(parse_player_count)
            .ok_or(DealError::MissingPlayerCount)?;

        let mut holes = Vec::new();
        let mut board = Vec::new();
        let mut in_board = false;
        for token in tokens {
            if token == "-" {
                in_board = true;
            } else if in_board {
                board.push(Card::from_str(token)?);
            } else {
                holes.push(parse_hole_group(token)?);
            }
        }

        Deal::new(players, holes, board)
    }
}

fn parse_player_count(token: &str) -> Option<usize> {
    token
        .strip_suffix(['p', 'P'])
        .and_then(|digits| digits.parse().ok())
}

/// Parse one seat's compact hole group, e.g. `AcAd`, `Acxx` or `xxxx`;
/// `xx` fields count against the two-card limit but stay unknown.
fn parse_hole_group(token: &str) -> Result<Vec<Card>, DealError> {
    let mut cards = Vec::new();
    let mut fields = 0;
    let mut rest = token;
    while !rest.is_empty() {
        fields += 1;
        if rest.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("xx")) {
            rest = &rest[2..];
            continue;
        }
        let take = if rest.starts_with("10") { 3 } else { 2 };
        let field = rest
            .get(..take)
            .ok_or_else(|| CardParseError::Invalid(token.to_string()))?;
        cards.push(Card::from_str(field)?);
        rest = &rest[take..];
    }
    if fields > HOLE_CARDS {
        return Err(DealError::TooManyHoleCards(fields));
    }
    Ok(cards)
}

const fn make_nck() -> [[u64; MAX_UNKNOWN + 1]; 53] {
    let mut t = [[0u64; MAX_UNKNOWN + 1]; 53];
    let mut n = 0;
    while n < 53 {
        t[n][0] = 1;
        let mut k = 1;
        while k <= MAX_UNKNOWN && k <= n {
            t[n][k] = t[n - 1][k - 1] + t[n - 1][k];
            k += 1;
        }
        n += 1;
    }
    t
}

const NCK: [[u64; MAX_UNKNOWN + 1]; 53] = make_nck();

/// Binomial coefficient for n <= 52 and k <= [`MAX_UNKNOWN`]; zero outside
/// that table (including k > n).
pub(crate) fn nck(n: usize, k: usize) -> u64 {
    if n > 52 || k > MAX_UNKNOWN {
        return 0;
    }
    NCK[n][k]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    #[test]
    fn nck_matches_known_values() {
        assert_eq!(nck(52, 0), 1);
        assert_eq!(nck(52, 1), 52);
        assert_eq!(nck(52, 2), 1326);
        assert_eq!(nck(52, 5), 2_598_960);
        assert_eq!(nck(48, 5), 1_712_304);
        assert_eq!(nck(45, 2), 990);
        assert_eq!(nck(0, 0), 1);
        assert_eq!(nck(3, 5), 0);
        assert_eq!(nck(53, 1), 0);
    }

    #[test]
    fn parses_a_full_spot() {
        let deal: Deal = "2p AcAd KhKs - 2c 7h Th".parse().unwrap();
        assert_eq!(deal.players(), 2);
        assert_eq!(deal.holes(0), parse_cards("Ac Ad").unwrap());
        assert_eq!(deal.holes(1), parse_cards("Kh Ks").unwrap());
        assert_eq!(deal.board(), parse_cards("2c 7h Th").unwrap());
        assert_eq!(deal.unknown(), 2);
        assert_eq!(deal.remaining().len(), 45);
        assert_eq!(deal.combinations(), 990);
    }

    #[test]
    fn omitted_seats_and_xx_fields_are_unknown() {
        let deal: Deal = "4p QsJs Acxx".parse().unwrap();
        assert_eq!(deal.players(), 4);
        assert_eq!(deal.holes(0), parse_cards("Qs Js").unwrap());
        assert_eq!(deal.holes(1), parse_cards("Ac").unwrap());
        assert!(deal.holes(2).is_empty());
        assert!(deal.holes(3).is_empty());
        // one hidden hole card for seat 1, four for seats 2-3, full board
        assert_eq!(deal.unknown(), 1 + 4 + 5);
    }

    #[test]
    fn fully_specified_deal_has_one_completion() {
        let deal: Deal = "2p AcAd KhKs - 2c 7h Th 9d 3s".parse().unwrap();
        assert_eq!(deal.unknown(), 0);
        assert_eq!(deal.combinations(), 1);
    }

    #[test]
    fn ten_rank_parses_inside_a_hole_group() {
        let deal: Deal = "2p 10c10d".parse().unwrap();
        assert_eq!(deal.holes(0), parse_cards("Tc Td").unwrap());
    }

    #[test]
    fn rejects_bad_spots() {
        assert!(matches!("".parse::<Deal>(), Err(DealError::MissingPlayerCount)));
        assert!(matches!("go".parse::<Deal>(), Err(DealError::MissingPlayerCount)));
        assert!(matches!("0p".parse::<Deal>(), Err(DealError::PlayerCount(0))));
        assert!(matches!("6p".parse::<Deal>(), Err(DealError::PlayerCount(6))));
        assert!(matches!(
            "2p AcAc".parse::<Deal>(),
            Err(DealError::DuplicateCard(_))
        ));
        assert!(matches!(
            "2p AcAd - Ac".parse::<Deal>(),
            Err(DealError::DuplicateCard(_))
        ));
        assert!(matches!(
            "2p AcAdAh".parse::<Deal>(),
            Err(DealError::TooManyHoleCards(3))
        ));
        assert!(matches!(
            "2p AcAd KdKs QhQd".parse::<Deal>(),
            Err(DealError::TooManySeats)
        ));
        assert!(matches!(
            "2p AcAd - 2c 3c 4c 5c 6c 7c".parse::<Deal>(),
            Err(DealError::TooManyBoardCards(6))
        ));
        assert!("2p A".parse::<Deal>().is_err());
    }

    #[test]
    fn remaining_excludes_every_known_card() {
        let deal: Deal = "2p AcAd KhKs - 2c 7h Th".parse().unwrap();
        let deck = deal.remaining();
        assert_eq!(deck.len(), 45);
        for card in parse_cards("Ac Ad Kh Ks 2c 7h Th").unwrap() {
            assert!(!deck.contains(&card));
        }
    }
}
