use std::fmt;
use std::str::FromStr;

/// Card ranks from Two (low) to Ace (high).
///
/// The discriminant is the rank's bit position in the 16-bit rank planes
/// used by the evaluator, so `1u16 << rank.index()` is the rank's plane bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Rank {
    Two = 0,
    Three = 1,
    Four = 2,
    Five = 3,
    Six = 4,
    Seven = 5,
    Eight = 6,
    Nine = 7,
    Ten = 8,
    Jack = 9,
    Queen = 10,
    King = 11,
    Ace = 12,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Bit position of this rank, 0 (Two) to 12 (Ace).
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_index(index: u8) -> Option<Rank> {
        Rank::ALL.get(usize::from(index)).copied()
    }

    pub const fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RankParseError {
    #[error("invalid rank: '{0}'")]
    Invalid(String),
}

impl FromStr for Rank {
    type Err = RankParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let r = match upper.as_str() {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            _ => return Err(RankParseError::Invalid(s.to_string())),
        };
        Ok(r)
    }
}

/// Four suits; order has no hand-strength meaning but is fixed for the
/// 6-bit card code: C < D < H < S.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_index(index: u8) -> Option<Suit> {
        Suit::ALL.get(usize::from(index)).copied()
    }

    pub const fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SuitParseError {
    #[error("invalid suit: '{0}'")]
    Invalid(String),
}

impl TryFrom<char> for Suit {
    type Error = SuitParseError;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_lowercase() {
            'c' => Ok(Suit::Clubs),
            'd' => Ok(Suit::Diamonds),
            'h' => Ok(Suit::Hearts),
            's' => Ok(Suit::Spades),
            _ => Err(SuitParseError::Invalid(c.to_string())),
        }
    }
}

/// A playing card: rank + suit.
///
/// Every card has a 6-bit wire code (`suit << 4 | rank`) used to pack hands
/// into a [`PackedCards`] word. Rank-field values of 13 and above are the
/// invalid/sentinel region: they never decode to a card.
///
/// ```
/// use equity_rs::cards::{Card, Rank, Suit};
///
/// let card = Card::new(Rank::Ace, Suit::Spades);
/// assert_eq!(card.to_string(), "As");
/// assert_eq!(Card::from_code(card.code()), Some(card));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    /// Lowest rank-field value that does not decode to a card.
    pub const SENTINEL: u8 = 13;

    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn rank(self) -> Rank {
        self.rank
    }

    pub const fn suit(self) -> Suit {
        self.suit
    }

    /// 6-bit wire code: rank in the low 4 bits, suit in bits 4..=5.
    pub const fn code(self) -> u8 {
        (self.suit as u8) << 4 | self.rank as u8
    }

    /// Decode a 6-bit code; `None` for codes in the sentinel region.
    pub fn from_code(code: u8) -> Option<Card> {
        if code >= 64 {
            return None;
        }
        let rank = Rank::from_index(code & 0xF)?;
        let suit = Suit::from_index(code >> 4)?;
        Some(Card::new(rank, suit))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardParseError {
    #[error("invalid card: '{0}'")]
    Invalid(String),
    #[error(transparent)]
    Rank(#[from] RankParseError),
    #[error(transparent)]
    Suit(#[from] SuitParseError),
}

impl FromStr for Card {
    type Err = CardParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.len() < 2 {
            return Err(CardParseError::Invalid(s.to_string()));
        }

        // rank is everything but the last char ("A", "10", ...); suit is the last
        let (rank_str, suit_ch) = match t.char_indices().last() {
            Some((idx, ch)) => (&t[..idx], ch),
            None => return Err(CardParseError::Invalid(s.to_string())),
        };

        let rank = Rank::from_str(rank_str)?;
        let suit = Suit::try_from(suit_ch)?;
        Ok(Card::new(rank, suit))
    }
}

/// Parse multiple cards separated by whitespace or commas.
///
/// ```
/// use equity_rs::cards::{parse_cards, Card, Rank, Suit};
///
/// let cards = parse_cards("As, Kd 10c").unwrap();
/// assert_eq!(cards[0], Card::new(Rank::Ace, Suit::Spades));
/// assert_eq!(cards[1], Card::new(Rank::King, Suit::Diamonds));
/// assert_eq!(cards[2], Card::new(Rank::Ten, Suit::Clubs));
/// ```
pub fn parse_cards(input: &str) -> Result<Vec<Card>, CardParseError> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(Card::from_str)
        .collect()
}

/// Up to ten cards packed six bits per slot into one 64-bit word.
///
/// Cards fill the word from slot 0; unused slots carry the sentinel code and
/// read back as `None`. This is the transport format between the dealer and
/// the evaluator: read-only once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedCards(u64);

impl PackedCards {
    pub const CAPACITY: usize = 10;
    const SLOT_BITS: u32 = 6;
    const SLOT_MASK: u64 = 0x3F;

    /// Pack a sequence of at most [`Self::CAPACITY`] cards. Longer sequences
    /// are a caller contract violation; the excess is dropped.
    pub fn new(cards: &[Card]) -> Self {
        debug_assert!(cards.len() <= Self::CAPACITY, "too many cards to pack");

        let mut word = 0u64;
        for slot in 0..Self::CAPACITY {
            let code = match cards.get(slot) {
                Some(card) => u64::from(card.code()),
                None => u64::from(Card::SENTINEL),
            };
            word |= code << (Self::SLOT_BITS * slot as u32);
        }
        Self(word)
    }

    /// Card in the given slot, `None` for sentinel slots.
    pub fn get(self, slot: usize) -> Option<Card> {
        if slot >= Self::CAPACITY {
            return None;
        }
        let code = (self.0 >> (Self::SLOT_BITS * slot as u32)) & Self::SLOT_MASK;
        Card::from_code(code as u8)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}
