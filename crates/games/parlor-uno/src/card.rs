use serde::{Deserialize, Serialize};

/// Card color. `Black` is reserved for the two wild kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardColor {
    Red,
    Yellow,
    Green,
    Blue,
    Black,
}

impl CardColor {
    pub fn index(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Yellow => 1,
            Self::Green => 2,
            Self::Blue => 3,
            Self::Black => 4,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Red),
            1 => Some(Self::Yellow),
            2 => Some(Self::Green),
            3 => Some(Self::Blue),
            4 => Some(Self::Black),
            _ => None,
        }
    }
}

/// Card face: digits 0-9, the three function cards, and the two wilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardContent {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Skip,
    Draw2,
    Reverse,
    Wild,
    WildDraw4,
}

impl CardContent {
    pub fn index(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Skip => 10,
            Self::Draw2 => 11,
            Self::Reverse => 12,
            Self::Wild => 13,
            Self::WildDraw4 => 14,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Five),
            6 => Some(Self::Six),
            7 => Some(Self::Seven),
            8 => Some(Self::Eight),
            9 => Some(Self::Nine),
            10 => Some(Self::Skip),
            11 => Some(Self::Draw2),
            12 => Some(Self::Reverse),
            13 => Some(Self::Wild),
            14 => Some(Self::WildDraw4),
            _ => None,
        }
    }
}

/// A single UNO card. Wire encoding is `color * 16 + content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: CardColor,
    pub content: CardContent,
}

impl Card {
    pub fn new(color: CardColor, content: CardContent) -> Self {
        Self { color, content }
    }

    pub fn code(self) -> u8 {
        self.color.index() * 16 + self.content.index()
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(Self {
            color: CardColor::from_index(code / 16)?,
            content: CardContent::from_index(code % 16)?,
        })
    }

    /// Digit cards only; function cards and wilds are excluded.
    pub fn is_number(self) -> bool {
        self.content.index() <= 9
    }

    pub fn is_wild(self) -> bool {
        matches!(self.content, CardContent::Wild | CardContent::WildDraw4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip_for_every_pair() {
        for color_idx in 0..=4u8 {
            for content_idx in 0..=14u8 {
                let card = Card {
                    color: CardColor::from_index(color_idx).unwrap(),
                    content: CardContent::from_index(content_idx).unwrap(),
                };
                assert_eq!(Card::from_code(card.code()), Some(card));
            }
        }
    }

    #[test]
    fn known_codes() {
        // Red 5
        assert_eq!(Card::new(CardColor::Red, CardContent::Five).code(), 5);
        // Blue SKIP
        assert_eq!(Card::new(CardColor::Blue, CardContent::Skip).code(), 58);
        // The wild-draw-4 the clients watch for
        assert_eq!(
            Card::new(CardColor::Black, CardContent::WildDraw4).code(),
            78
        );
    }

    #[test]
    fn out_of_range_codes_rejected() {
        assert!(Card::from_code(5 * 16).is_none());
        assert!(Card::from_code(15).is_none());
    }

    #[test]
    fn number_classification() {
        assert!(Card::new(CardColor::Red, CardContent::Zero).is_number());
        assert!(Card::new(CardColor::Green, CardContent::Nine).is_number());
        assert!(!Card::new(CardColor::Red, CardContent::Skip).is_number());
        assert!(!Card::new(CardColor::Black, CardContent::Wild).is_number());
    }
}
