//! Trade direction

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// +1 for long, -1 for short
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// Is `price` strictly on the favourable side of `level`?
    pub fn is_beyond(self, price: Decimal, level: Decimal) -> bool {
        match self {
            Direction::Long => price > level,
            Direction::Short => price < level,
        }
    }

    /// Has `price` reached `level` moving in this direction (inclusive)?
    pub fn reached(self, price: Decimal, level: Decimal) -> bool {
        match self {
            Direction::Long => price >= level,
            Direction::Short => price <= level,
        }
    }

    /// Move `distance` away from `base` in this direction
    pub fn offset(self, base: Decimal, distance: Decimal) -> Decimal {
        base + self.sign() * distance
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_comparisons() {
        assert!(Direction::Long.is_beyond(dec!(101), dec!(100)));
        assert!(!Direction::Long.is_beyond(dec!(100), dec!(100)));
        assert!(Direction::Short.is_beyond(dec!(99), dec!(100)));
        assert!(Direction::Short.reached(dec!(100), dec!(100)));
        assert!(!Direction::Long.reached(dec!(99.99), dec!(100)));
    }

    #[test]
    fn test_offset_and_opposite() {
        assert_eq!(Direction::Long.offset(dec!(100), dec!(2)), dec!(102));
        assert_eq!(Direction::Short.offset(dec!(100), dec!(2)), dec!(98));
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.to_string(), "SHORT");
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&Direction::Long).unwrap();
        assert_eq!(json, "\"LONG\"");
    }
}
