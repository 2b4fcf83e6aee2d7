use std::cmp::Ordering;

use super::NumericValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    GreaterThan,
    LessThan,
}

/// `member > threshold` and friends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub member: String,
    pub threshold: NumericValue,
    pub direction: Direction,
    pub inclusive: bool,
}

impl Bound {
    pub fn operator(&self) -> &'static str {
        match (self.direction, self.inclusive) {
            (Direction::GreaterThan, false) => ">",
            (Direction::GreaterThan, true) => ">=",
            (Direction::LessThan, false) => "<",
            (Direction::LessThan, true) => "<=",
        }
    }

    pub fn fragment(&self) -> String {
        format!("({} {} {})", self.member, self.operator(), self.threshold.literal())
    }

    pub fn admits(&self, value: &NumericValue) -> bool {
        match (value.compare(&self.threshold), self.direction) {
            (None, _) => false,
            (Some(Ordering::Equal), _) => self.inclusive,
            (Some(Ordering::Greater), Direction::GreaterThan) => true,
            (Some(Ordering::Less), Direction::LessThan) => true,
            (Some(_), _) => false,
        }
    }
}
