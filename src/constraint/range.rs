use std::cmp::Ordering;

use super::NumericValue;

/// Strictly between `low` and `high`; both ends excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub member: String,
    pub low: NumericValue,
    pub high: NumericValue,
}

impl Range {
    pub fn fragment(&self) -> String {
        format!(
            "({m} > {low} && {m} < {high})",
            m = self.member,
            low = self.low.literal(),
            high = self.high.literal(),
        )
    }

    pub fn admits(&self, value: &NumericValue) -> bool {
        value.compare(&self.low) == Some(Ordering::Greater)
            && value.compare(&self.high) == Some(Ordering::Less)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_ends_are_exclusive() {
        let r = Range {
            member: "Number".into(),
            low: NumericValue::Int32(3),
            high: NumericValue::Int32(5),
        };
        assert_eq!(r.fragment(), "(Number > 3 && Number < 5)");
        assert!(r.admits(&NumericValue::Int32(4)));
        assert!(!r.admits(&NumericValue::Int32(3)));
        assert!(!r.admits(&NumericValue::Int32(5)));
    }

    #[test]
    fn inverted_range_admits_nothing() {
        let r = Range {
            member: "Ratio".into(),
            low: NumericValue::Double(ordered_float::OrderedFloat(1.0)),
            high: NumericValue::Double(ordered_float::OrderedFloat(0.0)),
        };
        assert_eq!(r.fragment(), "(Ratio > 1D && Ratio < 0D)");
        assert!(!r.admits(&NumericValue::Double(ordered_float::OrderedFloat(0.5))));
    }
}
