//! Member-level constraints.
//!
//! Each constraint renders its own boolean fragment and carries an ordering
//! key. The key is total over the constraint's content (priority, member
//! position, shape, operands), so the generated conjunction does not depend on
//! the order annotations were written in.
pub mod bound;
pub mod numeric;
pub mod range;

pub use bound::{Bound, Direction};
pub use numeric::{NumericKind, NumericValue};
pub use range::Range;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Bound(Bound),
    Range(Range),
}

/// Sort key for the generated conjunction. Lower sorts first.
///
/// `priority` is the evaluation-cost tier; cheap checks get low values so they
/// short-circuit first. Every numeric comparison currently shares tier 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderingKey {
    pub priority: u32,
    pub member_index: usize,
    pub shape: u8,
    pub operands: (NumericValue, Option<NumericValue>),
}

/// A constraint tagged with the position its member was declared at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlacedConstraint {
    pub member_index: usize,
    pub constraint: Constraint,
}

const NUMERIC_COMPARISON_PRIORITY: u32 = 0;

impl Constraint {
    pub fn greater_than(member: impl Into<String>, threshold: NumericValue, inclusive: bool) -> Self {
        Self::Bound(Bound {
            member: member.into(),
            threshold,
            direction: Direction::GreaterThan,
            inclusive,
        })
    }

    pub fn less_than(member: impl Into<String>, threshold: NumericValue, inclusive: bool) -> Self {
        Self::Bound(Bound {
            member: member.into(),
            threshold,
            direction: Direction::LessThan,
            inclusive,
        })
    }

    pub fn between(member: impl Into<String>, low: NumericValue, high: NumericValue) -> Self {
        Self::Range(Range { member: member.into(), low, high })
    }

    pub fn member(&self) -> &str {
        match self {
            Self::Bound(b) => &b.member,
            Self::Range(r) => &r.member,
        }
    }

    pub fn priority(&self) -> u32 {
        match self {
            Self::Bound(_) | Self::Range(_) => NUMERIC_COMPARISON_PRIORITY,
        }
    }

    fn shape(&self) -> u8 {
        match self {
            Self::Bound(b) => match (b.direction, b.inclusive) {
                (Direction::GreaterThan, false) => 0,
                (Direction::GreaterThan, true) => 1,
                (Direction::LessThan, false) => 2,
                (Direction::LessThan, true) => 3,
            },
            Self::Range(_) => 4,
        }
    }

    pub fn ordering_key(&self, member_index: usize) -> OrderingKey {
        let operands = match self {
            Self::Bound(b) => (b.threshold.clone(), None),
            Self::Range(r) => (r.low.clone(), Some(r.high.clone())),
        };
        OrderingKey {
            priority: self.priority(),
            member_index,
            shape: self.shape(),
            operands,
        }
    }

    pub fn fragment(&self) -> String {
        match self {
            Self::Bound(b) => b.fragment(),
            Self::Range(r) => r.fragment(),
        }
    }

    pub fn admits(&self, value: &NumericValue) -> bool {
        match self {
            Self::Bound(b) => b.admits(value),
            Self::Range(r) => r.admits(value),
        }
    }
}

impl PlacedConstraint {
    pub fn ordering_key(&self) -> OrderingKey {
        self.constraint.ordering_key(self.member_index)
    }
}

/// Stable sort by ordering key; equal keys keep discovery order.
pub fn sort_constraints(mut constraints: Vec<PlacedConstraint>) -> Vec<Constraint> {
    constraints.sort_by_cached_key(PlacedConstraint::ordering_key);
    constraints.into_iter().map(|p| p.constraint).collect()
}

/// Evaluate an ordered conjunction the way the generated method does:
/// left to right, stopping at the first failing check. A member without a
/// value fails its checks.
pub fn evaluate<'a>(
    constraints: &[Constraint],
    lookup: impl Fn(&str) -> Option<&'a NumericValue>,
) -> bool {
    constraints
        .iter()
        .all(|c| lookup(c.member()).is_some_and(|v| c.admits(v)))
}
