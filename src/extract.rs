//! Constraint extraction from member annotations.
use indexmap::IndexMap;

use crate::config::{KnownSymbols, same_symbol};
use crate::constraint::{Constraint, NumericValue};
use crate::diagnostics::Location;
use crate::model::{AttributeData, MemberDecl};
use crate::symbols::{SymbolId, SymbolTable};

/// Constraints per member name, in member declaration order. Members without
/// constraints are absent.
pub type ConstraintMap = IndexMap<String, Vec<Constraint>>;

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub constraints: ConstraintMap,
    pub dropped: Vec<Dropped>,
}

/// A recognized annotation whose operands did not pass the numeric-kind check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropped {
    pub member: String,
    pub attribute: String,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annotation {
    GreaterThan,
    LessThan,
    Between,
}

const INCLUSIVE: &str = "Inclusive";

pub fn extract_constraints(table: &SymbolTable<'_>, symbol: SymbolId, known: &KnownSymbols) -> Extraction {
    let mut extraction = Extraction::default();
    for piece in table.pieces_of(symbol) {
        for member in piece.decl.members.iter().filter(|m| m.is_data_member()) {
            for attribute in &member.attributes {
                let Some(annotation) = Annotation::recognize(known, &attribute.name) else {
                    continue;
                };
                match annotation.build(member, attribute) {
                    Some(constraint) => extraction
                        .constraints
                        .entry(member.name.clone())
                        .or_default()
                        .push(constraint),
                    None => {
                        tracing::trace!(member = %member.name, attribute = %attribute.name, "dropped constraint");
                        extraction.dropped.push(Dropped {
                            member: member.name.clone(),
                            attribute: attribute.name.clone(),
                            location: Location::new(piece.path, member.span),
                        });
                    }
                }
            }
        }
    }
    extraction
}

impl Annotation {
    fn recognize(known: &KnownSymbols, name: &str) -> Option<Self> {
        if same_symbol(&known.greater_than, name) {
            Some(Self::GreaterThan)
        } else if same_symbol(&known.less_than, name) {
            Some(Self::LessThan)
        } else if same_symbol(&known.between, name) {
            Some(Self::Between)
        } else {
            None
        }
    }

    /// `None` when an operand is missing or not one of the numeric kinds.
    fn build(self, member: &MemberDecl, attribute: &AttributeData) -> Option<Constraint> {
        let operand = |i: usize| attribute.arguments.get(i).and_then(NumericValue::from_argument);
        let inclusive = attribute
            .named_arguments
            .get(INCLUSIVE)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let constraint = match self {
            Self::GreaterThan => Constraint::greater_than(&member.name, operand(0)?, inclusive),
            Self::LessThan => Constraint::less_than(&member.name, operand(0)?, inclusive),
            Self::Between => Constraint::between(&member.name, operand(0)?, operand(1)?),
        };
        Some(constraint)
    }
}
