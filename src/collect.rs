//! Candidate discovery.
use crate::config::{KnownSymbols, same_symbol};
use crate::symbols::{SymbolId, SymbolTable};

/// A symbol carrying the generation marker, or already listing the
/// capability interface, on some piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub symbol: SymbolId,
}

/// Symbols with the marker or the capability interface on any piece, in
/// declaration order of their first piece.
pub fn collect_candidates(table: &SymbolTable<'_>, known: &KnownSymbols) -> Vec<Candidate> {
    let candidates = table
        .symbol_ids()
        .filter(|symbol| {
            table.pieces_of(*symbol).any(|p| {
                p.decl.attributes.iter().any(|a| same_symbol(&known.marker, &a.name))
                    || p.decl.base_list.iter().any(|b| same_symbol(&known.capability, b))
            })
        })
        .map(|symbol| Candidate { symbol })
        .collect::<Vec<_>>();
    tracing::debug!(symbols = table.len(), candidates = candidates.len(), "collected candidates");
    candidates
}
