//! Structural preconditions a candidate must meet before anything is generated.
//!
//! Checks run in a fixed order and stop at the first failure, so a candidate
//! gets at most one structural diagnostic.
use crate::collect::Candidate;
use crate::diagnostics::{Diagnostic, DiagnosticId, Location, MessageArgs};
use crate::model::{DeclKind, MemberDecl, MemberKind};
use crate::symbols::{Accessibility, HierarchyChain, Piece, SymbolId, SymbolTable};

pub const VALIDATE_METHOD: &str = "Validate";

/// How the generated method relates to what the user already wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Declare a new `Validate()`.
    Fresh,
    /// Supply the body of an existing `partial bool Validate();`.
    CompleteStub,
}

#[derive(Debug, Clone)]
pub struct Checked {
    pub chain: HierarchyChain,
    pub mode: GenerationMode,
}

pub fn check_candidate(table: &SymbolTable<'_>, candidate: &Candidate) -> Result<Checked, Diagnostic> {
    let symbol = candidate.symbol;
    let args = message_args(table, symbol);
    let first = table.first_piece(symbol);

    if !table.kind(symbol).is_supported() {
        return Err(Diagnostic::new(DiagnosticId::UnsupportedTypeDeclaration, location(first), &args));
    }

    if let Some(piece) = table.pieces_of(symbol).find(|p| !p.decl.is_named_type()) {
        let args = args.clone().detail(piece.decl.symbol.clone());
        return Err(Diagnostic::new(DiagnosticId::Unknown, location(piece), &args));
    }

    if let Some(piece) = table.pieces_of(symbol).find(|p| p.decl.has_modifier("static")) {
        return Err(Diagnostic::new(DiagnosticId::StaticType, location(piece), &args));
    }

    let chain = table.chain(symbol);

    if table.accessibility(symbol) != Accessibility::Public {
        return Err(Diagnostic::new(DiagnosticId::NotPublic, location(first), &args));
    }
    for ancestor in chain.ancestors() {
        if table.accessibility(*ancestor) != Accessibility::Public {
            let args = args.clone().containing(table.nested_name(*ancestor));
            let at = location(table.first_piece(*ancestor));
            return Err(Diagnostic::new(DiagnosticId::NotPublicContainingType, at, &args));
        }
    }

    if let Some(piece) = table.non_partial_piece(symbol) {
        return Err(Diagnostic::new(DiagnosticId::NotPartial, location(piece), &args));
    }
    for ancestor in chain.ancestors() {
        if let Some(piece) = table.non_partial_piece(*ancestor) {
            let args = args.clone().containing(table.nested_name(*ancestor));
            return Err(Diagnostic::new(DiagnosticId::NotPartialContainingType, location(piece), &args));
        }
    }

    let mode = existing_validate(table, symbol)
        .map_err(|at| Diagnostic::new(DiagnosticId::ValidateConflict, at, &args))?;

    Ok(Checked { chain, mode })
}

/// `Err` carries the location of the conflicting member.
fn existing_validate(table: &SymbolTable<'_>, symbol: SymbolId) -> Result<GenerationMode, Location> {
    let in_interface = table.kind(symbol) == DeclKind::Interface;

    // A nested type named `Validate` can never coexist with the method.
    for piece in table.pieces_of(symbol) {
        if let Some(nested) = piece.decl.nested.iter().find(|n| n.name == VALIDATE_METHOD) {
            return Err(Location::new(piece.path, nested.span));
        }
    }

    let existing = table
        .pieces_of(symbol)
        .flat_map(|piece| piece.decl.members.iter().map(move |member| (piece, member)))
        .filter(|(_, member)| member.name == VALIDATE_METHOD)
        .filter(|(_, member)| !is_overload(member))
        .collect::<Vec<_>>();

    match existing.as_slice() {
        [] => Ok(GenerationMode::Fresh),
        [(_, member)] if is_compatible_stub(member, in_interface) => Ok(GenerationMode::CompleteStub),
        [(piece, member), ..] => Err(Location::new(piece.path, member.span)),
    }
}

fn is_overload(member: &MemberDecl) -> bool {
    member.kind == MemberKind::Method && !member.parameters.is_empty()
}

fn is_compatible_stub(member: &MemberDecl, in_interface: bool) -> bool {
    let returns_bool = matches!(
        member.ty.as_deref(),
        Some("bool" | "System.Boolean" | "global::System.Boolean")
    );
    let public = match Accessibility::from_modifiers(&member.modifiers) {
        Some(access) => access == Accessibility::Public,
        None => in_interface,
    };
    member.kind == MemberKind::Method
        && member.parameters.is_empty()
        && returns_bool
        && public
        && member.has_modifier("partial")
        && !member.has_body
}

fn message_args(table: &SymbolTable<'_>, symbol: SymbolId) -> MessageArgs {
    MessageArgs::for_type(table.symbol(symbol).namespace.as_deref(), table.nested_name(symbol))
}

fn location(piece: &Piece<'_>) -> Location {
    Location::new(piece.path, piece.decl.span)
}
