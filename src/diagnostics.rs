//! Diagnostic catalog and reported diagnostics.
//!
//! The catalog is a read-only table built once on first use. A reported
//! diagnostic copies its code and severity out of the catalog and carries the
//! already formatted message, so it never changes after creation.
use std::fmt;

use colored::Colorize;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::model::Span;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticId {
    NotPublic,
    NotPublicContainingType,
    NotPartial,
    NotPartialContainingType,
    StaticType,
    UnsupportedTypeDeclaration,
    ValidateConflict,
    Unknown,
    NoEffect,
    UnsupportedConstraintOperand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Descriptor {
    pub id: DiagnosticId,
    pub code: &'static str,
    pub title: &'static str,
    /// Positional arguments: `{0}` namespace, `{1}` type name,
    /// `{2}` containing type name, `{3}` detail.
    pub format: &'static str,
    pub category: &'static str,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

/// Positional message arguments.
#[derive(Debug, Clone, Default)]
pub struct MessageArgs {
    pub namespace: String,
    pub type_name: String,
    pub containing_type: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

/// Additive per-candidate collection of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    items: Vec<Diagnostic>,
}

// ————————————————————————————————————————————————————————————————————————————
// CATALOG
// ————————————————————————————————————————————————————————————————————————————

pub const CATEGORY: &str = "FastValidate.CodeGen";

/// How a type in the global namespace shows up in messages.
pub const GLOBAL_NAMESPACE: &str = "<global>";

static CATALOG: Lazy<IndexMap<DiagnosticId, Descriptor>> = Lazy::new(|| {
    let entries = [
        (
            DiagnosticId::NotPublic,
            "ERR-FV-001",
            "type must be public",
            "type '{0}.{1}' must be declared as public",
            Severity::Error,
        ),
        (
            DiagnosticId::NotPublicContainingType,
            "ERR-FV-001b",
            "type must be public",
            "containing type '{0}.{2}' of type '{0}.{1}' must be declared as public",
            Severity::Error,
        ),
        (
            DiagnosticId::NotPartial,
            "ERR-FV-002",
            "type must be partial",
            "type '{0}.{1}' must be declared as partial",
            Severity::Error,
        ),
        (
            DiagnosticId::NotPartialContainingType,
            "ERR-FV-002b",
            "type must be partial",
            "containing type '{0}.{2}' of type '{0}.{1}' must be declared as partial",
            Severity::Error,
        ),
        (
            DiagnosticId::StaticType,
            "ERR-FV-003",
            "cannot generate validations for static type",
            "cannot generate validations for static type {0}.{1}",
            Severity::Error,
        ),
        (
            DiagnosticId::UnsupportedTypeDeclaration,
            "ERR-FV-004",
            "unsupported type declaration",
            "unsupported type of declaration, FastValidate currently only supports class, struct, interface, record, and record struct types",
            Severity::Error,
        ),
        (
            DiagnosticId::ValidateConflict,
            "ERR-FV-005",
            "conflicting Validate member",
            "type '{0}.{1}' already declares a member 'Validate' that is not a compatible partial stub",
            Severity::Error,
        ),
        (
            DiagnosticId::Unknown,
            "ERR-FV-999",
            "unknown error",
            "unknown error occurred while generating. symbol type '{3}'",
            Severity::Error,
        ),
        (
            DiagnosticId::NoEffect,
            "WARN-FV-001",
            "validation marker has no effect",
            "Validate attribute will have no effect as no members have defined validators",
            Severity::Warning,
        ),
        (
            DiagnosticId::UnsupportedConstraintOperand,
            "WARN-FV-002",
            "constraint operand not supported",
            "constraint on member '{3}' of type '{0}.{1}' was ignored: operand is missing or not a supported numeric value",
            Severity::Warning,
        ),
    ];
    entries
        .into_iter()
        .map(|(id, code, title, format, severity)| {
            let descriptor = Descriptor { id, code, title, format, category: CATEGORY, severity };
            (id, descriptor)
        })
        .collect()
});

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\d)\}").unwrap());

/// Every descriptor, in catalog order.
pub fn catalog() -> impl Iterator<Item = &'static Descriptor> {
    CATALOG.values()
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl DiagnosticId {
    pub fn descriptor(self) -> &'static Descriptor {
        &CATALOG[&self]
    }
}

impl Descriptor {
    pub fn format_message(&self, args: &MessageArgs) -> String {
        PLACEHOLDER
            .replace_all(self.format, |caps: &Captures| match &caps[1] {
                "0" => args.namespace.clone(),
                "1" => args.type_name.clone(),
                "2" => args.containing_type.clone(),
                "3" => args.detail.clone(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl Location {
    pub fn new(path: &str, span: Span) -> Self {
        Self { path: path.to_string(), line: span.line, column: span.column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            return write!(f, "{}", self.path);
        }
        write!(f, "{}:{}:{}", self.path, self.line, self.column.max(1))
    }
}

impl MessageArgs {
    pub fn for_type(namespace: Option<&str>, type_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.unwrap_or(GLOBAL_NAMESPACE).to_string(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn containing(mut self, containing_type: impl Into<String>) -> Self {
        self.containing_type = containing_type.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl Diagnostic {
    pub fn new(id: DiagnosticId, location: Location, args: &MessageArgs) -> Self {
        let descriptor = id.descriptor();
        Self {
            id,
            code: descriptor.code,
            severity: descriptor.severity,
            message: descriptor.format_message(args),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Terminal rendering with colored severity.
    pub fn render(&self) -> String {
        let severity = match self.severity {
            Severity::Error => format!("error[{}]", self.code).red().bold(),
            Severity::Warning => format!("warning[{}]", self.code).yellow().bold(),
        };
        format!("{}: {severity}: {}", self.location.to_string().bold(), self.message)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.pad("error"),
            Self::Warning => f.pad("warning"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}[{}]: {}", self.location, self.severity, self.code, self.message)
    }
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = diagnostic.code, location = %diagnostic.location, "{}", diagnostic.message);
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Extend<Diagnostic> for DiagnosticBag {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.report(diagnostic);
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique() {
        let codes = catalog().map(|d| d.code).collect::<HashSet<_>>();
        assert_eq!(codes.len(), catalog().count());
    }

    #[test]
    fn messages_fill_positional_arguments() {
        let args = MessageArgs::for_type(Some("A"), "Outer.Car").containing("Outer");
        let d = Diagnostic::new(
            DiagnosticId::NotPartialContainingType,
            Location::new("Car.cs", Span { line: 3, column: 5 }),
            &args,
        );
        assert_eq!(d.code, "ERR-FV-002b");
        assert_eq!(d.message, "containing type 'A.Outer' of type 'A.Outer.Car' must be declared as partial");
        assert_eq!(
            d.to_string(),
            "Car.cs:3:5: error[ERR-FV-002b]: containing type 'A.Outer' of type 'A.Outer.Car' must be declared as partial"
        );
    }

    #[test]
    fn global_namespace_and_missing_span() {
        let d = Diagnostic::new(
            DiagnosticId::StaticType,
            Location::new("Util.cs", Span::default()),
            &MessageArgs::for_type(None, "Util"),
        );
        assert_eq!(d.to_string(), "Util.cs: error[ERR-FV-003]: cannot generate validations for static type <global>.Util");
        assert!(d.is_error());
    }

    #[test]
    fn no_effect_is_a_warning() {
        let descriptor = DiagnosticId::NoEffect.descriptor();
        assert_eq!(descriptor.severity, Severity::Warning);
        assert_eq!(descriptor.code, "WARN-FV-001");
        let mut bag = DiagnosticBag::new();
        bag.report(Diagnostic::new(DiagnosticId::NoEffect, Location::default(), &MessageArgs::default()));
        assert_eq!(bag.len(), 1);
        assert!(!bag.has_errors());
    }
}
