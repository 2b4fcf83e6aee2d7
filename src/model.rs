//! Declaration snapshot exported by the host compiler.
//!
//! The host owns parsing and semantic analysis. What arrives here is the shape
//! of its answers: every type declaration piece per file, with modifiers,
//! resolved attribute names, base lists, and members. Plain data only;
//! deserialized once and never mutated.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One compilation: the union of every source file the host handed over.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Compilation {
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceFile {
    pub path: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Class,
    Struct,
    Interface,
    Record,
    RecordStruct,
    Enum,
    Delegate,
}

/// A single syntactic declaration piece. A `partial` type split over several
/// files shows up as several `TypeDecl`s sharing one qualified name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub kind: DeclKind,
    pub name: String,
    /// Only meaningful on top-level pieces; nested pieces inherit it.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    /// Fully qualified names of the base type and implemented interfaces.
    #[serde(default)]
    pub base_list: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub nested: Vec<TypeDecl>,
    /// Kind of the symbol the host resolved this piece to.
    #[serde(default = "named_type")]
    pub symbol: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    Destructor,
    Event,
    Indexer,
    Operator,
    Conversion,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDecl {
    pub kind: MemberKind,
    pub name: String,
    /// Declared type for fields/properties, return type for methods.
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default = "yes")]
    pub has_body: bool,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// An attribute instance with its class resolved to a fully qualified name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeData {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub named_arguments: IndexMap<String, serde_json::Value>,
}

/// A constructor argument together with the type the host resolved it to.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Argument {
    pub kind: String,
    pub value: serde_json::Value,
}

/// 1-based position; zero means the host did not report one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Span {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

pub const NAMED_TYPE_SYMBOL: &str = "named_type";

fn named_type() -> String {
    NAMED_TYPE_SYMBOL.to_string()
}

fn yes() -> bool {
    true
}

impl Compilation {
    /// Append the files of another snapshot document.
    pub fn merge(&mut self, other: Compilation) {
        self.files.extend(other.files);
    }
}

impl DeclKind {
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Struct | Self::Interface | Self::Record | Self::RecordStruct
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Record => "record",
            Self::RecordStruct => "record struct",
            Self::Enum => "enum",
            Self::Delegate => "delegate",
        }
    }
}

pub(crate) fn has_modifier(modifiers: &[String], modifier: &str) -> bool {
    modifiers.iter().any(|m| m == modifier)
}

impl TypeDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        has_modifier(&self.modifiers, modifier)
    }

    pub fn is_named_type(&self) -> bool {
        self.symbol == NAMED_TYPE_SYMBOL
    }
}

impl MemberDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        has_modifier(&self.modifiers, modifier)
    }

    /// Fields and properties are the only members that carry constraints.
    pub fn is_data_member(&self) -> bool {
        matches!(self.kind, MemberKind::Field | MemberKind::Property)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_in_optional_fields() {
        let compilation: Compilation = serde_json::from_value(json!({
            "files": [{
                "path": "Car.cs",
                "types": [{
                    "kind": "record_struct",
                    "name": "Car",
                    "members": [{ "kind": "property", "name": "Wheels", "type": "int" }]
                }]
            }]
        }))
        .unwrap();
        let ty = &compilation.files[0].types[0];
        assert_eq!(ty.kind, DeclKind::RecordStruct);
        assert!(ty.is_named_type());
        assert!(ty.namespace.is_none());
        assert_eq!(ty.span, Span::default());
        let member = &ty.members[0];
        assert!(member.has_body);
        assert!(member.is_data_member());
        assert_eq!(member.ty.as_deref(), Some("int"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<Compilation>(json!({
            "files": [{ "path": "a.cs", "typez": [] }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn keywords_match_declaration_syntax() {
        assert_eq!(DeclKind::RecordStruct.keyword(), "record struct");
        assert!(DeclKind::Interface.is_supported());
        assert!(!DeclKind::Enum.is_supported());
        assert!(!DeclKind::Delegate.is_supported());
    }
}
