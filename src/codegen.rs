//! Source emission for generated `Validate()` methods.
//!
//! The artifact re-opens every type of the hierarchy chain as a
//! `public partial` declaration, outermost first, and puts the method on the
//! innermost one.
use serde::Serialize;

use crate::check::{GenerationMode, VALIDATE_METHOD};
use crate::constraint::Constraint;
use crate::model::DeclKind;
use crate::symbols::{HierarchyChain, SymbolTable};

const GENERATOR_NAME: &str = "fast-validate";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One re-declared level of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLevel {
    pub kind: DeclKind,
    pub name: String,
    pub type_parameters: Vec<String>,
}

/// Everything emission needs, detached from the symbol table.
#[derive(Debug, Clone)]
pub struct EmitPlan {
    pub namespace: Option<String>,
    /// Outermost first; the last level is the candidate.
    pub levels: Vec<TypeLevel>,
    pub capability: String,
    pub mode: GenerationMode,
    /// Already sorted by ordering key.
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Unique per candidate, e.g. `A.Outer.Box{T}.Validate.g.cs`. Braces never
    /// occur in identifiers, so generic and non-generic names stay apart.
    pub hint_name: String,
    /// Qualified display name, e.g. `A.Outer.Box`.
    pub type_name: String,
    pub source: String,
}

pub struct Codegen {
    indent: usize,
    depth: usize,
    out: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl EmitPlan {
    pub fn new(
        table: &SymbolTable<'_>,
        chain: &HierarchyChain,
        capability: &str,
        mode: GenerationMode,
        constraints: Vec<Constraint>,
    ) -> Self {
        let levels = chain
            .links()
            .iter()
            .map(|link| {
                let first = table.first_piece(*link).decl;
                TypeLevel {
                    kind: first.kind,
                    name: first.name.clone(),
                    type_parameters: first.type_parameters.clone(),
                }
            })
            .collect();
        Self {
            namespace: table.symbol(chain.candidate()).namespace.clone(),
            levels,
            capability: capability.strip_prefix("global::").unwrap_or(capability).to_string(),
            mode,
            constraints,
        }
    }

    pub fn type_name(&self) -> String {
        self.qualified(|level| level.name.clone())
    }

    pub fn hint_name(&self) -> String {
        let stem = self.qualified(|level| match level.type_parameters.as_slice() {
            [] => level.name.clone(),
            params => format!("{}{{{}}}", level.name, params.join(",")),
        });
        format!("{stem}.{VALIDATE_METHOD}.g.cs")
    }

    fn qualified(&self, render: impl Fn(&TypeLevel) -> String) -> String {
        self.namespace
            .iter()
            .cloned()
            .chain(self.levels.iter().map(render))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl TypeLevel {
    fn header(&self) -> String {
        let mut header = format!("public partial {} {}", self.kind.keyword(), self.name);
        if !self.type_parameters.is_empty() {
            header.push('<');
            header.push_str(&self.type_parameters.join(", "));
            header.push('>');
        }
        header
    }
}

impl Codegen {
    pub fn new(indent: usize) -> Self {
        Self { indent, depth: 0, out: String::new() }
    }

    pub fn emit(&mut self, plan: &EmitPlan) {
        self.line("// <auto-generated/>");
        self.line(&format!("// Generated by {GENERATOR_NAME}"));
        if let Some(namespace) = &plan.namespace {
            self.line(&format!("namespace {namespace}"));
            self.open();
        }
        let innermost = plan.levels.len().saturating_sub(1);
        for (index, level) in plan.levels.iter().enumerate() {
            let mut header = level.header();
            if index == innermost {
                header.push_str(&format!(" : global::{}", plan.capability));
            }
            self.line(&header);
            self.open();
        }
        self.method(plan);
        for _ in &plan.levels {
            self.close();
        }
        if plan.namespace.is_some() {
            self.close();
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn method(&mut self, plan: &EmitPlan) {
        let in_interface = plan.levels.last().is_some_and(|l| l.kind == DeclKind::Interface);
        let signature = match (plan.mode, in_interface) {
            // interfaces implement the capability member explicitly
            (GenerationMode::Fresh, true) => format!("bool global::{}.{VALIDATE_METHOD}()", plan.capability),
            (GenerationMode::Fresh, false) => format!("public bool {VALIDATE_METHOD}()"),
            (GenerationMode::CompleteStub, _) => format!("public partial bool {VALIDATE_METHOD}()"),
        };
        self.line(&signature);
        self.open();
        match plan.constraints.split_first() {
            None => self.line("return true;"),
            Some((first, [])) => self.line(&format!("return {};", first.fragment())),
            Some((first, rest)) => {
                self.line(&format!("return {}", first.fragment()));
                self.depth += 1;
                for (i, constraint) in rest.iter().enumerate() {
                    let end = if i + 1 == rest.len() { ";" } else { "" };
                    self.line(&format!("&& {}{end}", constraint.fragment()));
                }
                self.depth -= 1;
            }
        }
        self.close();
    }

    fn open(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(&" ".repeat(self.depth * self.indent));
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// Render a plan into its artifact.
pub fn render(plan: &EmitPlan, indent: usize) -> Artifact {
    let mut codegen = Codegen::new(indent);
    codegen.emit(plan);
    Artifact {
        hint_name: plan.hint_name(),
        type_name: plan.type_name(),
        source: codegen.into_string(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::NumericValue;
    use pretty_assertions::assert_eq;

    fn level(kind: DeclKind, name: &str, type_parameters: &[&str]) -> TypeLevel {
        TypeLevel {
            kind,
            name: name.into(),
            type_parameters: type_parameters.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn plan(namespace: Option<&str>, levels: Vec<TypeLevel>, constraints: Vec<Constraint>) -> EmitPlan {
        EmitPlan {
            namespace: namespace.map(str::to_string),
            levels,
            capability: "FastValidate.IFastValidatable".into(),
            mode: GenerationMode::Fresh,
            constraints,
        }
    }

    #[test]
    fn nested_chain_in_namespace() {
        let constraints = vec![
            Constraint::greater_than("NWheels", NumericValue::Int32(3), false),
            Constraint::less_than("NWheels", NumericValue::Int32(5), false),
        ];
        let p = plan(
            Some("A"),
            vec![level(DeclKind::Class, "Outer", &[]), level(DeclKind::Class, "Car", &[])],
            constraints,
        );
        let artifact = render(&p, 4);
        assert_eq!(artifact.hint_name, "A.Outer.Car.Validate.g.cs");
        assert_eq!(artifact.type_name, "A.Outer.Car");
        assert_eq!(
            artifact.source,
            "\
// <auto-generated/>
// Generated by fast-validate
namespace A
{
    public partial class Outer
    {
        public partial class Car : global::FastValidate.IFastValidatable
        {
            public bool Validate()
            {
                return (NWheels > 3)
                    && (NWheels < 5);
            }
        }
    }
}
"
        );
    }

    #[test]
    fn global_namespace_generic_record_struct() {
        let p = plan(
            None,
            vec![level(DeclKind::RecordStruct, "Pair", &["TKey", "TValue"])],
            vec![Constraint::between("Count", NumericValue::Int64(0), NumericValue::Int64(10))],
        );
        let artifact = render(&p, 2);
        assert_eq!(artifact.hint_name, "Pair{TKey,TValue}.Validate.g.cs");
        assert_eq!(
            artifact.source,
            "\
// <auto-generated/>
// Generated by fast-validate
public partial record struct Pair<TKey, TValue> : global::FastValidate.IFastValidatable
{
  public bool Validate()
  {
    return (Count > 0L && Count < 10L);
  }
}
"
        );
    }

    #[test]
    fn interface_candidate_implements_capability_method() {
        let p = plan(
            Some("Shapes"),
            vec![level(DeclKind::Interface, "IShape", &[])],
            vec![Constraint::greater_than("Sides", NumericValue::Int32(2), false)],
        );
        let source = render(&p, 4).source;
        assert!(
            source.contains("    public partial interface IShape : global::FastValidate.IFastValidatable\n"),
            "{source}"
        );
        assert!(source.contains("        bool global::FastValidate.IFastValidatable.Validate()\n"), "{source}");
        assert!(!source.contains("public bool Validate()"), "{source}");
    }

    #[test]
    fn stub_completion_and_empty_conjunction() {
        let mut p = plan(Some("A.B"), vec![level(DeclKind::Struct, "Point", &[])], vec![]);
        p.mode = GenerationMode::CompleteStub;
        let source = render(&p, 4).source;
        assert!(source.contains("        public partial bool Validate()\n"), "{source}");
        assert!(source.contains("            return true;\n"), "{source}");
        assert!(source.contains("namespace A.B\n{\n"), "{source}");
    }
}
