//! One generation pass over a compilation.
//!
//! Candidates run on the rayon pool. Each one reads the shared symbol table and
//! produces its own [`Outcome`]; outcomes are merged in candidate order so the
//! result does not depend on scheduling.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::check::check_candidate;
use crate::codegen::{Artifact, EmitPlan, render};
use crate::collect::{Candidate, collect_candidates};
use crate::config::GeneratorConfig;
use crate::constraint::{PlacedConstraint, sort_constraints};
use crate::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticId, Location, MessageArgs};
use crate::extract::extract_constraints;
use crate::model::Compilation;
use crate::symbols::SymbolTable;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Shared flag that abandons outstanding candidates once set.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratorOutput {
    pub artifacts: Vec<Artifact>,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the pass stopped early; completed candidates are still present.
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct Outcome {
    artifact: Option<Artifact>,
    diagnostics: DiagnosticBag,
}

pub struct Generator {
    config: GeneratorConfig,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl GeneratorOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, compilation: &Compilation) -> GeneratorOutput {
        self.run_with(compilation, &Cancellation::new())
    }

    pub fn run_with(&self, compilation: &Compilation, cancellation: &Cancellation) -> GeneratorOutput {
        let table = SymbolTable::build(compilation);
        let candidates = collect_candidates(&table, &self.config.symbols);

        let outcomes = candidates
            .par_iter()
            .map(|candidate| {
                if cancellation.is_cancelled() {
                    return None;
                }
                accept(cancellation, self.process(&table, candidate))
            })
            .collect::<Vec<_>>();

        let mut output = GeneratorOutput::default();
        for outcome in outcomes.into_iter().flatten() {
            output.artifacts.extend(outcome.artifact);
            output.diagnostics.extend(outcome.diagnostics.into_vec());
        }
        output.cancelled = cancellation.is_cancelled();
        tracing::info!(
            candidates = candidates.len(),
            artifacts = output.artifacts.len(),
            diagnostics = output.diagnostics.len(),
            cancelled = output.cancelled,
            "generation pass finished"
        );
        output
    }

    fn process(&self, table: &SymbolTable<'_>, candidate: &Candidate) -> Outcome {
        let mut outcome = Outcome::default();
        let symbol = candidate.symbol;
        let name = table.nested_name(symbol);

        let checked = match check_candidate(table, candidate) {
            Ok(checked) => checked,
            Err(diagnostic) => {
                tracing::debug!(candidate = %name, code = diagnostic.code, "precondition failed");
                outcome.diagnostics.report(diagnostic);
                return outcome;
            }
        };

        let args = MessageArgs::for_type(table.symbol(symbol).namespace.as_deref(), name.clone());
        let extraction = extract_constraints(table, symbol, &self.config.symbols);
        if self.config.report_dropped_constraints {
            for dropped in &extraction.dropped {
                let args = args.clone().detail(dropped.member.clone());
                outcome.diagnostics.report(Diagnostic::new(
                    DiagnosticId::UnsupportedConstraintOperand,
                    dropped.location.clone(),
                    &args,
                ));
            }
        }

        if extraction.constraints.is_empty() {
            let first = table.first_piece(symbol);
            let at = Location::new(first.path, first.decl.span);
            outcome.diagnostics.report(Diagnostic::new(DiagnosticId::NoEffect, at, &args));
            return outcome;
        }

        let placed = extraction
            .constraints
            .into_iter()
            .enumerate()
            .flat_map(|(member_index, (_, constraints))| {
                constraints
                    .into_iter()
                    .map(move |constraint| PlacedConstraint { member_index, constraint })
            })
            .collect::<Vec<_>>();
        tracing::debug!(candidate = %name, constraints = placed.len(), "extracted constraints");

        let plan = EmitPlan::new(
            table,
            &checked.chain,
            &self.config.symbols.capability,
            checked.mode,
            sort_constraints(placed),
        );
        let artifact = render(&plan, self.config.indent);
        tracing::debug!(hint = %artifact.hint_name, "emitted artifact");
        outcome.artifact = Some(artifact);
        outcome
    }
}

/// A result finished after cancellation is discarded whole.
fn accept(cancellation: &Cancellation, outcome: Outcome) -> Option<Outcome> {
    (!cancellation.is_cancelled()).then_some(outcome)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, NumericValue, evaluate};
    use crate::extract::extract_constraints;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    const MARKER: &str = "FastValidate.Attributes.GenerateValidateMethodAttribute";

    fn compile(types: Value) -> Compilation {
        serde_json::from_value(json!({ "files": [{ "path": "Model.cs", "types": types }] })).unwrap()
    }

    fn gt(value: i64) -> Value {
        json!({ "name": "FastValidate.Attributes.Validate.GreaterThanAttribute",
                "arguments": [{ "kind": "int", "value": value }] })
    }

    fn lt(value: i64) -> Value {
        json!({ "name": "FastValidate.Attributes.LessThanAttribute",
                "arguments": [{ "kind": "int", "value": value }] })
    }

    fn between(low: i64, high: i64) -> Value {
        json!({ "name": "FastValidate.Attributes.Validate.BetweenAttribute",
                "arguments": [{ "kind": "int", "value": low }, { "kind": "int", "value": high }] })
    }

    fn car(modifiers: &[&str], members: Value) -> Value {
        json!({ "kind": "class", "name": "Car", "namespace": "A", "modifiers": modifiers,
                "attributes": [{ "name": MARKER }], "members": members })
    }

    fn property(name: &str, attributes: Vec<Value>) -> Value {
        json!({ "kind": "property", "name": name, "type": "int", "modifiers": ["public"], "attributes": attributes })
    }

    fn codes(output: &GeneratorOutput) -> Vec<&'static str> {
        output.diagnostics.iter().map(|d| d.code).collect()
    }

    fn body(output: &GeneratorOutput) -> String {
        body_of(&output.artifacts[0])
    }

    fn body_of(artifact: &Artifact) -> String {
        let source = &artifact.source;
        let start = source.find("return ").unwrap();
        let end = source[start..].find(';').unwrap();
        source[start..start + end].split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let compilation = compile(json!([car(
            &["public", "partial"],
            json!([property("NWheels", vec![gt(3), lt(5)]), property("Doors", vec![between(1, 6)])])
        )]));
        let generator = Generator::new(GeneratorConfig::default());
        let first = generator.run(&compilation);
        for _ in 0..8 {
            assert_eq!(generator.run(&compilation).artifacts, first.artifacts);
        }
        assert_eq!(body(&first), "return (NWheels > 3) && (NWheels < 5) && (Doors > 1 && Doors < 6)");
    }

    #[test]
    fn annotation_order_does_not_matter() {
        let generator = Generator::new(GeneratorConfig::default());
        let forward = compile(json!([car(&["public", "partial"], json!([property("N", vec![lt(9), gt(1), between(2, 8)])]))]));
        let backward = compile(json!([car(&["public", "partial"], json!([property("N", vec![between(2, 8), gt(1), lt(9)])]))]));
        assert_eq!(generator.run(&forward).artifacts, generator.run(&backward).artifacts);
    }

    #[test]
    fn exclusive_bound_and_range_semantics() {
        let marked = |name: &str, attribute: Value| {
            json!({ "kind": "class", "name": name, "namespace": "A", "modifiers": ["public", "partial"],
                    "attributes": [{ "name": MARKER }], "members": [property("Number", vec![attribute])] })
        };
        let compilation = compile(json!([marked("Bounded", gt(5)), marked("Ranged", between(3, 5))]));
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        let bodies = output.artifacts.iter().map(body_of).collect::<Vec<_>>();
        assert_eq!(bodies, ["return (Number > 5)", "return (Number > 3 && Number < 5)"]);

        // the constraints behind those bodies, evaluated the way the method runs
        let table = SymbolTable::build(&compilation);
        let known = GeneratorConfig::default().symbols;
        let extracted = collect_candidates(&table, &known)
            .iter()
            .map(|c| {
                let constraints = extract_constraints(&table, c.symbol, &known).constraints;
                constraints.into_values().flatten().collect::<Vec<Constraint>>()
            })
            .collect::<Vec<_>>();
        for (constraints, body) in extracted.iter().zip(&bodies) {
            assert_eq!(format!("return {}", constraints[0].fragment()), *body);
        }
        let holds = |constraints: &[Constraint], v: i32| {
            let value = NumericValue::Int32(v);
            evaluate(constraints, |_| Some(&value))
        };
        let (bound, range) = (&extracted[0], &extracted[1]);
        assert!(holds(bound, 6));
        assert!(!holds(bound, 5));
        assert!(!holds(bound, 4));
        assert!(holds(range, 4));
        assert!(!holds(range, 3));
        assert!(!holds(range, 5));
    }

    #[test]
    fn generic_and_suffixed_names_get_distinct_hints() {
        let compilation = compile(json!([
            { "kind": "class", "name": "Box", "namespace": "A", "modifiers": ["public", "partial"],
              "type_parameters": ["T"], "attributes": [{ "name": MARKER }], "members": [property("N", vec![gt(0)])] },
            { "kind": "class", "name": "Box_1", "namespace": "A", "modifiers": ["public", "partial"],
              "attributes": [{ "name": MARKER }], "members": [property("N", vec![gt(0)])] }
        ]));
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        let hints = output.artifacts.iter().map(|a| a.hint_name.as_str()).collect::<Vec<_>>();
        assert_eq!(hints, ["A.Box{T}.Validate.g.cs", "A.Box_1.Validate.g.cs"]);
    }

    #[test]
    fn marker_without_constraints_warns_once() {
        let compilation = compile(json!([car(&["public", "partial"], json!([property("Name", vec![])]))]));
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        assert_eq!(codes(&output), ["WARN-FV-001"]);
        assert!(output.artifacts.is_empty());
        assert!(!output.has_errors());
    }

    #[test]
    fn static_candidate_is_one_error() {
        let compilation = compile(json!([car(&["public", "static", "partial"], json!([property("N", vec![gt(1)])]))]));
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        assert_eq!(codes(&output), ["ERR-FV-003"]);
        assert!(output.artifacts.is_empty());
    }

    #[test]
    fn non_partial_container_is_one_error() {
        let compilation = compile(json!([{
            "kind": "class", "name": "Outer", "namespace": "A", "modifiers": ["public"],
            "nested": [car(&["public", "partial"], json!([property("N", vec![gt(1)])]))]
        }]));
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        assert_eq!(codes(&output), ["ERR-FV-002b"]);
        assert!(output.artifacts.is_empty());
    }

    #[test]
    fn compatible_stub_is_completed() {
        let stub = json!({ "kind": "method", "name": "Validate", "type": "bool",
                           "modifiers": ["public", "partial"], "has_body": false });
        let compilation = compile(json!([car(&["public", "partial"], json!([stub, property("N", vec![gt(0)])]))]));
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        assert!(output.diagnostics.is_empty());
        assert!(output.artifacts[0].source.contains("public partial bool Validate()"));
    }

    #[test]
    fn failing_candidate_does_not_affect_sibling() {
        let alone = compile(json!([car(&["public", "partial"], json!([property("N", vec![gt(0)])]))]));
        let mixed = compile(json!([
            { "kind": "class", "name": "Broken", "namespace": "A", "modifiers": ["partial"],
              "attributes": [{ "name": MARKER }], "members": [property("N", vec![gt(0)])] },
            car(&["public", "partial"], json!([property("N", vec![gt(0)])]))
        ]));
        let generator = Generator::new(GeneratorConfig::default());
        let mixed = generator.run(&mixed);
        assert_eq!(codes(&mixed), ["ERR-FV-001"]);
        assert_eq!(mixed.artifacts, generator.run(&alone).artifacts);
    }

    #[test]
    fn dropped_constraints_are_reported_when_enabled() {
        let odd = json!({ "name": "FastValidate.Attributes.LessThanAttribute",
                          "arguments": [{ "kind": "string", "value": "10" }] });
        let compilation = compile(json!([car(&["public", "partial"], json!([property("N", vec![odd, gt(0)])]))]));
        let quiet = Generator::new(GeneratorConfig::default()).run(&compilation);
        assert!(quiet.diagnostics.is_empty());
        let config = GeneratorConfig { report_dropped_constraints: true, ..GeneratorConfig::default() };
        let loud = Generator::new(config).run(&compilation);
        assert_eq!(codes(&loud), ["WARN-FV-002"]);
        assert_eq!(loud.diagnostics[0].message, "constraint on member 'N' of type 'A.Car' was ignored: operand is missing or not a supported numeric value");
        assert_eq!(loud.artifacts.len(), 1);
    }

    #[test]
    fn cancelled_pass_emits_nothing_new() {
        let compilation = compile(json!([car(&["public", "partial"], json!([property("N", vec![gt(0)])]))]));
        let cancellation = Cancellation::new();
        cancellation.cancel();
        let output = Generator::new(GeneratorConfig::default()).run_with(&compilation, &cancellation);
        assert!(output.cancelled);
        assert!(output.artifacts.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn outcome_finished_after_cancellation_is_discarded() {
        let compilation = compile(json!([car(&["public", "partial"], json!([property("N", vec![gt(0)])]))]));
        let generator = Generator::new(GeneratorConfig::default());
        let table = SymbolTable::build(&compilation);
        let candidate = collect_candidates(&table, &generator.config.symbols)[0];
        let cancellation = Cancellation::new();

        let finished = generator.process(&table, &candidate);
        assert!(finished.artifact.is_some());
        assert!(accept(&cancellation, finished).is_some());

        // flag raised while the candidate is still in flight
        let in_flight = generator.process(&table, &candidate);
        cancellation.cancel();
        assert!(accept(&cancellation, in_flight).is_none());
    }

    #[test]
    fn split_partial_declarations_yield_one_artifact() {
        let compilation: Compilation = serde_json::from_value(json!({ "files": [
            { "path": "Car.cs", "types": [car(&["public", "partial"], json!([property("Speed", vec![lt(200)])]))] },
            { "path": "Car.Wheels.cs", "types": [{ "kind": "class", "name": "Car", "namespace": "A",
                "modifiers": ["partial"], "members": [property("NWheels", vec![gt(2)])] }] }
        ]}))
        .unwrap();
        let output = Generator::new(GeneratorConfig::default()).run(&compilation);
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(body(&output), "return (Speed < 200) && (NWheels > 2)");
    }
}
