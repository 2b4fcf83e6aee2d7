//! CLI: load snapshots → generate | check, or print the diagnostic catalog.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, catalog};
use crate::error::LoadError;
use crate::generator::{Generator, GeneratorOutput};
use crate::model::Compilation;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate `Validate()` methods from a declaration snapshot
#[derive(Parser, Debug)]
#[command(name = "fast-validate", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// more logging on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the generator and write or print the generated sources
    Generate(GenerateOut),
    /// run the generator and report diagnostics only
    Check(CheckOut),
    /// print every diagnostic the generator can report
    Catalog(CatalogOut),
}

#[derive(Args, Debug, Clone)]
pub struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select the snapshot in each document (e.g. /build/snapshot)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one snapshot.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct GeneratorSettings {
    /// generator config JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// report constraints dropped over non-numeric operands
    #[arg(long)]
    report_dropped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    generator_settings: GeneratorSettings,

    /// directory for `<hint>.g.cs` files (stdout if omitted)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    generator_settings: GeneratorSettings,

    #[arg(long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CatalogOut {
    #[arg(long, value_enum, default_value_t = Format::Human)]
    format: Format,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every input document contributes its files to one compilation.
    pub fn load_compilation(&self) -> Result<Compilation, LoadError> {
        let mut compilation = Compilation::default();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source = std::fs::read_to_string(&source_path).map_err(|source| LoadError::Io {
                path: source_path.clone(),
                source,
            })?;
            for document in self.documents(&source_path, &source)? {
                let document = self.select(&source_path, document)?;
                for value in self.filter(&source_path, document)? {
                    let snapshot = crate::path_de::from_value_with_path::<Compilation>(value).map_err(|message| {
                        LoadError::Snapshot { origin: source_path.display().to_string(), message }
                    })?;
                    compilation.merge(snapshot);
                }
            }
        }
        tracing::debug!(files = compilation.files.len(), "loaded compilation");
        Ok(compilation)
    }

    fn documents(&self, path: &Path, source: &str) -> Result<Vec<Value>, LoadError> {
        let parse = |text: &str| {
            serde_json::from_str::<Value>(text).map_err(|source| LoadError::Json { path: path.to_path_buf(), source })
        };
        if self.ndjson {
            source.lines().filter(|line| !line.trim().is_empty()).map(parse).collect()
        } else {
            Ok(vec![parse(source)?])
        }
    }

    fn select(&self, path: &Path, document: Value) -> Result<Value, LoadError> {
        let Some(pointer) = self.json_pointer.as_ref() else {
            return Ok(document);
        };
        document.pointer(pointer).cloned().ok_or_else(|| LoadError::Pointer {
            pointer: pointer.clone(),
            path: path.to_path_buf(),
        })
    }

    fn filter(&self, path: &Path, document: Value) -> Result<Vec<Value>, LoadError> {
        match self.jq_expr.as_ref() {
            None => Ok(vec![document]),
            Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &document).map_err(|error| LoadError::Jq {
                path: path.to_path_buf(),
                message: format!("{error:#}"),
            }),
        }
    }
}

impl GeneratorSettings {
    fn generator(&self) -> Result<Generator> {
        let mut config = match self.config.as_ref() {
            Some(path) => GeneratorConfig::from_path(path)?,
            None => GeneratorConfig::default(),
        };
        config.report_dropped_constraints |= self.report_dropped;
        Ok(Generator::new(config))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> Result<ExitCode> {
        if self.no_color {
            colored::control::set_override(false);
        }
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }
                let output = run_generator(&target.input_settings, &target.generator_settings)?;
                if let Some(out_dir) = target.out_dir.as_ref() {
                    write_artifacts(out_dir, &output)?;
                }
                match target.format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                    Format::Human => {
                        if target.out_dir.is_none() {
                            for artifact in &output.artifacts {
                                println!("// ==> {} <==", artifact.hint_name);
                                println!("{}", artifact.source);
                            }
                        }
                        print_diagnostics(&output.diagnostics);
                    }
                }
                Ok(exit_code(&output))
            }
            Command::Check(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }
                let output = run_generator(&target.input_settings, &target.generator_settings)?;
                match target.format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&output.diagnostics)?),
                    Format::Human => {
                        print_diagnostics(&output.diagnostics);
                        eprintln!(
                            "{} artifact(s) would be generated, {} diagnostic(s)",
                            output.artifacts.len(),
                            output.diagnostics.len()
                        );
                    }
                }
                Ok(exit_code(&output))
            }
            Command::Catalog(target) => {
                match target.format {
                    Format::Json => {
                        let descriptors = catalog().collect::<Vec<_>>();
                        println!("{}", serde_json::to_string_pretty(&descriptors)?);
                    }
                    Format::Human => {
                        for d in catalog() {
                            println!("{:<12} {:<8} {}", d.code, d.severity, d.title);
                        }
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn run_generator(input: &InputSettings, settings: &GeneratorSettings) -> Result<GeneratorOutput> {
    let generator = settings.generator()?;
    let compilation = input.load_compilation().context("failed to load declaration snapshot")?;
    Ok(generator.run(&compilation))
}

fn write_artifacts(out_dir: &Path, output: &GeneratorOutput) -> Result<()> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;
    for artifact in &output.artifacts {
        let path = out_dir.join(&artifact.hint_name);
        std::fs::write(&path, &artifact.source).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote artifact");
    }
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render());
    }
}

fn exit_code(output: &GeneratorOutput) -> ExitCode {
    if output.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, LoadError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                return Err(LoadError::NoMatch(pattern.to_string()));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(input: Vec<String>) -> InputSettings {
        InputSettings { ndjson: false, json_pointer: None, jq_expr: None, input }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fast-validate-cli-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn snapshot(path: &str) -> Value {
        json!({ "files": [{ "path": path, "types": [{ "kind": "class", "name": "Car" }] }] })
    }

    #[test]
    fn documents_merge_across_inputs() {
        let dir = scratch("merge");
        std::fs::write(dir.join("a.json"), snapshot("a.cs").to_string()).unwrap();
        std::fs::write(dir.join("b.json"), snapshot("b.cs").to_string()).unwrap();
        let pattern = format!("{}/*.json", dir.display());
        let compilation = settings(vec![pattern]).load_compilation().unwrap();
        let mut paths = compilation.files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>();
        paths.sort();
        assert_eq!(paths, ["a.cs", "b.cs"]);
    }

    #[test]
    fn ndjson_and_pointer() {
        let dir = scratch("ndjson");
        let lines = [json!({ "snapshot": snapshot("x.cs") }), json!({ "snapshot": snapshot("y.cs") })]
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let path = dir.join("in.ndjson");
        std::fs::write(&path, lines).unwrap();
        let mut input = settings(vec![path.display().to_string()]);
        input.ndjson = true;
        input.json_pointer = Some("/snapshot".into());
        assert_eq!(input.load_compilation().unwrap().files.len(), 2);
        input.json_pointer = Some("/missing".into());
        assert!(matches!(input.load_compilation(), Err(LoadError::Pointer { .. })));
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let dir = scratch("nomatch");
        let pattern = format!("{}/*.nothing", dir.display());
        assert!(matches!(settings(vec![pattern]).load_compilation(), Err(LoadError::NoMatch(_))));
    }

    #[test]
    fn snapshot_errors_carry_json_path() {
        let dir = scratch("invalid");
        let path = dir.join("bad.json");
        std::fs::write(&path, r#"{ "files": [{ "path": "a.cs", "types": [{ "kind": "trait", "name": "A" }] }] }"#).unwrap();
        let err = settings(vec![path.display().to_string()]).load_compilation().unwrap_err();
        assert!(err.to_string().contains("files[0].types[0].kind"), "{err}");
    }
}
