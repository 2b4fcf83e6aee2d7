//! Fixture runner: every `fixtures/<case>/input.json` is run through the
//! generator and compared against `expected/`.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fast_validate::{Compilation, Generator, GeneratorConfig, GeneratorOutput};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+(\r?\n|$)").unwrap());

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpectedDiagnostic {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

fn normalize(source: &str) -> String {
    let unix = source.replace("\r\n", "\n");
    let trimmed = TRAILING_WS.replace_all(&unix, "\n");
    trimmed.trim_end().to_string()
}

fn read(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn run_case(dir: &Path) -> Result<(), Vec<String>> {
    let fail = |m: String| vec![m];
    let input = read(&dir.join("input.json")).map_err(fail)?;
    let compilation = fast_validate::path_de::from_str_with_path::<Compilation>(&input).map_err(fail)?;
    let config_path = dir.join("config.json");
    let config = if config_path.exists() {
        GeneratorConfig::from_path(&config_path).map_err(|e| fail(e.to_string()))?
    } else {
        GeneratorConfig::default()
    };
    let output = Generator::new(config).run(&compilation);

    let mut problems = Vec::new();
    compare_artifacts(dir, &output, &mut problems);
    compare_diagnostics(dir, &output, &mut problems);
    if problems.is_empty() { Ok(()) } else { Err(problems) }
}

fn compare_artifacts(dir: &Path, output: &GeneratorOutput, problems: &mut Vec<String>) {
    let expected_dir = dir.join("expected");
    let mut expected = std::fs::read_dir(&expected_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.to_string_lossy().ends_with(".g.cs"))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    expected.sort();

    for path in &expected {
        let hint = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let Some(artifact) = output.artifacts.iter().find(|a| a.hint_name == hint) else {
            problems.push(format!("missing artifact {hint}"));
            continue;
        };
        match read(path) {
            Ok(want) if normalize(&want) == normalize(&artifact.source) => {}
            Ok(want) => problems.push(format!(
                "artifact {hint} differs\n--- expected\n{}\n--- actual\n{}",
                normalize(&want),
                normalize(&artifact.source)
            )),
            Err(e) => problems.push(e),
        }
    }
    for artifact in &output.artifacts {
        if !expected.iter().any(|p| p.ends_with(&artifact.hint_name)) {
            problems.push(format!("unexpected artifact {}", artifact.hint_name));
        }
    }
}

fn compare_diagnostics(dir: &Path, output: &GeneratorOutput, problems: &mut Vec<String>) {
    let path = dir.join("expected").join("diagnostics.json");
    let expected = match read(&path) {
        Ok(source) => {
            let de = &mut serde_json::Deserializer::from_str(&source);
            match serde_path_to_error::deserialize::<_, Vec<ExpectedDiagnostic>>(de) {
                Ok(x) => x,
                Err(error) => {
                    problems.push(format!("{}: at {} → {}", path.display(), error.path(), error.inner()));
                    return;
                }
            }
        }
        Err(_) => Vec::new(),
    };
    let actual = output.diagnostics.iter().map(|d| d.code).collect::<Vec<_>>();
    let wanted = expected.iter().map(|d| d.code.as_str()).collect::<Vec<_>>();
    if actual != wanted {
        problems.push(format!("diagnostics differ: expected {wanted:?}, got {actual:?}"));
        return;
    }
    for (want, got) in expected.iter().zip(&output.diagnostics) {
        if let Some(message) = want.message.as_ref().filter(|m| **m != got.message) {
            problems.push(format!("{}: expected message {message:?}, got {:?}", got.code, got.message));
        }
    }
}

fn main() -> ExitCode {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"));
    let mut cases = match std::fs::read_dir(&root) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.join("input.json").is_file())
            .collect::<Vec<_>>(),
        Err(error) => {
            eprintln!("❌ cannot read fixtures at {}: {error}", root.display());
            return ExitCode::FAILURE;
        }
    };
    cases.sort();

    let mut failed = 0;
    for case in &cases {
        let name = case.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match run_case(case) {
            Ok(()) => eprintln!("✅ {name}"),
            Err(problems) => {
                failed += 1;
                eprintln!("❌ {name}");
                for problem in problems {
                    eprintln!("   {problem}");
                }
            }
        }
    }
    eprintln!("{} passed, {failed} failed", cases.len() - failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
