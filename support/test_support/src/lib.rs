//! Fixture loader for the Mython program suite.
//!
//! Every directory under `tests/programs/` is one fixture: a Mython script
//! (`program.my`) plus a `case.yaml` describing how interpreting it is
//! expected to end. The loader resolves the expectation files eagerly and
//! validates the spec, so a broken fixture fails the suite before any
//! program runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

/// How a fixture's interpretation run is expected to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The script runs to completion and prints this text.
    Stdout(String),
    /// Lexing or parsing fails with a message containing this text.
    FrontendError(String),
    /// The script parses, but executing it fails with a message containing
    /// this text.
    RuntimeError(String),
}

/// A loaded fixture: the Mython source and its expected outcome.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub name: String,
    pub source: String,
    pub expectation: Expectation,
    /// Labels of the bench suites that pick this fixture up; empty for
    /// test-only fixtures.
    pub bench_tags: Vec<String>,
}

impl Fixture {
    pub fn is_benched(&self) -> bool {
        !self.bench_tags.is_empty()
    }
}

// On-disk shape of `case.yaml`.

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum RawClass {
    RuntimeSuccess,
    FrontendError,
    RuntimeError,
}

#[derive(Debug, Deserialize)]
struct RawBench {
    enabled: bool,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawExpected {
    exit_code: i32,
    stdout_file: Option<String>,
    stderr_contains_file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSpec {
    class: RawClass,
    bench: RawBench,
    expected: RawExpected,
}

/// Loads every fixture directory under `programs_dir`, sorted by name.
pub fn load_fixtures(programs_dir: &Path) -> Result<Vec<Fixture>> {
    let mut fixtures = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let dir = entry?.path();
        if !dir.is_dir() || !dir.join("case.yaml").exists() {
            continue;
        }
        fixtures.push(load_fixture(&dir)?);
    }

    ensure!(
        !fixtures.is_empty(),
        "No fixtures found in {}",
        programs_dir.display()
    );
    fixtures.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(fixtures)
}

fn load_fixture(dir: &Path) -> Result<Fixture> {
    let name = dir
        .file_name()
        .and_then(|value| value.to_str())
        .map(str::to_string)
        .with_context(|| format!("Invalid fixture directory name {}", dir.display()))?;

    let source = fs::read_to_string(dir.join("program.my"))
        .with_context(|| format!("Reading the Mython script of fixture '{name}'"))?;
    let spec_raw = fs::read_to_string(dir.join("case.yaml"))
        .with_context(|| format!("Reading the spec of fixture '{name}'"))?;
    let spec: RawSpec = serde_yaml::from_str(&spec_raw)
        .with_context(|| format!("Parsing the spec of fixture '{name}'"))?;

    if spec.bench.enabled {
        ensure!(
            !spec.bench.tags.is_empty(),
            "Fixture '{name}' enables benching but lists no tags"
        );
        ensure!(
            matches!(spec.class, RawClass::RuntimeSuccess),
            "Fixture '{name}' cannot bench a failing program"
        );
    }

    let expectation = match spec.class {
        RawClass::RuntimeSuccess => {
            ensure!(
                spec.expected.exit_code == 0,
                "Fixture '{name}' must expect exit code 0 for runtime_success"
            );
            let stdout = read_expectation(dir, &name, spec.expected.stdout_file, "stdout_file")?;
            Expectation::Stdout(stdout)
        }
        RawClass::FrontendError | RawClass::RuntimeError => {
            ensure!(
                spec.expected.exit_code == 1,
                "Fixture '{name}' must expect exit code 1 for an error class"
            );
            let needle = read_expectation(
                dir,
                &name,
                spec.expected.stderr_contains_file,
                "stderr_contains_file",
            )?;
            let needle = needle.trim().to_string();
            ensure!(
                !needle.is_empty(),
                "Fixture '{name}' expects an error but the message file is empty"
            );
            match spec.class {
                RawClass::FrontendError => Expectation::FrontendError(needle),
                _ => Expectation::RuntimeError(needle),
            }
        }
    };

    let bench_tags = if spec.bench.enabled {
        spec.bench.tags
    } else {
        Vec::new()
    };

    Ok(Fixture {
        name,
        source,
        expectation,
        bench_tags,
    })
}

fn read_expectation(
    dir: &Path,
    fixture: &str,
    file: Option<String>,
    key: &str,
) -> Result<String> {
    let Some(file) = file else {
        bail!("Fixture '{fixture}' is missing '{key}' in its spec");
    };
    fs::read_to_string(dir.join(&file))
        .with_context(|| format!("Reading expectation file '{file}' of fixture '{fixture}'"))
}

/// Line-ending and trailing-newline tolerant form for stdout comparisons.
pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}
