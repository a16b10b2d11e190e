//! Fixture runner: compiles every `tests/fixtures/**/*.plim` and compares the result with
//! its `.expected.mako` / `.expected.html` sibling, or with `.expected.err` for fixtures
//! under `errors/`.
//!
//! Run with: cargo test --test expected_tests
//! Regenerate with: cargo run --bin accept_expected

use libtest_mimic::{Arguments, Failed, Trial};
use plim_transpiler::{Profile, compile};
use std::fs;
use std::path::{Path, PathBuf};

fn collect_fixtures() -> Vec<PathBuf> {
    let pattern = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/**/*.plim");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .filter_map(Result::ok)
        .collect();
    files.sort();
    files
}

/// Trailing whitespace and runs of blank lines are not significant.
fn normalize(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.trim().lines().map(str::trim_end) {
        if line.is_empty() && lines.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn trial_name(path: &Path) -> String {
    let parent = path.parent().and_then(|p| p.file_name()).unwrap_or_default();
    let stem = path.file_stem().unwrap_or_default();
    format!("{}::{}", parent.to_string_lossy(), stem.to_string_lossy())
}

fn check_output(path: &Path) -> Result<(), Failed> {
    let path_str = path.to_string_lossy();
    let (profile, extension) = if path_str.contains("/django/") {
        (Profile::django(), "expected.html")
    } else {
        (Profile::mako(), "expected.mako")
    };

    let expected_path = path.with_extension(extension);
    let expected = fs::read_to_string(&expected_path)
        .map_err(|e| format!("missing expected file {}: {}", expected_path.display(), e))?;
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;

    let actual = compile(&source, &profile).map_err(|e| format!("compile error: {e}"))?;
    if normalize(&actual) != normalize(&expected) {
        return Err(format!(
            "output mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
            normalize(&expected),
            normalize(&actual)
        )
        .into());
    }
    Ok(())
}

fn check_error(path: &Path) -> Result<(), Failed> {
    let expected_path = path.with_extension("expected.err");
    let expected = fs::read_to_string(&expected_path)
        .map_err(|e| format!("missing expected file {}: {}", expected_path.display(), e))?;
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");

    match compile(&source, &Profile::mako()) {
        Ok(_) => Err("expected an error but compilation succeeded".into()),
        Err(e) => {
            let actual = e.render(&source, filename);
            if actual.trim() != expected.trim() {
                return Err(format!(
                    "error mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
                    expected.trim(),
                    actual.trim()
                )
                .into());
            }
            Ok(())
        }
    }
}

fn main() {
    let args = Arguments::from_args();

    let trials = collect_fixtures()
        .into_iter()
        .map(|path| {
            let name = trial_name(&path);
            if path.to_string_lossy().contains("/errors/") {
                Trial::test(name, move || check_error(&path))
            } else {
                Trial::test(name, move || check_output(&path))
            }
        })
        .collect();

    libtest_mimic::run(&args, trials).exit();
}
