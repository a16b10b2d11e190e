//! Binary to generate/update the expected outputs of the fixture templates
//!
//! Fixtures under `tests/fixtures/django/` compile with the Django profile and get a
//! `.expected.html`; all others use Mako and get a `.expected.mako`. Fixtures under
//! `tests/fixtures/errors/` get the rendered error in `.expected.err`.
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- basic   # Update only fixtures matching "basic"

use anyhow::{Context, Result};
use plim_transpiler::{Profile, compile};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let filter: Option<String> = std::env::args().nth(1);
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&fixture_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|s| s == "plim"))
    {
        let path = entry.path();

        if let Some(ref f) = filter {
            if !path.to_string_lossy().contains(f.as_str()) {
                skipped += 1;
                continue;
            }
        }

        process_file(path)?;
        updated += 1;
    }

    println!("Updated {} files, skipped {}", updated, skipped);
    Ok(())
}

fn process_file(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let path_str = path.to_string_lossy();
    let is_error_test = path_str.contains("/errors/");
    let (profile, extension) = if path_str.contains("/django/") {
        (Profile::django(), "expected.html")
    } else {
        (Profile::mako(), "expected.mako")
    };

    match compile(&source, &profile) {
        Ok(code) => {
            if is_error_test {
                eprintln!("ERROR: {} compiled but is in errors/", path.display());
                return Ok(());
            }
            let expected = path.with_extension(extension);
            fs::write(&expected, format!("{code}\n"))
                .with_context(|| format!("failed to write {}", expected.display()))?;
            println!("  wrote {}", expected.display());
        }
        Err(e) => {
            if !is_error_test {
                eprintln!("ERROR: {} failed to compile but is not in errors/: {}", path.display(), e);
                return Ok(());
            }
            let expected_err = path.with_extension("expected.err");
            let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");
            fs::write(&expected_err, e.render(&source, filename))
                .with_context(|| format!("failed to write {}", expected_err.display()))?;
            println!("  wrote {}", expected_err.display());
        }
    }
    Ok(())
}
