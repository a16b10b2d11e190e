use anyhow::{Context as _, Result, bail};
use clap::Parser;
use plim_transpiler::{CompileError, Delimiters, Options, Profile, compile_with, make_profile};
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "plimc")]
#[command(version, about = "Compile Plim templates to Mako or Django templates")]
struct Cli {
    /// Path to a .plim file or a directory of them
    #[arg(required_unless_present = "stdin")]
    source: Option<PathBuf>,

    /// Read the template from stdin
    #[arg(long)]
    stdin: bool,

    /// Write the result to this file instead of stdout (single file only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source encoding; only UTF-8 is supported
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Target dialect: mako or django
    #[arg(short, long, default_value = "mako")]
    preprocessor: String,

    /// JSON file overriding some or all of the profile's delimiters
    #[arg(long)]
    delimiters: Option<PathBuf>,

    /// Print the result (or the error) as JSON
    #[arg(long)]
    json: bool,

    /// Log dispatch decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum JsonResult<'a> {
    Code(&'a str),
    Error(&'a CompileError),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("plim_transpiler=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if !matches!(cli.encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
        bail!("unsupported encoding '{}': only utf-8 is supported", cli.encoding);
    }
    let profile = load_profile(&cli.preprocessor, cli.delimiters.as_deref())?;

    if cli.stdin {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return compile_one(cli, &profile, &source, "<stdin>");
    }

    let Some(path) = cli.source.as_deref() else {
        bail!("provide a file/directory or use --stdin");
    };
    if path.is_file() {
        let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        compile_one(cli, &profile, &source, &path.display().to_string())
    } else if path.is_dir() {
        if cli.output.is_some() {
            bail!("--output only applies to a single source file");
        }
        compile_directory(path, &profile)
    } else {
        bail!("{} does not exist", path.display());
    }
}

/// Build the profile, then lay any delimiters from the JSON file over its own.
fn load_profile(name: &str, delimiters: Option<&Path>) -> Result<Profile> {
    let profile = make_profile(name, Vec::new())?;
    let Some(path) = delimiters else {
        return Ok(profile);
    };

    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let overrides: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?;
    let serde_json::Value::Object(overrides) = overrides else {
        bail!("{} must contain a JSON object", path.display());
    };

    let mut merged = serde_json::to_value(profile.delimiters())?;
    if let serde_json::Value::Object(base) = &mut merged {
        base.extend(overrides);
    }
    let delimiters: Delimiters =
        serde_json::from_value(merged).with_context(|| format!("invalid delimiters in {}", path.display()))?;
    Ok(profile.with_delimiters(delimiters))
}

fn compile_one(cli: &Cli, profile: &Profile, source: &str, filename: &str) -> Result<()> {
    let result = compile_with(source, profile, Options::default());

    if cli.json {
        let payload = match &result {
            Ok(code) => JsonResult::Code(code),
            Err(err) => JsonResult::Error(err),
        };
        println!("{}", serde_json::to_string(&payload)?);
        if result.is_err() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            report(&err, source, filename);
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(output) => {
            fs::write(output, format!("{code}\n")).with_context(|| format!("failed to write {}", output.display()))?;
            print_generated(&output.display().to_string());
        }
        None => println!("{code}"),
    }
    Ok(())
}

fn compile_directory(dir: &Path, profile: &Profile) -> Result<()> {
    let extension = if profile.name() == "django" { "html" } else { "mako" };
    let mut summary = DirectorySummary::new(profile.name());

    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "plim"))
    {
        let path = entry.path();
        let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        match compile_with(&source, profile, Options::default()) {
            Ok(code) => {
                let output = path.with_extension(extension);
                fs::write(&output, format!("{code}\n"))
                    .with_context(|| format!("failed to write {}", output.display()))?;
                print_generated(&output.display().to_string());
                summary.compiled += 1;
            }
            Err(err) => {
                report(&err, &source, &path.display().to_string());
                summary.failed += 1;
            }
        }
    }

    if summary.compiled == 0 && summary.failed == 0 {
        bail!("no .plim files found in {}", dir.display());
    }
    summary.print();
    if summary.failed > 0 {
        bail!("{} template(s) failed to compile", summary.failed);
    }
    Ok(())
}

/// Tally of a directory run, printed to stderr once the walk is done
struct DirectorySummary<'a> {
    dialect: &'a str,
    compiled: usize,
    failed: usize,
    start: Instant,
}

impl<'a> DirectorySummary<'a> {
    fn new(dialect: &'a str) -> Self {
        Self {
            dialect,
            compiled: 0,
            failed: 0,
            start: Instant::now(),
        }
    }

    fn line(&self) -> String {
        let plural = if self.compiled == 1 { "" } else { "s" };
        let mut line = format!(
            "{} template{} -> {} in {:.1?}",
            self.compiled,
            plural,
            self.dialect,
            self.start.elapsed()
        );
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }

    fn print(&self) {
        let line = self.line();
        if io::stderr().is_terminal() {
            eprintln!("\n\x1b[1mplimc:\x1b[0m {line}");
        } else {
            eprintln!("\nplimc: {line}");
        }
    }
}

fn report(err: &CompileError, source: &str, filename: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", err.render_color(source, filename));
    } else {
        eprintln!("{}", err.render(source, filename));
    }
}

fn print_generated(path: &str) {
    if io::stderr().is_terminal() {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}
