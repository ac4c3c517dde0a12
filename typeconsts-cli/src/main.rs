//! typeconsts CLI - list the constants declared for Go types.
//!
//! Features:
//! - Several types per run (`--type Color,Size`)
//! - Values and signedness for generator input
//! - Value-sorted output and runs of consecutive values
//! - Plain text or JSON output

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use typeconsts_core::{
    init_structured_logging, load_config, log_error, log_info, log_warn, print_json, print_plain,
    print_runs, sort_by_value, split_into_runs, BuildContext, ConstantRecord, PackageLoader,
    TypeReport,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "List the constants declared for a Go type")]
pub struct Cli {
    /// Comma-separated list of type names
    #[arg(long = "type", short = 't', value_delimiter = ',', required = true)]
    types: Vec<String>,

    /// Directory of the Go package
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Print each constant's value and signedness
    #[arg(long)]
    values: bool,

    /// Sort constants by value instead of declaration order
    #[arg(long)]
    sort: bool,

    /// Print runs of consecutive values
    #[arg(long)]
    runs: bool,

    /// Load `_test.go` files of the package
    #[arg(long)]
    include_tests: bool,

    /// File names to leave out of the package
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,

    /// Target OS for build constraints (default: config, then host)
    #[arg(long)]
    goos: Option<String>,

    /// Target architecture for build constraints (default: config, then host)
    #[arg(long)]
    goarch: Option<String>,
}

/// Constants found for one requested type.
struct TypeOutcome {
    type_name: String,
    records: Vec<ConstantRecord>,
}

/// Scans every requested type. Returns the process exit code:
/// 0 when all types had values, 1 when some had none.
fn run(cli: &Cli) -> Result<i32> {
    let path = Path::new(&cli.path);
    let config = load_config(path).context("Failed to read configuration")?;

    let mut loader = PackageLoader::new(path).exclude_files(cli.exclude.iter().cloned());
    if cli.include_tests {
        loader = loader.include_tests(true);
    }
    if cli.goos.is_some() || cli.goarch.is_some() {
        let base = config
            .as_ref()
            .map(|cfg| cfg.build_context())
            .unwrap_or_default();
        loader = loader.target(BuildContext::new(
            cli.goos.clone().unwrap_or(base.goos),
            cli.goarch.clone().unwrap_or(base.goarch),
        ));
    }
    let package = loader
        .load()
        .with_context(|| format!("Failed to load package from {}", cli.path))?;

    let json = cli.json || config.as_ref().is_some_and(|cfg| cfg.wants_json());

    log_info(&format!(
        "package {} loaded from {}",
        package.name(),
        path.display()
    ));

    let mut outcomes = Vec::with_capacity(cli.types.len());
    let mut missing = false;
    for type_name in &cli.types {
        match package.constants_of_type(type_name) {
            Ok(mut records) => {
                if cli.sort {
                    sort_by_value(&mut records);
                }
                tracing::debug!(r#type = %type_name, count = records.len(), "type scanned");
                outcomes.push(TypeOutcome {
                    type_name: type_name.clone(),
                    records,
                });
            }
            Err(e) if e.is_recoverable() => {
                log_warn(&e.to_string());
                eprintln!("[WARN] {}", e);
                missing = true;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to scan type {}", type_name));
            }
        }
    }

    if json {
        emit_json(&outcomes, cli.runs)?;
    } else {
        for outcome in &outcomes {
            if cli.runs {
                print_runs(&outcome.type_name, &split_into_runs(&outcome.records));
            } else {
                print_plain(&outcome.type_name, &outcome.records, cli.values);
            }
        }
    }

    Ok(if missing { 1 } else { 0 })
}

fn emit_json(outcomes: &[TypeOutcome], runs: bool) -> Result<()> {
    if runs {
        let value: Vec<_> = outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "type": o.type_name,
                    "runs": split_into_runs(&o.records),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let reports: Vec<TypeReport<'_>> = outcomes
            .iter()
            .map(|o| TypeReport {
                type_name: &o.type_name,
                constants: &o.records,
            })
            .collect();
        print_json(&reports);
    }
    Ok(())
}

fn main() {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] typeconsts internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    let code = match std::panic::catch_unwind(|| run(&cli)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            log_error(&format!("{:#}", e));
            eprintln!("[ERROR] {:#}", e);
            2
        }
        Err(_) => 2,
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("typeconsts_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("typeconsts").chain(args.iter().copied())).unwrap()
    }

    const COLORS: &str = "package paint\n\ntype Color int\n\nconst (\n\tRed Color = iota\n\tGreen\n)\n";

    // --- ARGUMENT PARSING TESTS ---

    #[test]
    fn test_type_list_is_split_on_commas() {
        let cli = cli(&["--type", "Color,Size", "./pkg"]);
        assert_eq!(cli.types, ["Color", "Size"]);
        assert_eq!(cli.path, "./pkg");
    }

    #[test]
    fn test_path_defaults_to_current_dir() {
        let cli = cli(&["-t", "Color"]);
        assert_eq!(cli.path, ".");
        assert!(!cli.json);
        assert!(!cli.include_tests);
    }

    #[test]
    fn test_type_is_required() {
        assert!(Cli::try_parse_from(["typeconsts", "./pkg"]).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = cli(&[
            "--type", "Color", "--json", "--values", "--sort", "--runs", "--include-tests",
            "--exclude", "a.go", "b.go",
        ]);
        assert!(cli.json && cli.values && cli.sort && cli.runs && cli.include_tests);
        assert_eq!(cli.exclude, ["a.go", "b.go"]);
        assert_eq!(cli.goos, None);
    }

    #[test]
    fn test_target_flags() {
        let cli = cli(&["--type", "Color", "--goos", "windows", "--goarch", "386"]);
        assert_eq!(cli.goos.as_deref(), Some("windows"));
        assert_eq!(cli.goarch.as_deref(), Some("386"));
    }

    // --- RUN TESTS ---

    #[test]
    fn test_run_found_exits_zero() {
        let dir = create_temp_dir("found");
        fs::write(dir.join("color.go"), COLORS).unwrap();

        let code = run(&cli(&["--type", "Color", dir.to_str().unwrap()])).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_run_missing_type_exits_one() {
        let dir = create_temp_dir("missing");
        fs::write(dir.join("color.go"), COLORS).unwrap();

        let code = run(&cli(&["--type", "Color,Shade", dir.to_str().unwrap()])).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_run_load_failure_is_error() {
        let dir = create_temp_dir("broken");
        fs::write(dir.join("a.go"), "package one\n").unwrap();
        fs::write(dir.join("b.go"), "package two\n").unwrap();

        let err = run(&cli(&["--type", "Color", dir.to_str().unwrap()])).unwrap_err();
        assert!(format!("{:#}", err).contains("2 packages found"));
    }

    #[test]
    fn test_run_inconsistency_is_error() {
        let dir = create_temp_dir("inconsistent");
        fs::write(
            dir.join("name.go"),
            "package names\n\ntype Name string\n\nconst Title Name = \"t\"\n",
        )
        .unwrap();

        let result = run(&cli(&["--type", "Name", "--json", dir.to_str().unwrap()]));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_selects_platform_files() {
        let dir = create_temp_dir("platform");
        fs::write(dir.join("color.go"), COLORS).unwrap();
        fs::write(dir.join("z_windows.go"), "package paint\n\nconst Blue Color = 7\n").unwrap();
        fs::write(dir.join("z_linux.go"), "package paint\n\nconst Blue Color = 8\n").unwrap();

        let code = run(&cli(&["--type", "Color", "--goos", "windows", dir.to_str().unwrap()]))
            .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_run_json_runs() {
        let dir = create_temp_dir("json_runs");
        fs::write(dir.join("color.go"), COLORS).unwrap();

        let code = run(&cli(&["--type", "Color", "--json", "--runs", dir.to_str().unwrap()]))
            .unwrap();
        assert_eq!(code, 0);
    }
}
