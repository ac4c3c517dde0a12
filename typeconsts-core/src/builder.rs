//! Builder pattern API for loading a Go package.
//!
//! Provides a fluent interface for configuring how a directory is read:
//!
//! ```rust,ignore
//! use typeconsts_core::prelude::*;
//!
//! let package = PackageLoader::new("/path/to/pkg")
//!     .include_tests(false)
//!     .exclude_files(["zz_generated.go"])
//!     .target(BuildContext::new("linux", "amd64"))
//!     .load()?;
//!
//! println!("{:?}", package.values_of_type("Color")?);
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{load_config, TypeconstsConfig, CONFIG_FILE};
use crate::constraint::BuildContext;
use crate::error::{ScanError, ScanResult};
use crate::package::Package;
use crate::parse::{parse_go_files_for, CompilationUnit};
use crate::scan::{gather_go_files_for, is_test_file};

/// Builder for loading a package directory.
///
/// Settings made on the builder take precedence over `typeconsts.toml`,
/// which takes precedence over the defaults.
#[derive(Debug, Clone)]
pub struct PackageLoader {
    /// Package directory
    dir: PathBuf,

    /// Whether to load `_test.go` files (None = config or default)
    include_tests: Option<bool>,

    /// File names to leave out, on top of the config's list
    excluded_files: Vec<String>,

    /// Platform for build constraints (None = config or host)
    target: Option<BuildContext>,

    /// Whether to read typeconsts.toml
    use_config: bool,
}

impl PackageLoader {
    /// Create a new loader for the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            include_tests: None,
            excluded_files: Vec::new(),
            target: None,
            use_config: true,
        }
    }

    /// Load `_test.go` files of the package itself.
    pub fn include_tests(mut self, enabled: bool) -> Self {
        self.include_tests = Some(enabled);
        self
    }

    /// Add file names to leave out of the package.
    pub fn exclude_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Select files for `ctx` instead of the host platform.
    pub fn target(mut self, ctx: BuildContext) -> Self {
        self.target = Some(ctx);
        self
    }

    /// Enable or disable reading typeconsts.toml.
    pub fn with_config(mut self, enabled: bool) -> Self {
        self.use_config = enabled;
        self
    }

    fn config(&self) -> ScanResult<TypeconstsConfig> {
        if !self.use_config {
            return Ok(TypeconstsConfig::default());
        }
        let cfg = load_config(&self.dir)
            .map_err(|e| ScanError::config(self.dir.join(CONFIG_FILE), format!("{:#}", e)))?;
        Ok(cfg.unwrap_or_default())
    }

    /// Read, parse and check the package.
    pub fn load(&self) -> ScanResult<Package> {
        // 1. Merge settings
        let cfg = self.config()?;
        let include_tests = self
            .include_tests
            .or(cfg.include_tests)
            .unwrap_or(false);
        let excludes: Vec<&str> = cfg
            .exclude
            .iter()
            .flatten()
            .chain(&self.excluded_files)
            .map(String::as_str)
            .collect();
        let ctx = self.target.clone().unwrap_or_else(|| cfg.build_context());

        // 2. Gather files in file-name order
        let files = gather_go_files_for(&self.dir, include_tests, &excludes, &ctx)?;

        // 3. Parse in parallel, dropping files ruled out by constraints
        let units = parse_go_files_for(&files, &ctx)?;
        if units.is_empty() {
            return Err(ScanError::load(&self.dir, "no Go files"));
        }

        // 4. Resolve the package name
        let (name, units) = select_package(&self.dir, units)?;

        // 5. Check and assemble
        let package = Package::new(name, &self.dir, units)?;
        tracing::info!(
            dir = %self.dir.display(),
            package = %package.name(),
            goos = %ctx.goos,
            goarch = %ctx.goarch,
            files = package.units().len(),
            symbols = package.info().len(),
            "package loaded"
        );
        Ok(package)
    }
}

/// Load the package in `dir` with default settings plus typeconsts.toml.
pub fn load_package(dir: impl AsRef<Path>) -> ScanResult<Package> {
    PackageLoader::new(dir.as_ref()).load()
}

/// Pick the single package the units belong to.
///
/// External test packages (`<name>_test` in `_test.go` files) are dropped.
/// Any other disagreement is an error.
fn select_package(
    dir: &Path,
    units: Vec<CompilationUnit>,
) -> ScanResult<(String, Vec<CompilationUnit>)> {
    let primary: BTreeSet<&str> = units
        .iter()
        .filter(|u| !is_external_test(u))
        .map(|u| u.package_name())
        .collect();

    let name = match primary.len() {
        1 => primary.iter().next().map(|s| s.to_string()).unwrap_or_default(),
        // Only external test files: treat them as the package.
        0 => {
            let all: BTreeSet<&str> = units.iter().map(|u| u.package_name()).collect();
            if all.len() != 1 {
                return Err(packages_found(dir, &all));
            }
            all.iter().next().map(|s| s.to_string()).unwrap_or_default()
        }
        _ => return Err(packages_found(dir, &primary)),
    };

    let before = units.len();
    let units: Vec<CompilationUnit> = units
        .into_iter()
        .filter(|u| u.package_name() == name)
        .collect();
    if units.len() < before {
        tracing::debug!(
            package = %name,
            dropped = before - units.len(),
            "dropped external test files"
        );
    }
    Ok((name, units))
}

fn is_external_test(unit: &CompilationUnit) -> bool {
    is_test_file(&unit.path) && unit.package_name().ends_with("_test")
}

fn packages_found(dir: &Path, names: &BTreeSet<&str>) -> ScanError {
    let list: Vec<&str> = names.iter().copied().collect();
    ScanError::load(
        dir,
        format!("{} packages found: {}", list.len(), list.join(", ")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_package(files: &[(&str, &str)]) -> PathBuf {
        // Unique dir per test to avoid conflicts with concurrent tests
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "typeconsts_builder_test_{}_{}",
            std::process::id(),
            id
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).expect("Failed to create test directory");
        for (name, content) in files {
            fs::write(dir.join(name), content).expect("Failed to write test file");
        }
        dir
    }

    #[test]
    fn test_builder_basic() {
        let dir = create_test_package(&[
            ("color.go", "package paint\n\ntype Color int\n\nconst (\n\tRed Color = iota\n\tGreen\n)\n"),
        ]);

        let package = PackageLoader::new(&dir).load().unwrap();
        assert_eq!(package.name(), "paint");
        assert_eq!(package.values_of_type("Color").unwrap(), ["Red", "Green"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_external_test_package_is_dropped() {
        let dir = create_test_package(&[
            ("color.go", "package paint\ntype Color int\nconst Red Color = 1\n"),
            ("color_test.go", "package paint_test\nconst Other = 2\n"),
        ]);

        let package = PackageLoader::new(&dir).include_tests(true).load().unwrap();
        assert_eq!(package.units().len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_internal_test_file_contributes() {
        let dir = create_test_package(&[
            ("color.go", "package paint\ntype Color int\nconst Red Color = 1\n"),
            ("color_test.go", "package paint\nconst Fake Color = 9\n"),
        ]);

        let without = PackageLoader::new(&dir).load().unwrap();
        assert_eq!(without.values_of_type("Color").unwrap(), ["Red"]);

        let with = PackageLoader::new(&dir).include_tests(true).load().unwrap();
        assert_eq!(with.values_of_type("Color").unwrap(), ["Red", "Fake"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mixed_packages_fail() {
        let dir = create_test_package(&[
            ("a.go", "package one\n"),
            ("b.go", "package two\n"),
        ]);

        let err = PackageLoader::new(&dir).load().unwrap_err();
        match err {
            ScanError::Load { message, .. } => assert_eq!(message, "2 packages found: one, two"),
            other => panic!("Expected Load error, got {:?}", other),
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_dir_fails() {
        let dir = create_test_package(&[]);
        let err = PackageLoader::new(&dir).load().unwrap_err();
        assert!(matches!(err, ScanError::Load { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_and_builder_precedence() {
        let dir = create_test_package(&[
            ("color.go", "package paint\ntype Color int\nconst Red Color = 1\n"),
            ("color_test.go", "package paint\nconst Fake Color = 9\n"),
            ("zz_generated.go", "package paint\nconst Gen Color = 5\n"),
            (CONFIG_FILE, "include_tests = true\nexclude = [\"zz_generated.go\"]\n"),
        ]);

        let from_config = PackageLoader::new(&dir).load().unwrap();
        assert_eq!(from_config.values_of_type("Color").unwrap(), ["Red", "Fake"]);

        let overridden = PackageLoader::new(&dir).include_tests(false).load().unwrap();
        assert_eq!(overridden.values_of_type("Color").unwrap(), ["Red"]);

        let no_config = PackageLoader::new(&dir).with_config(false).load().unwrap();
        assert_eq!(no_config.values_of_type("Color").unwrap(), ["Red", "Gen"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_build_constraints_select_files() {
        let dir = create_test_package(&[
            ("color.go", "package paint\ntype Color int\nconst Red Color = 1\n"),
            ("gen.go", "//go:build ignore\n\npackage main\n\nfunc main() {}\n"),
            ("z_linux.go", "package paint\nconst Extra Color = 2\n"),
            ("z_windows.go", "package paint\nconst Extra Color = 3\n"),
            ("_old.go", "package paint\nconst Red Color = 9\n"),
        ]);

        let linux = PackageLoader::new(&dir)
            .target(BuildContext::new("linux", "amd64"))
            .load()
            .unwrap();
        assert_eq!(linux.units().len(), 2);
        assert_eq!(linux.constants_of_type("Color").unwrap()[1].value, 2);

        let windows = PackageLoader::new(&dir)
            .target(BuildContext::new("windows", "amd64"))
            .load()
            .unwrap();
        assert_eq!(windows.constants_of_type("Color").unwrap()[1].value, 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = create_test_package(&[
            ("color.go", "package paint\n"),
            (CONFIG_FILE, "include_tests = \"maybe\"\n"),
        ]);
        let err = PackageLoader::new(&dir).load().unwrap_err();
        assert!(matches!(err, ScanError::Config { .. }));
        fs::remove_dir_all(&dir).ok();
    }
}
