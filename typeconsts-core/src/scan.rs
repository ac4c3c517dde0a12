//! Deterministic discovery of the Go files that make up one package.
//!
//! A Go package is a single directory, so the walk never descends into
//! subdirectories. The result is sorted by file name; that order is the
//! file order every later stage preserves. Names starting with `_` or `.`
//! and names whose `_GOOS`/`_GOARCH` suffix names another target are
//! skipped, as `go build` does.

use crate::constraint::BuildContext;
use crate::error::{ScanError, ScanResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of files that belong to `go test` builds only.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Checks if a directory entry is a Go source file we should load.
#[inline]
fn is_go_source(
    entry: &walkdir::DirEntry,
    include_tests: bool,
    excludes: &HashSet<&str>,
    ctx: &BuildContext,
) -> bool {
    if !entry.file_type().is_file() {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name.ends_with(".go")
        && !name.starts_with('.')
        && !name.starts_with('_')
        && (include_tests || !name.ends_with(TEST_FILE_SUFFIX))
        && !excludes.contains(name)
        && ctx.matches_file_name(name)
}

/// Gathers the `.go` files directly inside `dir`, sorted by file name.
///
/// `_test.go` files are skipped unless `include_tests` is set.
pub fn gather_go_files(dir: &Path, include_tests: bool) -> ScanResult<Vec<PathBuf>> {
    gather_go_files_with_excludes(dir, include_tests, &[])
}

/// Gathers `.go` files, also skipping any file whose name is in `excludes`.
pub fn gather_go_files_with_excludes(
    dir: &Path,
    include_tests: bool,
    excludes: &[&str],
) -> ScanResult<Vec<PathBuf>> {
    gather_go_files_for(dir, include_tests, excludes, &BuildContext::default())
}

/// Gathers `.go` files whose names fit the target `ctx`.
pub fn gather_go_files_for(
    dir: &Path,
    include_tests: bool,
    excludes: &[&str],
    ctx: &BuildContext,
) -> ScanResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ScanError::load(dir, "not a directory"));
    }
    let excludes: HashSet<&str> = excludes.iter().copied().collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(io) => ScanError::io(path, io),
                None => ScanError::load(path, "filesystem loop"),
            }
        })?;
        if is_go_source(&entry, include_tests, &excludes, ctx) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(dir = %dir.display(), count = files.len(), "gathered go files");
    Ok(files)
}

/// Whether a path names a `_test.go` file.
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir(tag: &str) -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "typeconsts_scan_{}_{}_{}",
            tag,
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_sorted_non_recursive() {
        let dir = temp_dir("sorted");
        fs::write(dir.join("b.go"), "package p\n").unwrap();
        fs::write(dir.join("a.go"), "package p\n").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("sub").join("c.go"), "package sub\n").unwrap();

        let files = gather_go_files(&dir, false).unwrap();
        assert_eq!(names(&files), ["a.go", "b.go"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_test_files_are_optional() {
        let dir = temp_dir("tests");
        fs::write(dir.join("a.go"), "package p\n").unwrap();
        fs::write(dir.join("a_test.go"), "package p\n").unwrap();

        assert_eq!(names(&gather_go_files(&dir, false).unwrap()), ["a.go"]);
        assert_eq!(
            names(&gather_go_files(&dir, true).unwrap()),
            ["a.go", "a_test.go"]
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_excludes() {
        let dir = temp_dir("excludes");
        fs::write(dir.join("a.go"), "package p\n").unwrap();
        fs::write(dir.join("zz_generated.go"), "package p\n").unwrap();

        let files = gather_go_files_with_excludes(&dir, false, &["zz_generated.go"]).unwrap();
        assert_eq!(names(&files), ["a.go"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_underscore_and_platform_names() {
        let dir = temp_dir("platform");
        for name in ["a.go", "_old.go", "z_linux.go", "z_windows.go", "z_linux_arm64.go"] {
            fs::write(dir.join(name), "package p\n").unwrap();
        }

        let ctx = BuildContext::new("linux", "amd64");
        let files = gather_go_files_for(&dir, false, &[], &ctx).unwrap();
        assert_eq!(names(&files), ["a.go", "z_linux.go"]);

        let ctx = BuildContext::new("windows", "arm64");
        let files = gather_go_files_for(&dir, false, &[], &ctx).unwrap();
        assert_eq!(names(&files), ["a.go", "z_windows.go"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_dir_is_load_error() {
        let dir = std::env::temp_dir().join("typeconsts_scan_definitely_missing");
        let err = gather_go_files(&dir, false).unwrap_err();
        assert!(matches!(err, ScanError::Load { .. }));
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("/pkg/color_test.go")));
        assert!(!is_test_file(Path::new("/pkg/color.go")));
    }
}
