//! Reading and parsing Go files into compilation units.
//!
//! Files are parsed in parallel with rayon; the output keeps the input
//! order, and each file's position in that order becomes the `file` part of
//! the `NodeId`s it defines. Files whose `//go:build` header rules them out
//! are dropped before parsing.

use crate::constraint::BuildContext;
use crate::error::{IoResultExt, ScanError, ScanResult};
use crate::syntax::ast::File;
use crate::syntax::parser::parse_file;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum file size to parse (10 MB).
const MAX_FILE_SIZE: usize = 10_000_000;

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Path the file was read from
    pub path: PathBuf,
    /// Declaration syntax
    pub file: File,
}

impl CompilationUnit {
    /// Package name from the `package` clause.
    pub fn package_name(&self) -> &str {
        &self.file.package.name
    }
}

/// Parse Go source text that was read from `path`.
pub fn parse_source(path: &Path, content: &str, index: u32) -> ScanResult<CompilationUnit> {
    let file = parse_file(content, index).map_err(|e| {
        ScanError::parse_at(path, e.message, e.pos.line, e.pos.column)
    })?;
    Ok(CompilationUnit {
        path: path.to_path_buf(),
        file,
    })
}

fn read_source(path: &Path) -> ScanResult<String> {
    let content = fs::read_to_string(path).with_path(path)?;
    if content.len() > MAX_FILE_SIZE {
        tracing::warn!(path = %path.display(), size = content.len(), "file too large");
        return Err(ScanError::parse(
            path,
            format!("File too large ({} bytes, max {})", content.len(), MAX_FILE_SIZE),
        ));
    }
    Ok(content)
}

/// Read and parse a single file, ignoring build constraints.
pub fn parse_single_file(path: &Path, index: u32) -> ScanResult<CompilationUnit> {
    let content = read_source(path)?;
    let unit = parse_source(path, &content, index)?;
    tracing::debug!(
        path = %path.display(),
        package = %unit.package_name(),
        decls = unit.file.decls.len(),
        "parsed file"
    );
    Ok(unit)
}

/// Read a file and parse it if its build constraints hold for `ctx`.
pub fn parse_file_for(
    path: &Path,
    index: u32,
    ctx: &BuildContext,
) -> ScanResult<Option<CompilationUnit>> {
    let content = read_source(path)?;
    let included = ctx.matches_source(&content).map_err(|e| {
        ScanError::parse_at(path, format!("invalid build constraint: {}", e.message), e.line, 1)
    })?;
    if !included {
        tracing::debug!(path = %path.display(), "excluded by build constraints");
        return Ok(None);
    }
    parse_source(path, &content, index).map(Some)
}

/// Parse all files in parallel for the host platform, preserving their
/// order.
pub fn parse_go_files(files: &[PathBuf]) -> ScanResult<Vec<CompilationUnit>> {
    parse_go_files_for(files, &BuildContext::default())
}

/// Parse all files whose build constraints hold for `ctx`.
///
/// The first error in file order is returned.
pub fn parse_go_files_for(
    files: &[PathBuf],
    ctx: &BuildContext,
) -> ScanResult<Vec<CompilationUnit>> {
    let results: Vec<ScanResult<Option<CompilationUnit>>> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| parse_file_for(path, index as u32, ctx))
        .collect();
    let units: Vec<Option<CompilationUnit>> = results.into_iter().collect::<ScanResult<_>>()?;
    Ok(units.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_reports_location() {
        let err = parse_source(Path::new("/pkg/bad.go"), "package p\nconst (\n\tA = \n", 0)
            .unwrap_err();
        match err {
            ScanError::Parse { path, line, .. } => {
                assert_eq!(path, PathBuf::from("/pkg/bad.go"));
                assert!(line.is_some());
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_source_keeps_package_name() {
        let unit = parse_source(Path::new("a.go"), "package colors\n", 0).unwrap();
        assert_eq!(unit.package_name(), "colors");
    }

    #[test]
    fn test_build_constraints_drop_files() {
        let dir = std::env::temp_dir().join(format!("typeconsts_parse_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let kept = dir.join("color.go");
        let ignored = dir.join("gen.go");
        fs::write(&kept, "//go:build linux\n\npackage paint\n").unwrap();
        fs::write(&ignored, "//go:build ignore\n\npackage main\n").unwrap();

        let ctx = BuildContext::new("linux", "amd64");
        let units = parse_go_files_for(&[kept.clone(), ignored], &ctx).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].path, kept);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_constraint_is_parse_error() {
        let err = parse_file_for(Path::new("/nowhere.go"), 0, &BuildContext::default());
        assert!(matches!(err, Err(ScanError::Io { .. })));

        let dir = std::env::temp_dir().join(format!("typeconsts_parse_bad_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.go");
        fs::write(&path, "//go:build (linux\n\npackage p\n").unwrap();
        match parse_file_for(&path, 0, &BuildContext::default()) {
            Err(ScanError::Parse { line, .. }) => assert_eq!(line, Some(1)),
            other => panic!("Expected Parse error, got {:?}", other),
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_single_file(Path::new("/definitely/not/here.go"), 0).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }
}
