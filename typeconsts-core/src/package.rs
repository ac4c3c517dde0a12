//! A loaded, checked Go package and the scanning entry points on it.

use crate::constants::{self, ConstantRecord};
use crate::error::{ScanError, ScanResult};
use crate::parse::CompilationUnit;
use crate::types::{check_package, TypeInfo};
use std::path::{Path, PathBuf};

/// All compilation units of one package plus their symbol table.
///
/// Scans allocate their own state, so a `Package` can be shared between
/// threads and scanned for several types at once.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    dir: PathBuf,
    units: Vec<CompilationUnit>,
    info: TypeInfo,
}

impl Package {
    /// Check `units` (already in file order) and assemble the package.
    pub fn new(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        units: Vec<CompilationUnit>,
    ) -> ScanResult<Self> {
        let files: Vec<_> = units.iter().map(|u| &u.file).collect();
        let info = check_package(&files).map_err(|e| {
            let path = units
                .get(e.file)
                .map(|u| u.path.clone())
                .unwrap_or_default();
            ScanError::check_at(path, e.message, e.pos.line, e.pos.column)
        })?;

        Ok(Self {
            name: name.into(),
            dir: dir.into(),
            units,
            info,
        })
    }

    /// Package name from the `package` clauses.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Units in file order.
    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    /// Symbol table of the package.
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    /// Names of the constants declared for `type_name`, in file, then
    /// declaration, then name order.
    pub fn values_of_type(&self, type_name: &str) -> ScanResult<Vec<String>> {
        constants::values_of_type(self.units.iter().map(|u| &u.file), &self.info, type_name)
    }

    /// Full records for the constants declared for `type_name`.
    pub fn constants_of_type(&self, type_name: &str) -> ScanResult<Vec<ConstantRecord>> {
        let records =
            constants::constants_of_type(self.units.iter().map(|u| &u.file), &self.info, type_name)?;
        tracing::debug!(
            package = %self.name,
            type_name = %type_name,
            count = records.len(),
            "scanned constants"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    fn package(sources: &[(&str, &str)]) -> ScanResult<Package> {
        let units = sources
            .iter()
            .enumerate()
            .map(|(i, (path, src))| parse_source(Path::new(path), src, i as u32))
            .collect::<ScanResult<Vec<_>>>()?;
        Package::new("p", "/pkg", units)
    }

    #[test]
    fn test_values_across_units() {
        let pkg = package(&[
            ("/pkg/a.go", "package p\ntype Color int\nconst Red Color = 1\n"),
            ("/pkg/b.go", "package p\nconst (\n\tGreen Color = iota + 2\n\tBlue\n)\n"),
        ])
        .unwrap();
        assert_eq!(pkg.values_of_type("Color").unwrap(), ["Red", "Green", "Blue"]);
        let records = pkg.constants_of_type("Color").unwrap();
        assert_eq!(records[2].value, 3);
    }

    #[test]
    fn test_check_error_carries_path() {
        let err = package(&[
            ("/pkg/a.go", "package p\n"),
            ("/pkg/b.go", "package p\nconst X uint8 = 300\n"),
        ])
        .unwrap_err();
        match err {
            ScanError::Check { path, line, .. } => {
                assert_eq!(path, PathBuf::from("/pkg/b.go"));
                assert_eq!(line, Some(2));
            }
            other => panic!("Expected Check error, got {:?}", other),
        }
    }

    #[test]
    fn test_package_is_sync() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<Package>();
    }
}
