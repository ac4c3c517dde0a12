//! typeconsts-core: enumerate the constants declared for a named Go type.
//!
//! This library loads a Go package from a directory, evaluates its constant
//! declarations and lists, for a requested type name, every constant
//! declared against that type with its value and signedness. It is the
//! analytical core of stringer-style code generators.
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use typeconsts_core::prelude::*;
//!
//! let package = PackageLoader::new("/path/to/pkg").load()?;
//!
//! for record in package.constants_of_type("Color")? {
//!     println!("{} = {}", record.name, record);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`scan`]: File discovery in a package directory
//! - [`constraint`]: Build constraints (`//go:build`, `_GOOS` file names)
//! - [`syntax`]: Go lexer and declaration parser
//! - [`parse`]: Parallel parsing into compilation units
//! - [`types`]: Constant evaluation and the symbol oracle
//! - [`constants`]: The constant scanner and value runs
//! - [`package`]: A loaded package and its scanning entry points
//! - [`builder`]: Fluent loader configuration
//! - [`error`]: Typed error handling

pub mod builder;
pub mod config;
pub mod constants;
pub mod constraint;
pub mod error;
pub mod logging;
pub mod package;
pub mod parse;
pub mod prelude;
pub mod report;
pub mod scan;
pub mod syntax;
pub mod types;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{IoResultExt, ScanError, ScanResult};

// Loading
pub use builder::{load_package, PackageLoader};
pub use package::Package;
pub use parse::{
    parse_file_for, parse_go_files, parse_go_files_for, parse_single_file, parse_source,
    CompilationUnit,
};

// Build constraints
pub use constraint::{BuildContext, ConstraintError};

// Configuration
pub use config::{load_config, OutputConfig, TypeconstsConfig};

// Logging
pub use logging::{init_structured_logging, log_error, log_info, log_warn};

// Reporting
pub use report::{print_json, print_plain, print_runs, TypeReport};

// File scanning
pub use scan::{gather_go_files, gather_go_files_for, gather_go_files_with_excludes};

// Scanning
pub use constants::{
    constants_of_type, sort_by_value, split_into_runs, values_of_type, ConstantRecord,
    ConstantScanner,
};

// Symbol oracle
pub use types::{BasicKind, ConstValue, Symbol, SymbolKind, SymbolOracle, TypeInfo};
