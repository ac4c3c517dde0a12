//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use typeconsts_core::prelude::*;
//! ```

// Core types
pub use crate::error::{ScanError, ScanResult};
pub use crate::package::Package;
pub use crate::constants::ConstantRecord;

// Loading
pub use crate::builder::{load_package, PackageLoader};
pub use crate::constraint::BuildContext;

// Generator helpers
pub use crate::constants::{sort_by_value, split_into_runs};

// Oracle
pub use crate::types::{SymbolOracle, TypeInfo};
