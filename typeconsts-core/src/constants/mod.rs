//! Enumeration of the constants declared for a named type.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │  const_scanner.rs   │     │   const_record.rs   │
//! │  ─────────────────  │────▶│  ─────────────────  │
//! │  Walk const groups, │     │  name, bits,        │
//! │  consult the oracle │     │  signedness         │
//! └─────────────────────┘     └──────────┬──────────┘
//!                                        ▼
//!                             ┌─────────────────────┐
//!                             │      runs.rs        │
//!                             │  ─────────────────  │
//!                             │  Sort by value and  │
//!                             │  split into runs    │
//!                             └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use typeconsts_core::load_package;
//!
//! let package = load_package(Path::new("./pkg/colors"))?;
//! for record in package.constants_of_type("Color")? {
//!     println!("{} = {}", record.name, record);
//! }
//! ```

pub mod const_record;
pub mod const_scanner;
pub mod runs;

pub use const_record::ConstantRecord;
pub use const_scanner::{constants_of_type, values_of_type, ConstantScanner};
pub use runs::{sort_by_value, split_into_runs};
