//! Constant-declaration scanner.
//!
//! Walks the top-level `const` groups of each file and collects the names
//! declared for one type. Type membership is decided syntactically, line by
//! line, carrying the type of the previous line through implicit repetition:
//!
//! ```go
//! const (
//!     Red Color = iota // Color
//!     Green            // still Color
//!     Limit = 10       // plain value: resets
//!     Blue = Color(5)  // conversion: Color again
//! )
//! ```
//!
//! Values and signedness come from the [`SymbolOracle`], never from the
//! syntax. When the two disagree the scan stops with
//! [`ScanError::InternalInconsistency`].

use super::const_record::ConstantRecord;
use crate::error::{ScanError, ScanResult};
use crate::syntax::ast::{DeclGroup, Expr, File, Ident, TypeExpr};
use crate::types::oracle::{SymbolKind, SymbolOracle};

/// Scans files for the constants of one type name.
pub struct ConstantScanner<'a, O: SymbolOracle + ?Sized> {
    oracle: &'a O,
    type_name: &'a str,
}

impl<'a, O: SymbolOracle + ?Sized> ConstantScanner<'a, O> {
    pub fn new(oracle: &'a O, type_name: &'a str) -> Self {
        Self { oracle, type_name }
    }

    /// Scan files in order and concatenate their records.
    ///
    /// An empty result is not an error here; see [`constants_of_type`].
    pub fn scan<'f>(&self, files: impl IntoIterator<Item = &'f File>) -> ScanResult<Vec<ConstantRecord>> {
        let mut records = Vec::new();
        for file in files {
            records.extend(self.scan_file(file)?);
        }
        Ok(records)
    }

    /// Records declared in one file, in declaration order.
    pub fn scan_file(&self, file: &File) -> ScanResult<Vec<ConstantRecord>> {
        let mut records = Vec::new();
        for group in file.const_groups() {
            self.scan_group(group, &mut records)?;
        }
        Ok(records)
    }

    fn scan_group(&self, group: &DeclGroup, out: &mut Vec<ConstantRecord>) -> ScanResult<()> {
        let mut current_type: &str = "";

        for spec in group.value_specs() {
            match &spec.ty {
                None if !spec.values.is_empty() => {
                    current_type = conversion_type(&spec.values[0]).unwrap_or("");
                }
                Some(TypeExpr::Ident(ty)) => current_type = &ty.name,
                // Qualified, parenthesized or composite: only a bare name counts.
                Some(_) => continue,
                None => {}
            }

            if current_type != self.type_name {
                continue;
            }

            tracing::debug!(
                type_name = %self.type_name,
                line = spec.pos.line,
                names = spec.names.len(),
                "matched const line"
            );
            for name in spec.names.iter().filter(|n| !n.is_blank()) {
                out.push(self.resolve(name)?);
            }
        }
        Ok(())
    }

    /// Turn one matched name into a record using the oracle.
    fn resolve(&self, name: &Ident) -> ScanResult<ConstantRecord> {
        let symbol = self
            .oracle
            .lookup(name.id)
            .ok_or_else(|| ScanError::inconsistency(&name.name, "no symbol for declared constant"))?;

        if symbol.kind != SymbolKind::Const {
            return Err(ScanError::inconsistency(&name.name, "symbol is not a constant"));
        }
        if !symbol.basic.is_integer() {
            return Err(ScanError::inconsistency(
                &name.name,
                format!("underlying type {} is not an integer type", symbol.basic),
            ));
        }
        let value = match &symbol.value {
            Some(value) if value.is_int() => value,
            Some(value) => {
                return Err(ScanError::inconsistency(
                    &name.name,
                    format!("value {} is not an integer constant", value),
                ))
            }
            None => return Err(ScanError::inconsistency(&name.name, "constant has no value")),
        };

        let bits = match (value.int64_val(), value.uint64_val()) {
            (Some(v), _) => v as u64,
            (None, Some(v)) => v,
            (None, None) => {
                return Err(ScanError::inconsistency(
                    &name.name,
                    format!("value {} does not fit in 64 bits", value),
                ))
            }
        };

        Ok(ConstantRecord {
            name: name.name.clone(),
            value: bits,
            signed: !symbol.basic.is_unsigned(),
            literal: value.to_string(),
        })
    }
}

/// The type named by a conversion `T(x)` where `T` is a bare identifier.
fn conversion_type(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Call { func, .. } => match func.as_ref() {
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        },
        _ => None,
    }
}

/// All constants of `type_name` across `files`, failing with `NotFound`
/// when there are none.
pub fn constants_of_type<'f, O>(
    files: impl IntoIterator<Item = &'f File>,
    oracle: &O,
    type_name: &str,
) -> ScanResult<Vec<ConstantRecord>>
where
    O: SymbolOracle + ?Sized,
{
    let records = ConstantScanner::new(oracle, type_name).scan(files)?;
    if records.is_empty() {
        return Err(ScanError::not_found(type_name));
    }
    Ok(records)
}

/// Names of all constants of `type_name`, in declaration order.
pub fn values_of_type<'f, O>(
    files: impl IntoIterator<Item = &'f File>,
    oracle: &O,
    type_name: &str,
) -> ScanResult<Vec<String>>
where
    O: SymbolOracle + ?Sized,
{
    Ok(constants_of_type(files, oracle, type_name)?
        .into_iter()
        .map(|r| r.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::NodeId;
    use crate::syntax::parser::parse_file;
    use crate::types::basic::BasicKind;
    use crate::types::checker::check_package;
    use crate::types::oracle::Symbol;
    use crate::types::value::ConstValue;
    use std::collections::HashMap;

    fn names(records: &[ConstantRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    /// Parse and check a single-file package, then scan it.
    fn scan_source(source: &str, type_name: &str) -> ScanResult<Vec<ConstantRecord>> {
        let file = parse_file(source, 0).unwrap();
        let info = check_package(&[&file]).unwrap();
        constants_of_type([&file], &info, type_name)
    }

    /// Symbol table built by hand, bypassing the checker.
    fn oracle_for(file: &File, entries: &[(&str, BasicKind, Option<ConstValue>)]) -> HashMap<NodeId, Symbol> {
        let mut table = HashMap::new();
        for group in file.const_groups() {
            for spec in group.value_specs() {
                for ident in &spec.names {
                    if let Some((_, basic, value)) = entries.iter().find(|(n, _, _)| *n == ident.name) {
                        table.insert(
                            ident.id,
                            Symbol {
                                name: ident.name.clone(),
                                kind: SymbolKind::Const,
                                type_name: "T".to_string(),
                                basic: *basic,
                                value: value.clone(),
                            },
                        );
                    }
                }
            }
        }
        table
    }

    #[test]
    fn test_type_propagates_through_repetition() {
        let src = "package p\ntype Color int\nconst (\n\tA Color = 0\n\tB\n\tC\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["A", "B", "C"]);
        assert_eq!(records[2].value, 0);
    }

    #[test]
    fn test_conversion_sets_type() {
        let src = "package p\ntype Color int\nconst (\n\tA = Color(0)\n\tB = Color(1)\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["A", "B"]);
        assert_eq!(records[1].value, 1);
    }

    #[test]
    fn test_plain_value_resets_type() {
        let src = "package p\ntype Color int\nconst (\n\tA Color = 0\n\tB = 1\n\tC Color = 2\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["A", "C"]);
    }

    #[test]
    fn test_reset_persists_through_repetition() {
        // D repeats `1 + iota`, which is not a conversion.
        let src = "package p\ntype Color int\nconst (\n\tA Color = iota\n\tB = 1 + iota\n\tD\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["A"]);
    }

    #[test]
    fn test_blank_identifier_is_skipped() {
        let src = "package p\ntype Color uint8\nconst (\n\t_ Color = iota\n\tRed\n\t_\n\tBlue\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["Red", "Blue"]);
        assert_eq!(records[1].value, 3);
        assert!(!records[1].signed);
    }

    #[test]
    fn test_names_on_one_line_keep_order() {
        let src = "package p\ntype Pair int\nconst X, Y Pair = 7, 8\n";
        let records = scan_source(src, "Pair").unwrap();
        assert_eq!(names(&records), ["X", "Y"]);
    }

    #[test]
    fn test_unrelated_groups_do_not_contribute() {
        let src = "package p\ntype Color int\ntype Size int\nconst (\n\tSmall Size = iota\n\tLarge\n)\nconst Red Color = 1\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["Red"]);
    }

    #[test]
    fn test_qualified_type_line_is_skipped() {
        let src = "package p\nimport \"time\"\ntype Color int\nconst (\n\tA Color = 1\n\tB time.Duration = 2\n\tC Color = 3\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["A", "C"]);
    }

    #[test]
    fn test_parenthesized_type_line_is_skipped() {
        let src = "package p\ntype Color int\nconst (\n\tA (Color) = 1\n\tB Color = 2\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["B"]);

        // The skipped line leaves the carried type alone.
        let src = "package p\ntype Color int\nconst (\n\tA Color = 0\n\tB (Color) = 1\n\tC\n)\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["A", "C"]);
        assert_eq!(records[1].value, 1);
    }

    #[test]
    fn test_negative_values_are_signed() {
        let src = "package p\ntype Delta int8\nconst (\n\tDown Delta = -1\n\tUp Delta = 1\n)\n";
        let records = scan_source(src, "Delta").unwrap();
        assert!(records[0].signed);
        assert_eq!(records[0].signed_value(), -1);
        assert_eq!(records[0].value, u64::MAX);
        assert_eq!(records[0].literal, "-1");
    }

    #[test]
    fn test_large_unsigned_keeps_bits() {
        let src = "package p\ntype Mask uint64\nconst All Mask = 1<<64 - 1\n";
        let records = scan_source(src, "Mask").unwrap();
        assert_eq!(records[0].value, u64::MAX);
        assert!(!records[0].signed);
        assert_eq!(records[0].literal, "18446744073709551615");
    }

    #[test]
    fn test_missing_type_is_not_found() {
        let src = "package p\ntype Color int\nconst Red Color = 1\n";
        let err = scan_source(src, "Shade").unwrap_err();
        assert!(matches!(err, ScanError::NotFound { ref type_name } if type_name == "Shade"));
    }

    #[test]
    fn test_non_integer_match_is_inconsistency() {
        let src = "package p\ntype Ratio float64\nconst Half Ratio = 0.5\n";
        let err = scan_source(src, "Ratio").unwrap_err();
        assert!(matches!(err, ScanError::InternalInconsistency { ref name, .. } if name == "Half"));
    }

    #[test]
    fn test_non_integer_unrelated_is_skipped() {
        let src = "package p\ntype Ratio float64\ntype Color int\nconst Half Ratio = 0.5\nconst Red Color = 1\n";
        let records = scan_source(src, "Color").unwrap();
        assert_eq!(names(&records), ["Red"]);
    }

    #[test]
    fn test_missing_symbol_is_inconsistency() {
        let file = parse_file("package p\nconst (\n\tA T = 1\n\tB\n)\n", 0).unwrap();
        let oracle = oracle_for(&file, &[("A", BasicKind::Int, Some(ConstValue::Int(1)))]);
        let err = constants_of_type([&file], &oracle, "T").unwrap_err();
        assert!(matches!(err, ScanError::InternalInconsistency { ref name, .. } if name == "B"));
    }

    #[test]
    fn test_value_without_integer_is_inconsistency() {
        let file = parse_file("package p\nconst A T = 1\n", 0).unwrap();
        let oracle = oracle_for(&file, &[("A", BasicKind::Int, Some(ConstValue::String("x".into())))]);
        let err = constants_of_type([&file], &oracle, "T").unwrap_err();
        assert!(matches!(err, ScanError::InternalInconsistency { .. }));

        let oracle = oracle_for(&file, &[("A", BasicKind::Int, None)]);
        let err = constants_of_type([&file], &oracle, "T").unwrap_err();
        assert!(matches!(err, ScanError::InternalInconsistency { .. }));
    }

    #[test]
    fn test_value_beyond_64_bits_is_inconsistency() {
        let file = parse_file("package p\nconst A T = 1\n", 0).unwrap();
        let oracle = oracle_for(&file, &[("A", BasicKind::Int, Some(ConstValue::Int(1i128 << 70)))]);
        let err = constants_of_type([&file], &oracle, "T").unwrap_err();
        assert!(matches!(err, ScanError::InternalInconsistency { .. }));
    }

    #[test]
    fn test_inconsistency_aborts_whole_scan() {
        let first = parse_file("package p\nconst A T = 1\n", 0).unwrap();
        let second = parse_file("package p\nconst B T = 2\n", 1).unwrap();
        let mut oracle = oracle_for(&first, &[("A", BasicKind::Int, Some(ConstValue::Int(1)))]);
        oracle.extend(oracle_for(&second, &[("B", BasicKind::Float64, Some(ConstValue::Float(2.0)))]));
        let err = constants_of_type([&first, &second], &oracle, "T").unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_file_order_is_preserved() {
        let first = parse_file("package p\nconst Z T = 1\n", 0).unwrap();
        let second = parse_file("package p\nconst A T = 2\n", 1).unwrap();
        let mut oracle = oracle_for(&first, &[("Z", BasicKind::Uint, Some(ConstValue::Int(1)))]);
        oracle.extend(oracle_for(&second, &[("A", BasicKind::Uint, Some(ConstValue::Int(2)))]));
        let names = values_of_type([&first, &second], &oracle, "T").unwrap();
        assert_eq!(names, ["Z", "A"]);
    }
}
