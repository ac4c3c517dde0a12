//! Package-level constant checker.
//!
//! Evaluates every `const` declaration of a package and records the result
//! in a [`TypeInfo`] keyed by the defining identifier. Evaluation follows
//! Go's rules for the parts that affect integer enumerations:
//!
//! - `iota` is the index of the line within its group
//! - a line without values repeats the previous line's type and values
//! - untyped constants take the declared type, with a representability check
//! - constants may refer to each other in any order; the dependency graph is
//!   ordered with a topological sort and cycles are rejected
//!
//! Anything that depends on other packages (`time.Second`,
//! `unsafe.Sizeof(x)`, types declared as `pkg.T`) is accepted but yields no
//! value, so the scanner reports it instead of silently guessing.

use super::basic::BasicKind;
use super::oracle::{Symbol, SymbolKind, TypeInfo};
use super::value::ConstValue;
use crate::syntax::ast::*;
use crate::syntax::literal;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Longest alias chain followed before giving up.
const MAX_ALIAS_DEPTH: usize = 64;

/// Largest shift count accepted in constant expressions.
const MAX_SHIFT: i128 = 511;

/// Untyped integers are evaluated in `i128`, narrower than Go's 512 bits.
const EVAL_LIMIT: &str = "exceeds the 128-bit limit of constant evaluation";

/// Predeclared complex types. Their values are never folded.
const COMPLEX_TYPES: [&str; 2] = ["complex64", "complex128"];

/// Type given to imaginary literals and complex builtins.
const UNTYPED_COMPLEX: &str = "untyped complex";

/// A type error, located by file index and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    pub file: usize,
    pub message: String,
    pub pos: Pos,
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.pos)
    }
}

impl std::error::Error for CheckError {}

type CheckResult<T> = Result<T, CheckError>;

/// Check all files of one package and build its symbol table.
///
/// `files` must be in load order. [`CheckError::file`] is an index into
/// `files`.
pub fn check_package(files: &[&File]) -> CheckResult<TypeInfo> {
    let mut checker = Checker::new(files)?;
    checker.evaluate()?;
    checker.record_types();
    Ok(checker.info)
}

// ============================================================================
// Types and operands
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Underlying {
    Basic(BasicKind),
    /// Declared in terms of another package; the basic kind is unknown here.
    Foreign,
    /// Struct, slice, generic or otherwise not usable for constants.
    Composite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConstType {
    name: String,
    basic: BasicKind,
    foreign: bool,
}

impl ConstType {
    fn basic(kind: BasicKind) -> Self {
        Self {
            name: kind.name().to_string(),
            basic: kind,
            foreign: false,
        }
    }

    fn foreign(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            basic: BasicKind::Invalid,
            foreign: true,
        }
    }

    fn unknown() -> Self {
        Self::foreign(BasicKind::Invalid.name())
    }

    fn is_untyped(&self) -> bool {
        self.basic.is_untyped()
    }
}

/// A constant expression result. `value` is `None` when it depends on
/// another package.
#[derive(Debug, Clone, PartialEq)]
struct Operand {
    ty: ConstType,
    value: Option<ConstValue>,
}

impl Operand {
    fn untyped(kind: BasicKind, value: ConstValue) -> Self {
        Self {
            ty: ConstType::basic(kind),
            value: Some(value),
        }
    }

    fn unknown(ty: ConstType) -> Self {
        Self { ty, value: None }
    }

    fn describe(&self) -> String {
        match &self.value {
            Some(v) if self.ty.is_untyped() => format!("{} ({} constant)", v, self.ty.name),
            Some(v) => format!("{} (constant of type {})", v, self.ty.name),
            None => format!("constant of type {}", self.ty.name),
        }
    }
}

enum RepresentError {
    Overflow,
    Truncated,
    Mismatch,
}

/// Convert `value` to the representation of `kind`, if it fits.
fn represent(value: &ConstValue, kind: BasicKind) -> Result<ConstValue, RepresentError> {
    if kind.is_integer() {
        let v = match value {
            ConstValue::Int(_) | ConstValue::Float(_) => {
                value.to_exact_int().ok_or(RepresentError::Truncated)?
            }
            _ => return Err(RepresentError::Mismatch),
        };
        if let Some((lo, hi)) = kind.int_range() {
            if v < lo || v > hi {
                return Err(RepresentError::Overflow);
            }
        }
        Ok(ConstValue::Int(v))
    } else if kind.is_float() {
        let v = value.as_f64().ok_or(RepresentError::Mismatch)?;
        let v = if kind == BasicKind::Float32 {
            let narrowed = v as f32;
            if narrowed.is_infinite() && v.is_finite() {
                return Err(RepresentError::Overflow);
            }
            narrowed as f64
        } else {
            v
        };
        Ok(ConstValue::Float(v))
    } else if kind.is_string() {
        match value {
            ConstValue::String(_) => Ok(value.clone()),
            _ => Err(RepresentError::Mismatch),
        }
    } else if kind.is_boolean() {
        match value {
            ConstValue::Bool(_) => Ok(value.clone()),
            _ => Err(RepresentError::Mismatch),
        }
    } else {
        Err(RepresentError::Mismatch)
    }
}

// ============================================================================
// Checker
// ============================================================================

/// What a package-scope name refers to.
#[derive(Debug, Clone, Copy)]
enum Entity<'a> {
    Const(usize),
    Type(&'a TypeSpec),
    Var,
    Func,
}

/// One declared constant name with the expression that defines it.
struct ConstEntry<'a> {
    ident: &'a Ident,
    ty: Option<&'a TypeExpr>,
    expr: &'a Expr,
    iota: i128,
    file: usize,
}

struct Checker<'a> {
    files: &'a [&'a File],
    scope: HashMap<&'a str, Entity<'a>>,
    type_files: HashMap<&'a str, usize>,
    entries: Vec<ConstEntry<'a>>,
    values: Vec<Option<Operand>>,
    info: TypeInfo,
}

impl<'a> Checker<'a> {
    fn new(files: &'a [&'a File]) -> CheckResult<Self> {
        let mut checker = Self {
            files,
            scope: HashMap::new(),
            type_files: HashMap::new(),
            entries: Vec::new(),
            values: Vec::new(),
            info: TypeInfo::new(),
        };
        checker.collect()?;
        checker.values = vec![None; checker.entries.len()];
        Ok(checker)
    }

    fn error(&self, file: usize, pos: Pos, message: impl Into<String>) -> CheckError {
        CheckError {
            file,
            message: message.into(),
            pos,
        }
    }

    fn declare(&mut self, ident: &'a Ident, entity: Entity<'a>, file: usize) -> CheckResult<()> {
        if ident.is_blank() {
            return Ok(());
        }
        if self.scope.insert(&ident.name, entity).is_some() {
            return Err(self.error(
                file,
                ident.pos,
                format!("{} redeclared in this block", ident.name),
            ));
        }
        Ok(())
    }

    /// Register every package-scope name and expand const groups into entries.
    fn collect(&mut self) -> CheckResult<()> {
        let files = self.files;
        for (file_index, file) in files.iter().copied().enumerate() {
            for decl in &file.decls {
                match decl {
                    Decl::Group(group) => match group.kind {
                        DeclKind::Const => self.collect_consts(group, file_index)?,
                        DeclKind::Type => {
                            for spec in group.type_specs() {
                                self.declare(&spec.name, Entity::Type(spec), file_index)?;
                                self.type_files.insert(&spec.name.name, file_index);
                            }
                        }
                        DeclKind::Var => {
                            for spec in group.value_specs() {
                                for name in &spec.names {
                                    self.declare(name, Entity::Var, file_index)?;
                                }
                            }
                        }
                        DeclKind::Import | DeclKind::Func => {}
                    },
                    Decl::Func(func) => {
                        if !func.is_method && func.name.name != "init" {
                            self.declare(&func.name, Entity::Func, file_index)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_consts(&mut self, group: &'a DeclGroup, file: usize) -> CheckResult<()> {
        let mut previous: Option<(Option<&'a TypeExpr>, &'a [Expr])> = None;

        for (line, spec) in group.value_specs().enumerate() {
            let (ty, values) = if !spec.values.is_empty() {
                let current = (spec.ty.as_ref(), spec.values.as_slice());
                previous = Some(current);
                current
            } else if spec.ty.is_some() {
                return Err(self.error(file, spec.pos, "missing init expr for const declaration"));
            } else {
                previous.ok_or_else(|| {
                    self.error(file, spec.pos, "missing init expr for const declaration")
                })?
            };

            if values.len() < spec.names.len() {
                return Err(self.error(file, spec.pos, "missing init expr for const declaration"));
            }
            if values.len() > spec.names.len() {
                return Err(self.error(
                    file,
                    values[spec.names.len()].pos(),
                    "extra init expr",
                ));
            }

            for (ident, expr) in spec.names.iter().zip(values) {
                let index = self.entries.len();
                self.entries.push(ConstEntry {
                    ident,
                    ty,
                    expr,
                    iota: line as i128,
                    file,
                });
                self.declare(ident, Entity::Const(index), file)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Evaluation order
    // ------------------------------------------------------------------

    fn evaluate(&mut self) -> CheckResult<()> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for index in 0..self.entries.len() {
            graph.add_node(index);
        }
        for (index, entry) in self.entries.iter().enumerate() {
            let mut deps = Vec::new();
            self.const_refs(entry.expr, &mut deps);
            for dep in deps {
                if dep == index {
                    return Err(self.cycle_error(index));
                }
                graph.add_edge(dep, index, ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| self.cycle_error(cycle.node_id()))?;
        for index in order {
            let operand = self.eval_entry(index)?;
            let entry = &self.entries[index];
            if !entry.ident.is_blank() {
                tracing::trace!(
                    name = %entry.ident.name,
                    ty = %operand.ty.name,
                    "constant evaluated"
                );
                self.info.insert(
                    entry.ident.id,
                    Symbol {
                        name: entry.ident.name.clone(),
                        kind: SymbolKind::Const,
                        type_name: operand.ty.name.clone(),
                        basic: operand.ty.basic,
                        value: operand.value.clone(),
                    },
                );
            }
            self.values[index] = Some(operand);
        }
        Ok(())
    }

    fn cycle_error(&self, index: usize) -> CheckError {
        let entry = &self.entries[index];
        self.error(
            entry.file,
            entry.ident.pos,
            format!("initialization cycle: {} refers to itself", entry.ident.name),
        )
    }

    /// Collect the package constants an expression refers to.
    fn const_refs(&self, expr: &Expr, out: &mut Vec<usize>) {
        match expr {
            Expr::Ident(ident) => {
                if let Some(Entity::Const(index)) = self.scope.get(ident.name.as_str()) {
                    out.push(*index);
                }
            }
            Expr::Paren(inner) => self.const_refs(inner, out),
            Expr::Unary { operand, .. } => self.const_refs(operand, out),
            Expr::Binary { lhs, rhs, .. } => {
                self.const_refs(lhs, out);
                self.const_refs(rhs, out);
            }
            Expr::Call { func, args, .. } => {
                self.const_refs(func, out);
                for arg in args {
                    self.const_refs(arg, out);
                }
            }
            Expr::Selector { .. } | Expr::Lit(_) | Expr::Opaque { .. } => {}
        }
    }

    fn eval_entry(&self, index: usize) -> CheckResult<Operand> {
        let entry = &self.entries[index];
        let operand = self.eval(entry.expr, entry.iota, entry.file)?;
        match entry.ty {
            Some(ty) => {
                let target = self.resolve_type(ty, entry.file)?;
                self.convert_implicit(operand, &target, entry.expr.pos(), entry.file)
            }
            None => Ok(operand),
        }
    }

    /// Record type names in the symbol table.
    fn record_types(&mut self) {
        let mut symbols = Vec::new();
        for (name, entity) in &self.scope {
            if let Entity::Type(spec) = entity {
                let basic = match self.underlying_of(*name, &mut HashSet::new()) {
                    Underlying::Basic(kind) => kind,
                    _ => BasicKind::Invalid,
                };
                symbols.push((
                    spec.name.id,
                    Symbol {
                        name: spec.name.name.clone(),
                        kind: SymbolKind::TypeName,
                        type_name: spec.name.name.clone(),
                        basic,
                        value: None,
                    },
                ));
            }
        }
        for (id, symbol) in symbols {
            self.info.insert(id, symbol);
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn underlying_of(&self, name: &'a str, visiting: &mut HashSet<&'a str>) -> Underlying {
        match self.scope.get(name).copied() {
            Some(Entity::Type(spec)) => {
                if spec.generic || !visiting.insert(name) {
                    return Underlying::Composite;
                }
                match spec.ty.unparen() {
                    TypeExpr::Ident(target) => self.underlying_of(&target.name, visiting),
                    TypeExpr::Qualified { .. } => Underlying::Foreign,
                    TypeExpr::Paren { .. } | TypeExpr::Other { .. } => Underlying::Composite,
                }
            }
            Some(_) => Underlying::Composite,
            None => BasicKind::from_name(name).map_or(Underlying::Foreign, Underlying::Basic),
        }
    }

    /// Follow `type A = B` aliases to the name that carries type identity.
    fn canonical_name(&self, name: &'a str) -> Option<&'a str> {
        let mut current = name;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.scope.get(current).copied() {
                Some(Entity::Type(spec)) if spec.alias => match spec.ty.unparen() {
                    TypeExpr::Ident(target) => current = &target.name,
                    _ => return Some(current),
                },
                _ => return Some(current),
            }
        }
        None
    }

    fn named_type(&self, ident: &'a Ident, file: usize) -> CheckResult<ConstType> {
        match self.scope.get(ident.name.as_str()) {
            Some(Entity::Type(_)) => {}
            Some(_) => {
                return Err(self.error(file, ident.pos, format!("{} is not a type", ident.name)))
            }
            None if BasicKind::from_name(&ident.name).is_some() => {}
            None if COMPLEX_TYPES.contains(&ident.name.as_str()) => {
                return Ok(ConstType::foreign(ident.name.as_str()))
            }
            None => return Err(self.error(file, ident.pos, format!("undefined: {}", ident.name))),
        }

        let name = self.canonical_name(&ident.name).ok_or_else(|| {
            self.error(file, ident.pos, format!("invalid recursive type alias {}", ident.name))
        })?;
        match self.underlying_of(name, &mut HashSet::new()) {
            Underlying::Basic(kind) if self.scope.contains_key(name) => Ok(ConstType {
                name: name.to_string(),
                basic: kind,
                foreign: false,
            }),
            Underlying::Basic(kind) => Ok(ConstType::basic(kind)),
            Underlying::Foreign => Ok(ConstType::foreign(name)),
            Underlying::Composite => Err(self.error(
                file,
                ident.pos,
                format!("invalid constant type {}", ident.name),
            )),
        }
    }

    fn resolve_type(&self, ty: &'a TypeExpr, file: usize) -> CheckResult<ConstType> {
        match ty {
            TypeExpr::Ident(ident) => self.named_type(ident, file),
            TypeExpr::Qualified { package, name } => {
                Ok(ConstType::foreign(format!("{}.{}", package.name, name.name)))
            }
            TypeExpr::Paren { inner, .. } => self.resolve_type(inner, file),
            TypeExpr::Other { pos } => Err(self.error(file, *pos, "invalid constant type")),
        }
    }

    /// Whether `name` denotes a type at package or universe scope.
    fn is_type_name(&self, name: &str) -> bool {
        match self.scope.get(name) {
            Some(Entity::Type(_)) => true,
            Some(_) => false,
            None => BasicKind::from_name(name).is_some() || COMPLEX_TYPES.contains(&name),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval(&self, expr: &'a Expr, iota: i128, file: usize) -> CheckResult<Operand> {
        match expr {
            Expr::Lit(lit) => self.eval_lit(lit, file),
            Expr::Ident(ident) => self.eval_ident(ident, iota, file),
            Expr::Selector { .. } => Ok(Operand::unknown(ConstType::unknown())),
            Expr::Paren(inner) => self.eval(inner, iota, file),
            Expr::Unary { op, operand, pos } => {
                let x = self.eval(operand, iota, file)?;
                self.unary(*op, x, *pos, file)
            }
            Expr::Binary { op, lhs, rhs, pos } => {
                let x = self.eval(lhs, iota, file)?;
                let y = self.eval(rhs, iota, file)?;
                self.binary(*op, x, y, *pos, file)
            }
            Expr::Call { func, args, pos } => self.eval_call(func, args, *pos, iota, file),
            Expr::Opaque { pos } => Err(self.error(file, *pos, "invalid constant expression")),
        }
    }

    fn eval_lit(&self, lit: &Lit, file: usize) -> CheckResult<Operand> {
        let invalid = || self.error(file, lit.pos, format!("invalid literal {}", lit.text));
        Ok(match lit.kind {
            LitKind::Int => Operand::untyped(
                BasicKind::UntypedInt,
                ConstValue::Int(literal::parse_int(&lit.text).ok_or_else(invalid)?),
            ),
            LitKind::Float => Operand::untyped(
                BasicKind::UntypedFloat,
                ConstValue::Float(literal::parse_float(&lit.text).ok_or_else(invalid)?),
            ),
            LitKind::Imag => {
                literal::parse_imag(&lit.text).ok_or_else(invalid)?;
                Operand::unknown(ConstType::foreign(UNTYPED_COMPLEX))
            }
            LitKind::Rune => Operand::untyped(
                BasicKind::UntypedRune,
                ConstValue::Int(literal::unquote_rune(&lit.text).ok_or_else(invalid)? as i128),
            ),
            LitKind::String => Operand::untyped(
                BasicKind::UntypedString,
                ConstValue::String(literal::unquote_string(&lit.text).ok_or_else(invalid)?),
            ),
        })
    }

    fn eval_ident(&self, ident: &Ident, iota: i128, file: usize) -> CheckResult<Operand> {
        match self.scope.get(ident.name.as_str()) {
            Some(Entity::Const(index)) => self.values[*index].clone().ok_or_else(|| {
                self.error(
                    file,
                    ident.pos,
                    format!("constant {} used before evaluation", ident.name),
                )
            }),
            Some(Entity::Type(_)) => Err(self.error(
                file,
                ident.pos,
                format!("{} (type) is not an expression", ident.name),
            )),
            Some(Entity::Var) | Some(Entity::Func) => Err(self.error(
                file,
                ident.pos,
                format!("{} is not constant", ident.name),
            )),
            None => match ident.name.as_str() {
                "iota" => Ok(Operand::untyped(BasicKind::UntypedInt, ConstValue::Int(iota))),
                "true" => Ok(Operand::untyped(BasicKind::UntypedBool, ConstValue::Bool(true))),
                "false" => Ok(Operand::untyped(BasicKind::UntypedBool, ConstValue::Bool(false))),
                "_" => Err(self.error(file, ident.pos, "cannot use _ as value")),
                name if BasicKind::from_name(name).is_some() => Err(self.error(
                    file,
                    ident.pos,
                    format!("{} (type) is not an expression", name),
                )),
                name => Err(self.error(file, ident.pos, format!("undefined: {}", name))),
            },
        }
    }

    fn eval_call(
        &self,
        func: &'a Expr,
        args: &'a [Expr],
        pos: Pos,
        iota: i128,
        file: usize,
    ) -> CheckResult<Operand> {
        let callee = match func.unparen() {
            Expr::Ident(ident) => ident,
            Expr::Selector { .. } => return Ok(Operand::unknown(ConstType::unknown())),
            other => return Err(self.error(file, other.pos(), "invalid constant expression")),
        };

        if self.is_type_name(&callee.name) {
            let target = self.named_type(callee, file)?;
            let [arg] = args else {
                return Err(self.error(
                    file,
                    pos,
                    format!("conversion to {} needs exactly one argument", callee.name),
                ));
            };
            let x = self.eval(arg, iota, file)?;
            return self.convert_explicit(x, &target, arg.pos(), file);
        }

        if callee.name == "len" && !self.scope.contains_key("len") {
            let [arg] = args else {
                return Err(self.error(file, pos, "len expects one argument"));
            };
            let x = self.eval(arg, iota, file)?;
            let int = ConstType::basic(BasicKind::Int);
            return match x.value {
                Some(ConstValue::String(s)) => Ok(Operand {
                    ty: int,
                    value: Some(ConstValue::Int(s.len() as i128)),
                }),
                None => Ok(Operand::unknown(int)),
                Some(_) => Err(self.error(
                    file,
                    arg.pos(),
                    format!("invalid argument {} for len", x.describe()),
                )),
            };
        }

        if !self.scope.contains_key(callee.name.as_str()) {
            let folded = match callee.name.as_str() {
                "complex" => Some(UNTYPED_COMPLEX),
                "real" | "imag" => Some(BasicKind::UntypedFloat.name()),
                _ => None,
            };
            if let Some(ty) = folded {
                for arg in args {
                    self.eval(arg, iota, file)?;
                }
                return Ok(Operand::unknown(ConstType::foreign(ty)));
            }
        }

        match self.scope.get(callee.name.as_str()) {
            None if !matches!(callee.name.as_str(), "cap" | "real" | "imag" | "complex" | "min" | "max") => {
                Err(self.error(file, callee.pos, format!("undefined: {}", callee.name)))
            }
            _ => Err(self.error(
                file,
                pos,
                format!("{}(...) is not constant", callee.name),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    /// Assignment of a constant to a declared type.
    fn convert_implicit(
        &self,
        x: Operand,
        target: &ConstType,
        pos: Pos,
        file: usize,
    ) -> CheckResult<Operand> {
        if target.foreign || x.ty.foreign {
            return Ok(Operand {
                ty: target.clone(),
                value: if x.ty.foreign { None } else { x.value },
            });
        }
        if !x.ty.is_untyped() {
            if x.ty.name == target.name {
                return Ok(x);
            }
            return Err(self.error(
                file,
                pos,
                format!("cannot use {} as {} value", x.describe(), target.name),
            ));
        }
        let Some(value) = &x.value else {
            return Ok(Operand::unknown(target.clone()));
        };
        match represent(value, target.basic) {
            Ok(converted) => Ok(Operand {
                ty: target.clone(),
                value: Some(converted),
            }),
            Err(RepresentError::Overflow) => Err(self.error(
                file,
                pos,
                format!("constant {} overflows {}", value, target.name),
            )),
            Err(RepresentError::Truncated) => Err(self.error(
                file,
                pos,
                format!("cannot use {} as {} value (truncated)", x.describe(), target.name),
            )),
            Err(RepresentError::Mismatch) => Err(self.error(
                file,
                pos,
                format!("cannot use {} as {} value", x.describe(), target.name),
            )),
        }
    }

    /// Conversion expression `T(x)`.
    fn convert_explicit(
        &self,
        x: Operand,
        target: &ConstType,
        pos: Pos,
        file: usize,
    ) -> CheckResult<Operand> {
        if target.foreign {
            return Ok(Operand {
                ty: target.clone(),
                value: if x.ty.foreign { None } else { x.value },
            });
        }
        let (Some(value), false) = (&x.value, x.ty.foreign) else {
            return Ok(Operand::unknown(target.clone()));
        };

        if target.basic.is_string() {
            if let ConstValue::Int(code) = value {
                if x.ty.basic.is_integer() {
                    let ch = u32::try_from(*code)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Ok(Operand {
                        ty: target.clone(),
                        value: Some(ConstValue::String(ch.to_string())),
                    });
                }
            }
        }

        match represent(value, target.basic) {
            Ok(converted) => Ok(Operand {
                ty: target.clone(),
                value: Some(converted),
            }),
            Err(RepresentError::Overflow) => Err(self.error(
                file,
                pos,
                format!("cannot convert {} to type {}: constant overflows", x.describe(), target.name),
            )),
            Err(RepresentError::Truncated) => Err(self.error(
                file,
                pos,
                format!("cannot convert {} to type {} (truncated)", x.describe(), target.name),
            )),
            Err(RepresentError::Mismatch) => Err(self.error(
                file,
                pos,
                format!("cannot convert {} to type {}", x.describe(), target.name),
            )),
        }
    }

    /// Check a typed result still fits its type.
    fn fit(&self, x: Operand, pos: Pos, file: usize) -> CheckResult<Operand> {
        if x.ty.is_untyped() || x.ty.foreign {
            return Ok(x);
        }
        let Some(value) = &x.value else {
            return Ok(x);
        };
        match represent(value, x.ty.basic) {
            Ok(value) => Ok(Operand {
                ty: x.ty,
                value: Some(value),
            }),
            Err(_) => Err(self.error(
                file,
                pos,
                format!("constant {} overflows {}", value, x.ty.name),
            )),
        }
    }

    /// Bring two operands to a common type.
    fn unify(
        &self,
        x: Operand,
        y: Operand,
        pos: Pos,
        file: usize,
    ) -> CheckResult<(Operand, Operand, ConstType)> {
        if x.ty.foreign || y.ty.foreign {
            let ty = if x.ty.foreign { x.ty.clone() } else { y.ty.clone() };
            return Ok((x, y, ty));
        }
        let mismatch = |x: &Operand, y: &Operand| {
            self.error(
                file,
                pos,
                format!(
                    "invalid operation: mismatched types {} and {}",
                    x.ty.name, y.ty.name
                ),
            )
        };

        match (x.ty.is_untyped(), y.ty.is_untyped()) {
            (true, true) => {
                let kind = if x.ty.basic.is_numeric() && y.ty.basic.is_numeric() {
                    if x.ty.basic.untyped_rank() >= y.ty.basic.untyped_rank() {
                        x.ty.basic
                    } else {
                        y.ty.basic
                    }
                } else if x.ty.basic == y.ty.basic {
                    x.ty.basic
                } else {
                    return Err(mismatch(&x, &y));
                };
                let ty = ConstType::basic(kind);
                let lift = |o: Operand| -> Operand {
                    let value = if kind.is_float() {
                        o.value.and_then(|v| v.as_f64()).map(ConstValue::Float)
                    } else {
                        o.value
                    };
                    Operand {
                        ty: ty.clone(),
                        value,
                    }
                };
                Ok((lift(x), lift(y), ty))
            }
            (true, false) => {
                let ty = y.ty.clone();
                let x = self.convert_implicit(x, &ty, pos, file)?;
                Ok((x, y, ty))
            }
            (false, true) => {
                let ty = x.ty.clone();
                let y = self.convert_implicit(y, &ty, pos, file)?;
                Ok((x, y, ty))
            }
            (false, false) => {
                if x.ty.name != y.ty.name {
                    return Err(mismatch(&x, &y));
                }
                let ty = x.ty.clone();
                Ok((x, y, ty))
            }
        }
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn unary(&self, op: UnaryOp, x: Operand, pos: Pos, file: usize) -> CheckResult<Operand> {
        let Some(value) = &x.value else {
            return Ok(x);
        };
        let invalid = || {
            self.error(
                file,
                pos,
                format!("invalid operation: operator {} not defined on {}", op.symbol(), x.describe()),
            )
        };

        let result = match (op, value) {
            (UnaryOp::Plus, ConstValue::Int(_) | ConstValue::Float(_)) => value.clone(),
            (UnaryOp::Neg, ConstValue::Int(v)) => ConstValue::Int(
                v.checked_neg()
                    .ok_or_else(|| self.error(file, pos, format!("constant overflow: {}", EVAL_LIMIT)))?,
            ),
            (UnaryOp::Neg, ConstValue::Float(v)) => ConstValue::Float(-v),
            (UnaryOp::Not, ConstValue::Bool(v)) => ConstValue::Bool(!v),
            (UnaryOp::BitNot, ConstValue::Int(v)) if x.ty.basic.is_integer() => {
                match x.ty.basic.int_range() {
                    Some((0, max)) => ConstValue::Int(v ^ max),
                    _ => ConstValue::Int(!v),
                }
            }
            _ => return Err(invalid()),
        };
        self.fit(
            Operand {
                ty: x.ty,
                value: Some(result),
            },
            pos,
            file,
        )
    }

    fn binary(
        &self,
        op: BinaryOp,
        x: Operand,
        y: Operand,
        pos: Pos,
        file: usize,
    ) -> CheckResult<Operand> {
        if op.is_shift() {
            return self.shift(op, x, y, pos, file);
        }

        let (x, y, ty) = self.unify(x, y, pos, file)?;
        let result_ty = if op.is_comparison() {
            ConstType::basic(BasicKind::UntypedBool)
        } else {
            ty.clone()
        };
        let (Some(a), Some(b)) = (&x.value, &y.value) else {
            return Ok(Operand::unknown(result_ty));
        };
        if ty.foreign {
            return Ok(Operand::unknown(result_ty));
        }

        let undefined = || {
            self.error(
                file,
                pos,
                format!(
                    "invalid operation: operator {} not defined on {}",
                    op.symbol(),
                    x.describe()
                ),
            )
        };

        if op.is_comparison() {
            let ordering = match (a, b) {
                (ConstValue::Int(l), ConstValue::Int(r)) => l.partial_cmp(r),
                (ConstValue::String(l), ConstValue::String(r)) => l.partial_cmp(r),
                (ConstValue::Bool(l), ConstValue::Bool(r))
                    if matches!(op, BinaryOp::Eq | BinaryOp::Ne) =>
                {
                    l.partial_cmp(r)
                }
                (ConstValue::Bool(_), ConstValue::Bool(_)) => return Err(undefined()),
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(l), Some(r)) => l.partial_cmp(&r),
                    _ => return Err(undefined()),
                },
            };
            let ordering = ordering.ok_or_else(undefined)?;
            let holds = match op {
                BinaryOp::Eq => ordering.is_eq(),
                BinaryOp::Ne => ordering.is_ne(),
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            return Ok(Operand::untyped(BasicKind::UntypedBool, ConstValue::Bool(holds)));
        }

        let value = match (a, b) {
            (ConstValue::Bool(l), ConstValue::Bool(r)) => match op {
                BinaryOp::LogAnd => ConstValue::Bool(*l && *r),
                BinaryOp::LogOr => ConstValue::Bool(*l || *r),
                _ => return Err(undefined()),
            },
            (ConstValue::String(l), ConstValue::String(r)) if op == BinaryOp::Add => {
                ConstValue::String(format!("{}{}", l, r))
            }
            (ConstValue::Int(l), ConstValue::Int(r)) if ty.basic.is_integer() => {
                ConstValue::Int(self.int_arith(op, *l, *r, pos, file)?)
            }
            (ConstValue::Float(l), ConstValue::Float(r)) => {
                let v = match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div if *r == 0.0 => {
                        return Err(self.error(file, pos, "invalid operation: division by zero"))
                    }
                    BinaryOp::Div => l / r,
                    _ => return Err(undefined()),
                };
                ConstValue::Float(v)
            }
            _ => return Err(undefined()),
        };

        self.fit(
            Operand {
                ty,
                value: Some(value),
            },
            pos,
            file,
        )
    }

    fn int_arith(&self, op: BinaryOp, l: i128, r: i128, pos: Pos, file: usize) -> CheckResult<i128> {
        let overflow = || self.error(file, pos, format!("constant overflow: {}", EVAL_LIMIT));
        match op {
            BinaryOp::Add => l.checked_add(r).ok_or_else(overflow),
            BinaryOp::Sub => l.checked_sub(r).ok_or_else(overflow),
            BinaryOp::Mul => l.checked_mul(r).ok_or_else(overflow),
            BinaryOp::Div | BinaryOp::Rem if r == 0 => {
                Err(self.error(file, pos, "invalid operation: division by zero"))
            }
            BinaryOp::Div => l.checked_div(r).ok_or_else(overflow),
            BinaryOp::Rem => l.checked_rem(r).ok_or_else(overflow),
            BinaryOp::And => Ok(l & r),
            BinaryOp::Or => Ok(l | r),
            BinaryOp::Xor => Ok(l ^ r),
            BinaryOp::AndNot => Ok(l & !r),
            _ => Err(self.error(
                file,
                pos,
                format!("invalid operation: operator {} not defined on integers", op.symbol()),
            )),
        }
    }

    fn shift(
        &self,
        op: BinaryOp,
        x: Operand,
        y: Operand,
        pos: Pos,
        file: usize,
    ) -> CheckResult<Operand> {
        // An untyped float with an integral value is shifted as an untyped int.
        let ty = if x.ty.basic == BasicKind::UntypedFloat {
            ConstType::basic(BasicKind::UntypedInt)
        } else {
            x.ty.clone()
        };
        if !ty.foreign && !ty.basic.is_integer() {
            return Err(self.error(
                file,
                pos,
                format!("invalid operation: shifted operand {} must be integer", x.describe()),
            ));
        }

        let count = match &y.value {
            None => return Ok(Operand::unknown(ty)),
            Some(v) if y.ty.foreign || y.ty.basic.is_numeric() => v.to_exact_int(),
            Some(_) => None,
        };
        let count = match count {
            Some(c) if c < 0 => {
                return Err(self.error(file, pos, format!("invalid shift count {}", c)))
            }
            Some(c) if c > MAX_SHIFT => {
                return Err(self.error(file, pos, format!("shift count {} too large", c)))
            }
            Some(c) => c as u32,
            None => {
                return Err(self.error(
                    file,
                    pos,
                    format!("invalid shift count {}", y.describe()),
                ))
            }
        };

        let value = match &x.value {
            Some(v) if !ty.foreign => v.to_exact_int().ok_or_else(|| {
                self.error(file, pos, format!("{} truncated to integer", x.describe()))
            })?,
            _ => return Ok(Operand::unknown(ty)),
        };

        let result = match op {
            BinaryOp::Shl if value == 0 => 0,
            BinaryOp::Shl => {
                let shifted = if count < 127 { value << count } else { 0 };
                if count >= 127 || shifted >> count != value {
                    return Err(self.error(
                        file,
                        pos,
                        format!("constant shift overflow: {} << {} {}", value, count, EVAL_LIMIT),
                    ));
                }
                shifted
            }
            _ => value >> count.min(127),
        };

        self.fit(
            Operand {
                ty,
                value: Some(ConstValue::Int(result)),
            },
            pos,
            file,
        )
    }
}
