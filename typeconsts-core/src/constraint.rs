//! Build constraints: which files of a directory belong to a build.
//!
//! A file is left out when
//! - its name ends in `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` (before an
//!   optional `_test`) naming another target, or
//! - a `//go:build` line (or legacy `// +build` lines) in the header before
//!   the `package` clause evaluates to false.
//!
//! Tags that hold: the target OS and architecture, `unix` on Unix systems,
//! `gc` and every `go1.N` release tag. Everything else is false, including
//! `ignore` and `cgo`.

use std::fmt;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Target platform files are selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
}

impl Default for BuildContext {
    /// The host platform, spelled the way Go spells it.
    fn default() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            "wasm32" => "wasm",
            other => other,
        };
        Self::new(goos, goarch)
    }
}

/// A `//go:build` expression that does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid build constraint on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConstraintError {}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// Whether a single build tag is satisfied.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch {
            return true;
        }
        match (self.goos.as_str(), tag) {
            ("android", "linux") | ("illumos", "solaris") | ("ios", "darwin") => true,
            (goos, "unix") => UNIX_OS.contains(&goos),
            (_, "gc") => true,
            (_, tag) => tag
                .strip_prefix("go1.")
                .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit())),
        }
    }

    /// File-name rule: `name_GOOS.go`, `name_GOARCH.go`, `name_GOOS_GOARCH.go`,
    /// each optionally followed by `_test`. The part before the first `_`
    /// never counts, so `linux.go` is always included.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.split('.').next().unwrap_or(file_name);
        let Some(first) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[first..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }

        match parts.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                self.matches_tag(os) && self.matches_tag(arch)
            }
            [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => {
                self.matches_tag(last)
            }
            _ => true,
        }
    }

    /// Evaluate the build constraints in the header of `source`.
    ///
    /// A `//go:build` line wins over `// +build` lines; files with neither
    /// are always included.
    pub fn matches_source(&self, source: &str) -> Result<bool, ConstraintError> {
        let header = constraint_lines(source);
        if let Some((line, expr)) = header.go_build {
            return Expr::parse(expr)
                .map(|e| e.eval(self))
                .map_err(|message| ConstraintError { line, message });
        }
        Ok(header
            .plus_build
            .iter()
            .all(|line| self.matches_plus_build(line)))
    }

    /// Legacy syntax: space-separated options are ORed, comma-separated
    /// terms ANDed, `!` negates.
    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.is_empty() && !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }
}

#[derive(Default)]
struct Header<'a> {
    go_build: Option<(usize, &'a str)>,
    plus_build: Vec<&'a str>,
}

/// Constraint lines among the comments that precede the `package` clause.
fn constraint_lines(source: &str) -> Header<'_> {
    let mut header = Header::default();
    let mut in_block = false;

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if in_block {
            match line.find("*/") {
                Some(end) if line[end + 2..].trim().is_empty() => in_block = false,
                Some(_) => break,
                None => {}
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix("//") {
            if let Some(expr) = comment.strip_prefix("go:build") {
                if header.go_build.is_none() && starts_with_space(expr) {
                    header.go_build = Some((index + 1, expr.trim()));
                }
            } else if let Some(rest) = comment.trim_start().strip_prefix("+build") {
                if starts_with_space(rest) {
                    header.plus_build.push(rest.trim());
                }
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) if rest[end + 2..].trim().is_empty() => {}
                Some(_) => break,
                None => in_block = true,
            }
            continue;
        }
        break;
    }
    header
}

fn starts_with_space(s: &str) -> bool {
    s.is_empty() || s.starts_with(char::is_whitespace)
}

/// Parsed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(text: &str) -> Result<Self, String> {
        let mut parser = ExprParser { text, offset: 0 };
        let expr = parser.or()?;
        parser.skip_space();
        if parser.offset < text.len() {
            return Err(format!("unexpected {:?}", &text[parser.offset..]));
        }
        Ok(expr)
    }

    fn eval(&self, ctx: &BuildContext) -> bool {
        match self {
            Self::Tag(tag) => ctx.matches_tag(tag),
            Self::Not(inner) => !inner.eval(ctx),
            Self::And(l, r) => l.eval(ctx) && r.eval(ctx),
            Self::Or(l, r) => l.eval(ctx) || r.eval(ctx),
        }
    }
}

/// Precedence: `||` < `&&` < `!`.
struct ExprParser<'a> {
    text: &'a str,
    offset: usize,
}

impl ExprParser<'_> {
    fn rest(&self) -> &str {
        &self.text[self.offset..]
    }

    fn skip_space(&mut self) {
        let rest = self.rest();
        self.offset += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, op: &str) -> bool {
        self.skip_space();
        if self.rest().starts_with(op) {
            self.offset += op.len();
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and()?;
        while self.eat("||") {
            lhs = Expr::Or(Box::new(lhs), Box::new(self.and()?));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.not()?;
        while self.eat("&&") {
            lhs = Expr::And(Box::new(lhs), Box::new(self.not()?));
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, String> {
        if self.eat("!") {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        if self.eat("(") {
            let inner = self.or()?;
            if !self.eat(")") {
                return Err("missing )".to_string());
            }
            return Ok(inner);
        }
        self.tag()
    }

    fn tag(&mut self) -> Result<Expr, String> {
        self.skip_space();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(match rest.chars().next() {
                Some(c) => format!("unexpected {:?}", c),
                None => "unexpected end of expression".to_string(),
            });
        }
        let tag = rest[..len].to_string();
        self.offset += len;
        Ok(Expr::Tag(tag))
    }
}
