//! Recursive-descent parser for Go package-level declarations.
//!
//! `const` declarations are parsed completely. `var` initializers, function
//! signatures and bodies and composite type literals are consumed by
//! bracket balancing: their contents never influence constant values.

use super::ast::*;
use super::lexer::{tokenize, Token, TokenKind};
use std::fmt;

/// Syntax error with the position of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub pos: Pos,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.pos)
    }
}

impl std::error::Error for SyntaxError {}

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Parse one Go source file.
///
/// `file_index` becomes the `file` component of every [`NodeId`] in the
/// result and must be unique within the package.
pub fn parse_file(source: &str, file_index: u32) -> ParseResult<File> {
    let tokens = tokenize(source).map_err(|e| SyntaxError {
        message: e.message,
        pos: e.pos,
    })?;
    Parser::new(tokens, file_index).file()
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
    file_index: u32,
    next_ident: u32,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>, file_index: u32) -> Self {
        Self {
            tokens,
            cursor: 0,
            file_index,
            next_ident: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Token<'a> {
        self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.cursor + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn bump(&mut self) -> Token<'a> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<Token<'a>> {
        if self.peek_kind() == kind {
            Ok(self.bump())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "EOF".to_string(),
            TokenKind::Semicolon if token.text == "\n" => "newline".to_string(),
            _ => format!("{:?}", token.text),
        };
        SyntaxError {
            message: format!("expected {}, found {}", what, found),
            pos: token.pos,
        }
    }

    fn ident(&mut self) -> ParseResult<Ident> {
        let token = self.expect(TokenKind::Ident, "identifier")?;
        Ok(self.make_ident(token))
    }

    fn make_ident(&mut self, token: Token<'a>) -> Ident {
        let id = NodeId {
            file: self.file_index,
            index: self.next_ident,
        };
        self.next_ident += 1;
        Ident {
            id,
            name: token.text.to_string(),
            pos: token.pos,
        }
    }

    /// Consume a declaration terminator. `)` and EOF terminate implicitly.
    fn end_of_spec(&mut self, closer: TokenKind) -> ParseResult<()> {
        if self.eat(TokenKind::Semicolon) {
            return Ok(());
        }
        match self.peek_kind() {
            k if k == closer => Ok(()),
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("';' or newline")),
        }
    }

    /// Skip a bracketed region starting at the current opener.
    fn skip_balanced(&mut self) -> ParseResult<()> {
        let open = self.bump();
        let mut stack = vec![closer_of(open.kind)];
        while let Some(&want) = stack.last() {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => {
                    return Err(SyntaxError {
                        message: format!("unclosed {:?}", open.text),
                        pos: open.pos,
                    })
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    stack.push(closer_of(token.kind));
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if token.kind != want {
                        return Err(SyntaxError {
                            message: format!("mismatched {:?}", token.text),
                            pos: token.pos,
                        });
                    }
                    stack.pop();
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // File and declarations
    // ------------------------------------------------------------------

    fn file(mut self) -> ParseResult<File> {
        self.expect(TokenKind::Package, "'package'")?;
        let package = self.ident()?;
        self.end_of_spec(TokenKind::Eof)?;

        let mut decls = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Import => decls.push(Decl::Group(self.group(DeclKind::Import)?)),
                TokenKind::Const => decls.push(Decl::Group(self.group(DeclKind::Const)?)),
                TokenKind::Var => decls.push(Decl::Group(self.group(DeclKind::Var)?)),
                TokenKind::Type => decls.push(Decl::Group(self.group(DeclKind::Type)?)),
                TokenKind::Func => decls.push(Decl::Func(self.func_decl()?)),
                _ => return Err(self.unexpected("declaration")),
            }
        }

        Ok(File { package, decls })
    }

    fn group(&mut self, kind: DeclKind) -> ParseResult<DeclGroup> {
        let keyword = self.bump();
        let mut specs = Vec::new();

        let grouped = self.eat(TokenKind::LParen);
        if grouped {
            while self.peek_kind() != TokenKind::RParen {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                specs.push(self.spec(kind)?);
                self.end_of_spec(TokenKind::RParen)?;
            }
            self.expect(TokenKind::RParen, "')'")?;
        } else {
            specs.push(self.spec(kind)?);
        }
        self.end_of_spec(TokenKind::Eof)?;

        Ok(DeclGroup {
            kind,
            specs,
            grouped,
            pos: keyword.pos,
        })
    }

    fn spec(&mut self, kind: DeclKind) -> ParseResult<Spec> {
        match kind {
            DeclKind::Import => self.import_spec().map(Spec::Import),
            DeclKind::Type => self.type_spec().map(Spec::Type),
            DeclKind::Const | DeclKind::Var => self.value_spec(kind).map(Spec::Value),
            DeclKind::Func => unreachable!("func declarations are not grouped"),
        }
    }

    fn import_spec(&mut self) -> ParseResult<ImportSpec> {
        let pos = self.peek().pos;
        let name = match self.peek_kind() {
            TokenKind::Ident => Some(self.ident()?),
            TokenKind::Dot => {
                let token = self.bump();
                Some(self.make_ident(token))
            }
            _ => None,
        };
        let path = match self.peek_kind() {
            TokenKind::String | TokenKind::RawString => self.bump().text.to_string(),
            _ => return Err(self.unexpected("import path")),
        };
        Ok(ImportSpec { name, path, pos })
    }

    fn type_spec(&mut self) -> ParseResult<TypeSpec> {
        let name = self.ident()?;

        // `type A [N]T` is an array; `type A[T any] ...` has type parameters.
        let generic = self.peek_kind() == TokenKind::LBracket
            && self.peek_nth_kind(1) == TokenKind::Ident
            && !matches!(
                self.peek_nth_kind(2),
                TokenKind::RBracket | TokenKind::Dot
            );
        if generic {
            self.skip_balanced()?;
        }

        let alias = self.eat(TokenKind::Assign);
        let ty = self.type_expr()?;
        Ok(TypeSpec {
            name,
            alias,
            generic,
            ty,
        })
    }

    fn value_spec(&mut self, kind: DeclKind) -> ParseResult<ValueSpec> {
        let pos = self.peek().pos;
        let mut names = vec![self.ident()?];
        while self.eat(TokenKind::Comma) {
            names.push(self.ident()?);
        }

        let ty = match self.peek_kind() {
            TokenKind::Assign | TokenKind::Semicolon | TokenKind::RParen | TokenKind::Eof => None,
            _ => Some(self.type_expr()?),
        };

        let values = if self.eat(TokenKind::Assign) {
            match kind {
                DeclKind::Const => self.expr_list()?,
                _ => self.opaque_list()?,
            }
        } else {
            Vec::new()
        };

        Ok(ValueSpec {
            names,
            ty,
            values,
            pos,
        })
    }

    fn func_decl(&mut self) -> ParseResult<FuncDecl> {
        let keyword = self.bump();
        let is_method = self.peek_kind() == TokenKind::LParen;
        if is_method {
            self.skip_balanced()?;
        }
        let name = self.ident()?;

        // Signature up to the body, then the body itself.
        let mut prev = TokenKind::Func;
        loop {
            match self.peek_kind() {
                TokenKind::LBrace if matches!(prev, TokenKind::Struct | TokenKind::Interface) => {
                    self.skip_balanced()?;
                    prev = TokenKind::RBrace;
                }
                TokenKind::LBrace => {
                    self.skip_balanced()?;
                    break;
                }
                TokenKind::LParen | TokenKind::LBracket => {
                    prev = self.peek_kind();
                    self.skip_balanced()?;
                }
                TokenKind::Semicolon | TokenKind::Eof => break,
                _ => prev = self.bump().kind,
            }
        }
        self.end_of_spec(TokenKind::Eof)?;

        Ok(FuncDecl {
            name,
            is_method,
            pos: keyword.pos,
        })
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        let pos = self.peek().pos;
        match self.peek_kind() {
            TokenKind::Ident => {
                let first = self.ident()?;
                let ty = if self.eat(TokenKind::Dot) {
                    let name = self.ident()?;
                    TypeExpr::Qualified {
                        package: first,
                        name,
                    }
                } else {
                    TypeExpr::Ident(first)
                };
                if self.peek_kind() == TokenKind::LBracket {
                    // Instantiated generic type.
                    self.skip_balanced()?;
                    return Ok(TypeExpr::Other { pos });
                }
                Ok(ty)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.type_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(TypeExpr::Paren {
                    inner: Box::new(inner),
                    pos,
                })
            }
            _ => {
                self.skip_type()?;
                Ok(TypeExpr::Other { pos })
            }
        }
    }

    /// Consume a type literal whose structure does not matter here.
    fn skip_type(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            TokenKind::Ident | TokenKind::LParen => self.type_expr().map(|_| ()),
            TokenKind::Star | TokenKind::Tilde => {
                self.bump();
                self.skip_type()
            }
            TokenKind::LBracket => {
                self.skip_balanced()?;
                self.skip_type()
            }
            TokenKind::Map => {
                self.bump();
                if self.peek_kind() != TokenKind::LBracket {
                    return Err(self.unexpected("'['"));
                }
                self.skip_balanced()?;
                self.skip_type()
            }
            TokenKind::Chan => {
                self.bump();
                self.eat(TokenKind::Arrow);
                self.skip_type()
            }
            TokenKind::Arrow => {
                self.bump();
                self.expect(TokenKind::Chan, "'chan'")?;
                self.skip_type()
            }
            TokenKind::Struct | TokenKind::Interface => {
                self.bump();
                if self.peek_kind() != TokenKind::LBrace {
                    return Err(self.unexpected("'{'"));
                }
                self.skip_balanced()
            }
            TokenKind::Func => {
                self.bump();
                if self.peek_kind() != TokenKind::LParen {
                    return Err(self.unexpected("'('"));
                }
                self.skip_balanced()?;
                match self.peek_kind() {
                    TokenKind::LParen => self.skip_balanced(),
                    TokenKind::Ident
                    | TokenKind::Star
                    | TokenKind::LBracket
                    | TokenKind::Map
                    | TokenKind::Chan
                    | TokenKind::Func
                    | TokenKind::Struct
                    | TokenKind::Interface
                    | TokenKind::Arrow => self.skip_type(),
                    _ => Ok(()),
                }
            }
            _ => Err(self.unexpected("type")),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.expr()?];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    /// Skip `var` initializers, producing one placeholder per top-level comma.
    fn opaque_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![Expr::Opaque {
            pos: self.peek().pos,
        }];
        loop {
            match self.peek_kind() {
                TokenKind::Semicolon | TokenKind::RParen | TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    self.skip_balanced()?
                }
                TokenKind::RBracket | TokenKind::RBrace => {
                    return Err(self.unexpected("expression"));
                }
                TokenKind::Comma => {
                    self.bump();
                    exprs.push(Expr::Opaque {
                        pos: self.peek().pos,
                    });
                }
                _ => {
                    self.bump();
                }
            }
        }
        Ok(exprs)
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut lhs = self.unary_expr()?;
        while let Some(op) = binary_op(self.peek_kind()) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            let pos = self.bump().pos;
            let rhs = self.binary_expr(prec + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            };
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> ParseResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Caret => UnaryOp::BitNot,
            _ => return self.primary_expr(),
        };
        let pos = self.bump().pos;
        let operand = self.unary_expr()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            pos,
        })
    }

    fn primary_expr(&mut self) -> ParseResult<Expr> {
        let token = self.peek();
        let mut expr = match token.kind {
            TokenKind::Ident => {
                let base = self.ident()?;
                if self.eat(TokenKind::Dot) {
                    let name = self.ident()?;
                    Expr::Selector { base, name }
                } else {
                    Expr::Ident(base)
                }
            }
            TokenKind::Int | TokenKind::Float | TokenKind::Imag | TokenKind::Rune
            | TokenKind::String | TokenKind::RawString => {
                self.bump();
                let kind = match token.kind {
                    TokenKind::Int => LitKind::Int,
                    TokenKind::Float => LitKind::Float,
                    TokenKind::Imag => LitKind::Imag,
                    TokenKind::Rune => LitKind::Rune,
                    _ => LitKind::String,
                };
                Expr::Lit(Lit {
                    kind,
                    text: token.text.to_string(),
                    pos: token.pos,
                })
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Expr::Paren(Box::new(inner))
            }
            _ => return Err(self.unexpected("expression")),
        };

        while self.peek_kind() == TokenKind::LParen {
            let pos = self.bump().pos;
            let mut args = Vec::new();
            while self.peek_kind() != TokenKind::RParen {
                args.push(self.expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
            expr = Expr::Call {
                func: Box::new(expr),
                args,
                pos,
            };
        }

        Ok(expr)
    }
}

fn closer_of(kind: TokenKind) -> TokenKind {
    match kind {
        TokenKind::LParen => TokenKind::RParen,
        TokenKind::LBracket => TokenKind::RBracket,
        _ => TokenKind::RBrace,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Amp => BinaryOp::And,
        TokenKind::Pipe => BinaryOp::Or,
        TokenKind::Caret => BinaryOp::Xor,
        TokenKind::AndNot => BinaryOp::AndNot,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        TokenKind::LogAnd => BinaryOp::LogAnd,
        TokenKind::LogOr => BinaryOp::LogOr,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        _ => return None,
    })
}
