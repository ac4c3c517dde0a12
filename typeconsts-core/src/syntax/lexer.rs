//! Logos-based lexer for Go source.
//!
//! Produces a flat token vector with comments and whitespace removed and
//! semicolons inserted at line ends the way the Go grammar requires.

use super::ast::Pos;
use logos::Logos;
use std::fmt;

/// A token with its kind, text, and position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub pos: Pos,
}

/// Error produced for input no Go token can start with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub pos: Pos,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.pos)
    }
}

impl std::error::Error for LexError {}

/// Logos token enum
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\f]+")]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("type")]
    Type,
    #[token("func")]
    Func,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+|[0-9][0-9_]*")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?|\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?|[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    #[regex(r"0[xX][0-9a-fA-F_]*\.?[0-9a-fA-F_]*[pP][+-]?[0-9_]+")]
    Float,

    #[regex(r"[0-9][0-9_]*i|0[xX][0-9a-fA-F_]+i|0[bB][01_]+i|0[oO][0-7_]+i")]
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?i|\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?i|[0-9][0-9_]*[eE][+-]?[0-9_]+i")]
    #[regex(r"0[xX][0-9a-fA-F_]*\.?[0-9a-fA-F_]*[pP][+-]?[0-9_]+i")]
    Imag,

    #[regex(r"'([^'\\\n]|\\[^\n][^'\n]*)'")]
    Rune,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,

    #[regex(r"`[^`]*`")]
    RawString,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token("&^=")]
    AndNotAssign,
    #[token("...")]
    Ellipsis,
    #[token("&^")]
    AndNot,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&&")]
    LogAnd,
    #[token("||")]
    LogOr,
    #[token("<-")]
    Arrow,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token(":=")]
    Define,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("%=")]
    RemAssign,
    #[token("&=")]
    AndAssign,
    #[token("|=")]
    OrAssign,
    #[token("^=")]
    XorAssign,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,

    /// End of input, appended by [`tokenize`].
    Eof,
}

/// Skip to the end of a `/* */` comment. Unterminated comments are errors.
fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl TokenKind {
    /// Tokens after which a newline ends the statement.
    fn ends_statement(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Int
                | Self::Float
                | Self::Imag
                | Self::Rune
                | Self::String
                | Self::RawString
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBracket
                | Self::RBrace
        )
    }
}

/// Maps byte offsets to line/column positions.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn pos(&self, offset: usize) -> Pos {
        let line = self.starts.partition_point(|&start| start <= offset);
        Pos {
            line,
            column: offset - self.starts[line - 1] + 1,
        }
    }
}

/// Tokenize a whole file.
///
/// The returned vector always ends with a single [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let index = LineIndex::new(source);
    let mut tokens: Vec<Token<'_>> = Vec::with_capacity(source.len() / 4);
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        let pos = index.pos(span.start);
        let kind = result.map_err(|()| LexError {
            message: if text.starts_with("/*") {
                "comment not terminated".to_string()
            } else {
                format!("unexpected input {:?}", text)
            },
            pos,
        })?;

        let line_break = match kind {
            TokenKind::Newline => true,
            TokenKind::BlockComment => text.contains('\n'),
            TokenKind::LineComment => false,
            _ => {
                tokens.push(Token { kind, text, pos });
                continue;
            }
        };
        if line_break {
            insert_semicolon(&mut tokens, pos);
        }
    }

    let end = index.pos(source.len());
    insert_semicolon(&mut tokens, end);
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: "",
        pos: end,
    });
    Ok(tokens)
}

fn insert_semicolon(tokens: &mut Vec<Token<'_>>, pos: Pos) {
    if tokens.last().is_some_and(|t| t.kind.ends_statement()) {
        tokens.push(Token {
            kind: TokenKind::Semicolon,
            text: "\n",
            pos,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("const Red Color"),
            vec![
                TokenKind::Const,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_ident() {
        let tokens = tokenize("constant typeName").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "constant");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_number_literals() {
        let tokens = tokenize("0x1F 0b1010 0o17 1_000 1.5 .5 1e9").unwrap();
        let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.text)).collect();
        assert_eq!(got[0], (TokenKind::Int, "0x1F"));
        assert_eq!(got[1], (TokenKind::Int, "0b1010"));
        assert_eq!(got[2], (TokenKind::Int, "0o17"));
        assert_eq!(got[3], (TokenKind::Int, "1_000"));
        assert_eq!(got[4], (TokenKind::Float, "1.5"));
        assert_eq!(got[5], (TokenKind::Float, ".5"));
        assert_eq!(got[6], (TokenKind::Float, "1e9"));
    }

    #[test]
    fn test_semicolon_insertion() {
        let source = "const (\n\tA Color = iota\n\tB\n)\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Const,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        let source = "A // trailing\n/* block\ncomment */ B /* inline */ C";
        let tokens = tokenize(source).unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["A", "\n", "B", "C", "\n", ""]);
    }

    #[test]
    fn test_block_comments() {
        let source = "A /* a * b */ B /** doc **/ C /*\n * Copyright\n */ D";
        let tokens = tokenize(source).unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["A", "B", "C", "\n", "D", "\n", ""]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("const X = 1 /* open").unwrap_err();
        assert_eq!(err.message, "comment not terminated");
        assert_eq!(err.pos.column, 13);
    }

    #[test]
    fn test_hex_float_literals() {
        let tokens = tokenize("0x1p-2 0X1.8P+1 0x_1p1023").unwrap();
        let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.text)).collect();
        assert_eq!(got[0], (TokenKind::Float, "0x1p-2"));
        assert_eq!(got[1], (TokenKind::Float, "0X1.8P+1"));
        assert_eq!(got[2], (TokenKind::Float, "0x_1p1023"));
    }

    #[test]
    fn test_imaginary_literals() {
        let tokens = tokenize("2i 1.5i 1e3i 0x10i iota").unwrap();
        let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.text)).collect();
        assert_eq!(got[0], (TokenKind::Imag, "2i"));
        assert_eq!(got[1], (TokenKind::Imag, "1.5i"));
        assert_eq!(got[2], (TokenKind::Imag, "1e3i"));
        assert_eq!(got[3], (TokenKind::Imag, "0x10i"));
        assert_eq!(got[4], (TokenKind::Ident, "iota"));
    }

    #[test]
    fn test_strings_and_runes() {
        let tokens = tokenize(r#"'a' '\'' "x\"y" `raw`"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Rune);
        assert_eq!(tokens[1].kind, TokenKind::Rune);
        assert_eq!(tokens[1].text, r"'\''");
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[3].kind, TokenKind::RawString);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("package p\n\nconst X = 1").unwrap();
        let x = tokens.iter().find(|t| t.text == "X").unwrap();
        assert_eq!(x.pos, Pos { line: 3, column: 7 });
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("const X = 1 $").unwrap_err();
        assert!(err.message.contains("$"));
        assert_eq!(err.pos.column, 13);
    }
}
