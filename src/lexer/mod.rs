//! # Lexer Module
//!
//! Lexical analysis for Wick. The lexer walks the source text with a
//! character cursor, tracking 1-based line and column positions, and
//! produces a flat token stream for the parser. It never fails: unknown
//! characters become [`TokenKind::Error`] tokens and every problem is
//! handed to the [`ErrorReporter`] sink, so lexing always runs to the end
//! of the input and diagnostics accumulate.

mod token;
mod tokens;

pub use token::*;
pub use tokens::*;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::reporter::ErrorReporter;

macro_rules! keyword {
    ($map:ident, $name:ident, $value:expr) => {
        $map.insert($value, TokenKind::$name);
    };
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();

    keyword!(m, Variable, "variable");
    keyword!(m, Constant, "constant");
    keyword!(m, If, "if");
    keyword!(m, Else, "else");
    keyword!(m, For, "for");
    keyword!(m, While, "while");
    keyword!(m, Or, "or");
    keyword!(m, And, "and");
    keyword!(m, Boolean, "true");
    keyword!(m, Boolean, "false");
    keyword!(m, Begin, "begin");
    keyword!(m, End, "end");
    keyword!(m, Modulus, "mod");
    keyword!(m, Subroutine, "subroutine");
    keyword!(m, Lambda, "lambda");
    keyword!(m, Return, "return");
    keyword!(m, Prototype, "prototype");
    keyword!(m, From, "from");
    keyword!(m, Public, "public");
    keyword!(m, Private, "private");

    m
});

pub struct Lexer<'a> {
    tokens: Vec<Token>,
    chars: Vec<char>,
    position: usize,
    line: usize,
    col: usize,
    reporter: &'a mut ErrorReporter,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str, reporter: &'a mut ErrorReporter) -> Self {
        Self {
            tokens: vec![],
            chars: input.chars().collect(),
            position: 0,
            line: 1,
            col: 1,
            reporter,
        }
    }

    pub fn lex(mut self) -> Vec<Token> {
        while let Some(next) = self.peek() {
            match next {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance();
                }
                '"' => self.lex_string(),
                '/' => self.lex_slash(),
                c if c.is_alphabetic() => self.lex_identifier(),
                c if c.is_ascii_digit() => self.lex_number(),
                _ => self.lex_operator(),
            }
        }

        self.tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.chars.get(self.position).copied()?;
        self.position += 1;
        if next == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(next)
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    fn push(&mut self, lexeme: impl ToString, kind: TokenKind, line: usize, col: usize) {
        self.tokens.push(Token::new(lexeme, kind, line, col));
    }

    fn lex_identifier(&mut self) {
        let (line, col) = (self.line, self.col);
        let mut lexeme = String::new();

        while let Some(next) = self.peek() {
            if next.is_alphanumeric() || next == '_' {
                lexeme.push(next);
                self.advance();
            } else {
                break;
            }
        }

        let kind = KEYWORDS
            .get(lexeme.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.push(lexeme, kind, line, col);
    }

    fn lex_number(&mut self) {
        let (line, col) = (self.line, self.col);
        let mut lexeme = String::new();

        while let Some(next) = self.peek() {
            if next.is_ascii_digit() {
                lexeme.push(next);
                self.advance();
            } else {
                break;
            }
        }

        // A dot only belongs to the number when a digit follows, so `2.foo`
        // stays a number, a dot, and an identifier.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            lexeme.push('.');
            self.advance();
            while let Some(next) = self.peek() {
                if next.is_ascii_digit() {
                    lexeme.push(next);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.push(lexeme, TokenKind::Number, line, col);
    }

    fn lex_string(&mut self) {
        let (line, col) = (self.line, self.col);
        self.advance();

        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some(next) => value.push(next),
                None => {
                    self.reporter.report_at(line, col, "Unterminated string.");
                    break;
                }
            }
        }

        self.push(value, TokenKind::String, line, col);
    }

    fn lex_slash(&mut self) {
        let (line, col) = (self.line, self.col);
        self.advance();

        if self.advance_if('/') {
            while let Some(next) = self.peek() {
                if next == '\n' {
                    break;
                }
                self.advance();
            }
        } else if self.advance_if(':') {
            // Multi-line comment, not nested.
            loop {
                match self.peek() {
                    Some(':') if self.peek_next() == Some('/') => {
                        self.advance();
                        self.advance();
                        break;
                    }
                    Some(_) => {
                        self.advance();
                    }
                    None => {
                        self.reporter.report_at(line, col, "Unterminated comment.");
                        break;
                    }
                }
            }
        } else {
            self.push("/", TokenKind::ForwardSlash, line, col);
        }
    }

    fn lex_operator(&mut self) {
        let (line, col) = (self.line, self.col);
        let Some(next) = self.advance() else {
            return;
        };

        let (lexeme, kind) = match next {
            '{' => ("{", TokenKind::LeftCurly),
            '}' => ("}", TokenKind::RightCurly),
            ';' => (";", TokenKind::Semicolon),
            '(' => ("(", TokenKind::LeftParen),
            ')' => (")", TokenKind::RightParen),
            '*' => ("*", TokenKind::Asterisk),
            '+' => ("+", TokenKind::Plus),
            '-' => ("-", TokenKind::Dash),
            ',' => (",", TokenKind::Comma),
            '.' => (".", TokenKind::Dot),
            ':' => (":", TokenKind::Colon),
            '!' => {
                if self.advance_if('=') {
                    ("!=", TokenKind::NotEqualTo)
                } else {
                    ("!", TokenKind::Exclamation)
                }
            }
            '=' => {
                if self.advance_if('=') {
                    ("==", TokenKind::EqualTo)
                } else {
                    ("=", TokenKind::Equal)
                }
            }
            '<' => {
                if self.advance_if('=') {
                    ("<=", TokenKind::LessThanOrEqualTo)
                } else {
                    ("<", TokenKind::LessThan)
                }
            }
            '>' => {
                if self.advance_if('=') {
                    (">=", TokenKind::GreaterThanOrEqualTo)
                } else {
                    (">", TokenKind::GreaterThan)
                }
            }
            _ => {
                self.reporter
                    .report_at(line, col, &format!("Unrecognized character '{next}'."));
                self.push(next, TokenKind::Error, line, col);
                return;
            }
        };

        self.push(lexeme, kind, line, col);
    }
}
