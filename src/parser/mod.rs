//! # Parser Module
//!
//! A recursive-descent parser with one-token lookahead. Each grammar rule is
//! a method returning `Result`; a diagnostic is reported through the
//! [`ErrorReporter`] at the point of failure and the error then unwinds to
//! [`Parser::declaration`], which synchronizes to the next statement
//! boundary and records a `None` placeholder so that later declarations can
//! still be checked. Interpretation is skipped whenever the reporter saw
//! anything, so placeholders never reach the evaluator.

pub mod ast;

use std::{error::Error, fmt::Display};

use crate::lexer::{Token, TokenKind, Tokens};
use crate::reporter::ErrorReporter;

use self::ast::{Expression, Lambda, Literal, PrototypeExpression, Statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: Option<(usize, usize)>,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((line, col)) = self.position {
            f.write_fmt(format_args!("{} (at {line}:{col})", self.message))
        } else {
            f.write_str(&self.message)
        }
    }
}

impl Error for ParseError {}

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: Tokens<Token>,
    reporter: &'a mut ErrorReporter,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, reporter: &'a mut ErrorReporter) -> Self {
        Self {
            tokens: tokens.into(),
            reporter,
        }
    }

    /// Parse the whole token stream. A top-level declaration that failed to
    /// parse is recorded as `None` after synchronizing past it.
    pub fn parse(&mut self) -> Vec<Option<Statement>> {
        let mut statements = vec![];
        while !self.at_end() {
            statements.push(self.declaration(true));
        }
        statements
    }

    fn declaration(&mut self, allow_statements: bool) -> Option<Statement> {
        let result = if self.matches(&[TokenKind::Subroutine]) {
            self.subroutine_declaration()
        } else if self.matches(&[TokenKind::Prototype]) {
            self.prototype_declaration()
        } else if self.matches(&[TokenKind::Variable]) {
            self.variable_declaration(false)
        } else if self.matches(&[TokenKind::Constant]) {
            self.variable_declaration(true)
        } else if allow_statements {
            self.statement()
        } else {
            let current = self.current();
            Err(self.error(&current, "Statement not allowed here."))
        };

        match result {
            Ok(statement) => Some(statement),
            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn subroutine_declaration(&mut self) -> ParseResult<Statement> {
        let mut name = self.expect(TokenKind::Identifier, "Expected a subroutine name.")?;
        name.constant = false;
        let definition = self.lambda()?;
        Ok(Statement::Variable {
            name,
            initializer: Some(definition),
        })
    }

    fn prototype_declaration(&mut self) -> ParseResult<Statement> {
        let name = self.expect(TokenKind::Identifier, "Expected a prototype name.")?;
        let definition = self.anonymous_prototype()?;
        Ok(Statement::Variable {
            name,
            initializer: Some(definition),
        })
    }

    fn variable_declaration(&mut self, constant: bool) -> ParseResult<Statement> {
        let mut name = self.expect(TokenKind::Identifier, "Expected a variable name.")?;
        name.constant = constant;
        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(
            TokenKind::Semicolon,
            "Expected a ';' after variable declaration.",
        )?;
        Ok(Statement::Variable { name, initializer })
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        if self.matches(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.matches(&[TokenKind::LeftCurly]) {
            return self.scope();
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement();
        }
        self.expression_statement(true)
    }

    fn for_statement(&mut self) -> ParseResult<Statement> {
        let initializer = if self.matches(&[TokenKind::Variable]) {
            self.variable_declaration(false)?
        } else if self.matches(&[TokenKind::Constant]) {
            self.variable_declaration(true)?
        } else {
            let current = self.current();
            return Err(self.error(&current, "Expected a variable declaration after 'for'."));
        };
        let condition = self.expression()?;
        self.expect(TokenKind::Semicolon, "Expected a ';' after loop condition.")?;
        let update = self.expression_statement(false)?;
        self.expect(TokenKind::LeftCurly, "Expected a '{' after for statement.")?;
        let body = self.scope()?;
        Ok(Statement::For {
            initializer: Some(Box::new(initializer)),
            condition,
            body: Some(Box::new(body)),
            update: Some(Box::new(update)),
        })
    }

    fn while_statement(&mut self) -> ParseResult<Statement> {
        let condition = self.expression()?;
        self.expect(TokenKind::LeftCurly, "Expected a '{' after while statement.")?;
        let body = self.scope()?;
        Ok(Statement::For {
            initializer: None,
            condition,
            body: Some(Box::new(body)),
            update: None,
        })
    }

    fn if_statement(&mut self) -> ParseResult<Statement> {
        let condition = self.expression()?;
        self.expect(TokenKind::LeftCurly, "Expected a '{' after if statement.")?;
        let then_branch = Box::new(self.scope()?);
        let mut else_branch = None;
        if self.matches(&[TokenKind::Else]) {
            if self.matches(&[TokenKind::If]) {
                else_branch = Some(Box::new(self.if_statement()?));
            } else {
                self.expect(TokenKind::LeftCurly, "Expected a '{' after else statement.")?;
                else_branch = Some(Box::new(self.scope()?));
            }
        }
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// Parses the statements of a scope; the opening `{` has already been
    /// consumed by the caller.
    fn scope(&mut self) -> ParseResult<Statement> {
        let mut statements = vec![];
        while !self.check(TokenKind::RightCurly) && !self.at_end() {
            if let Some(statement) = self.declaration(true) {
                statements.push(statement);
            }
        }
        self.expect(TokenKind::RightCurly, "Expected a '}' after scope.")?;
        Ok(Statement::Scope { statements })
    }

    fn return_statement(&mut self) -> ParseResult<Statement> {
        let keyword = self.previous();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::Semicolon, "Expected a ';' after statement.")?;
        Ok(Statement::Return { keyword, value })
    }

    fn expression_statement(&mut self, expect_semicolon: bool) -> ParseResult<Statement> {
        let expr = self.expression()?;
        if expect_semicolon {
            self.expect(TokenKind::Semicolon, "Expected a ';' after statement.")?;
        }
        Ok(Statement::Expression { expr })
    }

    /// `expression := simpleExpression ("if" expression "else" expression)?`
    ///
    /// The ternary re-enters `expression` for its else branch, which makes
    /// it right-associative.
    fn expression(&mut self) -> ParseResult<Expression> {
        let then_expr = self.simple_expression()?;
        if self.matches(&[TokenKind::If]) {
            let condition = self.expression()?;
            self.expect(TokenKind::Else, "Expected an \"else\" after ternary condition.")?;
            let else_expr = self.expression()?;
            return Ok(Expression::Ternary {
                then_expr: Box::new(then_expr),
                condition: Box::new(condition),
                else_expr: Box::new(else_expr),
            });
        }
        Ok(then_expr)
    }

    fn simple_expression(&mut self) -> ParseResult<Expression> {
        if self.matches(&[TokenKind::Lambda]) {
            return self.lambda();
        }
        if self.matches(&[TokenKind::Prototype]) {
            return self.anonymous_prototype();
        }
        self.assignment()
    }

    /// Parses a parameter list and body; any leading `lambda` keyword has
    /// already been consumed (`subroutine` declarations go without one).
    fn lambda(&mut self) -> ParseResult<Expression> {
        self.expect(TokenKind::LeftParen, "Expected a '(' before parameters.")?;
        let mut params = vec![];
        let mut default_params: Vec<(Token, Expression)> = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                let identifier =
                    self.expect(TokenKind::Identifier, "Expected an identifier for parameter.")?;
                if self.matches(&[TokenKind::Equal]) {
                    default_params.push((identifier, self.expression()?));
                } else if default_params.is_empty() {
                    params.push(identifier);
                } else {
                    // Report and drop the parameter, but keep parsing the list.
                    self.error(&identifier, "Non-default parameters must come first.");
                }
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "Expected a ')' after parameters.")?;
        self.expect(TokenKind::LeftCurly, "Expected a '{' before statements.")?;
        let body = self.scope()?;
        Ok(Expression::Lambda(Lambda {
            params,
            default_params,
            body: Box::new(body),
        }))
    }

    fn anonymous_prototype(&mut self) -> ParseResult<Expression> {
        let parent = if self.matches(&[TokenKind::From]) {
            Some(self.expect(TokenKind::Identifier, "Expected a prototype to inherit from.")?)
        } else {
            None
        };
        self.expect(
            TokenKind::LeftCurly,
            "Expected a '{' after prototype declaration!",
        )?;

        let mut constructor = None;
        if self.matches(&[TokenKind::Identifier]) {
            let name = self.previous();
            if name.lexeme != "constructor" {
                return Err(self.error(&name, "Constructor must be named \"constructor\"."));
            }
            self.expect(TokenKind::Lambda, "Expected a lambda for the constructor.")?;
            constructor = Some(Box::new(self.lambda()?));
        }

        let mut public_properties = vec![];
        if self.matches(&[TokenKind::Public]) {
            self.expect(TokenKind::Colon, "Expected a ':' after \"public\".")?;
            while !self.check(TokenKind::Private)
                && !self.check(TokenKind::RightCurly)
                && !self.at_end()
            {
                if let Some(statement) = self.declaration(false) {
                    public_properties.push(statement);
                }
            }
        }

        let mut private_properties = vec![];
        if self.matches(&[TokenKind::Private]) {
            self.expect(TokenKind::Colon, "Expected a ':' after \"private\".")?;
            while !self.check(TokenKind::RightCurly) && !self.at_end() {
                if let Some(statement) = self.declaration(false) {
                    private_properties.push(statement);
                }
            }
        }

        self.expect(
            TokenKind::RightCurly,
            "Expected a '}' after prototype definition.",
        )?;
        Ok(Expression::Prototype(PrototypeExpression {
            constructor,
            parent,
            public_properties,
            private_properties,
        }))
    }

    /// After parsing an `=` right-hand side the left-hand side decides the
    /// node: a variable becomes an assignment, a property access becomes a
    /// property write, and anything else is a diagnostic.
    fn assignment(&mut self) -> ParseResult<Expression> {
        let expr = self.equality()?;
        if self.matches(&[TokenKind::Equal]) {
            let equal = self.previous();
            let value = self.assignment()?;
            return match expr {
                Expression::Variable { name } => Ok(Expression::Assignment {
                    name,
                    value: Box::new(value),
                }),
                Expression::Get { object, property } => Ok(Expression::Set {
                    object,
                    property,
                    value: Box::new(value),
                }),
                _ => Err(self.error(&equal, "Can not assign to this token.")),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expression> {
        let mut left = self.and_expression()?;
        while self.matches(&[TokenKind::NotEqualTo, TokenKind::EqualTo]) {
            let op = self.previous();
            let right = self.and_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_expression(&mut self) -> ParseResult<Expression> {
        let mut left = self.or_expression()?;
        while self.matches(&[TokenKind::And]) {
            let op = self.previous();
            let right = self.or_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn or_expression(&mut self) -> ParseResult<Expression> {
        let mut left = self.comparison()?;
        while self.matches(&[TokenKind::Or]) {
            let op = self.previous();
            let right = self.comparison()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.term()?;
        while self.matches(&[
            TokenKind::LessThan,
            TokenKind::LessThanOrEqualTo,
            TokenKind::GreaterThan,
            TokenKind::GreaterThanOrEqualTo,
        ]) {
            let op = self.previous();
            let right = self.term()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult<Expression> {
        let mut left = self.factor()?;
        while self.matches(&[TokenKind::Plus, TokenKind::Dash]) {
            let op = self.previous();
            let right = self.factor()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn factor(&mut self) -> ParseResult<Expression> {
        let mut left = self.unary()?;
        while self.matches(&[
            TokenKind::Asterisk,
            TokenKind::ForwardSlash,
            TokenKind::Modulus,
        ]) {
            let op = self.previous();
            let right = self.unary()?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expression> {
        if self.matches(&[TokenKind::Exclamation, TokenKind::Dash]) {
            let op = self.previous();
            let right = self.unary()?;
            return Ok(Expression::Unary {
                op,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expression> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                let mut args = vec![];
                if !self.check(TokenKind::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(&[TokenKind::Comma]) {
                            break;
                        }
                    }
                }
                let closing_paren =
                    self.expect(TokenKind::RightParen, "Expected a ')' after call arguments.")?;
                expr = Expression::Call {
                    callee: Box::new(expr),
                    args,
                    closing_paren,
                };
            } else if self.matches(&[TokenKind::Dot]) {
                let property =
                    self.expect(TokenKind::Identifier, "Expected a property name after '.'.")?;
                expr = Expression::Get {
                    object: Box::new(expr),
                    property,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expression> {
        if self.matches(&[TokenKind::Boolean]) {
            return Ok(Expression::Literal(Literal::Boolean(
                self.previous().lexeme == "true",
            )));
        }
        if self.matches(&[TokenKind::Number]) {
            let token = self.previous();
            let value = token
                .lexeme
                .parse::<f64>()
                .map_err(|_| self.error(&token, "Invalid number literal."))?;
            return Ok(Expression::Literal(Literal::Number(value)));
        }
        if self.matches(&[TokenKind::String]) {
            return Ok(Expression::Literal(Literal::Str(self.previous().lexeme)));
        }
        if self.matches(&[TokenKind::Identifier]) {
            return Ok(Expression::Variable {
                name: self.previous(),
            });
        }
        if self.matches(&[TokenKind::LeftParen]) {
            let expr = self.expression()?;
            self.expect(TokenKind::RightParen, "Expected a ')' after expression.")?;
            return Ok(Expression::Group {
                expr: Box::new(expr),
            });
        }
        let previous = self.previous();
        Err(self.error(&previous, "Unexpected token."))
    }

    /// Discard tokens until the last one consumed was a `;` or the next one
    /// starts a declaration or statement, then resume parsing from there.
    fn synchronize(&mut self) {
        self.advance();
        while !self.at_end() {
            if self
                .tokens
                .previous()
                .is_some_and(|token| token.kind == TokenKind::Semicolon)
            {
                return;
            }
            if matches!(
                self.tokens.peek().map(|token| token.kind),
                Some(TokenKind::Subroutine | TokenKind::Variable | TokenKind::If | TokenKind::While)
            ) {
                return;
            }
            self.advance();
        }
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> ParseResult<Token> {
        if self.check(kind) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        let previous = self.previous();
        Err(self.error(&previous, msg))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.tokens
            .peek()
            .is_some_and(|token| token.kind == kind)
    }

    fn advance(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    fn at_end(&self) -> bool {
        self.tokens.peek().is_none()
    }

    /// The token errors are anchored to: the last consumed one, falling back
    /// to the upcoming token at the very start of the stream.
    fn previous(&self) -> Token {
        self.tokens
            .previous()
            .or_else(|| self.tokens.peek())
            .unwrap_or_else(|| Token::identifier(""))
    }

    fn current(&self) -> Token {
        self.tokens.peek().unwrap_or_else(|| self.previous())
    }

    fn error(&mut self, token: &Token, msg: &str) -> ParseError {
        self.reporter.report(token, msg);
        ParseError {
            message: msg.to_string(),
            position: Some((token.line, token.col)),
        }
    }
}
