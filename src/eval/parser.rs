use crate::diagnostic::Violation;
use crate::span::{Span, Spanned};

use super::lexer::Lexeme;

/// Expression tree of the `[ ] + ++ = ==` subset.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `[]` or `[e]`.
    Array(Option<Box<Spanned<Expr>>>),
    /// `object[key]`.
    Member {
        object: Box<Spanned<Expr>>,
        key: Box<Spanned<Expr>>,
    },
    /// Unary `+e`.
    ToNumber(Box<Spanned<Expr>>),
    /// `++target`.
    PreIncrement(Box<Spanned<Expr>>),
    /// `target++`.
    PostIncrement(Box<Spanned<Expr>>),
    /// Binary `a+b`.
    Add(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `a==b`.
    LooseEq(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `target=value`.
    Assign {
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
}

impl Expr {
    pub fn is_member(&self) -> bool {
        matches!(self, Expr::Member { .. })
    }
}

pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, tokens: Vec<Spanned<Lexeme>>, max_depth: usize) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Parse a whole fragment: exactly one expression, then end of input.
    pub(crate) fn parse(mut self) -> Result<Spanned<Expr>, Violation> {
        let expr = self.parse_expression()?;
        if !self.at(&Lexeme::Eof) {
            return Err(self.error_at_current(&format!(
                "unexpected {} after a complete expression",
                self.peek().description()
            )));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Spanned<Expr>, Violation> {
        self.enter_nesting()?;
        let result = self.parse_assignment();
        self.exit_nesting();
        result
    }

    fn parse_assignment(&mut self) -> Result<Spanned<Expr>, Violation> {
        let lhs = self.parse_equality()?;
        if !self.at(&Lexeme::Eq) {
            return Ok(lhs);
        }
        if !lhs.node.is_member() {
            return Err(Violation::evaluation("invalid assignment target".to_string())
                .at(self.source, lhs.span)
                .with_help("only a member access like `x[k]` can be assigned".to_string()));
        }
        self.advance();
        let rhs = self.parse_expression()?;
        let span = lhs.span.merge(rhs.span);
        Ok(Spanned::new(
            Expr::Assign {
                target: Box::new(lhs),
                value: Box::new(rhs),
            },
            span,
        ))
    }

    fn parse_equality(&mut self) -> Result<Spanned<Expr>, Violation> {
        let mut lhs = self.parse_additive()?;
        loop {
            if self.at(&Lexeme::EqEqEq) {
                return Err(Violation::unimplemented("===").at(self.source, self.current_span()));
            }
            if !self.eat(&Lexeme::EqEq) {
                break;
            }
            let rhs = self.parse_additive()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(Expr::LooseEq(Box::new(lhs), Box::new(rhs)), span);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Spanned<Expr>, Violation> {
        let mut lhs = self.parse_unary()?;
        while self.eat(&Lexeme::Plus) {
            let rhs = self.parse_unary()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(Expr::Add(Box::new(lhs), Box::new(rhs)), span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, Violation> {
        let start = self.current_span();
        if self.eat(&Lexeme::Plus) {
            self.enter_nesting()?;
            let operand = self.parse_unary();
            self.exit_nesting();
            let operand = operand?;
            let span = start.merge(operand.span);
            return Ok(Spanned::new(Expr::ToNumber(Box::new(operand)), span));
        }
        if self.eat(&Lexeme::PlusPlus) {
            self.enter_nesting()?;
            let operand = self.parse_unary();
            self.exit_nesting();
            let operand = operand?;
            if !operand.node.is_member() {
                return Err(Violation::evaluation(
                    "invalid operand of prefix increment".to_string(),
                )
                .at(self.source, operand.span));
            }
            let span = start.merge(operand.span);
            return Ok(Spanned::new(Expr::PreIncrement(Box::new(operand)), span));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Spanned<Expr>, Violation> {
        let expr = self.parse_member()?;
        if !self.at(&Lexeme::PlusPlus) {
            return Ok(expr);
        }
        if !expr.node.is_member() {
            return Err(Violation::evaluation(
                "invalid operand of postfix increment".to_string(),
            )
            .at(self.source, expr.span.merge(self.current_span()))
            .with_help("a '+' right after an operand reads as '++'".to_string()));
        }
        let span = expr.span.merge(self.current_span());
        self.advance();
        Ok(Spanned::new(Expr::PostIncrement(Box::new(expr)), span))
    }

    fn parse_member(&mut self) -> Result<Spanned<Expr>, Violation> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Lexeme::LBracket) {
            let key = self.parse_expression()?;
            let close = self.expect(&Lexeme::RBracket)?;
            let span = expr.span.merge(close);
            expr = Spanned::new(
                Expr::Member {
                    object: Box::new(expr),
                    key: Box::new(key),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, Violation> {
        let open = self.current_span();
        if !self.eat(&Lexeme::LBracket) {
            return Err(self.error_at_current(&format!(
                "expected expression, found {}",
                self.peek().description()
            )));
        }
        if self.at(&Lexeme::RBracket) {
            let close = self.expect(&Lexeme::RBracket)?;
            return Ok(Spanned::new(Expr::Array(None), open.merge(close)));
        }
        let element = self.parse_expression()?;
        let close = self.expect(&Lexeme::RBracket)?;
        Ok(Spanned::new(
            Expr::Array(Some(Box::new(element))),
            open.merge(close),
        ))
    }

    fn enter_nesting(&mut self) -> Result<(), Violation> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self
                .error_at_current(&format!(
                    "nesting depth exceeded (maximum {} levels)",
                    self.max_depth
                ))
                .with_help("raise `max_depth` in the synth configuration".to_string()));
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    // --- Utility methods ---

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos].node
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn at(&self, token: &Lexeme) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Lexeme) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Lexeme) -> Result<Span, Violation> {
        if self.at(token) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.error_at_current(&format!(
                "expected {}, found {}",
                token.description(),
                self.peek().description()
            )))
        }
    }

    fn error_at_current(&self, msg: &str) -> Violation {
        Violation::evaluation(msg.to_string()).at(self.source, self.current_span())
    }
}
