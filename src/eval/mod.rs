//! Evaluation of fragment text in the modeled environment.
//!
//! The synthesis core only needs the value a fragment produces, so the
//! environment is an injected [`Evaluator`]. [`Interpreter`] is the built-in
//! one: a lexer, a recursive-descent parser, and a tree walker over the
//! expression subset fragments are written in.

mod lexer;
mod parser;
pub mod value;


pub use lexer::{Lexeme, Lexer};
pub use parser::Expr;
pub use value::{number_to_string, string_to_number, ArrayRef, NativeFn, TypeTag, Value};

use crate::config::SynthConfig;
use crate::diagnostic::Violation;
use crate::span::Spanned;

use parser::Parser;
use value::PropertyRead;

/// Runs fragment text and reports the value it evaluates to.
///
/// Every call starts from a fresh environment: nothing a previous
/// evaluation created or mutated is visible to the next one.
pub trait Evaluator {
    fn evaluate(&self, source: &str) -> Result<Value, Violation>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, source: &str) -> Result<Value, Violation> {
        (**self).evaluate(source)
    }
}

/// Tree-walking interpreter for the `[ ] + ++ = ==` subset.
#[derive(Clone, Debug)]
pub struct Interpreter {
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            max_depth: SynthConfig::default().max_depth,
        }
    }

    pub fn with_config(config: &SynthConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    /// Tokenize and parse without evaluating.
    pub fn parse(&self, source: &str) -> Result<Spanned<Expr>, Violation> {
        let (tokens, mut errors) = Lexer::new(source).tokenize();
        if !errors.is_empty() {
            return Err(errors.remove(0));
        }
        Parser::new(source, tokens, self.max_depth).parse()
    }
}

impl Evaluator for Interpreter {
    fn evaluate(&self, source: &str) -> Result<Value, Violation> {
        let expr = self.parse(source)?;
        Walker { source }.eval(&expr)
    }
}

/// A resolved member reference: the object and the property key.
struct Reference {
    base: Value,
    key: String,
}

struct Walker<'src> {
    source: &'src str,
}

impl Walker<'_> {
    fn eval(&self, expr: &Spanned<Expr>) -> Result<Value, Violation> {
        match &expr.node {
            Expr::Array(None) => Ok(Value::Array(ArrayRef::new(Vec::new()))),
            Expr::Array(Some(element)) => {
                let value = self.eval(element)?;
                Ok(Value::Array(ArrayRef::new(vec![value])))
            }
            Expr::Member { .. } => {
                let reference = self.reference(expr)?;
                self.read(&reference, expr)
            }
            Expr::ToNumber(operand) => {
                let value = self.eval(operand)?;
                Ok(Value::Number(value.to_number()))
            }
            Expr::PreIncrement(target) => {
                let reference = self.reference(target)?;
                let old = self.read(&reference, target)?.to_number();
                let new = Value::Number(old + 1.0);
                self.write(&reference, new.clone(), target)?;
                Ok(new)
            }
            Expr::PostIncrement(target) => {
                let reference = self.reference(target)?;
                let old = self.read(&reference, target)?.to_number();
                self.write(&reference, Value::Number(old + 1.0), target)?;
                Ok(Value::Number(old))
            }
            Expr::Add(lhs, rhs) => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                Ok(a.add(&b))
            }
            Expr::LooseEq(lhs, rhs) => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                Ok(Value::Boolean(a.loose_eq(&b)))
            }
            Expr::Assign { target, value } => {
                let reference = self.reference(target)?;
                let value = self.eval(value)?;
                self.write(&reference, value.clone(), target)?;
                Ok(value)
            }
        }
    }

    fn reference(&self, expr: &Spanned<Expr>) -> Result<Reference, Violation> {
        let Expr::Member { object, key } = &expr.node else {
            return Err(Violation::evaluation("expected a member access".to_string())
                .at(self.source, expr.span));
        };
        let base = self.eval(object)?;
        let key = self.eval(key)?.to_property_key();
        Ok(Reference { base, key })
    }

    fn read(&self, reference: &Reference, at: &Spanned<Expr>) -> Result<Value, Violation> {
        match reference.base.get(&reference.key) {
            PropertyRead::Value(value) => Ok(value),
            PropertyRead::NoObject => Err(Violation::evaluation(format!(
                "cannot read properties of undefined (reading '{}')",
                reference.key
            ))
            .at(self.source, at.span)),
        }
    }

    fn write(&self, reference: &Reference, value: Value, at: &Spanned<Expr>) -> Result<(), Violation> {
        match reference.base.set(&reference.key, value) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Violation::evaluation(format!(
                "cannot set properties of undefined (setting '{}')",
                reference.key
            ))
            .at(self.source, at.span)),
            Err(msg) => Err(Violation::evaluation(msg).at(self.source, at.span)),
        }
    }
}
