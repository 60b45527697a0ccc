// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expression evaluation.
//!
//! An expression is a string split on `++` into tokens. A token of the form
//! `$name` refers to a constant, every other token is literal text. A single
//! reference keeps the type of the referenced value; anything else produces
//! the concatenation of the textual form of each token.
//!
//! Constants whose name starts with the lazy marker (`~`) hold an unevaluated
//! value that is expanded again against the active scope on every reference.

use crate::constants::{Constant, ConstantTable};
use crate::error::{Error, Result};
use crate::value::{Map, Value};

pub const CONCAT_DELIMITER: &str = "++";
pub const SIGIL: char = '$';

// Bounds the expansion of lazy constants that refer back to themselves.
const MAX_LAZY_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `$name`, holding `name`.
    Var(&'a str),
    Literal(&'a str),
}

impl<'a> Token<'a> {
    fn new(text: &'a str) -> Self {
        match text.strip_prefix(SIGIL) {
            Some(name) if !name.is_empty() => Token::Var(name),
            _ => Token::Literal(text),
        }
    }
}

/// A tokenized expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression<'a> {
    tokens: Vec<Token<'a>>,
}

impl<'a> Expression<'a> {
    pub fn parse(text: &'a str) -> Self {
        Self {
            tokens: text.split(CONCAT_DELIMITER).map(Token::new).collect(),
        }
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// The variable name when the expression is exactly one reference.
    pub fn as_single_var(&self) -> Option<&'a str> {
        match self.tokens.as_slice() {
            [Token::Var(name)] => Some(*name),
            _ => None,
        }
    }
}

struct Evaluator<'a> {
    constants: &'a ConstantTable,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    fn new(constants: &'a ConstantTable) -> Self {
        Self {
            constants,
            depth: 0,
        }
    }

    fn lookup(&mut self, name: &str) -> Result<Value> {
        let constants = self.constants;
        match constants.get(name) {
            Some(Constant::Resolved(value)) => Ok(value.clone()),
            Some(Constant::Deferred(raw)) => {
                if self.depth >= MAX_LAZY_DEPTH {
                    return Err(Error::LazyRecursionLimit { name: name.into() });
                }
                self.depth += 1;
                let value = self.eval_recursive(raw);
                self.depth -= 1;
                value
            }
            None => Err(Error::UndefinedConstant { name: name.into() }),
        }
    }

    fn eval_str(&mut self, text: &str, cast_to_string: bool) -> Result<Value> {
        let expr = Expression::parse(text);

        if !cast_to_string {
            match expr.tokens() {
                [Token::Var(name)] => return self.lookup(name),
                [Token::Literal(literal)] => return Ok(Value::from(*literal)),
                _ => (),
            }
        }

        let mut result = String::new();
        for token in expr.tokens() {
            match token {
                Token::Var(name) => result.push_str(&self.lookup(name)?.to_text()),
                Token::Literal(literal) => result.push_str(literal),
            }
        }
        Ok(Value::from(result))
    }

    fn eval(&mut self, expr: &Value, cast_to_string: bool) -> Result<Value> {
        match expr {
            Value::String(s) => self.eval_str(s, cast_to_string),
            _ => Ok(expr.clone()),
        }
    }

    fn eval_recursive(&mut self, data: &Value) -> Result<Value> {
        match data {
            Value::String(s) => self.eval_str(s, false),
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items.iter() {
                    result.push(self.eval_recursive(item)?);
                }
                Ok(Value::from(result))
            }
            Value::Object(fields) => {
                let mut result = Map::with_capacity(fields.len());
                for (key, value) in fields.iter() {
                    let key = self.eval_str(key, false)?.to_text();
                    result.insert(key.into(), self.eval_recursive(value)?);
                }
                Ok(Value::from(result))
            }
            _ => Ok(data.clone()),
        }
    }
}

/// Evaluate a single expression. Non-string values are returned unchanged.
pub fn evaluate(constants: &ConstantTable, expr: &Value, cast_to_string: bool) -> Result<Value> {
    Evaluator::new(constants).eval(expr, cast_to_string)
}

pub fn evaluate_str(constants: &ConstantTable, expr: &str, cast_to_string: bool) -> Result<Value> {
    Evaluator::new(constants).eval_str(expr, cast_to_string)
}

/// Evaluate an expression naming a block of definitions, such as rules or hooks.
///
/// A single reference to a lazy constant is expanded one level only: the
/// stored value is returned with the references inside it left for the scope
/// each definition is later resolved in.
pub fn evaluate_definitions(constants: &ConstantTable, expr: &str) -> Result<Value> {
    if let Some(name) = Expression::parse(expr).as_single_var() {
        if let Some(Constant::Deferred(raw)) = constants.get(name) {
            return Ok(raw.clone());
        }
    }
    evaluate_str(constants, expr, false)
}

/// Evaluate every string found in `data`, including object keys.
pub fn evaluate_recursive(constants: &ConstantTable, data: &Value) -> Result<Value> {
    Evaluator::new(constants).eval_recursive(data)
}
