// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

#[cfg(test)]
mod tests;

use std::ops::Range;

use chumsky::prelude::*;

use crate::{
    ast::{BinaryOperator, Expr, ExprConstant, ExprOpBinary, ExprVariable},
    error::TemplateError,
};

use super::formula_lexer::{gen_lexer, Token};

pub struct FormulaParser {
    lexer: Box<dyn Parser<char, Vec<(Token, Range<usize>)>, Error = Simple<char>>>,
}

impl FormulaParser {
    pub fn new() -> FormulaParser {
        let lexer = gen_lexer();
        FormulaParser { lexer: Box::new(lexer) }
    }

    /// Parses the text between `{{` and `}}`. There is no grouping syntax: the tree shape is
    /// decided entirely by operator precedence, reading left to right.
    pub fn parse(&self, formula: &str) -> Result<Expr, TemplateError> {
        let tokens = match self.lexer.parse(formula) {
            Ok(tokens) => tokens,
            Err(errs) => {
                let reasons: Vec<String> = errs.iter().map(|err| err.to_string()).collect();
                return Err(TemplateError::expression(formula, reasons.join("; ")));
            }
        };

        let mut builder = ExprBuilder::new(formula);
        for (token, _) in tokens {
            match token {
                Token::Ident(path) => builder.push_operand(Expr::Variable(ExprVariable { path }))?,
                Token::Number(value) => builder.push_operand(Expr::Constant(ExprConstant { value }))?,
                Token::Op(symbol) => {
                    let op = BinaryOperator::from_symbol(&symbol).ok_or_else(|| {
                        TemplateError::expression(formula, format!("unrecognized operator '{}'", symbol))
                    })?;
                    builder.push_operator(op)?
                }
            }
        }
        builder.finish()
    }
}

struct ExprBuilder<'a> {
    formula: &'a str,
    operands: Vec<Expr>,
    operators: Vec<BinaryOperator>,
}

impl ExprBuilder<'_> {
    fn new(formula: &str) -> ExprBuilder<'_> {
        ExprBuilder {
            formula,
            operands: Vec::new(),
            operators: Vec::new(),
        }
    }

    fn expects_operand(&self) -> bool {
        self.operands.len() == self.operators.len()
    }

    fn push_operand(&mut self, operand: Expr) -> Result<(), TemplateError> {
        if !self.expects_operand() {
            return Err(TemplateError::expression(
                self.formula,
                format!("unexpected value '{}' after a complete formula", operand),
            ));
        }
        self.operands.push(operand);
        Ok(())
    }

    fn push_operator(&mut self, op: BinaryOperator) -> Result<(), TemplateError> {
        if self.operands.is_empty() {
            return Err(TemplateError::expression(
                self.formula,
                format!("operator '{}' before any value", op.symbol()),
            ));
        }
        if self.expects_operand() {
            return Err(TemplateError::expression(
                self.formula,
                format!("operator '{}' follows another operator", op.symbol()),
            ));
        }

        // An operator that does not bind tighter than the one before it takes the whole
        // preceding tree as its left operand.
        while self
            .operators
            .last()
            .is_some_and(|prev| prev.precedence() >= op.precedence())
        {
            self.reduce();
        }
        self.operators.push(op);
        Ok(())
    }

    fn finish(mut self) -> Result<Expr, TemplateError> {
        if self.operands.is_empty() {
            return Err(TemplateError::expression(self.formula, "empty formula"));
        }
        if let (true, Some(op)) = (self.expects_operand(), self.operators.last()) {
            return Err(TemplateError::expression(
                self.formula,
                format!("operator '{}' has no right operand", op.symbol()),
            ));
        }

        while !self.operators.is_empty() {
            self.reduce();
        }
        match self.operands.pop() {
            Some(expr) => Ok(expr),
            None => Err(TemplateError::expression(self.formula, "empty formula")),
        }
    }

    fn reduce(&mut self) {
        // push_operator guarantees one more operand than operators, so both pops succeed.
        let (Some(op), Some(right), Some(left)) = (self.operators.pop(), self.operands.pop(), self.operands.pop())
        else {
            return;
        };
        self.operands.push(Expr::Binary(ExprOpBinary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }));
    }
}
