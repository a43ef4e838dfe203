// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Variable(ExprVariable),
    Constant(ExprConstant),
    Binary(ExprOpBinary),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExprVariable {
    pub path: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExprConstant {
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExprOpBinary {
    pub op: BinaryOperator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Exponent,
    Multiply,
    Divide,
    IntDivide,
    Add,
    Subtract,
    Modulo,
    Equal,
    NotEqual,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<BinaryOperator> {
        let op = match symbol {
            "^" => BinaryOperator::Exponent,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "//" => BinaryOperator::IntDivide,
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "%" => BinaryOperator::Modulo,
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Exponent => "^",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::IntDivide => "//",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
        }
    }

    /// Higher binds tighter. Operators of equal precedence group left to right.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Exponent => 100,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::IntDivide => 50,
            BinaryOperator::Add | BinaryOperator::Subtract => 20,
            BinaryOperator::Modulo => 10,
            BinaryOperator::Equal | BinaryOperator::NotEqual => 5,
        }
    }
}

impl fmt::Display for ExprVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.path.join("."))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Variable(var) => write!(f, "{}", var),
            Expr::Constant(constant) => f.write_str(&constant.value),
            Expr::Binary(binary) => write!(f, "{} {} {}", binary.left, binary.op.symbol(), binary.right),
        }
    }
}
