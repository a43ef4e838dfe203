// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{borrow::Cow, collections::HashMap, mem};

use xmltree::{Element, XMLNode};

use crate::{
    ast::{BinaryOperator, Expr, ExprOpBinary},
    bindings::Bindings,
    config::SiteContext,
    error::TemplateError,
    parser::{split_placeholders, FormulaParser, Segment},
    template::TemplateDefinition,
    template_value::TemplateValue,
};

use super::actions::Action;

pub struct InterpreterRun<'a> {
    pub(super) def: &'a TemplateDefinition,
    pub(super) ctx: &'a SiteContext,
    pub(super) bindings: Bindings,
    // Only needed for markers that were not in the definition body, e.g. ones that arrived
    // through a bound value and are re-scanned inside a loop body.
    fallback_parser: Option<FormulaParser>,
}

/// Result of evaluating a formula against the current bindings.
#[derive(Clone, Debug, PartialEq)]
pub enum Computed {
    Resolved(String),
    /// A variable the formula needs is not bound yet.
    Deferred,
}

impl<'a> InterpreterRun<'a> {
    pub fn new(
        def: &'a TemplateDefinition,
        ctx: &'a SiteContext,
        variables: HashMap<String, TemplateValue>,
    ) -> InterpreterRun<'a> {
        InterpreterRun {
            def,
            ctx,
            bindings: Bindings::new(variables),
            fallback_parser: None,
        }
    }

    #[cfg(test)]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Substitutes placeholders throughout `elem`, then runs every action in it.
    pub fn expand_content(&mut self, elem: &mut Element) -> Result<(), TemplateError> {
        self.substitute(elem)?;
        self.expand_actions(elem)
    }

    pub fn substitute(&mut self, elem: &mut Element) -> Result<(), TemplateError> {
        for value in elem.attributes.values_mut() {
            if value.contains("{{") {
                *value = self.substitute_attribute(value)?;
            }
        }

        let children = mem::take(&mut elem.children);
        for child in children {
            match child {
                XMLNode::Element(mut child) => {
                    self.substitute(&mut child)?;
                    elem.children.push(XMLNode::Element(child));
                }
                XMLNode::Text(text) => self.substitute_text(&text, &mut elem.children)?,
                other => elem.children.push(other),
            }
        }
        Ok(())
    }

    fn substitute_attribute(&mut self, value: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(value.len());
        for segment in split_placeholders(value) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { raw, formula } => match self.evaluate(formula)? {
                    Computed::Resolved(text) => out.push_str(&text),
                    Computed::Deferred => out.push_str(raw),
                },
            }
        }
        Ok(out)
    }

    fn substitute_text(&mut self, text: &str, out: &mut Vec<XMLNode>) -> Result<(), TemplateError> {
        let segments = split_placeholders(text);
        if !segments.iter().any(|segment| matches!(segment, Segment::Placeholder { .. })) {
            out.push(XMLNode::Text(text.to_string()));
            return Ok(());
        }

        let mut pending = String::new();
        for segment in segments {
            let (raw, formula) = match segment {
                Segment::Literal(literal) => {
                    pending.push_str(literal);
                    continue;
                }
                Segment::Placeholder { raw, formula } => (raw, formula),
            };

            // A lone variable holding markup splices the markup itself rather than its text.
            if let Some(fragment) = self.xml_variable(formula)? {
                if !pending.is_empty() {
                    out.push(XMLNode::Text(mem::take(&mut pending)));
                }
                out.extend(fragment.children.iter().cloned());
                continue;
            }

            match self.evaluate(formula)? {
                Computed::Resolved(text) => pending.push_str(&text),
                Computed::Deferred => pending.push_str(raw),
            }
        }
        if !pending.is_empty() {
            out.push(XMLNode::Text(pending));
        }
        Ok(())
    }

    fn xml_variable(&mut self, formula: &str) -> Result<Option<Element>, TemplateError> {
        let Some(expr) = self.lookup_formula(formula)? else {
            return Ok(None);
        };
        let Expr::Variable(var) = expr.as_ref() else {
            return Ok(None);
        };
        match self.bindings.lookup(&var.path) {
            Some(TemplateValue::Xml(fragment)) => Ok(Some(fragment.as_ref().clone())),
            _ => Ok(None),
        }
    }

    /// Evaluates the formula text found inside a marker.
    pub fn evaluate(&mut self, formula: &str) -> Result<Computed, TemplateError> {
        let Some(expr) = self.lookup_formula(formula)? else {
            return Ok(Computed::Deferred);
        };
        self.interpret_expr(formula, &expr)
    }

    fn lookup_formula(&mut self, formula: &str) -> Result<Option<Cow<'a, Expr>>, TemplateError> {
        let def = self.def;
        if let Some(expr) = def.formula(formula) {
            return Ok(Some(Cow::Borrowed(expr)));
        }

        let parser = self.fallback_parser.get_or_insert_with(FormulaParser::new);
        match parser.parse(formula) {
            Ok(expr) => Ok(Some(Cow::Owned(expr))),
            Err(err) => {
                // Markers outside the definition body are text, not template source.
                tracing::debug!(template = %self.def.name(), %err, "leaving marker as text");
                Ok(None)
            }
        }
    }

    pub fn interpret_expr(&self, formula: &str, expr: &Expr) -> Result<Computed, TemplateError> {
        match expr {
            Expr::Variable(var) => match self.bindings.lookup(&var.path) {
                Some(value) => {
                    let text = value
                        .render_text()
                        .map_err(|reason| TemplateError::expression(formula, format!("'{}': {}", var, reason)))?;
                    Ok(Computed::Resolved(text))
                }
                None => Ok(Computed::Deferred),
            },
            Expr::Constant(constant) => Ok(Computed::Resolved(constant.value.clone())),
            Expr::Binary(binary) => self.interpret_binary_op(formula, binary),
        }
    }

    fn interpret_binary_op(&self, formula: &str, binary: &ExprOpBinary) -> Result<Computed, TemplateError> {
        let left = self.interpret_expr(formula, &binary.left)?;
        let right = self.interpret_expr(formula, &binary.right)?;
        let (Computed::Resolved(left), Computed::Resolved(right)) = (left, right) else {
            return Ok(Computed::Deferred);
        };

        let left = parse_operand(formula, &left)?;
        let right = parse_operand(formula, &right)?;
        let result = match binary.op {
            BinaryOperator::Exponent => format_number(left.powf(right)),
            BinaryOperator::Multiply => format_number(left * right),
            BinaryOperator::Divide => format_number(left / right),
            BinaryOperator::IntDivide => format_number((left / right).floor()),
            BinaryOperator::Add => format_number(left + right),
            BinaryOperator::Subtract => format_number(left - right),
            BinaryOperator::Modulo => format_number(left % right),
            BinaryOperator::Equal => format_bool(left == right),
            BinaryOperator::NotEqual => format_bool(left != right),
        };
        Ok(Computed::Resolved(result))
    }

    /// Walks `elem` depth first, replacing every action element with its output.
    pub fn expand_actions(&mut self, elem: &mut Element) -> Result<(), TemplateError> {
        let children = mem::take(&mut elem.children);
        for child in children {
            match child {
                XMLNode::Element(child) => match Action::from_tag(&child.name) {
                    Some(action) => {
                        let nodes = self.run_action(action, child)?;
                        elem.children.extend(nodes);
                    }
                    None => {
                        let mut child = child;
                        self.expand_actions(&mut child)?;
                        elem.children.push(XMLNode::Element(child));
                    }
                },
                other => elem.children.push(other),
            }
        }
        Ok(())
    }
}

fn parse_operand(formula: &str, text: &str) -> Result<f64, TemplateError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| TemplateError::expression(formula, format!("'{}' is not a number", text)))
}

pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

pub fn format_bool(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}
