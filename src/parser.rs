// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

mod formula_lexer;
mod formula_parser;

#[cfg(test)]
mod tests;

use std::{collections::HashMap, rc::Rc};

use hashlink::LinkedHashMap;
use xmltree::{Element, XMLNode};

use crate::{
    ast::Expr,
    error::TemplateError,
    params::ParamSpec,
    template::TemplateDefinition,
    xml_utils::{outer_xml, parse_element, significant_children},
};

pub use formula_parser::FormulaParser;

/// A piece of text split around `{{ formula }}` markers.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder { raw: &'a str, formula: &'a str },
}

/// Loads template definitions from template source files.
pub struct Parser {
    formula_parser: FormulaParser,
}

impl Parser {
    pub fn new() -> Parser {
        let formula_parser = FormulaParser::new();
        Parser { formula_parser }
    }

    pub fn parse(&self, filename: &str, input: &str) -> Result<Vec<TemplateDefinition>, TemplateError> {
        let run = ParserRun::new(self, filename);
        run.parse(input)
    }
}

struct ParserRun<'a> {
    formula_parser: &'a FormulaParser,
    filename: Rc<String>,
}

impl ParserRun<'_> {
    fn new<'a>(parser: &'a Parser, filename: &str) -> ParserRun<'a> {
        ParserRun {
            formula_parser: &parser.formula_parser,
            filename: Rc::new(filename.to_string()),
        }
    }

    fn parse(&self, input: &str) -> Result<Vec<TemplateDefinition>, TemplateError> {
        let root = parse_element(input)?;
        match root.name.as_str() {
            "template" => Ok(vec![self.parse_template(&root)?]),
            "templates" => {
                let mut templates = Vec::new();
                for child in significant_children(&root) {
                    match child {
                        XMLNode::Element(elem) if elem.name == "template" => {
                            templates.push(self.parse_template(elem)?);
                        }
                        XMLNode::Element(elem) => {
                            return Err(TemplateError::schema(
                                &self.filename,
                                format!("expected <template>, found <{}>", elem.name),
                            ))
                        }
                        _ => return Err(TemplateError::schema(&self.filename, "unexpected text between templates")),
                    }
                }
                Ok(templates)
            }
            other => Err(TemplateError::schema(
                &self.filename,
                format!("root element must be <template> or <templates>, found <{}>", other),
            )),
        }
    }

    fn parse_template(&self, elem: &Element) -> Result<TemplateDefinition, TemplateError> {
        let name = match elem.attributes.get("name").map(|name| name.trim()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(TemplateError::schema(
                    &self.filename,
                    format!("template is missing a 'name' attribute: {}", outer_xml(elem)),
                ))
            }
        };

        let mut params: LinkedHashMap<String, ParamSpec> = LinkedHashMap::new();
        let mut content = None;
        for child in significant_children(elem) {
            let XMLNode::Element(child) = child else {
                return Err(TemplateError::schema(&name, "unexpected text in template declaration"));
            };
            match child.name.as_str() {
                "param" => {
                    let spec = ParamSpec::from_element(child)?;
                    if params.contains_key(&spec.name) {
                        return Err(TemplateError::schema(&name, format!("duplicate param '{}'", spec.name)));
                    }
                    params.insert(spec.name.clone(), spec);
                }
                "content" => {
                    if content.is_some() {
                        return Err(TemplateError::schema(&name, "more than one <content> element"));
                    }
                    content = Some(child.clone());
                }
                other => {
                    return Err(TemplateError::schema(
                        &name,
                        format!("unexpected element <{}> (expected <param> or <content>)", other),
                    ))
                }
            }
        }

        let Some(content) = content else {
            return Err(TemplateError::schema(&name, "missing <content> element"));
        };

        let mut formulas = HashMap::new();
        self.collect_formulas(&content, &mut formulas)?;

        tracing::debug!(
            file = %self.filename,
            template = %name,
            params = params.len(),
            formulas = formulas.len(),
            "parsed template"
        );
        Ok(TemplateDefinition::new(name, params, content, formulas))
    }

    fn collect_formulas(&self, elem: &Element, formulas: &mut HashMap<String, Expr>) -> Result<(), TemplateError> {
        for value in elem.attributes.values() {
            self.parse_formulas_in(value, formulas)?;
        }
        for child in &elem.children {
            match child {
                XMLNode::Element(child) => self.collect_formulas(child, formulas)?,
                XMLNode::Text(text) | XMLNode::CData(text) => self.parse_formulas_in(text, formulas)?,
                XMLNode::Comment(_) | XMLNode::ProcessingInstruction(..) => {}
            }
        }
        Ok(())
    }

    fn parse_formulas_in(&self, text: &str, formulas: &mut HashMap<String, Expr>) -> Result<(), TemplateError> {
        for segment in split_placeholders(text) {
            if let Segment::Placeholder { formula, .. } = segment {
                if !formulas.contains_key(formula) {
                    let expr = self.formula_parser.parse(formula)?;
                    formulas.insert(formula.to_string(), expr);
                }
            }
        }
        Ok(())
    }
}

/// Splits text around `{{ formula }}` markers. A marker's formula is the trimmed text between the
/// braces; it may not itself contain braces. Text that does not form a marker is literal.
pub fn split_placeholders(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find("{{") {
        let open = pos + offset;
        let inner_start = open + 2;
        let Some(close) = text[inner_start..].find("}}").map(|offset| inner_start + offset) else {
            break;
        };

        let inner = &text[inner_start..close];
        if inner.contains(['{', '}']) || inner.trim().is_empty() {
            // Not a marker at this brace. Retry from the next one.
            pos = open + 1;
            continue;
        }

        if open > literal_start {
            segments.push(Segment::Literal(&text[literal_start..open]));
        }
        segments.push(Segment::Placeholder {
            raw: &text[open..close + 2],
            formula: inner.trim(),
        });
        pos = close + 2;
        literal_start = pos;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    segments
}
