// Copyright (c) Chris Gunn.
// Licensed under the MIT license.


use std::rc::Rc;

use chrono::{Datelike, NaiveDate};
use hashlink::LinkedHashMap;
use xmltree::{Element, XMLNode};

use crate::{
    config::{join_under_root, SiteContext},
    error::TemplateError,
    markdown::markdown_to_html,
    template_value::TemplateValue,
    xml_utils::{outer_xml, parse_fragment, significant_children},
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamKind {
    Text(TextSubtype),
    Xml,
    List(Box<ParamSpec>),
    Struct(Vec<ParamSpec>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSubtype {
    Generic,
    Integer,
    Float,
    File,
    Date,
    Markdown,
}

impl TextSubtype {
    pub fn from_name(name: &str) -> Option<TextSubtype> {
        let subtype = match name.to_ascii_lowercase().as_str() {
            "generic" | "text" | "none" => TextSubtype::Generic,
            "integer" | "int" | "uint" => TextSubtype::Integer,
            "float" | "double" => TextSubtype::Float,
            "file" => TextSubtype::File,
            "date" => TextSubtype::Date,
            "markdown" | "md" => TextSubtype::Markdown,
            _ => return None,
        };
        Some(subtype)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextSubtype::Generic => "generic",
            TextSubtype::Integer => "integer",
            TextSubtype::Float => "float",
            TextSubtype::File => "file",
            TextSubtype::Date => "date",
            TextSubtype::Markdown => "markdown",
        }
    }
}

impl ParamSpec {
    /// Builds a spec from a `<param name=".." type="kind[,subtype]" required="..">` declaration.
    /// List and struct params declare their element/field specs as nested `<param>` children.
    pub fn from_element(elem: &Element) -> Result<ParamSpec, TemplateError> {
        if elem.name != "param" {
            return Err(TemplateError::schema(
                &elem.name,
                format!("unexpected element (expected 'param'): {}", outer_xml(elem)),
            ));
        }

        let name = elem
            .attributes
            .get("name")
            .ok_or_else(|| TemplateError::schema("param", format!("missing 'name' attribute: {}", outer_xml(elem))))?
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(TemplateError::schema("param", "empty 'name' attribute"));
        }

        let type_attr = elem
            .attributes
            .get("type")
            .ok_or_else(|| TemplateError::schema(&name, "missing 'type' attribute"))?;
        let type_tokens: Vec<&str> = type_attr
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();

        let required = match elem.attributes.get("required").map(|value| value.trim()) {
            None => true,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(TemplateError::schema(
                    &name,
                    format!("'required' must be 'true' or 'false', got '{}'", other),
                ))
            }
        };

        let kind = match type_tokens.as_slice() {
            [] => return Err(TemplateError::schema(&name, "empty 'type' attribute")),
            ["text"] => ParamKind::Text(TextSubtype::Generic),
            ["text", subtype] => match TextSubtype::from_name(subtype) {
                Some(subtype) => ParamKind::Text(subtype),
                None => return Err(TemplateError::schema(&name, format!("invalid text subtype '{}'", subtype))),
            },
            ["xml"] => ParamKind::Xml,
            ["list", ..] => ParamKind::List(Box::new(Self::parse_list_element(&name, elem)?)),
            ["struct", ..] => ParamKind::Struct(Self::parse_struct_fields(&name, elem)?),
            [other, ..] => return Err(TemplateError::schema(&name, format!("unrecognized param type '{}'", other))),
        };

        Ok(ParamSpec { name, kind, required })
    }

    fn parse_list_element(name: &str, elem: &Element) -> Result<ParamSpec, TemplateError> {
        let mut element_spec = None;
        for child in significant_children(elem) {
            let XMLNode::Element(child) = child else {
                return Err(TemplateError::schema(name, "list params may only contain a single <param>"));
            };
            if element_spec.is_some() {
                return Err(TemplateError::schema(
                    name,
                    format!("expected only one child for list type: {}", outer_xml(elem)),
                ));
            }
            element_spec = Some(ParamSpec::from_element(child)?);
        }
        element_spec.ok_or_else(|| TemplateError::schema(name, "no child type for list"))
    }

    fn parse_struct_fields(name: &str, elem: &Element) -> Result<Vec<ParamSpec>, TemplateError> {
        let mut fields: Vec<ParamSpec> = Vec::new();
        for child in significant_children(elem) {
            let XMLNode::Element(child) = child else {
                return Err(TemplateError::schema(name, "struct params may only contain <param> fields"));
            };
            let field = ParamSpec::from_element(child)?;
            if fields.iter().any(|existing| existing.name == field.name) {
                return Err(TemplateError::schema(name, format!("duplicate struct field '{}'", field.name)));
            }
            fields.push(field);
        }
        if fields.is_empty() {
            return Err(TemplateError::schema(name, "struct has no fields"));
        }
        Ok(fields)
    }

    pub fn type_name(&self) -> String {
        match &self.kind {
            ParamKind::Text(subtype) => format!("text,{}", subtype.name()),
            ParamKind::Xml => "xml".to_string(),
            ParamKind::List(element) => format!("list,{}", element.type_name()),
            ParamKind::Struct(_) => "struct".to_string(),
        }
    }

    /// Finds the spec declared under `name`, searching this spec and everything nested in it.
    pub fn find(&self, name: &str) -> Option<&ParamSpec> {
        if self.name == name {
            return Some(self);
        }
        match &self.kind {
            ParamKind::List(element) => element.find(name),
            ParamKind::Struct(fields) => fields.iter().find_map(|field| field.find(name)),
            ParamKind::Text(_) | ParamKind::Xml => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        match &self.kind {
            ParamKind::Struct(fields) => fields.iter().find(|field| field.name == name),
            _ => None,
        }
    }

    /// Validates an instance node against this spec and converts its content to a typed value.
    pub fn validate(&self, node: &Element, ctx: &SiteContext) -> Result<TemplateValue, TemplateError> {
        match &self.kind {
            ParamKind::Text(subtype) => self.validate_text(*subtype, node, ctx),
            ParamKind::Xml => Ok(TemplateValue::Xml(Rc::new(node.clone()))),
            ParamKind::List(element) => self.validate_list(element, node, ctx),
            ParamKind::Struct(fields) => self.validate_struct(fields, node, ctx),
        }
    }

    fn validate_text(&self, subtype: TextSubtype, node: &Element, ctx: &SiteContext) -> Result<TemplateValue, TemplateError> {
        let children: Vec<&XMLNode> = node
            .children
            .iter()
            .filter(|child| !matches!(child, XMLNode::Comment(_)))
            .collect();
        let text = match children.as_slice() {
            [XMLNode::Text(text)] | [XMLNode::CData(text)] => text,
            [_] => return Err(self.invalid(node, "expected plain text")),
            _ => return Err(self.invalid(node, format!("expected one child, got {}", children.len()))),
        };

        match subtype {
            TextSubtype::Generic => Ok(TemplateValue::text(text.as_str())),
            TextSubtype::Integer => match text.trim().parse::<i64>() {
                Ok(_) => Ok(TemplateValue::text(text.trim())),
                Err(_) => Err(self.invalid(node, format!("not a valid integer: {}", text))),
            },
            TextSubtype::Float => match text.trim().parse::<f64>() {
                Ok(_) => Ok(TemplateValue::text(text.trim())),
                Err(_) => Err(self.invalid(node, format!("not a valid float: {}", text))),
            },
            TextSubtype::File => {
                let relative = text.trim().trim_start_matches('/');
                let exists = join_under_root(&ctx.file_root, relative).is_some_and(|path| path.is_file());
                if relative.is_empty() || !exists {
                    return Err(self.invalid(node, format!("file does not exist: {}", text.trim())));
                }
                Ok(TemplateValue::text(format!("/{}", relative)))
            }
            TextSubtype::Date => self.convert_date(text.trim(), node),
            TextSubtype::Markdown => {
                let html = markdown_to_html(text);
                let fragment = parse_fragment(&html)
                    .map_err(|err| self.invalid(node, format!("markdown produced malformed markup: {}", err)))?;
                Ok(TemplateValue::Xml(Rc::new(fragment)))
            }
        }
    }

    fn convert_date(&self, text: &str, node: &Element) -> Result<TemplateValue, TemplateError> {
        let date = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
            .ok_or_else(|| self.invalid(node, format!("not a valid date (expected YYYY-MM-DD): {}", text)))?;

        let mut fields = LinkedHashMap::new();
        fields.insert("text".to_string(), TemplateValue::text(text));
        fields.insert("year".to_string(), TemplateValue::text(date.year().to_string()));
        fields.insert("month".to_string(), TemplateValue::text(date.month().to_string()));
        fields.insert("day".to_string(), TemplateValue::text(date.day().to_string()));
        fields.insert("month-name".to_string(), TemplateValue::text(date.format("%B").to_string()));
        Ok(TemplateValue::Struct(Rc::new(fields)))
    }

    fn validate_list(&self, element: &ParamSpec, node: &Element, ctx: &SiteContext) -> Result<TemplateValue, TemplateError> {
        let mut values = Vec::new();
        for child in significant_children(node) {
            match child {
                XMLNode::Element(child) if child.name == element.name => {
                    values.push(element.validate(child, ctx)?);
                }
                XMLNode::Element(child) => {
                    return Err(self.invalid(
                        node,
                        format!("unexpected node (expected '{}'): {}", element.name, child.name),
                    ))
                }
                _ => return Err(self.invalid(node, format!("unexpected text (expected '{}')", element.name))),
            }
        }
        Ok(TemplateValue::List(Rc::new(values)))
    }

    fn validate_struct(&self, fields: &[ParamSpec], node: &Element, ctx: &SiteContext) -> Result<TemplateValue, TemplateError> {
        let mut found: LinkedHashMap<String, TemplateValue> = LinkedHashMap::new();
        for child in significant_children(node) {
            let XMLNode::Element(child) = child else {
                return Err(self.invalid(node, "unexpected text between struct fields"));
            };
            let Some(field) = fields.iter().find(|field| field.name == child.name) else {
                return Err(self.invalid(node, format!("unknown field '{}'", child.name)));
            };
            if found.contains_key(&field.name) {
                return Err(self.invalid(node, format!("duplicate field '{}'", field.name)));
            }
            found.insert(field.name.clone(), field.validate(child, ctx)?);
        }

        // Rebuild in declaration order so output never depends on instance field order.
        let mut values = LinkedHashMap::new();
        for field in fields {
            match found.remove(&field.name) {
                Some(value) => {
                    values.insert(field.name.clone(), value);
                }
                None => return Err(self.invalid(node, format!("missing field '{}'", field.name))),
            }
        }
        Ok(TemplateValue::Struct(Rc::new(values)))
    }

    fn invalid(&self, node: &Element, reason: impl Into<String>) -> TemplateError {
        TemplateError::Validation {
            param: self.name.clone(),
            type_name: self.type_name(),
            reason: reason.into(),
            markup: outer_xml(node),
        }
    }
}
