// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Typed values produced by validating instance content against a parameter spec.

use std::rc::Rc;

use hashlink::LinkedHashMap;
use xmltree::Element;

use crate::xml_utils::inner_xml;

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    Text(Rc<String>),
    // The instance node; its children are the fragment's content.
    Xml(Rc<Element>),
    List(Rc<Vec<TemplateValue>>),
    Struct(Rc<LinkedHashMap<String, TemplateValue>>),
}

impl TemplateValue {
    pub fn text(text: impl Into<String>) -> TemplateValue {
        TemplateValue::Text(Rc::new(text.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TemplateValue::Text(_) => "text",
            TemplateValue::Xml(_) => "xml",
            TemplateValue::List(_) => "list",
            TemplateValue::Struct(_) => "struct",
        }
    }

    pub fn field(&self, name: &str) -> Option<&TemplateValue> {
        match self {
            TemplateValue::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Renders the value for use inside text or an attribute. The error is a reason suitable
    /// for attaching to the formula that asked for the value.
    pub fn render_text(&self) -> Result<String, String> {
        match self {
            TemplateValue::Text(text) => Ok(text.as_ref().clone()),
            TemplateValue::Xml(elem) => inner_xml(elem).map_err(|err| err.to_string()),
            TemplateValue::Struct(fields) => match fields.get("text") {
                Some(text) => text.render_text(),
                None => Err("struct value without a 'text' field cannot be rendered as text".to_string()),
            },
            TemplateValue::List(_) => Err("list value cannot be rendered as text; iterate it with ForEach".to_string()),
        }
    }
}
