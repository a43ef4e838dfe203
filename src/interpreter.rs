// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

mod actions;
mod interpreter_run;


use xmltree::{Element, XMLNode};

use crate::{
    config::SiteContext,
    error::TemplateError,
    parser::{split_placeholders, Segment},
    template::TemplateDefinition,
};

use interpreter_run::InterpreterRun;

/// Validates an instance's params, then expands a fresh copy of the definition's content with them.
pub fn apply_template(
    def: &TemplateDefinition,
    instance: &Element,
    ctx: &SiteContext,
) -> Result<Element, TemplateError> {
    let values = def.bind(instance, ctx)?;
    let mut interpreter_run = InterpreterRun::new(def, ctx, values);
    let mut content = def.content().clone();
    interpreter_run.expand_content(&mut content)?;
    warn_unresolved(def.name(), &content);
    Ok(content)
}

fn warn_unresolved(template: &str, elem: &Element) {
    for value in elem.attributes.values() {
        warn_unresolved_in(template, value);
    }
    for child in &elem.children {
        match child {
            XMLNode::Element(child) => warn_unresolved(template, child),
            XMLNode::Text(text) | XMLNode::CData(text) => warn_unresolved_in(template, text),
            XMLNode::Comment(_) | XMLNode::ProcessingInstruction(..) => {}
        }
    }
}

fn warn_unresolved_in(template: &str, text: &str) {
    for segment in split_placeholders(text) {
        if let Segment::Placeholder { raw, .. } = segment {
            tracing::warn!(template, placeholder = raw, "placeholder left unresolved");
        }
    }
}
