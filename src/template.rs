// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::collections::HashMap;

use hashlink::LinkedHashMap;
use xmltree::{Element, XMLNode};

use crate::{
    ast::Expr,
    config::SiteContext,
    error::TemplateError,
    interpreter::apply_template,
    params::ParamSpec,
    template_value::TemplateValue,
    xml_utils::{outer_xml, significant_children},
};

/// A named, parameterized content body. Immutable once loaded; every application works on a clone
/// of `content`.
#[derive(Debug)]
pub struct TemplateDefinition {
    name: String,
    params: LinkedHashMap<String, ParamSpec>,
    content: Element,
    formulas: HashMap<String, Expr>,
}

impl TemplateDefinition {
    pub fn new(
        name: String,
        params: LinkedHashMap<String, ParamSpec>,
        content: Element,
        formulas: HashMap<String, Expr>,
    ) -> TemplateDefinition {
        TemplateDefinition {
            name,
            params,
            content,
            formulas,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Element {
        &self.content
    }

    /// The parsed form of a formula found in the content body, keyed by its trimmed text.
    pub fn formula(&self, formula: &str) -> Option<&Expr> {
        self.formulas.get(formula)
    }

    /// Finds the spec describing the value at a dotted variable path. The first segment may name
    /// a top-level param or any spec nested inside one, such as a list's element spec, which is
    /// what a `ForEach` binds its loop variable to.
    pub fn find_spec(&self, path: &[String]) -> Option<&ParamSpec> {
        let (first, rest) = path.split_first()?;
        let mut spec = match self.params.get(first) {
            Some(spec) => spec,
            None => self.params.values().find_map(|spec| spec.find(first))?,
        };
        for segment in rest {
            spec = spec.field(segment)?;
        }
        Some(spec)
    }

    /// Validates every param supplied by an instance and checks that required params are present.
    pub fn bind(&self, instance: &Element, ctx: &SiteContext) -> Result<HashMap<String, TemplateValue>, TemplateError> {
        let mut values = HashMap::new();
        for child in significant_children(instance) {
            let XMLNode::Element(child) = child else {
                return Err(TemplateError::Validation {
                    param: self.name.clone(),
                    type_name: "template".to_string(),
                    reason: "unexpected text in template instance".to_string(),
                    markup: outer_xml(instance),
                });
            };

            let Some(spec) = self.params.get(&child.name) else {
                return Err(TemplateError::UnknownElement {
                    template: self.name.clone(),
                    tag: child.name.clone(),
                    markup: outer_xml(instance),
                });
            };
            if values.contains_key(&spec.name) {
                return Err(TemplateError::Validation {
                    param: spec.name.clone(),
                    type_name: spec.type_name(),
                    reason: "parameter supplied more than once".to_string(),
                    markup: outer_xml(instance),
                });
            }

            let value = spec.validate(child, ctx)?;
            values.insert(spec.name.clone(), value);
        }

        for spec in self.params.values() {
            if spec.required && !values.contains_key(&spec.name) {
                return Err(TemplateError::MissingParameter {
                    template: self.name.clone(),
                    param: spec.name.clone(),
                });
            }
        }

        tracing::debug!(
            template = %self.name,
            params = ?values.keys().collect::<Vec<_>>(),
            "bound template parameters"
        );
        Ok(values)
    }

    /// Expands an instance of this template, returning the expanded `<content>` element whose
    /// children replace the instance.
    pub fn apply(&self, instance: &Element, ctx: &SiteContext) -> Result<Element, TemplateError> {
        apply_template(self, instance, ctx)
    }
}
