// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::collections::HashMap;

use crate::{error::TemplateError, template::TemplateDefinition};

/// All loaded template definitions, keyed by name. Filled during the load phase and only read
/// while pages are generated.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateDefinition>,
}

impl TemplateRegistry {
    pub fn new() -> TemplateRegistry {
        TemplateRegistry::default()
    }

    pub fn register(&mut self, template: TemplateDefinition) -> Result<(), TemplateError> {
        if self.templates.contains_key(template.name()) {
            return Err(TemplateError::DuplicateTemplate {
                name: template.name().to_string(),
            });
        }
        tracing::info!(template = %template.name(), "registered template");
        self.templates.insert(template.name().to_string(), template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.get(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn load(registry: &mut TemplateRegistry, input: &str) -> Result<(), TemplateError> {
        for template in Parser::new().parse("test.template.xml", input)? {
            registry.register(template)?;
        }
        Ok(())
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = TemplateRegistry::new();
        load(&mut registry, r#"<template name="a"><content>one</content></template>"#).unwrap();
        let err = load(&mut registry, r#"<template name="a"><content>two</content></template>"#).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateTemplate { ref name } if name == "a"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_some());
        assert!(registry.get("b").is_none());
    }
}
