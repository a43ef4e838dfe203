// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::collections::HashMap;

use crate::template_value::TemplateValue;

/// Name to value mapping seen by formulas and actions during one template application.
pub struct Bindings {
    scopes: Vec<Scope>,
}

struct Scope {
    pub variables: HashMap<String, TemplateValue>,
}

impl Bindings {
    pub fn new(variables: HashMap<String, TemplateValue>) -> Bindings {
        Bindings {
            scopes: vec![Scope { variables }],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope {
            variables: HashMap::new(),
        });
    }

    /// Drops the innermost scope. The scope holding the template's parameters is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: TemplateValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.variables.insert(name.into(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.scopes.iter().rev().find_map(|scope| scope.variables.get(name))
    }

    /// Resolves a dotted variable path, descending into struct fields after the first segment.
    pub fn lookup(&self, path: &[String]) -> Option<&TemplateValue> {
        let (first, rest) = path.split_first()?;
        let mut value = self.get(first)?;
        for segment in rest {
            value = value.field(segment)?;
        }
        Some(value)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
