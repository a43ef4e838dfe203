// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// A `<param>` or `<template>` declaration is malformed.
    #[error("invalid declaration '{name}': {reason}")]
    Schema { name: String, reason: String },

    /// Instance content does not satisfy its parameter spec.
    #[error("failed to parse parameter '{param}/{type_name}': {reason}\n{markup}")]
    Validation {
        param: String,
        type_name: String,
        reason: String,
        markup: String,
    },

    #[error("unknown element <{tag}> in instance of template '{template}'\n{markup}")]
    UnknownElement {
        template: String,
        tag: String,
        markup: String,
    },

    #[error("missing required parameter '{param}' for template '{template}'")]
    MissingParameter { template: String, param: String },

    #[error("invalid formula '{formula}': {reason}")]
    Expression { formula: String, reason: String },

    #[error("template '{name}' is already registered")]
    DuplicateTemplate { name: String },

    #[error("{action} failed: {reason}\n{markup}")]
    Action {
        action: &'static str,
        reason: String,
        markup: String,
    },

    #[error("template expansion exceeded the depth limit of {limit} (is a template instantiating itself?)")]
    RecursionLimit { limit: usize },

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl TemplateError {
    pub fn schema(name: &str, reason: impl Into<String>) -> TemplateError {
        TemplateError::Schema {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn expression(formula: &str, reason: impl Into<String>) -> TemplateError {
        TemplateError::Expression {
            formula: formula.to_string(),
            reason: reason.into(),
        }
    }
}
