// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use xmltree::{Element, XMLNode};

use crate::{
    config::{join_under_root, SiteContext},
    error::TemplateError,
    params::ParamKind,
    template_value::TemplateValue,
    xml_utils::outer_xml,
};

use super::interpreter_run::{format_bool, InterpreterRun};

const DEFAULT_INDEX_NAME: &str = "__iter";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    ForEach,
    Match,
}

impl Action {
    pub fn from_tag(tag: &str) -> Option<Action> {
        match tag {
            "ForEach" => Some(Action::ForEach),
            "Match" => Some(Action::Match),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Action::ForEach => "ForEach",
            Action::Match => "Match",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Predicate {
    SrcFileExists,
    SrcDirExists,
    FileExists,
    Get,
}

impl Predicate {
    fn from_name(name: &str) -> Option<Predicate> {
        match name {
            "src-file-exists" => Some(Predicate::SrcFileExists),
            "src-dir-exists" => Some(Predicate::SrcDirExists),
            "file-exists" => Some(Predicate::FileExists),
            "get" => Some(Predicate::Get),
            _ => None,
        }
    }

    fn evaluate(&self, arg: &str, ctx: &SiteContext) -> String {
        let found = match self {
            Predicate::SrcFileExists => join_under_root(&ctx.source_root, arg).is_some_and(|path| path.is_file()),
            Predicate::SrcDirExists => join_under_root(&ctx.source_root, arg).is_some_and(|path| path.is_dir()),
            Predicate::FileExists => join_under_root(&ctx.file_root, arg).is_some_and(|path| path.is_file()),
            Predicate::Get => return arg.to_string(),
        };
        format_bool(found)
    }
}

fn action_error(action: Action, elem: &Element, reason: impl Into<String>) -> TemplateError {
    TemplateError::Action {
        action: action.name(),
        reason: reason.into(),
        markup: outer_xml(elem),
    }
}

impl InterpreterRun<'_> {
    /// Runs one action, returning the nodes that replace it.
    pub fn run_action(&mut self, action: Action, elem: Element) -> Result<Vec<XMLNode>, TemplateError> {
        match action {
            Action::ForEach => self.run_for_each(elem),
            Action::Match => self.run_match(elem),
        }
    }

    fn run_for_each(&mut self, elem: Element) -> Result<Vec<XMLNode>, TemplateError> {
        let def = self.def;
        let Some(list) = elem.attributes.get("list").map(|list| list.trim()) else {
            return Err(action_error(Action::ForEach, &elem, "missing 'list' attribute"));
        };
        let path: Vec<String> = list.split('.').map(|segment| segment.to_string()).collect();
        let index_name = elem
            .attributes
            .get("i")
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());

        let items = match self.bindings.lookup(&path) {
            Some(TemplateValue::List(items)) => items.clone(),
            Some(value) => {
                tracing::debug!(template = %def.name(), list, found = value.type_name(), "ForEach skipped: not a list");
                return Ok(Vec::new());
            }
            None => {
                tracing::debug!(template = %def.name(), list, "ForEach skipped: nothing bound");
                return Ok(Vec::new());
            }
        };

        let element_spec = match def.find_spec(&path).map(|spec| &spec.kind) {
            Some(ParamKind::List(element_spec)) => element_spec,
            Some(_) => {
                return Err(action_error(
                    Action::ForEach,
                    &elem,
                    format!("'{}' holds a list but is not declared as a list parameter", list),
                ))
            }
            None => {
                return Err(action_error(
                    Action::ForEach,
                    &elem,
                    format!("no list parameter named '{}' is declared", list),
                ))
            }
        };

        tracing::debug!(
            template = %def.name(),
            list,
            iterations = items.len(),
            scopes = self.bindings.depth(),
            "ForEach"
        );

        let mut out = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let mut body = Element::new(Action::ForEach.name());
            body.children = elem.children.clone();

            self.bindings.push_scope();
            self.bindings.bind(index_name.as_str(), TemplateValue::text((index + 1).to_string()));
            self.bindings.bind(element_spec.name.as_str(), item.clone());
            let result = self.expand_content(&mut body);
            self.bindings.pop_scope();
            result?;

            out.extend(body.children);
        }

        match elem.attributes.get("html-class") {
            Some(class) => {
                let mut wrapper = Element::new("div");
                wrapper.attributes.insert("class".to_string(), class.clone());
                wrapper.children = out;
                Ok(vec![XMLNode::Element(wrapper)])
            }
            None => Ok(out),
        }
    }

    fn run_match(&mut self, elem: Element) -> Result<Vec<XMLNode>, TemplateError> {
        let key = if let Some(name) = elem.attributes.get("f") {
            let Some(predicate) = Predicate::from_name(name.trim()) else {
                return Err(action_error(
                    Action::Match,
                    &elem,
                    format!("unknown predicate '{}'", name.trim()),
                ));
            };
            let arg = elem.attributes.get("x").map(|arg| arg.trim()).unwrap_or("");
            predicate.evaluate(arg, self.ctx)
        } else if let Some(value) = elem.attributes.get("value") {
            value.trim().to_string()
        } else {
            return Err(action_error(
                Action::Match,
                &elem,
                "requires either an 'f' or a 'value' attribute",
            ));
        };

        tracing::debug!(template = %self.def.name(), key = %key, "Match");

        let mut matched: Option<Element> = None;
        for child in &elem.children {
            let XMLNode::Element(branch) = child else {
                continue;
            };
            if branch.name != key {
                continue;
            }
            if matched.is_some() {
                return Err(action_error(
                    Action::Match,
                    &elem,
                    format!("more than one branch matches '{}'", key),
                ));
            }
            matched = Some(branch.clone());
        }

        match matched {
            Some(mut branch) => {
                self.expand_actions(&mut branch)?;
                Ok(branch.children)
            }
            None => Ok(Vec::new()),
        }
    }
}
