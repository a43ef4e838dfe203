// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

#[cfg(test)]
mod tests;

use std::mem;

use xmltree::{Element, XMLNode};

use crate::{
    config::SiteContext,
    error::TemplateError,
    registry::TemplateRegistry,
    xml_utils::{parse_element, write_html_document},
};

const PAGE_ROOT: &str = "page";

/// Expands a page document and renders it as an HTML document.
pub fn process_page_str(
    page_xml: &str,
    registry: &TemplateRegistry,
    ctx: &SiteContext,
    indent: bool,
) -> Result<String, TemplateError> {
    let page = process_page(page_xml, registry, ctx)?;
    write_html_document(&page, indent)
}

/// Expands every template instance in a page document, returning the expanded `<page>` element.
pub fn process_page(page_xml: &str, registry: &TemplateRegistry, ctx: &SiteContext) -> Result<Element, TemplateError> {
    let mut page = parse_element(page_xml)?;
    if page.name != PAGE_ROOT {
        return Err(TemplateError::Xml(format!(
            "expected a <{}> root element, found <{}>",
            PAGE_ROOT, page.name
        )));
    }

    let mut page_run = PageRun::new(registry, ctx);
    page.children = page_run.expand_children(mem::take(&mut page.children))?;
    Ok(page)
}

struct PageRun<'a> {
    registry: &'a TemplateRegistry,
    ctx: &'a SiteContext,
    // Number of template applications enclosing the current node.
    depth: usize,
}

impl PageRun<'_> {
    fn new<'a>(registry: &'a TemplateRegistry, ctx: &'a SiteContext) -> PageRun<'a> {
        PageRun { registry, ctx, depth: 0 }
    }

    fn expand_children(&mut self, children: Vec<XMLNode>) -> Result<Vec<XMLNode>, TemplateError> {
        let mut expanded = Vec::with_capacity(children.len());
        for child in children {
            match child {
                XMLNode::Element(elem) => expanded.extend(self.expand_element(elem)?),
                other => expanded.push(other),
            }
        }
        Ok(expanded)
    }

    fn expand_element(&mut self, mut elem: Element) -> Result<Vec<XMLNode>, TemplateError> {
        let Some(def) = self.registry.get(&elem.name) else {
            elem.children = self.expand_children(mem::take(&mut elem.children))?;
            return Ok(vec![XMLNode::Element(elem)]);
        };

        if self.depth >= self.ctx.max_depth {
            return Err(TemplateError::RecursionLimit {
                limit: self.ctx.max_depth,
            });
        }

        let content = def.apply(&elem, self.ctx)?;

        // The applied content may hold further instances, including ones passed in through params.
        self.depth += 1;
        let result = self.expand_children(content.children);
        self.depth -= 1;
        result
    }
}
