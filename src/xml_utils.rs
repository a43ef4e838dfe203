// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::TemplateError;

const FRAGMENT_ROOT: &str = "fragment";

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

pub fn parse_element(input: &str) -> Result<Element, TemplateError> {
    Element::parse(input.as_bytes()).map_err(|err| TemplateError::Xml(err.to_string()))
}

/// Parses markup that may hold any number of sibling nodes, returning them under a synthetic root.
pub fn parse_fragment(markup: &str) -> Result<Element, TemplateError> {
    parse_element(&format!("<{0}>{1}</{0}>", FRAGMENT_ROOT, markup))
}

/// Comments and whitespace-only text carry no content.
pub fn is_insignificant(node: &XMLNode) -> bool {
    match node {
        XMLNode::Comment(_) => true,
        XMLNode::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

pub fn significant_children(elem: &Element) -> impl Iterator<Item = &XMLNode> {
    elem.children.iter().filter(|node| !is_insignificant(node))
}

pub fn outer_xml(elem: &Element) -> String {
    let mut out = String::new();
    // Diagnostics only: fall back to the tag name when the tree cannot be written.
    if write_node(&mut out, &XMLNode::Element(elem.clone()), compact_config()).is_err() {
        out = format!("<{} ...>", elem.name);
    }
    out
}

pub fn inner_xml(elem: &Element) -> Result<String, TemplateError> {
    let mut out = String::new();
    for child in &elem.children {
        write_node(&mut out, child, compact_config())?;
    }
    Ok(out)
}

/// Writes the children of a generated `<page>` as an HTML5 document.
pub fn write_html_document(page: &Element, indent: bool) -> Result<String, TemplateError> {
    let config = compact_config().perform_indent(indent);

    let mut out = String::from("<!DOCTYPE html>\n");
    for child in &page.children {
        let mut child = child.clone();
        if let XMLNode::Element(elem) = &mut child {
            close_non_void_elements(elem);
        }
        write_node(&mut out, &child, config.clone())?;
        if indent {
            out.push('\n');
        }
    }
    Ok(out)
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn compact_config() -> EmitterConfig {
    EmitterConfig::new()
        .perform_indent(false)
        .write_document_declaration(false)
}

fn write_node(out: &mut String, node: &XMLNode, config: EmitterConfig) -> Result<(), TemplateError> {
    match node {
        XMLNode::Element(elem) => {
            let mut buf = Vec::new();
            elem.write_with_config(&mut buf, config)
                .map_err(|err| TemplateError::Xml(err.to_string()))?;
            let text = String::from_utf8(buf).map_err(|err| TemplateError::Xml(err.to_string()))?;
            out.push_str(&text);
        }
        XMLNode::Text(text) => out.push_str(&escape_text(text)),
        XMLNode::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        XMLNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XMLNode::ProcessingInstruction(..) => {}
    }
    Ok(())
}

// XML writers self-close every empty element, but only void elements may be self-closed in HTML.
// An empty text child forces an explicit end tag.
fn close_non_void_elements(elem: &mut Element) {
    if elem.children.is_empty() {
        if !HTML_VOID_ELEMENTS.contains(&elem.name.to_ascii_lowercase().as_str()) {
            elem.children.push(XMLNode::Text(String::new()));
        }
        return;
    }
    for child in &mut elem.children {
        if let XMLNode::Element(child) = child {
            close_non_void_elements(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_xml_keeps_markup() {
        let elem = parse_element("<body>Hello <b>there</b></body>").unwrap();
        assert_eq!(inner_xml(&elem).unwrap(), "Hello <b>there</b>");
    }

    #[test]
    fn fragment_holds_siblings() {
        let fragment = parse_fragment("<p>one</p><p>two</p>").unwrap();
        assert_eq!(fragment.children.len(), 2);
    }

    #[test]
    fn document_starts_with_doctype() {
        let page = parse_element("<page><html><body><p>Hi</p></body></html></page>").unwrap();
        let html = write_html_document(&page, true).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(!html.contains("<?xml"));
    }

    #[test]
    fn empty_elements_keep_end_tag() {
        let page = parse_element("<page><div><script src=\"a.js\"></script><br/></div></page>").unwrap();
        let html = write_html_document(&page, false).unwrap();
        assert!(html.contains("<script src=\"a.js\"></script>"));
        assert!(html.contains("<br />"));
    }
}
