// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{fs, io, path::Path};

use super::*;
use crate::parser::Parser;

macro_rules! testlist {
    ($($name:ident,)*) => {
    $(
        #[test]
        fn $name() {
            run_test(stringify!($name))
        }
    )*
    }
}

testlist! {
    greet,
    nested_templates,
    instance_in_param,
    for_each_posts,
    for_each_empty,
    match_value,
    unregistered_tags,
    deferred_placeholder,
    empty_elements,
    error_duplicate_template,
    error_missing_param,
    error_not_a_page,
    error_recursion,
    error_unknown_param,
    error_validation,
}

fn run_test(name: &str) {
    let rootdir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let test_data_dir = rootdir.join("src/process_template/tests/testdata");

    let test_file = test_data_dir.join(format!("tests/{}.txt", name));
    let test_templates_file = test_data_dir.join(format!("tests/{}-templates.txt", name));
    let expected_file = test_data_dir.join(format!("expected/{}.txt", name));
    let actual_dir = test_data_dir.join("actual");
    let actual_file = actual_dir.join(format!("{}.txt", name));

    let test = fs::read_to_string(&test_file).unwrap();
    let test_templates = fs::read_to_string(&test_templates_file);
    let test_templates = match test_templates {
        Ok(test_templates) => test_templates,
        Err(err) if err.kind() == io::ErrorKind::NotFound => "<templates/>".to_string(),
        _ => test_templates.unwrap(),
    };

    let result = process_test(&test, &test_templates);
    let actual = format_result(result);

    fs::create_dir_all(actual_dir).unwrap();
    fs::write(actual_file, &actual).unwrap();

    let expected = fs::read_to_string(expected_file).unwrap();
    pretty_assertions::assert_eq!(expected, actual);
}

fn process_test(page: &str, templates: &str) -> Result<String, TemplateError> {
    let mut registry = TemplateRegistry::new();
    for template in Parser::new().parse("test.template.xml", templates.trim())? {
        registry.register(template)?;
    }

    let ctx = SiteContext::new("src", "www");
    process_page_str(page.trim(), &registry, &ctx, false)
}

fn format_result(result: Result<String, TemplateError>) -> String {
    let mut string = String::new();

    string.push_str("ERROR: ");

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            string.push_str(&err.to_string());
            string.push('\n');
            return string;
        }
    };

    string.push_str("<None>\n");
    string.push_str("OUTPUT:\n");
    string.push_str(&output);
    string.push('\n');

    string
}

#[test]
fn output_is_deterministic() {
    let templates = r#"<template name="greet"><param name="name" type="text"/><content><p>Hello, {{name}}!</p></content></template>"#;
    let page = "<page><html><body><greet><name>World</name></greet></body></html></page>";
    let first = process_test(page, templates).unwrap();
    let second = process_test(page, templates).unwrap();
    assert_eq!(first, second);
}

#[test]
fn indented_output_has_no_xml_declaration() {
    let mut registry = TemplateRegistry::new();
    for template in Parser::new()
        .parse(
            "test.template.xml",
            r#"<template name="greet"><param name="name" type="text"/><content><p>Hello, {{name}}!</p></content></template>"#,
        )
        .unwrap()
    {
        registry.register(template).unwrap();
    }
    let ctx = SiteContext::new("src", "www");
    let html = process_page_str(
        "<page><html><body><greet><name>World</name></greet></body></html></page>",
        &registry,
        &ctx,
        true,
    )
    .unwrap();
    assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
    assert!(!html.contains("<?xml"));
    assert!(html.contains("Hello, World!"));
}
