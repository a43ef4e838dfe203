// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use pretty_assertions::assert_eq;

use super::*;

fn parse(input: &str) -> Result<Vec<TemplateDefinition>, TemplateError> {
    Parser::new().parse("test.template.xml", input)
}

#[test]
fn split_plain_text() {
    assert_eq!(split_placeholders("no markers"), vec![Segment::Literal("no markers")]);
    assert_eq!(split_placeholders(""), vec![]);
}

#[test]
fn split_markers() {
    assert_eq!(
        split_placeholders("Hello, {{ name }}!"),
        vec![
            Segment::Literal("Hello, "),
            Segment::Placeholder {
                raw: "{{ name }}",
                formula: "name"
            },
            Segment::Literal("!"),
        ]
    );
    assert_eq!(
        split_placeholders("{{a}}{{b}}"),
        vec![
            Segment::Placeholder { raw: "{{a}}", formula: "a" },
            Segment::Placeholder { raw: "{{b}}", formula: "b" },
        ]
    );
}

#[test]
fn split_ignores_non_markers() {
    assert_eq!(split_placeholders("{{ }} and {{"), vec![Segment::Literal("{{ }} and {{")]);
    assert_eq!(
        split_placeholders("{{{x}}}"),
        vec![
            Segment::Literal("{"),
            Segment::Placeholder { raw: "{{x}}", formula: "x" },
            Segment::Literal("}"),
        ]
    );
}

#[test]
fn single_template() {
    let templates = parse(
        r#"<template name="greet">
            <param name="name" type="text"/>
            <content><p>Hello, {{name}}!</p></content>
        </template>"#,
    )
    .unwrap();
    assert_eq!(templates.len(), 1);
    let greet = &templates[0];
    assert_eq!(greet.name(), "greet");
    assert!(greet.find_spec(&["name".to_string()]).is_some());
    assert!(greet.formula("name").is_some());
}

#[test]
fn templates_container() {
    let templates = parse(
        r#"<templates>
            <!-- two templates -->
            <template name="a"><content>A</content></template>
            <template name="b"><content>B {{ 1 + 2 }}</content></template>
        </templates>"#,
    )
    .unwrap();
    let names: Vec<&str> = templates.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(templates[1].formula("1 + 2").is_some());
}

#[test]
fn formulas_in_attributes_are_parsed() {
    let templates = parse(
        r#"<template name="link">
            <param name="href" type="text"/>
            <content><a href="{{href}}">go</a></content>
        </template>"#,
    )
    .unwrap();
    assert!(templates[0].formula("href").is_some());
}

#[test]
fn malformed_formula_fails_load() {
    let err = parse(r#"<template name="bad"><content>{{ 1 + }}</content></template>"#).unwrap_err();
    assert!(matches!(err, TemplateError::Expression { .. }));
}

#[test]
fn declaration_errors() {
    let err = parse(r#"<template><content/></template>"#).unwrap_err().to_string();
    assert!(err.contains("missing a 'name' attribute"));

    let err = parse(r#"<template name="a"><param name="x" type="text"/></template>"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("missing <content> element"));

    let err = parse(r#"<template name="a"><content/><content/></template>"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("more than one <content> element"));

    let err = parse(
        r#"<template name="a"><param name="x" type="text"/><param name="x" type="xml"/><content/></template>"#,
    )
    .unwrap_err()
    .to_string();
    assert!(err.contains("duplicate param 'x'"));

    let err = parse(r#"<page/>"#).unwrap_err().to_string();
    assert!(err.contains("root element must be <template> or <templates>"));
}
