// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use pulldown_cmark::{html, Options, Parser};

/// Renders markdown to an HTML string. Text embedded in XML is usually indented to match the
/// surrounding markup, so the common leading indentation is removed first; otherwise every
/// paragraph would be read as a code block.
pub fn markdown_to_html(markdown: &str) -> String {
    let source = textwrap::dedent(markdown);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(&source, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}
