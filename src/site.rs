// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Error};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{
    config::{SiteConfig, SiteContext},
    error::TemplateError,
    parser::Parser,
    process_template::process_page_str,
    registry::TemplateRegistry,
};

const OUTPUT_EXTENSION: &str = "html";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub templates: usize,
    pub pages: usize,
    pub failures: usize,
}

/// Loads every template under the source directory, then generates every page. A file that fails
/// is logged and counted; the rest of the batch still runs.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport, Error> {
    if !config.source_dir.is_dir() {
        bail!("source directory {} does not exist", config.source_dir.display());
    }

    let ctx = config.context();
    let mut report = BuildReport::default();

    let parser = Parser::new();
    let mut registry = TemplateRegistry::new();
    for path in find_files(&config.source_dir, &config.template_suffix)? {
        if let Err(err) = load_templates(&parser, &path, &mut registry) {
            tracing::error!(file = %path.display(), "{:#}", err);
            report.failures += 1;
        }
    }
    report.templates = registry.len();
    if registry.is_empty() {
        tracing::warn!(source = %config.source_dir.display(), "no templates were loaded");
    }

    for path in find_files(&config.source_dir, &config.page_suffix)? {
        match generate_page(config, &ctx, &registry, &path) {
            Ok(out_path) => {
                tracing::info!(page = %path.display(), output = %out_path.display(), "wrote page");
                report.pages += 1;
            }
            Err(err) => {
                tracing::error!(file = %path.display(), "{:#}", err);
                report.failures += 1;
            }
        }
    }

    tracing::info!(
        templates = report.templates,
        pages = report.pages,
        failures = report.failures,
        "build finished"
    );
    Ok(report)
}

fn load_templates(parser: &Parser, path: &Path, registry: &mut TemplateRegistry) -> Result<(), Error> {
    tracing::info!(file = %path.display(), "reading templates");
    let input = read_source(path)?;
    let filename = path.to_string_lossy();
    let templates = parser
        .parse(&filename, &input)
        .with_context(|| format!("failed to load {}", path.display()))?;

    for template in templates {
        registry
            .register(template)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }
    Ok(())
}

fn generate_page(
    config: &SiteConfig,
    ctx: &SiteContext,
    registry: &TemplateRegistry,
    path: &Path,
) -> Result<PathBuf, Error> {
    let input = read_source(path)?;
    let html = process_page_str(&input, registry, ctx, config.indent)
        .with_context(|| format!("failed to generate {}", path.display()))?;

    let out_path = output_path(config, path)?;
    write_atomic(&out_path, &html)?;
    Ok(out_path)
}

fn read_source(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Files under `root` whose names end with `suffix`, in a stable order.
fn find_files(root: &Path, suffix: &str) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.len() > suffix.len() && name.ends_with(suffix));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Mirrors a page's path under the source directory into the output directory.
pub fn output_path(config: &SiteConfig, page_path: &Path) -> Result<PathBuf, Error> {
    let relative = page_path.strip_prefix(&config.source_dir).with_context(|| {
        format!(
            "{} is not under the source directory {}",
            page_path.display(),
            config.source_dir.display()
        )
    })?;

    let file_name = relative
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid page file name {}", page_path.display()))?;
    let stem = file_name
        .strip_suffix(config.page_suffix.as_str())
        .ok_or_else(|| anyhow!("{} does not end with {}", page_path.display(), config.page_suffix))?;

    let mut out_path = config.output_dir.join(relative);
    out_path.set_file_name(format!("{}.{}", stem, OUTPUT_EXTENSION));
    Ok(out_path)
}

/// Writes `contents` to a temporary file beside `path` and then renames it into place, so a
/// failed write never leaves a truncated page behind.
fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("output path {} has no parent directory", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;

    let mut temp_file =
        NamedTempFile::new_in(parent).with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    temp_file
        .write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    temp_file
        .persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const GREET: &str = r#"<template name="greet"><param name="name" type="text"/><content><p>Hello, {{name}}!</p></content></template>"#;

    struct Site {
        _dir: TempDir,
        config: SiteConfig,
    }

    impl Site {
        fn new() -> Site {
            let dir = tempfile::tempdir().unwrap();
            let config = SiteConfig {
                source_dir: dir.path().join("src"),
                output_dir: dir.path().join("www"),
                indent: false,
                ..SiteConfig::default()
            };
            fs::create_dir_all(&config.source_dir).unwrap();
            Site { _dir: dir, config }
        }

        fn write_source(&self, relative: &str, contents: &str) {
            let path = self.config.source_dir.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        fn read_output(&self, relative: &str) -> String {
            fs::read_to_string(self.config.output_dir.join(relative)).unwrap()
        }
    }

    #[test]
    fn pages_mirror_the_source_tree() {
        let site = Site::new();
        site.write_source("templates/greet.template.xml", GREET);
        site.write_source("index.page.xml", "<page><greet><name>World</name></greet></page>");
        site.write_source("blog/first.page.xml", "<page><div><greet><name>Blog</name></greet></div></page>");

        let report = build_site(&site.config).unwrap();
        assert_eq!(
            report,
            BuildReport {
                templates: 1,
                pages: 2,
                failures: 0
            }
        );
        assert_eq!(site.read_output("index.html"), "<!DOCTYPE html>\n<p>Hello, World!</p>");
        assert_eq!(
            site.read_output("blog/first.html"),
            "<!DOCTYPE html>\n<div><p>Hello, Blog!</p></div>"
        );
    }

    #[test]
    fn failed_page_keeps_previous_output() {
        let site = Site::new();
        site.write_source("greet.template.xml", GREET);
        site.write_source("good.page.xml", "<page><greet><name>World</name></greet></page>");
        site.write_source("bad.page.xml", "<page><greet/></page>");
        fs::create_dir_all(&site.config.output_dir).unwrap();
        fs::write(site.config.output_dir.join("bad.html"), "old").unwrap();

        let report = build_site(&site.config).unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(report.failures, 1);
        assert_eq!(site.read_output("bad.html"), "old");
        assert!(site.read_output("good.html").contains("Hello, World!"));
    }

    #[test]
    fn failed_template_file_does_not_stop_the_build() {
        let site = Site::new();
        site.write_source("a.template.xml", "<template name=\"broken\"><content>{{ 1 + }}</content></template>");
        site.write_source("b.template.xml", GREET);
        site.write_source("index.page.xml", "<page><greet><name>World</name></greet></page>");

        let report = build_site(&site.config).unwrap();
        assert_eq!(report.templates, 1);
        assert_eq!(report.pages, 1);
        assert_eq!(report.failures, 1);
    }

    #[test]
    fn file_params_resolve_against_the_output_tree() {
        let site = Site::new();
        site.write_source(
            "image.template.xml",
            r#"<template name="image"><param name="src" type="text,file"/><content><img src="{{src}}"/></content></template>"#,
        );
        site.write_source("index.page.xml", "<page><image><src>img/cat.png</src></image></page>");
        fs::create_dir_all(site.config.output_dir.join("img")).unwrap();
        fs::write(site.config.output_dir.join("img/cat.png"), b"png").unwrap();

        let report = build_site(&site.config).unwrap();
        assert_eq!(report.failures, 0);
        assert_eq!(site.read_output("index.html"), "<!DOCTYPE html>\n<img src=\"/img/cat.png\" />");
    }

    #[test]
    fn output_path_replaces_page_suffix() {
        let config = SiteConfig::default();
        let out = output_path(&config, Path::new("src/blog/post.page.xml")).unwrap();
        assert_eq!(out, Path::new("www/blog/post.html"));
        assert!(output_path(&config, Path::new("other/post.page.xml")).is_err());
    }

    #[test]
    fn missing_source_directory_is_an_error() {
        let config = SiteConfig {
            source_dir: PathBuf::from("does/not/exist"),
            ..SiteConfig::default()
        };
        assert!(build_site(&config).is_err());
    }
}
