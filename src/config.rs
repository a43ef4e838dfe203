// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Error};
use saphyr::{Yaml, YamlLoader};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Root that `file` params and the `file-exists` predicate resolve against. Defaults to the
    /// output directory, since that is where linked files are served from.
    pub file_root: Option<PathBuf>,
    pub template_suffix: String,
    pub page_suffix: String,
    pub max_depth: usize,
    pub indent: bool,
}

/// Read-only view of the configuration used while validating and expanding templates.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteContext {
    pub source_root: PathBuf,
    pub file_root: PathBuf,
    pub max_depth: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("www"),
            file_root: None,
            template_suffix: ".template.xml".to_string(),
            page_suffix: ".page.xml".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            indent: true,
        }
    }
}

impl SiteConfig {
    pub fn load_yaml_file(path: &Path) -> Result<SiteConfig, Error> {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        SiteConfig::from_yaml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<SiteConfig, Error> {
        let docs = YamlLoader::load_from_str(text).map_err(|err| anyhow!("{}", err))?;
        let mut config = SiteConfig::default();
        let doc = match &docs[..] {
            [] => return Ok(config),
            [doc] => doc,
            _ => bail!("config yaml must only have a single document"),
        };

        let Some(entries) = doc.as_hash() else {
            bail!("config yaml must be a map");
        };

        for (key, value) in entries {
            let Some(key) = key.as_str() else {
                bail!("config keys must be strings");
            };
            match key {
                "source" => config.source_dir = PathBuf::from(expect_str(key, value)?),
                "output" => config.output_dir = PathBuf::from(expect_str(key, value)?),
                "files" => config.file_root = Some(PathBuf::from(expect_str(key, value)?)),
                "template-suffix" => config.template_suffix = expect_str(key, value)?.to_string(),
                "page-suffix" => config.page_suffix = expect_str(key, value)?.to_string(),
                "max-depth" => {
                    let depth = value.as_i64().ok_or_else(|| anyhow!("'{}' must be an integer", key))?;
                    config.max_depth = usize::try_from(depth).with_context(|| format!("'{}' must not be negative", key))?;
                }
                "indent" => config.indent = value.as_bool().ok_or_else(|| anyhow!("'{}' must be true or false", key))?,
                _ => bail!("unknown config key '{}'", key),
            }
        }

        Ok(config)
    }

    pub fn file_root(&self) -> &Path {
        self.file_root.as_deref().unwrap_or(&self.output_dir)
    }

    pub fn context(&self) -> SiteContext {
        SiteContext {
            max_depth: self.max_depth,
            ..SiteContext::new(&self.source_dir, self.file_root())
        }
    }
}

impl SiteContext {
    pub fn new(source_root: impl Into<PathBuf>, file_root: impl Into<PathBuf>) -> SiteContext {
        SiteContext {
            source_root: source_root.into(),
            file_root: file_root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Joins a site-relative path onto `root`. Leading separators are ignored. Paths that would climb
/// out of `root` give `None`.
pub fn join_under_root(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    let confined = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    confined.then(|| root.join(relative))
}

fn expect_str<'a>(key: &str, value: &'a Yaml) -> Result<&'a str, Error> {
    value.as_str().ok_or_else(|| anyhow!("'{}' must be a string", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_stays_under_root() {
        let root = Path::new("www");
        assert_eq!(join_under_root(root, "/img/cat.png"), Some(PathBuf::from("www/img/cat.png")));
        assert_eq!(join_under_root(root, "./a"), Some(PathBuf::from("www/./a")));
        assert_eq!(join_under_root(root, "../secret"), None);
        assert_eq!(join_under_root(root, "img/../../secret"), None);
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = SiteConfig::from_yaml_str("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.file_root(), Path::new("www"));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let config = SiteConfig::from_yaml_str("source: site\noutput: public\nmax-depth: 8\nindent: false\n").unwrap();
        assert_eq!(config.source_dir, PathBuf::from("site"));
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.max_depth, 8);
        assert!(!config.indent);
        assert_eq!(config.context().file_root, PathBuf::from("public"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = SiteConfig::from_yaml_str("sauce: site\n").unwrap_err();
        assert!(err.to_string().contains("unknown config key 'sauce'"));
    }

    #[test]
    fn multiple_documents_are_rejected() {
        assert!(SiteConfig::from_yaml_str("source: a\n---\nsource: b\n").is_err());
    }
}
