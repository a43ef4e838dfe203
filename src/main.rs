// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

mod ast;
mod bindings;
mod config;
mod error;
mod interpreter;
mod markdown;
mod params;
mod parser;
mod process_template;
mod registry;
mod site;
mod template;
mod template_value;
mod xml_utils;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Error;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use config::SiteConfig;
use site::build_site;

fn main() -> ExitCode {
    let matches = Command::new("xmlsite")
        .about("Builds static HTML pages from XML page and template files")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("YAML site configuration"),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding template and page files [default: src]"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory the HTML pages are written to [default: www]"),
        )
        .arg(
            Arg::new("files")
                .long("files")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Root that file params are checked against [default: the output directory]"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Maximum nesting of template expansions"),
        )
        .arg(
            Arg::new("compact")
                .long("compact")
                .action(ArgAction::SetTrue)
                .help("Write pages without indentation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug output unless RUST_LOG is set"),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(matches: &ArgMatches) -> Result<bool, Error> {
    let config = load_config(matches)?;
    let report = build_site(&config)?;
    Ok(report.failures == 0)
}

fn load_config(matches: &ArgMatches) -> Result<SiteConfig, Error> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SiteConfig::load_yaml_file(path)?,
        None => SiteConfig::default(),
    };

    if let Some(source) = matches.get_one::<PathBuf>("source") {
        config.source_dir = source.clone();
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.output_dir = output.clone();
    }
    if let Some(files) = matches.get_one::<PathBuf>("files") {
        config.file_root = Some(files.clone());
    }
    if let Some(max_depth) = matches.get_one::<usize>("max-depth") {
        config.max_depth = *max_depth;
    }
    if matches.get_flag("compact") {
        config.indent = false;
    }

    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
