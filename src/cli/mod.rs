//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod batch;
mod generate;
mod list;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides};
use crate::generator::Generator;
use crate::logging::init_logging;
use crate::models::OutputKind;
use crate::template::TemplateStore;

pub use generate::{default_output_path, resolve_input};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// petpet - Generate memes by compositing an avatar into templates
#[derive(Parser)]
#[command(name = "petpet")]
#[command(about = "petpet - Composite an avatar into meme templates and export PNG or GIF")]
#[command(version)]
pub struct Cli {
    /// Path to petpet.toml (default: discovered from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Templates root directory (overrides the config file)
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Log filter such as "debug" or "petpet=trace" (RUST_LOG wins)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one meme from a template
    Generate {
        /// Source image, or a base name probed against common image extensions
        input: PathBuf,

        /// Template name or alias
        template: String,

        /// Output file (default: {input}_{template}[_{text}].png|gif)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text substituted for $txt1 in templates with a text rule
        #[arg(long)]
        text: Option<String>,

        /// Output kind (default: from the -o extension, else the template type)
        #[arg(long, value_enum)]
        kind: Option<OutputKind>,
    },
    /// List available templates
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate many templates from one source image in parallel
    Batch {
        /// Source image, or a base name probed against common image extensions
        input: PathBuf,

        /// Output directory (default: [output] dir from petpet.toml)
        #[arg(short = 'd', long)]
        dir: Option<PathBuf>,

        /// Templates to generate (default: [batch] templates from petpet.toml)
        #[arg(id = "template", short, long = "template")]
        templates: Vec<String>,
    },
}

/// Parse arguments, load configuration and dispatch.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let batch_templates = match &cli.command {
        Commands::Batch { templates, .. } if !templates.is_empty() => Some(templates.clone()),
        _ => None,
    };
    let out_dir = match &cli.command {
        Commands::Batch { dir, .. } => dir.clone(),
        _ => None,
    };
    let overrides =
        CliOverrides { templates: cli.templates, out_dir, log_level: cli.log_level, batch_templates };
    merge_cli_overrides(&mut config, &overrides);

    init_logging(&config.logging);

    if !config.templates.root.is_dir() {
        eprintln!("Error: Templates directory not found: {}", config.templates.root.display());
        eprintln!("Set [templates] root in petpet.toml or pass --templates");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut store = TemplateStore::new(&config.templates.root);
    if config.templates.cache {
        store = store.with_cache();
    }
    let generator = Generator::with_store(store);

    match cli.command {
        Commands::Generate { input, template, output, text, kind } => generate::run_generate(
            &generator,
            &input,
            &template,
            output.as_deref(),
            text.as_deref(),
            kind,
        ),
        Commands::List { json } => list::run_list(&generator, json),
        Commands::Batch { input, .. } => {
            batch::run_batch(&generator, &input, &config.output.dir, &config.batch.templates)
        }
    }
}

/// Map a template name or alias to a template directory name.
pub(crate) fn resolve_template_name(generator: &Generator, name: &str) -> String {
    generator.store().find_by_alias(name).unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_args() {
        let cli = Cli::try_parse_from([
            "petpet", "--templates", "/t", "generate", "me", "petpet", "--text", "hi", "--kind",
            "static",
        ])
        .unwrap();
        assert_eq!(cli.templates, Some(PathBuf::from("/t")));
        match cli.command {
            Commands::Generate { input, template, output, text, kind } => {
                assert_eq!(input, PathBuf::from("me"));
                assert_eq!(template, "petpet");
                assert_eq!(output, None);
                assert_eq!(text.as_deref(), Some("hi"));
                assert_eq!(kind, Some(OutputKind::Static));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_batch_templates() {
        let cli =
            Cli::try_parse_from(["petpet", "batch", "me.png", "-t", "pat", "-t", "kiss", "-d", "out"])
                .unwrap();
        match cli.command {
            Commands::Batch { dir, templates, .. } => {
                assert_eq!(dir, Some(PathBuf::from("out")));
                assert_eq!(templates, vec!["pat", "kiss"]);
            }
            _ => panic!("expected batch"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["petpet", "generate", "a", "b", "--kind", "video"]).is_err());
    }
}
