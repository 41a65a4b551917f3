//! Batch command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::BatchEntry;
use crate::encode::save_output;
use crate::generator::{BatchJob, Generator};

use super::generate::{default_output_path, resolve_input};
use super::{resolve_template_name, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the batch command
pub fn run_batch(
    generator: &Generator,
    input: &Path,
    out_dir: &Path,
    entries: &[BatchEntry],
) -> ExitCode {
    if entries.is_empty() {
        eprintln!("Error: No templates to generate");
        eprintln!("Pass -t <template> or set [batch] templates in petpet.toml");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let Some(source_path) = resolve_input(input) else {
        eprintln!("Error: Input image not found: {}", input.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    };
    let source = match std::fs::read(&source_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot open input file '{}': {}", source_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let jobs: Vec<BatchJob> = entries
        .iter()
        .map(|entry| BatchJob {
            template: resolve_template_name(generator, &entry.name),
            kind: entry.kind,
            text: entry.text.clone(),
        })
        .collect();

    let outcomes = generator.generate_batch(&source, &jobs);
    let stem_source = out_dir.join(source_path.file_name().unwrap_or(source_path.as_os_str()));

    let mut succeeded = 0;
    for outcome in &outcomes {
        let job = &outcome.job;
        let generated = match &outcome.result {
            Ok(generated) => generated,
            Err(e) => {
                eprintln!("  FAIL {}: {}", job.template, e);
                continue;
            }
        };
        let path =
            default_output_path(&stem_source, &job.template, job.text.as_deref(), generated.kind);
        match save_output(&generated.bytes, &path) {
            Ok(()) => {
                succeeded += 1;
                println!("  ok   {} -> {}", job.template, path.display());
            }
            Err(e) => eprintln!("  FAIL {}: Failed to save '{}': {}", job.template, path.display(), e),
        }
    }

    println!("Generated {}/{} template(s) into {}", succeeded, outcomes.len(), out_dir.display());
    if succeeded == outcomes.len() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
