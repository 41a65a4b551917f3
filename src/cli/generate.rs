//! Generate command implementation and input/output path helpers

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::encode::save_output;
use crate::generator::{GenerateRequest, Generator};
use crate::models::OutputKind;

use super::{resolve_template_name, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Extensions tried, in order, when the input has none
const INPUT_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "webp", "bmp", "gif", "tiff"];

/// Find the source image for a CLI input argument.
///
/// An existing path is used as is. A path without extension is probed
/// against common image extensions.
pub fn resolve_input(input: &Path) -> Option<PathBuf> {
    if input.is_file() {
        return Some(input.to_path_buf());
    }
    if input.extension().is_some() {
        return None;
    }
    INPUT_EXTENSIONS.iter().map(|ext| input.with_extension(ext)).find(|p| p.is_file())
}

/// Default output path: `{stem}_{template}[_{text}].{png|gif}` next to the input.
///
/// Path separators in `text` are replaced so the name stays a single file.
pub fn default_output_path(
    input: &Path,
    template: &str,
    text: Option<&str>,
    kind: OutputKind,
) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let mut name = format!("{}_{}", stem, template);
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        name.push('_');
        name.extend(text.chars().map(|c| if c == '/' || c == '\\' { '_' } else { c }));
    }
    name.push('.');
    name.push_str(kind.extension());

    let parent = input.parent().unwrap_or(Path::new(""));
    if parent.as_os_str().is_empty() {
        PathBuf::from(name)
    } else {
        parent.join(name)
    }
}

/// Execute the generate command
pub fn run_generate(
    generator: &Generator,
    input: &Path,
    template: &str,
    output: Option<&Path>,
    text: Option<&str>,
    kind: Option<OutputKind>,
) -> ExitCode {
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

    let template = resolve_template_name(generator, template);
    let kind = match (kind, output) {
        (Some(kind), _) => kind,
        (None, Some(path)) => OutputKind::from_extension(path),
        (None, None) => match generator.natural_kind(&template) {
            Ok(kind) => kind,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
    };

    let request = GenerateRequest { source: &source, template: &template, text, kind };
    let generated = match generator.generate(&request) {
        Ok(generated) => generated,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for warning in &generated.warnings {
        eprintln!("Warning: {}", warning);
    }

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(&source_path, &template, text, kind));
    if let Err(e) = save_output(&generated.bytes, &output_path) {
        eprintln!("Error: Failed to save '{}': {}", output_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Saved: {}", output_path.display());
    ExitCode::from(EXIT_SUCCESS)
}
