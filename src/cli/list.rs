//! List command implementation

use std::process::ExitCode;

use crate::generator::Generator;
use crate::template::TemplateInfo;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the list command
pub fn run_list(generator: &Generator, json: bool) -> ExitCode {
    let templates = generator.store().list_templates();
    if json {
        return match serde_json::to_string_pretty(&templates) {
            Ok(out) => {
                println!("{}", out);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: Failed to serialize template list: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    if templates.is_empty() {
        println!("No templates found in {}", generator.store().root().display());
        return ExitCode::from(EXIT_SUCCESS);
    }

    println!("Templates ({}):", templates.len());
    for (name, info) in &templates {
        println!("  {}", format_entry(name, info));
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn format_entry(name: &str, info: &TemplateInfo) -> String {
    let mut line = format!("{:<16} {:<9} {:>3} frame(s)", name, info.template_type, info.frame_count);
    if info.has_text {
        line.push_str("  [text]");
    }
    if !info.aliases.is_empty() {
        line.push_str(&format!("  aliases: {}", info.aliases.join(", ")));
    }
    line
}
