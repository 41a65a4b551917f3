//! petpet - Command-line tool for generating memes from templates

use std::process::ExitCode;

use petpet::cli;

fn main() -> ExitCode {
    cli::run()
}
