//! Replace text in a single file.
//!
//! Exit codes: 0 replaced, 1 I/O failure, 2 pattern not found, 3 invalid
//! arguments.

use clap::Parser;
use clap::error::ErrorKind;
use schemaprobe_core::logging::init_logging;
use schemaprobe_tools::error::{EXIT_ARGUMENTS, EXIT_SUCCESS};
use schemaprobe_tools::textpatch::{PatchRequest, apply};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "textpatch")]
#[command(about = "Find and replace text in one file")]
#[command(version)]
struct Cli {
    /// File to patch
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    /// Text to look for
    #[arg(short, long)]
    pattern: String,

    /// Replacement text
    #[arg(short, long)]
    replacement: String,

    /// Treat the pattern as a regular expression ($1 expands captures)
    #[arg(long)]
    regex: bool,

    /// Report the number of matches without writing
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
                _ => EXIT_ARGUMENTS,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = init_logging(cli.verbose, false) {
        eprintln!("textpatch: {e}");
        return ExitCode::from(EXIT_ARGUMENTS);
    }

    let request = PatchRequest {
        file: cli.file,
        pattern: cli.pattern,
        replacement: cli.replacement,
        regex: cli.regex,
        dry_run: cli.dry_run,
    };

    match apply(&request) {
        Ok(outcome) => {
            println!("{}: {} replacement(s)", request.file.display(), outcome.replacements);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("textpatch: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
