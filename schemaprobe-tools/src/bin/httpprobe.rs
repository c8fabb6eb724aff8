//! Send one HTTP request and print the raw response.
//!
//! Exit codes: 0 when any HTTP response arrives, 1 on transport failure,
//! 3 for invalid arguments.

use clap::Parser;
use clap::error::ErrorKind;
use schemaprobe_core::logging::init_logging;
use schemaprobe_tools::error::{EXIT_ARGUMENTS, EXIT_SUCCESS};
use schemaprobe_tools::httpprobe::{ProbeRequest, parse_header, send};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "httpprobe")]
#[command(about = "Send one HTTP request and print the raw response")]
#[command(version)]
struct Cli {
    /// Target URL
    #[arg(short, long)]
    url: String,

    /// Request body; JSON bodies are sent as application/json
    #[arg(short, long)]
    body: Option<String>,

    /// HTTP method [default: POST with a body, GET otherwise]
    #[arg(short = 'X', long)]
    method: Option<String>,

    /// Extra header, e.g. 'Authorization: Bearer ...' (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Request timeout in seconds
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
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
        eprintln!("httpprobe: {e}");
        return ExitCode::from(EXIT_ARGUMENTS);
    }

    let headers = match cli
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(headers) => headers,
        Err(e) => {
            eprintln!("httpprobe: {e}");
            return ExitCode::from(EXIT_ARGUMENTS);
        }
    };

    let request = ProbeRequest {
        url: cli.url,
        method: cli.method,
        body: cli.body,
        headers,
        timeout: Duration::from_secs(cli.timeout),
    };

    match send(&request).await {
        Ok(response) => {
            println!("{response}");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("httpprobe: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
