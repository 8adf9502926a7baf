use clap::Parser;
use std::process::ExitCode;

use repolint::{Cli, Output, exit_code};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(cli.verbose > 0, cli.quiet);

    let code = match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            output.error(&format!("{e:#}"));
            exit_code::TOOL_FAILURE
        }
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
