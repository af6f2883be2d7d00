use clap::Parser;
use fetch_stage::cli::{self, Args};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::run(Args::parse()).await
}
