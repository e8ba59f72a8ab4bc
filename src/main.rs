//! CLI binary for VEDA video generation

mod cli;

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use veda_rs::orchestrator::GenerationError;
use veda_rs::remote::ConnectError;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("veda=info,veda_rs=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {:#}", error_kind(&e), e);
            ExitCode::FAILURE
        }
    }
}

fn error_kind(e: &anyhow::Error) -> &'static str {
    if let Some(e) = e.downcast_ref::<GenerationError>() {
        e.kind()
    } else if let Some(e) = e.downcast_ref::<ConnectError>() {
        e.kind()
    } else {
        "error"
    }
}
