use std::env;
use std::fs::File;
use std::io;
use std::process::ExitCode;

use loan_eng::csv::{read_commands, write_loans};
use loan_eng::{Engine, EngineConfig};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        error!("usage: loan-eng <commands.csv>");
        return ExitCode::FAILURE;
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            error!(path, "failed to open input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = Engine::with_config(config);
    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in read_commands(file) {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    engine.run(ReceiverStream::new(command_receiver)).await;

    if let Err(e) = write_loans(io::stdout().lock(), engine.loans()) {
        error!("failed to write loans: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
