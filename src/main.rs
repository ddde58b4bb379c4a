mod cli;

use chartroom::{ChartError, ErrorKind};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = cli::Cli::parse();
    match cli::run(args) {
        Ok(response) => {
            println!("{}", response);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let usage = err
                .downcast_ref::<ChartError>()
                .is_some_and(|e| e.kind() == ErrorKind::Configuration);
            if usage {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
