use std::process::ExitCode;
use std::sync::Arc;

use cli::{exercise, load_config};
use pseudodev::{Devices, FdTable};
use tracing::{error, info};

const USAGE: &str = "usage: cli [--config <file.json>] <minor> <message>";

struct Args {
    config_path: Option<String>,
    minor: usize,
    message: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut config_path = None;
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = Some(args.next().ok_or("--config needs a file name")?);
        } else {
            positional.push(arg);
        }
    }

    let [minor, message] = <[String; 2]>::try_from(positional)
        .map_err(|_| "expected exactly <minor> and <message>".to_string())?;
    let minor = minor
        .parse::<usize>()
        .map_err(|e| format!("bad minor index {minor:?}: {e}"))?;
    Ok(Args {
        config_path,
        minor,
        message,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let json = match args.config_path.as_deref().map(std::fs::read_to_string) {
        Some(Ok(json)) => Some(json),
        Some(Err(e)) => {
            error!("cannot read config: {e}");
            return ExitCode::FAILURE;
        }
        None => None,
    };
    let config = match load_config(json.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let table = Arc::new(FdTable::new(Devices::new(&config)));
    match exercise(&table, args.minor, args.message.as_bytes()) {
        Ok(data) => {
            println!("wrote {} bytes", args.message.len());
            println!("read: {}", String::from_utf8_lossy(&data));
            info!("Program completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("pcd{}: {e}", args.minor);
            ExitCode::FAILURE
        }
    }
}
