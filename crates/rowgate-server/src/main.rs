use std::process::ExitCode;

use rowgate_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use rowgate_server::{ServerBuilder, observability};
use rowgate_sheets::SheetsError;

const CONFIG_ENV: &str = "ROWGATE_CONFIG";

/// Why the process stopped before or while serving.
#[derive(Debug, thiserror::Error)]
enum Startup {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Spreadsheet backend initialization failed: {0}")]
    Backend(#[from] SheetsError),
    #[error("Server error: {0}")]
    Serve(anyhow::Error),
}

impl Startup {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Backend(_) => ExitCode::from(2),
            Self::Serve(_) => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    observability::init_tracing();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            tracing::error!(error = %failure, "RowGate stopped");
            eprintln!("{failure}");
            failure.exit_code()
        }
    }
}

async fn start() -> Result<(), Startup> {
    let (config_path, origin) = config_location();
    let cfg = load_config(Some(&config_path)).map_err(Startup::Config)?;
    observability::apply_logging_level(&cfg.logging.level);
    tracing::info!(
        path = %config_path,
        origin,
        backend = ?cfg.sheets.backend,
        default_sheet = %cfg.sheets.default_sheet,
        "Configuration loaded"
    );

    let server = ServerBuilder::new().with_config(cfg).build()?;
    server.run().await.map_err(Startup::Serve)
}

/// `.env` is optional; only a file that exists but cannot be read is reported.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => eprintln!("Ignoring .env: {e}"),
    }
}

/// `--config <path>`, then `ROWGATE_CONFIG`, then `rowgate.toml`.
fn config_location() -> (String, &'static str) {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(path) = args
        .windows(2)
        .find(|pair| pair[0] == "--config")
        .map(|pair| pair[1].clone())
    {
        return (path, "--config");
    }
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => (path, CONFIG_ENV),
        _ => (DEFAULT_CONFIG_FILE.to_string(), "default"),
    }
}
