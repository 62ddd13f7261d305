use multi_session::cli::{Args, CliConfig, ConfigDiscovery, SessionCli, SessionFile};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "multi_session=debug"
    } else {
        "multi_session=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = args.command.as_ref() else {
        error!("No command specified. Use 'msess --help' to see available commands.");
        std::process::exit(2);
    };

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration override from: {:?}", path);
            CliConfig::from_toml_file(path).map_err(|e| anyhow::anyhow!("{}", e))?
        }
        None => ConfigDiscovery::discover_config().map_err(|e| anyhow::anyhow!("{}", e))?,
    };

    let session_file = config.resolve_session_file(args.file.clone());
    info!("Using session file: {:?}", session_file);

    let cli = SessionCli::new(&config, SessionFile::new(session_file));
    match cli.execute(command).await {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}
