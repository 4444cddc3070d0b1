use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cytube_feeder::app::AppContext;
use cytube_feeder::cli::{commands, Cli, Commands};
use cytube_feeder::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cytube_feeder=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);

    let ctx = AppContext::new(config)?;

    match cli.command() {
        Commands::Run { dry_run } => {
            commands::run_pass(&ctx, dry_run).await?;
        }
        Commands::Seed => {
            commands::seed(&ctx).await?;
        }
        Commands::List => {
            commands::list_watermarks(&ctx)?;
        }
    }

    Ok(())
}
