use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod channels;
mod config;
mod http;
mod runs;
mod telemetry;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "chandir", about = "Channel directory: channel source and parsing-run store")]
struct Cli {
    /// Postgres connection string; overrides DATABASE_URL
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve(http::ServeCmd),
    Channels(channels::ChannelsCmd),
    History(runs::HistoryCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);
    telemetry::config::init_tracing();

    let cfg = AppConfig::from_env().with_overrides(cli.dsn, None);

    match cli.command {
        Commands::Serve(args) => http::run(&cfg, args).await?,
        Commands::Channels(args) => channels::run(&cfg, args).await?,
        Commands::History(args) => runs::run(&cfg, args).await?,
    }

    Ok(())
}
