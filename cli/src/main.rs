mod commands;
mod terminal;

use std::time::Duration;

use commands::{CommandLine, Commands, show, watch};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    let cfg = commands.load_config()?;

    match commands.command {
        Commands::Show { json } => {
            if !json {
                print::banner();
            }
            show::show(&cfg, json).await
        }
        Commands::Watch { interval, json } => {
            if !json {
                print::banner();
            }
            watch::watch(&cfg, Duration::from_secs(interval), json).await
        }
    }
}
