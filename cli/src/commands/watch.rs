use std::time::Duration;

use apdash_common::config::Config;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::commands::{self, show};
use crate::terminal::print;

/// Renders every `interval` until Ctrl-C. A failed render is logged and the
/// next tick tries again.
pub async fn watch(cfg: &Config, interval: Duration, json: bool) -> anyhow::Result<()> {
    let aggregator = commands::build_aggregator(cfg).await?;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut renders: usize = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        renders += 1;

        let rendered = tokio::select! {
            _ = &mut shutdown => break,
            rendered = aggregator.render_within(cfg.render_timeout()) => rendered,
        };

        match rendered {
            Ok(page) if json => println!("{}", serde_json::to_string(&page)?),
            Ok(page) => {
                print::aligned_line("render", renders.to_string());
                show::print_page(&page);
                print::fat_separator();
            }
            Err(e) => error!(error = %e, render = renders, "error rendering presence page"),
        }
    }

    info!(renders, "stopped watching");
    Ok(())
}
