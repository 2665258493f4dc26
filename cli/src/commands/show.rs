use std::time::{Duration, Instant};

use apdash_common::config::Config;
use apdash_common::network::page::ResultPage;
use colored::*;
use tracing::error;

use crate::commands;
use crate::terminal::{colors, format, print, spinner};

pub async fn show(cfg: &Config, json: bool) -> anyhow::Result<()> {
    let start_time: Instant = Instant::now();

    let rendered = {
        let spinner = (!json).then(|| spinner::start("Connecting to etcd and hostapd..."));
        let aggregator = commands::build_aggregator(cfg).await?;
        if let Some(spinner) = &spinner {
            spinner.set_message("Resolving associated devices...");
        }
        aggregator.render_within(cfg.render_timeout()).await
    };

    let page: ResultPage = match rendered {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, "error rendering presence page");
            anyhow::bail!("unable to render the presence page");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    print_page(&page);
    print_summary(&page, start_time.elapsed());
    Ok(())
}

pub fn print_page(page: &ResultPage) {
    if page.is_empty() {
        print::header("nobody home");
        print::no_results();
        return;
    }

    for group in &page.groups {
        print::header(&group.name);
        for (idx, device) in group.members.iter().enumerate() {
            print::tree_head(idx, format::display_name(device));
            print::as_tree_one_level(format::device_details(device));
        }
    }
}

fn print_summary(page: &ResultPage, total_time: Duration) {
    let devices: ColoredString = format!("{} devices", page.total_devices()).bold().green();
    let groups: ColoredString = format!("{} access points", page.groups.len()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString = format!("Presence: {devices} on {groups} in {total_time}")
        .color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
}
