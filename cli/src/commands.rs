pub mod show;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use apdash_common::config::{Config, ConfigError};
use apdash_core::presence::PresenceAggregator;
use apdash_core::resolver::DeviceResolver;
use apdash_core::vendors::MacOuiRepo;
use apdash_protocols::etcd::EtcdStore;
use apdash_protocols::hostapd::HostapdControl;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

const CONNECT_BUDGET: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "apdash")]
#[command(version, about = "Who is on the wireless network, and where.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// etcd endpoints, comma separated
    #[arg(long, global = true, value_delimiter = ',', value_name = "URLS")]
    pub etcd_addrs: Vec<String>,

    /// Key prefixes holding DHCP data, comma separated
    #[arg(long, global = true, value_delimiter = ',', value_name = "PREFIXES")]
    pub dhcp_prefixes: Vec<String>,

    /// hostapd control gRPC address
    #[arg(long, global = true, value_name = "URL")]
    pub hostapd_addr: Option<String>,

    /// JSON object mapping socket names to display names
    #[arg(long, global = true, value_name = "JSON")]
    pub friendly_names: Option<String>,

    /// Render deadline in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip manufacturer lookup
    #[arg(long, global = true)]
    pub no_oui: bool,

    /// More output per occurrence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the presence page once
    #[command(alias = "s")]
    Show {
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-render the presence page until interrupted
    #[command(alias = "w")]
    Watch {
        /// Seconds between renders
        #[arg(short, long, default_value_t = 30, value_name = "SECS",
              value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
        /// Print one JSON page per line
        #[arg(long)]
        json: bool,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration file first, command line flags on top, then validated.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("unable to read {}", path.display()))?;
                Config::from_toml_str(&contents)?
            }
            None => Config::default(),
        };
        self.apply_overrides(&mut cfg)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_overrides(&self, cfg: &mut Config) -> Result<(), ConfigError> {
        if !self.etcd_addrs.is_empty() {
            cfg.store.endpoints = self.etcd_addrs.clone();
        }
        if !self.dhcp_prefixes.is_empty() {
            cfg.store.prefixes = self.dhcp_prefixes.clone();
        }
        if let Some(address) = &self.hostapd_addr {
            cfg.controller.address = address.clone();
        }
        if let Some(json) = &self.friendly_names {
            cfg.merge_friendly_names(json)?;
        }
        if let Some(secs) = self.timeout {
            cfg.render_timeout_secs = secs;
        }
        if self.no_oui {
            cfg.manufacturer_lookup = false;
        }
        Ok(())
    }
}

/// Connects both backends and wires up the render pipeline.
pub async fn build_aggregator(cfg: &Config) -> anyhow::Result<PresenceAggregator> {
    let store = tokio::time::timeout(CONNECT_BUDGET, EtcdStore::connect(&cfg.store))
        .await
        .context("timed out connecting to etcd")?
        .context("unable to connect to etcd")?;
    let control = HostapdControl::connect(&cfg.controller.address)
        .context("unable to connect to hostapd")?;

    let resolver = DeviceResolver::new(Arc::new(store), cfg.store.prefixes.clone());
    let mut aggregator = PresenceAggregator::new(Arc::new(control), Arc::new(resolver))
        .with_rename(cfg.rename.clone());
    if cfg.manufacturer_lookup {
        aggregator = aggregator.with_vendor_repository(Arc::new(MacOuiRepo));
    }

    info!(prefixes = cfg.store.prefixes.len(), "render pipeline ready");
    Ok(aggregator)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CommandLine {
        CommandLine::try_parse_from(std::iter::once("apdash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "show",
            "--etcd-addrs",
            "10.0.0.2:2379,10.0.0.3:2379",
            "--dhcp-prefixes",
            "a::,b::",
            "--hostapd-addr",
            "10.0.0.1:8888",
            "--friendly-names",
            r#"{"wlan0": "HomeNet"}"#,
            "--timeout",
            "3",
            "--no-oui",
        ]);
        let cfg = cli.load_config().unwrap();

        assert_eq!(cfg.store.endpoints, vec!["10.0.0.2:2379", "10.0.0.3:2379"]);
        assert_eq!(cfg.store.prefixes, vec!["a::", "b::"]);
        assert_eq!(cfg.controller.address, "10.0.0.1:8888");
        assert_eq!(cfg.rename["wlan0"], "HomeNet");
        assert_eq!(cfg.render_timeout(), Duration::from_secs(3));
        assert!(!cfg.manufacturer_lookup);
    }

    #[test]
    fn missing_endpoints_fail_validation() {
        let cli = parse(&["show", "--hostapd-addr", "10.0.0.1:8888"]);
        let err = cli.load_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoEndpoints)
        ));
    }

    #[test]
    fn watch_interval_must_be_positive() {
        let args = ["apdash", "watch", "--interval", "0"];
        assert!(CommandLine::try_parse_from(args).is_err());

        let cli = parse(&["watch", "-vv"]);
        assert!(matches!(cli.command, Commands::Watch { interval: 30, json: false }));
        assert_eq!(cli.verbose, 2);
    }
}
