//! cloudlet-discover - find the best nearby cloudlet
//!
//! ## Usage
//!
//! ```bash
//! # By GPS coordinates
//! cloudlet-discover -s http://128.2.112.221:8080/ -a 40.4435 -o -79.9445
//!
//! # By explicit client IP, lowest-RTT policy
//! cloudlet-discover -s http://128.2.112.221:8080/ -c 128.2.210.197 --strategy lowest-rtt
//!
//! # Let the directory use the address it sees, then hand off an overlay
//! cloudlet-discover -s http://128.2.112.221:8080/ -f ./moped.overlay
//! ```
//!
//! The discovery report is printed to stdout as JSON; logs go to stderr.

use anyhow::Context;
use clap::Parser;
use cloudlet_core::{AppInfo, ClientInfo, OverlaySource, ProvisionRequest};
use cloudlet_discovery::{
    Discovery, DiscoveryConfig, SelectionPolicy, validate_directory_endpoint,
};
use std::net::{IpAddr, UdpSocket};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default application profile
const DEFAULT_APP_ID: &str = "moped";
const DEFAULT_MAX_RTT_MS: u32 = 30;
const DEFAULT_MIN_CPU_MHZ: u32 = 1600;

/// Cloudlet discovery: directory query, concurrent probing, selection
#[derive(Parser, Debug)]
#[command(name = "cloudlet-discover")]
#[command(about = "Find the best nearby cloudlet for an application", long_about = None)]
struct Cli {
    /// Directory server base URL
    #[arg(short = 's', long, env = "CLOUDLET_DIRECTORY")]
    directory_server: String,

    /// Client GPS latitude
    #[arg(short = 'a', long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Client GPS longitude
    #[arg(short = 'o', long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Client IP address (used when no coordinates are given)
    #[arg(short = 'c', long)]
    client_ip: Option<IpAddr>,

    /// Use the local outbound address as the client IP
    #[arg(long, conflicts_with = "client_ip")]
    detect_ip: bool,

    /// Client network type
    #[arg(long, default_value = "wifi")]
    network_type: String,

    /// VM overlay file to hand off to the selected cloudlet
    #[arg(short = 'f', long, conflicts_with = "overlay_url")]
    overlay_file: Option<PathBuf>,

    /// VM overlay URL to hand off to the selected cloudlet
    #[arg(short = 'u', long)]
    overlay_url: Option<String>,

    /// Application id
    #[arg(long, default_value = DEFAULT_APP_ID)]
    app_id: String,

    /// Minimum CPU clock required (MHz)
    #[arg(long, default_value_t = DEFAULT_MIN_CPU_MHZ)]
    min_cpu_mhz: u32,

    /// Maximum acceptable RTT (ms), passed to cloudlets as a hint
    #[arg(long, default_value_t = DEFAULT_MAX_RTT_MS)]
    max_rtt_ms: u32,

    /// URL the application wants cached (repeatable)
    #[arg(long = "cache-url")]
    cache_urls: Vec<String>,

    /// File pattern the application wants cached (repeatable)
    #[arg(long = "cache-file")]
    cache_files: Vec<String>,

    /// Selection policy
    #[arg(long, value_enum, default_value_t = SelectionPolicy::CacheAffinity)]
    strategy: SelectionPolicy,

    /// JSON config file (flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of candidates to request from the directory
    #[arg(long)]
    max_results: Option<u32>,

    /// Per-probe timeout (ms)
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Directory timeout (ms)
    #[arg(long)]
    directory_timeout_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn discovery_config(&self) -> anyhow::Result<DiscoveryConfig> {
        let mut config = match &self.config {
            Some(path) => DiscoveryConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DiscoveryConfig::default(),
        };

        if let Some(n) = self.max_results {
            config = config.with_max_results(n);
        }
        if let Some(ms) = self.probe_timeout_ms {
            config = config.with_probe_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.directory_timeout_ms {
            config = config.with_directory_timeout(Duration::from_millis(ms));
        }

        config.validate().context("invalid discovery configuration")?;
        Ok(config)
    }

    fn client_info(&self) -> anyhow::Result<ClientInfo> {
        let mut client = ClientInfo::new().with_network_type(self.network_type.clone());

        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            return Ok(client.with_coordinates(lat.to_string(), lon.to_string()));
        }

        if let Some(ip) = self.client_ip {
            client = client.with_ip_address(ip.to_string());
        } else if self.detect_ip {
            let ip = detect_local_ip().context("failed to detect local IP address")?;
            info!(client_ip = %ip, "Detected local IP address");
            client = client.with_ip_address(ip.to_string());
        }

        Ok(client)
    }

    fn app_info(&self) -> AppInfo {
        AppInfo::new(self.app_id.clone())
            .with_max_rtt_ms(self.max_rtt_ms)
            .with_min_cpu_clock_mhz(self.min_cpu_mhz)
            .with_cache_urls(self.cache_urls.clone())
            .with_cache_files(self.cache_files.clone())
    }

    fn overlay(&self) -> Option<OverlaySource> {
        match (&self.overlay_file, &self.overlay_url) {
            (Some(path), _) => Some(OverlaySource::File(path.clone())),
            (None, Some(url)) => Some(OverlaySource::Url(url.clone())),
            (None, None) => None,
        }
    }
}

/// Local address of the outbound route; no packet is sent
fn detect_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:53")?;
    Ok(socket.local_addr()?.ip())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cloudlet_discovery=info,info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    validate_directory_endpoint(&cli.directory_server)?;
    let config = cli.discovery_config()?;
    let client = cli.client_info()?;
    let app = cli.app_info();

    let discovery = Discovery::new(config).context("failed to create discovery client")?;
    let report = discovery
        .discover_with_report(
            &cli.directory_server,
            &client,
            &app,
            Some(cli.strategy.strategy()),
        )
        .await
        .with_context(|| format!("cloudlet discovery via {} failed", cli.directory_server))?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match (report.outcome.selected(), cli.overlay()) {
        (Some(cloudlet), Some(overlay)) => {
            let request = ProvisionRequest::new(cloudlet, overlay);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        (None, _) => {
            warn!(
                app_id = %app.app_id(),
                candidates = report.candidates_count,
                "No cloudlet satisfies the application requirements"
            );
        }
        (Some(_), None) => {}
    }

    Ok(())
}
