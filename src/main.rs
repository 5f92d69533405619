use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use wifi_wander::{
    Bssid, ConnectivityChecker, HttpConnectivityChecker, NetworkRegistry, NmcliDriver, ObservedNetwork,
    ProbeEngine, SessionLog, ShellDiagnostics, WanderError, WanderLoop, WifiDriver, WpaCliStatus,
    config::{self, Config},
    connection, filter, interface, logging, scan,
    status::verified_status,
};

#[derive(Parser)]
#[command(name = "wifi-wander")]
#[command(about = "Track nearby WiFi networks and probe open ones for internet access")]
#[command(version)]
struct Cli {
    /// Interface to use (defaults to $SCAN_INTERFACE, then the config file, then wlan0)
    #[arg(short, long, global = true)]
    interface: Option<String>,

    /// Debug-level diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connection status
    Status {
        /// Cross-check the driver against wpa_cli
        #[arg(long)]
        verify: bool,
    },

    /// Connect to a WiFi network
    Connect {
        /// SSID of the network
        #[arg(short, long)]
        network: String,

        /// Password (omit for open networks)
        #[arg(short, long, default_value = "")]
        pass: String,
    },

    /// Disconnect from a network
    Disconnect {
        /// SSID to leave (defaults to the connected network)
        #[arg(short, long)]
        network: Option<String>,
    },

    /// Single scan, strongest networks first
    Scan {
        /// Only show networks that would be probed
        #[arg(short, long)]
        filter: bool,
    },

    /// Continuously scan and probe open networks
    Wander {
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Check internet connectivity
    Check,

    /// Probe one network end to end
    Probe {
        /// SSID of the network to probe
        #[arg(short, long)]
        network: String,

        /// Pick this access point instead of the strongest one
        #[arg(short, long)]
        bssid: Option<Bssid>,
    },

    /// List available WiFi interfaces
    Interfaces,

    /// Show the effective configuration
    ShowConfig {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let cfg = Config::load()?;
    let iface = cfg.resolve_interface(
        cli.interface.as_deref(),
        std::env::var(config::INTERFACE_ENV).ok(),
    );

    match cli.command {
        Commands::Status { verify } => cmd_status(&cfg, &iface, verify),
        Commands::Connect { network, pass } => cmd_connect(&cfg, &iface, &network, &pass),
        Commands::Disconnect { network } => cmd_disconnect(&cfg, &iface, network.as_deref()),
        Commands::Scan { filter } => cmd_scan(&cfg, &iface, filter),
        Commands::Wander { cycles } => cmd_wander(&cfg, &iface, cycles),
        Commands::Check => cmd_check(&cfg, &iface),
        Commands::Probe { network, bssid } => cmd_probe(&cfg, &iface, &network, bssid),
        Commands::Interfaces => cmd_interfaces(),
        Commands::ShowConfig { init } => cmd_show_config(&cfg, init),
    }
}

fn cmd_status(cfg: &Config, iface: &str, verify: bool) -> Result<()> {
    println!(">>> status of interface:{}", iface);
    let driver = NmcliDriver::new(iface);

    if verify {
        let query = WpaCliStatus::new(iface, cfg.tool_timeout());
        let (status, ssid) = verified_status(&driver, &query)?;
        connection::display_status(&status);
        println!("Verified:  {}", ssid.map_or("disconnected".to_string(), |s| format!("{:?}", s)));
    } else {
        let status = driver.current_status()?;
        connection::display_status(&status);
    }

    Ok(())
}

fn cmd_connect(cfg: &Config, iface: &str, ssid: &str, pass: &str) -> Result<()> {
    println!(">>> connect to net:{:?} on interface:{}", ssid, iface);
    let driver = NmcliDriver::new(iface);
    let timeout = cfg.probe_settings().connect_timeout;

    let conn = driver.connect(ssid, pass, timeout)?;
    println!(
        "Connected {} {:?} {} {}",
        conn.interface,
        conn.ssid,
        conn.ipv4.as_deref().unwrap_or("-"),
        conn.ipv6.as_deref().unwrap_or("-")
    );

    Ok(())
}

fn cmd_disconnect(cfg: &Config, iface: &str, network: Option<&str>) -> Result<()> {
    let driver = NmcliDriver::new(iface);
    let ssid = match network {
        Some(ssid) => ssid.to_string(),
        None => driver
            .current_status()?
            .ssid
            .context("Not connected to any network")?,
    };

    println!(">>> disconnecting from net:{:?} on interface:{}", ssid, iface);
    let ok = driver.disconnect(&ssid, cfg.probe_settings().disconnect_timeout)?;
    println!("disconnect status={}", ok);

    Ok(())
}

fn cmd_scan(cfg: &Config, iface: &str, use_filter: bool) -> Result<()> {
    println!(">>> single scan of interface:{}", iface);
    let driver = NmcliDriver::new(iface);
    let observed = driver.scan()?;

    let mut registry = NetworkRegistry::new();
    registry.reconcile(observed, Utc::now(), &mut SessionLog::stdout());

    let candidates = if use_filter {
        filter::select(&registry, &filter::default_filter(&cfg.ignored_ssids))
    } else {
        filter::select(&registry, &filter::AllNetworks)
    };

    if candidates.is_empty() {
        println!("nothing interesting found, {} networks filtered", registry.len());
    } else {
        scan::display_networks(&candidates);
    }

    Ok(())
}

fn cmd_wander(cfg: &Config, iface: &str, cycles: Option<u64>) -> Result<()> {
    println!(">>> start monitoring interface:{}", iface);
    interface::get_interface(iface)?;

    let mut log = SessionLog::create(&cfg.log_dir(), Local::now())?;
    if let Some(path) = log.path() {
        println!(">>> logging session to {}", path.display());
    }

    let driver = NmcliDriver::new(iface);
    let query = WpaCliStatus::new(iface, cfg.tool_timeout());
    let checker = HttpConnectivityChecker::new(cfg.check_url.clone(), cfg.check_timeout());
    let diagnostics = ShellDiagnostics::new(iface, cfg.tool_timeout());
    let probe = ProbeEngine::new(&driver, &query, &checker, &diagnostics, cfg.probe_settings());

    let mut wander = WanderLoop::new(
        &driver,
        probe,
        Box::new(filter::default_filter(&cfg.ignored_ssids)),
        cfg.wander_settings(),
    );
    wander.run(&mut log, cycles)?;

    Ok(())
}

fn cmd_check(cfg: &Config, iface: &str) -> Result<()> {
    println!(">>> connectivity check for interface:{}", iface);
    let checker = HttpConnectivityChecker::new(cfg.check_url.clone(), cfg.check_timeout());
    let connected = checker.check(iface);
    println!("connected={}", connected);

    Ok(())
}

fn cmd_probe(cfg: &Config, iface: &str, ssid: &str, bssid: Option<Bssid>) -> Result<()> {
    println!(">>> probing network:{:?}", ssid);
    let driver = NmcliDriver::new(iface);

    // strongest access point advertising the SSID, unless one was named
    let target = driver
        .scan()?
        .into_iter()
        .filter(|r| r.ssid == ssid && bssid.is_none_or(|b| r.bssid == b))
        .max_by_key(|r| r.signal)
        .map(|r| ObservedNetwork::first_observed(r, Utc::now()))
        .ok_or_else(|| WanderError::NetworkNotFound(ssid.to_string()))?;

    let query = WpaCliStatus::new(iface, cfg.tool_timeout());
    let checker = HttpConnectivityChecker::new(cfg.check_url.clone(), cfg.check_timeout());
    let diagnostics = ShellDiagnostics::new(iface, cfg.tool_timeout());
    let engine = ProbeEngine::new(&driver, &query, &checker, &diagnostics, cfg.probe_settings());

    let mut log = SessionLog::stdout();
    let result = engine.probe(&target, &mut log);
    log.flush();

    let report = result?;
    println!(
        "probe complete: {:?} [{}] reachable={} in {:?}",
        report.ssid, report.bssid, report.reachable, report.elapsed
    );

    Ok(())
}

fn cmd_interfaces() -> Result<()> {
    let interfaces = interface::list_wifi_interfaces()?;

    if interfaces.is_empty() {
        println!("No WiFi interfaces found.");
        return Ok(());
    }

    println!("{:<16} {}", "INTERFACE", "STATE");
    println!("{}", "-".repeat(32));

    for iface in interfaces {
        println!("{:<16} {}", iface.name, iface.state);
    }

    Ok(())
}

fn cmd_show_config(cfg: &Config, init: bool) -> Result<()> {
    let path = config::config_path()?;

    if init {
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }
        Config::default().save_to(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    println!("Config file: {}", path.display());
    println!();
    print!("{}", toml::to_string_pretty(cfg).context("Failed to serialize config")?);

    Ok(())
}
