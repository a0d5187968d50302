// # dyndnsd - Dynamic DNS Daemon
//
// Thin integration layer: all monitoring, comparison and update logic lives
// in dyndns-core. The daemon is responsible for:
// 1. Reading configuration from environment variables (or a config file)
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP resolver and the /nic/update provider into a Monitor
// 4. Translating signals into start/stop/manual-check calls
//
// ## Configuration
//
// ### Target
// - `DYNDNS_PROVIDER`: Provider (ovh, noip)
// - `DYNDNS_DOMAIN`: Hostname to keep updated
// - `DYNDNS_USERNAME`: Provider account identifier
// - `DYNDNS_PASSWORD`: Provider account secret
//
// ### Monitoring
// - `DYNDNS_INTERVAL_SECS`: Seconds between checks (60-3600, default 300)
// - `DYNDNS_CUSTOM_IP_URL`: Highest-priority IP detection endpoint
// - `DYNDNS_PROXY_IP_URL`: Proxy fallback endpoint (empty disables it)
// - `DYNDNS_HTTP_TIMEOUT_SECS`: Per-request timeout (1-120, default 10)
// - `DYNDNS_NOIP_USER_AGENT`: User-Agent sent to No-IP
//
// ### Persistence and Logging
// - `DYNDNS_CONFIG_FILE`: JSON config file. Loaded when `DYNDNS_DOMAIN` is
//   unset, written when the environment provides a full configuration.
// - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Signals
//
// - `SIGUSR1`: run a check now
// - `SIGINT` / `SIGTERM`: stop, wait up to 30s for a check in flight, print history
//
// ## Example
//
// ```bash
// export DYNDNS_PROVIDER=ovh
// export DYNDNS_DOMAIN=home.example.com
// export DYNDNS_USERNAME=example.com-home
// export DYNDNS_PASSWORD=...
// export DYNDNS_CONFIG_FILE=/var/lib/dyndns/config.json
//
// dyndnsd
// ```

use anyhow::Result;
use dyndns_core::config::{DEFAULT_INTERVAL_SECS, ResolverConfig};
use dyndns_core::{
    ConfigStore, Credentials, FileConfigStore, LogKind, Monitor, MonitorConfig, ProviderKind,
};
use dyndns_ip_http::HttpIpResolver;
use dyndns_provider_nic::NicUpdateProvider;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long shutdown waits for a check in flight
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-request HTTP timeout (in seconds)
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Number of history entries printed on exit
const HISTORY_ON_EXIT: usize = 100;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DyndnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DyndnsExitCode> for ExitCode {
    fn from(code: DyndnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Default)]
struct Config {
    provider: Option<String>,
    domain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    interval_secs: u64,
    custom_ip_url: Option<String>,
    proxy_ip_url: Option<String>,
    http_timeout_secs: u64,
    noip_user_agent: Option<String>,
    config_file: Option<String>,
    log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("interval_secs", &self.interval_secs)
            .field("custom_ip_url", &self.custom_ip_url)
            .field("proxy_ip_url", &self.proxy_ip_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("noip_user_agent", &self.noip_user_agent)
            .field("config_file", &self.config_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Read an optional variable, treating empty as unset
fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env_opt(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            anyhow::anyhow!("{} must be a whole number of seconds. Got: {}", name, raw)
        }),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            provider: env_opt("DYNDNS_PROVIDER"),
            domain: env_opt("DYNDNS_DOMAIN"),
            username: env::var("DYNDNS_USERNAME").ok(),
            password: env::var("DYNDNS_PASSWORD").ok(),
            interval_secs: env_u64("DYNDNS_INTERVAL_SECS", DEFAULT_INTERVAL_SECS)?,
            custom_ip_url: env_opt("DYNDNS_CUSTOM_IP_URL"),
            // Set-but-empty disables the proxy fallback
            proxy_ip_url: env::var("DYNDNS_PROXY_IP_URL").ok(),
            http_timeout_secs: env_u64("DYNDNS_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            noip_user_agent: env_opt("DYNDNS_NOIP_USER_AGENT"),
            config_file: env_opt("DYNDNS_CONFIG_FILE"),
            log_level: env::var("DYNDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs validation including:
    /// - Required field presence
    /// - Provider enumeration
    /// - Domain name format
    /// - Numeric ranges
    /// - URL schemes and placeholder secrets
    fn validate(&self) -> Result<()> {
        match self.domain.as_deref() {
            Some(domain) => {
                let provider = self.provider.as_deref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "DYNDNS_PROVIDER is required when DYNDNS_DOMAIN is set. \
                        Set it via: export DYNDNS_PROVIDER=ovh"
                    )
                })?;
                provider.parse::<ProviderKind>()?;

                validate_domain_name(domain)?;

                if self.username.as_deref().is_none_or(str::is_empty) {
                    anyhow::bail!(
                        "DYNDNS_USERNAME is required. \
                        Set it via: export DYNDNS_USERNAME=your_user"
                    );
                }

                let password = self.password.as_deref().unwrap_or_default();
                if password.is_empty() {
                    anyhow::bail!(
                        "DYNDNS_PASSWORD is required. \
                        Set it via: export DYNDNS_PASSWORD=your_password"
                    );
                }

                // Check for obvious placeholder secrets (common mistake)
                let lower = password.to_lowercase();
                if lower.contains("your_password")
                    || lower.contains("replace_me")
                    || lower == "password"
                {
                    anyhow::bail!(
                        "DYNDNS_PASSWORD appears to be a placeholder. \
                        Use the actual DynHost / No-IP password."
                    );
                }
            }
            None => {
                if self.config_file.is_none() {
                    anyhow::bail!(
                        "Either DYNDNS_DOMAIN or DYNDNS_CONFIG_FILE is required. \
                        Set it via: export DYNDNS_DOMAIN=home.example.com"
                    );
                }
            }
        }

        if !(dyndns_core::config::MIN_INTERVAL_SECS..=dyndns_core::config::MAX_INTERVAL_SECS)
            .contains(&self.interval_secs)
        {
            anyhow::bail!(
                "DYNDNS_INTERVAL_SECS must be between {} and {} seconds. Got: {}",
                dyndns_core::config::MIN_INTERVAL_SECS,
                dyndns_core::config::MAX_INTERVAL_SECS,
                self.interval_secs
            );
        }

        if !(1..=120).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "DYNDNS_HTTP_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        for (name, url) in [
            ("DYNDNS_CUSTOM_IP_URL", self.custom_ip_url.as_deref()),
            ("DYNDNS_PROXY_IP_URL", self.proxy_ip_url.as_deref()),
        ] {
            if let Some(url) = url.filter(|u| !u.is_empty()) {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", name, url);
                }
                if url.starts_with("http://") {
                    eprintln!(
                        "WARNING: {} uses HTTP (not HTTPS). \
                        The detected address could be tampered with in transit.",
                        name
                    );
                }
            }
        }

        let parent = self
            .config_file
            .as_deref()
            .and_then(|path| std::path::Path::new(path).parent())
            .filter(|parent| !parent.as_os_str().is_empty());
        if let Some(parent) = parent.filter(|parent| !parent.exists()) {
            anyhow::bail!(
                "DYNDNS_CONFIG_FILE parent directory does not exist: {}. \
                Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DYNDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Monitor configuration from the environment, if it names a domain
    fn monitor_config(&self) -> Result<Option<MonitorConfig>> {
        let Some(domain) = self.domain.as_deref() else {
            return Ok(None);
        };
        let provider: ProviderKind = self.provider.as_deref().unwrap_or_default().parse()?;

        let mut config = MonitorConfig::new(
            provider,
            domain.trim(),
            Credentials::new(
                self.username.clone().unwrap_or_default(),
                self.password.clone().unwrap_or_default(),
            ),
        )
        .with_interval_secs(self.interval_secs);
        config.custom_ip_endpoint = self.custom_ip_url.clone();

        Ok(Some(config))
    }

    fn resolver_config(&self) -> ResolverConfig {
        let mut resolver = ResolverConfig {
            request_timeout_secs: self.http_timeout_secs,
            ..ResolverConfig::default()
        };
        if let Some(proxy) = self.proxy_ip_url.as_deref() {
            resolver.proxy_endpoint = Some(proxy.trim().to_string()).filter(|p| !p.is_empty());
        }
        resolver
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    info!("Starting dyndnsd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DyndnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let monitor_config = match load_monitor_config(&config).await {
            Ok(monitor_config) => monitor_config,
            Err(e) => {
                error!("Configuration error: {}", e);
                return DyndnsExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(&config, monitor_config).await {
            error!("Daemon error: {}", e);
            DyndnsExitCode::RuntimeError
        } else {
            DyndnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Resolve the monitor configuration from the environment or the config file
async fn load_monitor_config(config: &Config) -> Result<MonitorConfig> {
    let store = match config.config_file.as_deref() {
        Some(path) => Some(FileConfigStore::new(path).await?),
        None => None,
    };

    if let Some(monitor_config) = config.monitor_config()? {
        if let Some(store) = &store {
            store.save(&monitor_config).await?;
            info!("Configuration saved to {}", store.path().display());
        }
        return Ok(monitor_config);
    }

    let Some(store) = store else {
        anyhow::bail!("No configuration source available");
    };
    let monitor_config = store.load().await?.ok_or_else(|| {
        anyhow::anyhow!(
            "No configuration found in {}. Set DYNDNS_DOMAIN to create one.",
            store.path().display()
        )
    })?;
    monitor_config.validate()?;
    info!("Configuration loaded from {}", store.path().display());
    Ok(monitor_config)
}

/// Run the daemon
async fn run_daemon(config: &Config, monitor_config: MonitorConfig) -> Result<()> {
    let resolver = HttpIpResolver::with_config(config.resolver_config())?;

    let mut provider =
        NicUpdateProvider::with_timeout(Duration::from_secs(config.http_timeout_secs))?;
    if let Some(user_agent) = config.noip_user_agent.as_deref() {
        provider = provider.with_user_agent(user_agent);
    }

    info!(
        "Monitoring {} via {} every {}s",
        monitor_config.domain,
        monitor_config.provider.label(),
        monitor_config.interval_secs
    );

    let monitor = Monitor::new(Arc::new(resolver), Arc::new(provider));
    monitor.start(monitor_config)?;

    let signal = wait_for_shutdown(&monitor).await?;
    info!("Received shutdown signal: {}", signal);

    monitor.stop();
    if tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, monitor.wait_idle())
        .await
        .is_err()
    {
        warn!(
            "Check still in flight after {:?}, exiting anyway",
            SHUTDOWN_DRAIN_TIMEOUT
        );
    }

    print_history(&monitor).await;
    info!("Shutting down daemon");
    Ok(())
}

/// Print the recent history, oldest first
async fn print_history(monitor: &Monitor) {
    let entries = match monitor.recent_logs(HISTORY_ON_EXIT).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read history: {}", e);
            return;
        }
    };

    println!("--- last {} event(s) ---", entries.len());
    for entry in entries.iter().rev() {
        let kind = match entry.kind {
            LogKind::Info => "INFO",
            LogKind::Success => "OK",
            LogKind::Error => "ERROR",
        };
        let timestamp = entry.timestamp.to_rfc3339();
        match &entry.ip {
            Some(ip) => println!("{} [{}] {} ({})", timestamp, kind, entry.message, ip),
            None => println!("{} [{}] {}", timestamp, kind, entry.message),
        }
    }
}

fn spawn_manual_check(monitor: &Monitor) {
    let monitor = monitor.clone();
    tokio::spawn(async move {
        match monitor.trigger_manual_check().await {
            Ok(Some(outcome)) => info!("Manual check finished: {:?}", outcome),
            Ok(None) => info!("Manual check skipped: a check is already running"),
            Err(e) => error!("Manual check failed: {}", e),
        }
    });
}

/// Wait for SIGTERM or SIGINT, running a manual check on each SIGUSR1
///
/// # Returns
///
/// The name of the signal that ended the wait.
#[cfg(unix)]
async fn wait_for_shutdown(monitor: &Monitor) -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
    let mut sigusr1 = signal(SignalKind::user_defined1())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGUSR1 handler: {}", e))?;

    loop {
        tokio::select! {
            _ = sigterm.recv() => return Ok("SIGTERM"),
            _ = sigint.recv() => return Ok("SIGINT"),
            _ = sigusr1.recv() => {
                info!("SIGUSR1 received, running a check now");
                spawn_manual_check(monitor);
            }
        }
    }
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown(_monitor: &Monitor) -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
