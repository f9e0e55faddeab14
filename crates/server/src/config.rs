// Server configuration.
//
// Environment variables provide the base settings with local development
// defaults; command line arguments override them.

use std::path::PathBuf;

use clap::Parser;

/// Core server configuration.
///
/// Constructed via [`ServerConfig::from_env`] and refined with
/// [`ServerConfig::apply_args`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host name or IP address to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Include diagnostic detail in error responses and log verbosely.
    pub debug: bool,
    /// Directory holding the workspace's project directories.
    pub workspace_dir: PathBuf,
    /// Directory with the website's static files, served for non-API paths.
    pub static_dir: Option<PathBuf>,
    /// Comma-separated CORS origins (or `"*"` for any).
    pub cors_origins: Option<String>,
    /// Explicit log filter directive (e.g. `info`, `vispr_server=debug`).
    pub log_filter: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env_fn(|_| Err(std::env::VarError::NotPresent))
    }
}

impl ServerConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `VISPR_HOST` | `localhost` |
    /// | `VISPR_PORT` | `8080` |
    /// | `VISPR_DEBUG` | off |
    /// | `VISPR_WORKSPACE` | `.` |
    /// | `VISPR_STATIC_DIR` | *(none)* |
    /// | `VISPR_CORS_ORIGINS` | *(none; cors.rs uses dev defaults)* |
    /// | `VISPR_LOG_FILTER` | `info`, or `debug` in debug mode |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = env("VISPR_HOST")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "localhost".into());
        let port: u16 = env("VISPR_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
        let debug = env("VISPR_DEBUG").ok().is_some_and(|v| parse_flag(&v));
        let workspace_dir = env("VISPR_WORKSPACE").map(PathBuf::from).unwrap_or_else(|_| ".".into());
        let static_dir = env("VISPR_STATIC_DIR").ok().map(PathBuf::from);
        let cors_origins = env("VISPR_CORS_ORIGINS").ok();
        let log_filter = env("VISPR_LOG_FILTER").ok();

        Self { host, port, debug, workspace_dir, static_dir, cors_origins, log_filter }
    }

    /// Overlay command line arguments on top of the environment settings.
    pub fn apply_args(mut self, args: CliArgs) -> Self {
        if let Some(host) = args.host {
            self.host = host;
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if args.debug {
            self.debug = true;
        }
        if let Some(workspace_dir) = args.workspace {
            self.workspace_dir = workspace_dir;
        }
        if let Some(static_dir) = args.static_dir {
            self.static_dir = Some(static_dir);
        }
        self
    }

    /// `host:port`, resolved by the listener (so `localhost` works).
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &str {
        match self.log_filter.as_deref() {
            Some(filter) => filter,
            None if self.debug => "debug",
            None => "info",
        }
    }
}

/// Command line interface of the `vispr` binary.
#[derive(Debug, Default, Parser)]
#[command(name = "vispr", about = "Serves a VISPR workspace over a JSON API")]
pub struct CliArgs {
    /// Workspace directory containing one sub-directory per project.
    pub workspace: Option<PathBuf>,

    /// Host name or IP address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Include stack-style diagnostics in error responses and log verbosely.
    #[arg(long, short)]
    pub debug: bool,

    /// Directory with the website to serve next to the API.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
