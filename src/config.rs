use crate::services::{
    fetcher::DEFAULT_FETCH_TIMEOUT,
    generative::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, usable_api_key},
    rate_limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW},
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Generative backend credential, already filtered for blank/placeholder values.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub fetch_timeout: Duration,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "SEO metadata analysis and optimization API")]
pub struct Args {
    /// Host to bind to (overrides META_ALIGN_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides META_ALIGN_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Gemini model name (overrides META_ALIGN_GEMINI_MODEL)
    #[arg(long)]
    pub gemini_model: Option<String>,

    /// Per-attempt fetch timeout in seconds (overrides META_ALIGN_FETCH_TIMEOUT_SECS)
    #[arg(long)]
    pub fetch_timeout_secs: Option<u64>,

    /// Requests allowed per client per window (overrides META_ALIGN_RATE_LIMIT_MAX)
    #[arg(long)]
    pub rate_limit_max: Option<u32>,

    /// Rate-limit window in seconds (overrides META_ALIGN_RATE_LIMIT_WINDOW_SECS)
    #[arg(long)]
    pub rate_limit_window_secs: Option<u64>,

    /// Analyze a single URL, print the result as JSON and exit
    #[arg(long, value_name = "URL")]
    pub analyze: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the optional
    /// one-shot URL.
    pub fn from_env_and_args() -> Result<(Self, Option<String>)> {
        // Parse CLI once
        let args = Args::parse();
        let analyze = args.analyze.clone();
        let cfg = Self::resolve(args, |key| env::var(key))?;
        Ok((cfg, analyze))
    }

    /// Merge `args` over values read through `lookup`, falling back to defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = lookup("META_ALIGN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "META_ALIGN_PORT", 3000u16)?;
        let env_model =
            lookup("META_ALIGN_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into());
        let gemini_endpoint = lookup("META_ALIGN_GEMINI_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_GEMINI_ENDPOINT.into());
        let env_timeout = parse_var(
            &lookup,
            "META_ALIGN_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT.as_secs(),
        )?;
        let env_rate_max = parse_var(&lookup, "META_ALIGN_RATE_LIMIT_MAX", DEFAULT_MAX_REQUESTS)?;
        let env_rate_window = parse_var(
            &lookup,
            "META_ALIGN_RATE_LIMIT_WINDOW_SECS",
            DEFAULT_WINDOW.as_secs(),
        )?;
        let raw_key = lookup("GEMINI_API_KEY").ok();

        // --- Merge ---
        let fetch_timeout_secs = non_zero(
            "fetch timeout",
            args.fetch_timeout_secs.unwrap_or(env_timeout),
        )?;
        let rate_limit_max = non_zero("rate limit max", args.rate_limit_max.unwrap_or(env_rate_max))?;
        let rate_limit_window_secs = non_zero(
            "rate limit window",
            args.rate_limit_window_secs.unwrap_or(env_rate_window),
        )?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            gemini_api_key: usable_api_key(raw_key.as_deref()).map(str::to_string),
            gemini_model: args.gemini_model.unwrap_or(env_model),
            gemini_endpoint,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            rate_limit_max,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_endpoint", &self.gemini_endpoint)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window", &self.rate_limit_window)
            .finish()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

fn non_zero<T>(name: &str, value: T) -> Result<T>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        bail!("{} must be greater than zero", name);
    }
    Ok(value)
}
