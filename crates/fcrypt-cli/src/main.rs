//! fcrypt: SHA-256 file hashing and password-based ChaCha20 file encryption
//!
//! Usage:
//!   fcrypt <input>                        - print "<input>  -  <sha256 hex>"
//!   fcrypt <input> <output> [<password>]  - encrypt/decrypt input into a new output file
//!
//! Encryption and decryption are the same operation. The password comes from
//! the argument, then FCRYPT_PASSWORD, then an interactive prompt.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use fcrypt_core::{check_platform, FcryptConfig, FcryptError, FcryptResult};
use fcrypt_crypto::Digest;
use fcrypt_file::{IoOptions, ProgressFn};

const DEFAULT_CONFIG_PATH: &str = "~/.config/fcrypt/config.toml";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fcrypt",
    version,
    about = "SHA-256 file hashing and ChaCha20 file encryption",
    long_about = "fcrypt: hash a file with SHA-256, or encrypt/decrypt it with ChaCha20 \
                  keyed by the SHA-256 digest of a password.\n\n\
                  The key is a single unsalted digest and no nonce is stored, so equal \
                  inputs under equal passwords give equal ciphertexts."
)]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Output file (must not exist). Omit to hash the input instead.
    output: Option<PathBuf>,

    /// Password for encryption/decryption
    #[arg(env = "FCRYPT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to config.toml
    #[arg(long, short = 'c', env = "FCRYPT_CONFIG")]
    config: Option<PathBuf>,

    /// Expected digest (hash mode only); exit non-zero on mismatch
    #[arg(long, value_name = "HEX", conflicts_with = "output")]
    expect: Option<String>,

    /// Show a progress bar on stderr
    #[arg(long)]
    progress: bool,

    /// Read/write buffer size in bytes (overrides config)
    #[arg(long, value_name = "BYTES")]
    buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FCRYPT_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "FCRYPT_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::from(e.exit_code())
        }
    }
}

/// Top-level message with the whole cause chain.
fn error_line(e: &FcryptError) -> String {
    format!("fcrypt: {e:#}")
}

fn run(cli: Cli) -> FcryptResult<()> {
    check_platform()?;

    let (config_path, explicit_config) = match &cli.config {
        Some(p) => (p.clone(), true),
        None => (expand_tilde(Path::new(DEFAULT_CONFIG_PATH)), false),
    };
    let loaded = FcryptConfig::load(&config_path)?;
    let found_config = loaded.is_some();
    let config = apply_overrides(loaded.unwrap_or_default(), &cli)?;

    init_logging(&config.log.level, &log_format(&config)?);

    if !found_config {
        if explicit_config {
            warn!("config file not found: {}  (using defaults)", config_path.display());
        } else {
            debug!(path = %config_path.display(), "no config file, using defaults");
        }
    }
    let mode = if cli.output.is_some() { "cipher" } else { "hash" };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        input = %cli.input.display(),
        mode,
        "fcrypt starting"
    );

    let options = IoOptions::from(&config);
    let progress_bar = make_progress_bar(&config, &cli.input)?;
    let progress = progress_bar.as_ref().map(progress_callback);

    let result = match &cli.output {
        Some(output) => cmd_cipher(
            &cli.input,
            output,
            cli.password.clone(),
            &options,
            progress.as_ref(),
        ),
        None => cmd_hash(
            &cli.input,
            cli.expect.as_deref(),
            &options,
            progress.as_ref(),
        ),
    };

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }
    result
}

// ── Config ────────────────────────────────────────────────────────────────────

/// Command-line flags win over the config file.
fn apply_overrides(mut config: FcryptConfig, cli: &Cli) -> FcryptResult<FcryptConfig> {
    if let Some(level) = &cli.log {
        config.log.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log.format = match format {
            LogFormat::Json => "json".into(),
            LogFormat::Text => "text".into(),
        };
    }
    if let Some(size) = cli.buffer_size {
        config.io.buffer_size = size;
    }
    if cli.progress {
        config.ui.progress = true;
    }
    config.validate()?;
    Ok(config)
}

fn log_format(config: &FcryptConfig) -> FcryptResult<LogFormat> {
    LogFormat::from_str(&config.log.format, true).map_err(FcryptError::Config)
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Logs go to stderr; stdout carries only digest lines.
fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(config: &FcryptConfig, input: &Path) -> FcryptResult<Option<ProgressBar>> {
    if !config.ui.progress {
        return Ok(None);
    }
    let Ok(meta) = std::fs::metadata(input) else {
        // the pipeline reports the open failure itself
        return Ok(None);
    };
    if meta.len() < config.ui.progress_min_bytes {
        return Ok(None);
    }

    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
    )
    .context("building progress bar style")?
    .progress_chars("=>-");

    let pb = ProgressBar::new(meta.len());
    pb.set_style(style);
    pb.set_prefix("fcrypt");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(pb))
}

fn progress_callback(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |done, total, msg| {
        pb.set_length(total);
        pb.set_position(done);
        pb.set_message(msg.to_string());
    })
}

// ── `fcrypt <input>` ──────────────────────────────────────────────────────────

fn cmd_hash(
    input: &Path,
    expect: Option<&str>,
    options: &IoOptions,
    progress: Option<&ProgressFn>,
) -> FcryptResult<()> {
    let expected = expect.map(Digest::from_hex).transpose()?;

    let report = fcrypt_file::hash_file(input, options, progress)?;
    println!("{}", format_digest_line(input, &report.digest));

    if let Some(expected) = expected {
        if expected != report.digest {
            return Err(FcryptError::DigestMismatch {
                path: input.to_path_buf(),
                expected: expected.to_hex(),
                actual: report.digest.to_hex(),
            });
        }
    }
    Ok(())
}

fn format_digest_line(input: &Path, digest: &Digest) -> String {
    format!("{}  -  {}", input.display(), digest)
}

// ── `fcrypt <input> <output> [<password>]` ────────────────────────────────────

fn cmd_cipher(
    input: &Path,
    output: &Path,
    password: Option<String>,
    options: &IoOptions,
    progress: Option<&ProgressFn>,
) -> FcryptResult<()> {
    let password = resolve_password(password)?;
    let report = fcrypt_file::transform_file(input, output, &password, options, progress)?;
    debug!(bytes = report.bytes, blocks = report.blocks, "done");
    Ok(())
}

fn resolve_password(arg: Option<String>) -> FcryptResult<SecretString> {
    if let Some(password) = arg {
        return Ok(SecretString::from(password));
    }
    let password = rpassword::prompt_password("fcrypt password: ")
        .context("reading password from terminal")?;
    Ok(SecretString::from(password))
}
