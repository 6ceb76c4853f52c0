use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gauthenticator::{
    config::{FileConfig, Options, Overrides},
    keygen, uri_helper, CodeResult, Settings, Totp,
};
use log::LevelFilter;

/// Time-based one-time password generator, compatible with Google Authenticator
#[derive(Parser, Debug)]
#[command(name = "gauth", version)]
struct Cli {
    /// Generate a new TOTP salt
    #[arg(long = "gen")]
    generate: bool,

    /// When using --gen, set this as the account
    #[arg(long)]
    account: Option<String>,

    /// When using --gen, use this as the key instead of a random one
    #[arg(long)]
    key: Option<String>,

    /// Debugging output
    #[arg(long)]
    debug: bool,

    /// Use SHA256 instead of SHA1
    #[arg(long)]
    sha256: bool,

    /// Time interval in seconds to use for the token
    #[arg(long = "int", value_name = "SECONDS")]
    interval: Option<u64>,

    /// Provide your own salt
    #[arg(long)]
    salt: Option<String>,

    /// Alternate configuration file to read
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config.clone().or_else(FileConfig::default_path) {
        Some(path) => FileConfig::load(&path)?,
        None => None,
    };
    log::debug!("read-in config: {config:?}");

    let options = Options::resolve(
        Overrides {
            salt: cli.salt,
            interval: cli.interval,
            sha256: cli.sha256,
            debug: cli.debug,
        },
        config,
    )?;

    if cli.generate {
        let key = cli
            .key
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| keygen::generate_random(options.algorithm));
        let account = cli
            .account
            .filter(|a| !a.is_empty())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default();

        println!("{}", render_enrollment(&options.settings, &account, &key)?);

        return Ok(());
    }

    let mut totp = Totp::new(options.salt()?)?;
    totp.with_algorithm(options.algorithm)
        .with_period(options.interval)
        .with_settings(&options.settings);

    let result = totp.current_code()?;
    println!("{}", render_code(&result));

    Ok(())
}

fn render_code(result: &CodeResult) -> String {
    format!("{} (expires in {}s)", result.code, result.expires_in)
}

/// The salt followed by the QR chart URL that enrolls it
fn render_enrollment(settings: &Settings, account: &str, key: &str) -> anyhow::Result<String> {
    let qr = uri_helper::build_enrollment_uri(settings, account, key.as_bytes())
        .context("building the enrollment URI")?;

    Ok(format!("salt: {key}\n{qr}"))
}
