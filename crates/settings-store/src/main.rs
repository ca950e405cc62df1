//! settings-store – host front end for the launcher settings store.
//!
//! Runs the same load/save engine the device uses, with a directory standing
//! in for the SD card and a TOML file standing in for the NVS partition.
//! Useful for inspecting a card image, seeding credentials before shipping a
//! card, and reproducing recovery paths on a workstation.
//!
//! # Usage
//!
//! ```text
//! settings-store show
//! settings-store --sd-root /media/sdcard wifi-set "Home" "hunter2"
//! settings-store set brightness 75
//! settings-store set palette purple
//! RUST_LOG=debug settings-store save
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings_core::Palette;
use settings_store::infrastructure::device::MacIdentity;
use settings_store::infrastructure::flat_store::file::FileFlatStore;
use settings_store::infrastructure::removable::directory::DirectoryStorage;
use settings_store::infrastructure::storage::config::{load_config, HostConfig};
use settings_store::{DocumentWrite, SaveReport, SettingsEngine};

type HostEngine = SettingsEngine<DirectoryStorage, FileFlatStore>;

const MASK: &str = "********";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Launcher settings store.
///
/// Loads the settings exactly like the device does at boot (SD card first,
/// flash copy as fallback) and then runs the requested command.
#[derive(Debug, Parser)]
#[command(
    name = "settings-store",
    about = "Inspect and edit launcher settings on an SD card image and NVS file",
    version
)]
struct Cli {
    /// Host configuration file (defaults to the platform config directory).
    #[arg(long, env = "LAUNCHER_SETTINGS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory standing in for the SD card; overrides `sd_root`.
    #[arg(long, env = "LAUNCHER_SD_ROOT")]
    sd_root: Option<PathBuf>,

    /// TOML file standing in for NVS; overrides `nvs_path`.
    #[arg(long, env = "LAUNCHER_NVS_PATH")]
    nvs_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the loaded settings with passwords masked.
    Show,
    /// Load and save again, repairing both backends.
    Save,
    /// Print the saved password for a network.
    WifiGet { ssid: String },
    /// Add or update a network and save immediately.
    WifiSet { ssid: String, password: String },
    /// List saved network names.
    WifiList,
    /// Print the web UI session token.
    TokenGet,
    /// Store a web UI session token.
    TokenSet { token: String },
    /// Remove the web UI session token.
    TokenClear,
    /// Change one setting and save.
    Set { field: Field, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Field {
    Brightness,
    Dim,
    Rotation,
    OnlyBins,
    AskSpiffs,
    Dev,
    WuiUser,
    WuiPassword,
    DownloadPath,
    HubUrl,
    Palette,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("failed to load host config")?;
    if let Some(root) = cli.sd_root {
        config.sd_root = root;
    }
    if let Some(path) = cli.nvs_path {
        config.nvs_path = path;
    }

    // `RUST_LOG` wins; otherwise the level from the host config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let mut engine = build_engine(&config)?;
    let report = engine.load();
    if !report.medium_present {
        info!(sd_root = %config.sd_root.display(), "no card directory, using flash copy only");
    }

    run(&mut engine, cli.command)
}

fn build_engine(config: &HostConfig) -> anyhow::Result<HostEngine> {
    let mac = config.mac().context("invalid device_mac in host config")?;
    let flat = FileFlatStore::load(&config.nvs_path)
        .with_context(|| format!("failed to open NVS file {}", config.nvs_path.display()))?;
    Ok(SettingsEngine::new(
        DirectoryStorage::new(&config.sd_root),
        flat,
        &MacIdentity::new(mac),
        config.profile(),
    ))
}

fn run(engine: &mut HostEngine, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show => {
            let mut value = serde_json::to_value(engine.record())?;
            mask_secrets(&mut value);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Save => print_save(&engine.save()),
        Command::WifiGet { ssid } => match engine.lookup_credential(&ssid) {
            Some(password) => println!("{password}"),
            None => bail!("no saved network named {ssid:?}"),
        },
        Command::WifiSet { ssid, password } => {
            let outcome = engine.upsert_credential(&ssid, &password, true)?;
            println!("{ssid}: {outcome:?}");
        }
        Command::WifiList => {
            for entry in engine.record().wifi().iter() {
                println!("{}", entry.ssid);
            }
        }
        Command::TokenGet => match engine.get_token() {
            Some(token) => println!("{token}"),
            None => bail!("no session token stored"),
        },
        Command::TokenSet { token } => engine.set_token(&token)?,
        Command::TokenClear => engine.set_token("")?,
        Command::Set { field, value } => {
            apply_field(engine, field, &value)?;
            print_save(&engine.save());
        }
    }
    Ok(())
}

fn apply_field(engine: &mut HostEngine, field: Field, value: &str) -> anyhow::Result<()> {
    let record = engine.record_mut();
    match field {
        Field::Brightness => record.set_brightness(parse_number(value)?),
        Field::Dim => record.set_dim_timeout_secs(parse_number(value)?)?,
        Field::Rotation => record.set_rotation(parse_number(value)?)?,
        Field::OnlyBins => record.set_only_bins(parse_flag(value)?),
        Field::AskSpiffs => record.set_ask_spiffs(parse_flag(value)?),
        Field::Dev => record.set_dev_mode(parse_flag(value)?),
        Field::WuiUser => record.set_wui_username(value),
        Field::WuiPassword => record.set_wui_password(value),
        Field::DownloadPath => record.set_download_path(value),
        Field::HubUrl => record.set_hub_url(value),
        Field::Palette => {
            let palette = Palette::from_name(value).with_context(|| {
                let names: Vec<_> = Palette::ALL.iter().map(|p| p.name()).collect();
                format!("unknown palette {value:?}, expected one of {}", names.join(", "))
            })?;
            record.apply_palette(palette);
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("{value:?} is not a valid number"))
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => bail!("{value:?} is not a boolean (use true/false or 1/0)"),
    }
}

fn mask_secrets(value: &mut Value) {
    if let Some(pwd) = value.get_mut("wui_password") {
        *pwd = Value::from(MASK);
    }
    if let Some(Value::Array(entries)) = value.get_mut("wifi") {
        for entry in entries {
            if let Some(pwd) = entry.get_mut("pwd") {
                *pwd = Value::from(MASK);
            }
        }
    }
}

fn print_save(report: &SaveReport) {
    let document = match report.document {
        DocumentWrite::Written { bytes } => format!("written ({bytes} bytes)"),
        DocumentWrite::RecoveredWithTemplate { bytes } => {
            format!("write failed, card reset to template ({bytes} bytes)")
        }
        DocumentWrite::GaveUp => "write failed twice, card not updated".to_string(),
        DocumentWrite::MediumAbsent => "no card, skipped".to_string(),
    };
    println!("document: {document}");
    if report.flat.is_clean() {
        println!("flash: ok");
    } else {
        println!("flash: {} key(s) failed", report.flat.failed_key_count());
    }
}
