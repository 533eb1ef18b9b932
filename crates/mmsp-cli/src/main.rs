//! `mmsp`: drive a Minecraft server's management protocol from the shell.

mod cli;
mod commands;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mmsp_client::{ClientOptions, MmspClient};
use mmsp_core::ConnectionConfig;
use mmsp_core::logging::init_subscriber;
use mmsp_settings::{MmspSettings, ProfileStore, load_settings};
use tracing::info;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings().context("failed to load settings")?;
    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    init_subscriber(level, settings.logging.format);

    let mut store = ProfileStore::load_default().context("failed to load server profiles")?;

    if let Command::Profiles { action } = &cli.command {
        let (output, changed) = commands::profiles(&mut store, action.clone())?;
        if changed {
            store.save().context("failed to save server profiles")?;
        }
        println!("{output}");
        return Ok(());
    }

    let config = resolve_endpoint(&cli, &settings, &store)?;
    let client = MmspClient::with_options(client_options(&settings));

    info!(url = %config.url(), "connecting");
    client
        .connect(config.clone())
        .await
        .with_context(|| format!("failed to connect to {}", config.url()))?;

    let result = commands::run(&client, cli.command).await;
    client.disconnect();
    result
}

fn client_options(settings: &MmspSettings) -> ClientOptions {
    ClientOptions {
        call_timeout: settings.client.call_timeout(),
        reconnect_delay: settings.client.reconnect_delay(),
    }
}

/// Pick the endpoint: explicit `--host`, else the named, active or default
/// profile, with `--port`, `--secret` and `--tls` layered on top.
fn resolve_endpoint(
    cli: &Cli,
    settings: &MmspSettings,
    store: &ProfileStore,
) -> Result<ConnectionConfig> {
    let mut config = if let Some(host) = &cli.host {
        let Some(port) = cli.port else {
            bail!("--host requires --port");
        };
        ConnectionConfig::new(host.clone(), port, String::new())
    } else {
        let profile = match cli.profile.as_deref().or(settings.active_profile.as_deref()) {
            Some(key) => store
                .find(key)
                .with_context(|| format!("no saved profile named {key}"))?,
            None => store
                .default_profile()
                .context("no default profile; pass --host/--port or add one with `mmsp profiles add`")?,
        };
        profile.connection_config()
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(secret) = &cli.secret {
        config.secret.clone_from(secret);
    }
    if cli.tls {
        config.use_tls = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use mmsp_settings::NewProfile;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mmsp").chain(args.iter().copied())).unwrap()
    }

    fn store_with_survival() -> ProfileStore {
        let mut store = ProfileStore::in_memory();
        let _ = store
            .add(NewProfile {
                name: "survival".into(),
                host: "10.0.0.5".into(),
                port: 25600,
                secret: "pw".into(),
                use_tls: false,
                is_default: false,
            })
            .unwrap();
        store
    }

    #[test]
    fn explicit_host_bypasses_profiles() {
        let cli = parse(&["--host", "mc.example", "--port", "25585", "--secret", "x", "players"]);
        let config =
            resolve_endpoint(&cli, &MmspSettings::default(), &ProfileStore::in_memory()).unwrap();
        assert_eq!(config.host, "mc.example");
        assert_eq!(config.port, 25585);
        assert_eq!(config.secret, "x");
    }

    #[test]
    fn host_without_port_is_rejected() {
        let cli = parse(&["--host", "mc.example", "players"]);
        let err = resolve_endpoint(&cli, &MmspSettings::default(), &ProfileStore::in_memory())
            .unwrap_err();
        assert_eq!(err.to_string(), "--host requires --port");
    }

    #[test]
    fn falls_back_to_default_profile() {
        let cli = parse(&["status"]);
        let store = ProfileStore::in_memory();
        let config = resolve_endpoint(&cli, &MmspSettings::default(), &store).unwrap();
        assert_eq!(config, store.default_profile().unwrap().connection_config());
    }

    #[test]
    fn named_profile_with_overrides() {
        let cli = parse(&["--profile", "survival", "--tls", "--secret", "override", "players"]);
        let config =
            resolve_endpoint(&cli, &MmspSettings::default(), &store_with_survival()).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 25600);
        assert_eq!(config.secret, "override");
        assert!(config.use_tls);
    }

    #[test]
    fn active_profile_from_settings() {
        let cli = parse(&["players"]);
        let settings = MmspSettings {
            active_profile: Some("survival".into()),
            ..MmspSettings::default()
        };
        let config = resolve_endpoint(&cli, &settings, &store_with_survival()).unwrap();
        assert_eq!(config.port, 25600);
    }

    #[test]
    fn unknown_profile_errors() {
        let cli = parse(&["--profile", "creative", "players"]);
        let err = resolve_endpoint(&cli, &MmspSettings::default(), &ProfileStore::in_memory())
            .unwrap_err();
        assert_eq!(err.to_string(), "no saved profile named creative");
    }

    #[test]
    fn client_options_follow_settings() {
        let mut settings = MmspSettings::default();
        settings.client.call_timeout_ms = 1_500;
        let options = client_options(&settings);
        assert_eq!(options.call_timeout.as_millis(), 1_500);
    }
}
