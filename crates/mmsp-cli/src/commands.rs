//! Command execution.

use std::pin::pin;

use anyhow::{Context, Result, anyhow};
use mmsp_client::{ActivityLog, MmspClient};
use mmsp_core::Notification;
use mmsp_core::types::{Player, PlayerRef};
use mmsp_settings::{NewProfile, ProfileStore, ProfileUpdate, ServerProfile};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{Command, ProfileAction};

// ─── profiles ──────────────────────────────────────────────────────────────

/// Apply a profile action to `store`. Returns the text to print and whether
/// the store changed.
pub fn profiles(store: &mut ProfileStore, action: ProfileAction) -> Result<(String, bool)> {
    match action {
        ProfileAction::List => Ok((list_profiles(store.profiles()), false)),
        ProfileAction::Add {
            name,
            host,
            port,
            secret,
            tls,
            default,
        } => {
            let added = store.add(NewProfile {
                name,
                host,
                port,
                secret,
                use_tls: tls,
                is_default: default,
            })?;
            Ok((format!("added profile {} ({})", added.name, added.id), true))
        }
        ProfileAction::Edit {
            name,
            rename,
            host,
            port,
            secret,
            tls,
        } => {
            let updated = store.update(
                &name,
                ProfileUpdate {
                    name: rename,
                    host,
                    port,
                    secret,
                    use_tls: tls,
                },
            )?;
            Ok((format!("updated profile {}", updated.name), true))
        }
        ProfileAction::Remove { name } => {
            let removed = store.remove(&name)?;
            Ok((format!("removed profile {}", removed.name), true))
        }
        ProfileAction::Default { name } => {
            store.set_default(&name)?;
            Ok((format!("default profile is now {name}"), true))
        }
    }
}

fn list_profiles(profiles: &[ServerProfile]) -> String {
    if profiles.is_empty() {
        return "no saved profiles".into();
    }
    profiles
        .iter()
        .map(|p| {
            let marker = if p.is_default { '*' } else { ' ' };
            let scheme = if p.use_tls { "wss" } else { "ws" };
            format!("{marker} {}  {scheme}://{}:{}", p.name, p.host, p.port)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ─── server commands ───────────────────────────────────────────────────────

/// Run a server command on a connected client.
pub async fn run(client: &MmspClient, command: Command) -> Result<()> {
    match command {
        Command::Profiles { .. } => Err(anyhow!("profile commands do not need a connection")),
        Command::Status => print_json(&client.server_status().await),
        Command::Players => print_json(&client.players().await?),
        Command::Allowlist => print_json(&client.allowlist().await?),
        Command::Bans => print_json(&client.bans().await?),
        Command::IpBans => print_json(&client.ip_bans().await?),
        Command::Operators => print_json(&client.operators().await?),
        Command::Gamerules => print_json(&client.game_rules().await?),
        Command::Settings => print_json(&client.server_settings().await?),
        Command::Discover => print_json(&client.discover_schema().await?),
        Command::Kick { name, reason } => {
            let online = client.players().await?;
            let player = find_online(&online, &name)?;
            client.kick_player(player, reason.as_deref()).await?;
            info!(player = %player.name, "kicked");
            println!("kicked {}", player.name);
            Ok(())
        }
        Command::Ban {
            name,
            reason,
            expires,
        } => {
            let bans = client
                .add_ban(&PlayerRef::new(name), reason.as_deref(), expires.as_deref())
                .await?;
            print_json(&bans)
        }
        Command::Unban { name } => {
            client.remove_ban(&PlayerRef::new(&name)).await?;
            println!("unbanned {name}");
            Ok(())
        }
        Command::Op {
            name,
            level,
            bypass,
        } => print_json(&client.add_operator(&PlayerRef::new(name), level, bypass).await?),
        Command::Deop { name } => {
            client.remove_operator(&PlayerRef::new(&name)).await?;
            println!("deopped {name}");
            Ok(())
        }
        Command::Say { text } => {
            client.send_system_message(&text, None).await?;
            println!("sent");
            Ok(())
        }
        Command::Save => {
            client.save_world().await?;
            println!("world saved");
            Ok(())
        }
        Command::Stop => {
            client.stop_server().await?;
            println!("stop requested");
            Ok(())
        }
        Command::Watch => watch(client).await,
    }
}

/// Case-insensitive lookup among online players.
fn find_online<'a>(online: &'a [Player], name: &str) -> Result<&'a Player> {
    online
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("player {name} is not online"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{text}");
    Ok(())
}

// ─── watch ─────────────────────────────────────────────────────────────────

async fn watch(client: &MmspClient) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    let notes = client.on_notification(move |n| {
        let _ = tx.send(n.clone());
    });
    let states = client.on_state_change(|state| match &state.error {
        Some(error) => eprintln!("-- {} ({error})", state.status.as_str()),
        None => eprintln!("-- {}", state.status.as_str()),
    });

    let mut log = ActivityLog::new();
    let mut ctrl_c = pin!(tokio::signal::ctrl_c());
    eprintln!("watching for server events, Ctrl-C to stop");

    loop {
        tokio::select! {
            note = rx.recv() => {
                let Some(note) = note else { break };
                println!("{}", log.record_notification(&note));
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    notes.unsubscribe();
    states.unsubscribe();
    debug!(recorded = log.len(), "watch finished");
    Ok(())
}
