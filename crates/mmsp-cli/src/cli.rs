//! Command-line arguments.

use clap::{Parser, Subcommand};
use mmsp_client::MAX_PERMISSION_LEVEL;

/// Manage a Minecraft server over its management protocol.
#[derive(Parser, Debug)]
#[command(name = "mmsp", version, about = "Manage a Minecraft server over its management protocol")]
pub struct Cli {
    /// Saved profile to connect with (name or id).
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Server host; bypasses saved profiles.
    #[arg(long)]
    pub host: Option<String>,

    /// Management port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Bearer secret.
    #[arg(long, env = "MMSP_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Connect with `wss://`.
    #[arg(long)]
    pub tls: bool,

    /// Log filter (e.g. `debug`, `mmsp_client=trace`); overrides settings.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Manage saved server profiles.
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show server status.
    Status,
    /// List online players.
    Players,
    /// Show the allowlist.
    Allowlist,
    /// List name bans.
    Bans,
    /// List IP bans.
    IpBans,
    /// List operators.
    Operators,
    /// List game rules.
    Gamerules,
    /// Show server settings.
    Settings,
    /// Print the server's API schema.
    Discover,
    /// Kick an online player.
    Kick {
        /// Player name.
        name: String,
        /// Message shown to the player.
        #[arg(long)]
        reason: Option<String>,
    },
    /// Ban a player by name.
    Ban {
        /// Player name.
        name: String,
        /// Ban reason.
        #[arg(long)]
        reason: Option<String>,
        /// Expiry timestamp.
        #[arg(long)]
        expires: Option<String>,
    },
    /// Lift a name ban.
    Unban {
        /// Player name.
        name: String,
    },
    /// Grant operator.
    Op {
        /// Player name.
        name: String,
        /// Permission level (0-4).
        #[arg(long, default_value_t = MAX_PERMISSION_LEVEL)]
        level: u8,
        /// Allow joining a full server.
        #[arg(long)]
        bypass: bool,
    },
    /// Revoke operator.
    Deop {
        /// Player name.
        name: String,
    },
    /// Broadcast a system message.
    Say {
        /// Message text.
        text: String,
    },
    /// Save the world.
    Save,
    /// Stop the server.
    Stop,
    /// Stream server events until Ctrl-C.
    Watch,
}

/// `mmsp profiles` actions.
#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum ProfileAction {
    /// List saved profiles.
    List,
    /// Save a new profile.
    Add {
        /// Profile name.
        name: String,
        /// Server host.
        #[arg(long)]
        host: String,
        /// Management port.
        #[arg(long)]
        port: u16,
        /// Bearer secret.
        #[arg(long, default_value = "")]
        secret: String,
        /// Connect with `wss://`.
        #[arg(long)]
        tls: bool,
        /// Make this the default profile.
        #[arg(long)]
        default: bool,
    },
    /// Change a saved profile.
    Edit {
        /// Profile name or id.
        name: String,
        /// New name.
        #[arg(long)]
        rename: Option<String>,
        /// New host.
        #[arg(long)]
        host: Option<String>,
        /// New port.
        #[arg(long)]
        port: Option<u16>,
        /// New secret.
        #[arg(long)]
        secret: Option<String>,
        /// Enable or disable TLS.
        #[arg(long)]
        tls: Option<bool>,
    },
    /// Delete a profile.
    Remove {
        /// Profile name or id.
        name: String,
    },
    /// Make a profile the default.
    Default {
        /// Profile name or id.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn kebab_case_subcommand() {
        let cli = Cli::try_parse_from(["mmsp", "ip-bans"]).unwrap();
        assert_eq!(cli.command, Command::IpBans);
    }

    #[test]
    fn op_defaults_to_max_level() {
        let cli = Cli::try_parse_from(["mmsp", "op", "Alex"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Op {
                name: "Alex".into(),
                level: 4,
                bypass: false
            }
        );
    }

    #[test]
    fn endpoint_flags_before_subcommand() {
        let cli = Cli::try_parse_from(["mmsp", "--host", "mc.example", "--port", "25585", "players"])
            .unwrap();
        assert_eq!(cli.host.as_deref(), Some("mc.example"));
        assert_eq!(cli.port, Some(25585));
        assert_eq!(cli.command, Command::Players);
    }

    #[test]
    fn profile_add_parses() {
        let cli = Cli::try_parse_from([
            "mmsp", "profiles", "add", "survival", "--host", "10.0.0.5", "--port", "25585", "--default",
        ])
        .unwrap();
        assert_matches::assert_matches!(
            cli.command,
            Command::Profiles {
                action: ProfileAction::Add { ref name, port: 25585, default: true, .. }
            } if name == "survival"
        );
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
    }

    #[test]
    fn profile_add_takes_secret_and_tls() {
        let cli = Cli::try_parse_from([
            "mmsp", "profiles", "add", "x", "--host", "h", "--port", "1", "--secret", "pw", "--tls",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Profiles {
                action: ProfileAction::Add {
                    name: "x".into(),
                    host: "h".into(),
                    port: 1,
                    secret: "pw".into(),
                    tls: true,
                    default: false,
                }
            }
        );
        assert!(!cli.tls);
    }

    #[test]
    fn profile_edit_parses_optional_fields() {
        let cli = Cli::try_parse_from([
            "mmsp", "profiles", "edit", "x", "--rename", "y", "--host", "h2", "--tls", "false",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Profiles {
                action: ProfileAction::Edit {
                    name: "x".into(),
                    rename: Some("y".into()),
                    host: Some("h2".into()),
                    port: None,
                    secret: None,
                    tls: Some(false),
                }
            }
        );
    }
}
