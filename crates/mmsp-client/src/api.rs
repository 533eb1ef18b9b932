//! Typed management operations over [`MmspClient::call`].
//!
//! Each wrapper validates its arguments, shapes the positional params the
//! server expects and decodes the result. Validation failures never reach
//! the wire.

use mmsp_core::types::{
    Ban, GameRule, GameRuleValue, IpBan, Operator, Player, PlayerRef, ServerSettings, ServerStatus,
};
use mmsp_core::{ClientError, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::MmspClient;

/// Wire method names.
pub mod methods {
    /// List online players.
    pub const PLAYERS_LIST: &str = "minecraft:players/list";
    /// Kick players.
    pub const PLAYERS_KICK: &str = "minecraft:players/kick";
    /// List the allowlist.
    pub const ALLOWLIST_LIST: &str = "minecraft:allowlist/list";
    /// Add to the allowlist.
    pub const ALLOWLIST_ADD: &str = "minecraft:allowlist/add";
    /// Remove from the allowlist.
    pub const ALLOWLIST_REMOVE: &str = "minecraft:allowlist/remove";
    /// Replace the allowlist.
    pub const ALLOWLIST_SET: &str = "minecraft:allowlist/set";
    /// Empty the allowlist.
    pub const ALLOWLIST_CLEAR: &str = "minecraft:allowlist/clear";
    /// List name bans.
    pub const BANS_LIST: &str = "minecraft:bans/list";
    /// Ban players by name.
    pub const BANS_ADD: &str = "minecraft:bans/add";
    /// Lift name bans.
    pub const BANS_REMOVE: &str = "minecraft:bans/remove";
    /// List IP bans.
    pub const IP_BANS_LIST: &str = "minecraft:ip_bans/list";
    /// Ban addresses.
    pub const IP_BANS_ADD: &str = "minecraft:ip_bans/add";
    /// Lift IP bans.
    pub const IP_BANS_REMOVE: &str = "minecraft:ip_bans/remove";
    /// List operators.
    pub const OPERATORS_LIST: &str = "minecraft:operators/list";
    /// Grant operator.
    pub const OPERATORS_ADD: &str = "minecraft:operators/add";
    /// Revoke operator.
    pub const OPERATORS_REMOVE: &str = "minecraft:operators/remove";
    /// Server status.
    pub const SERVER_STATUS: &str = "minecraft:server/status";
    /// Save the world.
    pub const SERVER_SAVE: &str = "minecraft:server/save";
    /// Stop the server.
    pub const SERVER_STOP: &str = "minecraft:server/stop";
    /// Broadcast a system message.
    pub const SERVER_SYSTEM_MESSAGE: &str = "minecraft:server/system_message";
    /// Read server settings.
    pub const SERVER_SETTINGS_GET: &str = "minecraft:serversettings/get";
    /// Update server settings.
    pub const SERVER_SETTINGS_SET: &str = "minecraft:serversettings/set";
    /// List game rules.
    pub const GAME_RULES_LIST: &str = "minecraft:gamerules/list";
    /// Update a game rule.
    pub const GAME_RULES_SET: &str = "minecraft:gamerules/set";
    /// Schema discovery.
    pub const DISCOVER: &str = "rpc.discover";
}

use methods::{
    ALLOWLIST_ADD, ALLOWLIST_CLEAR, ALLOWLIST_LIST, ALLOWLIST_REMOVE, ALLOWLIST_SET, BANS_ADD,
    BANS_LIST, BANS_REMOVE, DISCOVER, GAME_RULES_LIST, GAME_RULES_SET, IP_BANS_ADD, IP_BANS_LIST,
    IP_BANS_REMOVE, OPERATORS_ADD, OPERATORS_LIST, OPERATORS_REMOVE, PLAYERS_KICK, PLAYERS_LIST,
    SERVER_SAVE, SERVER_SETTINGS_GET, SERVER_SETTINGS_SET, SERVER_STATUS, SERVER_STOP,
    SERVER_SYSTEM_MESSAGE,
};

/// Highest operator permission level, granted by default.
pub const MAX_PERMISSION_LEVEL: u8 = 4;

// ── validation ──────────────────────────────────────────────────────────────

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ClientError::invalid_argument("player name must not be empty"));
    }
    Ok(())
}

fn require_names(players: &[PlayerRef]) -> Result<()> {
    players.iter().try_for_each(|p| require_name(&p.name))
}

fn require_ip(ip: &str) -> Result<()> {
    if ip.trim().is_empty() {
        return Err(ClientError::invalid_argument("IP address must not be empty"));
    }
    Ok(())
}

fn to_param<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ClientError::invalid_argument(e.to_string()))
}

/// `{key: value, reason?, expires?}` as sent by the ban operations.
fn ban_entry(key: &str, value: Value, reason: Option<&str>, expires: Option<&str>) -> Value {
    let mut entry = Map::new();
    let _ = entry.insert(key.to_string(), value);
    if let Some(reason) = reason {
        let _ = entry.insert("reason".into(), Value::from(reason));
    }
    if let Some(expires) = expires {
        let _ = entry.insert("expires".into(), Value::from(expires));
    }
    Value::Object(entry)
}

impl MmspClient {
    async fn call_unit(&self, method: &str, params: Vec<Value>) -> Result<()> {
        let _ = self.call(method, params).await?;
        Ok(())
    }

    // ── players ─────────────────────────────────────────────────────

    /// Online players.
    pub async fn players(&self) -> Result<Vec<Player>> {
        self.request(PLAYERS_LIST, Vec::new()).await
    }

    /// Kick `player`, optionally telling them why.
    pub async fn kick_player(&self, player: &Player, reason: Option<&str>) -> Result<()> {
        require_name(&player.name)?;
        let mut params = vec![json!([to_param(player)?])];
        if let Some(text) = reason {
            params.push(json!({ "text": text }));
        }
        self.call_unit(PLAYERS_KICK, params).await
    }

    // ── allowlist ───────────────────────────────────────────────────

    /// Allowlisted players.
    pub async fn allowlist(&self) -> Result<Vec<Player>> {
        self.request(ALLOWLIST_LIST, Vec::new()).await
    }

    /// Add `players` to the allowlist; returns the updated list.
    pub async fn add_to_allowlist(&self, players: &[PlayerRef]) -> Result<Vec<Player>> {
        require_names(players)?;
        self.request(ALLOWLIST_ADD, vec![to_param(players)?]).await
    }

    /// Remove `players` from the allowlist.
    pub async fn remove_from_allowlist(&self, players: &[PlayerRef]) -> Result<()> {
        require_names(players)?;
        self.call_unit(ALLOWLIST_REMOVE, vec![to_param(players)?])
            .await
    }

    /// Replace the allowlist with `players`; returns the new list.
    pub async fn set_allowlist(&self, players: &[PlayerRef]) -> Result<Vec<Player>> {
        require_names(players)?;
        self.request(ALLOWLIST_SET, vec![to_param(players)?]).await
    }

    /// Empty the allowlist.
    pub async fn clear_allowlist(&self) -> Result<()> {
        self.call_unit(ALLOWLIST_CLEAR, Vec::new()).await
    }

    // ── bans ────────────────────────────────────────────────────────

    /// Name bans.
    pub async fn bans(&self) -> Result<Vec<Ban>> {
        self.request(BANS_LIST, Vec::new()).await
    }

    /// Ban `player`; returns the updated ban list.
    pub async fn add_ban(
        &self,
        player: &PlayerRef,
        reason: Option<&str>,
        expires: Option<&str>,
    ) -> Result<Vec<Ban>> {
        require_name(&player.name)?;
        let entry = ban_entry("name", Value::from(player.name.as_str()), reason, expires);
        self.request(BANS_ADD, vec![json!([entry])]).await
    }

    /// Lift the ban on `player`.
    pub async fn remove_ban(&self, player: &PlayerRef) -> Result<()> {
        require_name(&player.name)?;
        self.call_unit(BANS_REMOVE, vec![json!([to_param(player)?])])
            .await
    }

    /// IP bans.
    pub async fn ip_bans(&self) -> Result<Vec<IpBan>> {
        self.request(IP_BANS_LIST, Vec::new()).await
    }

    /// Ban `ip`; returns the updated IP ban list.
    pub async fn add_ip_ban(
        &self,
        ip: &str,
        reason: Option<&str>,
        expires: Option<&str>,
    ) -> Result<Vec<IpBan>> {
        require_ip(ip)?;
        let entry = ban_entry("ip", Value::from(ip), reason, expires);
        self.request(IP_BANS_ADD, vec![json!([entry])]).await
    }

    /// Lift the ban on `ip`.
    pub async fn remove_ip_ban(&self, ip: &str) -> Result<()> {
        require_ip(ip)?;
        self.call_unit(IP_BANS_REMOVE, vec![json!([{ "ip": ip }])])
            .await
    }

    // ── operators ───────────────────────────────────────────────────

    /// Operators.
    pub async fn operators(&self) -> Result<Vec<Operator>> {
        self.request(OPERATORS_LIST, Vec::new()).await
    }

    /// Grant operator to `player` at `permission_level` (0..=4).
    pub async fn add_operator(
        &self,
        player: &PlayerRef,
        permission_level: u8,
        bypasses_player_limit: bool,
    ) -> Result<Vec<Operator>> {
        require_name(&player.name)?;
        if permission_level > MAX_PERMISSION_LEVEL {
            return Err(ClientError::invalid_argument(format!(
                "permission level must be between 0 and {MAX_PERMISSION_LEVEL}, got {permission_level}"
            )));
        }
        let entry = json!({
            "name": player.name,
            "permissionLevel": permission_level,
            "bypassesPlayerLimit": bypasses_player_limit,
        });
        self.request(OPERATORS_ADD, vec![json!([entry])]).await
    }

    /// Revoke operator from `player`.
    pub async fn remove_operator(&self, player: &PlayerRef) -> Result<()> {
        require_name(&player.name)?;
        self.call_unit(OPERATORS_REMOVE, vec![json!([to_param(player)?])])
            .await
    }

    // ── server ──────────────────────────────────────────────────────

    /// Server status. Never fails: any error (including not being
    /// connected) is reported as [`ServerStatus::offline`].
    pub async fn server_status(&self) -> ServerStatus {
        match self.request::<ServerStatus>(SERVER_STATUS, Vec::new()).await {
            Ok(mut status) => {
                status.is_online = true;
                status
            }
            Err(err) => {
                debug!(error = %err, "status unavailable, reporting offline");
                ServerStatus::offline()
            }
        }
    }

    /// Save the world.
    pub async fn save_world(&self) -> Result<()> {
        self.call_unit(SERVER_SAVE, Vec::new()).await
    }

    /// Stop the server.
    pub async fn stop_server(&self) -> Result<()> {
        self.call_unit(SERVER_STOP, Vec::new()).await
    }

    /// Broadcast `text`, or send it only to `targets`.
    pub async fn send_system_message(&self, text: &str, targets: Option<&[Player]>) -> Result<()> {
        let mut params = vec![json!({ "text": text })];
        if let Some(players) = targets {
            params.push(to_param(players)?);
        }
        self.call_unit(SERVER_SYSTEM_MESSAGE, params).await
    }

    /// Current server settings.
    pub async fn server_settings(&self) -> Result<ServerSettings> {
        self.request(SERVER_SETTINGS_GET, Vec::new()).await
    }

    /// Apply the fields set in `partial`; returns the resulting settings.
    pub async fn update_server_settings(&self, partial: &ServerSettings) -> Result<ServerSettings> {
        if partial.is_empty() {
            return Err(ClientError::invalid_argument("no settings to update"));
        }
        self.request(SERVER_SETTINGS_SET, vec![to_param(partial)?])
            .await
    }

    // ── game rules ──────────────────────────────────────────────────

    /// Game rules with their current values.
    pub async fn game_rules(&self) -> Result<Vec<GameRule>> {
        self.request(GAME_RULES_LIST, Vec::new()).await
    }

    /// Set game rule `key` to `value`.
    pub async fn update_game_rule(&self, key: &str, value: impl Into<GameRuleValue>) -> Result<()> {
        if key.trim().is_empty() {
            return Err(ClientError::invalid_argument("game rule key must not be empty"));
        }
        let value = to_param(&value.into())?;
        self.call_unit(GAME_RULES_SET, vec![Value::from(key), value])
            .await
    }

    /// The server's self-described API schema.
    pub async fn discover_schema(&self) -> Result<Value> {
        self.call(DISCOVER, Vec::new()).await
    }
}
