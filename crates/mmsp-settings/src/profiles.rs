//! Saved server profiles (`~/.mmsp/servers.json`).
//!
//! A profile is a named [`ConnectionConfig`] plus bookkeeping. The store keeps
//! exactly one default profile whenever it is non-empty and seeds a local
//! server profile when no file exists yet.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mmsp_core::ConnectionConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::loader::config_dir;

/// Name of the seeded profile.
pub const LOCAL_PROFILE_NAME: &str = "Local Vanilla Server";
/// Management port of a stock local server.
pub const LOCAL_PROFILE_PORT: u16 = 25585;

/// Resolve the path to the profiles file (`~/.mmsp/servers.json`).
pub fn profiles_path() -> PathBuf {
    config_dir().join("servers.json")
}

/// A saved server endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProfile {
    /// Stable identifier.
    pub id: String,
    /// Unique display name.
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// Management port.
    pub port: u16,
    /// Bearer secret.
    #[serde(default)]
    pub secret: String,
    /// Use `wss://`.
    #[serde(default)]
    pub use_tls: bool,
    /// Whether this is the default profile.
    #[serde(default)]
    pub is_default: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ServerProfile {
    /// Endpoint described by this profile.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.host.clone(), self.port, self.secret.clone())
            .with_tls(self.use_tls)
    }

    fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }
}

/// Fields for a new profile.
#[derive(Clone, Debug, Default)]
pub struct NewProfile {
    /// Display name.
    pub name: String,
    /// Hostname.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Bearer secret.
    pub secret: String,
    /// Use TLS.
    pub use_tls: bool,
    /// Make this the default profile.
    pub is_default: bool,
}

/// Partial update of a profile; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    /// New name.
    pub name: Option<String>,
    /// New host.
    pub host: Option<String>,
    /// New port.
    pub port: Option<u16>,
    /// New secret.
    pub secret: Option<String>,
    /// New TLS flag.
    pub use_tls: Option<bool>,
}

#[derive(Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: Vec<ServerProfile>,
}

/// Collection of saved profiles, optionally backed by a file.
#[derive(Debug)]
pub struct ProfileStore {
    path: Option<PathBuf>,
    profiles: Vec<ServerProfile>,
}

impl ProfileStore {
    /// A store that is never written to disk, seeded with the local profile.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            profiles: vec![local_profile()],
        }
    }

    /// Load from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(&profiles_path())
    }

    /// Load from `path`; a missing file yields the seeded store.
    pub fn load(path: &Path) -> Result<Self> {
        let profiles = if path.exists() {
            debug!(?path, "loading server profiles");
            let content = std::fs::read_to_string(path)?;
            let file: ProfileFile = serde_json::from_str(&content)?;
            file.profiles
        } else {
            debug!(?path, "profiles file not found, seeding local profile");
            vec![local_profile()]
        };
        let mut store = Self {
            path: Some(path.to_path_buf()),
            profiles,
        };
        store.repair_default();
        Ok(store)
    }

    /// Persist to the backing file, if any. Writes a sibling temp file and
    /// renames it into place.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = ProfileFile {
            profiles: self.profiles.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        debug!(?path, count = self.profiles.len(), "saved server profiles");
        Ok(())
    }

    /// All profiles in insertion order.
    pub fn profiles(&self) -> &[ServerProfile] {
        &self.profiles
    }

    /// Find by id or name.
    pub fn find(&self, key: &str) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.matches(key))
    }

    /// The default profile.
    pub fn default_profile(&self) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.is_default)
    }

    /// Add a profile. The first profile, or one flagged `is_default`, becomes
    /// the default.
    pub fn add(&mut self, new: NewProfile) -> Result<&ServerProfile> {
        validate_fields(&new.name, &new.host, new.port)?;
        if self.profiles.iter().any(|p| p.name == new.name) {
            return Err(SettingsError::DuplicateProfile(new.name));
        }

        let now = Utc::now();
        let make_default = new.is_default || self.profiles.is_empty();
        if make_default {
            for p in &mut self.profiles {
                p.is_default = false;
            }
        }
        self.profiles.push(ServerProfile {
            id: uuid::Uuid::now_v7().to_string(),
            name: new.name,
            host: new.host,
            port: new.port,
            secret: new.secret,
            use_tls: new.use_tls,
            is_default: make_default,
            created_at: now,
            updated_at: now,
        });
        Ok(&self.profiles[self.profiles.len() - 1])
    }

    /// Apply a partial update.
    pub fn update(&mut self, key: &str, update: ProfileUpdate) -> Result<&ServerProfile> {
        let idx = self.index_of(key)?;
        if let Some(name) = &update.name {
            if self
                .profiles
                .iter()
                .enumerate()
                .any(|(i, p)| i != idx && &p.name == name)
            {
                return Err(SettingsError::DuplicateProfile(name.clone()));
            }
        }

        let current = &self.profiles[idx];
        let name = update.name.unwrap_or_else(|| current.name.clone());
        let host = update.host.unwrap_or_else(|| current.host.clone());
        let port = update.port.unwrap_or(current.port);
        validate_fields(&name, &host, port)?;

        let profile = &mut self.profiles[idx];
        profile.name = name;
        profile.host = host;
        profile.port = port;
        if let Some(secret) = update.secret {
            profile.secret = secret;
        }
        if let Some(use_tls) = update.use_tls {
            profile.use_tls = use_tls;
        }
        profile.updated_at = Utc::now();
        Ok(&self.profiles[idx])
    }

    /// Remove a profile. If it was the default, the first remaining profile
    /// takes over.
    pub fn remove(&mut self, key: &str) -> Result<ServerProfile> {
        let idx = self.index_of(key)?;
        let removed = self.profiles.remove(idx);
        self.repair_default();
        Ok(removed)
    }

    /// Mark one profile as the default.
    pub fn set_default(&mut self, key: &str) -> Result<()> {
        let idx = self.index_of(key)?;
        for (i, p) in self.profiles.iter_mut().enumerate() {
            p.is_default = i == idx;
        }
        Ok(())
    }

    fn index_of(&self, key: &str) -> Result<usize> {
        self.profiles
            .iter()
            .position(|p| p.matches(key))
            .ok_or_else(|| SettingsError::ProfileNotFound(key.to_string()))
    }

    /// Enforce "exactly one default when non-empty".
    fn repair_default(&mut self) {
        let mut seen = false;
        for p in &mut self.profiles {
            if p.is_default && !seen {
                seen = true;
            } else {
                p.is_default = false;
            }
        }
        if !seen {
            if let Some(first) = self.profiles.first_mut() {
                first.is_default = true;
            }
        }
    }
}

fn local_profile() -> ServerProfile {
    let now = Utc::now();
    ServerProfile {
        id: "default".to_string(),
        name: LOCAL_PROFILE_NAME.to_string(),
        host: "localhost".to_string(),
        port: LOCAL_PROFILE_PORT,
        secret: String::new(),
        use_tls: false,
        is_default: true,
        created_at: now,
        updated_at: now,
    }
}

fn validate_fields(name: &str, host: &str, port: u16) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SettingsError::InvalidValue("profile name must not be empty".into()));
    }
    if host.trim().is_empty() {
        return Err(SettingsError::InvalidValue("profile host must not be empty".into()));
    }
    if port == 0 {
        return Err(SettingsError::InvalidValue("profile port must not be 0".into()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn survival() -> NewProfile {
        NewProfile {
            name: "survival".into(),
            host: "mc.example.org".into(),
            port: 25585,
            secret: "s3cret".into(),
            use_tls: true,
            is_default: false,
        }
    }

    fn default_count(store: &ProfileStore) -> usize {
        store.profiles().iter().filter(|p| p.is_default).count()
    }

    #[test]
    fn in_memory_is_seeded_with_local_profile() {
        let store = ProfileStore::in_memory();
        let local = store.default_profile().unwrap();
        assert_eq!(local.name, LOCAL_PROFILE_NAME);
        assert_eq!(local.connection_config().url(), "ws://localhost:25585");
    }

    #[test]
    fn add_keeps_existing_default() {
        let mut store = ProfileStore::in_memory();
        let added = store.add(survival()).unwrap();
        assert!(!added.is_default);
        assert_eq!(store.default_profile().unwrap().name, LOCAL_PROFILE_NAME);
        assert_eq!(default_count(&store), 1);
    }

    #[test]
    fn add_as_default_moves_flag() {
        let mut store = ProfileStore::in_memory();
        let _ = store
            .add(NewProfile {
                is_default: true,
                ..survival()
            })
            .unwrap();
        assert_eq!(store.default_profile().unwrap().name, "survival");
        assert_eq!(default_count(&store), 1);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut store = ProfileStore::in_memory();
        let _ = store.add(survival()).unwrap();
        assert_matches!(store.add(survival()), Err(SettingsError::DuplicateProfile(_)));
    }

    #[test]
    fn invalid_fields_rejected() {
        let mut store = ProfileStore::in_memory();
        assert_matches!(
            store.add(NewProfile {
                port: 0,
                ..survival()
            }),
            Err(SettingsError::InvalidValue(_))
        );
        assert_matches!(
            store.add(NewProfile {
                host: " ".into(),
                ..survival()
            }),
            Err(SettingsError::InvalidValue(_))
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut store = ProfileStore::in_memory();
        let _ = store.add(survival()).unwrap();
        let updated = store
            .update(
                "survival",
                ProfileUpdate {
                    port: Some(25600),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.port, 25600);
        assert_eq!(updated.host, "mc.example.org");
        assert!(updated.use_tls);
    }

    #[test]
    fn update_rename_to_existing_rejected() {
        let mut store = ProfileStore::in_memory();
        let _ = store.add(survival()).unwrap();
        let result = store.update(
            "survival",
            ProfileUpdate {
                name: Some(LOCAL_PROFILE_NAME.into()),
                ..ProfileUpdate::default()
            },
        );
        assert_matches!(result, Err(SettingsError::DuplicateProfile(_)));
    }

    #[test]
    fn removing_default_promotes_first_remaining() {
        let mut store = ProfileStore::in_memory();
        let _ = store.add(survival()).unwrap();
        let removed = store.remove("default").unwrap();
        assert_eq!(removed.name, LOCAL_PROFILE_NAME);
        assert_eq!(store.default_profile().unwrap().name, "survival");
    }

    #[test]
    fn set_default_and_unknown_key() {
        let mut store = ProfileStore::in_memory();
        let _ = store.add(survival()).unwrap();
        store.set_default("survival").unwrap();
        assert_eq!(store.default_profile().unwrap().name, "survival");
        assert_eq!(default_count(&store), 1);
        assert_matches!(store.set_default("creative"), Err(SettingsError::ProfileNotFound(_)));
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("servers.json");

        let mut store = ProfileStore::load(&path).unwrap();
        let _ = store.add(survival()).unwrap();
        store.save().unwrap();

        let reloaded = ProfileStore::load(&path).unwrap();
        assert_eq!(reloaded.profiles(), store.profiles());
        assert!(reloaded.find("survival").is_some());
    }

    #[test]
    fn load_repairs_multiple_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        let now = Utc::now().to_rfc3339();
        let json = format!(
            r#"{{"profiles": [
                {{"id": "a", "name": "a", "host": "h", "port": 1, "isDefault": true, "createdAt": "{now}", "updatedAt": "{now}"}},
                {{"id": "b", "name": "b", "host": "h", "port": 2, "isDefault": true, "createdAt": "{now}", "updatedAt": "{now}"}}
            ]}}"#
        );
        std::fs::write(&path, json).unwrap();

        let store = ProfileStore::load(&path).unwrap();
        assert_eq!(default_count(&store), 1);
        assert_eq!(store.default_profile().unwrap().id, "a");
    }

    #[test]
    fn in_memory_save_is_noop() {
        ProfileStore::in_memory().save().unwrap();
    }
}
