//! # mmsp-settings
//!
//! Configuration for the MMSP client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`MmspSettings::default()`]
//! 2. **User file**: `~/.mmsp/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `MMSP_*` overrides (highest priority)
//!
//! Saved server endpoints live separately in `~/.mmsp/servers.json` and are
//! managed through [`ProfileStore`].

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod profiles;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use profiles::{NewProfile, ProfileStore, ProfileUpdate, ServerProfile, profiles_path};
pub use types::*;
