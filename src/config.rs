//! CLI/config layer (spec §6).
//!
//! `EngineConfig` is parsed once at startup and handed to `World::new`;
//! nothing downstream re-reads `std::env` or argv directly. An optional
//! TOML config file can supply the same fields as a lower-priority layer
//! beneath explicit CLI flags, the common "file for defaults, flags for
//! overrides" shape.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_RESOLUTION_SCALE: f32 = 0.7;
const DEFAULT_SAVE_PATH: &str = "world_save";

#[derive(Debug, Clone, Parser)]
#[command(name = "voxel-world-engine", about = "Voxel sandbox world engine core")]
pub struct EngineConfig {
    /// Deterministic world seed. A random seed is drawn if omitted.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Render distance in chunks; loads a `(2R+1)^2` neighborhood.
    #[arg(long, default_value_t = crate::constants::RENDER_DISTANCE as u32)]
    pub render_distance: u32,

    /// Resolution scale forwarded to the renderer; the core does not
    /// interpret this value itself.
    #[arg(long, default_value_t = DEFAULT_RESOLUTION_SCALE)]
    pub resolution_scale: f32,

    /// Root directory for textures/models/sounds, consumed by the asset
    /// loader collaborator (§6). Defaults to `$VOXEL_ASSET_ROOT` or `assets/`.
    #[arg(long)]
    pub asset_root: Option<PathBuf>,

    /// Directory for the durable per-chunk delta store (§4.5).
    #[arg(long, default_value = DEFAULT_SAVE_PATH)]
    pub save_path: PathBuf,

    /// Optional TOML file supplying defaults for any field left at its
    /// built-in default above (explicit CLI flags always win).
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

/// Mirrors `EngineConfig`, but every field is optional so a partial TOML
/// file only overrides what it actually names.
#[derive(Debug, Default, Deserialize)]
struct ConfigFileOverrides {
    seed: Option<u32>,
    render_distance: Option<u32>,
    resolution_scale: Option<f32>,
    asset_root: Option<PathBuf>,
    save_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Parse from `std::env::args`, layer in an optional config file, then
    /// fall back to `$VOXEL_ASSET_ROOT` for the asset root if still unset.
    pub fn from_args() -> Self {
        let mut cfg = Self::parse();
        if let Some(path) = cfg.config_file.clone() {
            cfg.apply_file_overrides(&path);
        }
        if cfg.asset_root.is_none() {
            cfg.asset_root = std::env::var_os("VOXEL_ASSET_ROOT").map(PathBuf::from);
        }
        cfg
    }

    /// Fill in any field still sitting at its built-in default from the
    /// TOML file at `path`. A missing/unreadable/malformed file degrades
    /// to "no overrides" rather than aborting startup (spec §7: config
    /// problems are not fatal).
    fn apply_file_overrides(&mut self, path: &Path) {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("config file {path:?} unreadable: {e}; using built-in defaults");
                return;
            }
        };
        let overrides: ConfigFileOverrides = match toml::from_str(&text) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("config file {path:?} failed to parse: {e}; using built-in defaults");
                return;
            }
        };

        if self.seed.is_none() {
            self.seed = overrides.seed;
        }
        if self.render_distance == crate::constants::RENDER_DISTANCE as u32 {
            if let Some(v) = overrides.render_distance {
                self.render_distance = v;
            }
        }
        if (self.resolution_scale - DEFAULT_RESOLUTION_SCALE).abs() < f32::EPSILON {
            if let Some(v) = overrides.resolution_scale {
                self.resolution_scale = v;
            }
        }
        if self.asset_root.is_none() {
            self.asset_root = overrides.asset_root;
        }
        if self.save_path == PathBuf::from(DEFAULT_SAVE_PATH) {
            if let Some(v) = overrides.save_path {
                self.save_path = v;
            }
        }
    }

    pub fn resolved_seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| rand::random())
    }

    pub fn asset_root_or_default(&self) -> PathBuf {
        self.asset_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets"))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            render_distance: crate::constants::RENDER_DISTANCE as u32,
            resolution_scale: 0.7,
            asset_root: None,
            save_path: PathBuf::from("world_save"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_render_distance_matches_constant() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.render_distance, crate::constants::RENDER_DISTANCE as u32);
    }

    #[test]
    fn resolved_seed_is_stable_when_set() {
        let cfg = EngineConfig {
            seed: Some(42),
            ..EngineConfig::default()
        };
        assert_eq!(cfg.resolved_seed(), 42);
    }
}
