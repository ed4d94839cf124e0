//! Billboard chain options with TOML preset support.
//!
//! Every setting a chain can be configured with (capacity, vertex
//! channels, texture-coordinate layout, facing, draw state) is consolidated
//! here. Options serialize to/from TOML so trail presets can live next to
//! other assets.

mod geometry;
mod render;

use std::path::Path;

pub use geometry::GeometryOptions;
pub use render::RenderOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[render]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct ChainOptions {
    /// Capacity and vertex-generation options.
    pub geometry: GeometryOptions,
    /// Texture and draw-state options.
    pub render: RenderOptions,
}

impl ChainOptions {
    /// Generate JSON Schema describing the options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ChainOptions)
    }

    /// Reject settings no chain could be built from.
    pub fn validate(&self) -> Result<(), ChainError> {
        let g = &self.geometry;
        if g.max_elements == 0 {
            return Err(ChainError::InvalidConfiguration(
                "max_elements must be at least 1".to_owned(),
            ));
        }
        if !g.use_texture_coords && !g.use_vertex_colours {
            return Err(ChainError::InvalidConfiguration(
                "texture coordinates and vertex colours cannot both be disabled".to_owned(),
            ));
        }
        if !g.face_camera && g.normal == [0.0; 3] {
            return Err(ChainError::InvalidConfiguration(
                "normal must be non-zero when not facing the camera".to_owned(),
            ));
        }
        Ok(())
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ChainError> {
        let content = std::fs::read_to_string(path).map_err(ChainError::Io)?;
        let options: Self =
            toml::from_str(&content).map_err(|e| ChainError::OptionsParse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), ChainError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChainError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ChainError::Io)?;
        }
        std::fs::write(path, content).map_err(ChainError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
