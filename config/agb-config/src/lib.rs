
use agb_common::frame::FrameSize;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

/// How the scene extractor decides which of BG2/BG3 are rotation/scaling layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AffineInference {
    /// BG2 and BG3 are always affine, BG0 and BG1 are always text
    #[default]
    AlwaysAffine,
    /// Follow the DISPCNT BG mode: mode 1 makes BG2 affine, mode 2 makes BG2 and BG3 affine,
    /// and layers that do not exist in the current mode are disabled
    DisplayMode,
}

/// Where OBJ rotation/scaling matrices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ObjAffineSource {
    /// The register file's 32 OBJ affine parameter sets
    #[default]
    Registers,
    /// The fourth halfword of each OAM entry, as on hardware
    Oam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ObjTileMapping {
    /// OBJ character rows are 32 tiles apart
    #[default]
    TwoDimensional,
    /// OBJ tiles are laid out consecutively
    OneDimensional,
}

impl ObjTileMapping {
    #[must_use]
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::OneDimensional } else { Self::TwoDimensional }
    }

    #[must_use]
    pub fn to_dispatch_value(self) -> u32 {
        match self {
            Self::TwoDimensional => 0,
            Self::OneDimensional => 1,
        }
    }
}

impl Display for ObjTileMapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwoDimensional => write!(f, "2D"),
            Self::OneDimensional => write!(f, "1D"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub frame_size: FrameSize,
    pub map_width_tiles: u32,
    pub map_height_tiles: u32,
    pub obj_char_base: u32,
    /// If not set, the mapping mode is read from DISPCNT bit 6
    pub obj_tile_mapping: Option<ObjTileMapping>,
    pub affine_inference: AffineInference,
    pub obj_affine_source: ObjAffineSource,
    pub parallel: bool,
    /// If not set, rayon picks the number of worker threads
    pub worker_threads: Option<usize>,
}

impl RenderConfig {
    pub const DEFAULT_OBJ_CHAR_BASE: u32 = 0x8000;

    /// Parse a config from TOML. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML or contains invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain a valid config.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .map_err(|source| ConfigLoadError::Io { path: path.to_path_buf(), source })?;

        let config = Self::from_toml_str(&config_str)?;
        log::info!("Loaded render config from '{}'", path.display());

        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the frame or map dimensions are zero.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.frame_size.width == 0 || self.frame_size.height == 0 {
            return Err(ConfigLoadError::InvalidFrameSize(self.frame_size));
        }

        if self.map_width_tiles == 0 || self.map_height_tiles == 0 {
            return Err(ConfigLoadError::InvalidMapSize {
                width: self.map_width_tiles,
                height: self.map_height_tiles,
            });
        }

        if self.worker_threads == Some(0) {
            return Err(ConfigLoadError::ZeroWorkerThreads);
        }

        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::AGB,
            map_width_tiles: 32,
            map_height_tiles: 32,
            obj_char_base: Self::DEFAULT_OBJ_CHAR_BASE,
            obj_tile_mapping: None,
            affine_inference: AffineInference::default(),
            obj_affine_source: ObjAffineSource::default(),
            parallel: true,
            worker_threads: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Error reading config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error parsing config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid frame size {}x{}; both dimensions must be non-zero", .0.width, .0.height)]
    InvalidFrameSize(FrameSize),
    #[error("Invalid map size {width}x{height} tiles; both dimensions must be non-zero")]
    InvalidMapSize { width: u32, height: u32 },
    #[error("Worker thread count must be non-zero if specified")]
    ZeroWorkerThreads,
}
