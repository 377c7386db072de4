//! Configuration: settings sections and the TOML-backed manager.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, ConfigSection, LoggingSettings, PathSettings, Settings, VideoSettings,
};
