//! Configuration module for Skriv.
//!
//! Handles loading and merging application settings from the config file,
//! environment variables, and CLI flags.

mod settings;

pub use settings::{
    GeneralSettings, PipelineSettings, Settings, WhisperModel, WhisperSettings,
};
