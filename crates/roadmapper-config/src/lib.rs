//! Configuration for roadmapper.
//!
//! Precedence is CLI > config file > defaults. Every effective value records
//! where it came from so `roadmapper config` can explain itself.

pub mod config;

pub use config::{
    AnthropicConfig, CliArgs, Config, ConfigBuilder, ConfigSource, Defaults, LlmConfig,
    OpenRouterConfig,
};
