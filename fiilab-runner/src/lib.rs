//! FiiLab Runner: configuration, snapshot loading, screening, exports.
//!
//! This crate builds on `fiilab-core` to provide:
//! - TOML configuration with presets and cache/source settings
//! - Snapshot loading with CSV / cache / download / stale-cache fallback
//! - Screening with segment filters, a score cut-off, and filter advice
//! - CSV, JSON, and Markdown exports of screened funds and peers
//! - A market overview of the whole listing

pub mod config;
pub mod data_loader;
pub mod export;
pub mod overview;
pub mod screen;

pub use config::{
    CacheConfig, ConfigError, FiiLabConfig, Preset, PresetName, Presets, SourceConfig,
    ValidationConfig,
};
pub use data_loader::{build_table, load_snapshot, load_table, LoadError, LoadOptions, LoadedTable};
pub use export::{export_csv, export_json, export_markdown, save_exports, ExportView};
pub use overview::{overview, MarketOverview};
pub use screen::{
    available_macro_segments, available_segments, screen, FilterAdvice, ScreenRequest,
    ScreenResult,
};
