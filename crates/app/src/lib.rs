//! DMTool application core
//!
//! Everything the egui front end drives, kept free of UI types so it can be
//! exercised from tests.

pub mod cli;
pub mod events;
pub mod logging;
pub mod settings;
pub mod state;

pub use cli::Args;
pub use events::{reactions_for, Reaction, SettingsEvent};
pub use settings::{AppConfig, Settings};
pub use state::AppState;
