//! Command line interface

use crate::settings;
use clap::Parser;
use std::path::PathBuf;

/// DMTool - show handouts and maps on the players' screen
#[derive(Parser, Debug, Default)]
#[command(name = "dmtool")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Images to show at startup
    #[arg(value_name = "IMAGE")]
    pub paths: Vec<PathBuf>,

    /// Settings file to use instead of the per-user default
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    pub fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(settings::default_path)
    }

    /// Startup paths that exist. Whether they decode is up to the loader.
    pub fn startup_images(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .filter(|path| {
                let ok = path.is_file();
                if !ok {
                    tracing::warn!("skipping {}: no such file", path.display());
                }
                ok
            })
            .cloned()
            .collect()
    }
}
