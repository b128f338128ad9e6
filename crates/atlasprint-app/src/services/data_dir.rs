// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default locations for the config file and plugin descriptor.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "atlasprint.json";
pub const METADATA_FILE: &str = "metadata.txt";

/// `$XDG_CONFIG_HOME/atlasprint`, else `~/.config/atlasprint`.
pub fn config_dir() -> PathBuf {
    config_base().join("atlasprint")
}

/// The default config file, when one exists.
pub fn default_config_path() -> Option<PathBuf> {
    existing(config_dir().join(CONFIG_FILE))
}

/// Plugin descriptor: explicit path, else next to the config, else none.
pub fn metadata_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => existing(config_dir().join(METADATA_FILE)),
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    std::env::temp_dir()
}
