use std::{fs, path::{Path, PathBuf}};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PreferencesError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

/// The only state that outlives the process: the theme choice.
pub struct PreferenceStore {
    path: PathBuf,
    current: Mutex<Preferences>,
}

impl PreferenceStore {
    /// Reads `path`. Missing or unreadable files give the defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("⚠️ Ignoring malformed preferences at {}: {}", path.display(), e);
                Preferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                warn!("⚠️ Could not read preferences at {}: {}", path.display(), e);
                Preferences::default()
            }
        };
        info!("🎨 Loaded preferences from {}: dark_mode={}", path.display(), current.dark_mode);
        Self { path, current: Mutex::new(current) }
    }

    pub fn get(&self) -> Preferences { *self.current.lock() }

    pub fn dark_mode(&self) -> bool { self.get().dark_mode }

    /// Flips dark mode and writes it out. On a failed write the flag is left as it was.
    /// Blocks on the file write while holding the lock, so toggles are serialised;
    /// async callers run it through `spawn_blocking`.
    pub fn toggle_dark_mode(&self) -> Result<bool, PreferencesError> {
        let mut current = self.current.lock();
        let next = Preferences { dark_mode: !current.dark_mode };
        save(&self.path, &next)?;
        *current = next;
        Ok(next.dark_mode)
    }
}

fn save(path: &Path, prefs: &Preferences) -> Result<(), PreferencesError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(prefs)?)?;
    Ok(())
}
