use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::settings::error::{Result, SettingsError};
use crate::settings::types::{SettingsUpdate, StyleSettings};

const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shared style settings with optional debounced persistence.
///
/// Readers take a [`snapshot`](Self::snapshot) by value, so a render pass
/// never observes a half-applied update.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: Mutex<StyleSettings>,
    save_notify: Notify,
    is_dirty: AtomicBool,
}

impl SettingsStore {
    /// Create a store backed by `path`, loading it if the file exists.
    ///
    /// A corrupt file is logged and replaced by defaults on the next save.
    pub fn new(path: PathBuf) -> Self {
        let data = Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings from {}: {e}", path.display());
            StyleSettings::default()
        });
        Self {
            path: Some(path),
            data: Mutex::new(data),
            save_notify: Notify::new(),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Create a store that never touches disk.
    pub fn in_memory(initial: StyleSettings) -> Self {
        Self {
            path: None,
            data: Mutex::new(initial),
            save_notify: Notify::new(),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Load settings from a JSON file, returning defaults on missing file.
    pub fn load(path: &Path) -> Result<StyleSettings> {
        if !path.exists() {
            return Ok(StyleSettings::default());
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save current settings to disk atomically (write .tmp then rename).
    /// No-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = *self.data.lock();
        let json =
            serde_json::to_string_pretty(&data).map_err(|e| SettingsError::Parse(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(|e| SettingsError::Io(e.to_string()))?;
        std::fs::rename(&tmp_path, path).map_err(|e| SettingsError::Io(e.to_string()))?;

        Ok(())
    }

    /// Current settings, copied out.
    pub fn snapshot(&self) -> StyleSettings {
        *self.data.lock()
    }

    /// Apply a partial update and schedule a debounced save.
    ///
    /// Rejected updates leave the stored settings unchanged.
    pub fn update(&self, update: &SettingsUpdate) -> Result<StyleSettings> {
        let applied = {
            let mut data = self.data.lock();
            let mut next = *data;
            let clamped = next.apply(update)?;
            if !clamped.is_empty() {
                tracing::debug!("Clamped settings fields: {}", clamped.join(", "));
            }
            *data = next;
            next
        };
        self.mark_dirty();
        Ok(applied)
    }

    /// Restore defaults and schedule a save.
    pub fn reset(&self) -> StyleSettings {
        let defaults = StyleSettings::default();
        *self.data.lock() = defaults;
        self.mark_dirty();
        defaults
    }

    fn mark_dirty(&self) {
        if self.path.is_some() {
            self.is_dirty.store(true, Ordering::Release);
            self.save_notify.notify_one();
        }
    }

    /// Start the debounce task: waits for a dirty notification, sleeps
    /// 500ms, then saves.
    ///
    /// The `AtomicBool` dirty flag keeps notifications that arrive between
    /// `save()` completing and `notified().await` re-registering.
    pub fn start_debounce_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                store.save_notify.notified().await;
                tokio::time::sleep(SAVE_DEBOUNCE).await;
                if store.is_dirty.swap(false, Ordering::AcqRel) {
                    if let Err(e) = store.save() {
                        tracing::warn!("Failed to save settings: {e}");
                    }
                }
            }
        })
    }
}
