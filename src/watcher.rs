use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use tracing::{debug, warn};

/// Watches the preferences file so a surface can pick up settings saved
/// by another process.
///
/// The parent directory is watched rather than the file itself; editors
/// and atomic saves replace the file, which would silently detach a
/// file-level watch.
pub struct SettingsWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<Result<Event, notify::Error>>,
    settings_path: PathBuf,
}

impl SettingsWatcher {
    pub fn new(settings_path: PathBuf) -> Result<Self> {
        let (tx, rx) = channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    warn!("Failed to forward settings watch event: {}", e);
                }
            },
            Config::default(),
        )
        .context("Failed to create settings watcher")?;

        Ok(Self {
            watcher,
            rx,
            settings_path,
        })
    }

    /// Start watching the settings file's directory
    pub fn start(&mut self) -> Result<()> {
        let dir = self
            .settings_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        debug!("Watching settings directory: {}", dir.display());
        self.watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        Ok(())
    }

    /// Drain pending events; true when the settings file changed and a
    /// reload is warranted
    pub fn settings_changed(&self) -> bool {
        let mut changed = false;

        while let Ok(event_result) = self.rx.try_recv() {
            match event_result {
                Ok(event) => {
                    if self.is_settings_event(&event) {
                        debug!("Settings file change detected");
                        changed = true;
                    }
                }
                Err(e) => {
                    warn!("Settings watch error: {}", e);
                }
            }
        }

        changed
    }

    fn is_settings_event(&self, event: &Event) -> bool {
        let relevant_kind = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );
        relevant_kind && event.paths.iter().any(|p| p == &self.settings_path)
    }
}
