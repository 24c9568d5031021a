use super::Preferences;
use crate::services::Registry;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Preferences file loader
///
/// Loads from disk or creates the default file, validates before every
/// save, and can reload when another surface changes the file.
pub struct PrefsLoader {
    path: PathBuf,
    prefs: Preferences,
}

impl PrefsLoader {
    /// Create a loader with default preferences and the default path
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
            prefs: Preferences::default(),
        }
    }

    /// Load preferences from disk, or create the default file if absent
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load preferences from an explicit path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let prefs = if path.exists() {
            info!("Loading preferences from {:?}", path);
            let contents = fs::read_to_string(&path)?;

            match toml::from_str::<Preferences>(&contents) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!("Failed to parse preferences: {}, using defaults", e);
                    Preferences::default()
                }
            }
        } else {
            info!("No preferences file found, creating default at {:?}", path);
            let default = Preferences::default();
            if let Err(e) = Self::write_prefs(&path, &default) {
                warn!("Failed to create default preferences file: {}", e);
            }
            default
        };

        Ok(Self { path, prefs })
    }

    /// Current preferences
    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    /// Re-read preferences from disk, keeping the current values if the
    /// file is gone
    pub fn reload(&mut self) -> Result<()> {
        debug!("Reloading preferences from {:?}", self.path);

        if !self.path.exists() {
            warn!("Preferences file not found, keeping current preferences");
            return Ok(());
        }

        let contents = fs::read_to_string(&self.path)?;
        self.prefs = toml::from_str(&contents)?;
        info!("Preferences reloaded");
        Ok(())
    }

    /// Validate against the registry, then replace and persist
    pub fn update(&mut self, prefs: Preferences, registry: &Registry) -> Result<()> {
        prefs.validate(registry)?;
        self.prefs = prefs;
        Self::write_prefs(&self.path, &self.prefs)
    }

    /// Preferences file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        config_dir.join("ai-omnibar").join("config.toml")
    }

    fn write_prefs(path: &PathBuf, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(prefs)?;
        fs::write(path, toml)?;

        debug!("Preferences saved to {:?}", path);
        Ok(())
    }
}

impl Default for PrefsLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::builtin_registry;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ai-omnibar-test-{}", name))
    }

    #[test]
    fn test_default_path_shape() {
        let path = PrefsLoader::default_path();
        assert!(path.to_string_lossy().contains("ai-omnibar"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let path = scratch_path("prefs-create/config.toml");
        let _ = fs::remove_file(&path);

        let loader = PrefsLoader::load_from(path.clone()).unwrap();
        assert_eq!(loader.prefs().default_service, "chatgpt");
        assert!(path.exists());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_update_persists_and_reload_sees_it() {
        let path = scratch_path("prefs-update/config.toml");
        let _ = fs::remove_file(&path);
        let registry = builtin_registry();

        let mut loader = PrefsLoader::load_from(path.clone()).unwrap();
        let mut prefs = loader.prefs().clone();
        prefs.default_service = "claude".to_string();
        loader.update(prefs, &registry).unwrap();

        let mut other = PrefsLoader::load_from(path.clone()).unwrap();
        other.reload().unwrap();
        assert_eq!(other.prefs().default_service, "claude");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_update_rejects_invalid_prefs() {
        let path = scratch_path("prefs-invalid/config.toml");
        let _ = fs::remove_file(&path);
        let registry = builtin_registry();

        let mut loader = PrefsLoader::load_from(path.clone()).unwrap();
        let mut prefs = loader.prefs().clone();
        prefs.default_service = "not-a-service".to_string();

        assert!(loader.update(prefs, &registry).is_err());
        // In-memory preferences unchanged after a rejected update
        assert_eq!(loader.prefs().default_service, "chatgpt");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = scratch_path("prefs-malformed/config.toml");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "default_service = [broken").unwrap();

        let loader = PrefsLoader::load_from(path.clone()).unwrap();
        assert_eq!(loader.prefs().default_service, "chatgpt");

        let _ = fs::remove_file(path);
    }
}
