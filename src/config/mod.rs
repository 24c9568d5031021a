mod loader;
mod schema;

pub use loader::PrefsLoader;
pub use schema::{Preferences, SettingsUpdate};
