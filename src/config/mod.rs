pub mod settings;

use settings::Settings;
use std::path::Path;

/// Name of the settings file looked up next to the caller's working files.
pub const SETTINGS_FILE_NAME: &str = "fia.yaml";

/// Load `fia.yaml` from `dir`.
///
/// If the file exists it is parsed and its relative search directories are
/// resolved against `dir`; otherwise the default settings are returned.
pub fn load_settings(dir: &Path) -> crate::error::Result<Settings> {
    let settings_path = dir.join(SETTINGS_FILE_NAME);

    if settings_path.exists() {
        Ok(Settings::from_file(&settings_path)?.resolve_relative_to(dir))
    } else {
        Ok(Settings::default())
    }
}

/// Load settings from an explicit file path, resolving relative search
/// directories against the file's directory.
pub fn load_settings_file(path: &Path) -> crate::error::Result<Settings> {
    let dir = path
        .parent()
        .ok_or_else(|| crate::error::FiaError::config("Cannot determine settings directory"))?;
    Ok(Settings::from_file(path)?.resolve_relative_to(dir))
}
