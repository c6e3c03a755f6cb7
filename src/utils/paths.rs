use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "pipectl";

/// `~/.config/pipectl` (or the platform equivalent).
pub fn get_config_dir() -> Result<PathBuf> {
    let config = dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config.join(APP_DIR_NAME))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// `~/.local/share/pipectl` (or the platform equivalent).
pub fn get_data_dir() -> Result<PathBuf> {
    let data = dirs::data_dir().ok_or_else(|| anyhow!("Could not find data directory"))?;
    Ok(data.join(APP_DIR_NAME))
}

pub fn get_logs_dir() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("logs"))
}

pub fn get_crash_log_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("crash.log"))
}

/// Default plugin directory under an explicit XDG config home.
pub fn plugins_dir_under(config_home: &Path) -> PathBuf {
    config_home.join(APP_DIR_NAME).join("plugins")
}

/// Default plugin directory under a home directory (`~/.config/pipectl/plugins`).
pub fn plugins_dir_under_home(home: &Path) -> PathBuf {
    plugins_dir_under(&home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_path() {
        let path = get_config_path().unwrap();
        assert!(path.to_string_lossy().contains("pipectl"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_get_logs_dir() {
        let dir = get_logs_dir().unwrap();
        assert!(dir.to_string_lossy().contains("pipectl"));
        assert!(dir.to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_get_crash_log_path() {
        let path = get_crash_log_path().unwrap();
        assert!(path.to_string_lossy().ends_with("crash.log"));
    }

    #[test]
    fn test_plugins_dir_under() {
        let dir = plugins_dir_under(Path::new("/xdg"));
        assert_eq!(dir, PathBuf::from("/xdg/pipectl/plugins"));
    }

    #[test]
    fn test_plugins_dir_under_home() {
        let dir = plugins_dir_under_home(Path::new("/home/alice"));
        assert_eq!(dir, PathBuf::from("/home/alice/.config/pipectl/plugins"));
    }
}
