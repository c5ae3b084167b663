//! Module for searching for tablet profile files

use std::path::PathBuf;

/// Base system fallback path to use if one cannot be found with XDG
const FALLBACK_BASE_PATH: &str = "/usr/share/tabletemu";

/// Returns the base path for configuration data
pub fn get_base_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("tabletemu") else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_BASE_PATH);
    };

    // Get the data directories in preference order
    let data_dirs = base_dirs.get_data_dirs();
    for dir in data_dirs {
        if dir.exists() {
            return dir;
        }
    }

    log::warn!("Config base path not found. Using fallback path.");
    PathBuf::from(FALLBACK_BASE_PATH)
}

/// Returns a list of directories in load order to find tablet profiles.
/// E.g. ["/etc/tabletemu/profiles.d", "/usr/share/tabletemu/profiles"]
pub fn get_profiles_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./rootfs/usr/share/tabletemu/profiles"),
        PathBuf::from("/etc/tabletemu/profiles.d"),
        get_base_path().join("profiles"),
    ]
}

/// Returns all profile files found in the search directories
pub fn get_profile_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in get_profiles_paths() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml") {
                files.push(path);
            }
        }
    }
    files.sort();

    files
}
