//! Path utilities for KeyVault directory resolution.

use std::path::PathBuf;

use crate::error::Result;

const KEYVAULT_DIR: &str = ".keyvault";
const DATABASE_FILE: &str = "keyvault.redb";

/// Environment variable to override the KeyVault directory.
const KEYVAULT_DIR_ENV: &str = "KEYVAULT_DIR";

/// Resolve the KeyVault data directory.
/// Priority: KEYVAULT_DIR env var > ~/.keyvault/
pub fn resolve_keyvault_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(KEYVAULT_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir().map(|h| h.join(KEYVAULT_DIR)).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "failed to determine home directory",
        )
        .into()
    })
}

/// Ensure the KeyVault directory exists and return its path.
pub fn ensure_keyvault_dir() -> Result<PathBuf> {
    let dir = resolve_keyvault_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the database file path: ~/.keyvault/keyvault.redb
pub fn database_path() -> Result<PathBuf> {
    Ok(resolve_keyvault_dir()?.join(DATABASE_FILE))
}
