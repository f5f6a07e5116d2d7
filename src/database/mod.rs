use crate::error::AppError;
use media_gallery::SqliteStore;
use rusqlite::Connection;
use std::path::PathBuf;

/// Path of the SQLite database holding the key-value store
pub fn get_database_path() -> PathBuf {
    crate::filesystem::get_app_data_dir().join("shutterbox.db")
}

/// Open the database and make sure the key-value schema exists
pub fn init_database() -> Result<SqliteStore, AppError> {
    let db_path = get_database_path();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&db_path)?;
    log::info!("Database opened at {:?}", db_path);

    Ok(SqliteStore::new(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path() {
        assert!(get_database_path().ends_with("shutterbox.db"));
    }
}
