use crate::configuration::Configuration;
use crate::storage::SqliteStorage;
use crate::uploads::UploadStore;
use anyhow::{Context, Result};

pub fn init_data_dirs(config: &Configuration) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)?;
    std::fs::create_dir_all(&config.uploads_dir)?;
    Ok(())
}

pub fn init_storage(config: &Configuration) -> Result<SqliteStorage> {
    let db_path = config.data_dir.join("ecoleta.sqlite");
    let sqlite = SqliteStorage::new(&db_path);
    if config.reset {
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;
    Ok(sqlite)
}

pub fn build_upload_store(config: &Configuration) -> UploadStore {
    UploadStore::new(&config.uploads_dir)
}
