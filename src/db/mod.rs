use std::{env::current_dir, fs, path::Path, time::Duration};

use include_dir::{Dir, include_dir};
use log::debug;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite_migration::Migrations;

mod error;
pub use error::{DbError, DbResult};

mod users;
pub use users::{UserRow, create_user, delete_user, get_user_by_id, get_user_by_username, list_users, update_user};

mod pet_clinics;
pub use pet_clinics::{count_pet_clinics, get_pet_clinic, list_pet_clinics, upsert_pet_clinic, upsert_pet_clinics};

mod weather;
pub use weather::{get_latest_weather, insert_weather_snapshot};

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

static MIGRATIONS_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

const MAX_POOL_SIZE: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the SQLite database at `db_path` and migrates it
/// to the latest schema.
pub fn init_db(db_path: impl AsRef<Path>) -> DbResult<SqlitePool> {
    let mut path = db_path.as_ref().to_path_buf();
    if path.is_relative() {
        path = current_dir()?.join(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    debug!(path:% = path.display(); "Opening database");

    let manager = SqliteConnectionManager::file(&path).with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
    let pool = r2d2::Pool::builder().max_size(MAX_POOL_SIZE).build(manager)?;

    let mut conn = pool.get()?;
    let migrations = Migrations::from_directory(&MIGRATIONS_DIR)?;
    migrations.to_latest(&mut conn)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_init_db_creates_schema_and_is_reentrant() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("petple.db");

        let pool = init_db(&db_path).expect("first init");
        assert!(db_path.exists());

        let conn = pool.get().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        for table in ["seoul_pet_clinics", "users", "weather_data"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
        drop(stmt);
        drop(conn);
        drop(pool);

        init_db(&db_path).expect("second init on existing schema");
    }

    #[test]
    fn test_migrations_are_valid() {
        let migrations = Migrations::from_directory(&MIGRATIONS_DIR).unwrap();
        assert!(migrations.validate().is_ok());
    }
}
