use crate::infrastructure::error::InfraError;
use rusqlite::Connection;
use std::path::Path;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
const SCHEMA_VERSION: i64 = 1;

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    apply_schema(&connection)
}

pub fn apply_schema(connection: &Connection) -> Result<(), InfraError> {
    let version: i64 = connection.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(InfraError::InvalidData(format!(
            "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }
    connection.execute_batch(SCHEMA_SQL)?;
    if version < SCHEMA_VERSION {
        connection.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
