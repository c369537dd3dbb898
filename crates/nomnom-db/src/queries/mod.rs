mod posts;
mod recipes;
mod social;
mod users;

use anyhow::Result;
use rusqlite::ffi;

use crate::models::InsertOutcome;

/// Map the result of an `INSERT` onto what happened to the row.
///
/// `INSERT OR IGNORE` reports zero changed rows on a unique conflict, while a
/// plain `INSERT` fails with a unique constraint error; both become `Exists`.
/// Foreign-key violations are never ignored by SQLite and become
/// `MissingParent`.
pub(crate) fn classify_insert(result: rusqlite::Result<usize>) -> Result<InsertOutcome> {
    match result {
        Ok(0) => Ok(InsertOutcome::Exists),
        Ok(_) => Ok(InsertOutcome::Created),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Ok(InsertOutcome::MissingParent)
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(InsertOutcome::Exists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
