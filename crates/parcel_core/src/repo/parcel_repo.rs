//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `parcel` table.
//! - Keep SQL and row mapping inside the persistence boundary.
//!
//! # Invariants
//! - Each operation issues exactly one statement; there are no explicit
//!   transactions.
//! - Status text is stored and loaded verbatim; unknown values surface as
//!   `ParcelStatus::Other`.
//! - Plain writes enforce no lifecycle rules. The `*_when` variants fold a
//!   required current status into the write statement itself.
//! - Every failure path emits a `warn` event.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_TABLE: &str = "parcel";
const PARCEL_COLUMNS: [&str; 5] = ["number", "client", "status", "address", "created_at"];

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from parcel store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite failure, passed through unchanged.
    Db(DbError),
    /// No row has the requested parcel number.
    NotFound(ParcelNumber),
    /// A guarded write found the parcel in a different status.
    StatusMismatch {
        number: ParcelNumber,
        expected: ParcelStatus,
        actual: ParcelStatus,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns whether this error means the requested parcel does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::StatusMismatch {
                number,
                expected,
                actual,
            } => write!(
                f,
                "parcel {number} has status `{actual}`, write requires `{expected}`"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "parcel store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "parcel store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "parcel store requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::StatusMismatch { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Capability set of a parcel store.
///
/// Implementations may target any relational engine; callers only depend on
/// this trait.
pub trait ParcelStore {
    /// Inserts a new parcel and returns its assigned number.
    ///
    /// `parcel.number` is ignored.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel, failing with `RepoError::NotFound` when absent.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Removes one parcel. Removing a missing number succeeds.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
    /// Replaces the address of one parcel.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    /// Replaces the status of one parcel without transition checks.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    /// Lists all parcels owned by `client`. Order is unspecified.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;

    /// Removes one parcel only while it has status `required`.
    ///
    /// Fails with `NotFound` or `StatusMismatch` when nothing was removed.
    fn delete_when(&self, number: ParcelNumber, required: &ParcelStatus) -> RepoResult<()>;
    /// Replaces the address only while the parcel has status `required`.
    fn set_address_when(
        &self,
        number: ParcelNumber,
        address: &str,
        required: &ParcelStatus,
    ) -> RepoResult<()>;
    /// Replaces the status only while the parcel has status `required`.
    fn set_status_when(
        &self,
        number: ParcelNumber,
        status: ParcelStatus,
        required: &ParcelStatus,
    ) -> RepoResult<()>;
}

impl<S: ParcelStore + ?Sized> ParcelStore for &S {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        (**self).add(parcel)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        (**self).get(number)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        (**self).delete(number)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        (**self).set_address(number, address)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        (**self).set_status(number, status)
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        (**self).get_by_client(client)
    }

    fn delete_when(&self, number: ParcelNumber, required: &ParcelStatus) -> RepoResult<()> {
        (**self).delete_when(number, required)
    }

    fn set_address_when(
        &self,
        number: ParcelNumber,
        address: &str,
        required: &ParcelStatus,
    ) -> RepoResult<()> {
        (**self).set_address_when(number, address, required)
    }

    fn set_status_when(
        &self,
        number: ParcelNumber,
        status: ParcelStatus,
        required: &ParcelStatus,
    ) -> RepoResult<()> {
        (**self).set_status_when(number, status, required)
    }
}

/// SQLite-backed parcel store over a caller-owned connection.
pub struct SqliteParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is not the latest.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not match.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Resolves why a guarded write touched no row.
    fn guard_failure(
        &self,
        number: ParcelNumber,
        required: &ParcelStatus,
        event: &str,
    ) -> RepoError {
        let current = self
            .conn
            .query_row(
                "SELECT status FROM parcel WHERE number = ?1;",
                [number],
                |row| row.get::<_, String>(0),
            )
            .optional();

        match current {
            Ok(None) => {
                warn!("event={event} module=repo status=not_found number={number}");
                RepoError::NotFound(number)
            }
            Ok(Some(text)) => {
                let actual = ParcelStatus::from(text);
                warn!(
                    "event={event} module=repo status=rejected number={number} required={required} actual={actual}"
                );
                RepoError::StatusMismatch {
                    number,
                    expected: required.clone(),
                    actual,
                }
            }
            Err(err) => {
                warn!("event={event} module=repo status=error number={number} error={err}");
                err.into()
            }
        }
    }
}

impl ParcelStore for SqliteParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        let result = self.conn.execute(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        );
        warn_on_error(result, "parcel_add")?;

        let number = self.conn.last_insert_rowid();
        debug!(
            "event=parcel_add module=repo status=ok number={number} client={}",
            parcel.client
        );
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let result = self
            .conn
            .query_row(
                &format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"),
                [number],
                read_parcel_row,
            )
            .optional();

        match warn_on_error(result, "parcel_get")? {
            Some(parcel) => Ok(parcel),
            None => {
                debug!("event=parcel_get module=repo status=not_found number={number}");
                Err(RepoError::NotFound(number))
            }
        }
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let result = self
            .conn
            .execute("DELETE FROM parcel WHERE number = ?1;", [number]);
        let removed = warn_on_error(result, "parcel_delete")?;
        debug!("event=parcel_delete module=repo status=ok number={number} removed={removed}");
        Ok(())
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        let result = self.conn.execute(
            "UPDATE parcel SET address = ?1 WHERE number = ?2;",
            params![address, number],
        );
        let changed = warn_on_error(result, "parcel_set_address")?;
        ensure_changed(changed, number, "parcel_set_address")
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let result = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2;",
            params![status.as_str(), number],
        );
        let changed = warn_on_error(result, "parcel_set_status")?;
        ensure_changed(changed, number, "parcel_set_status")
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let load = || -> rusqlite::Result<Vec<Parcel>> {
            let mut stmt = self.conn.prepare(&format!(
                "{PARCEL_SELECT_SQL}
                 WHERE client = ?1
                 ORDER BY number ASC;"
            ))?;
            let parcels = stmt
                .query_map([client], read_parcel_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(parcels)
        };
        let parcels = warn_on_error(load(), "parcel_get_by_client")?;

        debug!(
            "event=parcel_get_by_client module=repo status=ok client={client} count={}",
            parcels.len()
        );
        Ok(parcels)
    }

    fn delete_when(&self, number: ParcelNumber, required: &ParcelStatus) -> RepoResult<()> {
        let result = self.conn.execute(
            "DELETE FROM parcel WHERE number = ?1 AND status = ?2;",
            params![number, required.as_str()],
        );
        if warn_on_error(result, "parcel_delete_when")? == 0 {
            return Err(self.guard_failure(number, required, "parcel_delete_when"));
        }

        debug!("event=parcel_delete_when module=repo status=ok number={number}");
        Ok(())
    }

    fn set_address_when(
        &self,
        number: ParcelNumber,
        address: &str,
        required: &ParcelStatus,
    ) -> RepoResult<()> {
        let result = self.conn.execute(
            "UPDATE parcel SET address = ?1 WHERE number = ?2 AND status = ?3;",
            params![address, number, required.as_str()],
        );
        if warn_on_error(result, "parcel_set_address_when")? == 0 {
            return Err(self.guard_failure(number, required, "parcel_set_address_when"));
        }

        debug!("event=parcel_set_address_when module=repo status=ok number={number}");
        Ok(())
    }

    fn set_status_when(
        &self,
        number: ParcelNumber,
        status: ParcelStatus,
        required: &ParcelStatus,
    ) -> RepoResult<()> {
        let result = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2 AND status = ?3;",
            params![status.as_str(), number, required.as_str()],
        );
        if warn_on_error(result, "parcel_set_status_when")? == 0 {
            return Err(self.guard_failure(number, required, "parcel_set_status_when"));
        }

        debug!(
            "event=parcel_set_status_when module=repo status=ok number={number} from={required} to={status}"
        );
        Ok(())
    }
}

fn read_parcel_row(row: &Row<'_>) -> rusqlite::Result<Parcel> {
    Ok(Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status: ParcelStatus::from(row.get::<_, String>("status")?),
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

fn warn_on_error<T>(result: rusqlite::Result<T>, event: &str) -> RepoResult<T> {
    result.map_err(|err| {
        warn!("event={event} module=repo status=error error={err}");
        RepoError::from(err)
    })
}

fn ensure_changed(changed: usize, number: ParcelNumber, event: &str) -> RepoResult<()> {
    if changed == 0 {
        warn!("event={event} module=repo status=not_found number={number}");
        return Err(RepoError::NotFound(number));
    }

    debug!("event={event} module=repo status=ok number={number}");
    Ok(())
}

fn ensure_parcel_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, PARCEL_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PARCEL_TABLE));
    }

    let present = table_columns(conn, PARCEL_TABLE)?;
    if let Some(column) = PARCEL_COLUMNS
        .into_iter()
        .find(|column| !present.iter().any(|name| name == column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: PARCEL_TABLE,
            column,
        });
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}
