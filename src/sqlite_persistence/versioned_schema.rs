//! Declarative SQLite schemas.
//!
//! A [`VersionedSchema`] can create its tables on an empty database and check
//! that an existing database has exactly the expected layout. Artifacts are
//! produced offline and only opened by the server, so a mismatch is reported
//! instead of migrated.

use anyhow::{bail, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fmt;

/// Offset added to schema versions before they are written to `PRAGMA user_version`,
/// so a database that was never initialized by us (user_version = 0) is easy to spot.
pub const BASE_DB_VERSION: usize = 99999;

/// Builds a [`Column`], every flag not listed is off.
///
/// `sqlite_column!("popularity", &SqlType::Integer, non_null = true)`
#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn from_declared(declared: &str) -> Option<SqlType> {
        match declared.to_ascii_uppercase().as_str() {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            "REAL" => Some(SqlType::Real),
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        })
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

impl Column {
    fn definition(&self) -> String {
        let mut definition = format!("{} {}", self.name, self.sql_type);
        if self.is_primary_key {
            definition.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            definition.push_str(" NOT NULL");
        }
        if let Some(default_value) = self.default_value {
            definition.push_str(" DEFAULT ");
            definition.push_str(default_value);
        }
        definition
    }

    /// What differs between this column and `actual`, if anything.
    fn mismatch(&self, actual: &ColumnInfo) -> Option<String> {
        if actual.name != self.name {
            return Some(format!(
                "column name mismatch: expected {}, got {}",
                self.name, actual.name
            ));
        }
        if actual.sql_type.as_ref() != Some(self.sql_type) {
            return Some(format!(
                "column {} type mismatch: expected {}, got {}",
                self.name, self.sql_type, actual.declared_type
            ));
        }
        if actual.non_null != self.non_null {
            return Some(format!(
                "column {} non-null mismatch: expected {}, got {}",
                self.name, self.non_null, actual.non_null
            ));
        }
        // SQLite may report a default wrapped in parentheses.
        let actual_default = actual.default_value.as_deref().map(unparenthesize);
        if actual_default != self.default_value.map(unparenthesize) {
            return Some(format!(
                "column {} default value mismatch: expected {:?}, got {:?}",
                self.name, self.default_value, actual.default_value
            ));
        }
        if actual.is_primary_key != self.is_primary_key {
            return Some(format!(
                "column {} primary key mismatch: expected {}, got {}",
                self.name, self.is_primary_key, actual.is_primary_key
            ));
        }
        None
    }
}

/// A column as reported by `PRAGMA table_info`.
struct ColumnInfo {
    name: String,
    declared_type: String,
    sql_type: Option<SqlType>,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

fn unparenthesize(value: &str) -> &str {
    value
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(value)
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// `(index name, indexed column)` pairs.
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let definitions: Vec<String> = self.columns.iter().map(Column::definition).collect();
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, definitions.join(", ")),
            [],
        )?;
        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, column_name),
                [],
            )?;
        }
        Ok(())
    }

    fn introspect(&self, conn: &Connection) -> Result<Vec<ColumnInfo>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let columns = stmt
            .query_map([], |row| {
                let declared_type: String = row.get(2)?;
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    sql_type: SqlType::from_declared(&declared_type),
                    declared_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn has_index(&self, conn: &Connection, index_name: &str) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1 AND tbl_name = ?2",
                [index_name, self.name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        let actual = self.introspect(conn)?;
        if actual.is_empty() {
            bail!("Table {} does not exist", self.name);
        }
        if actual.len() != self.columns.len() {
            let actual_names: Vec<&str> = actual.iter().map(|c| c.name.as_str()).collect();
            let expected_names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
            bail!(
                "Table {} has columns [{}], expected [{}]",
                self.name,
                actual_names.join(", "),
                expected_names.join(", ")
            );
        }
        for (expected, actual) in self.columns.iter().zip(actual.iter()) {
            if let Some(mismatch) = expected.mismatch(actual) {
                bail!("Table {}: {}", self.name, mismatch);
            }
        }
        for (index_name, _) in self.indices {
            if !self.has_index(conn, index_name)? {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    fn user_version(&self) -> i64 {
        (BASE_DB_VERSION + self.version) as i64
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.pragma_update(None, "user_version", self.user_version())?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        if db_version != self.user_version() {
            bail!(
                "Database schema version mismatch: expected {}, got {}",
                self.user_version(),
                db_version
            );
        }
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}
