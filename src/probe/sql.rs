//! SQL connectivity probe.
//!
//! Opens a connection with the configured connection string, runs
//! `select 1` and closes the connection again. The driver is picked from the
//! URL scheme (`postgres://`, `mysql://`, `sqlite:`). Any error while
//! connecting or querying is returned to the caller, never swallowed.

use async_trait::async_trait;
use sqlx::{AnyConnection, Connection};

use crate::error::{ConfigError, ProbeError};

use super::{validate_name, Probe, ProbeOutcome};

const PROBE_QUERY: &str = "select 1";

pub struct SqlProbe {
    name: String,
    connection_string: String,
}

impl SqlProbe {
    pub fn new(
        name: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let name = validate_name(name)?;
        let connection_string = connection_string.into();
        if connection_string.is_empty() {
            return Err(ConfigError::Validation(format!(
                "SQL check '{name}': invalid connection string"
            )));
        }

        sqlx::any::install_default_drivers();

        Ok(Self {
            name,
            connection_string,
        })
    }
}

#[async_trait]
impl Probe for SqlProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let mut connection = AnyConnection::connect(&self.connection_string).await?;
        sqlx::query(PROBE_QUERY).fetch_one(&mut connection).await?;
        connection.close().await?;

        Ok(ProbeOutcome::passed())
    }
}
