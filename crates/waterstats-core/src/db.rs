use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{info, warn};

use crate::error::ConnectionError;

/// Opens the single connection a run uses.
///
/// Failures are classified so that bad credentials and a missing database
/// are reported distinctly from an unreachable server.
pub async fn connect(database_url: &str) -> Result<PgConnection, ConnectionError> {
    let options: PgConnectOptions = database_url.parse().map_err(ConnectionError::classify)?;
    let conn = PgConnection::connect_with(&options)
        .await
        .map_err(ConnectionError::classify)?;

    info!(
        host = options.get_host(),
        database = options.get_database().unwrap_or_default(),
        "Database connection established"
    );
    Ok(conn)
}

/// Closes `conn`, logging rather than propagating a failed shutdown so the
/// caller's own result is what the run reports.
pub async fn close(conn: PgConnection) {
    match conn.close().await {
        Ok(()) => info!("Database connection closed"),
        Err(err) => warn!(error = %err, "failed to close database connection cleanly"),
    }
}
