//! Server repository: self-report upserts, lookups and status changes.

use sqlx::SqlitePool;

use super::models::{NewServer, Server, ServerStatus};
use super::StorageError;

const SERVER_COLUMNS: &str = "id, serial, hostname, ip_address, mac_address, gateway, install_time, \
     sda_size, part, system_version, kernel_version, cpu_model, cpu_processor, \
     mem_total, memory_num, lan_nic, lan_nic_speed, wan_nic, wan_nic_speed, \
     bond_nic, bond_nic_speed, status, created_at, updated_at";

/// Status and created_at are deliberately absent from the update list: a
/// re-report refreshes inventory but never moves the lifecycle backwards.
const UPSERT_SQL: &str = r#"
    INSERT INTO servers (
        serial, hostname, ip_address, mac_address, gateway, install_time,
        sda_size, part, system_version, kernel_version, cpu_model, cpu_processor,
        mem_total, memory_num, lan_nic, lan_nic_speed, wan_nic, wan_nic_speed,
        bond_nic, bond_nic_speed, status
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(serial) DO UPDATE SET
        hostname = excluded.hostname,
        ip_address = excluded.ip_address,
        mac_address = excluded.mac_address,
        gateway = excluded.gateway,
        install_time = excluded.install_time,
        sda_size = excluded.sda_size,
        part = excluded.part,
        system_version = excluded.system_version,
        kernel_version = excluded.kernel_version,
        cpu_model = excluded.cpu_model,
        cpu_processor = excluded.cpu_processor,
        mem_total = excluded.mem_total,
        memory_num = excluded.memory_num,
        lan_nic = excluded.lan_nic,
        lan_nic_speed = excluded.lan_nic_speed,
        wan_nic = excluded.wan_nic,
        wan_nic_speed = excluded.wan_nic_speed,
        bond_nic = excluded.bond_nic,
        bond_nic_speed = excluded.bond_nic_speed,
        updated_at = CURRENT_TIMESTAMP
"#;

/// Result of a self-report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// First delivery of this `(serial, request_id)`; the record was upserted.
    Created,
    /// Already processed; nothing was written.
    Duplicate,
}

/// Repository for server operations.
pub struct ServerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ServerRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a self-report exactly once per `(serial, request_id)`.
    ///
    /// The dedupe key and the upsert commit together, so a failed upsert
    /// leaves the key unclaimed and the client's retry is processed.
    pub async fn report(&self, request_id: &str, server: &NewServer) -> Result<ReportOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query("INSERT INTO processed_requests (serial, request_id) VALUES (?, ?)")
            .bind(&server.serial)
            .bind(request_id)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await?;
                return Ok(ReportOutcome::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        bind_server(sqlx::query(UPSERT_SQL), server)
            .bind(ServerStatus::Pending)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ReportOutcome::Created)
    }

    /// Insert or refresh a server keyed on serial, without dedupe.
    pub async fn upsert(&self, server: &NewServer) -> Result<(), StorageError> {
        bind_server(sqlx::query(UPSERT_SQL), server)
            .bind(ServerStatus::Pending)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn get(&self, serial: &str) -> Result<Option<Server>, StorageError> {
        let query = format!("SELECT {} FROM servers WHERE serial = ?", SERVER_COLUMNS);
        let server = sqlx::query_as::<_, Server>(&query)
            .bind(serial)
            .fetch_optional(self.pool)
            .await?;
        Ok(server)
    }

    /// List servers, optionally filtered by status.
    pub async fn list(&self, status: Option<ServerStatus>) -> Result<Vec<Server>, StorageError> {
        let servers = match status {
            Some(status) => {
                let query = format!("SELECT {} FROM servers WHERE status = ? ORDER BY id", SERVER_COLUMNS);
                sqlx::query_as::<_, Server>(&query)
                    .bind(status)
                    .fetch_all(self.pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {} FROM servers ORDER BY id", SERVER_COLUMNS);
                sqlx::query_as::<_, Server>(&query).fetch_all(self.pool).await?
            }
        };
        Ok(servers)
    }

    /// Move a server forward in its lifecycle.
    ///
    /// A single conditional `UPDATE`; concurrent callers never hold a read
    /// snapshot while waiting for the write lock. When nothing was updated
    /// the current row decides between no-op, not found and invalid move.
    pub async fn set_status(&self, serial: &str, status: ServerStatus) -> Result<(), StorageError> {
        if let Some(from) = status.predecessor() {
            let updated = sqlx::query(
                "UPDATE servers SET status = ?, updated_at = CURRENT_TIMESTAMP \
                 WHERE serial = ? AND status = ?",
            )
            .bind(status)
            .bind(serial)
            .bind(from)
            .execute(self.pool)
            .await?;

            if updated.rows_affected() > 0 {
                return Ok(());
            }
        }

        let current: Option<ServerStatus> = sqlx::query_scalar("SELECT status FROM servers WHERE serial = ?")
            .bind(serial)
            .fetch_optional(self.pool)
            .await?;

        match current {
            None => Err(StorageError::NotFound(format!("server {}", serial))),
            Some(current) if current == status => Ok(()),
            Some(current) => Err(StorageError::InvalidTransition {
                serial: serial.to_string(),
                from: current,
                to: status,
            }),
        }
    }
}

fn bind_server<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    s: &'q NewServer,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&s.serial)
        .bind(&s.hostname)
        .bind(&s.ip_address)
        .bind(&s.mac_address)
        .bind(&s.gateway)
        .bind(&s.install_time)
        .bind(&s.sda_size)
        .bind(&s.part)
        .bind(&s.system_version)
        .bind(&s.kernel_version)
        .bind(&s.cpu_model)
        .bind(s.cpu_processor)
        .bind(s.mem_total)
        .bind(s.memory_num)
        .bind(&s.lan_nic)
        .bind(&s.lan_nic_speed)
        .bind(&s.wan_nic)
        .bind(&s.wan_nic_speed)
        .bind(&s.bond_nic)
        .bind(&s.bond_nic_speed)
}
