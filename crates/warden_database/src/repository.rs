//! PostgreSQL implementation of [`GuardRepository`].

use crate::schema::{allow_list_entries, audit_events, punishment_records};
use crate::{
    AllowListRow, AuditEventRow, NewAllowListRow, NewAuditEventRow, NewPunishmentRow, PgPool,
    PunishmentRow,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::{debug, instrument};
use warden_error::{DatabaseError, DatabaseErrorKind};
use warden_interface::{
    AllowListEntry, AuditEvent, GuardRepository, PunishmentRecord, Snowflake, StoreResult,
};

/// Guard persistence backed by a pooled PostgreSQL connection.
///
/// Every call checks a connection out of the pool inside
/// `tokio::task::spawn_blocking`, so the async runtime never blocks on I/O.
/// Guards running as separate processes share the tables without
/// coordination: allow-list reads are point lookups and every other write is
/// an append.
#[derive(Debug, Clone)]
pub struct PgGuardRepository {
    pool: PgPool,
}

impl PgGuardRepository {
    /// Create a repository over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Query(format!("Task join error: {}", e)))
        })?
    }
}

#[async_trait]
impl GuardRepository for PgGuardRepository {
    #[instrument(skip(self), fields(subject = %subject))]
    async fn find_allow_entry(&self, subject: Snowflake) -> StoreResult<Option<AllowListEntry>> {
        self.with_conn(move |conn| {
            let row = allow_list_entries::table
                .filter(allow_list_entries::subject_id.eq(subject.as_i64()))
                .select(AllowListRow::as_select())
                .first(conn)
                .optional()
                .map_err(DatabaseError::from)?;
            Ok(row.map(AllowListEntry::from))
        })
        .await
    }

    #[instrument(skip(self, entry), fields(subject = %entry.subject_id))]
    async fn insert_allow_entry(&self, entry: &AllowListEntry) -> StoreResult<()> {
        let row = NewAllowListRow::from(entry);
        self.with_conn(move |conn| {
            diesel::insert_into(allow_list_entries::table)
                .values(&row)
                .execute(conn)
                .map_err(DatabaseError::from)?;
            debug!("Allow-list entry stored");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(subject = %subject))]
    async fn delete_allow_entry(&self, subject: Snowflake) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                allow_list_entries::table
                    .filter(allow_list_entries::subject_id.eq(subject.as_i64())),
            )
            .execute(conn)
            .map_err(DatabaseError::from)?;
            Ok(deleted > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_active_allow_entries(&self) -> StoreResult<Vec<AllowListEntry>> {
        self.with_conn(|conn| {
            let rows = allow_list_entries::table
                .filter(allow_list_entries::active.eq(true))
                .order(allow_list_entries::granted_at.asc())
                .select(AllowListRow::as_select())
                .load(conn)
                .map_err(DatabaseError::from)?;
            Ok(rows.into_iter().map(AllowListEntry::from).collect())
        })
        .await
    }

    #[instrument(skip(self), fields(subject = %subject))]
    async fn touch_last_seen(&self, subject: Snowflake, at: DateTime<Utc>) -> StoreResult<()> {
        self.with_conn(move |conn| {
            diesel::update(
                allow_list_entries::table
                    .filter(allow_list_entries::subject_id.eq(subject.as_i64())),
            )
            .set(allow_list_entries::last_seen_at.eq(Some(at)))
            .execute(conn)
            .map_err(DatabaseError::from)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, record), fields(subject = %record.subject_id(), action = %record.action()))]
    async fn insert_punishment(&self, record: &PunishmentRecord) -> StoreResult<()> {
        let row = NewPunishmentRow::from(record);
        self.with_conn(move |conn| {
            diesel::insert_into(punishment_records::table)
                .values(&row)
                .execute(conn)
                .map_err(DatabaseError::from)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(subject = %subject))]
    async fn punishments_for(&self, subject: Snowflake) -> StoreResult<Vec<PunishmentRecord>> {
        self.with_conn(move |conn| {
            punishment_records::table
                .filter(punishment_records::subject_id.eq(subject.as_i64()))
                .order(punishment_records::created_at.desc())
                .select(PunishmentRow::as_select())
                .load(conn)
                .map_err(DatabaseError::from)?
                .into_iter()
                .map(PunishmentRecord::try_from)
                .collect()
        })
        .await
    }

    #[instrument(skip(self, event), fields(action = %event.action()))]
    async fn insert_audit_event(&self, event: &AuditEvent) -> StoreResult<()> {
        let row = NewAuditEventRow::from(event);
        self.with_conn(move |conn| {
            diesel::insert_into(audit_events::table)
                .values(&row)
                .execute(conn)
                .map_err(DatabaseError::from)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn recent_audit_events(&self, limit: i64) -> StoreResult<Vec<AuditEvent>> {
        self.with_conn(move |conn| {
            audit_events::table
                .order(audit_events::created_at.desc())
                .limit(limit)
                .select(AuditEventRow::as_select())
                .load(conn)
                .map_err(DatabaseError::from)?
                .into_iter()
                .map(AuditEvent::try_from)
                .collect()
        })
        .await
    }
}
