//! In-memory [`GuardRepository`] for tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use warden_error::{DatabaseError, DatabaseErrorKind};
use warden_interface::{
    AllowListEntry, AuditEvent, GuardRepository, PunishmentRecord, Snowflake, StoreResult,
};

#[derive(Debug, Default)]
struct Tables {
    allow_list: Vec<AllowListEntry>,
    punishments: Vec<PunishmentRecord>,
    audit_events: Vec<AuditEvent>,
}

/// A [`GuardRepository`] held in process memory.
///
/// Nothing survives a restart. [`MemoryRepository::set_available`] simulates
/// an unreachable store: every call then fails with a connection error.
#[derive(Debug)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Empty, reachable store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Make every subsequent call succeed or fail.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every stored audit event, oldest first.
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.tables.lock().audit_events.clone()
    }

    /// Every stored punishment, oldest first.
    pub fn punishments(&self) -> Vec<PunishmentRecord> {
        self.tables.lock().punishments.clone()
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "store unavailable".to_string(),
            )))
        }
    }
}

#[async_trait]
impl GuardRepository for MemoryRepository {
    async fn find_allow_entry(&self, subject: Snowflake) -> StoreResult<Option<AllowListEntry>> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .allow_list
            .iter()
            .find(|e| e.subject_id == subject)
            .cloned())
    }

    async fn insert_allow_entry(&self, entry: &AllowListEntry) -> StoreResult<()> {
        self.check()?;
        let mut tables = self.tables.lock();
        if tables.allow_list.iter().any(|e| e.subject_id == entry.subject_id) {
            return Err(DatabaseError::new(DatabaseErrorKind::Duplicate(format!(
                "subject_id {}",
                entry.subject_id
            ))));
        }
        tables.allow_list.push(entry.clone());
        Ok(())
    }

    async fn delete_allow_entry(&self, subject: Snowflake) -> StoreResult<bool> {
        self.check()?;
        let mut tables = self.tables.lock();
        let before = tables.allow_list.len();
        tables.allow_list.retain(|e| e.subject_id != subject);
        Ok(tables.allow_list.len() != before)
    }

    async fn list_active_allow_entries(&self) -> StoreResult<Vec<AllowListEntry>> {
        self.check()?;
        let mut entries: Vec<_> = self
            .tables
            .lock()
            .allow_list
            .iter()
            .filter(|e| e.active)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.granted_at);
        Ok(entries)
    }

    async fn touch_last_seen(&self, subject: Snowflake, at: DateTime<Utc>) -> StoreResult<()> {
        self.check()?;
        if let Some(entry) = self
            .tables
            .lock()
            .allow_list
            .iter_mut()
            .find(|e| e.subject_id == subject)
        {
            entry.last_seen_at = Some(at);
        }
        Ok(())
    }

    async fn insert_punishment(&self, record: &PunishmentRecord) -> StoreResult<()> {
        self.check()?;
        self.tables.lock().punishments.push(record.clone());
        Ok(())
    }

    async fn punishments_for(&self, subject: Snowflake) -> StoreResult<Vec<PunishmentRecord>> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .punishments
            .iter()
            .rev()
            .filter(|r| *r.subject_id() == subject)
            .cloned()
            .collect())
    }

    async fn insert_audit_event(&self, event: &AuditEvent) -> StoreResult<()> {
        self.check()?;
        self.tables.lock().audit_events.push(event.clone());
        Ok(())
    }

    async fn recent_audit_events(&self, limit: i64) -> StoreResult<Vec<AuditEvent>> {
        self.check()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .tables
            .lock()
            .audit_events
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
