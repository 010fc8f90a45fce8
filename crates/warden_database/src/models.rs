//! Row types and conversions to the domain records.

use crate::schema::{allow_list_entries, audit_events, punishment_records};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use warden_error::{DatabaseError, DatabaseErrorKind};
use warden_interface::{
    AllowListEntry, AuditEvent, GuardSource, LogCategory, PunishmentRecord, PunishmentType,
    Snowflake,
};

/// Database row for `allow_list_entries`.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = allow_list_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AllowListRow {
    pub id: i32,
    pub subject_id: i64,
    pub granted_by: Option<i64>,
    pub granted_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub saved_roles: Vec<i64>,
    pub in_sleep_mode: bool,
}

/// Insertable struct for `allow_list_entries`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = allow_list_entries)]
pub struct NewAllowListRow {
    pub subject_id: i64,
    pub granted_by: Option<i64>,
    pub granted_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub saved_roles: Vec<i64>,
    pub in_sleep_mode: bool,
}

impl From<AllowListRow> for AllowListEntry {
    fn from(row: AllowListRow) -> Self {
        Self {
            subject_id: Snowflake::from_i64(row.subject_id),
            granted_by: row.granted_by.map(Snowflake::from_i64),
            granted_at: row.granted_at,
            last_seen_at: row.last_seen_at,
            active: row.active,
            saved_roles: row.saved_roles.into_iter().map(Snowflake::from_i64).collect(),
            in_sleep_mode: row.in_sleep_mode,
        }
    }
}

impl From<&AllowListEntry> for NewAllowListRow {
    fn from(entry: &AllowListEntry) -> Self {
        Self {
            subject_id: entry.subject_id.as_i64(),
            granted_by: entry.granted_by.map(Snowflake::as_i64),
            granted_at: entry.granted_at,
            last_seen_at: entry.last_seen_at,
            active: entry.active,
            saved_roles: entry.saved_roles.iter().map(|id| id.as_i64()).collect(),
            in_sleep_mode: entry.in_sleep_mode,
        }
    }
}

/// Database row for `punishment_records`.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = punishment_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PunishmentRow {
    pub id: i32,
    pub subject_id: i64,
    pub guard_source: String,
    pub action: String,
    pub reason: String,
    pub punishment_type: String,
    pub evidence: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for `punishment_records`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = punishment_records)]
pub struct NewPunishmentRow {
    pub subject_id: i64,
    pub guard_source: String,
    pub action: String,
    pub reason: String,
    pub punishment_type: String,
    pub evidence: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&PunishmentRecord> for NewPunishmentRow {
    fn from(record: &PunishmentRecord) -> Self {
        Self {
            subject_id: record.subject_id().as_i64(),
            guard_source: record.guard_source().to_string(),
            action: record.action().clone(),
            reason: record.reason().clone(),
            punishment_type: record.punishment_type().to_string(),
            evidence: record.evidence().clone(),
            created_at: *record.timestamp(),
        }
    }
}

impl TryFrom<PunishmentRow> for PunishmentRecord {
    type Error = DatabaseError;

    fn try_from(row: PunishmentRow) -> Result<Self, Self::Error> {
        let source = parse_column::<GuardSource>("guard_source", &row.guard_source)?;
        let kind = parse_column::<PunishmentType>("punishment_type", &row.punishment_type)?;
        let record = PunishmentRecord::new(Snowflake::from_i64(row.subject_id), source, row.action, kind)
            .with_reason(row.reason)
            .with_timestamp(row.created_at);
        Ok(match row.evidence {
            Some(evidence) => record.with_evidence(evidence),
            None => record,
        })
    }
}

/// Database row for `audit_events`.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditEventRow {
    pub id: i32,
    pub category: String,
    pub executor_id: Option<i64>,
    pub action: String,
    pub target_id: Option<i64>,
    pub source: String,
    pub details: serde_json::Value,
    pub was_blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for `audit_events`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_events)]
pub struct NewAuditEventRow {
    pub category: String,
    pub executor_id: Option<i64>,
    pub action: String,
    pub target_id: Option<i64>,
    pub source: String,
    pub details: serde_json::Value,
    pub was_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&AuditEvent> for NewAuditEventRow {
    fn from(event: &AuditEvent) -> Self {
        Self {
            category: event.category().to_string(),
            executor_id: event.executor_id().map(Snowflake::as_i64),
            action: event.action().clone(),
            target_id: event.target_id().map(Snowflake::as_i64),
            source: event.source().to_string(),
            details: event.details().clone(),
            was_blocked: *event.was_blocked(),
            created_at: *event.timestamp(),
        }
    }
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = DatabaseError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let category = parse_column::<LogCategory>("category", &row.category)?;
        let source = parse_column::<GuardSource>("source", &row.source)?;
        let mut event = AuditEvent::new(category, row.action, source)
            .with_details(row.details)
            .with_was_blocked(row.was_blocked)
            .with_timestamp(row.created_at);
        if let Some(executor) = row.executor_id {
            event = event.with_executor_id(Snowflake::from_i64(executor));
        }
        if let Some(target) = row.target_id {
            event = event.with_target_id(Snowflake::from_i64(target));
        }
        Ok(event)
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, DatabaseError> {
    value.parse::<T>().map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Serialization(format!(
            "unrecognised {} '{}'",
            column, value
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_row_roundtrip_keeps_labels() {
        let event = AuditEvent::new(LogCategory::BotAdd, "BOT_ADD_BLOCKED", GuardSource::Role)
            .with_executor_id(Snowflake(u64::MAX))
            .with_was_blocked(true);
        let new_row = NewAuditEventRow::from(&event);
        assert_eq!(new_row.category, "bot_add");
        assert_eq!(new_row.source, "GUARD-ROLE");

        let row = AuditEventRow {
            id: 1,
            category: new_row.category,
            executor_id: new_row.executor_id,
            action: new_row.action,
            target_id: new_row.target_id,
            source: new_row.source,
            details: new_row.details,
            was_blocked: new_row.was_blocked,
            created_at: new_row.created_at,
        };
        let back = AuditEvent::try_from(row).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_unknown_punishment_type_is_serialization_error() {
        let row = PunishmentRow {
            id: 1,
            subject_id: 7,
            guard_source: "GUARD-BAN".to_string(),
            action: "BAN_ATTEMPT_BLOCKED".to_string(),
            reason: String::new(),
            punishment_type: "exile".to_string(),
            evidence: None,
            created_at: Utc::now(),
        };
        let err = PunishmentRecord::try_from(row).unwrap_err();
        assert!(matches!(err.kind, DatabaseErrorKind::Serialization(_)));
    }

    #[test]
    fn test_allow_list_row_maps_sleep_mode_fields() {
        let mut entry = AllowListEntry::new(Snowflake(10), Some(Snowflake(1)));
        entry.saved_roles = vec![Snowflake(5), Snowflake(6)];
        let row = NewAllowListRow::from(&entry);
        assert_eq!(row.saved_roles, vec![5, 6]);
        assert!(row.active);
        assert_eq!(row.granted_by, Some(1));
    }
}
