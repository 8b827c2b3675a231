use chrono::{DateTime, Utc};

use crate::domain::UserId;

pub const UNKNOWN_REASON: &'static str = "Unknown reason";

/// System metadata: WHO did WHAT WHEN and WHY
/// Creation fields are fixed once the record exists, modification fields
/// are stamped by the owning entity when it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    created_by_user_id: UserId,
    created_date: DateTime<Utc>,
    created_reason: String,

    modified_by_user_id: Option<UserId>,
    modified_date: Option<DateTime<Utc>>,
    modified_reason: String,
}

impl TrackingRecord {
    pub fn new(created_by_user_id: UserId, created_reason: impl Into<String>) -> Self {
        Self::restore(created_by_user_id, Utc::now(), created_reason)
    }

    /// Rebuild a record from stored creation values
    pub fn restore(
        created_by_user_id: UserId,
        created_date: DateTime<Utc>,
        created_reason: impl Into<String>,
    ) -> Self {
        Self {
            created_by_user_id,
            created_date,
            created_reason: created_reason.into(),
            modified_by_user_id: None,
            modified_date: None,
            modified_reason: UNKNOWN_REASON.to_string(),
        }
    }

    pub fn created_by_user_id(&self) -> &UserId {
        &self.created_by_user_id
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn created_reason(&self) -> &str {
        &self.created_reason
    }

    pub fn modified_by_user_id(&self) -> Option<&UserId> {
        self.modified_by_user_id.as_ref()
    }

    pub fn modified_date(&self) -> Option<DateTime<Utc>> {
        self.modified_date
    }

    pub fn modified_reason(&self) -> &str {
        &self.modified_reason
    }

    /// Record a modification made now
    pub fn set_modified_by_user_id(&mut self, user_id: UserId, reason: impl Into<String>) {
        self.modified_by_user_id = Some(user_id);
        self.modified_date = Some(Utc::now());
        self.modified_reason = reason.into();
    }

    pub fn set_modified_user(&mut self, user_id: Option<UserId>) {
        self.modified_by_user_id = user_id;
    }

    pub fn set_modified_date(&mut self, date: Option<DateTime<Utc>>) {
        self.modified_date = date;
    }

    pub fn set_modified_reason(&mut self, reason: Option<String>) {
        self.modified_reason = reason.unwrap_or_else(|| UNKNOWN_REASON.to_string());
    }
}

/// Capability of entities carrying a [`TrackingRecord`].
pub trait Trackable {
    fn tracking(&self) -> &TrackingRecord;

    fn tracking_mut(&mut self) -> &mut TrackingRecord;

    fn created_by_user_id(&self) -> &UserId {
        self.tracking().created_by_user_id()
    }

    fn created_date(&self) -> DateTime<Utc> {
        self.tracking().created_date()
    }

    fn created_reason(&self) -> &str {
        self.tracking().created_reason()
    }

    fn modified_by_user_id(&self) -> Option<&UserId> {
        self.tracking().modified_by_user_id()
    }

    fn modified_date(&self) -> Option<DateTime<Utc>> {
        self.tracking().modified_date()
    }

    fn modified_reason(&self) -> &str {
        self.tracking().modified_reason()
    }

    fn set_modified_by_user_id(&mut self, user_id: UserId, reason: &str) {
        self.tracking_mut().set_modified_by_user_id(user_id, reason);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::test_utils::user;

    #[test]
    fn test_new_record_defaults() {
        let before = Utc::now();
        let record = TrackingRecord::new(user("author-1"), UNKNOWN_REASON);

        assert_eq!(record.created_by_user_id().as_ref(), "author-1");
        assert!(record.created_date() >= before);
        assert_eq!(record.created_reason(), UNKNOWN_REASON);
        assert!(record.modified_by_user_id().is_none());
        assert!(record.modified_date().is_none());
        assert_eq!(record.modified_reason(), UNKNOWN_REASON);
    }

    #[test]
    fn test_modification_keeps_creation() {
        let created = Utc.with_ymd_and_hms(2020, 5, 17, 8, 30, 0).unwrap();
        let mut record = TrackingRecord::restore(user("author-1"), created, "import");

        record.set_modified_by_user_id(user("editor-2"), "fix typo");

        assert_eq!(record.created_date(), created);
        assert_eq!(record.created_reason(), "import");
        assert_eq!(record.modified_by_user_id(), Some(&user("editor-2")));
        assert_eq!(record.modified_reason(), "fix typo");
        assert!(record.modified_date().unwrap() > created);
    }

    #[test]
    fn test_modified_reason_falls_back_to_unknown() {
        let mut record = TrackingRecord::new(user("author-1"), "create");
        record.set_modified_reason(Some("review".to_string()));
        assert_eq!(record.modified_reason(), "review");
        record.set_modified_reason(None);
        assert_eq!(record.modified_reason(), UNKNOWN_REASON);
    }
}
