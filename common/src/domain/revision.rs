use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::error::ContainerError;
use crate::domain::projection::{
    get_created_by, get_created_date, get_created_reason, get_modified_by, get_modified_date,
    get_modified_reason, i64_from_value, restore_tracking, set_modified_by, set_modified_date,
    set_modified_reason, Field, Projectable,
};
use crate::domain::tracking::{Trackable, TrackingRecord};
use crate::domain::{RevisionId, RevisionIdGenerator, UserId};
use crate::{
    CONTENT_FIELD_NAME, CREATED_BY_FIELD_NAME, CREATED_DATE_FIELD_NAME,
    CREATED_REASON_FIELD_NAME, MODIFIED_BY_FIELD_NAME, MODIFIED_DATE_FIELD_NAME,
    MODIFIED_REASON_FIELD_NAME, REVISION_ID_FIELD_NAME, WAS_PUBLISHED_FIELD_NAME,
};

/// One snapshot of a container's content.
/// The content itself is opaque here; only its publish history matters.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    revision_id: RevisionId,
    content: Value,
    /// set once the revision has ever been live, never reset
    was_published: bool,
    tracking: TrackingRecord,
}

impl Revision {
    pub fn new(
        revision_id: RevisionId,
        content: Value,
        created_by_user_id: UserId,
        created_reason: impl Into<String>,
    ) -> Self {
        Self {
            revision_id,
            content,
            was_published: false,
            tracking: TrackingRecord::new(created_by_user_id, created_reason),
        }
    }

    /// Copy of this revision under a new identity, as if it was never published
    pub fn new_instance(
        &self,
        created_by_user_id: &UserId,
        created_reason: &str,
        ids: &mut impl RevisionIdGenerator,
    ) -> Result<Self, ContainerError> {
        Ok(Self::new(
            ids.next_revision_id()?,
            self.content.clone(),
            created_by_user_id.clone(),
            created_reason,
        ))
    }

    /// Rebuild a revision from its projection.
    pub fn from_value(value: &Value) -> Result<Self, ContainerError> {
        let Value::Object(data) = value else {
            return Err(ContainerError::InvalidRevision(format!(
                "expected an object, got {value}"
            )));
        };
        Self::from_map(data).map_err(|e| match e {
            ContainerError::InvalidRevision(_) => e,
            other => ContainerError::InvalidRevision(other.to_string()),
        })
    }

    fn from_map(data: &Map<String, Value>) -> Result<Self, ContainerError> {
        let revision_id = data
            .get(REVISION_ID_FIELD_NAME)
            .map(|value| i64_from_value(REVISION_ID_FIELD_NAME, value))
            .transpose()?
            .flatten()
            .map(RevisionId)
            .ok_or_else(|| ContainerError::InvalidRevision("missing revisionId".to_string()))?;

        let mut revision = Self {
            revision_id,
            content: Value::Null,
            was_published: false,
            tracking: restore_tracking(data)?,
        };
        revision.populate(data)?;
        Ok(revision)
    }

    pub fn revision_id(&self) -> RevisionId {
        self.revision_id
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn set_content(&mut self, content: Value) {
        self.content = content;
    }

    pub fn was_published(&self) -> bool {
        self.was_published
    }

    pub fn publish_revision(&mut self) {
        self.was_published = true;
    }
}

impl Trackable for Revision {
    fn tracking(&self) -> &TrackingRecord {
        &self.tracking
    }

    fn tracking_mut(&mut self) -> &mut TrackingRecord {
        &mut self.tracking
    }
}

static REVISION_FIELDS: [Field<Revision>; 9] = [
    Field::read_only(REVISION_ID_FIELD_NAME, |r| Value::from(r.revision_id.0)),
    Field::read_write(CONTENT_FIELD_NAME, |r| r.content.clone(), |r, value| {
        r.content = value.clone();
        Ok(())
    }),
    // publishing is one-way, a false value never clears the flag
    Field::read_write(WAS_PUBLISHED_FIELD_NAME, |r| Value::Bool(r.was_published), |r, value| {
        match value {
            Value::Bool(true) => r.publish_revision(),
            Value::Bool(false) | Value::Null => {}
            other => {
                return Err(ContainerError::InvalidField {
                    field: WAS_PUBLISHED_FIELD_NAME,
                    reason: format!("expected a boolean, got {other}"),
                });
            }
        }
        Ok(())
    }),
    Field::read_only(CREATED_BY_FIELD_NAME, get_created_by::<Revision>),
    Field::read_only(CREATED_DATE_FIELD_NAME, get_created_date::<Revision>),
    Field::read_only(CREATED_REASON_FIELD_NAME, get_created_reason::<Revision>),
    Field::read_write(MODIFIED_BY_FIELD_NAME, get_modified_by::<Revision>, set_modified_by::<Revision>),
    Field::read_write(MODIFIED_DATE_FIELD_NAME, get_modified_date::<Revision>, set_modified_date::<Revision>),
    Field::read_write(MODIFIED_REASON_FIELD_NAME, get_modified_reason::<Revision>, set_modified_reason::<Revision>),
];

impl Projectable for Revision {
    fn fields() -> &'static [Field<Self>] {
        &REVISION_FIELDS
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::Object(self.to_map(&[])).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::SequentialRevisionIds;
    use crate::test_utils::{make_revision, user};

    #[test]
    fn test_publish_is_idempotent() {
        let mut revision = make_revision(1);
        assert!(!revision.was_published());

        revision.publish_revision();
        revision.publish_revision();

        assert!(revision.was_published());
    }

    #[test]
    fn test_new_instance_resets_identity_and_history() {
        let mut source = make_revision(4);
        source.set_content(json!({"body": "<p>Hello</p>"}));
        source.publish_revision();
        let mut ids = SequentialRevisionIds::starting_at(100);

        let copy = source.new_instance(&user("copier"), "site copy", &mut ids).unwrap();

        assert_eq!(copy.revision_id(), RevisionId(100));
        assert_eq!(copy.content(), source.content());
        assert!(!copy.was_published());
        assert_eq!(copy.created_by_user_id(), &user("copier"));
        assert_eq!(copy.created_reason(), "site copy");
        assert!(copy.modified_by_user_id().is_none());
    }

    #[test]
    fn test_from_value_restores_projection() {
        let mut source = make_revision(9);
        source.set_content(json!({"title": "About"}));
        source.publish_revision();
        source.set_modified_by_user_id(user("editor"), "retitle");

        let restored = Revision::from_value(&json!(source)).unwrap();

        assert_eq!(restored, source);
    }

    #[test]
    fn test_was_published_cannot_be_cleared_by_populate() {
        let mut revision = make_revision(2);
        revision.publish_revision();

        revision
            .populate(json!({"wasPublished": false}).as_object().unwrap())
            .unwrap();

        assert!(revision.was_published());
    }

    #[test]
    fn test_from_value_rejects_non_revisions() {
        for value in [json!("not-a-revision"), json!({"content": "x"}), json!({"revisionId": 3})] {
            let result = Revision::from_value(&value);
            assert!(matches!(result, Err(ContainerError::InvalidRevision(_))), "{value}");
        }
    }
}
