use std::cell::OnceCell;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::error::ContainerError;
use crate::domain::projection::{
    date_from_value, date_to_value, format_date, get_created_by, get_created_date,
    get_created_reason, get_modified_by, get_modified_date, get_modified_reason, i64_from_value,
    invalid_field, optional_to_value, restore_tracking, set_modified_by, set_modified_date,
    set_modified_reason, string_from_value, Field, Projectable, ISO8601_FORMAT,
};
use crate::domain::revision::Revision;
use crate::domain::tracking::{Trackable, TrackingRecord};
use crate::domain::{
    ContainerName, RevisionId, RevisionIdGenerator, SiteId, SiteRepository, UserId,
};
use crate::{
    AUTHOR_FIELD_NAME, CREATED_BY_FIELD_NAME, CREATED_DATE_FIELD_NAME,
    CREATED_DATE_STRING_FIELD_NAME, CREATED_REASON_FIELD_NAME, CURRENT_REVISION_ID_FIELD_NAME,
    KIND_FIELD_NAME, LAST_PUBLISHED_FIELD_NAME, LAST_PUBLISHED_STRING_FIELD_NAME,
    MODIFIED_BY_FIELD_NAME, MODIFIED_DATE_FIELD_NAME, MODIFIED_REASON_FIELD_NAME,
    NAME_FIELD_NAME, PUBLISHED_REVISION_ID_FIELD_NAME, REVISIONS_FIELD_NAME,
    SITE_ID_FIELD_NAME, STAGED_REVISION_ID_FIELD_NAME,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerKind {
    Page,  // addressable page of a site
    Block, // reusable block shared between pages
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Page => "page",
            ContainerKind::Block => "block",
        }
    }
}

/// A versioned content unit: a page or a reusable block.
///
/// The container owns the whole revision history. Staged, published and
/// current revisions are ids pointing into that history:
/// - a revision is never staged and published at the same time,
/// - publishing drops whatever was staged,
/// - staging the published revision takes it offline.
#[derive(Debug, Clone)]
pub struct Container {
    kind: ContainerKind,
    name: Option<ContainerName>,
    author: Option<String>,
    last_published: Option<DateTime<Utc>>,

    published_revision_id: Option<RevisionId>,
    staged_revision_id: Option<RevisionId>,
    current_revision_id: Option<RevisionId>,

    /// owning site, resolved through a SiteRepository when needed
    site_id: Option<SiteId>,

    /// insertion order is the edit history
    revisions: IndexMap<RevisionId, Revision>,

    /// Computed on first successful lookup and kept for the life of this instance.
    last_saved_draft: OnceCell<RevisionId>,

    tracking: TrackingRecord,
}

impl Container {
    pub fn new(
        kind: ContainerKind,
        created_by_user_id: UserId,
        created_reason: impl Into<String>,
    ) -> Self {
        Self::with_tracking(kind, TrackingRecord::new(created_by_user_id, created_reason))
    }

    fn with_tracking(kind: ContainerKind, tracking: TrackingRecord) -> Self {
        Self {
            kind,
            name: None,
            author: None,
            last_published: None,
            published_revision_id: None,
            staged_revision_id: None,
            current_revision_id: None,
            site_id: None,
            revisions: IndexMap::new(),
            last_saved_draft: OnceCell::new(),
            tracking,
        }
    }

    /// Copy of this container with fresh tracking and no revision history yet.
    fn blank_copy(&self, created_by_user_id: &UserId, created_reason: &str) -> Self {
        let mut copy = Self::new(self.kind, created_by_user_id.clone(), created_reason);
        copy.name = self.name.clone();
        copy.author = self.author.clone();
        copy.site_id = self.site_id;
        copy
    }

    /// Clone for copy workflows.
    /// The published revision (or the staged one when nothing is live) is
    /// copied into a single staged revision of the new container.
    pub fn new_instance(
        &self,
        created_by_user_id: &UserId,
        created_reason: &str,
        ids: &mut impl RevisionIdGenerator,
    ) -> Result<Self, ContainerError> {
        let mut copy = self.blank_copy(created_by_user_id, created_reason);

        let source = self.published_revision().or_else(|| self.staged_revision());
        if let Some(source) = source {
            let revision = source.new_instance(created_by_user_id, created_reason, ids)?;
            tracing::debug!(
                "Copying revision {} of {:?} into staged revision {}",
                source.revision_id(),
                self.name,
                revision.revision_id()
            );
            copy.set_staged_revision(revision);
        }

        Ok(copy)
    }

    /// Clone that carries only live content: `None` unless something is published.
    /// Used by site copies so unpublished pages and drafts don't propagate.
    pub fn new_instance_if_has_revision(
        &self,
        created_by_user_id: &UserId,
        created_reason: &str,
        ids: &mut impl RevisionIdGenerator,
    ) -> Result<Option<Self>, ContainerError> {
        let Some(published) = self.published_revision() else {
            return Ok(None);
        };

        let mut copy = self.blank_copy(created_by_user_id, created_reason);
        copy.set_published_revision(published.new_instance(created_by_user_id, created_reason, ids)?);
        Ok(Some(copy))
    }

    /// Rebuild a container, revisions and slots included, from its full projection.
    pub fn from_value(value: &Value) -> Result<Self, ContainerError> {
        let Value::Object(data) = value else {
            return Err(invalid_field(KIND_FIELD_NAME, format!("expected an object, got {value}")));
        };

        let kind = data
            .get(KIND_FIELD_NAME)
            .cloned()
            .map(serde_json::from_value::<ContainerKind>)
            .transpose()
            .map_err(|e| invalid_field(KIND_FIELD_NAME, e.to_string()))?
            .ok_or_else(|| invalid_field(KIND_FIELD_NAME, "missing container kind"))?;

        let mut container = Self::with_tracking(kind, restore_tracking(data)?);
        container.populate(data)?;

        container.published_revision_id = container.restore_slot(data, PUBLISHED_REVISION_ID_FIELD_NAME)?;
        container.staged_revision_id = container.restore_slot(data, STAGED_REVISION_ID_FIELD_NAME)?;
        container.current_revision_id = container.restore_slot(data, CURRENT_REVISION_ID_FIELD_NAME)?;

        if container.published_revision_id.is_some()
            && container.published_revision_id == container.staged_revision_id
        {
            return Err(invalid_field(
                STAGED_REVISION_ID_FIELD_NAME,
                "revision can't be staged and published at once",
            ));
        }

        Ok(container)
    }

    fn restore_slot(
        &self,
        data: &Map<String, Value>,
        field: &'static str,
    ) -> Result<Option<RevisionId>, ContainerError> {
        let Some(id) = data
            .get(field)
            .map(|value| i64_from_value(field, value))
            .transpose()?
            .flatten()
            .map(RevisionId)
        else {
            return Ok(None);
        };
        if !self.revisions.contains_key(&id) {
            return Err(ContainerError::UnknownRevision(id));
        }
        Ok(Some(id))
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn name(&self) -> Option<&ContainerName> {
        self.name.as_ref()
    }

    /// Names end up in URLs and may not contain spaces
    pub fn set_name(&mut self, name: &str) -> Result<(), ContainerError> {
        let name = ContainerName::try_new(name)
            .map_err(|_| ContainerError::InvalidName(name.to_string()))?;
        self.name = Some(name);
        Ok(())
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = Some(author.into());
    }

    pub fn created_date_string(&self, format: &str) -> Option<String> {
        format_date(Some(self.tracking.created_date()), format)
    }

    pub fn last_published(&self) -> Option<DateTime<Utc>> {
        self.last_published
    }

    pub fn set_last_published(&mut self, last_published: DateTime<Utc>) {
        self.last_published = Some(last_published);
    }

    pub fn last_published_string(&self, format: &str) -> Option<String> {
        format_date(self.last_published, format)
    }

    // published slot

    pub fn published_revision(&self) -> Option<&Revision> {
        self.published_revision_id.and_then(|id| self.revisions.get(&id))
    }

    pub fn published_revision_id(&self) -> Option<RevisionId> {
        self.published_revision_id
    }

    /// Make `revision` live, adding it to the history when it is new.
    pub fn set_published_revision(&mut self, revision: Revision) {
        let revision_id = revision.revision_id();
        self.add_revision(revision);
        self.publish(revision_id);
    }

    /// Make a revision already in the history live.
    pub fn publish_revision_by_id(&mut self, revision_id: RevisionId) -> Result<(), ContainerError> {
        if !self.revisions.contains_key(&revision_id) {
            return Err(ContainerError::UnknownRevision(revision_id));
        }
        self.publish(revision_id);
        Ok(())
    }

    fn publish(&mut self, revision_id: RevisionId) {
        if self.staged_revision_id.is_some() {
            self.remove_staged_revision();
        }

        if let Some(revision) = self.revisions.get_mut(&revision_id) {
            revision.publish_revision();
        }
        self.published_revision_id = Some(revision_id);
        self.set_last_published(Utc::now());

        tracing::debug!("Published revision {} of {:?}", revision_id, self.name);
    }

    pub fn remove_published_revision(&mut self) {
        self.published_revision_id = None;
    }

    // staged slot

    pub fn staged_revision(&self) -> Option<&Revision> {
        self.staged_revision_id.and_then(|id| self.revisions.get(&id))
    }

    pub fn staged_revision_id(&self) -> Option<RevisionId> {
        self.staged_revision_id
    }

    /// Stage `revision`, adding it to the history when it is new.
    pub fn set_staged_revision(&mut self, revision: Revision) {
        let revision_id = revision.revision_id();
        self.add_revision(revision);
        self.stage(revision_id);
    }

    /// Stage a revision already in the history.
    pub fn stage_revision_by_id(&mut self, revision_id: RevisionId) -> Result<(), ContainerError> {
        if !self.revisions.contains_key(&revision_id) {
            return Err(ContainerError::UnknownRevision(revision_id));
        }
        self.stage(revision_id);
        Ok(())
    }

    fn stage(&mut self, revision_id: RevisionId) {
        if self.published_revision_id == Some(revision_id) {
            self.remove_published_revision();
        }
        self.staged_revision_id = Some(revision_id);

        tracing::debug!("Staged revision {} of {:?}", revision_id, self.name);
    }

    pub fn remove_staged_revision(&mut self) {
        self.staged_revision_id = None;
    }

    // current (displayed) revision

    pub fn current_revision(&self) -> Option<&Revision> {
        self.current_revision_id.and_then(|id| self.revisions.get(&id))
    }

    pub fn set_current_revision(&mut self, revision: Revision) {
        let revision_id = revision.revision_id();
        self.add_revision(revision);
        self.current_revision_id = Some(revision_id);
    }

    pub fn remove_current_revision(&mut self) {
        self.current_revision_id = None;
    }

    // site

    pub fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    pub fn set_site_id(&mut self, site_id: Option<SiteId>) {
        self.site_id = site_id;
    }

    pub fn site<R: SiteRepository>(&self, sites: &R) -> Option<R::Site> {
        self.site_id.and_then(|id| sites.find_site(id))
    }

    // revision history

    /// Insert or replace by id; a replaced revision keeps its place in the history.
    /// A revision that was live once stays marked as published when replaced.
    pub fn add_revision(&mut self, mut revision: Revision) {
        let revision_id = revision.revision_id();
        if self.revisions.get(&revision_id).is_some_and(Revision::was_published) {
            revision.publish_revision();
        }
        self.revisions.insert(revision_id, revision);
    }

    pub fn revision_by_id(&self, revision_id: RevisionId) -> Option<&Revision> {
        self.revisions.get(&revision_id)
    }

    /// Revisions in the order they were added
    pub fn revisions(&self) -> impl DoubleEndedIterator<Item = &Revision> + '_ {
        self.revisions.values()
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    /// Replace the whole history. Slots pointing at dropped revisions are cleared,
    /// and the remembered last saved draft is looked up again.
    pub fn set_revisions(&mut self, revisions: impl IntoIterator<Item = Revision>) {
        self.forget_last_saved_draft();
        self.revisions = revisions
            .into_iter()
            .map(|revision| (revision.revision_id(), revision))
            .collect();

        let present = |id: Option<RevisionId>| id.is_none_or(|id| self.revisions.contains_key(&id));
        let keep_published = present(self.published_revision_id);
        let keep_staged = present(self.staged_revision_id);
        let keep_current = present(self.current_revision_id);
        if !keep_published {
            self.remove_published_revision();
        }
        if !keep_staged {
            self.remove_staged_revision();
        }
        if !keep_current {
            self.remove_current_revision();
        }
    }

    /// Untyped variant of [`Container::set_revisions`]; nothing changes unless
    /// every element is a revision.
    pub fn set_revisions_from_values(&mut self, values: &[Value]) -> Result<(), ContainerError> {
        let revisions = values
            .iter()
            .map(Revision::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.set_revisions(revisions);
        Ok(())
    }

    /// Latest revision that was never live and is neither staged nor published.
    ///
    /// A found draft is remembered for the rest of this instance's life, even
    /// if the history or the slots change afterwards. Call
    /// [`Container::forget_last_saved_draft`] to look again.
    pub fn last_saved_draft_revision(&self) -> Option<&Revision> {
        if let Some(revision_id) = self.last_saved_draft.get() {
            return self.revisions.get(revision_id);
        }

        let draft = self.revisions.values().rev().find(|revision| {
            let revision_id = Some(revision.revision_id());
            revision_id != self.published_revision_id
                && revision_id != self.staged_revision_id
                && !revision.was_published()
        })?;

        let _ = self.last_saved_draft.set(draft.revision_id());
        Some(draft)
    }

    pub fn forget_last_saved_draft(&mut self) {
        self.last_saved_draft.take();
    }

    /// Copy every settable property of another container into this one.
    pub fn populate_from_object(&mut self, other: &Container) -> Result<(), ContainerError> {
        self.populate(&other.to_map(&[]))
    }
}

impl Trackable for Container {
    fn tracking(&self) -> &TrackingRecord {
        &self.tracking
    }

    fn tracking_mut(&mut self) -> &mut TrackingRecord {
        &mut self.tracking
    }
}

fn slot_to_value(id: Option<RevisionId>) -> Value {
    id.map_or(Value::Null, |id| Value::from(id.0))
}

static CONTAINER_FIELDS: [Field<Container>; 17] = [
    Field::read_only(KIND_FIELD_NAME, |c| Value::String(c.kind.as_str().to_string())),
    Field::read_write(NAME_FIELD_NAME, |c| optional_to_value(c.name.as_ref()), |c, value| {
        match string_from_value(NAME_FIELD_NAME, value)? {
            Some(name) => c.set_name(&name),
            None => {
                c.name = None;
                Ok(())
            }
        }
    }),
    Field::read_write(AUTHOR_FIELD_NAME, |c| optional_to_value(c.author.as_ref()), |c, value| {
        c.author = string_from_value(AUTHOR_FIELD_NAME, value)?;
        Ok(())
    }),
    // history goes first so the slots below always resolve
    Field::read_write(
        REVISIONS_FIELD_NAME,
        |c| Value::Array(c.revisions.values().map(|r| Value::Object(r.to_map(&[]))).collect()),
        |c, value| match value {
            Value::Array(values) => c.set_revisions_from_values(values),
            other => Err(ContainerError::InvalidRevision(format!("expected a list, got {other}"))),
        },
    ),
    Field::read_write(LAST_PUBLISHED_FIELD_NAME, |c| date_to_value(c.last_published), |c, value| {
        c.last_published = date_from_value(LAST_PUBLISHED_FIELD_NAME, value)?;
        Ok(())
    }),
    Field::read_only(PUBLISHED_REVISION_ID_FIELD_NAME, |c| slot_to_value(c.published_revision_id)),
    Field::read_only(STAGED_REVISION_ID_FIELD_NAME, |c| slot_to_value(c.staged_revision_id)),
    Field::read_only(CURRENT_REVISION_ID_FIELD_NAME, |c| slot_to_value(c.current_revision_id)),
    Field::read_write(
        SITE_ID_FIELD_NAME,
        |c| c.site_id.map_or(Value::Null, |id| Value::from(id.0)),
        |c, value| {
            c.site_id = i64_from_value(SITE_ID_FIELD_NAME, value)?.map(SiteId);
            Ok(())
        },
    ),
    Field::read_only(CREATED_BY_FIELD_NAME, get_created_by::<Container>),
    Field::read_only(CREATED_DATE_FIELD_NAME, get_created_date::<Container>),
    Field::read_only(CREATED_REASON_FIELD_NAME, get_created_reason::<Container>),
    Field::read_write(MODIFIED_BY_FIELD_NAME, get_modified_by::<Container>, set_modified_by::<Container>),
    Field::read_write(MODIFIED_DATE_FIELD_NAME, get_modified_date::<Container>, set_modified_date::<Container>),
    Field::read_write(MODIFIED_REASON_FIELD_NAME, get_modified_reason::<Container>, set_modified_reason::<Container>),
    Field::read_only(CREATED_DATE_STRING_FIELD_NAME, |c| {
        optional_to_value(c.created_date_string(ISO8601_FORMAT))
    }),
    Field::read_only(LAST_PUBLISHED_STRING_FIELD_NAME, |c| {
        optional_to_value(c.last_published_string(ISO8601_FORMAT))
    }),
];

impl Projectable for Container {
    fn fields() -> &'static [Field<Self>] {
        &CONTAINER_FIELDS
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.json_serialize().serialize(serializer)
    }
}
