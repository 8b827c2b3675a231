mod domain;
mod infrastructure;

pub mod test_utils;

// Projected container field names

pub const KIND_FIELD_NAME: &'static str = "kind";
pub const NAME_FIELD_NAME: &'static str = "name";
pub const AUTHOR_FIELD_NAME: &'static str = "author";
pub const SITE_FIELD_NAME: &'static str = "site";
pub const SITE_ID_FIELD_NAME: &'static str = "siteId";
pub const REVISIONS_FIELD_NAME: &'static str = "revisions";

pub const LAST_PUBLISHED_FIELD_NAME: &'static str = "lastPublished";
pub const PUBLISHED_REVISION_ID_FIELD_NAME: &'static str = "publishedRevisionId";
pub const STAGED_REVISION_ID_FIELD_NAME: &'static str = "stagedRevisionId";
pub const CURRENT_REVISION_ID_FIELD_NAME: &'static str = "currentRevisionId";

pub const CREATED_DATE_STRING_FIELD_NAME: &'static str = "createdDateString";
pub const LAST_PUBLISHED_STRING_FIELD_NAME: &'static str = "lastPublishedString";

// Projected revision field names

pub const REVISION_ID_FIELD_NAME: &'static str = "revisionId";
pub const CONTENT_FIELD_NAME: &'static str = "content";
pub const WAS_PUBLISHED_FIELD_NAME: &'static str = "wasPublished";

// Tracking field names

pub const CREATED_BY_FIELD_NAME: &'static str = "createdByUserId";
pub const CREATED_DATE_FIELD_NAME: &'static str = "createdDate";
pub const CREATED_REASON_FIELD_NAME: &'static str = "createdReason";

pub const MODIFIED_BY_FIELD_NAME: &'static str = "modifiedByUserId";
pub const MODIFIED_DATE_FIELD_NAME: &'static str = "modifiedDate";
pub const MODIFIED_REASON_FIELD_NAME: &'static str = "modifiedReason";

// expose domain module

pub use domain::*;

// expose snapshot files

pub use infrastructure::snapshots;
