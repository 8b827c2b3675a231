use std::fmt::{Display, Formatter};
use std::sync::LazyLock;
use nutype::nutype;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ContainerError;

pub mod container;
pub mod error;
pub mod projection;
pub mod revision;
pub mod tracking;

/// Hands out identities for new revisions.
/// Real ids come from the storage layer, the core only asks for the next one.
pub trait RevisionIdGenerator {
    /// Fails once the id space is used up.
    fn next_revision_id(&mut self) -> Result<RevisionId, ContainerError>;
}

/// Resolves the site a container belongs to.
/// Containers keep only the site id and go through this lookup on demand.
pub trait SiteRepository {
    type Site;

    /// find site by its id
    fn find_site(&self, id: SiteId) -> Option<Self::Site>;
}

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevisionId(pub i64);

impl From<i64> for RevisionId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for RevisionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteId(pub i64);

impl From<i64> for SiteId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for SiteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-memory id source counting up from a starting point.
#[derive(Debug, Clone)]
pub struct SequentialRevisionIds {
    /// `None` once `i64::MAX` has been handed out
    next: Option<i64>,
}

impl SequentialRevisionIds {
    pub fn starting_at(first: i64) -> Self {
        Self { next: Some(first) }
    }

    /// Start right after the largest of the given ids, so fresh ids never collide with them.
    pub fn after(ids: impl IntoIterator<Item = RevisionId>) -> Self {
        let next = match ids.into_iter().map(|id| id.0).max() {
            Some(largest) => largest.checked_add(1),
            None => Some(1),
        };
        Self { next }
    }
}

impl RevisionIdGenerator for SequentialRevisionIds {
    fn next_revision_id(&mut self) -> Result<RevisionId, ContainerError> {
        let id = self.next.ok_or(ContainerError::RevisionIdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(RevisionId(id))
    }
}

// A regex for container names: any symbol except whitespace.
// Example: "home", "about-us" or "blocks/footer" are valid; "my page" is not.
pub const CONTAINER_NAME_REGEX: &str = r"^\S+$";

static CONTAINER_NAME_REGEX_COMPILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(CONTAINER_NAME_REGEX).expect("CONTAINER_NAME_REGEX must be a valid regex")
});

#[nutype(
    validate(not_empty, regex = CONTAINER_NAME_REGEX_COMPILED),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct ContainerName(String);

impl ContainerName {
    /// Name usable as a single path segment.
    /// Percent-encodes `%` and path separators, so distinct names stay distinct.
    pub fn normalized(&self) -> String {
        self.as_ref()
            .replace('%', "%25")
            .replace('/', "%2F")
            .replace('\\', "%5C")
    }
}

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct UserId(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_name_rejects_whitespace() {
        assert!(ContainerName::try_new("about-us").is_ok());
        assert!(ContainerName::try_new("blocks/footer").is_ok());
        assert!(ContainerName::try_new("my page").is_err());
        assert!(ContainerName::try_new(" leading").is_err());
        assert!(ContainerName::try_new("tab\tname").is_err());
        assert!(ContainerName::try_new("").is_err());
    }

    #[test]
    fn test_container_name_normalized() {
        let normalized = |name: &str| ContainerName::try_new(name).unwrap().normalized();

        assert_eq!(normalized("blocks/footer"), "blocks%2Ffooter");
        assert_eq!(normalized("blocks_footer"), "blocks_footer");
        assert_eq!(normalized("100%/off"), "100%25%2Foff");
        assert_ne!(normalized("a%2Fb"), normalized("a/b"));
    }

    #[test]
    fn test_user_id_is_trimmed() {
        let user = UserId::try_new("  editor-7 ").unwrap();
        assert_eq!(user.as_ref(), "editor-7");
        assert!(UserId::try_new("   ").is_err());
    }

    #[test]
    fn test_sequential_ids_start_after_largest() {
        let mut ids = SequentialRevisionIds::after([RevisionId(3), RevisionId(11), RevisionId(7)]);
        assert_eq!(ids.next_revision_id(), Ok(RevisionId(12)));
        assert_eq!(ids.next_revision_id(), Ok(RevisionId(13)));

        let mut empty = SequentialRevisionIds::after([]);
        assert_eq!(empty.next_revision_id(), Ok(RevisionId(1)));
    }

    #[test]
    fn test_sequential_ids_stop_at_the_end_of_the_id_space() {
        let mut ids = SequentialRevisionIds::starting_at(i64::MAX);
        assert_eq!(ids.next_revision_id(), Ok(RevisionId(i64::MAX)));
        assert_eq!(ids.next_revision_id(), Err(ContainerError::RevisionIdsExhausted));

        let mut after_max = SequentialRevisionIds::after([RevisionId(i64::MAX)]);
        assert_eq!(after_max.next_revision_id(), Err(ContainerError::RevisionIdsExhausted));
    }
}
