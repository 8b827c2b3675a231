//! Fixture builders for containers and revisions.
//!
//! Public so that other crates can reuse it for their own tests.

use serde_json::json;

use crate::domain::container::{Container, ContainerKind};
use crate::domain::revision::Revision;
use crate::domain::tracking::UNKNOWN_REASON;
use crate::domain::{RevisionId, UserId};

pub fn user(id: &str) -> UserId {
    UserId::try_new(id).unwrap()
}

/// Unpublished revision with a small content payload naming its id.
pub fn make_revision(id: i64) -> Revision {
    Revision::new(
        RevisionId(id),
        json!({ "html": format!("<p>revision {id}</p>") }),
        user("author"),
        UNKNOWN_REASON,
    )
}

pub fn make_container(kind: ContainerKind, name: &str) -> Container {
    let mut container = Container::new(kind, user("author"), UNKNOWN_REASON);
    container.set_name(name).unwrap();
    container
}

/// Convenience for creating a named page without revisions.
pub fn make_page(name: &str) -> Container {
    make_container(ContainerKind::Page, name)
}

/// Convenience for creating a named reusable block without revisions.
pub fn make_block(name: &str) -> Container {
    make_container(ContainerKind::Block, name)
}
