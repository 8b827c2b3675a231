use revisions_common::container::Container;
use revisions_common::error::ContainerError;
use revisions_common::revision::Revision;
use revisions_common::{SequentialRevisionIds, SiteId, UserId};
use serde::Deserialize;

/// Which containers of a site make it into the copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicationMode {
    /// only containers with live content; drafts stay behind
    PublishedOnly,
    /// every container; live content becomes the staged draft of the copy
    All,
}

/// Copies the containers of one site into another.
#[derive(Debug, Clone)]
pub struct Duplication {
    mode: DuplicationMode,
    target_site_id: SiteId,
    created_by_user_id: UserId,
    created_reason: String,
}

impl Duplication {
    pub fn new(
        mode: DuplicationMode,
        target_site_id: SiteId,
        created_by_user_id: UserId,
        created_reason: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            target_site_id,
            created_by_user_id,
            created_reason: created_reason.into(),
        }
    }

    /// New revision ids continue after the largest id of the source set.
    pub fn run(&self, containers: &[Container]) -> Result<Vec<Container>, ContainerError> {
        let mut ids = SequentialRevisionIds::after(
            containers
                .iter()
                .flat_map(|container| container.revisions().map(Revision::revision_id)),
        );

        let mut copies = Vec::with_capacity(containers.len());
        for container in containers {
            let copy = match self.mode {
                DuplicationMode::PublishedOnly => container.new_instance_if_has_revision(
                    &self.created_by_user_id,
                    &self.created_reason,
                    &mut ids,
                )?,
                DuplicationMode::All => Some(container.new_instance(
                    &self.created_by_user_id,
                    &self.created_reason,
                    &mut ids,
                )?),
            };

            let Some(mut copy) = copy else {
                tracing::warn!(
                    "Skipping {} {:?}: nothing published",
                    container.kind().as_str(),
                    container.name()
                );
                continue;
            };
            copy.set_site_id(Some(self.target_site_id));
            copies.push(copy);
        }

        Ok(copies)
    }
}

#[cfg(test)]
mod tests {
    use revisions_common::test_utils::{make_block, make_page, make_revision, user};
    use revisions_common::tracking::Trackable;
    use revisions_common::RevisionId;

    use super::*;

    fn source_site() -> Vec<Container> {
        let mut home = make_page("home");
        home.set_site_id(Some(SiteId(1)));
        home.add_revision(make_revision(1));
        home.add_revision(make_revision(2));
        home.publish_revision_by_id(RevisionId(1)).unwrap();
        home.stage_revision_by_id(RevisionId(2)).unwrap();

        let mut draft = make_page("coming-soon");
        draft.set_site_id(Some(SiteId(1)));
        draft.set_staged_revision(make_revision(3));

        let mut footer = make_block("footer");
        footer.set_site_id(Some(SiteId(1)));
        footer.set_published_revision(make_revision(4));

        vec![home, draft, footer]
    }

    #[test]
    fn test_published_only_skips_drafts() {
        let duplication =
            Duplication::new(DuplicationMode::PublishedOnly, SiteId(2), user("copier"), "copy");

        let copies = duplication.run(&source_site()).unwrap();

        let names: Vec<_> = copies
            .iter()
            .map(|c| c.name().map(|n| n.to_string()).unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["home", "footer"]);
        for copy in &copies {
            assert_eq!(copy.site_id(), Some(SiteId(2)));
            assert_eq!(copy.revision_count(), 1);
            assert!(copy.staged_revision().is_none());
            assert!(copy.published_revision_id().unwrap() > RevisionId(4));
            assert_eq!(copy.created_by_user_id(), &user("copier"));
        }
    }

    #[test]
    fn test_all_stages_everything() {
        let duplication = Duplication::new(DuplicationMode::All, SiteId(2), user("copier"), "copy");

        let copies = duplication.run(&source_site()).unwrap();

        assert_eq!(copies.len(), 3);
        let staged: Vec<_> = copies.iter().map(Container::staged_revision_id).collect();
        assert_eq!(
            staged,
            vec![Some(RevisionId(5)), Some(RevisionId(6)), Some(RevisionId(7))]
        );
        assert!(copies.iter().all(|c| c.published_revision().is_none()));
        // the copy of home starts from its live content, not its draft
        let source = source_site();
        assert_eq!(
            copies[0].staged_revision().unwrap().content(),
            source[0].published_revision().unwrap().content()
        );
    }

    #[test]
    fn test_run_fails_when_ids_run_out() {
        let mut page = make_page("home");
        page.set_published_revision(make_revision(i64::MAX));
        let duplication = Duplication::new(DuplicationMode::All, SiteId(2), user("copier"), "copy");

        let result = duplication.run(&[page]);

        assert!(matches!(result, Err(ContainerError::RevisionIdsExhausted)));
    }

    #[test]
    fn test_mode_from_config_value() {
        let mode: DuplicationMode = serde_json::from_str("\"published_only\"").unwrap();
        assert_eq!(mode, DuplicationMode::PublishedOnly);
    }
}
