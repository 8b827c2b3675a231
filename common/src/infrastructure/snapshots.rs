use anyhow::{anyhow, Context};
use itertools::Itertools;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::domain::container::Container;
use crate::domain::projection::Projectable;

/// Load every container snapshot (`*.json`) found in a directory, ordered by file name.
pub fn load(snapshot_dir: &str) -> Result<Vec<Container>, anyhow::Error> {
    let dir_path = Path::new(snapshot_dir);

    tracing::debug!("Loading snapshots from {}", dir_path.to_string_lossy());

    let entries = fs::read_dir(dir_path).with_context(|| {
        format!(
            "failed to read snapshot directory: {}",
            dir_path.to_string_lossy()
        )
    })?;

    let mut paths = Vec::new();
    for entry_res in entries {
        let entry = entry_res.map_err(|e| anyhow!("failed to read a directory entry: {}", e))?;
        let path = entry.path();
        if path.is_file() && is_json(&path) {
            paths.push(path);
        }
    }

    paths
        .into_iter()
        .sorted()
        .map(|path| load_container(&path))
        .collect()
}

/// Write one snapshot per container, full projection including revisions.
pub fn save(snapshot_dir: &str, containers: &[Container]) -> Result<(), anyhow::Error> {
    let dir_path = Path::new(snapshot_dir);

    fs::create_dir_all(dir_path).with_context(|| {
        format!(
            "failed to create snapshot directory: {}",
            dir_path.to_string_lossy()
        )
    })?;

    for (index, container) in containers.iter().enumerate() {
        let path = dir_path.join(file_name(container, index));
        let content = serde_json::to_string_pretty(&Value::Object(container.to_map(&[])))
            .with_context(|| format!("failed to serialize snapshot '{}'", path.to_string_lossy()))?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write snapshot '{}'", path.to_string_lossy()))?;

        tracing::debug!("Saved {}", path.to_string_lossy());
    }

    Ok(())
}

fn load_container(path: &Path) -> Result<Container, anyhow::Error> {
    let path_str = path.to_string_lossy().into_owned();

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file '{}'", path_str))?;

    let value = serde_json::from_str::<Value>(&content)
        .with_context(|| format!("failed to parse JSON snapshot '{}'", path_str))?;

    Container::from_value(&value).with_context(|| format!("invalid snapshot '{}'", path_str))
}

// `<kind>_<name>.json`; unnamed containers get `<kind>.<index>.json`, which no name maps to
fn file_name(container: &Container, index: usize) -> String {
    let kind = container.kind().as_str();
    match container.name() {
        Some(name) => format!("{kind}_{}.json", name.normalized()),
        None => format!("{kind}.{index}.json"),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RevisionId;
    use crate::domain::container::ContainerKind;
    use crate::test_utils::{make_block, make_page, make_revision, user};

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();

        let mut home = make_page("home");
        home.add_revision(make_revision(1));
        home.add_revision(make_revision(2));
        home.publish_revision_by_id(RevisionId(1)).unwrap();
        home.stage_revision_by_id(RevisionId(2)).unwrap();
        let mut footer = make_block("blocks/footer");
        footer.set_staged_revision(make_revision(3));

        save(dir_path, &[home.clone(), footer]).unwrap();
        let loaded = load(dir_path).unwrap();

        // sorted by file name: block_blocks%2Ffooter.json, page_home.json
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name().map(|n| n.to_string()), Some("blocks/footer".to_string()));
        assert_eq!(loaded[0].staged_revision_id(), Some(RevisionId(3)));
        assert_eq!(loaded[1].published_revision_id(), Some(RevisionId(1)));
        assert_eq!(loaded[1].staged_revision_id(), Some(RevisionId(2)));
        assert_eq!(loaded[1].last_published(), home.last_published());
        assert_eq!(
            loaded[1].revisions().collect::<Vec<_>>(),
            home.revisions().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_similar_names_get_their_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();
        let unnamed = Container::new(ContainerKind::Block, user("author"), "placeholder");

        save(
            dir_path,
            &[
                make_block("blocks/footer"),
                make_block("blocks_footer"),
                make_block("unnamed_2"),
                unnamed,
            ],
        )
        .unwrap();
        let loaded = load(dir_path).unwrap();

        let names: Vec<_> = loaded
            .iter()
            .map(|c| c.name().map(|n| n.to_string()))
            .collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&Some("blocks/footer".to_string())));
        assert!(names.contains(&Some("blocks_footer".to_string())));
        assert!(names.contains(&Some("unnamed_2".to_string())));
        assert!(names.contains(&None));
    }

    #[test]
    fn test_load_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();

        let loaded = load(dir.path().to_str().unwrap()).unwrap();

        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_reports_broken_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page_home.json"), r#"{"kind": "page"}"#).unwrap();

        let error = load(dir.path().to_str().unwrap()).unwrap_err();

        assert!(format!("{error:#}").contains("page_home.json"));
    }

    #[test]
    fn test_load_missing_directory() {
        assert!(load("/definitely/not/here").is_err());
    }
}
