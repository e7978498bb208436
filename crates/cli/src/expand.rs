//! Component-id expansion.
//!
//! Wildcard patterns (`utils/*`) and the `--all` flag are resolved
//! against the store's component list here, before the engine runs; the
//! orchestrator only ever sees a concrete, deduplicated id list.

use anyhow::{bail, Result};
use glob_match::glob_match;

use compvc_core::component::ComponentId;
use compvc_core::store::VersionStore;

/// Resolve raw id arguments into a deduplicated list of component ids.
///
/// With `all` set the arguments are ignored and every tracked component
/// is returned. Patterns containing `*` match against `scope/name`;
/// a pattern matching nothing is an error, as is a malformed id.
pub fn expand_ids(
    store: &dyn VersionStore,
    raw_ids: &[String],
    all: bool,
) -> Result<Vec<ComponentId>> {
    if all {
        let ids = store.list_components()?;
        if ids.is_empty() {
            bail!("the store has no tracked components");
        }
        return Ok(ids);
    }

    if raw_ids.is_empty() {
        bail!("no component ids given (use --all for every component)");
    }

    let mut resolved: Vec<ComponentId> = Vec::new();
    let mut push = |id: ComponentId, resolved: &mut Vec<ComponentId>| {
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    };

    for raw in raw_ids {
        if raw.contains('*') {
            let mut matched = false;
            for id in store.list_components()? {
                if glob_match(raw, &id.to_string_without_version()) {
                    push(id, &mut resolved);
                    matched = true;
                }
            }
            if !matched {
                bail!("no components match pattern '{}'", raw);
            }
        } else {
            let Some(id) = ComponentId::parse(raw) else {
                bail!("invalid component id '{}' (expected scope/name)", raw);
            };
            push(id, &mut resolved);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compvc_core::component::Version;
    use compvc_core::snapshot::FileSnapshot;
    use compvc_core::store::FsStore;
    use tempfile::TempDir;

    fn store_with(names: &[(&str, &str)]) -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        let snap = FileSnapshot::from_files([("a.txt", "a")]);
        for (scope, name) in names {
            let id = ComponentId::new(*scope, *name);
            store.publish(&id, &Version::new("v1"), &snap).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_plain_ids_parse_and_dedupe() {
        let (_dir, store) = store_with(&[("utils", "sort")]);
        let ids = expand_ids(
            &store,
            &["utils/sort".into(), "utils/sort".into()],
            false,
        )
        .unwrap();
        assert_eq!(ids, vec![ComponentId::new("utils", "sort")]);
    }

    #[test]
    fn test_wildcard_matches_scope() {
        let (_dir, store) = store_with(&[("utils", "sort"), ("utils", "zip"), ("core", "alloc")]);
        let ids = expand_ids(&store, &["utils/*".into()], false).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| id.scope == "utils"));
    }

    #[test]
    fn test_all_lists_everything() {
        let (_dir, store) = store_with(&[("utils", "sort"), ("core", "alloc")]);
        let ids = expand_ids(&store, &[], true).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_unmatched_pattern_is_an_error() {
        let (_dir, store) = store_with(&[("utils", "sort")]);
        assert!(expand_ids(&store, &["nope/*".into()], false).is_err());
    }

    #[test]
    fn test_invalid_id_is_an_error() {
        let (_dir, store) = store_with(&[("utils", "sort")]);
        assert!(expand_ids(&store, &["no-slash".into()], false).is_err());
    }

    #[test]
    fn test_empty_without_all_is_an_error() {
        let (_dir, store) = store_with(&[("utils", "sort")]);
        assert!(expand_ids(&store, &[], false).is_err());
    }
}
