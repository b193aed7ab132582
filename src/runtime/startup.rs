use std::path::Path;

use tracing::info;

use crate::catalog::{Catalog, TrackId, scan};
use crate::config::LibrarySettings;
use crate::error::{Error, Result};

const TAG_PREFIX: &str = "tag:";

/// Turn command-line targets into queue ids, in argument order.
///
/// A target is a directory (scanned into transient tracks), `tag:NAME`, or
/// anything [`Catalog::lookup`] resolves. No targets means the whole
/// catalog.
pub fn resolve_targets(
    catalog: &mut Catalog,
    targets: &[String],
    library: &LibrarySettings,
) -> Result<Vec<TrackId>> {
    if targets.is_empty() {
        return Ok(catalog.ids());
    }

    let mut ids = Vec::new();
    for target in targets {
        let path = Path::new(target);
        if path.is_dir() {
            let tracks = scan(path, library);
            info!(dir = %path.display(), tracks = tracks.len(), "scanned directory");
            ids.extend(catalog.add_transient(tracks));
        } else if let Some(tag) = target.strip_prefix(TAG_PREFIX) {
            let tagged = catalog.with_tag(tag);
            if tagged.is_empty() {
                return Err(Error::TrackNotFound(target.clone()));
            }
            ids.extend(tagged);
        } else {
            ids.push(catalog.lookup(target)?);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::catalog::Track;

    fn catalog() -> Catalog {
        let mut a = Track::new(0, "Alpha", "/music/alpha.flac");
        a.tags.insert("calm".into());
        let b = Track::new(1, "Beta", "/music/beta.flac");
        let mut c = Track::new(2, "Gamma", "/music/gamma.flac");
        c.tags.insert("calm".into());
        Catalog::from_tracks(vec![a, b, c])
    }

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_targets_queue_everything() {
        let mut c = catalog();
        let ids = resolve_targets(&mut c, &[], &LibrarySettings::default()).unwrap();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn ids_titles_and_tags_keep_argument_order() {
        let mut c = catalog();
        let ids = resolve_targets(&mut c, &args(&["beta", "tag:calm", "1"]), &LibrarySettings::default())
            .unwrap();
        assert_eq!(ids, vec![1, 0, 2, 1]);
    }

    #[test]
    fn unknown_targets_are_errors() {
        let mut c = catalog();
        let err = resolve_targets(&mut c, &args(&["tag:loud"]), &LibrarySettings::default());
        assert!(matches!(err, Err(Error::TrackNotFound(q)) if q == "tag:loud"));
        assert!(resolve_targets(&mut c, &args(&["zzz"]), &LibrarySettings::default()).is_err());
    }

    #[test]
    fn directories_become_transient_tracks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("two.mp3"), b"not real").unwrap();

        let mut c = catalog();
        let target = dir.path().to_string_lossy().into_owned();
        let ids = resolve_targets(&mut c, &[target], &LibrarySettings::default()).unwrap();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(c.get(3).map(|t| t.title.as_str()), Some("one"));
    }
}
