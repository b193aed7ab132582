use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::model::{Track, TrackId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// The song catalog: every known track, looked up by id or title.
#[derive(Debug, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
    path: Option<PathBuf>,
    /// Ids added by [`Catalog::add_transient`]; never saved.
    transient: HashSet<TrackId>,
}

impl Catalog {
    /// An in-memory catalog that is never written back.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            path: None,
            transient: HashSet::new(),
        }
    }

    /// Load the catalog at `path`. A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let tracks = match fs::read_to_string(path) {
            Ok(text) => {
                let file: CatalogFile =
                    serde_json::from_str(&text).map_err(|source| Error::Catalog {
                        path: path.to_path_buf(),
                        source,
                    })?;
                file.tracks
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no catalog yet");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), tracks = tracks.len(), "catalog loaded");
        Ok(Self {
            tracks,
            path: Some(path.to_path_buf()),
            transient: HashSet::new(),
        })
    }

    /// Write the catalog back to where it was loaded from.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CatalogFile {
            tracks: self
                .tracks
                .iter()
                .filter(|t| !self.transient.contains(&t.id))
                .cloned()
                .collect(),
        };
        let text = serde_json::to_string_pretty(&file).map_err(|source| Error::Catalog {
            path: path.clone(),
            source,
        })?;
        fs::write(path, text)?;
        debug!(path = %path.display(), "catalog saved");
        Ok(())
    }

    /// Add tracks that are not backed by the catalog file (e.g. a scanned
    /// directory). Ids are reassigned past the highest known id.
    pub fn add_transient(&mut self, tracks: Vec<Track>) -> Vec<TrackId> {
        let mut next = self.tracks.iter().map(|t| t.id).max().map_or(0, |m| m + 1);
        let mut ids = Vec::with_capacity(tracks.len());
        for mut track in tracks {
            track.id = next;
            next += 1;
            ids.push(track.id);
            self.transient.insert(track.id);
            self.tracks.push(track);
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Ids of tracks carrying `tag`.
    pub fn with_tag(&self, tag: &str) -> Vec<TrackId> {
        self.tracks
            .iter()
            .filter(|t| t.tags.contains(tag))
            .map(|t| t.id)
            .collect()
    }

    /// Resolve a user query: numeric id, then exact title (case-insensitive),
    /// then the first fuzzy subsequence match on the display string.
    pub fn lookup(&self, query: &str) -> Result<TrackId> {
        let q = query.trim();
        if q.is_empty() {
            return Err(Error::TrackNotFound(query.to_string()));
        }

        if let Ok(id) = q.parse::<TrackId>() {
            if self.get(id).is_some() {
                return Ok(id);
            }
        }

        if let Some(t) = self.tracks.iter().find(|t| t.title.eq_ignore_ascii_case(q)) {
            return Ok(t.id);
        }

        self.tracks
            .iter()
            .find(|t| fuzzy_match_positions(&t.display(), q).is_some())
            .map(|t| t.id)
            .ok_or_else(|| Error::TrackNotFound(query.to_string()))
    }
}

/// Fuzzy/subsequence match: return the character positions in `title`
/// that match `query`, or `None` if not matched.
pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
    if query.is_empty() {
        return Some(Vec::new());
    }

    let mut positions: Vec<usize> = Vec::new();
    let mut title_iter = title.chars().enumerate();

    for qc in query.chars() {
        let qc_low = qc.to_ascii_lowercase();
        loop {
            match title_iter.next() {
                Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                    positions.push(ti);
                    break;
                }
                Some(_) => continue,
                None => return None,
            }
        }
    }

    Some(positions)
}
