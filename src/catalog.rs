//! Song catalog: track records, lookup, persistence and directory scanning.
//!
//! The session reads tracks from here and annotates them in place (listen
//! time, tags, clips); saving them back is the catalog's job.

mod model;
mod scan;
mod store;

pub use model::*;
pub use scan::{read_tags, scan};
pub use store::{Catalog, fuzzy_match_positions};
