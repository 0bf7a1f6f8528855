//! Origin access and resource materialization.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                  ResourceMaterializer                  │
//! │  deploy_resources / remove_resources                   │
//! └───────────────┬───────────────────────┬────────────────┘
//!                 │                       │
//!                 ▼                       ▼
//!          ┌─────────────┐         ┌─────────────┐
//!          │   Archive   │         │  walkdir    │
//!          │ (zip / jar) │         │ (directory) │
//!          └──────┬──────┘         └──────┬──────┘
//!                 └───────────┬───────────┘
//!                             ▼
//!                  containment::contained_join
//! ```
//!
//! [`read_origin_file`] gives the rest of the runtime (descriptor discovery,
//! settings merge) uniform access to a file inside either kind of origin.

mod archive;
pub mod containment;
mod error;
mod materializer;

pub use archive::{Archive, ArchiveEntry};
pub use error::ResourceError;
pub use materializer::{MaterializeOptions, MaterializeReport, ResourceMaterializer};

use stagehand_component::Origin;
use std::path::Path;

/// Reads an origin-relative file.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// Returns [`ResourceError::Escape`] if `rel` leaves the origin, or an
/// I/O / archive error if the origin cannot be read.
pub fn read_origin_file(origin: &Origin, rel: &str) -> Result<Option<Vec<u8>>, ResourceError> {
    containment::validate_relative(Path::new(rel), origin.path())?;
    match origin {
        Origin::Archive { path } => {
            let name = rel.trim_start_matches("./").replace('\\', "/");
            Archive::open(path)?.read(&name)
        }
        Origin::Directory { root } => {
            let path = containment::contained_join(root, rel)?;
            match std::fs::read(&path) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ResourceError::io(path, e)),
            }
        }
    }
}
