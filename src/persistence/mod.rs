//! Progress persistence with integrity verification
//!
//! The crate never touches the filesystem. Hosts read and write the JSON
//! text themselves and hand it to [`load_or_reset`] / [`save`].

pub mod envelope;

pub use envelope::{SkillTreeProgress, checksum};

use crate::meta::SkillTree;

/// Errors raised while decoding saved progress
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("progress JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("progress checksum mismatch (stored {stored}, computed {computed})")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

/// Serialize the tree into a checksummed envelope
pub fn save(tree: &SkillTree) -> Result<String, PersistenceError> {
    SkillTreeProgress::from_tree(tree).to_json()
}

/// Decode saved progress, starting over when it is unreadable or tampered
pub fn load_or_reset(json: &str) -> SkillTree {
    match SkillTreeProgress::from_json(json).and_then(|progress| progress.into_tree()) {
        Ok(tree) => {
            log::info!(
                "Loaded skill tree progress ({} unspent, {} total)",
                tree.points,
                tree.total_points
            );
            tree
        }
        Err(err) => {
            log::warn!("Resetting skill tree progress: {err}");
            SkillTree::new()
        }
    }
}
