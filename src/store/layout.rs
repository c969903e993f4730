//! On-disk layout of detection results.
//!
//! ```text
//! <out>/<edge list>                      original graph
//! <out>/<edge list>_motifs/<k>/          published result of size-k graphlets
//!     motif_pos.zip  motif_freq  metrics/<metric>/...  .complete
//! <out>/edge_swappings/<i>_random.edgelist
//! <out>/edge_swappings/<i>_random.edgelist_motifs/<k>/
//! ```
//!
//! Results are written into `<k>.partial/` and renamed into place after the
//! `.complete` marker is written, so a crashed run never leaves a directory
//! that looks finished.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::error::PmotifError;
use crate::randomization::EnsembleMember;

pub const MOTIFS_SUFFIX: &str = "_motifs";
pub const PARTIAL_SUFFIX: &str = ".partial";
pub const COMPLETE_MARKER: &str = ".complete";
pub const OCCURRENCE_ARCHIVE: &str = "motif_pos.zip";
pub const OCCURRENCE_MEMBER: &str = "motif_pos";
pub const FREQUENCY_FILE: &str = "motif_freq";
pub const METRICS_DIR: &str = "metrics";
pub const ENSEMBLE_DIR: &str = "edge_swappings";

/// Directory of the ensemble edge lists below `out`.
pub fn ensemble_dir(out: &Path) -> PathBuf {
    out.join(ENSEMBLE_DIR)
}

pub fn ensemble_edge_list(out: &Path, index: usize) -> PathBuf {
    ensemble_dir(out).join(EnsembleMember::edge_list_name(index))
}

/// Result directories of one edge list for one graphlet size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDirectory {
    edge_list: PathBuf,
    graphlet_size: usize,
}

impl GraphDirectory {
    pub fn new(edge_list: impl Into<PathBuf>, graphlet_size: usize) -> Self {
        Self {
            edge_list: edge_list.into(),
            graphlet_size,
        }
    }

    pub fn edge_list(&self) -> &Path {
        &self.edge_list
    }

    pub fn graphlet_size(&self) -> usize {
        self.graphlet_size
    }

    pub fn motifs_dir(&self) -> PathBuf {
        let mut name = self
            .edge_list
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(MOTIFS_SUFFIX);
        self.edge_list.with_file_name(name)
    }

    /// Published result directory `<edge list>_motifs/<k>`.
    pub fn result_dir(&self) -> PathBuf {
        self.motifs_dir().join(self.graphlet_size.to_string())
    }

    pub fn partial_dir(&self) -> PathBuf {
        self.motifs_dir()
            .join(format!("{}{}", self.graphlet_size, PARTIAL_SUFFIX))
    }

    pub fn is_complete(&self) -> bool {
        self.result_dir().join(COMPLETE_MARKER).is_file()
    }

    /// The published directory, or an error if the result was never completed.
    pub fn complete_dir(&self) -> Result<PathBuf, PmotifError> {
        if self.is_complete() {
            Ok(self.result_dir())
        } else {
            Err(PmotifError::IncompleteResult(self.result_dir()))
        }
    }

    /// Start a fresh working directory, discarding leftovers of earlier runs.
    pub fn begin(&self) -> Result<PathBuf> {
        let partial = self.partial_dir();
        if partial.exists() {
            fs::remove_dir_all(&partial)
                .with_context(|| format!("remove stale partial directory {:?}", partial))?;
        }
        fs::create_dir_all(&partial)
            .with_context(|| format!("create partial directory {:?}", partial))?;
        Ok(partial)
    }

    /// Mark the working directory complete and move it into place.
    pub fn publish(&self) -> Result<PathBuf> {
        let partial = self.partial_dir();
        let result = self.result_dir();
        fs::write(partial.join(COMPLETE_MARKER), b"")
            .with_context(|| format!("write completion marker in {:?}", partial))?;
        if result.exists() {
            fs::remove_dir_all(&result)
                .with_context(|| format!("replace previous result {:?}", result))?;
        }
        fs::rename(&partial, &result)
            .with_context(|| format!("publish {:?} as {:?}", partial, result))?;
        debug!("Published {:?}", result);
        Ok(result)
    }

    /// Remove working directories and unmarked results left by crashed runs.
    ///
    /// Returns true when something was removed.
    pub fn assure_integrity(&self) -> Result<bool> {
        let mut removed = false;
        let partial = self.partial_dir();
        if partial.exists() {
            fs::remove_dir_all(&partial)
                .with_context(|| format!("remove partial directory {:?}", partial))?;
            removed = true;
        }
        let result = self.result_dir();
        if result.exists() && !self.is_complete() {
            fs::remove_dir_all(&result)
                .with_context(|| format!("remove incomplete result {:?}", result))?;
            removed = true;
        }
        if removed {
            info!("Removed unfinished results of {:?}", self.edge_list);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn paths_follow_the_edge_list_name() {
        let dir = GraphDirectory::new("/data/yeast.edgelist", 3);
        assert_eq!(dir.motifs_dir(), PathBuf::from("/data/yeast.edgelist_motifs"));
        assert_eq!(dir.result_dir(), PathBuf::from("/data/yeast.edgelist_motifs/3"));
        assert_eq!(
            dir.partial_dir(),
            PathBuf::from("/data/yeast.edgelist_motifs/3.partial")
        );
        assert_eq!(
            ensemble_edge_list(Path::new("/data"), 4),
            PathBuf::from("/data/edge_swappings/4_random.edgelist")
        );
    }

    #[test]
    fn publish_moves_the_partial_directory() {
        let tmp = tempdir().expect("tempdir");
        let dir = GraphDirectory::new(tmp.path().join("g.edgelist"), 3);
        assert!(matches!(
            dir.complete_dir(),
            Err(PmotifError::IncompleteResult(_))
        ));

        let partial = dir.begin().expect("begin");
        fs::write(partial.join(FREQUENCY_FILE), "table").expect("write");
        let published = dir.publish().expect("publish");

        assert!(!partial.exists());
        assert!(dir.is_complete());
        assert_eq!(dir.complete_dir().expect("complete"), published);
        assert!(published.join(FREQUENCY_FILE).is_file());
    }

    #[test]
    fn integrity_check_removes_unfinished_work() {
        let tmp = tempdir().expect("tempdir");
        let dir = GraphDirectory::new(tmp.path().join("g.edgelist"), 4);
        dir.begin().expect("begin");
        fs::create_dir_all(dir.result_dir()).expect("unmarked result");

        assert!(dir.assure_integrity().expect("integrity"));
        assert!(!dir.partial_dir().exists());
        assert!(!dir.result_dir().exists());
        assert!(!dir.assure_integrity().expect("nothing left"));
    }
}
