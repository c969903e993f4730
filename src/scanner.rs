//! Blocking wrapper around the external gtrieScanner motif counter.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::error::PmotifError;
use crate::graph::EdgeListFormat;
use crate::store::layout::{FREQUENCY_FILE, OCCURRENCE_ARCHIVE, OCCURRENCE_MEMBER};
use crate::store::occurrence_store::archive_listing;

/// Files produced by one scanner run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    pub occurrence_archive: PathBuf,
    pub frequency_table: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MotifScanner {
    executable: PathBuf,
    directed: bool,
}

impl MotifScanner {
    pub fn new(executable: impl Into<PathBuf>, directed: bool) -> Self {
        Self {
            executable: executable.into(),
            directed,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// `<exe> -s k -f <format> -g <edge list> -u|-d -oc <occurrences> -o <frequencies>`
    pub fn command(
        &self,
        edge_list: &Path,
        graphlet_size: usize,
        format: EdgeListFormat,
        occurrence_out: &Path,
        frequency_out: &Path,
    ) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("-s")
            .arg(graphlet_size.to_string())
            .arg("-f")
            .arg(format.tag())
            .arg("-g")
            .arg(edge_list)
            .arg(if self.directed { "-d" } else { "-u" })
            .arg("-oc")
            .arg(occurrence_out)
            .arg("-o")
            .arg(frequency_out);
        command
    }

    /// Run the scanner on `edge_list`, writing into `out_dir`.
    ///
    /// The occurrence listing is compressed into `motif_pos.zip`. The exit status
    /// is only logged; missing output files fail the run.
    pub fn scan(
        &self,
        edge_list: &Path,
        graphlet_size: usize,
        format: EdgeListFormat,
        out_dir: &Path,
    ) -> Result<ScanOutput> {
        let raw_occurrences = out_dir.join(OCCURRENCE_MEMBER);
        let frequency_table = out_dir.join(FREQUENCY_FILE);
        let mut command = self.command(
            edge_list,
            graphlet_size,
            format,
            &raw_occurrences,
            &frequency_table,
        );
        debug!("Running {:?}", command);

        let output = command.output().map_err(|err| {
            PmotifError::ExternalProcess(format!("cannot start {:?}: {err}", self.executable))
        })?;
        info!(
            "Scanner finished on {:?} with {}",
            edge_list, output.status
        );
        if !output.status.success() {
            warn!(
                "Scanner stderr for {:?}: {}",
                edge_list,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        for expected in [&raw_occurrences, &frequency_table] {
            if !expected.is_file() {
                return Err(PmotifError::ExternalProcess(format!(
                    "{:?} was not written for {:?}",
                    expected, edge_list
                ))
                .into());
            }
        }

        let occurrence_archive = out_dir.join(OCCURRENCE_ARCHIVE);
        archive_listing(&raw_occurrences, &occurrence_archive)
            .with_context(|| format!("archive occurrences of {:?}", edge_list))?;
        Ok(ScanOutput {
            occurrence_archive,
            frequency_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_matches_the_scanner_contract() {
        let scanner = MotifScanner::new("bin/gtrieScanner", false);
        let command = scanner.command(
            Path::new("g.edgelist"),
            4,
            EdgeListFormat::SimpleWeight,
            Path::new("out/motif_pos"),
            Path::new("out/motif_freq"),
        );
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-s",
                "4",
                "-f",
                "simple_weight",
                "-g",
                "g.edgelist",
                "-u",
                "-oc",
                "out/motif_pos",
                "-o",
                "out/motif_freq"
            ]
        );
    }

    #[test]
    fn missing_executable_is_an_external_process_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let scanner = MotifScanner::new(tmp.path().join("no-such-scanner"), false);
        let err = scanner
            .scan(
                &tmp.path().join("g.edgelist"),
                3,
                EdgeListFormat::Simple,
                tmp.path(),
            )
            .expect_err("cannot start");
        assert!(matches!(
            err.downcast_ref::<PmotifError>(),
            Some(PmotifError::ExternalProcess(_))
        ));
    }
}
