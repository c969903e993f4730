//! Zip archive holding the occurrence listing of one graph.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::graphlet::{encode_occurrence_line, GraphletOccurrence, OccurrenceReader};
use crate::store::layout::OCCURRENCE_MEMBER;

fn member_options() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Compress the scanner's raw listing into `archive` and delete the raw file.
pub fn archive_listing(raw: &Path, archive: &Path) -> Result<()> {
    let mut source =
        BufReader::new(File::open(raw).with_context(|| format!("open occurrence listing {:?}", raw))?);
    let file = File::create(archive).with_context(|| format!("create archive {:?}", archive))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    zip.start_file(OCCURRENCE_MEMBER, member_options())
        .with_context(|| format!("start member in {:?}", archive))?;
    io::copy(&mut source, &mut zip).with_context(|| format!("compress {:?}", raw))?;
    zip.finish()
        .with_context(|| format!("finish archive {:?}", archive))?
        .flush()?;
    fs::remove_file(raw).with_context(|| format!("remove raw listing {:?}", raw))?;
    Ok(())
}

/// Write decoded occurrences in listing format.
pub fn write_occurrences(archive: &Path, occurrences: &[GraphletOccurrence]) -> Result<()> {
    let file = File::create(archive).with_context(|| format!("create archive {:?}", archive))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    zip.start_file(OCCURRENCE_MEMBER, member_options())
        .with_context(|| format!("start member in {:?}", archive))?;
    for occurrence in occurrences {
        writeln!(zip, "{}", encode_occurrence_line(occurrence))
            .with_context(|| format!("write occurrence to {:?}", archive))?;
    }
    zip.finish()
        .with_context(|| format!("finish archive {:?}", archive))?
        .flush()?;
    Ok(())
}

/// Decode every occurrence of the archive, in listing order.
pub fn read_occurrences(archive: &Path) -> Result<Vec<GraphletOccurrence>> {
    let file = File::open(archive).with_context(|| format!("open archive {:?}", archive))?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).with_context(|| format!("read archive {:?}", archive))?;
    let member = zip
        .by_name(OCCURRENCE_MEMBER)
        .with_context(|| format!("find {OCCURRENCE_MEMBER} in {:?}", archive))?;
    OccurrenceReader::new(BufReader::new(member))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("decode occurrences from {:?}", archive))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::graphlet::GraphletClass;

    #[test]
    fn raw_listing_is_archived_and_removed() {
        let tmp = tempdir().expect("tempdir");
        let raw = tmp.path().join(OCCURRENCE_MEMBER);
        let archive = tmp.path().join("motif_pos.zip");
        fs::write(&raw, "011101110: 1 2 3\n001001110: 3 4 5\n").expect("raw");

        archive_listing(&raw, &archive).expect("archive");
        assert!(!raw.exists());

        let occurrences = read_occurrences(&archive).expect("read");
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[1].nodes, vec![3, 4, 5]);
        assert_eq!(occurrences[1].graphlet_class.name(), Some("3-Dash"));
    }

    #[test]
    fn written_occurrences_read_back_in_order() {
        let tmp = tempdir().expect("tempdir");
        let archive = tmp.path().join("motif_pos.zip");
        let square = GraphletClass::from_name("Square").expect("square");
        let occurrences = vec![
            GraphletOccurrence::new(square.clone(), vec![4, 3, 2, 1]),
            GraphletOccurrence::new(square, vec![1, 2, 3, 4]),
        ];
        write_occurrences(&archive, &occurrences).expect("write");
        assert_eq!(read_occurrences(&archive).expect("read"), occurrences);
    }

    #[test]
    fn missing_archive_names_the_path() {
        let tmp = tempdir().expect("tempdir");
        let err = read_occurrences(&tmp.path().join("absent.zip")).expect_err("missing");
        assert!(format!("{err:#}").contains("absent.zip"));
    }
}
