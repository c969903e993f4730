//! Parsers for the motif scanner's two text outputs.
//!
//! The occurrence listing holds one line per occurrence,
//! `<reversed adjacency label>: <node> <node> ...`, and the frequency table is
//! the scanner's human-readable report. Both parsers fail hard on malformed input.

use std::io::{BufRead, Lines};

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::error::PmotifError;
use crate::graph::NodeId;
use crate::graphlet::class::GraphletClass;
use crate::graphlet::occurrence::GraphletOccurrence;

pub const FREQUENCY_TABLE_HEADER: &str = "Motif Analysis Results";

const OCCURRENCE_SOURCE: &str = "occurrence listing";
const FREQUENCY_SOURCE: &str = "frequency table";

/// Decode one occurrence line. `line_no` is only used for diagnostics.
pub fn decode_occurrence_line(
    line: &str,
    line_no: usize,
) -> Result<GraphletOccurrence, PmotifError> {
    let mut tokens = line.split_whitespace();
    let label = tokens
        .next()
        .ok_or_else(|| PmotifError::format(OCCURRENCE_SOURCE, line_no, "empty line"))?;
    let label = label.strip_suffix(':').ok_or_else(|| {
        PmotifError::format(
            OCCURRENCE_SOURCE,
            line_no,
            format!("label {label:?} lacks the trailing ':'"),
        )
    })?;
    let graphlet_class = GraphletClass::from_reversed_label(label)
        .map_err(|reason| PmotifError::format(OCCURRENCE_SOURCE, line_no, reason))?;

    let nodes = tokens
        .map(|token| {
            token.parse::<NodeId>().map_err(|_| {
                PmotifError::format(
                    OCCURRENCE_SOURCE,
                    line_no,
                    format!("node {token:?} is not an integer id"),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if nodes.len() != graphlet_class.size() {
        return Err(PmotifError::format(
            OCCURRENCE_SOURCE,
            line_no,
            format!(
                "expected {} nodes for class {}, found {}",
                graphlet_class.size(),
                graphlet_class,
                nodes.len()
            ),
        ));
    }
    Ok(GraphletOccurrence::new(graphlet_class, nodes))
}

/// Encode one occurrence in the scanner's listing format.
pub fn encode_occurrence_line(occurrence: &GraphletOccurrence) -> String {
    let mut line = occurrence.graphlet_class.to_reversed_label();
    line.push(':');
    for node in &occurrence.nodes {
        line.push(' ');
        line.push_str(&node.to_string());
    }
    line
}

/// Decode a complete occurrence listing held in memory.
pub fn decode_occurrences(raw: &str) -> Result<Vec<GraphletOccurrence>, PmotifError> {
    let mut size = None;
    let mut occurrences = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let occurrence = decode_occurrence_line(line, idx + 1)?;
        check_size(&mut size, &occurrence, idx + 1)?;
        occurrences.push(occurrence);
    }
    Ok(occurrences)
}

fn check_size(
    size: &mut Option<usize>,
    occurrence: &GraphletOccurrence,
    line_no: usize,
) -> Result<(), PmotifError> {
    let current = occurrence.size();
    match *size {
        None => {
            *size = Some(current);
            Ok(())
        }
        Some(expected) if expected == current => Ok(()),
        Some(expected) => Err(PmotifError::format(
            OCCURRENCE_SOURCE,
            line_no,
            format!("graphlet size {current} differs from {expected} of earlier lines"),
        )),
    }
}

/// Streaming decoder over a buffered reader, yielding occurrences in file order.
pub struct OccurrenceReader<R> {
    lines: Lines<R>,
    line_no: usize,
    size: Option<usize>,
}

impl<R: BufRead> OccurrenceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            size: None,
        }
    }
}

impl<R: BufRead> Iterator for OccurrenceReader<R> {
    type Item = Result<GraphletOccurrence>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line.with_context(|| {
                format!("read {OCCURRENCE_SOURCE} line {}", self.line_no)
            }) {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            if line.trim().is_empty() {
                continue;
            }
            let decoded = decode_occurrence_line(&line, self.line_no).and_then(|occurrence| {
                check_size(&mut self.size, &occurrence, self.line_no).map(|_| occurrence)
            });
            return Some(decoded.map_err(anyhow::Error::from));
        }
    }
}

/// Decode the scanner's frequency report for graphlets of size `k`.
///
/// After the `Motif Analysis Results` line the report has one decoration line and
/// one column-header line, then one block of `k + 1` lines per class: a separator
/// line followed by the k matrix rows. The last matrix row also carries the
/// original-graph frequency as the last token before the first `|`.
pub fn decode_frequency_table(
    raw: &str,
    k: usize,
) -> Result<IndexMap<GraphletClass, u64>, PmotifError> {
    if k == 0 {
        return Err(PmotifError::format(
            FREQUENCY_SOURCE,
            0,
            "graphlet size must be positive",
        ));
    }
    let lines: Vec<&str> = raw.lines().collect();
    let header_idx = lines
        .iter()
        .position(|line| line.trim_end() == FREQUENCY_TABLE_HEADER)
        .ok_or_else(|| {
            PmotifError::format(
                FREQUENCY_SOURCE,
                0,
                format!("missing {FREQUENCY_TABLE_HEADER:?} header"),
            )
        })?;

    let table_start = header_idx + 3;
    if table_start > lines.len() {
        return Err(PmotifError::format(
            FREQUENCY_SOURCE,
            lines.len(),
            "table header is truncated",
        ));
    }
    let mut table_end = lines.len();
    while table_end > table_start && lines[table_end - 1].trim().is_empty() {
        table_end -= 1;
    }
    let table = &lines[table_start..table_end];

    let block_height = k + 1;
    if table.len() % block_height != 0 {
        return Err(PmotifError::format(
            FREQUENCY_SOURCE,
            table_end,
            format!(
                "{} table lines are not a multiple of {block_height} for graphlet size {k}",
                table.len()
            ),
        ));
    }

    let mut frequencies = IndexMap::new();
    for (block_idx, block) in table.chunks(block_height).enumerate() {
        let block_line = table_start + block_idx * block_height + 1;
        let last_line = block_line + k;
        let matrix = &block[1..];

        let last_row = matrix[k - 1];
        let before_metrics = last_row.split('|').next().unwrap_or_default();
        let mut tokens = before_metrics.split_whitespace();
        let final_row = tokens.next().ok_or_else(|| {
            PmotifError::format(FREQUENCY_SOURCE, last_line, "missing final matrix row")
        })?;
        let count_token = tokens.last().ok_or_else(|| {
            PmotifError::format(FREQUENCY_SOURCE, last_line, "missing occurrence count")
        })?;
        let count = count_token.parse::<u64>().map_err(|_| {
            PmotifError::format(
                FREQUENCY_SOURCE,
                last_line,
                format!("occurrence count {count_token:?} is not an integer"),
            )
        })?;

        let mut rows: Vec<&str> = matrix[..k - 1].iter().map(|row| row.trim()).collect();
        rows.push(final_row);
        let graphlet_class = GraphletClass::parse(&rows.join(" ")).map_err(|_| {
            PmotifError::format(
                FREQUENCY_SOURCE,
                block_line + 1,
                format!("rows {rows:?} do not form a {k}x{k} binary matrix"),
            )
        })?;
        frequencies.insert(graphlet_class, count);
    }
    Ok(frequencies)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const TRIANGLE_TABLE: &str = "\
gtrieScanner report
Motif Analysis Results
==========================================
    Motif   | Org. Freq. | Z-score | Avg.Rand.Freq | p-value

011
101
110 7 | 0.000 | 0.00 | 0.00
";

    #[test]
    fn triangle_fixture_decodes() {
        let occurrences = decode_occurrences("011101110: 1 2 3\n").expect("decode");
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].graphlet_class.as_str(), "011 101 110");
        assert_eq!(occurrences[0].nodes, vec![1, 2, 3]);
    }

    #[test]
    fn encoded_lines_decode_to_the_same_occurrence() {
        let dash = GraphletClass::from_name("3-Dash").expect("dash");
        let occurrence = GraphletOccurrence::new(dash, vec![7, 3, 9]);
        let line = encode_occurrence_line(&occurrence);
        assert_eq!(line, "001001110: 7 3 9");
        assert_eq!(decode_occurrence_line(&line, 1).expect("decode"), occurrence);
    }

    #[test]
    fn node_order_is_preserved() {
        let occurrences =
            decode_occurrences("001001110: 7 3 9\n011101110: 4 5 6\n").expect("decode");
        assert_eq!(occurrences[0].graphlet_class.as_str(), "011 100 100");
        assert_eq!(occurrences[0].nodes, vec![7, 3, 9]);
        assert_eq!(occurrences[1].nodes, vec![4, 5, 6]);
    }

    #[test]
    fn malformed_occurrence_lines_fail() {
        for raw in [
            "011101110 1 2 3",
            "01110111: 1 2 3",
            "011101110: 1 2",
            "011101110: 1 2 x",
            "011101110: 1 2 3\n0110100110010110: 1 2 3 4",
        ] {
            let err = decode_occurrences(raw).expect_err(raw);
            assert!(matches!(err, PmotifError::Format { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn streaming_reader_matches_batch_decoder() {
        let raw = "011101110: 1 2 3\n\n001001110: 2 3 4\n";
        let streamed: Vec<_> = OccurrenceReader::new(Cursor::new(raw))
            .collect::<Result<_>>()
            .expect("stream");
        assert_eq!(streamed, decode_occurrences(raw).expect("batch"));

        let mut reader = OccurrenceReader::new(Cursor::new("011101110: 1 2 3\nbad\n"));
        assert!(reader.next().expect("first").is_ok());
        let err = reader.next().expect("second").expect_err("bad line");
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn frequency_table_single_class() {
        let frequencies = decode_frequency_table(TRIANGLE_TABLE, 3).expect("table");
        assert_eq!(frequencies.len(), 1);
        let triangle = GraphletClass::parse("011 101 110").expect("class");
        assert_eq!(frequencies[&triangle], 7);
    }

    #[test]
    fn frequency_table_multiple_blocks() {
        let raw = format!("{TRIANGLE_TABLE}\n011\n100\n100 12 | 1.0 | 2.0 | 3.0\n\n\n");
        let frequencies = decode_frequency_table(&raw, 3).expect("table");
        let dash = GraphletClass::from_name("3-Dash").expect("dash");
        assert_eq!(frequencies[&dash], 12);
        assert_eq!(frequencies.len(), 2);
    }

    #[test]
    fn frequency_table_rejects_bad_shapes() {
        let truncated = TRIANGLE_TABLE.replace("101\n", "");
        assert!(matches!(
            decode_frequency_table(&truncated, 3),
            Err(PmotifError::Format { .. })
        ));
        assert!(decode_frequency_table("no header here", 3).is_err());
        assert!(decode_frequency_table(TRIANGLE_TABLE, 4).is_err());
    }
}
