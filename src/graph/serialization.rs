use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::graph::model::GraphInstance;

/// Edge-list dialects understood by the motif scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeListFormat {
    /// `u v`
    Simple,
    /// `u v 1`, the scanner expects a weight column even for unweighted graphs.
    #[default]
    SimpleWeight,
}

impl EdgeListFormat {
    /// Value passed to the scanner's `-f` flag.
    pub fn tag(self) -> &'static str {
        match self {
            EdgeListFormat::Simple => "simple",
            EdgeListFormat::SimpleWeight => "simple_weight",
        }
    }
}

/// Helper for exporting graphs as edge lists the scanner can consume.
pub struct GraphWriter;

impl GraphWriter {
    pub fn to_edge_list_string(graph: &GraphInstance, format: EdgeListFormat) -> String {
        let mut out = String::with_capacity(graph.edge_count() * 12);
        for (source, target) in graph.edges() {
            out.push_str(&edge_line(source, target, format));
        }
        out
    }

    /// Validate the graph and write it to `path`.
    pub fn write_to_path(graph: &GraphInstance, path: &Path, format: EdgeListFormat) -> Result<()> {
        graph.validate()?;
        let file = File::create(path).with_context(|| format!("create edge list {:?}", path))?;
        let mut writer = BufWriter::new(file);
        for (source, target) in graph.edges() {
            writer
                .write_all(edge_line(source, target, format).as_bytes())
                .with_context(|| format!("write edge list {:?}", path))?;
        }
        writer
            .flush()
            .with_context(|| format!("flush edge list {:?}", path))?;
        Ok(())
    }
}

fn edge_line(source: u64, target: u64, format: EdgeListFormat) -> String {
    match format {
        EdgeListFormat::Simple => format!("{source} {target}\n"),
        EdgeListFormat::SimpleWeight => format!("{source} {target} 1\n"),
    }
}
