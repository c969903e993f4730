use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::PmotifError;
use crate::graph::model::{GraphInstance, NodeId};

/// Loader turning edge-list text into validated simple graphs.
///
/// Each non-empty line holds two node ids and an optional trailing weight token,
/// which is ignored. Lines starting with `#` are comments. Any line that would
/// make the graph non-simple, or uses node id 0, is a precondition violation.
#[derive(Debug, Default)]
pub struct GraphLoader;

impl GraphLoader {
    pub fn from_edge_list_str(name: &str, text: &str) -> Result<GraphInstance, PmotifError> {
        let mut graph = GraphInstance::new(name);
        for (line_idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (source, target) = parse_edge(name, line_idx + 1, line)?;
            Self::insert_edge(&mut graph, source, target)?;
        }
        Ok(graph)
    }

    pub fn from_reader<R: Read>(name: &str, mut reader: R) -> Result<GraphInstance> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .with_context(|| format!("read edge list {name}"))?;
        Ok(Self::from_edge_list_str(name, &buf)?)
    }

    pub fn from_path(path: &Path) -> Result<GraphInstance> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read edge list {:?}", path))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self::from_edge_list_str(&name, &text)
            .with_context(|| format!("load edge list {:?}", path))
    }

    pub fn from_edges<I>(name: &str, edges: I) -> Result<GraphInstance, PmotifError>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut graph = GraphInstance::new(name);
        for (source, target) in edges {
            Self::insert_edge(&mut graph, source, target)?;
        }
        Ok(graph)
    }

    fn insert_edge(
        graph: &mut GraphInstance,
        source: NodeId,
        target: NodeId,
    ) -> Result<(), PmotifError> {
        if source == 0 || target == 0 {
            return Err(PmotifError::precondition(
                &graph.name,
                format!("edge ({source}, {target}) uses reserved node id 0"),
            ));
        }
        if source == target {
            return Err(PmotifError::precondition(
                &graph.name,
                format!("self-loop on node {source}"),
            ));
        }
        if graph.contains_edge(source, target) {
            return Err(PmotifError::precondition(
                &graph.name,
                format!("duplicate edge ({source}, {target})"),
            ));
        }
        graph.graph.add_edge(source, target, ());
        Ok(())
    }
}

fn parse_edge(name: &str, line_no: usize, line: &str) -> Result<(NodeId, NodeId), PmotifError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 && tokens.len() != 3 {
        return Err(PmotifError::precondition(
            name,
            format!("line {line_no}: expected `u v [w]`, got {line:?}"),
        ));
    }
    let parse = |token: &str| {
        token.parse::<NodeId>().map_err(|_| {
            PmotifError::precondition(
                name,
                format!("line {line_no}: node id {token:?} is not a positive integer"),
            )
        })
    };
    Ok((parse(tokens[0])?, parse(tokens[1])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_edge_list_with_weights_and_comments() {
        let text = "# triangle plus tail\n1 2 1\n2 3 1\n\n3 1 1\n3 4\n";
        let graph = GraphLoader::from_edge_list_str("tri", text).expect("load graph");
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.degree(3), 3);
    }

    #[test]
    fn rejects_non_simple_input() {
        for (text, needle) in [
            ("1 2\n2 1\n", "duplicate"),
            ("1 1\n", "self-loop"),
            ("0 1\n", "reserved"),
            ("1 x\n", "positive integer"),
            ("1 2 3 4\n", "expected"),
        ] {
            let err = GraphLoader::from_edge_list_str("bad", text).expect_err(text);
            assert!(
                err.to_string().contains(needle),
                "{text:?} -> {err} should mention {needle}"
            );
        }
    }
}
