//! Decoded Update Replay
//!
//! Boundary between the protocol decoder and the registry. A decoder (or a
//! capture of one) emits one JSON object per line describing an update that
//! has already been decoded from the wire; this module applies those updates
//! to a registry in order.
//!
//! ```text
//! {"type":"position","number":42,"position":{"latitudeI":10000000,"longitudeI":20000000}}
//! {"type":"identity","number":42,"identity":{"id":"!0000002a","longName":"Base Camp"}}
//! {"type":"full","number":7,"identity":{"id":"x"}}
//! {"type":"remove","number":42}
//! ```

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::{debug, info, warn};

use crate::domain::{NodeIdentity, NodeNum, NodePosition, NodeRecord};
use crate::error::{Error, Result};
use crate::registry::NodeRegistry;

/// One decoded inbound update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeUpdate {
    /// Complete node info; replaces the stored record
    Full(NodeRecord),
    /// Identity announcement
    Identity {
        number: NodeNum,
        identity: NodeIdentity,
    },
    /// Position report
    Position {
        number: NodeNum,
        position: NodePosition,
    },
    /// Node dropped by the client
    Remove { number: NodeNum },
}

impl NodeUpdate {
    /// Node the update refers to
    pub fn number(&self) -> NodeNum {
        match self {
            NodeUpdate::Full(record) => record.number,
            NodeUpdate::Identity { number, .. }
            | NodeUpdate::Position { number, .. }
            | NodeUpdate::Remove { number } => *number,
        }
    }

    /// Dispatch the update to the matching registry operation
    pub fn apply(self, registry: &mut NodeRegistry) -> Result<NodeNum> {
        match self {
            NodeUpdate::Full(record) => Ok(registry.upsert_full(record)),
            NodeUpdate::Identity { number, identity } => registry.upsert_identity(number, identity),
            NodeUpdate::Position { number, position } => registry.upsert_position(number, position),
            NodeUpdate::Remove { number } => Ok(registry.remove(number)),
        }
    }
}

/// Outcome of a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// Lines read, including skipped ones
    pub lines: usize,
    pub applied: usize,
    /// Updates refused as invalid node data
    pub rejected: usize,
    /// Blank and `#` comment lines
    pub skipped: usize,
}

/// Apply every update in a JSON-lines stream to the registry
///
/// Invalid node data is logged and counted; a line that is not a valid
/// update aborts the replay with its line number.
pub fn replay_lines<R: BufRead>(reader: R, registry: &mut NodeRegistry) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        summary.lines += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            summary.skipped += 1;
            continue;
        }

        let update: NodeUpdate = serde_json::from_str(trimmed).map_err(|source| Error::UpdateParse {
            line: line_no,
            source,
        })?;
        let number = update.number();

        match update.apply(registry) {
            Ok(_) => summary.applied += 1,
            Err(err @ Error::InvalidNodeData { .. }) => {
                warn!(line = line_no, node = %number, error = %err, "skipping update");
                summary.rejected += 1;
            }
            Err(err) => return Err(err),
        }
        debug!(line = line_no, node = %number, "update applied");
    }

    info!(
        lines = summary.lines,
        applied = summary.applied,
        rejected = summary.rejected,
        nodes = registry.len(),
        "replay finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::{Cursor, Write};

    const SCENARIO: &str = r#"
# position first, identity later
{"type":"position","number":42,"position":{"latitudeI":10000000,"longitudeI":20000000}}
{"type":"identity","number":42,"identity":{"id":"!abc123","longName":"Base Camp","shortName":"BC"}}
{"type":"full","number":7,"identity":{"id":"x"},"position":{}}
{"type":"full","number":7,"identity":{},"position":{"latitudeI":50000000,"longitudeI":50000000}}
"#;

    #[test]
    fn test_parse_update_shapes() {
        let update: NodeUpdate = serde_json::from_str(r#"{"type":"remove","number":9}"#).unwrap();
        assert_eq!(update, NodeUpdate::Remove { number: NodeNum::new(9) });

        let update: NodeUpdate =
            serde_json::from_str(r#"{"type":"full","number":3,"identity":{"id":"!3"}}"#).unwrap();
        assert_eq!(
            update,
            NodeUpdate::Full(NodeRecord::new(3u32).with_identity(NodeIdentity::with_id("!3")))
        );
        assert_eq!(update.number(), NodeNum::new(3));
    }

    #[test]
    fn test_replay_scenario() {
        let mut registry = NodeRegistry::new();
        let summary = replay_lines(Cursor::new(SCENARIO), &mut registry).unwrap();

        assert_eq!(summary.applied, 4);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.skipped, 2);

        assert_eq!(registry.number_for_identity_id("!abc123"), Some(NodeNum::new(42)));
        let base = registry.get(NodeNum::new(42)).unwrap();
        assert_eq!(base.position, Some(NodePosition::from_degrees(1.0, 2.0)));

        let seven = registry.get(NodeNum::new(7)).unwrap();
        assert_eq!(seven.identity, Some(NodeIdentity::default()));
        assert_eq!(seven.position, Some(NodePosition::from_degrees(5.0, 5.0)));
    }

    #[test]
    fn test_invalid_data_is_counted_not_fatal() {
        let input = concat!(
            r#"{"type":"identity","number":1,"identity":{"shortName":"TOOLONG"}}"#,
            "\n",
            r#"{"type":"identity","number":2,"identity":{"shortName":"OK"}}"#,
            "\n",
        );
        let mut registry = NodeRegistry::new();
        let summary = replay_lines(Cursor::new(input), &mut registry).unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.rejected, 1);
        assert!(!registry.contains(NodeNum::new(1)));
        assert!(registry.contains(NodeNum::new(2)));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let input = "{\"type\":\"remove\",\"number\":1}\n{\"type\":\"teleport\"}\n";
        let mut registry = NodeRegistry::new();
        let err = replay_lines(Cursor::new(input), &mut registry).unwrap_err();
        assert_matches!(err, Error::UpdateParse { line: 2, .. });
    }

    #[test]
    fn test_replay_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type":"position","number":5,"position":{{"time":1700000000}}}}"#).unwrap();
        writeln!(file, r#"{{"type":"remove","number":5}}"#).unwrap();

        let reader = std::io::BufReader::new(std::fs::File::open(file.path()).unwrap());
        let mut registry = NodeRegistry::new();
        let mut rx = registry.subscribe_channel();
        let summary = replay_lines(reader, &mut registry).unwrap();

        assert_eq!(summary.applied, 2);
        assert!(registry.is_empty());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}
