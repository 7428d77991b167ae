//! Node configuration loaded from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use protocol_core::{FrontEndId, NodeId};
use protocol_wire::WireEncoding;
use runtime::RuntimeConfig;

/// Configuration required to start a relay node and its stdio link.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub runtime: RuntimeConfig,
    /// Front-end id of the stdio link.
    pub front_end: FrontEndId,
    /// Frame encoding spoken on stdin/stdout.
    pub stdio_encoding: WireEncoding,
    /// Capacity of the stdin reader channel.
    pub inbound_buffer: usize,
    pub log_dir: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            front_end: FrontEndId::from("stdio"),
            stdio_encoding: WireEncoding::Json,
            inbound_buffer: 64,
            log_dir: None,
        }
    }
}

impl NodeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `NODE_ID` - Node identifier stamped on every outbound context (default: node-0)
    /// - `RELAY_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `RELAY_OUTBOUND_BUFFER` - Outbound and inbound link capacity (default: 64)
    /// - `RELAY_DEFAULT_TIMEOUT_MS` - Collector timeout when none is given (default: 60000)
    /// - `RELAY_FRONT_END` - Front-end id of the stdio link (default: stdio)
    /// - `RELAY_ENCODINGS` - Comma-separated encodings every packet must support (default: json,binary)
    /// - `RELAY_STDIO_ENCODING` - `json` or `binary` frames on stdio (default: json)
    /// - `RELAY_LOG_DIR` - Log directory (default: platform cache dir)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).map(|value| value.trim().to_owned());

        if let Some(node) = read("NODE_ID").filter(|value| !value.is_empty()) {
            config.runtime.node_id = NodeId::from(node);
        }

        if let Some(capacity) = parse::<usize>(read("RELAY_EVENT_BUFFER")) {
            config.runtime.event_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = parse::<usize>(read("RELAY_OUTBOUND_BUFFER")) {
            config.runtime.outbound_buffer_size = capacity.max(1);
            config.inbound_buffer = capacity.max(1);
        }

        if let Some(millis) = parse::<u64>(read("RELAY_DEFAULT_TIMEOUT_MS")) {
            config.runtime.default_timeout = Duration::from_millis(millis.max(1));
        }

        if let Some(front_end) = read("RELAY_FRONT_END").filter(|value| !value.is_empty()) {
            config.front_end = FrontEndId::from(front_end);
        }

        if let Some(encodings) = read("RELAY_ENCODINGS").and_then(|value| parse_encodings(&value)) {
            config.runtime.encodings = encodings;
        }

        if let Some(encoding) = parse::<WireEncoding>(read("RELAY_STDIO_ENCODING")) {
            config.stdio_encoding = encoding;
        }

        config.log_dir = read("RELAY_LOG_DIR")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        config
    }
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.parse().ok()
}

/// All-or-nothing: one unknown name keeps the default list.
fn parse_encodings(value: &str) -> Option<Vec<WireEncoding>> {
    let mut encodings = Vec::new();
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let encoding = name.parse::<WireEncoding>().ok()?;
        if !encodings.contains(&encoding) {
            encodings.push(encoding);
        }
    }
    (!encodings.is_empty()).then_some(encodings)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> NodeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        NodeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = load(&[]);
        assert_eq!(config.runtime.node_id.as_str(), "node-0");
        assert_eq!(config.front_end.as_str(), "stdio");
        assert_eq!(config.stdio_encoding, WireEncoding::Json);
        assert_eq!(config.runtime.encodings, vec![WireEncoding::Json, WireEncoding::Binary]);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = load(&[
            ("NODE_ID", "shard-3"),
            ("RELAY_EVENT_BUFFER", "16"),
            ("RELAY_OUTBOUND_BUFFER", "8"),
            ("RELAY_DEFAULT_TIMEOUT_MS", "1500"),
            ("RELAY_FRONT_END", "gateway"),
            ("RELAY_ENCODINGS", "binary"),
            ("RELAY_STDIO_ENCODING", "Binary"),
            ("RELAY_LOG_DIR", "/var/log/relay"),
        ]);

        assert_eq!(config.runtime.node_id.as_str(), "shard-3");
        assert_eq!(config.runtime.event_buffer_size, 16);
        assert_eq!(config.runtime.outbound_buffer_size, 8);
        assert_eq!(config.inbound_buffer, 8);
        assert_eq!(config.runtime.default_timeout, Duration::from_millis(1500));
        assert_eq!(config.front_end.as_str(), "gateway");
        assert_eq!(config.runtime.encodings, vec![WireEncoding::Binary]);
        assert_eq!(config.stdio_encoding, WireEncoding::Binary);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/relay")));
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = load(&[
            ("RELAY_EVENT_BUFFER", "many"),
            ("RELAY_OUTBOUND_BUFFER", "0"),
            ("RELAY_ENCODINGS", "json,protobuf"),
            ("RELAY_STDIO_ENCODING", "xml"),
            ("NODE_ID", "  "),
        ]);

        assert_eq!(config.runtime.event_buffer_size, 100);
        assert_eq!(config.runtime.outbound_buffer_size, 1);
        assert_eq!(config.runtime.encodings, vec![WireEncoding::Json, WireEncoding::Binary]);
        assert_eq!(config.stdio_encoding, WireEncoding::Json);
        assert_eq!(config.runtime.node_id.as_str(), "node-0");
    }

    #[test]
    fn encodings_are_deduplicated() {
        assert_eq!(
            parse_encodings("json, JSON ,binary,"),
            Some(vec![WireEncoding::Json, WireEncoding::Binary])
        );
        assert_eq!(parse_encodings(" , "), None);
    }
}
