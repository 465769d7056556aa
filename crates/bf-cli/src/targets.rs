use std::path::Path;

use anyhow::{bail, Context};

/// One parsed line from a service-target file: `protocol://host[:port]`.
/// When the port is omitted, the protocol's first default port is used.
pub struct ParsedTarget {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

pub fn load_targets_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<ParsedTarget>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read targets file {}", path.display()))?;

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_target_line)
        .collect()
}

fn parse_target_line(line: &str) -> anyhow::Result<ParsedTarget> {
    let (protocol, rest) = line
        .split_once("://")
        .with_context(|| format!("invalid target line {line:?}: expected protocol://host[:port]"))?;
    let protocol = protocol.to_ascii_lowercase();

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port_str)) if port_str.chars().all(|c| c.is_ascii_digit()) && !port_str.is_empty() => {
            let port: u16 = port_str
                .parse()
                .with_context(|| format!("invalid port in target line {line:?}"))?;
            (host.to_string(), port)
        }
        _ => {
            let port = bf_core::default_port(&protocol)
                .with_context(|| format!("no default port for protocol {protocol:?}; specify one explicitly"))?;
            (rest.to_string(), port)
        }
    };

    if host.is_empty() {
        bail!("invalid target line {line:?}: empty host");
    }
    if !bf_core::is_recognized_protocol(&protocol) {
        bail!("unrecognized protocol tag {protocol:?} in target line {line:?}");
    }

    Ok(ParsedTarget { protocol, host, port })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_port() {
        let t = parse_target_line("ssh://10.0.0.1:2222").unwrap();
        assert_eq!(t.protocol, "ssh");
        assert_eq!(t.host, "10.0.0.1");
        assert_eq!(t.port, 2222);
    }

    #[test]
    fn falls_back_to_default_port() {
        let t = parse_target_line("mysql://db.internal").unwrap();
        assert_eq!(t.port, 3306);
    }

    #[test]
    fn rejects_unknown_protocol() {
        assert!(parse_target_line("gopher://host").is_err());
    }

    #[test]
    fn file_loader_skips_comments_and_blanks(
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.txt");
        std::fs::write(&path, "# comment\n\nssh://10.0.0.1\nhttp://example.com:8080\n").unwrap();
        let targets = load_targets_file(&path).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].port, 22);
        assert_eq!(targets[1].port, 8080);
    }
}
