/// Protocol tags recognized by the core, and their default ports. Unknown
/// tags are rejected at feed time (or fail with `UnsupportedProtocol` at
/// execute time, if somehow fed without validation).
const PROTOCOL_TABLE: &[(&str, &[u16])] = &[
    ("ssh", &[22]),
    ("ftp", &[21]),
    ("telnet", &[23]),
    ("mysql", &[3306]),
    ("postgresql", &[5432]),
    ("redis", &[6379]),
    ("mongodb", &[27017]),
    ("http", &[80]),
    ("https", &[443]),
    ("smb", &[445, 139]),
    ("rdp", &[3389]),
    ("vnc", &[5900, 5901, 5902]),
    ("snmp", &[161]),
    ("imap", &[143]),
    ("pop3", &[110]),
    ("smtp", &[25]),
    ("amqp", &[5672]),
    ("socks5", &[1080]),
    ("http_proxy", &[8080]),
];

/// The first default port for `tag`, or `None` if `tag` isn't recognized.
pub fn default_port(tag: &str) -> Option<u16> {
    PROTOCOL_TABLE
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, ports)| ports[0])
}

/// Whether `tag` is one of the recognized protocol tags (lowercase match).
pub fn is_recognized_protocol(tag: &str) -> bool {
    PROTOCOL_TABLE.iter().any(|(name, _)| *name == tag)
}

/// All recognized protocol tags, in table order — used by the CLI and the
/// handler registry's `supported()` validation.
pub fn recognized_protocols() -> impl Iterator<Item = &'static str> {
    PROTOCOL_TABLE.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_defaults() {
        assert_eq!(default_port("ssh"), Some(22));
        assert_eq!(default_port("mysql"), Some(3306));
        assert_eq!(default_port("smb"), Some(445));
        assert_eq!(default_port("vnc"), Some(5900));
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(default_port("gopher"), None);
        assert!(!is_recognized_protocol("gopher"));
    }

    #[test]
    fn all_tags_recognized() {
        assert!(is_recognized_protocol("ssh"));
        assert_eq!(recognized_protocols().count(), PROTOCOL_TABLE.len());
    }
}
