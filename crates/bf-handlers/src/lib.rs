//! Concrete handler implementations for a representative slice of the
//! recognized protocol tags. Handler wire protocols are explicitly out of
//! scope of the engine's contract; these exist to exercise the engine end
//! to end without claiming to speak every listed protocol's real wire
//! format.

mod http_basic;
mod tcp_connect;

use std::sync::Arc;

use bf_engine::HandlerRegistry;

pub use http_basic::HttpBasicHandler;
pub use tcp_connect::TcpConnectHandler;

/// Tags handled by a plain TCP-connect probe: enough to validate
/// early-termination on connection refusal without speaking each
/// protocol's real wire format.
const TCP_CONNECT_TAGS: &[&str] = &[
    "ssh", "ftp", "telnet", "mysql", "postgresql", "redis", "mongodb", "smb", "rdp", "vnc",
    "snmp", "imap", "pop3", "smtp", "amqp", "socks5",
];

/// Registers the handlers this crate provides on `registry`. Protocol tags
/// with no registered handler still validate and enqueue normally; they
/// fail at execute time with `UnsupportedProtocol`, exactly as the engine
/// specifies.
pub fn register_default_handlers(registry: &HandlerRegistry) {
    for tag in TCP_CONNECT_TAGS {
        registry.register(*tag, Arc::new(TcpConnectHandler));
    }
    registry.register("http", Arc::new(HttpBasicHandler::new(false)));
    registry.register("https", Arc::new(HttpBasicHandler::new(true)));
    registry.register("http_proxy", Arc::new(HttpBasicHandler::new(false)));
}
