use crate::request::{BodyPrintLimit, BODY_PRINT_LIMIT};
use serde::Deserialize;
use std::env;

/// Configuration shared by the [`FixedServer`](crate::FixedServer)s built from a
/// [`FixtureRegistry`](crate::FixtureRegistry).
///
/// Options are assembled with a fluent API, or deserialized from your test configuration:
/// every field is optional.
///
/// ### Example:
/// ```rust
/// use fixed_server::ServerOptions;
///
/// let options = ServerOptions::new().host("127.0.0.1").port(1337).protocol("http:");
///
/// let from_json: ServerOptions =
///     serde_json::from_str(r#"{ "host": "127.0.0.1", "port": 1337, "protocol": "http:" }"#).unwrap();
/// assert_eq!(options, from_json);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) protocol: String,
    pub(crate) body_print_limit: BodyPrintLimit,
}

impl Default for ServerOptions {
    fn default() -> Self {
        let body_print_limit = match env::var("FIXED_SERVER_BODY_PRINT_LIMIT")
            .ok()
            .and_then(|x| x.parse::<usize>().ok())
        {
            Some(limit) => BodyPrintLimit::Limited(limit),
            None => BodyPrintLimit::Limited(BODY_PRINT_LIMIT),
        };
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            protocol: "http".into(),
            body_print_limit,
        }
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The interface servers bind to. Defaults to `127.0.0.1`.
    pub fn host<T: Into<String>>(mut self, host: T) -> Self {
        self.host = host.into();
        self
    }

    /// The port [`FixedServer::listen`](crate::FixedServer::listen) binds when called without
    /// one. Defaults to `0`: the operating system picks a free port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The scheme used to format [`FixedServer::uri`](crate::FixedServer::uri), e.g. `http`.
    /// A trailing `:` is accepted. It does not change how the server listens.
    pub fn protocol<T: Into<String>>(mut self, protocol: T) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Unmatched requests are logged at debug level. By default, the size of the printed body
    /// is limited to 10 000 bytes, or to `FIXED_SERVER_BODY_PRINT_LIMIT` if set.
    pub fn body_print_limit(mut self, limit: BodyPrintLimit) -> Self {
        self.body_print_limit = limit;
        self
    }

    pub(crate) fn scheme(&self) -> &str {
        self.protocol.trim_end_matches(':')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_an_os_assigned_local_port() {
        let options = ServerOptions::default();

        assert_eq!(options.host, "127.0.0.1");
        assert_eq!(options.port, 0);
        assert_eq!(options.scheme(), "http");
    }

    #[test]
    fn trailing_colons_are_dropped_from_the_scheme() {
        assert_eq!(ServerOptions::new().protocol("http:").scheme(), "http");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let options: ServerOptions = serde_json::from_str(r#"{ "port": 1338 }"#).unwrap();

        assert_eq!(options, ServerOptions::new().port(1338));
    }

    #[test]
    fn body_print_limit_can_be_lifted() {
        let options: ServerOptions =
            serde_json::from_str(r#"{ "body_print_limit": "Unlimited" }"#).unwrap();

        assert_eq!(options.body_print_limit, BodyPrintLimit::Unlimited);
    }
}
