use std::collections::HashMap;
use std::fmt;

use http::{HeaderMap, Method};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

pub const BODY_PRINT_LIMIT: usize = 10_000;

/// Specifies limitations on printing request bodies when logging requests that no fixture
/// answered. For some fixtures the bodies may be too large to reasonably print.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum BodyPrintLimit {
    /// Maximum length of a body to print in bytes.
    Limited(usize),
    /// There is no limit to the size of a body that may be printed.
    Unlimited,
}

/// An incoming request to a [`FixedServer`], handed to the [`Respond`] implementation of the
/// fixture whose route matched.
///
/// The body is read in full before the handler runs, so handlers get an immutable view of the
/// whole request and can stay synchronous.
///
/// [`FixedServer`]: crate::FixedServer
/// [`Respond`]: crate::Respond
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Values captured by the `:name` and `*` segments of the matched route.
    pub params: HashMap<String, String>,
}

impl Request {
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The value captured for the route parameter `name`, e.g. `id` for `/trips/:id`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The first value of the query string parameter `name`, percent-decoded.
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub(crate) async fn from_hyper(
        request: hyper::Request<hyper::body::Incoming>,
    ) -> Result<Request, Box<dyn std::error::Error + Send + Sync>> {
        let (parts, body) = request.into_parts();
        let url: Url = match parts.uri.authority() {
            Some(_) => parts.uri.to_string(),
            None => format!("http://localhost{}", parts.uri),
        }
        .parse()?;

        let body = body.collect().await?.to_bytes();

        Ok(Self {
            url,
            method: parts.method,
            headers: parts.headers,
            body: body.to_vec(),
            params: HashMap::new(),
        })
    }

    pub(crate) fn print_with_limit(
        &self,
        mut buffer: impl fmt::Write,
        body_print_limit: BodyPrintLimit,
    ) -> fmt::Result {
        writeln!(buffer, "{} {}", self.method, self.url)?;
        for name in self.headers.keys() {
            let values = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>();
            writeln!(buffer, "{}: {}", name, values.join(","))?;
        }

        let shown = match body_print_limit {
            BodyPrintLimit::Limited(limit) if self.body.len() > limit => &self.body[..limit],
            _ => &self.body[..],
        };
        // A limit can fall in the middle of a multi-byte character: keep the valid prefix.
        let printable = match std::str::from_utf8(shown) {
            Ok(text) => Some(text),
            Err(e) if e.error_len().is_none() => std::str::from_utf8(&shown[..e.valid_up_to()]).ok(),
            Err(_) => None,
        };
        match printable {
            Some(text) => {
                writeln!(buffer, "{}", text)?;
                if shown.len() < self.body.len() {
                    writeln!(
                        buffer,
                        "We truncated the body because it was too large: {} bytes (limit: {} bytes)",
                        self.body.len(),
                        shown.len()
                    )?;
                    writeln!(
                        buffer,
                        "Increase this limit by setting `FIXED_SERVER_BODY_PRINT_LIMIT`, or calling `ServerOptions::body_print_limit`"
                    )?;
                }
                Ok(())
            }
            None => writeln!(
                buffer,
                "Body is likely binary (invalid utf-8) size is {} bytes",
                self.body.len()
            ),
        }
    }
}
