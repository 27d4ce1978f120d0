//! Where fixture definitions come from when they are not written inline.
//!
//! A [`FixtureSource`] produces an ordered list of named [`FixtureDefinition`]s, which
//! [`FixtureRegistry::from_source`](crate::FixtureRegistry::from_source) feeds to the registry.
//! Closures returning such a list are sources, and [`JsonFileSource`] reads them from disk.
use crate::error::LoadError;
use crate::{FixtureDefinition, ResponseTemplate};
use http::{HeaderName, HeaderValue, StatusCode};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Named fixture definitions, in the order they should be added to a registry.
pub type FixtureDefinitions = Vec<(String, FixtureDefinition)>;

/// Anything able to supply fixture definitions to a registry.
pub trait FixtureSource {
    fn load(&self) -> Result<FixtureDefinitions, LoadError>;
}

impl<F> FixtureSource for F
where
    F: Fn() -> Result<FixtureDefinitions, LoadError>,
{
    fn load(&self) -> Result<FixtureDefinitions, LoadError> {
        self()
    }
}

/// Fixtures declared in a JSON file.
///
/// The file holds an object mapping each fixture name to its definition. Responses are
/// described as data: a status code (default `200`), optional headers, and either a string
/// `body` or a `json` value, plus an optional `delay_ms`.
///
/// ```json
/// {
///   "GET 200 /trips#full": {
///     "method": "get",
///     "route": "/trips",
///     "response": { "status": 200, "json": [{ "data": true }] }
///   },
///   "POST 500 /auth": {
///     "method": "post",
///     "route": "/auth",
///     "response": { "status": 500, "body": "Rejected!", "headers": { "x-reason": "locked" } }
///   }
/// }
/// ```
///
/// Fixtures keep the order they have in the file. A definition missing its `method`, `route`
/// or `response` is reported by the registry as a validation error naming the fixture.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse fixture definitions from a JSON document.
    pub fn parse(&self, contents: &str) -> Result<FixtureDefinitions, LoadError> {
        let file: FixtureFile =
            serde_json::from_str(contents).map_err(|source| LoadError::Parse {
                path: self.path.clone(),
                source,
            })?;
        file.0
            .into_iter()
            .map(|(name, fixture)| -> Result<_, LoadError> {
                let definition = fixture.into_definition(&name)?;
                Ok((name, definition))
            })
            .collect()
    }
}

impl FixtureSource for JsonFileSource {
    fn load(&self) -> Result<FixtureDefinitions, LoadError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.parse(&contents)
    }
}

/// The top-level object of a fixture file, entries kept in document order.
struct FixtureFile(Vec<(String, FileFixture)>);

impl<'de> Deserialize<'de> for FixtureFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FixtureFileVisitor;

        impl<'de> Visitor<'de> for FixtureFileVisitor {
            type Value = FixtureFile;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from fixture names to fixture definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FixtureFile, A::Error> {
                let mut fixtures = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    fixtures.push(entry);
                }
                Ok(FixtureFile(fixtures))
            }
        }

        deserializer.deserialize_map(FixtureFileVisitor)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FileFixture {
    method: Option<String>,
    route: Option<String>,
    response: Option<FileResponse>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FileResponse {
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    body: Option<String>,
    json: Option<Value>,
    delay_ms: Option<u64>,
}

fn default_status() -> u16 {
    200
}

impl FileFixture {
    fn into_definition(self, name: &str) -> Result<FixtureDefinition, LoadError> {
        let mut definition = FixtureDefinition::new();
        if let Some(method) = self.method {
            definition = definition.method(method);
        }
        if let Some(route) = self.route {
            definition = definition.route(route);
        }
        if let Some(response) = self.response {
            definition = definition.respond_with(response.into_template(name)?);
        }
        Ok(definition)
    }
}

impl FileResponse {
    fn into_template(self, name: &str) -> Result<ResponseTemplate, LoadError> {
        let invalid = |reason: String| LoadError::InvalidResponse {
            fixture: name.to_string(),
            reason,
        };

        let status = StatusCode::from_u16(self.status)
            .map_err(|_| invalid(format!("{} is not a valid status code", self.status)))?;
        let mut template = ResponseTemplate::new(status);
        for (key, value) in self.headers {
            let key = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| invalid(format!("\"{}\" is not a valid header name", key)))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|_| invalid(format!("\"{}\" is not a valid header value", value)))?;
            template = template.append_header(key, value);
        }
        template = match (self.body, self.json) {
            (Some(_), Some(_)) => {
                return Err(invalid("`body` and `json` are mutually exclusive".into()))
            }
            (Some(body), None) => template.set_body_string(body),
            (None, Some(json)) => template.set_body_json(json),
            (None, None) => template,
        };
        if let Some(delay) = self.delay_ms {
            template = template.set_delay(Duration::from_millis(delay));
        }
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<FixtureDefinitions, LoadError> {
        JsonFileSource::new("fixtures.json").parse(contents)
    }

    #[test]
    fn fixtures_keep_the_file_order() {
        let definitions = parse(
            r#"{
                "zebra": { "method": "get", "route": "/z", "response": {} },
                "alpha": { "method": "get", "route": "/a", "response": {} }
            }"#,
        )
        .unwrap();

        let names: Vec<_> = definitions.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["zebra", "alpha"]);
    }

    #[test]
    fn missing_fields_are_left_to_validation() {
        let definitions = parse(r#"{ "no route": { "method": "get", "response": {} } }"#).unwrap();
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn invalid_status_codes_are_rejected() {
        let error = parse(
            r#"{ "bad": { "method": "get", "route": "/", "response": { "status": 1000 } } }"#,
        )
        .unwrap_err();

        assert!(matches!(error, LoadError::InvalidResponse { fixture, .. } if fixture == "bad"));
    }

    #[test]
    fn body_and_json_cannot_both_be_set() {
        let error = parse(
            r#"{ "bad": { "method": "get", "route": "/", "response": { "body": "a", "json": 1 } } }"#,
        )
        .unwrap_err();

        assert!(matches!(error, LoadError::InvalidResponse { .. }));
    }

    #[test]
    fn malformed_documents_report_the_path() {
        let error = parse("[1, 2, 3]").unwrap_err();

        match error {
            LoadError::Parse { path, .. } => assert_eq!(path, Path::new("fixtures.json")),
            other => panic!("Expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn unreadable_files_report_the_path() {
        let error = JsonFileSource::new("does/not/exist.json").load().unwrap_err();
        assert!(matches!(error, LoadError::Io { .. }));
    }
}
