use crate::error::{LoadError, NotFoundError, ValidationError};
use crate::source::{FixtureSource, JsonFileSource};
use crate::{FixedServer, Fixture, FixtureDefinition, ServerOptions};
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// A named collection of fixtures from which [`FixedServer`]s are built.
///
/// Fixtures are validated when added and looked up by name when a server is created. The
/// registry only ever grows: adding a fixture under an existing name silently replaces it.
///
/// Servers copy the fixtures they are built from - changes made to the registry afterwards
/// never reach servers that already exist.
///
/// ### Example:
/// ```rust
/// use fixed_server::{FixtureDefinition, FixtureRegistry, ResponseTemplate, ServerOptions};
///
/// #[tokio::main]
/// async fn main() {
///     let mut registry = FixtureRegistry::with_options(ServerOptions::new().port(0));
///     registry
///         .add_fixture(
///             "GET 200 /hello",
///             FixtureDefinition::new()
///                 .method("get")
///                 .route("/hello")
///                 .respond_with(ResponseTemplate::new(200).set_body_string("world")),
///         )
///         .unwrap();
///
///     let mut server = registry.create_server("GET 200 /hello").unwrap();
///     server.listen(None).await.unwrap();
///
///     let body = reqwest::get(format!("{}/hello", server.uri().unwrap()))
///         .await
///         .unwrap()
///         .text()
///         .await
///         .unwrap();
///     assert_eq!(body, "world");
///
///     server.destroy().await.unwrap();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    fixtures: HashMap<String, Fixture>,
    options: ServerOptions,
}

impl FixtureRegistry {
    /// An empty registry handing default [`ServerOptions`] to its servers.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry handing `options` to every server it creates.
    pub fn with_options(options: ServerOptions) -> Self {
        Self {
            fixtures: HashMap::new(),
            options,
        }
    }

    /// Build a registry from the fixtures supplied by `source`.
    ///
    /// Definitions go through [`add_fixtures`](Self::add_fixtures): the first invalid one
    /// fails the whole load. Servers get `options`, or [`ServerOptions::default`] if `None`.
    pub fn from_source<S>(source: &S, options: Option<ServerOptions>) -> Result<Self, LoadError>
    where
        S: FixtureSource + ?Sized,
    {
        let mut registry = Self::with_options(options.unwrap_or_default());
        registry.add_fixtures(source.load()?)?;
        Ok(registry)
    }

    /// Build a registry from a JSON fixture file - see [`JsonFileSource`] for the format.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        options: Option<ServerOptions>,
    ) -> Result<Self, LoadError> {
        Self::from_source(&JsonFileSource::new(path.as_ref()), options)
    }

    /// Validate `definition` and store it under `name`, replacing any fixture with that name.
    ///
    /// Returns the registry itself to allow chaining.
    pub fn add_fixture<N: Into<String>>(
        &mut self,
        name: N,
        definition: FixtureDefinition,
    ) -> Result<&mut Self, ValidationError> {
        let name = name.into();
        let fixture = definition.validate(&name)?;
        if self.fixtures.insert(name, fixture).is_some() {
            debug!("Replaced an existing fixture with a new definition.");
        }
        Ok(self)
    }

    /// [`add_fixture`](Self::add_fixture) every pair, in iteration order.
    ///
    /// The first invalid definition stops the batch: the fixtures added before it stay in the
    /// registry.
    pub fn add_fixtures<I, N>(&mut self, fixtures: I) -> Result<&mut Self, ValidationError>
    where
        I: IntoIterator<Item = (N, FixtureDefinition)>,
        N: Into<String>,
    {
        for (name, definition) in fixtures {
            self.add_fixture(name, definition)?;
        }
        Ok(self)
    }

    /// Create a new, not yet listening, [`FixedServer`] exposing the selected fixtures.
    ///
    /// `names` can be a single name, a sequence of names or `()` for a server without
    /// fixtures. Fixtures are installed in the given order. If any name is unknown no server
    /// is created.
    pub fn create_server<S: Into<FixtureNames>>(
        &self,
        names: S,
    ) -> Result<FixedServer, NotFoundError> {
        let names = names.into();
        let fixtures = names
            .iter()
            .map(|name| {
                self.fixtures.get(name).ok_or_else(|| NotFoundError {
                    fixture: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut server = FixedServer::new(self.options.clone());
        for fixture in fixtures {
            server.install_fixture(fixture);
        }
        Ok(server)
    }

    pub fn get(&self, name: &str) -> Option<&Fixture> {
        self.fixtures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    /// The names of all registered fixtures, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fixtures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }
}

/// An ordered selection of fixture names, as accepted by [`FixtureRegistry::create_server`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureNames(Vec<String>);

impl FixtureNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<()> for FixtureNames {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<&str> for FixtureNames {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for FixtureNames {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<&String> for FixtureNames {
    fn from(name: &String) -> Self {
        Self(vec![name.clone()])
    }
}

impl<S: Into<String>> From<Vec<S>> for FixtureNames {
    fn from(names: Vec<S>) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for FixtureNames {
    fn from(names: [S; N]) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String> + Clone> From<&[S]> for FixtureNames {
    fn from(names: &[S]) -> Self {
        Self(names.iter().cloned().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixtureField;
    use crate::ResponseTemplate;

    fn hello() -> FixtureDefinition {
        FixtureDefinition::new()
            .method("get")
            .route("/hello")
            .respond_with(ResponseTemplate::new(200).set_body_string("world"))
    }

    #[test]
    fn add_fixture_chains() {
        let mut registry = FixtureRegistry::new();
        registry
            .add_fixture("one", hello())
            .unwrap()
            .add_fixture("two", hello().route("/two"))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("one"));
        assert_eq!(registry.get("two").unwrap().route(), "/two");
    }

    #[test]
    fn adding_a_name_twice_replaces_the_fixture() {
        let mut registry = FixtureRegistry::new();
        registry.add_fixture("hello", hello()).unwrap();
        registry
            .add_fixture("hello", hello().route("/replaced"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("hello").unwrap().route(), "/replaced");
    }

    #[test]
    fn invalid_fixtures_are_not_stored() {
        let mut registry = FixtureRegistry::new();
        let error = registry
            .add_fixture("broken", FixtureDefinition::new().method("get"))
            .unwrap_err();

        assert_eq!(error.fixture(), "broken");
        assert_eq!(error.field(), FixtureField::Route);
        assert!(registry.is_empty());
    }

    #[test]
    fn add_fixtures_stops_at_the_first_invalid_definition() {
        let mut registry = FixtureRegistry::new();
        let error = registry
            .add_fixtures(vec![
                ("first", hello()),
                ("second", hello().method("")),
                ("third", hello()),
            ])
            .unwrap_err();

        assert_eq!(error.fixture(), "second");
        assert!(registry.contains("first"));
        assert!(!registry.contains("second"));
        assert!(!registry.contains("third"));
    }

    #[test]
    fn create_server_installs_the_selected_fixtures() {
        let mut registry = FixtureRegistry::new();
        registry
            .add_fixtures([
                ("hello", hello()),
                ("auth", hello().method("post").route("/auth")),
                ("unused", hello().route("/unused")),
            ])
            .unwrap();

        let server = registry.create_server(["hello", "auth"]).unwrap();
        assert_eq!(server.route_count(), 2);
        assert!(!server.is_listening());
    }

    #[test]
    fn create_server_accepts_nothing() {
        let registry = FixtureRegistry::new();

        assert_eq!(registry.create_server(()).unwrap().route_count(), 0);
        assert_eq!(
            registry.create_server(Vec::<String>::new()).unwrap().route_count(),
            0
        );
    }

    #[test]
    fn duplicate_names_install_the_same_route_once() {
        let mut registry = FixtureRegistry::new();
        registry.add_fixture("hello", hello()).unwrap();

        let server = registry.create_server(vec!["hello", "hello"]).unwrap();
        assert_eq!(server.route_count(), 1);
    }

    #[test]
    fn unknown_names_fail_the_whole_creation() {
        let mut registry = FixtureRegistry::new();
        registry.add_fixture("hello", hello()).unwrap();

        let error = registry
            .create_server(["hello", "missing", "also missing"])
            .unwrap_err();
        assert_eq!(error.fixture(), "missing");
    }

    #[test]
    fn from_source_populates_through_add_fixtures() {
        let source = || -> Result<Vec<(String, FixtureDefinition)>, LoadError> {
            Ok(vec![("hello".to_string(), hello())])
        };

        let registry = FixtureRegistry::from_source(&source, Some(ServerOptions::new().port(1337))).unwrap();
        assert!(registry.contains("hello"));
        assert_eq!(registry.options(), &ServerOptions::new().port(1337));
    }

    #[test]
    fn from_source_reports_invalid_definitions() {
        let source = || -> Result<Vec<(String, FixtureDefinition)>, LoadError> {
            Ok(vec![("broken".to_string(), FixtureDefinition::new())])
        };

        let error = FixtureRegistry::from_source(&source, None).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Validation(ValidationError::MissingField {
                field: FixtureField::Method,
                ..
            })
        ));
    }

    #[test]
    fn from_source_defaults_the_options() {
        let source = || -> Result<Vec<(String, FixtureDefinition)>, LoadError> { Ok(vec![]) };

        let registry = FixtureRegistry::from_source(&source, None).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.options(), &ServerOptions::default());
    }
}
