use crate::error::{FixtureField, ValidationError};
use crate::router::{RouteMethod, RoutePattern};
use crate::Respond;
use std::fmt;
use std::sync::Arc;

/// The raw description of a fixture: which requests it answers and how.
///
/// Every field is optional so that definitions can be assembled step by step, or produced by a
/// [`FixtureSource`](crate::FixtureSource); completeness is checked when the definition is
/// added to a [`FixtureRegistry`](crate::FixtureRegistry).
///
/// ### Example:
/// ```rust
/// use fixed_server::{FixtureDefinition, FixtureRegistry, ResponseTemplate};
///
/// let mut registry = FixtureRegistry::new();
/// registry
///     .add_fixture(
///         "GET 200 /hello",
///         FixtureDefinition::new()
///             .method("get")
///             .route("/hello")
///             .respond_with(ResponseTemplate::new(200).set_body_string("world")),
///     )
///     .unwrap();
///
/// // No route: rejected.
/// let error = registry
///     .add_fixture("GET 200 /nowhere", FixtureDefinition::new().method("get"))
///     .unwrap_err();
/// assert_eq!(error.to_string(), "fixture \"GET 200 /nowhere\" did not have a route");
/// ```
#[derive(Clone, Default)]
pub struct FixtureDefinition {
    method: Option<String>,
    route: Option<String>,
    response: Option<Arc<dyn Respond>>,
}

impl FixtureDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// The HTTP method to answer, e.g. `get`. Case does not matter; `all` answers every method.
    pub fn method<T: Into<String>>(mut self, method: T) -> Self {
        self.method = Some(method.into());
        self
    }

    /// The route pattern to answer, e.g. `/trips/:id`. See the [`router`](crate::router)
    /// module for the supported syntax.
    pub fn route<T: Into<String>>(mut self, route: T) -> Self {
        self.route = Some(route.into());
        self
    }

    /// The handler producing the response.
    pub fn respond_with<R: Respond + 'static>(mut self, responder: R) -> Self {
        self.response = Some(Arc::new(responder));
        self
    }

    /// Check that method, route and response are all there and usable.
    pub(crate) fn validate(self, name: &str) -> Result<Fixture, ValidationError> {
        let missing = |field| ValidationError::MissingField {
            fixture: name.to_string(),
            field,
        };

        let method = present(self.method).ok_or_else(|| missing(FixtureField::Method))?;
        let route = present(self.route).ok_or_else(|| missing(FixtureField::Route))?;
        let response = self
            .response
            .ok_or_else(|| missing(FixtureField::Response))?;

        let parsed_method =
            RouteMethod::parse(&method).ok_or_else(|| ValidationError::InvalidMethod {
                fixture: name.to_string(),
                method: method.clone(),
            })?;
        let pattern =
            RoutePattern::compile(&route).map_err(|reason| ValidationError::InvalidRoute {
                fixture: name.to_string(),
                route: route.clone(),
                reason,
            })?;

        Ok(Fixture {
            name: name.to_string(),
            method: parsed_method,
            route: pattern,
            response,
        })
    }
}

/// Blank strings count as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for FixtureDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureDefinition")
            .field("method", &self.method)
            .field("route", &self.route)
            .field("response", &self.response.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

/// A validated fixture, as stored by a [`FixtureRegistry`](crate::FixtureRegistry).
///
/// Fixtures are immutable; cloning one is cheap and shares the handler.
#[derive(Clone)]
pub struct Fixture {
    name: String,
    method: RouteMethod,
    route: RoutePattern,
    response: Arc<dyn Respond>,
}

impl Fixture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &RouteMethod {
        &self.method
    }

    pub fn route(&self) -> &str {
        self.route.as_str()
    }

    pub(crate) fn pattern(&self) -> &RoutePattern {
        &self.route
    }

    pub(crate) fn responder(&self) -> Arc<dyn Respond> {
        self.response.clone()
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("route", &self.route.as_str())
            .finish_non_exhaustive()
    }
}
