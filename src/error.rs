//! Everything that can go wrong while registering fixtures, building servers or running them.
//!
//! Each operation returns the narrowest error it can produce: validation problems come out of
//! [`FixtureRegistry::add_fixture`], lookup failures out of [`FixtureRegistry::create_server`]
//! and socket failures out of the [`FixedServer::listen`]/[`FixedServer::destroy`] futures.
//! [`Error`] wraps all of them for callers that just want to use `?`.
//!
//! [`FixtureRegistry::add_fixture`]: crate::FixtureRegistry::add_fixture
//! [`FixtureRegistry::create_server`]: crate::FixtureRegistry::create_server
//! [`FixedServer::listen`]: crate::FixedServer::listen
//! [`FixedServer::destroy`]: crate::FixedServer::destroy
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// The three fields every fixture definition must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureField {
    Method,
    Route,
    Response,
}

impl fmt::Display for FixtureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self {
            FixtureField::Method => "method",
            FixtureField::Route => "route",
            FixtureField::Response => "response",
        };
        f.write_str(field)
    }
}

/// A fixture definition was rejected when it was added to a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("fixture \"{fixture}\" did not have a {field}")]
    MissingField { fixture: String, field: FixtureField },
    #[error("fixture \"{fixture}\" has an invalid method \"{method}\"")]
    InvalidMethod { fixture: String, method: String },
    #[error("fixture \"{fixture}\" has an invalid route \"{route}\": {reason}")]
    InvalidRoute {
        fixture: String,
        route: String,
        reason: String,
    },
}

impl ValidationError {
    /// Name of the offending fixture.
    pub fn fixture(&self) -> &str {
        match self {
            ValidationError::MissingField { fixture, .. }
            | ValidationError::InvalidMethod { fixture, .. }
            | ValidationError::InvalidRoute { fixture, .. } => fixture,
        }
    }

    /// The field that failed validation.
    pub fn field(&self) -> FixtureField {
        match self {
            ValidationError::MissingField { field, .. } => *field,
            ValidationError::InvalidMethod { .. } => FixtureField::Method,
            ValidationError::InvalidRoute { .. } => FixtureField::Route,
        }
    }
}

/// A server was requested for a fixture name the registry does not know about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fixture \"{fixture}\" could not be found")]
pub struct NotFoundError {
    pub(crate) fixture: String,
}

impl NotFoundError {
    /// Name of the missing fixture.
    pub fn fixture(&self) -> &str {
        &self.fixture
    }
}

/// Binding or closing the listener of a [`FixedServer`](crate::FixedServer) failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {address}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to set up the background runtime of the server")]
    Runtime(#[source] io::Error),
    #[error("the server has already been started")]
    AlreadyStarted,
    #[error("the server is not listening")]
    NotListening,
    #[error("the server listening on {address} stopped abnormally")]
    Shutdown { address: SocketAddr },
}

/// A [`FixtureSource`](crate::FixtureSource) could not produce a registry.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read fixtures from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse fixtures from {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("fixture \"{fixture}\" has an invalid response: {reason}")]
    InvalidResponse { fixture: String, reason: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("the fixture source failed")]
    Source(#[source] DynError),
}

impl LoadError {
    /// Wrap an arbitrary error raised by a custom [`FixtureSource`](crate::FixtureSource).
    pub fn custom<E>(error: E) -> Self
    where
        E: Into<DynError>,
    {
        LoadError::Source(error.into())
    }
}

/// Any error produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_fixture_and_field() {
        let error = ValidationError::MissingField {
            fixture: "GET 200 /hello".into(),
            field: FixtureField::Route,
        };

        assert_eq!(
            error.to_string(),
            "fixture \"GET 200 /hello\" did not have a route"
        );
        assert_eq!(error.fixture(), "GET 200 /hello");
        assert_eq!(error.field(), FixtureField::Route);
    }

    #[test]
    fn not_found_message_names_the_fixture() {
        let error = NotFoundError {
            fixture: "missing".into(),
        };
        assert_eq!(error.to_string(), "fixture \"missing\" could not be found");
    }

    #[test]
    fn umbrella_error_is_transparent() {
        let error: Error = NotFoundError {
            fixture: "missing".into(),
        }
        .into();
        assert_eq!(error.to_string(), "fixture \"missing\" could not be found");
    }
}
