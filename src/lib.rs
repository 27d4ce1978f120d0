#![allow(clippy::needless_doctest_main)]
//! `fixed-server` provides named HTTP fixtures and the mock servers that serve them, to stand in
//! for the HTTP dependencies of an application under test.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Fixtures](#fixtures)
//! 3. [Loading fixtures from a file](#loading-fixtures-from-a-file)
//! 4. [Server lifecycle](#server-lifecycle)
//! 5. [Test isolation](#test-isolation)
//! 6. [Runtime compatibility](#runtime-compatibility)
//!
//! ## Getting started
//! ```rust
//! use fixed_server::{FixtureDefinition, FixtureRegistry, Request, ResponseTemplate};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Register fixtures once, by name.
//!     let mut registry = FixtureRegistry::new();
//!     registry
//!         .add_fixture(
//!             "GET 200 /hello",
//!             FixtureDefinition::new()
//!                 .method("get")
//!                 .route("/hello")
//!                 .respond_with(ResponseTemplate::new(200).set_body_string("world")),
//!         )
//!         .unwrap()
//!         .add_fixture(
//!             "POST 500 /auth",
//!             FixtureDefinition::new()
//!                 .method("post")
//!                 .route("/auth")
//!                 .respond_with(|_: &Request| ResponseTemplate::new(500).set_body_string("Rejected!")),
//!         )
//!         .unwrap();
//!
//!     // Pick the ones this scenario needs and start a server exposing them.
//!     let mut server = registry.create_server(["GET 200 /hello", "POST 500 /auth"]).unwrap();
//!     server.listen(Some(0)).await.unwrap();
//!     let uri = server.uri().unwrap();
//!
//!     let response = reqwest::Client::new()
//!         .post(format!("{}/auth", uri))
//!         .send()
//!         .await
//!         .unwrap();
//!     assert_eq!(response.status(), 500);
//!     assert_eq!(response.text().await.unwrap(), "Rejected!");
//!
//!     // Requests no fixture answers get a 404.
//!     let status = reqwest::get(format!("{}/missing", uri)).await.unwrap().status();
//!     assert_eq!(status, 404);
//!
//!     server.destroy().await.unwrap();
//! }
//! ```
//!
//! ## Fixtures
//!
//! A fixture is a method, a route pattern and a response, stored under a caller-chosen name.
//! Names are plain lookup keys: `"GET 200 /trips#full"` is as good as `"trips"`.
//!
//! Definitions are checked when they are added to a [`FixtureRegistry`]: a fixture without a
//! method, a route or a response is rejected with a [`ValidationError`] naming it.
//!
//! Responses are anything implementing [`Respond`]: a [`ResponseTemplate`], a closure over the
//! incoming [`Request`], or your own type. Route patterns support `:name` parameters, `:name?`
//! optional parameters and `*` wildcards - see the [`router`] module.
//!
//! ## Loading fixtures from a file
//!
//! [`FixtureRegistry::from_file`] reads fixtures from a JSON document (see [`JsonFileSource`]);
//! [`FixtureRegistry::from_source`] accepts any [`FixtureSource`].
//!
//! ## Server lifecycle
//!
//! [`FixtureRegistry::create_server`] returns a [`FixedServer`] with the selected fixtures
//! installed, ready to [`listen`](FixedServer::listen). [`destroy`](FixedServer::destroy)
//! closes it and resolves once its port can be reused.
//!
//! ## Test isolation
//!
//! Every [`FixedServer`] owns its routing table and its listener: there is no global state.
//! Any number of servers, built from the same registry or not, can run side by side as long as
//! they listen on distinct ports - port `0` lets the operating system pick a free one.
//!
//! ## Runtime compatibility
//!
//! Each listening server runs on a background thread with its own `tokio` runtime, so
//! `fixed-server` works from `tokio`, `async-std` or `actix` tests alike.
mod error;
mod fixed_server;
mod fixture;
pub mod http;
mod registry;
mod request;
mod respond;
mod response_template;
pub mod router;
mod source;

pub use error::{
    Error, FixtureField, LoadError, NotFoundError, TransportError, ValidationError,
};
pub use fixed_server::{FixedServer, ServerOptions};
pub use fixture::{Fixture, FixtureDefinition};
pub use registry::{FixtureNames, FixtureRegistry};
pub use request::{BodyPrintLimit, Request, BODY_PRINT_LIMIT};
pub use respond::Respond;
pub use response_template::ResponseTemplate;
pub use source::{FixtureDefinitions, FixtureSource, JsonFileSource};
