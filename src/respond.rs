use crate::{Request, ResponseTemplate};

/// Anything that implements `Respond` can be used as the `response` of a fixture.
///
/// ## Fixed responses
///
/// The simplest `Respond` is [`ResponseTemplate`]: no matter the request, it will
/// always return itself.
///
/// ```rust
/// use fixed_server::{FixtureDefinition, ResponseTemplate};
///
/// let fixture = FixtureDefinition::new()
///     .method("get")
///     .route("/hello")
///     .respond_with(ResponseTemplate::new(200).set_body_string("world"));
/// ```
///
/// ## Dynamic responses
///
/// Closures taking a [`Request`] and returning a [`ResponseTemplate`] implement `Respond` too,
/// which covers responses that depend on the request - e.g. echoing a route parameter:
///
/// ```rust
/// use fixed_server::{FixtureDefinition, Request, ResponseTemplate};
///
/// let fixture = FixtureDefinition::new()
///     .method("get")
///     .route("/trips/:id")
///     .respond_with(|request: &Request| {
///         let id = request.param("id").unwrap_or_default();
///         ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": id }))
///     });
/// ```
///
/// For anything more involved, implement the trait on your own type.
pub trait Respond: Send + Sync {
    /// Given a reference to a [`Request`] return a [`ResponseTemplate`] that will be used
    /// by the [`FixedServer`] as blueprint for the response returned to the client.
    ///
    /// [`FixedServer`]: crate::FixedServer
    fn respond(&self, request: &Request) -> ResponseTemplate;
}

impl Respond for ResponseTemplate {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.clone()
    }
}

impl<F> Respond for F
where
    F: Fn(&Request) -> ResponseTemplate,
    F: Send + Sync,
{
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self(request)
    }
}
