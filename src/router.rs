//! Method and route matching for the requests reaching a [`FixedServer`](crate::FixedServer).
//!
//! Route patterns use the syntax popularised by Express and friends:
//! - literal segments, e.g. `/trips/full`;
//! - named parameters, e.g. `/trips/:id`, matching a single non-empty segment;
//! - optional parameters, e.g. `/trips/:id?`, which also match `/trips`;
//! - wildcards, `*`, matching anything (including `/`), exposed as parameters `0`, `1`, ...
//!
//! Matching ignores the query string and ASCII case, and tolerates a trailing slash. Captured
//! values are percent-decoded.
use crate::{Request, Respond, ResponseTemplate};
use http::Method;
use log::debug;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The HTTP method a fixture answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMethod {
    /// Any method, spelled `all` in fixture definitions.
    Any,
    Exact(Method),
}

impl RouteMethod {
    /// Parse a method as written in a fixture definition: `get`, `POST`, `all`, ...
    pub(crate) fn parse(method: &str) -> Option<Self> {
        if method.eq_ignore_ascii_case("all") {
            return Some(RouteMethod::Any);
        }
        Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .ok()
            .map(RouteMethod::Exact)
    }

    fn matches(&self, method: &Method) -> bool {
        match self {
            RouteMethod::Any => true,
            // `HEAD` is answered by `GET` routes, hyper takes care of dropping the body.
            RouteMethod::Exact(expected) => {
                expected == method || (*expected == Method::GET && *method == Method::HEAD)
            }
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMethod::Any => f.write_str("ALL"),
            RouteMethod::Exact(method) => write!(f, "{}", method),
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    pub(crate) fn compile(pattern: &str) -> Result<Self, String> {
        let mut regex = String::from("(?i)^");
        let mut params = Vec::new();
        let mut literal = String::new();
        let mut n_wildcards = 0;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ':' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if !(next.is_ascii_alphanumeric() || next == '_') {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }
                    if name.is_empty() {
                        return Err(format!(
                            "a parameter is missing its name after \"{}\"",
                            literal
                        ));
                    }
                    let optional = chars.next_if_eq(&'?').is_some();
                    if optional && literal.ends_with('/') {
                        // `/trips/:id?` matches `/trips` as well.
                        literal.pop();
                        flush_literal(&mut regex, &mut literal);
                        regex.push_str("(?:/([^/]+?))?");
                    } else {
                        flush_literal(&mut regex, &mut literal);
                        regex.push_str(if optional { "([^/]+?)?" } else { "([^/]+?)" });
                    }
                    params.push(name);
                }
                '*' => {
                    flush_literal(&mut regex, &mut literal);
                    regex.push_str("(.*)");
                    params.push(n_wildcards.to_string());
                    n_wildcards += 1;
                }
                c => literal.push(c),
            }
        }
        if literal.ends_with('/') {
            literal.pop();
        }
        flush_literal(&mut regex, &mut literal);
        regex.push_str("/?$");

        let regex = Regex::new(&regex).map_err(|e| e.to_string())?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            params,
        })
    }

    /// The pattern as it was written in the fixture definition.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The parameters captured from `path`, percent-decoded, or `None` if the path does not
    /// match.
    pub(crate) fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let params = self
            .params
            .iter()
            .zip(captures.iter().skip(1))
            .filter_map(|(name, value)| {
                let value = percent_decode_str(value?.as_str()).decode_utf8_lossy();
                Some((name.clone(), value.into_owned()))
            })
            .collect();
        Some(params)
    }
}

fn flush_literal(regex: &mut String, literal: &mut String) {
    regex.push_str(&regex::escape(literal));
    literal.clear();
}

struct Route {
    method: RouteMethod,
    pattern: RoutePattern,
    responder: Arc<dyn Respond>,
}

/// The routing table of a single server.
///
/// Routes are tried in installation order and the first match answers. Installing a route with
/// the same method and pattern as an existing one replaces its handler in place.
#[derive(Clone, Default)]
pub(crate) struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    pub(crate) fn install(
        &mut self,
        method: RouteMethod,
        pattern: RoutePattern,
        responder: Arc<dyn Respond>,
    ) {
        let route = Arc::new(Route {
            method,
            pattern,
            responder,
        });
        let existing = self.routes.iter_mut().find(|installed| {
            installed.method == route.method && installed.pattern.as_str() == route.pattern.as_str()
        });
        match existing {
            Some(installed) => {
                debug!(
                    "Replacing the handler of {} {}.",
                    route.method,
                    route.pattern.as_str()
                );
                *installed = route;
            }
            None => self.routes.push(route),
        }
    }

    /// Find the route answering `request`, record its parameters on the request and produce
    /// the response. `None` if no route matched.
    pub(crate) fn dispatch(&self, request: &mut Request) -> Option<ResponseTemplate> {
        let path = request.url.path().to_string();
        for route in &self.routes {
            if !route.method.matches(&request.method) {
                continue;
            }
            if let Some(params) = route.pattern.captures(&path) {
                request.params = params;
                return Some(route.responder.respond(request));
            }
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }
}
