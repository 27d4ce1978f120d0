//! All bits and pieces concerning the HTTP server behind a fixture selection.
//!
//! `instance::FixedServer` is the "front-end" users drive: it collects fixtures into a
//! routing table and manages the listener lifecycle. The `hyper` sub-module holds the server
//! loop that runs in the background once the instance is listening. `options` carries the
//! configuration a registry hands to every server it creates.
mod hyper;
mod instance;
mod options;

pub use instance::FixedServer;
pub use options::ServerOptions;
