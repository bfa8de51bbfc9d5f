#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Module reference stubs for a server/client module boundary.
//!
//! Client modules loaded on the server become opaque references instead of
//! running. Two loading paths are covered: a synchronous registry (see
//! [`register`]) and asynchronous pipeline hooks (see [`loader`]).

pub mod boundary;
pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod loader;
pub mod reference;
pub mod register;
pub mod resolver;
pub mod stub;
pub mod synth;
pub mod version;

pub use config::{Config, Conventions};
pub use error::{Error, Result};
pub use host::{Exports, Module, ModuleRegistry};
pub use loader::{LoadedModule, ServerLoader};
pub use reference::ModuleReference;
pub use register::register;
pub use stub::{ProxyStub, StubProperty};
pub use version::VERSION;
