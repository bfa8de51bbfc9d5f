//! Activation of the synchronous stub loader.

use crate::boundary;
use crate::config::Conventions;
use crate::host::{Exports, ModuleRegistry};
use crate::resolver::path_to_url;
use crate::stub::ProxyStub;
use std::rc::Rc;
use std::sync::Arc;

/// Install the client-module handler and the import boundary into `registry`.
///
/// Files ending in the client suffix load as a [`ProxyStub`] instead of
/// their contents, and every resolution is checked against the restricted
/// module convention. Calling this twice wraps the resolver twice.
pub fn register(registry: &mut ModuleRegistry, conventions: &Conventions) {
    registry.set_extension(
        conventions.client_suffix.clone(),
        Box::new(|module, path| {
            let canonical = dunce::canonicalize(path)?;
            let location = path_to_url(&canonical)?;
            tracing::debug!(%location, "stubbing client module");
            module.exports = Exports::Stub(Rc::new(ProxyStub::new(location)));
            Ok(())
        }),
    );

    let conventions = Arc::new(conventions.clone());
    registry.replace_resolver(|previous| boundary::guard(conventions, previous));
}
