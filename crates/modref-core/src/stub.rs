//! Proxy stubs returned in place of client module exports.
//!
//! Every property read on a stub answers with a [`ModuleReference`] for that
//! export name, created on first read and cached so that later reads return
//! the same `Rc`. A handful of names are dispatched before the cache:
//!
//! | Property       | Result                                             |
//! |----------------|----------------------------------------------------|
//! | `$$typeof`     | the reference tag                                  |
//! | `filepath`     | the module location                                |
//! | `name`         | `"*"`                                              |
//! | `defaultProps` | `Undefined`, always                                |
//! | `__esModule`   | `true`, after caching a default-or-namespace ref   |

use crate::error::{Error, Result};
use crate::reference::{
    ModuleReference, DEFAULT_OR_NAMESPACE_EXPORT, KIND_PROPERTY, LOCATION_PROPERTY, NAME_PROPERTY,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Read by element creation; must never resolve through a reference.
pub const DEFAULT_PROPS_PROPERTY: &str = "defaultProps";

/// ES module interop flag checked before choosing a default binding.
pub const ES_MODULE_FLAG_PROPERTY: &str = "__esModule";

/// Result of reading a property off a [`ProxyStub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubProperty<'a> {
    Str(&'a str),
    Bool(bool),
    Undefined,
    Reference(Rc<ModuleReference>),
}

impl StubProperty<'_> {
    /// The reference, if this read produced one.
    #[must_use]
    pub fn into_reference(self) -> Option<Rc<ModuleReference>> {
        match self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }
}

/// Exports object of a client module as seen from the server.
#[derive(Debug)]
pub struct ProxyStub {
    base: Rc<ModuleReference>,
    references: RefCell<HashMap<String, Rc<ModuleReference>>>,
    es_module: Cell<bool>,
}

impl ProxyStub {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            base: Rc::new(ModuleReference::namespace(location)),
            references: RefCell::new(HashMap::new()),
            es_module: Cell::new(false),
        }
    }

    /// The base record: a reference to the whole namespace.
    #[must_use]
    pub fn namespace(&self) -> &Rc<ModuleReference> {
        &self.base
    }

    #[must_use]
    pub fn location(&self) -> &str {
        self.base.location()
    }

    /// Whether `__esModule` has been read off this stub.
    #[must_use]
    pub fn is_es_module(&self) -> bool {
        self.es_module.get()
    }

    /// Read a property.
    pub fn get(&self, property: &str) -> StubProperty<'_> {
        match property {
            KIND_PROPERTY => StubProperty::Str(self.base.kind()),
            LOCATION_PROPERTY => StubProperty::Str(self.base.location()),
            NAME_PROPERTY => StubProperty::Str(self.base.export_name()),
            DEFAULT_PROPS_PROPERTY => StubProperty::Undefined,
            ES_MODULE_FLAG_PROPERTY => {
                if !self.es_module.replace(true) {
                    // The client decides whether this means `default` or the namespace.
                    self.references.borrow_mut().insert(
                        "default".to_string(),
                        Rc::new(ModuleReference::new(
                            self.base.location(),
                            DEFAULT_OR_NAMESPACE_EXPORT,
                        )),
                    );
                }
                StubProperty::Bool(true)
            }
            name => StubProperty::Reference(self.reference(name)),
        }
    }

    /// Cached reference for `name`, created on first request.
    pub fn reference(&self, name: &str) -> Rc<ModuleReference> {
        let mut references = self.references.borrow_mut();
        if let Some(existing) = references.get(name) {
            return Rc::clone(existing);
        }
        let created = Rc::new(ModuleReference::new(self.base.location(), name));
        references.insert(name.to_string(), Rc::clone(&created));
        created
    }

    /// Assignments are rejected unconditionally.
    pub fn set(&self, property: &str) -> Result<()> {
        Err(Error::ReadOnlyReference {
            location: self.base.location().to_string(),
            property: property.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MODULE_REFERENCE_TAG;

    const URL: &str = "file:///app/Counter.client.js";

    #[test]
    fn test_repeated_reads_return_same_reference() {
        let stub = ProxyStub::new(URL);
        let a = stub.get("Counter").into_reference().unwrap();
        let b = stub.get("Counter").into_reference().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.location(), URL);
        assert_eq!(a.export_name(), "Counter");
    }

    #[test]
    fn test_distinct_names_get_distinct_references() {
        let stub = ProxyStub::new(URL);
        let a = stub.get("A").into_reference().unwrap();
        let b = stub.get("B").into_reference().unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(b.export_name(), "B");
    }

    #[test]
    fn test_meta_properties_read_base_record() {
        let stub = ProxyStub::new(URL);
        assert_eq!(stub.get("$$typeof"), StubProperty::Str(MODULE_REFERENCE_TAG));
        assert_eq!(stub.get("filepath"), StubProperty::Str(URL));
        assert_eq!(stub.get("name"), StubProperty::Str("*"));
    }

    #[test]
    fn test_default_props_always_undefined() {
        let stub = ProxyStub::new(URL);
        assert_eq!(stub.get("defaultProps"), StubProperty::Undefined);
        stub.get("__esModule");
        stub.get("Other");
        assert_eq!(stub.get("defaultProps"), StubProperty::Undefined);
    }

    #[test]
    fn test_es_module_flag_creates_default_once() {
        let stub = ProxyStub::new(URL);
        assert!(!stub.is_es_module());
        assert_eq!(stub.get("__esModule"), StubProperty::Bool(true));
        assert!(stub.is_es_module());

        let first = stub.get("default").into_reference().unwrap();
        assert_eq!(first.export_name(), "");

        assert_eq!(stub.get("__esModule"), StubProperty::Bool(true));
        let second = stub.get("default").into_reference().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_default_without_interop_flag_is_named() {
        let stub = ProxyStub::new(URL);
        let d = stub.get("default").into_reference().unwrap();
        assert_eq!(d.export_name(), "default");
    }

    #[test]
    fn test_assignment_rejected() {
        let stub = ProxyStub::new(URL);
        for property in ["Counter", "default", "$$typeof", "defaultProps"] {
            let err = stub.set(property).unwrap_err();
            assert!(matches!(err, Error::ReadOnlyReference { .. }));
        }
        assert!(stub.set("x").unwrap_err().to_string().contains("read-only"));
    }
}
