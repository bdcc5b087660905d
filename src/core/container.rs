//! Service container: named services with singleton, transient, factory and
//! value lifetimes.
//!
//! Builders receive the container, so a service pulls its own dependencies
//! with [`Container::resolve`]. Re-entering a service that is still being
//! built is reported as [`Error::CircularDependency`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// Name under which a context resolves its broker, an `Rc<dyn Broker>`.
pub const BROKER_SERVICE: &str = "broker";

/// Name under which a context resolves its router reset cell, a `State`.
pub const RESET_SERVICE: &str = "reset";

type Instance = Rc<dyn Any>;
type Builder = Rc<dyn Fn(&Container) -> Result<Instance>>;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Built once, cached on first resolve.
    Singleton,
    /// Built on every resolve.
    Transient,
    /// Built on every resolve by a factory closure.
    Factory,
    /// A constant registered up front.
    Value,
}

struct Service {
    lifetime: Lifetime,
    builder: Option<Builder>,
}

#[derive(Default)]
struct ContainerInner {
    services: RefCell<IndexMap<String, Service>>,
    instances: RefCell<HashMap<String, Instance>>,
    resolving: RefCell<IndexSet<String>>,
    parent: Option<Container>,
}

/// Cheaply cloneable handle to a service container.
#[derive(Clone, Default)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    // -- registration -------------------------------------------------------

    /// Register a service built once and shared afterwards.
    pub fn singleton<T: 'static>(
        &self,
        name: impl Into<String>,
        build: impl Fn(&Container) -> Result<T> + 'static,
    ) -> &Self {
        self.insert(name.into(), Lifetime::Singleton, Some(erase(build)))
    }

    /// Register a service built anew on every resolve.
    pub fn transient<T: 'static>(
        &self,
        name: impl Into<String>,
        build: impl Fn(&Container) -> Result<T> + 'static,
    ) -> &Self {
        self.insert(name.into(), Lifetime::Transient, Some(erase(build)))
    }

    /// Register a factory. Like [`transient`](Self::transient) but reported
    /// as [`Lifetime::Factory`].
    pub fn factory<T: 'static>(
        &self,
        name: impl Into<String>,
        build: impl Fn(&Container) -> Result<T> + 'static,
    ) -> &Self {
        self.insert(name.into(), Lifetime::Factory, Some(erase(build)))
    }

    /// Register a constant.
    pub fn value<T: 'static>(&self, name: impl Into<String>, value: T) -> &Self {
        let name = name.into();
        self.inner
            .instances
            .borrow_mut()
            .insert(name.clone(), Rc::new(value));
        self.insert(name, Lifetime::Value, None)
    }

    fn insert(&self, name: String, lifetime: Lifetime, builder: Option<Builder>) -> &Self {
        if lifetime != Lifetime::Value {
            self.inner.instances.borrow_mut().remove(&name);
        }
        self.inner
            .services
            .borrow_mut()
            .insert(name, Service { lifetime, builder });
        self
    }

    // -- resolution ---------------------------------------------------------

    /// Resolve a service registered on this container.
    pub fn resolve<T: 'static>(&self, name: &str) -> Result<Rc<T>> {
        let instance = self.resolve_any(name)?;
        instance
            .downcast::<T>()
            .map_err(|_| Error::ServiceType(name.to_owned()))
    }

    /// Resolve a service, or wrap `default` when none is registered.
    pub fn resolve_or<T: 'static>(&self, name: &str, default: T) -> Result<Rc<T>> {
        if self.has(name) {
            self.resolve(name)
        } else {
            Ok(Rc::new(default))
        }
    }

    /// Resolve locally, then walk up the parent chain.
    pub fn resolve_with_parent<T: 'static>(&self, name: &str) -> Result<Rc<T>> {
        if self.has(name) {
            return self.resolve(name);
        }
        match &self.inner.parent {
            Some(parent) => parent.resolve_with_parent(name),
            None => Err(Error::ServiceNotFound(name.to_owned())),
        }
    }

    fn resolve_any(&self, name: &str) -> Result<Instance> {
        {
            let resolving = self.inner.resolving.borrow();
            if resolving.contains(name) {
                let mut chain: Vec<&str> = resolving.iter().map(String::as_str).collect();
                chain.push(name);
                return Err(Error::CircularDependency {
                    chain: chain.join(" -> "),
                });
            }
        }

        let (lifetime, builder) = {
            let services = self.inner.services.borrow();
            let service = services
                .get(name)
                .ok_or_else(|| Error::ServiceNotFound(name.to_owned()))?;
            (service.lifetime, service.builder.clone())
        };

        if matches!(lifetime, Lifetime::Singleton | Lifetime::Value) {
            if let Some(instance) = self.inner.instances.borrow().get(name) {
                return Ok(instance.clone());
            }
        }
        let Some(builder) = builder else {
            return Err(Error::ServiceNotFound(name.to_owned()));
        };

        self.inner.resolving.borrow_mut().insert(name.to_owned());
        let built = builder(self);
        self.inner.resolving.borrow_mut().shift_remove(name);
        let instance = built?;

        if lifetime == Lifetime::Singleton {
            self.inner
                .instances
                .borrow_mut()
                .insert(name.to_owned(), instance.clone());
        }
        Ok(instance)
    }

    // -- inspection ---------------------------------------------------------

    pub fn has(&self, name: &str) -> bool {
        self.inner.services.borrow().contains_key(name)
    }

    pub fn lifetime(&self, name: &str) -> Option<Lifetime> {
        self.inner.services.borrow().get(name).map(|s| s.lifetime)
    }

    /// Registered names in registration order.
    pub fn service_names(&self) -> Vec<String> {
        self.inner.services.borrow().keys().cloned().collect()
    }

    /// Forget every service and cached instance.
    pub fn clear(&self) {
        self.inner.services.borrow_mut().clear();
        self.inner.instances.borrow_mut().clear();
        self.inner.resolving.borrow_mut().clear();
    }

    /// Child container that falls back to this one in
    /// [`resolve_with_parent`](Self::resolve_with_parent).
    pub fn create_child(&self) -> Container {
        Container {
            inner: Rc::new(ContainerInner {
                parent: Some(self.clone()),
                ..ContainerInner::default()
            }),
        }
    }
}

fn erase<T: 'static>(build: impl Fn(&Container) -> Result<T> + 'static) -> Builder {
    Rc::new(move |c: &Container| build(c).map(|v| Rc::new(v) as Instance))
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.service_names())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
