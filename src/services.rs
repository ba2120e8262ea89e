//! Per-brew dependency container.
//!
//! A brew registers its collaborators in [`Brew::configure_services`]; the
//! runner builds a fresh [`ServiceProvider`] from those registrations for
//! every invocation, so nothing one brew registers is visible to another.
//!
//! [`Brew::configure_services`]: crate::module::Brew::configure_services

use crate::error::{BrewError, BrewResult};
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceProvider) -> anyhow::Result<Instance> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance per provider, created on first resolve.
    Singleton,
    /// A new instance on every resolve.
    Transient,
}

#[derive(Clone)]
struct Registration {
    lifetime: Lifetime,
    type_name: &'static str,
    factory: Factory,
}

// =============================================================================
// Registration
// =============================================================================

#[derive(Default)]
pub struct ServiceCollection {
    registrations: HashMap<TypeId, Registration>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register::<T, F>(Lifetime::Singleton, factory)
    }

    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register::<T, F>(Lifetime::Transient, factory)
    }

    /// Registers an already-built value as a singleton.
    pub fn add_instance<T>(&mut self, value: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        let instance: Instance = Arc::new(value);
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                lifetime: Lifetime::Singleton,
                type_name: type_name::<T>(),
                factory: Arc::new(move |_| Ok(Arc::clone(&instance))),
            },
        );
        self
    }

    fn register<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        // Re-registering a type replaces the earlier registration.
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                lifetime,
                type_name: type_name::<T>(),
                factory: Arc::new(move |provider| {
                    let value = factory(provider)?;
                    Ok(Arc::new(value) as Instance)
                }),
            },
        );
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn build(self) -> ServiceProvider {
        ServiceProvider {
            registrations: self.registrations,
            singletons: DashMap::new(),
        }
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.registrations.values().map(|r| (r.type_name, r.lifetime)))
            .finish()
    }
}

// =============================================================================
// Resolution
// =============================================================================

pub struct ServiceProvider {
    registrations: HashMap<TypeId, Registration>,
    singletons: DashMap<TypeId, Instance>,
}

impl ServiceProvider {
    pub fn empty() -> Self {
        ServiceCollection::new().build()
    }

    pub fn resolve<T>(&self) -> BrewResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.try_resolve::<T>()
            .map_err(|err| match err.downcast::<BrewError>() {
                Ok(brew_err) => brew_err,
                Err(other) => BrewError::module_failure(type_name::<T>(), format!("{other:#}")),
            })
    }

    /// Like [`resolve`](Self::resolve) but keeps the factory's error chain.
    pub fn try_resolve<T>(&self) -> anyhow::Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        let registration = self
            .registrations
            .get(&id)
            .ok_or(BrewError::ServiceNotRegistered {
                type_name: type_name::<T>(),
            })?;

        let instance = match registration.lifetime {
            Lifetime::Transient => (registration.factory)(self)?,
            Lifetime::Singleton => {
                let cached = self.singletons.get(&id).map(|entry| Arc::clone(entry.value()));
                match cached {
                    Some(existing) => existing,
                    None => {
                        // The factory may resolve other services, so it must run
                        // without holding a map guard. First insert wins a race.
                        let created = (registration.factory)(self)?;
                        Arc::clone(self.singletons.entry(id).or_insert(created).value())
                    }
                }
            }
        };

        instance.downcast::<T>().map_err(|_| {
            anyhow::anyhow!("service registered for {} has the wrong type", registration.type_name)
        })
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.registrations.len())
            .field("singletons", &self.singletons.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Engine {
        horsepower: u32,
    }

    struct Car {
        engine: Arc<Engine>,
    }

    #[test]
    fn test_singleton_is_created_once() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);

        let mut services = ServiceCollection::new();
        services.add_singleton(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Engine { horsepower: 300 })
        });
        let provider = services.build();

        let first = provider.resolve::<Engine>().unwrap();
        let second = provider.resolve::<Engine>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_is_created_every_time() {
        let mut services = ServiceCollection::new();
        services.add_transient(|_| Ok(Engine { horsepower: 120 }));
        let provider = services.build();

        let first = provider.resolve::<Engine>().unwrap();
        let second = provider.resolve::<Engine>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.horsepower, 120);
    }

    #[test]
    fn test_factories_resolve_their_dependencies() {
        let mut services = ServiceCollection::new();
        services
            .add_instance(Engine { horsepower: 500 })
            .add_transient(|provider| {
                Ok(Car {
                    engine: provider.resolve::<Engine>()?,
                })
            });
        let provider = services.build();

        let car = provider.resolve::<Car>().unwrap();
        assert_eq!(car.engine.horsepower, 500);
        let engine = provider.resolve::<Engine>().unwrap();
        assert!(Arc::ptr_eq(&car.engine, &engine));
    }

    #[test]
    fn test_unregistered_type_reports_its_name() {
        let provider = ServiceProvider::empty();
        match provider.resolve::<Engine>() {
            Err(BrewError::ServiceNotRegistered { type_name }) => {
                assert!(type_name.ends_with("Engine"))
            }
            other => panic!("expected ServiceNotRegistered, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_dependency_surfaces_through_factory() {
        let mut services = ServiceCollection::new();
        services.add_transient(|provider| {
            Ok(Car {
                engine: provider.resolve::<Engine>()?,
            })
        });
        let provider = services.build();

        assert!(matches!(
            provider.resolve::<Car>(),
            Err(BrewError::ServiceNotRegistered { .. })
        ));
    }

    #[test]
    fn test_failing_factory_becomes_module_failure() {
        let mut services = ServiceCollection::new();
        services.add_singleton::<Engine, _>(|_| anyhow::bail!("engine on fire"));
        let provider = services.build();

        match provider.resolve::<Engine>() {
            Err(BrewError::ModuleFailure { message, .. }) => assert!(message.contains("engine on fire")),
            other => panic!("expected ModuleFailure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let mut services = ServiceCollection::new();
        services
            .add_instance(Engine { horsepower: 1 })
            .add_instance(Engine { horsepower: 2 });
        assert_eq!(services.len(), 1);
        assert_eq!(services.build().resolve::<Engine>().unwrap().horsepower, 2);
    }

    #[test]
    fn test_providers_do_not_share_singletons() {
        let register = || {
            let mut services = ServiceCollection::new();
            services.add_singleton(|_| Ok(Engine { horsepower: 10 }));
            services.build()
        };
        let a = register();
        let b = register();
        assert!(!Arc::ptr_eq(
            &a.resolve::<Engine>().unwrap(),
            &b.resolve::<Engine>().unwrap()
        ));
    }
}
