//! Explicit brew registration table.
//!
//! Every brew is listed once in a static catalog as an identity plus a
//! factory. [`Registry::discover`] instantiates the catalog: duplicates are
//! dropped, factories that fail (or panic) are skipped, and the survivors are
//! ordered by identity.

use crate::error::{panic_message, BrewError};
use crate::module::{Brew, Descriptor};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub type BrewFactory = Arc<dyn Fn() -> anyhow::Result<Box<dyn Brew>> + Send + Sync>;

// =============================================================================
// Registration
// =============================================================================

#[derive(Clone)]
pub struct Registration {
    identity: String,
    factory: BrewFactory,
}

impl Registration {
    pub fn new<F>(identity: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn Brew>> + Send + Sync + 'static,
    {
        Self {
            identity: identity.into(),
            factory: Arc::new(factory),
        }
    }

    /// Registration for a brew that is built with `Default`.
    pub fn of<B>(identity: impl Into<String>) -> Self
    where
        B: Brew + Default,
    {
        Self::new(identity, || Ok(Box::new(B::default()) as Box<dyn Brew>))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn instantiate(&self) -> Result<Box<dyn Brew>, BrewError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.factory)())) {
            Ok(Ok(brew)) => Ok(brew),
            Ok(Err(err)) => Err(BrewError::discovery_failure(&self.identity, format!("{err:#}"))),
            Err(payload) => Err(BrewError::discovery_failure(
                &self.identity,
                panic_message(payload.as_ref()),
            )),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Collects the `registration()` of every listed brew module.
///
/// ```ignore
/// registrations![patterns::factory, patterns::strategy]
/// ```
#[macro_export]
macro_rules! registrations {
    ($($($segment:ident)::+),* $(,)?) => {
        vec![$($($segment)::+::registration()),*]
    };
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone)]
pub struct BrewEntry {
    descriptor: Descriptor,
    brew: Arc<dyn Brew>,
}

impl BrewEntry {
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn identity(&self) -> &str {
        self.descriptor.identity()
    }

    pub fn brew(&self) -> &Arc<dyn Brew> {
        &self.brew
    }
}

impl fmt::Debug for BrewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BrewEntry").field(&self.descriptor).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<BrewEntry>,
}

impl Registry {
    pub fn discover<I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = Registration>,
    {
        let mut discovered: BTreeMap<String, BrewEntry> = BTreeMap::new();

        for registration in registrations {
            if discovered.contains_key(registration.identity()) {
                tracing::warn!(
                    identity = registration.identity(),
                    "duplicate brew registration ignored"
                );
                continue;
            }

            match registration.instantiate() {
                Ok(brew) => {
                    let description = brew.description().map(str::to_string);
                    let descriptor = Descriptor::new(registration.identity(), description);
                    discovered.insert(
                        registration.identity,
                        BrewEntry {
                            descriptor,
                            brew: Arc::from(brew),
                        },
                    );
                }
                Err(err) => tracing::debug!(error = %err, "skipping brew"),
            }
        }

        tracing::debug!(count = discovered.len(), "brews discovered");
        Self {
            entries: discovered.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by identity.
    pub fn entries(&self) -> &[BrewEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrewEntry> {
        self.entries.iter()
    }

    pub fn get(&self, identity: &str) -> Option<&BrewEntry> {
        self.entries
            .binary_search_by(|entry| entry.identity().cmp(identity))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn identities(&self) -> Vec<&str> {
        self.entries.iter().map(BrewEntry::identity).collect()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a BrewEntry;
    type IntoIter = std::slice::Iter<'a, BrewEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
