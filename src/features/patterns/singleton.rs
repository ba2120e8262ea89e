//! Singleton pattern: plain constructors hand out a new `Person` every time,
//! while the process-wide instance is created lazily exactly once.

use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub fn registration() -> Registration {
    Registration::of::<SingletonBrew>(module_path!())
}

static SINGLETON_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

lazy_static::lazy_static! {
    static ref THE_PERSON: Person = {
        SINGLETON_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        Person::new()
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    id: Uuid,
    created_at: SystemTime,
}

impl Person {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: SystemTime::now(),
        }
    }

    /// The one shared instance.
    pub fn instance() -> &'static Person {
        &THE_PERSON
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn speak(&self) -> String {
        let age = self.created_at.elapsed().unwrap_or_default();
        format!("Hello! My ID is {}, created {} ms ago", self.id, age.as_millis())
    }
}

impl Default for Person {
    fn default() -> Self {
        Self::new()
    }
}

/// How many times the shared instance has been built (0 or 1).
pub fn singleton_constructions() -> usize {
    SINGLETON_CONSTRUCTIONS.load(Ordering::SeqCst)
}

#[derive(Default)]
pub struct SingletonBrew;

#[async_trait]
impl Brew for SingletonBrew {
    fn description(&self) -> Option<&str> {
        Some("Singleton pattern: one lazily created instance for the whole process")
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();

        log.info("--- BEFORE: regular constructor ---");
        for _ in 0..3 {
            ctx.sleep(Duration::from_millis(10)).await?;
            log.info(format!("[Person] {}", Person::new().speak()));
        }
        log.info("Each Person has a different ID");

        log.info("--- AFTER: shared instance ---");
        let mut shared = Vec::new();
        for _ in 0..3 {
            let person = Person::instance();
            log.info(format!("[SingletonPerson] {}", person.speak()));
            shared.push(person);
            ctx.sleep(Duration::from_millis(10)).await?;
        }

        let same = shared.windows(2).all(|pair| std::ptr::eq(pair[0], pair[1]));
        log.info(format!("All references point to the same instance: {same}"));
        log.info(format!("Shared instance constructed {} time(s)", singleton_constructions()));
        Ok(())
    }
}
