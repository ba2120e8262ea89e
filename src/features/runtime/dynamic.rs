//! Runtime-shaped objects: members are added, retyped and invoked by name,
//! and every lookup is checked at runtime instead of by the compiler.

use crate::logging::Logger;
use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use crate::services::ServiceCollection;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub fn registration() -> Registration {
    Registration::of::<DynamicBrew>(module_path!())
}

type Method = Box<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Property bag with callable members.
#[derive(Default)]
pub struct Expando {
    fields: Map<String, Value>,
    methods: HashMap<String, Method>,
}

impl Expando {
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> anyhow::Result<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("'{name}' is not a member of this object"))
    }

    pub fn define<F>(&mut self, name: &str, method: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Box::new(method));
        self
    }

    pub fn call(&self, name: &str, args: &[Value]) -> anyhow::Result<Value> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("'{name}' is not a method of this object"))?;
        Ok(method(args))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

static NULL: Value = Value::Null;

/// Missing members read as `null` instead of failing.
#[derive(Debug, Default)]
pub struct SmartDictionary {
    data: Map<String, Value>,
}

impl SmartDictionary {
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.data.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> &Value {
        self.data.get(name).unwrap_or(&NULL)
    }
}

#[derive(Debug, serde::Serialize)]
struct StaticPerson {
    name: String,
    age: u32,
}

pub struct DynamicDemo {
    log: Logger,
}

impl DynamicDemo {
    fn expando(&self) -> anyhow::Result<()> {
        let log = &self.log;
        log.info("--- Expando (runtime member addition) ---");

        let mut duck = Expando::default();
        duck.set("name", "Duck").set("type", "Bird");
        log.info(format!("Created: {}", duck.to_json()));

        duck.define("quack", |_| json!("Quack quack!"));
        log.info(format!("quack() -> {}", duck.call("quack", &[])?));

        duck.set("number", 42);
        log.info(format!("number (integer): {}", duck.get("number")?));
        duck.set("number", 2.5);
        log.info(format!("number (float): {}", duck.get("number")?));

        duck.define("ask_permission", |args| {
            let granted = rand::thread_rng().gen_bool(0.5);
            json!({ "question": args.first().cloned().unwrap_or(Value::Null), "granted": granted })
        });
        log.info(format!(
            "ask_permission -> {}",
            duck.call("ask_permission", &[json!("May I proceed?")])?
        ));

        match duck.get("wings") {
            Ok(value) => log.info(format!("wings: {value}")),
            Err(err) => log.warn(format!("Runtime lookup failed: {err}")),
        }
        Ok(())
    }

    fn static_vs_dynamic(&self) -> anyhow::Result<()> {
        let log = &self.log;
        log.info("--- Static vs dynamic ---");

        let alice = StaticPerson {
            name: "Alice".into(),
            age: 30,
        };
        log.info(format!("[STATIC] {} is {} years old", alice.name, alice.age));

        let mut bob = serde_json::to_value(&alice)?;
        bob["name"] = json!("Bob");
        bob["age"] = json!(25);
        bob["favourite_colour"] = json!("Blue");
        log.info(format!("[DYNAMIC] {bob}"));
        Ok(())
    }

    fn smart_dictionary(&self) {
        let log = &self.log;
        log.info("--- Smart dictionary (defaults on missing members) ---");

        let mut dict = SmartDictionary::default();
        dict.set("foo", "Bar");
        dict.set("count", 42);
        for key in ["foo", "count", "missing"] {
            log.info(format!("dict.{key}: {}", dict.get(key)));
        }
    }
}

#[derive(Default)]
pub struct DynamicBrew;

#[async_trait]
impl Brew for DynamicBrew {
    fn description(&self) -> Option<&str> {
        Some("Dynamic runtime: property bags and members resolved by name")
    }

    fn configure_services(&self, services: &mut ServiceCollection) {
        services.add_singleton(|provider| {
            Ok(DynamicDemo {
                log: provider.try_resolve::<Logger>()?.scoped("demo"),
            })
        });
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let demo = ctx.resolve::<DynamicDemo>()?;
        demo.expando()?;
        ctx.checkpoint()?;
        demo.static_vs_dynamic()?;
        ctx.checkpoint()?;
        demo.smart_dictionary();
        Ok(())
    }
}
