//! CQRS: commands mutate a normalised write store, queries read a
//! denormalised read store that the command handlers keep in sync.

use crate::logging::Logger;
use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use crate::services::ServiceCollection;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

pub fn registration() -> Registration {
    Registration::of::<CqrsBrew>(module_path!())
}

// ===== Models =====

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub stock: i64,
    pub price_cents: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: u32,
    pub name: String,
    pub stock: i64,
    pub price_cents: u64,
    pub active: bool,
}

impl ProductSummary {
    pub fn stock_status(&self) -> &'static str {
        match self.stock {
            i64::MIN..=0 => "OUT_OF_STOCK",
            1..=10 => "LOW_STOCK",
            _ => "IN_STOCK",
        }
    }
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            stock: product.stock,
            price_cents: product.price_cents,
            active: product.active,
        }
    }
}

// ===== Stores =====

#[derive(Debug, Default)]
pub struct WriteStore {
    products: DashMap<u32, Product>,
}

impl WriteStore {
    pub fn add(&self, product: Product) {
        self.products.insert(product.id, product);
    }

    /// Applies `change` and returns the updated product.
    pub fn update(&self, id: u32, change: impl FnOnce(&mut Product)) -> Option<Product> {
        let mut product = self.products.get_mut(&id)?;
        change(product.value_mut());
        Some(product.clone())
    }
}

#[derive(Debug, Default)]
pub struct ReadStore {
    summaries: DashMap<u32, ProductSummary>,
}

impl ReadStore {
    pub fn sync(&self, product: &Product) {
        self.summaries.insert(product.id, product.into());
    }

    /// All summaries ordered by id.
    pub fn all(&self) -> Vec<ProductSummary> {
        let mut all: Vec<ProductSummary> = self.summaries.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|s| s.id);
        all
    }

    pub fn low_stock(&self, threshold: i64) -> Vec<ProductSummary> {
        self.all()
            .into_iter()
            .filter(|s| s.active && s.stock <= threshold)
            .collect()
    }
}

// ===== Commands and queries =====

#[derive(Debug, Clone)]
pub enum Command {
    AddProduct {
        id: u32,
        name: &'static str,
        stock: i64,
        price_cents: u64,
    },
    UpdateStock {
        id: u32,
        change: i64,
    },
    Discontinue {
        id: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum Query {
    Summaries,
    LowStock { threshold: i64 },
}

pub struct Mediator {
    writes: Arc<WriteStore>,
    reads: Arc<ReadStore>,
    log: Logger,
}

impl Mediator {
    pub fn new(writes: Arc<WriteStore>, reads: Arc<ReadStore>, log: Logger) -> Self {
        Self { writes, reads, log }
    }

    pub fn dispatch(&self, command: Command) -> anyhow::Result<()> {
        let updated = match command {
            Command::AddProduct {
                id,
                name,
                stock,
                price_cents,
            } => {
                self.log.info(format!("[COMMAND] Adding product: {name} (ID: {id})"));
                let product = Product {
                    id,
                    name: name.to_string(),
                    stock,
                    price_cents,
                    active: true,
                };
                self.writes.add(product.clone());
                Some(product)
            }
            Command::UpdateStock { id, change } => {
                self.log.info(format!("[COMMAND] Updating stock for product {id}: {change:+}"));
                self.writes.update(id, |p| p.stock += change)
            }
            Command::Discontinue { id } => {
                self.log.info(format!("[COMMAND] Discontinuing product {id}"));
                self.writes.update(id, |p| p.active = false)
            }
        };

        let product = updated.ok_or_else(|| anyhow::anyhow!("unknown product in {command:?}"))?;
        self.reads.sync(&product);
        Ok(())
    }

    pub fn ask(&self, query: Query) -> Vec<ProductSummary> {
        let found = match query {
            Query::Summaries => self.reads.all(),
            Query::LowStock { threshold } => self.reads.low_stock(threshold),
        };
        self.log.info(format!("[QUERY] {query:?} returned {} product(s)", found.len()));
        found
    }
}

// ===== Brew =====

#[derive(Default)]
pub struct CqrsBrew;

#[async_trait]
impl Brew for CqrsBrew {
    fn description(&self) -> Option<&str> {
        Some("CQRS: separate write and read models behind a small mediator")
    }

    fn configure_services(&self, services: &mut ServiceCollection) {
        services
            .add_singleton(|_| Ok(WriteStore::default()))
            .add_singleton(|_| Ok(ReadStore::default()))
            .add_singleton(|provider| {
                Ok(Mediator::new(
                    provider.try_resolve::<WriteStore>()?,
                    provider.try_resolve::<ReadStore>()?,
                    provider.try_resolve::<Logger>()?.scoped("mediator"),
                ))
            });
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        let mediator = ctx.resolve::<Mediator>()?;

        log.info("--- Commands (writes) ---");
        let commands = [
            Command::AddProduct { id: 1, name: "Laptop", stock: 10, price_cents: 99_999 },
            Command::AddProduct { id: 2, name: "Mouse", stock: 50, price_cents: 2_999 },
            Command::AddProduct { id: 3, name: "Keyboard", stock: 5, price_cents: 7_999 },
            Command::UpdateStock { id: 1, change: -3 },
            Command::UpdateStock { id: 2, change: 25 },
            Command::Discontinue { id: 3 },
        ];
        for command in commands {
            ctx.checkpoint()?;
            mediator.dispatch(command)?;
        }

        log.info("--- Queries (reads) ---");
        for product in mediator.ask(Query::Summaries) {
            log.info(format!(
                "  [{}] {} - Stock: {} ({}), Active: {}",
                product.id,
                product.name,
                product.stock,
                product.stock_status(),
                product.active
            ));
        }
        for product in mediator.ask(Query::LowStock { threshold: 10 }) {
            log.info(format!("  [{}] {} - Stock: {} (NEEDS REORDER)", product.id, product.name, product.stock));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mediator() -> Mediator {
        Mediator::new(
            Arc::new(WriteStore::default()),
            Arc::new(ReadStore::default()),
            Logger::new("cqrs-test"),
        )
    }

    fn add(id: u32, name: &'static str, stock: i64) -> Command {
        Command::AddProduct {
            id,
            name,
            stock,
            price_cents: 100,
        }
    }

    #[test]
    fn test_commands_are_visible_to_queries() {
        let m = mediator();
        m.dispatch(add(2, "Mouse", 50)).unwrap();
        m.dispatch(add(1, "Laptop", 10)).unwrap();
        m.dispatch(Command::UpdateStock { id: 1, change: -3 }).unwrap();

        let all = m.ask(Query::Summaries);
        assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(all[0].stock, 7);
        assert_eq!(all[0].stock_status(), "LOW_STOCK");
        assert_eq!(all[1].stock_status(), "IN_STOCK");
    }

    #[test]
    fn test_low_stock_skips_discontinued() {
        let m = mediator();
        m.dispatch(add(1, "Laptop", 7)).unwrap();
        m.dispatch(add(3, "Keyboard", 5)).unwrap();
        m.dispatch(Command::Discontinue { id: 3 }).unwrap();

        let low = m.ask(Query::LowStock { threshold: 10 });
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Laptop");
    }

    #[test]
    fn test_unknown_product_is_an_error() {
        let m = mediator();
        assert!(m.dispatch(Command::Discontinue { id: 42 }).is_err());
        assert!(m.ask(Query::Summaries).is_empty());
    }

    #[test]
    fn test_mediator_logs_under_brew_identity() {
        let mut services = ServiceCollection::new();
        CqrsBrew.configure_services(&mut services);
        services.add_instance(Logger::new("brew::features::cqrs::simple"));

        let mediator = services.build().resolve::<Mediator>().unwrap();
        assert_eq!(mediator.log.brew(), "brew::features::cqrs::simple/mediator");
    }

    #[test]
    fn test_stock_status_thresholds() {
        let mut summary = ProductSummary::from(&Product {
            id: 1,
            name: "x".into(),
            stock: 0,
            price_cents: 1,
            active: true,
        });
        assert_eq!(summary.stock_status(), "OUT_OF_STOCK");
        summary.stock = 11;
        assert_eq!(summary.stock_status(), "IN_STOCK");
    }
}
