pub mod chain_of_responsibility;
pub mod factory;
pub mod singleton;
pub mod strategy;
