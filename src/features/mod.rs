//! The brews shipped with the host.
//!
//! Each brew lives in its own module and exposes a `registration()`; its
//! identity is the module path, e.g. `brew::features::patterns::factory`.

pub mod cqrs;
pub mod di;
pub mod io;
pub mod patterns;
pub mod runtime;
pub mod solid;

use crate::registrations;
use crate::registry::Registration;

/// Every compiled-in brew, in no particular order.
pub fn catalog() -> Vec<Registration> {
    registrations![
        cqrs::simple,
        di::poor_mans_di,
        io::message_bus,
        patterns::chain_of_responsibility,
        patterns::factory,
        patterns::singleton,
        patterns::strategy,
        runtime::dynamic,
        solid::liskov_substitution,
    ]
}
