/// provide mongo fixture blocking apis.
mod connection;
#[doc(hidden)]
pub mod fixture;
mod interrupt;

pub use connection::Connection;
pub use fixture::{Exporter, FixtureLayout, SeedOptions, Seeder, SupplementImporter};
pub use interrupt::Interrupt;
