#[doc(hidden)]
pub mod bson_helper;
mod exporter;
#[doc(hidden)]
pub mod index_helper;
#[doc(hidden)]
pub mod progress;
#[doc(hidden)]
pub mod record;
mod seeder;
mod supplement;
#[doc(hidden)]
pub mod time_helper;

pub use exporter::{CollectionExport, ExportReport, ExportSummary, Exporter};
pub use seeder::{FixtureLayout, SeedOptions, SeedSummary, Seeder};
pub use supplement::{ClassMembership, SupplementImporter, SupplementSummary};
