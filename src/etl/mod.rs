pub mod importers;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod upsert;
