pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::ReaderError;
pub use model::{LoadedTable, SourceFormat};
pub use registry::{read_table, read_with_reader, TableReader};

#[cfg(test)]
mod tests;
