//! Core data types and I/O operations.

pub mod loaders;
pub mod table;
pub mod transforms;
pub mod writers;

pub use loaders::{load_table, LoaderError};
pub use table::{Cell, SubsetCollection, SubsetKey, Table, TableError};
pub use writers::{write_subsets, write_table_csv, SaveReport, WriteError};
