mod loader;

pub mod extractors;

pub use loader::{display_name, DocumentLoader, FileLoader};
