mod schema;
mod view;
mod workbook;
pub mod xlsx;

pub use schema::{ColumnKind, ColumnSchema, CANONICAL_COLUMNS};
pub use view::TableView;
pub use workbook::{parse_date_applied, SpreadsheetStore, StoreOptions};
