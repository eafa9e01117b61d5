pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{ParserAttempt, ParserError};
pub use model::{ParseOptions, ParsedTable, RawTable, RawValue};
pub use registry::{
    available_parsers, parse_table, parse_with_parsers, ParserDescriptor, TableParser,
};
