mod common;
mod delimited;
mod json_lines;

pub use delimited::DelimitedParser;
pub use json_lines::JsonLinesParser;

pub(crate) use common::{
    collapse_whitespace, detect_delimiter, first_content_line, strip_trailing_commas,
};
