use once_cell::sync::Lazy;

use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{DelimitedParser, JsonLinesParser};
use crate::model::{ParseOptions, ParsedTable};

pub trait TableParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedTable, ParserError>;
}

#[derive(Debug, Clone)]
pub struct ParserDescriptor {
    pub code: &'static str,
    pub description: &'static str,
}

static PARSERS: Lazy<Vec<ParserDescriptor>> = Lazy::new(|| {
    vec![
        ParserDescriptor {
            code: JsonLinesParser::NAME,
            description: "One JSON object per line, as written by station loggers",
        },
        ParserDescriptor {
            code: DelimitedParser::NAME,
            description: "Comma, tab, semicolon or whitespace-aligned tables with a header line",
        },
    ]
});

pub fn available_parsers() -> &'static [ParserDescriptor] {
    PARSERS.as_slice()
}

/// Tries each known format in turn and applies the configured column renames.
pub fn parse_table(content: &str, options: &ParseOptions) -> Result<ParsedTable, ParserError> {
    let json_lines = JsonLinesParser;
    let delimited = DelimitedParser::new(options.clone());
    let parsers: [&dyn TableParser; 2] = [&json_lines, &delimited];
    let mut parsed = parse_with_parsers(content, &parsers)?;

    for (from, to) in &options.rename_columns {
        parsed.table.rename_column(from, to);
    }

    Ok(parsed)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn TableParser],
) -> Result<ParsedTable, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
