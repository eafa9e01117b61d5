use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::errors::ParserError;
use crate::model::{ParsedTable, RawTable, RawValue};
use crate::registry::TableParser;

use super::{first_content_line, strip_trailing_commas};

/// Parses logger output with one JSON object per line. Lines that are not objects are skipped.
pub struct JsonLinesParser;

impl Default for JsonLinesParser {
    fn default() -> Self {
        Self
    }
}

impl JsonLinesParser {
    pub const NAME: &'static str = "JSON_LINES";

    fn parse_line(line: &str) -> Option<Map<String, Value>> {
        let cleaned = strip_trailing_commas(line);
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    fn to_raw(value: &Value) -> RawValue {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(flag) => RawValue::Number(if *flag { 1.0 } else { 0.0 }),
            Value::Number(number) => number.as_f64().map_or(RawValue::Null, RawValue::Number),
            Value::String(text) => RawValue::from_cell(text),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl TableParser for JsonLinesParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedTable, ParserError> {
        let first = first_content_line(content).ok_or_else(|| ParserError::FormatMismatch {
            parser: Self::NAME,
            reason: "file is empty".to_string(),
        })?;
        if !first.starts_with('{') {
            return Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "first line is not a JSON object".to_string(),
            });
        }

        let mut objects = Vec::new();
        let mut skipped = 0usize;
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let Some(object) = Self::parse_line(line) else {
                skipped += 1;
                continue;
            };
            for key in object.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
            objects.push(object);
        }

        if objects.is_empty() {
            return Err(ParserError::NoObjects {
                parser: Self::NAME,
                skipped_lines: skipped,
            });
        }

        let mut table = RawTable::new(columns.clone());
        for object in &objects {
            let row = columns
                .iter()
                .map(|column| object.get(column).map_or(RawValue::Null, Self::to_raw))
                .collect();
            table.push_row(row)?;
        }

        Ok(ParsedTable::new(content, Self::NAME, table, skipped))
    }
}
