const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Returns the first line that is not blank, if any.
pub(crate) fn first_content_line(content: &str) -> Option<&str> {
    content.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Picks the candidate delimiter that splits the header line into the most fields.
pub(crate) fn detect_delimiter(header: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .max_by_key(|delimiter| header.bytes().filter(|b| b == delimiter).count())
        .filter(|delimiter| header.bytes().any(|b| b == *delimiter))
        .unwrap_or(b',')
}

/// Rewrites a whitespace-aligned table so that every run of spaces or tabs becomes one tab.
pub(crate) fn collapse_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}

/// Drops commas that directly precede a closing `}` or `]`, or end the line, outside of string
/// literals.
pub(crate) fn strip_trailing_commas(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = chars[idx + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, None | Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
