//! Free-form text to candidate avatar ids.
//!
//! Accepted line shapes, checked in this order:
//!
//! 1. comma-delimited rows (`avtr_..,Name,Author`), first field only;
//! 2. links with an `avatar/` or `avatars/` path segment;
//! 3. bare ids.
//!
//! ```
//! use avatar_catalog::parser::InputParser;
//!
//! let ids = InputParser::default().parse(
//!     "\"avtr_0a-1\",Name\nhttps://vrchat.com/home/avatar/avtr_ff\nnoise\navtr_0a-1",
//! );
//! assert_eq!(ids, ["avtr_0a-1", "avtr_ff", "avtr_0a-1"]);
//! ```

use regex::Regex;

/// Default literal prefix of a remote avatar id.
pub const DEFAULT_ID_PREFIX: &str = "avtr_";

/// Lexical grammar of an avatar id: a literal prefix followed by one or more
/// lowercase hex digits or hyphens.
#[derive(Debug, Clone)]
pub struct IdPattern {
    prefix: String,
    exact: Regex,
    embedded: Regex,
}

impl IdPattern {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let body = format!("{}[0-9a-f-]+", regex::escape(prefix));
        Ok(Self {
            prefix: prefix.to_string(),
            exact: Regex::new(&format!("^{body}$"))?,
            // The id must run to the end of its path segment.
            embedded: Regex::new(&format!("avatars?/({body})(?:[^0-9A-Za-z_-]|$)"))?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_valid(&self, candidate: &str) -> bool {
        self.exact.is_match(candidate)
    }

    fn find_in_url<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.embedded
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

impl Default for IdPattern {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX).expect("default id pattern compiles")
    }
}

/// Splits pasted text into candidate ids.
///
/// Output keeps input order and repeats; whether an id is already known is
/// decided later against the catalog.
#[derive(Debug, Clone, Default)]
pub struct InputParser {
    pattern: IdPattern,
}

impl InputParser {
    pub fn new(pattern: IdPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &IdPattern {
        &self.pattern
    }

    pub fn parse(&self, text: &str) -> Vec<String> {
        text.split(['\n', '\r'])
            .filter_map(|line| self.classify_line(line))
            .collect()
    }

    fn classify_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.contains(',') {
            let field = strip_quotes(first_csv_field(trimmed));
            return self.pattern.is_valid(field).then(|| field.to_string());
        }

        if let Some(id) = self.pattern.find_in_url(trimmed) {
            return Some(id.to_string());
        }

        self.pattern
            .is_valid(trimmed)
            .then(|| trimmed.to_string())
    }
}

/// Text before the first comma that is not inside double quotes.
fn first_csv_field(line: &str) -> &str {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return &line[..idx],
            _ => {}
        }
    }
    line
}

fn strip_quotes(field: &str) -> &str {
    let field = field.trim();
    let field = field.strip_prefix(['"', '\'']).unwrap_or(field);
    let field = field.strip_suffix(['"', '\'']).unwrap_or(field);
    field.trim()
}
