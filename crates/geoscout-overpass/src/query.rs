//! Overpass QL compilation.
//!
//! [`compile`] turns a [`SearchFilter`] into a query string. The output is
//! plain text; URL encoding is left to the transport.

use std::time::Duration;

use crate::{Result, SearchFilter, TRACING_TARGET_QUERY};

/// Element types searched by every query, in emission order.
const ELEMENT_TYPES: [&str; 3] = ["node", "way", "relation"];

/// Characters with special meaning in an Overpass regular expression.
const REGEX_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Compiles a filter into an Overpass QL query.
///
/// # Errors
///
/// Returns [`Error::InvalidFilter`] when neither a name pattern nor tags are
/// set, or when the filter is otherwise unusable.
///
/// [`Error::InvalidFilter`]: crate::Error::InvalidFilter
pub fn compile(filter: &SearchFilter) -> Result<String> {
    compile_with(filter, None)
}

/// Compiles a filter, optionally adding a `[timeout:N]` server setting.
pub fn compile_with(filter: &SearchFilter, server_timeout: Option<Duration>) -> Result<String> {
    filter.validate()?;

    let combined = combined_filter(filter);
    let scope = filter
        .bbox()
        .map(|bbox| format!("({bbox})"))
        .unwrap_or_default();

    if filter.bbox().is_none() {
        tracing::warn!(
            target: TRACING_TARGET_QUERY,
            filter = %combined,
            "Compiling unscoped global query"
        );
    }

    let mut query = String::from("[out:json]");
    if let Some(timeout) = server_timeout.filter(|t| !t.is_zero()) {
        query.push_str(&format!("[timeout:{}]", timeout.as_secs().max(1)));
    }
    query.push_str(";\n(\n");
    for element in ELEMENT_TYPES {
        query.push_str(&format!("  {element}{scope}{combined};\n"));
    }
    query.push_str(");\nout center;");

    tracing::debug!(target: TRACING_TARGET_QUERY, query = %query, "Compiled Overpass query");
    Ok(query)
}

/// Builds the tag clauses followed by the name clause.
fn combined_filter(filter: &SearchFilter) -> String {
    let mut combined = String::new();

    for tag in filter.tags() {
        let key = escape_string(&tag.key);
        let clause = if tag.is_wildcard() {
            format!("[\"{key}\"]")
        } else {
            format!("[\"{key}\"=\"{}\"]", escape_string(&tag.value))
        };
        combined.push_str(&clause);
    }

    if let Some(name) = filter.name_pattern() {
        let escaped = escape_quotes(&escape_regex(name));
        combined.push_str(&format!("[\"name\"~\"{escaped}\",i]"));
    }

    combined
}

/// Escapes regular expression metacharacters so they match literally.
pub fn escape_regex(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if REGEX_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes backslashes and double quotes so a value cannot terminate its
/// string literal.
fn escape_string(value: &str) -> String {
    escape_quotes(&value.replace('\\', "\\\\"))
}

/// Escapes double quotes only; regex patterns already carry escaped
/// backslashes.
fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use geoscout_core::BoundingBox;

    use super::*;
    use crate::Error;

    fn sf_bbox() -> BoundingBox {
        BoundingBox::new(37.7, -122.6, 37.85, -122.3)
    }

    #[test]
    fn rejects_filter_without_name_or_tags() {
        let err = compile(&SearchFilter::new().with_bbox(sf_bbox())).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn exact_tag_clause_for_every_element_type() {
        let filter = SearchFilter::new().with_tag("leisure", "marina");
        let query = compile(&filter).unwrap();

        for element in ELEMENT_TYPES {
            assert!(query.contains(&format!("  {element}[\"leisure\"=\"marina\"];")));
        }
    }

    #[test]
    fn wildcard_tag_is_presence_only() {
        let filter = SearchFilter::new().with_tag("amenity", "*");
        let query = compile(&filter).unwrap();

        assert_eq!(query.matches("[\"amenity\"];").count(), 3);
        assert!(!query.contains("\"amenity\"="));
    }

    #[test]
    fn name_pattern_escapes_parentheses() {
        let filter = SearchFilter::new().with_name("Golden Gate (Bridge)");
        let query = compile(&filter).unwrap();

        assert!(query.contains(r#"["name"~"Golden Gate \(Bridge\)",i]"#));
    }

    #[test]
    fn escapes_every_metacharacter() {
        assert_eq!(
            escape_regex(r".*+?^${}()|[]\"),
            r"\.\*\+\?\^\$\{\}\(\)\|\[\]\\"
        );
        assert_eq!(escape_regex("Pier 39"), "Pier 39");
    }

    #[test]
    fn tag_clauses_precede_name_clause() {
        let filter = SearchFilter::new()
            .with_name("marina")
            .with_tag("leisure", "marina")
            .with_tag("access", "*");
        let query = compile(&filter).unwrap();

        assert!(query.contains(r#"node["leisure"="marina"]["access"]["name"~"marina",i];"#));
    }

    #[test]
    fn bbox_scopes_each_statement() {
        let filter = SearchFilter::new()
            .with_tag("aeroway", "aerodrome")
            .with_bbox(sf_bbox());
        let query = compile(&filter).unwrap();

        assert_eq!(
            query,
            "[out:json];\n(\n  node(37.7,-122.6,37.85,-122.3)[\"aeroway\"=\"aerodrome\"];\n  way(37.7,-122.6,37.85,-122.3)[\"aeroway\"=\"aerodrome\"];\n  relation(37.7,-122.6,37.85,-122.3)[\"aeroway\"=\"aerodrome\"];\n);\nout center;"
        );
    }

    #[test]
    fn server_timeout_is_added_to_header() {
        let filter = SearchFilter::new().with_tag("leisure", "park");
        let query = compile_with(&filter, Some(Duration::from_secs(25))).unwrap();
        assert!(query.starts_with("[out:json][timeout:25];"));
    }

    #[test]
    fn quotes_cannot_break_out_of_values() {
        let filter = SearchFilter::new().with_tag("name", "a\"]; out;");
        let query = compile(&filter).unwrap();
        assert!(query.contains(r#"["name"="a\"]; out;"]"#));
    }

    #[test]
    fn trailing_backslash_cannot_escape_closing_quote() {
        let filter = SearchFilter::new()
            .with_tag("name", "x\\")
            .with_tag("leisure", "marina");
        let query = compile(&filter).unwrap();
        assert!(query.contains(r#"relation["name"="x\\"]["leisure"="marina"];"#));
    }

    #[test]
    fn name_with_backslash_and_quote_stays_in_literal() {
        let filter = SearchFilter::new().with_name("a\\\"b");
        let query = compile(&filter).unwrap();
        assert!(query.contains(r#"["name"~"a\\\"b",i]"#));
    }
}
