//! Path expression parsing
//!
//! Path expressions address values inside a configuration tree.
//!
//! # Path Syntax
//!
//! - Dot-separated keys: `interface.GigabitEthernet.description`
//! - Numeric keys index into arrays: `rule.0.action`
//! - `-1` appends to an array when writing: `rule.-1`
//! - Array filters select the first element whose field matches:
//!   `rule.#(id=="10").action`
//! - A backslash escapes the next character, so `a\.b` is the single key `a.b`
//!
//! # Examples
//!
//! ```
//! use confsync_value::path::{parse_path, PathSegment};
//!
//! let path = parse_path(r#"rule.#(id=="10").action"#).unwrap();
//! assert_eq!(path, vec![
//!     PathSegment::Key("rule".to_string()),
//!     PathSegment::Filter { field: "id".to_string(), value: "10".to_string() },
//!     PathSegment::Key("action".to_string()),
//! ]);
//! ```

use crate::error::{Error, Result};

/// A segment of a path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object key, or an array index when the key is numeric
    Key(String),
    /// Select the first array element whose `field` renders as `value`
    Filter { field: String, value: String },
}

impl PathSegment {
    /// Numeric index form of a key segment, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(key) => key.parse().ok(),
            PathSegment::Filter { .. } => None,
        }
    }

    /// Whether the segment is the `-1` append marker.
    pub fn is_append(&self) -> bool {
        matches!(self, PathSegment::Key(key) if key == "-1")
    }
}

/// Parse a path expression into segments.
///
/// Empty segments (`a..b`) are skipped.
pub fn parse_path(expr: &str) -> Result<Vec<PathSegment>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = expr.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(Error::invalid_path(expr, "dangling escape")),
            },
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '#' if current.is_empty() && chars.peek() == Some(&'(') => {
                chars.next();
                let mut body = String::new();
                let mut in_quotes = false;
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' if in_quotes => {
                            body.push(ch);
                            if let Some(escaped) = chars.next() {
                                body.push(escaped);
                            }
                        }
                        '"' => {
                            in_quotes = !in_quotes;
                            body.push(ch);
                        }
                        ')' if !in_quotes => {
                            closed = true;
                            break;
                        }
                        _ => body.push(ch),
                    }
                }
                if !closed {
                    return Err(Error::invalid_path(expr, "unterminated filter"));
                }
                segments.push(parse_filter(expr, &body)?);
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    Ok(segments)
}

fn parse_filter(expr: &str, body: &str) -> Result<PathSegment> {
    let (field, value) = body
        .split_once("==")
        .ok_or_else(|| Error::invalid_path(expr, "filter must have the form field==\"value\""))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(Error::invalid_path(expr, "filter field is empty"));
    }

    let value = value.trim();
    let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(quoted) => unescape_quoted(quoted),
        None => value.to_string(),
    };

    Ok(PathSegment::Filter {
        field: field.to_string(),
        value,
    })
}

fn unescape_quoted(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Escape a single key so it is read back as one segment.
///
/// ```
/// use confsync_value::path::escape_key;
/// assert_eq!(escape_key("ip.address"), r"ip\.address");
/// ```
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if matches!(ch, '.' | '\\' | '#') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Convert a `/`-delimited leaf name into a path expression.
///
/// Leaf names use `/` to encode nested containers (`ip/address/primary`);
/// literal dots inside a segment are escaped.
///
/// ```
/// use confsync_value::path::slash_to_dotted;
/// assert_eq!(slash_to_dotted("ip/address/primary"), "ip.address.primary");
/// assert_eq!(slash_to_dotted("ios:ip.v4"), r"ios:ip\.v4");
/// ```
pub fn slash_to_dotted(name: &str) -> String {
    name.split('/')
        .filter(|s| !s.is_empty())
        .map(escape_key)
        .collect::<Vec<_>>()
        .join(".")
}

/// Render a filter segment selecting the element whose `field` equals `value`.
///
/// ```
/// use confsync_value::path::filter_segment;
/// assert_eq!(filter_segment("id", "10"), r#"#(id=="10")"#);
/// ```
pub fn filter_segment(field: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("#({}==\"{}\")", field, escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_parse_path_simple() {
        assert_eq!(parse_path("name").unwrap(), vec![key("name")]);
    }

    #[test]
    fn test_parse_path_dotted() {
        assert_eq!(
            parse_path("config.interface.description").unwrap(),
            vec![key("config"), key("interface"), key("description")]
        );
    }

    #[test]
    fn test_parse_path_skips_empty_segments() {
        assert_eq!(parse_path("a..b.").unwrap(), vec![key("a"), key("b")]);
    }

    #[test]
    fn test_parse_path_escaped_dot() {
        assert_eq!(
            parse_path(r"svc.ip\.address").unwrap(),
            vec![key("svc"), key("ip.address")]
        );
    }

    #[test]
    fn test_parse_filter_keeps_dots_inside_quotes() {
        let path = parse_path(r#"route.#(prefix=="10.0.0.0/8").next-hop"#).unwrap();
        assert_eq!(
            path,
            vec![
                key("route"),
                PathSegment::Filter {
                    field: "prefix".to_string(),
                    value: "10.0.0.0/8".to_string()
                },
                key("next-hop"),
            ]
        );
    }

    #[test]
    fn test_parse_filter_with_escaped_quote() {
        let expr = format!("item.{}", filter_segment("name", r#"a"b"#));
        let path = parse_path(&expr).unwrap();
        assert_eq!(
            path[1],
            PathSegment::Filter {
                field: "name".to_string(),
                value: r#"a"b"#.to_string()
            }
        );
    }

    #[test]
    fn test_parse_filter_unterminated() {
        assert!(parse_path(r#"rule.#(id=="1""#).is_err());
    }

    #[test]
    fn test_parse_filter_without_operator() {
        assert!(parse_path("rule.#(id).x").is_err());
    }

    #[test]
    fn test_dangling_escape() {
        assert!(parse_path("abc\\").is_err());
    }

    #[test]
    fn test_segment_helpers() {
        assert_eq!(key("3").as_index(), Some(3));
        assert_eq!(key("x").as_index(), None);
        assert!(key("-1").is_append());
        assert!(!key("1").is_append());
    }
}
