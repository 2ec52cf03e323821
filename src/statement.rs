//! Query statements and their placeholders.
//!
//! A [`Statement`] is scanned once on construction. Positional placeholders
//! are written `$1`, `$2`, ... and named placeholders `$name`. Text inside
//! quoted strings, backtick identifiers and comments is never treated as a
//! placeholder.
//!
//! Binding validation here is best-effort: it catches a parameter set that
//! cannot possibly fit the statement before anything is sent to the engine.
//! Type mismatches and anything the scanner cannot see are left to the engine.
//!
//! # Examples
//!
//! ```rust
//! use cluster_query::{Parameters, Placeholder, Statement};
//! use serde_json::json;
//!
//! let stmt = Statement::new("select * from hotels where type=$1 and country=$2");
//! assert_eq!(stmt.positional_count(), 2);
//!
//! let params = Parameters::Positional(vec![json!("airline"), json!("United States")]);
//! assert!(stmt.check(&params).is_ok());
//!
//! let rendered = stmt.render(|p| match p {
//!     Placeholder::Positional(_) => "?".to_string(),
//!     Placeholder::Named(name) => format!(":{name}"),
//! });
//! assert_eq!(rendered, "select * from hotels where type=? and country=?");
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Range,
};

use serde_json::Value;

use crate::{Error, Result};

/// A placeholder found in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placeholder {
    /// `$n`, bound by 1-based index.
    Positional(usize),
    /// `$name`, bound by name. Stored without the `$`.
    Named(String),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Positional(index) => write!(f, "${index}"),
            Placeholder::Named(name) => write!(f, "${name}"),
        }
    }
}

/// Values bound to a statement for one execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Parameters {
    #[default]
    None,
    /// Values bound by 1-based index: `values[0]` is `$1`.
    Positional(Vec<Value>),
    /// Values bound by name. Keys never carry the leading `$`.
    Named(BTreeMap<String, Value>),
}

impl Parameters {
    pub fn is_none(&self) -> bool {
        matches!(self, Parameters::None)
    }

    /// Builds a named set, accepting keys written either as `name` or `$name`.
    pub fn named<K, I>(entries: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map = entries
            .into_iter()
            .map(|(key, value)| (normalize_name(key.as_ref()).to_string(), value))
            .collect();

        Parameters::Named(map)
    }

    /// Positional values in the order markers occur in `statement`.
    ///
    /// Used by backends whose bind markers carry no index, so `$2 ... $1`
    /// becomes `[values[1], values[0]]`.
    pub fn in_occurrence_order(&self, statement: &Statement) -> Vec<Value> {
        match self {
            Parameters::Positional(values) => statement
                .placeholders()
                .filter_map(|p| match p {
                    Placeholder::Positional(index) => values.get(index.wrapping_sub(1)).cloned(),
                    Placeholder::Named(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn normalize_name(key: &str) -> &str {
    key.strip_prefix('$').unwrap_or(key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Marker {
    span: Range<usize>,
    placeholder: Placeholder,
}

/// An immutable query statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    text: String,
    markers: Vec<Marker>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let markers = scan(&text);

        Self { text, markers }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholders in the order they occur, duplicates included.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.markers.iter().map(|m| &m.placeholder)
    }

    pub fn has_placeholders(&self) -> bool {
        !self.markers.is_empty()
    }

    /// Number of positional values the statement expects, i.e. the highest `$n`.
    pub fn positional_count(&self) -> usize {
        self.placeholders()
            .filter_map(|p| match p {
                Placeholder::Positional(index) => Some(*index),
                Placeholder::Named(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Distinct named placeholders, without the `$`.
    pub fn named_placeholders(&self) -> BTreeSet<&str> {
        self.placeholders()
            .filter_map(|p| match p {
                Placeholder::Named(name) => Some(name.as_str()),
                Placeholder::Positional(_) => None,
            })
            .collect()
    }

    /// Rewrites every placeholder with the marker produced by `marker`,
    /// leaving all other text untouched.
    pub fn render(&self, mut marker: impl FnMut(&Placeholder) -> String) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut last = 0;

        for m in &self.markers {
            out.push_str(&self.text[last..m.span.start]);
            out.push_str(&marker(&m.placeholder));
            last = m.span.end;
        }
        out.push_str(&self.text[last..]);

        out
    }

    /// Checks that `params` can be bound to this statement.
    pub fn check(&self, params: &Parameters) -> Result<()> {
        let positional = self.positional_count();
        let named = self.named_placeholders();

        if positional > 0 && !named.is_empty() {
            return Err(Error::binding(
                "statement mixes positional and named placeholders",
            ));
        }

        if self
            .placeholders()
            .any(|p| *p == Placeholder::Positional(0))
        {
            return Err(Error::binding("positional placeholders start at $1"));
        }

        match params {
            Parameters::None => {
                if self.has_placeholders() {
                    return Err(Error::binding(format!(
                        "statement declares {} placeholder(s) but no parameters were supplied",
                        self.markers.len()
                    )));
                }
            }
            Parameters::Positional(values) => {
                if !named.is_empty() {
                    return Err(Error::binding(
                        "positional parameters supplied for a statement with named placeholders",
                    ));
                }
                if values.len() != positional {
                    return Err(Error::binding(format!(
                        "statement expects {positional} positional parameter(s), got {}",
                        values.len()
                    )));
                }
            }
            Parameters::Named(values) => {
                if positional > 0 {
                    return Err(Error::binding(
                        "named parameters supplied for a statement with positional placeholders",
                    ));
                }

                let missing: Vec<&str> = named
                    .iter()
                    .filter(|name| !values.contains_key(**name))
                    .copied()
                    .collect();
                let unknown: Vec<&str> = values
                    .keys()
                    .map(String::as_str)
                    .filter(|key| !named.contains(key))
                    .collect();

                if !missing.is_empty() || !unknown.is_empty() {
                    return Err(Error::binding(format!(
                        "named parameters do not match placeholders (missing: {missing:?}, unknown: {unknown:?})"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Statement {
    fn from(value: &str) -> Self {
        Statement::new(value)
    }
}

impl From<String> for Statement {
    fn from(value: String) -> Self {
        Statement::new(value)
    }
}

impl From<&String> for Statement {
    fn from(value: &String) -> Self {
        Statement::new(value.as_str())
    }
}

impl From<&Statement> for Statement {
    fn from(value: &Statement) -> Self {
        value.clone()
    }
}

// region:    --- Scanner

fn scan(text: &str) -> Vec<Marker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => i = skip_quoted(bytes, i, quote),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            // CQL `$$ ... $$` string literal
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                i = text[i + 2..]
                    .find("$$")
                    .map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b'$' => {
                let start = i;
                let body = i + 1;
                let end = body
                    + bytes[body..]
                        .iter()
                        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                        .count();

                let ident = &text[body..end];
                let placeholder = match ident.bytes().next() {
                    Some(b) if b.is_ascii_digit() && ident.bytes().all(|b| b.is_ascii_digit()) => {
                        Some(Placeholder::Positional(ident.parse().unwrap_or(usize::MAX)))
                    }
                    Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                        Some(Placeholder::Named(ident.to_string()))
                    }
                    _ => None,
                };

                match placeholder {
                    Some(placeholder) => {
                        markers.push(Marker {
                            span: start..end,
                            placeholder,
                        });
                        i = end;
                    }
                    None => i += 1,
                }
            }
            _ => i += 1,
        }
    }

    markers
}

/// Returns the index just past the closing quote. Doubled quotes and
/// backslash escapes stay inside the literal.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    return i + 1;
                }
            }
            _ => i += 1,
        }
    }

    bytes.len()
}

// endregion: --- Scanner

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn positional(indexes: &[usize]) -> Vec<Placeholder> {
        indexes.iter().map(|i| Placeholder::Positional(*i)).collect()
    }

    #[test]
    fn test_scan_positional() {
        let stmt = Statement::new("select * from `travel-sample` where type=$1 and country=$2 limit 10");

        assert_eq!(stmt.placeholders().cloned().collect::<Vec<_>>(), positional(&[1, 2]));
        assert_eq!(stmt.positional_count(), 2);
        assert!(stmt.named_placeholders().is_empty());
    }

    #[test]
    fn test_scan_named() {
        let stmt = Statement::new("select * from t where type=$type and country=$country and t2=$type");

        let named: Vec<&str> = stmt.named_placeholders().into_iter().collect();
        assert_eq!(named, vec!["country", "type"]);
        assert_eq!(stmt.placeholders().count(), 3);
    }

    #[test]
    fn test_scan_ignores_literals_and_comments() {
        let stmt = Statement::new(
            "select '$1', \"it''s $name\", `$col` -- $2\n from t /* $3 */ where a = 'x\\'$4' and b=$1",
        );

        assert_eq!(stmt.placeholders().cloned().collect::<Vec<_>>(), positional(&[1]));
    }

    #[test]
    fn test_scan_bare_dollar() {
        let stmt = Statement::new("select price$ from t where a = $ and b = $$");
        assert!(!stmt.has_placeholders());
    }

    #[test]
    fn test_scan_skips_dollar_quoted_literals() {
        let stmt = Statement::new("insert into ks.t (id, body) values (1, $$hello world$$)");
        assert!(!stmt.has_placeholders());
        assert!(stmt.check(&Parameters::None).is_ok());

        let stmt = Statement::new("insert into ks.t (id, body) values (1, $$hello $name$$)");
        assert!(!stmt.has_placeholders());

        let stmt = Statement::new("update ks.t set body = $$it's $1$$ where id = $1 and k = $key");
        let expected = vec![Placeholder::Positional(1), Placeholder::Named("key".into())];
        assert_eq!(stmt.placeholders().cloned().collect::<Vec<_>>(), expected);

        let stmt = Statement::new("select $$unterminated $1");
        assert!(!stmt.has_placeholders());
    }

    #[test]
    fn test_render_markers() {
        let stmt = Statement::new("a=$2 and b=$1 and c=$name");
        let rendered = stmt.render(|p| match p {
            Placeholder::Positional(_) => "?".into(),
            Placeholder::Named(n) => format!(":{n}"),
        });

        assert_eq!(rendered, "a=? and b=? and c=:name");
    }

    #[test]
    fn test_occurrence_order() {
        let stmt = Statement::new("a=$2 and b=$1 and c=$2");
        let params = Parameters::Positional(vec![json!("one"), json!("two")]);

        assert_eq!(
            params.in_occurrence_order(&stmt),
            vec![json!("two"), json!("one"), json!("two")]
        );
    }

    #[test]
    fn test_check_positional_cardinality() {
        let stmt = Statement::new("where type=$1 and country=$2");

        assert!(stmt
            .check(&Parameters::Positional(vec![json!("airline"), json!("US")]))
            .is_ok());
        assert!(matches!(
            stmt.check(&Parameters::Positional(vec![json!("airline")])),
            Err(Error::ParameterBinding(_))
        ));
        assert!(matches!(
            stmt.check(&Parameters::Positional(vec![json!(1), json!(2), json!(3)])),
            Err(Error::ParameterBinding(_))
        ));
    }

    #[test]
    fn test_check_named_keys() {
        let stmt = Statement::new("where type=$type and country=$country");

        let ok = Parameters::named([("$country", json!("US")), ("type", json!("airline"))]);
        assert!(stmt.check(&ok).is_ok());

        let missing = Parameters::named([("type", json!("airline"))]);
        assert!(matches!(stmt.check(&missing), Err(Error::ParameterBinding(_))));

        let unknown = Parameters::named([
            ("type", json!("airline")),
            ("country", json!("US")),
            ("city", json!("Paris")),
        ]);
        assert!(matches!(stmt.check(&unknown), Err(Error::ParameterBinding(_))));
    }

    #[test]
    fn test_check_style_mismatch() {
        let named = Statement::new("where type=$type");
        assert!(named
            .check(&Parameters::Positional(vec![json!("airline")]))
            .is_err());

        let mixed = Statement::new("where type=$1 and country=$country");
        assert!(mixed.check(&Parameters::None).is_err());

        let zero = Statement::new("where type=$0");
        assert!(zero.check(&Parameters::Positional(vec![])).is_err());
    }

    #[test]
    fn test_check_without_placeholders() {
        let stmt = Statement::new("select * from `travel-sample` limit 10");

        assert!(stmt.check(&Parameters::None).is_ok());
        assert!(stmt.check(&Parameters::Positional(vec![])).is_ok());
        assert!(stmt
            .check(&Parameters::Positional(vec![json!("extra")]))
            .is_err());
    }

    #[test]
    fn test_missing_parameters() {
        let stmt = Statement::new("where type=$1");
        assert!(matches!(
            stmt.check(&Parameters::None),
            Err(Error::ParameterBinding(_))
        ));
    }
}
