//! Positional statement parameters
//!
//! Parameters are bound in order to `$1`, `$2`, ... placeholders.

use std::convert::Infallible;
use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Bound as a text-typed NULL. Inserting it into a non-text column needs
    /// a cast in the statement (`$1::int`).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
}

impl SqlParam {
    pub(crate) fn bind_to<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Timestamp(v) => query.bind(*v),
            SqlParam::Json(v) => query.bind(Json(v.clone())),
        }
    }
}

/// Prefix that forces the rest of the argument to bind as text.
pub const TEXT_PREFIX: &str = "text:";

/// Infers the parameter kind from command-line text.
///
/// `null`, `true`/`false`, integers, floats, and JSON objects/arrays are
/// recognised; everything else is text. Numbers are only inferred when the
/// text is their canonical spelling, so `0123` or `+5` stay text. A `text:`
/// prefix skips inference. The input is never trimmed.
impl FromStr for SqlParam {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(text) = s.strip_prefix(TEXT_PREFIX) {
            return Ok(SqlParam::Text(text.to_string()));
        }

        let param = match s {
            "null" | "NULL" => SqlParam::Null,
            "true" => SqlParam::Bool(true),
            "false" => SqlParam::Bool(false),
            _ => {
                if let Some(v) = s.parse::<i64>().ok().filter(|v| v.to_string() == s) {
                    SqlParam::Int(v)
                } else if let Some(v) = parse_float(s) {
                    SqlParam::Float(v)
                } else if s.starts_with('{') || s.starts_with('[') {
                    serde_json::from_str(s)
                        .map(SqlParam::Json)
                        .unwrap_or_else(|_| SqlParam::Text(s.to_string()))
                } else {
                    SqlParam::Text(s.to_string())
                }
            }
        };
        Ok(param)
    }
}

/// Plain decimal or exponent notation, no sign prefix, no leading zeros.
fn parse_float(s: &str) -> Option<f64> {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let integral = unsigned
        .split(|c| c == '.' || c == 'e' || c == 'E')
        .next()
        .unwrap_or_default();
    let canonical = !integral.is_empty()
        && integral.bytes().all(|b| b.is_ascii_digit())
        && !(integral.len() > 1 && integral.starts_with('0'));
    if !canonical {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// clap value parser for `--param`.
///
/// Goes through [`FromStr`] explicitly; clap would otherwise prefer the
/// `From<String>` impl and bind everything as text.
pub fn parse_param(s: &str) -> Result<SqlParam, Infallible> {
    s.parse()
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v.into())
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<NaiveDateTime> for SqlParam {
    fn from(v: NaiveDateTime) -> Self {
        SqlParam::Timestamp(v)
    }
}

impl From<serde_json::Value> for SqlParam {
    fn from(v: serde_json::Value) -> Self {
        SqlParam::Json(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(s: &str) -> SqlParam {
        s.parse().unwrap()
    }

    #[test]
    fn infers_scalars() {
        assert_eq!(parse("null"), SqlParam::Null);
        assert_eq!(parse("true"), SqlParam::Bool(true));
        assert_eq!(parse("42"), SqlParam::Int(42));
        assert_eq!(parse("-3"), SqlParam::Int(-3));
        assert_eq!(parse("0.75"), SqlParam::Float(0.75));
    }

    #[test]
    fn infers_json_documents() {
        assert_eq!(
            parse(r#"{"model": "lda", "k": 8}"#),
            SqlParam::Json(json!({"model": "lda", "k": 8}))
        );
        assert_eq!(parse("[1, 2]"), SqlParam::Json(json!([1, 2])));
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(parse("tickets.csv"), SqlParam::Text("tickets.csv".into()));
        assert_eq!(parse("{not json"), SqlParam::Text("{not json".into()));
        assert_eq!(parse("NaN"), SqlParam::Text("NaN".into()));
        assert_eq!(parse("inf"), SqlParam::Text("inf".into()));
    }

    #[test]
    fn numeric_looking_text_keeps_its_spelling() {
        assert_eq!(parse("0123"), SqlParam::Text("0123".into()));
        assert_eq!(parse("+5"), SqlParam::Text("+5".into()));
        assert_eq!(parse("007.5"), SqlParam::Text("007.5".into()));
        assert_eq!(parse(".5"), SqlParam::Text(".5".into()));
        assert_eq!(parse("0"), SqlParam::Int(0));
        assert_eq!(parse("0.5"), SqlParam::Float(0.5));
        assert_eq!(parse("-2.5e3"), SqlParam::Float(-2500.0));
    }

    #[test]
    fn whitespace_is_preserved() {
        assert_eq!(parse(" padded "), SqlParam::Text(" padded ".into()));
        assert_eq!(parse(" 42"), SqlParam::Text(" 42".into()));
        assert_eq!(parse("true "), SqlParam::Text("true ".into()));
    }

    #[test]
    fn text_prefix_forces_text() {
        assert_eq!(parse("text:42"), SqlParam::Text("42".into()));
        assert_eq!(parse("text:null"), SqlParam::Text("null".into()));
        assert_eq!(parse(r#"text:{"a":1}"#), SqlParam::Text(r#"{"a":1}"#.into()));
        assert_eq!(parse("text:"), SqlParam::Text(String::new()));
    }

    #[test]
    fn value_parser_uses_inference() {
        assert_eq!(parse_param("42").unwrap(), SqlParam::Int(42));
        assert_eq!(parse_param("null").unwrap(), SqlParam::Null);
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(SqlParam::from(None::<i64>), SqlParam::Null);
        assert_eq!(SqlParam::from(Some("web")), SqlParam::Text("web".into()));
    }
}
