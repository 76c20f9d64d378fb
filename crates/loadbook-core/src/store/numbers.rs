//! Scalar rendering for persisted records.
//!
//! Whole-valued floats are written as integers and everything else is rounded
//! to `max_decimals` and written in its shortest form, so a hand-edited file
//! does not churn on re-save. Strings that a YAML 1.1 reader would resolve to
//! a bool, null, number or timestamp (`Yes`, `No`, `1:8`, `2025-06-01`) are
//! single-quoted so older readers get them back as text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Number, Value};

use crate::errors::LoadbookResult;

pub const DEFAULT_MAX_DECIMALS: usize = 3;

// Beyond this magnitude every f64 is integral and `as i64` may saturate.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

const QUOTE_MARKER: &str = "loadbook-quoted-";

// Plain scalars the YAML 1.1 implicit resolvers turn into non-strings.
static YAML11_IMPLICIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"y|Y|n|N|yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF",
        r"|~|null|Null|NULL|",
        r"|[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+",
        r"|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+",
        r"|[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+]?[0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+]?[0-9]+)?",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN)",
        r"|[0-9]{4}-[0-9]{2}-[0-9]{2}",
        r"|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?",
        r"|<<|=",
        r")$"
    ))
    .unwrap()
});

/// Serialization settings handed to the record store at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    pub max_decimals: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            max_decimals: DEFAULT_MAX_DECIMALS,
        }
    }
}

impl NumberFormat {
    /// Text form of `value` under this format.
    ///
    /// `2.0` renders as `2`, `1.5` as `1.5`, `1.23456` as `1.235`. A value that
    /// only rounds to a whole number keeps one fractional digit (`2.0001` ->
    /// `2.0`).
    pub fn render_float(&self, value: f64) -> String {
        if is_integral(value) {
            return format!("{}", value as i64);
        }
        let mut text = format!("{:.*}", self.max_decimals, value);
        if text.contains('.') {
            let trimmed_len = text.trim_end_matches('0').len();
            text.truncate(trimmed_len);
            if text.ends_with('.') {
                text.push('0');
            }
        }
        text
    }

    /// Rewrite every float in a YAML tree according to this format.
    pub fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) => self.normalize_float(f),
                None => Value::Number(n),
            },
            Value::Mapping(mapping) => Value::Mapping(
                mapping
                    .into_iter()
                    .map(|(k, v)| (k, self.normalize(v)))
                    .collect(),
            ),
            Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(|v| self.normalize(v)).collect())
            }
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                Value::Tagged(Box::new(TaggedValue {
                    tag,
                    value: self.normalize(value),
                }))
            }
            other => other,
        }
    }

    /// Serialize `data` as block-style YAML with normalized numbers. Field
    /// order follows the struct declaration.
    pub fn to_yaml_string<T: Serialize>(&self, data: &T) -> LoadbookResult<String> {
        let value = self.normalize(serde_yaml::to_value(data)?);

        // The emitter offers no per-scalar style, so ambiguous strings go out
        // as unique placeholders that are swapped for quoted text afterwards.
        let mut marker = QUOTE_MARKER.to_string();
        while contains_text(&value, &marker) {
            marker.push('x');
        }
        let mut quoted = Vec::new();
        let value = hold_ambiguous_strings(value, &marker, &mut quoted);

        let mut text = serde_yaml::to_string(&value)?;
        for (index, original) in quoted.iter().enumerate() {
            let placeholder = format!("{marker}{index}-");
            let literal = format!("'{}'", original.replace('\'', "''"));
            text = text.replace(&placeholder, &literal);
        }
        Ok(text)
    }

    fn normalize_float(&self, value: f64) -> Value {
        if !value.is_finite() {
            return Value::Number(Number::from(value));
        }
        if is_integral(value) {
            return Value::Number(Number::from(value as i64));
        }
        let rounded = self.render_float(value).parse::<f64>().unwrap_or(value);
        Value::Number(Number::from(rounded))
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value == value.trunc() && value.abs() < MAX_EXACT_INTEGER
}

/// Whether a plain `value` would be read back as something other than text
/// by a YAML 1.1 loader.
pub fn is_ambiguous_in_yaml11(value: &str) -> bool {
    YAML11_IMPLICIT_RE.is_match(value)
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Mapping(mapping) => mapping
            .iter()
            .any(|(k, v)| contains_text(k, needle) || contains_text(v, needle)),
        Value::Sequence(items) => items.iter().any(|v| contains_text(v, needle)),
        Value::Tagged(tagged) => contains_text(&tagged.value, needle),
        _ => false,
    }
}

/// Swap ambiguous string values (not keys) for numbered placeholders,
/// collecting the originals in `held`.
fn hold_ambiguous_strings(value: Value, marker: &str, held: &mut Vec<String>) -> Value {
    match value {
        Value::String(s) if is_ambiguous_in_yaml11(&s) => {
            let placeholder = format!("{marker}{}-", held.len());
            held.push(s);
            Value::String(placeholder)
        }
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(k, v)| (k, hold_ambiguous_strings(v, marker, held)))
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|v| hold_ambiguous_strings(v, marker, held))
                .collect(),
        ),
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            Value::Tagged(Box::new(TaggedValue {
                tag,
                value: hold_ambiguous_strings(value, marker, held),
            }))
        }
        other => other,
    }
}
