//! Conversion of model-reported values ("12.5%", "1,204", "3.4K") to numbers.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));
static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*([kmb])?\b").expect("valid count regex")
});

/// First number in `raw`, ignoring a trailing `%` and thousands separators.
#[must_use]
pub fn parse_percentage(raw: &str) -> Option<f64> {
    parse_number(raw)
}

/// First number in `raw`, with thousands separators removed.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    NUMBER_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Whole count from strings such as `"1,204"`, `"3.4K"` or `"1.2M"`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_count(raw: &str) -> Option<i64> {
    let cleaned = raw.replace(',', "");
    let caps = COUNT_RE.captures(&cleaned)?;
    let base: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(suffix) if suffix == "k" => 1_000.0,
        Some(suffix) if suffix == "m" => 1_000_000.0,
        Some(suffix) if suffix == "b" => 1_000_000_000.0,
        _ => 1.0,
    };
    let value = (base * multiplier).round();
    value.is_finite().then_some(value as i64)
}

/// Percentage from a JSON number or a percent-bearing string.
#[must_use]
pub fn percent_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_percentage(s),
        _ => None,
    }
}

/// Count from a JSON number or a count-bearing string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn count_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}
