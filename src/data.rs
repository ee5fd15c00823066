use std::{cmp::Ordering, fmt};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// A single typed cell. Missing cells are represented as `None` by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

/// Equality follows [`Ord`]: numeric variants are equal when they hold the
/// same number, so `Integer(1) == Float(1.0)` and `0.0 == -0.0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric view of the cell. Text is parsed leniently; anything that does
    /// not yield a number (including NaN) is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            Value::Date(_) => return None,
        };
        (!number.is_nan()).then_some(number)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Integer(_) | Value::Float(_) => 0,
            Value::Date(_) => 1,
            Value::String(_) => 2,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => cmp_floats(*a, *b),
            (Value::Integer(a), Value::Float(b)) => cmp_integer_float(*a, *b),
            (Value::Float(a), Value::Integer(b)) => cmp_integer_float(*b, *a).reverse(),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Numeric order with NaN placed by sign beyond the infinities.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Exact comparison without rounding the integer through `f64`.
fn cmp_integer_float(int: i64, float: f64) -> Ordering {
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= BOUND {
        return Ordering::Less;
    }
    if float < -BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    int.cmp(&(whole as i64))
        .then_with(|| cmp_floats(0.0, float - whole))
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Coerces a cell to a number, degrading unparsable content to missing.
pub fn coerce_numeric(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

pub fn display_cell(value: Option<&Value>) -> String {
    value.map(Value::as_display).unwrap_or_default()
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_typed_value(value: &str, ty: &ColumnType) -> Result<Option<Value>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = match ty {
        ColumnType::String => Value::String(value.to_string()),
        ColumnType::Integer => {
            let parsed: i64 = value
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as integer"))?;
            Value::Integer(parsed)
        }
        ColumnType::Float => {
            let parsed: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as float"))?;
            Value::Float(parsed)
        }
        ColumnType::Date => Value::Date(parse_naive_date(value.trim())?),
    };
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_display_drops_integral_fraction() {
        assert_eq!(Value::Float(25.0).as_display(), "25");
        assert_eq!(Value::Float(2.5).as_display(), "2.5");
        assert_eq!(Value::Float(f64::INFINITY).as_display(), "inf");
    }

    #[test]
    fn as_f64_degrades_text_and_nan() {
        assert_eq!(Value::String(" 3.5 ".into()).as_f64(), Some(3.5));
        assert_eq!(Value::String("abc".into()).as_f64(), None);
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
        assert_eq!(Value::Integer(7).as_f64(), Some(7.0));
    }

    #[test]
    fn mixed_variants_order_without_panicking() {
        let mut values = vec![
            Value::String("b".into()),
            Value::Float(2.5),
            Value::Date(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()),
            Value::Integer(3),
            Value::Integer(1),
        ];
        values.sort();
        assert_eq!(values[0], Value::Integer(1));
        assert_eq!(values[1], Value::Float(2.5));
        assert_eq!(values[2], Value::Integer(3));
        assert!(matches!(values[3], Value::Date(_)));
        assert_eq!(values[4], Value::String("b".into()));
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let pairs = [
            (Value::Integer(1), Value::Float(1.0)),
            (Value::Float(0.0), Value::Float(-0.0)),
            (Value::Integer(0), Value::Float(-0.0)),
            (Value::Integer(2), Value::Float(2.5)),
            (Value::Integer(i64::MAX), Value::Float(9_223_372_036_854_775_808.0)),
            (Value::Integer(1), Value::Float(f64::NAN)),
            (Value::Float(f64::NAN), Value::Float(f64::NAN)),
            (Value::Integer(1), Value::String("1".into())),
        ];
        for (left, right) in pairs {
            let ordering = left.cmp(&right);
            assert_eq!(left == right, ordering == Ordering::Equal, "{left:?} vs {right:?}");
            assert_eq!(right.cmp(&left), ordering.reverse(), "{left:?} vs {right:?}");
        }
        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert!(Value::Integer(2) < Value::Float(2.5));
        assert!(Value::Integer(i64::MAX) < Value::Float(9_223_372_036_854_775_808.0));
        assert!(Value::Float(f64::NAN) > Value::Float(f64::INFINITY));
    }

    #[test]
    fn integral_floats_and_integers_share_a_grouping_key() {
        let mut keys = std::collections::BTreeMap::new();
        *keys.entry(Value::Integer(7)).or_insert(0) += 1;
        *keys.entry(Value::Float(7.0)).or_insert(0) += 1;
        *keys.entry(Value::Float(7.5)).or_insert(0) += 1;
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[&Value::Integer(7)], 2);
    }

    #[test]
    fn parse_typed_value_handles_empty_and_dates() {
        assert_eq!(parse_typed_value("", &ColumnType::Integer).unwrap(), None);
        let parsed = parse_typed_value("2017-02-01", &ColumnType::Date)
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed,
            Value::Date(NaiveDate::from_ymd_opt(2017, 2, 1).unwrap())
        );
        assert!(parse_typed_value("x1", &ColumnType::Integer).is_err());
    }
}
