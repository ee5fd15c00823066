use chrono::{Days, NaiveDate};
use log::info;

use crate::{data::Value, frame::Frame};

use super::{
    columns::{self, DAY, ORDER_DATE},
    error::{PipelineError, Result, Stage},
};

/// Casts a `day` cell to an integer the way a strict integer cast would:
/// integers pass, finite floats truncate, and anything else fails. Text is
/// read as an integer or, failing that, as a float, so a cell kept as text by
/// the loader casts the same as its typed form.
pub fn cast_day(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Integer(day) => Some(*day),
        Value::Float(day) => truncate_day(*day),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate_day))
        }
        Value::Date(_) => None,
    }
}

fn truncate_day(day: f64) -> Option<i64> {
    (day.is_finite() && day.abs() < i64::MAX as f64).then(|| day.trunc() as i64)
}

/// `base_date + (day - 1)` days.
pub fn day_to_date(base_date: NaiveDate, day: i64) -> Option<NaiveDate> {
    let offset = day.checked_sub(1)?;
    if offset >= 0 {
        base_date.checked_add_days(Days::new(offset as u64))
    } else {
        base_date.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}

/// Adds `order_date` from the 1-based `day` offset. Fails on the first line
/// whose day cannot be cast to an integer.
pub fn derive_order_date(frame: Frame, base_date: NaiveDate) -> Result<Frame> {
    let day_idx = columns::require(&frame, Stage::Dates, DAY)?;
    let dates = frame
        .rows()
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let raw = cells[day_idx].as_ref();
            let day = cast_day(raw).ok_or_else(|| PipelineError::DayConversion {
                row,
                value: raw.map(Value::as_display).unwrap_or_default(),
            })?;
            day_to_date(base_date, day).ok_or(PipelineError::DateOutOfRange { row, day })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut frame = frame;
    let mut dates = dates.into_iter();
    frame.derive_column(ORDER_DATE, |_| dates.next().map(Value::Date));
    info!(
        "Derived order dates for {} line(s) from base date {}",
        frame.height(),
        base_date
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()
    }

    #[test]
    fn day_offsets_map_onto_calendar() {
        assert_eq!(day_to_date(base(), 1), Some(base()));
        assert_eq!(
            day_to_date(base(), 32),
            NaiveDate::from_ymd_opt(2017, 2, 1)
        );
        assert_eq!(
            day_to_date(base(), 0),
            NaiveDate::from_ymd_opt(2016, 12, 31)
        );
        assert_eq!(day_to_date(base(), i64::MAX), None);
    }

    #[test]
    fn cast_day_follows_integer_cast_rules() {
        assert_eq!(cast_day(Some(&Value::Integer(5))), Some(5));
        assert_eq!(cast_day(Some(&Value::Float(5.9))), Some(5));
        assert_eq!(cast_day(Some(&Value::String(" 12 ".into()))), Some(12));
        assert_eq!(cast_day(Some(&Value::Float(f64::NAN))), None);
        assert_eq!(cast_day(Some(&Value::String("nan".into()))), None);
        assert_eq!(cast_day(Some(&Value::String("1e300".into()))), None);
        assert_eq!(cast_day(None), None);
    }

    #[test]
    fn numeric_text_casts_like_its_typed_form() {
        let cases = [
            ("2.0", Value::Float(2.0)),
            ("12.5", Value::Float(12.5)),
            ("-3", Value::Integer(-3)),
        ];
        for (text, typed) in cases {
            assert_eq!(
                cast_day(Some(&Value::String(text.into()))),
                cast_day(Some(&typed)),
                "{text}"
            );
        }
        assert_eq!(cast_day(Some(&Value::String(" 2.0 ".into()))), Some(2));
    }

    #[test]
    fn day_beyond_calendar_fails_with_line_and_day() {
        let frame = Frame::from_rows(
            vec!["day".into()],
            vec![
                vec![Some(Value::Integer(1))],
                vec![Some(Value::Integer(i64::MAX))],
            ],
        )
        .unwrap();
        let err = derive_order_date(frame, base()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::DateOutOfRange {
                row: 1,
                day: i64::MAX
            }
        );
        assert_eq!(err.stage(), Stage::Dates);
    }

    #[test]
    fn malformed_day_fails_with_line_and_value() {
        let frame = Frame::from_rows(
            vec!["day".into()],
            vec![
                vec![Some(Value::Integer(1))],
                vec![Some(Value::String("later".into()))],
            ],
        )
        .unwrap();
        let err = derive_order_date(frame, base()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::DayConversion {
                row: 1,
                value: "later".into()
            }
        );
        assert_eq!(err.stage(), Stage::Dates);
    }

    #[test]
    fn missing_day_cell_is_fatal() {
        let frame = Frame::from_rows(vec!["day".into()], vec![vec![None]]).unwrap();
        assert!(matches!(
            derive_order_date(frame, base()),
            Err(PipelineError::DayConversion { row: 0, .. })
        ));
    }

    #[test]
    fn custom_epoch_is_honoured() {
        let frame =
            Frame::from_rows(vec!["day".into()], vec![vec![Some(Value::Integer(3))]]).unwrap();
        let epoch = NaiveDate::from_ymd_opt(2020, 2, 28).unwrap();
        let dated = derive_order_date(frame, epoch).unwrap();
        assert_eq!(
            dated.value(0, ORDER_DATE),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()))
        );
    }
}
