use log::info;

use crate::{
    data::{Value, coerce_numeric},
    frame::Frame,
};

use super::{
    columns::{self, COUPON_APPLIED_LINE, DISCOUNT_VALUE},
    error::{Result, Stage},
};

/// Any net discount on a line counts as coupon treatment. Redemption records
/// are not consulted.
pub fn is_coupon_treated(discount_value: Option<f64>) -> bool {
    discount_value.is_some_and(|discount| discount > 0.0)
}

/// Adds the binary `coupon_applied_line` flag.
pub fn flag_coupon_lines(frame: Frame) -> Result<Frame> {
    let discount_idx = columns::require(&frame, Stage::Coupon, DISCOUNT_VALUE)?;
    let mut frame = frame;
    let mut treated = 0usize;
    frame.derive_column(COUPON_APPLIED_LINE, |row| {
        let flag = is_coupon_treated(coerce_numeric(row[discount_idx].as_ref()));
        treated += usize::from(flag);
        Some(Value::Integer(i64::from(flag)))
    });
    info!(
        "Flagged {} of {} line(s) as coupon-treated",
        treated,
        frame.height()
    );
    Ok(frame)
}
