//! Column names of the stable internal transaction schema.

use crate::frame::Frame;

use super::error::{PipelineError, Result, Stage};

pub const HOUSEHOLD_ID: &str = "household_id";
pub const BASKET_ID: &str = "basket_id";
pub const PRODUCT_ID: &str = "product_id";
pub const QUANTITY: &str = "quantity";
pub const SALES_VALUE: &str = "sales_value";
pub const RETAIL_DISC: &str = "retail_disc";
pub const COUPON_DISC: &str = "coupon_disc";
pub const COUPON_MATCH_DISC: &str = "coupon_match_disc";
pub const DAY: &str = "day";

pub const DISCOUNT_COMPONENTS: [&str; 3] = [RETAIL_DISC, COUPON_DISC, COUPON_MATCH_DISC];

pub const UNIT_PRICE: &str = "unit_price";
pub const DISCOUNT_VALUE: &str = "discount_value";
pub const GROSS_VALUE: &str = "gross_value";
pub const DISCOUNT_RATE: &str = "discount_rate";
pub const ORDER_DATE: &str = "order_date";
pub const COUPON_APPLIED_LINE: &str = "coupon_applied_line";

pub const ITEMS: &str = "items";
pub const SALES: &str = "sales";
pub const DISCOUNT: &str = "discount";
pub const COUPON_APPLIED: &str = "coupon_applied";

pub(crate) fn require(frame: &Frame, stage: Stage, column: &str) -> Result<usize> {
    frame
        .column_index(column)
        .ok_or_else(|| PipelineError::missing_column(stage, column))
}
