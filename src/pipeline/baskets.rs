//! Basket-level aggregation of flagged transaction lines.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::Serialize;

use crate::{
    data::{Value, coerce_numeric},
    frame::Frame,
};

use super::{
    columns::{
        self, BASKET_ID, COUPON_APPLIED, COUPON_APPLIED_LINE, DISCOUNT, DISCOUNT_VALUE,
        HOUSEHOLD_ID, ITEMS, ORDER_DATE, QUANTITY, SALES, SALES_VALUE,
    },
    error::{Result, Stage},
};

/// One shopping trip: all lines sharing basket, household and order date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Basket {
    pub basket_id: Value,
    pub household_id: Value,
    pub order_date: Value,
    pub items: f64,
    pub sales: f64,
    pub discount: f64,
    pub coupon_applied: bool,
}

impl Basket {
    pub const COLUMNS: [&'static str; 7] = [
        BASKET_ID,
        HOUSEHOLD_ID,
        ORDER_DATE,
        ITEMS,
        SALES,
        DISCOUNT,
        COUPON_APPLIED,
    ];

    fn to_row(&self) -> Vec<Option<Value>> {
        vec![
            Some(self.basket_id.clone()),
            Some(self.household_id.clone()),
            Some(self.order_date.clone()),
            Some(Value::Float(self.items)),
            Some(Value::Float(self.sales)),
            Some(Value::Float(self.discount)),
            Some(Value::Integer(i64::from(self.coupon_applied))),
        ]
    }
}

#[derive(Debug, Default)]
struct Totals {
    items: f64,
    sales: f64,
    discount: f64,
    coupon_applied: bool,
}

/// Groups lines by `(basket_id, household_id, order_date)` in ascending key
/// order. Lines missing any key are left out of the grouping.
pub fn aggregate_baskets(frame: &Frame) -> Result<Vec<Basket>> {
    let require = |column| columns::require(frame, Stage::Aggregate, column);
    let keys = [require(BASKET_ID)?, require(HOUSEHOLD_ID)?, require(ORDER_DATE)?];
    let quantity = require(QUANTITY)?;
    let sales_value = require(SALES_VALUE)?;
    let discount_value = require(DISCOUNT_VALUE)?;
    let flag = require(COUPON_APPLIED_LINE)?;

    let mut groups: BTreeMap<(Value, Value, Value), Totals> = BTreeMap::new();
    let mut keyless = 0usize;
    for row in frame.rows() {
        let [basket, household, date] = keys.map(|idx| row[idx].clone());
        let (Some(basket), Some(household), Some(date)) = (basket, household, date) else {
            keyless += 1;
            continue;
        };
        let number = |idx: usize| coerce_numeric(row[idx].as_ref());
        let totals = groups.entry((basket, household, date)).or_default();
        totals.items += number(quantity).unwrap_or(0.0);
        totals.sales += number(sales_value).unwrap_or(0.0);
        totals.discount += number(discount_value).unwrap_or(0.0);
        totals.coupon_applied |= number(flag).is_some_and(|f| f > 0.0);
    }
    if keyless > 0 {
        warn!("{keyless} line(s) lack a basket, household or order date key and were not grouped");
    }

    let baskets = groups
        .into_iter()
        .map(|((basket_id, household_id, order_date), totals)| Basket {
            basket_id,
            household_id,
            order_date,
            items: totals.items,
            sales: totals.sales,
            discount: totals.discount,
            coupon_applied: totals.coupon_applied,
        })
        .collect::<Vec<_>>();
    info!(
        "Aggregated {} line(s) into {} basket(s)",
        frame.height(),
        baskets.len()
    );
    Ok(baskets)
}

pub fn baskets_to_frame(baskets: &[Basket]) -> Frame {
    let columns = Basket::COLUMNS.iter().map(|c| c.to_string()).collect();
    Frame::from_parts(columns, baskets.iter().map(Basket::to_row).collect())
}
