use log::{info, warn};

use crate::{
    data::{Value, coerce_numeric},
    frame::{Frame, Row},
};

use super::{
    columns::{
        self, DISCOUNT_COMPONENTS, DISCOUNT_RATE, DISCOUNT_VALUE, GROSS_VALUE, QUANTITY,
        SALES_VALUE, UNIT_PRICE,
    },
    error::{Result, Stage},
};

/// Price and discount measures of one transaction line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub unit_price: Option<f64>,
    pub discount_value: f64,
    pub gross_value: Option<f64>,
    pub discount_rate: f64,
}

impl LineMetrics {
    /// Missing discount components count as zero. A unit price that is not a
    /// finite positive number is left unset; a zero gross value yields a
    /// discount rate of zero.
    pub fn compute(quantity: Option<f64>, sales_value: Option<f64>, discounts: [Option<f64>; 3]) -> Self {
        let unit_price = match (sales_value, quantity) {
            (Some(sales), Some(qty)) => Some(sales / qty).filter(|p| p.is_finite() && *p > 0.0),
            _ => None,
        };
        let discount_value = discounts.iter().map(|d| d.unwrap_or(0.0)).sum::<f64>();
        let gross_value = sales_value.map(|sales| sales + discount_value);
        let discount_rate = match gross_value {
            Some(gross) if gross != 0.0 => discount_value / gross,
            _ => 0.0,
        };
        Self {
            unit_price,
            discount_value,
            gross_value,
            discount_rate,
        }
    }
}

struct MetricInputs {
    quantity: usize,
    sales_value: usize,
    discounts: [Option<usize>; 3],
}

impl MetricInputs {
    fn locate(frame: &Frame) -> Result<Self> {
        Ok(Self {
            quantity: columns::require(frame, Stage::Metrics, QUANTITY)?,
            sales_value: columns::require(frame, Stage::Metrics, SALES_VALUE)?,
            discounts: DISCOUNT_COMPONENTS.map(|name| frame.column_index(name)),
        })
    }

    fn metrics(&self, row: &Row) -> LineMetrics {
        let cell = |idx: usize| coerce_numeric(row[idx].as_ref());
        LineMetrics::compute(
            cell(self.quantity),
            cell(self.sales_value),
            self.discounts.map(|idx| idx.and_then(cell)),
        )
    }
}

/// Adds `unit_price`, `discount_value`, `gross_value` and `discount_rate`.
pub fn derive_metrics(frame: Frame) -> Result<Frame> {
    let inputs = MetricInputs::locate(&frame)?;
    let mut frame = frame;
    frame.derive_column(UNIT_PRICE, |row| inputs.metrics(row).unit_price.map(Value::Float));
    frame.derive_column(DISCOUNT_VALUE, |row| {
        Some(Value::Float(inputs.metrics(row).discount_value))
    });
    frame.derive_column(GROSS_VALUE, |row| inputs.metrics(row).gross_value.map(Value::Float));
    frame.derive_column(DISCOUNT_RATE, |row| {
        Some(Value::Float(inputs.metrics(row).discount_rate))
    });

    let negative = frame
        .rows()
        .iter()
        .filter(|row| {
            inputs
                .discounts
                .iter()
                .flatten()
                .any(|&idx| coerce_numeric(row[idx].as_ref()).is_some_and(|d| d < 0.0))
        })
        .count();
    if negative > 0 {
        warn!(
            "{negative} line(s) store a discount component as a negative number; \
             discount_value and gross_value assume non-negative discounts"
        );
    }
    let unpriced = frame
        .column_values(UNIT_PRICE)
        .map(|values| values.filter(Option::is_none).count())
        .unwrap_or(0);
    info!(
        "Derived metrics for {} line(s); {} without a valid unit price",
        frame.height(),
        unpriced
    );
    Ok(frame)
}
