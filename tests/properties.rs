use std::collections::BTreeSet;

use basket_builder::{
    data::Value,
    frame::Frame,
    pipeline::{Pipeline, PipelineOutput},
};
use proptest::prelude::*;

const COLUMNS: [&str; 8] = [
    "household_key",
    "BASKET_ID",
    "DAY",
    "QUANTITY",
    "SALES_VALUE",
    "RETAIL_DISC",
    "COUPON_DISC",
    "COUPON_MATCH_DISC",
];

fn line_strategy() -> impl Strategy<Value = Vec<Option<Value>>> {
    (
        0i64..3,
        0i64..4,
        1i64..6,
        proptest::option::weighted(0.9, -2i64..6),
        proptest::option::weighted(0.9, -5i64..20),
        prop::sample::select(vec![0.0, 0.5, 1.0]),
        prop::sample::select(vec![0.0, 0.25]),
    )
        .prop_map(|(household, basket, day, quantity, sales, retail, coupon)| {
            vec![
                Some(Value::Integer(household)),
                Some(Value::Integer(basket)),
                Some(Value::Integer(day)),
                quantity.map(Value::Integer),
                sales.map(Value::Integer),
                Some(Value::Float(retail)),
                Some(Value::Float(coupon)),
                None,
            ]
        })
}

fn run(rows: Vec<Vec<Option<Value>>>) -> PipelineOutput {
    let frame = Frame::from_rows(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
        .expect("frame");
    Pipeline::default()
        .run(&frame, &Frame::default())
        .expect("pipeline run")
}

fn number(frame: &Frame, row: usize, column: &str) -> f64 {
    frame
        .value(row, column)
        .and_then(Value::as_f64)
        .expect("numeric cell")
}

proptest! {
    #[test]
    fn every_line_is_either_retained_or_rejected(rows in prop::collection::vec(line_strategy(), 0..40)) {
        let total = rows.len();
        let output = run(rows);
        prop_assert_eq!(output.raw_lines, total);
        prop_assert_eq!(output.lines.height() + output.rejected.height(), total);
        prop_assert_eq!(output.reject_counts.values().sum::<usize>(), output.rejected.height());
    }

    #[test]
    fn baskets_conserve_retained_totals(rows in prop::collection::vec(line_strategy(), 0..40)) {
        let output = run(rows);
        let lines = &output.lines;
        let items = (0..lines.height()).map(|row| number(lines, row, "quantity")).sum::<f64>();
        let sales = (0..lines.height()).map(|row| number(lines, row, "sales_value")).sum::<f64>();
        prop_assert_eq!(output.baskets.iter().map(|b| b.items).sum::<f64>(), items);
        prop_assert_eq!(output.baskets.iter().map(|b| b.sales).sum::<f64>(), sales);

        let keys = (0..lines.height())
            .map(|row| {
                (
                    lines.value(row, "basket_id").cloned(),
                    lines.value(row, "household_id").cloned(),
                    lines.value(row, "order_date").cloned(),
                )
            })
            .collect::<BTreeSet<_>>();
        prop_assert_eq!(output.baskets.len(), keys.len());
    }

    #[test]
    fn baskets_are_unique_and_ordered(rows in prop::collection::vec(line_strategy(), 0..40)) {
        let output = run(rows);
        for pair in output.baskets.windows(2) {
            let left = (&pair[0].basket_id, &pair[0].household_id, &pair[0].order_date);
            let right = (&pair[1].basket_id, &pair[1].household_id, &pair[1].order_date);
            prop_assert!(left < right);
        }
    }

    #[test]
    fn basket_flag_reflects_any_discounted_line(rows in prop::collection::vec(line_strategy(), 1..40)) {
        let output = run(rows);
        let lines = &output.lines;
        for basket in &output.baskets {
            let discounted = (0..lines.height()).any(|row| {
                lines.value(row, "basket_id") == Some(&basket.basket_id)
                    && lines.value(row, "household_id") == Some(&basket.household_id)
                    && lines.value(row, "order_date") == Some(&basket.order_date)
                    && number(lines, row, "discount_value") > 0.0
            });
            prop_assert_eq!(basket.coupon_applied, discounted);
        }
    }
}
