use std::collections::HashSet;

use log::warn;

use crate::frame::Frame;

use super::columns::HOUSEHOLD_ID;

/// Raw transaction column names that differ from the internal schema. Any
/// column not listed keeps its lowercased name.
pub const TRANSACTION_RENAMES: &[(&str, &str)] = &[("household_key", HOUSEHOLD_ID), ("week_no", "week")];

pub fn normalize_transactions(raw: &Frame) -> Frame {
    let mut frame = raw.clone();
    frame.rename_columns(|name| {
        let lowered = name.to_lowercase();
        TRANSACTION_RENAMES
            .iter()
            .find(|(from, _)| *from == lowered)
            .map(|(_, to)| to.to_string())
            .unwrap_or(lowered)
    });
    warn_on_duplicates("transactions", &frame);
    frame
}

pub fn normalize_products(raw: &Frame) -> Frame {
    let mut frame = raw.clone();
    frame.rename_columns(str::to_lowercase);
    warn_on_duplicates("products", &frame);
    frame
}

fn warn_on_duplicates(table: &str, frame: &Frame) {
    let mut seen = HashSet::new();
    for name in frame.columns() {
        if !seen.insert(name.as_str()) {
            warn!("Table '{table}' has duplicate column '{name}' after normalization; the first one is used");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn frame(columns: &[&str]) -> Frame {
        let row = columns.iter().map(|_| Some(Value::Integer(1))).collect();
        Frame::from_rows(columns.iter().map(|c| c.to_string()).collect(), vec![row]).unwrap()
    }

    #[test]
    fn transactions_are_lowercased_and_renamed() {
        let raw = frame(&["HOUSEHOLD_KEY", "BASKET_ID", "Sales_Value", "WEEK_NO"]);
        let normalized = normalize_transactions(&raw);
        assert_eq!(
            normalized.columns(),
            ["household_id", "basket_id", "sales_value", "week"]
        );
        assert_eq!(raw.columns()[0], "HOUSEHOLD_KEY");
    }

    #[test]
    fn products_are_only_lowercased() {
        let raw = frame(&["PRODUCT_ID", "DEPARTMENT", "household_key"]);
        let normalized = normalize_products(&raw);
        assert_eq!(
            normalized.columns(),
            ["product_id", "department", "household_key"]
        );
    }
}
