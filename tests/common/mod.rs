#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const TRANSACTIONS_HEADER: &str = "household_key,BASKET_ID,DAY,PRODUCT_ID,QUANTITY,SALES_VALUE,STORE_ID,RETAIL_DISC,TRANS_TIME,WEEK_NO,COUPON_DISC,COUPON_MATCH_DISC";
pub const PRODUCTS_HEADER: &str =
    "PRODUCT_ID,MANUFACTURER,DEPARTMENT,BRAND,COMMODITY_DESC,SUB_COMMODITY_DESC,CURR_SIZE_OF_PRODUCT";

/// Small transaction table covering one clean basket, one coupon basket and
/// two invalid lines.
pub fn sample_transactions() -> String {
    [
        TRANSACTIONS_HEADER,
        "H1,B1,1,100,2,10,1,0,1200,1,0,0",
        "H1,B1,1,200,3,15,1,0,1200,1,0,0",
        "H2,B2,32,100,1,10,1,2,1300,5,1,0",
        "H2,B2,32,300,-1,4,1,0,1300,5,0,0",
        "H3,B3,2,200,1,-5,1,0,1400,1,0,0",
    ]
    .join("\n")
}

pub fn sample_products() -> String {
    [
        PRODUCTS_HEADER,
        "100,69,GROCERY,Private,SOUP,CANNED SOUP,10 OZ",
        "200,2,DRUG GM,National,CANDY,CHOCOLATE,2 OZ",
    ]
    .join("\n")
}

/// Scratch directory holding a raw table folder and any outputs.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory the raw tables are written to.
    pub fn raw_dir(&self) -> PathBuf {
        let dir = self.path().join("raw");
        fs::create_dir_all(&dir).expect("create raw dir");
        dir
    }

    /// Writes `contents` as `raw/<name>` and returns the path.
    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.raw_dir().join(name);
        fs::write(&path, contents).expect("write raw table");
        path
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Writes the sample transaction and product tables.
    pub fn with_sample_tables(self) -> Self {
        self.write_raw("transaction_data.csv", &sample_transactions());
        self.write_raw("product.csv", &sample_products());
        self
    }

    /// Adds one-row files for the remaining required tables.
    pub fn with_auxiliary_tables(self) -> Self {
        self.write_raw("hh_demographic.csv", "AGE_DESC,household_key\n45-54,H1\n");
        self.write_raw("coupon.csv", "COUPON_UPC,PRODUCT_ID,CAMPAIGN\n10000085207,100,4\n");
        self.write_raw("coupon_redempt.csv", "household_key,DAY,COUPON_UPC,CAMPAIGN\nH2,32,10000085207,4\n");
        self.write_raw("campaign_table.csv", "DESCRIPTION,household_key,CAMPAIGN\nTypeA,H2,4\n");
        self.write_raw("campaign_desc.csv", "DESCRIPTION,CAMPAIGN,START_DAY,END_DAY\nTypeA,4,1,60\n");
        self
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("read output")
    }
}

/// Parses a CSV string into header names and raw string rows.
pub fn parse_csv(contents: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (headers, rows)
}
