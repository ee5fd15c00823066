use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage, used to attribute failures and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Sanitize,
    Metrics,
    Dates,
    Coupon,
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Sanitize => "row sanitization",
            Stage::Metrics => "metric derivation",
            Stage::Dates => "date derivation",
            Stage::Coupon => "coupon flagging",
            Stage::Aggregate => "basket aggregation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("{stage}: required column '{column}' is missing")]
    MissingColumn { stage: Stage, column: String },
    #[error("{}: line {row} has day value '{value}' that cannot be cast to an integer", Stage::Dates)]
    DayConversion { row: usize, value: String },
    #[error("{}: line {row} has day {day} which falls outside the calendar range", Stage::Dates)]
    DateOutOfRange { row: usize, day: i64 },
}

impl PipelineError {
    pub fn missing_column(stage: Stage, column: &str) -> Self {
        PipelineError::MissingColumn {
            stage,
            column: column.to_string(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MissingColumn { stage, .. } => *stage,
            PipelineError::DayConversion { .. } | PipelineError::DateOutOfRange { .. } => {
                Stage::Dates
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
