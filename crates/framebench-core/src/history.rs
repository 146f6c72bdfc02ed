use std::collections::BTreeMap;

use crate::MetricSet;

/// strftime pattern for run identifiers. Zero padded, so string order is run order.
pub const RUN_ID_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Every persisted run, keyed by run identifier.
pub type HistoryRecord = BTreeMap<String, MetricSet>;
