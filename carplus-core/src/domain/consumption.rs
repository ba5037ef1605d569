//! Consumption string parsing
//!
//! An appointment records the products used during the job as a free-form
//! string: `Shampoo:1, Wax:0.25`. Parsing never fails as a whole; entries that
//! can't be understood are reported separately so callers can drop them.

use serde::Serialize;

/// A product usage that can be applied to stock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionEntry {
    pub product: String,
    pub quantity: f64,
}

/// Why an entry was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingColon,
    EmptyName,
    BadQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub raw: String,
    pub reason: SkipReason,
}

/// Result of parsing a consumption string
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsumptionPlan {
    pub entries: Vec<ConsumptionEntry>,
    pub skipped: Vec<SkippedEntry>,
}

impl ConsumptionPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a consumption string into applicable entries and skipped ones
pub fn parse_consumption(text: &str) -> ConsumptionPlan {
    let mut plan = ConsumptionPlan::default();

    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, qty)) = part.split_once(':') else {
            plan.skipped.push(skipped(part, SkipReason::MissingColon));
            continue;
        };

        let name = name.trim();
        if name.is_empty() {
            plan.skipped.push(skipped(part, SkipReason::EmptyName));
            continue;
        }

        match qty.trim().parse::<f64>() {
            Ok(quantity) if quantity.is_finite() => plan.entries.push(ConsumptionEntry {
                product: name.to_string(),
                quantity,
            }),
            _ => plan.skipped.push(skipped(part, SkipReason::BadQuantity)),
        }
    }

    plan
}

fn skipped(raw: &str, reason: SkipReason) -> SkippedEntry {
    SkippedEntry {
        raw: raw.to_string(),
        reason,
    }
}
