use std::fmt;

use serde::Serialize;

use crate::core::{CONTRIBUTION_CAP, ProjectionInput, ProjectionOutput};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

impl SummaryLine {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Text summary of a projection: what was entered, and what came out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub basic: Vec<SummaryLine>,
    pub details: Vec<SummaryLine>,
    pub results: Vec<SummaryLine>,
}

impl Summary {
    pub fn new(input: &ProjectionInput, output: &ProjectionOutput) -> Self {
        let basic = vec![
            SummaryLine::new(
                "Monthly contribution",
                format_yen(input.monthly_contribution),
            ),
            SummaryLine::new("Annual rate", format!("{:.2}%", input.annual_rate_percent)),
            SummaryLine::new("Horizon", format_years(input.horizon_years)),
        ];

        let mut details = Vec::new();
        if input.initial_lump_sum > 0.0 {
            details.push(SummaryLine::new(
                "Initial lump sum",
                format_yen(input.initial_lump_sum),
            ));
        }
        for (month, amount) in input.bonus_by_month.iter() {
            if amount > 0.0 {
                details.push(SummaryLine::new(
                    format!("Bonus (month {month})"),
                    format_yen(amount),
                ));
            }
        }
        if input.cap_mode {
            details.push(SummaryLine::new(
                "Contribution cap",
                format_yen(CONTRIBUTION_CAP),
            ));
        }

        let results = vec![
            SummaryLine::new("Total assets", format_yen(output.final_total)),
            SummaryLine::new("Principal", format_yen(output.final_principal)),
            SummaryLine::new("Interest", format_yen(output.final_interest())),
        ];

        Self {
            basic,
            details,
            results,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = [&self.basic, &self.details, &self.results];
        let mut first = true;
        for group in groups.into_iter().filter(|group| !group.is_empty()) {
            if !first {
                writeln!(f)?;
            }
            first = false;
            for line in group {
                writeln!(f, "{}: {}", line.label, line.value)?;
            }
        }
        Ok(())
    }
}

fn format_years(years: u32) -> String {
    if years == 1 {
        "1 year".to_string()
    } else {
        format!("{years} years")
    }
}

/// Whole-yen amount with thousands separators, e.g. `¥1,234,567`.
pub fn format_yen(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("¥-{grouped}")
    } else {
        format!("¥{grouped}")
    }
}
