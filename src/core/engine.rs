use tracing::debug;

use super::types::{CONTRIBUTION_CAP, ProjectionInput, ProjectionOutput};

#[derive(Debug, Clone, Copy)]
struct Ledger {
    total: f64,
    principal: f64,
}

impl Ledger {
    fn new(initial_lump_sum: f64) -> Self {
        Self {
            total: initial_lump_sum,
            principal: initial_lump_sum,
        }
    }

    fn deposit_and_grow(&mut self, contribution: f64, monthly_rate: f64) {
        self.principal += contribution;
        self.total = (self.total + contribution) * (1.0 + monthly_rate);
    }
}

/// Runs the month-by-month accumulation and samples it at every year boundary.
pub fn project(input: &ProjectionInput) -> ProjectionOutput {
    let monthly_rate = input.annual_rate_percent / 100.0 / 12.0;
    let months = total_months(input.horizon_years);

    let mut ledger = Ledger::new(input.initial_lump_sum);
    let samples = input.horizon_years as usize + 1;
    let mut total_by_year = Vec::with_capacity(samples);
    let mut principal_by_year = Vec::with_capacity(samples);
    total_by_year.push(ledger.total.round());
    principal_by_year.push(ledger.principal.round());

    for month in 1..=months {
        let bonus = input.bonus_by_month.get(calendar_month(month));
        let contribution = if input.cap_mode {
            capped_contribution(input.monthly_contribution, bonus, ledger.principal)
        } else {
            input.monthly_contribution + bonus
        };

        ledger.deposit_and_grow(contribution, monthly_rate);

        if month % 12 == 0 {
            total_by_year.push(ledger.total.round());
            principal_by_year.push(ledger.principal.round());
        }
    }

    let output = ProjectionOutput {
        total_by_year,
        principal_by_year,
        final_total: ledger.total,
        final_principal: ledger.principal,
        cap_mode: input.cap_mode,
    };

    debug!(
        months,
        cap_mode = output.cap_mode,
        cap_reached = output.cap_reached(),
        final_total = output.final_total,
        final_principal = output.final_principal,
        "projection complete"
    );

    output
}

fn total_months(horizon_years: u32) -> u64 {
    u64::from(horizon_years) * 12
}

/// Calendar month (1..=12) of the 1-based simulation month.
fn calendar_month(month: u64) -> u32 {
    match month % 12 {
        0 => 12,
        m => m as u32,
    }
}

/// Regular contribution first, then the bonus against whatever room is left.
fn capped_contribution(monthly: f64, bonus: f64, principal: f64) -> f64 {
    let remaining = CONTRIBUTION_CAP - principal;
    let mut contribution = monthly;
    if remaining <= 0.0 {
        contribution = 0.0;
    } else if remaining < monthly {
        contribution = remaining;
    }

    let remaining = CONTRIBUTION_CAP - principal;
    if remaining > 0.0 {
        contribution += bonus.min(remaining - contribution);
    }
    contribution
}
