use serde::Serialize;

/// Lifetime limit on cumulative principal when cap mode is on.
pub const CONTRIBUTION_CAP: f64 = 18_000_000.0;

/// Longest horizon the input layer accepts.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Bonus contributions keyed by calendar month (1 = January).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BonusSchedule([f64; 12]);

impl BonusSchedule {
    pub fn new(amounts: [f64; 12]) -> Self {
        Self(amounts)
    }

    /// Amount paid in `month`; zero outside 1..=12.
    pub fn get(&self, month: u32) -> f64 {
        match month {
            1..=12 => self.0[(month - 1) as usize],
            _ => 0.0,
        }
    }

    pub fn set(&mut self, month: u32, amount: f64) {
        if let 1..=12 = month {
            self.0[(month - 1) as usize] = amount;
        }
    }

    /// Months with a non-zero bonus, in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, amount)| **amount != 0.0)
            .map(|(idx, amount)| (idx as u32 + 1, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn annual_total(&self) -> f64 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub monthly_contribution: f64,
    pub annual_rate_percent: f64,
    pub horizon_years: u32,
    pub cap_mode: bool,
    pub initial_lump_sum: f64,
    pub bonus_by_month: BonusSchedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPoint {
    pub year: u32,
    pub total: f64,
    pub principal: f64,
}

impl YearPoint {
    pub fn interest(&self) -> f64 {
        self.total - self.principal
    }
}

/// Yearly samples of a projection. Index 0 is the state before the first month.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOutput {
    pub total_by_year: Vec<f64>,
    pub principal_by_year: Vec<f64>,
    pub final_total: f64,
    pub final_principal: f64,
    /// Whether the projection ran with the contribution cap applied.
    pub cap_mode: bool,
}

impl ProjectionOutput {
    pub fn final_interest(&self) -> f64 {
        self.final_total - self.final_principal
    }

    pub fn horizon_years(&self) -> u32 {
        self.total_by_year.len().saturating_sub(1) as u32
    }

    pub fn years(&self) -> impl Iterator<Item = YearPoint> + '_ {
        self.total_by_year
            .iter()
            .zip(self.principal_by_year.iter())
            .enumerate()
            .map(|(year, (total, principal))| YearPoint {
                year: year as u32,
                total: *total,
                principal: *principal,
            })
    }

    /// True when a capped projection filled the contribution cap.
    pub fn cap_reached(&self) -> bool {
        self.cap_mode && self.final_principal >= CONTRIBUTION_CAP
    }
}
