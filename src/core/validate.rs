use thiserror::Error;

use super::types::{BonusSchedule, CONTRIBUTION_CAP, MAX_HORIZON_YEARS, ProjectionInput};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: String, value: String },

    #[error("{field} must be a whole number, got {value:?}")]
    NotAnInteger { field: String, value: String },

    #[error("{field} must be on/off or true/false, got {value:?}")]
    NotAFlag { field: String, value: String },

    #[error("{field} must be finite")]
    NotFinite { field: String },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: String, value: f64 },

    #[error("years must be between 0 and {max}, got {0}", max = MAX_HORIZON_YEARS)]
    InvalidHorizon(i64),

    #[error("bonus month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("initial must not exceed the contribution cap of {cap} in cap mode, got {0}", cap = CONTRIBUTION_CAP)]
    InitialExceedsCap(f64),
}

/// Loosely-typed fields as collected from a form, request or command line.
/// Absent values mean "nothing entered".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    pub monthly: Option<f64>,
    pub rate: Option<f64>,
    pub years: Option<i64>,
    pub cap_mode: Option<bool>,
    pub initial: Option<f64>,
    pub bonus: [Option<f64>; 12],
}

impl RawInput {
    pub fn set_bonus(&mut self, month: u32, amount: f64) -> Result<(), ValidationError> {
        match month {
            1..=12 => {
                self.bonus[(month - 1) as usize] = Some(amount);
                Ok(())
            }
            _ => Err(ValidationError::InvalidMonth(month)),
        }
    }

    pub fn validate(&self) -> Result<ProjectionInput, ValidationError> {
        let monthly_contribution = amount("monthly", self.monthly)?;
        let annual_rate_percent = finite("rate", self.rate.unwrap_or(0.0))?;
        let horizon_years = horizon(self.years.unwrap_or(0))?;
        let initial_lump_sum = amount("initial", self.initial)?;
        let cap_mode = self.cap_mode.unwrap_or(false);
        if cap_mode && initial_lump_sum > CONTRIBUTION_CAP {
            return Err(ValidationError::InitialExceedsCap(initial_lump_sum));
        }

        let mut bonus_by_month = BonusSchedule::default();
        for (idx, value) in self.bonus.iter().enumerate() {
            let month = idx as u32 + 1;
            bonus_by_month.set(month, amount(&format!("bonus{month}"), *value)?);
        }

        Ok(ProjectionInput {
            monthly_contribution,
            annual_rate_percent,
            horizon_years,
            cap_mode,
            initial_lump_sum,
            bonus_by_month,
        })
    }
}

fn finite(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite {
            field: field.to_string(),
        })
    }
}

fn amount(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    let value = finite(field, value.unwrap_or(0.0))?;
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

fn horizon(years: i64) -> Result<u32, ValidationError> {
    match u32::try_from(years) {
        Ok(years) if years <= MAX_HORIZON_YEARS => Ok(years),
        _ => Err(ValidationError::InvalidHorizon(years)),
    }
}

/// Parses a form field as a number. Blank text means absent.
pub fn parse_number(field: &str, text: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::NotANumber {
            field: field.to_string(),
            value: text.to_string(),
        })
}

/// Parses a form field as a whole number. Blank text means absent.
pub fn parse_integer(field: &str, text: &str) -> Result<Option<i64>, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ValidationError::NotAnInteger {
            field: field.to_string(),
            value: text.to_string(),
        })
}

/// Parses a checkbox-style flag. Blank text means absent.
pub fn parse_flag(field: &str, text: &str) -> Result<Option<bool>, ValidationError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "on" | "true" | "1" | "yes" => Ok(Some(true)),
        "off" | "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ValidationError::NotAFlag {
            field: field.to_string(),
            value: text.to_string(),
        }),
    }
}
