mod engine;
mod types;
mod validate;

pub use engine::project;
pub use types::{
    BonusSchedule, CONTRIBUTION_CAP, MAX_HORIZON_YEARS, ProjectionInput, ProjectionOutput,
    YearPoint,
};
pub use validate::{RawInput, ValidationError, parse_flag, parse_integer, parse_number};
