mod chart;
mod summary;

use thiserror::Error;
use tracing::debug;

pub use chart::{ChartSeries, ChartSpec, SeriesKind, render_svg, year_label};
pub use summary::{Summary, SummaryLine, format_yen};

use crate::core::ProjectionOutput;

pub const DEFAULT_CHART_SIZE: (u32, u32) = (960, 540);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("plotting error: {0}")]
    Plot(String),
}

/// A drawn chart. Only a [`Renderer`] creates these.
#[derive(Debug)]
pub struct Chart {
    generation: u64,
    spec: ChartSpec,
    svg: String,
}

impl Chart {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn into_svg(self) -> String {
        self.svg
    }

    fn dispose(self) {
        debug!(generation = self.generation, "disposing chart");
    }
}

/// Owns at most one chart. A new render disposes the old chart first.
#[derive(Debug)]
pub struct Renderer {
    size: (u32, u32),
    current: Option<Chart>,
    generation: u64,
    disposed: u64,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_SIZE)
    }
}

impl Renderer {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            size,
            current: None,
            generation: 0,
            disposed: 0,
        }
    }

    pub fn render(&mut self, output: &ProjectionOutput) -> Result<&Chart, RenderError> {
        if let Some(previous) = self.current.take() {
            previous.dispose();
            self.disposed += 1;
        }

        let spec = ChartSpec::from_output(output);
        let svg = render_svg(&spec, self.size)?;
        self.generation += 1;
        debug!(
            generation = self.generation,
            years = spec.years(),
            bytes = svg.len(),
            "rendered chart"
        );

        Ok(self.current.insert(Chart {
            generation: self.generation,
            spec,
            svg,
        }))
    }

    pub fn current(&self) -> Option<&Chart> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<Chart> {
        self.current.take()
    }

    pub fn into_chart(self) -> Option<Chart> {
        self.current
    }

    /// Number of charts replaced by a later render.
    pub fn disposed(&self) -> u64 {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BonusSchedule, ProjectionInput, project};

    fn output_for(years: u32) -> ProjectionOutput {
        project(&ProjectionInput {
            monthly_contribution: 10_000.0,
            annual_rate_percent: 2.0,
            horizon_years: years,
            cap_mode: false,
            initial_lump_sum: 0.0,
            bonus_by_month: BonusSchedule::default(),
        })
    }

    #[test]
    fn render_replaces_previous_chart() {
        let mut renderer = Renderer::new((640, 360));
        assert!(renderer.current().is_none());

        let first = renderer.render(&output_for(5)).expect("first render");
        assert_eq!(first.generation(), 1);
        assert_eq!(renderer.disposed(), 0);

        let second = renderer.render(&output_for(10)).expect("second render");
        assert_eq!(second.generation(), 2);
        assert_eq!(second.spec().years(), 10);
        assert_eq!(renderer.disposed(), 1);

        let current = renderer.current().expect("chart kept");
        assert_eq!(current.generation(), 2);
    }

    #[test]
    fn taken_chart_is_not_disposed_by_next_render() {
        let mut renderer = Renderer::default();
        renderer.render(&output_for(3)).expect("render");
        let taken = renderer.take().expect("chart present");

        renderer.render(&output_for(4)).expect("render");
        assert_eq!(renderer.disposed(), 0);
        assert_eq!(taken.generation(), 1);
        assert!(taken.svg().contains("<svg"));

        let last = renderer.into_chart().expect("chart present");
        assert_eq!(last.generation(), 2);
        assert!(last.into_svg().contains("<svg"));
    }
}
