use plotters::prelude::*;
use serde::Serialize;

use super::RenderError;
use super::summary::format_yen;
use crate::core::ProjectionOutput;

const BACKGROUND: RGBColor = RGBColor(0x1e, 0x1e, 0x2f);
const AXIS_LABEL: RGBColor = RGBColor(0xe0, 0xf7, 0xfa);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Total,
    Principal,
}

impl SeriesKind {
    pub fn label(self) -> &'static str {
        match self {
            SeriesKind::Total => "Total assets",
            SeriesKind::Principal => "Principal",
        }
    }

    pub fn color(self) -> RGBColor {
        match self {
            SeriesKind::Total => RGBColor(0x2e, 0xcc, 0x71),
            SeriesKind::Principal => RGBColor(0x9b, 0x59, 0xb6),
        }
    }

    pub fn hex(self) -> String {
        let RGBColor(r, g, b) = self.color();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub kind: SeriesKind,
    pub label: &'static str,
    pub color: String,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn new(kind: SeriesKind, values: &[f64]) -> Self {
        Self {
            kind,
            label: kind.label(),
            color: kind.hex(),
            values: values.to_vec(),
        }
    }

    fn points(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(year, value)| (year as u32, *value))
    }
}

/// Everything needed to draw the yearly trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub total: ChartSeries,
    pub principal: ChartSeries,
}

impl ChartSpec {
    pub fn from_output(output: &ProjectionOutput) -> Self {
        Self {
            labels: (0..=output.horizon_years()).map(year_label).collect(),
            total: ChartSeries::new(SeriesKind::Total, &output.total_by_year),
            principal: ChartSeries::new(SeriesKind::Principal, &output.principal_by_year),
        }
    }

    pub fn years(&self) -> u32 {
        self.labels.len().saturating_sub(1) as u32
    }

    /// Top of the value axis; the axis always starts at zero.
    pub fn y_max(&self) -> f64 {
        let peak = self
            .total
            .values
            .iter()
            .chain(self.principal.values.iter())
            .copied()
            .fold(0.0, f64::max);
        if peak > 0.0 { peak * 1.05 } else { 1.0 }
    }
}

pub fn year_label(year: u32) -> String {
    format!("Year {year}")
}

pub fn render_svg(spec: &ChartSpec, size: (u32, u32)) -> Result<String, RenderError> {
    let mut svg = String::new();
    draw_chart(spec, &mut svg, size).map_err(|e| RenderError::Plot(e.to_string()))?;
    Ok(svg)
}

fn draw_chart(
    spec: &ChartSpec,
    svg: &mut String,
    size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let area = SVGBackend::with_string(svg, size).into_drawing_area();
    area.fill(&BACKGROUND)?;

    let x_max = spec.years().max(1);
    let mut chart = ChartBuilder::on(&area)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 110)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0u32..x_max, 0.0..spec.y_max())?;

    let axis_font = ("sans-serif", 14).into_font().color(&AXIS_LABEL);
    chart
        .configure_mesh()
        .light_line_style(&WHITE.mix(0.05))
        .bold_line_style(&WHITE.mix(0.1))
        .axis_style(&WHITE.mix(0.3))
        .x_labels((x_max as usize + 1).min(21))
        .x_label_formatter(&|year: &u32| year_label(*year))
        .y_label_formatter(&|value: &f64| format_yen(*value))
        .label_style(axis_font)
        .draw()?;

    let total_color = spec.total.kind.color();
    chart
        .draw_series(
            AreaSeries::new(spec.total.points(), 0.0, &total_color.mix(0.2))
                .border_style(ShapeStyle {
                    color: total_color.to_rgba(),
                    filled: false,
                    stroke_width: 2,
                }),
        )?
        .label(spec.total.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], total_color));
    chart.draw_series(
        spec.total
            .points()
            .map(|point| Circle::new(point, 3, total_color.filled())),
    )?;

    let principal_color = spec.principal.kind.color();
    chart
        .draw_series(LineSeries::new(
            spec.principal.points(),
            ShapeStyle {
                color: principal_color.to_rgba(),
                filled: false,
                stroke_width: 2,
            },
        ))?
        .label(spec.principal.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], principal_color));
    chart.draw_series(
        spec.principal
            .points()
            .map(|point| Circle::new(point, 3, principal_color.filled())),
    )?;

    chart
        .configure_series_labels()
        .background_style(&BACKGROUND.mix(0.8))
        .border_style(&WHITE.mix(0.3))
        .label_font(("sans-serif", 14).into_font().color(&AXIS_LABEL))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    area.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BonusSchedule, ProjectionInput, project};

    fn sample_output(horizon_years: u32) -> ProjectionOutput {
        project(&ProjectionInput {
            monthly_contribution: 30_000.0,
            annual_rate_percent: 3.5,
            horizon_years,
            cap_mode: false,
            initial_lump_sum: 0.0,
            bonus_by_month: BonusSchedule::default(),
        })
    }

    #[test]
    fn spec_labels_every_year_from_zero() {
        let spec = ChartSpec::from_output(&sample_output(20));

        assert_eq!(spec.labels.len(), 21);
        assert_eq!(spec.labels[0], "Year 0");
        assert_eq!(spec.labels[20], "Year 20");
        assert_eq!(spec.total.values.len(), 21);
        assert_eq!(spec.principal.values.len(), 21);
        assert_eq!(spec.years(), 20);
    }

    #[test]
    fn series_carry_display_colors() {
        let spec = ChartSpec::from_output(&sample_output(5));

        assert_eq!(spec.total.color, "#2ecc71");
        assert_eq!(spec.principal.color, "#9b59b6");
        assert_eq!(spec.total.label, "Total assets");
        assert_eq!(spec.principal.label, "Principal");
    }

    #[test]
    fn y_axis_has_headroom_and_never_collapses() {
        let spec = ChartSpec::from_output(&sample_output(20));
        assert!(spec.y_max() > 10_436_429.0);

        let flat = ChartSpec::from_output(&sample_output(0));
        assert_eq!(flat.y_max(), 1.0);
    }

    #[test]
    fn render_svg_draws_both_series() {
        let spec = ChartSpec::from_output(&sample_output(20));
        let svg = render_svg(&spec, (960, 540)).expect("chart should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Total assets"));
        assert!(svg.contains("Principal"));
    }

    #[test]
    fn render_svg_handles_zero_horizon() {
        let spec = ChartSpec::from_output(&sample_output(0));
        let svg = render_svg(&spec, (640, 360)).expect("degenerate chart should render");

        assert!(svg.contains("<svg"));
    }
}
