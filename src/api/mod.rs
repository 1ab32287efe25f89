use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::core::{
    ProjectionInput, ProjectionOutput, RawInput, ValidationError, YearPoint, parse_flag,
    parse_integer, parse_number, project,
};
use crate::render::{Chart, RenderError, Renderer, Summary, format_yen, year_label};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "accrue",
    version,
    about = "Compound-interest accumulation projection (monthly, bonus and capped contributions)"
)]
pub struct Cli {
    /// Log debug events from the engine and renderer
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator page and JSON API
    Serve(ServeArgs),
    /// Run one projection and print the summary
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "ACCRUE_PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Args, Debug, Default)]
pub struct ProjectArgs {
    #[arg(long, allow_negative_numbers = true, help = "Monthly contribution in yen")]
    pub monthly: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 3.5"
    )]
    pub rate: Option<f64>,
    #[arg(long, allow_negative_numbers = true, help = "Investment horizon in years")]
    pub years: Option<i64>,
    #[arg(
        long,
        overrides_with = "no_cap_mode",
        help = "Stop contributing once cumulative principal reaches the lifetime cap"
    )]
    pub cap_mode: bool,
    #[arg(
        long,
        overrides_with = "cap_mode",
        help = "Ignore the lifetime cap even if the scenario file enables it"
    )]
    pub no_cap_mode: bool,
    #[arg(long, allow_negative_numbers = true, help = "Lump sum invested up front")]
    pub initial: Option<f64>,
    #[arg(
        long,
        value_name = "MONTH=AMOUNT",
        value_parser = parse_bonus_arg,
        help = "Extra contribution paid every year in the given calendar month (repeatable)"
    )]
    pub bonus: Vec<BonusArg>,
    #[arg(long, help = "JSON scenario file; explicit flags override its values")]
    pub scenario: Option<PathBuf>,
    #[arg(long, help = "Write the chart as SVG to this path")]
    pub svg: Option<PathBuf>,
    #[arg(long, help = "Print the full JSON response instead of the text summary")]
    pub json: bool,
    #[arg(long, help = "Also print one row per year")]
    pub yearly: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BonusArg {
    pub month: u32,
    pub amount: f64,
}

fn parse_bonus_arg(value: &str) -> Result<BonusArg, String> {
    let (month, amount) = value
        .split_once('=')
        .ok_or_else(|| format!("expected MONTH=AMOUNT, got {value:?}"))?;
    let month = month
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("bonus month must be 1-12, got {month:?}"))?;
    if !(1..=12).contains(&month) {
        return Err(format!("bonus month must be 1-12, got {month}"));
    }
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("bonus amount must be a number, got {amount:?}"))?;
    Ok(BonusArg { month, amount })
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to read scenario {}: {source}", .path.display())]
    ReadScenario { path: PathBuf, source: io::Error },

    #[error("invalid scenario {}: {source}", .path.display())]
    ParseScenario {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(io::Error),
}

/// A numeric field that may arrive as a JSON number or as form text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum NumberField {
    Number(f64),
    Text(String),
}

impl NumberField {
    fn number(&self, field: &str) -> Result<Option<f64>, ValidationError> {
        match self {
            NumberField::Number(value) => Ok(Some(*value)),
            NumberField::Text(text) => parse_number(field, text),
        }
    }

    fn integer(&self, field: &str) -> Result<Option<i64>, ValidationError> {
        match self {
            NumberField::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                Ok(Some(*value as i64))
            }
            NumberField::Number(value) => Err(ValidationError::NotAnInteger {
                field: field.to_string(),
                value: value.to_string(),
            }),
            NumberField::Text(text) => parse_integer(field, text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FlagField {
    Bool(bool),
    Text(String),
}

impl FlagField {
    fn flag(&self, field: &str) -> Result<Option<bool>, ValidationError> {
        match self {
            FlagField::Bool(value) => Ok(Some(*value)),
            FlagField::Text(text) => parse_flag(field, text),
        }
    }
}

/// Request body, query string and scenario file share these keys.
/// A missing key keeps the default; a blank value means zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    monthly: Option<NumberField>,
    rate: Option<NumberField>,
    years: Option<NumberField>,
    cap_mode: Option<FlagField>,
    initial: Option<NumberField>,
    bonus1: Option<NumberField>,
    bonus2: Option<NumberField>,
    bonus3: Option<NumberField>,
    bonus4: Option<NumberField>,
    bonus5: Option<NumberField>,
    bonus6: Option<NumberField>,
    bonus7: Option<NumberField>,
    bonus8: Option<NumberField>,
    bonus9: Option<NumberField>,
    bonus10: Option<NumberField>,
    bonus11: Option<NumberField>,
    bonus12: Option<NumberField>,
}

impl ProjectPayload {
    fn bonuses(&self) -> [&Option<NumberField>; 12] {
        [
            &self.bonus1,
            &self.bonus2,
            &self.bonus3,
            &self.bonus4,
            &self.bonus5,
            &self.bonus6,
            &self.bonus7,
            &self.bonus8,
            &self.bonus9,
            &self.bonus10,
            &self.bonus11,
            &self.bonus12,
        ]
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    labels: Vec<String>,
    total_by_year: Vec<f64>,
    principal_by_year: Vec<f64>,
    years: Vec<YearPoint>,
    final_total: f64,
    final_principal: f64,
    final_interest: f64,
    cap_mode: bool,
    cap_reached: bool,
    summary: Summary,
    summary_text: String,
    chart_svg: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Values shown before the user has entered anything.
fn default_raw_input() -> RawInput {
    RawInput {
        monthly: Some(30_000.0),
        rate: Some(3.5),
        years: Some(20),
        cap_mode: Some(false),
        initial: Some(0.0),
        bonus: [None; 12],
    }
}

fn raw_input_from_payload(
    payload: &ProjectPayload,
    mut raw: RawInput,
) -> Result<RawInput, ValidationError> {
    if let Some(v) = &payload.monthly {
        raw.monthly = v.number("monthly")?;
    }
    if let Some(v) = &payload.rate {
        raw.rate = v.number("rate")?;
    }
    if let Some(v) = &payload.years {
        raw.years = v.integer("years")?;
    }
    if let Some(v) = &payload.cap_mode {
        raw.cap_mode = v.flag("capMode")?;
    }
    if let Some(v) = &payload.initial {
        raw.initial = v.number("initial")?;
    }
    for (idx, bonus) in payload.bonuses().into_iter().enumerate() {
        if let Some(v) = bonus {
            raw.bonus[idx] = v.number(&format!("bonus{}", idx + 1))?;
        }
    }
    Ok(raw)
}

fn input_from_payload(payload: &ProjectPayload) -> Result<ProjectionInput, ValidationError> {
    raw_input_from_payload(payload, default_raw_input())?.validate()
}

#[cfg(test)]
fn input_from_json(json: &str) -> Result<ProjectionInput, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    input_from_payload(&payload).map_err(|e| e.to_string())
}

fn read_scenario(path: &Path) -> Result<ProjectPayload, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ReadScenario {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ParseScenario {
        path: path.to_path_buf(),
        source,
    })
}

fn build_input(args: &ProjectArgs) -> Result<ProjectionInput, CliError> {
    let mut raw = default_raw_input();
    if let Some(path) = &args.scenario {
        let payload = read_scenario(path)?;
        raw = raw_input_from_payload(&payload, raw)?;
    }

    if let Some(v) = args.monthly {
        raw.monthly = Some(v);
    }
    if let Some(v) = args.rate {
        raw.rate = Some(v);
    }
    if let Some(v) = args.years {
        raw.years = Some(v);
    }
    if args.cap_mode {
        raw.cap_mode = Some(true);
    } else if args.no_cap_mode {
        raw.cap_mode = Some(false);
    }
    if let Some(v) = args.initial {
        raw.initial = Some(v);
    }
    for bonus in &args.bonus {
        raw.set_bonus(bonus.month, bonus.amount)?;
    }

    Ok(raw.validate()?)
}

fn build_project_response(
    input: &ProjectionInput,
    output: &ProjectionOutput,
    summary: Summary,
    chart: &Chart,
) -> ProjectResponse {
    ProjectResponse {
        labels: chart.spec().labels.clone(),
        total_by_year: output.total_by_year.clone(),
        principal_by_year: output.principal_by_year.clone(),
        years: output.years().collect(),
        final_total: output.final_total.round(),
        final_principal: output.final_principal.round(),
        final_interest: output.final_interest().round(),
        cap_mode: input.cap_mode,
        cap_reached: output.cap_reached(),
        summary_text: summary.to_string(),
        summary,
        chart_svg: chart.svg().to_string(),
    }
}

fn format_year_rows(output: &ProjectionOutput) -> String {
    let mut rows = String::new();
    for point in output.years() {
        rows.push_str(&format!(
            "{:>8}  {:>18}  {:>18}  {:>18}\n",
            year_label(point.year),
            format_yen(point.total),
            format_yen(point.principal),
            format_yen(point.interest()),
        ));
    }
    rows
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve(args) => run_http_server(args.port).await.map_err(CliError::Server),
        Command::Project(args) => run_project(&args),
    }
}

pub fn run_project(args: &ProjectArgs) -> Result<(), CliError> {
    let input = build_input(args)?;
    let output = project(&input);
    let summary = Summary::new(&input, &output);

    if args.svg.is_none() && !args.json {
        print_summary(&summary, &output, args.yearly);
        return Ok(());
    }

    let mut renderer = Renderer::default();
    let chart = renderer.render(&output)?;

    if let Some(path) = &args.svg {
        fs::write(path, chart.svg()).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "wrote chart");
    }

    if args.json {
        let response = build_project_response(&input, &output, summary, chart);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&summary, &output, args.yearly);
    }
    Ok(())
}

fn print_summary(summary: &Summary, output: &ProjectionOutput, yearly: bool) {
    print!("{summary}");
    if yearly {
        println!();
        print!("{}", format_year_rows(output));
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let input = match input_from_payload(&payload) {
        Ok(input) => input,
        Err(err) => {
            warn!(%err, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let output = project(&input);
    let summary = Summary::new(&input, &output);
    let mut renderer = Renderer::default();
    let chart = match renderer.render(&output) {
        Ok(chart) => chart,
        Err(err) => {
            error!(%err, "chart rendering failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
    };

    let response = build_project_response(&input, &output, summary, chart);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
