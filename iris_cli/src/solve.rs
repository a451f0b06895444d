use std::{io::Read, path::PathBuf, sync::Arc};

use comfy_table::{Table, presets::UTF8_FULL};
use iris_matrix_providers::{
    travel_matrix_client::{MatrixProviderError, TravelMatrixClient},
    travel_matrix_provider::TravelMatrixProvider,
};
use iris_optimizer::{
    json::{
        input::{InputError, JsonVehicleRoutingProblem},
        output::{JsonComputingTimes, JsonSolution},
        types::JsonStatusCode,
    },
    solver::{
        error::SolverError,
        solver::Solver,
        solver_params::{SolverParams, Termination, Threads},
    },
};
use jiff::{SignedDuration, Timestamp};
use tracing::info;

pub const OSRM_URL_ENV: &str = "IRIS_OSRM_URL";

pub enum InputSource {
    File(PathBuf),
    Inline(String),
    Stdin,
}

impl InputSource {
    pub fn read(&self) -> Result<String, std::io::Error> {
        match self {
            InputSource::File(path) => std::fs::read_to_string(path),
            InputSource::Inline(input) => Ok(input.clone()),
            InputSource::Stdin => {
                let mut input = String::new();
                std::io::stdin().read_to_string(&mut input)?;
                Ok(input)
            }
        }
    }
}

pub struct SolveArgs {
    pub input: InputSource,
    pub osrm_url: String,
    pub profile: String,
    pub geometry: bool,
    pub threads: usize,
    pub exploration_level: usize,
    pub limit: Option<SignedDuration>,
}

/// Address of the routing engine, the environment takes precedence over the flags.
pub fn osrm_url(address: &str, port: u16, from_env: Option<String>) -> String {
    match from_env {
        Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_owned(),
        _ => format!("http://{address}:{port}"),
    }
}

/// Status code written in the error document, unexpected failures are internal errors.
pub fn error_code(error: &anyhow::Error) -> i32 {
    if let Some(error) = error.downcast_ref::<InputError>() {
        error.code()
    } else if let Some(error) = error.downcast_ref::<SolverError>() {
        error.code()
    } else if error.is::<MatrixProviderError>() {
        JsonStatusCode::Routing.code()
    } else if error.is::<std::io::Error>() {
        JsonStatusCode::Input.code()
    } else {
        JsonStatusCode::Internal.code()
    }
}

pub async fn run(args: SolveArgs) -> Result<JsonSolution, anyhow::Error> {
    let loading_start = Timestamp::now();

    let input = args.input.read()?;
    let provider = TravelMatrixProvider::Osrm {
        url: args.osrm_url,
        profile: args.profile,
    };
    let client = TravelMatrixClient::new();

    let problem = JsonVehicleRoutingProblem::from_json(&input)?
        .build_problem(&client, provider.clone())
        .await?;

    let loading = Timestamp::now().duration_since(loading_start);
    info!(
        jobs = problem.jobs().len(),
        vehicles = problem.vehicles().len(),
        locations = problem.locations().len(),
        loading = %loading,
        "Problem loaded"
    );

    let solving_start = Timestamp::now();
    let solver = Solver::new(
        Arc::new(problem),
        SolverParams {
            exploration_level: args.exploration_level,
            threads: Threads::Multi(args.threads),
            terminations: args.limit.map(Termination::Duration).into_iter().collect(),
            ..SolverParams::default()
        },
    );
    let accepted = solver.solve()?;
    let solving = Timestamp::now().duration_since(solving_start);

    let mut solution = JsonSolution::from_solution(
        &accepted.solution,
        JsonComputingTimes::new(loading, solving),
    );

    if args.geometry {
        solution.add_geometry(&client, &provider).await?;
    }

    Ok(solution)
}

pub fn summary_table(solution: &JsonSolution) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Vehicle", "Jobs", "Cost", "Duration", "Waiting", "Distance",
    ]);

    for route in &solution.routes {
        let jobs = route.steps.iter().filter(|step| step.job.is_some()).count();
        table.add_row(vec![
            route.vehicle.to_string(),
            jobs.to_string(),
            route.cost.to_string(),
            route.duration.to_string(),
            route.waiting_time.to_string(),
            route.distance.to_string(),
        ]);
    }

    table.add_row(vec![
        String::from("Total"),
        format!("{} unassigned", solution.summary.unassigned),
        solution.summary.cost.to_string(),
        solution.summary.duration.to_string(),
        solution.summary.waiting_time.to_string(),
        solution.summary.distance.to_string(),
    ]);

    table
}
