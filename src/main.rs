use log::error;
use std::error::Error;

use timetable_solver::data::TimetableConfig;
use timetable_solver::{generate, server};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// With no arguments, serves the HTTP API on `TIMETABLE_ADDR`.
/// With `<config.json> [attempts] [seed]`, generates once and prints the results as JSON.
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first() {
        Some(path) => generate_once(path, &args[1..]),
        None => {
            let addr = std::env::var("TIMETABLE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
            server::run_server(&addr).await.map_err(Into::into)
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn generate_once(path: &str, rest: &[String]) -> Result<(), Box<dyn Error>> {
    let config = TimetableConfig::from_json_file(path)?;
    let attempts = match rest.first() {
        Some(n) => n.parse()?,
        None => config.timetable_names.len().max(1),
    };
    let seed = rest.get(1).map(|s| s.parse()).transpose()?;

    let results = generate(&config, attempts, seed)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
