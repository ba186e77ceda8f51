//! Sanity-check the input datasets and model artifacts: row counts,
//! year span, entity counts, and which districts the forecast endpoint
//! would silently skip for lack of a model. Exits non-zero when the
//! datasets do not load.

use anyhow::Result;
use dashmetrics::{config::Config, data, forecast::ModelStore, report, security};
use std::collections::HashSet;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = Config::from_env();
    let dataset = data::load_dataset(&config.data_dir)?;

    println!("financial rows:   {}", dataset.financial.len());
    println!("hr rows:          {}", dataset.hr.len());
    println!("supply rows:      {}", dataset.supply.len());
    println!("rd rows:          {}", dataset.rd.len());
    println!("security rows:    {}", dataset.security.len());

    let years = report::available_years(&dataset);
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => println!("financial years:  {}..={}", first, last),
        _ => println!("financial years:  none"),
    }

    let employees: HashSet<&str> = dataset
        .hr
        .rows
        .iter()
        .map(|r| r.employee_id.as_str())
        .collect();
    let departments: HashSet<&str> = dataset
        .hr
        .rows
        .iter()
        .map(|r| r.department.as_str())
        .collect();
    let suppliers: HashSet<&str> = dataset
        .supply
        .rows
        .iter()
        .map(|r| r.supplier.as_str())
        .collect();
    let projects: HashSet<&str> = dataset
        .rd
        .rows
        .iter()
        .map(|r| r.project_id.as_str())
        .collect();
    println!("employees:        {}", employees.len());
    println!("departments:      {}", departments.len());
    println!("suppliers:        {}", suppliers.len());
    println!("rd projects:      {}", projects.len());

    let store = ModelStore::new(&config.models_dir);
    let artifacts = store.list_artifacts()?;
    println!("model artifacts:  {}", artifacts.len());

    // Districts without a model are silently left out of forecast
    // responses, so surface them here where someone will notice.
    let mut unmodeled = Vec::new();
    for district in security::incident_series(&dataset).keys() {
        if !store.artifact_path(district).exists() {
            unmodeled.push(district.clone());
        }
    }
    if unmodeled.is_empty() {
        println!("every district has a model artifact");
    } else {
        println!("districts without a model: {}", unmodeled.join(", "));
    }

    Ok(())
}
