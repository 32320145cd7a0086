//! Server and CLI glue for the calculus problem solver.

pub mod config;
pub mod web;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use calc_llm::GeminiClient;
use calc_problem::Solver;

use crate::config::CalcConfig;

/// Read the API key named by `config.api_key_env`.
pub fn api_key(config: &CalcConfig) -> Result<String> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!(
            "no se encontró la clave de API: define la variable de entorno {}",
            config.api_key_env
        ),
    }
}

/// A solver that falls back to Gemini for problems without an explicit
/// expression.
pub fn build_solver(config: &CalcConfig, api_key: &str) -> Result<Solver> {
    let mut builder = GeminiClient::builder(api_key)
        .model(&config.model)
        .timeout(Duration::from_secs(config.timeout_secs));
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint(endpoint);
    }
    let client = builder.build().context("building the Gemini client")?;

    Ok(Solver::new()
        .with_model(Arc::new(client))
        .with_steps(config.collect_steps))
}
