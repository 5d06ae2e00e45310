pub mod awards;
mod cli;
pub mod config;
pub mod error;
pub mod http;
mod render;
mod server;
pub mod sources;
pub mod telemetry;

use error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
