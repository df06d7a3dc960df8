mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use availability_intake::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
