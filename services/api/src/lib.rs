mod cli;
mod infra;
mod routes;
mod server;
mod shell;

use pmrt_calc::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
