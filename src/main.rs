mod app;
mod cli;
mod configuration;
mod context;
mod points;
mod rest;
mod storage;
mod tracing;
mod uploads;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
