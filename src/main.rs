mod app;
mod cli;
mod logging;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Cli::from_args().into_config();
    app::run(config).await
}
