use anyhow::Result;
use clap::Parser;
use utils::version;

use ups_tainter::app::daemon;
use ups_tainter::app::Evaluator;
use ups_tainter::config::Cli;
use ups_tainter::config::Commands;
use ups_tainter::config::DaemonArgs;
use ups_tainter::config::RunArgs;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();
    let _guard = utils::logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(daemon_args) => run_daemon(*daemon_args).await,
        Commands::Once(run_args) => run_once(*run_args).await,
    }
}

async fn run_daemon(daemon_args: DaemonArgs) -> Result<()> {
    tracing::info!("Starting ups-tainter daemon {}", &**version::VERSION);

    let evaluator = Evaluator::init(&daemon_args.run)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    daemon::run(evaluator, daemon_args.interval()).await;
    Ok(())
}

async fn run_once(run_args: RunArgs) -> Result<()> {
    tracing::info!("Running ups-tainter {} once", &**version::VERSION);

    let evaluator = Evaluator::init(&run_args)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    let report = evaluator
        .run_cycle()
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    if report.failed() > 0 {
        tracing::warn!(failed = report.failed(), "some nodes could not be patched");
    }
    Ok(())
}
