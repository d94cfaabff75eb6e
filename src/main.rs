use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    edupanel::logging::init().context("init logging")?;

    let cli = edupanel::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        edupanel::cli::Command::CreateAdmin(args) => {
            edupanel::admin::create_admin(args)
                .await
                .context("create-admin")?;
        }
        edupanel::cli::Command::Catalog(args) => {
            edupanel::admin::print_catalog(args).context("catalog")?;
        }
    }

    Ok(())
}
