use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::catalog::Family;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the first admin user (no-op if the username exists).
    CreateAdmin(CreateAdminArgs),
    /// Print the partition table.
    Catalog(CatalogArgs),
}

#[derive(Args)]
pub struct CreateAdminArgs {
    /// Data directory of the server's filesystem store.
    #[arg(long, default_value = "workspace-app")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,
}

impl fmt::Debug for CreateAdminArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateAdminArgs")
            .field("data_dir", &self.data_dir)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Only list partitions of this family.
    #[arg(long, value_enum)]
    pub family: Option<Family>,
}
