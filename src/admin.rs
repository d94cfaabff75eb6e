use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context as _;

use crate::app::auth::{Credentials, UserDirectory};
use crate::app::document_store::LocalFsDocumentStore;
use crate::catalog::{Catalog, Family};
use crate::cli::{CatalogArgs, CreateAdminArgs};

pub async fn create_admin(args: CreateAdminArgs) -> anyhow::Result<()> {
    let store = Arc::new(LocalFsDocumentStore::new(&args.data_dir));
    let users = UserDirectory::new(store);

    if users
        .find_by_username(&args.username)
        .await
        .context("look up user")?
        .is_some()
    {
        tracing::info!(username = %args.username.trim(), "admin user already exists");
        println!("admin user already exists: {}", args.username.trim());
        return Ok(());
    }

    let user = users
        .register(Credentials {
            username: Some(args.username),
            password: Some(args.password),
        })
        .await
        .context("register admin user")?;
    println!("created admin user: {}", user.username);
    Ok(())
}

/// Tab-separated: family, model, collection, level, grade, type key.
pub fn print_catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = Catalog::new();
    let families = match args.family {
        Some(family) => vec![family],
        None => Family::ALL.to_vec(),
    };

    let mut out = std::io::stdout().lock();
    for family in families {
        for p in catalog.partitions(family) {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                p.family,
                p.model,
                p.collection,
                p.level,
                p.grade,
                p.type_key.unwrap_or("-")
            )
            .context("write catalog")?;
        }
    }
    Ok(())
}
