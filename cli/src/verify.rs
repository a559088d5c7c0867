//! End-to-end verification against a disposable PostgreSQL instance.
//!
//! Boots an ephemeral container, replays every generated up migration in
//! order, every down migration in reverse, then the ups once more to prove
//! the down scripts leave a clean slate. Runs strictly after the core has
//! written its output.

use anyhow::{Context, Result};
use log::{debug, info};
use postgres::{Client, NoTls};
use std::fs;
use std::path::{Path, PathBuf};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::SyncRunner;

pub fn verify_output(output_dir: &Path) -> Result<()> {
    let ups = sorted_files(output_dir, ".up.sql")?;
    let downs = sorted_files(output_dir, ".down.sql")?;
    if ups.is_empty() {
        anyhow::bail!("nothing to verify in {}", output_dir.display());
    }

    info!("starting postgres container");
    let container = Postgres::default()
        .start()
        .context("starting postgres container (is Docker running?)")?;
    let port = container
        .get_host_port_ipv4(5432)
        .context("resolving mapped container port")?;
    let mut client = Client::connect(
        &format!("host=127.0.0.1 port={port} user=postgres password=postgres dbname=postgres"),
        NoTls,
    )
    .context("connecting to postgres")?;
    info!("container ready on port {port}");

    replay(&mut client, &ups)?;
    let mut reversed = downs.clone();
    reversed.reverse();
    replay(&mut client, &reversed)?;
    replay(&mut client, &ups)?;

    Ok(())
}

fn replay(client: &mut Client, files: &[PathBuf]) -> Result<()> {
    for path in files {
        debug!("applying {}", path.display());
        let sql = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        client
            .batch_execute(&sql)
            .with_context(|| format!("applying {}", path.display()))?;
    }
    Ok(())
}

/// Migration files with the given suffix, in name order. Zero-padded
/// numbering makes that numeric order.
fn sorted_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            name.ends_with(suffix).then(|| path.clone())
        })
        .collect();
    files.sort();
    Ok(files)
}
