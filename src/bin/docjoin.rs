//! docjoin CLI tool
//!
//! Joins aligned document index pairs with the column files of both sides.
//! Reads pairs from --indices (default stdin), writes records to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use docjoin::{JoinArgs, JoinConfig};

#[cfg(feature = "low-mem-alloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    // Optional .env with DOCJOIN_* settings, loaded before clap reads the environment
    let _ = dotenvy::dotenv();
    docjoin::logging::init();

    let config = JoinConfig::from(JoinArgs::parse());
    docjoin::run(&config).context("document join failed")?;
    Ok(())
}
