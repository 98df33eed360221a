//! Training Server Binary
//!
//! Accepts dataset uploads, runs background training jobs, and manages the
//! resulting model bundles.

use blendprop::*;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log();
    training::Server::run(config::TrainerArgs::parse()).await
}
