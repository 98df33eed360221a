//! Prediction Server Binary
//!
//! Loads one model bundle and serves blend property predictions over HTTP.

use blendprop::*;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log();
    inference::Server::run(config::PredictorArgs::parse()).await
}
