use clap::Parser;
use std::process;
use tracing::Level;

use terminatord::args::Args;
use terminatord::driver;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().json().with_max_level(level).init();

    tracing::info!(
        in_cluster = args.cluster.in_cluster,
        namespace = args.termination.namespace,
        one_shot = args.termination.one_shot,
        "terminatord is started"
    );

    let code = driver::run(args).await;
    process::exit(code);
}
