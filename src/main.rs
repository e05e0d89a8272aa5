use std::process;

use clap::Parser;
use clap::error::ErrorKind;
use matchdb::{Opts, import};

#[tokio::main]
async fn main() {
    env_logger::init();

    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = import::run(&opts).await {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}
