// src/main.rs

use termdeck::{cli, logging, run};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("termdeck error: {err:?}");
            1
        }
    };
    // The stdin reader may still be parked in a blocking read; exit without
    // waiting for the runtime to wind down.
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
