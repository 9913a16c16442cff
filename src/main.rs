use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match workbench_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("workbench: {e}");
            ExitCode::FAILURE
        }
    }
}
