use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match busflow_cli::cli::app::run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
