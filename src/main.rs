use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    referral_triage_lib::init_tracing();

    match referral_triage_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
