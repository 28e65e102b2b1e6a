use std::process::ExitCode;

fn main() -> ExitCode {
    match shuttled::run_bridge() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "shuttled::process", error = %error, "bridge exited");
            ExitCode::FAILURE
        }
    }
}
