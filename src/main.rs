//! Binary entrypoint that runs the messaging demo session.

use std::process::ExitCode;

use tutor_messaging::start_messaging;

/// Seed fixtures, run the scripted session, and dispose the service.
fn main() -> ExitCode {
    start_messaging::run()
}
