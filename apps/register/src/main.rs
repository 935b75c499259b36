//! # Stand Register Entry Point
//!
//! ## Startup Sequence
//! 1. Parse the command line
//! 2. Initialize tracing (logging to stderr)
//! 3. Load AppConfig (file, then `STAND_*` environment)
//! 4. Connect to the database and run migrations
//! 5. Run the command and print its outcome
//!
//! The actual setup is in lib.rs so it can be tested without the binary.

fn main() -> std::process::ExitCode {
    stand_register::run()
}
