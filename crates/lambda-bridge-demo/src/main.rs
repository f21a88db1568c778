//! Demo server that logs the data of every stream record it receives.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    lambda_bridge_demo::run(&mut io::stderr().lock())
}
