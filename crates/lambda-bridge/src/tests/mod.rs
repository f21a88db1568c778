//! Test suites for the invocation server.

mod server_behaviour;
mod support;
