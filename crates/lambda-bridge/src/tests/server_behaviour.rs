//! Behavioural tests for the invocation server lifecycle.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{FailingInit, NeedsServiceA, RunningServer, local_server, suffix_handler};
use crate::health::Health;
use crate::protocol::InvokeResponse;
use crate::server::{InvocationServer, ServerError, ServerState};

type StepResult = Result<(), String>;

/// Scenario world shared across steps.
#[derive(Default)]
struct ServerWorld {
    health: Health,
    pending: Option<InvocationServer>,
    running: Option<RunningServer>,
    init_error: Option<ServerError>,
    response: Option<InvokeResponse>,
    run_result: Option<Result<(), ServerError>>,
}

impl ServerWorld {
    fn running(&self) -> Result<&RunningServer, String> {
        self.running
            .as_ref()
            .ok_or_else(|| "server was not started".to_owned())
    }

    fn response(&self) -> Result<&InvokeResponse, String> {
        self.response
            .as_ref()
            .ok_or_else(|| "no invocation was made".to_owned())
    }
}

#[fixture]
fn world() -> RefCell<ServerWorld> {
    RefCell::new(ServerWorld::default())
}

#[given("a server whose handler suffixes strings with the request id")]
fn given_suffix_server(world: &RefCell<ServerWorld>) {
    let mut world = world.borrow_mut();
    let server = local_server(suffix_handler(), &world.health);
    world.pending = Some(server);
}

#[given("a server whose handler needs ServiceA")]
fn given_dependent_server(world: &RefCell<ServerWorld>) {
    let mut world = world.borrow_mut();
    let server = local_server(NeedsServiceA::default(), &world.health);
    world.pending = Some(server);
}

#[given("a server whose handler fails to initialise")]
fn given_failing_server(world: &RefCell<ServerWorld>) {
    let mut world = world.borrow_mut();
    let server = local_server(FailingInit, &world.health);
    world.pending = Some(server);
}

#[when("the server is initialised")]
fn when_initialised(world: &RefCell<ServerWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let server = world
        .pending
        .as_mut()
        .ok_or_else(|| "no server configured".to_owned())?;
    if let Err(error) = server.init() {
        world.init_error = Some(error);
    }
    Ok(())
}

#[when("the server is started")]
fn when_started(world: &RefCell<ServerWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let server = world
        .pending
        .take()
        .ok_or_else(|| "no server configured".to_owned())?;
    world.running = Some(RunningServer::start(server));
    Ok(())
}

#[when("the payload {payload} is invoked with request id {request_id}")]
fn when_invoked(world: &RefCell<ServerWorld>, payload: String, request_id: String) -> StepResult {
    let response = world.borrow().running()?.invoke(payload.as_bytes(), &request_id);
    world.borrow_mut().response = Some(response);
    Ok(())
}

#[when("the server is stopped")]
fn when_stopped(world: &RefCell<ServerWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let running = world
        .running
        .as_mut()
        .ok_or_else(|| "server was not started".to_owned())?;
    let result = running.shutdown();
    world.run_result.get_or_insert(result);
    Ok(())
}

#[then("the response payload is {payload}")]
fn then_payload(world: &RefCell<ServerWorld>, payload: String) -> StepResult {
    let world = world.borrow();
    let response = world.response()?;
    if let Some(error) = &response.error {
        return Err(format!("unexpected handler error: {error:?}"));
    }
    let actual = String::from_utf8_lossy(&response.payload);
    if actual == payload {
        Ok(())
    } else {
        Err(format!("expected payload {payload}, got {actual}"))
    }
}

#[then("the response error is \"{message}\"")]
fn then_response_error(world: &RefCell<ServerWorld>, message: String) -> StepResult {
    let world = world.borrow();
    let error = world
        .response()?
        .error
        .as_ref()
        .ok_or_else(|| "invocation succeeded unexpectedly".to_owned())?;
    if error.message == message {
        Ok(())
    } else {
        Err(format!("expected error {message:?}, got {:?}", error.message))
    }
}

#[then("initialisation fails mentioning \"{name}\"")]
fn then_init_mentions(world: &RefCell<ServerWorld>, name: String) -> StepResult {
    let world = world.borrow();
    let error = world
        .init_error
        .as_ref()
        .ok_or_else(|| "initialisation succeeded unexpectedly".to_owned())?;
    if error.to_string().contains(&name) {
        Ok(())
    } else {
        Err(format!("error {error} does not mention {name}"))
    }
}

#[then("initialisation fails with exactly \"{message}\"")]
fn then_init_exact(world: &RefCell<ServerWorld>, message: String) -> StepResult {
    let world = world.borrow();
    let error = world
        .init_error
        .as_ref()
        .ok_or_else(|| "initialisation succeeded unexpectedly".to_owned())?;
    let actual = error.to_string();
    if actual == message {
        Ok(())
    } else {
        Err(format!("expected {message:?}, got {actual:?}"))
    }
}

#[then("the server has stopped cleanly")]
fn then_stopped(world: &RefCell<ServerWorld>) -> StepResult {
    let world = world.borrow();
    match &world.run_result {
        Some(Ok(())) => {}
        Some(Err(error)) => return Err(format!("run failed: {error}")),
        None => return Err("server was never stopped".to_owned()),
    }
    let state = world.running()?.server.state();
    if state == ServerState::Stopped {
        Ok(())
    } else {
        Err(format!("expected stopped, found {state}"))
    }
}

#[then("the server reports healthy")]
fn then_healthy(world: &RefCell<ServerWorld>) {
    let world = world.borrow();
    let deadline = Instant::now() + Duration::from_secs(2);
    while !world.health.is_healthy() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(world.health.is_healthy(), "server never reported healthy");
}

#[then("the server reports unhealthy")]
fn then_unhealthy(world: &RefCell<ServerWorld>) {
    assert!(!world.borrow().health.is_healthy());
}

#[scenario(path = "tests/features/invocation_server.feature")]
fn invocation_server(world: RefCell<ServerWorld>) -> Result<(), String> {
    let _ = world;
    Ok(())
}
