//! Tests for the invocation listener.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use super::{
    BlockingHandler, ConnectionHandler, ConnectionTracker, CountingHandler, InvocationListener,
    ListenerError, run_accept_loop,
};

#[derive(Clone)]
struct CountingFixture {
    count: Arc<AtomicUsize>,
    handler: Arc<CountingHandler>,
}

#[fixture]
fn counting_fixture() -> CountingFixture {
    let (count, handler) = CountingHandler::new();
    CountingFixture { count, handler }
}

#[fixture]
fn listener() -> InvocationListener {
    InvocationListener::bind("127.0.0.1", 0).expect("bind tcp listener")
}

fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn spawn_loop(
    listener: InvocationListener,
    handler: Arc<dyn ConnectionHandler>,
) -> (
    Arc<AtomicBool>,
    Arc<ConnectionTracker>,
    thread::JoinHandle<Result<(), ListenerError>>,
) {
    let closed = Arc::new(AtomicBool::new(false));
    let tracker = ConnectionTracker::new();
    let handle = {
        let closed = Arc::clone(&closed);
        let tracker = Arc::clone(&tracker);
        thread::spawn(move || run_accept_loop(&listener, &closed, &handler, &tracker))
    };
    (closed, tracker, handle)
}

#[rstest]
fn ephemeral_port_is_reported(listener: InvocationListener) {
    assert_ne!(listener.local_addr().port(), 0);
}

#[rstest]
fn tcp_listener_accepts_connections(
    listener: InvocationListener,
    counting_fixture: CountingFixture,
) {
    let addr = listener.local_addr();
    let CountingFixture { count, handler } = counting_fixture;
    let (closed, _tracker, handle) = spawn_loop(listener, handler);

    TcpStream::connect(addr).expect("connect first client");
    TcpStream::connect(addr).expect("connect second client");

    assert!(wait_for_count(&count, 2), "expected two connections");
    closed.store(true, Ordering::SeqCst);
    handle
        .join()
        .expect("join listener")
        .expect("closing is a clean exit");
}

#[rstest]
fn close_flag_ends_loop_without_waiting_for_connections(listener: InvocationListener) {
    let addr = listener.local_addr();
    let (handler, entered, release) = BlockingHandler::new();
    let (closed, tracker, handle) = spawn_loop(listener, handler);

    let _client = TcpStream::connect(addr).expect("connect client");
    entered
        .recv_timeout(Duration::from_secs(2))
        .expect("connection should reach the handler");

    closed.store(true, Ordering::SeqCst);
    handle
        .join()
        .expect("join listener")
        .expect("closing is a clean exit");
    assert_eq!(tracker.in_flight(), 1);

    release.send(()).expect("release connection");
    tracker.wait_idle();
    assert_eq!(tracker.in_flight(), 0);
}

#[test]
fn binding_an_occupied_port_fails() {
    let reserved = TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
    let port = reserved.local_addr().expect("local addr").port();
    let error = InvocationListener::bind("127.0.0.1", port).expect_err("bind should fail");
    assert!(matches!(error, ListenerError::BindTcp { .. }));
}

