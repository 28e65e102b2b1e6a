//! Behavioural tests for the session lifecycle over a live listener.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::registry::SessionRegistry;
use crate::session::EndReason;

use super::support::{self, SessionEvent, SessionWorld, WAIT_TIMEOUT};

#[fixture]
fn world() -> RefCell<SessionWorld> {
    support::session_world()
}

fn parse_reason(label: &str) -> EndReason {
    match label {
        "closed" => EndReason::Closed,
        "end_of_stream" => EndReason::EndOfStream,
        "fault" => EndReason::Fault,
        other => panic!("unknown end reason '{other}'"),
    }
}

#[given("a running bridge")]
fn given_running_bridge(world: &RefCell<SessionWorld>) {
    assert!(world.borrow().bridge.registry.is_empty());
}

#[given("a \"{token}\" client")]
fn given_client(world: &RefCell<SessionWorld>, token: String) {
    let mut world = world.borrow_mut();
    let client = world.bridge.connect(&token);
    world.client = Some(client);
}

#[when("the client sends \"{command}\"")]
fn when_client_sends(world: &RefCell<SessionWorld>, command: String) {
    world.borrow_mut().client().send(&command);
}

#[when("a client sends \"{token}\" and \"{command}\" in one write")]
fn when_client_pipelines(world: &RefCell<SessionWorld>, token: String, command: String) {
    let mut world = world.borrow_mut();
    let mut client = world.bridge.connect_raw();
    client.send_raw(format!("{token}\n{command}\n").as_bytes());
    world.client = Some(client);
}

#[when("the client hangs up")]
fn when_client_hangs_up(world: &RefCell<SessionWorld>) {
    let client = world.borrow_mut().client.take().expect("no client connected");
    client.hang_up();
}

#[when("a client hangs up before sending a token")]
fn when_client_hangs_up_early(world: &RefCell<SessionWorld>) {
    world.borrow().bridge.connect_raw().hang_up();
}

#[then("the client receives \"{reply}\"")]
fn then_client_receives(world: &RefCell<SessionWorld>, reply: String) {
    let received = world.borrow_mut().client().read_line();
    assert_eq!(received.as_deref(), Some(reply.as_str()));
}

#[then("the connection closes without a reply")]
fn then_connection_closes(world: &RefCell<SessionWorld>) {
    let rest = world.borrow_mut().client().read_to_end();
    assert!(rest.is_empty(), "unexpected reply: {rest:?}");
}

#[then("the bridge has {count} registered session")]
fn then_registered_singular(world: &RefCell<SessionWorld>, count: usize) {
    assert_registered(world, count);
}

#[then("the bridge has {count} registered sessions")]
fn then_registered_plural(world: &RefCell<SessionWorld>, count: usize) {
    assert_registered(world, count);
}

fn assert_registered(world: &RefCell<SessionWorld>, count: usize) {
    let world = world.borrow();
    assert!(
        world.bridge.wait_for_registered(count),
        "expected {count} registered sessions, found {:?}",
        world.bridge.registry.snapshot()
    );
}

#[then("the reporter records {count} session ended as \"{reason}\"")]
fn then_sessions_ended(world: &RefCell<SessionWorld>, count: usize, reason: String) {
    let reason = parse_reason(&reason);
    let world = world.borrow();
    let reporter = &world.bridge.reporter;
    assert!(
        reporter.wait_for(WAIT_TIMEOUT, |_| reporter.ended_with(reason) == count),
        "expected {count} sessions ended as {reason}: {:?}",
        reporter.events()
    );
}

#[then("the reporter records a handshake failure")]
fn then_handshake_failure(world: &RefCell<SessionWorld>) {
    let world = world.borrow();
    let reporter = &world.bridge.reporter;
    let failed = reporter.wait_for(WAIT_TIMEOUT, |events| {
        events
            .iter()
            .any(|event| matches!(event, SessionEvent::HandshakeFailed(_)))
    });
    assert!(failed, "handshake failure missing: {:?}", reporter.events());
    assert!(
        !reporter
            .events()
            .iter()
            .any(|event| matches!(event, SessionEvent::Started(..))),
        "a session started without a token"
    );
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "A command is answered with exactly one line"
)]
fn command_round_trip(world: RefCell<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Commands pipelined behind the token are not taken as the token"
)]
fn pipelined_command(world: RefCell<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Bye closes the connection without a reply"
)]
fn bye_closes(world: RefCell<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "A peer hanging up ends the session normally"
)]
fn peer_hangs_up(world: RefCell<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "A peer hanging up before the token never registers"
)]
fn peer_hangs_up_before_token(world: RefCell<SessionWorld>) {
    let _ = world;
}
