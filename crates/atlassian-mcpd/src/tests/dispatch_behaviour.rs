//! Behavioural tests for command dispatch through the built-in tools.

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use atlassian_config::LogLevel;
use atlassian_mcp_types::Product;

use crate::backend::CommandFault;
use crate::dispatch::{CommandContext, CommandHandler};
use crate::registry::CommandRegistration;

use super::support::{DispatchWorld, tool};

type StepResult = Result<(), String>;

const SETUP_NOTICE: &str = "Atlassian configuration is incomplete";

struct Stalled;

#[async_trait]
impl CommandHandler for Stalled {
    async fn handle(&self, _context: CommandContext) -> Result<Value, CommandFault> {
        std::future::pending::<()>().await;
        Ok(Value::Null)
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given("the backend knows users \"{first}\" and \"{second}\"")]
fn given_users(world: &RefCell<DispatchWorld>, first: String, second: String) {
    world.borrow().backend.set_users(vec![
        json!({"id": "u1", "name": first, "email": "first@example.com"}),
        json!({"id": "u2", "name": second, "email": "second@example.com"}),
    ]);
}

#[given("the backend fails to find issue \"{key}\"")]
fn given_missing_issue(world: &RefCell<DispatchWorld>, key: String) {
    world
        .borrow()
        .backend
        .fail_with(CommandFault::not_found("issue", key));
}

#[given("a registered command \"{name}\" that never finishes")]
fn given_stalled_command(world: &RefCell<DispatchWorld>, name: String) {
    world
        .borrow_mut()
        .register(CommandRegistration::new(tool(&name), Stalled));
}

#[given("the handler timeout is {millis} milliseconds")]
fn given_timeout(world: &RefCell<DispatchWorld>, millis: u64) {
    world
        .borrow_mut()
        .set_timeout(Duration::from_millis(millis));
}

#[given("the server has no instance URL")]
fn given_unconfigured(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().unconfigured();
}

#[given("a \"{name}\" request for product \"{product}\"")]
fn given_request(world: &RefCell<DispatchWorld>, name: String, product: String) -> StepResult {
    let product = product
        .parse::<Product>()
        .map_err(|error| format!("invalid product '{product}': {error}"))?;
    world.borrow_mut().request(&tool(&name), product);
    Ok(())
}

#[given("the subject is \"{subject}\"")]
fn given_subject(world: &RefCell<DispatchWorld>, subject: String) {
    world.borrow_mut().set_subject(&subject);
}

#[given("the parameter \"{name}\" is {value}")]
fn given_parameter(world: &RefCell<DispatchWorld>, name: String, value: String) -> StepResult {
    let value: Value = serde_json::from_str(&value)
        .map_err(|error| format!("parameter value '{value}' is not JSON: {error}"))?;
    world.borrow_mut().set_parameter(&name, value);
    Ok(())
}

#[given("the response fields are \"{fields}\"")]
fn given_fields(world: &RefCell<DispatchWorld>, fields: String) {
    let fields: Vec<&str> = fields.split(',').map(str::trim).collect();
    world.borrow_mut().set_fields(&fields);
}

#[given("the caller asks for \"{level}\" logs")]
fn given_caller_level(world: &RefCell<DispatchWorld>, level: String) -> StepResult {
    let level = parse_level(&level)?;
    world.borrow_mut().set_log_level(level);
    Ok(())
}

#[when("the request is dispatched")]
fn when_dispatched(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().dispatch();
}

#[when("the request names product \"{value}\"")]
fn when_named_product(world: &RefCell<DispatchWorld>, value: String) {
    world.borrow_mut().dispatch_named_product(&value);
}

#[then("the result value is {expected}")]
fn then_value(world: &RefCell<DispatchWorld>, expected: String) -> StepResult {
    let expected: Value = serde_json::from_str(&expected)
        .map_err(|error| format!("expected value is not JSON: {error}"))?;
    let world = world.borrow();
    match world.result().value() {
        Some(value) if *value == expected => Ok(()),
        _ => Err(format!("expected {expected}, got {:?}", world.result())),
    }
}

#[then("the result fails with error type \"{expected}\"")]
fn then_error_type(world: &RefCell<DispatchWorld>, expected: String) -> StepResult {
    let wire = world.borrow().result().to_wire();
    if wire["success"] == json!(false) && wire["error_type"] == json!(expected) {
        Ok(())
    } else {
        Err(format!("expected a {expected} failure, got {wire}"))
    }
}

#[then("the caller received a warning containing \"{text}\"")]
fn then_warning(world: &RefCell<DispatchWorld>, text: String) -> StepResult {
    let warnings = world.borrow().sink.messages_at(LogLevel::Warning);
    if warnings.iter().any(|warning| warning.contains(&text)) {
        Ok(())
    } else {
        Err(format!("no warning contains '{text}': {warnings:?}"))
    }
}

#[then("the caller received {count} setup warning")]
fn then_setup_warnings(world: &RefCell<DispatchWorld>, count: usize) {
    let notices = world
        .borrow()
        .sink
        .messages_at(LogLevel::Warning)
        .into_iter()
        .filter(|message| message.starts_with(SETUP_NOTICE))
        .count();
    assert_eq!(notices, count);
}

#[then("the backend was not called")]
fn then_backend_untouched(world: &RefCell<DispatchWorld>) {
    let calls = world.borrow().backend.calls();
    assert!(calls.is_empty(), "unexpected backend calls: {calls:?}");
}

pub(super) fn parse_level(level: &str) -> Result<LogLevel, String> {
    level
        .parse::<LogLevel>()
        .map_err(|error| format!("invalid level '{level}': {error}"))
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Search results are truncated and projected"
)]
fn search_results_projected(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Unknown commands are not found"
)]
fn unknown_commands(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Unknown products are rejected"
)]
fn unknown_products(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Products a command does not accept are rejected"
)]
fn unaccepted_products(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Blank subjects fail validation"
)]
fn blank_subjects(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Out-of-range parameters fail validation"
)]
fn out_of_range_parameters(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Backend faults keep their category"
)]
fn backend_faults(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "An unconfigured server explains setup once"
)]
fn setup_explained_once(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Health checks run without an instance URL"
)]
fn health_without_instance(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Stalled commands time out as network errors"
)]
fn stalled_commands_time_out(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Unknown commands are not found whatever product they name"
)]
fn unknown_commands_before_products(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Product names are matched without regard to case"
)]
fn product_names_ignore_case(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}
