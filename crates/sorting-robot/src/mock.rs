//! # Mock Robot & Testing Guide
//!
//! `MockRobot` serves the same [`RobotRequest`] protocol as the [`RobotActor`](crate::RobotActor)
//! but answers from a queue of scripted expectations. It hands out an ordinary
//! [`RobotClient`], so code under test cannot tell it apart from the real robot.
//!
//! ## When to use Mocks vs the Simulator
//!
//! | Feature | MockRobot | RobotActor |
//! |---------|-----------|------------|
//! | **Item choice** | Scripted per call | FIFO from the loaded cargo |
//! | **Error Injection** | Easy (`return_err`) | Only the robot's own rule violations |
//! | **Use Case** | Orchestrator logic, failure paths | Full system runs |
//!
//! ## Example
//!
//! ```rust
//! use sorting_robot::mock::MockRobot;
//! use sorting_robot::{Cubby, Item, RobotError, SortingRobot};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockRobot::new();
//!     mock.expect_select().return_ok(Item::new("x", "Widget"));
//!     mock.expect_move().return_err(RobotError::Transport("arm jammed".into()));
//!
//!     let robot = mock.client();
//!     assert_eq!(robot.select_item().await.unwrap().code, "x");
//!     assert!(robot.move_item(Cubby::new("2")).await.is_err());
//!
//!     mock.verify();
//!     assert_eq!(mock.moves(), vec![Cubby::new("2")]);
//! }
//! ```
//!
//! ## Low-level helpers
//!
//! [`create_mock_robot`] returns a client plus the raw request receiver, for tests that want
//! to inspect each request and answer it by hand.

use crate::client::RobotClient;
use crate::error::RobotError;
use crate::message::RobotRequest;
use crate::model::{AuditReport, Cubby, Item};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted answer for the next request.
enum Expectation {
    Load {
        response: Result<(), RobotError>,
    },
    Select {
        response: Result<Item, RobotError>,
    },
    Move {
        cubby: Option<Cubby>,
        response: Result<(), RobotError>,
    },
    Audit {
        response: Result<AuditReport, RobotError>,
    },
}

impl Expectation {
    fn operation(&self) -> &'static str {
        match self {
            Expectation::Load { .. } => "load_items",
            Expectation::Select { .. } => "select_item",
            Expectation::Move { .. } => "move_item",
            Expectation::Audit { .. } => "audit_state",
        }
    }
}

type Shared<T> = Arc<Mutex<T>>;

fn lock<T>(shared: &Shared<T>) -> std::sync::MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock robot with expectation tracking for fluent testing.
///
/// Requests are matched against expectations strictly in order. A request that does not
/// match the next expectation (or arrives when none is left) is answered with
/// [`RobotError::Transport`] and recorded, so [`MockRobot::verify`] fails afterwards.
pub struct MockRobot {
    client: RobotClient,
    expectations: Shared<VecDeque<Expectation>>,
    moves: Shared<Vec<Cubby>>,
    mismatches: Shared<Vec<String>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRobot {
    /// Creates a new mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<RobotRequest>(100);
        let expectations: Shared<VecDeque<Expectation>> = Arc::default();
        let moves: Shared<Vec<Cubby>> = Arc::default();
        let mismatches: Shared<Vec<String>> = Arc::default();

        let task_expectations = expectations.clone();
        let task_moves = moves.clone();
        let task_mismatches = mismatches.clone();

        // Spawn background task to answer requests
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&task_expectations).pop_front();
                let operation = request.operation();

                match (request, expectation) {
                    (
                        RobotRequest::LoadItems { respond_to, .. },
                        Some(Expectation::Load { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (RobotRequest::SelectItem { respond_to }, Some(Expectation::Select { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        RobotRequest::MoveItem { cubby, respond_to },
                        Some(Expectation::Move {
                            cubby: expected,
                            response,
                        }),
                    ) => {
                        lock(&task_moves).push(cubby.clone());
                        match expected {
                            Some(expected) if expected != cubby => {
                                let message =
                                    format!("move_item expected {} but got {}", expected, cubby);
                                lock(&task_mismatches).push(message.clone());
                                let _ = respond_to.send(Err(RobotError::Transport(message)));
                            }
                            _ => {
                                let _ = respond_to.send(response);
                            }
                        }
                    }
                    (
                        RobotRequest::AuditState { respond_to },
                        Some(Expectation::Audit { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        let message = match expectation {
                            Some(expectation) => format!(
                                "unexpected {} (next expectation was {})",
                                operation,
                                expectation.operation()
                            ),
                            None => format!("unexpected {} (no expectations left)", operation),
                        };
                        lock(&task_mismatches).push(message.clone());
                        reject(request, RobotError::Transport(message));
                    }
                }
            }
        });

        Self {
            client: RobotClient::new(sender),
            expectations,
            moves,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> RobotClient {
        self.client.clone()
    }

    /// Expects a `load_items` call.
    pub fn expect_load(&mut self) -> LoadExpectationBuilder {
        LoadExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `select_item` call.
    pub fn expect_select(&mut self) -> SelectExpectationBuilder {
        SelectExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `move_item` call to any cubby.
    pub fn expect_move(&mut self) -> MoveExpectationBuilder {
        MoveExpectationBuilder {
            cubby: None,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `move_item` call to exactly `cubby`.
    pub fn expect_move_to(&mut self, cubby: Cubby) -> MoveExpectationBuilder {
        MoveExpectationBuilder {
            cubby: Some(cubby),
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `audit_state` call.
    pub fn expect_audit(&mut self) -> AuditExpectationBuilder {
        AuditExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Cubbies passed to `move_item`, in call order.
    pub fn moves(&self) -> Vec<Cubby> {
        lock(&self.moves).clone()
    }

    /// Number of expectations not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.expectations).len()
    }

    /// Verifies that all expectations were met and no request was unexpected.
    pub fn verify(&self) {
        let mismatches = lock(&self.mismatches);
        if !mismatches.is_empty() {
            panic!("Unexpected robot requests: {:?}", *mismatches);
        }
        let remaining = self.remaining();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

fn reject(request: RobotRequest, error: RobotError) {
    match request {
        RobotRequest::LoadItems { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        RobotRequest::SelectItem { respond_to } => {
            let _ = respond_to.send(Err(error));
        }
        RobotRequest::MoveItem { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        RobotRequest::AuditState { respond_to } => {
            let _ = respond_to.send(Err(error));
        }
    }
}

/// Builder for `load_items` expectations.
pub struct LoadExpectationBuilder {
    expectations: Shared<VecDeque<Expectation>>,
}

impl LoadExpectationBuilder {
    pub fn return_ok(self) {
        lock(&self.expectations).push_back(Expectation::Load { response: Ok(()) });
    }

    pub fn return_err(self, error: RobotError) {
        lock(&self.expectations).push_back(Expectation::Load {
            response: Err(error),
        });
    }
}

/// Builder for `select_item` expectations.
pub struct SelectExpectationBuilder {
    expectations: Shared<VecDeque<Expectation>>,
}

impl SelectExpectationBuilder {
    pub fn return_ok(self, item: Item) {
        lock(&self.expectations).push_back(Expectation::Select { response: Ok(item) });
    }

    pub fn return_err(self, error: RobotError) {
        lock(&self.expectations).push_back(Expectation::Select {
            response: Err(error),
        });
    }
}

/// Builder for `move_item` expectations.
pub struct MoveExpectationBuilder {
    cubby: Option<Cubby>,
    expectations: Shared<VecDeque<Expectation>>,
}

impl MoveExpectationBuilder {
    pub fn return_ok(self) {
        lock(&self.expectations).push_back(Expectation::Move {
            cubby: self.cubby,
            response: Ok(()),
        });
    }

    pub fn return_err(self, error: RobotError) {
        lock(&self.expectations).push_back(Expectation::Move {
            cubby: self.cubby,
            response: Err(error),
        });
    }
}

/// Builder for `audit_state` expectations.
pub struct AuditExpectationBuilder {
    expectations: Shared<VecDeque<Expectation>>,
}

impl AuditExpectationBuilder {
    pub fn return_ok(self, report: AuditReport) {
        lock(&self.expectations).push_back(Expectation::Audit {
            response: Ok(report),
        });
    }

    pub fn return_err(self, error: RobotError) {
        lock(&self.expectations).push_back(Expectation::Audit {
            response: Err(error),
        });
    }
}

// =============================================================================
// LOW-LEVEL HELPERS
// =============================================================================

/// Creates a client and the raw receiver behind it.
///
/// Nothing answers the requests; the test reads them with [`next_request`] and replies through
/// each request's `respond_to` channel.
pub fn create_mock_robot(buffer_size: usize) -> (RobotClient, mpsc::Receiver<RobotRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (RobotClient::new(sender), receiver)
}

/// Waits for the next request sent through a client from [`create_mock_robot`].
pub async fn next_request(receiver: &mut mpsc::Receiver<RobotRequest>) -> Option<RobotRequest> {
    receiver.recv().await
}
