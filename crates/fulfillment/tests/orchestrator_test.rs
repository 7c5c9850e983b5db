use fulfillment::intake::{self, Batch};
use fulfillment::store::{OrderStore, StoreError};
use fulfillment::{
    FulfillmentConfig, FulfillmentError, FulfillmentService, ItemStatus, Order, OrderId,
    OrderStatus, Orchestrator,
};
use sorting_robot::mock::{create_mock_robot, MockRobot};
use sorting_robot::{Cubby, Item, RobotClient, RobotError};
use std::sync::Arc;
use tokio::sync::watch;

fn item(code: &str) -> Item {
    Item::new(code, code)
}

fn order(id: &str, codes: &[&str]) -> Order {
    Order::new(id, codes.iter().map(|code| item(code)).collect())
}

fn batch(sequence: u64, orders: Vec<Order>) -> Batch {
    Batch { sequence, orders }
}

struct Harness {
    store: Arc<OrderStore>,
    orchestrator: Orchestrator<RobotClient>,
    cancel: watch::Sender<bool>,
}

impl Harness {
    fn new(robot: RobotClient) -> Self {
        Self::with_config(robot, FulfillmentConfig::default())
    }

    fn with_config(robot: RobotClient, config: FulfillmentConfig) -> Self {
        let store = Arc::new(OrderStore::new(config.resolver()));
        let orchestrator = Orchestrator::new(robot, store.clone(), &config);
        let (cancel, _) = watch::channel(false);
        Self {
            store,
            orchestrator,
            cancel,
        }
    }

    fn status(&self, id: &str) -> OrderStatus {
        self.store.get_order_data(&OrderId::from(id)).unwrap().status
    }
}

/// Real orchestrator and store, mocked robot.
/// Single order, robot offers the wanted item and the move succeeds.
#[tokio::test]
async fn test_single_item_order_becomes_ready() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("x"));
    mock.expect_move().return_ok();

    let harness = Harness::new(mock.client());
    let report = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;

    assert_eq!(harness.status("A"), OrderStatus::Ready);
    assert_eq!(report.placed(), 1);
    assert_eq!(report.aborted().count(), 0);

    // The item went into the cubby assigned at admission
    let assigned = harness.store.get_order_data(&OrderId::from("A")).unwrap().cubby;
    assert_eq!(mock.moves(), vec![assigned]);
    mock.verify();
}

/// An unwanted item leaves the order untouched and is dropped into the reject cubby.
#[tokio::test]
async fn test_unwanted_item_changes_nothing() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("y"));
    mock.expect_move_to(Cubby::new("reject")).return_ok();

    let harness = Harness::new(mock.client());
    let report = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;

    let data = harness.store.get_order_data(&OrderId::from("A")).unwrap();
    assert!(data.item_statuses.is_empty());
    assert_eq!(data.status, OrderStatus::Pending);
    assert_eq!(report.misses(), 1);
    assert!(report.outcomes[0].error.is_none());
    assert_eq!(mock.moves(), vec![Cubby::new("reject")]);
    mock.verify();
}

#[tokio::test]
async fn test_unwanted_item_goes_to_reject_cubby_by_default() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("y"));
    mock.expect_move_to(Cubby::new("reject")).return_ok();
    mock.expect_select().return_ok(item("x"));
    mock.expect_move().return_ok();

    let harness = Harness::new(mock.client());
    let report = harness
        .orchestrator
        .process_batch(
            &batch(1, vec![order("A", &["x"]), order("B", &["x"])]),
            &harness.cancel.subscribe(),
        )
        .await;

    // A's only slot was spent on the unwanted item; B's slot delivered A's x
    assert_eq!(report.misses(), 1);
    assert_eq!(harness.status("A"), OrderStatus::Ready);
    assert_eq!(harness.status("B"), OrderStatus::Pending);
    mock.verify();
}

#[tokio::test]
async fn test_disabled_reject_cubby_moves_nothing() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("y"));

    let config = FulfillmentConfig {
        reject_cubby: None,
        ..FulfillmentConfig::default()
    };
    let harness = Harness::with_config(mock.client(), config);
    let report = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;

    assert_eq!(report.misses(), 1);
    assert_eq!(harness.status("A"), OrderStatus::Pending);
    assert!(mock.moves().is_empty());
    mock.verify();
}

#[tokio::test]
async fn test_failed_reject_move_fails_the_order() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("y"));
    mock.expect_move_to(Cubby::new("reject"))
        .return_err(RobotError::Transport("arm jammed".into()));

    let harness = Harness::new(mock.client());
    let report = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;

    assert_eq!(harness.status("A"), OrderStatus::Failed);
    assert_eq!(report.aborted().count(), 1);
    assert!(report.outcomes[0].error.as_ref().unwrap().is_robot());
    mock.verify();
}

/// A failed move marks the order Failed without stopping the loop:
/// a later batch still completes.
#[tokio::test]
async fn test_move_failure_fails_only_that_order() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("x"));
    mock.expect_move()
        .return_err(RobotError::Transport("arm jammed".into()));
    mock.expect_select().return_ok(item("x"));
    mock.expect_move().return_ok();

    let harness = Harness::new(mock.client());
    let cancel = harness.cancel.subscribe();

    let first = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &cancel)
        .await;
    assert_eq!(harness.status("A"), OrderStatus::Failed);
    assert_eq!(
        first.outcomes[0].error,
        Some(FulfillmentError::Robot(RobotError::Transport(
            "arm jammed".into()
        )))
    );

    let second = harness
        .orchestrator
        .process_batch(&batch(2, vec![order("B", &["x"])]), &cancel)
        .await;
    assert_eq!(harness.status("B"), OrderStatus::Ready);
    assert_eq!(harness.status("A"), OrderStatus::Failed);
    assert_eq!(second.placed(), 1);
    mock.verify();
}

#[tokio::test]
async fn test_select_failure_aborts_remaining_slots() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_err(RobotError::NoItemsAvailable);
    // B is still attempted after A gives up
    mock.expect_select().return_ok(item("y"));
    mock.expect_move().return_ok();

    let harness = Harness::new(mock.client());
    let report = harness
        .orchestrator
        .process_batch(
            &batch(1, vec![order("A", &["x", "x", "x"]), order("B", &["y"])]),
            &harness.cancel.subscribe(),
        )
        .await;

    assert_eq!(harness.status("A"), OrderStatus::Failed);
    assert_eq!(harness.status("B"), OrderStatus::Ready);
    assert_eq!(
        harness
            .store
            .get_order_data(&OrderId::from("A"))
            .unwrap()
            .item_statuses,
        vec![ItemStatus::Failed]
    );
    assert_eq!(report.aborted().count(), 1);
    mock.verify();
}

/// Items are credited to the order whose destination they filled, not to the order whose slot
/// happened to be processed.
#[tokio::test]
async fn test_items_are_attributed_to_their_destination_order() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("y"));
    mock.expect_move().return_ok();
    mock.expect_select().return_ok(item("x"));
    mock.expect_move().return_ok();

    let harness = Harness::new(mock.client());
    harness
        .orchestrator
        .process_batch(
            &batch(1, vec![order("A", &["x"]), order("B", &["y"])]),
            &harness.cancel.subscribe(),
        )
        .await;

    let a = harness.store.get_order_data(&OrderId::from("A")).unwrap();
    let b = harness.store.get_order_data(&OrderId::from("B")).unwrap();
    assert_eq!(a.status, OrderStatus::Ready);
    assert_eq!(b.status, OrderStatus::Ready);
    assert_eq!(mock.moves(), vec![b.cubby, a.cubby]);
    mock.verify();
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_robot_times_out() {
    // Requests are queued but never answered
    let (robot, _requests) = create_mock_robot(4);
    let config = FulfillmentConfig {
        robot_call_timeout_ms: 50,
        ..FulfillmentConfig::default()
    };

    let harness = Harness::with_config(robot, config);
    let report = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;

    assert_eq!(harness.status("A"), OrderStatus::Failed);
    let error = report.outcomes[0].error.clone().unwrap();
    assert_eq!(
        error,
        FulfillmentError::RobotTimeout {
            operation: "select_item",
            timeout_ms: 50,
        }
    );
    assert!(error.is_robot());
}

#[tokio::test]
async fn test_cancelled_batch_touches_no_robot() {
    let mock = MockRobot::new();
    let harness = Harness::new(mock.client());
    harness.cancel.send_replace(true);

    let report = harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;

    assert!(report.cancelled);
    assert!(report.outcomes.is_empty());
    // Admission already happened; the order just never progressed
    assert_eq!(harness.status("A"), OrderStatus::Pending);
    mock.verify();
}

#[tokio::test]
async fn test_rejected_orders_are_reported_and_skipped() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("x"));
    mock.expect_move().return_ok();

    let config = FulfillmentConfig {
        cubby_slots: 1,
        ..FulfillmentConfig::default()
    };
    let harness = Harness::with_config(mock.client(), config);
    let report = harness
        .orchestrator
        .process_batch(
            &batch(1, vec![order("A", &["x"]), order("B", &["x"])]),
            &harness.cancel.subscribe(),
        )
        .await;

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].order_id, OrderId::from("B"));
    assert!(matches!(
        report.rejected[0].error,
        StoreError::CapacityExhausted { .. }
    ));
    assert!(harness
        .store
        .get_order_data(&OrderId::from("B"))
        .unwrap_err()
        .is_not_found());
    mock.verify();
}

/// Scenario: a failed order is forced to Ready by a manual mark-fulfilled.
#[tokio::test]
async fn test_mark_fulfilled_overrides_failure() {
    let mut mock = MockRobot::new();
    mock.expect_select().return_ok(item("x"));
    mock.expect_move()
        .return_err(RobotError::NoItemSelected);

    let harness = Harness::new(mock.client());
    harness
        .orchestrator
        .process_batch(&batch(1, vec![order("A", &["x"])]), &harness.cancel.subscribe())
        .await;
    assert_eq!(harness.status("A"), OrderStatus::Failed);

    let (intake_sender, _intake_receiver) = intake::channel();
    let service = FulfillmentService::new(intake_sender, harness.store.clone());
    service.mark_fulfilled(&OrderId::from("A")).unwrap();

    let status = service.get_order_status(&OrderId::from("A")).unwrap();
    assert_eq!(status.status, OrderStatus::Ready);
    assert_eq!(status.order, order("A", &["x"]));

    let missing = service.mark_fulfilled(&OrderId::from("nope")).unwrap_err();
    assert!(missing.is_not_found());
    mock.verify();
}
