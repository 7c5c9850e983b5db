//! Demo run against the in-process robot simulator.
//!
//! Loads a cargo, submits two batches and prints the resulting statuses. Settings come from
//! `FULFILLMENT_*` variables (a `.env` file is honored); log level from `RUST_LOG`.

use fulfillment::lifecycle::setup_tracing;
use fulfillment::{FulfillmentConfig, FulfillmentSystem, Order};
use sorting_robot::{Item, RobotActor, SortingRobot};
use tracing::{info, warn, Instrument};

fn widget() -> Item {
    Item::new("x", "Widget")
}

fn gadget() -> Item {
    Item::new("y", "Gadget")
}

fn gizmo() -> Item {
    Item::new("z", "Gizmo")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    setup_tracing();

    let config = FulfillmentConfig::from_env()?;
    info!(?config, "Starting fulfillment demo");

    let (robot_actor, robot) = RobotActor::new(32);
    let robot_handle = tokio::spawn(robot_actor.run());

    robot
        .load_items(vec![widget(), gadget(), widget(), gizmo(), gadget()])
        .instrument(tracing::info_span!("loading"))
        .await?;

    let connector = robot.clone();
    let system = FulfillmentSystem::start(config, move |attempt| {
        let robot = connector.clone();
        async move {
            info!(attempt, "Probing robot");
            robot.audit_state().await.map(|_| robot)
        }
    })
    .await?;

    let first = system.service.submit_orders(vec![
        Order::new("A", vec![widget(), gadget()]),
        Order::new("B", vec![widget()]),
    ])?;
    let second = system
        .service
        .submit_orders(vec![Order::new("C", vec![gizmo(), gadget()])])?;
    info!(first = %first.message, second = %second.message, "Batches submitted");

    system.service.wait_for_batch(second.batch).await?;

    let mut statuses = system.service.get_all_orders_status()?;
    statuses.sort_by(|a, b| a.order.id.cmp(&b.order.id));
    for status in &statuses {
        info!(
            order_id = %status.order.id,
            cubby = %status.cubby,
            status = %status.status,
            "Order status"
        );
    }

    let audit = robot.audit_state().await?;
    if !audit.remaining.is_empty() {
        warn!(remaining = audit.remaining.len(), "Cargo left on the robot");
    }
    info!(placed = audit.placed(), "Robot audit");

    system.shutdown().await?;
    drop(robot);
    robot_handle.await?;
    Ok(())
}
