use crate::config::FulfillmentConfig;
use crate::error::FulfillmentError;
use crate::intake;
use crate::lifecycle::connect::connect_with_backoff;
use crate::orchestrator::Orchestrator;
use crate::service::FulfillmentService;
use crate::store::OrderStore;
use sorting_robot::{RobotError, SortingRobot};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running fulfillment pipeline.
///
/// Owns the processing loop task and the cancellation signal. Clients talk to it through
/// [`FulfillmentSystem::service`], which can be cloned freely.
///
/// # Example
///
/// ```
/// use fulfillment::{FulfillmentConfig, FulfillmentSystem, Order};
/// use sorting_robot::{Item, RobotActor, SortingRobot};
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, robot) = RobotActor::new(16);
///     tokio::spawn(actor.run());
///     robot.load_items(vec![Item::new("x", "Widget")]).await.unwrap();
///
///     let system = FulfillmentSystem::with_robot(FulfillmentConfig::default(), robot).unwrap();
///     let ack = system
///         .service
///         .submit_orders(vec![Order::new("A", vec![Item::new("x", "Widget")])])
///         .unwrap();
///     system.service.wait_for_batch(ack.batch).await.unwrap();
///
///     system.shutdown().await.unwrap();
/// }
/// ```
pub struct FulfillmentSystem {
    pub service: FulfillmentService,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl FulfillmentSystem {
    /// Connects to the robot with bounded backoff, then starts processing.
    ///
    /// `connect` is called once per attempt with the 1-based attempt number.
    pub async fn start<R, F, Fut>(
        config: FulfillmentConfig,
        connect: F,
    ) -> Result<Self, FulfillmentError>
    where
        R: SortingRobot + 'static,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<R, RobotError>>,
    {
        config.validate()?;
        let robot = match connect_with_backoff(&config.connect, connect).await {
            Ok(robot) => robot,
            Err(e) => {
                error!(error = %e, "Robot unreachable, not starting");
                return Err(e);
            }
        };
        Self::with_robot(config, robot)
    }

    /// Starts processing with an already connected robot. Must be called inside a Tokio
    /// runtime.
    pub fn with_robot<R>(config: FulfillmentConfig, robot: R) -> Result<Self, FulfillmentError>
    where
        R: SortingRobot + 'static,
    {
        config.validate()?;

        let store = Arc::new(OrderStore::new(config.resolver()));
        let (intake_sender, intake_receiver) = intake::channel();
        let (cancel, cancel_receiver) = watch::channel(false);

        let orchestrator = Orchestrator::new(robot, store.clone(), &config);
        let handle = tokio::spawn(orchestrator.run(intake_receiver, cancel_receiver));

        info!(
            cubby_slots = config.cubby_slots,
            robot_call_timeout_ms = config.robot_call_timeout_ms,
            "Fulfillment system started"
        );
        Ok(Self {
            service: FulfillmentService::new(intake_sender, store),
            cancel,
            handle,
        })
    }

    /// Stops the processing loop and waits for it to exit.
    ///
    /// The batch in flight stops at its next item slot; batches still queued are dropped and
    /// their waiters see [`FulfillmentError::IntakeClosed`]. Clones of the service keep
    /// answering status queries from the store afterwards.
    pub async fn shutdown(self) -> Result<(), FulfillmentError> {
        info!("Shutting down fulfillment system...");
        self.cancel.send_replace(true);
        drop(self.service);

        if let Err(e) = self.handle.await {
            error!("Processing task failed: {:?}", e);
            return Err(FulfillmentError::TaskFailed(e.to_string()));
        }

        info!("Fulfillment system shutdown complete.");
        Ok(())
    }
}
