//! # Fulfillment State Store
//!
//! The shared registry of admitted orders. It owns three structures that must change together:
//!
//! * the order records (items, assigned cubby, item outcomes, optional status override);
//! * the destination index, a FIFO per item code of `(order, cubby)` pairs still waiting for
//!   that code;
//! * the occupied cubbies, used by the [`CubbyResolver`] to keep cubbies distinct.
//!
//! All three live behind one `RwLock`. Queries share the read side; every mutation, including
//! the admission of a whole batch, takes the write side once.

mod error;

pub use error::StoreError;

use crate::cubby::CubbyResolver;
use crate::model::{ItemStatus, Order, OrderData, OrderId, OrderStatus};
use sorting_robot::Cubby;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Where a unit of some item code has to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub order_id: OrderId,
    pub cubby: Cubby,
}

/// An order that made it into the store, with the cubby it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedOrder {
    pub order: Order,
    pub cubby: Cubby,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOrder {
    pub order_id: OrderId,
    pub error: StoreError,
}

/// Result of [`OrderStore::add_orders`], both lists in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admission {
    pub admitted: Vec<AdmittedOrder>,
    pub rejected: Vec<RejectedOrder>,
}

#[derive(Debug)]
struct OrderRecord {
    order: Order,
    cubby: Cubby,
    item_statuses: Vec<ItemStatus>,
    status_override: Option<OrderStatus>,
}

impl OrderRecord {
    fn status(&self) -> OrderStatus {
        self.status_override.unwrap_or_else(|| {
            OrderStatus::derive(self.order.items.len(), &self.item_statuses)
        })
    }

    fn snapshot(&self) -> OrderData {
        OrderData {
            order: self.order.clone(),
            cubby: self.cubby.clone(),
            item_statuses: self.item_statuses.clone(),
            status: self.status(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<OrderId, OrderRecord>,
    destinations: HashMap<String, VecDeque<Destination>>,
    cubbies: HashMap<String, OrderId>,
}

/// Thread-safe order registry shared by the orchestrator and the query side.
#[derive(Debug, Default)]
pub struct OrderStore {
    resolver: CubbyResolver,
    state: RwLock<StoreState>,
}

impl OrderStore {
    pub fn new(resolver: CubbyResolver) -> Self {
        Self {
            resolver,
            state: RwLock::default(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Admits a batch: assigns each order a cubby, creates its record and queues one
    /// destination per item.
    ///
    /// Orders are handled in batch order, the position being the resolver's sequence index.
    /// An order is rejected on its own, without affecting the rest of the batch, when its id is
    /// already active (or repeated within the batch) or when no cubby is free.
    ///
    /// # Errors
    /// Only [`StoreError::LockPoisoned`]; per-order problems are reported in the [`Admission`].
    pub fn add_orders(&self, orders: Vec<Order>) -> Result<Admission, StoreError> {
        let mut state = self.write()?;
        let mut admission = Admission::default();

        for (index, order) in orders.into_iter().enumerate() {
            let order_id = order.id.clone();
            if state.orders.contains_key(&order_id) {
                warn!(order_id = %order_id, "Duplicate order rejected");
                admission.rejected.push(RejectedOrder {
                    error: StoreError::DuplicateOrder(order_id.clone()),
                    order_id,
                });
                continue;
            }

            let sequence_index = u32::try_from(index).unwrap_or(u32::MAX);
            let cubby = match self
                .resolver
                .resolve(&order_id, sequence_index, &state.cubbies)
            {
                Ok(cubby) => cubby,
                Err(error) => {
                    warn!(order_id = %order_id, error = %error, "Order rejected");
                    admission.rejected.push(RejectedOrder { order_id, error });
                    continue;
                }
            };

            for item in &order.items {
                state
                    .destinations
                    .entry(item.code.clone())
                    .or_default()
                    .push_back(Destination {
                        order_id: order_id.clone(),
                        cubby: cubby.clone(),
                    });
            }
            state.cubbies.insert(cubby.id.clone(), order_id.clone());
            state.orders.insert(
                order_id.clone(),
                OrderRecord {
                    order: order.clone(),
                    cubby: cubby.clone(),
                    item_statuses: Vec::new(),
                    status_override: None,
                },
            );

            debug!(order_id = %order_id, %cubby, items = order.items.len(), "Order admitted");
            admission.admitted.push(AdmittedOrder { order, cubby });
        }

        info!(
            admitted = admission.admitted.len(),
            rejected = admission.rejected.len(),
            active = state.orders.len(),
            "Batch admitted"
        );
        Ok(admission)
    }

    /// Removes and returns the oldest destination waiting for `code`.
    ///
    /// # Errors
    /// [`StoreError::NoDestination`] when nobody is waiting for the code. This is an expected
    /// outcome (the robot offered an item nobody ordered) rather than a failure.
    pub fn pop_destination_for_item_code(&self, code: &str) -> Result<Destination, StoreError> {
        let mut state = self.write()?;
        let queue = state
            .destinations
            .get_mut(code)
            .ok_or_else(|| StoreError::NoDestination(code.to_string()))?;
        let destination = queue
            .pop_front()
            .ok_or_else(|| StoreError::NoDestination(code.to_string()))?;
        if queue.is_empty() {
            state.destinations.remove(code);
        }
        Ok(destination)
    }

    /// Number of destinations still waiting for `code`.
    pub fn pending_destinations(&self, code: &str) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .destinations
            .get(code)
            .map(VecDeque::len)
            .unwrap_or(0))
    }

    /// Appends an item outcome to an order and returns the order's resulting status.
    pub fn record_item_status(
        &self,
        order_id: &OrderId,
        status: ItemStatus,
    ) -> Result<OrderStatus, StoreError> {
        let mut state = self.write()?;
        let record = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        record.item_statuses.push(status);
        Ok(record.status())
    }

    pub fn get_order_data(&self, order_id: &OrderId) -> Result<OrderData, StoreError> {
        self.read()?
            .orders
            .get(order_id)
            .map(OrderRecord::snapshot)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))
    }

    /// Every active order, in no particular order.
    pub fn get_all_orders_data(&self) -> Result<Vec<OrderData>, StoreError> {
        Ok(self
            .read()?
            .orders
            .values()
            .map(OrderRecord::snapshot)
            .collect())
    }

    /// Forces an order's status, bypassing derivation from item outcomes.
    pub fn set_order_status_override(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let record = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        record.status_override = Some(status);
        info!(order_id = %order_id, %status, "Order status overridden");
        Ok(())
    }

    /// Discards every order, destination and cubby assignment.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let orders = state.orders.len();
        *state = StoreState::default();
        info!(orders, "Store cleared");
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.orders.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.orders.is_empty())
    }

    /// Cubbies currently assigned to active orders.
    pub fn occupied_cubbies(&self) -> Result<HashSet<Cubby>, StoreError> {
        Ok(self
            .read()?
            .cubbies
            .keys()
            .map(|id| Cubby::new(id.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorting_robot::Item;

    fn order(id: &str, codes: &[&str]) -> Order {
        Order::new(
            id,
            codes.iter().map(|code| Item::new(*code, *code)).collect(),
        )
    }

    #[test]
    fn test_admission_assigns_distinct_cubbies() {
        let store = OrderStore::default();
        let orders: Vec<Order> = (0..10).map(|i| order(&format!("o{i}"), &["x"])).collect();

        let admission = store.add_orders(orders).unwrap();

        assert_eq!(admission.admitted.len(), 10);
        assert!(admission.rejected.is_empty());
        let cubbies: HashSet<Cubby> = admission
            .admitted
            .iter()
            .map(|a| a.cubby.clone())
            .collect();
        assert_eq!(cubbies.len(), 10);
        assert_eq!(store.occupied_cubbies().unwrap(), cubbies);
    }

    #[test]
    fn test_admission_is_deterministic() {
        let batch = vec![order("A", &["x"]), order("B", &["y"]), order("C", &["x"])];
        let first = OrderStore::default().add_orders(batch.clone()).unwrap();
        let second = OrderStore::default().add_orders(batch).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_records_start_pending() {
        let store = OrderStore::default();
        store.add_orders(vec![order("A", &["x", "y"])]).unwrap();

        let data = store.get_order_data(&OrderId::from("A")).unwrap();
        assert!(data.item_statuses.is_empty());
        assert_eq!(data.status, OrderStatus::Pending);
        assert_eq!(data.order.items.len(), 2);
    }

    #[test]
    fn test_capacity_rejects_only_the_overflowing_order() {
        let store = OrderStore::new(CubbyResolver::new(2, 64));
        let admission = store
            .add_orders(vec![order("A", &["x"]), order("B", &["x"]), order("C", &["x"])])
            .unwrap();

        assert_eq!(admission.admitted.len(), 2);
        assert_eq!(admission.rejected.len(), 1);
        assert_eq!(admission.rejected[0].order_id, OrderId::from("C"));
        assert!(matches!(
            admission.rejected[0].error,
            StoreError::CapacityExhausted { .. }
        ));
        // The rejected order left no destination behind
        assert_eq!(store.pending_destinations("x").unwrap(), 2);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let store = OrderStore::default();
        store.add_orders(vec![order("A", &["x"])]).unwrap();

        let admission = store
            .add_orders(vec![order("A", &["y"]), order("B", &["y"]), order("B", &["z"])])
            .unwrap();

        let rejected: Vec<_> = admission.rejected.iter().map(|r| r.error.clone()).collect();
        assert_eq!(
            rejected,
            vec![
                StoreError::DuplicateOrder(OrderId::from("A")),
                StoreError::DuplicateOrder(OrderId::from("B")),
            ]
        );
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.pending_destinations("z").unwrap(), 0);
    }

    #[test]
    fn test_pop_destination_is_fifo_per_code() {
        let store = OrderStore::default();
        let admission = store
            .add_orders(vec![order("A", &["x"]), order("B", &["y", "x"])])
            .unwrap();
        let cubby_a = admission.admitted[0].cubby.clone();
        let cubby_b = admission.admitted[1].cubby.clone();

        assert_eq!(
            store.pop_destination_for_item_code("x").unwrap(),
            Destination {
                order_id: OrderId::from("A"),
                cubby: cubby_a,
            }
        );
        assert_eq!(
            store.pop_destination_for_item_code("x").unwrap(),
            Destination {
                order_id: OrderId::from("B"),
                cubby: cubby_b,
            }
        );
        assert_eq!(
            store.pop_destination_for_item_code("x"),
            Err(StoreError::NoDestination("x".into()))
        );
        assert_eq!(store.pending_destinations("y").unwrap(), 1);
    }

    #[test]
    fn test_repeated_code_in_one_order_queues_twice() {
        let store = OrderStore::default();
        store.add_orders(vec![order("A", &["x", "x"])]).unwrap();

        assert_eq!(store.pending_destinations("x").unwrap(), 2);
        store.pop_destination_for_item_code("x").unwrap();
        store.pop_destination_for_item_code("x").unwrap();
        assert!(store
            .pop_destination_for_item_code("x")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let store = OrderStore::default();
        let error = store.pop_destination_for_item_code("nope").unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn test_record_item_status_derives_order_status() {
        let store = OrderStore::default();
        store.add_orders(vec![order("A", &["x", "y"])]).unwrap();
        let id = OrderId::from("A");

        assert_eq!(
            store.record_item_status(&id, ItemStatus::Ready).unwrap(),
            OrderStatus::Pending
        );
        assert_eq!(
            store.record_item_status(&id, ItemStatus::Ready).unwrap(),
            OrderStatus::Ready
        );
        assert_eq!(
            store.get_order_data(&id).unwrap().item_statuses,
            vec![ItemStatus::Ready, ItemStatus::Ready]
        );
    }

    #[test]
    fn test_unknown_order_is_not_found() {
        let store = OrderStore::default();
        let id = OrderId::from("ghost");

        assert_eq!(
            store.record_item_status(&id, ItemStatus::Ready),
            Err(StoreError::OrderNotFound(id.clone()))
        );
        assert_eq!(
            store.get_order_data(&id),
            Err(StoreError::OrderNotFound(id.clone()))
        );
        assert_eq!(
            store.set_order_status_override(&id, OrderStatus::Ready),
            Err(StoreError::OrderNotFound(id))
        );
    }

    #[test]
    fn test_override_beats_derived_status() {
        let store = OrderStore::default();
        store.add_orders(vec![order("A", &["x"])]).unwrap();
        let id = OrderId::from("A");

        store.record_item_status(&id, ItemStatus::Failed).unwrap();
        assert_eq!(store.get_order_data(&id).unwrap().status, OrderStatus::Failed);

        store.set_order_status_override(&id, OrderStatus::Ready).unwrap();
        assert_eq!(store.get_order_data(&id).unwrap().status, OrderStatus::Ready);
    }

    #[test]
    fn test_clear_frees_everything() {
        let store = OrderStore::new(CubbyResolver::new(1, 8));
        store.add_orders(vec![order("A", &["x"])]).unwrap();

        store.clear().unwrap();

        assert!(store.is_empty().unwrap());
        assert!(store.get_all_orders_data().unwrap().is_empty());
        assert_eq!(store.pending_destinations("x").unwrap(), 0);
        // The single cubby is available again
        let admission = store.add_orders(vec![order("A", &["x"])]).unwrap();
        assert_eq!(admission.admitted.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        use std::sync::Arc;

        let store = Arc::new(OrderStore::default());
        store
            .add_orders(vec![order("A", &["x"; 4]), order("B", &["y"])])
            .unwrap();
        let id = OrderId::from("A");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    store.record_item_status(&id, ItemStatus::Ready).unwrap();
                    store.get_all_orders_data().unwrap().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(store.get_order_data(&id).unwrap().status, OrderStatus::Ready);
    }
}
