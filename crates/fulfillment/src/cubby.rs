//! # Cubby Assignment
//!
//! Maps an order to a free cubby by hashing `(order id, attempt)` into a fixed slot space and
//! probing forward on collision. The mapping is a pure function of its inputs and the set of
//! cubbies already taken, so the same batch admitted against the same state always lands in
//! the same cubbies.

use crate::model::OrderId;
use crate::store::StoreError;
use sorting_robot::Cubby;
use std::collections::HashMap;

pub const DEFAULT_CUBBY_SLOTS: u32 = 10;
pub const DEFAULT_MAX_PROBES: u32 = 64;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a<'a>(bytes: impl IntoIterator<Item = &'a u8>) -> u32 {
    bytes.into_iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// 32-bit FNV-1a over the order id bytes followed by `attempt` as little-endian bytes.
fn stable_hash(order_id: &str, attempt: u32) -> u32 {
    let attempt = attempt.to_le_bytes();
    fnv1a(order_id.as_bytes().iter().chain(attempt.iter()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubbyResolver {
    slots: u32,
    max_probes: u32,
}

impl Default for CubbyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CUBBY_SLOTS, DEFAULT_MAX_PROBES)
    }
}

impl CubbyResolver {
    /// Zero values are clamped to one; configuration validation rejects them earlier.
    pub fn new(slots: u32, max_probes: u32) -> Self {
        Self {
            slots: slots.max(1),
            max_probes: max_probes.max(1),
        }
    }

    /// The cubby `(order_id, attempt)` hashes to, ignoring occupancy. Ids run `"1"..=slots`.
    pub fn slot_for(&self, order_id: &OrderId, attempt: u32) -> Cubby {
        let slot = stable_hash(order_id.as_str(), attempt) % self.slots + 1;
        Cubby::new(slot.to_string())
    }

    /// Finds a cubby for `order_id` that is not in `taken` (cubby id to occupying order).
    ///
    /// Probing starts at `attempt = sequence_index` and increments on every collision.
    ///
    /// # Errors
    /// [`StoreError::CapacityExhausted`] when every slot is taken or the probe cap is hit.
    pub fn resolve(
        &self,
        order_id: &OrderId,
        sequence_index: u32,
        taken: &HashMap<String, OrderId>,
    ) -> Result<Cubby, StoreError> {
        let occupied = taken
            .keys()
            .filter(|id| self.in_slot_space(id))
            .count();
        if occupied >= self.slots as usize {
            return Err(StoreError::CapacityExhausted {
                order_id: order_id.clone(),
                probes: 0,
            });
        }

        (0..self.max_probes)
            .map(|probe| self.slot_for(order_id, sequence_index.wrapping_add(probe)))
            .find(|cubby| !taken.contains_key(&cubby.id))
            .ok_or_else(|| StoreError::CapacityExhausted {
                order_id: order_id.clone(),
                probes: self.max_probes,
            })
    }

    /// Whether `id` names one of the hashed slots (as opposed to e.g. a reject cubby).
    pub fn in_slot_space(&self, id: &str) -> bool {
        id.parse::<u32>()
            .map(|slot| (1..=self.slots).contains(&slot))
            .unwrap_or(false)
    }
}
