//! # Tracing Setup
//!
//! Log lines carry structured fields (`batch`, `order_id`, `code`, `cubby`) and the enclosing
//! `batch` span, so one batch can be followed from admission to its summary:
//!
//! ```text
//! INFO batch: Batch admitted admitted=2 rejected=0 active=2 batch=1 size=2
//! WARN batch: Robot offered an item nobody is waiting for code="y" batch=1 size=2
//! INFO batch: Batch processed orders=2 rejected=0 placed=3 misses=1 aborted=0 cancelled=false batch=1 size=2
//! ```
//!
//! Verbosity comes from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run -p fulfillment      # batch and order lifecycle
//! RUST_LOG=debug cargo run -p fulfillment     # every robot call and item placement
//! ```

/// Installs the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
