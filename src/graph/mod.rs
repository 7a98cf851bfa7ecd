//! The persistent graph: storage, node/edge/metadata operations, search,
//! and the compensating-transaction coordinator.

pub mod edges;
pub mod metadata;
pub mod nodes;
pub mod search;
pub mod store;
pub mod tx;
pub mod types;
