pub mod cascade;
pub mod collision;
pub mod connect;
pub mod geometry;
pub mod grouping;
pub mod status;
pub(crate) mod types;

pub use cascade::{downstream_set, height_cascade, push_downstream};
pub use collision::{find_intersecting_edge, find_overlapping_node, resolve_drop, splice};
pub use connect::{ConnectionRequest, connect, validate_connection};
pub use grouping::{group_nodes, reparent_on_drop, ungroup};
pub use status::{attach, detach, find_status_host};
pub use types::*;
