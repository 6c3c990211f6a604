//! Connection management: handles, pool, and connect/disconnect lifecycle.

pub mod handle;
pub mod lifecycle;
pub mod pool;

pub use handle::{ConnectionHandle, ConnectionState};
pub use lifecycle::ConnectionLifecycleManager;
pub use pool::ConnectionPool;
