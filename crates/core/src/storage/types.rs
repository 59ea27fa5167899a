use serde::Serialize;

/// Snapshot of a connection pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Open connections, idle or in use.
    pub size: u32,
    pub idle: u32,
}

impl PoolStats {
    /// Connections currently checked out.
    pub fn active(&self) -> u32 {
        self.size.saturating_sub(self.idle)
    }
}
