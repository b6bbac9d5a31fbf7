//! Shared Registry
//!
//! Lock-guarded handle for hosts that touch the registry from more than one
//! thread. The registry itself stays single-writer; the lock serialises access.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use super::node_registry::NodeRegistry;

/// Cloneable, thread-safe handle to one [`NodeRegistry`]
#[derive(Debug, Clone, Default)]
pub struct SharedNodeRegistry {
    inner: Arc<RwLock<NodeRegistry>>,
}

impl SharedNodeRegistry {
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Shared access for queries
    pub fn read(&self) -> RwLockReadGuard<'_, NodeRegistry> {
        self.inner.read()
    }

    /// Exclusive access for mutations
    ///
    /// Observers run while the guard is held, so they must not lock this
    /// handle again.
    pub fn write(&self) -> RwLockWriteGuard<'_, NodeRegistry> {
        self.inner.write()
    }
}

impl From<NodeRegistry> for SharedNodeRegistry {
    fn from(registry: NodeRegistry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeNum, NodePosition};
    use std::thread;

    #[test]
    fn test_concurrent_writers_are_serialised() {
        let shared = SharedNodeRegistry::default();
        let mut rx = shared.read().subscribe_channel();

        let handles: Vec<_> = (0..4u32)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..25u32 {
                        let number = NodeNum::new(worker * 100 + i);
                        shared
                            .write()
                            .upsert_position(number, NodePosition::from_degrees(1.0, 1.0))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.read().len(), 100);
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 100);
    }
}
