//! Per-invocation collaborator bundle.

use std::fmt;

use crate::catalog::Catalog;
use crate::device::Device;
use crate::logging::MonitorLogger;
use crate::transport::Transport;

/// Collaborators of one invocation.
///
/// Built by the scheduler before each call and dropped after it; the executor
/// never keeps a copy.
#[derive(Clone, Copy)]
pub struct MonitorContext<'a> {
    transport: &'a dyn Transport,
    catalog: &'a dyn Catalog,
    device: &'a Device,
    logger: &'a dyn MonitorLogger,
}

impl<'a> MonitorContext<'a> {
    /// Bundle the collaborators of one invocation.
    #[must_use]
    pub fn new(
        transport: &'a dyn Transport,
        catalog: &'a dyn Catalog,
        device: &'a Device,
        logger: &'a dyn MonitorLogger,
    ) -> Self {
        Self {
            transport,
            catalog,
            device,
            logger,
        }
    }

    /// Shared transport.
    #[must_use]
    pub fn transport(&self) -> &'a dyn Transport {
        self.transport
    }

    /// Catalog backend.
    #[must_use]
    pub fn catalog(&self) -> &'a dyn Catalog {
        self.catalog
    }

    /// Device being monitored.
    #[must_use]
    pub fn device(&self) -> &'a Device {
        self.device
    }

    /// Logger bound to the device.
    #[must_use]
    pub fn logger(&self) -> &'a dyn MonitorLogger {
        self.logger
    }
}

impl fmt::Debug for MonitorContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorContext")
            .field("device", &self.device.id())
            .finish_non_exhaustive()
    }
}
