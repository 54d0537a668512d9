//! Open port tracking
//!
//! Parameter update lines only carry a parameter ID. The bus and port come
//! from the most recent OPEN line, so the session keeps a one-slot state
//! machine of the open scope.

use crate::types::{BusAddress, ContextMismatch};

/// State of the port scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortState {
    /// No port open (initial state)
    #[default]
    Closed,
    /// A bus/port scope is open
    Open { bus_id: u32, port_id: u32 },
}

/// Tracks the currently open bus/port scope
#[derive(Debug, Clone, Default)]
pub struct ContextTracker {
    state: PortState,
}

impl ContextTracker {
    /// Create a tracker in the `Closed` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> PortState {
        self.state
    }

    /// Current context as an address with the parameter unset
    ///
    /// A closed context is [`BusAddress::INVALID`].
    pub fn current(&self) -> BusAddress {
        match self.state {
            PortState::Closed => BusAddress::INVALID,
            PortState::Open { bus_id, port_id } => BusAddress::port(bus_id, port_id),
        }
    }

    /// Open a port. Any scope already open is replaced without complaint.
    pub fn open(&mut self, bus_id: u32, port_id: u32) {
        if !self.current().is_invalid() {
            log::trace!(
                "Opening {}.{} replaces open context {}",
                bus_id,
                port_id,
                self.current()
            );
        }
        self.state = PortState::Open { bus_id, port_id };
    }

    /// Close a port
    ///
    /// The tracker always ends up `Closed`. If the port named does not match
    /// the open scope, the mismatch is returned so the caller can report it.
    pub fn close(&mut self, bus_id: u32, port_id: u32, line: usize) -> Option<ContextMismatch> {
        let mismatch = match self.state {
            PortState::Open {
                bus_id: open_bus,
                port_id: open_port,
            } if open_bus == bus_id && open_port == port_id => None,
            PortState::Open { .. } => Some(ContextMismatch {
                line,
                closed: BusAddress::port(bus_id, port_id),
                open: Some(self.current()),
            }),
            PortState::Closed => Some(ContextMismatch {
                line,
                closed: BusAddress::port(bus_id, port_id),
                open: None,
            }),
        };

        self.state = PortState::Closed;
        mismatch
    }

    /// Complete a parameter ID into a full address using the open scope
    pub fn address_for(&self, param_id: u32) -> BusAddress {
        let context = self.current();
        BusAddress::new(context.bus_id, context.port_id, param_id)
    }
}
