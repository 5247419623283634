//! Tickets for background loads: only the most recent load may apply.

/// Identifies one background load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
pub struct LoadSequence {
    latest: u64,
}

impl LoadSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding every earlier one.
    pub fn begin(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    /// True when `ticket` is still the latest issued.
    pub fn accept(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }
}
