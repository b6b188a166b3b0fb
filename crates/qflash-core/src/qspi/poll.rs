//! Auto-polling and memory-mapped configurations

/// How the masked status bits are compared against the match value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Match when every masked bit equals the match value
    #[default]
    And,
    /// Match when any masked bit equals the match value
    Or,
}

/// Hardware auto-polling of a status register
///
/// The controller re-issues the status read every `interval` clocks until
/// `(status & mask)` matches `match_value` under `mode`, then raises the
/// status-match interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AutoPoll {
    /// Value the masked status must equal
    pub match_value: u32,
    /// Bits of the status that are compared
    pub mask: u32,
    /// Comparison mode
    pub mode: MatchMode,
    /// Number of status bytes read per poll
    pub status_bytes: u8,
    /// Clock cycles between two polls
    pub interval: u16,
    /// Stop polling automatically once matched
    pub auto_stop: bool,
}

impl AutoPoll {
    /// Poll SR1 until the write-in-progress bit clears
    pub const fn until_ready() -> Self {
        Self {
            match_value: 0x00,
            mask: 0x01,
            mode: MatchMode::And,
            status_bytes: 1,
            interval: 0x10,
            auto_stop: true,
        }
    }

    /// Returns true if `status` satisfies this configuration
    pub fn matches(&self, status: u32) -> bool {
        let masked = status & self.mask;
        match self.mode {
            MatchMode::And => masked == self.match_value & self.mask,
            MatchMode::Or => {
                // at least one selected bit agrees with the match value
                let agree = !(masked ^ self.match_value) & self.mask;
                agree != 0
            }
        }
    }
}

/// Memory-mapped mode configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MemoryMapped {
    /// Release chip select after this many idle clocks (None = disabled)
    pub timeout_period: Option<u16>,
}

impl MemoryMapped {
    /// Keep chip select asserted between accesses
    pub const fn continuous() -> Self {
        Self {
            timeout_period: None,
        }
    }
}
