//! Stale-response guard for remote loads.
//!
//! Each fetch takes a token. Only the response carrying the newest token is
//! applied; anything older arrived out of order and is dropped.
//!
//! ```text
//!   begin_fetch() ─► #1 ─────────────────────────► response #1 (dropped)
//!   begin_fetch() ─► #2 ──────► response #2 (applied)
//! ```

/// Monotonic id of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues tokens and remembers the newest.
#[derive(Debug, Default)]
pub struct LatestOnly {
    issued: u64,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Whether `token` is the most recently issued one.
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_is_current() {
        let mut seq = LatestOnly::new();
        let first = seq.issue();
        assert!(seq.is_current(first));

        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert!(second > first);
    }
}
