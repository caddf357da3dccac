//! Frame ticker capability
//!
//! The host owns the real frame source (a compositor vsync, a timer loop, a
//! browser animation-frame bridge). The scheduler only needs to tell it when
//! rendering should run at all.

/// Registration with the host's frame source
pub trait FrameTicker {
    /// Begin delivering frame callbacks to the scheduler
    fn subscribe(&mut self);
    /// Stop delivering frame callbacks
    fn unsubscribe(&mut self);
}

/// Minimal ticker that just tracks the subscription flag
///
/// Useful for hosts that poll the flag from their own loop, and for tests.
#[derive(Debug, Default)]
pub struct TickerFlag {
    subscribed: bool,
}

impl TickerFlag {
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

impl FrameTicker for TickerFlag {
    fn subscribe(&mut self) {
        self.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_follows_subscription() {
        let mut ticker = TickerFlag::default();
        assert!(!ticker.is_subscribed());
        ticker.subscribe();
        assert!(ticker.is_subscribed());
        ticker.unsubscribe();
        assert!(!ticker.is_subscribed());
    }
}
