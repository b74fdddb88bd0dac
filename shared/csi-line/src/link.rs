//! Reconnect logic of the firmware's WiFi station.
//!
//! The station reconnects every time the link drops, immediately, with no
//! backoff and no retry limit. A connect attempt that has not associated
//! after [`CONNECT_ATTEMPT_TIMEOUT`] counts as a failed attempt and is retried
//! the same way. Times are uptimes.

use core::time::Duration;

pub const CONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Connect requested, waiting for association.
    Connecting { since: Duration },
    /// Associated, waiting for a DHCP lease.
    Associated,
    /// Associated and addressed.
    Online,
}

/// What the station has to do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// The pending connect attempt associated.
    Joined,
    /// Drop any lease and issue a new connect request.
    Retry,
}

impl Link {
    pub fn connecting(now: Duration) -> Self {
        Self::Connecting { since: now }
    }

    /// Advances the link given whether the radio currently reports an
    /// association.
    pub fn step(self, associated: bool, now: Duration) -> (Self, Action) {
        match (self, associated) {
            (Self::Connecting { .. }, true) => (Self::Associated, Action::Joined),
            (Self::Connecting { since }, false) => {
                if now.saturating_sub(since) >= CONNECT_ATTEMPT_TIMEOUT {
                    (Self::connecting(now), Action::Retry)
                } else {
                    (self, Action::None)
                }
            }
            (Self::Associated | Self::Online, false) => (Self::connecting(now), Action::Retry),
            (Self::Associated | Self::Online, true) => (self, Action::None),
        }
    }

    /// Applies a DHCP lease change. Ignored while not associated.
    pub fn with_lease(self, leased: bool) -> Self {
        match (self, leased) {
            (Self::Connecting { .. }, _) => self,
            (_, true) => Self::Online,
            (_, false) => Self::Associated,
        }
    }

    /// Whether the IP stack should run.
    pub fn is_associated(self) -> bool {
        !matches!(self, Self::Connecting { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn association_waits_for_a_lease() {
        let (link, action) = Link::connecting(secs(0)).step(true, secs(1));
        assert_eq!((link, action), (Link::Associated, Action::Joined));

        let (link, action) = link.step(true, secs(2));
        assert_eq!((link, action), (Link::Associated, Action::None));
        assert!(link.is_associated());
    }

    #[test]
    fn lease_brings_the_link_online() {
        assert_eq!(Link::Associated.with_lease(true), Link::Online);
        assert_eq!(Link::Online.with_lease(false), Link::Associated);
        assert_eq!(Link::connecting(secs(3)).with_lease(true), Link::connecting(secs(3)));
    }

    #[test]
    fn losing_an_online_link_retries() {
        let (link, action) = Link::Online.step(false, secs(40));
        assert_eq!(action, Action::Retry);
        assert_eq!(link, Link::Connecting { since: secs(40) });
        assert!(!link.is_associated());
    }

    #[test]
    fn losing_association_before_a_lease_retries() {
        let (link, action) = Link::Associated.step(false, secs(5));
        assert_eq!((link, action), (Link::connecting(secs(5)), Action::Retry));
    }

    #[test]
    fn stalled_connect_is_retried_after_the_timeout() {
        let link = Link::connecting(secs(100));
        assert_eq!(link.step(false, secs(109)), (link, Action::None));

        let (link, action) = link.step(false, secs(110));
        assert_eq!(action, Action::Retry);
        assert_eq!(link, Link::connecting(secs(110)));
    }

    #[test]
    fn retries_never_give_up() {
        let mut link = Link::Online;
        let mut now = secs(0);
        let mut retries = 0;
        for _ in 0..50 {
            let (next, action) = link.step(false, now);
            if action == Action::Retry {
                retries += 1;
            }
            link = next;
            now += CONNECT_ATTEMPT_TIMEOUT;
        }
        assert_eq!(retries, 50);

        let (link, action) = link.step(true, now);
        assert_eq!((link, action), (Link::Associated, Action::Joined));
    }
}
