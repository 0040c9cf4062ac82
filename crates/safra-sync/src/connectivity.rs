//! # Connectivity Monitor
//!
//! Exposes the host's online/offline signal as a **level** (current state)
//! and an **edge** (the "became online" transition).
//!
//! ## Level vs Edge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  online  ────┐           ┌──────────────┐       ┌─────                 │
//! │              │           │              │       │                       │
//! │  offline     └───────────┘              └───────┘                       │
//! │                          ▲                      ▲                       │
//! │                          │                      │                       │
//! │                   edge event fires       edge event fires               │
//! │                                                                         │
//! │  is_online()        → the LEVEL, checked before each mutation's        │
//! │                       single remote attempt                            │
//! │  went_online().await → the EDGE, the only trigger for a                │
//! │                       reconciliation sweep (never polled)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The monitor itself is platform-neutral: whatever watches the host signal
//! (a netlink socket, a heartbeat probe, a browser event bridge) feeds the
//! level in via [`ConnectivityMonitor::set_online`]. Tests drive it the
//! same way.
//!
//! ## Why count edges at the sender?
//! A `watch` channel keeps only the latest value. A fast offline→online
//! bounce could be overwritten before a subscriber observes the
//! intermediate level, silently losing the transition. The sender sees
//! every report, so it counts rising edges; subscribers compare counts and
//! can never miss one.

use tokio::sync::watch;
use tracing::debug;

// =============================================================================
// Connectivity Monitor
// =============================================================================

/// Internal channel payload: the current level plus a monotonic count of
/// offline→online transitions observed by the sender.
#[derive(Debug, Clone, Copy)]
struct Level {
    online: bool,
    rising_edges: u64,
}

/// Shared online/offline state with edge-event subscriptions.
///
/// Built on a `tokio::sync::watch` channel: cheap to clone, readable
/// without locking, and subscribers only wake on actual changes.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    state: watch::Sender<Level>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial level.
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(Level {
            online: initially_online,
            rising_edges: 0,
        });
        ConnectivityMonitor { state }
    }

    /// Creates a monitor that starts offline (the conservative default:
    /// nothing is pushed until the host signal says otherwise).
    pub fn starting_offline() -> Self {
        ConnectivityMonitor::new(false)
    }

    /// Current level.
    pub fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    /// Feeds the host platform's signal into the monitor.
    ///
    /// Repeated reports of the same level are deduplicated so subscribers
    /// see clean edges only.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|level| {
            if level.online == online {
                return false;
            }
            level.online = online;
            if online {
                level.rising_edges += 1;
            }
            true
        });

        if changed {
            debug!(online, "connectivity level changed");
        }
    }

    /// Subscribes to "became online" edges.
    ///
    /// A subscriber created while already online does NOT observe an
    /// immediate edge; only a future offline→online transition fires.
    pub fn subscribe(&self) -> OnlineEvents {
        let rx = self.state.subscribe();
        let seen_edges = rx.borrow().rising_edges;
        OnlineEvents { rx, seen_edges }
    }
}

// =============================================================================
// Online Events
// =============================================================================

/// Edge-triggered view over the connectivity level.
#[derive(Debug)]
pub struct OnlineEvents {
    rx: watch::Receiver<Level>,
    seen_edges: u64,
}

impl OnlineEvents {
    /// Waits for the next offline→online transition.
    ///
    /// Returns `false` when the monitor has been dropped and no further
    /// transitions can happen, meaning the listening task should exit.
    pub async fn went_online(&mut self) -> bool {
        loop {
            let edges = self.rx.borrow_and_update().rising_edges;
            if edges > self.seen_edges {
                self.seen_edges = edges;
                return true;
            }

            if self.rx.changed().await.is_err() {
                return false;
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
