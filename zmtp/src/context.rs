//! Context: the root handle an application creates before opening any socket.
//!
//! ZMTP itself has no notion of a context — this is a supplemented feature
//! (§10.5) that gives the socket layer somewhere to hang process-wide
//! concerns (today: nothing beyond a name for logging spans; tomorrow:
//! shared I/O resources) without every socket constructor growing its own
//! ad hoc setup.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A lightweight handle identifying one logical application instance.
///
/// Cloning a `Context` is cheap and shares the same identity. Every socket
/// constructor has a `*_with_context` variant that takes one (the plain
/// `connect`/`bind` entry points create a private, unshared `Context`
/// internally) so a process opening several sockets can pass the same
/// `Context` to each and get one correlation id across all their log lines.
#[derive(Debug, Clone)]
pub struct Context {
    id: u64,
}

impl Context {
    /// `context_new()`: create a fresh context.
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(context_id = id, "context created");
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `context_destroy()`: there is no owned resource to release today,
    /// but the method exists so callers have a symmetric teardown point to
    /// call as the socket layer grows shared state.
    pub fn destroy(self) {
        tracing::debug!(context_id = self.id, "context destroyed");
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_get_distinct_ids() {
        let a = Context::new();
        let b = Context::new();
        assert_ne!(a.id(), b.id());
    }
}
