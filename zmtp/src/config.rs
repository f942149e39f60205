//! ZMTP configuration and buffer sizing.
//!
//! Tuning knobs for the socket layer: read/write buffer sizes (kept from the
//! source's presets) and the PUB-side subscription harvester's timing
//! (§4.6, §10.3). One builder-style [`Config`] carries every knob, following
//! the `with_*`/`Default` shape used elsewhere in this lineage for socket
//! options, so a caller overrides exactly the field it cares about instead
//! of reaching past the struct for a loose constant.

use std::time::Duration;

/// Default read buffer size (8KB).
pub const DEFAULT_READ_BUF_SIZE: usize = 8192;

/// Default write buffer size (8KB).
pub const DEFAULT_WRITE_BUF_SIZE: usize = 8192;

/// Small read buffer size (4KB) — REQ/REP ping-pong traffic.
pub const SMALL_READ_BUF_SIZE: usize = 4096;

/// Small write buffer size (4KB).
pub const SMALL_WRITE_BUF_SIZE: usize = 4096;

/// Large read buffer size (16KB) — PUB fan-out with bigger payloads.
pub const LARGE_READ_BUF_SIZE: usize = 16384;

/// Large write buffer size (16KB).
pub const LARGE_WRITE_BUF_SIZE: usize = 16384;

/// Default grace period given to a freshly-accepted PUB connection before
/// its first subscription harvest (§4.6).
pub const DEFAULT_INITIAL_HARVEST_DELAY: Duration = Duration::from_millis(20);

/// How long a PUB socket's `send` call spends draining each connection's
/// subscription harvester before giving up and matching against whatever
/// subscription state has accumulated so far (§4.6, §10.3).
///
/// The harvester itself never blocks; this bounds how many non-blocking
/// poll rounds `send` will spend waiting on a slow subscriber before moving
/// on, so one stalled SUB connection can't stall publication to the rest.
pub const DEFAULT_HARVEST_GRACE_PERIOD: Duration = Duration::from_millis(50);

/// Per-connection configuration: buffer sizes for the handshake/decoder
/// read path and the write path, plus the PUB-side harvester's timing.
///
/// Read/write buffer sizes back a `BufReader`/`BufWriter` pair on the
/// connection's stream and size the harvester's non-blocking read
/// scratch buffer (§10.3); they are not independently meaningful once a
/// `Connection` is built, which is why they travel together as one
/// struct rather than as loose constructor arguments.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Read buffer size.
    pub read_buf_size: usize,
    /// Write buffer size.
    pub write_buf_size: usize,
    /// Grace period given to a freshly-accepted PUB connection before its
    /// first subscription harvest (§4.6).
    pub initial_harvest_delay: Duration,
    /// Per-`send` harvest budget on the PUB side (§4.6, §10.3).
    pub harvest_grace_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_buf_size: DEFAULT_READ_BUF_SIZE,
            write_buf_size: DEFAULT_WRITE_BUF_SIZE,
            initial_harvest_delay: DEFAULT_INITIAL_HARVEST_DELAY,
            harvest_grace_period: DEFAULT_HARVEST_GRACE_PERIOD,
        }
    }
}

impl Config {
    /// Configuration optimized for small messages (< 1KB) — REQ/REP.
    #[must_use]
    pub fn small() -> Self {
        Self {
            read_buf_size: SMALL_READ_BUF_SIZE,
            write_buf_size: SMALL_WRITE_BUF_SIZE,
            ..Self::default()
        }
    }

    /// Configuration optimized for larger messages (8-16KB) — PUB/SUB.
    #[must_use]
    pub fn large() -> Self {
        Self {
            read_buf_size: LARGE_READ_BUF_SIZE,
            write_buf_size: LARGE_WRITE_BUF_SIZE,
            ..Self::default()
        }
    }

    /// Custom buffer configuration, other knobs left at their defaults.
    #[must_use]
    pub fn custom(read_buf_size: usize, write_buf_size: usize) -> Self {
        Self {
            read_buf_size,
            write_buf_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_read_buf_size(mut self, size: usize) -> Self {
        self.read_buf_size = size;
        self
    }

    #[must_use]
    pub fn with_write_buf_size(mut self, size: usize) -> Self {
        self.write_buf_size = size;
        self
    }

    /// Override the PUB-side post-accept harvest grace period (§4.6).
    #[must_use]
    pub fn with_initial_harvest_delay(mut self, delay: Duration) -> Self {
        self.initial_harvest_delay = delay;
        self
    }

    /// Override the PUB-side per-`send` harvest budget (§4.6, §10.3).
    #[must_use]
    pub fn with_harvest_grace_period(mut self, period: Duration) -> Self {
        self.harvest_grace_period = period;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ() {
        assert!(Config::small().read_buf_size < Config::default().read_buf_size);
        assert!(Config::large().read_buf_size > Config::default().read_buf_size);
    }

    #[test]
    fn harvest_grace_period_is_sub_second() {
        assert!(Config::default().harvest_grace_period < Duration::from_secs(1));
    }

    #[test]
    fn builder_overrides_only_requested_fields() {
        let cfg = Config::small().with_harvest_grace_period(Duration::from_millis(200));
        assert_eq!(cfg.read_buf_size, SMALL_READ_BUF_SIZE);
        assert_eq!(cfg.harvest_grace_period, Duration::from_millis(200));
    }
}
