//! Progress reporting for a single transfer session.
//!
//! The executor only knows [`ProgressObserver::advance`]; what happens with the
//! numbers (a log line, a callback into some UI, nothing) is up to the observer
//! wired in by the caller. Observers must not fail, so the trait returns nothing.

const BAR_WIDTH: usize = 25;
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Receives one call per chunk written, with the chunk's length.
pub trait ProgressObserver: Send {
    fn advance(&mut self, n: u64);
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for &mut T {
    fn advance(&mut self, n: u64) {
        (**self).advance(n)
    }
}

/// Running byte count of one session.
///
/// `base` is where the session started on disk; `current` only counts bytes
/// advanced during this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    total: u64,
    base: u64,
    current: u64,
}

impl ProgressState {
    pub fn new(total: u64, start_offset: u64) -> Self {
        Self {
            total,
            base: start_offset,
            current: 0,
        }
    }

    pub fn advance(&mut self, n: u64) {
        self.current = self.current.saturating_add(n);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes copied during this session.
    pub fn copied(&self) -> u64 {
        self.current
    }

    /// Absolute position in the artifact.
    pub fn position(&self) -> u64 {
        self.base.saturating_add(self.current)
    }

    /// Completion in `[0, 100]`. An empty transfer counts as complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        let pct = self.position() as f64 / self.total as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }
}

/// Logs progress through `tracing` each time the percentage crosses a step.
pub struct TracingProgress {
    label: String,
    state: ProgressState,
    step: u8,
    last_logged: Option<u8>,
}

impl TracingProgress {
    pub fn new(label: impl Into<String>, total: u64, start_offset: u64, step: u8) -> Self {
        Self {
            label: label.into(),
            state: ProgressState::new(total, start_offset),
            step: step.clamp(1, 100),
            last_logged: None,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    fn should_log(&self, whole: u8) -> bool {
        match self.last_logged {
            None => true,
            Some(last) => whole >= last.saturating_add(self.step) || (whole == 100 && last < 100),
        }
    }
}

impl ProgressObserver for TracingProgress {
    fn advance(&mut self, n: u64) {
        self.state.advance(n);
        let whole = self.state.percent().floor() as u8;
        if self.should_log(whole) {
            self.last_logged = Some(whole);
            tracing::info!("⏫ {} {}", self.label, render_bar(&self.state));
        }
    }
}

/// Forwards `(total, position)` to a closure after every chunk.
pub struct CallbackProgress<F> {
    state: ProgressState,
    callback: F,
}

impl<F> CallbackProgress<F>
where
    F: FnMut(u64, u64) + Send,
{
    pub fn new(total: u64, start_offset: u64, callback: F) -> Self {
        Self {
            state: ProgressState::new(total, start_offset),
            callback,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }
}

impl<F> ProgressObserver for CallbackProgress<F>
where
    F: FnMut(u64, u64) + Send,
{
    fn advance(&mut self, n: u64) {
        self.state.advance(n);
        (self.callback)(self.state.total(), self.state.position());
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn advance(&mut self, _n: u64) {}
}

/// `"1.00MB  [▅▅▅▅▅▅▅▅▅▅▅▅             ] 50%"`
pub fn render_bar(state: &ProgressState) -> String {
    let pct = state.percent();
    let filled = ((pct / 4.0) as usize).min(BAR_WIDTH);
    format!(
        "{:<8}[{}{}]{:3.0}%",
        format_size(state.total()),
        "▅".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        pct
    )
}

/// Human readable size with 1024 steps, e.g. `1.50KB`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", value, SIZE_UNITS[unit])
}
