use log::*;
use std::borrow::Cow;
use std::time::{Duration, Instant};

pub type StrCow = Cow<'static, str>;

/// Measures wall-clock time from construction.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Stopwatch {
        Stopwatch { started: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

#[must_use = "The guard is immediately dropped after instantiation. This is probably not
what you want! Consider using a `let` binding to increase its lifetime."]
pub struct SpanGuard {
    inner: scopeguard::ScopeGuard<(StrCow, Stopwatch), fn((StrCow, Stopwatch))>,
}

impl SpanGuard {
    pub fn name(&self) -> &str {
        &self.inner.0
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.1.elapsed()
    }
}

pub fn start_guard<S: Into<StrCow>>(name: S) -> SpanGuard {
    let name = name.into();

    debug!("[Timing] Enter: {}", name);

    let exit: fn((StrCow, Stopwatch)) = |(name, stopwatch)| {
        debug!("[Timing] Exit: {} - {:.3}ms", name, stopwatch.elapsed_ms());
    };

    SpanGuard {
        inner: scopeguard::guard((name, Stopwatch::start()), exit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_reports_name_and_elapsed_time() {
        let guard = start_guard("unit");
        assert_eq!(guard.name(), "unit");
        assert!(guard.elapsed() >= Duration::ZERO);
    }

    #[test]
    fn stopwatch_is_monotonic() {
        let stopwatch = Stopwatch::start();
        let first = stopwatch.elapsed();
        let second = stopwatch.elapsed();
        assert!(second >= first);
    }
}
