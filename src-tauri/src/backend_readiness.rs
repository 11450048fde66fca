use std::{thread, time::Duration};

pub trait ReadinessProbe {
    fn is_ready(&self) -> bool;
}

impl<F> ReadinessProbe for F
where
    F: Fn() -> bool,
{
    fn is_ready(&self) -> bool {
        self()
    }
}

/// Probes until healthy or `max_attempts` probes have failed.
///
/// Blocking; callers run it on the async runtime's blocking pool, never on the
/// UI thread. `on_progress(attempt, max_attempts)` fires after every probe,
/// including the healthy one, and before any sleep.
pub fn await_ready<P, F>(
    probe: &P,
    max_attempts: u32,
    interval: Duration,
    mut on_progress: F,
) -> bool
where
    P: ReadinessProbe + ?Sized,
    F: FnMut(u32, u32),
{
    for attempt in 1..=max_attempts {
        let healthy = probe.is_ready();
        on_progress(attempt, max_attempts);
        if healthy {
            return true;
        }
        thread::sleep(interval);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, time::Instant};

    #[test]
    fn healthy_on_attempt_k_stops_after_k_probes() {
        let probes = Cell::new(0u32);
        let probe = || {
            probes.set(probes.get() + 1);
            probes.get() == 3
        };
        let mut progress = Vec::new();

        let ready = await_ready(&probe, 10, Duration::from_millis(1), |attempt, max| {
            progress.push((attempt, max))
        });

        assert!(ready);
        assert_eq!(probes.get(), 3);
        assert_eq!(progress, vec![(1, 10), (2, 10), (3, 10)]);
    }

    #[test]
    fn never_healthy_exhausts_all_attempts() {
        let probes = Cell::new(0u32);
        let probe = || {
            probes.set(probes.get() + 1);
            false
        };
        let mut last_attempt = 0;

        let ready = await_ready(&probe, 5, Duration::from_millis(1), |attempt, _| {
            last_attempt = attempt
        });

        assert!(!ready);
        assert_eq!(probes.get(), 5);
        assert_eq!(last_attempt, 5);
    }

    #[test]
    fn elapsed_time_tracks_interval_between_failures() {
        let interval = Duration::from_millis(20);
        let start = Instant::now();

        let ready = await_ready(&|| false, 4, interval, |_, _| {});

        let elapsed = start.elapsed();
        assert!(!ready);
        assert!(elapsed >= interval * 4);
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn zero_attempts_is_never_ready() {
        let probes = Cell::new(0u32);
        let probe = || {
            probes.set(probes.get() + 1);
            true
        };
        assert!(!await_ready(&probe, 0, Duration::from_millis(1), |_, _| {}));
        assert_eq!(probes.get(), 0);
    }
}
