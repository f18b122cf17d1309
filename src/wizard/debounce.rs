use chrono::{DateTime, Duration, Utc};

/// Holds back a rapidly changing value until it has been stable for the quiet
/// period. Purely time-based: callers feed input through [`Debouncer::set`]
/// and drain emissions through [`Debouncer::poll`] with an injected clock
/// reading, so no timers or threads are involved.
#[derive(Debug, Clone)]
pub struct Debouncer<T: Clone + PartialEq> {
    delay: Duration,
    pending: Option<(T, DateTime<Utc>)>,
    settled: Option<T>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            settled: None,
        }
    }

    /// Records a new input value. A changed value restarts the quiet period;
    /// re-submitting the value already pending or settled is a no-op, so the
    /// timer only restarts on an actual change.
    pub fn set(&mut self, value: T, now: DateTime<Utc>) {
        if let Some((pending, _)) = &self.pending {
            if *pending == value {
                return;
            }
        } else if self.settled.as_ref() == Some(&value) {
            return;
        }
        self.pending = Some((value, now));
    }

    /// Emits the pending value once it has been stable for the full quiet
    /// period. At most one emission occurs per quiet period.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        let (value, since) = self.pending.clone()?;
        if now - since < self.delay {
            return None;
        }
        self.pending = None;
        self.settled = Some(value.clone());
        Some(value)
    }

    /// Discards any pending emission so no stale value fires after teardown.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Last value that survived a quiet period.
    pub fn settled(&self) -> Option<&T> {
        self.settled.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid instant")
    }

    #[test]
    fn rapid_changes_emit_only_the_last_value() {
        let mut debouncer = Debouncer::new(Duration::milliseconds(500));
        debouncer.set("t", at(0));
        debouncer.set("to", at(100));
        debouncer.set("toy", at(200));
        assert_eq!(debouncer.poll(at(400)), None);
        assert_eq!(debouncer.poll(at(700)), Some("toy"));
        // The quiet period emits once; nothing more without new input.
        assert_eq!(debouncer.poll(at(1_500)), None);
    }

    #[test]
    fn unchanged_value_does_not_restart_the_timer() {
        let mut debouncer = Debouncer::new(Duration::milliseconds(500));
        debouncer.set("toyota", at(0));
        debouncer.set("toyota", at(450));
        assert_eq!(debouncer.poll(at(500)), Some("toyota"));
    }

    #[test]
    fn resubmitting_the_settled_value_is_a_no_op() {
        let mut debouncer = Debouncer::new(Duration::milliseconds(500));
        debouncer.set("toyota", at(0));
        assert_eq!(debouncer.poll(at(500)), Some("toyota"));
        debouncer.set("toyota", at(600));
        assert_eq!(debouncer.poll(at(2_000)), None);
    }

    #[test]
    fn cancel_discards_the_pending_emission() {
        let mut debouncer = Debouncer::new(Duration::milliseconds(500));
        debouncer.set("toyota", at(0));
        debouncer.cancel();
        assert_eq!(debouncer.poll(at(10_000)), None);
        assert_eq!(debouncer.settled(), None);
    }
}
