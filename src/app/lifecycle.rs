use crate::{Error, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// Process-wide stop request. Dropping the held sender disconnects the
/// channel, which wakes every thread blocked in [`StopSignal::wait`] at once.
#[derive(Debug)]
pub struct StopSignal {
    stopped: AtomicBool,
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl StopSignal {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = channel::bounded(0);
        Arc::new(Self {
            stopped: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
            receiver: rx,
        })
    }

    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleep up to `timeout`. Returns `true` if the stop signal fired.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_stopped(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

/// Install a ctrl-c handler that fires the stop signal instead of exiting immediately.
pub(super) fn install_ctrlc(stop: Arc<StopSignal>) -> Result<()> {
    ctrlc::set_handler(move || stop.trigger())
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_without_trigger() {
        let stop = StopSignal::new();
        assert!(!stop.wait(Duration::from_millis(20)));
        assert!(!stop.is_stopped());
    }

    #[test]
    fn trigger_wakes_all_waiters_promptly() {
        let stop = StopSignal::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let stop = stop.clone();
                thread::spawn(move || {
                    let start = Instant::now();
                    let fired = stop.wait(Duration::from_secs(30));
                    (fired, start.elapsed())
                })
            })
            .collect();
        thread::sleep(Duration::from_millis(50));
        stop.trigger();
        for waiter in waiters {
            let (fired, elapsed) = waiter.join().unwrap();
            assert!(fired);
            assert!(elapsed < Duration::from_secs(5));
        }
        assert!(stop.wait(Duration::from_secs(30)));
    }
}
