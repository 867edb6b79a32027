use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{context::StationContext, lifecycle::StopSignal};
use crate::{net, Error, Result};

/// One reachability check.
pub trait Probe: Send {
    fn check(&mut self) -> Result<()>;
}

/// TCP connect to a well-known host (by default a public DNS resolver on port 53).
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }
}

impl Probe for TcpProbe {
    fn check(&mut self) -> Result<()> {
        net::connect(&self.host, self.port, self.timeout).map(drop)
    }
}

/// Spawn the monitor thread. It publishes the connectivity flag into `ctx`
/// until `stop` fires.
pub fn spawn_monitor<P>(
    mut probe: P,
    ctx: Arc<StationContext>,
    stop: Arc<StopSignal>,
    healthy_interval: Duration,
) -> Result<JoinHandle<()>>
where
    P: Probe + 'static,
{
    thread::Builder::new()
        .name("station-connectivity".into())
        .spawn(move || monitor_loop(&mut probe, &ctx, &stop, healthy_interval))
        .map_err(Error::Io)
}

/// After a success, sleep `healthy_interval`; after a failure, probe again
/// straight away so a returning network is noticed quickly.
pub(crate) fn monitor_loop<P: Probe + ?Sized>(
    probe: &mut P,
    ctx: &StationContext,
    stop: &StopSignal,
    healthy_interval: Duration,
) {
    while !stop.is_stopped() {
        match probe.check() {
            Ok(()) => {
                if !ctx.set_connected(true) {
                    ctx.logger().info("internet connection available");
                }
                if stop.wait(healthy_interval) {
                    break;
                }
            }
            Err(err) => {
                if ctx.set_connected(false) {
                    ctx.logger().error(format!(
                        "internet connection lost ({}): {err}",
                        net::classify_error(&err)
                    ));
                } else {
                    ctx.logger().debug(format!("connectivity check failed: {err}"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{LogLevel, Logger};
    use crate::fake::FakeDisplay;
    use std::collections::VecDeque;
    use std::net::TcpListener;
    use std::time::Instant;

    /// Replays scripted outcomes, records the flag seen before each check,
    /// and fires the stop signal once the script runs out.
    struct ScriptedProbe {
        script: VecDeque<bool>,
        ctx: Arc<StationContext>,
        stop: Arc<StopSignal>,
        seen: Vec<bool>,
        checked_at: Vec<Instant>,
    }

    impl Probe for ScriptedProbe {
        fn check(&mut self) -> Result<()> {
            self.seen.push(self.ctx.is_connected());
            self.checked_at.push(Instant::now());
            match self.script.pop_front() {
                Some(true) => Ok(()),
                Some(false) => Err(Error::Timeout("connect 8.8.8.8:53".into())),
                None => {
                    self.stop.trigger();
                    Err(Error::Timeout("script exhausted".into()))
                }
            }
        }
    }

    fn context() -> Arc<StationContext> {
        StationContext::new(
            Arc::new(Logger::new(LogLevel::Error, None)),
            Box::new(FakeDisplay::new()),
        )
    }

    #[test]
    fn failures_retry_immediately_and_flip_the_flag() {
        let ctx = context();
        let stop = StopSignal::new();
        let mut probe = ScriptedProbe {
            script: VecDeque::from(vec![false, false, true, false]),
            ctx: ctx.clone(),
            stop: stop.clone(),
            seen: Vec::new(),
            checked_at: Vec::new(),
        };
        monitor_loop(&mut probe, &ctx, &stop, Duration::from_millis(100));
        // flag as observed before each probe: initial, fail, fail, ok, fail
        assert_eq!(probe.seen, vec![false, false, false, true, false]);
        assert!(!ctx.is_connected());
        let after_success = probe.checked_at[3] - probe.checked_at[2];
        assert!(after_success >= Duration::from_millis(100));
    }

    #[test]
    fn stop_interrupts_the_healthy_sleep() {
        let ctx = context();
        let stop = StopSignal::new();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(1));
        let handle = spawn_monitor(probe, ctx.clone(), stop.clone(), Duration::from_secs(60)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !ctx.is_connected() {
            assert!(Instant::now() < deadline, "monitor never connected");
            thread::sleep(Duration::from_millis(5));
        }
        let start = Instant::now();
        stop.trigger();
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn tcp_probe_reports_refusal() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let mut probe = TcpProbe::new("127.0.0.1", port, Duration::from_millis(500));
        assert!(probe.check().is_err());
    }
}
