//! Background heartbeat trigger.
//!
//! Deployments that have no scheduler of their own can drive
//! [`NetService::heartbeat`] from a dedicated thread. The ticker stops when
//! [`HeartbeatTicker::stop`] is called or the handle is dropped.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::registry::NetService;

/// Shortest interval accepted; keeps a zero interval from spinning.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

/// Handle to a running heartbeat thread.
pub struct HeartbeatTicker {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatTicker {
    /// Start ticking `service` every `interval`. The first tick fires one
    /// interval after spawning.
    pub fn spawn(service: Arc<NetService>, interval: Duration) -> io::Result<Self> {
        let interval = interval.max(MIN_INTERVAL);
        let shutdown = Arc::new(Shutdown::default());

        let handle = thread::Builder::new().name("weft-heartbeat".to_string()).spawn({
            let shutdown = Arc::clone(&shutdown);
            move || run(&service, &shutdown, interval)
        })?;

        debug!(?interval, "heartbeat ticker started");
        Ok(Self { shutdown, handle: Some(handle) })
    }

    /// Start ticking at the service's configured interval.
    pub fn from_config(service: Arc<NetService>) -> io::Result<Self> {
        let interval = service.config().heartbeat_interval;
        Self::spawn(service, interval)
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        *self.shutdown.stopped.lock() = true;
        self.shutdown.signal.notify_all();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("heartbeat thread panicked");
            }
        }
    }
}

impl Drop for HeartbeatTicker {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run(service: &NetService, shutdown: &Shutdown, interval: Duration) {
    let mut stopped = shutdown.stopped.lock();
    loop {
        let deadline = Instant::now() + interval;
        while !*stopped {
            if shutdown.signal.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        if *stopped {
            return;
        }

        // Release the flag while ticking so stop() never waits on a send
        MutexGuard::unlocked(&mut stopped, || service.heartbeat());
    }
}
