use parking_lot::Mutex;
use sentrig_timing::HighPrecisionTimer;
use sentrig_trigger::{ListenerExit, SessionContext, TriggerListener, TriggerPort};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum Step {
    Byte(u8),
    Fail,
}

/// In-memory device: the test feeds bytes (or a failure) and counts closes.
#[derive(Default)]
struct ScriptedPort {
    feed: Arc<Mutex<VecDeque<Step>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedPort {
    fn with_steps(steps: &[Step]) -> Self {
        let port = Self::default();
        port.feed.lock().extend(steps.iter().copied());
        port
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl TriggerPort for ScriptedPort {
    fn bytes_available(&mut self) -> io::Result<u32> {
        match self.feed.lock().front() {
            None => Ok(0),
            Some(Step::Byte(_)) => Ok(1),
            Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")),
        }
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        match self.feed.lock().pop_front() {
            Some(Step::Byte(b)) => Ok(b),
            _ => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
        }
    }
}

impl Drop for ScriptedPort {
    fn drop(&mut self) {
        // Only the instance moved into the listener counts as the device.
        if Arc::strong_count(&self.feed) == 1 {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Returns a second handle that shares feed and close counter but does not
/// count as the device when dropped.
fn observer(port: &ScriptedPort) -> (Arc<Mutex<VecDeque<Step>>>, Arc<AtomicUsize>) {
    (Arc::clone(&port.feed), Arc::clone(&port.closes))
}

#[test]
fn captures_bytes_in_arrival_order() {
    let ctx = SessionContext::new();
    let port = ScriptedPort::with_steps(&[Step::Byte(73), Step::Byte(10), Step::Byte(20)]);
    let (feed, closes) = observer(&port);

    let listener =
        TriggerListener::spawn(port, Duration::from_millis(2), &ctx, HighPrecisionTimer::new())
            .unwrap();

    wait_for(|| ctx.queue.len() == 3);
    let events = ctx.queue.drain_all();
    assert_eq!(
        events.iter().map(|e| e.code).collect::<Vec<_>>(),
        vec![73, 10, 20]
    );
    assert!(events.windows(2).all(|w| w[0].timestamp_ns <= w[1].timestamp_ns));

    // Bytes arriving later are picked up by the same thread.
    feed.lock().push_back(Step::Byte(255));
    wait_for(|| ctx.queue.len() == 1);
    assert_eq!(ctx.queue.drain_all()[0].code, 255);

    drop(feed);
    assert_eq!(listener.stop(), ListenerExit::Cancelled { received: 4 });
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn cancellation_interrupts_idle_poll_and_closes_once() {
    let ctx = SessionContext::new();
    let port = ScriptedPort::default();
    let (feed, closes) = observer(&port);
    drop(feed);

    // A long poll timeout must not delay shutdown.
    let listener =
        TriggerListener::spawn(port, Duration::from_secs(30), &ctx, HighPrecisionTimer::new())
            .unwrap();
    thread::sleep(Duration::from_millis(20));
    assert!(listener.is_running());

    let started = Instant::now();
    ctx.cancel.cancel();
    let exit = listener.stop();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(exit, ListenerExit::Cancelled { received: 0 });
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn device_error_stops_listener_and_keeps_earlier_triggers() {
    let ctx = SessionContext::new();
    let port = ScriptedPort::with_steps(&[Step::Byte(5), Step::Fail]);
    let (feed, closes) = observer(&port);
    drop(feed);

    let listener =
        TriggerListener::spawn(port, Duration::from_millis(2), &ctx, HighPrecisionTimer::new())
            .unwrap();

    wait_for(|| !listener.is_running());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    // The session itself is not cancelled by a device failure.
    assert!(!ctx.cancel.is_cancelled());
    assert_eq!(ctx.queue.drain_all().len(), 1);

    match listener.stop() {
        ListenerExit::DeviceFailed { received, error } => {
            assert_eq!(received, 1);
            assert!(error.contains("unplugged"));
        }
        other => panic!("unexpected exit: {other:?}"),
    }
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_the_handle_cancels_and_joins() {
    let ctx = SessionContext::new();
    let port = ScriptedPort::default();
    let (feed, closes) = observer(&port);
    drop(feed);

    let listener =
        TriggerListener::spawn(port, Duration::from_millis(5), &ctx, HighPrecisionTimer::new())
            .unwrap();
    drop(listener);

    assert!(ctx.cancel.is_cancelled());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn scripted_port_counts_only_the_device_instance() {
    let port = ScriptedPort::default();
    let (feed, closes) = observer(&port);
    assert_eq!(port.closes(), 0);
    drop(feed);
    drop(port);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
