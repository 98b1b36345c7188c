use sentrig_core::Screen;
use std::time::Duration;

/// Presentation surface driven by the session controller.
///
/// The controller owns the thread that calls these methods; implementations
/// backed by a window must keep it responsive inside [`Display::hold`].
pub trait Display {
    /// Draws `screen` and returns once the frame has been presented.
    fn show(&mut self, screen: &Screen) -> anyhow::Result<()>;

    /// Non-blocking. True once the escape key or a close request has been seen
    /// since the previous call.
    fn cancel_requested(&mut self) -> bool;

    /// Blocks for `duration` of real time. Input arriving meanwhile is kept for
    /// the next [`Display::cancel_requested`].
    fn hold(&mut self, duration: Duration);

    fn close(&mut self);
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn show(&mut self, screen: &Screen) -> anyhow::Result<()> {
        (**self).show(screen)
    }

    fn cancel_requested(&mut self) -> bool {
        (**self).cancel_requested()
    }

    fn hold(&mut self, duration: Duration) {
        (**self).hold(duration)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
