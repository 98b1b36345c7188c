use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow, bail};
use pixels::{Pixels, SurfaceTexture};
use sentrig_core::Screen;
use sentrig_experiment::{Display, DisplayConfig};
use sentrig_render::SkiaRenderer;
use sentrig_timing::{HighPrecisionTimer, Timer};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    monitor::MonitorHandle,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Icon, Window, WindowId},
};

/// The last stretch of a hold is slept on the precise timer instead of
/// waiting on the event loop.
const SLEEP_MARGIN: Duration = Duration::from_millis(2);
const WINDOW_TIMEOUT: Duration = Duration::from_secs(5);

/// Fullscreen winit window driven from the session thread.
///
/// The event loop is pumped rather than run: the controller owns the thread,
/// and every `show`, `hold` and `cancel_requested` call processes pending
/// window events.
pub struct WindowDisplay {
    event_loop: EventLoop<()>,
    state: WindowState,
    timer: HighPrecisionTimer,
}

struct WindowState {
    screen_index: usize,
    background: [u8; 4],
    text_color: [u8; 4],
    icon: Option<Icon>,
    font: Option<FontVec>,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    current: Screen,

    cancel_pending: bool,
    exited: bool,
    error: Option<anyhow::Error>,
}

impl WindowDisplay {
    /// Creates the event loop and waits until the fullscreen window exists.
    pub fn open(config: &DisplayConfig, font: FontVec, timer: HighPrecisionTimer) -> Result<Self> {
        let event_loop = EventLoop::new().context("creating event loop")?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let icon = config
            .icon_path
            .as_deref()
            .and_then(|path| match load_icon(path) {
                Ok(icon) => Some(icon),
                Err(e) => {
                    log::warn!("Window icon not loaded: {e:#}");
                    None
                }
            });

        let mut display = Self {
            event_loop,
            state: WindowState {
                screen_index: config.screen,
                background: config.background,
                text_color: config.text_color,
                icon,
                font: Some(font),
                window: None,
                pixels: None,
                renderer: None,
                current: Screen::Blank,
                cancel_pending: false,
                exited: false,
                error: None,
            },
            timer,
        };

        let deadline = Instant::now() + WINDOW_TIMEOUT;
        while display.state.window.is_none() {
            display.pump(Some(Duration::from_millis(10)));
            if let Some(e) = display.state.error.take() {
                return Err(e.context("opening window"));
            }
            if display.state.exited {
                bail!("event loop exited before the window was created");
            }
            if Instant::now() > deadline {
                bail!("window was not created within {:?}", WINDOW_TIMEOUT);
            }
        }
        Ok(display)
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if self.state.exited {
            return;
        }
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.state) {
            log::debug!("Event loop exited with code {}", code);
            self.state.exited = true;
            self.state.cancel_pending = true;
        }
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, screen: &Screen) -> Result<()> {
        self.state.current = screen.clone();
        self.state.draw()?;
        self.pump(Some(Duration::ZERO));
        match self.state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn cancel_requested(&mut self) -> bool {
        self.pump(Some(Duration::ZERO));
        std::mem::take(&mut self.state.cancel_pending)
    }

    fn hold(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining <= SLEEP_MARGIN || self.state.exited {
                self.timer.sleep(remaining);
                return;
            }
            self.pump(Some(remaining - SLEEP_MARGIN));
        }
    }

    fn close(&mut self) {
        self.state.teardown();
        self.pump(Some(Duration::ZERO));
    }
}

impl WindowState {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = match event_loop.available_monitors().nth(self.screen_index) {
            Some(monitor) => monitor,
            None => {
                log::warn!(
                    "Screen {} not found, using the primary monitor",
                    self.screen_index
                );
                event_loop
                    .primary_monitor()
                    .or_else(|| event_loop.available_monitors().next())
                    .ok_or_else(|| anyhow!("No monitor available"))?
            }
        };

        let mut attributes = Window::default_attributes()
            .with_title("Sentence reading task")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor.clone()))))
            .with_resizable(false);
        if let Some(icon) = self.icon.clone() {
            attributes = attributes.with_window_icon(Some(icon));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        log::info!(
            "Display: {} {}x{}, scale {:.2}{}",
            monitor.name().unwrap_or_else(|| "unnamed".to_string()),
            width,
            height,
            window.scale_factor(),
            refresh_rate(&monitor)
                .map(|hz| format!(", {:.1} Hz", hz))
                .unwrap_or_default()
        );

        let surface = SurfaceTexture::new(width, height, window.clone());
        self.pixels = Some(Pixels::new(width, height, surface)?);

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow!("font was already handed to a renderer"))?;
        self.renderer = Some(SkiaRenderer::new(
            width,
            height,
            font,
            self.background,
            self.text_color,
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        renderer.render_screen(&self.current);
        let canvas = renderer.frame_rgba();
        let frame = pixels.frame_mut();
        if frame.len() != canvas.len() {
            log::warn!("Frame buffer and canvas sizes differ, skipping frame");
            return Ok(());
        }
        frame.copy_from_slice(canvas);
        pixels.render().context("presenting frame")
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        let (width, height) = (size.width.max(1), size.height.max(1));
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(width, height) {
                log::error!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(width, height) {
                log::error!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(width, height) {
                log::error!("Failed to resize canvas: {e:#}");
            }
        }
        log::debug!("Display resized to {}x{}", width, height);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn teardown(&mut self) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.pixels = None;
        self.renderer = None;
        if self.window.take().is_some() {
            log::info!("Window closed");
        }
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() && self.font.is_some() {
            if let Err(e) = self.create_window(event_loop) {
                self.error = Some(e);
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::warn!("Window close requested");
                self.cancel_pending = true;
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    log::warn!("Escape pressed");
                    self.cancel_pending = true;
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.draw() {
                    self.error = Some(e);
                }
            }
            _ => {}
        }
    }
}

fn refresh_rate(monitor: &MonitorHandle) -> Option<f64> {
    monitor
        .refresh_rate_millihertz()
        .map(|rate| rate as f64 / 1000.0)
}

fn load_icon(path: &Path) -> Result<Icon> {
    let image = image::open(path)
        .with_context(|| format!("reading icon {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).context("building window icon")
}

/// One line per monitor, for `--list-monitors`.
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    pub index: usize,
    pub name: String,
    pub size: PhysicalSize<u32>,
    pub refresh_hz: Option<f64>,
    pub primary: bool,
}

#[derive(Default)]
struct MonitorLister {
    monitors: Vec<MonitorInfo>,
}

impl ApplicationHandler for MonitorLister {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let primary = event_loop.primary_monitor();
        self.monitors = event_loop
            .available_monitors()
            .enumerate()
            .map(|(index, m)| MonitorInfo {
                index,
                name: m.name().unwrap_or_else(|| "unnamed".to_string()),
                size: m.size(),
                refresh_hz: refresh_rate(&m),
                primary: primary.as_ref() == Some(&m),
            })
            .collect();
        event_loop.exit();
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, _: WindowEvent) {}
}

/// Enumerates monitors. Uses up the process's one event loop, so call it
/// only when no window will follow.
pub fn list_monitors() -> Result<Vec<MonitorInfo>> {
    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut lister = MonitorLister::default();
    event_loop.run_app(&mut lister)?;
    Ok(lister.monitors)
}
