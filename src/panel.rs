//! The control panel.
//!
//! Every panel button is one [`Command`], dispatched against a [`Session`] and a [`Host`].
//! Commands are independent one-shot operations; the session is the only shared state between
//! them.

use crate::camera::{Camera, CameraError, CameraOptions, FrameSource};
use crate::image::Image;
use crate::sandbox::HandDetector;
use crate::session::{Session, SessionError};

/// Vertical scroll offset issued per scroll command, in pixels.
pub const SCROLL_STEP: i32 = 500;

/// One control-panel action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    OpenView,
    ScrollUp,
    ScrollDown,
    CloseTab,
    CloseWindow,
}

/// A page known to the browser host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: u64,
    pub url: String,
    pub active: bool,
}

impl Page {
    /// Whether this page belongs to the extension UI itself (and must never be scrolled or
    /// closed by panel commands).
    pub fn is_extension_page(&self) -> bool {
        self.url.starts_with("chrome-extension://") || self.url.starts_with("chrome://")
    }
}

/// The browser capability surface. Fixed external API; tests substitute a recording mock.
pub trait Host {
    /// Pages currently known to the host, most recently used first.
    fn pages(&self) -> Vec<Page>;

    /// Scrolls a page vertically by `dy` pixels.
    fn scroll_by(&mut self, page: u64, dy: i32) -> anyhow::Result<()>;

    /// Opens the camera view.
    fn open_view(&mut self) -> anyhow::Result<()>;

    /// Closes a tab.
    fn close_tab(&mut self, page: u64) -> anyhow::Result<()>;

    /// Closes the panel's own window.
    fn close_window(&mut self) -> anyhow::Result<()>;
}

type SourceFactory = Box<dyn Fn() -> Result<Box<dyn FrameSource>, CameraError>>;
type DetectorFactory = Box<dyn Fn() -> Box<dyn HandDetector>>;

/// Dispatches [`Command`]s against one [`Session`] and the host capability surface.
pub struct Panel<H: Host> {
    session: Session,
    host: H,
    open_source: SourceFactory,
    make_detector: DetectorFactory,
}

impl<H: Host> Panel<H> {
    /// Creates a panel with caller-supplied camera and detector factories.
    pub fn new(
        host: H,
        open_source: impl Fn() -> Result<Box<dyn FrameSource>, CameraError> + 'static,
        make_detector: impl Fn() -> Box<dyn HandDetector> + 'static,
    ) -> Self {
        Self {
            session: Session::new(),
            host,
            open_source: Box::new(open_source),
            make_detector: Box::new(make_detector),
        }
    }

    /// Creates a panel that acquires real cameras with `options`.
    pub fn with_camera(
        host: H,
        options: CameraOptions,
        make_detector: impl Fn() -> Box<dyn HandDetector> + 'static,
    ) -> Self {
        Self::new(
            host,
            move || Ok(Box::new(Camera::open(options.clone())?) as Box<dyn FrameSource>),
            make_detector,
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Runs one relay iteration for the active session. See [`Session::tick`].
    pub fn tick(&mut self) -> Option<&Image> {
        self.session.tick()
    }

    /// Executes a command and returns the resulting status line.
    pub fn handle(&mut self, command: Command) -> String {
        match command {
            Command::Start => {
                let open = &self.open_source;
                match self
                    .session
                    .start_with(|| open(), (self.make_detector)())
                {
                    Ok(()) | Err(SessionError::AlreadyActive) => {}
                    Err(e) => log::error!("start failed: {}", e),
                }
            }
            Command::Stop => self.session.stop(),
            Command::ScrollUp => return self.scroll(-SCROLL_STEP),
            Command::ScrollDown => return self.scroll(SCROLL_STEP),
            Command::OpenView => {
                if let Err(e) = self.host.open_view() {
                    return format!("Error: {e}");
                }
            }
            Command::CloseTab => {
                let Some(page) = self.controlled_page() else {
                    return NO_CONTROLLED_PAGE.to_string();
                };
                if let Err(e) = self.host.close_tab(page.id) {
                    return format!("Error: {e}");
                }
            }
            Command::CloseWindow => {
                if let Err(e) = self.host.close_window() {
                    return format!("Error: {e}");
                }
            }
        }

        self.session.status().to_string()
    }

    fn scroll(&mut self, dy: i32) -> String {
        let Some(page) = self.controlled_page() else {
            return NO_CONTROLLED_PAGE.to_string();
        };
        match self.host.scroll_by(page.id, dy) {
            Ok(()) => self.session.status().to_string(),
            Err(e) => format!("Error: {e}"),
        }
    }

    /// The page scroll and close-tab commands act on: the most recently used active page that is
    /// not part of the extension UI.
    fn controlled_page(&self) -> Option<Page> {
        self.host
            .pages()
            .into_iter()
            .find(|page| page.active && !page.is_extension_page())
    }
}

const NO_CONTROLLED_PAGE: &str = "No browser tab found to control";

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::sandbox::NullDetector;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Scroll(u64, i32),
        OpenView,
        CloseTab(u64),
        CloseWindow,
    }

    #[derive(Default)]
    struct MockHost {
        pages: Vec<Page>,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Host for MockHost {
        fn pages(&self) -> Vec<Page> {
            self.pages.clone()
        }
        fn scroll_by(&mut self, page: u64, dy: i32) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::Scroll(page, dy));
            Ok(())
        }
        fn open_view(&mut self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::OpenView);
            Ok(())
        }
        fn close_tab(&mut self, page: u64) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::CloseTab(page));
            Ok(())
        }
        fn close_window(&mut self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::CloseWindow);
            Ok(())
        }
    }

    fn panel_with(pages: Vec<Page>) -> (Panel<MockHost>, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let host = MockHost {
            pages,
            calls: calls.clone(),
        };
        let panel = Panel::new(
            host,
            || Err(CameraError::NoDevice),
            || Box::new(NullDetector),
        );
        (panel, calls)
    }

    fn page(id: u64, url: &str, active: bool) -> Page {
        Page {
            id,
            url: url.to_string(),
            active,
        }
    }

    #[test]
    fn scroll_skips_extension_pages() {
        let (mut panel, calls) = panel_with(vec![
            page(1, "chrome-extension://abcdef/window.html", true),
            page(2, "https://example.com/article", true),
            page(3, "https://example.com/other", true),
        ]);

        panel.handle(Command::ScrollDown);
        panel.handle(Command::ScrollUp);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Scroll(2, SCROLL_STEP), Call::Scroll(2, -SCROLL_STEP)]
        );
    }

    #[test]
    fn scroll_without_controllable_page_reports_status() {
        let (mut panel, calls) = panel_with(vec![
            page(1, "chrome-extension://abcdef/window.html", true),
            page(2, "chrome://settings", true),
            page(3, "https://example.com", false),
        ]);

        let status = panel.handle(Command::ScrollDown);
        assert_eq!(status, "No browser tab found to control");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn close_tab_targets_controlled_page() {
        let (mut panel, calls) = panel_with(vec![
            page(7, "chrome-extension://abcdef/popup.html", true),
            page(9, "https://example.com", true),
        ]);

        panel.handle(Command::CloseTab);
        assert_eq!(*calls.lock().unwrap(), vec![Call::CloseTab(9)]);
    }

    #[test]
    fn one_shot_host_commands() {
        let (mut panel, calls) = panel_with(Vec::new());
        panel.handle(Command::OpenView);
        panel.handle(Command::CloseWindow);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::OpenView, Call::CloseWindow]
        );
    }

    #[test]
    fn failed_start_surfaces_camera_error() {
        let (mut panel, _) = panel_with(Vec::new());
        let status = panel.handle(Command::Start);
        assert_eq!(status, "Error: no camera found on this device");
        assert!(!panel.session().is_active());
    }
}
