use super::{Point, Window, WindowClassifier, WindowInfo, WindowRole};
use crate::platform::WindowSystem;

/// Windows of one process split into its main window and extension/popup windows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedWindowSet {
    pub pid: i32,
    pub main: Option<Window>,
    pub extensions: Vec<Window>,
}

impl ClassifiedWindowSet {
    pub fn empty(pid: i32) -> Self {
        Self {
            pid,
            main: None,
            extensions: Vec::new(),
        }
    }

    /// First extension window containing `point`.
    pub fn popup_at(&self, point: Point) -> Option<&Window> {
        self.extensions.iter().find(|w| w.frame.contains(point))
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.main.iter().chain(self.extensions.iter())
    }

    pub fn to_ipc(&self) -> Vec<renmado_ipc::WindowInfo> {
        self.windows().map(Window::to_ipc).collect()
    }
}

/// Classify already-enumerated windows of `pid`. The first main candidate wins.
pub fn classify_windows(
    pid: i32,
    windows: Vec<WindowInfo>,
    classifier: &dyn WindowClassifier,
) -> ClassifiedWindowSet {
    let mut set = ClassifiedWindowSet::empty(pid);

    for info in windows {
        if info.handle.pid != pid || !info.is_visible || info.is_minimized {
            continue;
        }

        match classifier.classify(&info) {
            Some(WindowRole::Main) if set.main.is_none() => {
                set.main = Some(Window::from_info(info, WindowRole::Main));
            }
            Some(WindowRole::Main) => {
                tracing::debug!(
                    "Ignoring additional main window candidate {} ({:?}) for pid {}",
                    info.handle.id,
                    info.title,
                    pid
                );
            }
            Some(WindowRole::Extension) => {
                set.extensions
                    .push(Window::from_info(info, WindowRole::Extension));
            }
            None => {}
        }
    }

    set
}

/// Enumerate and classify the top-level windows of `pid`.
pub fn discover<S: WindowSystem + ?Sized>(
    ws: &S,
    classifier: &dyn WindowClassifier,
    pid: i32,
) -> ClassifiedWindowSet {
    match ws.discover_windows(pid) {
        Ok(windows) => classify_windows(pid, windows, classifier),
        Err(e) => {
            tracing::warn!("Failed to enumerate windows for pid {}: {}", pid, e);
            ClassifiedWindowSet::empty(pid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Rect, TitleClassifier, DEFAULT_BRAND};
    use crate::platform::mock::{create_test_popup, create_test_window, MockBackend};

    #[test]
    fn test_discover_main_and_extensions() {
        let ws = MockBackend::new().with_windows(vec![
            create_test_window(1, 100, "Tab - Google Chrome", 0, 0, 800, 600),
            create_test_popup(2, 100, "Wallet", 600, 40, 360, 600),
            create_test_window(3, 200, "Other - Google Chrome", 0, 0, 800, 600),
        ]);
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let set = discover(&ws, &classifier, 100);
        assert_eq!(set.main.as_ref().map(|w| w.handle.id), Some(1));
        assert_eq!(set.extensions.len(), 1);
        assert_eq!(set.extensions[0].handle.id, 2);
        assert!(set.extensions[0].is_extension());
    }

    #[test]
    fn test_discover_first_main_wins() {
        let ws = MockBackend::new().with_windows(vec![
            create_test_window(5, 100, "First - Google Chrome", 0, 0, 800, 600),
            create_test_window(6, 100, "Second - Google Chrome", 50, 50, 800, 600),
        ]);
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let set = discover(&ws, &classifier, 100);
        assert_eq!(set.main.unwrap().handle.id, 5);
        assert!(set.extensions.is_empty());
    }

    #[test]
    fn test_discover_skips_hidden_and_minimized() {
        let mut hidden = create_test_window(1, 100, "A - Google Chrome", 0, 0, 800, 600);
        hidden.is_visible = false;
        let mut minimized = create_test_window(2, 100, "B - Google Chrome", 0, 0, 800, 600);
        minimized.is_minimized = true;
        let ws = MockBackend::new().with_windows(vec![hidden, minimized]);
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let set = discover(&ws, &classifier, 100);
        assert!(set.main.is_none());
        assert!(set.extensions.is_empty());
    }

    #[test]
    fn test_discover_without_main_yields_partial_set() {
        let ws = MockBackend::new().with_windows(vec![create_test_popup(
            9, 100, "Translate", 10, 10, 200, 100,
        )]);
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let set = discover(&ws, &classifier, 100);
        assert!(set.main.is_none());
        assert_eq!(set.extensions.len(), 1);
    }

    #[test]
    fn test_popup_at() {
        let ws = MockBackend::new().with_windows(vec![
            create_test_window(1, 100, "Tab - Google Chrome", 0, 0, 800, 600),
            create_test_popup(2, 100, "Menu", 500, 50, 200, 300),
        ]);
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        let set = discover(&ws, &classifier, 100);

        assert_eq!(
            set.popup_at(Point::new(550, 100)).map(|w| w.handle.id),
            Some(2)
        );
        assert!(set.popup_at(Point::new(100, 100)).is_none());
        assert_eq!(set.windows().count(), 2);
        assert_eq!(set.to_ipc()[1].width, Rect::new(500, 50, 200, 300).width);
    }
}
