use serde::{Deserialize, Serialize};

use super::{WindowInfo, WindowRole};

pub const DEFAULT_BRAND: &str = "Google Chrome";

/// Decides which of a process's windows is its main window and which are
/// extension/popup windows. Implementations must not touch the OS.
pub trait WindowClassifier: Send + Sync {
    fn is_main_window(&self, window: &WindowInfo) -> bool;
    fn is_extension_window(&self, window: &WindowInfo) -> bool;

    /// `None` means the window is excluded from the classified set.
    fn classify(&self, window: &WindowInfo) -> Option<WindowRole> {
        if self.is_main_window(window) {
            Some(WindowRole::Main)
        } else if self.is_extension_window(window) {
            Some(WindowRole::Extension)
        } else {
            None
        }
    }
}

/// Title-based rules: any titled window without the brand is an extension.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    brand: String,
}

impl TitleClassifier {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
        }
    }
}

impl WindowClassifier for TitleClassifier {
    fn is_main_window(&self, window: &WindowInfo) -> bool {
        window.title.contains(&self.brand) && window.is_standard
    }

    fn is_extension_window(&self, window: &WindowInfo) -> bool {
        !window.title.is_empty() && !window.title.contains(&self.brand)
    }
}

/// Role-based rules: anything that is not a branded standard window is an extension.
#[derive(Debug, Clone)]
pub struct RoleClassifier {
    brand: String,
}

impl RoleClassifier {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
        }
    }
}

impl WindowClassifier for RoleClassifier {
    fn is_main_window(&self, window: &WindowInfo) -> bool {
        window.title.contains(&self.brand) && window.is_standard
    }

    fn is_extension_window(&self, window: &WindowInfo) -> bool {
        !window.title.contains(&self.brand) || !window.is_standard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Title,
    Role,
}

impl Default for ClassifierKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            ClassifierKind::Role
        } else {
            ClassifierKind::Title
        }
    }
}

impl ClassifierKind {
    pub fn build(self, brand: &str) -> Box<dyn WindowClassifier> {
        match self {
            ClassifierKind::Title => Box::new(TitleClassifier::new(brand)),
            ClassifierKind::Role => Box::new(RoleClassifier::new(brand)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Rect, WindowHandle};

    fn window(title: &str, is_standard: bool) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle::new(1, 100),
            title: title.to_string(),
            frame: Rect::new(0, 0, 800, 600),
            is_visible: true,
            is_minimized: false,
            is_standard,
        }
    }

    #[test]
    fn test_title_classifier_main() {
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        let main = window("New Tab - Google Chrome", true);
        assert_eq!(classifier.classify(&main), Some(WindowRole::Main));
    }

    #[test]
    fn test_title_classifier_branded_popup_is_excluded() {
        // Branded but not a standard window: neither main nor extension
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        assert_eq!(classifier.classify(&window("Google Chrome", false)), None);
    }

    #[test]
    fn test_title_classifier_extension() {
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        assert_eq!(
            classifier.classify(&window("MetaMask Notification", false)),
            Some(WindowRole::Extension)
        );
        assert_eq!(classifier.classify(&window("", false)), None);
    }

    #[test]
    fn test_role_classifier_is_stricter() {
        let classifier = RoleClassifier::new(DEFAULT_BRAND);
        assert_eq!(
            classifier.classify(&window("Google Chrome", false)),
            Some(WindowRole::Extension)
        );
        assert_eq!(
            classifier.classify(&window("", true)),
            Some(WindowRole::Extension)
        );
        assert_eq!(
            classifier.classify(&window("Inbox - Google Chrome", true)),
            Some(WindowRole::Main)
        );
    }

    #[test]
    fn test_custom_brand() {
        let classifier = ClassifierKind::Title.build("Brave");
        assert!(classifier.is_main_window(&window("Start - Brave", true)));
        assert!(classifier.is_extension_window(&window("Start - Google Chrome", true)));
    }
}
