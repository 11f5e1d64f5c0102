use core_foundation::{
    array::CFArray,
    base::{CFTypeID, TCFType},
    boolean::CFBoolean,
    declare_TCFType,
    dictionary::CFDictionary,
    impl_TCFType,
    string::{CFString, CFStringRef},
};
use core_graphics::geometry::{CGPoint, CGSize};
use core_foundation_sys::base::CFRelease;
use std::ffi::c_void;
use std::ptr;

use crate::core::{Rect, WindowHandle, WindowInfo};

pub type AXError = i32;
pub const AX_ERROR_SUCCESS: AXError = 0;
pub const AX_ERROR_FAILURE: AXError = -25200;
pub const AX_ERROR_API_DISABLED: AXError = -25211;

#[repr(C)]
pub struct __AXUIElement(c_void);
pub type AXUIElementRef = *mut __AXUIElement;

declare_TCFType!(AXUIElement, AXUIElementRef);
impl_TCFType!(AXUIElement, AXUIElementRef, AXUIElementGetTypeID);

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementGetTypeID() -> CFTypeID;
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;
    fn AXUIElementCreateSystemWide() -> AXUIElementRef;
    fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut *mut c_void,
    ) -> AXError;
    fn AXUIElementSetAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *const c_void,
    ) -> AXError;
    fn AXUIElementPerformAction(element: AXUIElementRef, action: CFStringRef) -> AXError;
    fn AXValueCreate(value_type: u32, value: *const c_void) -> *mut c_void;
    fn AXValueGetValue(value: *const c_void, value_type: u32, value_ptr: *mut c_void) -> bool;
    // Private, but the only way to map an AX window to its CGWindowID
    fn _AXUIElementGetWindow(element: AXUIElementRef, window_id: *mut u32) -> AXError;
}

/// Geometry types that travel through `AXValueRef`.
trait AxGeometry: Copy {
    const VALUE_TYPE: u32;
    fn zero() -> Self;
}

impl AxGeometry for CGPoint {
    const VALUE_TYPE: u32 = 1;
    fn zero() -> Self {
        CGPoint::new(0.0, 0.0)
    }
}

impl AxGeometry for CGSize {
    const VALUE_TYPE: u32 = 2;
    fn zero() -> Self {
        CGSize::new(0.0, 0.0)
    }
}

const AX_WINDOWS: &str = "AXWindows";
const AX_FOCUSED_WINDOW: &str = "AXFocusedWindow";
const AX_FOCUSED_APPLICATION: &str = "AXFocusedApplication";
const AX_TITLE: &str = "AXTitle";
const AX_SUBROLE: &str = "AXSubrole";
const AX_POSITION: &str = "AXPosition";
const AX_SIZE: &str = "AXSize";
const AX_MINIMIZED: &str = "AXMinimized";
const AX_FULL_SCREEN: &str = "AXFullScreen";
const AX_RAISE: &str = "AXRaise";
const AX_STANDARD_WINDOW: &str = "AXStandardWindow";

fn check(err: AXError) -> Result<(), AXError> {
    match err {
        AX_ERROR_SUCCESS => Ok(()),
        err => Err(err),
    }
}

pub fn is_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

/// Same as [`is_trusted`], but lets the system show its Accessibility prompt.
pub fn is_trusted_with_prompt() -> bool {
    let options = CFDictionary::from_CFType_pairs(&[(
        CFString::new("AXTrustedCheckOptionPrompt"),
        CFBoolean::true_value(),
    )]);
    unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef() as *const c_void) }
}

impl AXUIElement {
    pub fn system_wide() -> Self {
        unsafe { Self::wrap_under_create_rule(AXUIElementCreateSystemWide()) }
    }

    pub fn application(pid: i32) -> Self {
        unsafe { Self::wrap_under_create_rule(AXUIElementCreateApplication(pid)) }
    }

    pub fn window_id(&self) -> Result<u32, AXError> {
        let mut id = 0u32;
        check(unsafe { _AXUIElementGetWindow(self.as_concrete_TypeRef(), &mut id) })?;
        Ok(id)
    }

    /// Copies an attribute; the caller owns the returned reference.
    fn copy(&self, name: &str) -> Result<*mut c_void, AXError> {
        let name = CFString::new(name);
        let mut value = ptr::null_mut();
        check(unsafe {
            AXUIElementCopyAttributeValue(
                self.as_concrete_TypeRef(),
                name.as_concrete_TypeRef(),
                &mut value,
            )
        })?;
        if value.is_null() {
            return Err(AX_ERROR_FAILURE);
        }
        Ok(value)
    }

    fn store(&self, name: &str, value: *const c_void) -> Result<(), AXError> {
        let name = CFString::new(name);
        check(unsafe {
            AXUIElementSetAttributeValue(
                self.as_concrete_TypeRef(),
                name.as_concrete_TypeRef(),
                value,
            )
        })
    }

    fn element(&self, name: &str) -> Result<AXUIElement, AXError> {
        let value = self.copy(name)?;
        Ok(unsafe { AXUIElement::wrap_under_create_rule(value as AXUIElementRef) })
    }

    fn flag(&self, name: &str) -> Result<bool, AXError> {
        let value = self.copy(name)?;
        Ok(unsafe { CFBoolean::wrap_under_create_rule(value as *const _) }.into())
    }

    fn set_flag(&self, name: &str, on: bool) -> Result<(), AXError> {
        let value = CFBoolean::from(on);
        self.store(name, value.as_concrete_TypeRef() as *const c_void)
    }

    fn text(&self, name: &str) -> Result<String, AXError> {
        let value = self.copy(name)?;
        Ok(unsafe { CFString::wrap_under_create_rule(value as *const _) }.to_string())
    }

    fn geometry<T: AxGeometry>(&self, name: &str) -> Result<T, AXError> {
        let value = self.copy(name)?;
        let mut out = T::zero();
        let ok = unsafe { AXValueGetValue(value, T::VALUE_TYPE, &mut out as *mut T as *mut c_void) };
        unsafe { CFRelease(value as *const c_void) };
        if ok {
            Ok(out)
        } else {
            Err(AX_ERROR_FAILURE)
        }
    }

    fn set_geometry<T: AxGeometry>(&self, name: &str, geometry: T) -> Result<(), AXError> {
        let value = unsafe { AXValueCreate(T::VALUE_TYPE, &geometry as *const T as *const c_void) };
        if value.is_null() {
            return Err(AX_ERROR_FAILURE);
        }
        let result = self.store(name, value);
        unsafe { CFRelease(value as *const c_void) };
        result
    }

    pub fn title(&self) -> Result<String, AXError> {
        self.text(AX_TITLE)
    }

    pub fn frame(&self) -> Result<Rect, AXError> {
        let origin: CGPoint = self.geometry(AX_POSITION)?;
        let size: CGSize = self.geometry(AX_SIZE)?;
        Ok(Rect::new(
            origin.x.round() as i32,
            origin.y.round() as i32,
            size.width.max(0.0).round() as u32,
            size.height.max(0.0).round() as u32,
        ))
    }

    pub fn set_position(&self, point: CGPoint) -> Result<(), AXError> {
        self.set_geometry(AX_POSITION, point)
    }

    pub fn set_size(&self, size: CGSize) -> Result<(), AXError> {
        self.set_geometry(AX_SIZE, size)
    }

    pub fn is_minimized(&self) -> Result<bool, AXError> {
        self.flag(AX_MINIMIZED)
    }

    pub fn set_minimized(&self, minimized: bool) -> Result<(), AXError> {
        self.set_flag(AX_MINIMIZED, minimized)
    }

    pub fn is_full_screen(&self) -> Result<bool, AXError> {
        self.flag(AX_FULL_SCREEN)
    }

    pub fn set_full_screen(&self, full_screen: bool) -> Result<(), AXError> {
        self.set_flag(AX_FULL_SCREEN, full_screen)
    }

    pub fn raise(&self) -> Result<(), AXError> {
        let action = CFString::new(AX_RAISE);
        check(unsafe {
            AXUIElementPerformAction(self.as_concrete_TypeRef(), action.as_concrete_TypeRef())
        })
    }

    pub fn windows(&self) -> Result<Vec<AXUIElement>, AXError> {
        let value = self.copy(AX_WINDOWS)?;
        let list: CFArray = unsafe { CFArray::wrap_under_create_rule(value as *const _) };
        Ok(list
            .iter()
            .map(|item| unsafe { AXUIElement::wrap_under_get_rule(*item as AXUIElementRef) })
            .collect())
    }

    pub fn focused_window(&self) -> Result<AXUIElement, AXError> {
        self.element(AX_FOCUSED_WINDOW)
    }

    /// Snapshot of a window element owned by `pid`. `None` when it has no window id.
    pub fn window_info(&self, pid: i32) -> Option<WindowInfo> {
        let id = self.window_id().ok()?;
        let is_minimized = self.is_minimized().unwrap_or(false);
        Some(WindowInfo {
            handle: WindowHandle::new(id as u64, pid),
            title: self.title().unwrap_or_default(),
            frame: self.frame().unwrap_or_default(),
            // AXWindows only lists windows that exist on some space
            is_visible: !is_minimized,
            is_minimized,
            is_standard: self
                .text(AX_SUBROLE)
                .is_ok_and(|role| role == AX_STANDARD_WINDOW),
        })
    }
}

/// The AX element behind `handle`, looked up among its owner's windows.
pub fn find_window(handle: WindowHandle) -> Result<AXUIElement, AXError> {
    AXUIElement::application(handle.pid)
        .windows()?
        .into_iter()
        .find(|window| window.window_id().is_ok_and(|id| id as u64 == handle.id))
        .ok_or(AX_ERROR_FAILURE)
}

pub fn get_focused_window() -> Result<AXUIElement, AXError> {
    AXUIElement::system_wide()
        .element(AX_FOCUSED_APPLICATION)?
        .focused_window()
}
