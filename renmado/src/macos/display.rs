use core_foundation::{
    array::CFArray,
    base::{CFType, ConcreteCFType, TCFType},
    dictionary::CFDictionary,
    number::CFNumber,
    string::CFString,
};
use core_graphics::display::{
    CGDirectDisplayID, CGDisplayBounds, CGGetActiveDisplayList, CGMainDisplayID,
};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{
    kCGNullWindowID, kCGWindowListOptionOnScreenOnly, CGWindowListCopyWindowInfo,
};

use crate::core::{Monitor, Rect};

const MAX_DISPLAYS: usize = 16;
// Window Server draws each display's menu bar on this layer
const MENU_BAR_LAYER: i32 = 24;
const MENU_BAR_MAX_HEIGHT: f64 = 50.0;

/// Active displays with the menu bar cut off the top, in Core Graphics
/// (top-left origin) coordinates.
pub fn get_all_displays() -> Vec<Monitor> {
    let displays: Vec<(CGDirectDisplayID, CGRect)> = active_display_ids()
        .into_iter()
        .map(|id| (id, unsafe { CGDisplayBounds(id) }))
        .collect();
    if displays.is_empty() {
        return Vec::new();
    }

    let main_id = unsafe { CGMainDisplayID() };
    let menu_bars = menu_bar_frames();

    displays
        .iter()
        .map(|&(id, bounds)| {
            let inset = menu_bars
                .iter()
                .find(|bar| spans_top_edge(bar, &bounds))
                .map_or(0.0, |bar| bar.size.height);
            let frame = Rect::new(
                bounds.origin.x.round() as i32,
                (bounds.origin.y + inset).round() as i32,
                bounds.size.width.max(0.0).round() as u32,
                (bounds.size.height - inset).max(0.0).round() as u32,
            );
            Monitor::new(frame, id == main_id)
        })
        .collect()
}

/// Queried through Core Graphics so no NSApplication event loop is needed.
fn active_display_ids() -> Vec<CGDirectDisplayID> {
    let mut ids = [0 as CGDirectDisplayID; MAX_DISPLAYS];
    let mut count = 0u32;
    let err = unsafe { CGGetActiveDisplayList(MAX_DISPLAYS as u32, ids.as_mut_ptr(), &mut count) };
    if err != 0 {
        tracing::warn!("CGGetActiveDisplayList failed: {}", err);
        return Vec::new();
    }
    ids[..count as usize].to_vec()
}

fn spans_top_edge(bar: &CGRect, display: &CGRect) -> bool {
    (bar.origin.x - display.origin.x).abs() < 1.0
        && (bar.origin.y - display.origin.y).abs() < 1.0
        && (bar.size.width - display.size.width).abs() < 1.0
}

/// Frames of the on-screen menu bar windows.
fn menu_bar_frames() -> Vec<CGRect> {
    let list: CFArray = unsafe {
        CFArray::wrap_under_create_rule(CGWindowListCopyWindowInfo(
            kCGWindowListOptionOnScreenOnly,
            kCGNullWindowID,
        ))
    };

    list.iter()
        .filter_map(|item| {
            let info: CFDictionary =
                unsafe { CFDictionary::wrap_under_get_rule(*item as *const _) };
            let layer = lookup::<CFNumber>(&info, "kCGWindowLayer")?.to_i32()?;
            let owner = lookup::<CFString>(&info, "kCGWindowOwnerName")?.to_string();
            if layer != MENU_BAR_LAYER || owner != "Window Server" {
                return None;
            }
            let frame = window_frame(&lookup::<CFDictionary>(&info, "kCGWindowBounds")?)?;
            (frame.size.height < MENU_BAR_MAX_HEIGHT && frame.size.width > 500.0).then_some(frame)
        })
        .collect()
}

fn lookup<T: ConcreteCFType>(dict: &CFDictionary, key: &str) -> Option<T> {
    let key = CFString::new(key);
    let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
    let value = unsafe { CFType::wrap_under_get_rule(*value as *const _) };
    value.downcast_into::<T>()
}

fn window_frame(bounds: &CFDictionary) -> Option<CGRect> {
    let field = |key: &str| lookup::<CFNumber>(bounds, key).and_then(|n| n.to_f64());
    Some(CGRect::new(
        &CGPoint::new(field("X")?, field("Y")?),
        &CGSize::new(field("Width")?, field("Height")?),
    ))
}
