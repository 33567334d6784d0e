//! Win32 display backend

use crate::{
    dpi, DisplayBackend, DisplayError, DisplayInfo, DisplayResult, PlacementOutcome, RawWindow,
    Rect,
};
use std::mem;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromPoint, HDC, HMONITOR, MONITORINFOEXW,
    MONITORINFOF_PRIMARY, MONITOR_DEFAULTTONEAREST,
};
use windows::Win32::UI::HiDpi::{
    GetDpiForMonitor, SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    MDT_EFFECTIVE_DPI,
};
use windows::Win32::UI::WindowsAndMessaging::{SetWindowPos, SWP_NOACTIVATE, SWP_NOZORDER};

/// Opt the process into per-monitor DPI so monitor rectangles are reported
/// in physical pixels.
pub fn enable_per_monitor_dpi_awareness() {
    unsafe {
        if let Err(e) = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) {
            tracing::warn!("failed to set per-monitor DPI awareness; monitor sizes may be scaled: {e}");
        }
    }
}

/// Displays as reported by `EnumDisplayMonitors`
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Displays;

impl Win32Displays {
    pub fn new() -> Self {
        Self
    }
}

struct MonitorEntry {
    handle: HMONITOR,
    info: MONITORINFOEXW,
}

unsafe extern "system" fn monitor_enum_proc(
    monitor: HMONITOR,
    _hdc: HDC,
    _rc_clip: *mut RECT,
    data: LPARAM,
) -> BOOL {
    let entries = &mut *(data.0 as *mut Vec<MonitorEntry>);
    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;
    if GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut _ as *mut _).as_bool() {
        entries.push(MonitorEntry {
            handle: monitor,
            info,
        });
    }
    BOOL(1) // Continue enumeration
}

fn rect_from_win32(rc: RECT) -> Rect {
    Rect::new(
        rc.left,
        rc.top,
        (rc.right - rc.left).max(0) as u32,
        (rc.bottom - rc.top).max(0) as u32,
    )
}

fn device_name(raw: &[u16]) -> String {
    let len = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
    String::from_utf16_lossy(&raw[..len])
}

fn monitor_dpi_scale(monitor: HMONITOR) -> DisplayResult<f64> {
    let mut dpi_x = 0u32;
    let mut dpi_y = 0u32;
    unsafe {
        GetDpiForMonitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y)?;
    }
    Ok(dpi::scale_from_dpi(dpi_x))
}

impl DisplayBackend for Win32Displays {
    fn enumerate(&self) -> DisplayResult<Vec<DisplayInfo>> {
        let mut entries = Vec::<MonitorEntry>::new();
        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(monitor_enum_proc),
                LPARAM(&mut entries as *mut Vec<MonitorEntry> as isize),
            )
        };
        if !ok.as_bool() && entries.is_empty() {
            return Err(DisplayError::Query("EnumDisplayMonitors failed".into()));
        }

        let displays = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let mi = entry.info.monitorInfo;
                let name = device_name(&entry.info.szDevice);
                let scale_factor = monitor_dpi_scale(entry.handle).unwrap_or_else(|e| {
                    tracing::warn!("DPI query for {name} failed, assuming 100%: {e}");
                    1.0
                });
                DisplayInfo {
                    index,
                    name,
                    bounds: rect_from_win32(mi.rcMonitor),
                    work_area: rect_from_win32(mi.rcWork),
                    is_primary: mi.dwFlags & MONITORINFOF_PRIMARY != 0,
                    scale_factor,
                }
            })
            .collect();

        Ok(displays)
    }

    fn query_dpi_scale(&self, display: &DisplayInfo) -> DisplayResult<f64> {
        let point = POINT {
            x: display.bounds.x + 1,
            y: display.bounds.y + 1,
        };
        let monitor = unsafe { MonitorFromPoint(point, MONITOR_DEFAULTTONEAREST) };
        if monitor.is_invalid() {
            return Err(DisplayError::Query(format!("no monitor at {},{}", point.x, point.y)));
        }
        monitor_dpi_scale(monitor)
    }

    fn set_physical_rect(&self, window: RawWindow, rect: Rect) -> DisplayResult<PlacementOutcome> {
        if window == 0 {
            return Err(DisplayError::InvalidWindow);
        }

        let hwnd = HWND(window as *mut std::ffi::c_void);
        unsafe {
            SetWindowPos(
                hwnd,
                None,
                rect.x,
                rect.y,
                rect.width as i32,
                rect.height as i32,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }

        tracing::debug!(?rect, "overlay moved in physical pixels");
        Ok(PlacementOutcome::Applied)
    }
}
