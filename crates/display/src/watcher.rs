//! Display configuration change notifications

use crate::DisplayResult;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Pushed whenever the monitor layout may have changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Monitors added, removed, moved or resized
    ConfigurationChanged,
    /// A taskbar or docked bar changed some working area
    WorkAreaChanged,
}

/// Called after an event is queued so the UI loop wakes up
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Background listener for display changes.
///
/// Dropping the watcher stops the listener thread.
pub struct DisplayWatcher {
    #[cfg(windows)]
    hwnd: isize,
    #[cfg(windows)]
    thread: Option<std::thread::JoinHandle<()>>,
}

impl DisplayWatcher {
    /// Start listening. Returns `None` on platforms without push
    /// notifications; callers detect changes from their toolkit instead.
    pub fn spawn(events: Sender<DisplayEvent>, waker: Waker) -> DisplayResult<Option<Self>> {
        #[cfg(windows)]
        {
            native::spawn(events, waker).map(Some)
        }

        #[cfg(not(windows))]
        {
            let _ = (events, waker);
            tracing::debug!("no native display-change notifications on this platform");
            Ok(None)
        }
    }
}

#[cfg(windows)]
impl Drop for DisplayWatcher {
    fn drop(&mut self) {
        native::stop(self.hwnd);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(windows)]
mod native {
    use super::{DisplayEvent, DisplayWatcher, Waker};
    use crate::{DisplayError, DisplayResult};
    use crossbeam_channel::{bounded, Sender};
    use once_cell::sync::OnceCell;
    use std::cell::RefCell;
    use std::thread;
    use windows::core::{w, PCWSTR};
    use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
        PostMessageW, PostQuitMessage, RegisterClassExW, TranslateMessage, MSG,
        SPI_SETWORKAREA, WM_CLOSE, WM_DESTROY, WM_DISPLAYCHANGE, WM_SETTINGCHANGE, WNDCLASSEXW,
        WS_EX_TOOLWINDOW, WS_POPUP,
    };

    const CLASS_NAME: PCWSTR = w!("DMToolDisplayWatcher");

    static CLASS: OnceCell<()> = OnceCell::new();

    thread_local! {
        static WATCH_STATE: RefCell<Option<WatchState>> = RefCell::new(None);
    }

    struct WatchState {
        events: Sender<DisplayEvent>,
        waker: Waker,
    }

    impl WatchState {
        fn publish(&self, event: DisplayEvent) {
            tracing::info!(?event, "display configuration changed");
            if self.events.send(event).is_ok() {
                (self.waker)();
            }
        }
    }

    fn register_class() -> DisplayResult<()> {
        CLASS
            .get_or_try_init(|| unsafe {
                let hmodule = GetModuleHandleW(None)?;
                let wc = WNDCLASSEXW {
                    cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                    lpfnWndProc: Some(watcher_wnd_proc),
                    hInstance: HINSTANCE(hmodule.0),
                    lpszClassName: CLASS_NAME,
                    ..Default::default()
                };
                if RegisterClassExW(&wc) == 0 {
                    return Err(DisplayError::Windows(windows::core::Error::from_win32()));
                }
                Ok(())
            })
            .map(|_| ())
    }

    pub(super) fn spawn(events: Sender<DisplayEvent>, waker: Waker) -> DisplayResult<DisplayWatcher> {
        let (ready_tx, ready_rx) = bounded::<Result<isize, String>>(1);

        let thread = thread::Builder::new()
            .name("display-watcher".to_string())
            .spawn(move || {
                let hwnd = match create_hidden_window() {
                    Ok(hwnd) => hwnd,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                WATCH_STATE.with(|s| {
                    *s.borrow_mut() = Some(WatchState { events, waker });
                });
                let _ = ready_tx.send(Ok(hwnd.0 as isize));

                unsafe {
                    let mut msg = MSG::default();
                    while GetMessageW(&mut msg, None, 0, 0).as_bool() {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }

                WATCH_STATE.with(|s| {
                    *s.borrow_mut() = None;
                });
            })
            .map_err(|e| DisplayError::Watcher(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(hwnd)) => Ok(DisplayWatcher {
                hwnd,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(DisplayError::Watcher(e))
            }
            Err(_) => {
                let _ = thread.join();
                Err(DisplayError::Watcher("watcher thread exited early".into()))
            }
        }
    }

    fn create_hidden_window() -> DisplayResult<HWND> {
        register_class()?;
        unsafe {
            let hmodule = GetModuleHandleW(None)?;
            // Top-level but never shown: message-only windows miss broadcasts.
            let hwnd = CreateWindowExW(
                WS_EX_TOOLWINDOW,
                CLASS_NAME,
                w!("DMTool Display Watcher"),
                WS_POPUP,
                0,
                0,
                0,
                0,
                None,
                None,
                HINSTANCE(hmodule.0),
                None,
            )?;
            Ok(hwnd)
        }
    }

    pub(super) fn stop(hwnd: isize) {
        if hwnd == 0 {
            return;
        }
        unsafe {
            let hwnd = HWND(hwnd as *mut std::ffi::c_void);
            let _ = PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }

    unsafe extern "system" fn watcher_wnd_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_DISPLAYCHANGE => {
                publish(DisplayEvent::ConfigurationChanged);
                LRESULT(0)
            }
            WM_SETTINGCHANGE if wparam.0 as u32 == SPI_SETWORKAREA.0 => {
                publish(DisplayEvent::WorkAreaChanged);
                LRESULT(0)
            }
            WM_CLOSE => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }

    fn publish(event: DisplayEvent) {
        WATCH_STATE.with(|s| {
            if let Some(ref state) = *s.borrow() {
                state.publish(event);
            }
        });
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn no_watcher_without_native_notifications() {
        let (tx, _rx) = unbounded();
        let watcher = DisplayWatcher::spawn(tx, Arc::new(|| {})).unwrap();
        assert!(watcher.is_none());
    }
}
