//! Win32 windowing backend
//!
//! Registers one window class whose window procedure translates
//! `WM_MOUSEMOVE`, `WM_PAINT` and `WM_LBUTTONDBLCLK` into [`NativeMessage`]s
//! and hands them to the manager's [`MessageRouter`].
//!
//! Each window created here carries a boxed [`RouteContext`] in its
//! `GWLP_USERDATA` slot. The slot is only a sidecar index from `HWND` to the
//! router; window records live in the manager. The context is installed right
//! after `CreateWindowExW` returns, so messages sent during creation fall
//! through to `DefWindowProcW`. `WM_NCDESTROY`, which every window receives
//! even when it dies with an ancestor, is routed as
//! [`NativeMessage::Destroyed`] before the context is freed.

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Weak;

use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, EndPaint, FillRect, GetStockObject, ValidateRect, BLACK_BRUSH, HBRUSH, PAINTSTRUCT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::SetDoubleClickTime;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetWindowLongPtrW, LoadCursorW, MoveWindow, RegisterClassExW,
    SetParent, SetWindowLongPtrW, ShowWindow, CS_DBLCLKS, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, GWLP_USERDATA,
    IDC_ARROW, SW_HIDE, SW_SHOW, WINDOW_EX_STYLE, WM_LBUTTONDBLCLK, WM_MOUSEMOVE, WM_NCDESTROY, WM_PAINT,
    WINDOW_STYLE, WNDCLASSEXW, WS_CHILD, WS_OVERLAPPED,
};

use super::WindowingBackend;
use crate::error::{NativeError, NativeResult};
use crate::events::{MessageDisposition, MessageRouter, NativeMessage};
use crate::handle::{WindowHandle, WindowRect};

const SUCCESS_CODE: LRESULT = LRESULT(0);

/// Data stored in the user-data slot of every window this backend creates
struct RouteContext {
    router: Option<Weak<dyn MessageRouter>>,
}

/// Win32 implementation of [`WindowingBackend`]
pub struct Win32Windowing {
    instance: HINSTANCE,
    router: RefCell<Option<Weak<dyn MessageRouter>>>,
}

impl Win32Windowing {
    /// Create a backend bound to the current module
    pub fn new() -> NativeResult<Self> {
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }.map_err(native("GetModuleHandleW"))?;
        Ok(Self {
            instance: HINSTANCE(module.0),
            router: RefCell::new(None),
        })
    }

    fn create_window(
        &self,
        class_name: &str,
        title: &str,
        style: WINDOW_STYLE,
        parent: Option<HWND>,
    ) -> NativeResult<WindowHandle> {
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                &HSTRING::from(class_name),
                &HSTRING::from(title),
                style,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                1,
                1,
                parent,
                None,
                Some(self.instance),
                None,
            )
        }
        .map_err(native("CreateWindowExW"))?;

        let context = Box::new(RouteContext {
            router: self.router.borrow().clone(),
        });
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(context) as isize) };

        Ok(to_handle(hwnd))
    }
}

impl WindowingBackend for Win32Windowing {
    fn bind_router(&self, router: Weak<dyn MessageRouter>) {
        *self.router.borrow_mut() = Some(router);
    }

    fn register_class(&self, class_name: &str) -> NativeResult<()> {
        let class_name = HSTRING::from(class_name);
        let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(native("LoadCursorW"))?;

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_DBLCLKS,
            lpfnWndProc: Some(embedding_wnd_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: self.instance,
            hCursor: cursor,
            // No background brush: the renderer owns every pixel
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };

        if unsafe { RegisterClassExW(&wc) } == 0 {
            return Err(last_error("RegisterClassExW"));
        }
        Ok(())
    }

    fn set_double_click_time(&self, millis: u32) -> NativeResult<()> {
        unsafe { SetDoubleClickTime(millis) }.map_err(native("SetDoubleClickTime"))
    }

    fn create_container(&self, class_name: &str, title: &str) -> NativeResult<WindowHandle> {
        self.create_window(class_name, title, WS_OVERLAPPED, None)
    }

    fn create_child(&self, class_name: &str, parent: WindowHandle) -> NativeResult<WindowHandle> {
        self.create_window(class_name, class_name, WS_CHILD, Some(to_hwnd(parent)))
    }

    fn set_parent(&self, window: WindowHandle, parent: WindowHandle) -> NativeResult<()> {
        unsafe { SetParent(to_hwnd(window), Some(to_hwnd(parent))) }
            .map(|_previous| ())
            .map_err(native("SetParent"))
    }

    fn move_window(&self, window: WindowHandle, rect: WindowRect, repaint: bool) -> NativeResult<()> {
        unsafe { MoveWindow(to_hwnd(window), rect.x, rect.y, rect.width, rect.height, repaint) }
            .map_err(native("MoveWindow"))
    }

    fn set_visible(&self, window: WindowHandle, visible: bool) -> NativeResult<()> {
        let command = if visible { SW_SHOW } else { SW_HIDE };
        // The return value is the previous visibility, not an error indicator
        let _ = unsafe { ShowWindow(to_hwnd(window), command) };
        Ok(())
    }

    fn destroy_window(&self, window: WindowHandle) -> NativeResult<()> {
        unsafe { DestroyWindow(to_hwnd(window)) }.map_err(native("DestroyWindow"))
    }

    fn fill_black(&self, window: WindowHandle) -> NativeResult<()> {
        let hwnd = to_hwnd(window);
        let mut paint = PAINTSTRUCT::default();

        unsafe {
            let hdc = BeginPaint(hwnd, &mut paint);
            if hdc.is_invalid() {
                return Err(last_error("BeginPaint"));
            }
            FillRect(hdc, &paint.rcPaint, HBRUSH(GetStockObject(BLACK_BRUSH).0));
            _ = EndPaint(hwnd, &paint);
        }
        Ok(())
    }

    fn validate(&self, window: WindowHandle) -> NativeResult<()> {
        unsafe { ValidateRect(Some(to_hwnd(window)), None) }
            .ok()
            .map_err(native("ValidateRect"))
    }
}

/*
 * Window procedure for every window of the embedding class. Looks up the
 * route context, translates the message and asks the router what to do.
 */
unsafe extern "system" fn embedding_wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let context_ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *mut RouteContext;
    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    // Take a strong reference before routing; the handler may destroy this window
    let router = unsafe { &*context_ptr }.router.as_ref().and_then(Weak::upgrade);

    if msg == WM_NCDESTROY {
        if let Some(router) = router {
            router.route(to_handle(hwnd), translate_message(msg, lparam));
        }
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
        drop(unsafe { Box::from_raw(context_ptr) });
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    let disposition = router.map_or(MessageDisposition::Default, |router| {
        router.route(to_handle(hwnd), translate_message(msg, lparam))
    });

    match disposition {
        MessageDisposition::Handled => SUCCESS_CODE,
        MessageDisposition::Default => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

fn translate_message(msg: u32, lparam: LPARAM) -> NativeMessage {
    match msg {
        WM_MOUSEMOVE => NativeMessage::PointerMove {
            x: x_from_lparam(lparam),
            y: y_from_lparam(lparam),
        },
        WM_PAINT => NativeMessage::Paint,
        WM_NCDESTROY => NativeMessage::Destroyed,
        WM_LBUTTONDBLCLK => NativeMessage::DoubleClick {
            x: x_from_lparam(lparam),
            y: y_from_lparam(lparam),
        },
        code => NativeMessage::Other { code },
    }
}

/// Signed low word, as `GET_X_LPARAM` (coordinates go negative on multi-monitor setups)
#[inline]
fn x_from_lparam(lparam: LPARAM) -> i32 {
    i32::from((lparam.0 & 0xFFFF) as u16 as i16)
}

/// Signed high word, as `GET_Y_LPARAM`
#[inline]
fn y_from_lparam(lparam: LPARAM) -> i32 {
    i32::from(((lparam.0 >> 16) & 0xFFFF) as u16 as i16)
}

fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_raw() as *mut c_void)
}

fn to_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle::from_raw(hwnd.0 as isize)
}

fn native(operation: &'static str) -> impl Fn(windows::core::Error) -> NativeError {
    move |err| NativeError::new(operation, err.code().0, err.message().to_string())
}

fn last_error(operation: &'static str) -> NativeError {
    let code = unsafe { GetLastError() };
    NativeError::new(operation, code.to_hresult().0, format!("{code:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lparam(x: i16, y: i16) -> LPARAM {
        LPARAM((((y as u16 as u32) << 16) | (x as u16 as u32)) as isize)
    }

    #[test]
    fn test_translate_signed_coordinates() {
        assert_eq!(
            translate_message(WM_MOUSEMOVE, lparam(-5, 12)),
            NativeMessage::PointerMove { x: -5, y: 12 }
        );
        assert_eq!(
            translate_message(WM_LBUTTONDBLCLK, lparam(300, -1)),
            NativeMessage::DoubleClick { x: 300, y: -1 }
        );
        assert_eq!(translate_message(WM_PAINT, LPARAM(0)), NativeMessage::Paint);
        assert_eq!(translate_message(WM_NCDESTROY, LPARAM(0)), NativeMessage::Destroyed);
        assert_eq!(translate_message(0x0100, LPARAM(0)), NativeMessage::Other { code: 0x0100 });
    }

    #[test]
    fn test_handle_hwnd_round_trip() {
        let handle = WindowHandle::from_raw(0x0004_0a2c);
        assert_eq!(to_handle(to_hwnd(handle)), handle);
    }
}
