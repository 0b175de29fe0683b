// Only the close decision is used where there is no tray.
#![cfg_attr(not(any(windows, target_os = "macos")), allow(dead_code))]

use log::info;

pub const MENU_SHOW: &str = "show";
pub const MENU_QUIT: &str = "quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    Show,
    Quit,
}

impl TrayCommand {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            MENU_SHOW => Some(TrayCommand::Show),
            MENU_QUIT => Some(TrayCommand::Quit),
            _ => None,
        }
    }
}

/// What a window close request turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    HideToTray,
    Minimize,
    Exit,
}

/// The app stays resident while gestures can still reach it. Without a
/// tray the window minimizes instead of hiding so it can be restored from
/// the taskbar.
pub fn close_action(tray_available: bool, gestures_available: bool, quitting: bool) -> CloseAction {
    if quitting {
        CloseAction::Exit
    } else if tray_available {
        CloseAction::HideToTray
    } else if gestures_available {
        CloseAction::Minimize
    } else {
        CloseAction::Exit
    }
}

pub fn log_close(action: CloseAction) {
    match action {
        CloseAction::HideToTray => info!("window hidden to tray"),
        CloseAction::Minimize => info!("window minimized"),
        CloseAction::Exit => info!("exiting"),
    }
}

/// 32×32 RGBA: a blue rounded tile with a lighter band where the reading
/// sits above the character.
pub fn icon_rgba(size: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    let radius = size as f32 / 5.0;
    for y in 0..size {
        for x in 0..size {
            let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
            let cx = fx.clamp(radius, size as f32 - radius);
            let cy = fy.clamp(radius, size as f32 - radius);
            let inside = (fx - cx).powi(2) + (fy - cy).powi(2) <= radius * radius;
            let band = y >= size / 5 && y < size * 2 / 5 && x >= size / 5 && x < size * 4 / 5;
            let glyph = y >= size / 2 && y < size * 4 / 5 && x >= size * 2 / 5 && x < size * 3 / 5;
            let pixel = match (inside, band || glyph) {
                (false, _) => [0, 0, 0, 0],
                (true, true) => [240, 245, 255, 255],
                (true, false) => [37, 99, 235, 255],
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    rgba
}

#[cfg(any(windows, target_os = "macos"))]
mod platform {
    use super::{icon_rgba, TrayCommand, MENU_QUIT, MENU_SHOW};
    use log::{error, info, warn};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
    use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

    const ICON_SIZE: u32 = 32;

    /// Keeps the tray icon and its menu items alive. Dropping it removes
    /// the icon.
    pub struct Tray {
        _icon: TrayIcon,
        _items: [MenuItem; 2],
    }

    impl Tray {
        /// Menu events are handled on their own thread so they are seen while
        /// the window is hidden and `update` is not running.
        pub fn create(
            ctx: &egui::Context,
            quit: Arc<AtomicBool>,
            tooltip: &str,
            show_label: &str,
            quit_label: &str,
        ) -> Option<Self> {
            let menu = Menu::new();
            let show_item = MenuItem::with_id(MENU_SHOW, show_label, true, None);
            let quit_item = MenuItem::with_id(MENU_QUIT, quit_label, true, None);
            let appended = menu
                .append(&show_item)
                .and_then(|()| menu.append(&PredefinedMenuItem::separator()))
                .and_then(|()| menu.append(&quit_item));
            if let Err(e) = appended {
                error!("failed to build tray menu: {}", e);
                return None;
            }

            let icon = match Icon::from_rgba(icon_rgba(ICON_SIZE), ICON_SIZE, ICON_SIZE) {
                Ok(icon) => icon,
                Err(e) => {
                    error!("failed to create tray icon image: {}", e);
                    return None;
                }
            };
            let tray = match TrayIconBuilder::new()
                .with_menu(Box::new(menu))
                .with_tooltip(tooltip)
                .with_icon(icon)
                .build()
            {
                Ok(tray) => tray,
                Err(e) => {
                    error!("failed to create tray icon: {}", e);
                    return None;
                }
            };
            info!("tray icon created");

            let ctx = ctx.clone();
            let spawned = std::thread::Builder::new()
                .name("tray".into())
                .spawn(move || {
                    let receiver = MenuEvent::receiver();
                    while let Ok(event) = receiver.recv() {
                        match TrayCommand::from_id(event.id.0.as_str()) {
                            Some(TrayCommand::Show) => {
                                ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
                                ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
                                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                            }
                            Some(TrayCommand::Quit) => {
                                info!("quit requested from tray");
                                quit.store(true, Ordering::SeqCst);
                                ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
                                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                            }
                            None => warn!("unknown tray menu id '{}'", event.id.0),
                        }
                        ctx.request_repaint();
                    }
                });
            if let Err(e) = spawned {
                error!("failed to start tray thread: {}", e);
                return None;
            }
            Some(Self {
                _icon: tray,
                _items: [show_item, quit_item],
            })
        }
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod platform {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// No tray here; the icon would need a GTK main loop next to winit's.
    pub struct Tray;

    impl Tray {
        pub fn create(
            _ctx: &egui::Context,
            _quit: Arc<AtomicBool>,
            _tooltip: &str,
            _show_label: &str,
            _quit_label: &str,
        ) -> Option<Self> {
            log::info!("no tray icon on this platform");
            None
        }
    }
}

pub use platform::Tray;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_hides_while_resident() {
        assert_eq!(close_action(true, true, false), CloseAction::HideToTray);
        assert_eq!(close_action(true, false, false), CloseAction::HideToTray);
        assert_eq!(close_action(false, true, false), CloseAction::Minimize);
        assert_eq!(close_action(false, false, false), CloseAction::Exit);
    }

    #[test]
    fn explicit_quit_always_exits() {
        assert_eq!(close_action(true, true, true), CloseAction::Exit);
        assert_eq!(close_action(false, true, true), CloseAction::Exit);
    }

    #[test]
    fn menu_ids_map_to_commands() {
        assert_eq!(TrayCommand::from_id(MENU_SHOW), Some(TrayCommand::Show));
        assert_eq!(TrayCommand::from_id(MENU_QUIT), Some(TrayCommand::Quit));
        assert_eq!(TrayCommand::from_id("other"), None);
    }

    #[test]
    fn icon_has_transparent_corners_and_opaque_center() {
        let size = 32;
        let rgba = icon_rgba(size);
        assert_eq!(rgba.len(), (size * size * 4) as usize);
        assert_eq!(rgba[3], 0);
        let center = ((size / 2 * size + 4) * 4) as usize;
        assert_eq!(rgba[center + 3], 255);
    }
}
