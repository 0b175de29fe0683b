use crate::tray::{self, CloseAction, Tray};
use egui::{Color32, ColorImage, RichText, Rounding, TextureHandle, Vec2};
use log::{debug, info, warn};
use pinyin_helper::annotate::{self, PinyinSource};
use pinyin_helper::capture::{self, CaptureOptions, PendingCapture};
use pinyin_helper::clipboard::{ClipboardAccess, ClipboardFormatting, SystemClipboard};
use pinyin_helper::document::{Document, Edit, Rgb, Unit};
use pinyin_helper::fonts::{FontLibrary, FontPair};
use pinyin_helper::formatting::{self, SelectionInspector, Prefetch};
use pinyin_helper::gesture::GestureEvent;
use pinyin_helper::hotkeys::{HotkeyListener, HotkeySignal};
use pinyin_helper::i18n::{tr, Text};
use pinyin_helper::layout::LayoutParams;
use pinyin_helper::measure::FontRole;
use pinyin_helper::render::{encode_table, rasterize, RasterImage, RichText as TableText, TableOptions};
use pinyin_helper::render::raster::EXPORT_SCALE;
use pinyin_helper::session::Session;
use pinyin_helper::settings::{Favorites, Settings, UiLanguage};
use pinyin_helper::update::{self, Download, DownloadEvent, UpdateStatus};
use pinyin_helper::{Error, Result};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PRIMARY_SIZE_RANGE: std::ops::RangeInclusive<u32> = 10..=500;
const SECONDARY_SIZE_RANGE: std::ops::RangeInclusive<u32> = 5..=300;

/// Families tried, after the favorites, for CJK glyphs in the UI itself.
const CJK_UI_FONTS: &[&str] = &[
    "Microsoft YaHei",
    "PingFang SC",
    "Noto Sans CJK SC",
    "Source Han Sans SC",
    "WenQuanYi Micro Hei",
    "SimSun",
];

enum UpdateState {
    Idle,
    /// `announce` is false for the silent check at startup.
    Checking {
        rx: Receiver<UpdateStatus>,
        announce: bool,
    },
    Offer {
        version: String,
        url: String,
    },
    Downloading {
        download: Download,
        percent: u8,
    },
    Notice(String),
}

enum FontAction {
    Select(FontRole, String),
    Add(FontRole, String),
    Remove(FontRole, String),
}

struct Preview {
    texture: TextureHandle,
    width: u32,
    height: u32,
}

pub struct PinyinApp {
    settings: Settings,
    session: Session,
    source: PinyinSource,
    fonts: FontLibrary,
    font_pair: Option<FontPair>,
    families: Vec<String>,
    font_filter: String,
    fav_primary: Favorites,
    fav_secondary: Favorites,
    params: LayoutParams,
    table: TableOptions,
    capture_opts: CaptureOptions,
    input: String,
    preview: Option<Preview>,
    // Set by the session on every change, cleared once the preview is redrawn.
    dirty: Rc<Cell<bool>>,
    clipboard: SystemClipboard,
    hotkey_rx: Receiver<HotkeySignal>,
    hotkeys: Option<HotkeyListener>,
    hotkeys_error: Option<String>,
    pending_capture: Option<PendingCapture>,
    prefetch: Prefetch,
    inspector: Option<Arc<dyn SelectionInspector>>,
    tray: Option<Tray>,
    // Set by Quit; a close request is then honored instead of hiding.
    quit: Arc<AtomicBool>,
    update: UpdateState,
    status_message: String,
    // Copy-to-clipboard confirmation timers
    copied_text_timer: f32,
    copied_image_timer: f32,
}

impl PinyinApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();
        let fav_primary = Favorites::new(settings.favorite_fonts_primary.clone());
        let fav_secondary = Favorites::new(settings.favorite_fonts_secondary.clone());

        let mut fonts = FontLibrary::system();
        let families = fonts.families();
        let mut doc = Document::default();
        doc.primary_font = fonts.first_available(fav_primary.as_slice().iter().map(String::as_str));
        doc.secondary_font =
            fonts.first_available(fav_secondary.as_slice().iter().map(String::as_str));
        info!("document fonts: '{}' / '{}'", doc.primary_font, doc.secondary_font);
        install_cjk_ui_font(&cc.egui_ctx, &mut fonts, &doc.primary_font, &fav_primary);

        let dirty = Rc::new(Cell::new(true));
        let mut session = Session::new(doc);
        let flag = dirty.clone();
        session.subscribe(move |_| flag.set(true));

        // The listener wakes the UI so gestures are handled while idle. A
        // hidden window does not run `update`, so activations also show it.
        let (hotkey_tx, hotkey_rx) = mpsc::channel();
        let wake_ctx = cc.egui_ctx.clone();
        let hotkeys = HotkeyListener::start(hotkey_tx, move |signal| {
            if matches!(signal, HotkeySignal::Gesture(g) if g.is_activation()) {
                wake_ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
            }
            wake_ctx.request_repaint();
        })
        .ok();

        let quit = Arc::new(AtomicBool::new(false));
        let lang = settings.ui_language;
        let tray = Tray::create(
            &cc.egui_ctx,
            quit.clone(),
            tr(lang, Text::WindowTitle),
            tr(lang, Text::ShowWindow),
            tr(lang, Text::Quit),
        );
        let capture_opts = CaptureOptions::default();
        let inspector: Arc<dyn SelectionInspector> =
            Arc::new(ClipboardFormatting::system(capture_opts.settle));

        let update = match update::RELEASES_REPO {
            Some(repo) => UpdateState::Checking {
                rx: update::check_async(repo, update::CURRENT_VERSION),
                announce: false,
            },
            None => UpdateState::Idle,
        };

        apply_window_level(&cc.egui_ctx, settings.always_on_top);
        cc.egui_ctx.send_viewport_cmd(egui::ViewportCommand::Title(
            tr(settings.ui_language, Text::WindowTitle).into(),
        ));

        let mut app = Self {
            status_message: tr(settings.ui_language, Text::Hint).into(),
            settings,
            session,
            source: PinyinSource::default(),
            fonts,
            font_pair: None,
            families,
            font_filter: String::new(),
            fav_primary,
            fav_secondary,
            params: LayoutParams::default(),
            table: TableOptions::default(),
            capture_opts,
            input: String::new(),
            preview: None,
            dirty,
            clipboard: SystemClipboard::default(),
            hotkey_rx,
            hotkeys,
            hotkeys_error: None,
            pending_capture: None,
            prefetch: Prefetch::default(),
            inspector: Some(inspector),
            tray,
            quit,
            update,
            copied_text_timer: 0.0,
            copied_image_timer: 0.0,
        };
        app.refresh_fonts();
        app
    }

    fn t(&self, text: Text) -> &'static str {
        tr(self.settings.ui_language, text)
    }

    fn report(&mut self, context: &str, e: &Error) {
        warn!("{}: {}", context, e);
        self.status_message = format!("{}: {}", context, e);
    }

    // ── fonts ────────────────────────────────────────────────────────────────

    fn refresh_fonts(&mut self) {
        let doc = self.session.document();
        match self.fonts.pair(&doc.primary_font, &doc.secondary_font) {
            Ok(pair) => self.font_pair = Some(pair),
            Err(e) => {
                self.font_pair = None;
                self.report("Font unavailable", &e);
            }
        }
        self.dirty.set(true);
    }

    fn favorites_mut(&mut self, role: FontRole) -> &mut Favorites {
        match role {
            FontRole::Primary => &mut self.fav_primary,
            FontRole::Secondary => &mut self.fav_secondary,
        }
    }

    fn handle_font_action(&mut self, action: FontAction) {
        let (role, select) = match action {
            FontAction::Select(role, family) => (role, Some(family)),
            FontAction::Add(role, family) => {
                if self.favorites_mut(role).add(&family) {
                    self.persist_settings();
                }
                (role, Some(family))
            }
            FontAction::Remove(role, family) => {
                let next = self.favorites_mut(role).remove(&family);
                self.persist_settings();
                (role, next)
            }
        };
        if let Some(family) = select {
            let edit = match role {
                FontRole::Primary => Edit::PrimaryFont(family),
                FontRole::Secondary => Edit::SecondaryFont(family),
            };
            self.apply_edits(vec![edit]);
        }
    }

    // ── document ─────────────────────────────────────────────────────────────

    fn apply_edits(&mut self, edits: Vec<Edit>) {
        for edit in edits {
            let font_change = matches!(edit, Edit::PrimaryFont(_) | Edit::SecondaryFont(_));
            if let Err(e) = self.session.apply(edit) {
                self.report("Edit rejected", &e);
                continue;
            }
            if font_change {
                self.refresh_fonts();
            }
        }
    }

    fn refresh_preview(&mut self, ctx: &egui::Context) {
        if !self.dirty.replace(false) {
            return;
        }
        let Some(pair) = &self.font_pair else {
            self.preview = None;
            return;
        };
        if self.session.document().is_empty() {
            self.preview = None;
            return;
        }
        let scene = self.session.recompute(pair, &self.params, 1.0);
        match rasterize(&scene, pair) {
            Ok(image) => {
                let color_image = ColorImage::from_rgba_unmultiplied(
                    [image.width as usize, image.height as usize],
                    &image.rgba,
                );
                match &mut self.preview {
                    Some(preview) => {
                        preview.texture.set(color_image, egui::TextureOptions::LINEAR);
                        preview.width = image.width;
                        preview.height = image.height;
                    }
                    None => {
                        let texture =
                            ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR);
                        self.preview = Some(Preview {
                            texture,
                            width: image.width,
                            height: image.height,
                        });
                    }
                }
            }
            Err(e) => self.report("Preview failed", &e),
        }
    }

    // ── actions ──────────────────────────────────────────────────────────────

    fn action_process(&mut self) {
        let text = capture::clean_text(&self.input);
        if !self.session.capture(&text, &self.source, None) {
            self.status_message = self.t(Text::NothingToProcess).into();
        }
    }

    fn export_image(&mut self) -> Result<RasterImage> {
        let pair = self
            .font_pair
            .as_ref()
            .ok_or_else(|| Error::FontNotFound(self.session.document().primary_font.clone()))?;
        self.session.recompute(pair, &self.params, 1.0);
        let scene = self.session.scene(pair, &self.params, EXPORT_SCALE);
        rasterize(&scene, pair)
    }

    fn export_table(&mut self) -> Result<TableText> {
        let pair = self
            .font_pair
            .as_ref()
            .ok_or_else(|| Error::FontNotFound(self.session.document().primary_font.clone()))?;
        let scene = self.session.recompute(pair, &self.params, 1.0);
        if scene.is_empty() {
            return Err(Error::EmptyScene);
        }
        let doc = self.session.document();
        Ok(encode_table(
            &scene,
            &doc.primary_font,
            &doc.secondary_font,
            &self.table,
        ))
    }

    fn action_copy_image(&mut self) {
        let result = self
            .export_image()
            .and_then(|image| self.clipboard.write_image(&image));
        match result {
            Ok(()) => {
                debug!("image copied");
                self.copied_image_timer = 2.0;
            }
            Err(e) => self.report("Copy failed", &e),
        }
    }

    fn action_copy_text(&mut self) {
        let result = self
            .export_table()
            .and_then(|rich| self.clipboard.write_rich_text(&rich));
        match result {
            Ok(()) => {
                debug!("table copied");
                self.copied_text_timer = 2.0;
            }
            Err(e) => self.report("Copy failed", &e),
        }
    }

    fn action_save_png(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("pinyin.png")
            .save_file()
        else {
            return;
        };
        match self.export_image().and_then(|image| image.save_png(&path)) {
            Ok(()) => {
                info!("saved {}", path.display());
                self.status_message = self
                    .t(Text::SavedTo)
                    .replace("{path}", &path.display().to_string());
            }
            Err(e) => self.report("Save failed", &e),
        }
    }

    fn set_always_on_top(&mut self, ctx: &egui::Context, on: bool) {
        self.settings.always_on_top = on;
        apply_window_level(ctx, on);
        self.persist_settings();
    }

    fn set_language(&mut self, ctx: &egui::Context, lang: UiLanguage) {
        if self.settings.ui_language == lang {
            return;
        }
        self.settings.ui_language = lang;
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.t(Text::WindowTitle).into()));
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        self.settings.favorite_fonts_primary = self.fav_primary.as_slice().to_vec();
        self.settings.favorite_fonts_secondary = self.fav_secondary.as_slice().to_vec();
        if let Err(e) = self.settings.save() {
            self.report("Failed to save settings", &e);
        }
    }

    // ── window lifecycle ─────────────────────────────────────────────────────

    fn request_quit(&self, ctx: &egui::Context) {
        self.quit.store(true, Ordering::SeqCst);
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn handle_close_request(&self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        let gestures = self.hotkeys.is_some() && self.hotkeys_error.is_none();
        let action = tray::close_action(
            self.tray.is_some(),
            gestures,
            self.quit.load(Ordering::SeqCst),
        );
        tray::log_close(action);
        match action {
            CloseAction::HideToTray => {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
            }
            CloseAction::Minimize => {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
            }
            CloseAction::Exit => {}
        }
    }

    // ── poll hotkeys / capture ───────────────────────────────────────────────

    fn poll_hotkeys(&mut self) {
        while let Ok(signal) = self.hotkey_rx.try_recv() {
            match signal {
                HotkeySignal::Gesture(GestureEvent::CopyDetected) => {
                    if let Some(inspector) = &self.inspector {
                        self.prefetch.arm(formatting::inspect_async(inspector.clone()));
                    }
                }
                HotkeySignal::Gesture(gesture) => {
                    debug!("activation gesture {:?}", gesture);
                    self.pending_capture =
                        Some(PendingCapture::new(gesture, Instant::now(), &self.capture_opts));
                }
                HotkeySignal::Unavailable(reason) => {
                    self.status_message = self
                        .t(Text::HotkeysUnavailable)
                        .replace("{error}", &reason);
                    self.hotkeys_error = Some(reason);
                }
            }
        }
    }

    fn poll_pending_capture(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending_capture else {
            return;
        };
        let now = Instant::now();
        if pending.is_due(now) {
            self.pending_capture = None;
            self.capture_from_clipboard(ctx);
        } else {
            ctx.request_repaint_after(pending.remaining(now));
        }
    }

    /// Reads the settled clipboard into the document and brings the window
    /// forward. An empty clipboard only surfaces the window.
    fn capture_from_clipboard(&mut self, ctx: &egui::Context) {
        let prefetched = self.prefetch.take();
        match self.clipboard.read() {
            Ok(contents) => match capture::interpret(&contents, &self.capture_opts) {
                Some(mut captured) => {
                    if let Some(early) = prefetched {
                        captured.format.overlay(early);
                    }
                    info!("captured {} characters", captured.text.chars().count());
                    self.input = captured.text.clone();
                    self.session
                        .capture(&captured.text, &self.source, Some(&captured.format));
                    if let Some(family) = captured.format.font_name {
                        if self.fav_primary.contains(&family) {
                            self.apply_edits(vec![Edit::PrimaryFont(family)]);
                        }
                    }
                }
                None => debug!("clipboard held no usable text"),
            },
            Err(e) => self.report("Clipboard unavailable", &e),
        }
        show_window(ctx);
    }

    // ── poll update thread ───────────────────────────────────────────────────

    fn check_for_updates(&mut self) {
        if let Some(repo) = update::RELEASES_REPO {
            self.update = UpdateState::Checking {
                rx: update::check_async(repo, update::CURRENT_VERSION),
                announce: true,
            };
        }
    }

    fn poll_update(&mut self, ctx: &egui::Context) {
        let state = std::mem::replace(&mut self.update, UpdateState::Idle);
        self.update = match state {
            UpdateState::Checking { rx, announce } => match rx.try_recv() {
                Ok(UpdateStatus::Available { version, url }) => {
                    info!("update {} available", version);
                    UpdateState::Offer { version, url }
                }
                Ok(UpdateStatus::UpToDate) if announce => {
                    UpdateState::Notice(self.t(Text::NoUpdates).into())
                }
                Ok(UpdateStatus::UpToDate) => UpdateState::Idle,
                Ok(UpdateStatus::Failed(e)) => {
                    warn!("update check failed: {}", e);
                    if announce {
                        UpdateState::Notice(self.t(Text::UpdateCheckFailed).replace("{error}", &e))
                    } else {
                        UpdateState::Idle
                    }
                }
                Err(TryRecvError::Empty) => {
                    ctx.request_repaint_after(Duration::from_millis(200));
                    UpdateState::Checking { rx, announce }
                }
                Err(TryRecvError::Disconnected) => UpdateState::Idle,
            },
            UpdateState::Downloading { download, mut percent } => {
                let mut finished = None;
                while let Ok(event) = download.events.try_recv() {
                    match event {
                        DownloadEvent::Progress(p) => percent = p,
                        DownloadEvent::Finished(path) => {
                            finished = Some(self.install_update(ctx, &path));
                            break;
                        }
                        DownloadEvent::Failed(e) => {
                            warn!("update download failed: {}", e);
                            finished = Some(UpdateState::Notice(
                                self.t(Text::DownloadFailed).replace("{error}", &e),
                            ));
                            break;
                        }
                        DownloadEvent::Cancelled => {
                            finished = Some(UpdateState::Idle);
                            break;
                        }
                    }
                }
                finished.unwrap_or_else(|| {
                    ctx.request_repaint_after(Duration::from_millis(100));
                    UpdateState::Downloading { download, percent }
                })
            }
            other => other,
        };
    }

    fn install_update(&mut self, ctx: &egui::Context, path: &Path) -> UpdateState {
        match update::launch_installer(path) {
            Ok(()) => {
                info!("installer started, closing");
                self.request_quit(ctx);
                UpdateState::Idle
            }
            Err(e) => UpdateState::Notice(
                self.t(Text::InstallFailed)
                    .replace("{error}", &e.to_string()),
            ),
        }
    }

    // ── update dialog ────────────────────────────────────────────────────────

    fn draw_update_dialog(&mut self, ctx: &egui::Context) {
        enum Reply {
            Install(String),
            Dismiss,
            Cancel,
        }
        let lang = self.settings.ui_language;
        let mut reply = None;
        let window = |title: &str| {
            egui::Window::new(title.to_string())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
                .min_width(360.0)
        };

        match &self.update {
            UpdateState::Offer { version, url } => {
                window(tr(lang, Text::CheckUpdates)).show(ctx, |ui| {
                    ui.add_space(4.0);
                    ui.label(tr(lang, Text::UpdateAvailable).replace("{version}", version));
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if accent_button(ui, tr(lang, Text::Install)).clicked() {
                            reply = Some(Reply::Install(url.clone()));
                        }
                        if ui.button(tr(lang, Text::Later)).clicked() {
                            reply = Some(Reply::Dismiss);
                        }
                    });
                });
            }
            UpdateState::Downloading { percent, .. } => {
                window(tr(lang, Text::Downloading)).show(ctx, |ui| {
                    ui.add_space(4.0);
                    ui.add(egui::ProgressBar::new(*percent as f32 / 100.0).show_percentage());
                    ui.add_space(8.0);
                    if ui.button(tr(lang, Text::Cancel)).clicked() {
                        reply = Some(Reply::Cancel);
                    }
                });
            }
            UpdateState::Notice(message) => {
                window(tr(lang, Text::CheckUpdates)).show(ctx, |ui| {
                    ui.add_space(4.0);
                    ui.label(message.as_str());
                    ui.add_space(8.0);
                    if ui.button(tr(lang, Text::Close)).clicked() {
                        reply = Some(Reply::Dismiss);
                    }
                });
            }
            UpdateState::Idle | UpdateState::Checking { .. } => {}
        }

        match reply {
            Some(Reply::Install(url)) => {
                self.update = UpdateState::Downloading {
                    download: update::download_async(&url),
                    percent: 0,
                };
            }
            Some(Reply::Dismiss) => self.update = UpdateState::Idle,
            Some(Reply::Cancel) => {
                // The worker reports `Cancelled`, which returns the state to idle.
                if let UpdateState::Downloading { download, .. } = &self.update {
                    download.cancel();
                }
            }
            None => {}
        }
    }

    // ── UI helpers ───────────────────────────────────────────────────────────

    fn draw_top_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(self.t(Text::WindowTitle))
                    .strong()
                    .size(20.0)
                    .color(Color32::from_rgb(96, 165, 250)),
            );
            ui.add_space(16.0);

            let mut lang = self.settings.ui_language;
            egui::ComboBox::from_id_salt("ui_language")
                .selected_text(lang.label())
                .show_ui(ui, |ui| {
                    for option in UiLanguage::all() {
                        ui.selectable_value(&mut lang, *option, option.label());
                    }
                });
            self.set_language(ctx, lang);

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(self.t(Text::Quit)).clicked() {
                    self.request_quit(ctx);
                }
                let on_top = self.settings.always_on_top;
                let label = if on_top {
                    self.t(Text::AlwaysOnTopActive)
                } else {
                    self.t(Text::AlwaysOnTop)
                };
                if ui.selectable_label(on_top, label).clicked() {
                    self.set_always_on_top(ctx, !on_top);
                }
                if update::RELEASES_REPO.is_some() {
                    let idle = matches!(self.update, UpdateState::Idle);
                    if ui
                        .add_enabled(idle, egui::Button::new(self.t(Text::CheckUpdates)))
                        .clicked()
                    {
                        self.check_for_updates();
                    }
                }
            });
        });
    }

    fn draw_input(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let width = ui.available_width() - 140.0;
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .desired_width(width.max(120.0))
                    .hint_text(tr(self.settings.ui_language, Text::InputPlaceholder)),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if accent_button(ui, self.t(Text::Process)).clicked() || submitted {
                self.action_process();
            }
        });
    }

    fn draw_font_row(&mut self, ui: &mut egui::Ui, role: FontRole, edits: &mut Vec<Edit>) -> Option<FontAction> {
        let lang = self.settings.ui_language;
        let doc = self.session.document();
        let (label, current, size, range, favorites) = match role {
            FontRole::Primary => (
                Text::PrimaryFont,
                doc.primary_font.clone(),
                doc.primary_size,
                PRIMARY_SIZE_RANGE,
                &self.fav_primary,
            ),
            FontRole::Secondary => (
                Text::SecondaryFont,
                doc.secondary_font.clone(),
                doc.secondary_size,
                SECONDARY_SIZE_RANGE,
                &self.fav_secondary,
            ),
        };
        let families = &self.families;
        let filter = &mut self.font_filter;
        let mut action = None;

        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new(tr(lang, label)));

            let mut selected = current.clone();
            egui::ComboBox::from_id_salt(("font", role_key(role)))
                .width(220.0)
                .selected_text(current.as_str())
                .show_ui(ui, |ui| {
                    for family in favorites.as_slice() {
                        ui.selectable_value(&mut selected, family.clone(), family.as_str());
                    }
                });
            if selected != current {
                action = Some(FontAction::Select(role, selected));
            }

            ui.menu_button("➕", |ui| {
                ui.label(RichText::new(tr(lang, Text::AddFont)).strong());
                ui.text_edit_singleline(filter);
                let needle = filter.to_lowercase();
                egui::ScrollArea::vertical()
                    .id_salt(("families", role_key(role)))
                    .max_height(300.0)
                    .show(ui, |ui| {
                        for family in families
                            .iter()
                            .filter(|f| needle.is_empty() || f.to_lowercase().contains(&needle))
                        {
                            if ui.button(family.as_str()).clicked() {
                                action = Some(FontAction::Add(role, family.clone()));
                                ui.close_menu();
                            }
                        }
                    });
            })
            .response
            .on_hover_text(tr(lang, Text::AddFont));

            if ui
                .add_enabled(favorites.contains(&current), egui::Button::new("➖"))
                .on_hover_text(tr(lang, Text::RemoveFont))
                .clicked()
            {
                action = Some(FontAction::Remove(role, current.clone()));
            }

            ui.add_space(12.0);
            let mut value = size;
            if ui
                .add(egui::DragValue::new(&mut value).range(range).suffix(" px"))
                .changed()
            {
                edits.push(match role {
                    FontRole::Primary => Edit::PrimarySize(value),
                    FontRole::Secondary => Edit::SecondarySize(value),
                });
            }
        });
        action
    }

    fn draw_units(&mut self, ui: &mut egui::Ui, edits: &mut Vec<Edit>) {
        let lang = self.settings.ui_language;
        let units: Vec<Unit> = self.session.document().units().to_vec();
        if units.is_empty() {
            ui.label(RichText::new(self.t(Text::Hint)).color(Color32::GRAY));
            return;
        }
        let source = &self.source;
        egui::ScrollArea::horizontal()
            .id_salt("units")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    for (index, unit) in units.iter().enumerate() {
                        ui.vertical(|ui| {
                            ui.set_width(64.0);
                            let mut annotation = unit.annotation.clone();
                            let field = ui.add(
                                egui::TextEdit::singleline(&mut annotation).desired_width(60.0),
                            );
                            if field.changed() {
                                edits.push(Edit::Annotation {
                                    index,
                                    text: annotation,
                                });
                            }
                            field.context_menu(|ui| unit_menu(ui, lang, source, index, unit, edits));

                            let glyph = ui.add(
                                egui::Label::new(
                                    RichText::new(unit.base().to_string())
                                        .size(28.0)
                                        .color(to_color32(unit.color)),
                                )
                                .sense(egui::Sense::click()),
                            );
                            glyph.context_menu(|ui| unit_menu(ui, lang, source, index, unit, edits));
                        });
                    }
                });
            });
    }

    fn draw_editor(&mut self, ui: &mut egui::Ui) {
        let mut edits = Vec::new();

        ui.add_space(8.0);
        self.draw_input(ui);
        ui.add_space(12.0);

        ui.separator();
        let mut font_actions = Vec::new();
        font_actions.extend(self.draw_font_row(ui, FontRole::Primary, &mut edits));
        font_actions.extend(self.draw_font_row(ui, FontRole::Secondary, &mut edits));
        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new(self.t(Text::Color)));
            let mut rgb = self.session.document().color.to_array();
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                edits.push(Edit::AllColors(Rgb::from(rgb)));
            }
        });
        ui.add_space(12.0);

        self.draw_units(ui, &mut edits);
        ui.add_space(12.0);

        section_header(ui, self.t(Text::Preview));
        self.draw_preview(ui);
        ui.add_space(8.0);
        self.draw_export_buttons(ui);

        self.apply_edits(edits);
        for action in font_actions {
            self.handle_font_action(action);
        }
    }

    fn draw_preview(&mut self, ui: &mut egui::Ui) {
        let height = (ui.available_height() - 60.0).max(120.0);
        egui::Frame::canvas(ui.style())
            .fill(Color32::WHITE)
            .rounding(Rounding::same(6.0))
            .show(ui, |ui| {
                ui.set_min_size(Vec2::new(ui.available_width(), height));
                match &self.preview {
                    Some(preview) => {
                        let max = Vec2::new(ui.available_width(), height) - Vec2::splat(8.0);
                        let natural = Vec2::new(preview.width as f32, preview.height as f32);
                        let size = if natural.x <= max.x && natural.y <= max.y {
                            natural
                        } else {
                            let (w, h) = fit_into(max.x, max.y, natural.x / natural.y);
                            Vec2::new(w, h)
                        };
                        ui.centered_and_justified(|ui| {
                            ui.image(egui::load::SizedTexture::new(preview.texture.id(), size));
                        });
                    }
                    None => {
                        ui.centered_and_justified(|ui| {
                            ui.label(RichText::new(self.t(Text::Preview)).color(Color32::GRAY).size(16.0));
                        });
                    }
                }
            });
    }

    fn draw_export_buttons(&mut self, ui: &mut egui::Ui) {
        let ready = self.preview.is_some();
        ui.horizontal(|ui| {
            let text_label = if self.copied_text_timer > 0.0 {
                self.t(Text::Copied)
            } else {
                self.t(Text::CopyText)
            };
            if ui
                .add_enabled(ready, toolbar_button_widget(text_label))
                .clicked()
            {
                self.action_copy_text();
            }
            let image_label = if self.copied_image_timer > 0.0 {
                self.t(Text::Copied)
            } else {
                self.t(Text::CopyImage)
            };
            if ui
                .add_enabled(ready, toolbar_button_widget(image_label))
                .clicked()
            {
                self.action_copy_image();
            }
            if ui
                .add_enabled(ready, toolbar_button_widget(self.t(Text::SavePng)))
                .clicked()
            {
                self.action_save_png();
            }
        });
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.pending_capture.is_some() {
                ui.spinner();
                ui.add_space(4.0);
            }
            if let Some(reason) = &self.hotkeys_error {
                ui.label(RichText::new("⚠").color(Color32::from_rgb(251, 191, 36)))
                    .on_hover_text(self.t(Text::HotkeysUnavailable).replace("{error}", reason));
            }
            ui.label(
                RichText::new(&self.status_message)
                    .color(Color32::LIGHT_GRAY)
                    .small(),
            );
        });
    }
}

impl eframe::App for PinyinApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_close_request(ctx);
        self.poll_hotkeys();
        self.poll_pending_capture(ctx);
        self.poll_update(ctx);
        self.refresh_preview(ctx);

        // Tick copy confirmation timers.
        if self.copied_text_timer > 0.0 || self.copied_image_timer > 0.0 {
            let dt = ctx.input(|i| i.unstable_dt);
            self.copied_text_timer = (self.copied_text_timer - dt).max(0.0);
            self.copied_image_timer = (self.copied_image_timer - dt).max(0.0);
            ctx.request_repaint();
        }

        // ── Top panel: title + window controls ───────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            self.draw_top_bar(ui, ctx);
            ui.add_space(4.0);
        });

        // ── Status bar ───────────────────────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        // ── Central panel: editor + preview ──────────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_editor(ui);
        });

        self.draw_update_dialog(ctx);
    }
}

// ── widget helpers ────────────────────────────────────────────────────────────

fn unit_menu(
    ui: &mut egui::Ui,
    lang: UiLanguage,
    source: &PinyinSource,
    index: usize,
    unit: &Unit,
    edits: &mut Vec<Edit>,
) {
    ui.horizontal(|ui| {
        ui.label(tr(lang, Text::UnitColor));
        let mut rgb = unit.color.to_array();
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            edits.push(Edit::Color {
                index,
                color: Rgb::from(rgb),
            });
        }
    });
    ui.separator();
    ui.menu_button(tr(lang, Text::Readings), |ui| {
        let readings = annotate::variants(source, unit.base());
        if readings.is_empty() {
            ui.label(RichText::new(tr(lang, Text::NoReadings)).color(Color32::GRAY));
        }
        for reading in readings {
            if ui
                .selectable_label(reading == unit.annotation, reading.as_str())
                .clicked()
            {
                edits.push(Edit::Annotation {
                    index,
                    text: reading,
                });
                ui.close_menu();
            }
        }
    });
}

fn accent_button(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).color(Color32::WHITE).strong())
            .fill(Color32::from_rgb(37, 99, 235))
            .min_size(Vec2::new(120.0, 32.0)),
    )
}

fn toolbar_button_widget(label: &str) -> egui::Button<'_> {
    egui::Button::new(label)
        .rounding(Rounding::same(4.0))
        .min_size(Vec2::new(130.0, 32.0))
}

fn section_header(ui: &mut egui::Ui, title: &str) {
    ui.label(RichText::new(title).strong().size(14.0));
    ui.separator();
    ui.add_space(4.0);
}

fn role_key(role: FontRole) -> &'static str {
    match role {
        FontRole::Primary => "primary",
        FontRole::Secondary => "secondary",
    }
}

fn to_color32(color: Rgb) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

fn apply_window_level(ctx: &egui::Context, on_top: bool) {
    let level = if on_top {
        egui::WindowLevel::AlwaysOnTop
    } else {
        egui::WindowLevel::Normal
    };
    ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(level));
}

fn show_window(ctx: &egui::Context) {
    ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
    ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
}

/// egui's bundled fonts have no CJK glyphs; borrow a system face for the
/// editor's character labels.
fn install_cjk_ui_font(
    ctx: &egui::Context,
    fonts: &mut FontLibrary,
    primary: &str,
    favorites: &Favorites,
) {
    let candidates = std::iter::once(primary)
        .chain(favorites.as_slice().iter().map(String::as_str))
        .chain(CJK_UI_FONTS.iter().copied());
    for family in candidates {
        let Ok(face) = fonts.load(family) else {
            continue;
        };
        if !face.has_glyph('汉') {
            continue;
        }
        let mut data = egui::FontData::from_owned(face.data().to_vec());
        data.index = face.index();
        let mut definitions = egui::FontDefinitions::default();
        definitions.font_data.insert("cjk".into(), data);
        for family_kind in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            definitions
                .families
                .entry(family_kind)
                .or_default()
                .push("cjk".into());
        }
        ctx.set_fonts(definitions);
        info!("UI font fallback: {}", face.family());
        return;
    }
    warn!("no CJK font found for the UI");
}

/// Scale (w, h) image to fit within (max_w, max_h) preserving aspect ratio.
fn fit_into(max_w: f32, max_h: f32, aspect: f32) -> (f32, f32) {
    let by_width = (max_w, max_w / aspect);
    let by_height = (max_h * aspect, max_h);
    if by_width.1 <= max_h {
        by_width
    } else {
        by_height
    }
}
