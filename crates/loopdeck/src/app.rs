use eframe::egui;
use log::{debug, error, info, warn};
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use loopdeck::cta::Navigator;
use loopdeck::source::{self, SlideSource};
use loopdeck::{
    CarouselConfig, CarouselController, CarouselEvent, PointerId, PointerTarget, Slide,
    TransitionToken,
};

use crate::theme::Theme;

const POINTER: PointerId = PointerId(0);
const WATCH_DEBOUNCE: Duration = Duration::from_millis(250);
const TOAST_DURATION: f32 = 1.5;
const OFFSET_EPSILON: f32 = 0.01;

pub struct ViewerOptions {
    pub source: String,
    pub windowed: bool,
    /// 1-indexed
    pub start_slide: Option<usize>,
    pub watch: bool,
    pub carousel: CarouselConfig,
    pub theme: String,
    pub transition_ms: u64,
}

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: String) -> Self {
        Self {
            message,
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let fade_start = 1.0;
        if elapsed < fade_start {
            1.0
        } else if elapsed < TOAST_DURATION {
            1.0 - (elapsed - fade_start) / (TOAST_DURATION - fade_start)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= TOAST_DURATION
    }
}

/// Eased movement of the painted track toward the engine's offset.
struct OffsetAnimation {
    from: f32,
    to: f32,
    start: Instant,
    token: Option<TransitionToken>,
}

enum Media {
    Pending,
    Ready(egui::TextureHandle),
    Failed,
}

struct DecodedImage {
    key: String,
    result: Result<egui::ColorImage, String>,
}

/// Internal links have no router here, so they surface as a toast.
struct WindowNavigator<'a> {
    ctx: &'a egui::Context,
    toast: &'a mut Option<Toast>,
}

impl Navigator for WindowNavigator<'_> {
    fn navigate_internal(&mut self, link: &str) {
        info!("internal navigation to {link}");
        *self.toast = Some(Toast::new(format!("Navigate: {link}")));
    }

    fn open_external(&mut self, url: &str) {
        info!("opening {url}");
        self.ctx.open_url(egui::OpenUrl::new_tab(url));
    }
}

/// A CTA button painted last frame.
struct CtaHit {
    rect: egui::Rect,
    slide: usize,
    cta: usize,
}

/// Work collected while painting, applied to the controller afterwards.
#[derive(Default)]
struct FrameActions {
    intersected: Vec<usize>,
    wanted_media: Vec<String>,
}

struct CarouselApp {
    carousel: CarouselController,
    source: Box<dyn SlideSource>,
    base_dir: PathBuf,
    theme: Theme,
    transition: Duration,
    clock: Instant,
    displayed_offset: f32,
    animation: Option<OffsetAnimation>,
    media: HashMap<String, Media>,
    /// Render indices already reported through `media_loaded`.
    reported_media: HashSet<usize>,
    decoded_tx: Sender<DecodedImage>,
    decoded_rx: Receiver<DecodedImage>,
    _watcher: Option<Debouncer<RecommendedWatcher>>,
    reload_rx: Option<Receiver<DebounceEventResult>>,
    pointer_active: bool,
    pressed_cta: Option<(usize, usize)>,
    cta_hits: Vec<CtaHit>,
    paused: bool,
    page_visible: bool,
    minimized: bool,
    toast: Option<Toast>,
}

impl CarouselApp {
    fn new(options: ViewerOptions, slides: Vec<Slide>) -> Self {
        let source = source::from_location(&options.source);
        let base_dir = if options.source.contains("://") {
            PathBuf::from(".")
        } else {
            Path::new(&options.source)
                .parent()
                .unwrap_or(Path::new("."))
                .to_path_buf()
        };

        let mut carousel = CarouselController::new(options.carousel);
        match options.start_slide {
            Some(n) => carousel.load_at(slides, n.saturating_sub(1)),
            None => carousel.load(slides),
        }

        let (_watcher, reload_rx) = if options.watch {
            match watch(&options.source) {
                Ok((watcher, rx)) => (Some(watcher), Some(rx)),
                Err(e) => {
                    warn!("not watching {}: {e}", options.source);
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        let (decoded_tx, decoded_rx) = mpsc::channel();
        let displayed_offset = carousel.render_offset();
        Self {
            carousel,
            source,
            base_dir,
            theme: Theme::from_name(&options.theme),
            transition: Duration::from_millis(options.transition_ms),
            clock: Instant::now(),
            displayed_offset,
            animation: None,
            media: HashMap::new(),
            reported_media: HashSet::new(),
            decoded_tx,
            decoded_rx,
            _watcher,
            reload_rx,
            pointer_active: false,
            pressed_cta: None,
            cta_hits: Vec::new(),
            paused: false,
            page_visible: true,
            minimized: false,
            toast: None,
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.toast = Some(Toast::new(format!("Theme: {}", self.theme.name)));
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.carousel.pause_autoplay();
        } else {
            self.carousel.resume_autoplay();
        }
        let state = if self.paused { "paused" } else { "playing" };
        self.toast = Some(Toast::new(format!("Autoplay {state}")));
    }

    fn reload(&mut self) {
        let count = self.carousel.load_from(self.source.as_ref());
        self.reported_media.clear();
        self.animation = None;
        self.displayed_offset = self.carousel.render_offset();
        self.toast = Some(Toast::new(format!("Reloaded {count} slide(s)")));
    }

    fn poll_reload(&mut self) {
        let Some(rx) = &self.reload_rx else { return };
        let mut changed = false;
        while let Ok(result) = rx.try_recv() {
            match result {
                Ok(events) => changed |= !events.is_empty(),
                Err(e) => warn!("watch error: {e}"),
            }
        }
        if changed {
            debug!("payload changed on disk");
            self.reload();
        }
    }

    fn poll_decoded(&mut self, ctx: &egui::Context) {
        while let Ok(decoded) = self.decoded_rx.try_recv() {
            let media = match decoded.result {
                Ok(image) => {
                    let texture =
                        ctx.load_texture(&decoded.key, image, egui::TextureOptions::LINEAR);
                    Media::Ready(texture)
                }
                Err(e) => {
                    warn!("could not load {}: {e}", decoded.key);
                    Media::Failed
                }
            };
            self.media.insert(decoded.key, media);
        }
    }

    /// Start decoding `key` on the rayon pool unless it is known already.
    fn request_media(&mut self, ctx: &egui::Context, key: String) {
        if key.is_empty() || self.media.contains_key(&key) {
            return;
        }
        self.media.insert(key.clone(), Media::Pending);
        let tx = self.decoded_tx.clone();
        let ctx = ctx.clone();
        let base_dir = self.base_dir.clone();
        rayon::spawn(move || {
            let result = decode_media(&base_dir, &key);
            let _ = tx.send(DecodedImage { key, result });
            ctx.request_repaint();
        });
    }

    /// Report decoded media for every render entry that shows it.
    fn report_media(&mut self) {
        let width = self.carousel.viewport_width();
        let breakpoint = self.carousel.config().wide_breakpoint;
        let ready: Vec<usize> = self
            .carousel
            .render_sequence()
            .iter()
            .enumerate()
            .filter(|(r, _)| !self.reported_media.contains(r))
            .filter(|(_, entry)| {
                matches!(
                    self.media.get(entry.slide.media_for(width, breakpoint)),
                    Some(Media::Ready(_))
                )
            })
            .map(|(r, _)| r)
            .collect();
        for render_index in ready {
            self.carousel.media_loaded(render_index);
            self.reported_media.insert(render_index);
        }
    }

    fn update_visibility(&mut self, ctx: &egui::Context) {
        let (minimized, focused) = ctx.input(|i| {
            let viewport = i.viewport();
            (
                viewport.minimized.unwrap_or(false),
                viewport.focused.unwrap_or(true),
            )
        });
        self.apply_visibility(minimized, focused);
    }

    fn apply_visibility(&mut self, minimized: bool, focused: bool) {
        if minimized != self.minimized {
            self.minimized = minimized;
            self.carousel.set_root_in_viewport(!minimized);
        }
        let visible = !minimized && focused;
        if visible != self.page_visible {
            self.page_visible = visible;
            self.carousel.set_page_visible(visible);
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context) {
        let (pressed, down, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
            )
        });

        if pressed {
            if let Some(pos) = pos {
                let hit = self.cta_hits.iter().find(|h| h.rect.contains(pos));
                let target = match hit {
                    Some(h) => {
                        self.pressed_cta = Some((h.slide, h.cta));
                        PointerTarget::Interactive
                    }
                    None => PointerTarget::Surface,
                };
                self.carousel.pointer_down(POINTER, pos.x, target);
                self.pointer_active = true;
            }
            return;
        }

        if !self.pointer_active {
            return;
        }

        if down {
            match pos {
                Some(pos) => self.carousel.pointer_move(POINTER, pos.x),
                None => {
                    self.carousel.pointer_cancel(POINTER);
                    self.pointer_active = false;
                    self.pressed_cta = None;
                }
            }
            ctx.request_repaint();
            return;
        }

        self.carousel.pointer_up(POINTER);
        self.pointer_active = false;
        if let Some((slide, cta)) = self.pressed_cta.take() {
            let still_over = pos.is_some_and(|pos| {
                self.cta_hits
                    .iter()
                    .any(|h| h.slide == slide && h.cta == cta && h.rect.contains(pos))
            });
            if still_over {
                let mut navigator = WindowNavigator {
                    ctx,
                    toast: &mut self.toast,
                };
                self.carousel.activate_cta(slide, cta, &mut navigator);
            }
        }
    }

    /// Move the painted offset toward the engine's offset and report arrival.
    fn step_animation(&mut self) {
        let target = self.carousel.render_offset();

        // A press alone must not cut a running transition short; only an
        // applied drag preview is followed directly.
        let previewing = self.carousel.is_dragging()
            && self.carousel.drag_offset_px() != 0.0
            && !self.carousel.animating();
        if !self.carousel.transition_enabled() || previewing {
            self.displayed_offset = target;
            self.animation = None;
            return;
        }

        let retarget = match &self.animation {
            Some(a) => (a.to - target).abs() > OFFSET_EPSILON,
            None => (self.displayed_offset - target).abs() > OFFSET_EPSILON,
        };
        if retarget {
            self.animation = Some(OffsetAnimation {
                from: self.displayed_offset,
                to: target,
                start: Instant::now(),
                token: self.carousel.pending_token(),
            });
        }

        let Some(animation) = &self.animation else {
            // Nothing to move but a transition is pending: it ends immediately.
            if let Some(token) = self.carousel.pending_token() {
                self.finish_transition(token);
            }
            return;
        };

        let raw_t = if self.transition.is_zero() {
            1.0
        } else {
            (animation.start.elapsed().as_secs_f32() / self.transition.as_secs_f32())
                .clamp(0.0, 1.0)
        };
        self.displayed_offset =
            animation.from + (animation.to - animation.from) * ease_in_out(raw_t);

        if raw_t >= 1.0 {
            self.displayed_offset = animation.to;
            let token = animation.token;
            self.animation = None;
            if let Some(token) = token {
                self.finish_transition(token);
            }
        }
    }

    /// Report arrival. A wrap snaps the index with the transition off, and the
    /// track must land there in the same frame.
    fn finish_transition(&mut self, token: TransitionToken) {
        self.carousel.transition_end(token);
        if !self.carousel.transition_enabled() {
            self.animation = None;
            self.displayed_offset = self.carousel.render_offset();
        }
    }

    fn draw_track(
        &self,
        ui: &egui::Ui,
        rect: egui::Rect,
        actions: &mut FrameActions,
    ) -> Vec<CtaHit> {
        let width = rect.width();
        let breakpoint = self.carousel.config().wide_breakpoint;
        let wide = self.carousel.is_wide_screen();
        let painter = ui.painter_at(rect);
        let mut hits = Vec::new();

        for (render_index, entry) in self.carousel.render_sequence().iter().enumerate() {
            let left = rect.left()
                + (render_index as f32 * 100.0 + self.displayed_offset) / 100.0 * width;
            let slide_rect =
                egui::Rect::from_min_size(egui::pos2(left, rect.top()), rect.size());
            let on_screen = slide_rect.intersects(rect);

            if on_screen {
                actions.intersected.push(render_index);
            }
            if on_screen || self.carousel.is_render_index_near(render_index) {
                actions
                    .wanted_media
                    .push(entry.slide.media_for(width, breakpoint).to_string());
                if let Some(url) = &entry.slide.title_img_url {
                    actions.wanted_media.push(url.clone());
                }
            }
            if !on_screen {
                continue;
            }

            painter.rect_filled(slide_rect, 0.0, self.theme.placeholder);
            if let Some(Media::Ready(texture)) =
                self.media.get(entry.slide.media_for(width, breakpoint))
            {
                painter.image(
                    texture.id(),
                    slide_rect,
                    cover_uv(texture.size_vec2(), slide_rect.size()),
                    egui::Color32::WHITE,
                );
            }

            let slide_hits = self.draw_slide_content(&painter, entry.slide, slide_rect, wide);
            if !entry.is_clone {
                hits.extend(slide_hits.into_iter().map(|(rect, cta)| CtaHit {
                    rect,
                    slide: entry.real_index,
                    cta,
                }));
            }
        }
        hits
    }

    fn draw_slide_content(
        &self,
        painter: &egui::Painter,
        slide: &Slide,
        rect: egui::Rect,
        wide: bool,
    ) -> Vec<(egui::Rect, usize)> {
        let padding = if wide { 80.0 } else { 32.0 };
        let content = rect.shrink(padding);
        let mut y = content.top() + content.height() * 0.3;

        let title_img = slide
            .title_img_url
            .as_ref()
            .and_then(|url| match self.media.get(url) {
                Some(Media::Ready(texture)) => Some(texture),
                _ => None,
            });
        if let Some(texture) = title_img {
            let size = texture.size_vec2();
            let height = self.theme.scaled(self.theme.title_size, wide) * 1.5;
            let width = (size.x / size.y.max(1.0) * height).min(content.width());
            let img_rect = egui::Rect::from_min_size(
                egui::pos2(content.left(), y),
                egui::vec2(width, height),
            );
            painter.image(
                texture.id(),
                img_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            y += height + 24.0;
        } else if !slide.title.is_empty() {
            let galley = painter.layout(
                slide.title.clone(),
                egui::FontId::proportional(self.theme.scaled(self.theme.title_size, wide)),
                self.theme.heading_color,
                content.width(),
            );
            let height = galley.rect.height();
            painter.galley(egui::pos2(content.left(), y), galley, self.theme.heading_color);
            y += height + 24.0;
        }

        if !slide.text.is_empty() {
            let galley = painter.layout(
                slide.text.clone(),
                egui::FontId::proportional(self.theme.scaled(self.theme.body_size, wide)),
                self.theme.foreground,
                content.width(),
            );
            let height = galley.rect.height();
            painter.galley(egui::pos2(content.left(), y), galley, self.theme.foreground);
            y += height + 32.0;
        }

        let mut hits = Vec::new();
        let mut x = content.left();
        let font = egui::FontId::proportional(self.theme.scaled(self.theme.button_size, wide));
        for (i, cta) in slide.ctas.iter().enumerate() {
            let galley = painter.layout_no_wrap(
                cta.label.clone(),
                font.clone(),
                self.theme.button_foreground,
            );
            let pad = egui::vec2(20.0, 12.0);
            let button =
                egui::Rect::from_min_size(egui::pos2(x, y), galley.rect.size() + pad * 2.0);
            painter.rect_filled(button, 6.0, self.theme.button_background);
            painter.galley(button.min + pad, galley, self.theme.button_foreground);
            hits.push((button, i));
            x = button.right() + 16.0;
        }
        hits
    }

    fn draw_dots(&self, ui: &egui::Ui, rect: egui::Rect) {
        let count = self.carousel.slide_count();
        if count < 2 {
            return;
        }
        let spacing = 18.0;
        let start_x = rect.center().x - spacing * (count as f32 - 1.0) / 2.0;
        let y = rect.bottom() - 28.0;
        for i in 0..count {
            let color = if i == self.carousel.active_index() {
                self.theme.accent
            } else {
                Theme::with_opacity(self.theme.foreground, 0.35)
            };
            ui.painter()
                .circle_filled(egui::pos2(start_x + i as f32 * spacing, y), 5.0, color);
        }
    }

    fn draw_toast(&self, ui: &egui::Ui, rect: egui::Rect) {
        let Some(toast) = &self.toast else { return };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }
        let color = Theme::with_opacity(self.theme.foreground, opacity * 0.9);
        let bg = Theme::with_opacity(self.theme.placeholder, opacity * 0.9);
        let galley = ui.painter().layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(20.0),
            color,
        );
        let padding = 16.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.bottom() - 100.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        ui.painter().rect_filled(toast_rect, 8.0, bg);
        ui.painter().galley(
            egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding),
            galley,
            color,
        );
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        if self.animation.is_some() || self.pointer_active || self.toast.is_some() {
            ctx.request_repaint();
            return;
        }
        if let Some(deadline) = self.carousel.next_deadline() {
            let now = self.clock.elapsed();
            ctx.request_repaint_after(deadline.saturating_sub(now));
        }
    }
}

impl eframe::App for CarouselApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.carousel.advance(self.clock.elapsed());
        self.poll_reload();
        self.poll_decoded(ctx);
        self.update_visibility(ctx);

        // Viewport commands must be sent outside the input closure.
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();
        let count = self.carousel.slide_count();
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                self.carousel.teardown();
                viewport_cmds.push(egui::ViewportCommand::Close);
                return;
            }
            if i.key_pressed(egui::Key::F) {
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                    !i.viewport().fullscreen.unwrap_or(false),
                ));
            }
            if i.key_pressed(egui::Key::D) {
                self.toggle_theme();
            }
            if i.key_pressed(egui::Key::Space) {
                self.toggle_pause();
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                self.carousel.next();
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                self.carousel.prev();
            }
            if i.key_pressed(egui::Key::Home) {
                self.carousel.go_to(0);
            }
            if i.key_pressed(egui::Key::End) && count > 0 {
                self.carousel.go_to(count - 1);
            }
        });
        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }

        self.handle_pointer(ctx);
        for event in self.carousel.drain_events() {
            let CarouselEvent::CtaActivated(activation) = event;
            debug!(
                "cta `{}` on slide {} activated",
                activation.cta.label, activation.slide_index
            );
        }

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        let bg = self.theme.background;
        let mut actions = FrameActions::default();
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                if (self.carousel.viewport_width() - rect.width()).abs() > f32::EPSILON {
                    self.carousel.set_viewport_width(rect.width());
                }
                self.step_animation();

                ui.painter().rect_filled(rect, 0.0, bg);
                if self.carousel.slide_count() == 0 {
                    let galley = ui.painter().layout_no_wrap(
                        "No slides".to_string(),
                        egui::FontId::proportional(28.0),
                        self.theme.foreground,
                    );
                    let pos = rect.center() - galley.rect.size() / 2.0;
                    ui.painter().galley(pos, galley, self.theme.foreground);
                } else {
                    self.cta_hits = self.draw_track(ui, rect, &mut actions);
                    self.draw_dots(ui, rect);
                }
                self.draw_toast(ui, rect);
            });

        for render_index in actions.intersected {
            self.carousel.slide_intersected(render_index);
        }
        for key in actions.wanted_media {
            self.request_media(ctx, key);
        }
        self.report_media();
        self.schedule_repaint(ctx);
    }
}

impl Drop for CarouselApp {
    fn drop(&mut self) {
        self.carousel.teardown();
    }
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// UV rectangle that crops `image` to fill `target` without distortion.
fn cover_uv(image: egui::Vec2, target: egui::Vec2) -> egui::Rect {
    let image_aspect = image.x / image.y.max(1.0);
    let target_aspect = target.x / target.y.max(1.0);
    if image_aspect > target_aspect {
        let w = target_aspect / image_aspect;
        egui::Rect::from_min_max(
            egui::pos2((1.0 - w) / 2.0, 0.0),
            egui::pos2((1.0 + w) / 2.0, 1.0),
        )
    } else {
        let h = image_aspect / target_aspect;
        egui::Rect::from_min_max(
            egui::pos2(0.0, (1.0 - h) / 2.0),
            egui::pos2(1.0, (1.0 + h) / 2.0),
        )
    }
}

fn decode_media(base_dir: &Path, key: &str) -> Result<egui::ColorImage, String> {
    let bytes = if key.starts_with("http://") || key.starts_with("https://") {
        ureq::get(key)
            .call()
            .and_then(|mut response| response.body_mut().read_to_vec())
            .map_err(|e| e.to_string())?
    } else {
        std::fs::read(base_dir.join(key)).map_err(|e| e.to_string())?
    };
    let image = image::load_from_memory(&bytes)
        .map_err(|e| e.to_string())?
        .into_rgba8();
    let (w, h) = image.dimensions();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        image.as_raw(),
    ))
}

fn watch(
    location: &str,
) -> anyhow::Result<(Debouncer<RecommendedWatcher>, Receiver<DebounceEventResult>)> {
    if location.contains("://") {
        anyhow::bail!("only files can be watched");
    }
    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(WATCH_DEBOUNCE, tx)?;
    debouncer
        .watcher()
        .watch(Path::new(location), RecursiveMode::NonRecursive)?;
    Ok((debouncer, rx))
}

pub fn run(options: ViewerOptions) -> anyhow::Result<()> {
    let slides = match source::fetch_slides(source::from_location(&options.source).as_ref()) {
        Ok(slides) => slides,
        Err(e) => {
            error!("slide loading error ({}): {e}", options.source);
            Vec::new()
        }
    };

    let title = format!("loopdeck - {}", options.source);
    let viewport = if options.windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let native = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native,
        Box::new(move |_cc| Ok(Box::new(CarouselApp::new(options, slides)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(0.5), 0.5);
    }

    #[test]
    fn test_cover_uv_crops_wide_image() {
        let uv = cover_uv(egui::vec2(200.0, 100.0), egui::vec2(100.0, 100.0));
        assert_eq!(uv.min, egui::pos2(0.25, 0.0));
        assert_eq!(uv.max, egui::pos2(0.75, 1.0));
    }

    #[test]
    fn test_cover_uv_crops_tall_image() {
        let uv = cover_uv(egui::vec2(100.0, 400.0), egui::vec2(100.0, 100.0));
        assert_eq!(uv.min, egui::pos2(0.0, 0.375));
        assert_eq!(uv.max, egui::pos2(1.0, 0.625));
    }

    #[test]
    fn test_watch_rejects_urls() {
        assert!(watch("https://example.com/slides.json").is_err());
    }

    fn slides(n: u64) -> Vec<Slide> {
        (1..=n)
            .map(|id| Slide {
                id,
                desktop_img: String::new(),
                mobile_img: String::new(),
                title: format!("Slide {id}"),
                text: String::new(),
                title_img_url: None,
                ctas: Vec::new(),
            })
            .collect()
    }

    fn viewer(n: u64, start_slide: usize, transition_ms: u64) -> CarouselApp {
        let mut app = CarouselApp::new(
            ViewerOptions {
                source: "slides.json".to_string(),
                windowed: true,
                start_slide: Some(start_slide),
                watch: false,
                carousel: CarouselConfig {
                    autoplay_interval_ms: 0,
                    ..CarouselConfig::default()
                },
                theme: "light".to_string(),
                transition_ms,
            },
            slides(n),
        );
        app.carousel.set_viewport_width(800.0);
        app
    }

    /// One repaint: dispatch due work, then move the painted track.
    fn frame(app: &mut CarouselApp) {
        let now = app.carousel.now() + Duration::from_millis(16);
        app.carousel.advance(now);
        app.step_animation();
    }

    #[test]
    fn test_wrap_snap_is_not_animated() {
        let mut app = viewer(3, 3, 0);
        assert_eq!(app.displayed_offset, -300.0);
        app.carousel.next();

        // Arrives on the trailing clone and snaps to the first slide at once.
        frame(&mut app);
        assert_eq!(app.carousel.current_index(), 0);
        assert!(!app.carousel.transition_enabled());
        assert_eq!(app.displayed_offset, -100.0);
        assert!(app.animation.is_none());

        // Transition comes back on without any motion.
        frame(&mut app);
        assert!(app.carousel.transition_enabled());
        assert_eq!(app.displayed_offset, -100.0);
        assert!(app.animation.is_none());
        assert!(app.carousel.pending_token().is_none());
    }

    #[test]
    fn test_backward_wrap_snap_is_not_animated() {
        let mut app = viewer(3, 1, 0);
        app.carousel.prev();
        frame(&mut app);
        assert_eq!(app.carousel.current_index(), 2);
        assert_eq!(app.displayed_offset, -300.0);
        frame(&mut app);
        assert!(app.animation.is_none());
        assert_eq!(app.displayed_offset, -300.0);
    }

    #[test]
    fn test_press_does_not_cut_transition_short() {
        let mut app = viewer(3, 1, 10_000);
        app.carousel.next();
        frame(&mut app);
        let before = app.displayed_offset;
        assert!(app.animation.is_some());
        assert!(before > -150.0);

        app.carousel.pointer_down(POINTER, 400.0, PointerTarget::Surface);
        frame(&mut app);
        assert!(app.animation.is_some());
        assert!(app.carousel.animating());
        assert!(app.displayed_offset > -150.0);
    }

    #[test]
    fn test_drag_preview_is_followed_directly() {
        let mut app = viewer(3, 1, 500);
        app.carousel.pointer_down(POINTER, 400.0, PointerTarget::Surface);
        app.carousel.pointer_move(POINTER, 300.0);
        frame(&mut app);
        assert_eq!(app.carousel.drag_offset_px(), -100.0);
        assert_eq!(app.displayed_offset, -112.5);
        assert!(app.animation.is_none());
    }

    #[test]
    fn test_minimize_tracked_while_unfocused() {
        let mut app = viewer(3, 1, 0);
        app.apply_visibility(false, false);
        assert!(!app.page_visible);
        assert!(!app.minimized);

        app.apply_visibility(true, false);
        assert!(app.minimized);

        app.apply_visibility(false, true);
        assert!(!app.minimized);
        assert!(app.page_visible);
    }
}
