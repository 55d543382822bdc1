use std::sync::Arc;

use eframe::egui::{self, Color32, Pos2, Rect, Slider};
use futures::task::ArcWake;

use crate::colour::parse_colour;
use crate::controller::BoardController;
use crate::geometry::Point;
use crate::renderer::CanvasSurface;
use crate::replay::{MAX_SPEED, MIN_SPEED, PlaybackKind, SystemClock};
use crate::state::{KeyValueStorage, StrokeStore};
use crate::stroke::PenTool;
use crate::surface;

/// Canvas background, also what the eraser paints with
const PAPER: Color32 = Color32::from_rgb(250, 248, 240);

/// Wakes the UI loop so the next frame advances the playback.
struct RepaintWaker(egui::Context);

impl ArcWake for RepaintWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.request_repaint();
    }
}

/// The handwriting board: tools on the left, canvas in the middle.
pub struct HandwritingApp {
    controller: BoardController<CanvasSurface>,
    last_pointer: Option<Pos2>,
}

impl HandwritingApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let canvas = CanvasSurface::new(egui::vec2(800.0, 600.0), PAPER);
        let store = StrokeStore::new(default_storage());
        let mut controller = BoardController::init(surface::shared(canvas), store, Arc::new(SystemClock));
        controller.set_waker(futures::task::waker(Arc::new(RepaintWaker(cc.egui_ctx.clone()))));

        Self {
            controller,
            last_pointer: None,
        }
    }

    fn tools_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tools_panel")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Pen");

                let mut settings = self.controller.settings().clone();
                let mut changed = false;

                ui.horizontal(|ui| {
                    changed |= ui
                        .selectable_value(&mut settings.tool, PenTool::Pen, "✏ Pen")
                        .changed();
                    changed |= ui
                        .selectable_value(&mut settings.tool, PenTool::Eraser, "⌫ Eraser")
                        .changed();
                });

                ui.horizontal(|ui| {
                    ui.label("Colour:");
                    let mut colour = parse_colour(&settings.pen_colour).unwrap_or(Color32::BLACK);
                    if egui::color_picker::color_edit_button_srgba(
                        ui,
                        &mut colour,
                        egui::color_picker::Alpha::Opaque,
                    )
                    .changed()
                    {
                        settings.pen_colour = colour.to_hex();
                        changed = true;
                    }
                });
                changed |= ui.checkbox(&mut settings.rainbow, "Rainbow").changed();

                ui.horizontal(|ui| {
                    ui.label("Width:");
                    changed |= ui.add(Slider::new(&mut settings.pen_width, 1.0..=50.0)).changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Eraser:");
                    changed |= ui
                        .add(Slider::new(&mut settings.eraser_width, 4.0..=100.0))
                        .changed();
                });

                if changed {
                    self.controller.set_settings(settings);
                }

                ui.separator();

                ui.horizontal(|ui| {
                    let can_undo = self.controller.store().can_undo();
                    let can_redo = self.controller.store().can_redo();
                    if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                        self.controller.undo();
                    }
                    if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                        self.controller.redo();
                    }
                    if ui.button("Clear").clicked() {
                        self.controller.reset();
                    }
                });
                ui.label(format!(
                    "{} strokes, {} undone",
                    self.controller.committed().len(),
                    self.controller.store().undone_len()
                ));

                ui.separator();
                ui.heading("Rewrite");

                let mut speed = self.controller.speed().get();
                if ui
                    .add(
                        Slider::new(&mut speed, MIN_SPEED..=MAX_SPEED)
                            .logarithmic(true)
                            .text("speed"),
                    )
                    .changed()
                {
                    self.controller.set_speed(speed);
                }

                let has_strokes = !self.controller.committed().is_empty();
                ui.horizontal(|ui| match self.controller.active_kind() {
                    Some(PlaybackKind::Rewrite) => {
                        if ui.button("Stop rewrite").clicked() {
                            self.controller.cancel_rewrite();
                        }
                    }
                    Some(PlaybackKind::Replay) => {
                        if ui.button("Stop replay").clicked() {
                            self.controller.cancel_replay();
                        }
                    }
                    None => {
                        if ui.add_enabled(has_strokes, egui::Button::new("Rewrite")).clicked() {
                            self.controller.start_rewrite(speed);
                        }
                        if ui.add_enabled(has_strokes, egui::Button::new("Replay")).clicked() {
                            self.controller.start_replay();
                        }
                    }
                });
            });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());
        let rect = response.rect;
        self.controller.surface().lock().set_size(rect.size());

        self.handle_pointer(ui, rect);

        self.controller.surface().lock().paint(&painter, rect);
    }

    /// Feed pointer input to the capture machine, in surface coordinates.
    fn handle_pointer(&mut self, ui: &egui::Ui, rect: Rect) {
        let (pressed, released, down, gone, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.events.iter().any(|e| matches!(e, egui::Event::PointerGone))
                    || !i.focused,
                i.pointer.interact_pos(),
            )
        });
        let to_surface = |pos: Pos2| Point::from(pos - rect.min.to_vec2());

        if pressed {
            if let Some(pos) = pos.filter(|p| rect.contains(*p)) {
                if self.controller.begin_stroke(to_surface(pos)) {
                    self.last_pointer = Some(pos);
                }
            }
        }

        if self.controller.is_capturing() && missed_release(released, down, gone) {
            self.controller.cancel_stroke();
            self.last_pointer = None;
            return;
        }

        if self.controller.is_capturing() {
            if let Some(pos) = pos.filter(|p| Some(*p) != self.last_pointer) {
                self.controller.extend_stroke(to_surface(pos));
                self.last_pointer = Some(pos);
            }
        }

        if released && self.controller.is_capturing() {
            self.controller.end_stroke();
            self.last_pointer = None;
        }
    }
}

impl eframe::App for HandwritingApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.tick();

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z)) {
            if ctx.input(|i| i.modifiers.shift) {
                self.controller.redo();
            } else {
                self.controller.undo();
            }
        }

        self.tools_panel(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.canvas(ui));
    }
}

/// A release we never saw: the pointer left, focus was lost, or the button is up
/// without a release event.
fn missed_release(released: bool, primary_down: bool, pointer_gone: bool) -> bool {
    !released && (pointer_gone || !primary_down)
}

#[cfg(not(target_arch = "wasm32"))]
fn default_storage() -> Box<dyn KeyValueStorage> {
    let dir = std::env::var_os("HANDWRITING_DATA_DIR")
        .map(std::path::PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| std::path::Path::new(&home).join(".eframe_rewrite")))
        .unwrap_or_else(|| std::path::PathBuf::from(".eframe_rewrite"));
    log::info!("Storing strokes in {}", dir.display());
    Box::new(crate::state::FileStorage::new(dir))
}

#[cfg(target_arch = "wasm32")]
fn default_storage() -> Box<dyn KeyValueStorage> {
    Box::new(crate::state::LocalStorage)
}
