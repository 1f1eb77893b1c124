use egui::{Color32, ColorImage, Key, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::EditorConfig;
use crate::element::{ContainerId, ContainerKind, DrawableContainer};
use crate::event::{EditorEvent, EventRecorder, LoggingHandler};
use crate::field::{FieldOwner, FieldType, FieldValue, PreparedFilter};
use crate::filter::RenderMode;
use crate::geometry::hit_testing::handle_rect;
use crate::geometry::PixelRect;
use crate::persistence;
use crate::surface::{DrawingMode, RotateDirection, Surface};

const DRAWING_MODES: [(DrawingMode, &str); 8] = [
    (DrawingMode::Rectangle, "▭ Rectangle"),
    (DrawingMode::Ellipse, "◯ Ellipse"),
    (DrawingMode::Line, "╱ Line"),
    (DrawingMode::Arrow, "➜ Arrow"),
    (DrawingMode::Text, "T Text"),
    (DrawingMode::SpeechBubble, "💬 Bubble"),
    (DrawingMode::Highlight, "🖍 Highlight"),
    (DrawingMode::Obfuscate, "▦ Obfuscate"),
];

const PREPARED_FILTERS: [PreparedFilter; 5] = [
    PreparedFilter::TextHighlight,
    PreparedFilter::AreaHighlight,
    PreparedFilter::Magnification,
    PreparedFilter::Blur,
    PreparedFilter::Pixelize,
];

/// Lay out a container's text with the proportional font egui paints it in,
/// wrapped at the box width (in screen points for `scale`).
fn text_galley(ctx: &egui::Context, container: &DrawableContainer, scale: f32) -> Option<Arc<egui::Galley>> {
    let text = container.text().filter(|text| !text.is_empty())?;
    let color = container.fields().color(FieldType::LineColor).unwrap_or(Color32::BLACK);
    let font = egui::FontId::proportional(container.font_size() * scale);
    let wrap_width = container.bounds().width() * scale;
    Some(ctx.fonts(|fonts| fonts.layout(text.to_owned(), font, color, wrap_width)))
}

/// Host window around one [`Surface`]: routes pointer and keyboard input in
/// and shows the composited bitmap.
pub struct EditorApp {
    surface: Surface,
    events: EventRecorder,
    texture: Option<TextureHandle>,
    source: Option<PathBuf>,
    /// Text container whose edits are currently being folded into one undo step
    text_edit: Option<ContainerId>,
    text_buffer: String,
}

impl EditorApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, background: RgbaImage, source: Option<PathBuf>) -> Self {
        let config: EditorConfig = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        let surface = Surface::new(background, config);
        let events = EventRecorder::new();
        surface.subscribe(Box::new(events.clone()));
        surface.subscribe(Box::new(LoggingHandler));
        Self { surface, events, texture: None, source, text_edit: None, text_buffer: String::new() }
    }

    fn document_path(&self) -> Option<PathBuf> {
        self.source.as_ref().map(|path| path.with_extension("capture.json"))
    }

    fn export_path(&self) -> Option<PathBuf> {
        self.source.as_ref().map(|path| path.with_extension("annotated.png"))
    }

    fn undo(&mut self) {
        if let Err(err) = self.surface.undo() {
            info!("{err}");
        }
    }

    fn redo(&mut self) {
        if let Err(err) = self.surface.redo() {
            info!("{err}");
        }
    }

    fn save_document(&mut self) {
        let Some(path) = self.document_path() else { return };
        match persistence::save_to_path(self.surface.elements(), &path) {
            Ok(()) => self.surface.mark_saved(),
            Err(err) => warn!("could not save {}: {err}", path.display()),
        }
    }

    fn load_document(&mut self) {
        let Some(path) = self.document_path() else { return };
        let loaded = persistence::load_from_path(&path)
            .and_then(|elements| Ok(self.surface.load_elements(elements, true)?));
        if let Err(err) = loaded {
            warn!("could not load {}: {err}", path.display());
        }
    }

    fn export(&mut self) {
        let Some(path) = self.export_path() else { return };
        let image = self.surface.render(RenderMode::Export);
        match image.save(&path) {
            Ok(()) => {
                info!("📤 exported {}", path.display());
                self.surface.mark_saved();
            }
            Err(err) => warn!("could not export {}: {err}", path.display()),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, redo, delete, nudge) = ctx.input(|i| {
            let command = i.modifiers.command;
            let undo = command && !i.modifiers.shift && i.key_pressed(Key::Z);
            let redo = command && (i.key_pressed(Key::Y) || (i.modifiers.shift && i.key_pressed(Key::Z)));
            let delete = i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace);
            let step = if i.modifiers.shift { 10.0 } else { 1.0 };
            let mut nudge = Vec2::ZERO;
            if i.key_pressed(Key::ArrowLeft) {
                nudge.x -= step;
            }
            if i.key_pressed(Key::ArrowRight) {
                nudge.x += step;
            }
            if i.key_pressed(Key::ArrowUp) {
                nudge.y -= step;
            }
            if i.key_pressed(Key::ArrowDown) {
                nudge.y += step;
            }
            (undo, redo, delete, nudge)
        });
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
        if delete {
            if let Err(err) = self.surface.delete_selected() {
                warn!("{err}");
            }
        }
        if nudge != Vec2::ZERO {
            if let Err(err) = self.surface.move_selected(nudge) {
                warn!("{err}");
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let current = self.surface.drawing_mode();
            if ui.selectable_label(current.is_none(), "⬉ Select").clicked() {
                self.surface.set_drawing_mode(None);
            }
            for (mode, label) in DRAWING_MODES {
                if ui.selectable_label(current == Some(mode), label).clicked() {
                    self.surface.set_drawing_mode(Some(mode));
                }
            }
            ui.separator();
            if ui.add_enabled(self.surface.can_undo(), egui::Button::new("Undo")).clicked() {
                self.undo();
            }
            if ui.add_enabled(self.surface.can_redo(), egui::Button::new("Redo")).clicked() {
                self.redo();
            }
            ui.separator();
            if ui.button("⟲").on_hover_text("Rotate counter-clockwise").clicked() {
                self.rotate(RotateDirection::CounterClockwise);
            }
            if ui.button("⟳").on_hover_text("Rotate clockwise").clicked() {
                self.rotate(RotateDirection::Clockwise);
            }
            let selection = self.surface.elements().bounds_of(&self.surface.selected_ids());
            if ui.add_enabled(selection.is_positive(), egui::Button::new("Crop to selection")).clicked() {
                let rect = PixelRect::enclosing(selection);
                if let Err(err) = self.surface.crop(rect) {
                    warn!("{err}");
                }
            }
            ui.separator();
            let has_source = self.source.is_some();
            if ui.add_enabled(has_source, egui::Button::new("Save")).clicked() {
                self.save_document();
            }
            if ui.add_enabled(has_source, egui::Button::new("Load")).clicked() {
                self.load_document();
            }
            if ui.add_enabled(has_source, egui::Button::new("Export")).clicked() {
                self.export();
            }
        });
    }

    fn rotate(&mut self, direction: RotateDirection) {
        if let Err(err) = self.surface.rotate(direction) {
            warn!("{err}");
        }
    }

    /// Field editors for the single selected container.
    fn properties_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Properties");
        let selected = self.surface.selected_ids();
        let [id] = selected.as_slice() else {
            ui.label(format!("{} selected", selected.len()));
            self.text_edit = None;
            return;
        };
        let id = *id;
        let Some(container) = self.surface.get(id).cloned() else { return };
        let owner = FieldOwner::Container(id);
        let fields = container.fields();

        if let Some(mut thickness) = fields.int(FieldType::LineThickness) {
            if ui.add(egui::Slider::new(&mut thickness, 0..=20).text("Line")).changed() {
                self.set_field(owner, FieldType::LineThickness, FieldValue::Int(thickness));
            }
        }
        for (field_type, label) in [(FieldType::LineColor, "Line color"), (FieldType::FillColor, "Fill color")] {
            if let Some(mut color) = fields.color(field_type) {
                ui.horizontal(|ui| {
                    ui.label(label);
                    if ui.color_edit_button_srgba(&mut color).changed() {
                        self.set_field(owner, field_type, FieldValue::Color(color));
                    }
                });
            }
        }
        if let Some(mut size) = fields.float(FieldType::FontSize) {
            if ui.add(egui::Slider::new(&mut size, 6.0..=72.0).text("Font size")).changed() {
                self.set_field(owner, FieldType::FontSize, FieldValue::Float(size));
            }
        }
        if let Some(prepared) = fields.get(FieldType::PreparedFilter).and_then(FieldValue::as_prepared_filter) {
            let mut choice = prepared;
            egui::ComboBox::from_label("Effect").selected_text(format!("{prepared:?}")).show_ui(ui, |ui| {
                for option in PREPARED_FILTERS {
                    ui.selectable_value(&mut choice, option, format!("{option:?}"));
                }
            });
            if choice != prepared {
                self.set_field(owner, FieldType::PreparedFilter, FieldValue::PreparedFilter(choice));
            }
        }
        self.filter_fields(ui, &container);

        if let Some(text) = container.text() {
            if self.text_edit != Some(id) {
                self.text_buffer = text.to_string();
            }
            if ui.text_edit_multiline(&mut self.text_buffer).changed() {
                let first = self.text_edit != Some(id);
                self.text_edit = Some(id);
                if let Err(err) = self.surface.set_text(id, self.text_buffer.clone(), first) {
                    warn!("{err}");
                }
            }
        } else {
            self.text_edit = None;
        }
    }

    fn filter_fields(&mut self, ui: &mut egui::Ui, container: &DrawableContainer) {
        for (index, filter) in container.filters().iter().enumerate() {
            let owner = FieldOwner::Filter { container: container.id(), index };
            ui.label(format!("{:?}{}", filter.kind(), if filter.invert() { " (outside)" } else { "" }));
            for (field_type, range) in [
                (FieldType::BlurRadius, 0..=20),
                (FieldType::PixelSize, 1..=50),
                (FieldType::MagnificationFactor, 1..=8),
            ] {
                if let Some(mut value) = filter.fields().int(field_type) {
                    if ui.add(egui::Slider::new(&mut value, range).text(format!("{field_type:?}"))).changed() {
                        self.set_field(owner, field_type, FieldValue::Int(value));
                    }
                }
            }
            if let Some(mut color) = filter.fields().color(FieldType::FillColor) {
                if ui.color_edit_button_srgba(&mut color).changed() {
                    self.set_field(owner, FieldType::FillColor, FieldValue::Color(color));
                }
            }
        }
    }

    fn set_field(&mut self, owner: FieldOwner, field_type: FieldType, value: FieldValue) {
        if let Err(err) = self.surface.set_field_value(owner, field_type, value) {
            warn!("{err}");
        }
    }

    /// Upload the display bitmap if the surface repainted anything.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if self.surface.repaint().is_none() && self.texture.is_some() {
            return;
        }
        let image = self.surface.display_image();
        let size = [image.width() as usize, image.height() as usize];
        let color_image = ColorImage::from_rgba_unmultiplied(size, image.as_flat_samples().as_slice());
        match &mut self.texture {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture("surface", color_image, TextureOptions::LINEAR)),
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let area = response.rect;
        painter.rect_filled(area, 0.0, Color32::from_gray(40));

        let image_size = self.surface.image_rect().size();
        let scale = (area.width() / image_size.x).min(area.height() / image_size.y).min(1.0);
        let shown = Rect::from_center_size(area.center(), image_size * scale);
        let to_image = |p: Pos2| Pos2::new((p.x - shown.min.x) / scale, (p.y - shown.min.y) / scale);
        let to_screen = |p: Pos2| Pos2::new(shown.min.x + p.x * scale, shown.min.y + p.y * scale);

        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), shown, uv, Color32::WHITE);
        }

        let modifiers = ui.input(|i| i.modifiers);
        let result = if response.drag_started() {
            let origin = ui.input(|i| i.pointer.press_origin()).or(response.interact_pointer_pos());
            origin.map(|p| self.surface.mouse_down(to_image(p), modifiers).map(|_| ()))
        } else if response.dragged() {
            response.interact_pointer_pos().map(|p| self.surface.mouse_move(to_image(p), modifiers))
        } else if response.drag_stopped() {
            response.interact_pointer_pos().map(|p| self.surface.mouse_up(to_image(p), modifiers))
        } else if response.clicked() {
            response.interact_pointer_pos().map(|p| {
                let point = to_image(p);
                self.surface.mouse_down(point, modifiers)?;
                self.surface.mouse_up(point, modifiers)
            })
        } else {
            None
        };
        if let Some(Err(err)) = result {
            warn!("{err}");
        }

        if let Some(hover) = response.hover_pos() {
            let icon = self.surface.cursor_at(to_image(hover));
            ui.ctx().set_cursor_icon(icon);
        }

        // glyphs are drawn here, on top of the rasterized text boxes
        for container in self.surface.elements().iter() {
            let Some(galley) = text_galley(ui.ctx(), container, scale) else {
                continue;
            };
            let anchor = to_screen(container.bounds().center()) - galley.size() / 2.0;
            painter.galley(anchor, galley, Color32::BLACK);
        }

        let adorner_size = self.surface.config().adorner_size;
        for container in self.surface.elements().iter().filter(|c| c.is_selected()) {
            let outline = Rect::from_min_max(to_screen(container.bounds().min), to_screen(container.bounds().max));
            painter.rect_stroke(outline, 0.0, Stroke::new(1.0, Color32::LIGHT_BLUE));
            for adorner in container.adorners() {
                if let Some(center) = adorner.location(container) {
                    let handle = handle_rect(to_screen(center), adorner_size);
                    painter.rect_filled(handle, 0.0, Color32::WHITE);
                    painter.rect_stroke(handle, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));
                }
            }
            if matches!(container.kind(), ContainerKind::SpeechBubble { .. }) {
                if let Some(target) = container.target() {
                    painter.circle_stroke(to_screen(target), adorner_size / 2.0, Stroke::new(1.0, Color32::LIGHT_BLUE));
                }
            }
        }
    }
}

impl eframe::App for EditorApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self.surface.config());
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::SidePanel::right("properties").resizable(true).default_width(220.0).show(ctx, |ui| {
            self.properties_panel(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.refresh_texture(ctx);
            self.canvas(ui);
        });

        let events = self.events.drain();
        if events.iter().any(|event| matches!(event, EditorEvent::Modified)) {
            let title = if self.surface.is_modified() { "Capture editor *" } else { "Capture editor" };
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.to_string()));
        }
        if !events.is_empty() {
            ctx.request_repaint();
        }
    }
}
