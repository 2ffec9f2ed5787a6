//! eframe shell hosting the editor: translates pointer/keyboard input,
//! uploads the composed frame as a texture and draws the toolbar.

use eframe::egui;

use crate::editor::{EditorConfig, GardenEditor};
use crate::entitlement::Entitlements;
use crate::input::PointerEvent;
use crate::scene::{Point, Theme};
use crate::storage::MemoryStore;

pub struct GardenApp {
    editor: GardenEditor,
    texture: Option<egui::TextureHandle>,
    brush: f32,
    volume: f32,
    muted: bool,
    chime_rate: f32,
    status: String,
}

impl GardenApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let _ = env_logger::try_init();
        let editor = GardenEditor::new(
            1280,
            720,
            EditorConfig::default(),
            Entitlements::from_clock(false),
            Box::new(MemoryStore::new()),
        );
        let brush = editor.scene().brush;
        Self {
            editor,
            texture: None,
            brush,
            volume: 0.8,
            muted: false,
            chime_rate: 12.0,
            status: String::new(),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for theme in Theme::ALL {
                if ui
                    .selectable_label(self.editor.scene().theme == theme, theme.label())
                    .clicked()
                {
                    self.editor.set_theme(theme);
                }
            }
            ui.separator();

            ui.menu_button("Add item", |ui| {
                for kind in self.editor.allowed_kinds() {
                    if ui.button(kind.label()).clicked() {
                        self.editor.add_item(kind);
                        ui.close_menu();
                    }
                }
            });
            if ui.button("Remove").clicked() {
                self.editor.remove_selected();
            }
            if ui.button("Clear sand").clicked() {
                self.editor.clear_paths();
            }
            ui.separator();

            if ui
                .selectable_label(self.editor.scene().winter_mode, "Winter")
                .clicked()
            {
                self.editor.toggle_winter();
            }
            ui.separator();

            if ui
                .add_enabled(self.editor.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.editor.undo();
            }
            if ui
                .add_enabled(self.editor.can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.editor.redo();
            }
            ui.separator();

            if ui.button("Save").clicked() {
                if let Err(err) = self.editor.save_local() {
                    log::error!("save failed: {err}");
                }
            }
            if ui.button("Load").clicked() {
                self.editor.load_local();
            }
            if ui.button("Export PNG").clicked() {
                match self.editor.export_image() {
                    Ok(png) => log::info!("exported {} bytes", png.len()),
                    Err(err) => log::error!("export failed: {err}"),
                }
            }
            ui.separator();

            ui.label("Brush:");
            if ui
                .add(egui::Slider::new(&mut self.brush, 4.0..=32.0))
                .drag_stopped()
            {
                self.editor.set_brush(self.brush);
            }
            ui.label("Volume:");
            if ui
                .add(egui::Slider::new(&mut self.volume, 0.0..=1.0))
                .changed()
            {
                self.editor.audio().set_master_volume(self.volume);
            }
            if ui.checkbox(&mut self.muted, "Mute").changed() {
                self.editor.audio().set_muted(self.muted);
            }
            ui.label("Chimes:");
            if ui
                .add(egui::Slider::new(&mut self.chime_rate, 4.0..=60.0).suffix("s"))
                .changed()
            {
                self.editor.audio().set_chime_interval(self.chime_rate);
            }
        });
    }

    fn forward_pointer(&mut self, response: &egui::Response) {
        let origin = response.rect.min;
        let to_point = |pos: egui::Pos2| Point::new(pos.x - origin.x, pos.y - origin.y);
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.editor.pointer_event(PointerEvent::Down(to_point(pos)));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.editor.pointer_event(PointerEvent::Move(to_point(pos)));
            }
        }
        if response.drag_stopped() {
            match response.interact_pointer_pos() {
                Some(pos) => self.editor.pointer_event(PointerEvent::Up(to_point(pos))),
                None => self.editor.pointer_event(PointerEvent::UpOutside),
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (undo, redo, delete) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift,
                i.modifiers.command
                    && (i.key_pressed(egui::Key::Y)
                        || (i.modifiers.shift && i.key_pressed(egui::Key::Z))),
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
            )
        });
        if undo {
            self.editor.undo();
        }
        if redo {
            self.editor.redo();
        }
        if delete {
            self.editor.remove_selected();
        }
    }
}

impl eframe::App for GardenApp {
    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        if let Err(err) = self.editor.save_local() {
            log::error!("save on shutdown failed: {err}");
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let available = ui.available_size();
                let (response, painter) =
                    ui.allocate_painter(available, egui::Sense::click_and_drag());

                self.editor
                    .resize(available.x.max(1.0) as u32, available.y.max(1.0) as u32);
                self.forward_pointer(&response);

                let rendered = self.editor.frame();
                if rendered || self.texture.is_none() {
                    let image = self.editor.color_image();
                    match &mut self.texture {
                        Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                        None => {
                            self.texture = Some(ctx.load_texture(
                                "garden-frame",
                                image,
                                egui::TextureOptions::LINEAR,
                            ));
                        }
                    }
                }
                if let Some(texture) = &self.texture {
                    painter.image(
                        texture.id(),
                        response.rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
            });

        for notice in self.editor.take_notices() {
            self.status = notice.to_string();
        }
        if !self.status.is_empty() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.label(&self.status);
            });
        }
    }
}
