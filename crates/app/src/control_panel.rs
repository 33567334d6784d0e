//! Operator window: image list, settings and fog controls

use crate::textures::TextureCache;
use display::RawWindow;
use dmtool::settings::{MAX_REVEAL_SIZE, MIN_REVEAL_SIZE};
use dmtool::AppState;
use eframe::egui;
use gallery::{is_supported_image, ImageId};
use overlay::OverlayPlacement;
use std::path::PathBuf;

const THUMBNAIL_SIZE: f32 = 48.0;

/// What the panel asks the application to do after drawing
#[derive(Default)]
pub struct PanelOutput {
    /// Files to hand to the loader
    pub load: Vec<PathBuf>,
    /// New overlay placement the toolkit may have to apply
    pub moved: Option<OverlayPlacement>,
    pub exit: bool,
}

impl PanelOutput {
    fn placed(&mut self, placement: Option<OverlayPlacement>) {
        if placement.is_some() {
            self.moved = placement;
        }
    }
}

enum ImageAction {
    ToggleVisibility,
    Reposition,
    Remove,
}

#[derive(Default)]
pub struct ControlPanel {
    confirm_remove_all: bool,
}

impl ControlPanel {
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        state: &mut AppState,
        textures: &mut TextureCache,
        window: Option<RawWindow>,
    ) -> PanelOutput {
        let mut output = PanelOutput::default();
        output.load = dropped_images(ctx);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(state.status());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Exit").clicked() {
                        output.exit = true;
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("DMTool");
            ui.separator();

            self.image_buttons(ui, state, &mut output);
            if ctx.input(|i| !i.raw.hovered_files.is_empty()) {
                ui.colored_label(ui.visuals().warn_fg_color, "Drop images to add them");
            } else {
                ui.weak("Drag image files here to add them");
            }
            ui.add_space(6.0);

            egui::ScrollArea::vertical()
                .max_height(ui.available_height() * 0.5)
                .auto_shrink([false, true])
                .show(ui, |ui| image_list(ui, ctx, state, textures));

            ui.separator();
            settings_section(ui, state, window, &mut output);
        });

        if self.confirm_remove_all {
            egui::Window::new("Remove all images?")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("{} images will be removed from the table.", state.images().len()));
                    ui.horizontal(|ui| {
                        if ui.button("Remove all").clicked() {
                            state.remove_all();
                            self.confirm_remove_all = false;
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_remove_all = false;
                        }
                    });
                });
        }

        if !output.load.is_empty() {
            state.set_status(format!("Loading {} image(s)", output.load.len()));
        }
        output
    }

    fn image_buttons(&mut self, ui: &mut egui::Ui, state: &mut AppState, output: &mut PanelOutput) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Add images…").clicked() {
                output.load.extend(pick_images());
            }
            let has_images = !state.images().is_empty();
            if ui.add_enabled(has_images, egui::Button::new("Show all")).clicked() {
                state.set_all_visible(true);
            }
            if ui.add_enabled(has_images, egui::Button::new("Hide all")).clicked() {
                state.set_all_visible(false);
            }
            if ui.add_enabled(has_images, egui::Button::new("Remove all")).clicked() {
                self.confirm_remove_all = true;
            }
        });
    }
}

fn image_list(ui: &mut egui::Ui, ctx: &egui::Context, state: &mut AppState, textures: &mut TextureCache) {
    if state.images().is_empty() {
        ui.label("No images loaded");
        return;
    }

    let mut actions: Vec<(ImageId, ImageAction)> = Vec::new();
    for record in state.images().iter() {
        ui.horizontal(|ui| {
            let texture = textures.image(ctx, record);
            let bitmap = record.bitmap();
            let fit = THUMBNAIL_SIZE / bitmap.long_edge() as f32;
            let size = egui::vec2(bitmap.width as f32 * fit, bitmap.height as f32 * fit);
            ui.add(egui::Image::from_texture(egui::load::SizedTexture::new(texture, size)));

            ui.vertical(|ui| {
                let name = egui::RichText::new(record.file_name());
                ui.label(if record.visible { name } else { name.weak() });
                ui.horizontal(|ui| {
                    let toggle = if record.visible { "Hide" } else { "Show" };
                    if ui.small_button(toggle).clicked() {
                        actions.push((record.id(), ImageAction::ToggleVisibility));
                    }
                    if ui.small_button("Reposition").clicked() {
                        actions.push((record.id(), ImageAction::Reposition));
                    }
                    if ui.small_button("Remove").clicked() {
                        actions.push((record.id(), ImageAction::Remove));
                    }
                });
            });
        });
    }

    for (id, action) in actions {
        match action {
            ImageAction::ToggleVisibility => {
                state.toggle_visibility(id);
            }
            ImageAction::Reposition => {
                state.reposition(id);
            }
            ImageAction::Remove => {
                state.remove(id);
            }
        }
    }
}

fn settings_section(
    ui: &mut egui::Ui,
    state: &mut AppState,
    window: Option<RawWindow>,
    output: &mut PanelOutput,
) {
    let config = state.settings().config().clone();

    egui::Grid::new("settings")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Max image size");
            let mut max_size = config.max_image_size;
            if ui
                .add(egui::Slider::new(&mut max_size, state.max_image_size_range()).suffix(" px"))
                .changed()
            {
                state.change_settings(window, |s| s.set_max_image_size(max_size));
            }
            ui.end_row();

            ui.label("Fog of war");
            ui.horizontal(|ui| {
                let mut enabled = config.enable_fog_of_war;
                if ui.checkbox(&mut enabled, "Enabled").changed() {
                    state.change_settings(window, |s| s.set_fog_enabled(enabled));
                }
                if ui
                    .add_enabled(enabled, egui::Button::new("Reset fog"))
                    .clicked()
                {
                    state.reset_fog();
                }
            });
            ui.end_row();

            ui.label("Reveal size");
            let mut reveal = config.fog_reveal_size;
            if ui
                .add(egui::Slider::new(&mut reveal, MIN_REVEAL_SIZE..=MAX_REVEAL_SIZE).suffix(" px"))
                .changed()
            {
                state.change_settings(window, |s| s.set_fog_reveal_size(reveal));
            }
            ui.end_row();

            ui.label("Overlay display");
            let mut target = config.target_display_index;
            let selected = display_choice_label(state, target);
            egui::ComboBox::from_id_source("target-display")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut target, -1, "Automatic");
                    for display in state.displays() {
                        ui.selectable_value(&mut target, display.index as i32, display.label());
                    }
                });
            if target != config.target_display_index {
                output.placed(state.change_settings(window, |s| s.set_target_display_index(target)));
            }
            ui.end_row();

            ui.label("Offset");
            ui.horizontal(|ui| {
                let (mut x, mut y) = (config.offset_x, config.offset_y);
                let changed_x = ui.add(egui::DragValue::new(&mut x).prefix("x ")).changed();
                let changed_y = ui.add(egui::DragValue::new(&mut y).prefix("y ")).changed();
                if changed_x || changed_y {
                    output.placed(state.change_settings(window, |s| s.set_offset(x, y)));
                }
            });
            ui.end_row();

            ui.label("Debug info");
            let mut debug = config.show_debug_info;
            if ui.checkbox(&mut debug, "Show on overlay").changed() {
                state.change_settings(window, |s| s.set_show_debug_info(debug));
            }
            ui.end_row();

            ui.label("Explorer");
            let mut context_menu = config.install_context_menu;
            if ui.checkbox(&mut context_menu, "Context menu entry").changed() {
                state.change_settings(window, |s| s.set_install_context_menu(context_menu));
            }
            ui.end_row();
        });
}

fn display_choice_label(state: &AppState, index: i32) -> String {
    if index < 0 {
        return "Automatic".to_string();
    }
    state
        .displays()
        .get(index as usize)
        .map(|d| d.label())
        .unwrap_or_else(|| format!("Display {} (not connected)", index + 1))
}

pub fn dropped_images(ctx: &egui::Context) -> Vec<PathBuf> {
    ctx.input(|i| {
        i.raw
            .dropped_files
            .iter()
            .filter_map(|file| file.path.clone())
            .filter(|path| is_supported_image(path))
            .collect()
    })
}

#[cfg(windows)]
fn pick_images() -> Vec<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", gallery::decode::SUPPORTED_EXTENSIONS)
        .set_title("Add images")
        .pick_files()
        .unwrap_or_default()
}

#[cfg(not(windows))]
fn pick_images() -> Vec<PathBuf> {
    tracing::info!("no file picker on this platform, drop files onto a window instead");
    Vec::new()
}
