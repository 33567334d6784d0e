//! Player-facing overlay: images, fog layer and debug text

use crate::textures::TextureCache;
use dmtool::AppState;
use eframe::egui;
use egui::{emath::Rot2, pos2, vec2, Color32, FontId, Painter, Pos2, Rect};
use gallery::ImageRecord;
use overlay::Point;

const FULL_UV: Rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));

/// Draw the overlay into the root viewport
pub fn show(ctx: &egui::Context, state: &mut AppState, textures: &mut TextureCache) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::BLACK))
        .show(ctx, |ui| {
            let rect = ui.max_rect();
            let origin = rect.min;
            let painter = ui.painter().clone();

            for record in state.images().iter().filter(|r| r.visible) {
                let texture = textures.image(ctx, record);
                painter.add(image_mesh(texture, record, origin));
            }

            if state.fog().is_active() {
                if let Some(texture) = textures.fog(ctx, state.fog_mut()) {
                    let (width, height) = state.fog().size();
                    let fog_rect = Rect::from_min_size(origin, vec2(width as f32, height as f32));
                    painter.image(texture, fog_rect, FULL_UV, Color32::WHITE);
                }
                handle_fog_input(ui, rect, state);
            }

            if let Some(text) = state.debug_text() {
                paint_debug(&painter, origin, text);
            }
        });
}

/// Textured quad rotated about the record's anchor
fn image_mesh(texture: egui::TextureId, record: &ImageRecord, origin: Pos2) -> egui::Shape {
    let (width, height) = record.scaled_size();
    let anchor = origin + vec2(record.x, record.y);

    let mut mesh = egui::Mesh::with_texture(texture);
    mesh.add_rect_with_uv(
        Rect::from_min_size(anchor, vec2(width, height)),
        FULL_UV,
        Color32::WHITE,
    );
    mesh.rotate(Rot2::from_angle(record.rotation.to_radians()), anchor);
    egui::Shape::mesh(mesh)
}

/// Press erases, drag strokes, release ends the stroke
fn handle_fog_input(ui: &egui::Ui, rect: Rect, state: &mut AppState) {
    let response = ui.interact(rect, ui.id().with("fog"), egui::Sense::click_and_drag());
    let (pressed, down, released, pos) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_down(),
            i.pointer.primary_released(),
            i.pointer.interact_pos(),
        )
    });
    let local = |p: Pos2| Point::new(p.x - rect.min.x, p.y - rect.min.y);

    let fog = state.fog_mut();
    match pos {
        Some(p) if pressed && rect.contains(p) => {
            fog.begin_stroke(local(p));
        }
        Some(p) if down && !pressed => {
            fog.stroke_to(local(p));
        }
        _ => {}
    }
    if released {
        fog.end_stroke();
    }

    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
    }
}

fn paint_debug(painter: &Painter, origin: Pos2, text: &str) {
    let galley = painter.layout(
        text.to_owned(),
        FontId::monospace(14.0),
        Color32::WHITE,
        640.0,
    );
    let pos = origin + vec2(12.0, 12.0);
    painter.rect_filled(
        Rect::from_min_size(pos, galley.size()).expand(6.0),
        4.0,
        Color32::from_black_alpha(180),
    );
    painter.galley(pos, galley, Color32::WHITE);
}
