mod audio;
mod renderer;
mod session;
mod tracks;
mod utils;

use audio::{NullTransport, RodioTransport, Transport};
use nannou::prelude::*;
use session::{VisualizerSession, SEEK_STEP, VOLUME_STEP};
use std::env;
use utils::{format_time, Config};

fn main() {
    nannou::app(model).update(update).run();
}

struct Model {
    session: VisualizerSession,
}

fn model(app: &App) -> Model {
    let config = Config::load();

    // An explicit path argument beats the configured track file
    let tracks_path = env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.tracks_file());
    let tracks = tracks::load_tracks(&tracks_path);

    let transport: Box<dyn Transport> = match RodioTransport::new() {
        Some(t) => Box::new(t),
        None => {
            eprintln!("Running without audio output");
            Box::new(NullTransport)
        }
    };

    let mut win = app
        .new_window()
        .title("pulse-viz")
        .view(view)
        .key_pressed(key_pressed)
        .size(1280, 800);

    if config.fullscreen() {
        win = win.fullscreen();
    }

    win.build().unwrap();

    Model {
        session: VisualizerSession::new(
            tracks,
            transport,
            config.particle_count(),
            config.default_volume(),
        ),
    }
}

fn update(_app: &App, model: &mut Model, _update: Update) {
    model.session.update();
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let bounds = app.window_rect();

    model.session.draw(&draw, bounds);
    draw_hud(&draw, bounds, &model.session);

    draw.to_frame(app, &frame).unwrap();
}

fn draw_hud(draw: &Draw, bounds: Rect, session: &VisualizerSession) {
    let Some(track) = session.current_track() else {
        return;
    };

    let padding = 20.0;
    let line_height = 22.0;
    let font_size = 16;
    let text_left = bounds.left() + padding;

    let title_y = bounds.bottom() + padding + line_height;
    draw.text(&track.title)
        .xy(pt2(text_left, title_y))
        .wh(pt2(bounds.w(), line_height).into())
        .left_justify()
        .no_line_wrap()
        .color(rgb(1.0, 1.0, 1.0))
        .font_size(font_size);

    let state = if session.is_playing() { "" } else { " [paused]" };
    let time_text = format!(
        "{} / {}{}",
        format_time(session.current_time().as_secs_f32()),
        format_time(session.duration().as_secs_f32()),
        state
    );
    let time_y = title_y - line_height;
    draw.text(&time_text)
        .xy(pt2(text_left, time_y))
        .wh(pt2(bounds.w(), line_height).into())
        .left_justify()
        .no_line_wrap()
        .color(rgba(1.0, 1.0, 1.0, 0.6))
        .font_size(font_size);

    // Thin progress bar along the bottom edge
    if let Some(fraction) = session.playback_fraction() {
        let bar_w = bounds.w() - padding * 2.0;
        let bar_y = bounds.bottom() + padding * 0.5;
        draw.line()
            .start(pt2(text_left, bar_y))
            .end(pt2(text_left + bar_w, bar_y))
            .color(rgba(1.0, 1.0, 1.0, 0.15))
            .weight(2.0);
        draw.line()
            .start(pt2(text_left, bar_y))
            .end(pt2(text_left + bar_w * fraction, bar_y))
            .color(rgba(1.0, 1.0, 1.0, 0.6))
            .weight(2.0);
    }
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    match key {
        Key::Q => app.quit(),
        Key::Space => model.session.toggle_play(),
        Key::R => model.session.replay(),
        Key::M => model.session.toggle_mute(),
        Key::Left => model.session.seek_by(-SEEK_STEP),
        Key::Right => model.session.seek_by(SEEK_STEP),
        Key::Up => model.session.adjust_volume(VOLUME_STEP),
        Key::Down => model.session.adjust_volume(-VOLUME_STEP),
        _ => {
            if let Some(index) = digit_key(key) {
                model.session.set_active_track(index);
            }
        }
    }
}

/// Map the number row to track indices: `1` selects the first track, `0`
/// the tenth.
fn digit_key(key: Key) -> Option<usize> {
    match key {
        Key::Key1 => Some(0),
        Key::Key2 => Some(1),
        Key::Key3 => Some(2),
        Key::Key4 => Some(3),
        Key::Key5 => Some(4),
        Key::Key6 => Some(5),
        Key::Key7 => Some(6),
        Key::Key8 => Some(7),
        Key::Key9 => Some(8),
        Key::Key0 => Some(9),
        _ => None,
    }
}
