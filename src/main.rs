//! Demo: replays a scripted touch session against a composition, prints the
//! resulting scene and writes a thumbnail
//!
//! Usage: `sticker-canvas [--settings <file.json>] [--font <file.ttf>] [--out <dir>]`

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use tiny_skia::{Color, Pixmap};
use tracing::{info, warn};

use sticker_canvas::app::{Composition, CompositionEvent, MotionController};
use sticker_canvas::config::{ScreenMetrics, Settings};
use sticker_canvas::domain::core::{CanvasSize, Point};
use sticker_canvas::domain::entity::Entity;
use sticker_canvas::domain::layer::{Font, Layer, TextLayer};
use sticker_canvas::domain::raster::ImageSource;
use sticker_canvas::input::{Pointer, TouchAction, TouchEvent};
use sticker_canvas::ui::{FontProvider, GlyphTextRenderer, PngImageLoader};

const CANVAS_WIDTH: u32 = 1080;
const CANVAS_HEIGHT: u32 = 1350;
const FALLBACK_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Parser, Debug)]
#[command(name = "sticker-canvas", about = "Replays a scripted touch session on a sticker composition")]
struct Args {
    /// JSON file with gesture and composition settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// TrueType font for the text sticker
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory the thumbnail is written to
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

/// Checkerboard used as the demo sticker
fn checkerboard(width: u32, height: u32, cell: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    pixmap.fill(Color::from_rgba8(255, 193, 7, 255));
    let dark = tiny_skia::Paint {
        shader: tiny_skia::Shader::SolidColor(Color::from_rgba8(33, 33, 33, 255)),
        ..tiny_skia::Paint::default()
    };
    for row in 0..height.div_ceil(cell) {
        for col in (row % 2..width.div_ceil(cell)).step_by(2) {
            let rect = tiny_skia::Rect::from_xywh(
                (col * cell) as f32,
                (row * cell) as f32,
                cell as f32,
                cell as f32,
            );
            if let Some(rect) = rect {
                pixmap.fill_rect(rect, &dark, tiny_skia::Transform::identity(), None);
            }
        }
    }
    Some(pixmap)
}

/// Scripted gestures, in screen pixels
fn touch_script() -> Vec<TouchEvent> {
    let one = |action, time, x, y| TouchEvent::new(action, time, vec![Pointer::new(0, x, y)]);
    let two = |action, time, a: (f32, f32), b: (f32, f32)| {
        TouchEvent::new(
            action,
            time,
            vec![Pointer::new(0, a.0, a.1), Pointer::new(1, b.0, b.1)],
        )
        .with_action_index(1)
    };

    vec![
        // Drag the text block up
        one(TouchAction::Down, 0, 540.0, 675.0),
        one(TouchAction::Move, 16, 540.0, 660.0),
        one(TouchAction::Move, 32, 540.0, 560.0),
        one(TouchAction::Move, 48, 540.0, 475.0),
        one(TouchAction::Up, 64, 540.0, 475.0),
        // Tap the sticker to select it
        one(TouchAction::Down, 1000, 540.0, 900.0),
        one(TouchAction::Up, 1060, 540.0, 900.0),
        // Pinch out while twisting
        one(TouchAction::Down, 2000, 440.0, 900.0),
        two(TouchAction::PointerDown, 2010, (440.0, 900.0), (640.0, 900.0)),
        two(TouchAction::Move, 2026, (420.0, 880.0), (660.0, 920.0)),
        two(TouchAction::Move, 2042, (400.0, 860.0), (680.0, 940.0)),
        two(TouchAction::PointerUp, 2058, (400.0, 860.0), (680.0, 940.0)),
        one(TouchAction::Up, 2074, 400.0, 860.0),
        // Double tap the sticker
        one(TouchAction::Down, 3000, 540.0, 900.0),
        one(TouchAction::Up, 3040, 540.0, 900.0),
        one(TouchAction::Down, 3150, 540.0, 900.0),
        one(TouchAction::Up, 3190, 540.0, 900.0),
    ]
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let canvas = CanvasSize::new(CANVAS_WIDTH, CANVAS_HEIGHT)?;
    let mut composition = Composition::new(canvas, settings.composition.clone())?;
    composition.set_event_handler(|event| match event {
        CompositionEvent::EntitySelected(Some(id)) => info!(%id, "selected"),
        CompositionEvent::EntitySelected(None) => info!("selection cleared"),
        CompositionEvent::EntityDoubleTap(id) => info!(%id, "double tapped"),
    });

    let mut loader = PngImageLoader::new();
    let sticker = checkerboard(600, 400, 50).ok_or("failed to allocate sticker")?;
    loader.register_resource("checkerboard", sticker);

    let image = Entity::load_image(
        Layer::new(),
        ImageSource::Resource { name: "checkerboard".into() },
        &loader,
        canvas,
    )?;
    composition.add_entity_and_position(image);
    composition.handle_translate(Point::new(0.0, 225.0));

    let mut fonts = FontProvider::new();
    let font_path = args.font.clone().unwrap_or_else(|| PathBuf::from(FALLBACK_FONT));
    fonts.register_file("sans", &font_path);
    let renderer = GlyphTextRenderer::new(&fonts);

    let text = TextLayer::new("Hello, sticker canvas!", Font::default());
    match Entity::text(text, canvas, &renderer) {
        Ok(entity) => {
            composition.add_entity_and_position(entity);
        }
        Err(e) => warn!(font = %font_path.display(), error = %e, "skipping text entity"),
    }

    let mut controller = MotionController::new(
        &settings.gesture,
        ScreenMetrics::new(CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32),
    );
    for event in touch_script() {
        controller.on_touch_event(&event, &mut composition);
    }

    for entity in composition.entities() {
        let layer = entity.layer();
        info!(
            id = %entity.id(),
            kind = entity.kind().label(),
            x = layer.x,
            y = layer.y,
            scale = layer.scale(),
            rotation = layer.rotation_in_degrees(),
            "entity"
        );
    }

    let json = composition.serialize().to_json()?;
    println!("{json}");

    let mut restored = Composition::new(canvas, settings.composition.clone())?;
    restored.restore_json(&json, &loader, &renderer)?;
    info!(entities = restored.len(), "scene round-tripped");

    let thumbnail = restored.thumbnail()?;
    let path = args.out.join("thumbnail.png");
    save(&thumbnail, &path)?;
    info!(path = %path.display(), "thumbnail written");

    composition.clear();
    restored.release();
    Ok(())
}

fn save(pixmap: &Pixmap, path: &Path) -> Result<(), Box<dyn Error>> {
    pixmap
        .save_png(path)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("sticker-canvas: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "sticker-canvas",
            "--settings",
            "tuning.json",
            "--font",
            "sans.ttf",
            "--out",
            "/tmp/render",
        ])
        .unwrap();
        assert_eq!(args.settings, Some(PathBuf::from("tuning.json")));
        assert_eq!(args.font, Some(PathBuf::from("sans.ttf")));
        assert_eq!(args.out, PathBuf::from("/tmp/render"));
    }

    #[test]
    fn defaults_and_rejections() {
        let args = Args::try_parse_from(["sticker-canvas"]).unwrap();
        assert!(args.settings.is_none());
        assert!(args.font.is_none());
        assert_eq!(args.out, PathBuf::from("."));

        assert!(Args::try_parse_from(["sticker-canvas", "--bogus"]).is_err());
        assert!(Args::try_parse_from(["sticker-canvas", "--settings"]).is_err());
    }
}
