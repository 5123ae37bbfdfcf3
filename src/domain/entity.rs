//! Entities and the transform engine
//!
//! An [`Entity`] is one image or text block on the canvas. All kinds share
//! the same transform record (layer, canvas snapshot, holy scale, border,
//! selection, raster) and the same matrix / hit-testing code; only raster
//! generation differs per [`EntityKind`].
//!
//! ## Transform order
//!
//! The entity matrix is `L = S * R * T * S'` where `S` scales and `R`
//! rotates around the entity center, `T` moves the content to its top-left
//! position and `S'` applies the holy scale. Each factor is
//! pre-concatenated, so the holy scale is applied to content points first
//! and the layer scale last. Any other order rotates or scales around the
//! canvas origin instead of the entity center.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::domain::core::{matrix_values, CanvasError, CanvasSize, Point, Quad};
use crate::domain::layer::{Layer, TextLayer};
use crate::domain::raster::{
    new_pixmap, with_alpha, Canvas, DrawPaint, ImageLoader, ImageSource, RasterError,
    TextRasterizer,
};
use crate::domain::record::{EntityRecord, PaintData};

/// Entity-level errors
#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Stable identifier of an entity within a composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind-specific part of an entity: its layer plus content description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Image { layer: Layer, source: ImageSource },
    Text(TextLayer),
}

impl EntityKind {
    pub fn layer(&self) -> &Layer {
        match self {
            EntityKind::Image { layer, .. } => layer,
            EntityKind::Text(text) => &text.layer,
        }
    }

    pub fn layer_mut(&mut self) -> &mut Layer {
        match self {
            EntityKind::Image { layer, .. } => layer,
            EntityKind::Text(text) => &mut text.layer,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Image { .. } => "image",
            EntityKind::Text(_) => "text",
        }
    }
}

/// One image or text block placed on the canvas
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    canvas: CanvasSize,
    /// Fit factor from content pixels to canvas pixels at unit layer scale
    holy_scale: f32,
    border: PaintData,
    selected: bool,
    /// None once released
    raster: Option<Pixmap>,
    content_width: u32,
    content_height: u32,
    /// Content bounds in local, pre-transform space
    src_quad: Quad,
}

impl Entity {
    /// Creates an image entity from already decoded pixels
    ///
    /// The holy scale fits the image inside the canvas on its tighter axis.
    pub fn image(layer: Layer, source: ImageSource, image: Pixmap, canvas: CanvasSize) -> Self {
        let width = image.width() as f32;
        let height = image.height() as f32;
        let holy_scale = (canvas.w() / width).min(canvas.h() / height);

        Self::from_parts(
            EntityKind::Image { layer, source },
            canvas,
            holy_scale,
            image,
        )
    }

    /// Creates an image entity, decoding its pixels through the loader
    pub fn load_image(
        layer: Layer,
        source: ImageSource,
        loader: &dyn ImageLoader,
        canvas: CanvasSize,
    ) -> Result<Self, EntityError> {
        let image = loader.load(&source)?;
        Ok(Self::image(layer, source, image, canvas))
    }

    /// Creates a text entity, rendering its raster immediately
    ///
    /// Text always spans the canvas width, so the holy scale is
    /// `canvas width / raster width`.
    pub fn text(
        text_layer: TextLayer,
        canvas: CanvasSize,
        rasterizer: &dyn TextRasterizer,
    ) -> Result<Self, EntityError> {
        let raster = render_text_raster(&text_layer, canvas, rasterizer, None)?;
        let holy_scale = canvas.w() / raster.width() as f32;
        Ok(Self::from_parts(
            EntityKind::Text(text_layer),
            canvas,
            holy_scale,
            raster,
        ))
    }

    fn from_parts(kind: EntityKind, canvas: CanvasSize, holy_scale: f32, raster: Pixmap) -> Self {
        let content_width = raster.width();
        let content_height = raster.height();
        Self {
            id: EntityId::default(),
            kind,
            canvas,
            holy_scale,
            border: PaintData::default(),
            selected: false,
            raster: Some(raster),
            content_width,
            content_height,
            src_quad: Quad::from_size(content_width as f32, content_height as f32),
        }
    }

    /// Rebuilds an entity from a persisted record
    ///
    /// The persisted holy scale and canvas size are reused as-is; only the
    /// raster is regenerated (image reloaded, text re-rendered).
    pub fn from_record(
        record: &EntityRecord,
        loader: &dyn ImageLoader,
        rasterizer: &dyn TextRasterizer,
    ) -> Result<Self, EntityError> {
        let mut kind = record.kind().clone();
        kind.layer_mut().normalize();
        if let EntityKind::Text(text) = &mut kind {
            let size = text.font.size();
            text.font.set_size(size);
        }

        let raster = match &kind {
            EntityKind::Image { source, .. } => loader.load(source)?,
            EntityKind::Text(text) => render_text_raster(text, record.canvas(), rasterizer, None)?,
        };

        let mut entity = Self::from_parts(kind, record.canvas(), record.holy_scale(), raster);
        entity.border = record.border();
        Ok(entity)
    }

    /// Snapshot of this entity for persistence
    pub fn serialize(&self) -> EntityRecord {
        EntityRecord::new(
            self.kind.clone(),
            matrix_values(&self.matrix()),
            self.holy_scale,
            self.canvas,
            self.border,
        )
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn layer(&self) -> &Layer {
        self.kind.layer()
    }

    pub fn layer_mut(&mut self) -> &mut Layer {
        self.kind.layer_mut()
    }

    /// Text layer, if this is a text entity
    pub fn text_layer(&self) -> Option<&TextLayer> {
        match &self.kind {
            EntityKind::Text(text) => Some(text),
            EntityKind::Image { .. } => None,
        }
    }

    /// Mutable text layer; call [`Entity::update_text`] after editing
    pub fn text_layer_mut(&mut self) -> Option<&mut TextLayer> {
        match &mut self.kind {
            EntityKind::Text(text) => Some(text),
            EntityKind::Image { .. } => None,
        }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn holy_scale(&self) -> f32 {
        self.holy_scale
    }

    /// Content width in pixels
    pub fn width(&self) -> u32 {
        self.content_width
    }

    /// Content height in pixels
    pub fn height(&self) -> u32 {
        self.content_height
    }

    pub fn border(&self) -> PaintData {
        self.border
    }

    pub fn set_border(&mut self, border: PaintData) {
        self.border = border;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Current raster, None once released
    pub fn raster(&self) -> Option<&Pixmap> {
        self.raster.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.raster.is_none()
    }

    /// Frees the raster; returns false if it was already released
    pub fn release(&mut self) -> bool {
        self.raster.take().is_some()
    }

    /// Computes the entity's affine matrix from its layer
    pub fn matrix(&self) -> Transform {
        let layer = self.layer();
        let top_left_x = layer.x * self.canvas.w();
        let top_left_y = layer.y * self.canvas.h();
        let center = self.absolute_center();

        let mut rotation = layer.rotation_in_degrees();
        let mut scale_x = layer.scale();
        let scale_y = layer.scale();
        if layer.flipped {
            rotation = -rotation;
            scale_x = -scale_x;
        }

        Transform::identity()
            .pre_concat(scale_around(scale_x, scale_y, center))
            .pre_concat(rotate_around(rotation, center))
            .pre_concat(Transform::from_translate(top_left_x, top_left_y))
            .pre_concat(Transform::from_scale(self.holy_scale, self.holy_scale))
    }

    /// Center of the entity in canvas pixels, ignoring scale and rotation
    /// (both keep the center fixed)
    pub fn absolute_center(&self) -> Point {
        let layer = self.layer();
        Point::new(
            layer.x * self.canvas.w() + self.content_width as f32 * self.holy_scale * 0.5,
            layer.y * self.canvas.h() + self.content_height as f32 * self.holy_scale * 0.5,
        )
    }

    /// Moves the entity so its center lands on the given canvas point
    pub fn move_center_to(&mut self, target: Point) {
        let current = self.absolute_center();
        let canvas = self.canvas;
        self.layer_mut().post_translate(
            (target.x - current.x) / canvas.w(),
            (target.y - current.y) / canvas.h(),
        );
    }

    pub fn move_to_canvas_center(&mut self) {
        self.move_center_to(self.canvas.center());
    }

    /// Content bounds mapped to canvas space
    pub fn screen_quad(&self) -> Quad {
        self.src_quad.transformed(&self.matrix())
    }

    /// Returns true if the canvas point is inside the transformed content
    pub fn contains_point(&self, point: Point) -> bool {
        self.screen_quad().contains(point)
    }

    /// Draws the content and, when selected, the border
    ///
    /// If a paint override is given its opacity also applies to the border.
    pub fn draw(&self, canvas: &mut dyn Canvas, paint: Option<&DrawPaint>) {
        let matrix = self.matrix();

        if let Some(raster) = &self.raster {
            canvas.draw_image(raster, matrix, paint);
        }

        if self.selected {
            let color = match paint {
                Some(p) => with_alpha(self.border.color, p.alpha8()),
                None => self.border.color,
            };
            let quad = self.src_quad.transformed(&matrix);
            canvas.draw_lines(&quad.edges(), self.border.stroke_width, color);
        }
    }

    /// Re-renders a text entity after its text or font changed
    ///
    /// The previous raster is reused when the new one has the same size and
    /// released otherwise. The entity keeps its absolute center. Image
    /// entities are left untouched.
    pub fn update_text(&mut self, rasterizer: &dyn TextRasterizer) -> Result<(), EntityError> {
        let old_center = self.absolute_center();
        let canvas = self.canvas;
        let reuse = self.raster.take();

        let EntityKind::Text(text) = &self.kind else {
            self.raster = reuse;
            return Ok(());
        };

        let raster = render_text_raster(text, canvas, rasterizer, reuse)?;
        self.content_width = raster.width();
        self.content_height = raster.height();
        self.holy_scale = canvas.w() / raster.width() as f32;
        self.src_quad = Quad::from_size(self.content_width as f32, self.content_height as f32);
        self.raster = Some(raster);

        self.move_center_to(old_center);
        Ok(())
    }
}

/// Renders a text layer into a canvas-wide raster
///
/// The raster is never shorter than `MIN_BITMAP_HEIGHT` of the canvas; text
/// shorter than that is vertically centered.
fn render_text_raster(
    text_layer: &TextLayer,
    canvas: CanvasSize,
    rasterizer: &dyn TextRasterizer,
    reuse: Option<Pixmap>,
) -> Result<Pixmap, EntityError> {
    let bounds_width = canvas.width();
    let rendered = rasterizer.measure_and_render(&text_layer.text, &text_layer.font, bounds_width)?;
    let text_height = rendered.height;

    let min_height = TextLayer::MIN_BITMAP_HEIGHT.max(text_height as f32 / canvas.h());
    let bmp_height = ((canvas.h() * min_height).round() as u32).max(1);

    let mut bmp = match reuse {
        Some(mut previous) if previous.width() == bounds_width && previous.height() == bmp_height => {
            previous.fill(Color::TRANSPARENT);
            previous
        }
        _ => new_pixmap(bounds_width, bmp_height)?,
    };

    let offset_y = if text_height < bmp_height {
        ((bmp_height - text_height) / 2) as i32
    } else {
        0
    };

    bmp.draw_pixmap(
        0,
        offset_y,
        rendered.pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    Ok(bmp)
}

/// Scale around a pivot: `T(p) * S * T(-p)`
fn scale_around(sx: f32, sy: f32, pivot: Point) -> Transform {
    Transform::from_row(sx, 0.0, 0.0, sy, pivot.x - sx * pivot.x, pivot.y - sy * pivot.y)
}

/// Rotation (degrees, clockwise on a y-down canvas) around a pivot
fn rotate_around(degrees: f32, pivot: Point) -> Transform {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Transform::from_row(
        cos,
        sin,
        -sin,
        cos,
        pivot.x - cos * pivot.x + sin * pivot.y,
        pivot.y - sin * pivot.x - cos * pivot.y,
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::layer::Font;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    /// Entity sized to match the canvas 1:1 at the origin
    fn unit_entity() -> Entity {
        // 500x400 on a 1000x800 canvas gives a holy scale of exactly 2
        let mut entity = image_entity(500, 400);
        entity.layer_mut().set_scale(0.5).unwrap();
        entity
    }

    #[test]
    fn image_holy_scale_fits_tighter_axis() {
        let entity = image_entity(2000, 400);
        assert!(approx(entity.holy_scale(), 0.5));
        let entity = image_entity(100, 400);
        assert!(approx(entity.holy_scale(), 2.0));
    }

    #[test]
    fn identity_layer_maps_through_holy_scale() {
        let entity = image_entity(500, 400);
        let quad = entity.screen_quad();
        assert!(approx(quad.points[0].x, 0.0));
        assert!(approx(quad.points[2].x, 1000.0));
        assert!(approx(quad.points[2].y, 800.0));
    }

    #[test]
    fn absolute_center_and_move() {
        let mut entity = image_entity(500, 400);
        assert_eq!(entity.absolute_center(), Point::new(500.0, 400.0));

        entity.move_center_to(Point::new(600.0, 500.0));
        assert!(approx(entity.layer().x, 0.1));
        assert!(approx(entity.layer().y, 0.125));

        entity.move_to_canvas_center();
        assert!(approx(entity.absolute_center().x, 500.0));
        assert!(approx(entity.absolute_center().y, 400.0));
    }

    #[test]
    fn scale_keeps_center_fixed() {
        let entity = unit_entity();
        let quad = entity.screen_quad();
        // Half scale around the (500, 400) center
        assert!(approx(quad.points[0].x, 250.0));
        assert!(approx(quad.points[0].y, 200.0));
        assert!(approx(quad.points[2].x, 750.0));
        assert!(approx(quad.points[2].y, 600.0));
    }

    #[test]
    fn hit_test_center_inside_and_borders_outside() {
        let entity = unit_entity();
        // Bounds are [250, 750] x [200, 600]
        assert!(entity.contains_point(Point::new(500.0, 400.0)));
        assert!(!entity.contains_point(Point::new(249.0, 400.0)));
        assert!(!entity.contains_point(Point::new(751.0, 400.0)));
        assert!(!entity.contains_point(Point::new(500.0, 199.0)));
        assert!(!entity.contains_point(Point::new(500.0, 601.0)));
    }

    #[test]
    fn hit_test_after_rotation() {
        let mut entity = unit_entity();
        let corner = Point::new(260.0, 210.0);
        assert!(entity.contains_point(corner));

        entity.layer_mut().post_rotate(45.0);
        assert!(!entity.contains_point(corner));
        assert!(entity.contains_point(Point::new(500.0, 400.0)));
        // Above the unrotated top edge, inside the rotated corner
        assert!(entity.contains_point(Point::new(500.0, 160.0)));
    }

    #[test]
    fn rotation_is_clockwise_about_center() {
        let mut entity = unit_entity();
        entity.layer_mut().post_rotate(90.0);
        let quad = entity.screen_quad();
        // Top-left corner (250, 200) rotates clockwise to the top-right area
        assert!(approx(quad.points[0].x, 700.0));
        assert!(approx(quad.points[0].y, 150.0));
    }

    #[test]
    fn flip_mirrors_around_vertical_centerline() {
        let mut entity = unit_entity();
        entity.layer_mut().flip();
        let quad = entity.screen_quad();
        // Local top-left now lands on the right edge
        assert!(approx(quad.points[0].x, 750.0));
        assert!(approx(quad.points[0].y, 200.0));
        assert!(entity.contains_point(Point::new(500.0, 400.0)));

        // Flipped rotation keeps the same visual sense on the mirrored content
        entity.layer_mut().post_rotate(90.0);
        let flipped = entity.screen_quad();
        assert!(approx(flipped.points[0].x, 700.0));
        assert!(approx(flipped.points[0].y, 650.0));
    }

    #[test]
    fn translation_moves_quad() {
        let mut entity = unit_entity();
        entity.layer_mut().post_translate(0.1, -0.05);
        let quad = entity.screen_quad();
        assert!(approx(quad.points[0].x, 350.0));
        assert!(approx(quad.points[0].y, 160.0));
    }

    #[test]
    fn release_is_idempotent() {
        let mut entity = image_entity(10, 10);
        assert!(!entity.is_released());
        assert!(entity.release());
        assert!(entity.is_released());
        assert!(!entity.release());
        // Geometry survives release
        assert_eq!(entity.width(), 10);
    }

    #[test]
    fn zero_size_image_is_rejected_by_the_raster() {
        let result = Entity::load_image(
            Layer::new(),
            ImageSource::Resource { name: "empty".into() },
            &SolidImageLoader::new(0, 40),
            canvas(),
        );
        assert!(matches!(
            result,
            Err(EntityError::Raster(RasterError::PixmapCreationFailed { width: 0, height: 40 }))
        ));
    }

    #[test]
    fn text_entity_spans_canvas_width() {
        let rasterizer = BlockTextRasterizer { line_height: 40 };
        let entity = Entity::text(TextLayer::new("hello", Font::default()), canvas(), &rasterizer).unwrap();
        assert_eq!(entity.width(), 1000);
        // 0.13 * 800 = 104 px floor
        assert_eq!(entity.height(), 104);
        assert!(approx(entity.holy_scale(), 1.0));
        assert_eq!(entity.layer().max_scale(), 2.0);
    }

    #[test]
    fn text_entity_grows_with_long_text() {
        let rasterizer = BlockTextRasterizer { line_height: 40 };
        let text = "x".repeat(50); // five lines, 200 px
        let entity = Entity::text(TextLayer::new(text, Font::default()), canvas(), &rasterizer).unwrap();
        assert_eq!(entity.height(), 200);
    }

    #[test]
    fn update_text_keeps_center() {
        let rasterizer = BlockTextRasterizer { line_height: 40 };
        let mut entity = Entity::text(TextLayer::new("short", Font::default()), canvas(), &rasterizer).unwrap();
        entity.move_center_to(Point::new(300.0, 300.0));

        entity.text_layer_mut().unwrap().text = "y".repeat(60);
        entity.update_text(&rasterizer).unwrap();

        assert_eq!(entity.height(), 240);
        let center = entity.absolute_center();
        assert!(approx(center.x, 300.0));
        assert!(approx(center.y, 300.0));
        assert!(!entity.is_released());
    }

    #[test]
    fn update_text_on_image_is_noop() {
        let rasterizer = BlockTextRasterizer { line_height: 40 };
        let mut entity = image_entity(20, 20);
        entity.update_text(&rasterizer).unwrap();
        assert_eq!(entity.width(), 20);
        assert!(!entity.is_released());
    }

    #[test]
    fn serialize_captures_matrix_and_border() {
        let mut entity = unit_entity();
        entity.set_border(PaintData { stroke_width: 3.0, color: 0xFF00_FF00 });
        let record = entity.serialize();
        assert_eq!(record.border(), entity.border());
        assert_eq!(record.holy_scale(), entity.holy_scale());
        assert_eq!(record.canvas(), entity.canvas());
        assert!(approx(record.matrix_values()[0], 1.0)); // 0.5 layer scale * 2 holy scale
        assert!(approx(record.matrix_values()[2], 250.0));
        assert_eq!(record.matrix_values()[8], 1.0);
    }

    #[test]
    fn from_record_reuses_persisted_holy_scale() {
        let entity = unit_entity();
        let record = entity.serialize();
        // Loader now yields different pixels; holy scale must not be re-derived
        let loader = SolidImageLoader::new(100, 100);
        let rasterizer = BlockTextRasterizer { line_height: 40 };
        let restored = Entity::from_record(&record, &loader, &rasterizer).unwrap();
        assert_eq!(restored.holy_scale(), entity.holy_scale());
        assert_eq!(restored.layer(), entity.layer());
        assert_eq!(loader.loads.get(), 1);
    }

    #[test]
    fn draw_emits_border_only_when_selected() {
        #[derive(Default)]
        struct Recorder {
            images: usize,
            lines: Vec<(usize, f32, u32)>,
        }
        impl Canvas for Recorder {
            fn draw_image(&mut self, _: &Pixmap, _: Transform, _: Option<&DrawPaint>) {
                self.images += 1;
            }
            fn draw_lines(&mut self, segments: &[(Point, Point)], width: f32, color: u32) {
                self.lines.push((segments.len(), width, color));
            }
        }

        let mut entity = unit_entity();
        entity.set_border(PaintData { stroke_width: 2.0, color: 0xFF11_2233 });
        let mut rec = Recorder::default();
        entity.draw(&mut rec, None);
        assert_eq!(rec.images, 1);
        assert!(rec.lines.is_empty());

        entity.set_selected(true);
        entity.draw(&mut rec, Some(&DrawPaint::with_opacity(0.15)));
        assert_eq!(rec.lines, vec![(4, 2.0, 0x2611_2233)]);
    }
}
