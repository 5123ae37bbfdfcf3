//! Composition manager
//!
//! Owns the z-ordered entity sequence (back to front) and the selection.
//! Every structural mutation of the scene goes through [`Composition`], so
//! the selected id always refers to an entity that is present.

use thiserror::Error;
use tiny_skia::Pixmap;
use tracing::{debug, info};

use crate::config::{CompositionConfig, ConfigError};
use crate::domain::core::{CanvasSize, Point};
use crate::domain::entity::{Entity, EntityError, EntityId};
use crate::domain::layer::TextLayer;
use crate::domain::raster::{Canvas, DrawPaint, ImageLoader, RasterError, TextRasterizer};
use crate::domain::record::{PaintData, RecordError, SceneRecord};
use crate::ui::renderer::{SkiaCanvas, WHITE};

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("Invalid composition config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build entity: {0}")]
    Entity(#[from] EntityError),

    #[error("Rendering failed: {0}")]
    Raster(#[from] RasterError),

    #[error("Scene document error: {0}")]
    Record(#[from] RecordError),
}

/// Notifications raised by the composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionEvent {
    /// Selection changed; None when nothing is selected anymore
    EntitySelected(Option<EntityId>),
    EntityDoubleTap(EntityId),
}

pub type EventHandler = Box<dyn FnMut(&CompositionEvent)>;

pub struct Composition {
    canvas: CanvasSize,
    config: CompositionConfig,
    entities: Vec<Entity>,
    selected: Option<EntityId>,
    next_id: u64,
    needs_redraw: bool,
    handler: Option<EventHandler>,
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("canvas", &self.canvas)
            .field("config", &self.config)
            .field("entities", &self.entities.len())
            .field("selected", &self.selected)
            .field("needs_redraw", &self.needs_redraw)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Composition {
    /// Creates an empty composition
    ///
    /// # Arguments
    /// * `canvas` - Size of the drawing surface in pixels
    /// * `config` - Border paint and overlay settings, validated here
    pub fn new(canvas: CanvasSize, config: CompositionConfig) -> Result<Self, CompositionError> {
        config.validate()?;
        Ok(Self {
            canvas,
            config,
            entities: Vec::new(),
            selected: None,
            next_id: 1,
            needs_redraw: false,
            handler: None,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Entities back to front
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Mutable access to an entity; marks the scene for redraw when found
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let entity = self.entities.iter_mut().find(|e| e.id() == id)?;
        self.needs_redraw = true;
        Some(entity)
    }

    pub fn selected_id(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.selected.and_then(|id| self.entity(id))
    }

    pub fn selected_entity_mut(&mut self) -> Option<&mut Entity> {
        let id = self.selected?;
        self.entity_mut(id)
    }

    /// Selected entity without touching the redraw flag
    fn find_selected_mut(&mut self) -> Option<&mut Entity> {
        let id = self.selected?;
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// Whether the scene changed since the last [`take_redraw`](Self::take_redraw)
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Returns and clears the redraw flag
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn set_event_handler(&mut self, handler: impl FnMut(&CompositionEvent) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    pub fn clear_event_handler(&mut self) {
        self.handler = None;
    }

    fn emit(&mut self, event: CompositionEvent) {
        debug!(?event, "composition event");
        if let Some(handler) = self.handler.as_mut() {
            handler(&event);
        }
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    fn assign_id(&mut self, entity: &mut Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.set_id(id);
        id
    }

    /// Appends an entity on top and selects it without notification
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = self.assign_id(&mut entity);
        info!(%id, kind = entity.kind().label(), "entity added");
        self.entities.push(entity);
        self.select_entity(Some(id), false);
        id
    }

    /// Styles, centers and scales a new entity, appends it on top and
    /// selects it with notification
    pub fn add_entity_and_position(&mut self, mut entity: Entity) -> EntityId {
        entity.set_border(PaintData {
            stroke_width: self.config.border_stroke_width,
            color: self.config.border_color,
        });
        entity.move_to_canvas_center();
        entity.layer_mut().apply_initial_scale();

        let id = self.assign_id(&mut entity);
        info!(%id, kind = entity.kind().label(), "entity added and positioned");
        self.entities.push(entity);
        self.select_entity(Some(id), true);
        id
    }

    /// Changes the selection
    ///
    /// An id that is not in the scene leaves the selection untouched.
    ///
    /// # Returns
    /// true if the selection was updated
    pub fn select_entity(&mut self, id: Option<EntityId>, notify: bool) -> bool {
        if let Some(id) = id {
            if self.index_of(id).is_none() {
                debug!(%id, "ignoring selection of unknown entity");
                return false;
            }
        }

        if let Some(previous) = self.selected.take() {
            if let Some(entity) = self.entities.iter_mut().find(|e| e.id() == previous) {
                entity.set_selected(false);
            }
        }
        if let Some(id) = id {
            if let Some(entity) = self.entities.iter_mut().find(|e| e.id() == id) {
                entity.set_selected(true);
            }
        }

        self.selected = id;
        self.needs_redraw = true;
        debug!(selected = ?id, notify, "selection changed");

        if notify {
            self.emit(CompositionEvent::EntitySelected(id));
        }
        true
    }

    /// Clears the selection and notifies
    pub fn unselect_entity(&mut self) {
        if self.selected.is_some() {
            self.select_entity(None, true);
        }
    }

    /// Front-most entity containing the point
    pub fn find_entity_at_point(&self, point: Point) -> Option<EntityId> {
        self.entities
            .iter()
            .rev()
            .find(|e| e.contains_point(point))
            .map(Entity::id)
    }

    /// Selects whatever is under a tap, or nothing
    pub fn update_selection_on_tap(&mut self, point: Point) {
        let hit = self.find_entity_at_point(point);
        self.select_entity(hit, true);
    }

    /// Brings the selected entity to front when the press landed on it
    pub fn update_on_long_press(&mut self, point: Point) {
        let Some(selected) = self.selected_entity() else {
            return;
        };
        if selected.contains_point(point) {
            let id = selected.id();
            self.bring_to_front(id);
        }
    }

    /// Moves the selected entity by a pixel delta
    ///
    /// Each axis is applied only if the entity center stays on the canvas.
    pub fn handle_translate(&mut self, delta: Point) {
        let Some(entity) = self.find_selected_mut() else {
            return;
        };
        let canvas = entity.canvas();
        let center = entity.absolute_center();
        let mut moved = false;

        let new_x = center.x + delta.x;
        if delta.x != 0.0 && (0.0..=canvas.w()).contains(&new_x) {
            entity.layer_mut().post_translate(delta.x / canvas.w(), 0.0);
            moved = true;
        }

        let new_y = center.y + delta.y;
        if delta.y != 0.0 && (0.0..=canvas.h()).contains(&new_y) {
            entity.layer_mut().post_translate(0.0, delta.y / canvas.h());
            moved = true;
        }

        self.needs_redraw |= moved;
    }

    /// Applies a pinch span ratio to the selected entity
    pub fn handle_scale(&mut self, factor: f32) {
        let Some(entity) = self.find_selected_mut() else {
            return;
        };
        entity.layer_mut().post_scale(factor - 1.0);
        self.needs_redraw = true;
    }

    /// Applies a rotation delta in degrees to the selected entity
    pub fn handle_rotate(&mut self, degrees_delta: f32) {
        let Some(entity) = self.find_selected_mut() else {
            return;
        };
        entity.layer_mut().post_rotate(-degrees_delta);
        self.needs_redraw = true;
    }

    pub fn handle_double_tap(&mut self) {
        if let Some(id) = self.selected {
            self.emit(CompositionEvent::EntityDoubleTap(id));
        }
    }

    /// Moves an entity to the top of the z-order
    pub fn bring_to_front(&mut self, id: EntityId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let entity = self.entities.remove(index);
        self.entities.push(entity);
        self.needs_redraw = true;
        debug!(%id, "brought to front");
        true
    }

    /// Moves an entity to the bottom of the z-order
    pub fn send_to_back(&mut self, id: EntityId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let entity = self.entities.remove(index);
        self.entities.insert(0, entity);
        self.needs_redraw = true;
        debug!(%id, "sent to back");
        true
    }

    pub fn move_selected_back(&mut self) -> bool {
        match self.selected {
            Some(id) => self.send_to_back(id),
            None => false,
        }
    }

    pub fn flip_selected_entity(&mut self) -> bool {
        let Some(entity) = self.find_selected_mut() else {
            return false;
        };
        entity.layer_mut().flip();
        self.needs_redraw = true;
        true
    }

    /// Removes an entity and releases its raster
    ///
    /// Removing the selected entity clears the selection and notifies once.
    ///
    /// # Returns
    /// The removed entity, already released, or None if the id is unknown
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        let mut entity = self.entities.remove(index);
        entity.release();
        self.needs_redraw = true;
        info!(%id, "entity removed");

        if self.selected == Some(id) {
            self.selected = None;
            self.emit(CompositionEvent::EntitySelected(None));
        }
        Some(entity)
    }

    /// Removes the selected entity
    ///
    /// With nothing selected the scene is left as is, but the handler is
    /// still told that nothing is selected.
    pub fn delete_selected_entity(&mut self) -> Option<Entity> {
        match self.selected {
            Some(id) => self.remove_entity(id),
            None => {
                self.emit(CompositionEvent::EntitySelected(None));
                None
            }
        }
    }

    /// Frees every raster; entities stay in place
    pub fn release(&mut self) {
        let mut released = 0;
        for entity in &mut self.entities {
            if entity.release() {
                released += 1;
            }
        }
        debug!(released, "released rasters");
    }

    /// Removes every entity
    pub fn clear(&mut self) {
        self.release();
        self.entities.clear();
        self.needs_redraw = true;
        info!("composition cleared");
        if self.selected.is_some() {
            self.selected = None;
            self.emit(CompositionEvent::EntitySelected(None));
        }
    }

    /// Draws all entities back to front, then the selected one translucent
    /// on top
    pub fn render(&self, canvas: &mut dyn Canvas) {
        for entity in &self.entities {
            entity.draw(canvas, None);
        }
        if let Some(selected) = self.selected_entity() {
            let paint = DrawPaint::with_opacity(self.config.selected_layer_alpha);
            selected.draw(canvas, Some(&paint));
        }
    }

    /// Renders the scene on white without selection decorations
    ///
    /// The selection is cleared silently.
    pub fn thumbnail(&mut self) -> Result<Pixmap, CompositionError> {
        self.select_entity(None, false);
        let mut canvas = SkiaCanvas::new(self.canvas.width(), self.canvas.height())?;
        canvas.clear(WHITE);
        self.render(&mut canvas);
        Ok(canvas.into_pixmap())
    }

    pub fn serialize(&self) -> SceneRecord {
        SceneRecord::new(self.entities.iter().map(Entity::serialize).collect())
    }

    /// Replaces the scene with the entities of a record
    ///
    /// Either every entity is rebuilt or the scene is left untouched. The
    /// selection is cleared without notification and ids are reassigned.
    pub fn restore(
        &mut self,
        record: &SceneRecord,
        loader: &dyn ImageLoader,
        rasterizer: &dyn TextRasterizer,
    ) -> Result<(), CompositionError> {
        let mut restored = record
            .entities
            .iter()
            .map(|r| Entity::from_record(r, loader, rasterizer))
            .collect::<Result<Vec<_>, _>>()?;

        self.release();
        self.selected = None;
        for entity in &mut restored {
            entity.set_selected(false);
            self.assign_id(entity);
        }
        self.entities = restored;
        self.needs_redraw = true;

        info!(entities = self.entities.len(), "scene restored");
        Ok(())
    }

    pub fn restore_json(
        &mut self,
        json: &str,
        loader: &dyn ImageLoader,
        rasterizer: &dyn TextRasterizer,
    ) -> Result<(), CompositionError> {
        let record = SceneRecord::from_json(json)?;
        self.restore(&record, loader, rasterizer)
    }

    /// Edits the selected text entity and re-renders it
    ///
    /// # Returns
    /// false if nothing is selected or the selection is not text
    pub fn edit_selected_text(
        &mut self,
        rasterizer: &dyn TextRasterizer,
        edit: impl FnOnce(&mut TextLayer),
    ) -> Result<bool, CompositionError> {
        let Some(entity) = self.find_selected_mut() else {
            return Ok(false);
        };
        let Some(text) = entity.text_layer_mut() else {
            return Ok(false);
        };
        edit(text);
        entity.update_text(rasterizer)?;
        self.needs_redraw = true;
        Ok(true)
    }
}
