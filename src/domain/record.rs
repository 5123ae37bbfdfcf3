//! Persisted records for entities and whole scenes
//!
//! Records are immutable snapshots: they are produced by
//! [`Entity::serialize`](crate::domain::entity::Entity::serialize) and
//! consumed by the composition's restore path. The scene document is JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::core::CanvasSize;
use crate::domain::entity::EntityKind;

/// Errors while encoding or decoding a scene document
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Malformed scene document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported scene version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Border stroke of an entity, drawn while it is selected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaintData {
    pub stroke_width: f32,
    /// ARGB color
    pub color: u32,
}

impl Default for PaintData {
    fn default() -> Self {
        Self {
            stroke_width: 0.0,
            color: 0xFF00_0000,
        }
    }
}

/// Snapshot of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    kind: EntityKind,
    matrix_values: [f32; 9],
    holy_scale: f32,
    canvas: CanvasSize,
    border: PaintData,
}

impl EntityRecord {
    pub(crate) fn new(
        kind: EntityKind,
        matrix_values: [f32; 9],
        holy_scale: f32,
        canvas: CanvasSize,
        border: PaintData,
    ) -> Self {
        Self {
            kind,
            matrix_values,
            holy_scale,
            canvas,
            border,
        }
    }

    /// Layer snapshot plus kind payload (image provenance or text)
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Matrix coefficients at the time of serialization
    pub fn matrix_values(&self) -> &[f32; 9] {
        &self.matrix_values
    }

    pub fn holy_scale(&self) -> f32 {
        self.holy_scale
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn border(&self) -> PaintData {
        self.border
    }
}

/// Ordered entity records, back to front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub version: u32,
    pub entities: Vec<EntityRecord>,
}

impl SceneRecord {
    pub const VERSION: u32 = 1;

    pub fn new(entities: Vec<EntityRecord>) -> Self {
        Self {
            version: Self::VERSION,
            entities,
        }
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let scene: SceneRecord = serde_json::from_str(json)?;
        if scene.version != Self::VERSION {
            return Err(RecordError::UnsupportedVersion {
                found: scene.version,
                expected: Self::VERSION,
            });
        }
        Ok(scene)
    }
}
