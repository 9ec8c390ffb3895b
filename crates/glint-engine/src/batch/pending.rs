use crate::handle::{ImageId, TargetId};

use super::Vertex;

/// What the buffered geometry will be drawn with: a target and an
/// optional image (`None` for untextured shapes).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BatchKey {
    pub target: TargetId,
    pub image: Option<ImageId>,
}

/// An event that may invalidate buffered geometry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FlushTrigger {
    /// More geometry is about to be appended.
    Append { vertices: usize, indices: usize },
    /// Geometry for this key is about to be appended.
    Bind(BatchKey),
    /// A matrix of this target is about to change.
    Matrix(TargetId),
    /// Clip, viewport, camera, color or resolution of this target.
    TargetState(TargetId),
    /// Pixels or sampling state of this image.
    ImageUpdate(ImageId),
    Shader,
    Blend,
    Uniform,
    Explicit,
    ClearOrFlip,
    Free,
}

/// Geometry accumulated for one (target, image) pair, awaiting a draw.
#[derive(Debug)]
pub struct PendingBatch {
    key: Option<BatchKey>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    max_vertices: usize,
    max_indices: usize,
}

impl PendingBatch {
    pub fn new(max_vertices: usize, max_indices: usize) -> Self {
        // Quads are the smallest unit appended by most callers.
        let max_vertices = max_vertices.max(4);
        let max_indices = max_indices.max(6);
        Self {
            key: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            max_vertices,
            max_indices,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<BatchKey> {
        self.key
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    #[inline]
    pub fn max_indices(&self) -> usize {
        self.max_indices
    }

    /// Whether a request of this size can ever fit in one batch.
    #[inline]
    pub fn fits(&self, vertices: usize, indices: usize) -> bool {
        vertices <= self.max_vertices && indices <= self.max_indices
    }

    /// Whether the buffered geometry must be drawn before `trigger` happens.
    pub fn must_flush_before(&self, trigger: &FlushTrigger) -> bool {
        if self.vertices.is_empty() {
            return false;
        }
        match *trigger {
            FlushTrigger::Append { vertices, indices } => {
                self.vertices.len() + vertices > self.max_vertices
                    || self.indices.len() + indices > self.max_indices
            }
            FlushTrigger::Bind(key) => self.key != Some(key),
            FlushTrigger::Matrix(target) | FlushTrigger::TargetState(target) => {
                self.key.is_some_and(|k| k.target == target)
            }
            FlushTrigger::ImageUpdate(image) => self.key.is_some_and(|k| k.image == Some(image)),
            FlushTrigger::Shader
            | FlushTrigger::Blend
            | FlushTrigger::Uniform
            | FlushTrigger::Explicit
            | FlushTrigger::ClearOrFlip
            | FlushTrigger::Free => true,
        }
    }

    /// Starts or continues a batch for `key`. The caller flushes first when
    /// [`must_flush_before`](Self::must_flush_before) says so.
    pub fn bind(&mut self, key: BatchKey) {
        debug_assert!(self.vertices.is_empty() || self.key == Some(key));
        self.key = Some(key);
    }

    /// Appends vertices and indices relative to the first new vertex.
    pub fn append(&mut self, vertices: &[Vertex], indices: &[u32]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|i| base + i));
    }

    /// Appends a quad given in winding order (two triangles sharing 0-2).
    pub fn append_quad(&mut self, quad: [Vertex; 4]) {
        self.append(&quad, &[0, 1, 2, 0, 2, 3]);
    }

    /// Drops buffered geometry; the key is forgotten.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.key = None;
    }

    /// Forgets the batch if it references `target` or `image`.
    pub fn discard_if(&mut self, target: Option<TargetId>, image: Option<ImageId>) {
        if let Some(k) = self.key {
            let hit_target = target.is_some_and(|t| t == k.target);
            let hit_image = image.is_some() && k.image == image;
            if hit_target || hit_image {
                self.clear();
            }
        }
    }
}
