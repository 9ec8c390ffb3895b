//! Renderer instances and the backend seam.
//!
//! A [`Renderer`] is the core's view of one initialized backend: it owns the
//! images, targets, contexts and shader programs created through it, keeps
//! the pending blit batch, and talks to the device only through the
//! [`Backend`] trait. Operation families live in the submodules
//! (`images`, `targets`, `draw`, `matrices`, `shaders`).

mod backend;
mod draw;
mod features;
mod id;
mod images;
mod matrices;
mod order;
pub mod registry;
mod shaders;
mod targets;

pub use backend::{
    Backend, DrawCall, PixelRect, ProgramHandle, ShaderHandle, SurfaceHandle, SurfaceViewport,
    TextureDesc, TextureHandle, WindowBinding, WindowRequest, WindowSurface,
};
pub use draw::FlipFlags;
pub use features::{Features, InitFlags};
pub use id::{RendererId, RendererKind, make_renderer_id};
pub use order::{
    DIRECT3D11, DIRECT3D12, GLES, METAL, OPENGL, Platform, SOFTWARE, VULKAN, VULKAN_MOBILE,
    default_renderer_order,
};

use std::collections::{BTreeMap, HashMap};

use crate::batch::{
    BatchKey, DEFAULT_BLIT_BUFFER_INDICES, DEFAULT_BLIT_BUFFER_VERTICES, FlushTrigger, PendingBatch,
};
use crate::error::{GpuError, GpuResult};
use crate::handle::{HandleAllocator, ImageId, ProgramId, ShaderId, TargetId};
use crate::image::Image;
use crate::logging::DebugLevel;
use crate::matrix::DEFAULT_MAX_MATRIX_DEPTH;
use crate::paint::BlendMode;
use crate::shader::{
    PreparedAttribute, ShaderBlock, ShaderKind, UniformValue, constant_attribute,
    prepare_for_draw,
};
use crate::target::{Context, RenderTarget, TargetKind, coords};

/// Per-renderer limits derived from the session configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RendererSettings {
    pub max_matrix_depth: usize,
    pub blit_buffer_vertices: usize,
    pub blit_buffer_indices: usize,
    pub debug_level: DebugLevel,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            max_matrix_depth: DEFAULT_MAX_MATRIX_DEPTH,
            blit_buffer_vertices: DEFAULT_BLIT_BUFFER_VERTICES,
            blit_buffer_indices: DEFAULT_BLIT_BUFFER_INDICES,
            debug_level: DebugLevel::Level0,
        }
    }
}

#[derive(Debug, Clone)]
struct Shader {
    handle: ShaderHandle,
    kind: ShaderKind,
}

#[derive(Debug, Clone)]
struct Program {
    handle: ProgramHandle,
    shaders: Vec<ShaderId>,
    linked: bool,
    uniforms: BTreeMap<u32, UniformValue>,
}

/// Shader state handed to one flush.
struct ProgramState {
    program: Option<ProgramHandle>,
    block: ShaderBlock,
    uniforms: Vec<(u32, Vec<u32>)>,
    attributes: Vec<PreparedAttribute>,
}

/// One initialized backend and everything created through it.
pub struct Renderer {
    id: RendererId,
    requested_id: RendererId,
    features: Features,
    backend: Box<dyn Backend>,
    handles: HandleAllocator,

    images: HashMap<ImageId, Image>,
    /// Images sharing a texture (aliases) keep it alive together.
    texture_refs: HashMap<TextureHandle, usize>,
    targets: HashMap<TargetId, RenderTarget>,
    surface_refs: HashMap<SurfaceHandle, usize>,
    /// Keyed by the window target that owns the context.
    contexts: HashMap<TargetId, Context>,
    current_target: Option<TargetId>,
    batch: PendingBatch,

    shaders: HashMap<ShaderId, Shader>,
    programs: HashMap<ProgramId, Program>,
    shader_message: String,

    line_thickness: f32,
    shapes_use_blending: bool,
    shapes_blend_mode: BlendMode,

    settings: RendererSettings,
}

impl Renderer {
    pub(crate) fn new(
        id: RendererId,
        requested_id: RendererId,
        backend: Box<dyn Backend>,
        handles: HandleAllocator,
        settings: RendererSettings,
    ) -> Self {
        let features = backend.features();
        Self {
            id,
            requested_id,
            features,
            backend,
            handles,
            images: HashMap::new(),
            texture_refs: HashMap::new(),
            targets: HashMap::new(),
            surface_refs: HashMap::new(),
            contexts: HashMap::new(),
            current_target: None,
            batch: PendingBatch::new(settings.blit_buffer_vertices, settings.blit_buffer_indices),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            shader_message: String::new(),
            line_thickness: 1.0,
            shapes_use_blending: true,
            shapes_blend_mode: BlendMode::default(),
            settings,
        }
    }

    #[inline]
    pub fn id(&self) -> RendererId {
        self.id
    }

    /// The id this renderer was asked for (its version may differ from the
    /// one the backend reports).
    #[inline]
    pub fn requested_id(&self) -> RendererId {
        self.requested_id
    }

    #[inline]
    pub fn features(&self) -> Features {
        self.features
    }

    #[inline]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The target whose context is current.
    #[inline]
    pub fn current_target(&self) -> Option<TargetId> {
        self.current_target
    }

    pub(crate) fn set_debug_level(&mut self, level: DebugLevel) {
        self.settings.debug_level = level;
    }

    pub(crate) fn require(&self, function: &'static str, needed: Features) -> GpuResult<()> {
        if self.features.contains(needed) {
            Ok(())
        } else {
            Err(GpuError::unsupported(
                function,
                format!("{} lacks {:?}", self.id, needed.difference(self.features)),
            ))
        }
    }

    // ── lookups ───────────────────────────────────────────────────────────

    pub(crate) fn target(&self, function: &'static str, id: TargetId) -> GpuResult<&RenderTarget> {
        self.targets
            .get(&id)
            .ok_or_else(|| GpuError::null_argument(function, "target"))
    }

    pub(crate) fn target_mut(
        &mut self,
        function: &'static str,
        id: TargetId,
    ) -> GpuResult<&mut RenderTarget> {
        self.targets
            .get_mut(&id)
            .ok_or_else(|| GpuError::null_argument(function, "target"))
    }

    pub(crate) fn image(&self, function: &'static str, id: ImageId) -> GpuResult<&Image> {
        self.images
            .get(&id)
            .ok_or_else(|| GpuError::null_argument(function, "image"))
    }

    pub(crate) fn image_mut(&mut self, function: &'static str, id: ImageId) -> GpuResult<&mut Image> {
        self.images
            .get_mut(&id)
            .ok_or_else(|| GpuError::null_argument(function, "image"))
    }

    pub(crate) fn context(&self) -> Option<&Context> {
        self.current_target.and_then(|t| self.contexts.get(&t))
    }

    pub(crate) fn context_mut(&mut self) -> Option<&mut Context> {
        let current = self.current_target?;
        self.contexts.get_mut(&current)
    }

    /// Window target owning the context of `window_id`.
    pub fn window_target(&self, window_id: u64) -> Option<TargetId> {
        self.contexts
            .iter()
            .find(|(_, ctx)| ctx.window_id == window_id)
            .map(|(id, _)| *id)
    }

    /// Makes sure a context is current, binding `target`'s own context when
    /// none is.
    pub(crate) fn ensure_context(&mut self, function: &'static str, target: TargetId) -> GpuResult<()> {
        if self.context().is_some() {
            return Ok(());
        }
        if self.contexts.contains_key(&target) {
            self.current_target = Some(target);
            if self.settings.debug_level.traces() {
                log::debug!("{function}: auto-bound context of {target:?}");
            }
            return Ok(());
        }
        Err(GpuError::user(function, "no active context"))
    }

    /// Validates `target` and makes sure a context is current.
    pub(crate) fn prepare_target(&mut self, function: &'static str, target: TargetId) -> GpuResult<()> {
        self.target(function, target)?;
        self.ensure_context(function, target)
    }

    // ── windows ───────────────────────────────────────────────────────────

    /// Initializes the backend and its first window; returns the window
    /// target, which becomes current.
    pub(crate) fn init_window(&mut self, request: &WindowRequest) -> GpuResult<TargetId> {
        let surface = self
            .backend
            .init(request)
            .map_err(|e| GpuError::backend("init", e))?;
        // Device capabilities are only known once the backend is up.
        self.features = self.backend.features();
        let id = self.register_window(surface, request);
        self.current_target = Some(id);
        log::info!(
            "{} initialized: {}x{} window surface",
            self.id,
            surface.width,
            surface.height
        );
        Ok(id)
    }

    /// Adds another window on the same device.
    pub(crate) fn add_window(&mut self, request: &WindowRequest) -> GpuResult<TargetId> {
        const FN: &str = "create_target_from_window";
        self.require(FN, Features::MULTIPLE_WINDOWS)?;
        let surface = self
            .backend
            .add_window(request)
            .map_err(|e| GpuError::backend(FN, e))?;
        let id = self.register_window(surface, request);
        if self.context().is_none() {
            self.current_target = Some(id);
        }
        Ok(id)
    }

    fn register_window(&mut self, surface: WindowSurface, request: &WindowRequest) -> TargetId {
        let id = self.handles.target();
        let mut target = RenderTarget::new(
            surface.surface,
            TargetKind::Window {
                window_id: surface.window_id,
            },
            surface.width,
            surface.height,
            self.settings.max_matrix_depth,
        );
        let requested = (request.width, request.height);
        let auto_virtual = !request
            .flags
            .contains(InitFlags::DISABLE_AUTO_VIRTUAL_RESOLUTION);
        if auto_virtual
            && requested.0 > 0
            && requested.1 > 0
            && requested != (surface.width, surface.height)
        {
            target.set_logical_size(requested.0, requested.1);
        }

        let mut context = Context::new(surface.window_id, surface.width, surface.height, id);
        context.fullscreen = request.flags.contains(InitFlags::FULLSCREEN);

        *self.surface_refs.entry(surface.surface).or_insert(0) += 1;
        self.targets.insert(id, target);
        self.contexts.insert(id, context);
        id
    }

    /// Releases every resource and shuts the backend down.
    pub(crate) fn shutdown(&mut self) {
        if let Err(e) = self.flush_batch() {
            log::warn!("{}: final flush failed: {e}", self.id);
        }
        self.batch.clear();

        for (_, program) in self.programs.drain() {
            self.backend.free_program(program.handle);
        }
        for (_, shader) in self.shaders.drain() {
            self.backend.free_shader(shader.handle);
        }
        for (surface, _) in self.surface_refs.drain() {
            self.backend.free_surface(surface);
        }
        for (texture, _) in self.texture_refs.drain() {
            self.backend.free_texture(texture);
        }
        self.targets.clear();
        self.contexts.clear();
        self.images.clear();
        self.current_target = None;

        self.backend.quit();
        log::info!("{} shut down", self.id);
    }

    // ── batching ──────────────────────────────────────────────────────────

    /// Flushes the pending batch if `trigger` invalidates it.
    pub(crate) fn flush_if(&mut self, trigger: FlushTrigger) -> GpuResult<()> {
        if self.batch.must_flush_before(&trigger) {
            self.flush_batch()
        } else {
            Ok(())
        }
    }

    /// Makes room for `vertices`/`indices` of geometry under `key`.
    ///
    /// The context's active target follows the target drawn to, so matrix
    /// calls after a draw apply where it went.
    pub(crate) fn prepare_append(&mut self, key: BatchKey, vertices: usize, indices: usize) -> GpuResult<()> {
        self.flush_if(FlushTrigger::Bind(key))?;
        self.flush_if(FlushTrigger::Append { vertices, indices })?;
        self.batch.bind(key);
        if let Some(ctx) = self.context_mut() {
            ctx.active_target = key.target;
        }
        Ok(())
    }

    /// Draws whatever is buffered and empties the batch.
    pub(crate) fn flush_batch(&mut self) -> GpuResult<()> {
        let Some(key) = self.batch.key() else {
            return Ok(());
        };
        if self.batch.is_empty() {
            self.batch.clear();
            return Ok(());
        }
        let result = self.draw_batch(key);
        self.batch.clear();
        result
    }

    fn draw_batch(&mut self, key: BatchKey) -> GpuResult<()> {
        const FN: &str = "flush_blit_buffer";
        let (state, attribute_error) = self.take_program_state(self.batch.vertices().len());

        let target = self
            .targets
            .get(&key.target)
            .ok_or_else(|| GpuError::null_argument(FN, "target"))?;
        let (texture, blend) = match key.image {
            Some(id) => {
                let image = self
                    .images
                    .get(&id)
                    .ok_or_else(|| GpuError::null_argument(FN, "image"))?;
                (Some(image.texture), image.use_blending.then_some(image.blend_mode))
            }
            None => (None, self.shapes_use_blending.then_some(self.shapes_blend_mode)),
        };

        let call = DrawCall {
            surface: target.surface,
            texture,
            viewport: coords::surface_viewport(target),
            scissor: coords::surface_scissor(target),
            blend: blend.map(|b| b.degrade(self.features)),
            mvp: coords::device_transform(target, target.model_view_projection()),
            program: state.program,
            block: state.block,
            vertices: self.batch.vertices(),
            indices: self.batch.indices(),
            attributes: &state.attributes,
            uniforms: &state.uniforms,
        };
        if self.settings.debug_level.traces() {
            log::debug!(
                "flush {:?}/{:?}: {} vertices, {} indices",
                key.target,
                key.image,
                call.vertices.len(),
                call.indices.len()
            );
        }
        self.backend.draw(&call).map_err(|e| GpuError::backend(FN, e))?;
        match attribute_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Program, uniforms and attribute streams for a flush of
    /// `vertex_count` vertices. Attribute sources are consumed; one that
    /// cannot feed the draw is left out and reported as the second value.
    fn take_program_state(&mut self, vertex_count: usize) -> (ProgramState, Option<GpuError>) {
        let mut state = ProgramState {
            program: None,
            block: ShaderBlock::builtin(),
            uniforms: Vec::new(),
            attributes: Vec::new(),
        };
        let Some(current) = self.current_target else {
            return (state, None);
        };
        let Some(ctx) = self.contexts.get_mut(&current) else {
            return (state, None);
        };
        let sources = std::mem::take(&mut ctx.attribute_sources);
        let Some(program) = ctx.program.and_then(|p| self.programs.get(&p)) else {
            return (state, None);
        };

        state.program = Some(program.handle);
        state.block = ctx.block;
        state.uniforms = program
            .uniforms
            .iter()
            .map(|(loc, value)| (*loc, value.to_words()))
            .collect();

        for (location, value) in &ctx.constant_attributes {
            if !sources.contains_key(location) {
                state
                    .attributes
                    .push(constant_attribute(*location, value, vertex_count));
            }
        }
        let mut error = None;
        for source in sources.values() {
            match prepare_for_draw(source, vertex_count) {
                Ok(prepared) => state.attributes.push(prepared),
                Err(e) => {
                    error.get_or_insert_with(|| {
                        GpuError::data(
                            "flush_blit_buffer",
                            format!("attribute at location {}: {e}", source.attribute.location),
                        )
                    });
                }
            }
        }
        (state, error)
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("features", &self.features)
            .field("images", &self.images.len())
            .field("targets", &self.targets.len())
            .field("current_target", &self.current_target)
            .finish()
    }
}
