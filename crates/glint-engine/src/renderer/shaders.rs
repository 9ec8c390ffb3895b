use std::path::Path;

use crate::batch::FlushTrigger;
use crate::error::{BackendError, ErrorCode, GpuError, GpuResult};
use crate::handle::{ProgramId, ShaderId};
use crate::shader::{
    Attribute, AttributeSource, ShaderBlock, ShaderKind, ShaderLanguage, UniformValue,
    expand_per_sprite,
};
use crate::target::Context;

use super::{Features, Program, Renderer, Shader};

fn kind_feature(kind: ShaderKind) -> Features {
    match kind {
        ShaderKind::Vertex => Features::VERTEX_SHADER,
        ShaderKind::Fragment => Features::FRAGMENT_SHADER,
    }
}

impl Renderer {
    fn program_ref(&self, function: &'static str, program: ProgramId) -> GpuResult<&Program> {
        self.programs
            .get(&program)
            .ok_or_else(|| GpuError::null_argument(function, "shader program"))
    }

    fn shader_ref(&self, function: &'static str, shader: ShaderId) -> GpuResult<&Shader> {
        self.shaders
            .get(&shader)
            .ok_or_else(|| GpuError::null_argument(function, "shader"))
    }

    fn current_context(&mut self, function: &'static str) -> GpuResult<&mut Context> {
        self.context_mut()
            .ok_or_else(|| GpuError::user(function, "no active context"))
    }

    /// Records a compiler or linker message and returns the error for it.
    fn shader_failure(&mut self, function: &'static str, err: BackendError) -> GpuError {
        self.shader_message = match &err {
            BackendError::Shader(msg) => msg.clone(),
            other => other.to_string(),
        };
        GpuError::backend(function, err)
    }

    // ── compile / link ────────────────────────────────────────────────────

    pub(crate) fn shader_language(&self) -> (ShaderLanguage, u32) {
        self.backend.shader_language()
    }

    pub(crate) fn shader_message(&self) -> &str {
        &self.shader_message
    }

    pub(crate) fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> GpuResult<ShaderId> {
        const FN: &str = "compile_shader";
        self.require(FN, kind_feature(kind))?;
        let handle = self
            .backend
            .compile_shader(kind, source)
            .map_err(|e| self.shader_failure(FN, e))?;
        self.shader_message.clear();
        let id = self.handles.shader();
        self.shaders.insert(id, Shader { handle, kind });
        log::debug!("{}: compiled {kind:?} shader {id:?}", self.id);
        Ok(id)
    }

    pub(crate) fn compile_shader_from_file(&mut self, kind: ShaderKind, path: &Path) -> GpuResult<ShaderId> {
        const FN: &str = "compile_shader_from_file";
        let source = std::fs::read_to_string(path).map_err(|e| {
            let code = if e.kind() == std::io::ErrorKind::NotFound {
                ErrorCode::FileNotFound
            } else {
                ErrorCode::DataError
            };
            GpuError::new(FN, code, format!("{}: {e}", path.display()))
        })?;
        self.compile_shader(kind, &source)
    }

    pub(crate) fn create_shader_program(&mut self) -> GpuResult<ProgramId> {
        const FN: &str = "create_shader_program";
        self.require(FN, Features::BASIC_SHADERS)?;
        let handle = self
            .backend
            .create_program()
            .map_err(|e| GpuError::backend(FN, e))?;
        let id = self.handles.program();
        self.programs.insert(
            id,
            Program {
                handle,
                shaders: Vec::new(),
                linked: false,
                uniforms: Default::default(),
            },
        );
        Ok(id)
    }

    pub(crate) fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> GpuResult<()> {
        const FN: &str = "attach_shader";
        let shader_handle = self.shader_ref(FN, shader)?.handle;
        let program_handle = self.program_ref(FN, program)?.handle;
        self.backend
            .attach_shader(program_handle, shader_handle)
            .map_err(|e| GpuError::backend(FN, e))?;
        if let Some(p) = self.programs.get_mut(&program) {
            if !p.shaders.contains(&shader) {
                p.shaders.push(shader);
            }
            p.linked = false;
        }
        Ok(())
    }

    pub(crate) fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) -> GpuResult<()> {
        const FN: &str = "detach_shader";
        let shader_handle = self.shader_ref(FN, shader)?.handle;
        let program_handle = self.program_ref(FN, program)?.handle;
        self.backend
            .detach_shader(program_handle, shader_handle)
            .map_err(|e| GpuError::backend(FN, e))?;
        if let Some(p) = self.programs.get_mut(&program) {
            p.shaders.retain(|s| *s != shader);
            p.linked = false;
        }
        Ok(())
    }

    pub(crate) fn link_shader_program(&mut self, program: ProgramId) -> GpuResult<()> {
        const FN: &str = "link_shader_program";
        let handle = self.program_ref(FN, program)?.handle;
        self.backend
            .link_program(handle)
            .map_err(|e| self.shader_failure(FN, e))?;
        self.shader_message.clear();
        if let Some(p) = self.programs.get_mut(&program) {
            p.linked = true;
        }
        Ok(())
    }

    /// Creates a program from two compiled shaders and links it.
    pub(crate) fn link_shaders(&mut self, vertex: ShaderId, fragment: ShaderId) -> GpuResult<ProgramId> {
        let program = self.create_shader_program()?;
        let linked = self
            .attach_shader(program, vertex)
            .and_then(|_| self.attach_shader(program, fragment))
            .and_then(|_| self.link_shader_program(program));
        if let Err(e) = linked {
            self.free_shader_program(program)?;
            return Err(e);
        }
        Ok(program)
    }

    /// Silent for unknown handles.
    pub(crate) fn free_shader(&mut self, shader: ShaderId) {
        let Some(s) = self.shaders.remove(&shader) else {
            return;
        };
        for p in self.programs.values_mut() {
            p.shaders.retain(|id| *id != shader);
        }
        self.backend.free_shader(s.handle);
        log::debug!("{}: freed {:?} shader {shader:?}", self.id, s.kind);
    }

    /// Frees `program`, falling back to the built-in program wherever it
    /// was active.
    pub(crate) fn free_shader_program(&mut self, program: ProgramId) -> GpuResult<()> {
        if !self.programs.contains_key(&program) {
            return Ok(());
        }
        if self.contexts.values().any(|c| c.program == Some(program)) {
            self.flush_if(FlushTrigger::Shader)?;
            for ctx in self.contexts.values_mut() {
                if ctx.program == Some(program) {
                    ctx.program = None;
                    ctx.block = ShaderBlock::builtin();
                }
            }
        }
        if let Some(p) = self.programs.remove(&program) {
            self.backend.free_program(p.handle);
        }
        Ok(())
    }

    // ── activation ────────────────────────────────────────────────────────

    /// Makes `program` current (`None` restores the built-in program).
    ///
    /// Without a `block` the default attribute and uniform names are looked
    /// up in the program.
    pub(crate) fn activate_shader_program(
        &mut self,
        program: Option<ProgramId>,
        block: Option<ShaderBlock>,
    ) -> GpuResult<()> {
        const FN: &str = "activate_shader_program";
        self.current_context(FN)?;
        let block = match program {
            None => ShaderBlock::builtin(),
            Some(p) => {
                if !self.program_ref(FN, p)?.linked {
                    return Err(GpuError::user(FN, format!("{p:?} is not linked")));
                }
                match block {
                    Some(b) => b,
                    None => self.load_shader_block(p, None, None, None, None)?,
                }
            }
        };
        self.flush_if(FlushTrigger::Shader)?;
        let ctx = self.current_context(FN)?;
        ctx.program = program;
        ctx.block = block;
        Ok(())
    }

    pub(crate) fn deactivate_shader_program(&mut self) -> GpuResult<()> {
        self.activate_shader_program(None, None)
    }

    pub(crate) fn current_shader_program(&self) -> Option<ProgramId> {
        self.context().and_then(|c| c.program)
    }

    pub(crate) fn is_default_shader_program(&self) -> bool {
        self.current_shader_program().is_none()
    }

    pub(crate) fn attribute_location(&self, program: ProgramId, name: &str) -> GpuResult<Option<u32>> {
        let handle = self.program_ref("attribute_location", program)?.handle;
        Ok(self.backend.attribute_location(handle, name))
    }

    pub(crate) fn uniform_location(&self, program: ProgramId, name: &str) -> GpuResult<Option<u32>> {
        let handle = self.program_ref("uniform_location", program)?.handle;
        Ok(self.backend.uniform_location(handle, name))
    }

    /// Resolves a block by name; `None` names use the defaults
    /// (`gpu_Vertex`, `gpu_TexCoord`, `gpu_Color`,
    /// `gpu_ModelViewProjectionMatrix`).
    pub(crate) fn load_shader_block(
        &self,
        program: ProgramId,
        position_name: Option<&str>,
        texcoord_name: Option<&str>,
        color_name: Option<&str>,
        mvp_name: Option<&str>,
    ) -> GpuResult<ShaderBlock> {
        use crate::shader::{
            DEFAULT_COLOR_NAME, DEFAULT_MVP_NAME, DEFAULT_POSITION_NAME, DEFAULT_TEXCOORD_NAME,
        };
        let handle = self.program_ref("load_shader_block", program)?.handle;
        let attr = |name: Option<&str>, default: &'static str| {
            self.backend
                .attribute_location(handle, name.unwrap_or(default))
        };
        Ok(ShaderBlock {
            position_loc: attr(position_name, DEFAULT_POSITION_NAME),
            texcoord_loc: attr(texcoord_name, DEFAULT_TEXCOORD_NAME),
            color_loc: attr(color_name, DEFAULT_COLOR_NAME),
            modelviewprojection_loc: self
                .backend
                .uniform_location(handle, mvp_name.unwrap_or(DEFAULT_MVP_NAME)),
        })
    }

    pub(crate) fn set_shader_block(&mut self, block: ShaderBlock) -> GpuResult<()> {
        const FN: &str = "set_shader_block";
        self.current_context(FN)?;
        self.flush_if(FlushTrigger::Shader)?;
        self.current_context(FN)?.block = block;
        Ok(())
    }

    pub(crate) fn shader_block(&self) -> ShaderBlock {
        self.context().map_or(ShaderBlock::builtin(), |c| c.block)
    }

    // ── uniforms / attributes ─────────────────────────────────────────────

    /// Stores a uniform on the active program; it is uploaded with each
    /// subsequent draw.
    pub(crate) fn set_uniform(&mut self, location: u32, value: UniformValue) -> GpuResult<()> {
        const FN: &str = "set_uniform";
        let program = self
            .current_shader_program()
            .ok_or_else(|| GpuError::user(FN, "no shader program is active"))?;
        if value.word_count() == 0 {
            return Ok(());
        }
        self.flush_if(FlushTrigger::Uniform)?;
        if let Some(p) = self.programs.get_mut(&program) {
            p.uniforms.insert(location, value);
        }
        Ok(())
    }

    pub(crate) fn get_uniform(&self, program: ProgramId, location: u32) -> GpuResult<Option<UniformValue>> {
        Ok(self
            .program_ref("get_uniform", program)?
            .uniforms
            .get(&location)
            .cloned())
    }

    /// Constant value for an attribute location, used when no source is set.
    pub(crate) fn set_attributefv(&mut self, location: u32, value: &[f32]) -> GpuResult<()> {
        const FN: &str = "set_attributefv";
        if value.is_empty() || value.len() > 4 {
            return Err(GpuError::user(FN, "attribute values hold 1 to 4 floats"));
        }
        self.current_context(FN)?;
        self.flush_if(FlushTrigger::Uniform)?;
        self.current_context(FN)?
            .constant_attributes
            .insert(location, value.to_vec());
        Ok(())
    }

    /// Registers a per-vertex (or per-sprite) stream for the next flush.
    pub(crate) fn set_attribute_source(&mut self, num_values: usize, attribute: Attribute) -> GpuResult<()> {
        const FN: &str = "set_attribute_source";
        if attribute.format.num_elems == 0 || attribute.format.num_elems > 4 {
            return Err(GpuError::user(FN, "attribute elements must be 1 to 4"));
        }
        let location = attribute.location;
        let source = AttributeSource {
            num_values,
            attribute,
        };
        if num_values > 0 {
            expand_per_sprite(&source).map_err(|e| GpuError::data(FN, e.to_string()))?;
        }
        let ctx = self.current_context(FN)?;
        if num_values == 0 {
            ctx.attribute_sources.remove(&location);
        } else {
            ctx.attribute_sources.insert(location, source);
        }
        Ok(())
    }
}
