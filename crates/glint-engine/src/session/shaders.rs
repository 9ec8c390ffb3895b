use std::path::Path;

use crate::handle::{ProgramId, ShaderId};
use crate::shader::{Attribute, ShaderBlock, ShaderKind, ShaderLanguage, UniformValue};

use super::Session;

impl Session {
    // ── compile / link ────────────────────────────────────────────────────

    /// Language and version the current renderer compiles.
    pub fn shader_language(&self) -> (ShaderLanguage, u32) {
        self.current_renderer()
            .map_or((ShaderLanguage::None, 0), |r| r.shader_language())
    }

    /// Last compiler or linker message.
    pub fn shader_message(&self) -> String {
        self.current_renderer()
            .map(|r| r.shader_message().to_owned())
            .unwrap_or_default()
    }

    pub fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Option<ShaderId> {
        self.dispatch("compile_shader", |r| r.compile_shader(kind, source))
    }

    pub fn compile_shader_from_file(&mut self, kind: ShaderKind, path: impl AsRef<Path>) -> Option<ShaderId> {
        let path = path.as_ref();
        self.dispatch("compile_shader_from_file", |r| r.compile_shader_from_file(kind, path))
    }

    pub fn create_shader_program(&mut self) -> Option<ProgramId> {
        self.dispatch("create_shader_program", |r| r.create_shader_program())
    }

    pub fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.dispatch("attach_shader", |r| r.attach_shader(program, shader));
    }

    pub fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.dispatch("detach_shader", |r| r.detach_shader(program, shader));
    }

    pub fn link_shader_program(&mut self, program: ProgramId) -> bool {
        self.dispatch("link_shader_program", |r| r.link_shader_program(program))
            .is_some()
    }

    /// Creates, attaches and links in one step.
    pub fn link_shaders(&mut self, vertex: ShaderId, fragment: ShaderId) -> Option<ProgramId> {
        self.dispatch("link_shaders", |r| r.link_shaders(vertex, fragment))
    }

    /// Stale or unknown shaders are ignored.
    pub fn free_shader(&mut self, shader: ShaderId) {
        if let Some(r) = self.current_renderer_mut() {
            r.free_shader(shader);
        }
    }

    pub fn free_shader_program(&mut self, program: ProgramId) {
        self.dispatch("free_shader_program", |r| r.free_shader_program(program));
    }

    // ── activation ────────────────────────────────────────────────────────

    /// `None` restores the built-in program.
    pub fn activate_shader_program(&mut self, program: Option<ProgramId>, block: Option<ShaderBlock>) {
        self.dispatch("activate_shader_program", |r| {
            r.activate_shader_program(program, block)
        });
    }

    pub fn deactivate_shader_program(&mut self) {
        self.dispatch("deactivate_shader_program", |r| r.deactivate_shader_program());
    }

    pub fn current_shader_program(&self) -> Option<ProgramId> {
        self.current_renderer().and_then(|r| r.current_shader_program())
    }

    pub fn is_default_shader_program(&self) -> bool {
        self.current_renderer()
            .is_none_or(|r| r.is_default_shader_program())
    }

    pub fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        self.dispatch("attribute_location", |r| r.attribute_location(program, name))
            .flatten()
    }

    pub fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<u32> {
        self.dispatch("uniform_location", |r| r.uniform_location(program, name))
            .flatten()
    }

    /// Looks the named inputs up in `program`; `None` names use the
    /// defaults.
    pub fn load_shader_block(
        &mut self,
        program: ProgramId,
        position_name: Option<&str>,
        texcoord_name: Option<&str>,
        color_name: Option<&str>,
        mvp_name: Option<&str>,
    ) -> Option<ShaderBlock> {
        self.dispatch("load_shader_block", |r| {
            r.load_shader_block(program, position_name, texcoord_name, color_name, mvp_name)
        })
    }

    pub fn set_shader_block(&mut self, block: ShaderBlock) {
        self.dispatch("set_shader_block", |r| r.set_shader_block(block));
    }

    pub fn shader_block(&self) -> ShaderBlock {
        self.current_renderer()
            .map_or(ShaderBlock::builtin(), |r| r.shader_block())
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    fn set_uniform(&mut self, function: &'static str, location: u32, value: UniformValue) {
        self.dispatch(function, |r| r.set_uniform(location, value));
    }

    pub fn set_uniformi(&mut self, location: u32, value: i32) {
        self.set_uniform("set_uniformi", location, UniformValue::Int {
            elems: 1,
            values: vec![value],
        });
    }

    /// `values` holds `values.len() / elems` vectors of `elems` components.
    pub fn set_uniformiv(&mut self, location: u32, elems: u32, values: &[i32]) {
        self.set_uniform("set_uniformiv", location, UniformValue::Int {
            elems,
            values: values.to_vec(),
        });
    }

    pub fn set_uniformui(&mut self, location: u32, value: u32) {
        self.set_uniform("set_uniformui", location, UniformValue::UInt {
            elems: 1,
            values: vec![value],
        });
    }

    pub fn set_uniformuiv(&mut self, location: u32, elems: u32, values: &[u32]) {
        self.set_uniform("set_uniformuiv", location, UniformValue::UInt {
            elems,
            values: values.to_vec(),
        });
    }

    pub fn set_uniformf(&mut self, location: u32, value: f32) {
        self.set_uniform("set_uniformf", location, UniformValue::Float {
            elems: 1,
            values: vec![value],
        });
    }

    pub fn set_uniformfv(&mut self, location: u32, elems: u32, values: &[f32]) {
        self.set_uniform("set_uniformfv", location, UniformValue::Float {
            elems,
            values: values.to_vec(),
        });
    }

    /// `values` holds consecutive `rows × cols` matrices, column-major
    /// unless `transpose` is set.
    pub fn set_uniform_matrixfv(&mut self, location: u32, rows: u32, cols: u32, transpose: bool, values: &[f32]) {
        self.set_uniform("set_uniform_matrixfv", location, UniformValue::Matrix {
            rows,
            cols,
            transpose,
            values: values.to_vec(),
        });
    }

    /// Value last stored at `location` on `program`.
    pub fn get_uniform(&mut self, program: ProgramId, location: u32) -> Option<UniformValue> {
        self.dispatch("get_uniform", |r| r.get_uniform(program, location))
            .flatten()
    }

    // ── attributes ────────────────────────────────────────────────────────

    pub fn set_attributef(&mut self, location: u32, value: f32) {
        self.set_attributefv(location, &[value]);
    }

    /// Constant attribute value (1 to 4 floats).
    pub fn set_attributefv(&mut self, location: u32, values: &[f32]) {
        self.dispatch("set_attributefv", |r| r.set_attributefv(location, values));
    }

    /// Feeds `attribute` for the next `num_values` vertices; `0` removes the
    /// source.
    pub fn set_attribute_source(&mut self, num_values: usize, attribute: Attribute) {
        self.dispatch("set_attribute_source", |r| {
            r.set_attribute_source(num_values, attribute)
        });
    }
}
