//! Deterministic in-memory [`GraphicsContext`].
//!
//! `HeadlessContext` never touches a GPU. It keeps the object tables a GLES 2
//! driver would keep, records every state-changing call as a [`GlCall`], and
//! performs a light GLSL ES 1.00 front-end pass so that compile and link
//! status, info logs, and active-variable lookups behave like a real driver:
//!
//! - unbalanced delimiters or a missing `main` fail compilation;
//! - `attribute` declarations in a fragment shader fail compilation;
//! - linking needs one compiled vertex and one compiled fragment shader, and
//!   every varying the fragment stage reads must be declared by the vertex stage;
//! - declared but unreferenced attributes and uniforms are optimized out, so
//!   their lookups return `None`.
//!
//! Draw calls are validated the way `glGetError` would report them; problems
//! land in [`HeadlessContext::errors`] instead of aborting.

use std::collections::{BTreeSet, HashMap};

use crate::context::{
    AttribLayout, BufferTarget, BufferUsage, Capability, ClearBuffers, DepthFunc,
    GraphicsContext, IndexType, Primitive, ShaderStage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u32);

/// Uniform locations are only meaningful for the program that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformSlot {
    pub program: ProgramId,
    pub index: u32,
}

/// Allocation failures that can be injected into the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fault {
    ShaderAllocation,
    ProgramAllocation,
    BufferAllocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderId, ShaderStage),
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader {
        program: ProgramId,
        shader: ShaderId,
    },
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateBuffer(BufferId),
    BindBuffer {
        target: BufferTarget,
        buffer: Option<BufferId>,
    },
    BufferData {
        target: BufferTarget,
        bytes: usize,
        usage: BufferUsage,
    },
    DeleteBuffer(BufferId),
    VertexAttribPointer {
        index: u32,
        layout: AttribLayout,
    },
    EnableVertexAttribArray(u32),
    UseProgram(Option<ProgramId>),
    UniformMatrix4 {
        location: UniformSlot,
        columns: [f32; 16],
    },
    DrawArrays {
        mode: Primitive,
        first: i32,
        count: i32,
    },
    DrawElements {
        mode: Primitive,
        count: i32,
        index_type: IndexType,
        offset: i32,
    },
    ClearColor([f32; 4]),
    ClearDepth(f32),
    Clear(ClearBuffers),
    Enable(Capability),
    DepthFunc(DepthFunc),
}

impl GlCall {
    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. })
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    ty: String,
    used: bool,
}

#[derive(Debug, Clone, Default)]
struct Interface {
    attributes: Vec<Declaration>,
    uniforms: Vec<Declaration>,
    varyings: Vec<Declaration>,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
    interface: Interface,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: bool,
    info_log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct BufferObject {
    data: Vec<u8>,
    usage: BufferUsage,
}

#[derive(Debug)]
pub struct HeadlessContext {
    size: (u32, u32),
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    buffers: HashMap<BufferId, BufferObject>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,
    current_program: Option<ProgramId>,
    enabled_attribs: BTreeSet<u32>,
    faults: BTreeSet<Fault>,
    calls: Vec<GlCall>,
    errors: Vec<String>,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            next_id: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            bound_array: None,
            bound_element: None,
            current_program: None,
            enabled_attribs: BTreeSet::new(),
            faults: BTreeSet::new(),
            calls: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Changes the drawable size, as a window resize would.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn inject_fault(&mut self, fault: Fault) {
        self.faults.insert(fault);
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<GlCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draw_calls(&self) -> Vec<&GlCall> {
        self.calls.iter().filter(|call| call.is_draw()).collect()
    }

    /// Errors a real driver would have reported through `glGetError`.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|object| object.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<BufferUsage> {
        self.buffers.get(&buffer).map(|object| object.usage)
    }

    pub fn enabled_attribs(&self) -> impl Iterator<Item = u32> + '_ {
        self.enabled_attribs.iter().copied()
    }

    pub fn shader_source_text(&self, shader: ShaderId) -> Option<&str> {
        self.shaders.get(&shader).map(|object| object.source.as_str())
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_fault(&self, fault: Fault) -> Result<(), String> {
        if self.faults.contains(&fault) {
            Err(format!("{fault:?} failed: out of memory"))
        } else {
            Ok(())
        }
    }

    fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::ElementArray => self.bound_element,
        }
    }

    fn record_error(&mut self, message: String) {
        tracing::trace!(%message, "headless context error");
        self.errors.push(message);
    }

    fn validate_draw(&mut self, what: &str) -> bool {
        let linked = self
            .current_program
            .and_then(|program| self.programs.get(&program))
            .is_some_and(|object| object.linked);
        if !linked {
            self.record_error(format!("INVALID_OPERATION: {what}: no valid program in use"));
            return false;
        }
        if self.enabled_attribs.is_empty() {
            self.record_error(format!("INVALID_OPERATION: {what}: no enabled vertex attributes"));
            return false;
        }
        true
    }

    fn link(&self, program: ProgramId) -> Result<(Vec<String>, Vec<String>), String> {
        let attached = match self.programs.get(&program) {
            Some(object) => object.attached.clone(),
            None => return Err("ERROR: program does not exist".into()),
        };

        let mut vertex = None;
        let mut fragment = None;
        for shader in &attached {
            let Some(object) = self.shaders.get(shader) else {
                return Err("ERROR: attached shader was deleted".into());
            };
            let slot = match object.stage {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
            };
            if slot.is_some() {
                return Err(format!(
                    "ERROR: more than one {} shader attached",
                    object.stage
                ));
            }
            *slot = Some(object);
        }

        let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
            return Err(
                "ERROR: one vertex shader and one fragment shader must be attached".into(),
            );
        };
        for object in [vertex, fragment] {
            if !object.compiled {
                return Err(format!(
                    "ERROR: attached {} shader is not compiled",
                    object.stage
                ));
            }
        }

        for varying in fragment.interface.varyings.iter().filter(|v| v.used) {
            match vertex
                .interface
                .varyings
                .iter()
                .find(|candidate| candidate.name == varying.name)
            {
                None => {
                    return Err(format!(
                        "ERROR: varying '{}' is not declared in the vertex shader",
                        varying.name
                    ))
                }
                Some(declared) if declared.ty != varying.ty => {
                    return Err(format!(
                        "ERROR: varying '{}' has type {} in the vertex shader but {} in the fragment shader",
                        varying.name, declared.ty, varying.ty
                    ))
                }
                Some(_) => {}
            }
        }

        for uniform in &fragment.interface.uniforms {
            if let Some(other) = vertex
                .interface
                .uniforms
                .iter()
                .find(|candidate| candidate.name == uniform.name)
            {
                if other.ty != uniform.ty {
                    return Err(format!(
                        "ERROR: uniform '{}' differs in type between shader stages",
                        uniform.name
                    ));
                }
            }
        }

        let attributes = vertex
            .interface
            .attributes
            .iter()
            .filter(|decl| decl.used)
            .map(|decl| decl.name.clone())
            .collect();

        let mut uniforms: Vec<String> = Vec::new();
        for decl in vertex
            .interface
            .uniforms
            .iter()
            .chain(fragment.interface.uniforms.iter())
            .filter(|decl| decl.used)
        {
            if !uniforms.contains(&decl.name) {
                uniforms.push(decl.name.clone());
            }
        }

        Ok((attributes, uniforms))
    }
}

impl GraphicsContext for HeadlessContext {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Buffer = BufferId;
    type UniformLocation = UniformSlot;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderId, String> {
        self.check_fault(Fault::ShaderAllocation)?;
        let id = ShaderId(self.allocate());
        self.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
                interface: Interface::default(),
            },
        );
        self.calls.push(GlCall::CreateShader(id, stage));
        Ok(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        self.calls.push(GlCall::ShaderSource(shader));
        match self.shaders.get_mut(&shader) {
            Some(object) => object.source = source.to_string(),
            None => self.record_error("INVALID_VALUE: shaderSource on unknown shader".into()),
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        self.calls.push(GlCall::CompileShader(shader));
        let Some(object) = self.shaders.get_mut(&shader) else {
            self.record_error("INVALID_VALUE: compileShader on unknown shader".into());
            return;
        };
        match glsl::analyze(object.stage, &object.source) {
            Ok(interface) => {
                object.compiled = true;
                object.info_log.clear();
                object.interface = interface;
            }
            Err(log) => {
                object.compiled = false;
                object.info_log = log;
                object.interface = Interface::default();
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders.get(&shader).is_some_and(|object| object.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.calls.push(GlCall::DeleteShader(shader));
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Result<ProgramId, String> {
        self.check_fault(Fault::ProgramAllocation)?;
        let id = ProgramId(self.allocate());
        self.programs.insert(id, ProgramObject::default());
        self.calls.push(GlCall::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(GlCall::AttachShader { program, shader });
        if !self.shaders.contains_key(&shader) {
            self.record_error("INVALID_VALUE: attachShader with unknown shader".into());
            return;
        }
        match self.programs.get_mut(&program) {
            Some(object) if !object.attached.contains(&shader) => object.attached.push(shader),
            Some(_) => self.record_error("INVALID_OPERATION: shader already attached".into()),
            None => self.record_error("INVALID_VALUE: attachShader on unknown program".into()),
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        self.calls.push(GlCall::LinkProgram(program));
        let outcome = self.link(program);
        let Some(object) = self.programs.get_mut(&program) else {
            self.record_error("INVALID_VALUE: linkProgram on unknown program".into());
            return;
        };
        match outcome {
            Ok((attributes, uniforms)) => {
                object.linked = true;
                object.info_log.clear();
                object.attributes = attributes;
                object.uniforms = uniforms;
            }
            Err(log) => {
                object.linked = false;
                object.info_log = log;
                object.attributes.clear();
                object.uniforms.clear();
            }
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs.get(&program).is_some_and(|object| object.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(GlCall::DeleteProgram(program));
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_buffer(&mut self) -> Result<BufferId, String> {
        self.check_fault(Fault::BufferAllocation)?;
        let id = BufferId(self.allocate());
        self.buffers.insert(id, BufferObject::default());
        self.calls.push(GlCall::CreateBuffer(id));
        Ok(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.calls.push(GlCall::BindBuffer { target, buffer });
        if let Some(id) = buffer {
            if !self.buffers.contains_key(&id) {
                self.record_error("INVALID_OPERATION: bindBuffer with deleted buffer".into());
                return;
            }
        }
        match target {
            BufferTarget::Array => self.bound_array = buffer,
            BufferTarget::ElementArray => self.bound_element = buffer,
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.calls.push(GlCall::BufferData {
            target,
            bytes: data.len(),
            usage,
        });
        let Some(id) = self.bound(target) else {
            self.record_error(format!("INVALID_OPERATION: bufferData with no {target:?} buffer bound"));
            return;
        };
        if let Some(object) = self.buffers.get_mut(&id) {
            object.data = data.to_vec();
            object.usage = usage;
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.calls.push(GlCall::DeleteBuffer(buffer));
        self.buffers.remove(&buffer);
        if self.bound_array == Some(buffer) {
            self.bound_array = None;
        }
        if self.bound_element == Some(buffer) {
            self.bound_element = None;
        }
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let object = self.programs.get(&program).filter(|object| object.linked)?;
        object
            .attributes
            .iter()
            .position(|attribute| attribute == name)
            .map(|index| index as u32)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformSlot> {
        let object = self.programs.get(&program).filter(|object| object.linked)?;
        object
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| UniformSlot {
                program,
                index: index as u32,
            })
    }

    fn vertex_attrib_pointer_f32(&mut self, index: u32, layout: AttribLayout) {
        self.calls.push(GlCall::VertexAttribPointer { index, layout });
        if self.bound_array.is_none() {
            self.record_error("INVALID_OPERATION: vertexAttribPointer with no ARRAY_BUFFER bound".into());
        }
        if !(1..=4).contains(&layout.components) {
            self.record_error(format!(
                "INVALID_VALUE: vertexAttribPointer size {}",
                layout.components
            ));
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(GlCall::EnableVertexAttribArray(index));
        self.enabled_attribs.insert(index);
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(GlCall::UseProgram(program));
        if let Some(id) = program {
            if !self.program_link_status(id) {
                self.record_error("INVALID_OPERATION: useProgram with unlinked program".into());
                return;
            }
        }
        self.current_program = program;
    }

    fn uniform_matrix_4(&mut self, location: &UniformSlot, columns: &[f32; 16]) {
        self.calls.push(GlCall::UniformMatrix4 {
            location: *location,
            columns: *columns,
        });
        if self.current_program != Some(location.program) {
            self.record_error(
                "INVALID_OPERATION: uniformMatrix4fv location does not belong to the current program"
                    .into(),
            );
        }
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        self.calls.push(GlCall::DrawArrays { mode, first, count });
        if first < 0 || count < 0 {
            self.record_error("INVALID_VALUE: drawArrays with negative range".into());
            return;
        }
        self.validate_draw("drawArrays");
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32, index_type: IndexType, offset: i32) {
        self.calls.push(GlCall::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
        if !self.validate_draw("drawElements") {
            return;
        }
        let Some(buffer) = self.bound_element else {
            self.record_error("INVALID_OPERATION: drawElements with no ELEMENT_ARRAY_BUFFER bound".into());
            return;
        };
        let available = self
            .buffers
            .get(&buffer)
            .map(|object| object.data.len())
            .unwrap_or(0);
        let needed = match index_type {
            IndexType::U16 => (count.max(0) as usize) * 2 + offset.max(0) as usize,
        };
        if needed > available {
            self.record_error(format!(
                "INVALID_OPERATION: drawElements reads {needed} bytes from a {available}-byte index buffer"
            ));
        }
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.calls.push(GlCall::ClearColor(rgba));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.calls.push(GlCall::ClearDepth(depth));
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        self.calls.push(GlCall::Clear(buffers));
    }

    fn enable(&mut self, capability: Capability) {
        self.calls.push(GlCall::Enable(capability));
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.calls.push(GlCall::DepthFunc(func));
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }
}

mod glsl {
    use super::{Declaration, Interface};
    use crate::context::ShaderStage;

    /// Front-end pass: delimiter balance, `main`, and global declarations.
    pub(super) fn analyze(stage: ShaderStage, source: &str) -> Result<Interface, String> {
        let stripped = strip_comments(source);
        check_delimiters(&stripped)?;

        let mut interface = Interface::default();
        for (line, statement) in global_statements(&stripped) {
            let tokens: Vec<&str> = statement.split_whitespace().collect();
            let Some(&qualifier) = tokens.first() else {
                continue;
            };
            if !matches!(qualifier, "attribute" | "uniform" | "varying") {
                continue;
            }
            if qualifier == "attribute" && stage == ShaderStage::Fragment {
                return Err(format!(
                    "ERROR: 0:{line}: 'attribute' : supported in vertex shaders only"
                ));
            }
            let rest: Vec<&str> = tokens[1..]
                .iter()
                .copied()
                .filter(|token| !matches!(*token, "lowp" | "mediump" | "highp"))
                .collect();
            let [ty, name] = rest.as_slice() else {
                return Err(format!(
                    "ERROR: 0:{line}: '{qualifier}' : syntax error in declaration"
                ));
            };
            let (ty, name) = (*ty, *name);
            let name = name.split('[').next().unwrap_or(name);
            if !is_identifier(ty) || !is_identifier(name) {
                return Err(format!("ERROR: 0:{line}: '{name}' : syntax error"));
            }
            let declaration = Declaration {
                name: name.to_string(),
                ty: ty.to_string(),
                used: identifier_count(&stripped, name) > 1,
            };
            match qualifier {
                "attribute" => interface.attributes.push(declaration),
                "uniform" => interface.uniforms.push(declaration),
                _ => interface.varyings.push(declaration),
            }
        }

        if !has_main(&stripped) {
            return Err("ERROR: 0:1: 'main' : function not defined".into());
        }

        Ok(interface)
    }

    fn strip_comments(source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '/' && chars.peek() == Some(&'/') {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            } else if ch == '/' && chars.peek() == Some(&'*') {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                out.push(' ');
            } else {
                out.push(ch);
            }
        }
        out
    }

    fn check_delimiters(source: &str) -> Result<(), String> {
        let mut stack: Vec<(char, usize)> = Vec::new();
        let mut line = 1;
        for ch in source.chars() {
            match ch {
                '\n' => line += 1,
                '(' | '{' | '[' => stack.push((ch, line)),
                ')' | '}' | ']' => {
                    let expected = match ch {
                        ')' => '(',
                        '}' => '{',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => return Err(format!("ERROR: 0:{line}: '{ch}' : syntax error")),
                    }
                }
                _ => {}
            }
        }
        match stack.pop() {
            Some((open, opened_at)) => Err(format!(
                "ERROR: 0:{opened_at}: '{open}' : unexpected end of file"
            )),
            None => Ok(()),
        }
    }

    /// Statements at global scope with the line they start on. Function bodies
    /// are skipped.
    fn global_statements(source: &str) -> Vec<(usize, String)> {
        let mut statements = Vec::new();
        let mut current = String::new();
        let mut start_line = 1;
        let mut line = 1;
        let mut depth = 0usize;
        for ch in source.chars() {
            if ch == '\n' {
                line += 1;
            }
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        current.clear();
                    }
                }
                ';' if depth == 0 => {
                    statements.push((start_line, std::mem::take(&mut current)));
                }
                _ if depth == 0 => {
                    if current.trim().is_empty() && !ch.is_whitespace() {
                        start_line = line;
                    }
                    current.push(ch);
                }
                _ => {}
            }
        }
        statements
    }

    fn has_main(source: &str) -> bool {
        let tokens = identifiers(source);
        tokens
            .windows(2)
            .any(|pair| pair[0] == "void" && pair[1] == "main")
    }

    fn identifiers(source: &str) -> Vec<&str> {
        source
            .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
            .filter(|token| !token.is_empty())
            .collect()
    }

    fn identifier_count(source: &str, name: &str) -> usize {
        identifiers(source)
            .into_iter()
            .filter(|token| *token == name)
            .count()
    }

    fn is_identifier(token: &str) -> bool {
        let mut chars = token.chars();
        matches!(chars.next(), Some(ch) if ch.is_ascii_alphabetic() || ch == '_')
            && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }
}
