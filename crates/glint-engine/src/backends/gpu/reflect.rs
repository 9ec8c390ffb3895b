//! Just enough WGSL reflection to answer name lookups the way a GL program
//! would: entry points, vertex input locations and the user uniform block.
//!
//! Conventions the wgpu backend binds against:
//! - `@group(0)`: `@binding(0)` the MVP matrix, `@binding(1)` the texture,
//!   `@binding(2)` the sampler.
//! - `@group(1) @binding(0) var<uniform>`: one user struct. A field's
//!   uniform location is its byte offset divided by four.

use crate::shader::ShaderKind;

/// A `@group(1) @binding(0)` uniform struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformBlock {
    pub var_name: String,
    /// Buffer size in bytes, padded to 16.
    pub size: u32,
    /// Field name and byte offset.
    pub fields: Vec<(String, u32)>,
}

impl UniformBlock {
    pub fn location(&self, name: &str) -> Option<u32> {
        let field = name
            .strip_prefix(self.var_name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        self.fields
            .iter()
            .find(|(n, _)| n == field)
            .map(|(_, offset)| offset / 4)
    }

    pub fn words(&self) -> usize {
        self.size as usize / 4
    }
}

/// What one compiled module exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Reflection {
    pub vertex_entry: Option<String>,
    pub fragment_entry: Option<String>,
    /// `@location` inputs of the vertex entry point.
    pub attributes: Vec<(String, u32)>,
    pub uniforms: Option<UniformBlock>,
}

impl Reflection {
    pub fn entry(&self, kind: ShaderKind) -> Option<&str> {
        match kind {
            ShaderKind::Vertex => self.vertex_entry.as_deref(),
            ShaderKind::Fragment => self.fragment_entry.as_deref(),
        }
    }
}

pub(crate) fn reflect(source: &str) -> Result<Reflection, String> {
    let src = strip_comments(source);
    let vertex_entry = entry_point(&src, "@vertex");
    let fragment_entry = entry_point(&src, "@fragment");
    let attributes = match &vertex_entry {
        Some(name) => vertex_inputs(&src, name),
        None => Vec::new(),
    };
    let uniforms = uniform_block(&src)?;
    Ok(Reflection {
        vertex_entry,
        fragment_entry,
        attributes,
        uniforms,
    })
}

// ── lexical helpers ───────────────────────────────────────────────────────

fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut depth = 0usize;
    while let Some(c) = chars.next() {
        if depth > 0 {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                depth -= 1;
            } else if c == '/' && chars.peek() == Some(&'*') {
                chars.next();
                depth += 1;
            }
            continue;
        }
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                depth = 1;
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident_at(s: &str) -> &str {
    let s = s.trim_start();
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    &s[..end]
}

/// Index of the bracket closing the one at `open`.
fn matching(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let (o, c) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'{' => (b'{', b'}'),
        b'<' => (b'<', b'>'),
        b'[' => (b'[', b']'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == o {
            depth += 1;
        } else if b == c {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Splits on any of `seps` outside brackets; empty pieces are dropped.
fn split_top_level<'a>(s: &'a str, seps: &[char]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => depth -= 1,
            c if depth == 0 && seps.contains(&c) => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Finds whole-word occurrences of `word`.
fn word_positions<'a>(s: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    s.match_indices(word).filter_map(move |(i, _)| {
        let before = s[..i].chars().next_back();
        let after = s[i + word.len()..].chars().next();
        let clean = !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char);
        clean.then_some(i)
    })
}

// ── declarations ──────────────────────────────────────────────────────────

/// A parsed `@attr(...) name: type` declaration.
#[derive(Debug, Default)]
struct Decl<'a> {
    location: Option<u32>,
    group: Option<u32>,
    binding: Option<u32>,
    name: &'a str,
    ty: &'a str,
}

fn parse_decl(mut s: &str) -> Decl<'_> {
    let mut decl = Decl::default();
    loop {
        s = s.trim_start();
        let Some(rest) = s.strip_prefix('@') else { break };
        let attr = ident_at(rest);
        let mut tail = &rest[attr.len()..];
        let mut arg = None;
        let trimmed = tail.trim_start();
        if trimmed.starts_with('(') {
            if let Some(close) = matching(trimmed, 0) {
                arg = trimmed[1..close].trim().parse::<u32>().ok();
                tail = &trimmed[close + 1..];
            }
        }
        match attr {
            "location" => decl.location = arg,
            "group" => decl.group = arg,
            "binding" => decl.binding = arg,
            _ => {}
        }
        s = tail;
    }
    if let Some((name, ty)) = s.split_once(':') {
        decl.name = ident_at(name);
        decl.ty = ty.trim();
    }
    decl
}

fn entry_point(src: &str, stage: &str) -> Option<String> {
    for (i, _) in src.match_indices(stage) {
        let rest = &src[i + stage.len()..];
        if rest.starts_with(is_ident_char) {
            continue;
        }
        let Some(fn_at) = word_positions(rest, "fn").next() else { continue };
        // Only attributes may sit between the stage and `fn`.
        if !rest[..fn_at].trim().is_empty() && !rest[..fn_at].trim_start().starts_with('@') {
            continue;
        }
        let name = ident_at(&rest[fn_at + 2..]);
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

fn struct_body<'a>(src: &'a str, name: &str) -> Option<&'a str> {
    for at in word_positions(src, "struct") {
        let rest = &src[at + "struct".len()..];
        if ident_at(rest) != name {
            continue;
        }
        let open = at + "struct".len() + rest.find('{')?;
        let close = matching(src, open)?;
        return Some(&src[open + 1..close]);
    }
    None
}

fn vertex_inputs(src: &str, entry: &str) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    for at in word_positions(src, "fn") {
        let rest = &src[at + 2..];
        if ident_at(rest) != entry {
            continue;
        }
        let Some(open) = rest.find('(') else { break };
        let Some(close) = matching(rest, open) else { break };
        for param in split_top_level(&rest[open + 1..close], &[',']) {
            let decl = parse_decl(param);
            match decl.location {
                Some(loc) => out.push((decl.name.to_string(), loc)),
                None => {
                    if let Some(body) = struct_body(src, ident_at(decl.ty)) {
                        for field in split_top_level(body, &[',', ';']) {
                            let f = parse_decl(field);
                            if let Some(loc) = f.location {
                                out.push((f.name.to_string(), loc));
                            }
                        }
                    }
                }
            }
        }
        break;
    }
    out
}

fn uniform_block(src: &str) -> Result<Option<UniformBlock>, String> {
    for (at, _) in src.match_indices("var<uniform>") {
        let start = src[..at].rfind([';', '}']).map_or(0, |i| i + 1);
        let attrs = parse_decl(&src[start..at]);
        if attrs.group != Some(1) || attrs.binding != Some(0) {
            continue;
        }
        let rest = &src[at + "var<uniform>".len()..];
        let decl_end = rest.find(';').unwrap_or(rest.len());
        let decl = parse_decl(&rest[..decl_end]);
        let ty = ident_at(decl.ty);
        let body = struct_body(src, ty)
            .ok_or_else(|| format!("uniform `{}` must be a struct type", decl.name))?;
        let mut offset = 0u32;
        let mut align = 16u32;
        let mut fields = Vec::new();
        for field in split_top_level(body, &[',', ';']) {
            let f = parse_decl(field);
            let (a, size) = type_layout(src, f.ty, 0)
                .ok_or_else(|| format!("unsupported uniform field type `{}`", f.ty))?;
            offset = round_up(offset, a);
            fields.push((f.name.to_string(), offset));
            offset += size;
            align = align.max(a);
        }
        return Ok(Some(UniformBlock {
            var_name: decl.name.to_string(),
            size: round_up(offset.max(16), align),
            fields,
        }));
    }
    Ok(None)
}

#[inline]
fn round_up(v: u32, align: u32) -> u32 {
    v.div_ceil(align) * align
}

/// (alignment, size) of a type in the uniform address space.
fn type_layout(src: &str, ty: &str, depth: u32) -> Option<(u32, u32)> {
    let ty = ty.trim();
    let (base, generic) = match ty.find('<') {
        Some(open) => {
            let close = matching(ty, open)?;
            (ty[..open].trim(), Some(&ty[open + 1..close]))
        }
        None => (ty, None),
    };
    let scalar = |s: &str| -> Option<u32> {
        match s.trim() {
            "f32" | "i32" | "u32" => Some(4),
            "f16" => Some(2),
            _ => None,
        }
    };
    let elem = |suffix: Option<char>| -> Option<u32> {
        match (suffix, generic) {
            (Some('f' | 'i' | 'u'), None) => Some(4),
            (Some('h'), None) => Some(2),
            (None, Some(g)) => scalar(g),
            _ => None,
        }
    };
    if let Some(s) = scalar(base) {
        return Some((s, s));
    }
    if let Some(rest) = base.strip_prefix("vec") {
        let mut chars = rest.chars();
        let n = chars.next()?.to_digit(10)?;
        let e = elem(chars.next())?;
        return Some(vec_layout(n, e));
    }
    if let Some(rest) = base.strip_prefix("mat") {
        let mut chars = rest.chars();
        let cols = chars.next()?.to_digit(10)?;
        if chars.next()? != 'x' {
            return None;
        }
        let rows = chars.next()?.to_digit(10)?;
        let e = elem(chars.next())?;
        let (a, s) = vec_layout(rows, e);
        return Some((a, cols * round_up(s, a)));
    }
    if base == "array" {
        let parts = split_top_level(generic?, &[',']);
        let (a, s) = type_layout(src, parts.first()?, depth)?;
        let n: u32 = parts.get(1)?.trim().trim_end_matches('u').parse().ok()?;
        let stride = round_up(round_up(s, a), 16);
        return Some((round_up(a, 16), stride * n));
    }
    // Nested struct.
    if depth > 8 {
        return None;
    }
    let body = struct_body(src, base)?;
    let mut offset = 0;
    let mut align = 1;
    for field in split_top_level(body, &[',', ';']) {
        let f = parse_decl(field);
        let (a, s) = type_layout(src, f.ty, depth + 1)?;
        offset = round_up(offset, a) + s;
        align = align.max(a);
    }
    let align = round_up(align, 16);
    Some((align, round_up(offset, align)))
}

fn vec_layout(n: u32, elem: u32) -> (u32, u32) {
    match n {
        2 => (2 * elem, 2 * elem),
        3 => (4 * elem, 3 * elem),
        _ => (4 * elem, 4 * elem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPRITE: &str = r#"
        // tinted sprite
        struct Params {
            tint: vec4<f32>,
            time: f32,
            offset: vec2f,
            /* ignored: vec3<f32> */
            model: mat4x4<f32>,
        }

        @group(1) @binding(0) var<uniform> params: Params;

        struct VsIn {
            @location(0) gpu_Vertex: vec3<f32>,
            @location(3) weight: f32,
        }

        struct VsOut {
            @builtin(position) pos: vec4<f32>,
            @location(0) uv: vec2<f32>,
        }

        @vertex
        fn vs_sprite(input: VsIn, @location(1) gpu_TexCoord: vec2<f32>) -> VsOut {
            var out: VsOut;
            return out;
        }

        @fragment fn fs_sprite(in: VsOut) -> @location(0) vec4<f32> {
            return params.tint;
        }
    "#;

    #[test]
    fn finds_entry_points() {
        let r = reflect(SPRITE).unwrap();
        assert_eq!(r.vertex_entry.as_deref(), Some("vs_sprite"));
        assert_eq!(r.entry(ShaderKind::Fragment), Some("fs_sprite"));
    }

    #[test]
    fn vertex_inputs_come_from_params_and_structs() {
        let r = reflect(SPRITE).unwrap();
        assert_eq!(
            r.attributes,
            vec![
                ("gpu_Vertex".to_string(), 0),
                ("weight".to_string(), 3),
                ("gpu_TexCoord".to_string(), 1),
            ]
        );
    }

    #[test]
    fn uniform_offsets_follow_wgsl_layout() {
        let block = reflect(SPRITE).unwrap().uniforms.unwrap();
        assert_eq!(block.location("tint"), Some(0));
        assert_eq!(block.location("time"), Some(4));
        // vec2 aligns to 8 bytes.
        assert_eq!(block.location("offset"), Some(6));
        assert_eq!(block.location("params.model"), Some(8));
        assert_eq!(block.size, 96);
        assert_eq!(block.location("missing"), None);
    }

    #[test]
    fn arrays_use_sixteen_byte_strides() {
        let src = "struct U { a: array<f32, 4>, b: f32 }\n@group(1) @binding(0) var<uniform> u: U;";
        let block = reflect(src).unwrap().uniforms.unwrap();
        assert_eq!(block.location("b"), Some(16));
        assert_eq!(block.size, 80);
    }

    #[test]
    fn other_groups_are_not_user_uniforms() {
        let src = "@group(0) @binding(0) var<uniform> mvp: mat4x4<f32>;";
        assert_eq!(reflect(src).unwrap().uniforms, None);
    }

    #[test]
    fn non_struct_user_uniform_is_rejected() {
        let src = "@group(1) @binding(0) var<uniform> t: f32;";
        assert!(reflect(src).is_err());
    }

    #[test]
    fn nested_comments_are_stripped() {
        let s = strip_comments("a /* b /* c */ d */ e // f\ng");
        assert_eq!(s.split_whitespace().collect::<Vec<_>>(), vec!["a", "e", "g"]);
    }
}
