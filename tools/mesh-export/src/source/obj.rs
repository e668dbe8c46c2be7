//! OBJ scene reader
//!
//! Each group (`g`/`o`) becomes a root-level node. All groups index into the
//! same attribute arrays.

use glam::{Vec2, Vec3};
use hashbrown::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{SceneSource, SourceGeometry, SourceGroup, SourceNode, SourceScene};
use crate::error::ConvertError;
use crate::mesh::{Corner, Face, RawAttributes};

pub struct ObjSource {
    path: PathBuf,
}

impl ObjSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SceneSource for ObjSource {
    fn read_scene(&self) -> Result<SourceScene, ConvertError> {
        let file = File::open(&self.path)?;
        let default_name = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("default");
        parse_obj(BufReader::new(file), default_name)
    }
}

#[derive(Debug, Default)]
struct ObjGroup {
    name: String,
    faces: Vec<Face>,
}

/// Parser state, passed by value through every statement handler
#[derive(Debug, Default)]
struct ObjContext {
    attributes: RawAttributes,
    groups: Vec<ObjGroup>,
    current: ObjGroup,
}

type Handler = fn(ObjContext, &[&str]) -> Result<ObjContext, String>;

fn handler_for(keyword: &str) -> Option<Handler> {
    match keyword {
        "v" => Some(process_position),
        "vt" => Some(process_texcoord),
        "vn" => Some(process_normal),
        "f" => Some(process_face),
        "g" | "o" => Some(process_group),
        _ => None,
    }
}

/// Parse OBJ text into a scene. Faces before the first group statement belong
/// to a group called `default_name`.
pub fn parse_obj<R: BufRead>(reader: R, default_name: &str) -> Result<SourceScene, ConvertError> {
    let mut context = ObjContext {
        current: ObjGroup {
            name: default_name.to_string(),
            faces: Vec::new(),
        },
        ..ObjContext::default()
    };
    let mut unknown: HashSet<String> = HashSet::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(handler) = handler_for(tokens[0]) else {
            if unknown.insert(tokens[0].to_string()) {
                tracing::warn!("OBJ: ignoring unsupported statement '{}'", tokens[0]);
            }
            continue;
        };

        context = handler(context, &tokens[1..]).map_err(|message| ConvertError::Parse {
            line: line_index + 1,
            message,
        })?;
    }

    Ok(finish(context))
}

fn finish(mut context: ObjContext) -> SourceScene {
    if !context.current.faces.is_empty() {
        context.groups.push(context.current);
    }

    let attributes = Rc::new(context.attributes);
    let roots = context
        .groups
        .into_iter()
        .map(|group| {
            tracing::debug!("OBJ group '{}': {} faces", group.name, group.faces.len());
            let mut node = SourceNode::new(group.name.clone());
            node.geometry = Some(SourceGeometry {
                name: group.name.clone(),
                groups: vec![SourceGroup {
                    name: group.name,
                    attributes: Rc::clone(&attributes),
                    faces: group.faces,
                    influences: None,
                }],
                skin: None,
            });
            node
        })
        .collect();

    SourceScene { roots }
}

fn process_position(mut context: ObjContext, tokens: &[&str]) -> Result<ObjContext, String> {
    if tokens.len() < 2 {
        return Err(format!("vertex needs at least 2 components, got {}", tokens.len()));
    }
    let z = match tokens.get(2) {
        Some(t) => parse_float(t)?,
        None => 0.0,
    };
    context
        .attributes
        .positions
        .push(Vec3::new(parse_float(tokens[0])?, parse_float(tokens[1])?, z));
    Ok(context)
}

fn process_texcoord(mut context: ObjContext, tokens: &[&str]) -> Result<ObjContext, String> {
    if tokens.len() < 2 {
        return Err(format!("texcoord needs at least 2 components, got {}", tokens.len()));
    }
    context
        .attributes
        .uvs
        .push(Vec2::new(parse_float(tokens[0])?, parse_float(tokens[1])?));
    Ok(context)
}

fn process_normal(mut context: ObjContext, tokens: &[&str]) -> Result<ObjContext, String> {
    if tokens.len() != 3 {
        return Err(format!("normal needs 3 components, got {}", tokens.len()));
    }
    context.attributes.normals.push(Vec3::new(
        parse_float(tokens[0])?,
        parse_float(tokens[1])?,
        parse_float(tokens[2])?,
    ));
    Ok(context)
}

fn process_face(mut context: ObjContext, tokens: &[&str]) -> Result<ObjContext, String> {
    let face = tokens
        .iter()
        .map(|token| parse_corner(token, &context.attributes))
        .collect::<Result<Face, String>>()?;
    context.current.faces.push(face);
    Ok(context)
}

fn process_group(mut context: ObjContext, tokens: &[&str]) -> Result<ObjContext, String> {
    let name = if tokens.is_empty() {
        "default".to_string()
    } else {
        tokens.join(" ")
    };

    if context.current.faces.is_empty() {
        // Nothing emitted under the previous name yet
        context.current.name = name;
    } else {
        let finished = mem::replace(
            &mut context.current,
            ObjGroup {
                name,
                faces: Vec::new(),
            },
        );
        context.groups.push(finished);
    }
    Ok(context)
}

/// Parse a face corner: `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn parse_corner(token: &str, attributes: &RawAttributes) -> Result<Corner, String> {
    let mut parts = token.split('/');
    let position = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("face corner '{}' has no position index", token))?;
    let position = resolve_index(position, attributes.positions.len())?;

    let optional = |part: Option<&str>, len: usize| -> Result<Option<u32>, String> {
        match part {
            Some(s) if !s.is_empty() => resolve_index(s, len).map(Some),
            _ => Ok(None),
        }
    };
    let uv = optional(parts.next(), attributes.uvs.len())?;
    let normal = optional(parts.next(), attributes.normals.len())?;

    Ok(Corner::new(position, uv, normal))
}

/// Convert a 1-based (or negative, relative) OBJ index to 0-based.
///
/// Range checking against the attribute arrays happens during welding.
fn resolve_index(token: &str, len: usize) -> Result<u32, String> {
    let value: i64 = token
        .parse()
        .map_err(|_| format!("invalid index '{}'", token))?;
    let resolved = match value {
        v if v > 0 => v - 1,
        v if v < 0 => len as i64 + v,
        _ => return Err("index 0 is not valid in OBJ".to_string()),
    };
    u32::try_from(resolved).map_err(|_| format!("index '{}' out of range", token))
}

fn parse_float(token: &str) -> Result<f32, String> {
    token
        .parse()
        .map_err(|_| format!("invalid number '{}'", token))
}
