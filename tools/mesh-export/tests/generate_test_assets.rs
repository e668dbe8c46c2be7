//! Test asset generation
//!
//! Writes small OBJ and glTF scenes for integration testing. glTF files are
//! built as JSON with an external `.bin` buffer.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate a single textured triangle
pub fn generate_triangle_obj(path: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "# Single triangle")?;
    writeln!(file, "v 0 0 0")?;
    writeln!(file, "v 1 0 0")?;
    writeln!(file, "v 0 1 0")?;
    writeln!(file, "vt 0 0")?;
    writeln!(file, "vt 1 0")?;
    writeln!(file, "vt 0 1")?;
    writeln!(file, "vn 0 0 1")?;
    writeln!(file, "f 1/1/1 2/2/1 3/3/1")?;
    Ok(())
}

/// Generate two quad groups (floor and wall) sharing attribute arrays
pub fn generate_two_group_obj(path: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "# Floor and wall")?;
    for v in ["0 0 0", "1 0 0", "1 0 1", "0 0 1", "0 1 0", "1 1 0"] {
        writeln!(file, "v {}", v)?;
    }
    for vt in ["0 0", "1 0", "1 1", "0 1"] {
        writeln!(file, "vt {}", vt)?;
    }
    writeln!(file, "vn 0 1 0")?;
    writeln!(file, "vn 0 0 -1")?;
    writeln!(file, "g floor")?;
    writeln!(file, "f 1/1/1 2/2/1 3/3/1 4/4/1")?;
    writeln!(file, "g wall")?;
    writeln!(file, "f 1/1/2 5/4/2 6/3/2 2/2/2")?;
    Ok(())
}

/// Binary buffer under construction; every view starts 4-byte aligned
#[derive(Default)]
struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<Value>,
}

impl BufferBuilder {
    /// Append raw little-endian values, returning the new view index
    fn push(&mut self, bytes: Vec<u8>) -> usize {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.data.len(),
            "byteLength": bytes.len(),
        }));
        self.data.extend(bytes);
        self.views.len() - 1
    }

    fn push_f32(&mut self, values: &[f32]) -> usize {
        self.push(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    fn push_u16(&mut self, values: &[u16]) -> usize {
        self.push(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }
}

fn accessor(view: usize, component_type: u32, count: usize, kind: &str) -> Value {
    json!({
        "bufferView": view,
        "componentType": component_type,
        "count": count,
        "type": kind,
    })
}

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;

/// Generate a skinned triangle: `Body` (mesh) bound to `Root -> Spine`.
///
/// Vertex 2 is shared between both joints. With `overweight`, a second
/// joint/weight set gives vertex 2 five influences.
///
/// Returns the `.gltf` path.
pub fn generate_skinned_gltf(dir: &Path, name: &str, overweight: bool) -> std::io::Result<PathBuf> {
    let mut buffer = BufferBuilder::default();

    let positions = buffer.push_f32(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let normals = buffer.push_f32(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    let uvs = buffer.push_f32(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);

    let (joints0, weights0): (&[u16], &[f32]) = if overweight {
        (
            &[0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 1],
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.2, 0.2, 0.2, 0.2],
        )
    } else {
        (
            &[0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0],
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0],
        )
    };
    let joints0 = buffer.push_u16(joints0);
    let weights0 = buffer.push_f32(weights0);

    // Column-major inverse bind matrices: identity, translate(0, -1, 0)
    let mut inverse_bind = vec![
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
    inverse_bind.extend([
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 1.0,
    ]);
    let inverse_bind = buffer.push_f32(&inverse_bind);
    let indices = buffer.push_u16(&[0, 1, 2]);

    let mut accessors = vec![
        json!({
            "bufferView": positions,
            "componentType": FLOAT,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0],
        }),
        accessor(normals, FLOAT, 3, "VEC3"),
        accessor(uvs, FLOAT, 3, "VEC2"),
        accessor(joints0, UNSIGNED_SHORT, 3, "VEC4"),
        accessor(weights0, FLOAT, 3, "VEC4"),
        accessor(inverse_bind, FLOAT, 2, "MAT4"),
        accessor(indices, UNSIGNED_SHORT, 3, "SCALAR"),
    ];

    let mut attributes = json!({
        "POSITION": 0,
        "NORMAL": 1,
        "TEXCOORD_0": 2,
        "JOINTS_0": 3,
        "WEIGHTS_0": 4,
    });

    if overweight {
        let joints1 = buffer.push_u16(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
        let weights1 = buffer.push_f32(&[
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2, 0.0, 0.0, 0.0,
        ]);
        accessors.push(accessor(joints1, UNSIGNED_SHORT, 3, "VEC4"));
        accessors.push(accessor(weights1, FLOAT, 3, "VEC4"));
        attributes["JOINTS_1"] = json!(7);
        attributes["WEIGHTS_1"] = json!(8);
    }

    let bin_name = format!("{}.bin", name);
    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "skin": 0 },
            { "name": "Root", "children": [2] },
            { "name": "Spine", "translation": [0.0, 1.0, 0.0] },
        ],
        "meshes": [{
            "name": "Body",
            "primitives": [{ "attributes": attributes, "indices": 6 }],
        }],
        "skins": [{ "inverseBindMatrices": 5, "joints": [1, 2] }],
        "accessors": accessors,
        "bufferViews": buffer.views,
        "buffers": [{ "uri": bin_name, "byteLength": buffer.data.len() }],
    });

    fs::write(dir.join(&bin_name), &buffer.data)?;
    let gltf_path = dir.join(format!("{}.gltf", name));
    fs::write(&gltf_path, serde_json::to_vec_pretty(&document)?)?;
    Ok(gltf_path)
}
