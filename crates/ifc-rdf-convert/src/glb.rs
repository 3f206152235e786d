// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary glTF 2.0 writer
//!
//! Every geometry record becomes one node with one mesh holding one
//! primitive. All vertex and index data lives in a single binary buffer,
//! each segment starting on a 4-byte boundary.

use crate::error::{ConvertError, Result};
use crate::geometry::{GeometryRecord, GeometrySet, Rgba};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

pub const SCENE_NAME: &str = "IFC_Scene";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    asset: Asset,
    scene: usize,
    scenes: Vec<Scene>,
    nodes: Vec<Node>,
    meshes: Vec<MeshDef>,
    materials: Vec<Material>,
    accessors: Vec<Accessor>,
    buffer_views: Vec<BufferView>,
    buffers: Vec<Buffer>,
}

#[derive(Serialize)]
struct Asset {
    version: &'static str,
    generator: &'static str,
}

#[derive(Serialize)]
struct Scene {
    name: &'static str,
    nodes: Vec<usize>,
}

#[derive(Serialize)]
struct Node {
    name: String,
    mesh: usize,
}

#[derive(Serialize)]
struct MeshDef {
    name: String,
    primitives: Vec<Primitive>,
}

#[derive(Serialize)]
struct Primitive {
    attributes: BTreeMap<&'static str, usize>,
    indices: usize,
    material: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Material {
    name: String,
    pbr_metallic_roughness: Pbr,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Pbr {
    base_color_factor: Rgba,
    metallic_factor: f32,
    roughness_factor: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<[f32; 3]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
    target: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: usize,
}

/// Accumulates the JSON document and the binary buffer
struct GlbBuilder {
    doc: Document,
    bin: Vec<u8>,
}

impl GlbBuilder {
    fn new(materials: &[Rgba]) -> Self {
        let materials = materials
            .iter()
            .enumerate()
            .map(|(i, color)| Material {
                name: format!("Material_{}", i),
                pbr_metallic_roughness: Pbr {
                    base_color_factor: *color,
                    metallic_factor: 0.0,
                    roughness_factor: 0.8,
                },
            })
            .collect();

        Self {
            doc: Document {
                asset: Asset {
                    version: "2.0",
                    generator: concat!("ifc2rdf ", env!("CARGO_PKG_VERSION")),
                },
                scene: 0,
                scenes: Vec::new(),
                nodes: Vec::new(),
                meshes: Vec::new(),
                materials,
                accessors: Vec::new(),
                buffer_views: Vec::new(),
                buffers: Vec::new(),
            },
            bin: Vec::new(),
        }
    }

    /// Append a segment on a 4-byte boundary; returns its buffer view index
    fn push_segment(&mut self, bytes: &[u8], target: u32) -> usize {
        pad_to_four(&mut self.bin, 0);
        let byte_offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.doc.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length: bytes.len(),
            target,
        });
        self.doc.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Accessor) -> usize {
        self.doc.accessors.push(accessor);
        self.doc.accessors.len() - 1
    }

    fn add_record(&mut self, record: &GeometryRecord) {
        let positions = self.push_segment(bytemuck::cast_slice(&record.positions), ARRAY_BUFFER);
        let (min, max) = position_bounds(&record.positions);
        let position_accessor = self.push_accessor(Accessor {
            buffer_view: positions,
            component_type: FLOAT,
            count: record.vertex_count(),
            kind: "VEC3",
            min: Some(min),
            max: Some(max),
        });

        let (index_view, component_type) = if fits_u16(&record.indices) {
            let narrow: Vec<u16> = record.indices.iter().map(|&i| i as u16).collect();
            let view = self.push_segment(bytemuck::cast_slice(&narrow), ELEMENT_ARRAY_BUFFER);
            (view, UNSIGNED_SHORT)
        } else {
            let view = self.push_segment(bytemuck::cast_slice(&record.indices), ELEMENT_ARRAY_BUFFER);
            (view, UNSIGNED_INT)
        };
        let index_accessor = self.push_accessor(Accessor {
            buffer_view: index_view,
            component_type,
            count: record.indices.len(),
            kind: "SCALAR",
            min: None,
            max: None,
        });

        self.doc.meshes.push(MeshDef {
            name: record.name.clone(),
            primitives: vec![Primitive {
                attributes: BTreeMap::from([("POSITION", position_accessor)]),
                indices: index_accessor,
                material: record.material,
            }],
        });
        self.doc.nodes.push(Node {
            name: record.name.clone(),
            mesh: self.doc.meshes.len() - 1,
        });
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        pad_to_four(&mut self.bin, 0);
        self.doc.buffers.push(Buffer {
            byte_length: self.bin.len(),
        });
        self.doc.scenes.push(Scene {
            name: SCENE_NAME,
            nodes: (0..self.doc.nodes.len()).collect(),
        });

        let mut json = serde_json::to_vec(&self.doc)?;
        pad_to_four(&mut json, b' ');

        let total = 12 + 8 + json.len() + 8 + self.bin.len();
        let total = u32::try_from(total)
            .map_err(|_| ConvertError::glb(format!("container of {} bytes exceeds 4 GiB", total)))?;

        let mut out = Vec::with_capacity(total as usize);
        out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        out.extend_from_slice(&GLB_VERSION.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        write_chunk(&mut out, CHUNK_JSON, &json);
        write_chunk(&mut out, CHUNK_BIN, &self.bin);
        Ok(out)
    }
}

fn write_chunk(out: &mut Vec<u8>, kind: u32, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(data);
}

fn pad_to_four(buf: &mut Vec<u8>, fill: u8) {
    let padded = buf.len().next_multiple_of(4);
    buf.resize(padded, fill);
}

fn fits_u16(indices: &[u32]) -> bool {
    indices.iter().all(|&i| i <= u16::MAX as u32)
}

fn position_bounds(positions: &[f32]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for vertex in positions.chunks_exact(3) {
        for axis in 0..3 {
            min[axis] = min[axis].min(vertex[axis]);
            max[axis] = max[axis].max(vertex[axis]);
        }
    }
    (min, max)
}

/// Serialize `geometry` into GLB bytes
pub fn encode_glb(geometry: &GeometrySet) -> Result<Vec<u8>> {
    let mut builder = GlbBuilder::new(geometry.materials.colors());
    for record in &geometry.records {
        builder.add_record(record);
    }
    builder.finish()
}

/// Write `{dir}/{asset}.glb`, creating `dir` as needed
pub fn write_glb(geometry: &GeometrySet, dir: &Path, asset: &str) -> Result<PathBuf> {
    info!("Creating GLB with {} elements...", geometry.records.len());
    let bytes = encode_glb(geometry)?;

    std::fs::create_dir_all(dir).map_err(|e| ConvertError::io(dir, e))?;
    let path = dir.join(format!("{}.glb", asset));
    std::fs::write(&path, &bytes).map_err(|e| ConvertError::io(&path, e))?;

    info!("GLB created: {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{palette_color, MaterialRegistry};
    use ifc_rdf_model::EntityId;
    use serde_json::Value;

    fn record(name: &str, positions: Vec<f32>, indices: Vec<u32>, material: usize) -> GeometryRecord {
        GeometryRecord {
            name: name.to_string(),
            entity: EntityId(1),
            identifier: name.to_string(),
            ifc_type: "IfcWall".to_string(),
            representation_index: 0,
            positions,
            indices,
            material,
        }
    }

    fn quad() -> GeometryRecord {
        record(
            "quad",
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2, 0, 2, 3],
            0,
        )
    }

    fn geometry(records: Vec<GeometryRecord>) -> GeometrySet {
        let mut materials = MaterialRegistry::new();
        materials.index_of(palette_color("IfcWall"));
        GeometrySet {
            records,
            materials,
            failures: 0,
        }
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    /// Split a GLB into its JSON document and binary chunk
    fn split(bytes: &[u8]) -> (Value, &[u8]) {
        assert_eq!(read_u32(bytes, 0), GLB_MAGIC);
        assert_eq!(read_u32(bytes, 4), 2);
        assert_eq!(read_u32(bytes, 8) as usize, bytes.len());

        let json_len = read_u32(bytes, 12) as usize;
        assert_eq!(read_u32(bytes, 16), CHUNK_JSON);
        assert_eq!(json_len % 4, 0);
        let json: Value = serde_json::from_slice(&bytes[20..20 + json_len]).unwrap();

        let bin_at = 20 + json_len;
        let bin_len = read_u32(bytes, bin_at) as usize;
        assert_eq!(read_u32(bytes, bin_at + 4), CHUNK_BIN);
        assert_eq!(bin_len % 4, 0);
        (json, &bytes[bin_at + 8..bin_at + 8 + bin_len])
    }

    #[test]
    fn test_single_mesh_layout() {
        let bytes = encode_glb(&geometry(vec![quad()])).unwrap();
        let (json, bin) = split(&bytes);

        assert_eq!(json["scene"], 0);
        assert_eq!(json["scenes"][0]["name"], SCENE_NAME);
        assert_eq!(json["meshes"].as_array().unwrap().len(), 1);
        assert_eq!(json["nodes"][0]["name"], "quad");
        assert_eq!(json["materials"][0]["name"], "Material_0");
        assert_eq!(json["materials"][0]["pbrMetallicRoughness"]["roughnessFactor"], 0.8);

        let positions = &json["accessors"][0];
        assert_eq!(positions["count"], 4);
        assert_eq!(positions["componentType"], FLOAT);
        assert_eq!(positions["max"][1], 1.0);

        let indices = &json["accessors"][1];
        assert_eq!(indices["count"], 6);
        assert_eq!(indices["componentType"], UNSIGNED_SHORT);

        // 48 bytes of positions then 12 of indices
        assert_eq!(json["bufferViews"][1]["byteOffset"], 48);
        assert_eq!(json["buffers"][0]["byteLength"], 60);
        assert_eq!(bin.len(), 60);
        assert_eq!(&bin[48..50], &0u16.to_le_bytes());
        assert_eq!(&bin[52..54], &2u16.to_le_bytes());
    }

    #[test]
    fn test_odd_segment_is_padded() {
        // Three u16 indices take 6 bytes at 36; the next segment starts at 44
        let triangle = record("tri", vec![0.0; 9], vec![0, 1, 2], 0);
        let bytes = encode_glb(&geometry(vec![triangle, quad()])).unwrap();
        let (json, _) = split(&bytes);

        let views = json["bufferViews"].as_array().unwrap();
        assert_eq!(views[1]["byteOffset"], 36);
        assert_eq!(views[1]["byteLength"], 6);
        assert_eq!(views[2]["byteOffset"], 44);
        for view in views {
            assert_eq!(view["byteOffset"].as_u64().unwrap() % 4, 0);
        }
    }

    #[test]
    fn test_wide_indices() {
        let mut big = quad();
        big.indices = vec![0, 1, 70_000];
        let bytes = encode_glb(&geometry(vec![big])).unwrap();
        let (json, _) = split(&bytes);
        assert_eq!(json["accessors"][1]["componentType"], UNSIGNED_INT);
        assert_eq!(json["bufferViews"][1]["byteLength"], 12);
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/glb");
        let path = write_glb(&geometry(vec![quad()]), &out, "house").unwrap();
        assert_eq!(path, out.join("house.glb"));
        assert_eq!(&std::fs::read(&path).unwrap()[0..4], b"glTF");
    }
}
