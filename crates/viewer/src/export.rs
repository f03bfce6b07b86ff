//! Binary glTF (GLB) export of a display scene.

use std::borrow::Cow;

use glam::DVec3;

use crate::build::Mesh;
use crate::camera::ArcBallCamera;
use crate::display::{DisplayScene, DisplayShape};

/// GLB magic number: "glTF"
const GLB_MAGIC: u32 = 0x46546C67;
/// GLB version 2
const GLB_VERSION: u32 = 2;
/// JSON chunk type
const CHUNK_TYPE_JSON: u32 = 0x4E4F534A;
/// BIN chunk type
const CHUNK_TYPE_BIN: u32 = 0x004E4942;

/// glTF component types
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

/// glTF buffer view targets
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

struct MeshMeta<'a> {
    shape: &'a DisplayShape,
    vertex_count: usize,
    index_count: usize,
    pos_offset: usize,
    pos_length: usize,
    norm_offset: usize,
    norm_length: usize,
    idx_offset: usize,
    idx_length: usize,
    pos_min: [f32; 3],
    pos_max: [f32; 3],
}

/// Build a GLB file from the scene's meshes.
///
/// Every part becomes a node named by its tree path, with a material in the
/// part color. When a camera is given, a perspective camera node is added.
/// Scenes without triangles give an empty buffer.
pub fn build_glb(scene: &DisplayScene, camera: Option<&ArcBallCamera>) -> Result<Vec<u8>, serde_json::Error> {
    // ── Phase 1: Build binary buffer ─────────────────────────
    let mut bin_data: Vec<u8> = Vec::new();
    let mut metas: Vec<MeshMeta> = Vec::new();

    for shape in &scene.shapes {
        let mesh = &shape.mesh;
        if mesh.is_empty() {
            continue;
        }

        let mut positions: Vec<f32> = Vec::with_capacity(mesh.vertex_count() * 3);
        let mut normals: Vec<f32> = Vec::with_capacity(mesh.vertex_count() * 3);
        let mut pos_min = [f32::MAX; 3];
        let mut pos_max = [f32::MIN; 3];

        let vertex_normals = vertex_normals(mesh);
        for (p, n) in mesh.vertices.iter().zip(vertex_normals.iter()) {
            let p = p.as_vec3().to_array();
            positions.extend_from_slice(&p);
            normals.extend_from_slice(&n.as_vec3().to_array());
            for axis in 0..3 {
                pos_min[axis] = pos_min[axis].min(p[axis]);
                pos_max[axis] = pos_max[axis].max(p[axis]);
            }
        }
        let indices: Vec<u32> = mesh.triangles.iter().flatten().copied().collect();

        let pos_offset = bin_data.len();
        bin_data.extend_from_slice(&floats_to_bytes(&positions));
        let pos_length = bin_data.len() - pos_offset;

        let norm_offset = bin_data.len();
        bin_data.extend_from_slice(&floats_to_bytes(&normals));
        let norm_length = bin_data.len() - norm_offset;

        let idx_offset = bin_data.len();
        bin_data.extend_from_slice(&u32s_to_bytes(&indices));
        let idx_length = bin_data.len() - idx_offset;

        metas.push(MeshMeta {
            shape,
            vertex_count: mesh.vertex_count(),
            index_count: indices.len(),
            pos_offset,
            pos_length,
            norm_offset,
            norm_length,
            idx_offset,
            idx_length,
            pos_min,
            pos_max,
        });
    }

    if metas.is_empty() {
        return Ok(Vec::new());
    }

    // ── Phase 2: Build glTF JSON ─────────────────────────────
    // Three buffer views and accessors per part: positions, normals, indices
    let mut accessors = Vec::new();
    let mut buffer_views = Vec::new();
    let mut gltf_meshes = Vec::new();
    let mut materials = Vec::new();
    let mut nodes = Vec::new();

    for (i, meta) in metas.iter().enumerate() {
        let base = i * 3;
        for (offset, length, target) in [
            (meta.pos_offset, meta.pos_length, ARRAY_BUFFER),
            (meta.norm_offset, meta.norm_length, ARRAY_BUFFER),
            (meta.idx_offset, meta.idx_length, ELEMENT_ARRAY_BUFFER),
        ] {
            buffer_views.push(serde_json::json!({
                "buffer": 0,
                "byteOffset": offset,
                "byteLength": length,
                "target": target
            }));
        }

        accessors.push(serde_json::json!({
            "bufferView": base,
            "componentType": FLOAT,
            "count": meta.vertex_count,
            "type": "VEC3",
            "min": meta.pos_min,
            "max": meta.pos_max
        }));
        accessors.push(serde_json::json!({
            "bufferView": base + 1,
            "componentType": FLOAT,
            "count": meta.vertex_count,
            "type": "VEC3"
        }));
        accessors.push(serde_json::json!({
            "bufferView": base + 2,
            "componentType": UNSIGNED_INT,
            "count": meta.index_count,
            "type": "SCALAR"
        }));

        let [r, g, b] = meta.shape.color.to_f32();
        materials.push(serde_json::json!({
            "name": meta.shape.color.web_color(),
            "pbrMetallicRoughness": {
                "baseColorFactor": [r, g, b, 1.0],
                "metallicFactor": 0.3,
                "roughnessFactor": 0.5
            }
        }));

        gltf_meshes.push(serde_json::json!({
            "name": meta.shape.path,
            "primitives": [{
                "attributes": { "POSITION": base, "NORMAL": base + 1 },
                "indices": base + 2,
                "material": i
            }]
        }));

        nodes.push(serde_json::json!({
            "name": meta.shape.path,
            "mesh": i,
            "extras": { "id": meta.shape.id }
        }));
    }

    let mut gltf_json = serde_json::json!({
        "asset": { "version": "2.0", "generator": "cadview" },
        "scene": 0,
        "nodes": nodes,
        "meshes": gltf_meshes,
        "materials": materials,
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [{ "byteLength": bin_data.len() }]
    });

    let mut scene_nodes: Vec<usize> = (0..metas.len()).collect();
    if let Some(camera) = camera {
        let (znear, zfar) = camera.clip_planes();
        gltf_json["cameras"] = serde_json::json!([{
            "type": "perspective",
            "perspective": { "yfov": camera.fov, "znear": znear, "zfar": zfar }
        }]);
        if let Some(nodes) = gltf_json["nodes"].as_array_mut() {
            nodes.push(serde_json::json!({
                "name": "camera",
                "camera": 0,
                "translation": camera.eye_position().to_array(),
                "rotation": camera.orientation().to_array()
            }));
        }
        scene_nodes.push(metas.len());
    }
    gltf_json["scenes"] = serde_json::json!([{ "name": "Scene", "nodes": scene_nodes }]);

    let mut json_bytes = serde_json::to_vec(&gltf_json)?;

    // JSON chunk is padded with spaces, BIN with zeros
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while bin_data.len() % 4 != 0 {
        bin_data.push(0);
    }

    // ── Phase 3: Assemble GLB ────────────────────────────────
    let json_chunk_length = json_bytes.len() as u32;
    let bin_chunk_length = bin_data.len() as u32;
    let total_length: u32 = 12 + 8 + json_chunk_length + 8 + bin_chunk_length;

    let mut glb = Vec::with_capacity(total_length as usize);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_length.to_le_bytes());

    glb.extend_from_slice(&json_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    glb.extend_from_slice(&json_bytes);

    glb.extend_from_slice(&bin_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
    glb.extend_from_slice(&bin_data);

    Ok(glb)
}

fn floats_to_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn u32s_to_bytes(data: &[u32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// One normal per vertex. Meshes without normals get area-weighted
/// averages of the adjacent triangle normals; unused vertices point along +Z.
fn vertex_normals(mesh: &Mesh) -> Cow<'_, [DVec3]> {
    if mesh.normals.len() == mesh.vertices.len() {
        return Cow::Borrowed(&mesh.normals);
    }
    let mut sums = vec![DVec3::ZERO; mesh.vertices.len()];
    for tri in &mesh.triangles {
        let [a, b, c] = tri.map(|i| i as usize);
        let (Some(pa), Some(pb), Some(pc)) = (mesh.vertices.get(a), mesh.vertices.get(b), mesh.vertices.get(c)) else {
            continue;
        };
        let n = (*pb - *pa).cross(*pc - *pa);
        for i in [a, b, c] {
            sums[i] += n;
        }
    }
    Cow::Owned(sums.into_iter().map(|n| n.try_normalize().unwrap_or(DVec3::Z)).collect())
}
