//! Triangle meshes loaded from Wavefront OBJ files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use thiserror::Error;

/// Floats per vertex: `position.xyz` then `normal.xyz`.
pub const VERTEX_STRIDE: usize = 6;

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("face references vertex {index} but only {count} are defined")]
    IndexOutOfRange { index: i32, count: usize },
    #[error("face references normal {index} but only {count} are defined")]
    NormalIndexOutOfRange { index: i32, count: usize },
    #[error("mesh does not define any vertices")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ObjError,
    },
}

/// CPU-side mesh with interleaved vertices and a triangle index list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_obj(&text).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses OBJ text. Polygons are fan-triangulated. Vertices without a
    /// `vn` reference get a smoothed face normal; explicit normals are kept.
    pub fn parse_obj(text: &str) -> Result<Self, ObjError> {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut triangles: Vec<[Corner; 3]> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            let mut fields = content.split_whitespace();
            match fields.next() {
                Some("v") => positions.push(read_vec3(fields, line)?),
                Some("vn") => normals.push(read_vec3(fields, line)?),
                Some("f") => {
                    let corners = fields
                        .map(|field| Corner::parse(field, line))
                        .collect::<Result<Vec<_>, _>>()?;
                    if corners.len() < 3 {
                        return Err(ObjError::Syntax {
                            line,
                            message: "face needs at least three corners".into(),
                        });
                    }
                    for i in 1..corners.len() - 1 {
                        triangles.push([corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        if positions.is_empty() {
            return Err(ObjError::Empty);
        }

        let (mut mesh, explicit) = weld(&positions, &normals, &triangles)?;
        if explicit.contains(&false) {
            mesh.smooth_missing_normals(&explicit);
        }
        Ok(mesh)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        let base = vertex * VERTEX_STRIDE;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        let base = vertex * VERTEX_STRIDE + 3;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    /// Averages face normals into every vertex not flagged in `explicit`.
    fn smooth_missing_normals(&mut self, explicit: &[bool]) {
        let mut sums = vec![Vec3::ZERO; self.vertex_count()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.position(b) - self.position(a)).cross(self.position(c) - self.position(a));
            if let Some(face) = face.try_normalize() {
                sums[a] += face;
                sums[b] += face;
                sums[c] += face;
            }
        }
        for (vertex, sum) in sums.into_iter().enumerate() {
            if explicit[vertex] {
                continue;
            }
            let base = vertex * VERTEX_STRIDE + 3;
            self.vertices[base..base + 3].copy_from_slice(&sum.normalize_or_zero().to_array());
        }
    }
}

/// One `v/vt/vn` reference of a face. Texture coordinates are not used.
#[derive(Debug, Clone, Copy)]
struct Corner {
    position: i32,
    normal: Option<i32>,
}

impl Corner {
    fn parse(field: &str, line: usize) -> Result<Self, ObjError> {
        let mut parts = field.split('/');
        let position = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(|| ObjError::Syntax {
                line,
                message: format!("bad face corner `{field}`"),
            })?;
        let normal = parts
            .nth(1)
            .filter(|n| !n.is_empty())
            .map(|n| {
                n.parse::<i32>().map_err(|_| ObjError::Syntax {
                    line,
                    message: format!("bad normal index in `{field}`"),
                })
            })
            .transpose()?;
        Ok(Self { position, normal })
    }
}

fn read_vec3<'a>(mut fields: impl Iterator<Item = &'a str>, line: usize) -> Result<Vec3, ObjError> {
    let mut next = || -> Result<f32, ObjError> {
        let field = fields.next().ok_or_else(|| ObjError::Syntax {
            line,
            message: "expected three components".into(),
        })?;
        field.parse::<f32>().map_err(|err| ObjError::Syntax {
            line,
            message: format!("`{field}`: {err}"),
        })
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

/// Resolves a 1-based (or negative, relative) OBJ index.
fn resolve(index: i32, count: usize) -> Option<usize> {
    match index {
        i if i > 0 => Some(i as usize - 1).filter(|&i| i < count),
        i if i < 0 => count.checked_sub(i.unsigned_abs() as usize),
        _ => None,
    }
}

/// Deduplicates `(position, normal)` pairs into indexed vertices. The second
/// value flags which vertices took their normal from the file.
fn weld(
    positions: &[Vec3],
    normals: &[Vec3],
    triangles: &[[Corner; 3]],
) -> Result<(MeshData, Vec<bool>), ObjError> {
    let mut mesh = MeshData::default();
    let mut explicit = Vec::new();
    let mut seen: HashMap<(usize, Option<usize>), u32> = HashMap::new();

    for corner in triangles.iter().flatten() {
        let position = resolve(corner.position, positions.len()).ok_or(ObjError::IndexOutOfRange {
            index: corner.position,
            count: positions.len(),
        })?;
        let normal = corner
            .normal
            .map(|n| {
                resolve(n, normals.len()).ok_or(ObjError::NormalIndexOutOfRange {
                    index: n,
                    count: normals.len(),
                })
            })
            .transpose()?;
        let next = mesh.vertex_count() as u32;
        let index = *seen.entry((position, normal)).or_insert_with(|| {
            let n = normal.map_or(Vec3::ZERO, |n| normals[n]);
            mesh.vertices.extend_from_slice(&positions[position].to_array());
            mesh.vertices.extend_from_slice(&n.to_array());
            explicit.push(normal.is_some());
            next
        });
        mesh.indices.push(index);
    }

    Ok((mesh, explicit))
}
