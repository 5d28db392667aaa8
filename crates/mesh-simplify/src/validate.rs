//! Mesh data validation.
//!
//! Structural checks on raw mesh data: face indices within bounds, finite
//! coordinates, split records confined to their replay horizon. Geometric
//! degeneracy is the simplifier's concern, not this module's.

use tracing::{debug, warn};

use crate::error::{MeshError, MeshResult, ValidationIssue};
use crate::types::{Mesh, SPLIT_SENTINEL};

/// Validation behavior.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Whether to reject the mesh on finding invalid data (default: true).
    /// If false, issues are collected but validation continues.
    pub reject_on_invalid: bool,
    /// Maximum number of issues to collect before stopping (default: 100).
    pub max_issues: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            reject_on_invalid: true,
            max_issues: 100,
        }
    }
}

impl ValidationOptions {
    /// Create options that collect all issues without rejecting.
    pub fn collect_all() -> Self {
        Self {
            reject_on_invalid: false,
            max_issues: 1000,
        }
    }
}

/// Result of mesh data validation.
#[derive(Debug, Clone, Default)]
pub struct DataValidationResult {
    /// List of issues found during validation.
    pub issues: Vec<ValidationIssue>,
    /// Number of invalid vertex indices found (faces and split records).
    pub invalid_index_count: usize,
    /// Number of NaN coordinates found.
    pub nan_count: usize,
    /// Number of infinite coordinates found.
    pub infinity_count: usize,
}

impl DataValidationResult {
    /// Check if validation passed with no issues.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Get total number of issues found.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

impl std::fmt::Display for DataValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "Data validation passed: no issues found")
        } else {
            writeln!(f, "Data validation found {} issue(s):", self.issue_count())?;
            if self.invalid_index_count > 0 {
                writeln!(f, "  - {} invalid vertex indices", self.invalid_index_count)?;
            }
            if self.nan_count > 0 {
                writeln!(f, "  - {} NaN coordinates", self.nan_count)?;
            }
            if self.infinity_count > 0 {
                writeln!(f, "  - {} infinite coordinates", self.infinity_count)?;
            }
            Ok(())
        }
    }
}

/// Validate mesh data for invalid indices and coordinates.
///
/// Checks:
/// - Vertex coordinates are finite (no NaN, no infinity)
/// - Face indices are within vertex bounds
/// - Split records reference only vertices that exist when they replay
///
/// With `reject_on_invalid` set (the default), the first issue is returned
/// as an error; otherwise issues are collected up to `max_issues`.
pub fn validate_mesh_data(
    mesh: &Mesh,
    options: &ValidationOptions,
) -> MeshResult<DataValidationResult> {
    let mut result = DataValidationResult::default();
    let vertex_count = mesh.vertex_count();

    for (vertex_idx, vertex) in mesh.vertices.iter().enumerate() {
        if result.issues.len() >= options.max_issues {
            break;
        }

        let coords = [
            ("x", vertex.position.x),
            ("y", vertex.position.y),
            ("z", vertex.position.z),
        ];

        for (coord_name, value) in coords {
            if value.is_nan() {
                result.nan_count += 1;
                result.issues.push(ValidationIssue::NaNCoordinate {
                    vertex_index: vertex_idx,
                    coordinate: coord_name,
                });

                if options.reject_on_invalid {
                    return Err(MeshError::InvalidCoordinate {
                        vertex_index: vertex_idx,
                        coordinate: coord_name,
                        value,
                    });
                }
            } else if value.is_infinite() {
                result.infinity_count += 1;
                result.issues.push(ValidationIssue::InfiniteCoordinate {
                    vertex_index: vertex_idx,
                    coordinate: coord_name,
                    value,
                });

                if options.reject_on_invalid {
                    return Err(MeshError::InvalidCoordinate {
                        vertex_index: vertex_idx,
                        coordinate: coord_name,
                        value,
                    });
                }
            }
        }
    }

    for (face_idx, face) in mesh.faces.iter().enumerate() {
        if result.issues.len() >= options.max_issues {
            break;
        }

        for &vertex_idx in face {
            if vertex_idx as usize >= vertex_count {
                result.invalid_index_count += 1;
                result.issues.push(ValidationIssue::InvalidVertexIndex {
                    face_index: face_idx,
                    vertex_index: vertex_idx,
                    vertex_count,
                });

                if options.reject_on_invalid {
                    return Err(MeshError::InvalidVertexIndex {
                        face_index: face_idx,
                        vertex_index: vertex_idx,
                        vertex_count,
                    });
                }
            }
        }
    }

    // Replay ordinal k may reference vertices [0, vertex_count + k) plus the
    // sentinel for the vertex it re-materializes.
    for (ordinal, split) in mesh.splits.iter().enumerate() {
        if result.issues.len() >= options.max_issues {
            break;
        }
        let horizon = vertex_count + ordinal;

        let mut indices = vec![split.survivor as i64];
        indices.extend(split.faces.iter().flatten());

        for index in indices {
            let in_range = index == SPLIT_SENTINEL || (0..horizon as i64).contains(&index);
            if !in_range {
                result.invalid_index_count += 1;
                result.issues.push(ValidationIssue::InvalidSplitIndex {
                    split_index: ordinal,
                    vertex_index: index,
                    horizon,
                });

                if options.reject_on_invalid {
                    return Err(MeshError::InvalidTopology {
                        details: format!(
                            "split {} references vertex {}, outside its replay horizon of {}",
                            ordinal, index, horizon
                        ),
                    });
                }
            }
        }
    }

    if result.issues.is_empty() {
        debug!("Mesh data validation passed");
    } else {
        warn!(
            "Mesh data validation found {} issue(s): {} invalid indices, {} NaN, {} Inf",
            result.issues.len(),
            result.invalid_index_count,
            result.nan_count,
            result.infinity_count
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Vertex, VertexSplit};
    use nalgebra::Point3;

    fn triangle_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh
    }

    #[test]
    fn test_valid_mesh_passes() {
        let mesh = triangle_mesh();
        let result = validate_mesh_data(&mesh, &ValidationOptions::default()).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_out_of_range_face_index_rejected() {
        let mut mesh = triangle_mesh();
        mesh.faces.push([0, 1, 7]);
        let err = validate_mesh_data(&mesh, &ValidationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidVertexIndex {
                face_index: 1,
                vertex_index: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_nan_coordinate_rejected() {
        let mut mesh = triangle_mesh();
        mesh.vertices.push(Vertex::from_coords(0.0, f64::NAN, 0.0));
        let err = validate_mesh_data(&mesh, &ValidationOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_collect_all_gathers_issues() {
        let mut mesh = triangle_mesh();
        mesh.vertices.push(Vertex::from_coords(f64::INFINITY, 0.0, 0.0));
        mesh.faces.push([0, 9, 10]);

        let result = validate_mesh_data(&mesh, &ValidationOptions::collect_all()).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.infinity_count, 1);
        assert_eq!(result.invalid_index_count, 2);
    }

    #[test]
    fn test_split_beyond_horizon_rejected() {
        let mut mesh = triangle_mesh();
        mesh.splits.push(VertexSplit {
            survivor: 0,
            survivor_pos: Point3::origin(),
            split_pos: Point3::origin(),
            // First replay may only reference vertices 0..3 (+ sentinel)
            faces: vec![[0, 5, SPLIT_SENTINEL]],
        });

        let err = validate_mesh_data(&mesh, &ValidationOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::InvalidTopology { .. }));
    }

    #[test]
    fn test_split_within_horizon_passes() {
        let mut mesh = triangle_mesh();
        mesh.splits.push(VertexSplit {
            survivor: 0,
            survivor_pos: Point3::origin(),
            split_pos: Point3::origin(),
            faces: vec![[0, 1, SPLIT_SENTINEL]],
        });
        // Second replay may reference vertex 3, created by the first
        mesh.splits.push(VertexSplit {
            survivor: 3,
            survivor_pos: Point3::origin(),
            split_pos: Point3::origin(),
            faces: vec![[3, 2, SPLIT_SENTINEL]],
        });

        let result = validate_mesh_data(&mesh, &ValidationOptions::default()).unwrap();
        assert!(result.is_valid());
    }
}
