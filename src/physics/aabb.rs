//! Axis-aligned bounding boxes. Pure functions, no methods — grounded
//! directly on the pack's own AABB module.

use cgmath::{Point3, Vector3};

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

pub fn from_center_half_extents(center: Point3<f32>, half_extents: Vector3<f32>) -> Aabb {
    Aabb {
        min: Point3::new(center.x - half_extents.x, center.y - half_extents.y, center.z - half_extents.z),
        max: Point3::new(center.x + half_extents.x, center.y + half_extents.y, center.z + half_extents.z),
    }
}

pub fn translated(aabb: &Aabb, offset: Vector3<f32>) -> Aabb {
    Aabb { min: aabb.min + offset, max: aabb.max + offset }
}

pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x
        && a.min.y <= b.max.y && a.max.y >= b.min.y
        && a.min.z <= b.max.z && a.max.z >= b.min.z
}

/// All integer block cells the AABB overlaps, shrunk slightly on every
/// axis first so an AABB sitting exactly flush against a face doesn't
/// spuriously pick up the neighboring cell (spec §4.6 sampling note).
pub fn overlapped_cells(aabb: &Aabb, epsilon: f32) -> Vec<(i32, i32, i32)> {
    let min = Point3::new(aabb.min.x + epsilon, aabb.min.y + epsilon, aabb.min.z + epsilon);
    let max = Point3::new(aabb.max.x - epsilon, aabb.max.y - epsilon, aabb.max.z - epsilon);

    let x0 = min.x.floor() as i32;
    let x1 = max.x.floor() as i32;
    let y0 = min.y.floor() as i32;
    let y1 = max.y.floor() as i32;
    let z0 = min.z.floor() as i32;
    let z1 = max.z.floor() as i32;

    let mut cells = Vec::new();
    for x in x0..=x1 {
        for y in y0..=y1 {
            for z in z0..=z1 {
                cells.push((x, y, z));
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapped_cells_covers_a_single_unit_box() {
        let aabb = from_center_half_extents(Point3::new(0.5, 0.5, 0.5), Vector3::new(0.3, 0.9, 0.3));
        let cells = overlapped_cells(&aabb, 0.1);
        assert_eq!(cells, vec![(0, 0, 0)]);
    }

    #[test]
    fn intersects_detects_overlap_and_separation() {
        let a = from_center_half_extents(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5));
        let b = from_center_half_extents(Point3::new(0.9, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5));
        let c = from_center_half_extents(Point3::new(5.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5));
        assert!(intersects(&a, &b));
        assert!(!intersects(&a, &c));
    }
}
