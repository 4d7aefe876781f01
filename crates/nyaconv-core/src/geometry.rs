//! Polygon normals

use crate::types::{centi_units, Vector3};

/// Normal of a polygon computed from its points alone.
///
/// Points co-located with the previously kept point or with the first point
/// are skipped. Each consecutive triple of the remaining points contributes
/// its unit cross product when that product is not degenerate. Two distinct
/// points give the direction between them; a single point gives `+Z`.
pub fn face_normal(points: &[Vector3]) -> Vector3 {
    let unique = unique_points(points);

    match unique.len() {
        0 | 1 => Vector3::UNIT_Z,
        2 => (unique[1] - unique[0]).normalized(),
        count => {
            let mut accumulator = Vector3::ZERO;
            let mut contributions = 0usize;

            for i in 0..count {
                let a = unique[i];
                let b = unique[(i + 1) % count];
                let c = unique[(i + 2) % count];
                let cross = (a - b).cross(&(c - b)).normalized();

                if centi_units(cross.length()) > 0 {
                    accumulator += cross;
                    contributions += 1;
                }
            }

            if contributions == 0 || centi_units(accumulator.length()) <= 0 {
                Vector3::UNIT_Z
            } else {
                accumulator.normalized()
            }
        }
    }
}

fn unique_points(points: &[Vector3]) -> Vec<Vector3> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };

    let mut unique = vec![first];
    for point in &points[1..] {
        let last = unique[unique.len() - 1];
        if !last.is_colocated(point) && !first.is_colocated(point) {
            unique.push(*point);
        }
    }
    unique
}

/// Normalized mean of a set of normals, `+Z` when empty
pub fn average_normal(normals: impl IntoIterator<Item = Vector3>) -> Vector3 {
    let mut accumulator = Vector3::ZERO;
    let mut count = 0usize;
    for normal in normals {
        accumulator += normal;
        count += 1;
    }

    if count == 0 {
        Vector3::UNIT_Z
    } else {
        (accumulator / count as f64).normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: Vector3, b: Vector3) {
        assert!(a.distance(&b) < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_planar_quad() {
        let quad = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let normal = face_normal(&quad);
        assert!((normal.dot(&Vector3::UNIT_Z).abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tilted_quad() {
        let quad = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 3.0),
        ];
        let normal = face_normal(&quad);
        assert!((normal.dot(&Vector3::new(1.0, 0.0, 0.0)).abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_padded_triangle() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 0.0);
        let c = Vector3::new(0.0, 0.0, 1.0);
        let normal = face_normal(&[a, b, c, c]);
        assert!((normal.x.abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_faces() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_close(face_normal(&[p, p, p, p]), Vector3::UNIT_Z);
        assert_close(face_normal(&[]), Vector3::UNIT_Z);

        let q = Vector3::new(1.0, 2.0, 5.0);
        assert_close(face_normal(&[p, q, q, p]), Vector3::UNIT_Z);

        // near-duplicates collapse at the co-location tolerance
        let near = Vector3::new(1.0, 2.0, 3.001);
        assert_close(face_normal(&[p, near, near, near]), Vector3::UNIT_Z);
    }

    #[test]
    fn test_collinear_points() {
        let points = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
        ];
        assert_close(face_normal(&points), Vector3::UNIT_Z);
    }

    #[test]
    fn test_average_normal() {
        let n = average_normal([Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 2.0, 0.0)]);
        let expected = Vector3::new(0.0, 1.0, 1.0).normalized();
        assert_close(n, expected);
        assert_close(average_normal(std::iter::empty()), Vector3::UNIT_Z);
    }

    proptest! {
        #[test]
        fn prop_face_normal_is_unit(coords in prop::array::uniform12(-100.0f64..100.0)) {
            let points: Vec<Vector3> = coords
                .chunks_exact(3)
                .map(|c| Vector3::new(c[0], c[1], c[2]))
                .collect();
            let normal = face_normal(&points);
            prop_assert!((normal.length() - 1.0).abs() < 1e-9);
        }
    }
}
