use glam::{Mat2, Vec2};

use crate::api::NarrowphaseApi;
use crate::shape::{Polygon, Shape, ShapeKind};
use crate::types::*;

/// Exact shape-pair tests. Normals always point from the first shape to the
/// second; contact points are in world space.
pub struct Narrowphase;

/// A polygon placed in the world.
#[derive(Copy, Clone)]
struct Posed<'a> {
    poly: &'a Polygon,
    pos: Vec2,
    rot: Mat2,
}

impl Posed<'_> {
    fn world(&self, local: Vec2) -> Vec2 {
        self.rot * local + self.pos
    }
}

/// Prefer the first axis unless the second is clearly better, so the reference
/// face does not flicker between near-equal candidates.
fn bias_greater_than(a: f32, b: f32) -> bool {
    const BIAS_RELATIVE: f32 = 0.95;
    const BIAS_ABSOLUTE: f32 = 0.01;
    a >= b * BIAS_RELATIVE + a * BIAS_ABSOLUTE
}

/// Largest signed separation of `b` along `a`'s face normals, and that face.
fn axis_least_penetration(a: Posed, b: Posed) -> (f32, usize) {
    let b_rot_t = b.rot.transpose();
    let mut best_distance = f32::NEG_INFINITY;
    let mut best_index = 0;

    for (i, (&normal, &vertex)) in a.poly.normals().iter().zip(a.poly.vertices()).enumerate() {
        // Face normal and vertex in b's frame.
        let n = b_rot_t * (a.rot * normal);
        let support = b.poly.support(-n);
        let v = b_rot_t * (a.world(vertex) - b.pos);
        let d = n.dot(support - v);
        if d > best_distance {
            best_distance = d;
            best_index = i;
        }
    }
    (best_distance, best_index)
}

/// Face of `inc` most anti-parallel to the reference face, in world space.
fn incident_face(reference: Posed, inc: Posed, reference_index: usize) -> [Vec2; 2] {
    let ref_normal = inc.rot.transpose() * (reference.rot * reference.poly.normals()[reference_index]);

    let mut incident = 0;
    let mut min_dot = f32::INFINITY;
    for (i, n) in inc.poly.normals().iter().enumerate() {
        let d = ref_normal.dot(*n);
        if d < min_dot {
            min_dot = d;
            incident = i;
        }
    }
    let verts = inc.poly.vertices();
    [inc.world(verts[incident]), inc.world(verts[(incident + 1) % verts.len()])]
}

/// Clip `face` against the half-plane `n·x <= c`. Returns points kept.
fn clip(n: Vec2, c: f32, face: &mut [Vec2; 2]) -> usize {
    let mut out = *face;
    let mut sp = 0;
    let d1 = n.dot(face[0]) - c;
    let d2 = n.dot(face[1]) - c;

    if d1 <= 0.0 {
        out[sp] = face[0];
        sp += 1;
    }
    if d2 <= 0.0 {
        out[sp] = face[1];
        sp += 1;
    }
    if d1 * d2 < 0.0 && sp < 2 {
        let alpha = d1 / (d1 - d2);
        out[sp] = face[0] + alpha * (face[1] - face[0]);
        sp += 1;
    }
    *face = out;
    sp
}

impl Narrowphase {
    /// Dispatch on the shape pairing using each shape's cached transform.
    pub fn collide(a: &Shape, b: &Shape) -> Option<Collision> {
        match (a.kind(), b.kind()) {
            (ShapeKind::Circle { radius: ra }, ShapeKind::Circle { radius: rb }) => {
                Self::circle_circle(a.position(), *ra, b.position(), *rb)
            }
            (ShapeKind::Circle { radius }, ShapeKind::Polygon(poly)) => {
                Self::circle_polygon(a.position(), *radius, poly, b.position(), b.rotation())
            }
            (ShapeKind::Polygon(poly), ShapeKind::Circle { radius }) => {
                Self::polygon_circle(poly, a.position(), a.rotation(), b.position(), *radius)
            }
            (ShapeKind::Polygon(pa), ShapeKind::Polygon(pb)) => {
                Self::polygon_polygon(pa, a.position(), a.rotation(), pb, b.position(), b.rotation())
            }
        }
    }
}

impl NarrowphaseApi for Narrowphase {
    fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Collision> {
        let delta = cb - ca;
        let dist2 = delta.length_squared();
        let rsum = ra + rb;
        if dist2 >= rsum * rsum {
            return None;
        }
        let dist = dist2.sqrt();
        if dist == 0.0 {
            // Coincident centres; pick any axis.
            return Some(Collision::single(Vec2::X, rsum, ca));
        }
        let normal = delta / dist;
        Some(Collision::single(normal, rsum - dist, ca + normal * ra))
    }

    fn circle_polygon(
        center: Vec2,
        radius: f32,
        poly: &Polygon,
        pos: Vec2,
        rot: Mat2,
    ) -> Option<Collision> {
        let verts = poly.vertices();
        let normals = poly.normals();
        let local = rot.transpose() * (center - pos);

        // Face of minimum penetration.
        let mut separation = f32::NEG_INFINITY;
        let mut face = 0;
        for i in 0..verts.len() {
            let s = normals[i].dot(local - verts[i]);
            if s > radius {
                return None;
            }
            if s > separation {
                separation = s;
                face = i;
            }
        }

        let v1 = verts[face];
        let v2 = verts[(face + 1) % verts.len()];

        // Centre inside the polygon.
        if separation < EPSILON {
            let normal = -(rot * normals[face]);
            return Some(Collision::single(normal, radius, center + normal * radius));
        }

        let dot1 = (local - v1).dot(v2 - v1);
        let dot2 = (local - v2).dot(v1 - v2);

        if dot1 <= 0.0 {
            // Closest to v1.
            let dist = local.distance(v1);
            if dist > radius {
                return None;
            }
            let normal = (rot * (v1 - local)).normalize_or_zero();
            Some(Collision::single(normal, radius - dist, rot * v1 + pos))
        } else if dot2 <= 0.0 {
            // Closest to v2.
            let dist = local.distance(v2);
            if dist > radius {
                return None;
            }
            let normal = (rot * (v2 - local)).normalize_or_zero();
            Some(Collision::single(normal, radius - dist, rot * v2 + pos))
        } else {
            let n = normals[face];
            if (local - v1).dot(n) > radius {
                return None;
            }
            let normal = -(rot * n);
            Some(Collision::single(normal, radius - separation, center + normal * radius))
        }
    }

    fn polygon_circle(
        poly: &Polygon,
        pos: Vec2,
        rot: Mat2,
        center: Vec2,
        radius: f32,
    ) -> Option<Collision> {
        Self::circle_polygon(center, radius, poly, pos, rot).map(Collision::flipped)
    }

    fn polygon_polygon(
        pa: &Polygon,
        pos_a: Vec2,
        rot_a: Mat2,
        pb: &Polygon,
        pos_b: Vec2,
        rot_b: Mat2,
    ) -> Option<Collision> {
        let a = Posed { poly: pa, pos: pos_a, rot: rot_a };
        let b = Posed { poly: pb, pos: pos_b, rot: rot_b };

        // Separating axis on A's faces, then B's.
        let (penetration_a, face_a) = axis_least_penetration(a, b);
        if penetration_a >= 0.0 {
            return None;
        }
        let (penetration_b, face_b) = axis_least_penetration(b, a);
        if penetration_b >= 0.0 {
            return None;
        }

        let (reference, incident, ref_index, flip) = if bias_greater_than(penetration_a, penetration_b) {
            (a, b, face_a, false)
        } else {
            (b, a, face_b, true)
        };

        let mut face = incident_face(reference, incident, ref_index);

        let ref_verts = reference.poly.vertices();
        let v1 = reference.world(ref_verts[ref_index]);
        let v2 = reference.world(ref_verts[(ref_index + 1) % ref_verts.len()]);

        let side_normal = (v2 - v1).normalize_or_zero();
        let ref_face_normal = Vec2::new(side_normal.y, -side_normal.x);
        let ref_c = ref_face_normal.dot(v1);
        let neg_side = -side_normal.dot(v1);
        let pos_side = side_normal.dot(v2);

        // Clip the incident face to the reference face's side planes.
        if clip(-side_normal, neg_side, &mut face) < 2 {
            return None;
        }
        if clip(side_normal, pos_side, &mut face) < 2 {
            return None;
        }

        let normal = if flip { -ref_face_normal } else { ref_face_normal };

        // Keep points behind the reference face.
        let mut kept = [Vec2::ZERO; 2];
        let mut count = 0;
        let mut depth = 0.0;
        for p in face {
            let separation = ref_face_normal.dot(p) - ref_c;
            if separation <= 0.0 {
                kept[count] = p;
                count += 1;
                depth += -separation;
            }
        }
        match count {
            0 => None,
            1 => Some(Collision::single(normal, depth, kept[0])),
            _ => Some(Collision::pair(normal, depth / count as f32, kept[0], kept[1])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn placed(mut s: Shape, pos: Vec2, angle: f32) -> Shape {
        s.set_position(pos);
        s.set_rotation(angle);
        s.compute_aabb();
        s
    }

    #[test]
    fn test_circle_circle_basic() {
        let c = Narrowphase::circle_circle(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0).unwrap();
        assert!(approx(c.penetration, 0.5));
        assert!(approx(c.normal.x, 1.0) && approx(c.normal.y, 0.0));
        assert_eq!(c.points().len(), 1);
        assert!(approx(c.points()[0].x, 1.0));
    }

    #[test]
    fn test_circle_circle_separated_and_coincident() {
        assert!(Narrowphase::circle_circle(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0).is_none());
        let c = Narrowphase::circle_circle(Vec2::ONE, 1.0, Vec2::ONE, 0.5).unwrap();
        assert!(approx(c.penetration, 1.5));
        assert!(approx(c.normal.length(), 1.0));
    }

    #[test]
    fn test_circle_on_box_face() {
        let circle = placed(Shape::circle(1.0).unwrap(), Vec2::new(0.0, -0.9), 0.0);
        let ground = placed(Shape::rect(2.0, 2.0).unwrap(), Vec2::new(0.0, 1.0), 0.0);
        let c = Narrowphase::collide(&circle, &ground).unwrap();
        assert!(approx(c.penetration, 0.1));
        assert!(approx(c.normal.y, 1.0));
        assert!(approx(c.points()[0].y, 0.1));

        // Same pair in the other order flips the normal.
        let r = Narrowphase::collide(&ground, &circle).unwrap();
        assert!(approx(r.normal.y, -1.0));
    }

    #[test]
    fn test_circle_near_box_corner() {
        let ground = placed(Shape::rect(2.0, 2.0).unwrap(), Vec2::ZERO, 0.0);
        // Diagonal from the (1,1) corner, just touching.
        let hit = placed(Shape::circle(0.5).unwrap(), Vec2::new(1.3, 1.3), 0.0);
        let c = Narrowphase::collide(&hit, &ground).unwrap();
        assert!(c.normal.x < 0.0 && c.normal.y < 0.0);
        assert!(approx(c.points()[0].x, 1.0) && approx(c.points()[0].y, 1.0));
        // Depth is measured to the corner, not to either face plane.
        let to_corner = (Vec2::new(1.3, 1.3) - Vec2::ONE).length();
        assert!(approx(c.penetration, 0.5 - to_corner));

        let miss = placed(Shape::circle(0.5).unwrap(), Vec2::new(1.4, 1.4), 0.0);
        assert!(Narrowphase::collide(&miss, &ground).is_none());
    }

    #[test]
    fn test_circle_centre_inside_polygon() {
        let ground = placed(Shape::rect(4.0, 4.0).unwrap(), Vec2::ZERO, 0.0);
        let inside = placed(Shape::circle(0.5).unwrap(), Vec2::new(0.0, 0.2), 0.0);
        let c = Narrowphase::collide(&inside, &ground).unwrap();
        assert!(approx(c.penetration, 0.5));
        assert!(approx(c.normal.length(), 1.0));
    }

    #[test]
    fn test_box_box_stacked_two_contacts() {
        let a = placed(Shape::rect(2.0, 2.0).unwrap(), Vec2::ZERO, 0.0);
        let b = placed(Shape::rect(2.0, 2.0).unwrap(), Vec2::new(0.0, 1.8), 0.0);
        let c = Narrowphase::collide(&a, &b).unwrap();
        assert_eq!(c.points().len(), 2);
        assert!(approx(c.penetration, 0.2));
        assert!(approx(c.normal.y, 1.0) && approx(c.normal.x, 0.0));
        for p in c.points() {
            assert!(approx(p.y, 1.0));
        }
    }

    #[test]
    fn test_box_box_separated() {
        let a = placed(Shape::rect(2.0, 2.0).unwrap(), Vec2::ZERO, 0.0);
        let b = placed(Shape::rect(2.0, 2.0).unwrap(), Vec2::new(2.5, 0.0), 0.0);
        assert!(Narrowphase::collide(&a, &b).is_none());
    }

    #[test]
    fn test_rotated_box_corner_into_face() {
        let ground = placed(Shape::rect(10.0, 2.0).unwrap(), Vec2::ZERO, 0.0);
        // Diamond whose bottom corner dips 0.1 below the ground's top face (y = -1).
        let h = std::f32::consts::SQRT_2;
        let diamond = placed(
            Shape::rect(2.0, 2.0).unwrap(),
            Vec2::new(0.0, -1.0 - h + 0.1),
            std::f32::consts::FRAC_PI_4,
        );
        let c = Narrowphase::collide(&diamond, &ground).unwrap();
        assert_eq!(c.points().len(), 1);
        assert!(approx(c.penetration, 0.1));
        assert!(approx(c.normal.y, 1.0));
    }

    #[test]
    fn test_clip_keeps_and_interpolates() {
        let mut face = [Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)];
        assert_eq!(clip(Vec2::X, 0.5, &mut face), 2);
        assert!(approx(face[0].x, -1.0));
        assert!(approx(face[1].x, 0.5));
        let mut outside = [Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)];
        assert_eq!(clip(Vec2::X, 0.5, &mut outside), 0);
    }
}
