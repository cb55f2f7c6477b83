use glam::{Mat2, Vec2};

use crate::error::{PhysicsError, Result};
use crate::types::*;

/// Convex polygon in body space, wound counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    /// Outward unit normal of the face `vertices[i] -> vertices[i + 1]`.
    normals: Vec<Vec2>,
}

impl Polygon {
    /// Build the convex hull of `points` (gift wrapping) and validate it.
    pub fn new(points: &[Vec2]) -> Result<Self> {
        if points.len() < 3 {
            return Err(PhysicsError::TooFewVertices(points.len()));
        }
        if points.len() > MAX_POLYGON_VERTICES {
            return Err(PhysicsError::TooManyVertices { got: points.len(), max: MAX_POLYGON_VERTICES });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(PhysicsError::NonFinite("polygon vertices"));
        }

        let vertices = convex_hull(points);
        if vertices.len() < 3 {
            return Err(PhysicsError::DegenerateHull(vertices.len()));
        }
        let mut poly = Self { vertices, normals: Vec::new() };
        let area = poly.area();
        if area <= EPSILON {
            return Err(PhysicsError::DegenerateArea(area));
        }
        poly.compute_face_normals();
        Ok(poly)
    }

    /// Axis-aligned box centred on the origin.
    pub fn rect(width: f32, height: f32) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) {
            return Err(PhysicsError::NonFinite("box extents"));
        }
        let area = width * height;
        if width <= EPSILON || height <= EPSILON || area <= EPSILON {
            return Err(PhysicsError::DegenerateArea(area));
        }
        let hw = width * 0.5;
        let hh = height * 0.5;
        let mut poly = Self {
            vertices: vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            normals: Vec::new(),
        };
        poly.compute_face_normals();
        Ok(poly)
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Signed area (positive for counter-clockwise winding).
    pub fn area(&self) -> f32 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| self.vertices[i].perp_dot(self.vertices[(i + 1) % n]))
            .sum::<f32>()
            * 0.5
    }

    /// Extreme vertex along `dir` (body space).
    pub fn support(&self, dir: Vec2) -> Vec2 {
        let mut best = self.vertices[0];
        let mut best_proj = f32::NEG_INFINITY;
        for &v in &self.vertices {
            let proj = v.dot(dir);
            if proj > best_proj {
                best_proj = proj;
                best = v;
            }
        }
        best
    }

    fn compute_face_normals(&mut self) {
        let n = self.vertices.len();
        self.normals.clear();
        for i in 0..n {
            let face = self.vertices[(i + 1) % n] - self.vertices[i];
            debug_assert!(face.length_squared() > EPSILON * EPSILON, "zero-length polygon edge");
            self.normals.push(Vec2::new(face.y, -face.x).normalize_or_zero());
        }
    }

    fn compute_mass(&mut self, density: f32) -> MassData {
        const INV3: f32 = 1.0 / 3.0;
        let n = self.vertices.len();
        let mut centroid = Vec2::ZERO;
        let mut area = 0.0;
        let mut inertia_origin = 0.0;

        // Triangle fan from the local origin.
        for i in 0..n {
            let p1 = self.vertices[i];
            let p2 = self.vertices[(i + 1) % n];
            let d = p1.perp_dot(p2);
            let tri_area = 0.5 * d;
            area += tri_area;
            centroid += tri_area * INV3 * (p1 + p2);

            let intx2 = p1.x * p1.x + p2.x * p1.x + p2.x * p2.x;
            let inty2 = p1.y * p1.y + p2.y * p1.y + p2.y * p2.y;
            inertia_origin += 0.25 * INV3 * d * (intx2 + inty2);
        }
        centroid /= area;

        for v in &mut self.vertices {
            *v -= centroid;
        }

        let mass = density * area;
        // Parallel axis: move the origin inertia onto the centroid.
        let inertia = density * inertia_origin - mass * centroid.length_squared();
        MassData { mass, inertia, centroid }
    }
}

/// Gift-wrapping hull, counter-clockwise starting at the right-most point.
fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let count = points.len();
    let mut right_most = 0;
    for i in 1..count {
        let p = points[i];
        let best = points[right_most];
        if p.x > best.x || (p.x == best.x && p.y < best.y) {
            right_most = i;
        }
    }

    let mut hull: Vec<usize> = Vec::with_capacity(count);
    let mut current = right_most;
    loop {
        hull.push(current);
        let mut next = 0;
        for i in 1..count {
            if next == current {
                next = i;
                continue;
            }
            let origin = points[current];
            let e1 = points[next] - origin;
            let e2 = points[i] - origin;
            let c = e1.perp_dot(e2);
            if c < 0.0 || (c == 0.0 && e2.length_squared() > e1.length_squared()) {
                next = i;
            }
        }
        current = next;
        // Duplicates of the start point close the loop too.
        if points[current] == points[right_most] || hull.len() >= count {
            break;
        }
    }

    let near = |a: Vec2, b: Vec2| (a - b).length_squared() <= EPSILON * EPSILON;
    let mut out: Vec<Vec2> = hull.into_iter().map(|i| points[i]).collect();
    out.dedup_by(|a, b| near(*a, *b));
    while out.len() > 1 && near(out[0], out[out.len() - 1]) {
        out.pop();
    }
    out
}

/// Geometry variant carried by a shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Circle { radius: f32 },
    Polygon(Polygon),
}

/// A body's collision geometry plus the transform and bounds cached from it.
#[derive(Clone, Debug)]
pub struct Shape {
    kind: ShapeKind,
    position: Vec2,
    rotation: Mat2,
    aabb: Aabb,
    owner: Option<BodyHandle>,
}

impl Shape {
    fn from_kind(kind: ShapeKind) -> Self {
        let mut shape = Self {
            kind,
            position: Vec2::ZERO,
            rotation: Mat2::IDENTITY,
            aabb: Aabb::default(),
            owner: None,
        };
        shape.compute_aabb();
        shape
    }

    pub fn circle(radius: f32) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::NonPositiveRadius(radius));
        }
        Ok(Self::from_kind(ShapeKind::Circle { radius }))
    }

    /// Convex hull of `points`; the points need not be ordered.
    pub fn polygon(points: &[Vec2]) -> Result<Self> {
        Ok(Self::from_kind(ShapeKind::Polygon(Polygon::new(points)?)))
    }

    /// Axis-aligned box of the given full width and height.
    pub fn rect(width: f32, height: f32) -> Result<Self> {
        Ok(Self::from_kind(ShapeKind::Polygon(Polygon::rect(width, height)?)))
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Body-to-world rotation.
    pub fn rotation(&self) -> Mat2 {
        self.rotation
    }

    /// Cached bounds; current only as of the last `compute_aabb`.
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Body this shape is bound to, once added to a world.
    pub fn owner(&self) -> Option<BodyHandle> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: BodyHandle) {
        self.owner = Some(owner);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = Mat2::from_angle(radians);
    }

    /// Body-space point to world space.
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.rotation * local + self.position
    }

    /// One-time setup when the shape is bound to a body.
    pub fn initialize(&mut self) {
        if let ShapeKind::Polygon(poly) = &mut self.kind {
            poly.compute_face_normals();
        }
        self.compute_aabb();
    }

    pub fn compute_aabb(&mut self) {
        self.aabb = match &self.kind {
            ShapeKind::Circle { radius } => {
                Aabb::from_center_half_extents(self.position, Vec2::splat(*radius))
            }
            ShapeKind::Polygon(poly) => {
                let mut min = Vec2::splat(f32::INFINITY);
                let mut max = Vec2::splat(f32::NEG_INFINITY);
                for &v in poly.vertices() {
                    let w = self.rotation * v + self.position;
                    min = min.min(w);
                    max = max.max(w);
                }
                Aabb::new(min, max)
            }
        };
    }

    /// Derive mass properties for `density`. Polygons are re-centred on their
    /// centroid, so the owning body's position becomes the centre of mass.
    pub fn compute_mass(&mut self, density: f32) -> Result<MassData> {
        if !density.is_finite() || density <= 0.0 {
            return Err(PhysicsError::NonPositiveDensity(density));
        }
        let data = match &mut self.kind {
            ShapeKind::Circle { radius } => {
                let mass = std::f32::consts::PI * *radius * *radius * density;
                MassData { mass, inertia: mass * *radius * *radius, centroid: Vec2::ZERO }
            }
            ShapeKind::Polygon(poly) => poly.compute_mass(density),
        };
        self.compute_aabb();
        Ok(data)
    }
}
