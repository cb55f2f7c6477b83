use glam::Vec2;

use std::time::Instant;

use crate::api::PhysicsWorldApi;
use crate::body::{BodyDesc, Rigidbody};
use crate::error::Result;
use crate::manifold::Manifold;
use crate::shape::Shape;
use crate::spatial_hash::SpatialHash;
use crate::types::*;

/// Fixed-timestep rigid-body world.
///
/// Bodies live in a generation-checked slot arena. Removal is two-phase:
/// [`PhysicsWorldApi::remove`] only queues the handle and the body is excised at
/// the start of the next step, before anything else runs.
pub struct PhysicsWorld {
    cfg: WorldConfig,
    pub step_counter: u64,

    slots: Vec<Slot>,
    free: Vec<u32>,
    pending_removal: Vec<BodyHandle>,

    // Broad phase, rebuilt every step from slot indices.
    grid: SpatialHash,

    // Contacts kept by the last step.
    contacts: Vec<Manifold>,

    last_stats: WorldStats,
    last_timing: Option<WorldTiming>,
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Rigidbody>,
}

/// Two distinct live bodies, mutably.
fn pair_mut(slots: &mut [Slot], i: usize, j: usize) -> Option<(&mut Rigidbody, &mut Rigidbody)> {
    if i == j || i.max(j) >= slots.len() {
        return None;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let (head, tail) = slots.split_at_mut(hi);
    let low = head[lo].body.as_mut()?;
    let high = tail[0].body.as_mut()?;
    Some(if i < j { (low, high) } else { (high, low) })
}

fn elapsed_ms(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            grid: SpatialHash::new(cfg.cell_size),
            cfg,
            step_counter: 0,
            slots: Vec::new(),
            free: Vec::new(),
            pending_removal: Vec::new(),
            contacts: Vec::new(),
            last_stats: WorldStats::default(),
            last_timing: None,
        })
    }

    fn step(&mut self) {
        self.step_dt(self.cfg.dt);
    }

    fn step_dt(&mut self, dt: f32) {
        let timing = self.cfg.enable_timing;
        let t_all = timing.then(Instant::now);

        let excised = self.excise_pending();

        // --- Broad phase ---------------------------------------------------
        let t_broad = timing.then(Instant::now);
        self.grid.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(body) = slot.body.as_mut() {
                body.sync_shape();
                self.grid.insert(i, body.shape().aabb());
            }
        }
        let pairs = self.grid.candidate_pairs();
        let broadphase_ms = elapsed_ms(t_broad);

        // --- Narrow phase --------------------------------------------------
        let t_narrow = timing.then(Instant::now);
        self.contacts.clear();
        for &(ia, ib) in &pairs {
            let (Some(a), Some(b)) = (self.slots[ia].body.as_ref(), self.slots[ib].body.as_ref()) else {
                continue;
            };
            if a.is_static() && b.is_static() {
                continue;
            }
            if !a.shape().aabb().overlaps(&b.shape().aabb()) {
                continue;
            }
            let mut m = Manifold::new(self.handle_at(ia), self.handle_at(ib));
            if m.solve(a, b) {
                self.contacts.push(m);
            }
        }
        let narrowphase_ms = elapsed_ms(t_narrow);

        // --- Solve ---------------------------------------------------------
        let t_solve = timing.then(Instant::now);
        let gravity = self.cfg.gravity;
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            body.integrate_forces(gravity, dt);
        }

        for m in &mut self.contacts {
            if let Some((a, b)) = pair_mut(&mut self.slots, m.a.index as usize, m.b.index as usize) {
                m.initialize(a, b, gravity, dt);
            }
        }

        for _ in 0..self.cfg.iterations {
            for m in &mut self.contacts {
                if let Some((a, b)) = pair_mut(&mut self.slots, m.a.index as usize, m.b.index as usize) {
                    m.apply_impulse(a, b);
                }
            }
        }

        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            body.integrate_velocity(dt);
        }

        let (slop, percent) = (self.cfg.penetration_slop, self.cfg.correction_percent);
        for m in &self.contacts {
            if let Some((a, b)) = pair_mut(&mut self.slots, m.a.index as usize, m.b.index as usize) {
                m.positional_correction(a, b, slop, percent);
            }
        }

        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            body.clear_forces();
            body.sync_shape();
        }
        let solve_ms = elapsed_ms(t_solve);

        self.step_counter = self.step_counter.wrapping_add(1);
        self.last_stats = WorldStats {
            bodies: self.body_count(),
            excised,
            cells: self.grid.len(),
            candidate_pairs: self.grid.raw_pair_count(),
            unique_pairs: pairs.len(),
            manifolds: self.contacts.len(),
            contacts: self.contacts.iter().map(Manifold::contact_count).sum(),
        };
        if timing {
            self.last_timing = Some(WorldTiming {
                step_ms: elapsed_ms(t_all),
                broadphase_ms,
                narrowphase_ms,
                solve_ms,
            });
        }
        log::trace!(
            "step {}: bodies={} pairs={} manifolds={} contacts={}",
            self.step_counter,
            self.last_stats.bodies,
            self.last_stats.unique_pairs,
            self.last_stats.manifolds,
            self.last_stats.contacts
        );
    }

    fn add(&mut self, desc: BodyDesc) -> Result<BodyHandle> {
        let mut body = Rigidbody::from_desc(desc)?;
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let handle = BodyHandle { index, generation: slot.generation };
        body.shape_mut().set_owner(handle);
        log::debug!(
            "added body {:?} at ({:.2}, {:.2}) static={}",
            handle,
            body.position.x,
            body.position.y,
            body.is_static()
        );
        slot.body = Some(body);
        Ok(handle)
    }

    fn create_circle(&mut self, radius: f32, position: Vec2, is_static: bool) -> Result<BodyHandle> {
        let desc = BodyDesc::new(Shape::circle(radius)?, position);
        self.add(if is_static { desc.fixed() } else { desc })
    }

    fn create_polygon(&mut self, vertices: &[Vec2], position: Vec2, is_static: bool) -> Result<BodyHandle> {
        let desc = BodyDesc::new(Shape::polygon(vertices)?, position);
        self.add(if is_static { desc.fixed() } else { desc })
    }

    fn create_box(&mut self, width: f32, height: f32, position: Vec2, is_static: bool) -> Result<BodyHandle> {
        let desc = BodyDesc::new(Shape::rect(width, height)?, position);
        self.add(if is_static { desc.fixed() } else { desc })
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        if !self.contains(handle) || self.pending_removal.contains(&handle) {
            return false;
        }
        log::debug!("body {:?} marked for removal", handle);
        self.pending_removal.push(handle);
        true
    }

    fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(i as u32);
        }
        self.pending_removal.clear();
        self.contacts.clear();
        self.grid.clear();
        log::debug!("world cleared");
    }

    fn body(&self, handle: BodyHandle) -> Option<&Rigidbody> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Rigidbody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    fn bodies(&self) -> Box<dyn Iterator<Item = (BodyHandle, &Rigidbody)> + '_> {
        Box::new(self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let handle = BodyHandle { index: i as u32, generation: slot.generation };
            slot.body.as_ref().map(|b| (handle, b))
        }))
    }

    fn manifolds(&self) -> &[Manifold] {
        &self.contacts
    }
}

impl PhysicsWorld {
    fn handle_at(&self, index: usize) -> BodyHandle {
        BodyHandle { index: index as u32, generation: self.slots[index].generation }
    }

    /// Drop every body queued by `remove` since the previous step. Returns how
    /// many were dropped.
    fn excise_pending(&mut self) -> usize {
        if self.pending_removal.is_empty() {
            return 0;
        }
        let mut excised = 0;
        for handle in self.pending_removal.drain(..) {
            let Some(slot) = self.slots.get_mut(handle.index as usize) else { continue };
            if slot.generation != handle.generation || slot.body.is_none() {
                continue;
            }
            slot.body = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.index);
            excised += 1;
        }
        log::debug!("excised {} bodies before step {}", excised, self.step_counter + 1);
        excised
    }

    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    /// Swap in a new config. The broad-phase grid is rebuilt when the cell size
    /// changes; on error the current config is kept.
    pub fn set_config(&mut self, cfg: WorldConfig) -> Result<()> {
        cfg.validate()?;
        if cfg.cell_size != self.cfg.cell_size {
            self.grid = SpatialHash::new(cfg.cell_size);
        }
        self.cfg = cfg;
        Ok(())
    }

    /// Whether `handle` refers to a live body (pending removal included).
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    pub fn is_pending_removal(&self, handle: BodyHandle) -> bool {
        self.pending_removal.contains(&handle)
    }

    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// Broad-phase grid as built by the last step.
    pub fn grid(&self) -> &SpatialHash {
        &self.grid
    }

    /// Return debug/perf stats for the last step.
    pub fn stats(&self) -> WorldStats {
        self.last_stats
    }

    /// Return timing breakdown for the last step (when `enable_timing` is set).
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }
}
