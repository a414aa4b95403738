//! The three query kernels. They share one depth-first loop over the node buffer and differ only
//! in what they do with a primitive whose box the ray reaches.

use geometry::interaction::RayIntersection;
use geometry::ray::Ray;
use radiometry::color::Color;

use crate::build::NodeKind;
use crate::error::{Result, TraversalError};
use crate::stack::TraversalStack;
use crate::{Lbvh, Primitive};

/// Work counters of one or more queries. Counts accumulate across calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    pub box_tests: usize,
    pub primitive_tests: usize,
    pub nodes_visited: usize,
}

impl std::ops::AddAssign for TraversalStats {
    fn add_assign(&mut self, rhs: Self) {
        self.box_tests += rhs.box_tests;
        self.primitive_tests += rhs.primitive_tests;
        self.nodes_visited += rhs.nodes_visited;
    }
}

trait Visitor {
    /// Boxes entered at or beyond this ray parameter are skipped.
    fn cutoff(&self) -> f32;
    /// Exact test against one primitive. Returns true to end the traversal.
    fn visit<P: Primitive>(&mut self, index: usize, primitive: &P, r: &Ray) -> bool;
}

struct NearestHit<'b> {
    best: &'b mut RayIntersection,
    t_max: f32,
    found: bool,
}

impl Visitor for NearestHit<'_> {
    fn cutoff(&self) -> f32 {
        self.best.distance.min(self.t_max)
    }
    fn visit<P: Primitive>(&mut self, index: usize, primitive: &P, r: &Ray) -> bool {
        if let Some(hit) = primitive.intersect(r) {
            if hit.distance < self.best.distance {
                *self.best = hit.with_primitive(index);
                self.found = true;
            }
        }
        false
    }
}

struct AnyHit {
    t_max: f32,
    found: bool,
}

impl Visitor for AnyHit {
    fn cutoff(&self) -> f32 {
        self.t_max
    }
    fn visit<P: Primitive>(&mut self, _: usize, primitive: &P, r: &Ray) -> bool {
        self.found = primitive.occludes(r);
        self.found
    }
}

struct ShadowTransmittance<'b> {
    color: &'b mut Color,
    transmittance: &'b mut f32,
    floor: f32,
    t_max: f32,
    found: bool,
}

impl Visitor for ShadowTransmittance<'_> {
    fn cutoff(&self) -> f32 {
        self.t_max
    }
    fn visit<P: Primitive>(&mut self, _: usize, primitive: &P, r: &Ray) -> bool {
        if !primitive.occludes(r) {
            return false;
        }
        let (tint, transparency) = primitive.filter();
        *self.transmittance *= transparency;
        *self.color *= tint;
        self.found = true;
        *self.transmittance < self.floor
    }
}

impl<'a, P: Primitive> Lbvh<'a, P> {
    /// Finds the closest primitive hit by `r` that is closer than `best`, and stores it in
    /// `best` (with `best.primitive` set to the index of the primitive in the built slice).
    /// Returns whether `best` was updated.
    pub fn find_nearest_intersection(&self, r: &Ray, best: &mut RayIntersection) -> Result<bool> {
        self.find_nearest_intersection_with_stats(r, best, &mut TraversalStats::default())
    }

    pub fn find_nearest_intersection_with_stats(
        &self,
        r: &Ray,
        best: &mut RayIntersection,
        stats: &mut TraversalStats,
    ) -> Result<bool> {
        let mut visitor = NearestHit {
            best,
            t_max: r.t_max,
            found: false,
        };
        self.traverse(r, &mut visitor, stats)?;
        Ok(visitor.found)
    }

    /// Returns true as soon as any primitive is confirmed to be hit by `r` within its extent.
    pub fn find_intersection(&self, r: &Ray) -> Result<bool> {
        self.find_intersection_with_stats(r, &mut TraversalStats::default())
    }

    pub fn find_intersection_with_stats(&self, r: &Ray, stats: &mut TraversalStats) -> Result<bool> {
        let mut visitor = AnyHit {
            t_max: r.t_max,
            found: false,
        };
        self.traverse(r, &mut visitor, stats)?;
        Ok(visitor.found)
    }

    /// Attenuates `transmittance` and tints `color` by every primitive `r` passes through, in no
    /// particular order. Stops early once `transmittance` drops below the configured floor.
    /// Returns whether anything was hit.
    pub fn estimate_shadow_transmittance(
        &self,
        r: &Ray,
        color: &mut Color,
        transmittance: &mut f32,
    ) -> Result<bool> {
        self.estimate_shadow_transmittance_with_stats(
            r,
            color,
            transmittance,
            &mut TraversalStats::default(),
        )
    }

    pub fn estimate_shadow_transmittance_with_stats(
        &self,
        r: &Ray,
        color: &mut Color,
        transmittance: &mut f32,
        stats: &mut TraversalStats,
    ) -> Result<bool> {
        let mut visitor = ShadowTransmittance {
            color,
            transmittance,
            floor: self.config.transmittance_floor,
            t_max: r.t_max,
            found: false,
        };
        self.traverse(r, &mut visitor, stats)?;
        Ok(visitor.found)
    }

    /// Returns the ray parameter at which `r` enters the box of `node`, if it does so before the
    /// visitor's cutoff.
    fn enter<V: Visitor>(
        &self,
        node: usize,
        r: &Ray,
        visitor: &V,
        stats: &mut TraversalStats,
    ) -> Option<f32> {
        stats.box_tests += 1;
        self.nodes[node]
            .bbox
            .entry_distance(r)
            .filter(|&t| t < visitor.cutoff())
    }

    fn traverse<V: Visitor>(
        &self,
        r: &Ray,
        visitor: &mut V,
        stats: &mut TraversalStats,
    ) -> Result<()> {
        if self.nodes.is_empty() || self.enter(0, r, visitor, stats).is_none() {
            return Ok(());
        }
        let mut visited = 0usize;
        let mut stack = TraversalStack::new(self.config.stack_capacity);
        let mut node = 0;
        loop {
            visited += 1;
            stats.nodes_visited += 1;
            if let Some(budget) = self.config.visit_budget {
                if visited > budget {
                    return Err(TraversalError::VisitBudgetExceeded { budget });
                }
            }

            let (left, right) = match self.nodes[node].kind {
                NodeKind::Internal { left, right } => (left, right),
                NodeKind::Leaf { primitive } => {
                    // Only reached when the root itself is a leaf.
                    stats.primitive_tests += 1;
                    visitor.visit(primitive, &self.primitives[primitive], r);
                    return Ok(());
                }
            };

            // Children to descend into, with their entry distances. Leaves are resolved here.
            let mut pending = [None, None];
            for (slot, &child) in pending.iter_mut().zip([left, right].iter()) {
                let entry = match self.enter(child, r, visitor, stats) {
                    Some(t) => t,
                    None => continue,
                };
                match self.nodes[child].kind {
                    NodeKind::Leaf { primitive } => {
                        stats.primitive_tests += 1;
                        if visitor.visit(primitive, &self.primitives[primitive], r) {
                            return Ok(());
                        }
                    }
                    NodeKind::Internal { .. } => *slot = Some((child, entry)),
                }
            }

            node = match pending {
                [Some((l, _)), Some((rt, entry))] => {
                    stack.push(rt, entry)?;
                    l
                }
                [Some((l, _)), None] => l,
                [None, Some((rt, _))] => rt,
                [None, None] => {
                    // Pops until an entry is still worth visiting.
                    let cutoff = visitor.cutoff();
                    loop {
                        match stack.pop() {
                            None => return Ok(()),
                            Some(e) if e.entry < cutoff => break e.node,
                            Some(_) => (),
                        }
                    }
                }
            };
        }
    }
}
