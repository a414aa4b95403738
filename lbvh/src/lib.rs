//! Linear bounding-volume hierarchy over a borrowed slice of primitives.
//!
//! Building sorts the primitives by the Morton key of their extent (`morton`), derives the tree
//! topology from the sorted keys and fills in the boxes bottom-up (`build`), all in parallel.
//! Queries walk the tree with a fixed-size stack (`traverse`).

pub mod build;
pub mod error;
mod instance;
pub mod morton;
pub mod stack;
pub mod traverse;

use std::time::Instant;

use geometry::bvh::BBox;
use geometry::interaction::RayIntersection;
use geometry::ray::Ray;
use log::{debug, info, warn};
use radiometry::color::Color;
use rayon::prelude::*;

pub use build::{Node, NodeKind};
pub use error::TraversalError;
pub use instance::Instance;
pub use stack::MAX_STACK_CAPACITY;
pub use traverse::TraversalStats;

/// What the hierarchy needs from the things it organizes.
pub trait Primitive: Sync {
    /// Axis-aligned box enclosing the primitive. Must be finite.
    fn extent(&self) -> BBox;
    /// Closest hit within `(0, r.t_max)`, if any.
    fn intersect(&self, r: &Ray) -> Option<RayIntersection>;
    fn occludes(&self, r: &Ray) -> bool {
        self.intersect(r).is_some()
    }
    /// Tint and transparency picked up by a shadow feeler passing through. Opaque by default.
    fn filter(&self) -> (Color, f32) {
        (Color::black(), 0.0)
    }
}

/// Tunables of the traversal kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbvhConfig {
    /// Entries the traversal stack may hold, at most `MAX_STACK_CAPACITY`.
    pub stack_capacity: usize,
    /// Shadow transmittance below which the feeler is considered blocked.
    pub transmittance_floor: f32,
    /// Upper bound on internal nodes visited by a single query. `None` is unbounded.
    pub visit_budget: Option<usize>,
}

impl Default for LbvhConfig {
    fn default() -> Self {
        LbvhConfig {
            stack_capacity: MAX_STACK_CAPACITY,
            transmittance_floor: 0.05,
            visit_budget: None,
        }
    }
}

impl LbvhConfig {
    pub fn with_stack_capacity(self, stack_capacity: usize) -> Self {
        LbvhConfig {
            stack_capacity: stack_capacity.min(MAX_STACK_CAPACITY),
            ..self
        }
    }
    pub fn with_transmittance_floor(self, transmittance_floor: f32) -> Self {
        LbvhConfig {
            transmittance_floor,
            ..self
        }
    }
    pub fn with_visit_budget(self, visit_budget: Option<usize>) -> Self {
        LbvhConfig {
            visit_budget,
            ..self
        }
    }
}

pub struct Lbvh<'a, P> {
    config: LbvhConfig,
    primitives: &'a [P],
    nodes: Vec<Node>,
    sorted_keys: Vec<(u32, usize)>,
}

impl<'a, P: Primitive> Lbvh<'a, P> {
    /// An empty hierarchy. Every query on it reports no hit until `build()` is called.
    pub fn new(config: LbvhConfig) -> Self {
        Lbvh {
            config: config.with_stack_capacity(config.stack_capacity),
            primitives: &[],
            nodes: Vec::new(),
            sorted_keys: Vec::new(),
        }
    }

    /// (Re)builds the hierarchy over `primitives`, whose extents all lie in `scene_bounds`.
    /// Replaces whatever was built before.
    pub fn build(&mut self, primitives: &'a [P], scene_bounds: BBox) {
        self.primitives = primitives;
        let n = primitives.len();
        if n == 0 {
            info!("LBVH: no primitives, nothing to build");
            self.nodes = Vec::new();
            self.sorted_keys = Vec::new();
            return;
        }
        let diag = scene_bounds.diag();
        if scene_bounds.is_empty() || !scene_bounds.is_finite() || (0..3).any(|a| diag[a] <= 0.0) {
            warn!("LBVH: degenerate scene bounds {}", scene_bounds);
        }

        let start = Instant::now();
        let extents: Vec<BBox> = primitives.par_iter().map(|p| p.extent()).collect();
        let sorted_keys = morton::sorted_keys(&scene_bounds, &extents);
        let keys_done = Instant::now();
        let nodes = build::build_nodes(&sorted_keys, &extents);
        let tree_done = Instant::now();

        self.nodes = nodes;
        self.sorted_keys = sorted_keys;
        info!(
            "LBVH over {} primitives: keys + sort {:.2?}, topology + bounds {:.2?}",
            n,
            keys_done - start,
            tree_done - keys_done
        );
        debug!("LBVH height = {}", self.height());
    }

    pub fn config(&self) -> &LbvhConfig {
        &self.config
    }
    pub fn primitives(&self) -> &'a [P] {
        self.primitives
    }
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
    /// Number of primitives in the hierarchy.
    pub fn len(&self) -> usize {
        self.sorted_keys.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn root_bbox(&self) -> Option<BBox> {
        self.nodes.first().map(|root| root.bbox)
    }
    /// `(Morton key, primitive index)` pairs in leaf order.
    pub fn sorted_keys(&self) -> &[(u32, usize)] {
        &self.sorted_keys
    }

    /// Number of nodes on the longest root-to-leaf path, 0 when empty.
    pub fn height(&self) -> usize {
        // Leaves know their parents, so walk up from each of them.
        let leaf_offset = self.len().saturating_sub(1);
        (leaf_offset..self.nodes.len())
            .map(|leaf| {
                let mut depth = 1;
                let mut node = leaf;
                while let Some(parent) = self.nodes[node].parent {
                    depth += 1;
                    node = parent;
                }
                depth
            })
            .max()
            .unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        match self.root_bbox() {
            Some(bbox) => format!(
                "LBVH{{ {} primitives, {} nodes, height {}, {} }}",
                self.len(),
                self.nodes.len(),
                self.height(),
                bbox
            ),
            None => "LBVH{ empty }".to_string(),
        }
    }
}
