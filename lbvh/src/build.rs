//! Hierarchy construction: topology from sorted keys (Karras 2012), then bottom-up bounds.

use std::sync::atomic::{AtomicU32, Ordering};

use geometry::bvh::{self, BBox};
use math::hcm::Point3;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Internal { left: usize, right: usize },
    Leaf { primitive: usize },
}

/// One entry of the node buffer. Internal nodes occupy `[0, N-1)` with the root at 0, leaves
/// occupy `[N-1, 2N-1)` in key order. Links are indices into the same buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub bbox: BBox,
    pub parent: Option<usize>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// Fuses each key with its original index into a unique `u64`, so that equal Morton codes still
/// compare strictly: `(code << ceil(log2 N)) | index`.
pub(crate) fn composite_keys(sorted: &[(u32, usize)]) -> Vec<u64> {
    let index_bits = sorted.len().next_power_of_two().trailing_zeros();
    sorted
        .iter()
        .map(|&(code, index)| ((code as u64) << index_bits) | index as u64)
        .collect()
}

/// Length of the common prefix of keys `i` and `j`, or -1 if `j` is out of range.
fn delta(keys: &[u64], i: isize, j: isize) -> i32 {
    if j < 0 || j >= keys.len() as isize {
        -1
    } else {
        (keys[i as usize] ^ keys[j as usize]).leading_zeros() as i32
    }
}

/// Finds the key range covered by internal node `i` and where it splits. Returns the node
/// indices of the left and right children.
pub(crate) fn split_children(keys: &[u64], i: usize) -> (usize, usize) {
    let n = keys.len();
    let i = i as isize;
    // Direction of the range: toward the neighbor sharing the longer prefix.
    let d: isize = if delta(keys, i, i + 1) > delta(keys, i, i - 1) {
        1
    } else {
        -1
    };

    // Upper bound for the range length, then binary search for the other end.
    let delta_min = delta(keys, i, i - d);
    let mut l_max: isize = 2;
    while delta(keys, i, i + l_max * d) > delta_min {
        l_max *= 2;
    }
    let mut l: isize = 0;
    let mut t = l_max / 2;
    while t >= 1 {
        if delta(keys, i, i + (l + t) * d) > delta_min {
            l += t;
        }
        t /= 2;
    }
    let j = i + l * d;

    // Binary search for the last key sharing more than `delta_node` bits with key i.
    let delta_node = delta(keys, i, j);
    let mut s: isize = 0;
    let mut div: isize = 2;
    loop {
        let t = (l + div - 1) / div;
        if delta(keys, i, i + (s + t) * d) > delta_node {
            s += t;
        }
        if t <= 1 {
            break;
        }
        div *= 2;
    }
    let gamma = (i + s * d + d.min(0)) as usize;

    let (lo, hi) = (i.min(j) as usize, i.max(j) as usize);
    let leaf_offset = n - 1;
    let left = if lo == gamma {
        leaf_offset + gamma
    } else {
        gamma
    };
    let right = if hi == gamma + 1 {
        leaf_offset + gamma + 1
    } else {
        gamma + 1
    };
    (left, right)
}

/// Box cell that several threads can read and write. Corners are stored as `f32` bit patterns.
struct AtomicBBox {
    bits: [AtomicU32; 6],
}

impl AtomicBBox {
    fn new(b: BBox) -> Self {
        let (lo, hi) = (b.min(), b.max());
        AtomicBBox {
            bits: [
                AtomicU32::new(lo.x.to_bits()),
                AtomicU32::new(lo.y.to_bits()),
                AtomicU32::new(lo.z.to_bits()),
                AtomicU32::new(hi.x.to_bits()),
                AtomicU32::new(hi.y.to_bits()),
                AtomicU32::new(hi.z.to_bits()),
            ],
        }
    }
    fn load(&self) -> BBox {
        let f = |k: usize| f32::from_bits(self.bits[k].load(Ordering::Relaxed));
        BBox::from_corners(
            Point3::new(f(0), f(1), f(2)),
            Point3::new(f(3), f(4), f(5)),
        )
    }
    fn store(&self, b: BBox) {
        let (lo, hi) = (b.min(), b.max());
        let values = [lo.x, lo.y, lo.z, hi.x, hi.y, hi.z];
        for (cell, v) in self.bits.iter().zip(values.iter()) {
            cell.store(v.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Builds the node buffer for `N = sorted.len() >= 1` primitives.
///
/// `sorted` holds `(key, original index)` pairs in key order and `extents[k]` is the box of the
/// primitive with original index `k`.
pub(crate) fn build_nodes(sorted: &[(u32, usize)], extents: &[BBox]) -> Vec<Node> {
    let n = sorted.len();
    assert!(n >= 1);
    assert_eq!(n, extents.len());
    let leaf_offset = n - 1;

    let keys = composite_keys(sorted);
    let children: Vec<(usize, usize)> = (0..n - 1)
        .into_par_iter()
        .map(|i| split_children(&keys, i))
        .collect();

    let mut parents: Vec<Option<usize>> = vec![None; 2 * n - 1];
    for (i, &(left, right)) in children.iter().enumerate() {
        parents[left] = Some(i);
        parents[right] = Some(i);
    }

    let cells: Vec<AtomicBBox> = (0..2 * n - 1)
        .map(|node| {
            if node < leaf_offset {
                AtomicBBox::new(BBox::empty())
            } else {
                AtomicBBox::new(extents[sorted[node - leaf_offset].1])
            }
        })
        .collect();
    reduce_bounds(&children, &parents, &cells, leaf_offset);

    (0..2 * n - 1)
        .map(|node| {
            let kind = if node < leaf_offset {
                let (left, right) = children[node];
                NodeKind::Internal { left, right }
            } else {
                NodeKind::Leaf {
                    primitive: sorted[node - leaf_offset].1,
                }
            };
            Node {
                bbox: cells[node].load(),
                parent: parents[node],
                kind,
            }
        })
        .collect()
}

/// Walks from every leaf toward the root in parallel. The first thread to reach an internal node
/// stops there; the second one, which is guaranteed to see both children's boxes, writes the
/// union and climbs on.
fn reduce_bounds(
    children: &[(usize, usize)],
    parents: &[Option<usize>],
    cells: &[AtomicBBox],
    leaf_offset: usize,
) {
    let arrivals: Vec<AtomicU32> = (0..leaf_offset).map(|_| AtomicU32::new(0)).collect();
    let leaf_count = leaf_offset + 1;
    (0..leaf_count).into_par_iter().for_each(|k| {
        let mut node = leaf_offset + k;
        while let Some(parent) = parents[node] {
            // AcqRel: publishes this child's box to the sibling thread and acquires the sibling's.
            if arrivals[parent].fetch_add(1, Ordering::AcqRel) == 0 {
                return;
            }
            let (left, right) = children[parent];
            cells[parent].store(bvh::union(cells[left].load(), cells[right].load()));
            node = parent;
        }
    });
    debug_assert!(arrivals.iter().all(|a| a.load(Ordering::Relaxed) == 2));
}
