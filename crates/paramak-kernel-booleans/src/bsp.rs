//! BSP tree used by the mesh booleans.
//!
//! All traversals use explicit stacks: revolved solids produce thousands of
//! thin polygons and recursive descent overflows the stack on deep trees.

use crate::plane::{Plane, BACK, COPLANAR, FRONT};
use crate::polygon::Polygon;

/// Number of candidate polygons sampled when choosing a splitting plane.
const SPLIT_SAMPLE: usize = 12;

/// A BSP node: a splitting plane, the polygons lying on it, and two subtrees.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Splitting plane, `None` for an empty tree.
    pub plane: Option<Plane>,
    /// Subtree in front of `plane`.
    pub front: Option<Box<Node>>,
    /// Subtree behind `plane`.
    pub back: Option<Box<Node>>,
    /// Polygons coplanar with `plane`.
    pub polygons: Vec<Polygon>,
}

impl Node {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from polygons.
    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let mut node = Self::new();
        node.build(polygons.to_vec());
        node
    }

    /// Convert solid space to empty space and back.
    pub fn invert(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            for p in &mut node.polygons {
                p.flip();
            }
            if let Some(plane) = node.plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
            if let Some(front) = node.front.as_deref_mut() {
                stack.push(front);
            }
            if let Some(back) = node.back.as_deref_mut() {
                stack.push(back);
            }
        }
    }

    /// Remove the parts of `polygons` that lie inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![(self, polygons)];
        while let Some((node, polys)) = stack.pop() {
            let Some(plane) = node.plane.as_ref() else {
                result.extend(polys);
                continue;
            };
            let mut front_polys = Vec::with_capacity(polys.len());
            let mut back_polys = Vec::with_capacity(polys.len());
            for polygon in &polys {
                let (cf, cb, f, b) = plane.split_polygon(polygon);
                front_polys.extend(cf);
                back_polys.extend(cb);
                front_polys.extend(f);
                back_polys.extend(b);
            }
            match node.front.as_deref() {
                Some(front) if !front_polys.is_empty() => stack.push((front, front_polys)),
                Some(_) => {}
                None => result.extend(front_polys),
            }
            // polygons that reach the back of a leaf are inside and dropped
            if let Some(back) = node.back.as_deref() {
                if !back_polys.is_empty() {
                    stack.push((back, back_polys));
                }
            }
        }
        result
    }

    /// Remove all polygons in this tree that are inside `other`.
    pub fn clip_to(&mut self, other: &Node) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons = other.clip_polygons(std::mem::take(&mut node.polygons));
            if let Some(front) = node.front.as_deref_mut() {
                stack.push(front);
            }
            if let Some(back) = node.back.as_deref_mut() {
                stack.push(back);
            }
        }
    }

    /// Every polygon stored in the tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            result.extend_from_slice(&node.polygons);
            stack.extend(node.front.as_deref());
            stack.extend(node.back.as_deref());
        }
        result
    }

    /// Insert polygons into the tree, splitting them as needed.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        let mut stack = vec![(self, polygons)];
        while let Some((node, polys)) = stack.pop() {
            if polys.is_empty() {
                continue;
            }
            let plane = *node
                .plane
                .get_or_insert_with(|| pick_splitting_plane(&polys));
            let mut front = Vec::with_capacity(polys.len() / 2);
            let mut back = Vec::with_capacity(polys.len() / 2);
            for polygon in &polys {
                let (cf, cb, f, b) = plane.split_polygon(polygon);
                node.polygons.extend(cf);
                node.polygons.extend(cb);
                front.extend(f);
                back.extend(b);
            }
            let Node {
                front: front_child,
                back: back_child,
                ..
            } = node;
            if !front.is_empty() {
                let child = front_child.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((child.as_mut(), front));
            }
            if !back.is_empty() {
                let child = back_child.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((child.as_mut(), back));
            }
        }
    }
}

/// Choose the candidate plane that splits fewest polygons while keeping the
/// two halves balanced.
fn pick_splitting_plane(polygons: &[Polygon]) -> Plane {
    const K_SPANS: f64 = 8.0;
    const K_BALANCE: f64 = 1.0;

    let step = (polygons.len() / SPLIT_SAMPLE).max(1);
    let mut best_plane = polygons[0].plane;
    let mut best_score = f64::MAX;
    for candidate in polygons.iter().step_by(step).take(SPLIT_SAMPLE) {
        let plane = &candidate.plane;
        let (mut num_front, mut num_back, mut num_spanning) = (0i64, 0i64, 0i64);
        for poly in polygons {
            match plane.classify_polygon(poly) {
                COPLANAR => {}
                FRONT => num_front += 1,
                BACK => num_back += 1,
                _ => num_spanning += 1,
            }
        }
        let score = K_SPANS * num_spanning as f64 + K_BALANCE * (num_front - num_back).abs() as f64;
        if score < best_score {
            best_score = score;
            best_plane = *plane;
        }
    }
    best_plane
}
