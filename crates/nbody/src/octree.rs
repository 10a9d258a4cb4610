//! Arena-based Barnes-Hut octree.
//!
//! Nodes are stored contiguously in a `Vec` and reference each other by index.
//! The tree borrows the mass distribution it was built from and only stores
//! indices into it, so rebuilding every step is cheap.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::Point3;
//! use nbody::Particle;
//! use nbody::octree::{BoundingBox, Octree};
//!
//! let particles = vec![
//!     Particle::new(1.0e10, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
//!     Particle::new(1.0e6, [8.0, 0.0, 0.0], [0.0, 220.0, 0.0]),
//! ];
//!
//! let bounds = BoundingBox::enclosing(particles.as_slice());
//! let tree = Octree::build(particles.as_slice(), bounds);
//!
//! let field = tree.field_at(Point3::new(8.0, 0.0, 0.0), Some(1), 0.5, 0.0);
//! assert!(field.acceleration.x < 0.0);
//! ```

use nalgebra::{Point3, Vector3};
use units::G_GALACTIC;

/// Maximum subdivision depth; coincident particles share a leaf below it.
const MAX_DEPTH: usize = 30;

/// An element that can be inserted into the tree: a position and a mass.
///
/// # Examples
///
/// ```rust
/// use nalgebra::Point3;
/// use nbody::octree::Massive;
///
/// #[derive(Clone, Copy)]
/// struct Star {
///     pos: Point3<f64>,
///     mass: f64,
/// }
///
/// impl Massive for Star {
///     fn position(&self) -> Point3<f64> {
///         self.pos
///     }
///
///     fn mass(&self) -> f64 {
///         self.mass
///     }
/// }
/// ```
pub trait Massive: Copy {
    /// Position in kpc
    fn position(&self) -> Point3<f64>;

    /// Mass in solar masses
    fn mass(&self) -> f64;
}

/// Indexed access to positions and masses, implemented for slices of
/// [`Massive`] items and for column-oriented particle sets.
pub trait MassDistribution {
    fn count(&self) -> usize;
    fn position_of(&self, index: usize) -> Point3<f64>;
    fn mass_of(&self, index: usize) -> f64;
}

impl<B: Massive> MassDistribution for [B] {
    fn count(&self) -> usize {
        self.len()
    }

    fn position_of(&self, index: usize) -> Point3<f64> {
        self[index].position()
    }

    fn mass_of(&self, index: usize) -> f64 {
        self[index].mass()
    }
}

/// An axis-aligned box in kpc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// The smallest cube containing every element of `source`.
    ///
    /// A cube keeps octants well shaped for the opening criterion.
    pub fn enclosing<S: MassDistribution + ?Sized>(source: &S) -> Self {
        let (min, max) = (0..source.count()).fold(
            (
                Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            ),
            |(min, max), i| {
                let p = source.position_of(i);
                (min.inf(&p), max.sup(&p))
            },
        );
        if source.count() == 0 {
            return Self {
                min: Point3::origin(),
                max: Point3::origin(),
            };
        }

        let center = nalgebra::center(&min, &max);
        let half = (max - min).max() / 2.0;
        let half = Vector3::repeat(half);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the box diagonal
    fn size(&self) -> f64 {
        (self.max - self.min).magnitude()
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Determines which octant (0-7) a point belongs to.
    ///
    /// Bit 0 selects the upper x half, bit 1 the upper y half, bit 2 the upper z half.
    fn octant(&self, point: &Point3<f64>) -> usize {
        let center = self.center();
        let x_bit = (point.x > center.x) as usize;
        let y_bit = (point.y > center.y) as usize;
        let z_bit = (point.z > center.z) as usize;
        x_bit | (y_bit << 1) | (z_bit << 2)
    }

    /// Creates the sub-box for the specified octant (0-7)
    fn subdivide(&self, octant: usize) -> Self {
        let center = self.center();
        let mut min = self.min;
        let mut max = center;
        for axis in 0..3 {
            if octant & (1 << axis) != 0 {
                min[axis] = center[axis];
                max[axis] = self.max[axis];
            }
        }
        BoundingBox { min, max }
    }
}

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel value representing an empty node
    pub const EMPTY: NodeId = NodeId(u32::MAX);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

#[derive(Clone, Copy)]
enum Node {
    /// Single element
    Leaf { index: u32 },

    /// Several elements at maximum depth, stored in `Octree::bucket[start..start + count]`
    Bucket { start: u32, count: u32 },

    Internal {
        center_of_mass: Point3<f64>,
        total_mass: f64,
        bounds: BoundingBox,
        children: [NodeId; 8],
    },
}

/// Acceleration and potential at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// (km/s)^2 / kpc
    pub acceleration: Vector3<f64>,
    /// (km/s)^2
    pub potential: f64,
}

impl FieldSample {
    fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
            potential: 0.0,
        }
    }

    fn add(self, other: FieldSample) -> Self {
        Self {
            acceleration: self.acceleration + other.acceleration,
            potential: self.potential + other.potential,
        }
    }
}

/// Arena-based Barnes-Hut octree over a borrowed mass distribution.
pub struct Octree<'a, S: MassDistribution + ?Sized> {
    nodes: Vec<Node>,
    bucket: Vec<u32>,
    source: &'a S,
    pub(crate) root: NodeId,
}

impl<'a, S: MassDistribution + ?Sized> Octree<'a, S> {
    /// Builds the tree, subdividing until each leaf holds one element
    /// (or several at maximum depth).
    pub fn build(source: &'a S, bounds: BoundingBox) -> Self {
        let mut nodes = Vec::with_capacity(source.count() * 2);
        let mut bucket = Vec::new();
        let indices: Vec<usize> = (0..source.count()).collect();

        let root = Self::build_recursive(source, &indices, bounds, 0, &mut nodes, &mut bucket);

        Octree {
            nodes,
            bucket,
            source,
            root,
        }
    }

    fn build_recursive(
        source: &S,
        indices: &[usize],
        bounds: BoundingBox,
        depth: usize,
        arena: &mut Vec<Node>,
        bucket: &mut Vec<u32>,
    ) -> NodeId {
        match indices {
            [] => NodeId::EMPTY,

            [single] => {
                let id = NodeId::new(arena.len());
                arena.push(Node::Leaf {
                    index: *single as u32,
                });
                id
            }

            _ if depth >= MAX_DEPTH => {
                let id = NodeId::new(arena.len());
                let start = bucket.len() as u32;
                bucket.extend(indices.iter().map(|&i| i as u32));
                arena.push(Node::Bucket {
                    start,
                    count: indices.len() as u32,
                });
                id
            }

            indices => {
                let mut octants: [Vec<usize>; 8] = Default::default();
                for &i in indices {
                    octants[bounds.octant(&source.position_of(i))].push(i);
                }

                let children: [NodeId; 8] = std::array::from_fn(|o| {
                    Self::build_recursive(
                        source,
                        &octants[o],
                        bounds.subdivide(o),
                        depth + 1,
                        arena,
                        bucket,
                    )
                });

                let (total_mass, weighted_pos) =
                    indices
                        .iter()
                        .fold((0.0f64, Vector3::zeros()), |(mass, pos), &i| {
                            let m = source.mass_of(i);
                            (mass + m, pos + source.position_of(i).coords * m)
                        });

                let center_of_mass = if total_mass > 0.0 {
                    Point3::from(weighted_pos / total_mass)
                } else {
                    bounds.center()
                };

                let id = NodeId::new(arena.len());
                arena.push(Node::Internal {
                    center_of_mass,
                    total_mass,
                    bounds,
                    children,
                });
                id
            }
        }
    }

    /// Acceleration and potential at `pos` with Plummer softening `softening` (kpc).
    ///
    /// `exclude` names an element whose own contribution is skipped, typically the
    /// particle sitting at `pos`. Cells containing `pos` are always opened.
    ///
    /// # Arguments
    ///
    /// * `pos` - Evaluation point in kpc
    /// * `exclude` - Index of an element to ignore
    /// * `theta` - Opening angle (0.0 = exact, larger = faster but less accurate)
    /// * `softening` - Plummer softening length in kpc
    pub fn field_at(
        &self,
        pos: Point3<f64>,
        exclude: Option<usize>,
        theta: f64,
        softening: f64,
    ) -> FieldSample {
        self.field_recursive(self.root, pos, exclude, theta, softening * softening)
    }

    fn field_recursive(
        &self,
        node_id: NodeId,
        pos: Point3<f64>,
        exclude: Option<usize>,
        theta: f64,
        eps2: f64,
    ) -> FieldSample {
        if node_id.is_empty() {
            return FieldSample::zero();
        }

        let point_field = |index: usize| {
            if exclude == Some(index) {
                FieldSample::zero()
            } else {
                point_mass_field(
                    pos,
                    self.source.position_of(index),
                    self.source.mass_of(index),
                    eps2,
                )
            }
        };

        match &self.nodes[node_id.index()] {
            Node::Leaf { index } => point_field(*index as usize),

            Node::Bucket { start, count } => self.bucket
                [*start as usize..(*start + *count) as usize]
                .iter()
                .map(|&i| point_field(i as usize))
                .fold(FieldSample::zero(), FieldSample::add),

            Node::Internal {
                center_of_mass,
                total_mass,
                bounds,
                children,
            } => {
                // Barnes-Hut criterion: s/d < θ
                let distance = (*center_of_mass - pos).magnitude();

                if !bounds.contains(&pos) && bounds.size() < theta * distance {
                    point_mass_field(pos, *center_of_mass, *total_mass, eps2)
                } else {
                    children
                        .iter()
                        .map(|&child| self.field_recursive(child, pos, exclude, theta, eps2))
                        .fold(FieldSample::zero(), FieldSample::add)
                }
            }
        }
    }

    /// Returns the number of nodes in the tree (for diagnostics)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Softened field of a point mass at `source` evaluated at `at`.
#[inline]
pub(crate) fn point_mass_field(
    at: Point3<f64>,
    source: Point3<f64>,
    mass: f64,
    eps2: f64,
) -> FieldSample {
    let diff = source - at;
    let dist_sq = diff.magnitude_squared() + eps2;
    if dist_sq == 0.0 {
        return FieldSample::zero();
    }
    let dist = dist_sq.sqrt();

    FieldSample {
        // a = G M r / (r² + ε²)^(3/2)
        acceleration: diff * (G_GALACTIC * mass / (dist_sq * dist)),
        potential: -G_GALACTIC * mass / dist,
    }
}
