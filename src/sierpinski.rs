//! Chaos-game generation of a Sierpinski tetrahedron point cloud.
//!
//! Starting from a random corner of a tetrahedron, each step moves the
//! current point halfway toward another randomly chosen corner. The
//! visited points converge onto the Sierpinski tetrahedron.
//!
//! # Example
//!
//! ```ignore
//! use sierp::sierpinski;
//!
//! let points = sierpinski::generate(12, rand::thread_rng())?;
//! assert_eq!(points.len(), 4);
//! ```

use glam::Vec3;
use rand::Rng;

use crate::error::GeneratorError;

/// Corners of the tetrahedron the chaos game interpolates toward.
pub const ANCHORS: [Vec3; 4] = [
    Vec3::new(0.0, 0.5, 0.0),
    Vec3::new(0.5, 0.0, 0.5),
    Vec3::new(-0.5, 0.0, 0.5),
    Vec3::new(0.0, 0.0, -0.5),
];

/// Blend factor used for every chaos-game step.
const MIDPOINT: f32 = 0.5;

/// Largest point set a single draw call can address.
pub const MAX_POINT_COUNT: usize = u32::MAX as usize;

/// Linear interpolation from `from` to `to`.
///
/// `amount` is clamped to `[0, 1]` before use.
#[inline]
pub fn lerp(from: Vec3, to: Vec3, amount: f32) -> Vec3 {
    let amount = amount.clamp(0.0, 1.0);
    from + (to - from) * amount
}

/// Pick one of the four anchors uniformly at random.
#[inline]
pub fn random_anchor<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    ANCHORS[rng.gen_range(0..ANCHORS.len())]
}

/// Endless iterator over chaos-game points.
///
/// Each call to `next` draws an anchor with replacement and yields the
/// midpoint between it and the previously yielded point.
pub struct ChaosGame<R> {
    rng: R,
    last: Vec3,
}

impl<R: Rng> ChaosGame<R> {
    /// Start from a randomly chosen anchor.
    ///
    /// The starting anchor itself is never yielded.
    pub fn new(mut rng: R) -> Self {
        let seed = random_anchor(&mut rng);
        Self::from_point(seed, rng)
    }

    /// Start from an arbitrary point.
    pub fn from_point(start: Vec3, rng: R) -> Self {
        Self { rng, last: start }
    }

    /// The most recently produced point (or the start point).
    pub fn current(&self) -> Vec3 {
        self.last
    }
}

impl<R: Rng> Iterator for ChaosGame<R> {
    type Item = Vec3;

    fn next(&mut self) -> Option<Vec3> {
        let anchor = random_anchor(&mut self.rng);
        self.last = lerp(anchor, self.last, MIDPOINT);
        Some(self.last)
    }
}

/// Immutable, ordered set of generated points.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet {
    points: Vec<Vec3>,
}

impl PointSet {
    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices to draw.
    ///
    /// Generation rejects more than [`MAX_POINT_COUNT`] points, so this
    /// never truncates.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.points.len() as u32
    }

    /// Number of scalar coordinates (three per point).
    #[inline]
    pub fn coordinate_count(&self) -> usize {
        self.points.len() * 3
    }

    /// The points in generation order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Tightly packed `x, y, z` floats, ready for a vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }
}

/// Generate `coordinate_count / 3` chaos-game points.
///
/// `coordinate_count` is the length of the flat `x, y, z` array and must
/// be a positive multiple of 3, describing at most [`MAX_POINT_COUNT`]
/// points.
pub fn generate<R: Rng>(coordinate_count: usize, rng: R) -> Result<PointSet, GeneratorError> {
    if coordinate_count == 0 || coordinate_count % 3 != 0 {
        return Err(GeneratorError::InvalidCoordinateCount(coordinate_count));
    }
    if coordinate_count / 3 > MAX_POINT_COUNT {
        return Err(GeneratorError::TooManyPoints {
            requested: coordinate_count / 3,
            max: MAX_POINT_COUNT,
        });
    }

    let points = ChaosGame::new(rng).take(coordinate_count / 3).collect();
    Ok(PointSet { points })
}

/// Generate `point_count` chaos-game points.
pub fn generate_points<R: Rng>(point_count: usize, rng: R) -> Result<PointSet, GeneratorError> {
    let coordinate_count = point_count
        .checked_mul(3)
        .ok_or(GeneratorError::TooManyPoints {
            requested: point_count,
            max: MAX_POINT_COUNT,
        })?;
    generate(coordinate_count, rng)
}

/// Barycentric weights of `p` relative to [`ANCHORS`].
///
/// All weights are non-negative (within rounding) iff `p` lies inside the
/// tetrahedron.
pub fn barycentric(p: Vec3) -> [f32; 4] {
    let [a, b, c, d] = ANCHORS;
    let basis = glam::Mat3::from_cols(a - d, b - d, c - d);
    let w = basis.inverse() * (p - d);
    [w.x, w.y, w.z, 1.0 - w.x - w.y - w.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_lerp_clamps_amount() {
        let a = Vec3::ZERO;
        let b = Vec3::ONE;
        assert_eq!(lerp(a, b, -3.0), a);
        assert_eq!(lerp(a, b, 7.0), b);
        assert_eq!(lerp(a, b, 0.5), Vec3::splat(0.5));
    }

    #[test]
    fn test_generate_rejects_bad_counts() {
        let rng = StdRng::seed_from_u64(1);
        assert_eq!(
            generate(0, rng.clone()),
            Err(GeneratorError::InvalidCoordinateCount(0))
        );
        assert_eq!(
            generate(2048, rng),
            Err(GeneratorError::InvalidCoordinateCount(2048))
        );
    }

    #[test]
    fn test_generate_points_rejects_overflowing_count() {
        // Three times this count does not fit in a usize.
        let count = usize::MAX / 3 + 1;
        assert_eq!(
            generate_points(count, StdRng::seed_from_u64(1)),
            Err(GeneratorError::TooManyPoints {
                requested: count,
                max: MAX_POINT_COUNT,
            })
        );
    }

    #[test]
    fn test_generate_rejects_more_points_than_u32() {
        if let Some(count) = MAX_POINT_COUNT.checked_add(1) {
            assert!(matches!(
                generate_points(count, StdRng::seed_from_u64(1)),
                Err(GeneratorError::TooManyPoints { .. })
            ));
        }
    }

    #[test]
    fn test_generate_count() {
        let points = generate(2046, StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(points.len(), 682);
        assert_eq!(points.coordinate_count(), 2046);
        assert_eq!(points.vertex_count(), 682);
        assert_eq!(points.as_bytes().len(), 2046 * 4);
    }

    #[test]
    fn test_points_inside_tetrahedron() {
        let points = generate_points(5000, StdRng::seed_from_u64(3)).unwrap();
        for p in points.points() {
            for w in barycentric(*p) {
                assert!(w >= -EPS, "{:?} outside tetrahedron", p);
            }
            assert!((-0.5..=0.5).contains(&p.x));
            assert!((0.0..=0.5).contains(&p.y));
            assert!((-0.5..=0.5).contains(&p.z));
        }
    }

    #[test]
    fn test_anchor_barycentric_is_unit() {
        for (i, anchor) in ANCHORS.iter().enumerate() {
            let w = barycentric(*anchor);
            for (j, wj) in w.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((wj - expected).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_twelve_coordinates_are_dyadic() {
        // Point k has been halved k + 1 times starting from an anchor whose
        // coordinates are multiples of 1/2.
        let points = generate(12, StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(points.len(), 4);

        for (k, p) in points.points().iter().enumerate() {
            let scale = 2f32.powi(k as i32 + 2);
            for c in p.to_array() {
                assert_eq!((c * scale).fract(), 0.0, "point {} = {:?}", k, p);
            }
        }
    }

    #[test]
    fn test_first_point_is_midpoint_of_start() {
        let mut game = ChaosGame::from_point(ANCHORS[0], StdRng::seed_from_u64(5));
        let first = game.next().unwrap();
        let on_edge = ANCHORS.iter().any(|a| first == (*a + ANCHORS[0]) * 0.5);
        assert!(on_edge);
    }

    #[test]
    fn test_contraction() {
        // Two games fed the same anchor sequence halve their separation
        // on every step.
        let start_a = ANCHORS[0];
        let start_b = ANCHORS[3];
        let game_a = ChaosGame::from_point(start_a, StdRng::seed_from_u64(6));
        let game_b = ChaosGame::from_point(start_b, StdRng::seed_from_u64(6));

        let mut expected = start_a.distance(start_b);
        for (a, b) in game_a.zip(game_b).take(10) {
            expected *= 0.5;
            assert!((a.distance(b) - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_consecutive_distance_shrinks_on_average() {
        // Mean step length over many runs falls as the game leaves its
        // starting corner and settles onto the fractal.
        const RUNS: u64 = 20_000;
        const STEPS: usize = 3;

        let longest_edge = ANCHORS
            .iter()
            .flat_map(|a| ANCHORS.iter().map(move |b| a.distance(*b)))
            .fold(0.0f32, f32::max);

        let mut sums = [0.0f64; STEPS];
        for seed in 0..RUNS {
            let mut game = ChaosGame::new(StdRng::seed_from_u64(seed));
            let mut prev = game.current();
            for sum in sums.iter_mut() {
                let Some(p) = game.next() else { break };
                let step = prev.distance(p);
                assert!(step <= longest_edge * 0.5 + EPS);
                assert_eq!(game.current(), p);
                *sum += step as f64;
                prev = p;
            }
        }

        let means = sums.map(|s| s / RUNS as f64);
        for pair in means.windows(2) {
            assert!(pair[1] < pair[0], "mean step lengths {:?}", means);
        }
    }

    #[test]
    fn test_visits_all_octants_of_the_fractal() {
        // Statistically every corner gets points close to it.
        let points = generate_points(4000, StdRng::seed_from_u64(7)).unwrap();
        for anchor in ANCHORS {
            let near = points
                .points()
                .iter()
                .filter(|p| p.distance(anchor) < 0.2)
                .count();
            assert!(near > 40, "anchor {:?} only has {} neighbours", anchor, near);
        }
    }
}
