use crate::geometry::PointF;

/// Page boundary in image pixels, corners ordered top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [PointF; 4],
}

impl Quad {
    pub const fn new(corners: [PointF; 4]) -> Self {
        Self { corners }
    }

    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new([
            PointF::new(x, y),
            PointF::new(x + width, y),
            PointF::new(x + width, y + height),
            PointF::new(x, y + height),
        ])
    }

    /// Shoelace area.
    pub fn area(&self) -> f64 {
        let twice: f64 = (0..4)
            .map(|i| {
                let a = self.corners[i];
                let b = self.corners[(i + 1) % 4];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    /// `(min_x, min_y, max_x, max_y)`
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        self.corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), corner| {
                (
                    min_x.min(corner.x),
                    min_y.min(corner.y),
                    max_x.max(corner.x),
                    max_y.max(corner.y),
                )
            },
        )
    }

    /// True when every corner lies within `tolerance` of the matching corner
    /// of the bounding box.
    pub fn is_axis_aligned(&self, tolerance: f64) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounding_box();
        let rect = Quad::from_rect(min_x, min_y, max_x - min_x, max_y - min_y);
        self.max_corner_distance(&rect) <= tolerance
    }

    pub fn max_corner_distance(&self, other: &Quad) -> f64 {
        self.corners
            .iter()
            .zip(other.corners.iter())
            .map(|(a, b)| a.distance_to(*b))
            .fold(0.0, f64::max)
    }

    pub fn edges(&self) -> [(PointF, PointF); 4] {
        let [a, b, c, d] = self.corners;
        [(a, b), (b, c), (c, d), (d, a)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageHypothesis {
    pub quad: Quad,
    pub score: f64,
}

impl PageHypothesis {
    pub const fn new(quad: Quad, score: f64) -> Self {
        Self { quad, score }
    }
}

/// Keeps one hypothesis per group of quads linked by corners lying within
/// `tolerance` of each other: the highest score, the earliest on ties.
/// Groups are the connected components over every pair, so membership does
/// not depend on input order. Output keeps the order in which each group was
/// first seen.
pub fn deduplicate_hypotheses(
    hypotheses: Vec<PageHypothesis>,
    tolerance: f64,
) -> Vec<PageHypothesis> {
    let mut group: Vec<usize> = (0..hypotheses.len()).collect();
    for i in 0..hypotheses.len() {
        for j in (i + 1)..hypotheses.len() {
            if hypotheses[i].quad.max_corner_distance(&hypotheses[j].quad) <= tolerance {
                let (a, b) = (find_root(&mut group, i), find_root(&mut group, j));
                group[a.max(b)] = a.min(b);
            }
        }
    }

    let mut best: Vec<Option<usize>> = vec![None; hypotheses.len()];
    for index in 0..hypotheses.len() {
        let root = find_root(&mut group, index);
        match best[root] {
            Some(current) if hypotheses[index].score <= hypotheses[current].score => {}
            _ => best[root] = Some(index),
        }
    }
    best.into_iter().flatten().map(|index| hypotheses[index]).collect()
}

fn find_root(group: &mut [usize], mut index: usize) -> usize {
    while group[index] != index {
        group[index] = group[group[index]];
        index = group[index];
    }
    index
}
