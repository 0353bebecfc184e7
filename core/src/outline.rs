use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Point;

pub const OUTLINE_VARIANCE: f32 = 0.1;
pub const OUTLINE_VARIANCE_COUNT: usize = 7;
/// Tab depth as a fraction of the base inset.
pub const TAB_DEPTH_RATIO: f32 = 0.9;
const NECK_ALONG: f32 = 0.25;
const KNOB_ALONG: f32 = 0.4;

/// Shape of one interior grid edge.
///
/// A positive `tag` bulges towards +y for horizontal edges and +x for
/// vertical edges, i.e. the tab belongs to the upper (left) piece and the
/// lower (right) piece gets the matching blank.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeOutline {
    pub tag: i8,
    pub variances: [f32; OUTLINE_VARIANCE_COUNT],
}

impl EdgeOutline {
    pub fn new(tag: i8, variances: [f32; OUTLINE_VARIANCE_COUNT]) -> Self {
        Self {
            tag: if tag < 0 { -1 } else { 1 },
            variances,
        }
    }

    pub fn straight_tab() -> Self {
        Self::new(1, [0.0; OUTLINE_VARIANCE_COUNT])
    }
}

pub fn generate_outline<R: Rng + ?Sized>(rng: &mut R) -> EdgeOutline {
    let tag = if rng.random_bool(0.5) { 1 } else { -1 };
    let mut variances = [0.0; OUTLINE_VARIANCE_COUNT];
    for value in &mut variances {
        *value = rng.random_range(-OUTLINE_VARIANCE..=OUTLINE_VARIANCE);
    }
    EdgeOutline { tag, variances }
}

/// Builds fresh outlines for a `count_x` x `count_y` grid.
///
/// Horizontal edges sit between rows (`count_x * (count_y - 1)` of them,
/// indexed `y * count_x + x`); vertical edges sit between columns
/// (`(count_x - 1) * count_y`, indexed `y * (count_x - 1) + x`).
pub fn generate_outlines<R: Rng + ?Sized>(
    count_x: usize,
    count_y: usize,
    rng: &mut R,
) -> (Vec<EdgeOutline>, Vec<EdgeOutline>) {
    let mut horizontal = Vec::with_capacity(horizontal_len(count_x, count_y));
    for _y in 0..count_y.saturating_sub(1) {
        for _x in 0..count_x {
            horizontal.push(generate_outline(rng));
        }
    }
    let mut vertical = Vec::with_capacity(vertical_len(count_x, count_y));
    for _y in 0..count_y {
        for _x in 0..count_x.saturating_sub(1) {
            vertical.push(generate_outline(rng));
        }
    }
    (horizontal, vertical)
}

pub fn horizontal_len(count_x: usize, count_y: usize) -> usize {
    count_x * count_y.saturating_sub(1)
}

pub fn vertical_len(count_x: usize, count_y: usize) -> usize {
    count_x.saturating_sub(1) * count_y
}

/// Control points of the two cubic segments that replace a straight cut.
///
/// Coordinates are in the edge frame of a unit tile: `x` runs along the edge
/// from -0.5 to 0.5, `y` is the offset across it. The first cubic ends at
/// `mid` via `c1`/`c2`, the second leaves `mid` via `c3`/`c4`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCurve {
    pub c1: Point,
    pub c2: Point,
    pub mid: Point,
    pub c3: Point,
    pub c4: Point,
}

impl EdgeCurve {
    pub fn reversed(self) -> EdgeCurve {
        EdgeCurve {
            c1: self.c4,
            c2: self.c3,
            mid: self.mid,
            c3: self.c2,
            c4: self.c1,
        }
    }
}

pub fn edge_curve(outline: &EdgeOutline, base_inset: f32) -> EdgeCurve {
    let v = &outline.variances;
    let depth = outline.tag as f32 * TAB_DEPTH_RATIO * base_inset;
    EdgeCurve {
        c1: Point::new(NECK_ALONG + v[0], v[1]),
        c2: Point::new(-KNOB_ALONG + v[2], depth - v[6]),
        mid: Point::new(0.0, depth),
        c3: Point::new(KNOB_ALONG + v[3], depth + v[6]),
        c4: Point::new(-NECK_ALONG + v[4], v[5]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_valid(outline: &EdgeOutline) {
        assert!(outline.tag == 1 || outline.tag == -1, "tag {}", outline.tag);
        for value in outline.variances {
            assert!(
                (-OUTLINE_VARIANCE..=OUTLINE_VARIANCE).contains(&value),
                "variance {value} out of range"
            );
        }
    }

    #[test]
    fn outline_counts_match_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        for (count_x, count_y) in [(2, 2), (3, 3), (4, 2), (2, 5), (7, 3)] {
            let (horizontal, vertical) = generate_outlines(count_x, count_y, &mut rng);
            assert_eq!(horizontal.len(), (count_y - 1) * count_x);
            assert_eq!(vertical.len(), count_y * (count_x - 1));
            horizontal.iter().chain(vertical.iter()).for_each(assert_valid);
        }
    }

    #[test]
    fn single_row_has_no_horizontal_edges() {
        let mut rng = StdRng::seed_from_u64(1);
        let (horizontal, vertical) = generate_outlines(4, 1, &mut rng);
        assert!(horizontal.is_empty());
        assert_eq!(vertical.len(), 3);
        let (horizontal, vertical) = generate_outlines(1, 1, &mut rng);
        assert!(horizontal.is_empty());
        assert!(vertical.is_empty());
    }

    #[test]
    fn same_seed_reproduces_outlines() {
        let a = generate_outlines(5, 4, &mut StdRng::seed_from_u64(42));
        let b = generate_outlines(5, 4, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        let c = generate_outlines(5, 4, &mut StdRng::seed_from_u64(43));
        assert_ne!(a, c);
    }

    #[test]
    fn both_tags_appear() {
        let mut rng = StdRng::seed_from_u64(3);
        let (horizontal, vertical) = generate_outlines(8, 8, &mut rng);
        let tabs = horizontal
            .iter()
            .chain(vertical.iter())
            .filter(|outline| outline.tag > 0)
            .count();
        assert!(tabs > 0 && tabs < horizontal.len() + vertical.len());
    }

    #[test]
    fn curve_depth_follows_tag() {
        let tab = edge_curve(&EdgeOutline::straight_tab(), 0.3);
        assert!((tab.mid.y - 0.27).abs() < 1e-6);
        let blank = edge_curve(&EdgeOutline::new(-1, [0.0; 7]), 0.3);
        assert!((blank.mid.y + 0.27).abs() < 1e-6);
        let reversed = tab.reversed();
        assert_eq!(reversed.c1, tab.c4);
        assert_eq!(reversed.c4, tab.c1);
        assert_eq!(reversed.reversed(), tab);
    }
}
