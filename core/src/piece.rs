use tiny_skia::{
    FillRule, FilterQuality, LineCap, Paint, Path, PathBuilder, Pattern, Pixmap, PixmapPaint,
    SpreadMode, Stroke, Transform,
};

use crate::board::BoardLayout;
use crate::outline::{EdgeCurve, edge_curve};
use crate::{Direction, EdgeOutline, GridPos, Point};

pub type PieceId = usize;

/// One grid cell of the puzzle.
///
/// Geometry is expressed in a normalized local frame: the unrotated cell
/// spans -0.5..0.5 on both axes around the piece center, scaled by the tile
/// size and turned by `orientation` quarter turns on the way to the screen.
#[derive(Clone, Debug)]
pub struct Piece {
    id: PieceId,
    tile: GridPos,
    position: Point,
    shuffle_position: Point,
    orientation: u8,
    linked: [bool; 4],
    cache: Option<Pixmap>,
    dirty: bool,
}

impl Piece {
    pub(crate) fn new(id: PieceId, tile: GridPos, position: Point) -> Self {
        Self {
            id,
            tile,
            position,
            shuffle_position: position,
            orientation: 0,
            linked: [false; 4],
            cache: None,
            dirty: true,
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn tile(&self) -> GridPos {
        self.tile
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn shuffle_position(&self) -> Point {
        self.shuffle_position
    }

    pub fn orientation(&self) -> u8 {
        self.orientation
    }

    pub fn linked(&self) -> [bool; 4] {
        self.linked
    }

    pub fn is_linked(&self, dir: Direction) -> bool {
        self.linked[dir.index()]
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cache(&self) -> Option<&Pixmap> {
        self.cache.as_ref()
    }

    /// Moves the piece and makes its current spot the intro target.
    pub fn move_by(&mut self, delta: Point) {
        self.position += delta;
        self.shuffle_position = self.position;
    }

    /// Quarter turn clockwise.
    pub fn rotate(&mut self) {
        self.orientation = (self.orientation + 1) % 4;
        self.dirty = true;
    }

    pub fn advance_shuffle(&mut self, ratio: f32) {
        self.position += (self.shuffle_position - self.position) * ratio;
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_shuffle_position(&mut self, position: Point) {
        self.shuffle_position = position;
    }

    pub(crate) fn set_linked(&mut self, dir: Direction, value: bool) {
        if self.linked[dir.index()] != value {
            self.linked[dir.index()] = value;
            self.dirty = true;
        }
    }

    pub(crate) fn clear_links(&mut self) {
        self.linked = [false; 4];
        self.dirty = true;
    }

    pub(crate) fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Outline shared with the neighbor in `dir`; `None` on the grid border.
    pub fn outline(&self, dir: Direction, layout: &BoardLayout) -> Option<EdgeOutline> {
        let GridPos { x, y } = self.tile;
        let outline = match dir {
            Direction::North => layout.horizontal_outline(x, y.checked_sub(1)?),
            Direction::East => layout.vertical_outline(x, y),
            Direction::South => layout.horizontal_outline(x, y),
            Direction::West => layout.vertical_outline(x.checked_sub(1)?, y),
        };
        outline.copied()
    }

    fn edge_shape(&self, dir: Direction, layout: &BoardLayout) -> Option<EdgeCurve> {
        if self.is_linked(dir) {
            return None;
        }
        let outline = self.outline(dir, layout)?;
        let curve = edge_curve(&outline, layout.base_inset());
        match dir {
            Direction::North | Direction::East => Some(curve),
            Direction::South | Direction::West => Some(curve.reversed()),
        }
    }

    /// Tile extents on screen after rotation.
    pub fn screen_extent(&self, layout: &BoardLayout) -> Point {
        let tile = layout.tile_size();
        if self.orientation % 2 == 1 {
            Point::new(tile.y, tile.x)
        } else {
            tile
        }
    }

    pub fn cache_size(&self, layout: &BoardLayout) -> (u32, u32) {
        let extent = self.screen_extent(layout) * (1.0 + 2.0 * layout.base_inset());
        (extent.x.ceil().max(0.0) as u32, extent.y.ceil().max(0.0) as u32)
    }

    fn local_to_screen(&self, layout: &BoardLayout, center: Point) -> Transform {
        let tile = layout.tile_size();
        Transform::from_scale(tile.x, tile.y)
            .post_rotate(90.0 * self.orientation as f32)
            .post_translate(center.x, center.y)
    }

    /// Closed silhouette of the piece in the local frame. Linked and border
    /// edges are straight cuts; corners are pushed out by one pixel so
    /// neighboring pieces overlap instead of leaving a seam.
    pub fn build_outline_path(&self, layout: &BoardLayout) -> Option<Path> {
        let oversize = oversize(layout);
        let mut pb = PathBuilder::new();
        let (start, _) = edge_corners(Direction::North, oversize);
        pb.move_to(start.x, start.y);
        for dir in Direction::ALL {
            let (_, end) = edge_corners(dir, oversize);
            append_edge(&mut pb, dir, self.edge_shape(dir, layout), end);
        }
        pb.close();
        pb.finish()
    }

    pub fn build_edge_path(&self, dir: Direction, layout: &BoardLayout) -> Option<Path> {
        let (start, end) = edge_corners(dir, oversize(layout));
        let mut pb = PathBuilder::new();
        pb.move_to(start.x, start.y);
        append_edge(&mut pb, dir, self.edge_shape(dir, layout), end);
        pb.finish()
    }

    /// Clips the board raster to the silhouette. The sampled area reaches
    /// `base_inset` into the neighboring cells so tabs carry their image.
    pub fn render_cache(&mut self, layout: &BoardLayout) {
        let Some(baked) = layout.baked() else {
            self.cache = None;
            return;
        };
        let (width, height) = self.cache_size(layout);
        let Some(mut pixmap) = Pixmap::new(width, height) else {
            log::warn!("piece {} has an empty raster ({width}x{height})", self.id);
            self.cache = None;
            self.dirty = false;
            return;
        };
        let Some(path) = self.build_outline_path(layout) else {
            log::warn!("piece {} produced a degenerate outline", self.id);
            self.cache = None;
            self.dirty = false;
            return;
        };
        let tile = layout.tile_size();
        let image_to_local = Transform::from_scale(1.0 / tile.x, 1.0 / tile.y).post_translate(
            -(self.tile.x as f32 + 0.5),
            -(self.tile.y as f32 + 0.5),
        );
        let paint = Paint {
            shader: Pattern::new(
                baked.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                1.0,
                image_to_local,
            ),
            anti_alias: true,
            ..Paint::default()
        };
        let center = Point::new(width as f32 * 0.5, height as f32 * 0.5);
        pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            self.local_to_screen(layout, center),
            None,
        );
        self.cache = Some(pixmap);
        self.dirty = false;
    }

    pub fn refresh(&mut self, layout: &BoardLayout) {
        if self.dirty {
            self.render_cache(layout);
        }
    }

    fn cache_origin(&self, cache: &Pixmap) -> Point {
        self.position - Point::new(cache.width() as f32 * 0.5, cache.height() as f32 * 0.5)
    }

    pub fn draw_to_surface(&mut self, surface: &mut Pixmap, layout: &BoardLayout, outline_alpha: f32) {
        self.refresh(layout);
        if let Some(cache) = &self.cache {
            let origin = self.cache_origin(cache);
            surface.draw_pixmap(
                0,
                0,
                cache.as_ref(),
                &PixmapPaint::default(),
                Transform::from_translate(origin.x, origin.y),
                None,
            );
        }
        self.draw_contour(surface, layout, outline_alpha);
    }

    fn draw_contour(&self, surface: &mut Pixmap, layout: &BoardLayout, outline_alpha: f32) {
        let alpha = outline_alpha.clamp(0.0, 1.0);
        let config = layout.config();
        if alpha <= 0.0 || config.contour_width <= 0.0 {
            return;
        }
        let gray = config.contour_gray;
        let mut paint = Paint::default();
        paint.set_color_rgba8(gray, gray, gray, (alpha * 255.0).round() as u8);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: config.contour_width * oversize(layout),
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        let transform = self.local_to_screen(layout, self.position);
        for dir in Direction::ALL {
            if self.is_linked(dir) {
                continue;
            }
            if let Some(path) = self.build_edge_path(dir, layout) {
                surface.stroke_path(&path, &paint, &stroke, transform, None);
            }
        }
    }

    /// Pixel-accurate pick: inside the raster footprint and over an opaque
    /// enough pixel of the cached silhouette.
    pub fn hit_test(&self, point: Point, layout: &BoardLayout) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        let local = point - self.cache_origin(cache);
        if local.x < 0.0
            || local.y < 0.0
            || local.x >= cache.width() as f32
            || local.y >= cache.height() as f32
        {
            return false;
        }
        cache
            .pixel(local.x as u32, local.y as u32)
            .is_some_and(|color| color.alpha() > layout.config().hit_alpha_threshold)
    }
}

fn oversize(layout: &BoardLayout) -> f32 {
    let tile = layout.tile_size();
    let largest = tile.x.max(tile.y);
    if largest > 0.0 { 1.0 / largest } else { 0.0 }
}

fn edge_corners(dir: Direction, oversize: f32) -> (Point, Point) {
    let h = 0.5 + oversize;
    let nw = Point::new(-h, -h);
    let ne = Point::new(h, -h);
    let se = Point::new(h, h);
    let sw = Point::new(-h, h);
    match dir {
        Direction::North => (nw, ne),
        Direction::East => (ne, se),
        Direction::South => (se, sw),
        Direction::West => (sw, nw),
    }
}

/// Places an edge-frame point on the side of the unit cell facing `dir`.
fn edge_point(dir: Direction, p: Point) -> Point {
    match dir {
        Direction::North => Point::new(p.x, -0.5 + p.y),
        Direction::East => Point::new(0.5 + p.y, p.x),
        Direction::South => Point::new(p.x, 0.5 + p.y),
        Direction::West => Point::new(-0.5 + p.y, p.x),
    }
}

fn append_edge(pb: &mut PathBuilder, dir: Direction, curve: Option<EdgeCurve>, end: Point) {
    let Some(curve) = curve else {
        pb.line_to(end.x, end.y);
        return;
    };
    let c1 = edge_point(dir, curve.c1);
    let c2 = edge_point(dir, curve.c2);
    let mid = edge_point(dir, curve.mid);
    let c3 = edge_point(dir, curve.c3);
    let c4 = edge_point(dir, curve.c4);
    pb.cubic_to(c1.x, c1.y, c2.x, c2.y, mid.x, mid.y);
    pb.cubic_to(c3.x, c3.y, c4.x, c4.y, end.x, end.y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_cycles_and_keeps_state() {
        let mut piece = Piece::new(0, GridPos::new(1, 1), Point::new(10.0, 20.0));
        piece.set_linked(Direction::East, true);
        for expected in [1, 2, 3, 0] {
            piece.rotate();
            assert_eq!(piece.orientation(), expected);
        }
        assert_eq!(piece.position(), Point::new(10.0, 20.0));
        assert_eq!(piece.linked(), [false, true, false, false]);
    }

    #[test]
    fn move_syncs_intro_target() {
        let mut piece = Piece::new(0, GridPos::new(0, 0), Point::new(0.0, 0.0));
        piece.set_shuffle_position(Point::new(100.0, 100.0));
        piece.move_by(Point::new(5.0, -3.0));
        assert_eq!(piece.position(), Point::new(5.0, -3.0));
        assert_eq!(piece.shuffle_position(), Point::new(5.0, -3.0));
    }

    #[test]
    fn advance_shuffle_interpolates() {
        let mut piece = Piece::new(0, GridPos::new(0, 0), Point::new(0.0, 0.0));
        piece.set_shuffle_position(Point::new(100.0, 40.0));
        piece.advance_shuffle(0.25);
        assert_eq!(piece.position(), Point::new(25.0, 10.0));
        piece.advance_shuffle(1.0);
        assert_eq!(piece.position(), Point::new(100.0, 40.0));
    }

    #[test]
    fn corners_chain_around_the_cell() {
        for (index, dir) in Direction::ALL.into_iter().enumerate() {
            let (_, end) = edge_corners(dir, 0.01);
            let (next_start, _) = edge_corners(Direction::ALL[(index + 1) % 4], 0.01);
            assert_eq!(end, next_start);
        }
    }

    #[test]
    fn shared_edges_trace_the_same_points() {
        // The upper piece draws a horizontal edge as South (reversed), the
        // lower one as North; both must land on the same curve points once
        // shifted by one tile.
        let curve = edge_curve(&EdgeOutline::new(1, [0.05; 7]), 0.3);
        let south = edge_point(Direction::South, curve.reversed().c1);
        let north = edge_point(Direction::North, curve.c4);
        assert!((south.x - north.x).abs() < 1e-6);
        assert!((south.y - 1.0 - north.y).abs() < 1e-6);
        let east = edge_point(Direction::East, curve.mid);
        let west = edge_point(Direction::West, curve.reversed().mid);
        assert!((east.x - 1.0 - west.x).abs() < 1e-6);
        assert!((east.y - west.y).abs() < 1e-6);
    }
}
