use std::collections::VecDeque;

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiny_skia::Pixmap;

use crate::outline::{generate_outlines, horizontal_len, vertical_len};
use crate::raster::bake_square;
use crate::{BoardConfig, BoardError, Direction, EdgeOutline, GridPos, Piece, PieceId, Point};

/// Board state shared by every piece: sizing, outlines and the baked raster.
#[derive(Clone, Debug)]
pub struct BoardLayout {
    count_x: usize,
    count_y: usize,
    width: f32,
    height: f32,
    tile_size: Point,
    link_distance: f32,
    config: BoardConfig,
    horizontal: Vec<Option<EdgeOutline>>,
    vertical: Vec<Option<EdgeOutline>>,
    source: Option<RgbaImage>,
    baked: Option<Pixmap>,
}

impl BoardLayout {
    fn new(count_x: usize, count_y: usize, config: BoardConfig) -> Self {
        Self {
            count_x,
            count_y,
            width: 0.0,
            height: 0.0,
            tile_size: Point::ZERO,
            link_distance: 0.0,
            config,
            horizontal: vec![None; horizontal_len(count_x, count_y)],
            vertical: vec![None; vertical_len(count_x, count_y)],
            source: None,
            baked: None,
        }
    }

    pub fn count_x(&self) -> usize {
        self.count_x
    }

    pub fn count_y(&self) -> usize {
        self.count_y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Side of the square play area.
    pub fn dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn tile_size(&self) -> Point {
        self.tile_size
    }

    pub fn link_distance(&self) -> f32 {
        self.link_distance
    }

    pub fn base_inset(&self) -> f32 {
        self.config.base_inset
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn baked(&self) -> Option<&Pixmap> {
        self.baked.as_ref()
    }

    pub fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    /// Edge between rows `y` and `y + 1` in column `x`.
    pub fn horizontal_outline(&self, x: usize, y: usize) -> Option<&EdgeOutline> {
        if x >= self.count_x || y + 1 >= self.count_y {
            return None;
        }
        self.horizontal.get(y * self.count_x + x)?.as_ref()
    }

    /// Edge between columns `x` and `x + 1` in row `y`.
    pub fn vertical_outline(&self, x: usize, y: usize) -> Option<&EdgeOutline> {
        if x + 1 >= self.count_x || y >= self.count_y {
            return None;
        }
        self.vertical.get(y * (self.count_x - 1) + x)?.as_ref()
    }

    /// Center of a cell when the puzzle is solved, with the grid centered in
    /// the board area.
    pub fn correct_position(&self, tile: GridPos) -> Point {
        let tile_size = self.tile_size;
        Point::new(
            (tile.x as f32 + 0.5) * tile_size.x
                + 0.5 * (self.width - self.count_x as f32 * tile_size.x),
            (tile.y as f32 + 0.5) * tile_size.y
                + 0.5 * (self.height - self.count_y as f32 * tile_size.y),
        )
    }

    fn bake(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let dimension = self.dimension().round().max(0.0) as u32;
        self.baked = bake_square(source, dimension);
        match &self.baked {
            Some(_) => log::debug!(
                "baked {}x{} source into {dimension}px square",
                source.width(),
                source.height()
            ),
            None => log::warn!("could not bake source into {dimension}px square"),
        }
    }
}

/// One puzzle instance.
///
/// Pieces are stored by id (`y * count_x + x`); `order` is the z-order, the
/// last entry being drawn on top and hit first.
#[derive(Clone, Debug)]
pub struct Board {
    layout: BoardLayout,
    pieces: Vec<Piece>,
    order: Vec<PieceId>,
    rng: StdRng,
}

impl Board {
    pub fn new(count_x: usize, count_y: usize) -> Result<Self, BoardError> {
        Self::with_rng(count_x, count_y, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_rng(count_x: usize, count_y: usize, rng: StdRng) -> Result<Self, BoardError> {
        Self::with_config(count_x, count_y, BoardConfig::default(), rng)
    }

    pub fn with_config(
        count_x: usize,
        count_y: usize,
        config: BoardConfig,
        rng: StdRng,
    ) -> Result<Self, BoardError> {
        if count_x == 0 || count_y == 0 {
            return Err(BoardError::InvalidGrid { count_x, count_y });
        }
        config.validate()?;
        Ok(Self {
            layout: BoardLayout::new(count_x, count_y, config),
            pieces: Vec::new(),
            order: Vec::new(),
            rng,
        })
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn count_x(&self) -> usize {
        self.layout.count_x
    }

    pub fn count_y(&self) -> usize {
        self.layout.count_y
    }

    pub fn tile_size(&self) -> Point {
        self.layout.tile_size
    }

    pub fn link_distance(&self) -> f32 {
        self.layout.link_distance
    }

    pub fn base_inset(&self) -> f32 {
        self.layout.base_inset()
    }

    pub fn horizontal_outline(&self, x: usize, y: usize) -> Option<&EdgeOutline> {
        self.layout.horizontal_outline(x, y)
    }

    pub fn vertical_outline(&self, x: usize, y: usize) -> Option<&EdgeOutline> {
        self.layout.vertical_outline(x, y)
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> Result<(), BoardError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(BoardError::InvalidSize { width, height });
        }
        let layout = &mut self.layout;
        let previous = layout.dimension().round();
        layout.width = width;
        layout.height = height;
        let dimension = layout.dimension();
        layout.tile_size = Point::new(
            dimension / layout.count_x as f32,
            dimension / layout.count_y as f32,
        );
        layout.link_distance =
            layout.config.link_distance_ratio * (layout.tile_size.x + layout.tile_size.y);
        log::debug!(
            "board sized to {width}x{height}, tile {}x{}",
            layout.tile_size.x,
            layout.tile_size.y
        );

        if self.pieces.is_empty() {
            self.create_pieces();
        }
        if self.layout.baked.is_none() || previous != dimension.round() {
            self.layout.bake();
        }
        self.invalidate_all();
        Ok(())
    }

    /// Keeps the source and bakes it at the current size. Without a size yet
    /// the bake waits for the first `set_size`.
    pub fn set_image(&mut self, source: &RgbaImage) -> Result<(), BoardError> {
        if source.width() == 0 || source.height() == 0 {
            return Err(BoardError::EmptyImage);
        }
        self.layout.source = Some(source.clone());
        self.layout.baked = None;
        if !self.pieces.is_empty() {
            self.layout.bake();
        }
        self.invalidate_all();
        Ok(())
    }

    /// Replaces the outlines, e.g. to replay a known puzzle.
    pub fn set_outlines(
        &mut self,
        horizontal: Vec<EdgeOutline>,
        vertical: Vec<EdgeOutline>,
    ) -> Result<(), BoardError> {
        let (count_x, count_y) = (self.count_x(), self.count_y());
        check_outline_count("horizontal", horizontal_len(count_x, count_y), horizontal.len())?;
        check_outline_count("vertical", vertical_len(count_x, count_y), vertical.len())?;
        self.layout.horizontal = horizontal.into_iter().map(Some).collect();
        self.layout.vertical = vertical.into_iter().map(Some).collect();
        self.invalidate_all();
        Ok(())
    }

    fn create_pieces(&mut self) {
        let (count_x, count_y) = (self.count_x(), self.count_y());
        self.pieces = Vec::with_capacity(count_x * count_y);
        for y in 0..count_y {
            for x in 0..count_x {
                let tile = GridPos::new(x, y);
                let id = self.pieces.len();
                self.pieces
                    .push(Piece::new(id, tile, self.layout.correct_position(tile)));
            }
        }
        self.order = (0..self.pieces.len()).collect();
        log::debug!("created {} pieces", self.pieces.len());
    }

    fn invalidate_all(&mut self) {
        for piece in &mut self.pieces {
            piece.invalidate();
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub fn piece_id_at_tile(&self, x: usize, y: usize) -> Option<PieceId> {
        if x >= self.count_x() || y >= self.count_y() || self.pieces.is_empty() {
            return None;
        }
        Some(y * self.count_x() + x)
    }

    pub fn z_order(&self) -> &[PieceId] {
        &self.order
    }

    pub fn correct_position(&self, id: PieceId) -> Option<Point> {
        self.piece(id)
            .map(|piece| self.layout.correct_position(piece.tile()))
    }

    /// Topmost piece whose silhouette covers `point`. Stale caches are
    /// re-rendered first so the pick matches what would be drawn.
    pub fn piece_at(&mut self, point: Point) -> Option<PieceId> {
        for &id in self.order.iter().rev() {
            let piece = &mut self.pieces[id];
            piece.refresh(&self.layout);
            if piece.hit_test(point, &self.layout) {
                return Some(id);
            }
        }
        None
    }

    pub fn bring_to_front(&mut self, id: PieceId) {
        let Some(index) = self.order.iter().position(|&entry| entry == id) else {
            return;
        };
        if index + 1 < self.order.len() {
            self.order.remove(index);
            self.order.push(id);
        }
    }

    /// Connected component of `id` over linked edges, seed first.
    pub fn linked_group(&self, id: PieceId) -> Vec<PieceId> {
        let total = self.pieces.len();
        if id >= total {
            return Vec::new();
        }
        let (count_x, count_y) = (self.count_x(), self.count_y());
        let mut visited = vec![false; total];
        let mut queue = VecDeque::new();
        let mut group = Vec::new();
        visited[id] = true;
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            group.push(current);
            let piece = &self.pieces[current];
            for dir in Direction::ALL {
                if !piece.is_linked(dir) {
                    continue;
                }
                let Some(tile) = piece.tile().neighbor(dir, count_x, count_y) else {
                    continue;
                };
                let neighbor = tile.y * count_x + tile.x;
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        group
    }

    /// Tries to snap `other` (with its whole group) onto `this`.
    ///
    /// Both pieces must share an orientation, sit within the link distance
    /// of grid adjacency on screen and be grid neighbors across an edge that
    /// is not linked yet.
    pub fn link_tile(&mut self, this: PieceId, other: PieceId) -> bool {
        if this == other || this >= self.pieces.len() || other >= self.pieces.len() {
            return false;
        }
        let a = &self.pieces[this];
        let b = &self.pieces[other];
        let orientation = a.orientation();
        if orientation != b.orientation() {
            return false;
        }
        let tile_size = self.layout.tile_size;
        let link_distance = self.layout.link_distance;
        let delta = b.position() - a.position();

        for screen in Direction::ALL {
            let dir = Direction::from_screen(screen, orientation);
            let (dx, dy) = dir.grid_offset();
            let expected = Point::new(dx as f32 * tile_size.x, dy as f32 * tile_size.y)
                .rotate_quarter_turns(orientation);
            if (delta.x - expected.x).abs() >= link_distance
                || (delta.y - expected.y).abs() >= link_distance
            {
                continue;
            }
            if a.is_linked(dir) || !a.tile().is_neighbor(b.tile(), dir) {
                continue;
            }

            let offset = a.position() + expected - b.position();
            let group = self.linked_group(other);
            if group.contains(&this) {
                log::trace!("piece {other} already rigid with {this}, closing cycle");
            } else {
                for &id in &group {
                    self.pieces[id].move_by(offset);
                }
            }
            self.pieces[this].set_linked(dir, true);
            self.pieces[other].set_linked(dir.opposite(), true);
            for &id in &group {
                self.bring_to_front(id);
            }
            log::debug!(
                "linked piece {other} to {this} on {dir:?}, moved {} pieces",
                group.len()
            );
            return true;
        }
        false
    }

    /// Links `id` against every other piece until a full sweep makes no new
    /// link. Returns the number of links made.
    pub fn check_link(&mut self, id: PieceId) -> usize {
        let mut made = 0;
        loop {
            let mut progress = false;
            let sweep = self.order.clone();
            for other in sweep {
                if other != id && self.link_tile(id, other) {
                    made += 1;
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }
        made
    }

    pub fn is_complete(&self) -> bool {
        match self.order.first() {
            Some(&first) => self.linked_group(first).len() == self.pieces.len(),
            None => false,
        }
    }

    /// Number of linked edges, each shared edge counted once.
    pub fn linked_edge_count(&self) -> usize {
        let flags: usize = self
            .pieces
            .iter()
            .map(|piece| piece.linked().iter().filter(|&&linked| linked).count())
            .sum();
        flags / 2
    }

    pub fn shuffle(&mut self, allow_rotation: bool) {
        let (count_x, count_y) = (self.count_x(), self.count_y());
        let (horizontal, vertical) = generate_outlines(count_x, count_y, &mut self.rng);
        self.layout.horizontal = horizontal.into_iter().map(Some).collect();
        self.layout.vertical = vertical.into_iter().map(Some).collect();

        let len = self.order.len();
        if len > 1 {
            for _ in 0..self.layout.config.shuffle_swaps {
                let a = self.rng.random_range(0..len);
                let b = self.rng.random_range(0..len);
                self.order.swap(a, b);
            }
        }

        for index in 0..self.pieces.len() {
            let target = if allow_rotation {
                self.rng.random_range(0..4u8)
            } else {
                0
            };
            let staging = self.staging_position();
            let correct = self.layout.correct_position(self.pieces[index].tile());
            let piece = &mut self.pieces[index];
            while piece.orientation() != target {
                piece.rotate();
            }
            piece.clear_links();
            piece.set_position(correct);
            piece.set_shuffle_position(staging);
        }
        log::debug!(
            "shuffled {count_x}x{count_y} board (rotation {})",
            if allow_rotation { "on" } else { "off" }
        );
    }

    /// Random scatter spot that keeps clear of the preview strip at the
    /// start of the longer axis.
    fn staging_position(&mut self) -> Point {
        let BoardLayout {
            width,
            height,
            tile_size: tile,
            ..
        } = self.layout;
        let strip = self.layout.config.preview_strip_ratio;
        let u: f32 = self.rng.random();
        let v: f32 = self.rng.random();
        if width > height {
            Point::new(
                0.5 * tile.x + strip * height + tile.y + u * (width - strip * height - tile.x),
                0.5 * tile.y + v * (height - tile.y),
            )
        } else {
            Point::new(
                0.5 * tile.x + u * (width - tile.x),
                0.5 * tile.y + strip * width + tile.x + v * (height - strip * width - tile.y),
            )
        }
    }

    /// Moves one piece; the caller decides whether to move its group.
    pub fn move_piece(&mut self, id: PieceId, delta: Point) {
        if let Some(piece) = self.pieces.get_mut(id) {
            piece.move_by(delta);
        }
    }

    pub fn move_group(&mut self, id: PieceId, delta: Point) {
        for member in self.linked_group(id) {
            self.pieces[member].move_by(delta);
        }
    }

    pub fn rotate_piece(&mut self, id: PieceId) {
        if let Some(piece) = self.pieces.get_mut(id) {
            piece.rotate();
        }
    }

    pub fn advance_shuffle(&mut self, ratio: f32) {
        let ratio = ratio.clamp(0.0, 1.0);
        for piece in &mut self.pieces {
            piece.advance_shuffle(ratio);
        }
    }

    /// Pulls the centroid of all pieces towards `target`, skipping the step
    /// once both axes are within the gather epsilon.
    pub fn advance_completion_gather(&mut self, target: Point, dt: f32) {
        if self.pieces.is_empty() {
            return;
        }
        let sum = self
            .pieces
            .iter()
            .fold(Point::ZERO, |acc, piece| acc + piece.position());
        let centroid = sum * (1.0 / self.pieces.len() as f32);
        let step = (target - centroid) * dt;
        let epsilon = self.layout.config.gather_epsilon;
        if step.x.abs() > epsilon || step.y.abs() > epsilon {
            for piece in &mut self.pieces {
                piece.move_by(step);
            }
        }
    }

    pub fn draw_all(&mut self, surface: &mut Pixmap, outline_alpha: f32) {
        for &id in &self.order {
            self.pieces[id].draw_to_surface(surface, &self.layout, outline_alpha);
        }
    }
}

fn check_outline_count(axis: &'static str, expected: usize, found: usize) -> Result<(), BoardError> {
    if expected != found {
        return Err(BoardError::OutlineCount {
            axis,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(count_x: usize, count_y: usize) -> Board {
        let mut board =
            Board::with_rng(count_x, count_y, StdRng::seed_from_u64(11)).expect("board");
        board.set_size(300.0, 300.0).expect("size");
        board
    }

    #[test]
    fn rejects_empty_grid() {
        assert_eq!(
            Board::new(0, 3).err(),
            Some(BoardError::InvalidGrid {
                count_x: 0,
                count_y: 3
            })
        );
    }

    #[test]
    fn rejects_bad_size() {
        let mut board = Board::with_rng(2, 2, StdRng::seed_from_u64(1)).expect("board");
        assert!(matches!(
            board.set_size(0.0, 100.0),
            Err(BoardError::InvalidSize { .. })
        ));
        assert!(matches!(
            board.set_size(f32::NAN, 100.0),
            Err(BoardError::InvalidSize { .. })
        ));
        assert!(board.pieces().is_empty());
        assert!(!board.is_complete());
    }

    #[test]
    fn sizing_derives_tile_and_link_distance() {
        let mut board = Board::with_rng(4, 2, StdRng::seed_from_u64(1)).expect("board");
        board.set_size(400.0, 200.0).expect("size");
        assert_eq!(board.tile_size(), Point::new(50.0, 100.0));
        assert!((board.link_distance() - 22.5).abs() < 1e-4);
        assert_eq!(board.pieces().len(), 8);
        // The square play area is centered horizontally.
        assert_eq!(board.correct_position(0), Some(Point::new(125.0, 50.0)));
    }

    #[test]
    fn pieces_are_created_once() {
        let mut board = board(2, 2);
        board.move_piece(0, Point::new(7.0, 7.0));
        let moved = board.piece(0).map(Piece::position);
        board.set_size(500.0, 500.0).expect("resize");
        assert_eq!(board.pieces().len(), 4);
        assert_eq!(board.piece(0).map(Piece::position), moved);
    }

    #[test]
    fn outlines_are_empty_until_shuffle() {
        let mut board = board(3, 3);
        assert!(board.horizontal_outline(0, 0).is_none());
        board.shuffle(false);
        assert!(board.horizontal_outline(0, 0).is_some());
        assert!(board.horizontal_outline(0, 2).is_none());
        assert!(board.vertical_outline(2, 0).is_none());
        assert!(board.vertical_outline(1, 2).is_some());
    }

    #[test]
    fn set_outlines_checks_lengths() {
        let mut board = board(3, 2);
        let outline = EdgeOutline::straight_tab();
        assert_eq!(
            board.set_outlines(vec![outline; 2], vec![outline; 4]),
            Err(BoardError::OutlineCount {
                axis: "horizontal",
                expected: 3,
                found: 2
            })
        );
        assert!(board.set_outlines(vec![outline; 3], vec![outline; 4]).is_ok());
        assert_eq!(board.vertical_outline(1, 1), Some(&outline));
    }

    #[test]
    fn bring_to_front_moves_to_end() {
        let mut board = board(2, 2);
        board.bring_to_front(1);
        assert_eq!(board.z_order(), &[0, 2, 3, 1]);
        board.bring_to_front(1);
        assert_eq!(board.z_order(), &[0, 2, 3, 1]);
        board.bring_to_front(42);
        assert_eq!(board.z_order(), &[0, 2, 3, 1]);
    }

    #[test]
    fn lone_piece_is_its_own_group() {
        let board = board(3, 3);
        assert_eq!(board.linked_group(4), vec![4]);
        assert!(board.linked_group(9).is_empty());
    }

    #[test]
    fn gather_moves_centroid_towards_target() {
        let mut board = board(2, 2);
        let before = board.piece(0).map(Piece::position).expect("piece");
        board.advance_completion_gather(Point::new(250.0, 150.0), 0.5);
        let after = board.piece(0).map(Piece::position).expect("piece");
        assert_eq!(after - before, Point::new(50.0, 0.0));
        assert_eq!(board.piece(0).map(Piece::shuffle_position), Some(after));
        // Within epsilon nothing moves.
        board.advance_completion_gather(Point::new(200.1, 150.0), 0.5);
        assert_eq!(board.piece(0).map(Piece::position), Some(after));
    }

    #[test]
    fn shuffle_without_rotation_resets_orientation() {
        let mut board = board(3, 3);
        board.rotate_piece(2);
        board.shuffle(false);
        assert!(board.pieces().iter().all(|piece| piece.orientation() == 0));
        let mut order = board.z_order().to_vec();
        order.sort_unstable();
        assert_eq!(order, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn staging_avoids_preview_strip() {
        let mut board = Board::with_rng(4, 4, StdRng::seed_from_u64(5)).expect("board");
        board.set_size(800.0, 400.0).expect("size");
        board.shuffle(true);
        let tile = board.tile_size();
        for piece in board.pieces() {
            let staging = piece.shuffle_position();
            assert!(staging.x >= 0.5 * tile.x + 0.1 * 400.0 + tile.y);
            assert!(staging.y >= 0.5 * tile.y && staging.y <= 400.0 - 0.5 * tile.y);
        }
    }
}
