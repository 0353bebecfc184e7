use super::*;

const DRAG_STEPS: usize = 8;
/// Release point stays well inside the link distance.
const RELEASE_JITTER_RATIO: f32 = 0.25;

#[derive(Debug, Default)]
pub(super) struct SolveReport {
    pub(super) taps: usize,
    pub(super) drags: usize,
    pub(super) links: usize,
    pub(super) complete: bool,
}

/// Plays the puzzle like a user would: taps every piece upright, then drags
/// the lowest piece outside the home group next to its solved neighbor and
/// releases it.
///
/// Pieces are visited in grid order, so the dragged piece always has a
/// neighbor in the home group.
pub(super) fn solve(board: &mut Board, rng: &mut StdRng, jitter_px: f32) -> SolveReport {
    let mut report = SolveReport::default();
    let count = board.pieces().len();
    for id in 0..count {
        let Some(piece) = board.piece(id) else {
            continue;
        };
        for _ in 0..(4 - piece.orientation()) % 4 {
            board.rotate_piece(id);
            report.taps += 1;
        }
    }

    let home = 0;
    let max_drags = count * 2;
    while !board.is_complete() && report.drags < max_drags {
        let group = board.linked_group(home);
        let Some(next) = (0..count).find(|id| !group.contains(id)) else {
            break;
        };
        report.links += drag_to_slot(board, home, next, rng, jitter_px);
        report.drags += 1;
    }
    report.complete = board.is_complete();
    report
}

fn drag_to_slot(
    board: &mut Board,
    home: usize,
    id: usize,
    rng: &mut StdRng,
    jitter_px: f32,
) -> usize {
    let (Some(anchor), Some(home_slot), Some(slot), Some(start)) = (
        board.piece(home).map(Piece::position),
        board.correct_position(home),
        board.correct_position(id),
        board.piece(id).map(Piece::position),
    ) else {
        return 0;
    };
    let target = anchor + (slot - home_slot);
    if board.piece_at(start) != Some(id) {
        log::trace!("piece {id} is covered at {start:?}, grabbing it anyway");
    }

    let group = board.linked_group(id);
    for &member in &group {
        board.bring_to_front(member);
    }
    let release_jitter = jitter_px.min(RELEASE_JITTER_RATIO * board.link_distance());
    let mut cursor = start;
    for step in 1..=DRAG_STEPS {
        let t = step as f32 / DRAG_STEPS as f32;
        let spread = if step == DRAG_STEPS {
            release_jitter
        } else {
            jitter_px
        }
        .max(0.0);
        let next = start
            + (target - start) * t
            + Point::new(
                rng.random_range(-spread..=spread),
                rng.random_range(-spread..=spread),
            );
        board.move_group(id, next - cursor);
        cursor = next;
    }

    let links: usize = group.iter().map(|&member| board.check_link(member)).sum();
    log::debug!("dragged piece {id} ({} in group), {links} links", group.len());
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shuffled(count: usize, rotation: bool, seed: u64) -> Board {
        let mut board =
            Board::with_rng(count, count, StdRng::seed_from_u64(seed)).expect("board");
        board.set_size(600.0, 400.0).expect("size");
        board.shuffle(rotation);
        board.advance_shuffle(1.0);
        board
    }

    #[test]
    fn solves_scattered_board() {
        let mut board = shuffled(4, false, 5);
        assert!(!board.is_complete());
        let report = solve(&mut board, &mut StdRng::seed_from_u64(1), 1.0);
        assert!(report.complete);
        assert_eq!(report.links, 24);
        assert!(report.drags <= 15);
        assert_eq!(board.linked_edge_count(), 24);
    }

    #[test]
    fn solves_with_rotation() {
        let mut board = shuffled(3, true, 8);
        let report = solve(&mut board, &mut StdRng::seed_from_u64(2), 2.0);
        assert!(report.complete);
        assert!(board.pieces().iter().all(|piece| piece.orientation() == 0));
    }

    #[test]
    fn single_piece_is_already_complete() {
        let mut board = shuffled(1, false, 3);
        let report = solve(&mut board, &mut StdRng::seed_from_u64(3), 1.0);
        assert!(report.complete);
        assert_eq!(report.drags, 0);
    }
}
