#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardError {
    #[error("grid must be at least 1x1, got {count_x}x{count_y}")]
    InvalidGrid { count_x: usize, count_y: usize },
    #[error("board size must be positive and finite, got {width}x{height}")]
    InvalidSize { width: f32, height: f32 },
    #[error("source image has no pixels")]
    EmptyImage,
    #[error("expected {expected} {axis} outlines, got {found}")]
    OutlineCount {
        axis: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid config: {0}")]
    Config(String),
}
