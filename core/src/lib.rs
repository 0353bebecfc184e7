pub mod animation;
pub mod board;
pub mod config;
pub mod error;
pub mod geometry;
pub mod outline;
pub mod piece;
pub mod raster;

pub use animation::{IntroAnimation, OutlineFade};
pub use board::{Board, BoardLayout};
pub use config::BoardConfig;
pub use error::BoardError;
pub use geometry::{Direction, GridPos, Point};
pub use outline::{EdgeOutline, generate_outline, generate_outlines};
pub use piece::{Piece, PieceId};
