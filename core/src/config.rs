use serde::{Deserialize, Serialize};

use crate::BoardError;

pub const BASE_INSET: f32 = 0.3;
pub const BASE_INSET_MAX: f32 = 0.5;
pub const LINK_DISTANCE_RATIO_DEFAULT: f32 = 0.15;
pub const SHUFFLE_SWAPS_DEFAULT: usize = 10;
pub const PREVIEW_STRIP_RATIO_DEFAULT: f32 = 0.1;
pub const HIT_ALPHA_THRESHOLD_DEFAULT: u8 = 128;
pub const CONTOUR_WIDTH_DEFAULT: f32 = 1.7;
pub const CONTOUR_GRAY_DEFAULT: u8 = 0x88;
pub const GATHER_EPSILON_DEFAULT: f32 = 0.1;
pub const PUZZLE_SIZE_RATIO: f32 = 0.9;

/// Tunables for a board. Missing keys in a serialized config fall back to
/// the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Margin beyond the nominal cell, as a fraction of the tile size.
    pub base_inset: f32,
    pub link_distance_ratio: f32,
    pub shuffle_swaps: usize,
    /// Fraction of the shorter side kept free along the longer axis.
    pub preview_strip_ratio: f32,
    pub hit_alpha_threshold: u8,
    pub contour_width: f32,
    pub contour_gray: u8,
    pub gather_epsilon: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_inset: BASE_INSET,
            link_distance_ratio: LINK_DISTANCE_RATIO_DEFAULT,
            shuffle_swaps: SHUFFLE_SWAPS_DEFAULT,
            preview_strip_ratio: PREVIEW_STRIP_RATIO_DEFAULT,
            hit_alpha_threshold: HIT_ALPHA_THRESHOLD_DEFAULT,
            contour_width: CONTOUR_WIDTH_DEFAULT,
            contour_gray: CONTOUR_GRAY_DEFAULT,
            gather_epsilon: GATHER_EPSILON_DEFAULT,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), BoardError> {
        if !self.base_inset.is_finite() || self.base_inset < 0.0 || self.base_inset > BASE_INSET_MAX {
            return Err(BoardError::Config(format!(
                "base_inset must be within 0..={BASE_INSET_MAX}, got {}",
                self.base_inset
            )));
        }
        if !self.link_distance_ratio.is_finite() || self.link_distance_ratio <= 0.0 {
            return Err(BoardError::Config(format!(
                "link_distance_ratio must be positive, got {}",
                self.link_distance_ratio
            )));
        }
        if !self.preview_strip_ratio.is_finite() || !(0.0..1.0).contains(&self.preview_strip_ratio) {
            return Err(BoardError::Config(format!(
                "preview_strip_ratio must be within 0..1, got {}",
                self.preview_strip_ratio
            )));
        }
        if !self.contour_width.is_finite() || self.contour_width < 0.0 {
            return Err(BoardError::Config(format!(
                "contour_width must not be negative, got {}",
                self.contour_width
            )));
        }
        if !self.gather_epsilon.is_finite() || self.gather_epsilon < 0.0 {
            return Err(BoardError::Config(format!(
                "gather_epsilon must not be negative, got {}",
                self.gather_epsilon
            )));
        }
        Ok(())
    }
}
