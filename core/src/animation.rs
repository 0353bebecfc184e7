/// Intro progress gained per second.
pub const SHUFFLE_ANIMATION_SPEED: f32 = 0.4;
pub const OUTLINE_FADE_DURATION_SECONDS: f32 = 1.0;
/// Pieces become selectable halfway through the intro.
pub const SELECTABLE_PROGRESS: f32 = 0.5;

/// Clock for the scatter-to-grid intro. Each tick yields the eased ratio to
/// hand to `Board::advance_shuffle`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntroAnimation {
    progress: f32,
}

impl IntroAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` once the animation has already finished.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        if self.is_finished() {
            return None;
        }
        self.progress = (self.progress + SHUFFLE_ANIMATION_SPEED * dt.max(0.0)).min(1.0);
        Some(self.progress.powi(4))
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn can_select(&self) -> bool {
        self.progress >= SELECTABLE_PROGRESS
    }

    /// Linking on release only happens after the pieces have settled.
    pub fn can_link(&self) -> bool {
        self.is_finished()
    }
}

/// Fades the seam contours out after the puzzle is solved.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutlineFade {
    elapsed: f32,
}

impl OutlineFade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn tick(&mut self, dt: f32) -> f32 {
        self.elapsed += dt.max(0.0);
        self.alpha()
    }

    pub fn alpha(&self) -> f32 {
        1.0 - smoothstep(self.elapsed / OUTLINE_FADE_DURATION_SECONDS)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= OUTLINE_FADE_DURATION_SECONDS
    }
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn intro_ratio_is_quartic() {
        let mut intro = IntroAnimation::new();
        let ratio = intro.tick(1.25).expect("running");
        assert_close(intro.progress(), 0.5);
        assert_close(ratio, 0.0625);
        assert!(intro.can_select());
        assert!(!intro.can_link());
    }

    #[test]
    fn intro_clamps_and_stops() {
        let mut intro = IntroAnimation::new();
        assert_eq!(intro.tick(10.0), Some(1.0));
        assert!(intro.is_finished());
        assert!(intro.can_link());
        assert_eq!(intro.tick(0.1), None);
    }

    #[test]
    fn intro_ignores_negative_time() {
        let mut intro = IntroAnimation::new();
        intro.tick(-3.0);
        assert_close(intro.progress(), 0.0);
        assert!(!intro.can_select());
    }

    #[test]
    fn fade_follows_smoothstep() {
        let mut fade = OutlineFade::new();
        assert_close(fade.alpha(), 1.0);
        assert_close(fade.tick(0.5), 0.5);
        assert_close(fade.tick(0.25), 1.0 - smoothstep(0.75));
        assert_close(fade.tick(5.0), 0.0);
        assert!(fade.is_finished());
        fade.reset();
        assert_close(fade.alpha(), 1.0);
    }
}
