use crate::course::{Course, COLS, ROWS};
use rand::Rng;

pub(crate) const PLAYER_ROW: i32 = ROWS as i32 - 2;
pub(crate) const START_COL: i32 = COLS as i32 / 2;

/// Frame-counted timings. Everything advances once per update tick, so the
/// pace follows the frame rate.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Rules {
    pub(crate) scroll_speed: u32,
    pub(crate) key_repeat_delay: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            scroll_speed: 10,
            key_repeat_delay: 5,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct GameState {
    pub(crate) player_col: i32,
    pub(crate) player_row: i32,
    pub(crate) distance: u64,
    pub(crate) pattern: usize,
    pub(crate) scroll_timer: u32,
    pub(crate) key_timer: u32,
    pub(crate) course: Course,
    pub(crate) game_over: bool,
}

impl GameState {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (course, pattern) = Course::initialize(rng, 0);
        Self {
            player_col: START_COL,
            player_row: PLAYER_ROW,
            distance: 0,
            pattern,
            scroll_timer: 0,
            key_timer: 0,
            course,
            game_over: false,
        }
    }

    /// Back to launch conditions with a freshly drawn course.
    pub(crate) fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = Self::new(rng);
    }

    pub(crate) fn player_on_wall(&self) -> bool {
        self.course.is_wall(self.player_col, self.player_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::pattern_row;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn new_game_starts_centered_on_the_second_to_last_row() {
        let st = GameState::new(&mut StdRng::seed_from_u64(5));
        assert_eq!(st.player_col, 4);
        assert_eq!(st.player_row, ROWS as i32 - 2);
        assert_eq!(st.distance, 0);
        assert_eq!(st.pattern, 0);
        assert_eq!((st.scroll_timer, st.key_timer), (0, 0));
        assert!(!st.game_over);
        assert_eq!(st.course.len(), ROWS);
    }

    #[test]
    fn start_column_is_open_on_the_opening_row() {
        for seed in 0..16 {
            let st = GameState::new(&mut StdRng::seed_from_u64(seed));
            assert_eq!(st.course.row(ROWS - 1), Some(&pattern_row(0)));
            assert!(!st.course.is_wall(st.player_col, ROWS as i32 - 1));
        }
    }

    #[test]
    fn restart_resets_everything() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut st = GameState::new(&mut rng);
        st.player_col = 0;
        st.distance = 321;
        st.pattern = 7;
        st.scroll_timer = 9;
        st.key_timer = 3;
        st.game_over = true;

        st.restart(&mut rng);

        assert_eq!(st.player_col, START_COL);
        assert_eq!(st.distance, 0);
        assert_eq!(st.pattern, 0);
        assert_eq!((st.scroll_timer, st.key_timer), (0, 0));
        assert!(!st.game_over);
        assert_eq!(st.course.len(), ROWS);
        assert_eq!(st.course.row(ROWS - 1), Some(&pattern_row(0)));
    }
}
