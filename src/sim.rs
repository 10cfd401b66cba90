use crate::course::{generate_row, COLS};
use crate::model::{GameState, Rules};
use rand::Rng;

/// Directional keys held during this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Steer {
    pub(crate) left: bool,
    pub(crate) right: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TickOutcome {
    pub(crate) moved: bool,
    pub(crate) scrolled: bool,
    pub(crate) crashed: bool,
}

impl GameState {
    /// One frame of play: steering, then scrolling. Does nothing once the
    /// run is over.
    pub(crate) fn update<R: Rng + ?Sized>(
        &mut self,
        steer: Steer,
        rng: &mut R,
        rules: &Rules,
    ) -> TickOutcome {
        if self.game_over {
            return TickOutcome::default();
        }
        let moved = self.step_steering(steer, rules);
        let scrolled = self.step_scroll(rng, rules);
        TickOutcome {
            moved,
            scrolled,
            crashed: self.game_over,
        }
    }

    fn can_move_to(&self, col: i32) -> bool {
        (0..COLS as i32).contains(&col) && !self.course.is_wall(col, self.player_row)
    }

    /// Lateral movement with a key-repeat cooldown. Left wins when both are
    /// held; a blocked left does not fall through to right. Steering never
    /// ends the run: a step into a wall is refused.
    pub(crate) fn step_steering(&mut self, steer: Steer, rules: &Rules) -> bool {
        if self.key_timer > 0 {
            self.key_timer -= 1;
            return false;
        }

        let target = if steer.left {
            Some(self.player_col - 1)
        } else if steer.right {
            Some(self.player_col + 1)
        } else {
            None
        };

        match target {
            Some(col) if self.can_move_to(col) => {
                self.player_col = col;
                self.key_timer = rules.key_repeat_delay;
                true
            }
            _ => false,
        }
    }

    /// Advance the scroll timer; every `scroll_speed` ticks a new row enters
    /// at the top and the player is re-checked against the shifted course.
    pub(crate) fn step_scroll<R: Rng + ?Sized>(&mut self, rng: &mut R, rules: &Rules) -> bool {
        self.scroll_timer += 1;
        if self.scroll_timer < rules.scroll_speed {
            return false;
        }
        self.scroll_timer = 0;

        let (row, next) = generate_row(rng, self.pattern);
        self.pattern = next;
        self.course.push_top(row);
        self.distance += 1;

        if self.player_on_wall() {
            self.game_over = true;
        }
        true
    }
}
