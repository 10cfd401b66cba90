use crate::config::Settings;
use crate::input::{collect_commands, Command, KeyState};
use crate::model::{GameState, Rules};
use crate::render::{render_scene, Look, Terminal};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub(crate) struct App {
    settings: Settings,
    rules: Rules,
    rng: StdRng,
    state: GameState,
    keys: KeyState,
    look: Look,
    term: Terminal,
    too_small: bool,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings) -> anyhow::Result<Self> {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let state = GameState::new(&mut rng);
        let look = Look::from_settings(&settings);

        let term = Terminal::begin()?;
        let keys = KeyState::new(term.reports_release);

        info!(
            seed = settings.seed,
            fps = settings.fps_cap,
            glyphs = ?settings.glyphs,
            key_release = term.reports_release,
            "session start"
        );

        Ok(Self {
            settings,
            rules: Rules::default(),
            rng,
            state,
            keys,
            look,
            term,
            too_small: false,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f64(1.0 / self.settings.fps_cap as f64);
        let mut deadline = Instant::now();

        while !self.should_quit {
            if self.term.resize_if_needed()? {
                debug!(cols = self.term.cols, rows = self.term.rows, "resized");
            }

            let cmds = collect_commands(&mut self.keys)?;
            self.should_quit =
                apply_commands(&mut self.state, &mut self.keys, &cmds, &mut self.rng);
            if self.should_quit {
                break;
            }

            let outcome = self
                .state
                .update(self.keys.steer(), &mut self.rng, &self.rules);
            if outcome.moved {
                debug!(col = self.state.player_col, "steer");
            }
            if outcome.scrolled {
                debug!(
                    distance = self.state.distance,
                    pattern = self.state.pattern,
                    "scrolled"
                );
            }
            if outcome.crashed {
                info!(distance = self.state.distance, "game over");
            }
            self.keys.end_frame();

            self.render_frame()?;

            deadline = next_deadline(deadline, Instant::now(), frame_dt);
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }

        info!(distance = self.state.distance, "quit");
        self.term.end()?;
        Ok(())
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let fits = render_scene(&mut self.term.cur, &self.state, &self.look);
        if !fits && !self.too_small {
            warn!(
                cols = self.term.cols,
                rows = self.term.rows,
                "terminal too small for the playfield"
            );
        }
        self.too_small = !fits;
        self.term.present()
    }
}

pub(crate) fn run(settings: Settings) -> anyhow::Result<()> {
    let mut app = App::init(settings)?;
    app.run()
}

/// Act on this frame's commands. Quit always wins; restart only counts once
/// the run is over, and drops any held keys so the new run starts still.
/// Returns whether the loop should stop.
fn apply_commands<R: Rng + ?Sized>(
    state: &mut GameState,
    keys: &mut KeyState,
    cmds: &[Command],
    rng: &mut R,
) -> bool {
    let mut quit = false;
    for cmd in cmds {
        match cmd {
            Command::Quit => quit = true,
            Command::Restart if state.game_over => {
                state.restart(rng);
                keys.clear();
                info!("restart");
            }
            Command::Restart => {}
        }
    }
    quit
}

/* -----------------------------
   Frame pacing
------------------------------ */

/// Deadlines advance by one frame each iteration so pacing does not drift.
/// A deadline already in the past re-anchors at `now` instead of letting
/// the loop race to catch up.
fn next_deadline(deadline: Instant, now: Instant, frame: Duration) -> Instant {
    let next = deadline + frame;
    if next < now {
        now
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{pattern_row, ROWS};
    use crate::model::START_COL;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mid_run(rng: &mut StdRng) -> GameState {
        let rules = Rules::default();
        let mut st = GameState::new(rng);
        st.distance = 7;
        st.pattern = 3;
        st.player_col = START_COL - 1;
        st.scroll_timer = rules.scroll_speed - 1;
        st
    }

    #[test]
    fn restart_while_playing_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut st = mid_run(&mut rng);
        let before = st.clone();
        let mut keys = KeyState::new(true);
        keys.handle(press(KeyCode::Left));

        let quit = apply_commands(&mut st, &mut keys, &[Command::Restart], &mut rng);

        assert!(!quit);
        assert!(!st.game_over);
        assert_eq!(st.distance, before.distance);
        assert_eq!(st.pattern, before.pattern);
        assert_eq!(st.player_col, before.player_col);
        assert_eq!(st.scroll_timer, before.scroll_timer);
        assert_eq!(st.course, before.course);
        assert!(keys.steer().left);
    }

    #[test]
    fn restart_after_game_over_starts_a_fresh_run() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut st = mid_run(&mut rng);
        st.game_over = true;
        let mut keys = KeyState::new(true);
        keys.handle(press(KeyCode::Right));

        let quit = apply_commands(&mut st, &mut keys, &[Command::Restart], &mut rng);

        assert!(!quit);
        assert!(!st.game_over);
        assert_eq!(st.distance, 0);
        assert_eq!(st.pattern, 0);
        assert_eq!(st.player_col, START_COL);
        assert_eq!(st.scroll_timer, 0);
        assert_eq!(st.course.row(ROWS - 1), Some(&pattern_row(0)));
        assert!(!keys.steer().left && !keys.steer().right);
    }

    #[test]
    fn quit_is_honoured_in_any_state() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut keys = KeyState::new(false);
        let mut st = mid_run(&mut rng);
        assert!(apply_commands(&mut st, &mut keys, &[Command::Quit], &mut rng));
        st.game_over = true;
        assert!(apply_commands(
            &mut st,
            &mut keys,
            &[Command::Restart, Command::Quit],
            &mut rng
        ));
        assert!(!st.game_over);
        assert!(!apply_commands(&mut st, &mut keys, &[], &mut rng));
    }

    #[test]
    fn deadlines_step_by_one_frame_without_drift() {
        let frame = Duration::from_millis(16);
        let t0 = Instant::now();
        let d1 = next_deadline(t0, t0 + Duration::from_millis(5), frame);
        assert_eq!(d1, t0 + frame);
        let d2 = next_deadline(d1, d1 + Duration::from_millis(3), frame);
        assert_eq!(d2, t0 + frame * 2);
    }

    #[test]
    fn a_late_frame_reanchors_instead_of_bursting() {
        let frame = Duration::from_millis(16);
        let t0 = Instant::now();
        let late = t0 + Duration::from_millis(100);
        assert_eq!(next_deadline(t0, late, frame), late);
        assert_eq!(next_deadline(late, late, frame), late + frame);
    }
}
