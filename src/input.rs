use crate::sim::Steer;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Frames a key counts as held after a press or repeat when the terminal
/// cannot report releases. Must stay below one move cooldown so a tap moves
/// exactly once.
pub(crate) const HOLD_FRAMES: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    Restart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hold {
    Up,
    Down,
    Fading(u32),
}

impl Hold {
    fn is_down(self) -> bool {
        !matches!(self, Hold::Up)
    }

    fn tick(self) -> Self {
        match self {
            Hold::Fading(n) if n > 1 => Hold::Fading(n - 1),
            Hold::Fading(_) => Hold::Up,
            other => other,
        }
    }
}

/// Level-triggered view of the arrow keys built from terminal key events.
#[derive(Clone, Debug)]
pub(crate) struct KeyState {
    reports_release: bool,
    left: Hold,
    right: Hold,
}

impl KeyState {
    pub(crate) fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            left: Hold::Up,
            right: Hold::Up,
        }
    }

    pub(crate) fn handle(&mut self, k: KeyEvent) -> Option<Command> {
        if k.kind == KeyEventKind::Release {
            match k.code {
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => self.left = Hold::Up,
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => self.right = Hold::Up,
                _ => {}
            }
            return None;
        }

        let held = if self.reports_release {
            Hold::Down
        } else {
            Hold::Fading(HOLD_FRAMES)
        };

        if k.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Some(Command::Quit);
        }

        match k.code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => {
                self.left = held;
                None
            }
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => {
                self.right = held;
                None
            }
            KeyCode::Char('r') | KeyCode::Char('R') if k.kind == KeyEventKind::Press => {
                Some(Command::Restart)
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }

    /// Keys feed `handle`; losing focus drops every hold, since the release
    /// will go to another window.
    pub(crate) fn handle_event(&mut self, ev: Event) -> Option<Command> {
        match ev {
            Event::Key(k) => self.handle(k),
            Event::FocusLost => {
                self.clear();
                None
            }
            _ => None,
        }
    }

    pub(crate) fn steer(&self) -> Steer {
        Steer {
            left: self.left.is_down(),
            right: self.right.is_down(),
        }
    }

    /// Age fallback holds; call once after the frame's update.
    pub(crate) fn end_frame(&mut self) {
        self.left = self.left.tick();
        self.right = self.right.tick();
    }

    /// Drop every hold, e.g. after a restart.
    pub(crate) fn clear(&mut self) {
        self.left = Hold::Up;
        self.right = Hold::Up;
    }
}

/// Drain pending terminal events without blocking, feeding key and focus
/// events into `keys`. Returns the commands seen this frame, in order.
pub(crate) fn collect_commands(keys: &mut KeyState) -> anyhow::Result<Vec<Command>> {
    let mut out = Vec::new();
    while event::poll(Duration::ZERO)? {
        if let Some(cmd) = keys.handle_event(event::read()?) {
            out.push(cmd);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn fallback_hold_expires_after_a_few_frames() {
        let mut keys = KeyState::new(false);
        keys.handle(key(KeyCode::Left, KeyEventKind::Press));
        let mut held = 0;
        for _ in 0..10 {
            if keys.steer().left {
                held += 1;
            }
            keys.end_frame();
        }
        assert_eq!(held, HOLD_FRAMES);
        assert!(!keys.steer().left);
    }

    #[test]
    fn repeat_events_refresh_a_fallback_hold() {
        let mut keys = KeyState::new(false);
        keys.handle(key(KeyCode::Right, KeyEventKind::Press));
        for _ in 0..20 {
            keys.end_frame();
            keys.handle(key(KeyCode::Right, KeyEventKind::Repeat));
            assert!(keys.steer().right);
        }
    }

    #[test]
    fn release_reporting_terminals_hold_until_release() {
        let mut keys = KeyState::new(true);
        keys.handle(key(KeyCode::Right, KeyEventKind::Press));
        for _ in 0..100 {
            keys.end_frame();
        }
        assert!(keys.steer().right);
        keys.handle(key(KeyCode::Right, KeyEventKind::Release));
        assert_eq!(keys.steer(), Steer::default());
    }

    #[test]
    fn tap_moves_exactly_once() {
        use crate::course::{Course, Tile, COLS, ROWS};
        use crate::model::{GameState, Rules};
        use rand::{rngs::StdRng, SeedableRng};

        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut st = GameState::new(&mut rng);
        st.course = Course::from_rows(vec![[Tile::Open; COLS]; ROWS]);
        let mut keys = KeyState::new(false);

        keys.handle(key(KeyCode::Left, KeyEventKind::Press));
        for _ in 0..30 {
            st.step_steering(keys.steer(), &rules);
            keys.end_frame();
        }
        assert_eq!(st.player_col, 3);
    }

    #[test]
    fn command_keys() {
        let mut keys = KeyState::new(false);
        assert_eq!(
            keys.handle(key(KeyCode::Char('r'), KeyEventKind::Press)),
            Some(Command::Restart)
        );
        assert_eq!(keys.handle(key(KeyCode::Char('r'), KeyEventKind::Repeat)), None);
        assert_eq!(
            keys.handle(key(KeyCode::Char('q'), KeyEventKind::Press)),
            Some(Command::Quit)
        );
        assert_eq!(keys.handle(key(KeyCode::Esc, KeyEventKind::Press)), Some(Command::Quit));

        let ctrl_c = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        assert_eq!(keys.handle(ctrl_c), Some(Command::Quit));
        assert_eq!(keys.handle(key(KeyCode::Char('x'), KeyEventKind::Press)), None);
    }

    #[test]
    fn losing_focus_releases_held_keys() {
        let mut keys = KeyState::new(true);
        keys.handle_event(Event::Key(key(KeyCode::Right, KeyEventKind::Press)));
        assert!(keys.steer().right);

        assert_eq!(keys.handle_event(Event::FocusGained), None);
        assert!(keys.steer().right);

        assert_eq!(keys.handle_event(Event::FocusLost), None);
        assert_eq!(keys.steer(), Steer::default());
    }

    #[test]
    fn clear_drops_holds() {
        let mut keys = KeyState::new(true);
        keys.handle(key(KeyCode::Left, KeyEventKind::Press));
        keys.handle(key(KeyCode::Char('d'), KeyEventKind::Press));
        assert_eq!(
            keys.steer(),
            Steer {
                left: true,
                right: true
            }
        );
        keys.clear();
        assert_eq!(keys.steer(), Steer::default());
    }
}
