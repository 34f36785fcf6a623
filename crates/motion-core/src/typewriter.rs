//! Character-by-character text reveal with an independent blinking cursor.
//!
//! A session reveals the first character once the start delay elapses and
//! one more every `speed_ms` after that. Completion is reported together
//! with the last character, after which the reveal timer stops. The cursor
//! blinks on its own interval for the whole mount, unaffected by restarts.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use folio_common::clock::sanitize_ms;
use folio_host::{Host, Signal, TimerHandle, WeakHost};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SPEED_MS: f64 = 50.0;
pub const DEFAULT_DELAY_MS: f64 = 0.0;
pub const CURSOR_BLINK_MS: f64 = 530.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterOptions {
    pub text: String,
    /// Delay between consecutive characters.
    pub speed_ms: f64,
    /// Delay before the first character.
    pub delay_ms: f64,
}

impl Default for TypewriterOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            speed_ms: DEFAULT_SPEED_MS,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl TypewriterOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed_ms: f64) -> Self {
        self.speed_ms = speed_ms;
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// What a consumer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypewriterState {
    pub revealed_text: String,
    pub is_complete: bool,
    pub cursor_visible: bool,
}

impl Default for TypewriterState {
    fn default() -> Self {
        Self {
            revealed_text: String::new(),
            is_complete: false,
            cursor_visible: true,
        }
    }
}

struct Session {
    generation: u64,
    chars: Vec<char>,
    revealed: usize,
    speed_ms: f64,
    timer: Option<TimerHandle>,
}

struct Shared {
    host: WeakHost,
    state: Signal<TypewriterState>,
    session: RefCell<Session>,
}

/// A mounted text reveal.
pub struct Typewriter {
    shared: Rc<Shared>,
    options: TypewriterOptions,
    _blink: TimerHandle,
}

impl Typewriter {
    /// Start revealing `options.text` and blinking the cursor every
    /// `blink_ms`.
    pub fn mount(host: &Host, options: TypewriterOptions, blink_ms: f64) -> Self {
        let state = Signal::new(TypewriterState::default());

        let blink_state = state.clone();
        let blink = host.set_interval(blink_ms, move |_| {
            blink_state.update(|s| s.cursor_visible = !s.cursor_visible);
        });

        let shared = Rc::new(Shared {
            host: host.downgrade(),
            state,
            session: RefCell::new(Session {
                generation: 0,
                chars: Vec::new(),
                revealed: 0,
                speed_ms: 0.0,
                timer: None,
            }),
        });

        let typewriter = Self {
            shared,
            options,
            _blink: blink,
        };
        typewriter.start_session(host);
        typewriter
    }

    /// Mount with the standard cursor blink period.
    pub fn mount_default(host: &Host, options: TypewriterOptions) -> Self {
        Self::mount(host, options, CURSOR_BLINK_MS)
    }

    pub fn snapshot(&self) -> TypewriterState {
        self.shared.state.get()
    }

    pub fn signal(&self) -> Signal<TypewriterState> {
        self.shared.state.clone()
    }

    pub fn options(&self) -> &TypewriterOptions {
        &self.options
    }

    /// Number of characters revealed in the current session.
    pub fn revealed_len(&self) -> usize {
        self.shared.session.borrow().revealed
    }

    /// Replace the options. Any change to text, speed or delay cancels the
    /// running session and starts a fresh one from an empty prefix.
    /// Without a live host nothing can be revealed, so the options and the
    /// displayed state are left as they are.
    pub fn set_options(&mut self, options: TypewriterOptions) {
        if options == self.options {
            return;
        }
        let Some(host) = self.shared.host.upgrade() else {
            tracing::debug!("Typewriter host gone; ignoring new options");
            return;
        };
        self.options = options;
        tracing::debug!(text = %self.options.text, "Typewriter restarting");
        self.start_session(&host);
    }

    /// Cancel both timers.
    pub fn unmount(self) {}

    fn start_session(&self, host: &Host) {
        let (generation, stale) = {
            let mut session = self.shared.session.borrow_mut();
            session.generation += 1;
            session.chars = self.options.text.chars().collect();
            session.revealed = 0;
            session.speed_ms = sanitize_ms(self.options.speed_ms);
            (session.generation, session.timer.take())
        };
        drop(stale);

        self.shared.state.update(|s| {
            s.revealed_text.clear();
            s.is_complete = false;
        });

        let timer = schedule_tick(
            host,
            Rc::downgrade(&self.shared),
            generation,
            sanitize_ms(self.options.delay_ms),
        );
        self.shared.session.borrow_mut().timer = Some(timer);

        tracing::debug!(
            chars = self.options.text.chars().count(),
            speed_ms = self.options.speed_ms,
            delay_ms = self.options.delay_ms,
            "Typewriter session started"
        );
    }
}

fn schedule_tick(host: &Host, shared: Weak<Shared>, generation: u64, delay_ms: f64) -> TimerHandle {
    host.set_timeout(delay_ms, move |_| {
        if let Some(shared) = shared.upgrade() {
            tick(&shared, generation);
        }
    })
}

fn tick(shared: &Rc<Shared>, generation: u64) {
    let (revealed_text, is_complete, replaced) = {
        let mut session = shared.session.borrow_mut();
        // Superseded by a restart or unmount.
        if session.generation != generation {
            return;
        }
        if session.revealed < session.chars.len() {
            session.revealed += 1;
        }
        let is_complete = session.revealed == session.chars.len();
        let revealed_text: String = session.chars[..session.revealed].iter().collect();

        let replaced = if is_complete {
            session.timer.take()
        } else {
            match shared.host.upgrade() {
                Some(host) => {
                    let next = schedule_tick(
                        &host,
                        Rc::downgrade(shared),
                        generation,
                        session.speed_ms,
                    );
                    session.timer.replace(next)
                }
                None => None,
            }
        };
        (revealed_text, is_complete, replaced)
    };
    drop(replaced);

    tracing::trace!(revealed = %revealed_text, is_complete, "Typewriter tick");
    shared.state.update(|s| {
        s.revealed_text = revealed_text;
        s.is_complete = is_complete;
    });
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        let timer = {
            let mut session = self.shared.session.borrow_mut();
            session.generation += 1;
            session.timer.take()
        };
        drop(timer);
        tracing::debug!("Typewriter unmounted");
    }
}

impl std::fmt::Debug for Typewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typewriter")
            .field("options", &self.options)
            .field("state", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_page_model::viewport::Viewport;
    use std::cell::Cell;

    fn host() -> Host {
        Host::new(Viewport::default(), 16.0)
    }

    #[test]
    fn test_reveals_one_char_per_tick() {
        let host = host();
        let tw = Typewriter::mount_default(&host, TypewriterOptions::new("Hi").with_speed(80.0));
        assert_eq!(tw.snapshot().revealed_text, "");

        host.advance_by(0.0);
        assert_eq!(tw.snapshot().revealed_text, "H");
        assert!(!tw.snapshot().is_complete);

        host.advance_by(80.0);
        let state = tw.snapshot();
        assert_eq!(state.revealed_text, "Hi");
        assert!(state.is_complete);

        let version = tw.signal().version();
        host.advance_by(80.0);
        assert_eq!(tw.snapshot().revealed_text, "Hi");
        assert_eq!(tw.signal().version(), version);
        assert_eq!(host.stats().timeouts, 0);
    }

    #[test]
    fn test_start_delay_postpones_first_char() {
        let host = host();
        let tw = Typewriter::mount_default(
            &host,
            TypewriterOptions::new("React").with_speed(80.0).with_delay(500.0),
        );
        host.advance_to(499.0);
        assert_eq!(tw.snapshot().revealed_text, "");
        host.advance_to(500.0);
        assert_eq!(tw.snapshot().revealed_text, "R");
        host.advance_to(820.0);
        assert_eq!(tw.snapshot().revealed_text, "React");
        assert!(tw.snapshot().is_complete);
    }

    #[test]
    fn test_empty_text_completes_after_delay() {
        let host = host();
        let tw = Typewriter::mount_default(&host, TypewriterOptions::new("").with_delay(100.0));
        host.advance_by(99.0);
        assert!(!tw.snapshot().is_complete);
        host.advance_by(1.0);
        assert!(tw.snapshot().is_complete);
        assert_eq!(tw.snapshot().revealed_text, "");
    }

    #[test]
    fn test_zero_speed_is_asynchronous() {
        let host = host();
        let tw = Typewriter::mount_default(&host, TypewriterOptions::new("fast").with_speed(0.0));
        assert_eq!(tw.snapshot().revealed_text, "");
        host.advance_by(0.0);
        assert_eq!(tw.snapshot().revealed_text, "fast");
        assert!(tw.snapshot().is_complete);
    }

    #[test]
    fn test_multibyte_text_is_revealed_per_char() {
        let host = host();
        let tw = Typewriter::mount_default(&host, TypewriterOptions::new("héllo").with_speed(10.0));
        host.advance_by(10.0);
        assert_eq!(tw.snapshot().revealed_text, "hé");
        assert_eq!(tw.revealed_len(), 2);
    }

    #[test]
    fn test_cursor_keeps_blinking_after_completion() {
        let host = host();
        let tw = Typewriter::mount(&host, TypewriterOptions::new("ok").with_speed(10.0), 530.0);
        host.advance_by(20.0);
        assert!(tw.snapshot().is_complete);
        assert!(tw.snapshot().cursor_visible);

        let mut seen = Vec::new();
        for _ in 0..4 {
            host.advance_by(530.0);
            seen.push(tw.snapshot().cursor_visible);
        }
        assert_eq!(seen, vec![false, true, false, true]);
    }

    #[test]
    fn test_changing_options_restarts_from_empty() {
        let host = host();
        let mut tw = Typewriter::mount_default(&host, TypewriterOptions::new("abcdef").with_speed(10.0));
        host.advance_by(20.0);
        assert_eq!(tw.snapshot().revealed_text, "abc");

        tw.set_options(TypewriterOptions::new("xyz").with_speed(10.0));
        assert_eq!(tw.snapshot().revealed_text, "");
        assert!(!tw.snapshot().is_complete);
        assert_eq!(host.stats().timeouts, 1);

        host.advance_by(0.0);
        assert_eq!(tw.snapshot().revealed_text, "x");
        host.advance_by(100.0);
        assert_eq!(tw.snapshot().revealed_text, "xyz");
    }

    #[test]
    fn test_identical_options_do_not_restart() {
        let host = host();
        let mut tw = Typewriter::mount_default(&host, TypewriterOptions::new("abc").with_speed(10.0));
        host.advance_by(10.0);
        tw.set_options(TypewriterOptions::new("abc").with_speed(10.0));
        assert_eq!(tw.snapshot().revealed_text, "ab");
    }

    #[test]
    fn test_options_kept_when_host_is_gone() {
        let host = host();
        let mut tw = Typewriter::mount_default(&host, TypewriterOptions::new("abc").with_speed(10.0));
        host.advance_by(30.0);
        assert_eq!(tw.snapshot().revealed_text, "abc");
        drop(host);

        tw.set_options(TypewriterOptions::new("xyz").with_speed(10.0));
        assert_eq!(tw.options().text, "abc");
        assert_eq!(tw.snapshot().revealed_text, "abc");
    }

    #[test]
    fn test_unmount_mid_flight_stops_all_updates() {
        let host = host();
        let tw = Typewriter::mount_default(&host, TypewriterOptions::new("portfolio").with_speed(50.0));
        let updates = Rc::new(Cell::new(0));
        let updates_cb = updates.clone();
        let signal = tw.signal();
        let _sub = signal.subscribe(move |_| updates_cb.set(updates_cb.get() + 1));

        host.advance_by(100.0);
        let before = updates.get();
        assert!(before > 0);

        tw.unmount();
        assert!(host.stats().is_idle());
        host.advance_by(10_000.0);
        assert_eq!(updates.get(), before);
    }

    #[test]
    fn test_unmount_from_inside_subscriber() {
        let host = host();
        let tw = Typewriter::mount_default(&host, TypewriterOptions::new("abc").with_speed(10.0));
        let slot = Rc::new(RefCell::new(Some(tw)));
        let slot_cb = slot.clone();
        let signal = slot.borrow().as_ref().map(|tw| tw.signal()).unwrap();
        let _sub = signal.subscribe(move |state| {
            if !state.revealed_text.is_empty() {
                slot_cb.borrow_mut().take();
            }
        });

        host.advance_by(100.0);
        assert!(slot.borrow().is_none());
        assert_eq!(signal.get().revealed_text, "a");
        assert!(host.stats().is_idle());
    }
}
