//! Terminal scroll capture backend
//!
//! Uses crossterm's mouse capture to receive scroll-wheel events from the
//! hosting terminal. Each wheel notch arrives as a ScrollUp/ScrollDown
//! event and is forwarded to the sink as a ±1 delta.
//!
//! The terminal window must have focus for events to arrive; that matches
//! how the tool is operated (mouse physically rolled over the thing being
//! measured while the terminal sits in the foreground).
//!
//! While capture is active the terminal is in raw mode and this backend's
//! reader thread is the only consumer of terminal input, so keyboard input
//! cannot be read through stdin at the same time. `wait_for_enter` exists
//! for that window: the reader thread signals ENTER presses and the console
//! front end blocks on the signal to end a measurement.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
};

use super::{ScrollSink, ScrollSource, Subscription};

/// Poll timeout for the reader thread. Short enough that a stop request is
/// observed promptly, long enough to keep the thread mostly parked.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Counts ENTER presses seen by the reader thread so waiters can block on
/// "the next one" without missing presses between checks.
#[derive(Debug, Default)]
struct EnterSignal {
    presses: Mutex<u64>,
    condvar: Condvar,
}

impl EnterSignal {
    fn notify(&self) {
        let mut presses = self
            .presses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *presses += 1;
        self.condvar.notify_all();
    }

    fn wait(&self) {
        let mut presses = self
            .presses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let seen = *presses;
        while *presses == seen {
            presses = self
                .condvar
                .wait(presses)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Debug, Default)]
pub struct TerminalScrollSource {
    enter: Arc<EnterSignal>,
}

impl TerminalScrollSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the operator presses ENTER while capture is active.
    ///
    /// Only meaningful while a subscription is live; with no reader thread
    /// running there is nothing to deliver the keypress.
    pub fn wait_for_enter(&self) {
        self.enter.wait();
    }
}

impl ScrollSource for TerminalScrollSource {
    fn subscribe(&self, sink: ScrollSink) -> Result<Subscription> {
        // Raw mode is required for unbuffered mouse event delivery.
        crossterm::terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        if let Err(e) = crossterm::execute!(std::io::stdout(), EnableMouseCapture) {
            let _ = crossterm::terminal::disable_raw_mode();
            return Err(e).context("Failed to enable mouse capture");
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let enter = self.enter.clone();

        let reader = std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                // poll + read so the stop flag is checked at least every
                // POLL_INTERVAL even when no events arrive
                match crossterm::event::poll(POLL_INTERVAL) {
                    Ok(true) => match crossterm::event::read() {
                        Ok(Event::Mouse(mouse)) => match mouse.kind {
                            MouseEventKind::ScrollUp => sink(1),
                            MouseEventKind::ScrollDown => sink(-1),
                            _ => {}
                        },
                        Ok(Event::Key(key)) => {
                            if key.code == KeyCode::Enter && key.kind == KeyEventKind::Press {
                                enter.notify();
                            }
                        }
                        Ok(_) => {} // resize, focus: not ours
                        Err(e) => {
                            tracing::warn!("Terminal event read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Terminal event poll failed: {}", e);
                        break;
                    }
                }
            }
        });

        tracing::debug!("Terminal scroll capture enabled");

        Ok(Subscription::new(move || {
            stop.store(true, Ordering::Relaxed);
            let _ = reader.join();
            let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
            let _ = crossterm::terminal::disable_raw_mode();
            tracing::debug!("Terminal scroll capture released");
        }))
    }
}
