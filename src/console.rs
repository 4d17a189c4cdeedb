// Console front end - interactive calibrate/measure menu
//
// Blocking menu loop in the spirit of a tape measure you talk to:
// calibrate against the 30 cm reference, then measure anything.
//
// Built only on SessionController's public operations; the 10-second
// calibration capture window is console policy, not core behavior.
//
// Printing discipline: while a capture is active the terminal is in raw
// mode (see source::terminal), where newline handling is off. All console
// output happens before a session starts or after it stops.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::{SessionController, SessionError};
use crate::source::TerminalScrollSource;

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
}

pub struct Console {
    controller: Arc<SessionController>,
    /// Present when the controller is fed by the terminal backend. Needed
    /// for the stop keypress: raw mode routes all input through the capture
    /// thread, so ENTER arrives via the source, not stdin.
    terminal: Option<Arc<TerminalScrollSource>>,
    capture_window: Duration,
}

impl Console {
    pub fn new(
        controller: Arc<SessionController>,
        terminal: Option<Arc<TerminalScrollSource>>,
        capture_window: Duration,
    ) -> Self {
        Self {
            controller,
            terminal,
            capture_window,
        }
    }

    /// Main menu loop. Blocks until the operator exits.
    pub fn run(&self) -> Result<()> {
        use colors::*;

        loop {
            println!();
            println!("  {BOLD}{CYAN}scrolltape{RESET}");
            println!("  {DIM}Measure distances with your mouse scroll wheel{RESET}");
            println!();
            println!("  1. Calibrate (required first time)");
            println!("  2. Measure distance");
            println!("  3. Exit");
            println!();

            let choice = prompt("Enter your choice (1-3): ")?;
            match choice.trim() {
                "1" => self.calibrate()?,
                "2" => self.measure()?,
                "3" => {
                    println!("\n  Goodbye!");
                    return Ok(());
                }
                _ => println!("\n  {RED}Invalid choice. Try again.{RESET}"),
            }
        }
    }

    /// Calibration: roll the wheel over the 30 cm reference inside a fixed
    /// capture window, then derive the ratio.
    fn calibrate(&self) -> Result<()> {
        use colors::*;

        println!();
        println!("  {BOLD}CALIBRATION{RESET}");
        println!();
        println!("  1. Place your mouse on a flat surface");
        println!("  2. Use a ruler and mark a 30 cm line");
        println!("  3. Roll the scroll wheel exactly from mark to mark");
        println!();

        prompt("Press ENTER when ready to calibrate...")?;

        let window = self.capture_window;
        println!(
            "\n  {YELLOW}Calibrating... start rolling now ({} second window){RESET}",
            window.as_secs()
        );

        if let Err(e) = self.controller.start_calibration() {
            return self.report_error(e);
        }
        std::thread::sleep(window);

        match self.controller.finish_calibration() {
            Ok(outcome) => {
                println!("\n  {GREEN}Calibration complete!{RESET}");
                println!("    Scroll clicks: {}", outcome.clicks);
                println!("    Ratio: {:.2} clicks per cm", outcome.clicks_per_cm);
                println!("    1 click = {:.4} cm", outcome.cm_per_click);
                Ok(())
            }
            Err(e) => self.report_error(e),
        }
    }

    /// Measurement: capture from ENTER to ENTER, then print the distances.
    fn measure(&self) -> Result<()> {
        use colors::*;

        let snapshot = self.controller.snapshot();
        let Some(ratio) = snapshot.ratio else {
            println!("\n  {RED}Not calibrated! Run calibration first.{RESET}");
            return Ok(());
        };

        println!();
        println!("  {BOLD}MEASUREMENT{RESET}");
        println!("  {DIM}Ratio: {:.2} clicks per cm{RESET}", ratio);
        println!();
        println!("  Place the mouse on the start of what you want to");
        println!("  measure, then roll the wheel along it.");
        println!();

        prompt("Press ENTER to start measuring...")?;
        println!("\n  {YELLOW}Measuring... roll the wheel, then press ENTER to stop{RESET}");

        if let Err(e) = self.controller.start_measurement() {
            return self.report_error(e);
        }
        self.wait_for_stop()?;
        self.controller.stop_measurement();

        let snapshot = self.controller.snapshot();
        if snapshot.ticks == 0 {
            println!("\n  {YELLOW}No movement detected.{RESET}");
            return Ok(());
        }

        let report = snapshot.report;
        println!("\n  {GREEN}Measurement complete!{RESET}");
        println!("    Scroll clicks: {}", report.ticks);
        println!("    {:.2} cm", report.distance_cm);
        println!("    {:.1} mm", report.distance_mm);
        println!("    {:.3} m", report.distance_m);
        println!("    {:.2} inches", report.distance_in);
        Ok(())
    }

    /// Block until the operator presses ENTER to end the measurement.
    fn wait_for_stop(&self) -> Result<()> {
        match &self.terminal {
            Some(terminal) => {
                terminal.wait_for_enter();
                Ok(())
            }
            // Simulated source leaves the terminal in cooked mode, so a
            // plain line read works here
            None => read_line().map(|_| ()),
        }
    }

    fn report_error(&self, error: SessionError) -> Result<()> {
        use colors::*;
        match error {
            SessionError::NoScrollDetected => {
                println!("\n  {RED}No scroll detected!{RESET}");
                println!("  Make sure you rolled the scroll wheel, then try again.");
            }
            SessionError::NotCalibrated => {
                println!("\n  {RED}Not calibrated! Run calibration first.{RESET}");
            }
            SessionError::AlreadyActive => {
                println!("\n  {YELLOW}A session is already running.{RESET}");
            }
            SessionError::Source(msg) => {
                println!("\n  {RED}Scroll capture failed: {msg}{RESET}");
            }
        }
        Ok(())
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("  {}", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    read_line()
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line)
}
