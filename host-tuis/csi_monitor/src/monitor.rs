//! Live view of a device's CSI stream.
//!
//! A reader thread feeds console lines into [`MonitorState`]; the UI thread
//! recomputes the analysis of the rolling window lazily, only when new frames
//! arrived since the last draw.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::capture::CsiCapture;
use crate::dsp;
use crate::presence::{self, AnalysisError, Assessment, Features, Thresholds};
use crate::serial::{self, LineEvent};
use crate::ui;

/// Messages kept in the event log.
const MAX_MESSAGES: usize = 100;

/// Frames a baseline needs, unless the window itself is shorter.
pub const MIN_BASELINE_FRAMES: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub window: usize,
    pub sigma: f64,
    pub thresholds: Thresholds,
}

/// Analysis of the current window.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub frames: usize,
    pub subcarriers: usize,
    pub features: Features,
    pub assessment: Option<Assessment>,
    pub energy: Vec<f64>,
    pub motion_path: Vec<f64>,
}

pub struct MonitorState {
    pub port_name: String,
    pub settings: MonitorSettings,
    pub messages: Vec<String>,
    pub frames_seen: u64,
    pub malformed: u64,
    pub baseline: Option<Features>,
    window: VecDeque<Vec<i32>>,
    snapshot: Option<Snapshot>,
    dirty: bool,
}

impl MonitorState {
    pub fn new(port_name: impl Into<String>, settings: MonitorSettings) -> Self {
        Self {
            port_name: port_name.into(),
            settings,
            messages: Vec::new(),
            frames_seen: 0,
            malformed: 0,
            baseline: None,
            window: VecDeque::with_capacity(settings.window),
            snapshot: None,
            dirty: false,
        }
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }

    /// Feeds one console line: frames go to the window, anything else to the
    /// event log.
    pub fn ingest_line(&mut self, line: &str) {
        match csi_line::parse_line(line) {
            Some(Ok(samples)) => {
                if self.window.len() == self.settings.window {
                    self.window.pop_front();
                }
                self.window.push_back(samples);
                self.frames_seen += 1;
                self.dirty = true;
            }
            Some(Err(err)) => {
                self.malformed += 1;
                self.push_message(format!("Malformed CSI line: {err}"));
            }
            None => self.push_message(line),
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    fn window_capture(&mut self) -> Option<CsiCapture> {
        CsiCapture::from_rows(self.window.make_contiguous())
    }

    /// Current analysis, recomputed if frames arrived since the last call.
    pub fn snapshot(&mut self) -> Option<&Snapshot> {
        if self.dirty {
            self.dirty = false;
            self.snapshot = self.window_capture().map(|capture| {
                let sigma = self.settings.sigma;
                let features = Features::extract(&capture, sigma);
                Snapshot {
                    frames: capture.frames(),
                    subcarriers: capture.width(),
                    features,
                    assessment: self
                        .baseline
                        .as_ref()
                        .map(|baseline| presence::classify(&features, baseline, &self.settings.thresholds)),
                    energy: dsp::energy_series(&capture),
                    motion_path: dsp::motion_path(&capture, sigma),
                }
            });
        }
        self.snapshot.as_ref()
    }

    pub fn set_baseline(&mut self, baseline: Features) {
        self.baseline = Some(baseline);
        self.dirty = true;
    }

    /// Frames required before [`Self::capture_baseline`] succeeds.
    pub fn baseline_frames(&self) -> usize {
        MIN_BASELINE_FRAMES.min(self.settings.window)
    }

    /// Uses the current window as the empty-room reference.
    pub fn capture_baseline(&mut self) -> Result<Features, AnalysisError> {
        let needed = self.baseline_frames();
        let got = self.window.len();
        if got < needed {
            return Err(AnalysisError::TooFewFrames { needed, got });
        }
        let capture = self
            .window_capture()
            .ok_or(AnalysisError::TooFewFrames { needed, got: 0 })?;
        let baseline = Features::extract(&capture, self.settings.sigma);
        self.set_baseline(baseline);
        Ok(baseline)
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
        self.dirty = true;
    }
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_serial_port(port_name: &str, baud: u32, state: Arc<Mutex<MonitorState>>) {
    let mut port = match serial::open(port_name, baud) {
        Ok(port) => port,
        Err(err) => {
            lock(&state).push_message(format!("Serial port error: {err}"));
            return;
        }
    };

    let result = serial::read_lines(&mut *port, |event| {
        if let LineEvent::Line(line) = event {
            lock(&state).ingest_line(line);
        }
        ControlFlow::Continue(())
    });

    let message = match result {
        Ok(()) => "Serial port closed".to_string(),
        Err(err) => format!("Serial port error: {err}"),
    };
    lock(&state).push_message(message);
}

pub fn run(port_name: String, baud: u32, state: MonitorState) -> color_eyre::Result<()> {
    let state = Arc::new(Mutex::new(state));

    let reader_state = Arc::clone(&state);
    thread::spawn(move || read_serial_port(&port_name, baud, reader_state));

    ratatui::run(|terminal| app(terminal, &state))?;
    Ok(())
}

fn app(terminal: &mut DefaultTerminal, state: &Arc<Mutex<MonitorState>>) -> std::io::Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, &mut lock(state)))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                    KeyCode::Char('b') => {
                        let mut state = lock(state);
                        match state.capture_baseline() {
                            Ok(baseline) => state.push_message(format!(
                                "Baseline set: motion variance {:.3}",
                                baseline.motion_variance
                            )),
                            Err(err) => state.push_message(format!("Baseline not set: {err}")),
                        }
                    }
                    KeyCode::Char('c') => {
                        let mut state = lock(state);
                        state.clear_baseline();
                        state.push_message("Baseline cleared");
                    }
                    _ => {}
                }
            }
        }
    }
}
