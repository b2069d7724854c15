use std::{fmt::Display, fmt::Write, time::Instant};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressState, ProgressStyle};

pub fn eta_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);

    if let Ok(template) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] [{per_sec}] [{pos:.cyan}/{len:.blue}] ({eta_precise})") {
        pb.set_style(
            template
                .with_key("per_sec", |state: &ProgressState, w: &mut dyn Write| {
                    let _ = write!(w, "{:.1}/s", state.per_sec());
                })
                .progress_chars("█▒░"),
        );
    }

    pb
}

/// Numbered phases of a run, each with an optional progress bar drawn
/// through the shared [`MultiProgress`] so log lines do not tear it.
pub struct Progress {
    multi: MultiProgress,
    total_steps: usize,
    current_step: usize,
    started: Option<(Instant, Option<ProgressBar>)>,
}

impl Progress {
    pub fn new(multi: MultiProgress, total_steps: usize) -> Self {
        Progress {
            multi,
            total_steps,
            current_step: 0,
            started: None,
        }
    }

    fn header<T: Display>(&mut self, message: T) {
        self.current_step += 1;
        let step = style(format!("[{}/{}]", self.current_step, self.total_steps))
            .bold()
            .dim();
        self.multi.suspend(|| println!("{} {}", step, message));
    }

    /// Starts a step without a progress bar.
    pub fn step<T: Display>(&mut self, message: T) {
        self.header(message);
        self.started = Some((Instant::now(), None));
    }

    /// Starts a step of `len` ticks and returns its bar.
    pub fn step_sized<T: Display>(&mut self, len: usize, message: T) -> ProgressBar {
        self.header(message);
        let pb = self.multi.add(eta_bar(len));
        self.started = Some((Instant::now(), Some(pb.clone())));
        pb
    }

    /// Finishes the current step, printing its duration before `message`.
    pub fn finish<T: Display>(&mut self, message: T) {
        let Some((start, pb)) = self.started.take() else {
            return;
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
            self.multi.remove(&pb);
        }
        let elapsed = style(start.elapsed()).bold().dim().yellow();
        self.multi.suspend(|| println!("{:?} {}", elapsed, message));
    }
}
