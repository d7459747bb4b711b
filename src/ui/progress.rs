use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, MultiProgress, ProgressBar};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

/// Drives the analyzing spinner and the emitting bar from progress
/// messages sent by the graph builder and the writer
pub struct ProgressManager {
    mp: MultiProgress,
    _handle: thread::JoinHandle<()>,
}

fn visible(pb: ProgressBar) -> ProgressBar {
    if console::Term::stdout().is_term() {
        pb
    } else {
        ProgressBar::hidden()
    }
}

impl ProgressManager {
    pub fn new() -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let mp = MultiProgress::new();
        let analyzing = visible(mp.add(ProgressBar::new_spinner().with_message("Analyzing modules")));
        let emitting = visible(mp.add(ProgressBar::new(0).with_message("Writing modules")));

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started {
                        phase: ProgressPhase::Analyzing,
                        ..
                    } => {
                        analyzing.enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::Started {
                        phase: ProgressPhase::Emitting,
                        total,
                    } => {
                        emitting.set_length(total as u64);
                    }
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Analyzing,
                        file,
                    } => {
                        analyzing.inc(1);
                        if let Some(f) = file {
                            analyzing.set_message(format!("Analyzing: {}", f));
                        }
                    }
                    ProgressMessage::Progress {
                        phase: ProgressPhase::Emitting,
                        file,
                    } => {
                        emitting.inc(1);
                        if let Some(f) = file {
                            emitting.set_message(format!("Writing: {}", f));
                        }
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Analyzing,
                    } => {
                        analyzing.finish_with_message("Done");
                    }
                    ProgressMessage::Finished {
                        phase: ProgressPhase::Emitting,
                    } => {
                        emitting.finish_with_message("Done");
                    }
                    ProgressMessage::Error(message) => {
                        emitting.println(format!("{} {}", Icons::CROSS, message));
                    }
                }
            }
        });

        (Self { mp, _handle: handle }, tx)
    }

    pub fn clear(&self) {
        self.mp.clear().ok();
    }

    pub fn finish_with_summary(&self, duration: Duration, modules: usize, removed: usize, failed: usize) {
        self.clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            modules,
            Icons::SCISSORS.style(theme().info.clone()),
            removed,
            Icons::CROSS.style(theme().info.clone()),
            failed
        );
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        if console::Term::stdout().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
