//! Styled one-line messages. All of them are silenced by `TREESHAKE_QUIET`.

use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

fn out(line: String) {
    if !is_quiet() {
        println!("{line}");
    }
}

fn err(line: String) {
    if !is_quiet() {
        eprintln!("{line}");
    }
}

pub fn header(text: &str) {
    out(format!("{} {}", Icons::ROCKET, text.style(theme().header.clone())));
}

pub fn status(icon: &str, label: &str, value: &str) {
    out(format!("{} {}: {}", icon, label.style(theme().dim.clone()), value));
}

pub fn success(label: &str) {
    out(format!("{} {}", Icons::CHECK, label.style(theme().success.clone())));
}

pub fn error(label: &str) {
    err(format!("{} {}", Icons::CROSS, label.style(theme().error.clone())));
}

pub fn warn(label: &str) {
    err(format!("{} {}", Icons::WARN, label.style(theme().warn.clone())));
}

pub fn info(label: &str, value: &str) {
    out(format!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    ));
}

pub fn section(title: &str) {
    out(String::new());
    out(format!("━{}━", title.style(theme().header.clone())));
}

/// A kept binding in the module tree
pub fn live(text: &str) -> String {
    text.style(theme().success.clone()).to_string()
}

/// A removed binding in the module tree, marked with `-` so it still
/// reads without color
pub fn dead(text: &str) -> String {
    format!("-{text}").style(theme().removed.clone()).to_string()
}

/// Output file written over different contents
pub fn file_modified(path: &str) {
    out(format!("{} {}", Icons::MOD.style(theme().warn.clone()), path));
}

/// Output file that did not exist before
pub fn file_new(path: &str) {
    out(format!("{} {}", Icons::NEW.style(theme().success.clone()), path));
}

pub fn file_unchanged(path: &str) {
    out(format!("  {}", path.style(theme().muted.clone())));
}

pub fn timing(elapsed: &str) {
    out(format!("{} {}", Icons::CLOCK.style(theme().dim.clone()), elapsed));
}

pub fn summary_row(label: &str, value: &str) {
    out(format!("  {} {}", label.style(theme().dim.clone()), value));
}

/// A raw line, subject to the same quiet switch
pub fn line(text: &str) {
    out(text.to_string());
}
