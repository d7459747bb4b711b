pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dead, error, file_modified, file_new, file_unchanged, header, info, line, live, section, status,
    success, summary_row, timing, warn,
};
pub use progress::{ProgressManager, Spinner};
pub use progress_message::{ProgressMessage, ProgressPhase};
pub use table::{render, stats_table, TableBuilder};
pub use theme::{theme, Theme};
