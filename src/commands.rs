use crate::{emit_success, OutputMode};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Instant;
use treeshake::config::{write_config, ShakeConfig};
use treeshake::report::{status_label, GraphNodeReport, ShakeReport};
use treeshake::resolve::Resolver;
use treeshake::ui::{self, Icons, ProgressManager, Spinner};
use treeshake::{emit_graph, EmitOptions, FsStore, GraphBuilder};

pub fn run_shake(entry: &Path, config: &ShakeConfig, dry_run: bool, mode: OutputMode) -> anyhow::Result<()> {
    let started = Instant::now();
    let store = FsStore::new();

    if mode.is_human() {
        ui::header(&format!("Shaking {}", entry.display()));
        ui::status(Icons::PACKAGE, "Output directory", &config.output.dir_name);
        if dry_run {
            ui::status(Icons::INFO, "Mode", "dry run");
        }
    }

    let (progress, tx) = if mode.is_human() {
        let (manager, tx) = ProgressManager::new();
        (Some(manager), Some(tx))
    } else {
        (None, None)
    };

    let mut builder = GraphBuilder::new(&store)
        .with_resolver(Resolver::new(config.resolve.extension.clone()))
        .keep_going(config.keep_going);
    if let Some(tx) = &tx {
        builder = builder.with_progress(tx.clone());
    }
    let graph = builder.build(entry)?;
    drop(builder);

    let options = EmitOptions {
        dir_name: config.output.dir_name.clone(),
        jobs: config.jobs,
        dry_run,
        progress: tx,
    };
    let emitted = emit_graph(&graph, &store, &options);
    drop(options);

    let report = ShakeReport::new(&graph, &emitted, dry_run);

    if let Some(manager) = &progress {
        manager.finish_with_summary(
            started.elapsed(),
            report.modules.len(),
            report.removed_count(),
            report.failed_count(),
        );
    }

    if mode.is_human() {
        print_shake_report(&report);
    } else {
        emit_success(mode, "shake", serde_json::to_value(&report)?)?;
    }

    let failed = report.failed_count();
    if failed > 0 {
        anyhow::bail!("{} module(s) failed", failed);
    }
    Ok(())
}

fn print_shake_report(report: &ShakeReport) {
    ui::section(" Modules ");
    ui::line(&ui::render(&report.rows()));

    for module in &report.modules {
        if let (Some(output), Some(status)) = (&module.output, module.status) {
            let line = format!("{} ({})", output.display(), status_label(status));
            match status {
                treeshake::FileStatus::New => ui::file_new(&line),
                treeshake::FileStatus::Modified => ui::file_modified(&line),
                treeshake::FileStatus::Unchanged => ui::file_unchanged(&line),
            }
        }
        if let Some(error) = &module.error {
            ui::error(&format!("{}: {}", module.path.display(), error));
        }
    }
    for skipped in &report.skipped {
        ui::warn(&format!("skipped: {}", skipped));
    }

    ui::section(" Summary ");
    ui::line(&ui::stats_table(&[
        ("Modules", &report.modules.len().to_string()),
        ("Parsed", &report.stats.parsed.to_string()),
        ("Cache hits", &report.stats.cache_hits.to_string()),
        ("Bindings removed", &report.removed_count().to_string()),
        ("Failures", &report.failed_count().to_string()),
    ]));

    if report.failed_count() == 0 {
        ui::success(if report.dry_run { "Dry run complete" } else { "Shaking complete" });
    }
}

pub fn run_graph(entry: &Path, config: &ShakeConfig, mode: OutputMode) -> anyhow::Result<()> {
    let started = Instant::now();
    let store = FsStore::new();
    let spinner = mode.is_human().then(|| Spinner::new("Building module graph"));

    let graph = GraphBuilder::new(&store)
        .with_resolver(Resolver::new(config.resolve.extension.clone()))
        .keep_going(config.keep_going)
        .build(entry)?;
    let tree = GraphNodeReport::from_graph(&graph);

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if mode.is_human() {
        ui::header(&format!("Module graph for {}", entry.display()));
        let style = |name: &str, live: bool| {
            if live {
                ui::live(name)
            } else {
                ui::dead(name)
            }
        };
        for line in tree.lines(&style) {
            ui::line(&line);
        }
        for failure in graph.failures() {
            ui::warn(&format!("skipped: {}", failure));
        }
        ui::line("");
        ui::summary_row("Modules", &graph.len().to_string().bold().to_string());
        ui::timing(&format!("{:.2?}", started.elapsed()));
    } else {
        emit_success(mode, "graph", serde_json::to_value(&tree)?)?;
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    write_config(path, &ShakeConfig::default(), force)?;
    if !treeshake::output::is_quiet() {
        ui::success(&format!("Wrote {}", path.display()));
        ui::info("Edit", "output.dir_name, resolve.extension, jobs, keep_going");
    }
    Ok(())
}
