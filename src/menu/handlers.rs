use crate::component::{SceneDetector, SceneExporter};
use crate::config::Config;
use crate::pause;
use crate::session::SessionStore;
use anyhow::Result;
use console::{Term, style};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_scene_detector(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    store: &Arc<SessionStore>,
    config: &Config,
) -> Result<()> {
    let detector = SceneDetector::new(
        config.clone(),
        Arc::clone(store),
        Arc::clone(shutdown_signal),
    );

    if let Err(e) = detector.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_scene_exporter(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    store: &Arc<SessionStore>,
    config: &Config,
) -> Result<()> {
    let exporter = SceneExporter::new(
        config.clone(),
        Arc::clone(store),
        Arc::clone(shutdown_signal),
    );

    if let Err(e) = exporter.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}
