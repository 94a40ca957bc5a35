use anyhow::Result;
use console::{Term, style};
use log::{info, warn};
use rust_i18n::t;
use scene_split::config::types::Config;
use scene_split::init;
use scene_split::menu::show_main_menu;
use scene_split::session::SessionStore;
use scene_split::signal::setup_shutdown_signal;
use std::sync::Arc;

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en-US");

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal();

    // Load config and set locale
    let mut config = Config::new()?;
    rust_i18n::set_locale(config.settings.language.as_str());

    // 所有已偵測的影片工作階段都掛在同一個儲存底下
    let store = Arc::new(SessionStore::new());

    loop {
        // We pass the config to show_main_menu so it can update settings
        match show_main_menu(&term, &shutdown_signal, &mut config, &store) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style(t!("main_menu.goodbye")).green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style(t!("main_menu.error_prefix")).red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
