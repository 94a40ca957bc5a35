use crate::config::save::save_settings;
use crate::config::types::{Config, Language};
use crate::menu::handlers::{run_scene_detector, run_scene_exporter};
use crate::session::SessionStore;
use anyhow::Result;
use console::{Term, style};
use dialoguer::{Input, Select};
use dialoguer::theme::ColorfulTheme;
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
    store: &Arc<SessionStore>,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_detect"),
        t!("main_menu.opt_export"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_scene_detector(term, shutdown_signal, store, config)?;
            Ok(true)
        }
        Some(1) => {
            run_scene_exporter(term, shutdown_signal, store, config)?;
            Ok(true)
        }
        Some(2) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(3) => Ok(false),
        None => Ok(false), // ESC pressed - exit
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let options = vec![
            t!("settings.opt_threshold"),
            t!("settings.opt_scale_width"),
            t!("settings.opt_offset"),
            t!("settings.opt_language"),
            t!("settings.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => edit_threshold(config)?,
            Some(1) => edit_scale_width(config)?,
            Some(2) => edit_thumbnail_offset(config)?,
            Some(3) => show_language_menu(term, config)?,
            Some(4) | None => break, // ESC or back
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// 偵測閾值設定
fn edit_threshold(config: &mut Config) -> Result<()> {
    let threshold: f64 = Input::new()
        .with_prompt(t!("settings.threshold.prompt").to_string())
        .default(config.settings.detection.threshold)
        .validate_with(|value: &f64| {
            if *value > 0.0 && *value <= 255.0 {
                Ok(())
            } else {
                Err(t!("settings.threshold.invalid").to_string())
            }
        })
        .interact_text()?;

    if (threshold - config.settings.detection.threshold).abs() > f64::EPSILON {
        config.settings.detection.threshold = threshold;
        save_settings(&config.settings)?;
        println!("\n{} {}", style(t!("settings.saved")).green(), threshold);
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    Ok(())
}

/// 分析縮小寬度設定
fn edit_scale_width(config: &mut Config) -> Result<()> {
    let scale_width: u32 = Input::new()
        .with_prompt(t!("settings.scale_width.prompt").to_string())
        .default(config.settings.detection.scale_width)
        .validate_with(|value: &u32| {
            if *value >= 32 {
                Ok(())
            } else {
                Err(t!("settings.scale_width.invalid").to_string())
            }
        })
        .interact_text()?;

    if scale_width != config.settings.detection.scale_width {
        config.settings.detection.scale_width = scale_width;
        save_settings(&config.settings)?;
        println!("\n{} {}", style(t!("settings.saved")).green(), scale_width);
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    Ok(())
}

/// 縮圖位移設定
fn edit_thumbnail_offset(config: &mut Config) -> Result<()> {
    let offset: f64 = Input::new()
        .with_prompt(t!("settings.offset.prompt").to_string())
        .default(config.settings.thumbnail.offset_seconds)
        .validate_with(|value: &f64| {
            if *value >= 0.0 && *value <= 5.0 {
                Ok(())
            } else {
                Err(t!("settings.offset.invalid").to_string())
            }
        })
        .interact_text()?;

    if (offset - config.settings.thumbnail.offset_seconds).abs() > f64::EPSILON {
        config.settings.thumbnail.offset_seconds = offset;
        save_settings(&config.settings)?;
        println!("\n{} {}", style(t!("settings.saved")).green(), offset);
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    Ok(())
}

/// 語言設定選單
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.language.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let languages = [Language::EnUs, Language::ZhTw];

    let items: Vec<String> = languages.iter().map(|l: &Language| l.to_string()).collect();

    let default_index = languages
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    // ESC pressed - return without saving
    let Some(selection) = selection else {
        return Ok(());
    };

    let selected_lang = languages[selection];

    if selected_lang != config.settings.language {
        config.settings.language = selected_lang;
        rust_i18n::set_locale(selected_lang.as_str());
        save_settings(&config.settings)?;
        println!(
            "\n{} {}",
            style(t!("settings.saved")).green(),
            selected_lang
        );
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    Ok(())
}
