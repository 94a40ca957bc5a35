pub mod component;
pub mod config;
pub mod error;
pub mod init;
pub mod menu;
pub mod session;
pub mod signal;
pub mod tools;

use anyhow::Result;
use console::{Term, style};

rust_i18n::i18n!("locales", fallback = "en-US");

pub fn pause(term: &Term) -> Result<()> {
    println!("\n{}", style("按 Enter 繼續...").dim());
    term.read_line()?;
    Ok(())
}
