//! Shared helpers and constants.

use chrono::Utc;

pub const APP_NAME: &str = "synergy_portal";

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339()
}

pub fn print_banner() {
    println!("Math and Language Synergy portal ({APP_NAME})");
}
