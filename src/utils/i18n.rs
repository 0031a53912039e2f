//! Response texts shown to the dashboard user.

use tracing::warn;

/// Switch the locale of all response texts
pub fn set_locale(locale: &str) {
    let available = rust_i18n::available_locales!();
    if !available.iter().any(|l| *l == locale) {
        warn!("Locale {} not available ({:?}), falling back to en", locale, available);
        rust_i18n::set_locale("en");
        return;
    }
    rust_i18n::set_locale(locale);
}

pub fn not_logged_in() -> String {
    t!("agenda.not_logged_in").to_string()
}

pub fn event_created(id: &str) -> String {
    t!("agenda.created", id = id).to_string()
}

pub fn create_failed(error: &str) -> String {
    t!("agenda.create_failed", error = error).to_string()
}

pub fn event_deleted(id: &str) -> String {
    t!("agenda.deleted", id = id).to_string()
}

pub fn delete_failed(error: &str) -> String {
    t!("agenda.delete_failed", error = error).to_string()
}

pub fn list_failed(error: &str) -> String {
    t!("agenda.list_failed", error = error).to_string()
}

pub fn login_welcome(name: &str) -> String {
    t!("login.welcome", name = name).to_string()
}

pub fn login_failed(error: &str) -> String {
    t!("login.failed", error = error).to_string()
}

pub fn login_invalid_state() -> String {
    t!("login.invalid_state").to_string()
}

pub fn csrf_rejected() -> String {
    t!("login.csrf_rejected").to_string()
}
