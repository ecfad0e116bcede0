use std::{collections::HashMap, fs};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub request_timeout_secs: Option<u64>,
    pub max_sessions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000/api".into(),
            request_timeout_secs: None,
            max_sessions: 1024,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("admin.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("backend_url") {
                settings.backend_url = v.clone();
            }
            if let Some(v) = file_cfg.get("request_timeout_secs") {
                settings.request_timeout_secs = parse_positive(v);
            }
            if let Some(v) = file_cfg.get("max_sessions") {
                if let Some(parsed) = parse_positive(v) {
                    settings.max_sessions = parsed as usize;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("ADMIN__BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Ok(v) = std::env::var("ADMIN__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_positive(&v);
    }
    if let Ok(v) = std::env::var("ADMIN__MAX_SESSIONS") {
        if let Some(parsed) = parse_positive(&v) {
            settings.max_sessions = parsed as usize;
        }
    }

    settings
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_service() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, "http://127.0.0.1:5000/api");
        assert!(settings.request_timeout_secs.is_none());
        assert_eq!(settings.max_sessions, 1024);
    }

    #[test]
    fn rejects_zero_and_garbage_numeric_overrides() {
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("not-a-number"), None);
        assert_eq!(parse_positive(" 90 "), Some(90));
    }
}
