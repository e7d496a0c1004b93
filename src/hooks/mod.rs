//! Optional behaviours the responder loop consults at fixed points.
//!
//! Every hook is disabled unless configured under `[extensions]`, in which case
//! the loop behaves exactly like the bare poll/generate/send cycle.

pub mod activity;
pub mod cache;
pub mod command;
pub mod typing;

use chrono::NaiveDateTime;
use rand::Rng;
use std::time::Duration;
use tracing::info;

use crate::config::ExtensionsConfig;
use crate::filter::redact_sensitive;
use crate::platform::Message;
use activity::ActivityPatterns;
use cache::MessageIdCache;

/// Decision taken for an eligible message before a reply is generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    Respond { delay: Option<Duration> },
    Skip(&'static str),
}

#[derive(Debug, Clone)]
pub struct Hooks {
    activity: Option<ActivityPatterns>,
    response_probability: f64,
    command_prefix: Option<String>,
    seen: Option<MessageIdCache>,
    sensitive_words: Vec<String>,
    typing_simulation: bool,
}

impl Default for Hooks {
    fn default() -> Self {
        Self::from_config(&ExtensionsConfig::default())
    }
}

impl Hooks {
    pub fn from_config(config: &ExtensionsConfig) -> Self {
        let hooks = Self {
            activity: config.activity.clone(),
            response_probability: config.response_probability,
            command_prefix: config
                .command_prefix
                .clone()
                .filter(|prefix| !prefix.is_empty()),
            seen: config.id_cache_capacity.map(MessageIdCache::new),
            sensitive_words: config
                .sensitive_words
                .iter()
                .filter(|w| !w.is_empty())
                .cloned()
                .collect(),
            typing_simulation: config.typing_simulation,
        };
        hooks.log_enabled();
        hooks
    }

    fn log_enabled(&self) {
        if self.activity.is_some() {
            info!("Extension enabled: activity windows");
        }
        if self.response_probability < 1.0 {
            info!(
                "Extension enabled: response probability {}",
                self.response_probability
            );
        }
        if let Some(prefix) = &self.command_prefix {
            info!("Extension enabled: ignore commands starting with '{}'", prefix);
        }
        if self.seen.is_some() {
            info!("Extension enabled: processed-id cache");
        }
        if !self.sensitive_words.is_empty() {
            info!(
                "Extension enabled: redacting {} sensitive word(s)",
                self.sensitive_words.len()
            );
        }
        if self.typing_simulation {
            info!("Extension enabled: typing simulation");
        }
    }

    /// Records `id` and reports whether it had been handled before.
    /// Always false when the cache is disabled.
    pub fn already_seen(&mut self, id: &str) -> bool {
        match self.seen.as_mut() {
            Some(cache) => !cache.insert(id),
            None => false,
        }
    }

    pub fn gate<R: Rng + ?Sized>(
        &self,
        message: &Message,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Gate {
        if let Some(prefix) = &self.command_prefix {
            let (command, _args) = command::extract_command(&message.content, prefix);
            if command.is_some() {
                return Gate::Skip("command message");
            }
        }

        if let Some(activity) = &self.activity {
            if !activity.is_active(now) {
                return Gate::Skip("outside active hours");
            }
        }

        if self.response_probability < 1.0 && rng.gen::<f64>() >= self.response_probability {
            return Gate::Skip("response probability");
        }

        let delay = self
            .activity
            .as_ref()
            .map(|activity| activity.response_delay(now, rng));
        Gate::Respond { delay }
    }

    pub fn redact(&self, text: &str) -> String {
        if self.sensitive_words.is_empty() {
            return text.to_string();
        }
        redact_sensitive(text, &self.sensitive_words)
    }

    pub fn typing_delay<R: Rng + ?Sized>(&self, chars: usize, rng: &mut R) -> Option<Duration> {
        self.typing_simulation
            .then(|| typing::typing_delay(chars, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Author;
    use super::activity::DayPattern;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn message(content: &str) -> Message {
        Message {
            id: "1".to_string(),
            content: content.to_string(),
            author: Author {
                id: "U1".to_string(),
                username: "alice".to_string(),
            },
        }
    }

    fn monday(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_disabled_hooks_always_respond() {
        let hooks = Hooks::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            hooks.gate(&message("!help"), monday(3), &mut rng),
            Gate::Respond { delay: None }
        );
        assert_eq!(hooks.redact("secret stuff"), "secret stuff");
        assert_eq!(hooks.typing_delay(100, &mut rng), None);
    }

    #[test]
    fn test_disabled_cache_never_reports_seen() {
        let mut hooks = Hooks::default();
        assert!(!hooks.already_seen("1"));
        assert!(!hooks.already_seen("1"));
    }

    #[test]
    fn test_cache_reports_repeat() {
        let mut hooks = Hooks::from_config(&ExtensionsConfig {
            id_cache_capacity: Some(10),
            ..Default::default()
        });
        assert!(!hooks.already_seen("1"));
        assert!(!hooks.already_seen("2"));
        assert!(hooks.already_seen("1"));
    }

    #[test]
    fn test_commands_are_skipped() {
        let hooks = Hooks::from_config(&ExtensionsConfig {
            command_prefix: Some("!".to_string()),
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            hooks.gate(&message("!roll 2d6"), monday(12), &mut rng),
            Gate::Skip("command message")
        );
        assert_eq!(
            hooks.gate(&message("what's up"), monday(12), &mut rng),
            Gate::Respond { delay: None }
        );
    }

    #[test]
    fn test_empty_prefix_is_ignored() {
        let hooks = Hooks::from_config(&ExtensionsConfig {
            command_prefix: Some(String::new()),
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            hooks.gate(&message("anything"), monday(12), &mut rng),
            Gate::Respond { delay: None }
        );
    }

    #[test]
    fn test_activity_window_gates_and_delays() {
        let hooks = Hooks::from_config(&ExtensionsConfig {
            activity: Some(ActivityPatterns {
                weekday: DayPattern {
                    active_hours: vec![(9, 17)],
                    response_delay: (2.0, 4.0),
                },
                weekend: DayPattern::default(),
            }),
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            hooks.gate(&message("hi"), monday(20), &mut rng),
            Gate::Skip("outside active hours")
        );
        match hooks.gate(&message("hi"), monday(10), &mut rng) {
            Gate::Respond { delay: Some(d) } => {
                assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(4))
            }
            other => panic!("unexpected gate: {other:?}"),
        }
    }

    #[test]
    fn test_zero_probability_never_responds() {
        let hooks = Hooks::from_config(&ExtensionsConfig {
            response_probability: 0.0,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(
                hooks.gate(&message("hi"), monday(12), &mut rng),
                Gate::Skip("response probability")
            );
        }
    }

    #[test]
    fn test_redaction_and_typing_enabled() {
        let hooks = Hooks::from_config(&ExtensionsConfig {
            sensitive_words: vec!["secret".to_string(), String::new()],
            typing_simulation: true,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(hooks.redact("a secret plan"), "a ****** plan");
        let delay = hooks.typing_delay(10, &mut rng).unwrap();
        assert!(delay >= Duration::from_secs_f64(1.5));
    }
}
