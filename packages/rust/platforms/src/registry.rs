//! Explicit platform registry and factory.
//!
//! Platforms join at build time through their `binding()` init routine;
//! the registry validates each binding's selector table before handing out
//! crawlers, and captures `today` once per run when building parsers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use rolescout_shared::{AppConfig, Result, RoleScoutError, RunRequest};

use crate::{Crawler, CrawlerConfig, Parser, PlatformDefaults};

/// One platform's registration: identifier plus the constructors for its
/// crawler/parser/config artifact triple.
pub struct PlatformBinding {
    pub identifier: &'static str,
    pub defaults: fn() -> PlatformDefaults,
    pub make_crawler: fn(CrawlerConfig) -> Box<dyn Crawler>,
    pub make_parser: fn(NaiveDate) -> Box<dyn Parser>,
}

/// Registry of platform bindings, keyed by sorted identifier.
pub struct PlatformRegistry {
    bindings: BTreeMap<&'static str, PlatformBinding>,
}

impl PlatformRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// A registry with every built-in platform registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for binding in [crate::workday::binding(), crate::greenhouse::binding()] {
            registry
                .register(binding)
                .expect("built-in platforms have unique identifiers");
        }
        registry
    }

    /// Register a platform binding. Duplicate identifiers are rejected.
    pub fn register(&mut self, binding: PlatformBinding) -> Result<()> {
        let identifier = binding.identifier;
        if self.bindings.contains_key(identifier) {
            return Err(RoleScoutError::PlatformLoad {
                platform: identifier.to_string(),
                message: "identifier already registered".into(),
            });
        }
        debug!(platform = identifier, "platform registered");
        self.bindings.insert(identifier, binding);
        Ok(())
    }

    /// Registered platform identifiers, sorted.
    pub fn supported_platforms(&self) -> Vec<String> {
        self.bindings.keys().map(|k| k.to_string()).collect()
    }

    fn binding(&self, identifier: &str) -> Result<&PlatformBinding> {
        self.bindings
            .get(identifier)
            .ok_or_else(|| RoleScoutError::UnsupportedPlatform {
                platform: identifier.to_string(),
            })
    }

    /// Build a crawler for `identifier` with the three config layers merged
    /// (general defaults → platform defaults → run overrides).
    ///
    /// The binding's selector table is probed first; a missing or
    /// unparsable selector fails the platform contract.
    pub fn create_crawler(
        &self,
        identifier: &str,
        app: &AppConfig,
        request: &RunRequest,
    ) -> Result<Box<dyn Crawler>> {
        let binding = self.binding(identifier)?;
        let defaults = (binding.defaults)();
        defaults
            .selectors
            .validate()
            .map_err(|message| RoleScoutError::contract(identifier, message))?;

        let config = CrawlerConfig::merged(app, &defaults, request);
        debug!(
            platform = identifier,
            job_detail_concurrency = config.job_detail_concurrency,
            "crawler created"
        );
        Ok((binding.make_crawler)(config))
    }

    /// Build a parser for `identifier`, capturing `today` once for the run.
    pub fn create_parser(&self, identifier: &str) -> Result<Box<dyn Parser>> {
        self.create_parser_with_today(identifier, chrono::Local::now().date_naive())
    }

    /// Build a parser with an explicit reference date (tests, replays).
    pub fn create_parser_with_today(
        &self,
        identifier: &str,
        today: NaiveDate,
    ) -> Result<Box<dyn Parser>> {
        let binding = self.binding(identifier)?;
        Ok((binding.make_parser)(today))
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SelectorTable;
    use url::Url;

    fn request() -> RunRequest {
        RunRequest {
            company_name: "Acme Capital".into(),
            target_url: Url::parse("https://acme.wd1.myworkdayjobs.com/careers").unwrap(),
            platform: "workday".into(),
            max_pages: None,
            job_detail_concurrency: None,
        }
    }

    #[test]
    fn builtin_registry_is_sorted_and_complete() {
        let registry = PlatformRegistry::builtin();
        assert_eq!(
            registry.supported_platforms(),
            vec!["greenhouse".to_string(), "workday".to_string()]
        );
    }

    #[test]
    fn unknown_platform_is_unsupported() {
        let registry = PlatformRegistry::builtin();
        let err = match registry.create_crawler("lever", &AppConfig::default(), &request()) {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(matches!(
            err,
            RoleScoutError::UnsupportedPlatform { platform } if platform == "lever"
        ));

        let err = match registry.create_parser("lever") {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(matches!(err, RoleScoutError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn duplicate_registration_is_a_load_error() {
        let mut registry = PlatformRegistry::builtin();
        let err = registry.register(crate::workday::binding()).unwrap_err();
        assert!(matches!(err, RoleScoutError::PlatformLoad { .. }));
    }

    #[test]
    fn broken_selector_table_fails_the_contract_probe() {
        fn broken_defaults() -> PlatformDefaults {
            PlatformDefaults {
                selectors: SelectorTable {
                    listing_container: String::new(),
                    listing_item: "li".into(),
                    title_link: "a".into(),
                    location_cell: "span".into(),
                    date_posted_cell: "span".into(),
                    pagination_container: "nav".into(),
                    next_button: "button".into(),
                    job_description: "div".into(),
                    job_id_display: "span".into(),
                },
                job_detail_concurrency: None,
            }
        }

        let mut registry = PlatformRegistry::new();
        registry
            .register(PlatformBinding {
                identifier: "broken",
                defaults: broken_defaults,
                make_crawler: |config| crate::workday::crawler::boxed(config),
                make_parser: |today| crate::workday::parser::boxed(today),
            })
            .unwrap();

        let err = match registry.create_crawler("broken", &AppConfig::default(), &request()) {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(matches!(err, RoleScoutError::PlatformContract { .. }));
    }

    #[test]
    fn created_crawler_carries_merged_config() {
        let registry = PlatformRegistry::builtin();
        let crawler = registry
            .create_crawler("workday", &AppConfig::default(), &request())
            .unwrap();
        assert_eq!(crawler.config().job_detail_concurrency, 8);
    }
}
