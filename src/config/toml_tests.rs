//! Tests for TOML manifest parsing.

use super::toml::{TomlConfig, default_config_template};
use crate::render::{DocumentKind, Features};

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_manifest() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.build.version.is_none());
        assert!(config.tokens.is_empty());
        assert!(config.targets.is_empty());
        assert!(!config.build.skip_retain);
    }

    #[test]
    fn parse_build_section() {
        let toml = r#"
            [build]
            version = "3.20"
            template_dir = "config/base"
            output_dir = "~/printer_data/config/mmu"
            jobs = 2
            skip_retain = true
            gates_token = "gate_count"
        "#;

        let build = TomlConfig::parse(toml).unwrap().build;
        assert_eq!(build.version.as_deref(), Some("3.20"));
        assert_eq!(build.template_dir.as_deref(), Some("config/base"));
        assert_eq!(build.output_dir.as_deref(), Some("~/printer_data/config/mmu"));
        assert!(build.previous_dir.is_none());
        assert_eq!(build.jobs, Some(2));
        assert!(build.skip_retain);
        assert_eq!(build.gates_token.as_deref(), Some("gate_count"));
    }

    #[test]
    fn parse_params_and_upgrade() {
        let toml = r#"
            [upgrade]
            version_section = "machine"
            version_key = "schema"

            [params]
            prefixes = ["servo_", "variable_"]
            patterns = ['^sync_\w+$']
            parameters_section = "mmu"
            supplemental = ["gear_buzz_accel"]
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        assert_eq!(config.upgrade.version_section.as_deref(), Some("machine"));
        assert_eq!(config.upgrade.version_key.as_deref(), Some("schema"));
        assert_eq!(config.params.prefixes, ["servo_", "variable_"]);
        assert_eq!(config.params.patterns, [r"^sync_\w+$"]);
        assert_eq!(
            config.params.supplemental.as_deref(),
            Some(&["gear_buzz_accel".to_string()][..])
        );
    }

    #[test]
    fn parse_mixed_token_types() {
        let toml = r#"
            [tokens]
            num_gates = 8
            mmu_vendor = "ERCF"
            has_bypass = true
        "#;

        let tokens = TomlConfig::parse(toml).unwrap().tokens;
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens["num_gates"].as_integer(), Some(8));
        assert_eq!(tokens["mmu_vendor"].as_str(), Some("ERCF"));
        assert_eq!(tokens["has_bypass"].as_bool(), Some(true));
    }

    #[test]
    fn parse_targets() {
        let toml = r#"
            [[target]]
            template = "mmu_hardware.cfg"
            kind = "hardware"

            [[target]]
            name = "espooler"
            template = "addons/mmu_espooler.cfg"
            output = "mmu_espooler.cfg"
            previous = "old/mmu_espooler.cfg"
            kind = "espooler"

            [[target]]
            template = "client_macros.cfg"
        "#;

        let targets = TomlConfig::parse(toml).unwrap().targets;
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].kind, DocumentKind::Hardware);
        assert!(targets[0].name.is_none());
        assert_eq!(targets[1].name.as_deref(), Some("espooler"));
        assert_eq!(targets[1].previous.as_deref(), Some("old/mmu_espooler.cfg"));
        assert_eq!(targets[2].kind, DocumentKind::Plain);
    }
}

mod features {
    use super::*;

    #[test]
    fn unset_switches_keep_defaults() {
        let toml = r"
            [features]
            encoder = false
            leds = true
        ";

        let features = TomlConfig::parse(toml)
            .unwrap()
            .features
            .apply(Features::default());

        assert!(!features.encoder);
        assert!(features.leds);
        assert!(features.selector_servo);
        assert!(!features.blobifier);
    }

    #[test]
    fn empty_section_is_identity() {
        let config = TomlConfig::parse("").unwrap();
        assert_eq!(config.features.apply(Features::default()), Features::default());
    }
}

mod errors {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn unknown_section_is_rejected() {
        let result = TomlConfig::parse("[printer]\nkinematics = \"corexy\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = TomlConfig::parse("[build]\nversoin = \"3.20\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = TomlConfig::parse("[[target]]\ntemplate = \"a.cfg\"\nkind = \"printer\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = TomlConfig::parse("[build]\njobs = \"four\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let result = TomlConfig::load(std::path::Path::new("/nonexistent/mmu-cfg.toml"));
        match result {
            Err(ConfigError::FileRead { path, .. }) => {
                assert!(path.ends_with("mmu-cfg.toml"));
            }
            other => panic!("expected FileRead, got {other:?}"),
        }
    }
}

mod template {
    use super::*;

    #[test]
    fn default_template_parses() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert_eq!(config.build.version.as_deref(), Some("3.20"));
        assert_eq!(config.targets.len(), 3);
        assert_eq!(config.targets[0].kind, DocumentKind::Parameters);
        assert_eq!(config.tokens["num_gates"].as_integer(), Some(4));
    }
}
