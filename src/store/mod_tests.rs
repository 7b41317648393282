//! Tests for the parameter store.

use super::*;

fn sample() -> ParameterStore {
    let mut store = ParameterStore::new();
    store.declare_section("mmu", Some("mmu_parameters.cfg"));
    store.set("mmu", "gear_max_velocity", "300");
    store.set("mmu", "gear_max_accel", "1500");
    store.declare_section("mmu_servo mmu_servo", Some("mmu_hardware.cfg"));
    store.set("mmu_servo mmu_servo", "pin", "mmu:MMU_SERVO");
    store.set("mmu_servo mmu_servo", "maximum_servo_angle", "180");
    store
}

mod basic_operations {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut store = ParameterStore::new();
        store.set("mmu", "log_level", "1");
        assert_eq!(store.get("mmu", "log_level"), Some("1"));
        assert!(store.has("mmu", "log_level"));
    }

    #[test]
    fn lookups_are_exact() {
        let store = sample();
        assert!(!store.has("mmu ", "gear_max_velocity"));
        assert!(!store.has("mmu", "gear_max"));
        assert_eq!(store.get("MMU", "gear_max_velocity"), None);
    }

    #[test]
    fn set_overwrites_single_value() {
        let mut store = sample();
        store.set("mmu", "gear_max_velocity", "350");
        assert_eq!(store.get("mmu", "gear_max_velocity"), Some("350"));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn remove_returns_value_and_keeps_section() {
        let mut store = sample();
        assert_eq!(store.remove("mmu", "gear_max_accel"), Some("1500".to_string()));
        assert_eq!(store.remove("mmu", "gear_max_accel"), None);
        assert!(store.has_section("mmu"));
        assert_eq!(store.origin_of("mmu"), Some("mmu_parameters.cfg"));
    }

    #[test]
    fn remove_missing_is_none() {
        let mut store = ParameterStore::new();
        assert_eq!(store.remove("nope", "nothing"), None);
    }

    #[test]
    fn len_and_is_empty() {
        let mut store = ParameterStore::new();
        assert!(store.is_empty());
        store.declare_section("mmu", None);
        assert!(store.is_empty());
        store.set("mmu", "a", "1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn iter_is_sorted() {
        let store = sample();
        let keys: Vec<_> = store.iter().map(|(s, k, _)| (s, k)).collect();
        assert_eq!(
            keys,
            vec![
                ("mmu", "gear_max_accel"),
                ("mmu", "gear_max_velocity"),
                ("mmu_servo mmu_servo", "maximum_servo_angle"),
                ("mmu_servo mmu_servo", "pin"),
            ]
        );
    }
}

mod keys_for_section {
    use super::*;

    #[test]
    fn matches_by_prefix() {
        let mut store = ParameterStore::new();
        store.set("output_pin _mmu_dc_espooler_rwd_0", "pin", "a");
        store.set("output_pin _mmu_dc_espooler_rwd_1", "pin", "b");
        store.set("output_pin _mmu_dc_espooler_en_0", "pwm", "c");

        let keys: Vec<_> = store
            .keys_for_section("output_pin _mmu_dc_espooler_rwd_")
            .collect();
        assert_eq!(keys, vec!["pin", "pin"]);
    }

    #[test]
    fn is_restartable() {
        let store = sample();
        let first: Vec<_> = store.keys_for_section("mmu").collect();
        let second: Vec<_> = store.keys_for_section("mmu").collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn empty_for_unknown_prefix() {
        let store = sample();
        assert_eq!(store.keys_for_section("gcode_macro").count(), 0);
    }
}

mod renames {
    use super::*;

    #[test]
    fn rename_key_preserves_value_and_others() {
        let mut store = sample();
        store.rename_key("mmu", "gear_max_velocity", "gear_max_speed");

        assert_eq!(store.get("mmu", "gear_max_speed"), Some("300"));
        assert!(!store.has("mmu", "gear_max_velocity"));
        assert_eq!(store.get("mmu", "gear_max_accel"), Some("1500"));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn rename_missing_key_is_noop() {
        let mut store = sample();
        let before = store.clone();
        store.rename_key("mmu", "does_not_exist", "other");
        store.rename_key("no_section", "a", "b");
        assert_eq!(store, before);
    }

    #[test]
    fn rename_section_moves_all_keys_and_origin() {
        let mut store = sample();
        store.rename_section("mmu_servo mmu_servo", "mmu_servo selector_servo");

        assert!(!store.has_section("mmu_servo mmu_servo"));
        assert_eq!(store.get("mmu_servo selector_servo", "pin"), Some("mmu:MMU_SERVO"));
        assert_eq!(
            store.get("mmu_servo selector_servo", "maximum_servo_angle"),
            Some("180")
        );
        assert_eq!(
            store.origin_of("mmu_servo selector_servo"),
            Some("mmu_hardware.cfg")
        );
        assert_eq!(store.get("mmu", "gear_max_velocity"), Some("300"));
    }

    #[test]
    fn rename_section_merges_into_existing() {
        let mut store = sample();
        store.declare_section("mmu_machine", Some("mmu_hardware.cfg"));
        store.set("mmu_machine", "gear_max_accel", "1");
        store.set("mmu_machine", "num_gates", "8");

        store.rename_section("mmu", "mmu_machine");

        assert_eq!(store.get("mmu_machine", "gear_max_accel"), Some("1500"));
        assert_eq!(store.get("mmu_machine", "num_gates"), Some("8"));
        assert_eq!(store.origin_of("mmu_machine"), Some("mmu_hardware.cfg"));
    }

    #[test]
    fn rename_missing_section_is_noop() {
        let mut store = sample();
        let before = store.clone();
        store.rename_section("absent", "other");
        assert_eq!(store, before);
    }
}

mod copy_and_move {
    use super::*;

    #[test]
    fn copy_keeps_source() {
        let mut store = sample();
        store.copy("mmu", "gear_max_accel", "mmu", "selector_max_accel");
        assert_eq!(store.get("mmu", "gear_max_accel"), Some("1500"));
        assert_eq!(store.get("mmu", "selector_max_accel"), Some("1500"));
    }

    #[test]
    fn copy_into_new_section_adopts_origin() {
        let mut store = sample();
        store.copy("mmu", "gear_max_accel", "mmu_machine", "gear_max_accel");
        assert_eq!(store.origin_of("mmu_machine"), Some("mmu_parameters.cfg"));
    }

    #[test]
    fn move_removes_source() {
        let mut store = sample();
        store.move_key("mmu", "gear_max_velocity", "mmu_machine", "gear_velocity");
        assert!(!store.has("mmu", "gear_max_velocity"));
        assert_eq!(store.get("mmu_machine", "gear_velocity"), Some("300"));
    }

    #[test]
    fn move_within_section_renames() {
        let mut store = sample();
        store.move_key("mmu", "gear_max_velocity", "mmu", "speed");
        assert_eq!(store.get("mmu", "speed"), Some("300"));
        assert!(!store.has("mmu", "gear_max_velocity"));
    }

    #[test]
    fn copy_and_move_missing_are_noops() {
        let mut store = sample();
        let before = store.clone();
        store.copy("mmu", "absent", "mmu_machine", "x");
        store.move_key("mmu", "absent", "mmu_machine", "x");
        assert_eq!(store, before);
        assert!(!store.has_section("mmu_machine"));
    }
}

mod origins {
    use super::*;

    #[test]
    fn first_declaration_wins() {
        let mut store = ParameterStore::new();
        store.declare_section("mmu", Some("a.cfg"));
        store.declare_section("mmu", Some("b.cfg"));
        assert_eq!(store.origin_of("mmu"), Some("a.cfg"));
    }

    #[test]
    fn set_creates_section_without_origin() {
        let mut store = ParameterStore::new();
        store.set("new", "k", "v");
        assert!(store.has_section("new"));
        assert_eq!(store.origin_of("new"), None);
    }

    #[test]
    fn sections_lists_declared_names() {
        let store = sample();
        let names: Vec<_> = store.sections().collect();
        assert_eq!(names, vec!["mmu", "mmu_servo mmu_servo"]);
    }
}
