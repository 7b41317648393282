//! Tests for the built-in upgrade chain.

use super::{UpgradeRegistry, Version};
use crate::store::ParameterStore;

const SEQ: &str = "gcode_macro _MMU_SEQUENCE_VARS";

fn upgrade(store: &mut ParameterStore, from: &str, to: &str) {
    store.set("mmu", "happy_hare_version", from);
    UpgradeRegistry::builtin()
        .unwrap()
        .resolve(store, to.parse::<Version>().unwrap())
        .unwrap();
}

mod v2_71 {
    use super::*;

    #[test]
    fn park_xy_splits_into_toolchange_and_pause() {
        let mut store = ParameterStore::new();
        store.set(SEQ, "variable_park_xy", "50, 50");
        store.set("mmu", "z_hop_height_toolchange", "2");
        upgrade(&mut store, "2.70", "2.71");

        assert_eq!(store.get(SEQ, "variable_park_toolchange"), Some("50, 50, 2, 0, 2"));
        assert_eq!(store.get(SEQ, "variable_park_pause"), Some("50, 50, 5, 0, 2"));
        assert!(!store.has(SEQ, "variable_park_xy"));
        assert!(!store.has("mmu", "z_hop_height_toolchange"));
    }

    #[test]
    fn enable_park_maps_to_printing_list() {
        for (enable, runout, expected) in [
            ("True", None, "'toolchange,load,unload,pause,cancel'"),
            ("False", Some("1"), "'toolchange,load,unload,runout,pause,cancel'"),
            ("0", Some("no"), "'pause,cancel'"),
            ("0", None, "'pause,cancel'"),
        ] {
            let mut store = ParameterStore::new();
            store.set(SEQ, "variable_enable_park", enable);
            if let Some(runout) = runout {
                store.set(SEQ, "variable_enable_park_runout", runout);
            }
            upgrade(&mut store, "2.70", "2.71");

            assert_eq!(store.get(SEQ, "variable_enable_park_printing"), Some(expected));
            assert!(!store.has(SEQ, "variable_enable_park"));
            assert!(!store.has(SEQ, "variable_enable_park_runout"));
        }
    }

    #[test]
    fn renames_cut_tip_and_lift_speed() {
        let mut store = ParameterStore::new();
        store.set("gcode_macro _MMU_CUT_TIP_VARS", "variable_pin_park_x_dist", "5");
        store.set(SEQ, "variable_lift_speed", "15");
        upgrade(&mut store, "2.70", "2.71");

        assert_eq!(
            store.get("gcode_macro _MMU_CUT_TIP_VARS", "variable_pin_park_dist"),
            Some("5")
        );
        assert_eq!(store.get(SEQ, "variable_park_lift_speed"), Some("15"));
    }
}

#[test]
fn residual_filament_takes_ooze_reduction() {
    let mut store = ParameterStore::new();
    store.set("mmu", "toolhead_residual_filament", "0");
    store.set("mmu", "toolhead_ooze_reduction", "2");
    upgrade(&mut store, "2.71", "2.72");

    assert_eq!(store.get("mmu", "toolhead_residual_filament"), Some("2"));
    assert_eq!(store.get("mmu", "toolhead_ooze_reduction"), Some("0"));
}

#[test]
fn blobifier_iterations_become_totals() {
    let section = "gcode_macro BLOBIFIER";
    let mut store = ParameterStore::new();
    store.set(section, "variable_max_iterations_per_blob", "4");
    store.set(section, "variable_iteration_z_raise", "2.5");
    store.set(section, "variable_iteration_z_change", "0.5");
    store.set(section, "variable_max_iteration_length", "15");
    upgrade(&mut store, "2.72", "2.73");

    // 2.5 * 4 - 6 * 0.5
    assert_eq!(store.get(section, "variable_z_raise"), Some("7.0"));
    assert_eq!(store.get(section, "variable_purge_length_maximum"), Some("60.0"));
    assert!(!store.has(section, "variable_iteration_z_raise"));
    assert!(!store.has(section, "variable_max_iterations_per_blob"));
}

mod v3_00 {
    use super::*;

    #[test]
    fn servo_section_renamed_and_stale_pin_dropped() {
        let mut store = ParameterStore::new();
        store.declare_section("mmu_servo mmu_servo", Some("/prev/mmu_hardware.cfg"));
        store.set("mmu_servo mmu_servo", "pin", "mmu:MMU_SERVO");
        store.set("mmu_servo mmu_servo", "servo_up_angle", "140");
        upgrade(&mut store, "2.73", "3.00");

        assert!(!store.has_section("mmu_servo mmu_servo"));
        assert!(!store.has("mmu_servo selector_servo", "pin"));
        assert_eq!(store.get("mmu_servo selector_servo", "servo_up_angle"), Some("140"));
        assert_eq!(
            store.origin_of("mmu_servo selector_servo"),
            Some("/prev/mmu_hardware.cfg")
        );
    }

    #[test]
    fn machine_options_move_out_of_mmu() {
        let mut store = ParameterStore::new();
        store.declare_section("mmu", Some("/prev/mmu_parameters.cfg"));
        store.set("mmu", "mmu_num_gates", "8");
        store.set("mmu", "mmu_vendor", "ERCF");
        store.set("mmu", "auto_calibrate_gates", "1");
        upgrade(&mut store, "2.73", "3.00");

        assert_eq!(store.get("mmu_machine", "num_gates"), Some("8"));
        assert_eq!(store.get("mmu_machine", "mmu_vendor"), Some("ERCF"));
        assert_eq!(store.get("mmu", "autotune_rotation_distance"), Some("1"));
        assert_eq!(store.origin_of("mmu_machine"), Some("/prev/mmu_parameters.cfg"));
    }
}

#[test]
fn homing_extruder_moves_to_machine() {
    let mut store = ParameterStore::new();
    store.set("mmu", "homing_extruder", "1");
    upgrade(&mut store, "3.00", "3.10");
    assert_eq!(store.get("mmu_machine", "homing_extruder"), Some("1"));
    assert!(!store.has("mmu", "homing_extruder"));
}

#[test]
fn espooler_pins_renumbered_from_zero() {
    let mut store = ParameterStore::new();
    store.set("output_pin _mmu_dc_espooler_rwd_0", "pin", "mmu:MMU_DC_MOT_1_A");
    store.set("output_pin _mmu_dc_espooler_en_1", "pin", "custom:PIN");
    store.set(
        "board_pins mmu",
        "aliases",
        "\n    MMU_DC_MOT_1_A=PA1,\n    MMU_DC_MOT_2_EN=PA2,\n    MMU_DC_MOT_12_B=PA3",
    );
    upgrade(&mut store, "3.10", "3.20");

    assert!(!store.has("output_pin _mmu_dc_espooler_rwd_0", "pin"));
    assert_eq!(store.get("output_pin _mmu_dc_espooler_en_1", "pin"), Some("custom:PIN"));
    assert_eq!(
        store.get("board_pins mmu", "aliases"),
        Some("\n    MMU_DC_MOT_0_A=PA1,\n    MMU_DC_MOT_1_EN=PA2,\n    MMU_DC_MOT_11_B=PA3")
    );
}

#[test]
fn full_chain_from_oldest() {
    let mut store = ParameterStore::new();
    store.set("mmu", "mmu_num_gates", "4");
    store.set("mmu", "homing_extruder", "0");
    upgrade(&mut store, "2.70", "3.20");

    assert_eq!(store.get("mmu", "happy_hare_version"), Some("3.20"));
    assert_eq!(store.get("mmu_machine", "num_gates"), Some("4"));
    assert_eq!(store.get("mmu_machine", "homing_extruder"), Some("0"));
}
