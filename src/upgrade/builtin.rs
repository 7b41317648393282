//! The upgrade chain shipped with the tool, 2.70 through 3.20.

use super::{UpgradeFn, Version};
use crate::store::ParameterStore;

/// Built-in edges as `(from, to, name, function)`, in chain order.
pub const BUILTIN: &[(Version, Version, &str, UpgradeFn)] = &[
    (
        Version::new(2, 70),
        Version::new(2, 71),
        "park and cut-tip variables",
        upgrade_2_70_to_2_71,
    ),
    (
        Version::new(2, 71),
        Version::new(2, 72),
        "residual filament",
        upgrade_2_71_to_2_72,
    ),
    (
        Version::new(2, 72),
        Version::new(2, 73),
        "blobifier purge geometry",
        upgrade_2_72_to_2_73,
    ),
    (
        Version::new(2, 73),
        Version::new(3, 0),
        "mmu_machine section",
        upgrade_2_73_to_3_00,
    ),
    (
        Version::new(3, 0),
        Version::new(3, 10),
        "homing extruder",
        upgrade_3_00_to_3_10,
    ),
    (
        Version::new(3, 10),
        Version::new(3, 20),
        "espooler pin numbering",
        upgrade_3_10_to_3_20,
    ),
];

const MMU: &str = "mmu";
const MMU_MACHINE: &str = "mmu_machine";
const SEQUENCE_VARS: &str = "gcode_macro _MMU_SEQUENCE_VARS";
const CUT_TIP_VARS: &str = "gcode_macro _MMU_CUT_TIP_VARS";
const BLOBIFIER: &str = "gcode_macro BLOBIFIER";
const BOARD_PINS: &str = "board_pins mmu";

/// Number of espooler channels whose pins were renumbered in 3.20.
const ESPOOLER_CHANNELS: u32 = 12;

const PARK_ALL: &str = "'toolchange,load,unload,pause,cancel'";
const PARK_WITH_RUNOUT: &str = "'toolchange,load,unload,runout,pause,cancel'";
const PARK_MINIMAL: &str = "'pause,cancel'";

/// Klipper's boolean spelling (`1/0`, `yes/no`, `true/false`, `on/off`).
fn truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "yes" | "true" | "on"
        )
    })
}

fn float(store: &ParameterStore, section: &str, key: &str) -> Option<f64> {
    store.get(section, key)?.trim().parse().ok()
}

/// Formats a float the way the config files spell them (`7.0`, `2.5`).
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn upgrade_2_70_to_2_71(store: &mut ParameterStore) {
    store.rename_key(CUT_TIP_VARS, "variable_pin_park_x_dist", "variable_pin_park_dist");
    store.rename_key(
        CUT_TIP_VARS,
        "variable_pin_loc_x_compressed",
        "variable_pin_loc_compressed",
    );
    store.rename_key(SEQUENCE_VARS, "variable_lift_speed", "variable_park_lift_speed");

    if let Some(xy) = store.remove(SEQUENCE_VARS, "variable_park_xy") {
        let toolchange = store
            .remove(MMU, "z_hop_height_toolchange")
            .unwrap_or_else(|| "1".to_string());
        let error = store
            .remove(MMU, "z_hop_height_error")
            .unwrap_or_else(|| "5".to_string());
        store.set(
            SEQUENCE_VARS,
            "variable_park_toolchange",
            format!("{xy}, {toolchange}, 0, 2"),
        );
        store.set(
            SEQUENCE_VARS,
            "variable_park_pause",
            format!("{xy}, {error}, 0, 2"),
        );
    }

    if let Some(enable) = store.remove(SEQUENCE_VARS, "variable_enable_park") {
        let runout = store.remove(SEQUENCE_VARS, "variable_enable_park_runout");
        let printing = if truthy(Some(&enable)) {
            PARK_ALL
        } else if truthy(runout.as_deref()) {
            PARK_WITH_RUNOUT
        } else {
            PARK_MINIMAL
        };
        store.set(SEQUENCE_VARS, "variable_enable_park_printing", printing);
    }

    if let Some(standalone) = store.get(SEQUENCE_VARS, "variable_enable_park_standalone") {
        let value = if truthy(Some(standalone)) {
            PARK_ALL
        } else {
            PARK_MINIMAL
        };
        store.set(SEQUENCE_VARS, "variable_enable_park_standalone", value);
    }
}

fn upgrade_2_71_to_2_72(store: &mut ParameterStore) {
    let residual = store.get(MMU, "toolhead_residual_filament");
    let ooze = store.get(MMU, "toolhead_ooze_reduction");
    if let (Some("0"), Some(ooze)) = (residual, ooze) {
        if ooze != "0" {
            let ooze = ooze.to_string();
            store.set(MMU, "toolhead_residual_filament", ooze);
            store.set(MMU, "toolhead_ooze_reduction", "0");
        }
    }
}

#[allow(clippy::suboptimal_flops)]
fn upgrade_2_72_to_2_73(store: &mut ParameterStore) {
    if !store.has(BLOBIFIER, "variable_iteration_z_raise") {
        return;
    }
    let (Some(per_blob), Some(z_raise), Some(z_change), Some(length)) = (
        float(store, BLOBIFIER, "variable_max_iterations_per_blob").map(f64::trunc),
        float(store, BLOBIFIER, "variable_iteration_z_raise"),
        float(store, BLOBIFIER, "variable_iteration_z_change"),
        float(store, BLOBIFIER, "variable_max_iteration_length"),
    ) else {
        tracing::warn!("[{BLOBIFIER}] iteration variables are not numeric, left unchanged");
        return;
    };

    let total_raise = z_raise * per_blob - (per_blob * (per_blob - 1.0) / 2.0) * z_change;
    store.set(BLOBIFIER, "variable_z_raise", format_float(total_raise));
    store.set(
        BLOBIFIER,
        "variable_purge_length_maximum",
        format_float(length * per_blob),
    );
    for key in [
        "variable_max_iterations_per_blob",
        "variable_iteration_z_raise",
        "variable_iteration_z_change",
        "variable_max_iteration_length",
    ] {
        store.remove(BLOBIFIER, key);
    }
}

fn upgrade_2_73_to_3_00(store: &mut ParameterStore) {
    let old_servo = "mmu_servo mmu_servo";
    let new_servo = "mmu_servo selector_servo";
    if store.has_section(old_servo) {
        store.rename_section(old_servo, new_servo);
        if store.get(new_servo, "pin") == Some("mmu:MMU_SERVO") {
            store.remove(new_servo, "pin");
        }
    }

    store.move_key(MMU, "mmu_num_gates", MMU_MACHINE, "num_gates");
    store.move_key(MMU, "mmu_vendor", MMU_MACHINE, "mmu_vendor");
    store.move_key(MMU, "mmu_version", MMU_MACHINE, "mmu_version");

    store.rename_key(MMU, "auto_calibrate_gates", "autotune_rotation_distance");
    store.rename_key(MMU, "auto_calibrate_bowden", "autotune_bowden_length");
    store.rename_key(MMU, "endless_spool_final_eject", "gate_final_eject_distance");
    store.rename_key(
        "gcode_macro _MMU_SOFTWARE_VARS",
        "variable_eject_tool",
        "variable_unload_tool",
    );
    store.rename_key(
        "gcode_macro _MMU_CLIENT_VARS",
        "variable_eject_tool_on_cancel",
        "variable_unload_tool_on_cancel",
    );
}

fn upgrade_3_00_to_3_10(store: &mut ParameterStore) {
    store.move_key(MMU, "homing_extruder", MMU_MACHINE, "homing_extruder");
}

fn upgrade_3_10_to_3_20(store: &mut ParameterStore) {
    for i in 0..ESPOOLER_CHANNELS {
        for (kind, suffix) in [("rwd", "A"), ("en", "EN")] {
            let section = format!("output_pin _mmu_dc_espooler_{kind}_{i}");
            let old_pin = format!("mmu:MMU_DC_MOT_{}_{suffix}", i + 1);
            if store.get(&section, "pin") == Some(old_pin.as_str()) {
                store.remove(&section, "pin");
            }
        }

        if let Some(aliases) = store.get(BOARD_PINS, "aliases") {
            let mut renumbered = aliases.to_string();
            for suffix in ["A", "B", "EN"] {
                renumbered = renumbered.replace(
                    &format!("MMU_DC_MOT_{}_{suffix}", i + 1),
                    &format!("MMU_DC_MOT_{i}_{suffix}"),
                );
            }
            store.set(BOARD_PINS, "aliases", renumbered);
        }
    }
}
