//! Document kinds and the structural edits each one applies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::section::{OnMissing, SectionError, SectionRange};

/// Next `[section]` header, commented or not.
const NEXT_SECTION: &str = r"^#?\[";

/// Next option-group heading in the parameters file
/// (`# Logging ------------...`).
const NEXT_GROUP: &str = r"^# [A-Z].*-{10,}\s*$";

/// Hardware and add-on switches that drive structural edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    /// Encoder fitted.
    pub encoder: bool,
    /// Selector servo fitted.
    pub selector_servo: bool,
    /// Pre-gate sensors fitted.
    pub gate_sensors: bool,
    /// Post-gear sensors fitted.
    pub gear_sensors: bool,
    /// One gear stepper per gate (type-B designs).
    pub multi_gear: bool,
    /// LED chain fitted.
    pub leds: bool,
    /// Blobifier purge add-on installed.
    pub blobifier: bool,
    /// EREC filament cutter add-on installed.
    pub erec_cutter: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            encoder: true,
            selector_servo: true,
            gate_sensors: false,
            gear_sensors: false,
            multi_gear: false,
            leds: false,
            blobifier: false,
            erec_cutter: false,
        }
    }
}

/// Closed set of document layouts the renderer knows how to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Token substitution only.
    #[default]
    Plain,
    /// `mmu_hardware.cfg`: steppers, sensors, encoder, servo, LEDs.
    Hardware,
    /// `mmu_parameters.cfg`: option groups and supplemental options.
    Parameters,
    /// `mmu_macro_vars.cfg`: add-on variable blocks.
    MacroVars,
    /// `mmu_espooler.cfg` style pin blocks.
    Espooler,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plain => "plain",
            Self::Hardware => "hardware",
            Self::Parameters => "parameters",
            Self::MacroVars => "macro_vars",
            Self::Espooler => "espooler",
        };
        f.write_str(name)
    }
}

/// Structural edit applied to a matched range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Remove the range.
    Delete,
    /// Comment out the range.
    Comment,
    /// Uncomment the range.
    Uncomment,
    /// Copy the range once per additional gate, renumbering gate `0`.
    DuplicatePerGate,
}

/// One ordered step of a document kind's edit list.
#[derive(Debug, Clone)]
pub struct EditStep {
    /// What to do with the range.
    pub action: EditAction,
    /// Lines the action applies to.
    pub range: SectionRange,
    /// Policy when the range's anchor is absent from the template.
    pub on_missing: OnMissing,
}

impl EditStep {
    fn new(
        action: EditAction,
        start: &str,
        end: &str,
        on_missing: OnMissing,
    ) -> Result<Self, SectionError> {
        Ok(Self {
            action,
            range: SectionRange::new(start, end)?,
            on_missing,
        })
    }
}

impl DocumentKind {
    /// Returns the ordered edit steps for this kind under `features`.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::InvalidPattern`] if a step's pattern fails to
    /// compile.
    pub fn steps(self, features: &Features) -> Result<Vec<EditStep>, SectionError> {
        use EditAction::{Comment, Delete, DuplicatePerGate, Uncomment};
        use OnMissing::{Fail, Skip};

        let mut steps = Vec::new();
        match self {
            Self::Plain => {}
            Self::Hardware => {
                if features.multi_gear {
                    steps.push(EditStep::new(
                        DuplicatePerGate,
                        r"^\[stepper_mmu_gear_0\]",
                        NEXT_SECTION,
                        Fail,
                    )?);
                }
                for (fitted, pin) in [
                    (features.gate_sensors, "pre_gate_switch_pin_0"),
                    (features.gear_sensors, "post_gear_switch_pin_0"),
                ] {
                    let start = format!("^#?{pin}:");
                    if fitted {
                        steps.push(EditStep::new(Uncomment, &start, "^", Skip)?);
                        steps.push(EditStep::new(DuplicatePerGate, &start, "^", Skip)?);
                    } else {
                        steps.push(EditStep::new(Comment, &start, "^", Skip)?);
                    }
                }
                if !features.encoder {
                    steps.push(EditStep::new(Delete, r"^\[mmu_encoder", NEXT_SECTION, Skip)?);
                }
                if !features.selector_servo {
                    steps.push(EditStep::new(Delete, r"^\[mmu_servo", NEXT_SECTION, Skip)?);
                }
                let leds = if features.leds { Uncomment } else { Comment };
                steps.push(EditStep::new(leds, r"^#?\[mmu_leds\]", NEXT_SECTION, Skip)?);
            }
            Self::Parameters => {
                if !features.encoder {
                    steps.push(EditStep::new(Delete, r"^# Encoder", NEXT_GROUP, Skip)?);
                }
                if !features.selector_servo {
                    steps.push(EditStep::new(Delete, r"^# Servo", NEXT_GROUP, Skip)?);
                }
            }
            Self::MacroVars => {
                if !features.blobifier {
                    steps.push(EditStep::new(
                        Delete,
                        r"^\[gcode_macro BLOBIFIER\]",
                        NEXT_SECTION,
                        Skip,
                    )?);
                }
                if !features.erec_cutter {
                    steps.push(EditStep::new(
                        Delete,
                        r"^\[gcode_macro _EREC_VARS\]",
                        NEXT_SECTION,
                        Skip,
                    )?);
                }
            }
            Self::Espooler => {
                steps.push(EditStep::new(
                    DuplicatePerGate,
                    r"^\[output_pin _mmu_dc_espooler_rwd_0\]",
                    NEXT_SECTION,
                    Fail,
                )?);
                steps.push(EditStep::new(
                    DuplicatePerGate,
                    r"^\[output_pin _mmu_dc_espooler_en_0\]",
                    NEXT_SECTION,
                    Skip,
                )?);
            }
        }
        Ok(steps)
    }

    /// Returns `true` if this kind consults the supplemental option list.
    #[must_use]
    pub const fn inserts_supplemental(self) -> bool {
        matches!(self, Self::Parameters)
    }
}
