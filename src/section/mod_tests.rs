//! Tests for section ranges and structural edits.

use super::*;

const HARDWARE: &str = "\
[mmu_machine]
num_gates: 4

# Gear stepper for gate 0
[stepper_mmu_gear_0]
step_pin: mmu:MMU_GEAR_STEP_0
rotation_distance: 22.0

[mmu_sensors]
pre_gate_switch_pin_0: ^mmu:MMU_PRE_GATE_0
post_gear_switch_pin_0: ^mmu:MMU_POST_GEAR_0
";

fn range(start: &str, end: &str) -> SectionRange {
    SectionRange::new(start, end).unwrap()
}

mod document {
    use super::*;

    #[test]
    fn round_trips_byte_for_byte() {
        for text in [HARDWARE, "", "no newline", "a\r\nb\r\n", "\n\n\nx"] {
            assert_eq!(Document::parse(text).to_string(), text);
        }
    }

    #[test]
    fn lines_strip_terminators() {
        let doc = Document::parse("a\r\nb\nc");
        assert_eq!(doc.lines().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(doc.line_ending(), "\r\n");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn append_terminates_last_line() {
        let mut doc = Document::parse("a");
        doc.append("b\n");
        assert_eq!(doc.to_string(), "a\nb\n");
    }
}

mod locate {
    use super::*;

    #[test]
    fn end_is_exclusive() {
        let doc = Document::parse(HARDWARE);
        let span = range(r"^\[stepper_mmu_gear_0\]", r"^\[").locate(&doc).unwrap();
        assert_eq!(span, Span { start: 4, end: 8, to_eof: false });
    }

    #[test]
    fn empty_end_runs_to_eof() {
        let doc = Document::parse(HARDWARE);
        let span = range(r"^\[mmu_sensors\]", "").locate(&doc).unwrap();
        assert_eq!(span.end, doc.len());
        assert!(span.to_eof);
    }

    #[test]
    fn unmatched_end_runs_to_eof() {
        let doc = Document::parse(HARDWARE);
        let span = range(r"^\[mmu_sensors\]", "^never$").locate(&doc).unwrap();
        assert!(span.to_eof);
    }

    #[test]
    fn end_search_starts_after_start_line() {
        let doc = Document::parse("[a]\nx: 1\n[b]\n");
        let span = range(r"^\[", r"^\[").locate(&doc).unwrap();
        assert_eq!((span.start, span.end), (0, 2));
    }

    #[test]
    fn missing_anchor_is_error() {
        let doc = Document::parse(HARDWARE);
        let err = range(r"^\[mmu_encoder", r"^\[").locate(&doc).unwrap_err();
        assert!(matches!(err, SectionError::AnchorNotFound { .. }));
        assert!(err.to_string().contains("mmu_encoder"));
    }

    #[test]
    fn invalid_pattern_is_error() {
        let err = SectionRange::new("[oops", "").unwrap_err();
        assert!(matches!(err, SectionError::InvalidPattern { ref pattern, .. } if pattern == "[oops"));
    }
}

mod select_and_delete {
    use super::*;

    #[test]
    fn select_returns_literal_text() {
        let doc = Document::parse(HARDWARE);
        let text = doc.select(&range(r"^\[stepper_mmu_gear_0\]", r"^\[")).unwrap();
        assert_eq!(
            text,
            "[stepper_mmu_gear_0]\nstep_pin: mmu:MMU_GEAR_STEP_0\nrotation_distance: 22.0\n\n"
        );
    }

    #[test]
    fn delete_leaves_rest_untouched() {
        let mut doc = Document::parse(HARDWARE);
        doc.delete(&range(r"^\[stepper_mmu_gear_0\]", r"^\[")).unwrap();
        assert_eq!(
            doc.to_string(),
            "[mmu_machine]\nnum_gates: 4\n\n# Gear stepper for gate 0\n[mmu_sensors]\n\
             pre_gate_switch_pin_0: ^mmu:MMU_PRE_GATE_0\npost_gear_switch_pin_0: ^mmu:MMU_POST_GEAR_0\n"
        );
    }

    #[test]
    fn delete_to_eof() {
        let mut doc = Document::parse("keep\n# EXCLUDE\ndrop\n");
        doc.delete(&range("^# EXCLUDE", "")).unwrap();
        assert_eq!(doc.to_string(), "keep\n");
    }

    #[test]
    fn failed_delete_leaves_document_unchanged() {
        let mut doc = Document::parse(HARDWARE);
        assert!(doc.delete(&range("^absent", "")).is_err());
        assert_eq!(doc.to_string(), HARDWARE);
    }
}

mod duplicate {
    use super::*;

    #[test]
    fn single_line_copies_are_consecutive() {
        let mut doc = Document::parse("[mmu]\ngate0=1\nother=2\n");
        let copies = doc.duplicate(&range("^gate0=", "^"), 0, 3).unwrap();

        assert_eq!(copies, 3);
        assert_eq!(
            doc.to_string(),
            "[mmu]\ngate0=1\ngate1=1\ngate2=1\ngate3=1\nother=2\n"
        );
    }

    #[test]
    fn multi_line_blocks_are_blank_separated() {
        let mut doc = Document::parse(HARDWARE);
        doc.duplicate(&range(r"^\[stepper_mmu_gear_0\]", r"^\["), 0, 2)
            .unwrap();

        let text = doc.to_string();
        assert!(text.contains(
            "[stepper_mmu_gear_0]\nstep_pin: mmu:MMU_GEAR_STEP_0\nrotation_distance: 22.0\n\n\
             [stepper_mmu_gear_1]\nstep_pin: mmu:MMU_GEAR_STEP_1\nrotation_distance: 22.0\n\n\
             [stepper_mmu_gear_2]\nstep_pin: mmu:MMU_GEAR_STEP_2\nrotation_distance: 22.0\n\n\
             [mmu_sensors]\n"
        ));
    }

    #[test]
    fn decimals_are_not_renumbered() {
        let mut doc = Document::parse("[x_0]\nvalue: 0.5\nother: 10\n");
        doc.duplicate(&range(r"^\[x_0\]", ""), 0, 1).unwrap();
        assert_eq!(
            doc.to_string(),
            "[x_0]\nvalue: 0.5\nother: 10\n\n[x_1]\nvalue: 0.5\nother: 10\n"
        );
    }

    #[test]
    fn sensor_lines_one_per_gate() {
        let mut doc = Document::parse(HARDWARE);
        doc.duplicate(&range("^pre_gate_switch_pin_0:", "^"), 0, 2)
            .unwrap();
        assert!(doc.to_string().contains(
            "pre_gate_switch_pin_0: ^mmu:MMU_PRE_GATE_0\n\
             pre_gate_switch_pin_1: ^mmu:MMU_PRE_GATE_1\n\
             pre_gate_switch_pin_2: ^mmu:MMU_PRE_GATE_2\n\
             post_gear_switch_pin_0:"
        ));
    }

    #[test]
    fn non_increasing_bounds_are_noop() {
        let mut doc = Document::parse(HARDWARE);
        let r = range(r"^\[stepper_mmu_gear_0\]", r"^\[");
        assert_eq!(doc.duplicate(&r, 0, 0).unwrap(), 0);
        assert_eq!(doc.duplicate(&r, 3, 1).unwrap(), 0);
        assert_eq!(doc.to_string(), HARDWARE);
    }

    #[test]
    fn unterminated_last_line_gets_terminator() {
        let mut doc = Document::parse("gate0=1");
        doc.duplicate(&range("^gate0", ""), 0, 1).unwrap();
        assert_eq!(doc.to_string(), "gate0=1\ngate1=1\n");
    }
}

mod comment_toggle {
    use super::*;

    const LEDS: &str = "[mmu_leds]\n# chain\nexit_range: 1-4\n\n[next]\nx: 1\n";

    #[test]
    fn comment_skips_blank_and_comment_lines() {
        let mut doc = Document::parse(LEDS);
        let changed = doc.comment(&range(r"^#?\[mmu_leds\]", r"^\[next")).unwrap();

        assert_eq!(changed, 2);
        assert_eq!(
            doc.to_string(),
            "#[mmu_leds]\n# chain\n#exit_range: 1-4\n\n[next]\nx: 1\n"
        );
    }

    #[test]
    fn uncomment_restores_commented_block() {
        let mut doc = Document::parse(LEDS);
        let r = range(r"^#?\[mmu_leds\]", r"^\[next");
        doc.comment(&r).unwrap();
        doc.uncomment(&r).unwrap();

        // The original comment line loses one marker too.
        assert_eq!(
            doc.to_string(),
            "[mmu_leds]\n chain\nexit_range: 1-4\n\n[next]\nx: 1\n"
        );
    }

    #[test]
    fn uncomment_strips_one_marker_only() {
        let mut doc = Document::parse("##[mmu_leds]\n#a: 1\n");
        doc.uncomment(&range("^#+\\[mmu_leds", "")).unwrap();
        assert_eq!(doc.to_string(), "#[mmu_leds]\na: 1\n");
    }
}

mod insert_after {
    use super::*;

    #[test]
    fn inserts_before_next_section() {
        let mut doc = Document::parse("[mmu]\na: 1\n[next]\n");
        doc.insert_after(&range(r"^\[mmu\]", r"^\["), "b: 2")
            .unwrap();
        assert_eq!(doc.to_string(), "[mmu]\na: 1\nb: 2\n[next]\n");
    }

    #[test]
    fn inserts_at_eof() {
        let mut doc = Document::parse("[mmu]\na: 1");
        doc.insert_after(&range(r"^\[mmu\]", ""), "b: 2\nc: 3\n")
            .unwrap();
        assert_eq!(doc.to_string(), "[mmu]\na: 1\nb: 2\nc: 3\n");
    }

    #[test]
    fn keeps_crlf() {
        let mut doc = Document::parse("[mmu]\r\na: 1\r\n");
        doc.insert_after(&range(r"^\[mmu\]", ""), "b: 2").unwrap();
        assert_eq!(doc.to_string(), "[mmu]\r\na: 1\r\nb: 2\r\n");
    }
}
