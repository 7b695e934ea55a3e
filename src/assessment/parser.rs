use std::sync::LazyLock;

use regex::Regex;

use super::types::AssessmentRecord;

/// Which multi-line block subsequent lines belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Findings,
    Reasoning,
}

/// Section markers, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    TriagePriority,
    AppointmentType,
    VisualFieldTest,
    ClinicalFindings,
    Reasoning,
}

/// Optional leading numbering such as `1.`, `2)` or `3 .`.
const NUMBERING: &str = r"(?i)^(?:\d+\s*[.)]\s*)?";

static MARKERS: LazyLock<Vec<(Marker, Regex)>> = LazyLock::new(|| {
    [
        (Marker::TriagePriority, r"triage\s+priority\b"),
        (Marker::AppointmentType, r"appointment\s+type\b"),
        (Marker::VisualFieldTest, r"visual\s+field\s+test\b"),
        (Marker::ClinicalFindings, r"(?:key\s+)?clinical\s+findings\b"),
        (Marker::Reasoning, r"reasoning\b"),
    ]
    .into_iter()
    .map(|(marker, label)| (marker, Regex::new(&format!("{NUMBERING}{label}")).unwrap()))
    .collect()
});

/// Loose form accepted anywhere in a line, not only at its start.
const TRIAGE_INLINE: &str = "Triage Priority:";

/// Parse the model's free-text assessment into an [`AssessmentRecord`].
///
/// Never fails: anything that cannot be recognised is left at its default.
/// Lines are matched against the section markers in priority order; the
/// first matching rule wins.
pub fn parse_assessment(text: &str) -> AssessmentRecord {
    let mut record = AssessmentRecord::default();
    let mut section = Section::None;
    let mut reasoning: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        match match_marker(line) {
            // Triage may appear inside another block without closing it.
            Some((Marker::TriagePriority, end)) => {
                if let Some(value) = value_after_colon(line, end) {
                    record.triage_priority = value;
                }
            }
            Some((Marker::AppointmentType, end)) => {
                section = Section::None;
                if let Some(value) = value_after_colon(line, end) {
                    record.appointment_type = value;
                }
            }
            Some((Marker::VisualFieldTest, _)) => {
                section = Section::None;
                // Label wording varies ("Visual Field Test Requirement"), so split
                // on the first colon of the line rather than after the match.
                if let Some(value) = value_after_colon(line, 0) {
                    record.visual_field_test = value;
                }
            }
            Some((Marker::ClinicalFindings, _)) => {
                section = Section::Findings;
            }
            Some((Marker::Reasoning, end)) => {
                section = Section::Reasoning;
                if let Some(value) = value_after_colon(line, end) {
                    reasoning = Some(value);
                }
            }
            None => match section {
                Section::Findings => {
                    if let Some(item) = line.strip_prefix('-') {
                        let item = item.trim();
                        if !item.is_empty() {
                            record.clinical_findings.push(item.to_string());
                        }
                    }
                }
                Section::Reasoning if reasoning.is_none() => {
                    reasoning = Some(line.to_string());
                }
                _ => {}
            },
        }
    }

    if let Some(reasoning) = reasoning {
        record.reasoning = reasoning;
    }

    record
}

/// Absent input parses exactly like an empty string.
pub fn parse_assessment_opt(text: Option<&str>) -> AssessmentRecord {
    parse_assessment(text.unwrap_or_default())
}

/// Returns the first marker the line carries and the byte offset where it ends.
fn match_marker(line: &str) -> Option<(Marker, usize)> {
    if let Some(pos) = line.find(TRIAGE_INLINE) {
        // End just before the colon so the colon search finds it.
        return Some((Marker::TriagePriority, pos + TRIAGE_INLINE.len() - 1));
    }

    MARKERS
        .iter()
        .find_map(|(marker, re)| re.find(line).map(|m| (*marker, m.end())))
}

/// Trimmed text after the first colon at or past `from`; `None` when there is
/// no colon or nothing follows it.
fn value_after_colon(line: &str, from: usize) -> Option<String> {
    let colon = from + line.get(from..)?.find(':')?;
    let value = line[colon + 1..].trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::types::NOT_SPECIFIED;

    const HAPPY_PATH: &str = "
        1. Triage Priority: Urgent
        2. Appointment Type: Face-to-face
        3. Visual Field Test Requirement: Required
        4. Key Clinical Findings:
           - Elevated IOP (28 mmHg right eye, 30 mmHg left eye)
           - Cup-to-disc ratio 0.7 in right eye, 0.8 in left eye
        5. Reasoning: Advanced glaucomatous damage.
    ";

    #[test]
    fn parses_full_assessment() {
        let record = parse_assessment(HAPPY_PATH);
        assert_eq!(record.triage_priority, "Urgent");
        assert_eq!(record.appointment_type, "Face-to-face");
        assert_eq!(record.visual_field_test, "Required");
        assert_eq!(
            record.clinical_findings,
            vec![
                "Elevated IOP (28 mmHg right eye, 30 mmHg left eye)",
                "Cup-to-disc ratio 0.7 in right eye, 0.8 in left eye",
            ]
        );
        assert_eq!(record.reasoning, "Advanced glaucomatous damage.");
    }

    #[test]
    fn empty_input_yields_defaults() {
        let record = parse_assessment("");
        assert_eq!(record.triage_priority, NOT_SPECIFIED);
        assert_eq!(record.appointment_type, NOT_SPECIFIED);
        assert_eq!(record.visual_field_test, NOT_SPECIFIED);
        assert_eq!(record.reasoning, NOT_SPECIFIED);
        assert!(record.clinical_findings.is_empty());
    }

    #[test]
    fn absent_input_matches_empty_input() {
        assert_eq!(parse_assessment_opt(None), parse_assessment(""));
        assert_eq!(parse_assessment_opt(Some(HAPPY_PATH)), parse_assessment(HAPPY_PATH));
    }

    #[test]
    fn unstructured_text_yields_defaults() {
        let record = parse_assessment(
            "I could not read this document.\nPlease upload a clearer scan.\n- stray bullet",
        );
        assert_eq!(record, AssessmentRecord::default());
    }

    #[test]
    fn only_first_colon_splits() {
        let record =
            parse_assessment("3. Visual Field Test Requirement: Not Required (ratio: 0.3)");
        assert_eq!(record.visual_field_test, "Not Required (ratio: 0.3)");
    }

    #[test]
    fn triage_value_keeps_later_colons() {
        let record = parse_assessment("1. Triage Priority: Routine (review: 6 months)");
        assert_eq!(record.triage_priority, "Routine (review: 6 months)");
    }

    #[test]
    fn numbering_is_optional() {
        let record = parse_assessment(
            "Triage Priority: Routine\nAppointment Type: Virtual\nVisual Field Test: Not Required",
        );
        assert_eq!(record.triage_priority, "Routine");
        assert_eq!(record.appointment_type, "Virtual");
        assert_eq!(record.visual_field_test, "Not Required");
    }

    #[test]
    fn alternative_numbering_styles_are_recognised() {
        let record = parse_assessment("1) Triage Priority: Urgent\n2 . Appointment Type: Virtual");
        assert_eq!(record.triage_priority, "Urgent");
        assert_eq!(record.appointment_type, "Virtual");
    }

    #[test]
    fn triage_marker_matches_anywhere_in_line() {
        let record = parse_assessment("Overall Triage Priority: Urgent");
        assert_eq!(record.triage_priority, "Urgent");
    }

    #[test]
    fn markers_are_case_insensitive() {
        let record = parse_assessment("APPOINTMENT TYPE: Face-to-face\nreasoning: raised IOP");
        assert_eq!(record.appointment_type, "Face-to-face");
        assert_eq!(record.reasoning, "raised IOP");
    }

    #[test]
    fn missing_findings_section_yields_empty_list() {
        let record = parse_assessment("1. Triage Priority: Routine\n5. Reasoning: Stable.");
        assert!(record.clinical_findings.is_empty());
        assert_eq!(record.reasoning, "Stable.");
    }

    #[test]
    fn findings_header_contributes_no_item() {
        let record = parse_assessment("4. Key Clinical Findings: see below\n- IOP 24 mmHg");
        assert_eq!(record.clinical_findings, vec!["IOP 24 mmHg"]);
    }

    #[test]
    fn bullets_outside_findings_are_ignored() {
        let record = parse_assessment("- before any header\n4. Key Clinical Findings:\n- kept");
        assert_eq!(record.clinical_findings, vec!["kept"]);
    }

    #[test]
    fn narrative_line_does_not_close_findings() {
        let record = parse_assessment(
            "4. Key Clinical Findings:\n- first\nAdditionally noted:\n- second",
        );
        assert_eq!(record.clinical_findings, vec!["first", "second"]);
    }

    #[test]
    fn next_marker_closes_findings() {
        let record = parse_assessment(
            "4. Key Clinical Findings:\n- first\n5. Reasoning: done\n- not a finding",
        );
        assert_eq!(record.clinical_findings, vec!["first"]);
        assert_eq!(record.reasoning, "done");
    }

    #[test]
    fn triage_line_keeps_findings_open() {
        let record = parse_assessment(
            "4. Key Clinical Findings:\n- a\n1. Triage Priority: Urgent\n- b",
        );
        assert_eq!(record.triage_priority, "Urgent");
        assert_eq!(record.clinical_findings, vec!["a", "b"]);
    }

    #[test]
    fn triage_line_keeps_reasoning_pending() {
        let record =
            parse_assessment("5. Reasoning:\n1. Triage Priority: Urgent\nBecause IOP is high.");
        assert_eq!(record.triage_priority, "Urgent");
        assert_eq!(record.reasoning, "Because IOP is high.");
    }

    #[test]
    fn appointment_line_closes_findings() {
        let record = parse_assessment(
            "Clinical Findings:\n- a\n2. Appointment Type: Virtual\n- b",
        );
        assert_eq!(record.appointment_type, "Virtual");
        assert_eq!(record.clinical_findings, vec!["a"]);
    }

    #[test]
    fn empty_bullets_are_skipped() {
        let record = parse_assessment("Clinical Findings:\n-\n-   \n- real");
        assert_eq!(record.clinical_findings, vec!["real"]);
    }

    #[test]
    fn reasoning_on_following_line_captures_one_line() {
        let record = parse_assessment(
            "5. Reasoning:\nThe disc changes warrant urgent review.\nFurther narrative is dropped.",
        );
        assert_eq!(record.reasoning, "The disc changes warrant urgent review.");
    }

    #[test]
    fn reasoning_skips_blank_lines_before_prose() {
        let record = parse_assessment("5. Reasoning for decisions:\n\n   Family history.\nMore.");
        assert_eq!(record.reasoning, "Family history.");
    }

    #[test]
    fn inline_reasoning_is_not_extended() {
        let record = parse_assessment("5. Reasoning: Inline.\nExtra prose.");
        assert_eq!(record.reasoning, "Inline.");
    }

    #[test]
    fn empty_values_keep_defaults() {
        let record = parse_assessment("1. Triage Priority:\n2. Appointment Type:   ");
        assert_eq!(record.triage_priority, NOT_SPECIFIED);
        assert_eq!(record.appointment_type, NOT_SPECIFIED);
    }

    #[test]
    fn marker_without_colon_is_a_miss() {
        let record = parse_assessment("1. Triage Priority Urgent");
        assert_eq!(record.triage_priority, NOT_SPECIFIED);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let record = parse_assessment(&HAPPY_PATH.replace('\n', "\r\n"));
        assert_eq!(record.triage_priority, "Urgent");
        assert_eq!(record.clinical_findings.len(), 2);
    }

    #[test]
    fn default_record_survives_reparse() {
        let default = AssessmentRecord::default();
        assert_eq!(parse_assessment(&default.to_string()), default);

        let json = serde_json::to_string_pretty(&default).unwrap();
        assert_eq!(parse_assessment(&json), default);
    }

    #[test]
    fn rendered_record_reparses_to_itself() {
        let record = parse_assessment(HAPPY_PATH);
        assert_eq!(parse_assessment(&record.to_string()), record);
    }

    #[test]
    fn concurrent_parses_agree() {
        let expected = parse_assessment(HAPPY_PATH);
        let results: Vec<AssessmentRecord> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| parse_assessment(HAPPY_PATH)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results.len(), 8);
        for record in results {
            assert_eq!(record, expected);
        }
    }

    #[test]
    fn arbitrary_input_never_panics() {
        for input in [":", "::::", "1.", "-", "Reasoning", "Triage Priority:", "\u{feff}é:ü", "\n\n\n"] {
            let record = parse_assessment(input);
            assert!(!record.triage_priority.is_empty());
            assert!(!record.reasoning.is_empty());
        }
    }
}
