/// Instructions sent ahead of every referral document.
///
/// The numbered section labels here are the markers `parse_assessment`
/// looks for; keep the two in step.
pub const TRIAGE_SYSTEM_PROMPT: &str = "Analyze this glaucoma referral document and provide a structured response with the following:
1. Triage Priority: Urgent or Routine
2. Appointment Type: Face-to-face or Virtual
3. Visual Field Test Requirement: Required or Not Required (if already present in referral)
4. Key Clinical Findings
5. Reasoning for decisions

Consider these factors:
- IOP readings and their values
- Cup-to-disc ratio
- Visual field test results if present
- Family history
- Current medications
- Symptoms
Do not use markdown in your response.
Note: Face-to-face appointments are mandatory if gonioscopy is needed.";

/// Canned analysis returned when the service runs without a model backend.
pub const SAMPLE_ANALYSIS: &str = "
1. Triage Priority: Urgent
2. Appointment Type: Face-to-face
3. Visual Field Test Requirement: Required
4. Key Clinical Findings:
   - Elevated IOP (28 mmHg right eye, 30 mmHg left eye)
   - Cup-to-disc ratio 0.7 in right eye, 0.8 in left eye
   - Family history of glaucoma
5. Reasoning: The combination of elevated IOP and increased cup-to-disc ratio indicates advanced glaucomatous damage requiring urgent face-to-face evaluation.
";
