use crate::models::PatientRecord;

pub const SYSTEM_INSTRUCTIONS: &str = r#"You are a clinical decision-support assistant for a hospital care team. You offer a second opinion. You are NOT the responsible physician.

ABSOLUTE RULES:
1. Ground every statement in the protocol excerpts provided below.
2. NEVER prescribe, and NEVER state medication amounts, units, regimens or routes.
3. Final decisions belong to the responsible physician. Say so explicitly.
4. If any severity sign is present, recommend immediate escalation.
5. Cite the source of each protocol excerpt you rely on.
6. If the excerpts do not cover the question, say so clearly.

RESPONSE FORMAT:
1. Severity signs observed
2. Suggested next steps (non-prescriptive)
3. Pending exams to consider
4. Protocol sources cited
5. Reminder that the responsible physician decides"#;

/// Compose the full generation prompt: safety instructions, patient data,
/// rendered protocol context, then the question.
pub fn build_prompt(patient: &PatientRecord, context: &str, question: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(SYSTEM_INSTRUCTIONS);
    prompt.push_str("\n\n<PATIENT>\n");
    prompt.push_str(&render_patient(patient));
    prompt.push_str("</PATIENT>\n\n<PROTOCOL_EXCERPTS>\n");
    prompt.push_str(context);
    prompt.push_str("\n</PROTOCOL_EXCERPTS>\n\n");
    prompt.push_str(&format!("Question: {}\n\n", question.trim()));
    prompt.push_str("Answer using ONLY the excerpts above, following the response format.");

    prompt
}

fn render_patient(patient: &PatientRecord) -> String {
    let spo2 = patient
        .oxygen_saturation
        .map(|v| format!("{v}%"))
        .unwrap_or_else(|| "not recorded".into());
    let temperature = patient
        .temperature
        .map(|v| format!("{v} °C"))
        .unwrap_or_else(|| "not recorded".into());

    format!(
        "Age: {}\nSex: {}\nSpO2: {}\nTemperature: {}\nSymptoms: {}\nComorbidities: {}\n",
        patient.age,
        patient.sex,
        spo2,
        temperature,
        or_none(&patient.symptoms),
        or_none(&patient.comorbidities),
    )
}

fn or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        "none reported"
    } else {
        text.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn patient() -> PatientRecord {
        PatientRecord::new(63, Sex::Male)
            .with_oxygen_saturation(91.0)
            .with_temperature(38.2)
            .with_symptoms("mild dyspnea and fever")
            .with_comorbidities("hypertension")
    }

    #[test]
    fn instructions_forbid_prescribing() {
        assert!(SYSTEM_INSTRUCTIONS.contains("NEVER prescribe"));
        assert!(SYSTEM_INSTRUCTIONS.contains("responsible physician"));
        assert!(SYSTEM_INSTRUCTIONS.contains("escalation"));
    }

    #[test]
    fn prompt_orders_sections() {
        let prompt = build_prompt(&patient(), "[Excerpt 1 | Source: a.md]\ntext", "Next steps?");
        let instructions = prompt.find("ABSOLUTE RULES").unwrap();
        let patient_at = prompt.find("<PATIENT>").unwrap();
        let context_at = prompt.find("<PROTOCOL_EXCERPTS>").unwrap();
        let question_at = prompt.find("Question: Next steps?").unwrap();
        assert!(instructions < patient_at);
        assert!(patient_at < context_at);
        assert!(context_at < question_at);
    }

    #[test]
    fn prompt_carries_patient_data() {
        let prompt = build_prompt(&patient(), "", "q");
        assert!(prompt.contains("Age: 63"));
        assert!(prompt.contains("Sex: M"));
        assert!(prompt.contains("SpO2: 91%"));
        assert!(prompt.contains("Temperature: 38.2 °C"));
        assert!(prompt.contains("mild dyspnea and fever"));
        assert!(prompt.contains("hypertension"));
    }

    #[test]
    fn missing_vitals_marked_not_recorded() {
        let prompt = build_prompt(&PatientRecord::new(30, Sex::Female), "", "q");
        assert!(prompt.contains("SpO2: not recorded"));
        assert!(prompt.contains("Temperature: not recorded"));
        assert!(prompt.contains("Symptoms: none reported"));
    }
}
