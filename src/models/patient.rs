use serde::{Deserialize, Serialize};

use super::enums::Sex;

/// Patient snapshot for a single case. Immutable once the case starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: u32,
    pub sex: Sex,
    /// SpO2 in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    /// Body temperature in °C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub comorbidities: String,
}

impl PatientRecord {
    pub fn new(age: u32, sex: Sex) -> Self {
        Self {
            age,
            sex,
            oxygen_saturation: None,
            temperature: None,
            symptoms: String::new(),
            comorbidities: String::new(),
        }
    }

    pub fn with_oxygen_saturation(mut self, spo2: f64) -> Self {
        self.oxygen_saturation = Some(spo2);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_symptoms(mut self, symptoms: &str) -> Self {
        self.symptoms = symptoms.to_string();
        self
    }

    pub fn with_comorbidities(mut self, comorbidities: &str) -> Self {
        self.comorbidities = comorbidities.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_vitals_deserialize_as_none() {
        let json = r#"{"age": 40, "sex": "F", "symptoms": "cough"}"#;
        let p: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(p.oxygen_saturation, None);
        assert_eq!(p.temperature, None);
        assert_eq!(p.comorbidities, "");
    }

    #[test]
    fn absent_vitals_are_omitted_from_snapshot() {
        let p = PatientRecord::new(63, Sex::Male).with_temperature(38.2);
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("oxygen_saturation").is_none());
        assert_eq!(json["temperature"], 38.2);
        assert_eq!(json["sex"], "M");
    }
}
