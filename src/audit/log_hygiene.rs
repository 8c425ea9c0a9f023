// Static scan of every source file for tracing calls that would leak patient
// content into process logs. Patient data belongs in the audit trail only.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    /// Field accesses and names that MUST NOT appear in tracing macro arguments.
    const PATIENT_PATTERNS: &[&str] = &[
        ".symptoms",
        ".comorbidities",
        ".question",
        "question()",
        "patient()",
        ".answer",
        "answer()",
        "raw_output",
        "prompt =",
        "%prompt",
        "?patient",
        "%patient",
        "excerpt.content",
    ];

    /// This file names the patterns on purpose.
    const ALLOWLIST: &[&str] = &["log_hygiene.rs"];

    #[test]
    fn no_patient_data_in_tracing_calls() {
        let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
        assert!(src_dir.exists(), "Source directory not found: {}", src_dir.display());

        let mut violations = Vec::new();
        scan_directory(&src_dir, &mut violations);

        if !violations.is_empty() {
            let report = violations
                .iter()
                .map(|(file, line_num, call, pattern)| {
                    format!("  {file}:{line_num}: found '{pattern}' in: {}", call.trim())
                })
                .collect::<Vec<_>>()
                .join("\n");
            panic!(
                "LOG HYGIENE FAILED: {} tracing call(s) carry patient content:\n{}\n\n\
                 Fix: log case ids, counts and rule ids only.",
                violations.len(),
                report
            );
        }
    }

    #[test]
    fn scanner_detects_known_violation() {
        let line = r#"tracing::info!(symptoms = %patient.symptoms, "triaged");"#;
        assert!(PATIENT_PATTERNS.iter().any(|p| line.contains(p)));
    }

    #[test]
    fn scanner_passes_clean_tracing() {
        let line = r#"tracing::info!(case_id = %case_id, severity = %severity, "triaged");"#;
        assert!(!PATIENT_PATTERNS.iter().any(|p| line.contains(p)));
    }

    type Violation = (String, usize, String, String);

    fn scan_directory(dir: &Path, violations: &mut Vec<Violation>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                scan_directory(&path, violations);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                scan_file(&path, violations);
            }
        }
    }

    fn scan_file(path: &Path, violations: &mut Vec<Violation>) {
        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        if ALLOWLIST.iter().any(|a| filename.contains(a)) {
            return;
        }
        let Ok(content) = fs::read_to_string(path) else {
            return;
        };
        let relative = path
            .strip_prefix(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"))
            .unwrap_or(path)
            .display()
            .to_string();

        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let trimmed = lines[i].trim();
            let is_tracing = ["info!", "warn!", "error!", "debug!", "trace!", "span!"]
                .iter()
                .any(|m| trimmed.starts_with(&format!("tracing::{m}")));
            if !is_tracing {
                i += 1;
                continue;
            }

            // Collect the whole macro call, which may span several lines.
            let mut call = String::from(trimmed);
            let start_line = i + 1;
            let mut depth = paren_delta(trimmed);
            let mut j = i + 1;
            while depth > 0 && j < lines.len() {
                let next = lines[j].trim();
                call.push(' ');
                call.push_str(next);
                depth += paren_delta(next);
                j += 1;
            }

            for pattern in PATIENT_PATTERNS {
                if call.contains(pattern) {
                    violations.push((relative.clone(), start_line, call.clone(), pattern.to_string()));
                }
            }
            i = j;
        }
    }

    fn paren_delta(s: &str) -> i32 {
        s.chars().fold(0, |acc, c| match c {
            '(' => acc + 1,
            ')' => acc - 1,
            _ => acc,
        })
    }
}
