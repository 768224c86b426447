//! Builds the unit test (PU) document.

use crate::errors::AppError;
use crate::models::{BasicInfo, Environment, RequestRecord, TestCase, TestPlan, TestStatus};

use super::ooxml::{Alignment, DocxBuilder, Run};

const PENDING_COLOR: &str = "7c7d8a";

/// Color of the status line for `status`.
pub fn status_color(status: Option<TestStatus>) -> &'static str {
    match status {
        Some(TestStatus::Approved) => "10b981",
        Some(TestStatus::Rejected) => "ef4444",
        Some(TestStatus::InProgress) => "f59e0b",
        Some(TestStatus::Pending) | None => PENDING_COLOR,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentGenerator;

impl DocumentGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce the test document for `environment`.
    pub fn generate(
        &self,
        record: &RequestRecord,
        environment: Environment,
    ) -> Result<Vec<u8>, AppError> {
        let info = record
            .validated_basic_info()
            .map_err(|e| AppError::GenerationFailure(e.message()))?;
        let plan = record.test_section.clone().unwrap_or_default();
        let mut doc = DocxBuilder::new();

        doc.paragraph(
            vec![Run::new(format!("UNIT TESTS - {}", info.case_id)).bold().size(32)],
            Alignment::Center,
            400,
        );
        doc.paragraph(
            vec![Run::new(format!("Environment: {}", environment.label()))
                .bold()
                .size(24)],
            Alignment::Center,
            400,
        );
        doc.key_value_table(&summary_rows(info, &plan));
        doc.paragraph(vec![], Alignment::Left, 300);

        doc.paragraph(
            vec![Run::new("TEST CASES").bold().size(28)],
            Alignment::Left,
            300,
        );
        if plan.cases.is_empty() {
            doc.paragraph(
                vec![Run::new("No test cases have been defined.").italic()],
                Alignment::Left,
                0,
            );
        }
        for (i, case) in plan.cases.iter().enumerate() {
            write_case(&mut doc, i + 1, case);
        }

        if !plan.observations.trim().is_empty() {
            doc.paragraph(
                vec![Run::new("OBSERVATIONS").bold().size(28)],
                Alignment::Left,
                200,
            );
            doc.paragraph(
                vec![Run::new(plan.observations.as_str())],
                Alignment::Left,
                200,
            );
        }

        doc.finish()
    }
}

fn summary_rows(info: &BasicInfo, plan: &TestPlan) -> Vec<(&'static str, String)> {
    vec![
        ("Case ID:", info.case_id.clone()),
        ("Title:", info.title.clone()),
        ("Description:", info.description.clone()),
        ("Requester:", info.requester.name.clone()),
        ("Test Kind:", plan.test_kind.clone()),
        ("Executor:", plan.executor.clone()),
        ("Tool:", plan.tool.clone()),
    ]
}

fn labeled(label: &str, value: &str) -> Vec<Run> {
    vec![Run::new(format!("{} ", label)).bold(), Run::new(value)]
}

fn write_case(doc: &mut DocxBuilder, number: usize, case: &TestCase) {
    doc.paragraph(
        vec![Run::new(format!("Test Case {}: {}", number, case.name))
            .bold()
            .size(24)],
        Alignment::Left,
        200,
    );
    doc.paragraph(labeled("Description:", &case.description), Alignment::Left, 100);
    if !case.preconditions.trim().is_empty() {
        doc.paragraph(
            labeled("Preconditions:", &case.preconditions),
            Alignment::Left,
            100,
        );
    }
    if !case.steps.is_empty() {
        doc.paragraph(vec![Run::new("Steps:").bold()], Alignment::Left, 100);
        for (i, step) in case.steps.iter().enumerate() {
            doc.paragraph(
                vec![Run::new(format!("{}. {}", i + 1, step))],
                Alignment::Left,
                50,
            );
        }
    }
    doc.paragraph(
        labeled("Expected Result:", &case.expected_result),
        Alignment::Left,
        100,
    );

    let status = case.status.map(|s| s.as_str()).unwrap_or("Pending");
    doc.paragraph(
        vec![
            Run::new("Status: ").bold(),
            Run::new(status).bold().color(status_color(case.status)),
        ],
        Alignment::Left,
        200,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ooxml::fixtures::part;
    use crate::models::Requester;

    fn record(cases: Vec<TestCase>, observations: &str) -> RequestRecord {
        RequestRecord {
            basic_info: Some(BasicInfo {
                case_id: "CDP-7".to_string(),
                category: None,
                title: "Login".to_string(),
                description: "Login flow".to_string(),
                requester: Requester {
                    name: "Ana".to_string(),
                    area: "TI".to_string(),
                    phone: None,
                },
                environments: vec![Environment::QA],
                request_date: None,
            }),
            test_section: Some(TestPlan {
                test_kind: "Validation".to_string(),
                executor: "Luis".to_string(),
                tool: "Postman".to_string(),
                cases,
                observations: observations.to_string(),
            }),
            ..Default::default()
        }
    }

    fn case(status: Option<TestStatus>) -> TestCase {
        TestCase {
            id: "c1".to_string(),
            name: "Valid credentials".to_string(),
            description: "User logs in".to_string(),
            preconditions: String::new(),
            steps: vec!["Open page".to_string(), "Submit form".to_string()],
            expected_result: "Dashboard shown".to_string(),
            status,
        }
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(Some(TestStatus::Approved)), "10b981");
        assert_eq!(status_color(Some(TestStatus::Rejected)), "ef4444");
        assert_eq!(status_color(Some(TestStatus::InProgress)), "f59e0b");
        assert_eq!(status_color(None), "7c7d8a");
    }

    #[test]
    fn test_document_contents() {
        let bytes = DocumentGenerator::new()
            .generate(
                &record(vec![case(Some(TestStatus::Approved))], "All green"),
                Environment::PROD,
            )
            .unwrap();
        let xml = part(&bytes, "word/document.xml");

        assert!(xml.contains("UNIT TESTS - CDP-7"));
        assert!(xml.contains("Environment: PRODUCCIÓN"));
        assert!(xml.contains("Postman"));
        assert!(xml.contains("Test Case 1: Valid credentials"));
        assert!(xml.contains("1. Open page"));
        assert!(xml.contains("2. Submit form"));
        assert!(xml.contains(r#"<w:color w:val="10b981"/>"#));
        assert!(xml.contains("OBSERVATIONS"));
        assert!(!xml.contains("Preconditions:"));
    }

    #[test]
    fn test_missing_status_renders_pending() {
        let bytes = DocumentGenerator::new()
            .generate(&record(vec![case(None)], ""), Environment::QA)
            .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains(">Pending</w:t>"));
        assert!(xml.contains(r#"<w:color w:val="7c7d8a"/>"#));
        assert!(!xml.contains("OBSERVATIONS"));
    }

    #[test]
    fn test_pasted_control_characters_stay_valid_xml() {
        let mut pasted = case(None);
        pasted.description = "line one\u{B}line two\u{C}".to_string();
        let bytes = DocumentGenerator::new()
            .generate(&record(vec![pasted], ""), Environment::QA)
            .unwrap();
        let xml = part(&bytes, "word/document.xml");

        assert!(!xml.contains('\u{B}'));
        assert!(!xml.contains('\u{C}'));
        assert!(xml.contains(r#"line one</w:t><w:br/><w:t xml:space="preserve">line two</w:t>"#));
    }

    #[test]
    fn test_empty_case_list_placeholder() {
        let bytes = DocumentGenerator::new()
            .generate(&record(vec![], ""), Environment::QA)
            .unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains("<w:i/>"));
        assert!(xml.contains("No test cases have been defined."));
    }
}
