//! Fills the database (FBD) and application (FDA) spreadsheet templates.

use crate::config::SheetLayout;
use crate::errors::AppError;
use crate::models::{
    ApplicationChangeSet, BasicInfo, DatabaseChangeSet, Environment, RequestRecord, TemplateKind,
};
use crate::templates::TemplateRepository;

use super::ooxml::{SheetRef, Workbook};

/// Sheet-name keywords, matched case-insensitively as substrings.
pub const SCRIPT_SHEET_KEYWORDS: [&str; 3] = ["script", "ejecución", "ejecucion"];
pub const PROCEDURE_SHEET_KEYWORDS: [&str; 3] = ["stored", "procedure", "procedimiento"];
pub const FILE_SHEET_KEYWORDS: [&str; 3] = ["archivo", "modificado", "file"];

const PRIMARY_SHEET: usize = 0;

#[derive(Clone)]
pub struct SpreadsheetGenerator {
    templates: TemplateRepository,
    layout: SheetLayout,
}

impl SpreadsheetGenerator {
    pub fn new(templates: TemplateRepository, layout: SheetLayout) -> Self {
        Self { templates, layout }
    }

    /// Produce the filled spreadsheet for `kind` and `environment`.
    pub async fn generate(
        &self,
        kind: TemplateKind,
        record: &RequestRecord,
        environment: Environment,
    ) -> Result<Vec<u8>, AppError> {
        if kind == TemplateKind::Test {
            return Err(AppError::GenerationFailure(
                "The test template is not a spreadsheet".to_string(),
            ));
        }
        let info = record.validated_basic_info()?;

        let template = match self.templates.get_template(kind).await {
            Ok(bytes) => bytes,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::TemplateMissing(format!(
                    "No {} template registered",
                    kind.code()
                )))
            }
            Err(e) => return Err(e),
        };

        let mut book = Workbook::open(template)?;
        let mut claims = SheetClaims::default();
        write_header(&mut book, info, environment);

        match kind {
            TemplateKind::Database => {
                let section = record.database_section.clone().unwrap_or_default();
                self.fill_database(&mut book, &mut claims, &section);
            }
            TemplateKind::Application => {
                let section = record.application_section.clone().unwrap_or_default();
                self.fill_application(&mut book, &mut claims, &section);
            }
            TemplateKind::Test => {}
        }

        book.save()
    }

    fn fill_database(
        &self,
        book: &mut Workbook,
        claims: &mut SheetClaims,
        section: &DatabaseChangeSet,
    ) {
        book.set_cell(PRIMARY_SHEET, "C10", section.database.as_str());
        book.set_cell(PRIMARY_SHEET, "C11", section.schema.as_str());

        if !section.scripts.is_empty() {
            if let Some(sheet) = claims.claim(book.sheets(), &SCRIPT_SHEET_KEYWORDS) {
                for (i, script) in section.scripts.iter().enumerate() {
                    let row = self.item_row(i);
                    book.set_cell(sheet, &format!("A{}", row), script.position);
                    book.set_cell(sheet, &format!("B{}", row), script.name.as_str());
                    book.set_cell(sheet, &format!("C{}", row), script.kind.as_str());
                    book.set_cell(sheet, &format!("D{}", row), script.description.as_str());
                    book.set_cell(sheet, &format!("E{}", row), script.body.as_str());
                }
            }
        }

        if !section.stored_procedures.is_empty() {
            if let Some(sheet) = claims.claim(book.sheets(), &PROCEDURE_SHEET_KEYWORDS) {
                for (i, procedure) in section.stored_procedures.iter().enumerate() {
                    let row = self.item_row(i);
                    book.set_cell(sheet, &format!("A{}", row), procedure.position);
                    book.set_cell(sheet, &format!("B{}", row), procedure.name.as_str());
                    book.set_cell(sheet, &format!("C{}", row), procedure.description.as_str());
                    book.set_cell(sheet, &format!("D{}", row), procedure.parameters.join(", "));
                }
            }
        }

        book.set_cell(
            PRIMARY_SHEET,
            &self.layout.observations_cell,
            section.observations.as_str(),
        );
    }

    fn fill_application(
        &self,
        book: &mut Workbook,
        claims: &mut SheetClaims,
        section: &ApplicationChangeSet,
    ) {
        book.set_cell(PRIMARY_SHEET, "C10", section.component.as_str());
        book.set_cell(PRIMARY_SHEET, "C11", section.repository_url.as_str());
        book.set_cell(PRIMARY_SHEET, "C12", section.branch.as_str());

        if !section.files.is_empty() {
            if let Some(sheet) = claims.claim(book.sheets(), &FILE_SHEET_KEYWORDS) {
                for (i, file) in section.files.iter().enumerate() {
                    let row = self.item_row(i);
                    book.set_cell(sheet, &format!("A{}", row), file.path.as_str());
                    book.set_cell(sheet, &format!("B{}", row), file.kind.as_str());
                    book.set_cell(sheet, &format!("C{}", row), file.description.as_str());
                }
            }
        }

        book.set_cell(
            PRIMARY_SHEET,
            &self.layout.observations_cell,
            section.observations.as_str(),
        );
    }

    fn item_row(&self, index: usize) -> u32 {
        self.layout.item_start_row + index as u32
    }
}

fn write_header(book: &mut Workbook, info: &BasicInfo, environment: Environment) {
    book.set_cell(PRIMARY_SHEET, "C2", info.requester.name.as_str());
    book.set_cell(PRIMARY_SHEET, "C3", info.requester.area.as_str());
    book.set_cell(
        PRIMARY_SHEET,
        "C4",
        info.requester.phone.clone().unwrap_or_default(),
    );
    book.set_cell(PRIMARY_SHEET, "A5", info.case_id.as_str());
    book.set_cell(PRIMARY_SHEET, "B5", info.title.as_str());
    book.set_cell(PRIMARY_SHEET, "A7", environment.label());
}

/// Tracks which sheets already received a sub-list.
#[derive(Default)]
struct SheetClaims {
    taken: Vec<usize>,
}

impl SheetClaims {
    /// First unclaimed sheet whose name contains one of `keywords`.
    fn claim(&mut self, sheets: &[SheetRef], keywords: &[&str]) -> Option<usize> {
        let found = sheets.iter().enumerate().find(|(i, sheet)| {
            let name = sheet.name.to_lowercase();
            !self.taken.contains(i) && keywords.iter().any(|k| name.contains(k))
        });
        match found {
            Some((i, sheet)) => {
                tracing::debug!("Sheet '{}' matched {:?}", sheet.name, keywords);
                self.taken.push(i);
                Some(i)
            }
            None => {
                tracing::warn!("No sheet matches {:?}, skipping list", keywords);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ooxml::fixtures::{part, workbook};
    use crate::models::{
        ChangeKind, FileChange, Requester, SqlScript, StatementKind, StoredProcedure,
    };
    use crate::store::{MemoryObjectStore, StoreHandle};
    use std::sync::Arc;

    const PRIMARY: &str = r#"<row r="2"><c r="C2" s="3"/></row><row r="3"><c r="C3"/></row><row r="4"><c r="C4"/></row><row r="5"><c r="A5"/><c r="B5"/></row><row r="7"><c r="A7" s="4"/></row><row r="10"><c r="C10"/></row><row r="11"><c r="C11"/></row><row r="12"><c r="C12"/></row><row r="20"><c r="A20"/></row>"#;
    const ITEMS: &str = r#"<row r="9"><c r="A9"/><c r="B9"/><c r="C9"/><c r="D9"/><c r="E9"/></row><row r="10"><c r="A10"/><c r="B10"/><c r="C10"/><c r="D10"/><c r="E10"/></row>"#;

    fn record() -> RequestRecord {
        RequestRecord {
            basic_info: Some(BasicInfo {
                case_id: "CDP-2024-001".to_string(),
                category: None,
                title: "Fix batch".to_string(),
                description: String::new(),
                requester: Requester {
                    name: "Ana".to_string(),
                    area: "TI".to_string(),
                    phone: None,
                },
                environments: vec![Environment::QA],
                request_date: None,
            }),
            ..Default::default()
        }
    }

    fn script(position: u32, name: &str) -> SqlScript {
        SqlScript {
            id: name.to_string(),
            position,
            name: name.to_string(),
            kind: StatementKind::Update,
            description: "desc".to_string(),
            body: "UPDATE t SET x = 1".to_string(),
        }
    }

    async fn generator_with(kind: TemplateKind, package: Vec<u8>) -> SpreadsheetGenerator {
        let store: StoreHandle = Arc::new(MemoryObjectStore::new("test"));
        let templates = TemplateRepository::new(store);
        templates.save_template(kind, &package, "t.xlsx").await.unwrap();
        SpreadsheetGenerator::new(templates, SheetLayout::default())
    }

    #[tokio::test]
    async fn test_missing_template() {
        let store: StoreHandle = Arc::new(MemoryObjectStore::new("test"));
        let generator =
            SpreadsheetGenerator::new(TemplateRepository::new(store), SheetLayout::default());
        let err = generator
            .generate(TemplateKind::Application, &record(), Environment::QA)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TemplateMissing(_)));
    }

    #[tokio::test]
    async fn test_database_form_header_and_lists() {
        let package = workbook(&[
            ("FBD", PRIMARY),
            ("Scripts de ejecución", ITEMS),
            ("Stored Procedures", ITEMS),
        ]);
        let generator = generator_with(TemplateKind::Database, package).await;
        let record = record().with_database_section(Some(DatabaseChangeSet {
            database: "SALES".to_string(),
            schema: "dbo".to_string(),
            scripts: vec![script(1, "first"), script(2, "second")],
            stored_procedures: vec![StoredProcedure {
                id: "p1".to_string(),
                position: 1,
                name: "sp_close".to_string(),
                description: String::new(),
                parameters: vec!["@id".to_string(), "@date".to_string()],
            }],
            observations: "Run at night".to_string(),
        }));

        let bytes = generator
            .generate(TemplateKind::Database, &record, Environment::PROD)
            .await
            .unwrap();

        let primary = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(primary.contains(r#"<c r="C2" s="3" t="inlineStr"><is><t xml:space="preserve">Ana</t>"#));
        assert!(primary.contains("PRODUCCIÓN"));
        assert!(primary.contains("SALES"));
        assert!(primary.contains("Run at night"));

        let scripts = part(&bytes, "xl/worksheets/sheet2.xml");
        assert!(scripts.contains(r#"<c r="A9"><v>1</v></c>"#));
        assert!(scripts.contains("second"));
        assert!(scripts.contains("UPDATE t SET x = 1"));

        let procedures = part(&bytes, "xl/worksheets/sheet3.xml");
        assert!(procedures.contains("sp_close"));
        assert!(procedures.contains("@id, @date"));
    }

    #[tokio::test]
    async fn test_pasted_control_characters_are_encoded() {
        let package = workbook(&[("FBD", PRIMARY)]);
        let generator = generator_with(TemplateKind::Database, package).await;
        let record = record().with_database_section(Some(DatabaseChangeSet {
            scripts: vec![script(1, "first")],
            observations: "Run\u{B}at night".to_string(),
            ..Default::default()
        }));

        let bytes = generator
            .generate(TemplateKind::Database, &record, Environment::QA)
            .await
            .unwrap();

        let primary = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(primary.contains("Run_x000B_at night"));
        assert!(!primary.contains('\u{B}'));
    }

    #[tokio::test]
    async fn test_sheet_claims_are_exclusive() {
        // One sheet matches both keyword lists; the second list is skipped.
        let package = workbook(&[("FBD", PRIMARY), ("Script procedures", ITEMS)]);
        let generator = generator_with(TemplateKind::Database, package).await;
        let record = record().with_database_section(Some(DatabaseChangeSet {
            scripts: vec![script(1, "only-script")],
            stored_procedures: vec![StoredProcedure {
                id: "p1".to_string(),
                position: 1,
                name: "sp_never".to_string(),
                description: String::new(),
                parameters: vec![],
            }],
            ..Default::default()
        }));

        let bytes = generator
            .generate(TemplateKind::Database, &record, Environment::QA)
            .await
            .unwrap();
        let sheet = part(&bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet.contains("only-script"));
        assert!(!sheet.contains("sp_never"));
    }

    #[tokio::test]
    async fn test_application_form_files() {
        let package = workbook(&[("FDA", PRIMARY), ("Archivos modificados", ITEMS)]);
        let generator = generator_with(TemplateKind::Application, package).await;
        let record = record().with_application_section(Some(ApplicationChangeSet {
            component: "billing-api".to_string(),
            repository_url: "https://git.example/billing".to_string(),
            branch: "release/1.2".to_string(),
            files: vec![FileChange {
                id: "f1".to_string(),
                path: "src/main.rs".to_string(),
                kind: ChangeKind::Modified,
                description: "entry point".to_string(),
            }],
            observations: String::new(),
        }));

        let bytes = generator
            .generate(TemplateKind::Application, &record, Environment::QA)
            .await
            .unwrap();
        let primary = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(primary.contains("release/1.2"));
        let files = part(&bytes, "xl/worksheets/sheet2.xml");
        assert!(files.contains("src/main.rs"));
        assert!(files.contains("Modified"));
    }

    #[tokio::test]
    async fn test_no_matching_sheet_is_skipped() {
        let package = workbook(&[("FBD", PRIMARY)]);
        let generator = generator_with(TemplateKind::Database, package).await;
        let record = record().with_database_section(Some(DatabaseChangeSet {
            scripts: vec![script(1, "lonely")],
            ..Default::default()
        }));

        let bytes = generator
            .generate(TemplateKind::Database, &record, Environment::QA)
            .await
            .unwrap();
        assert!(!part(&bytes, "xl/worksheets/sheet1.xml").contains("lonely"));
    }
}
