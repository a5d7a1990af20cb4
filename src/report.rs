use crate::translate::{TranslationProvider, Translator};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Published column layout, A through K. Column widths in the worksheet are
/// addressed by letter, so this order is load-bearing.
pub const REPORT_HEADER: [&str; 11] = [
    "Assignees",
    "Title",
    "タイトル",
    "body",
    "ボディー",
    "Repository",
    "Status",
    "plan start",
    "plan finish",
    "real start",
    "real finish",
];

/// Worksheet column widths in pixels, keyed by column letter.
pub const COLUMN_WIDTHS: [(char, i64); 11] = [
    ('A', 150),
    ('B', 400),
    ('C', 400),
    ('D', 600),
    ('E', 600),
    ('F', 150),
    ('G', 150),
    ('H', 100),
    ('I', 100),
    ('J', 100),
    ('K', 100),
];

const REQUIRED_COLUMNS: [&str; 9] = [
    "Assignees",
    "Title",
    "body",
    "Repository",
    "Status",
    "plan start",
    "plan finish",
    "real start",
    "real finish",
];

/// One issue record as read from the export. Everything stays text; dates
/// pass through unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub assignee: String,
    pub title: String,
    pub body: String,
    pub repository: String,
    pub status: String,
    pub plan_start: String,
    pub plan_finish: String,
    pub real_start: String,
    pub real_finish: String,
}

/// The published form of a [`SourceRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub assignee: String,
    pub title: String,
    pub translated_title: String,
    pub body: String,
    pub translated_body: String,
    pub repository: String,
    pub status: String,
    pub plan_start: String,
    pub plan_finish: String,
    pub real_start: String,
    pub real_finish: String,
}

impl ReportRow {
    /// Cells in published column order (A–K), matching [`REPORT_HEADER`].
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.assignee.clone(),
            self.title.clone(),
            self.translated_title.clone(),
            self.body.clone(),
            self.translated_body.clone(),
            self.repository.clone(),
            self.status.clone(),
            self.plan_start.clone(),
            self.plan_finish.clone(),
            self.real_start.clone(),
            self.real_finish.clone(),
        ]
    }
}

pub fn header() -> Vec<String> {
    REPORT_HEADER.iter().map(|s| s.to_string()).collect()
}

/// Tracker handles replaced with display names in the published report.
/// Unmapped handles pass through unchanged.
pub fn display_name(assignee: &str) -> &str {
    match assignee {
        "dhanukakarunasena" => "Dhanuka",
        "malcolmSansen" => "Malcom",
        "shimizu39" => "Prashanti",
        "shimizuSarun" => "Saran",
        "SonSansen" => "Son",
        "HtetSansen" => "Htet",
        other => other,
    }
}

/// Load the semicolon-delimited export. A missing required column or an
/// unparseable record is fatal and names the problem.
pub fn load_rows(path: &Path) -> Result<Vec<SourceRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Error loading CSV file {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Error reading CSV header row")?
        .clone();

    let mut columns: HashMap<&str, usize> = HashMap::new();
    for (index, name) in headers.iter().enumerate() {
        columns.insert(name.trim(), index);
    }

    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = *columns
            .get(name)
            .with_context(|| format!("CSV is missing expected column '{}'", name))?;
    }
    let [assignee, title, body, repository, status, plan_start, plan_finish, real_start, real_finish] =
        indices;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Error parsing CSV record {}", line + 2))?;
        // Short records yield empty cells rather than failing; the published
        // table replaces every absent value with an empty string anyway.
        let cell = |index: usize| record.get(index).unwrap_or("").to_string();

        rows.push(SourceRow {
            assignee: cell(assignee),
            title: cell(title),
            body: cell(body),
            repository: cell(repository),
            status: cell(status),
            plan_start: cell(plan_start),
            plan_finish: cell(plan_finish),
            real_start: cell(real_start),
            real_finish: cell(real_finish),
        });
    }

    Ok(rows)
}

/// Build the published table: rename assignees, translate title and body,
/// and sort ascending by assignee (stable, so equal keys keep their input
/// order). Row count is preserved 1:1.
pub async fn process<P: TranslationProvider>(
    rows: Vec<SourceRow>,
    translator: &Translator<P>,
    source_lang: &str,
    target_lang: &str,
) -> Vec<ReportRow> {
    let titles: Vec<String> = rows.iter().map(|row| row.title.clone()).collect();
    let bodies: Vec<String> = rows.iter().map(|row| row.body.clone()).collect();

    let translated_titles = translator
        .batch_translate(&titles, source_lang, target_lang)
        .await;
    let translated_bodies = translator
        .batch_translate(&bodies, source_lang, target_lang)
        .await;

    let mut report: Vec<ReportRow> = rows
        .into_iter()
        .zip(translated_titles.into_iter().zip(translated_bodies))
        .map(|(row, (translated_title, translated_body))| ReportRow {
            assignee: display_name(&row.assignee).to_string(),
            title: row.title,
            translated_title,
            body: row.body,
            translated_body,
            repository: row.repository,
            status: row.status,
            plan_start: row.plan_start,
            plan_finish: row.plan_finish,
            real_start: row.real_start,
            real_finish: row.real_finish,
        })
        .collect();

    report.sort_by(|a, b| a.assignee.cmp(&b.assignee));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::TranslationProvider;
    use anyhow::Result;
    use tempfile::TempDir;

    struct EchoProvider;

    impl TranslationProvider for EchoProvider {
        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok(format!("ja:{}", text))
        }
    }

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write csv");
        path
    }

    const HEADER: &str =
        "Assignees;Title;body;Repository;Status;plan start;plan finish;real start;real finish";

    fn sample_row(assignee: &str, title: &str) -> SourceRow {
        SourceRow {
            assignee: assignee.to_string(),
            title: title.to_string(),
            body: format!("{} body", title),
            repository: "tracker".to_string(),
            status: "Open".to_string(),
            plan_start: "2024-03-01".to_string(),
            plan_finish: "2024-03-10".to_string(),
            real_start: String::new(),
            real_finish: String::new(),
        }
    }

    #[test]
    fn test_load_rows_reads_semicolon_delimited_export() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "project_2024-03-15.csv",
            &format!(
                "{}\nshimizu39;Fix login;Broken on mobile;app;Open;2024-03-01;2024-03-10;;\n",
                HEADER
            ),
        );

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].assignee, "shimizu39");
        assert_eq!(rows[0].title, "Fix login");
        assert_eq!(rows[0].body, "Broken on mobile");
        assert_eq!(rows[0].real_start, "");
        assert_eq!(rows[0].real_finish, "");
    }

    #[test]
    fn test_load_rows_column_order_does_not_matter() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "export.csv",
            "Title;Assignees;body;Repository;Status;plan start;plan finish;real start;real finish\n\
             Fix login;shimizu39;Broken;app;Open;;;;\n",
        );

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows[0].assignee, "shimizu39");
        assert_eq!(rows[0].title, "Fix login");
    }

    #[test]
    fn test_load_rows_missing_column_names_the_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "export.csv",
            "Assignees;Title;Repository;Status;plan start;plan finish;real start;real finish\n",
        );

        let err = load_rows(&path).unwrap_err();
        assert!(err.to_string().contains("missing expected column 'body'"));
    }

    #[test]
    fn test_load_rows_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_rows(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("Error loading CSV file"));
    }

    #[test]
    fn test_load_rows_short_record_fills_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "export.csv",
            &format!("{}\nshimizu39;Fix login\n", HEADER),
        );

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows[0].assignee, "shimizu39");
        assert_eq!(rows[0].body, "");
        assert_eq!(rows[0].status, "");
    }

    #[test]
    fn test_display_name_maps_known_handles() {
        assert_eq!(display_name("dhanukakarunasena"), "Dhanuka");
        assert_eq!(display_name("malcolmSansen"), "Malcom");
        assert_eq!(display_name("shimizu39"), "Prashanti");
        assert_eq!(display_name("shimizuSarun"), "Saran");
        assert_eq!(display_name("SonSansen"), "Son");
        assert_eq!(display_name("HtetSansen"), "Htet");
    }

    #[test]
    fn test_display_name_passes_unknown_handles_through() {
        assert_eq!(display_name("unknown_user"), "unknown_user");
        assert_eq!(display_name(""), "");
    }

    #[tokio::test]
    async fn test_process_renames_translates_and_sorts() {
        let translator = Translator::new(EchoProvider, 4);
        let rows = vec![
            sample_row("dhanukakarunasena", "Fix login"),
            sample_row("unknown_user", "Add metrics"),
            sample_row("HtetSansen", "Update docs"),
        ];

        let report = process(rows, &translator, "en", "ja").await;

        assert_eq!(report.len(), 3);
        // Sorted ascending by renamed assignee: Dhanuka, Htet, unknown_user.
        assert_eq!(report[0].assignee, "Dhanuka");
        assert_eq!(report[1].assignee, "Htet");
        assert_eq!(report[2].assignee, "unknown_user");
        assert_eq!(report[0].translated_title, "ja:Fix login");
        assert_eq!(report[0].translated_body, "ja:Fix login body");
        // Untranslated originals are kept alongside.
        assert_eq!(report[0].title, "Fix login");
    }

    #[tokio::test]
    async fn test_process_is_stable_for_equal_assignees() {
        let translator = Translator::new(EchoProvider, 4);
        let rows = vec![
            sample_row("SonSansen", "first"),
            sample_row("HtetSansen", "middle"),
            sample_row("SonSansen", "second"),
        ];

        let report = process(rows, &translator, "en", "ja").await;

        assert_eq!(report[0].assignee, "Htet");
        assert_eq!(report[1].title, "first");
        assert_eq!(report[2].title, "second");
    }

    #[tokio::test]
    async fn test_process_preserves_row_count_and_blank_cells() {
        let translator = Translator::new(EchoProvider, 4);
        let mut row = sample_row("unknown_user", "Task");
        row.body = String::new();
        let rows = vec![row; 5];

        let report = process(rows, &translator, "en", "ja").await;

        assert_eq!(report.len(), 5);
        for row in &report {
            assert_eq!(row.body, "");
            assert_eq!(row.translated_body, "");
        }
    }

    #[tokio::test]
    async fn test_process_empty_table_is_empty() {
        let translator = Translator::new(EchoProvider, 4);
        let report = process(Vec::new(), &translator, "en", "ja").await;
        assert!(report.is_empty());
    }

    #[test]
    fn test_header_matches_cells_width() {
        let row = sample_row("unknown_user", "Task");
        let report = ReportRow {
            assignee: row.assignee,
            title: row.title,
            translated_title: String::new(),
            body: row.body,
            translated_body: String::new(),
            repository: row.repository,
            status: row.status,
            plan_start: row.plan_start,
            plan_finish: row.plan_finish,
            real_start: row.real_start,
            real_finish: row.real_finish,
        };

        assert_eq!(header().len(), report.cells().len());
        assert_eq!(header().len(), COLUMN_WIDTHS.len());
    }
}
