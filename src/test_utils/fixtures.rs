use std::path::PathBuf;

use tempfile::TempDir;

/// Test fixture providing an isolated data root.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl UnitTestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {:?}", data_path);

        Self { temp_dir, data_path }
    }

    /// Create a test file with content.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write a résumé CSV with `ID`, `Resume_str` and `Category` columns.
    pub fn create_resume_csv(&self, name: &str, rows: &[(&str, &str, &str)]) -> PathBuf {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["ID", "Resume_str", "Category"])
            .expect("Failed to write CSV header");
        for (id, resume, category) in rows {
            writer
                .write_record([*id, *resume, *category])
                .expect("Failed to write CSV row");
        }
        let bytes = writer.into_inner().expect("Failed to flush CSV");
        let content = String::from_utf8(bytes).expect("CSV is UTF-8");
        self.create_file(name, &content)
    }
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
