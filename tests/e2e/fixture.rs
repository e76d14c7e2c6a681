//! E2E test fixture: an isolated cvm root plus step logging.

use std::path::{Path, PathBuf};
use std::time::Instant;

use assert_cmd::Command;
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;

pub struct E2EFixture {
    pub scenario_name: String,
    pub temp_dir: TempDir,
    /// cvm data root
    pub root: PathBuf,
    start_time: Instant,
    step_count: usize,
}

impl E2EFixture {
    pub fn new(scenario_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("cvm");

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {scenario_name}");
        println!("{}", "█".repeat(70));
        println!("[E2E] Root: {root:?}");

        Self {
            scenario_name: scenario_name.to_string(),
            temp_dir,
            root,
            start_time: Instant::now(),
            step_count: 0,
        }
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {}", self.step_count, description);
        println!("│ Time: {:?}", self.start_time.elapsed());
        println!("└{}", "─".repeat(68));
    }

    /// Write `content` under the temp dir (outside the cvm root).
    pub fn write_input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cvm").expect("cvm binary");
        cmd.env_remove("RUST_LOG")
            .env("CVM_ROOT", &self.root)
            .env("CVM_CONFIG", self.root.join("config.toml"));
        cmd
    }

    /// Run `cvm --robot <args>` and parse stdout; panics on failure.
    pub fn run_robot(&self, args: &[&str]) -> Value {
        let output = self
            .command()
            .arg("--robot")
            .args(args)
            .output()
            .expect("Failed to run cvm");
        println!("[E2E] cvm {args:?} -> {}", output.status);
        assert!(
            output.status.success(),
            "cvm {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("robot output is JSON")
    }

    pub fn run_robot_with_path(&self, args: &[&str], path: &Path) -> Value {
        let path = path.to_str().expect("UTF-8 path");
        let mut all: Vec<&str> = args.to_vec();
        all.push(path);
        self.run_robot(&all)
    }

    pub fn db(&self) -> Connection {
        Connection::open(self.root.join("cv_database.db")).expect("Failed to open database")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.db()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query")
    }
}

impl Drop for E2EFixture {
    fn drop(&mut self) {
        println!(
            "[E2E] {} finished after {} steps in {:?}",
            self.scenario_name,
            self.step_count,
            self.start_time.elapsed()
        );
    }
}
