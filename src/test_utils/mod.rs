//! Shared test utilities for cvm.
//!
//! In-memory stand-ins for the embedder, the embedding store and the
//! candidate store, so rankers can be exercised without SQLite or files.

pub mod doubles;
pub mod fixtures;

pub use doubles::{MemoryCandidates, MemoryEmbeddingStore, StubEmbedder};
pub use fixtures::UnitTestFixture;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

/// Run table-driven tests, naming the failing case.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F)
where
    I: std::fmt::Debug + Clone,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E,
{
    for case in cases {
        println!("[TEST] Running: {}", case.name);
        println!("[TEST] Input: {:?}", case.input);

        let actual = test_fn(case.input.clone());

        println!("[TEST] Expected: {:?}", case.expected);
        println!("[TEST] Actual: {:?}", actual);
        assert_eq!(actual, case.expected, "Test '{}' failed", case.name);
    }
}
