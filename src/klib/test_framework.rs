//! Framework de testes do kernel
//!
//! Suites rodam no boot (feature `self_test`), sem `core::fmt` e sem heap:
//! cada caso é uma função `fn() -> TestResult`.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skip,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa suite de testes. Retorna (passed, failed, skipped).
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    crate::kinfo!("=== Executando suite:");
    crate::kinfo!(name);

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        match (test.func)() {
            TestResult::Pass => {
                crate::kok!(test.name);
                passed += 1;
            }
            TestResult::Fail => {
                crate::kfail!(test.name);
                failed += 1;
            }
            TestResult::Skip => {
                crate::kwarn!(test.name);
                skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", passed);
    if failed > 0 {
        crate::kerror!("Resultados: failed=", failed);
    }
    (passed, failed, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass() -> TestResult {
        TestResult::Pass
    }

    fn fail() -> TestResult {
        TestResult::Fail
    }

    fn skip() -> TestResult {
        TestResult::Skip
    }

    #[test]
    fn counts_each_outcome() {
        let suite = [
            TestCase::new("a", pass),
            TestCase::new("b", fail),
            TestCase::new("c", pass),
            TestCase::new("d", skip),
        ];
        assert_eq!(run_test_suite("demo", &suite), (2, 1, 1));
    }
}
