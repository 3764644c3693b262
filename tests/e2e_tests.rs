//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV test
//! fixtures. Each test:
//! 1. Seeds the ledger from accounts.csv (and pockets.csv when present)
//! 2. Replays transfers.csv through the engine
//! 3. Generates the ledger CSV
//! 4. Compares actual output with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Pocket transfers, including exact name matching and validation order
//! - Account transfers, including double application and self transfers
//! - Chains where an account passes on money it has just received
//! - Blocked accounts on either side of a transfer
//! - Malformed seed and transfer rows
//! - Decimal precision
//!
//! Each test is run twice: once with the synchronous strategy and once with the
//! async strategy. Both must produce the same ledger.

#[cfg(test)]
mod tests {
    use pocket_ledger::cli::StrategyType;
    use pocket_ledger::strategy::{create_strategy, BatchConfig, ReplayInput};
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::NamedTempFile;

    /// Run a test fixture and compare the ledger with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Output doesn't match expected
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = PathBuf::from(format!("tests/fixtures/{}", fixture_name));
        let pockets = fixture_dir.join("pockets.csv");
        let input = ReplayInput {
            accounts: fixture_dir.join("accounts.csv"),
            pockets: pockets.exists().then_some(pockets),
            transfers: fixture_dir.join("transfers.csv"),
        };
        let expected_path = fixture_dir.join("expected.csv");

        for path in [&input.accounts, &input.transfers, &expected_path] {
            assert!(path.exists(), "Fixture file not found: {}", path.display());
        }

        // Small batches so the async strategy crosses batch boundaries
        let strategy = create_strategy(strategy_type.clone(), Some(BatchConfig::new(3, 4)));

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        strategy
            .process(&input, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay transfers: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
            panic!(
                "Failed to read expected file {}: {}",
                expected_path.display(),
                e
            )
        });

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both strategies
    #[rstest]
    #[case("pocket_transfers")]
    #[case("account_transfers")]
    #[case("account_chain")]
    #[case("blocked_accounts")]
    #[case("malformed_data")]
    #[case("precision")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    #[rstest]
    fn test_missing_accounts_file_is_fatal(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let input = ReplayInput {
            accounts: Path::new("tests/fixtures/does_not_exist.csv").to_path_buf(),
            pockets: None,
            transfers: Path::new("tests/fixtures/pocket_transfers/transfers.csv").to_path_buf(),
        };

        let result = create_strategy(strategy, None).process(&input, &mut Vec::new());

        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
