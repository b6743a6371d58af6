//! Exercises the compile and validate commands against a scratch layout.

use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use stratc_cli::commands::compile::{compile_command, CompileArgs};
use stratc_cli::commands::validate::{validate_command, ValidateArgs};
use stratc_cli::config::CliConfig;
use stratc_cli::CliError;
use tempfile::TempDir;

const DYNAMIC_MARKET_MAKER: &str = include_str!("../../../strategies/dynamic_market_maker.py");
const MARKET_MAKER: &str = include_str!("../../../strategies/market_maker.py");
const SPREAD_WATCHER: &str = include_str!("../../../strategies/spread_watcher.py");
const SURE_BETS: &str = include_str!("../../../strategies/sure_bets.py");
const ORDER_TEST: &str = include_str!("../../../strategies/order_test.py");

fn workspace() -> (TempDir, CliConfig) {
    let dir = TempDir::new().unwrap();
    let mut config = CliConfig::default();
    config.paths.strategies = dir.path().join("strategies");
    config.paths.output = dir.path().join("engine/src/strategies");
    config.paths.tests = dir.path().join("engine/tests");
    fs::create_dir_all(&config.paths.strategies).unwrap();
    (dir, config)
}

fn seed(config: &CliConfig, sources: &[(&str, &str)]) {
    for (name, source) in sources {
        fs::write(
            config.paths.strategies.join(format!("{name}.py")),
            source,
        )
        .unwrap();
    }
    // generated outputs must end up strictly newer than the sources
    sleep(Duration::from_millis(10));
}

fn compile_all(emit_tests: bool) -> CompileArgs {
    CompileArgs {
        name: None,
        all: true,
        force: false,
        emit_tests,
    }
}

fn mtime(path: &Path) -> std::time::SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

#[test]
fn test_compile_all_writes_modules_tests_and_registry() {
    let (_dir, config) = workspace();
    seed(
        &config,
        &[
            ("dynamic_market_maker", DYNAMIC_MARKET_MAKER),
            ("market_maker", MARKET_MAKER),
            ("order_test", ORDER_TEST),
            ("spread_watcher", SPREAD_WATCHER),
            ("sure_bets", SURE_BETS),
        ],
    );

    compile_command(compile_all(true), &config).unwrap();

    for name in [
        "dynamic_market_maker",
        "market_maker",
        "spread_watcher",
        "sure_bets",
    ] {
        assert!(
            config.paths.output.join(format!("{name}.rs")).exists(),
            "missing generated module for {name}"
        );
        assert!(
            config.paths.tests.join(format!("{name}_test.rs")).exists(),
            "missing test scaffold for {name}"
        );
    }
    // opted out of transpilation
    assert!(!config.paths.output.join("order_test.rs").exists());
    // discovery scaffolds share the fixtures module
    assert!(config.paths.tests.join("fixtures.rs").exists());

    let mod_rs = fs::read_to_string(config.paths.output.join("mod.rs")).unwrap();
    assert!(mod_rs.contains("mod dynamic_market_maker;"));
    assert!(mod_rs.contains("mod market_maker;"));
    assert!(mod_rs.contains("mod spread_watcher;"));
    assert!(mod_rs.contains("mod sure_bets;"));
    assert!(!mod_rs.contains("order_test"));
    assert!(mod_rs.contains("requires_market_discovery: true,"));
}

#[test]
fn test_recompile_skips_up_to_date_outputs() {
    let (_dir, config) = workspace();
    seed(&config, &[("market_maker", MARKET_MAKER)]);

    compile_command(compile_all(false), &config).unwrap();
    let output = config.paths.output.join("market_maker.rs");
    let first = mtime(&output);

    sleep(Duration::from_millis(10));
    compile_command(compile_all(false), &config).unwrap();
    assert_eq!(first, mtime(&output), "unchanged source was regenerated");

    sleep(Duration::from_millis(10));
    let mut force = compile_all(false);
    force.force = true;
    compile_command(force, &config).unwrap();
    assert!(mtime(&output) > first, "--force did not regenerate");
}

#[test]
fn test_touched_source_recompiles() {
    let (_dir, config) = workspace();
    seed(&config, &[("market_maker", MARKET_MAKER)]);

    compile_command(compile_all(false), &config).unwrap();
    let output = config.paths.output.join("market_maker.rs");
    let first = mtime(&output);

    sleep(Duration::from_millis(10));
    fs::write(
        config.paths.strategies.join("market_maker.py"),
        MARKET_MAKER,
    )
    .unwrap();
    sleep(Duration::from_millis(10));

    compile_command(compile_all(false), &config).unwrap();
    assert!(mtime(&output) > first, "touched source was not recompiled");
}

#[test]
fn test_compile_single_strategy_by_name() {
    let (_dir, config) = workspace();
    seed(
        &config,
        &[
            ("market_maker", MARKET_MAKER),
            ("sure_bets", SURE_BETS),
        ],
    );

    let args = CompileArgs {
        name: Some("sure_bets".to_string()),
        all: false,
        force: false,
        emit_tests: false,
    };
    compile_command(args, &config).unwrap();

    assert!(config.paths.output.join("sure_bets.rs").exists());
    assert!(!config.paths.output.join("market_maker.rs").exists());
    let mod_rs = fs::read_to_string(config.paths.output.join("mod.rs")).unwrap();
    assert!(mod_rs.contains("mod sure_bets;"));
    assert!(!mod_rs.contains("market_maker"));
}

#[test]
fn test_name_and_all_are_mutually_exclusive() {
    let (_dir, config) = workspace();
    let args = CompileArgs {
        name: Some("sure_bets".to_string()),
        all: true,
        force: false,
        emit_tests: false,
    };
    assert!(matches!(
        compile_command(args, &config),
        Err(CliError::InvalidInput(_))
    ));

    let neither = CompileArgs {
        name: None,
        all: false,
        force: false,
        emit_tests: false,
    };
    assert!(matches!(
        compile_command(neither, &config),
        Err(CliError::InvalidInput(_))
    ));
}

#[test]
fn test_unknown_strategy_name_is_rejected() {
    let (_dir, config) = workspace();
    let args = CompileArgs {
        name: Some("missing".to_string()),
        all: false,
        force: false,
        emit_tests: false,
    };
    assert!(matches!(
        compile_command(args, &config),
        Err(CliError::InvalidInput(_))
    ));
}

#[test]
fn test_compile_failure_reports_and_writes_nothing_for_it() {
    let (_dir, config) = workspace();
    let bad = r#"
@strategy(name="bad", tokens=["1"])
def on_tick(ctx):
    best = max(1, 2)
    return []
"#;
    seed(
        &config,
        &[("bad", bad), ("market_maker", MARKET_MAKER)],
    );

    let err = compile_command(compile_all(false), &config).unwrap_err();
    assert!(matches!(err, CliError::Compilation(_)));

    // the healthy strategy still landed
    assert!(config.paths.output.join("market_maker.rs").exists());
    assert!(!config.paths.output.join("bad.rs").exists());
}

#[test]
fn test_force_compiles_past_validation_errors() {
    let (_dir, config) = workspace();
    let bad = r#"
@strategy(name="bad", tokens=["1"])
def on_tick(ctx):
    best = max(1, 2)
    return []
"#;
    seed(&config, &[("bad", bad)]);

    let mut force = compile_all(false);
    force.force = true;
    compile_command(force, &config).unwrap();

    let generated = fs::read_to_string(config.paths.output.join("bad.rs")).unwrap();
    assert!(generated.contains("max("), "forced output keeps the untranslated call");
}

#[test]
fn test_validate_command_passes_clean_tree() {
    let (_dir, config) = workspace();
    seed(
        &config,
        &[
            ("dynamic_market_maker", DYNAMIC_MARKET_MAKER),
            ("order_test", ORDER_TEST),
            ("sure_bets", SURE_BETS),
        ],
    );

    let args = ValidateArgs {
        name: None,
        all: true,
        explain: false,
    };
    validate_command(args, &config).unwrap();
}

#[test]
fn test_validate_command_fails_on_unsupported_code() {
    let (_dir, config) = workspace();
    let bad = r#"
@strategy(name="bad", tokens=["1"])
def on_tick(ctx):
    prices = [b.price for b in books]
    return []
"#;
    seed(&config, &[("bad", bad)]);

    let args = ValidateArgs {
        name: None,
        all: true,
        explain: false,
    };
    assert!(matches!(
        validate_command(args, &config),
        Err(CliError::Compilation(_))
    ));
}
