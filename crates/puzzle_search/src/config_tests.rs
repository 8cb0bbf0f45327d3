use super::*;

#[test]
fn test_empty_config_uses_defaults() {
    let config = PuzzleConfig::from_toml_str("").unwrap();
    assert_eq!(config, PuzzleConfig::default());
    assert_eq!(config.search.max_depth, 6);
    assert_eq!(config.search.max_survivors_per_class, 5);
    assert_eq!(config.search.survivor_bias, SurvivorBias::Lowest);
    assert_eq!(config.oracle.program, "stockfish");
    assert_eq!(config.oracle.depth, 8);
    assert_eq!(config.heuristics.pin_constant, 21.0);
}

#[test]
fn test_partial_sections_override_fields() {
    let text = r#"
        [search]
        max_depth = 4
        survivor_bias = "highest"
        seed = 7

        [oracle]
        program = "/usr/local/bin/stockfish"
        depth = 12

        [heuristics.values]
        queen = 9.0
    "#;
    let config = PuzzleConfig::from_toml_str(text).unwrap();
    assert_eq!(config.search.max_depth, 4);
    assert_eq!(config.search.survivor_bias, SurvivorBias::Highest);
    assert_eq!(config.search.seed, Some(7));
    assert_eq!(config.search.shallow_depth, 3);
    assert_eq!(config.oracle.program, "/usr/local/bin/stockfish");
    assert_eq!(config.oracle.depth, 12);
    assert_eq!(config.oracle.hash_mb, 64);
    assert_eq!(config.heuristics.values.queen, 9.0);
    assert_eq!(config.heuristics.values.rook, 5.63);
}

#[test]
fn test_invalid_values_rejected() {
    assert!(matches!(
        PuzzleConfig::from_toml_str("[search]\nmax_depth = 0"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        PuzzleConfig::from_toml_str("[search]\nconcurrency = 0"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        PuzzleConfig::from_toml_str("[heuristics]\nsacrifice_constants = []"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        PuzzleConfig::from_toml_str("[search]\nmax_depth = \"deep\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file() {
    let err = PuzzleConfig::load(Path::new("/nonexistent/puzzle.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
