//! End-to-end checks of retrograde generation and heuristics on real
//! game positions.

use puzzle_core::{
    HeuristicConfig, Motif, MoveClass, PieceKind, Position, RetrogradeGenerator, RulesEngine, ShakmatyRules, Square,
    TacticalHeuristics,
};

const MIDGAME: &str = "6R1/1ppk1Np1/p6p/2b5/8/PnP5/1P3PPP/6K1 b - - 0 29";

fn pos(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

// =============================================================================
// Retrograde generation
// =============================================================================

#[test]
fn test_midgame_knight_back_moves_to_f7() {
    let target = pos(MIDGAME);
    let gen = RetrogradeGenerator::new(ShakmatyRules::new());
    let out = gen.generate(&target);

    let f7: Square = "f7".parse().unwrap();
    let knight_moves: Vec<String> = out[&MoveClass::Legal]
        .iter()
        .filter(|p| p.mv.to == f7)
        .map(|p| p.mv.to_string())
        .collect();
    assert!(!knight_moves.is_empty());
    // h6 holds a black pawn, so the knight cannot have come from there.
    assert!(knight_moves.contains(&"d6f7".to_string()));
    assert!(knight_moves.contains(&"h8f7".to_string()));
    assert!(!knight_moves.contains(&"h6f7".to_string()));

    for pred in &out[&MoveClass::Legal] {
        let piece = pred.position.piece_at(pred.mv.from).unwrap();
        assert_ne!(piece.kind, PieceKind::Pawn);
    }
}

#[test]
fn test_midgame_uncaptures_never_restore_a_king() {
    let target = pos(MIDGAME);
    let gen = RetrogradeGenerator::new(ShakmatyRules::new());
    let out = gen.generate(&target);

    assert!(!out[&MoveClass::Uncapture].is_empty());
    for pred in &out[&MoveClass::Uncapture] {
        assert_ne!(pred.uncaptured, Some(PieceKind::King));
        assert_ne!(pred.uncaptured, None);
    }
}

#[test]
fn test_midgame_every_candidate_is_sound() {
    let rules = ShakmatyRules::new();
    let target = pos(MIDGAME);
    let gen = RetrogradeGenerator::new(rules);
    for (class, preds) in gen.generate(&target) {
        for pred in preds {
            assert_eq!(pred.class, class);
            assert!(rules.validate_position(&pred.position));
            let after = rules.apply_move(&pred.position, pred.mv).unwrap();
            assert!(after.same_board(&target), "{class} {} does not replay", pred.mv);
        }
    }
}

#[test]
fn test_two_levels_back_stay_sound() {
    let rules = ShakmatyRules::new();
    let gen = RetrogradeGenerator::new(rules);
    let root = pos("8/8/3k4/8/8/2K5/3Q4/8 b - - 0 40");

    let mut checked = 0;
    for (_, preds) in gen.generate(&root) {
        for pred in preds.iter().take(3) {
            for (_, earlier) in gen.generate(&pred.position) {
                for e in earlier {
                    let after = rules.apply_move(&e.position, e.mv).unwrap();
                    assert!(after.same_board(&pred.position));
                    checked += 1;
                }
            }
        }
    }
    assert!(checked > 0);
}

// =============================================================================
// Heuristics
// =============================================================================

#[test]
fn test_pin_scenario() {
    let h = TacticalHeuristics::new(ShakmatyRules::new(), HeuristicConfig::default());
    let result = h.evaluate_position(&pos("4k3/8/8/4q3/8/8/8/4R2K w - - 0 1"));
    let pin = result.get(Motif::Pin);
    assert!(pin.triggered);
    assert!((pin.magnitude - 24.5 / 21.0).abs() < 1e-9);
}

#[test]
fn test_fork_scenario() {
    let h = TacticalHeuristics::new(ShakmatyRules::new(), HeuristicConfig::default());
    let result = h.evaluate_position(&pos("7k/2q5/8/3N4/8/4r3/8/K7 w - - 0 1"));
    let fork = result.get(Motif::Fork);
    assert!(fork.triggered);
    let expected = ((9.5 + 5.63) / 3.05 + 2.0) / 41.52;
    assert!((fork.magnitude - expected).abs() < 1e-9);
    assert!(result.total >= fork.magnitude);
}

#[test]
fn test_heuristics_on_every_midgame_candidate() {
    let rules = ShakmatyRules::new();
    let gen = RetrogradeGenerator::new(rules);
    let h = TacticalHeuristics::new(rules, HeuristicConfig::default());
    let root = pos(MIDGAME);

    for (_, preds) in gen.generate(&root) {
        for pred in preds {
            let result = h.evaluate(&pred.position, Some(&root), 1);
            assert!(result.total.is_finite());
            assert!(result.total >= 0.0);
            let summed: f64 = result
                .triggered()
                .map(|m| result.get(m).magnitude)
                .sum();
            assert!((summed - result.total).abs() < 1e-9);
        }
    }
}
