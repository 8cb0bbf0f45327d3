use super::*;
use crate::rules::ShakmatyRules;

fn pos(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

fn heuristics() -> TacticalHeuristics<ShakmatyRules> {
    TacticalHeuristics::new(ShakmatyRules::new(), HeuristicConfig::default())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_material_totals_skip_kings() {
    let h = heuristics();
    let start = pos("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    assert_eq!(h.material_totals(&start.grid), (41.52, 41.52));
    assert_eq!(h.material_totals(&pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1").grid), (0.0, 0.0));
}

#[test]
fn test_material_balanced_not_triggered() {
    let h = heuristics();
    let score = h.material(&pos("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
    assert!(!score.triggered);
    assert!(close(score.magnitude, 0.0));
}

#[test]
fn test_material_advantage_either_side() {
    let h = heuristics();
    let white_up = h.material(&pos("4k3/8/8/8/8/8/8/3QK3 w - - 0 1"));
    assert!(white_up.triggered);
    assert!(close(white_up.magnitude, 9.5 / 41.52));

    let black_up = h.material(&pos("3qk3/8/8/8/8/8/8/4K3 w - - 0 1"));
    assert!(black_up.triggered);
    assert!(close(black_up.magnitude, 9.5 / 41.52));

    // A pawn against the bishop pair.
    let small = h.material(&pos("2b1kb2/8/8/8/8/8/4P3/4K3 w - - 0 1"));
    assert!(small.triggered);

    // A single pawn among a lot of material stays under the margin.
    let near = h.material(&pos("r2qk2r/8/8/8/8/8/P7/R2QK2R w - - 0 1"));
    assert!(!near.triggered);
}

#[test]
fn test_sacrifice_measures_side_to_move_loss() {
    let h = heuristics();
    let start = pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
    let end = pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1");

    let score = h.sacrifice(&start, Some(&end), 3);
    assert!(score.triggered);
    assert!(close(score.magnitude, 5.63 / 20.76));

    // Sequences longer than the table use its last entry.
    let long = h.sacrifice(&start, Some(&end), 9);
    assert!(close(long.magnitude, 5.63 / 27.42));

    // Black to move in the start position: White's loss is a gain for Black.
    let start_black = pos("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
    assert!(!h.sacrifice(&start_black, Some(&end), 3).triggered);
}

#[test]
fn test_sacrifice_needs_a_line() {
    let h = heuristics();
    let p = pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
    assert_eq!(h.sacrifice(&p, None, 3), MotifScore::default());
    assert_eq!(h.sacrifice(&p, Some(&p), 0), MotifScore::default());
    assert!(!h.sacrifice(&p, Some(&p), 1).triggered);
}

#[test]
fn test_pin_queen_against_king() {
    let h = heuristics();
    let score = h.pin(&pos("4k3/8/8/4q3/8/8/8/4R2K w - - 0 1"));
    assert!(score.triggered);
    assert!(close(score.magnitude, (9.5 + 15.0) / 21.0));
}

#[test]
fn test_pin_requires_more_valuable_rear_piece() {
    let h = heuristics();
    let score = h.pin(&pos("k7/4r3/8/4q3/8/8/8/4R2K w - - 0 1"));
    assert!(!score.triggered);
}

#[test]
fn test_pin_looks_past_cheaper_pieces() {
    let h = heuristics();
    // The knight behind the queen is skipped; the king behind both counts.
    let score = h.pin(&pos("4k3/8/4n3/8/4q3/8/8/4R2K w - - 0 1"));
    assert!(score.triggered);
    assert!(close(score.magnitude, (9.5 + 15.0) / 21.0));
}

#[test]
fn test_pin_blocked_by_own_piece() {
    let h = heuristics();
    assert!(!h.pin(&pos("4k3/8/8/4q3/8/8/4P3/4R2K w - - 0 1")).triggered);
}

#[test]
fn test_pin_only_counts_side_to_move() {
    let h = heuristics();
    // Same board, but Black to move: Black's queen has nothing to pin.
    assert!(!h.pin(&pos("4k3/8/8/4q3/8/8/8/4R2K b - - 0 1")).triggered);
}

#[test]
fn test_bishop_skewer_on_diagonal() {
    let h = heuristics();
    // Bishop a1 looks through the knight on c3 at the rook on f6.
    let score = h.pin(&pos("7k/8/5r2/8/8/2n5/8/B6K w - - 0 1"));
    assert!(score.triggered);
    assert!(close(score.magnitude, (3.05 + 5.63) / 21.0));
}

#[test]
fn test_knight_fork() {
    let h = heuristics();
    let score = h.fork(&pos("7k/2q5/8/3N4/8/4r3/8/K7 w - - 0 1"));
    assert!(score.triggered);
    let expected = ((9.5 + 5.63) / 3.05 + 2.0) / 41.52;
    assert!(close(score.magnitude, expected));
}

#[test]
fn test_fork_ignores_cheaper_targets() {
    let h = heuristics();
    // The rook hits two pawns, which are worth less than the rook itself.
    let score = h.fork(&pos("7k/8/8/3p1R1p/8/8/8/K7 w - - 0 1"));
    assert!(!score.triggered);
    assert!(close(score.magnitude, 0.0));
}

#[test]
fn test_evaluate_totals_triggered_motifs() {
    let h = heuristics();
    let p = pos("4k3/8/8/4q3/8/8/8/4R2K w - - 0 1");
    let result = h.evaluate_position(&p);

    assert_eq!(result.motifs.len(), 4);
    assert!(result.get(Motif::Pin).triggered);
    assert!(result.get(Motif::Material).triggered);
    assert!(!result.get(Motif::Sacrifice).triggered);
    assert!(!result.get(Motif::Fork).triggered);

    let expected = (9.5 + 15.0) / 21.0 + (9.5 - 5.63) / 41.52;
    assert!((result.total - expected).abs() < 1e-6);
    assert_eq!(
        result.triggered().collect::<Vec<_>>(),
        vec![Motif::Material, Motif::Pin]
    );
}

#[test]
fn test_untriggered_magnitude_not_in_total() {
    let motifs = BTreeMap::from([
        (Motif::Material, MotifScore { triggered: false, magnitude: 0.5 }),
        (Motif::Pin, MotifScore { triggered: true, magnitude: 0.25 }),
    ]);
    let result = HeuristicResult::from_motifs(motifs);
    assert!(close(result.total, 0.25));
    assert_eq!(result.get(Motif::Fork), MotifScore::default());
}

#[test]
fn test_zero_constants_do_not_divide_by_zero() {
    let config = HeuristicConfig {
        pin_constant: 0.0,
        material_constant: 0.0,
        ..HeuristicConfig::default()
    };
    let h = TacticalHeuristics::new(ShakmatyRules::new(), config);
    let result = h.evaluate_position(&pos("4k3/8/8/4q3/8/8/8/4R2K w - - 0 1"));
    assert!(result.total.is_finite());
    assert!(!result.get(Motif::Pin).triggered);
}
