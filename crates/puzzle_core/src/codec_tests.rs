use super::*;

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

#[test]
fn test_decode_start_placement() {
    let grid = decode_placement(START).unwrap();
    assert_eq!(grid.char_at(0, 0), 'r');
    assert_eq!(grid.char_at(0, 4), 'k');
    assert_eq!(grid.char_at(7, 3), 'Q');
    assert_eq!(grid.char_at(4, 4), EMPTY);
    assert_eq!(grid.pieces().count(), 32);
}

#[test]
fn test_encode_inverts_decode() {
    for placement in [
        START,
        "6R1/1ppk1Np1/p6p/2b5/8/PnP5/1P3PPP/6K1",
        "8/8/8/8/8/8/8/8",
        "4k3/8/8/4q3/8/8/8/4R2K",
    ] {
        let grid = decode_placement(placement).unwrap();
        assert_eq!(encode_placement(&grid), placement);
    }
}

#[test]
fn test_decode_rejects_bad_rows() {
    assert_eq!(
        decode_placement("8/8/8/8/8/8/8"),
        Err(MalformedPosition::RowCount(7))
    );
    assert_eq!(
        decode_placement("9/8/8/8/8/8/8/8"),
        Err(MalformedPosition::RowWidth { row: 0, squares: 9 })
    );
    assert_eq!(
        decode_placement("ppppppppp/8/8/8/8/8/8/8"),
        Err(MalformedPosition::RowWidth { row: 0, squares: 9 })
    );
    assert_eq!(
        decode_placement("8/8/8/3x4/8/8/8/8"),
        Err(MalformedPosition::BadPiece('x'))
    );
}

#[test]
fn test_grid_display_uses_dash_for_empty() {
    let grid = decode_placement("4k3/8/8/8/8/8/8/4K3").unwrap();
    let text = grid.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "----k---");
    assert_eq!(lines[7], "----K---");
}

#[test]
fn test_square_index_mapping() {
    assert_eq!(index_to_square(1).unwrap().to_string(), "a8");
    assert_eq!(index_to_square(8).unwrap().to_string(), "h8");
    assert_eq!(index_to_square(57).unwrap().to_string(), "a1");
    assert_eq!(index_to_square(64).unwrap().to_string(), "h1");
    assert_eq!(index_to_square(0), Err(MalformedPosition::BadIndex(0)));
    assert_eq!(index_to_square(65), Err(MalformedPosition::BadIndex(65)));

    for idx in 1..=64 {
        assert_eq!(square_to_index(index_to_square(idx).unwrap()), idx);
    }
}

#[test]
fn test_grid_counts_and_kings() {
    let grid = decode_placement(START).unwrap();
    assert_eq!(grid.count(Color::White, PieceKind::Pawn), 8);
    assert_eq!(grid.count(Color::Black, PieceKind::Knight), 2);
    assert_eq!(grid.king_square(Color::White).unwrap().to_string(), "e1");
    assert_eq!(grid.king_square(Color::Black).unwrap().to_string(), "e8");
}

#[test]
fn test_set_and_get() {
    let mut grid = Grid::empty();
    let sq: Square = "d4".parse().unwrap();
    assert!(grid.is_empty(sq));
    grid.set(sq, Some(Piece::new(Color::Black, PieceKind::Queen)));
    assert_eq!(grid.char_at(4, 3), 'q');
    assert_eq!(encode_placement(&grid), "8/8/8/8/3q4/8/8/8");
}
