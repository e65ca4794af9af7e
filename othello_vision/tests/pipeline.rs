use image::{Rgb, RgbImage};
use othello_vision::{
    BoardGrid, BoardProcessor, BoardSize, CellState, CollectingSink, DebugStage, DirectorySink,
    ImageSequence, ImageSequenceWriter, Player, PositionString, ProcessorConfig, SmoothingParams,
    VisionError,
};
use std::path::Path;

const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const BLACK: Rgb<u8> = Rgb([15, 15, 15]);
const WHITE: Rgb<u8> = Rgb([240, 240, 240]);

/// Fills whole cells with the piece color over a neutral gray board.
fn paint_squares(size: BoardSize, side: u32, pieces: &[(u32, u32, CellState)]) -> RgbImage {
    let n = size.cells_per_side() as u32;
    let cell = side / n;
    let mut frame = RgbImage::from_pixel(side, side, GRAY);
    for &(row, col, state) in pieces {
        let color = match state {
            CellState::Black => BLACK,
            CellState::White => WHITE,
            CellState::Empty => GRAY,
        };
        for y in row * cell..(row + 1) * cell {
            for x in col * cell..(col + 1) * cell {
                frame.put_pixel(x, y, color);
            }
        }
    }
    frame
}

fn fast_config(size: BoardSize) -> ProcessorConfig {
    ProcessorConfig {
        board_size: size,
        resize_width: 160,
        skip_frames: 1,
        smoothing: SmoothingParams {
            diameter: 5,
            ..SmoothingParams::default()
        },
        ..ProcessorConfig::default()
    }
}

fn write_png(dir: &Path, name: &str, frame: &RgbImage) -> std::path::PathBuf {
    let path = dir.join(name);
    frame.save(&path).expect("write png");
    path
}

#[test]
fn diagonal_pieces_encode_column_major_with_default_settings() {
    let frame = paint_squares(
        BoardSize::Four,
        500,
        &[
            (0, 0, CellState::Black),
            (3, 3, CellState::Black),
            (1, 1, CellState::White),
            (2, 2, CellState::White),
        ],
    );
    let processor = BoardProcessor::new(ProcessorConfig::default()).unwrap();
    let report = processor.process_frame(&frame, None);

    assert_eq!(report.state.as_str(), "B----W----W----B");
    assert_eq!(report.grid[0], vec![1, 0, 0, 0]);
    assert_eq!(report.grid[1], vec![0, -1, 0, 0]);
    assert_eq!(report.piece_count.black, 2);
    assert_eq!(report.piece_count.white, 2);
    assert_eq!(report.piece_count.empty, 12);

    let decoded = BoardGrid::decode(&report.state, BoardSize::Four).unwrap();
    assert_eq!(decoded.get(3, 3), CellState::Black);
    assert_eq!(decoded.get(2, 2), CellState::White);
}

#[test]
fn process_image_reads_a_file_and_writes_debug_images() {
    let dir = tempfile::tempdir().unwrap();
    let frame = paint_squares(
        BoardSize::Eight,
        320,
        &[
            (3, 3, CellState::White),
            (3, 4, CellState::Black),
            (4, 3, CellState::Black),
            (4, 4, CellState::White),
        ],
    );
    let path = write_png(dir.path(), "opening.png", &frame);

    let processor = BoardProcessor::new(fast_config(BoardSize::Eight)).unwrap();
    let mut sink = DirectorySink::new(dir.path().join("masks")).unwrap();
    let report = processor.process_image(&path, Some(&mut sink)).unwrap();

    // Column-major: (3,3) -> 27, (4,3) -> 28, (3,4) -> 35, (4,4) -> 36.
    let mut expected = vec!['-'; 64];
    expected[27] = 'W';
    expected[28] = 'B';
    expected[35] = 'B';
    expected[36] = 'W';
    let expected: String = expected.into_iter().collect();
    assert_eq!(
        report.state,
        PositionString::parse(&expected, BoardSize::Eight).unwrap()
    );
    assert_eq!(report.image_path.as_deref(), Some(path.as_path()));
    for stage in [DebugStage::Smoothed, DebugStage::PieceMask, DebugStage::FirstCellWhiteMask] {
        assert!(sink.path_for("opening", stage).exists(), "{stage:?} not written");
    }
}

#[test]
fn unreadable_image_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not an image").unwrap();

    let processor = BoardProcessor::new(fast_config(BoardSize::Four)).unwrap();
    match processor.process_image(&path, None) {
        Err(VisionError::ImageLoad { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected ImageLoad, got {other:?}"),
    }
    assert!(processor.process_image(dir.path().join("missing.png"), None).is_err());
}

#[test]
fn tracks_moves_through_an_image_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let frames_dir = dir.path().join("frames");
    let mut writer = ImageSequenceWriter::create(&frames_dir).unwrap();

    let empty = paint_squares(BoardSize::Four, 160, &[]);
    let first = paint_squares(BoardSize::Four, 160, &[(1, 2, CellState::Black)]);
    let second = paint_squares(
        BoardSize::Four,
        160,
        &[(1, 2, CellState::Black), (2, 1, CellState::White)],
    );
    // Seed, then each position shows up once while moving and once settled.
    for frame in [&empty, &empty, &first, &first, &second, &second, &second] {
        use othello_vision::FrameSink;
        writer.write_frame(frame).unwrap();
    }

    let processor = BoardProcessor::new(fast_config(BoardSize::Four)).unwrap();
    let mut source = ImageSequence::from_dir(&frames_dir).unwrap();
    let mut annotated = CollectingSink::default();
    let report = processor
        .process_video(&mut source, Some(&mut annotated), None)
        .unwrap();

    assert_eq!(report.total_frames, 6);
    assert_eq!(report.total_moves, 2);
    assert_eq!(report.moves[0].player, Player::One);
    assert_eq!(report.moves[0].frame, 2);
    assert_eq!(report.moves[0].state.as_str(), "---------B------");
    assert_eq!(report.moves[1].player, Player::Two);
    assert_eq!(report.moves[1].frame, 4);
    assert_eq!(report.moves[1].state.as_str(), "------W--B------");
    // Ticks 1 and 3 moved; the other four were read and annotated.
    assert_eq!(annotated.frames.len(), 4);
    assert!(annotated.finished);

    let text = report.moves_as_text();
    assert_eq!(
        text,
        "Move 1: Player 1 - ---------B------ (frame 2)\nMove 2: Player 2 - ------W--B------ (frame 4)"
    );
}

#[test]
fn empty_sequence_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let processor = BoardProcessor::new(fast_config(BoardSize::Four)).unwrap();
    let mut source = ImageSequence::from_dir(dir.path()).unwrap();
    assert!(matches!(
        processor.process_video(&mut source, None, None),
        Err(VisionError::EmptyVideo(_))
    ));
}

#[test]
fn config_file_drives_the_processor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "board_size": 8, "resize_width": 160, "smoothing": { "diameter": 5 } }"#,
    )
    .unwrap();
    let config = ProcessorConfig::from_json_file(&path).unwrap();
    assert_eq!(config.board_size, BoardSize::Eight);
    assert_eq!(config.smoothing.sigma_color, 190.0);

    std::fs::write(&path, r#"{ "board_size": 6 }"#).unwrap();
    assert!(ProcessorConfig::from_json_file(&path).is_err());

    std::fs::write(&path, r#"{ "smoothing": { "sigma_color": 0.0 } }"#).unwrap();
    assert!(matches!(
        ProcessorConfig::from_json_file(&path),
        Err(VisionError::InvalidConfig(_))
    ));
}
