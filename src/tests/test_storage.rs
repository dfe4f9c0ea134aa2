use crate::storage::StorageError;
use crate::storage::checkpoint::FileLog;
use crate::storage::text::*;
use crate::tests::init;
use biseriation_core::checkpoint::LOG_HEADER;
use biseriation_core::{Placement, PlacementLog, SparseMatrix, SparseVector};
use tempfile::TempDir;

#[test]
fn test_parse_row_with_and_without_label() {
    init();
    let (label, row) = parse_sparse_row("alpha 1:0.5 4:2").unwrap();
    assert_eq!(label.as_deref(), Some("alpha"));
    assert_eq!(row.unwrap().entries(), &[(1, 0.5), (4, 2.0)]);

    let (label, row) = parse_sparse_row("  0:1   3:-2.5 ").unwrap();
    assert!(label.is_none());
    assert_eq!(row.unwrap().entries(), &[(0, 1.0), (3, -2.5)]);
}

#[test]
fn test_parse_empty_and_label_only_lines() {
    init();
    assert_eq!(parse_sparse_row("").unwrap(), (None, None));
    assert_eq!(parse_sparse_row("   \t").unwrap(), (None, None));

    let (label, row) = parse_sparse_row("gamma").unwrap();
    assert_eq!(label.as_deref(), Some("gamma"));
    assert!(row.unwrap().is_empty());
}

#[test]
fn test_parse_errors() {
    init();
    assert!(matches!(
        parse_sparse_row("1:x"),
        Err(StorageError::Parse(_))
    ));
    assert!(matches!(
        parse_sparse_row("-1:2"),
        Err(StorageError::Parse(_))
    ));
    // unsorted indices
    assert!(parse_sparse_row("3:1 1:1").is_err());

    let err = parse_sparse_matrix("0:1\n0:1 oops:2\n").unwrap_err();
    assert!(err.to_string().contains("line 2"), "{}", err);
}

#[test]
fn test_read_write_round_trip() {
    init();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("m.dat");
    std::fs::write(&path, "a 1:0.25 3:4\n\nb\nc 2:1e-3\n").unwrap();

    let loaded = read_sparse_matrix(&path).unwrap();
    assert_eq!(loaded.row_count(), 4);
    assert!(loaded.has_labels());
    assert!(!loaded.matrix.is_present(1));
    assert!(loaded.matrix.row(2).unwrap().is_empty());
    assert_eq!(loaded.label(3), Some("c"));

    let out = dir.path().join("out.dat");
    write_sparse_matrix(&out, &loaded).unwrap();
    let reloaded = read_sparse_matrix(&out).unwrap();
    assert_eq!(reloaded, loaded);
}

#[test]
fn test_identity_order_round_trip() {
    init();
    let dir = TempDir::new().unwrap();
    let matrix = SparseMatrix::from_dense(&[vec![1.5, 0.0, 2.0], vec![0.0, 0.0, 7.0]]);
    let data = LabelledMatrix::new(matrix);
    let identity: Vec<usize> = (0..data.row_count()).collect();

    let path = dir.path().join("identity.dat");
    write_sparse_matrix(&path, &data.rearranged(&identity)).unwrap();
    assert_eq!(read_sparse_matrix(&path).unwrap().matrix, data.matrix);
}

#[test]
fn test_rearranged_moves_labels_with_rows() {
    init();
    let matrix = SparseMatrix::new(vec![
        Some(SparseVector::from_pairs(vec![(0, 1.0)]).unwrap()),
        Some(SparseVector::from_pairs(vec![(0, 2.0)]).unwrap()),
    ]);
    let data =
        LabelledMatrix::with_labels(matrix, vec![Some("x".into()), Some("y".into())]).unwrap();
    let swapped = data.rearranged(&[1, 0]);
    assert_eq!(swapped.label(0), Some("y"));
    assert_eq!(swapped.matrix.row(0).unwrap().get(0), 2.0);

    assert!(LabelledMatrix::with_labels(SparseMatrix::default(), vec![None]).is_err());
}

#[test]
fn test_index_and_value_lists() {
    init();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("order.txt");
    write_index_list(&path, &[3, 0, 2, 1]).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "3\n0\n2\n1\n");
    assert_eq!(read_index_list(&path).unwrap(), vec![3, 0, 2, 1]);

    let path = dir.path().join("scale.dat");
    write_f64_list(&path, &[0.0, 1.5]).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "0\n1.5\n");
}

#[test]
fn test_missing_file_is_io_error() {
    init();
    let dir = TempDir::new().unwrap();
    let err = read_sparse_matrix(dir.path().join("nope.dat")).unwrap_err();
    assert!(matches!(err, StorageError::Io(_)));
}

#[test]
fn test_file_log_append_and_replay() {
    init();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.txt");
    let mut log = FileLog::new(&path);
    assert!(log.replay().unwrap().is_empty());

    log.reset().unwrap();
    log.append(Placement::Seed(2)).unwrap();
    log.append(Placement::Left(0)).unwrap();
    log.append(Placement::Right(1)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, format!("{}\nS 2\nL 0\nR 1\n", LOG_HEADER));

    // a fresh handle continues the same file
    let mut reopened = FileLog::new(&path);
    reopened.append(Placement::Left(3)).unwrap();
    assert_eq!(
        reopened.replay().unwrap(),
        vec![
            Placement::Seed(2),
            Placement::Left(0),
            Placement::Right(1),
            Placement::Left(3)
        ]
    );
}

#[test]
fn test_file_log_upgrades_legacy_file() {
    init();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.txt");
    std::fs::write(&path, "4\n1\n").unwrap();

    let mut log = FileLog::new(&path);
    log.append(Placement::Right(0)).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(LOG_HEADER));
    assert_eq!(
        log.replay().unwrap(),
        vec![Placement::Right(4), Placement::Right(1), Placement::Right(0)]
    );
}

#[test]
fn test_file_log_reset_truncates() {
    init();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.txt");
    let mut log = FileLog::new(&path);
    log.append(Placement::Seed(0)).unwrap();
    log.reset().unwrap();
    assert!(log.replay().unwrap().is_empty());
    log.append(Placement::Seed(1)).unwrap();
    assert_eq!(log.replay().unwrap(), vec![Placement::Seed(1)]);
}
