use crate::axis::{AxisSeriation, Orientation};
use crate::config::Heuristic;
use crate::storage::StorageError;
use crate::storage::checkpoint::FileLog;
use crate::storage::text::{LabelledMatrix, read_index_list};
use crate::tests::init;
use approx::assert_relative_eq;
use biseriation_core::{
    DistanceKind, MemoryLog, ModelParams, NoLog, SparseMatrix, SparseVector,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn axis(matrix: SparseMatrix, orientation: Orientation) -> AxisSeriation {
    AxisSeriation::new(
        matrix,
        orientation,
        DistanceKind::Euclidean,
        &ModelParams::default(),
        Box::new(NoLog),
        false,
    )
    .unwrap()
}

fn random_matrix(rows: usize, cols: usize, seed: u64) -> SparseMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let dense: Vec<Vec<f64>> = (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| {
                    if rng.random::<f64>() < 0.3 {
                        0.0
                    } else {
                        rng.random_range(1.0..10.0)
                    }
                })
                .collect()
        })
        .collect();
    SparseMatrix::from_dense(&dense)
}

#[test]
fn test_row_axis_left_right() {
    init();
    let m = SparseMatrix::from_dense(&[vec![5.0], vec![1.0], vec![3.0], vec![9.0]]);
    let mut rows = AxisSeriation::new(
        m,
        Orientation::Rows,
        DistanceKind::Euclidean,
        &ModelParams::default(),
        Box::new(MemoryLog::new()),
        false,
    )
    .unwrap();
    rows.generate(Heuristic::LeftRight).unwrap();
    assert_eq!(rows.order(), &[3, 0, 2, 1]);
    assert_eq!(rows.n_dimensions(), 1);

    let labels = vec![
        Some("e".to_string()),
        Some("a".to_string()),
        Some("c".to_string()),
        Some("i".to_string()),
    ];
    let source = LabelledMatrix::with_labels(rows.matrix().clone(), labels).unwrap();
    let out = rows.materialize(&source);
    assert_eq!(out.label(0), Some("i"));
    assert_eq!(out.matrix.row(0).unwrap().get(0), 9.0);
    assert_eq!(out.label(3), Some("a"));
}

#[test]
fn test_row_axis_insert_matches_reverse() {
    init();
    let m = SparseMatrix::from_dense(&[vec![5.0], vec![1.0], vec![3.0], vec![9.0]]);
    let mut rows = axis(m, Orientation::Rows);
    rows.generate(Heuristic::Insert).unwrap();
    assert_eq!(rows.order(), &[1, 2, 0, 3]);
}

#[test]
fn test_column_axis_permutes_columns() {
    init();
    let m = random_matrix(12, 7, 3);
    let mut columns = axis(m.clone(), Orientation::Columns);
    assert_eq!(columns.n_instances(), 7);
    columns.generate(Heuristic::LeftRight).unwrap();
    let order = columns.order().to_vec();
    assert_eq!(order.len(), 7);

    let out = columns.materialize(&LabelledMatrix::new(m.clone()));
    assert_eq!(out.row_count(), 12);
    for i in 0..12 {
        for (p, &j) in order.iter().enumerate() {
            assert_eq!(
                out.matrix.row(i).unwrap().get(p),
                m.row(i).unwrap().get(j),
                "row {} position {}",
                i,
                p
            );
        }
    }
}

#[test]
fn test_column_axis_keeps_one_indexing() {
    init();
    // columns 1..=3, column 2 identical to column 1
    let m = SparseMatrix::new(vec![
        Some(SparseVector::from_pairs(vec![(1, 1.0), (2, 1.0), (3, 8.0)]).unwrap()),
        Some(SparseVector::from_pairs(vec![(1, 2.0), (2, 2.0)]).unwrap()),
    ]);
    let mut columns = axis(m.clone(), Orientation::Columns);
    assert_eq!(columns.n_instances(), 3);
    columns.generate(Heuristic::Insert).unwrap();
    let order = columns.order().to_vec();

    let out = columns.materialize(&LabelledMatrix::new(m.clone()));
    assert!(!out.matrix.is_zero_indexed());
    for i in 0..2 {
        for (p, &j) in order.iter().enumerate() {
            assert_eq!(
                out.matrix.row(i).unwrap().get(p + 1),
                m.row(i).unwrap().get(j + 1)
            );
        }
    }
}

#[test]
fn test_column_materialize_keeps_row_presence() {
    init();
    let m = SparseMatrix::new(vec![
        Some(SparseVector::from_pairs(vec![(0, 1.0), (1, 3.0)]).unwrap()),
        None,
        Some(SparseVector::new()),
    ]);
    let mut columns = axis(m.clone(), Orientation::Columns);
    columns.generate(Heuristic::Insert).unwrap();
    let out = columns.materialize(&LabelledMatrix::new(m));
    assert_eq!(out.row_count(), 3);
    assert!(!out.matrix.is_present(1));
    assert!(out.matrix.row(2).unwrap().is_empty());
}

#[test]
fn test_fold_in_preserves_relative_order() {
    init();
    let m = random_matrix(20, 5, 11);
    let mut rows = axis(m, Orientation::Rows);
    rows.generate(Heuristic::LeftRight).unwrap();
    let before = rows.order().to_vec();

    let batch = random_matrix(4, 5, 12);
    rows.merge_updates(&batch).unwrap();
    // merging alone does not touch the order
    assert_eq!(rows.order(), before.as_slice());

    for k in 0..4 {
        assert_eq!(rows.fold_in_new_instance().unwrap(), 20 + k);
    }
    assert_eq!(rows.n_instances(), 24);
    let kept: Vec<usize> = rows.order().iter().copied().filter(|&i| i < 20).collect();
    assert_eq!(kept, before);

    assert!(matches!(
        rows.fold_in_new_instance(),
        Err(StorageError::Invalid(_))
    ));
}

#[test]
fn test_replace_matrix_grows_instances() {
    init();
    let m = SparseMatrix::from_dense(&[vec![1.0, 2.0], vec![2.0, 1.0]]);
    let mut columns = axis(m, Orientation::Columns);
    columns.generate(Heuristic::LeftRight).unwrap();
    assert_eq!(columns.n_instances(), 2);

    let wider = SparseMatrix::from_dense(&[vec![1.0, 2.0, 0.0], vec![2.0, 1.0, 5.0]]);
    columns.replace_matrix(wider.transpose()).unwrap();
    assert_eq!(columns.n_instances(), 3);
    assert_eq!(columns.n_dimensions(), 2);
    assert!(columns.linear_order().remaining().contains(&2));
    assert!(columns.update_order_insert(2));
    assert!(!columns.update_order_insert(0));
    assert_eq!(columns.order().len(), 3);
}

#[test]
fn test_resume_from_checkpoint_file() {
    init();
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("rows_eucl_order-tmp.txt");
    let m = random_matrix(25, 6, 5);

    let mut full = AxisSeriation::new(
        m.clone(),
        Orientation::Rows,
        DistanceKind::Euclidean,
        &ModelParams::default(),
        Box::new(FileLog::new(&log_path)),
        false,
    )
    .unwrap();
    full.generate(Heuristic::LeftRight).unwrap();

    // keep the header and the first ten placements
    let text = std::fs::read_to_string(&log_path).unwrap();
    let truncated: Vec<&str> = text.lines().take(11).collect();
    std::fs::write(&log_path, truncated.join("\n") + "\n").unwrap();

    let mut resumed = AxisSeriation::new(
        m,
        Orientation::Rows,
        DistanceKind::Euclidean,
        &ModelParams::default(),
        Box::new(FileLog::new(&log_path)),
        true,
    )
    .unwrap();
    assert_eq!(resumed.order().len(), 10);
    resumed.generate(Heuristic::LeftRight).unwrap();
    assert_eq!(resumed.order(), full.order());

    let text = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(text.lines().count(), 26);
}

#[test]
fn test_order_and_scale_files() {
    init();
    let dir = TempDir::new().unwrap();
    let m = SparseMatrix::from_dense(&[vec![5.0], vec![1.0], vec![3.0], vec![9.0]]);
    let mut rows = axis(m, Orientation::Rows);
    rows.generate(Heuristic::LeftRight).unwrap();

    let order_path = dir.path().join("order.txt");
    rows.write_order(&order_path).unwrap();
    assert_eq!(read_index_list(&order_path).unwrap(), vec![3, 0, 2, 1]);

    let scale_path = dir.path().join("scale.dat");
    rows.write_scale(&scale_path).unwrap();
    let scale: Vec<f64> = std::fs::read_to_string(&scale_path)
        .unwrap()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    assert_eq!(scale.len(), 4);
    // values 9, 5, 3, 1
    assert_relative_eq!(scale[3], 8.0);

    let dist_path = dir.path().join("distances.dat");
    rows.write_consecutive_distances(&dist_path).unwrap();
    let text = std::fs::read_to_string(&dist_path).unwrap();
    assert_eq!(text, "4\n2\n2\n");
}

#[test]
fn test_mutual_information_axis() {
    init();
    let m = random_matrix(15, 8, 21);
    let mut rows = AxisSeriation::new(
        m,
        Orientation::Rows,
        DistanceKind::MutualInformation,
        &ModelParams { n_bins: 5 },
        Box::new(NoLog),
        false,
    )
    .unwrap();
    rows.generate(Heuristic::LeftRight).unwrap();
    let mut sorted = rows.order().to_vec();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..15).collect::<Vec<_>>());

    rows.merge_updates(&random_matrix(2, 8, 22)).unwrap();
    rows.fold_in_new_instance().unwrap();
    rows.fold_in_new_instance().unwrap();
    assert_eq!(rows.order().len(), 17);
}
