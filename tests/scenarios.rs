//! End-to-end joins over files on disk

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use docjoin::{AlignError, Codec, JoinConfig, Side};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, indices: &str, columns1: &[&str], columns2: &[&str]) -> JoinConfig {
        let indices = self.file("pairs.tsv", indices);
        let side = |prefix: &str, columns: &[&str]| -> Vec<PathBuf> {
            columns
                .iter()
                .enumerate()
                .map(|(i, data)| self.file(&format!("{prefix}{i}.txt"), data))
                .collect()
        };
        JoinConfig::new(side("a", columns1), side("b", columns2))
            .with_indices(indices)
            .with_output(self.path("joined.tsv"))
    }

    fn output(&self) -> String {
        fs::read_to_string(self.path("joined.tsv")).unwrap()
    }

    fn output_bytes(&self) -> Vec<u8> {
        fs::read(self.path("joined.tsv")).unwrap()
    }
}

/// Compress `contents` into `path` with `program -c`; false when the tool is missing
fn compress(program: &str, path: &Path, contents: &str) -> bool {
    let Ok(executable) = which::which(program) else {
        return false;
    };
    let mut child = Command::new(executable)
        .arg("-c")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(contents.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    fs::write(path, output.stdout).unwrap();
    true
}

#[test]
fn test_backward_doc2_is_buffered() {
    let ws = Workspace::new();
    let config = ws.config("1\t1\n2\t3\n3\t2\n", &["a1\na2\na3\n"], &["b1\nb2\nb3\n"]);

    let stats = docjoin::run(&config).unwrap();

    assert_eq!(ws.output(), "1\ta1\t1\tb1\n2\ta2\t3\tb3\n3\ta3\t2\tb2\n");
    assert_eq!(stats.pairs, 3);
    assert_eq!(stats.side_b_lines_read, 3);
    assert_eq!(stats.buffered_hits, 1);
    assert_eq!(stats.leftover_buffered, 0);
}

#[test]
fn test_truncated_side_a() {
    let ws = Workspace::new();
    let config = ws.config(
        "1\t1\n2\t1\n3\t2\n4\t2\n5\t2\n",
        &["a1\na2\na3\na4\n"],
        &["b1\nb2\n"],
    );

    let err = docjoin::run(&config).unwrap_err();

    match err {
        AlignError::TruncatedInput {
            side,
            lines_read,
            needed,
            ..
        } => {
            assert_eq!(side, Side::A);
            assert_eq!(lines_read, 4);
            assert_eq!(needed, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
    let output = ws.output();
    assert_eq!(output.lines().count(), 4);
    assert!(output.lines().all(|line| !line.starts_with("5\t")));
}

#[test]
fn test_malformed_first_line_emits_nothing() {
    let ws = Workspace::new();
    let config = ws.config("abc\txyz\n1\t1\n", &["a1\n"], &["b1\n"]);

    let err = docjoin::run(&config).unwrap_err();

    assert!(matches!(err, AlignError::MalformedRecord { line: 1, .. }));
    assert!(!ws.path("joined.tsv").exists());
}

#[test]
fn test_unsorted_pairs_emit_nothing() {
    let ws = Workspace::new();
    let config = ws.config("2\t1\n1\t1\n", &["a1\na2\n"], &["b1\n"]);

    let err = docjoin::run(&config).unwrap_err();

    assert!(matches!(err, AlignError::UnsortedPairs { line: 2, .. }));
    assert!(!ws.path("joined.tsv").exists());
}

#[test]
fn test_doc2_repeated_across_many_pairs() {
    let ws = Workspace::new();
    let config = ws.config(
        "1\t4\n1\t2\n2\t4\n3\t4\n3\t4\n5\t1\n6\t4\n",
        &["a1\na2\na3\na4\na5\na6\n"],
        &["b1\nb2\nb3\nb4\nb5\n"],
    );

    docjoin::run(&config).unwrap();

    let doc2_values: Vec<String> = ws
        .output()
        .lines()
        .map(|line| line.split('\t').skip(2).collect::<Vec<_>>().join("\t"))
        .collect();
    assert_eq!(
        doc2_values,
        vec!["4\tb4", "2\tb2", "4\tb4", "4\tb4", "4\tb4", "1\tb1", "4\tb4"]
    );
}

#[test]
fn test_multiple_columns_keep_their_order() {
    let ws = Workspace::new();
    let config = ws.config(
        "1\t2\n2\t1\n",
        &["http://a/1\nhttp://a/2\n", "dGV4dDE=\ndGV4dDI=\n"],
        &["http://b/1\nhttp://b/2\n", "Ym9keTE=\nYm9keTI=\n"],
    );

    docjoin::run(&config).unwrap();

    assert_eq!(
        ws.output(),
        "1\thttp://a/1\tdGV4dDE=\t2\thttp://b/2\tYm9keTI=\n\
         2\thttp://a/2\tdGV4dDI=\t1\thttp://b/1\tYm9keTE=\n"
    );
}

#[test]
fn test_lookahead_limit_aborts_run() {
    let ws = Workspace::new();
    let mut config = ws.config(
        "1\t5\n2\t1\n3\t2\n4\t3\n",
        &["a1\na2\na3\na4\n"],
        &["b1\nb2\nb3\nb4\nb5\n"],
    );
    config.options.max_lookahead = Some(2);

    let err = docjoin::run(&config).unwrap_err();

    assert!(matches!(
        err,
        AlignError::LookaheadOverflow {
            limit: 2,
            target: 5
        }
    ));
}

#[test]
fn test_missing_column_file() {
    let ws = Workspace::new();
    let mut config = ws.config("1\t1\n", &["a1\n"], &["b1\n"]);
    config.columns2.push(ws.path("does-not-exist.txt"));

    let err = docjoin::run(&config).unwrap_err();

    assert!(matches!(err, AlignError::Open { .. }));
}

#[test]
fn test_stats_file() {
    let ws = Workspace::new();
    let mut config = ws.config("1\t2\n2\t1\n", &["a1\na2\n"], &["b1\nb2\n"]);
    config.stats_path = Some(ws.path("stats.json"));

    docjoin::run(&config).unwrap();

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.path("stats.json")).unwrap()).unwrap();
    assert_eq!(stats["pairs"], 2);
    assert_eq!(stats["peak_buffered"], 1);
    assert_eq!(stats["buffered_hits"], 1);
}

#[test]
fn test_gzip_columns_and_indices() {
    let ws = Workspace::new();
    let indices = ws.path("pairs.gz");
    let col_a = ws.path("a.txt.gz");
    let col_b = ws.path("b.txt.gz");
    if !compress("gzip", &indices, "1\t3\n2\t2\n")
        || !compress("gzip", &col_a, "a1\na2\n")
        || !compress("gzip", &col_b, "b1\nb2\nb3\n")
    {
        return;
    }

    let config = JoinConfig::new(vec![col_a], vec![col_b])
        .with_indices(indices)
        .with_output(ws.path("joined.tsv"));
    assert_eq!(config.codec, Codec::Auto);

    docjoin::run(&config).unwrap();

    assert_eq!(ws.output(), "1\ta1\t3\tb3\n2\ta2\t2\tb2\n");
}

#[test]
fn test_xz_columns() {
    let ws = Workspace::new();
    let col_a = ws.path("a.url.xz");
    let col_b = ws.path("b.url.xz");
    if !compress("xz", &col_a, "a1\na2\na3\n") || !compress("xz", &col_b, "b1\nb2\nb3\n") {
        return;
    }
    let indices = ws.file("pairs.tsv", "1\t3\n2\t1\n3\t2\n");

    let config = JoinConfig::new(vec![col_a], vec![col_b])
        .with_indices(indices)
        .with_output(ws.path("joined.tsv"));
    let stats = docjoin::run(&config).unwrap();

    assert_eq!(ws.output(), "1\ta1\t3\tb3\n2\ta2\t1\tb1\n3\ta3\t2\tb2\n");
    assert_eq!(stats.side_b_lines_read, 3);
}

#[test]
fn test_non_utf8_column_bytes_copied_verbatim() {
    let ws = Workspace::new();
    let indices = ws.file("pairs.tsv", "1\t1\n2\t2\n");
    let col_a = ws.file("a.txt", "a1\na2\n");
    let col_b = ws.file("b.txt", b"b1\nhttp://x/caf\xe9\n");

    let config = JoinConfig::new(vec![col_a], vec![col_b])
        .with_indices(indices)
        .with_output(ws.path("joined.tsv"));
    docjoin::run(&config).unwrap();

    assert_eq!(
        ws.output_bytes(),
        b"1\ta1\t1\tb1\n2\ta2\t2\thttp://x/caf\xe9\n".to_vec()
    );
}

#[test]
fn test_non_utf8_index_line_is_malformed() {
    let ws = Workspace::new();
    let indices = ws.file("pairs.tsv", b"1\t1\n2\xff\t1\n");
    let col_a = ws.file("a.txt", "a1\na2\n");
    let col_b = ws.file("b.txt", "b1\n");

    let config = JoinConfig::new(vec![col_a], vec![col_b])
        .with_indices(indices)
        .with_output(ws.path("joined.tsv"));
    let err = docjoin::run(&config).unwrap_err();

    assert!(matches!(err, AlignError::MalformedRecord { line: 2, .. }));
    assert!(!ws.path("joined.tsv").exists());
}
