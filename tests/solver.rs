use assert_cmd::Command;
use predicates::prelude::*;
use std::env;
use std::fs;
use std::io;

// Going to keep it light: Just test the happy paths, the no-solution
// report, and a couple of failure modes.

#[test]
fn test_cli_success() {
    let expected = std::fs::read_to_string("results/example_3x3.txt").unwrap();

    let mut cmd = Command::cargo_bin("hashi-solver").unwrap();

    cmd.pipe_stdin("puzzles/example_3x3.txt")
        .unwrap()
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_cli_input_flag() {
    let expected = std::fs::read_to_string("results/example_7x7.txt").unwrap();

    let mut cmd = Command::cargo_bin("hashi-solver").unwrap();

    cmd.arg("--input-file=puzzles/example_7x7.txt")
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_cli_output_flag() -> io::Result<()> {
    let expected = std::fs::read_to_string("results/example_7x7.txt").unwrap();

    let mut cmd = Command::cargo_bin("hashi-solver").unwrap();

    let mut path = env::temp_dir();
    path.push("test-hashi-solver.txt");

    cmd.pipe_stdin("puzzles/example_7x7.txt")
        .unwrap()
        .arg(format!("--output-file={}", path.to_str().unwrap()))
        .assert()
        .success()
        .stdout("");

    let actual = fs::read_to_string(path.clone())?;
    fs::remove_file(path)?;
    assert_eq!(expected, actual);

    Ok(())
}

#[test]
fn test_cli_no_solution() {
    // A lone island can't be connected to anything. The report goes to
    // the output surface in place of a grid, and isn't an error.
    let mut cmd = Command::cargo_bin("hashi-solver").unwrap();

    cmd.write_stdin("...1..")
        .assert()
        .success()
        .stdout("No solution found.");
}

#[test]
fn test_cli_parse_error() {
    let mut cmd = Command::cargo_bin("hashi-solver").unwrap();

    cmd.write_stdin("This is not a valid input.")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Unexpected character in input"));
}

#[test]
fn test_cli_max_nodes_exceeded() {
    let mut cmd = Command::cargo_bin("hashi-solver").unwrap();

    cmd.write_stdin("2.2")
        .arg("--max-nodes=1")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Search aborted after 1 nodes"));
}
