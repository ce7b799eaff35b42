//
// Hashiwokakero solver
//
// Backtracking search over candidate bridge edges.
//

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{stdin, stdout, BufRead, BufReader, Read, Write};

use anyhow::{bail, ensure, Result};
use clap::Parser;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////
// Data structures / problem representation
//

// Grid coordinates are (row, col), with (0, 0) the top-left corner.
type Coord = (usize, usize);

// A bridge can carry up to 3 parallel planks.
const MAX_PLANKS: usize = 3;

// An island has at most 4 neighbours, so its requirement is capped too.
const MAX_REQUIREMENT: usize = 4 * MAX_PLANKS;

// Bridges run along a row or a column, never diagonally.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Orientation {
    Horizontal,
    Vertical,
}

// A straight, unobstructed line between two islands that could host a
// bridge. Endpoint `a` is always the origin of the enumeration scan,
// and `b` the nearest island to its right (Horizontal) or below
// (Vertical), so collinear island runs never produce overlapping
// edges.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct CandidateEdge {
    a: Coord,
    b: Coord,
    orientation: Orientation,
}

// The search's decision variable: how many planks to build on a
// candidate edge. Zero means the candidate goes unused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct BridgeAssignment {
    edge: CandidateEdge,
    planks: usize,
}

// We simply represent the puzzle as a vector of vectors of plank
// requirements (outer index is the row; 0 is water). We leave a lot of
// room for optimisation with clever data structures, but it's simple.
// I like simple.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Grid(Vec<Vec<usize>>);

#[derive(Debug, Eq, Error, PartialEq)]
enum SolveError {
    // The optional node budget ran out before the search finished.
    // Distinct from "no solution", which is a normal outcome.
    #[error("Search aborted after {0} nodes without exhausting the space")]
    BudgetExhausted(usize),
}

impl CandidateEdge {
    fn touches(&self, isle: Coord) -> bool {
        self.a == isle || self.b == isle
    }

    // The cells strictly between the two endpoints. A malformed edge
    // (endpoints not aligned with its orientation) is a construction
    // bug in the enumerator, not bad puzzle input, so we assert.
    fn interior(&self) -> Vec<Coord> {
        match self.orientation {
            Orientation::Horizontal => {
                assert!(self.a.0 == self.b.0 && self.a.1 < self.b.1);
                let r = self.a.0;
                ((self.a.1 + 1)..self.b.1).map(|c| (r, c)).collect()
            }
            Orientation::Vertical => {
                assert!(self.a.1 == self.b.1 && self.a.0 < self.b.0);
                let c = self.a.1;
                ((self.a.0 + 1)..self.b.0).map(|r| (r, c)).collect()
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// Parser and printer
//

fn cell_from_char(c: char) -> Result<usize> {
    match c {
        '.' => Ok(0),
        i if i.is_ascii_digit() || i.is_ascii_lowercase() => match i.to_digit(36) {
            Some(n) if 1 <= n && (n as usize) <= MAX_REQUIREMENT => Ok(n as usize),
            _ => bail!("Island value out of range in input: '{}'", c),
        },
        _ => bail!("Unexpected character in input: '{}'", c),
    }
}

// Islands keep counting past '9' in lowercase letters ('a' is 10).
fn island_char(requirement: usize) -> char {
    std::char::from_digit(requirement as u32, 36).unwrap_or('?')
}

fn bridge_char(orientation: Orientation, planks: usize) -> char {
    match (orientation, planks) {
        (Orientation::Horizontal, 1) => '-',
        (Orientation::Horizontal, 2) => '=',
        (Orientation::Horizontal, 3) => 'E',
        (Orientation::Vertical, 1) => '|',
        (Orientation::Vertical, 2) => '"',
        (Orientation::Vertical, 3) => '#',
        _ => '?',
    }
}

fn read_grid<'a, Iter: std::iter::Iterator<Item = &'a str>>(lines: Iter) -> Result<Grid> {
    let rows = lines
        // Trim comments and whitespace
        .map(|s| s.find('#').map_or(s, |idx| &s[..idx]).trim())
        // Filter empty lines
        .filter(|s| !s.is_empty())
        // Convert a single line
        .map(|s| s.chars().map(cell_from_char).collect::<Result<Vec<_>>>())
        .collect::<Result<Vec<_>>>()?;

    ensure!(!rows.is_empty(), "Non-empty input line expected");
    let width = rows[0].len();
    ensure!(
        rows.iter().all(|row| row.len() == width),
        "Not all input lines were of the same length. Rectangular input expected."
    );

    Ok(Grid(rows))
}

// Paint the solved puzzle: islands as their requirement, bridge
// interiors as plank symbols, everything else as water.
fn render_solution(grid: &Grid, assignments: &[BridgeAssignment]) -> String {
    let mut out: Vec<Vec<char>> = grid
        .0
        .iter()
        .map(|row| {
            row.iter()
                .map(|&n| if n > 0 { island_char(n) } else { '.' })
                .collect()
        })
        .collect();

    for assignment in assignments.iter().filter(|a| a.planks > 0) {
        let symbol = bridge_char(assignment.edge.orientation, assignment.planks);
        for (r, c) in assignment.edge.interior() {
            out[r][c] = symbol;
        }
    }

    out.iter()
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

////////////////////////////////////////////////////////////////////////
// Operations on the grid
//

struct IslandIterator<'a> {
    grid: &'a Grid,
    rows: usize,
    cols: usize,
    r: usize,
    c: usize,
}

impl Grid {
    fn rows(&self) -> usize {
        self.0.len()
    }

    fn cols(&self) -> usize {
        self.0[0].len()
    }

    fn value(&self, cell: Coord) -> usize {
        self.0[cell.0][cell.1]
    }

    fn island_iter(&self) -> IslandIterator {
        IslandIterator::new(self)
    }
}

impl<'a> IslandIterator<'a> {
    fn new(grid: &'a Grid) -> IslandIterator<'a> {
        IslandIterator {
            grid,
            rows: grid.rows(),
            cols: grid.cols(),
            r: 0,
            c: 0,
        }
    }

    fn step(&mut self) {
        self.c += 1;
        if self.c >= self.cols {
            self.c = 0;
            self.r += 1;
        }
    }
}

impl<'a> Iterator for IslandIterator<'a> {
    type Item = Coord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.r >= self.rows {
                return None;
            }
            let cell = (self.r, self.c);
            self.step();
            if self.grid.value(cell) > 0 {
                return Some(cell);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// Candidate edge enumeration
//

// Scan the grid row-major, and for each island record an edge to the
// nearest island to its right and the nearest below. The first
// non-water cell always terminates a scan, so an edge's interior is
// pure water at enumeration time. Left/up adjacency is covered by the
// other endpoint's own scan, so no edge is emitted twice.
//
// Alongside the edges we return a per-island connectivity estimate:
// the number of candidate edges touching the island, capped at its
// requirement. It's a deliberately cheap bound used only to order the
// search, never to prune.
fn enumerate_edges(grid: &Grid) -> (Vec<CandidateEdge>, HashMap<Coord, usize>) {
    let mut edges = Vec::new();
    let mut tally: HashMap<Coord, usize> = HashMap::new();

    let mut record = |edges: &mut Vec<CandidateEdge>, edge: CandidateEdge| {
        *tally.entry(edge.a).or_insert(0) += 1;
        *tally.entry(edge.b).or_insert(0) += 1;
        edges.push(edge);
    };

    for (r, c) in grid.island_iter() {
        for c2 in (c + 1)..grid.cols() {
            if grid.value((r, c2)) > 0 {
                record(
                    &mut edges,
                    CandidateEdge {
                        a: (r, c),
                        b: (r, c2),
                        orientation: Orientation::Horizontal,
                    },
                );
                break;
            }
        }
        for r2 in (r + 1)..grid.rows() {
            if grid.value((r2, c)) > 0 {
                record(
                    &mut edges,
                    CandidateEdge {
                        a: (r, c),
                        b: (r2, c),
                        orientation: Orientation::Vertical,
                    },
                );
                break;
            }
        }
    }

    let estimates = grid
        .island_iter()
        .map(|isle| {
            let touching = tally.get(&isle).copied().unwrap_or(0);
            (isle, touching.min(grid.value(isle)))
        })
        .collect();

    (edges, estimates)
}

////////////////////////////////////////////////////////////////////////
// Search engine
//

// Per-island plank totals over a slice of assignments. The assignments
// are the single source of truth; loads are recomputed on demand and a
// cached value must never outlive the assignment it came from.
fn island_loads(assignments: &[BridgeAssignment]) -> HashMap<Coord, usize> {
    let mut loads = HashMap::new();
    for assignment in assignments.iter().filter(|a| a.planks > 0) {
        *loads.entry(assignment.edge.a).or_insert(0) += assignment.planks;
        *loads.entry(assignment.edge.b).or_insert(0) += assignment.planks;
    }
    loads
}

// Forward check on a partial assignment: the first `decided` edges are
// settled, the rest still count as undecided. Viable only if no island
// is already over its requirement, and every island could still reach
// it were all its undecided edges built at full width.
fn forward_check(grid: &Grid, assignments: &[BridgeAssignment], decided: usize) -> bool {
    let loads = island_loads(&assignments[..decided]);
    for isle in grid.island_iter() {
        let load = loads.get(&isle).copied().unwrap_or(0);
        let required = grid.value(isle);
        if load > required {
            return false;
        }
        let undecided = assignments[decided..]
            .iter()
            .filter(|a| a.edge.touches(isle))
            .count();
        if load + MAX_PLANKS * undecided < required {
            return false;
        }
    }
    true
}

// Optional cap on search nodes, checked cooperatively at the top of
// every recursive call. Pathological grids blow up as 4^E, and a batch
// caller may prefer a bounded failure to an open-ended wait.
struct SearchBudget {
    visited: usize,
    limit: Option<usize>,
}

impl SearchBudget {
    fn new(limit: Option<usize>) -> SearchBudget {
        SearchBudget { visited: 0, limit }
    }

    fn spend(&mut self) -> Result<(), SolveError> {
        self.visited += 1;
        match self.limit {
            Some(limit) if self.visited > limit => Err(SolveError::BudgetExhausted(limit)),
            _ => Ok(()),
        }
    }
}

// Depth-first assignment of plank counts to edges `index..`. Each
// level tries 0..=3 planks ascending; the first fully valid assignment
// wins and is left in place all the way up the stack. On failure the
// level restores its edge to 0 planks, so the caller sees the state it
// passed in.
fn search(
    grid: &Grid,
    assignments: &mut Vec<BridgeAssignment>,
    index: usize,
    budget: &mut SearchBudget,
) -> Result<bool, SolveError> {
    budget.spend()?;

    if index == assignments.len() {
        return Ok(validate(grid, assignments));
    }

    for planks in 0..=MAX_PLANKS {
        assignments[index].planks = planks;
        if forward_check(grid, assignments, index + 1)
            && search(grid, assignments, index + 1, budget)?
        {
            return Ok(true);
        }
    }

    assignments[index].planks = 0;
    Ok(false)
}

// Find the first valid bridge layout, or None if the space is
// exhausted. Edges are ordered most-constrained-first (ascending sum
// of endpoint connectivity estimates) so tightly bound islands fail
// fast; the sort is stable over the fixed enumeration order, so
// repeated solves of the same grid are identical.
fn solve(
    grid: &Grid,
    max_nodes: Option<usize>,
) -> Result<Option<Vec<BridgeAssignment>>, SolveError> {
    let (mut edges, estimates) = enumerate_edges(grid);
    edges.sort_by_key(|e| estimates[&e.a] + estimates[&e.b]);

    let mut assignments = edges
        .into_iter()
        .map(|edge| BridgeAssignment { edge, planks: 0 })
        .collect::<Vec<_>>();

    let mut budget = SearchBudget::new(max_nodes);
    if search(grid, &mut assignments, 0, &mut budget)? {
        Ok(Some(assignments))
    } else {
        Ok(None)
    }
}

////////////////////////////////////////////////////////////////////////
// Solution validator
//

// Terminal check on a fully assigned edge set: every built bridge's
// interior must be pure water no other bridge claims, and every
// island's load must match its requirement exactly. Interior occupancy
// is a set of its own - reusing the island load map for crossing
// detection conflates two different facts and misses crossings.
fn validate(grid: &Grid, assignments: &[BridgeAssignment]) -> bool {
    let mut occupied: HashSet<Coord> = HashSet::new();

    for assignment in assignments.iter().filter(|a| a.planks > 0) {
        for cell in assignment.edge.interior() {
            if grid.value(cell) > 0 || !occupied.insert(cell) {
                return false;
            }
        }
    }

    let loads = island_loads(assignments);
    grid.island_iter()
        .all(|isle| loads.get(&isle).copied().unwrap_or(0) == grid.value(isle))
}

////////////////////////////////////////////////////////////////////////
// Main entry point
//

#[derive(Parser)]
#[clap(version = "0.1")]
#[clap(about = "Hashiwokakero (Bridges) puzzle solver")]
struct Opts {
    /// Input file. Uses stdin if none specified.
    #[clap(long)]
    input_file: Option<String>,
    /// Output file. Uses stdout if none specified.
    #[clap(long)]
    output_file: Option<String>,
    /// Abort the search after visiting this many nodes.
    #[clap(long)]
    max_nodes: Option<usize>,
}

fn read_input(opts: &Opts) -> Result<Vec<String>> {
    let file: Box<dyn Read> = match &opts.input_file {
        Some(name) => Box::new(File::open(name)?),
        None => Box::new(stdin()),
    };

    Ok(BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()?)
}

fn write_output(opts: &Opts, s: &str) -> Result<()> {
    let mut file: Box<dyn Write> = match &opts.output_file {
        Some(name) => Box::new(File::create(name)?),
        None => Box::new(stdout()),
    };

    Ok(file.write_all(s.as_bytes())?)
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    let grid = read_grid(read_input(&opts)?.iter().map(String::as_str))?;

    let output = match solve(&grid, opts.max_nodes)? {
        Some(assignments) => render_solution(&grid, &assignments),
        // Exhaustion is a normal outcome, reported on the output
        // surface in place of a grid.
        None => "No solution found.".to_string(),
    };

    write_output(&opts, &output)?;

    Ok(())
}

////////////////////////////////////////////////////////////////////////
// Tests
//
