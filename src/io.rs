use crate::graph::Graph;
use crate::tree_decomposition::TreeDecomposition;
use std::convert::TryFrom;
use std::io;
use std::io::{BufRead, Write};

fn invalid_input(line: usize, message: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("line {}: {}", line, message),
    )
}

fn parse_pair<'a, I: Iterator<Item = &'a str>>(mut tokens: I) -> Option<(usize, usize)> {
    let u = tokens.next()?.parse().ok()?;
    let v = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some((u, v))
}

/// Parses the `p tw <n> <m>` header line.
pub fn pace_p(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "p" || tokens.next()? != "tw" {
        return None;
    }
    parse_pair(tokens)
}

/// Parses an edge line `<u> <v>` and converts it to 0-indexed vertices.
pub fn pace_e(line: &str) -> Option<(usize, usize)> {
    let (u, v) = parse_pair(line.split_whitespace())?;
    if u == 0 || v == 0 {
        return None;
    }
    Some((u - 1, v - 1))
}

/// Graph input in the PACE `.gr` format: a `p tw <n> <m>` header followed by one edge per
/// line with 1-indexed endpoints. Lines starting with `c` and empty lines are skipped.
pub struct PaceReader<T: BufRead>(pub T);

impl<T: BufRead> TryFrom<PaceReader<T>> for Graph {
    type Error = io::Error;

    fn try_from(reader: PaceReader<T>) -> Result<Self, Self::Error> {
        let mut graph: Option<Graph> = None;
        for (i, line) in reader.0.lines().enumerate() {
            let line = line?;
            let number = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('c') {
                continue;
            }
            if trimmed.starts_with('p') {
                if graph.is_some() {
                    return Err(invalid_input(number, "duplicate header"));
                }
                let (n, _) = pace_p(trimmed).ok_or_else(|| invalid_input(number, "bad header"))?;
                graph = Some(Graph::new(n));
                continue;
            }
            let graph = graph
                .as_mut()
                .ok_or_else(|| invalid_input(number, "edge before header"))?;
            let (u, v) = pace_e(trimmed).ok_or_else(|| invalid_input(number, "bad edge"))?;
            if u >= graph.n() || v >= graph.n() {
                return Err(invalid_input(number, "vertex out of range"));
            }
            graph.add_edge(u, v);
        }
        graph.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "missing header"))
    }
}

/// Writes a [`TreeDecomposition`] in the PACE `.td` format. Bags and vertices are printed
/// 1-indexed, bags in creation order.
pub struct PaceWriter<'a, T: Write> {
    td: &'a TreeDecomposition,
    n: usize,
    writer: T,
}

impl<'a, T: Write> PaceWriter<'a, T> {
    pub fn new(td: &'a TreeDecomposition, n: usize, writer: T) -> Self {
        Self { td, n, writer }
    }

    pub fn output(mut self) -> io::Result<()> {
        writeln!(
            self.writer,
            "s td {} {} {}",
            self.td.bags().len(),
            self.td.max_bag_size,
            self.n
        )?;
        for bag in self.td.bags() {
            let mut vertices: Vec<_> = bag.vertex_set.iter().copied().collect();
            vertices.sort_unstable();
            write!(self.writer, "b {}", bag.id + 1)?;
            for v in vertices {
                write!(self.writer, " {}", v + 1)?;
            }
            writeln!(self.writer)?;
        }
        for (a, b) in self.td.edges() {
            writeln!(self.writer, "{} {}", a + 1, b + 1)?;
        }
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{BaseGraph, Graph};
    use crate::io::{PaceReader, PaceWriter};
    use crate::tree_decomposition::TreeDecomposition;
    use std::convert::TryFrom;
    use std::io;

    fn read(input: &str) -> io::Result<Graph> {
        Graph::try_from(PaceReader(input.as_bytes()))
    }

    #[test]
    fn reads_graph() {
        let graph = read("c a path\np tw 4 3\n1 2\n2 3\nc inline comment\n\n3 4\n").unwrap();
        assert_eq!(graph.order(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.are_adjacent(0, 1));
        assert!(graph.are_adjacent(2, 3));
        assert!(!graph.are_adjacent(0, 3));
    }

    #[test]
    fn ignores_loops_and_duplicates() {
        let graph = read("p tw 3 3\n1 2\n2 1\n3 3\n").unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        for input in &[
            "1 2\np tw 2 1\n",
            "p tw 2 1\n1 3\n",
            "p tw 2 1\n0 1\n",
            "p tw 2 1\n1 x\n",
            "p tw 2 1\n1 2 3\n",
            "p td 2 1\n",
            "p tw 2\n",
            "p tw 2 1\np tw 2 1\n",
            "c nothing\n",
        ] {
            let error = read(input).unwrap_err();
            assert_eq!(error.kind(), io::ErrorKind::InvalidInput, "{}", input);
        }
    }

    #[test]
    fn writes_decomposition() {
        let mut td = TreeDecomposition::default();
        let a = td.add_bag([1, 0].iter().copied().collect());
        let b = td.add_bag([2, 1].iter().copied().collect());
        td.add_edge(a, b);
        let mut out = Vec::new();
        PaceWriter::new(&td, 3, &mut out).output().unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "s td 2 2 3\nb 1 1 2\nb 2 2 3\n1 2\n"
        );
    }

    #[test]
    fn writes_empty_decomposition() {
        let mut out = Vec::new();
        PaceWriter::new(&TreeDecomposition::default(), 0, &mut out)
            .output()
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "s td 0 0 0\n");
    }
}
