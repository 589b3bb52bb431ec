//! Module for parsing and representing pickup-tour instances.
//!
//! Text format, one record per line:
//!
//! ```text
//! alpha
//! |V| |H|
//! h1 h2 ... h|H|
//! u k          (for every node u, followed by k adjacency lines)
//! v w
//! ```
//!
//! Adjacency is read as undirected. Node 0 is the depot.

use crate::error::InstanceError;
use crate::graph::{Graph, Network};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

/// Depot used by the text format
pub const DEPOT: usize = 0;

/// A complete instance: road network, depot, homes and walking tradeoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    pub graph: Graph,
    pub depot: usize,
    /// Nodes that must be visited or served
    pub homes: Vec<usize>,
    /// Weight of driving cost against walking cost
    pub alpha: f64,
}

impl Instance {
    pub fn new(name: &str, graph: Graph, homes: Vec<usize>, alpha: f64) -> Self {
        Instance {
            name: name.to_string(),
            graph,
            depot: DEPOT,
            homes,
            alpha,
        }
    }

    /// Parse an instance file; the name is taken from the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let text = std::fs::read_to_string(&path)?;
        let mut instance = Self::parse(&text)?;
        if let Some(stem) = path.as_ref().file_stem() {
            instance.name = stem.to_string_lossy().to_string();
        }
        Ok(instance)
    }

    /// Parse the text format.
    pub fn parse(text: &str) -> Result<Self, InstanceError> {
        let mut lines = Lines::new(text);

        let (line, alpha_line) = lines.next_record()?;
        let alpha: f64 = parse_token(alpha_line.trim(), line, "alpha")?;

        let (line, header) = lines.next_record()?;
        let header: Vec<&str> = header.split_whitespace().collect();
        if header.len() != 2 {
            return Err(parse_error(line, "expected `<node count> <home count>`"));
        }
        let node_count: usize = parse_token(header[0], line, "node count")?;
        let home_count: usize = parse_token(header[1], line, "home count")?;
        if home_count > node_count {
            return Err(parse_error(
                line,
                &format!("{} homes declared for {} nodes", home_count, node_count),
            ));
        }
        // every node owns at least its own `u k` record
        let records = text.lines().filter(|l| !l.trim().is_empty()).count();
        if node_count > records {
            return Err(parse_error(
                line,
                &format!("{} nodes declared but the file holds {} records", node_count, records),
            ));
        }

        let mut homes = Vec::new();
        if home_count > 0 {
            let (line, record) = lines.next_record()?;
            for token in record.split_whitespace() {
                let home: usize = parse_token(token, line, "home")?;
                if home >= node_count {
                    return Err(InstanceError::UnknownNode { node: home, node_count });
                }
                homes.push(home);
            }
            if homes.len() != home_count {
                return Err(parse_error(
                    line,
                    &format!("expected {} homes, found {}", home_count, homes.len()),
                ));
            }
        }

        let mut graph = Graph::new(node_count);
        for _ in 0..node_count {
            let (line, record) = lines.next_record()?;
            let parts: Vec<&str> = record.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(parse_error(line, "expected `<node> <neighbor count>`"));
            }
            let u: usize = parse_token(parts[0], line, "node")?;
            let degree: usize = parse_token(parts[1], line, "neighbor count")?;

            for _ in 0..degree {
                let (line, record) = lines.next_record()?;
                let parts: Vec<&str> = record.split_whitespace().collect();
                if parts.len() != 2 {
                    return Err(parse_error(line, "expected `<neighbor> <weight>`"));
                }
                let v: usize = parse_token(parts[0], line, "neighbor")?;
                let w: f64 = parse_token(parts[1], line, "weight")?;
                graph.add_edge(u, v, w)?;
            }
        }

        Ok(Instance {
            name: String::from("unnamed"),
            graph,
            depot: DEPOT,
            homes,
            alpha,
        })
    }

    /// Render the instance in the text format.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.alpha);
        let _ = writeln!(out, "{} {}", self.node_count(), self.homes.len());
        let homes: Vec<String> = self.homes.iter().map(|h| h.to_string()).collect();
        let _ = writeln!(out, "{}", homes.join(" "));
        for u in 0..self.node_count() {
            let neighbors = self.graph.neighbors(u);
            let _ = writeln!(out, "{} {}", u, neighbors.len());
            for &(v, w) in neighbors {
                let _ = writeln!(out, "{} {}", v, w);
            }
        }
        out
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), InstanceError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of nodes reachable from the depot
    fn depot_component_size(&self) -> usize {
        let mut seen = vec![false; self.node_count()];
        let mut queue = VecDeque::new();
        if self.depot < seen.len() {
            seen[self.depot] = true;
            queue.push_back(self.depot);
        }
        let mut count = 0;
        while let Some(u) = queue.pop_front() {
            count += 1;
            for &(v, _) in self.graph.neighbors(u) {
                if !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
        count
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let weights: Vec<f64> = self.graph.edges().map(|(_, _, w)| w).collect();
        let avg_weight = if weights.is_empty() {
            0.0
        } else {
            weights.iter().sum::<f64>() / weights.len() as f64
        };
        let max_weight = weights.iter().cloned().fold(0.0, f64::max);
        let nodes = self.node_count();
        let max_degree = (0..nodes).map(|u| self.graph.degree(u)).max().unwrap_or(0);
        let avg_degree = if nodes == 0 {
            0.0
        } else {
            2.0 * weights.len() as f64 / nodes as f64
        };

        InstanceStatistics {
            name: self.name.clone(),
            nodes,
            edges: weights.len(),
            homes: self.homes.len(),
            alpha: self.alpha,
            avg_weight,
            max_weight,
            avg_degree,
            max_degree,
            reachable_from_depot: self.depot_component_size(),
        }
    }
}

impl FromStr for Instance {
    type Err = InstanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Non-blank lines with their 1-based line numbers
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines {
            inner: text.lines().enumerate(),
            last: 0,
        }
    }

    fn next_record(&mut self) -> Result<(usize, &'a str), InstanceError> {
        for (i, line) in self.inner.by_ref() {
            self.last = i + 1;
            if !line.trim().is_empty() {
                return Ok((i + 1, line));
            }
        }
        Err(parse_error(self.last + 1, "unexpected end of file"))
    }
}

fn parse_error(line: usize, message: &str) -> InstanceError {
    InstanceError::Parse {
        line,
        message: message.to_string(),
    }
}

fn parse_token<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T, InstanceError> {
    token
        .parse()
        .map_err(|_| parse_error(line, &format!("invalid {}: `{}`", what, token)))
}

/// Statistics about an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub nodes: usize,
    pub edges: usize,
    pub homes: usize,
    pub alpha: f64,
    pub avg_weight: f64,
    pub max_weight: f64,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub reachable_from_depot: usize,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Nodes: {} ({} edges)", self.nodes, self.edges)?;
        writeln!(f, "  Homes: {}", self.homes)?;
        writeln!(f, "  Alpha: {}", self.alpha)?;
        writeln!(f, "  Avg edge weight: {:.2}", self.avg_weight)?;
        writeln!(f, "  Max edge weight: {:.2}", self.max_weight)?;
        writeln!(f, "  Avg degree: {:.2} (max {})", self.avg_degree, self.max_degree)?;
        writeln!(f, "  Reachable from depot: {}/{}", self.reachable_from_depot, self.nodes)
    }
}
