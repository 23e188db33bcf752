use nested_td::exact::SearchBudget;
use nested_td::graph::Graph;
use nested_td::io::{PaceReader, PaceWriter};
use nested_td::solver::Decomposer;
use std::convert::TryFrom;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{stdin, stdout, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "nested-td-cli",
    about = "Computes a tree decomposition of the given graph from greedy heuristics, safe separators and exact refinement."
)]
struct Opt {
    /// Input file in the PACE `.gr` format. `stdin` if not specified.
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Output file. `stdout` if not specified.
    #[structopt(parse(from_os_str))]
    output: Option<PathBuf>,

    /// Skip the exact refinement of bags.
    #[structopt(short, long)]
    heuristic: bool,

    /// Print statistics of every stage as comment lines.
    #[structopt(short, long)]
    verbose: bool,

    /// Maximum number of steps of each exact search.
    #[structopt(long)]
    max_steps: Option<usize>,

    /// Time limit in seconds for each exact search.
    #[structopt(long)]
    time_limit: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();

    #[cfg(feature = "pace-logging")]
    {
        let level = if opt.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        };
        nested_td::log::build_pace_logger_for_level(level);
    }

    #[cfg(feature = "handle-ctrlc")]
    nested_td::signals::initialize()?;

    let graph = match &opt.input {
        Some(path) => Graph::try_from(PaceReader(BufReader::new(File::open(path)?)))?,
        None => {
            let stdin = stdin();
            let reader = PaceReader(stdin.lock());
            Graph::try_from(reader)?
        }
    };

    let budget = SearchBudget::default()
        .max_steps(opt.max_steps)
        .time_limit(opt.time_limit.map(Duration::from_secs));
    let decomposer = Decomposer::default()
        .verbose(opt.verbose)
        .refine(!opt.heuristic)
        .budget(budget);
    let (td, statistics) = decomposer.decompose_with_statistics(&graph)?;
    if opt.verbose {
        println!(
            "c width {} from {} components, {} of {} refined bags improved, {} searches exhausted",
            statistics.width,
            statistics.components.len(),
            statistics.improved_bags(),
            statistics.refined_bags(),
            statistics.exhausted_searches()
        );
    }

    match opt.output {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            PaceWriter::new(&td, graph.n(), BufWriter::new(file)).output()?;
        }
        None => {
            let stdout = stdout();
            PaceWriter::new(&td, graph.n(), stdout.lock()).output()?;
        }
    }
    Ok(())
}
