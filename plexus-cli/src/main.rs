use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use plexus_api::{Node, PropertyValue};
use plexus_graph::MemoryGraph;
use plexus_query::{MatchOptions, prepare};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plexus", version, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pattern against a graph file and print the results.
    Query(QueryArgs),
    /// Interactive pattern shell over a graph file.
    Repl(ReplArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputMode {
    Rows,
    Groups,
    Paths,
    Explain,
}

#[derive(Parser)]
struct QueryArgs {
    /// Graph description (JSON: {"nodes": [...], "edges": [...]})
    #[arg(long)]
    graph: PathBuf,

    /// Pattern string
    #[arg(long, conflicts_with = "file")]
    pattern: Option<String>,

    /// Read the pattern from a file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Start traversal at this node id
    #[arg(long, conflicts_with = "start_ids")]
    start: Option<String>,

    /// Start traversal at any of these node ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    start_ids: Option<Vec<String>>,

    /// Only accept start ids of this node type
    #[arg(long)]
    start_kind: Option<String>,

    #[arg(long, value_enum, default_value = "rows")]
    mode: OutputMode,
}

#[derive(Parser)]
struct ReplArgs {
    /// Graph description (JSON: {"nodes": [...], "edges": [...]})
    #[arg(long)]
    graph: PathBuf,
}

/// On-disk graph description. Kept here so the engine crates stay free of
/// any serialization format.
#[derive(Debug, Deserialize)]
struct GraphFile {
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<EdgeEntry>,
}

#[derive(Debug, Deserialize)]
struct EdgeEntry {
    src: String,
    kind: String,
    dst: String,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
}

fn load_graph(path: &PathBuf) -> anyhow::Result<MemoryGraph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    let file: GraphFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse graph file {}", path.display()))?;

    let mut graph = MemoryGraph::new();
    for node in file.nodes {
        graph.add_node(node)?;
    }
    for edge in file.edges {
        graph.add_edge_with_properties(&edge.src, &edge.kind, &edge.dst, edge.properties)?;
    }
    Ok(graph)
}

fn read_pattern(args: &QueryArgs) -> anyhow::Result<String> {
    if let Some(pattern) = &args.pattern {
        return Ok(pattern.clone());
    }
    let Some(path) = &args.file else {
        anyhow::bail!("either --pattern or --file is required");
    };
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pattern file {}", path.display()))
}

fn run_query(args: QueryArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let pattern = read_pattern(&args)?;

    let options = MatchOptions {
        start_id: args.start.clone(),
        start_ids: args.start_ids.clone(),
        start_kind: args.start_kind.clone(),
    };

    let prepared = prepare(&pattern)?;
    let mut stdout = std::io::stdout().lock();

    match args.mode {
        OutputMode::Rows => {
            for row in prepared.rows(&graph, &options)? {
                writeln!(stdout, "{}", serde_json::to_string(&row)?)?;
            }
        }
        OutputMode::Groups => {
            let groups = prepared.groups(&graph, &options)?;
            writeln!(stdout, "{}", serde_json::to_string(&groups)?)?;
        }
        OutputMode::Paths => {
            for path in prepared.paths(&graph, &options)? {
                writeln!(stdout, "{}", serde_json::to_string(&path)?)?;
            }
        }
        OutputMode::Explain => {
            writeln!(stdout, "{}", prepared.explain())?;
        }
    }
    Ok(())
}

fn run_repl(args: ReplArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let mut editor = rustyline::DefaultEditor::new()?;
    let options = MatchOptions::new();

    loop {
        let line = match editor.readline("plexus> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let pattern = line.trim();
        if pattern.is_empty() {
            continue;
        }
        if pattern == ":quit" || pattern == ":q" {
            break;
        }
        let _ = editor.add_history_entry(pattern);

        match plexus_query::match_rows(&graph, pattern, &options) {
            Ok(rows) => {
                if rows.is_empty() {
                    println!("(no rows)");
                }
                for row in rows {
                    println!("{}", serde_json::to_string(&row)?);
                }
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")?.start()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Query(args) => run_query(args),
        Commands::Repl(args) => run_repl(args),
    }
}
