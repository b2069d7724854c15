use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use road_groups::{
    args::GroupSearchOptions,
    modes,
    output::RenderOptions,
    parse::read_roads,
    progress::Progress,
    RoadGraph, Result, SegmentId, TypeFilter,
};

#[derive(Debug, Parser)]
#[command(
    name = "road-groups",
    version = "0.1.0",
    about = "Enumerates connected road groups of a road network and renders them"
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
    /// Log level: off, error, warn, info, debug or trace
    #[clap(long, default_value = "info", global = true)]
    log_level: LevelFilter,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search road groups from many start segments and render every group
    Groups {
        #[clap(long, default_value = "roads.json")]
        input: PathBuf,
        #[clap(long, default_value = "routes")]
        output: PathBuf,
        /// Coordinates of the input are already projected, in metres
        #[clap(long)]
        projected: bool,
        /// Read the search options from a JSON file instead of the flags
        #[clap(long)]
        config: Option<PathBuf>,
        #[clap(flatten)]
        search: GroupSearchOptions,
        #[clap(flatten)]
        render: RenderOptions,
    },
    /// List the segments touching a segment
    Neighbours {
        #[clap(long, default_value = "roads.json")]
        input: PathBuf,
        #[clap(long)]
        projected: bool,
        #[clap(short, long)]
        segment: usize,
        /// Road types taking part in adjacency, empty for all
        #[clap(short, long = "type", value_delimiter = ',')]
        types: Vec<String>,
    },
    /// Render a set of segments to one image
    Draw {
        #[clap(long, default_value = "roads.json")]
        input: PathBuf,
        #[clap(long, default_value = "segments.svg")]
        output: PathBuf,
        #[clap(long)]
        projected: bool,
        #[clap(short, long, value_delimiter = ',', required = true)]
        segments: Vec<usize>,
        #[clap(flatten)]
        render: RenderOptions,
    },
}

fn init_logging(level: LevelFilter) -> MultiProgress {
    let multi = MultiProgress::new();
    let logger = SimpleLogger::new().with_level(level);
    if let Err(err) = LogWrapper::new(multi.clone(), logger).try_init() {
        eprintln!("Could not initialise logging: {}", err);
    }
    log::set_max_level(level);
    multi
}

fn main() {
    let args: Cli = Cli::parse();
    let multi = init_logging(args.log_level);

    if let Err(err) = run(args.commands, multi) {
        eprintln!("{} {}", style("error:").bold().red(), err);
        std::process::exit(1);
    }
}

fn run(commands: Commands, multi: MultiProgress) -> Result<()> {
    match commands {
        Commands::Groups {
            input,
            output,
            projected,
            config,
            search,
            render,
        } => {
            let search = match config {
                Some(path) => GroupSearchOptions::read(path)?,
                None => search,
            };
            search.bounds()?;
            let mut progress = Progress::new(multi, 4);

            progress.step(format!("Reading roads from {}", input.display()));
            let roads = read_roads(&input, projected)?;
            progress.finish(format!("Read {} roads", style(roads.len()).bold()));

            progress.step("Indexing road graph");
            let graph = RoadGraph::new(roads, search.type_filter())?;
            progress.finish(format!(
                "Indexed {} of {} segments",
                style(graph.filtered_ids().len()).bold(),
                style(graph.len()).bold()
            ));

            let found = modes::find_groups(&graph, &search, &mut progress)?;
            modes::write_groups(&graph, &found, &output, &render, &mut progress)?;
        }
        Commands::Neighbours {
            input,
            projected,
            segment,
            types,
        } => {
            let graph = RoadGraph::new(read_roads(&input, projected)?, TypeFilter::new(types))?;
            let (segment, touching) = modes::neighbours(&graph, SegmentId(segment))?;
            println!(
                "{} {} {:.1}m touches {} segments",
                style(segment.id).bold().green(),
                segment.road_type,
                segment.length,
                style(touching.len()).bold()
            );
            for other in touching {
                println!("  {}\t{}\t{:.1}m", other.id, other.road_type, other.length);
            }
        }
        Commands::Draw {
            input,
            output,
            projected,
            segments,
            render,
        } => {
            let graph = RoadGraph::new(read_roads(&input, projected)?, TypeFilter::allow_all())?;
            let ids = segments.into_iter().map(SegmentId).collect::<Vec<_>>();
            let canvas = modes::draw_segments(&graph, &ids, &render)?;
            canvas.save(&output)?;
            println!("Saved {} segments to {}", ids.len(), output.display());
        }
    }

    Ok(())
}
