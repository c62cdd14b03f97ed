use clap::Parser;
use color_eyre::eyre::bail;

use bdd_table::config::{GrowthPolicy, TableConfig};
use bdd_table::factory::Factory;
use bdd_table::node::NodeId;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of rounds of garbage to produce.
    #[arg(value_name = "INT", default_value = "100")]
    rounds: u32,

    /// Length of each chain of nodes.
    #[clap(long, value_name = "INT", default_value = "500")]
    length: u32,

    /// Initial table size (in bits, so the actual size is `2^bits` nodes).
    #[clap(
        long,
        value_name = "INT",
        default_value = "8",
        value_parser = clap::value_parser!(u32).range(1..=31)
    )]
    initial_bits: u32,

    /// Maximum table size (in bits).
    #[clap(
        long,
        value_name = "INT",
        default_value = "14",
        value_parser = clap::value_parser!(u32).range(1..=31)
    )]
    max_bits: u32,

    /// Grow by this factor instead of doubling.
    #[clap(long, value_name = "FLOAT")]
    factor: Option<f64>,

    /// Keep every n-th chain alive.
    #[clap(long, value_name = "INT", default_value = "10")]
    keep_every: u32,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    if args.initial_bits > args.max_bits {
        bail!(
            "--initial-bits ({}) must not exceed --max-bits ({})",
            args.initial_bits,
            args.max_bits
        );
    }
    let mut config = TableConfig::from_bits(args.initial_bits as usize, args.max_bits as usize);
    if let Some(f) = args.factor {
        if f.is_nan() || f <= 1.0 {
            bail!("--factor must be greater than 1, got {}", f);
        }
        config = config.with_growth(GrowthPolicy::Factor(f));
    }
    let mut factory = Factory::new(config);
    println!("table = {:?}", factory.table());

    // Each round builds the conjunction of `length` fresh variables as a chain.
    // Most chains are garbage immediately, some are kept alive until the end.
    let mut kept = vec![];
    for round in 0..args.rounds {
        let offset = round * args.length;
        let mut f = factory.one();
        for v in (offset..offset + args.length).rev() {
            f = factory.mk(v, NodeId::FALSE, f)?;
        }
        if round % args.keep_every.max(1) == 0 {
            kept.push(factory.protect(f)?);
        }
    }

    println!("table = {:?}", factory.table());
    println!("stats = {:?}", factory.table().stats());
    println!("gc passes: {}", factory.gc_count());
    println!("kept {} chains", kept.len());

    for h in &kept {
        let mut f = factory.root(h).unwrap_or(NodeId::FALSE);
        let mut size = 0;
        while !f.is_terminal() {
            f = factory.node(f)?.high;
            size += 1;
        }
        assert_eq!(size, args.length);
    }

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
