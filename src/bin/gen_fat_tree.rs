use clap::{Parser, ValueEnum};
use ftree_rs::subnet::{Guid, Subnet};
use ftree_rs::topo::{FatTreeOpts, TwoLevelOpts, build_fat_tree, build_two_level};
use ftree_rs::{FtreeError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    /// k-ary three-level fat-tree
    FatTree,
    /// leaf/spine
    TwoLevel,
}

#[derive(Debug, Parser)]
#[command(
    name = "gen-fat-tree",
    about = "Generate a discovered subnet JSON for fat-tree routing"
)]
struct Args {
    #[arg(long, value_enum, default_value = "fat-tree")]
    kind: Kind,

    /// fat-tree k (even)
    #[arg(long, default_value_t = 4)]
    k: usize,

    /// two-level: number of leaf switches
    #[arg(long, default_value_t = 2)]
    leaves: usize,

    /// two-level: number of spine switches
    #[arg(long, default_value_t = 2)]
    spines: usize,

    /// two-level: CAs per leaf switch
    #[arg(long, default_value_t = 2)]
    hosts_per_leaf: usize,

    /// Parallel links between adjacent switches
    #[arg(long, default_value_t = 1)]
    links_per_pair: usize,

    /// Output subnet JSON file; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the top-level switch GUIDs as a root GUID file
    #[arg(long)]
    roots_out: Option<PathBuf>,

    /// Disable logging
    #[arg(long)]
    quiet: bool,
}

fn write(path: &Path, contents: String) -> Result<()> {
    fs::write(path, contents).map_err(|source| FtreeError::DumpIo {
        path: path.to_path_buf(),
        source,
    })
}

fn run(args: &Args) -> Result<()> {
    let mut subnet = Subnet::new();
    let roots: Vec<Guid> = match args.kind {
        Kind::FatTree => {
            let opts = FatTreeOpts {
                k: args.k,
                links_per_pair: args.links_per_pair,
            };
            build_fat_tree(&mut subnet, &opts)?.core_switches
        }
        Kind::TwoLevel => {
            let opts = TwoLevelOpts {
                leaves: args.leaves,
                spines: args.spines,
                hosts_per_leaf: args.hosts_per_leaf,
                links_per_pair: args.links_per_pair,
            };
            build_two_level(&mut subnet, &opts)?.spines
        }
    };

    let json = subnet.to_json_string()?;
    match &args.out {
        Some(path) => {
            write(path, json)?;
            eprintln!("wrote subnet to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = &args.roots_out {
        let mut out = String::from("# root switches\n");
        for guid in roots {
            out.push_str(&format!("{guid}\n"));
        }
        write(path, out)?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.quiet {
            tracing_subscriber::EnvFilter::new("off")
        } else {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        })
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&args) {
        eprintln!("gen-fat-tree failed: {err}");
        process::exit(1);
    }
}
