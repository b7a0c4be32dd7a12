use clap::Parser;
use ftree_rs::config::FtreeConfig;
use ftree_rs::ftree::{self, write_ca_ordering};
use ftree_rs::subnet::Subnet;
use ftree_rs::Result;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(
    name = "ftree-route",
    about = "Compute fat-tree unicast forwarding tables for a discovered subnet"
)]
struct Args {
    /// Path to subnet.json
    #[arg(long)]
    subnet: PathBuf,

    /// Optional JSON config (root_guid_file, cn_guid_file, dump_dir, lmc)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root switch GUID list; overrides config
    #[arg(long)]
    root_guid_file: Option<PathBuf>,

    /// Compute node port GUID list; overrides config
    #[arg(long)]
    cn_guid_file: Option<PathBuf>,

    /// Directory for opensm-ftree-ca-order.dump; overrides config
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// LMC; only 0 is supported
    #[arg(long)]
    lmc: Option<u8>,

    /// Output tables JSON file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Disable logging
    #[arg(long)]
    quiet: bool,
}

fn load_config(args: &Args) -> Result<FtreeConfig> {
    let mut cfg = match &args.config {
        Some(path) => FtreeConfig::from_json_file(path)?,
        None => FtreeConfig::default(),
    };
    if let Some(path) = &args.root_guid_file {
        cfg.root_guid_file = Some(path.clone());
    }
    if let Some(path) = &args.cn_guid_file {
        cfg.cn_guid_file = Some(path.clone());
    }
    if let Some(dir) = &args.dump_dir {
        cfg.dump_dir = Some(dir.clone());
    }
    if let Some(lmc) = args.lmc {
        cfg.lmc = lmc;
    }
    Ok(cfg)
}

fn run(args: &Args) -> Result<()> {
    let cfg = load_config(args)?;
    let options = cfg.resolve()?;
    let subnet = Subnet::from_json_file(&args.subnet)?;

    let outcome = ftree::route(&subnet, options)?;

    if let Some(dir) = &cfg.dump_dir {
        let path = write_ca_ordering(dir, &outcome.ca_order)?;
        eprintln!("wrote CA ordering to {}", path.display());
    }
    if let Some(path) = &args.out {
        fs::write(path, outcome.tables.to_json_string()?).map_err(|source| {
            ftree_rs::FtreeError::DumpIo {
                path: path.clone(),
                source,
            }
        })?;
        eprintln!("wrote forwarding tables to {}", path.display());
    }
    let stats = serde_json::to_string(&outcome.stats)
        .map_err(ftree_rs::FtreeError::export("routing stats"))?;
    println!("{stats}");
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
        tracing::error!(error = %err, "fat-tree 路由失败");
        eprintln!("fat-tree routing failed: {err}");
        process::exit(1);
    }
}
