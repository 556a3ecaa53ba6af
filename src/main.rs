use std::time::Duration;

use bin3d_optimizer::budget::TerminationReason;
use bin3d_optimizer::{binpack3d, render, BoxSpec, SolveLimits};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bin3d_optimizer", about = "Exact and heuristic 3D bin-packing optimizer")]
struct Cli {
    /// Bin dimensions (WxHxD, e.g. 100x100x100)
    #[arg(long)]
    stock: String,

    /// Boxes as wxhxd:qty (e.g. 40x30x20:3 10x10x10:5)
    #[arg(long = "boxes", num_args = 1..)]
    boxes: Vec<String>,

    /// Cap on branch-and-bound recursion nodes, in units of 1000 nodes (0 disables)
    #[arg(long = "node-limit", default_value_t = 0)]
    node_limit: u64,

    /// Cap on search iterations, in units of 1000 nodes (0 disables)
    #[arg(long = "iter-limit", default_value_t = 0)]
    iter_limit: u64,

    /// Wall-clock cap in seconds (0 disables)
    #[arg(long = "time-limit", default_value_t = 0)]
    time_limit: u64,

    /// Show ASCII layout of each bin, one grid per depth layer
    #[arg(long)]
    layout: bool,
}

struct Dims {
    w: i32,
    h: i32,
    d: i32,
}

fn parse_dimensions(s: &str) -> Result<Dims, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 3 {
        return Err(format!("invalid dimensions '{s}', expected WxHxD"));
    }
    let w = parts[0].parse::<i32>().map_err(|_| format!("invalid width in '{s}'"))?;
    let h = parts[1].parse::<i32>().map_err(|_| format!("invalid height in '{s}'"))?;
    let d = parts[2].parse::<i32>().map_err(|_| format!("invalid depth in '{s}'"))?;
    if w <= 0 || h <= 0 || d <= 0 {
        return Err(format!("dimensions must be positive in '{s}'"));
    }
    Ok(Dims { w, h, d })
}

fn parse_box(s: &str) -> Result<(Dims, u32), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid box '{s}', expected wxhxd:qty"));
    }
    let dims = parse_dimensions(parts[0])?;
    let qty = parts[1].parse::<u32>().map_err(|_| format!("invalid quantity in '{s}'"))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{s}'"));
    }
    Ok((dims, qty))
}

fn main() {
    let _sentry_guard = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions { release: sentry::release_name!(), ..Default::default() },
        ))
    });

    let cli = Cli::parse();

    let stock = parse_dimensions(&cli.stock).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let demands: Vec<(Dims, u32)> = cli
        .boxes
        .iter()
        .map(|c| parse_box(c))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        });

    let boxes: Vec<BoxSpec> = demands
        .iter()
        .flat_map(|(dims, qty)| std::iter::repeat(BoxSpec { w: dims.w, h: dims.h, d: dims.d }).take(*qty as usize))
        .collect();

    let limits = SolveLimits {
        node_limit: (cli.node_limit > 0).then_some(cli.node_limit),
        iter_limit: (cli.iter_limit > 0).then_some(cli.iter_limit),
        time_limit: (cli.time_limit > 0).then_some(Duration::from_secs(cli.time_limit)),
    };

    let outcome = binpack3d(stock.w, stock.h, stock.d, &boxes, limits).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    for bno in 1..=outcome.ub {
        println!("Bin {bno}:");
        for p in outcome.placements.iter().filter(|p| p.bno == bno) {
            println!("  {}x{}x{} @ ({}, {}, {})", p.w, p.h, p.d, p.x, p.y, p.z);
        }
    }

    if cli.layout {
        print!("{}", render::render_bin((stock.w, stock.h, stock.d), &outcome.placements));
    }

    match outcome.termination {
        TerminationReason::NodeLimit => println!("NODELIMIT"),
        TerminationReason::IterLimit => println!("ITERLIMIT"),
        TerminationReason::TimeLimit => println!("TIMELIMIT"),
        TerminationReason::Optimal => {}
    }

    println!("Summary: {} bin{} used (lower bound {})", outcome.ub, if outcome.ub == 1 { "" } else { "s" }, outcome.lb);
}
