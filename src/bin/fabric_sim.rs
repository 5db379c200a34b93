//! 网络织物仿真
//!
//! 构建一个拓扑（内置或来自 JSON 场景），执行生成树，注入流量并运行。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use fabric_sim::net::FabricWorld;
use fabric_sim::sim::{SimTime, Simulator};
use fabric_sim::topo::endpoint;
use fabric_sim::topo::ring::{RingOpts, build_switch_ring};
use fabric_sim::topo::routed::build_routed_pair;
use fabric_sim::topo::scenario::ScenarioSpec;
use fabric_sim::topo::star::{StarOpts, build_star_lan};
use fabric_sim::topo::traffic::InjectFrames;
use fabric_sim::viz::SharedLog;
use fabric_sim::{Result, SimConfig};
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Topology {
    /// 交换机环（默认三角形）
    Ring,
    /// 单交换机星型局域网
    Star,
    /// 两个局域网经路由器互联
    Routed,
}

#[derive(Debug, Parser)]
#[command(name = "fabric_sim", about = "虚拟网络织物仿真：交换机学习、生成树、链路时延")]
struct Args {
    /// JSON 场景文件；给出时忽略 --topology
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Topology::Ring)]
    topology: Topology,
    /// 环上的交换机数
    #[arg(long, default_value_t = 3)]
    switches: usize,
    /// 每台交换机（或星型交换机）下的主机数
    #[arg(long, default_value_t = 1)]
    hosts: usize,
    /// 内置拓扑里每个方向发送的帧数
    #[arg(long, default_value_t = 2)]
    frames: u64,
    /// 时延倍数（1–100）
    #[arg(long)]
    delay_factor: Option<u32>,
    /// RTT 延长倍数（1–5）
    #[arg(long)]
    rtt_factor: Option<u32>,
    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 60_000)]
    until_ms: u64,
    /// 输出事件 JSON 文件
    #[arg(long)]
    viz_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(args: &Args, file: Option<SimConfig>) -> Result<SimConfig> {
    let mut cfg = file.unwrap_or_default();
    if let Some(d) = args.delay_factor {
        cfg = cfg.with_delay_factor(d)?;
    }
    if let Some(r) = args.rtt_factor {
        cfg = cfg.with_rtt_factor(r)?;
    }
    Ok(cfg)
}

/// 在 `a`、`b` 之间双向各发 `frames` 帧（先 a→b 再 b→a，便于观察学习）
fn schedule_ping_pong(
    world: &FabricWorld,
    sim: &mut Simulator,
    a: fabric_sim::net::NodeId,
    b: fabric_sim::net::NodeId,
    frames: u64,
) -> Result<()> {
    let (pa, ma) = endpoint(&world.fabric, a)?;
    let (pb, mb) = endpoint(&world.fabric, b)?;
    let gap = SimTime::from_millis(10);
    sim.schedule(
        SimTime::ZERO,
        InjectFrames {
            port: pa,
            src: ma,
            dst: mb,
            payload_bytes: 64,
            remaining: frames,
            gap,
        },
    );
    // 第一帧到达后再反向发送
    sim.schedule(
        SimTime::from_millis(5_000),
        InjectFrames {
            port: pb,
            src: mb,
            dst: ma,
            payload_bytes: 64,
            remaining: frames,
            gap,
        },
    );
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let spec = args.scenario.as_deref().map(ScenarioSpec::load).transpose()?;
    let cfg = resolve_config(&args, spec.as_ref().and_then(|s| s.config))?;
    info!(
        delay_factor = cfg.delay_factor(),
        rtt_factor = cfg.rtt_factor(),
        link_delay = %cfg.link_delay(),
        "仿真配置"
    );

    let mut sim = Simulator::default();
    let mut world = FabricWorld::new(cfg);
    let log = SharedLog::new();
    if args.viz_json.is_some() {
        world.fabric.subscribe(Box::new(log.clone()));
    }

    let mut endpoints = None;
    let scenario = match &spec {
        Some(spec) => Some(spec.build(&mut world.fabric)?),
        None => {
            endpoints = match args.topology {
                Topology::Ring => {
                    let opts = RingOpts {
                        switches: args.switches,
                        hosts_per_switch: args.hosts,
                    };
                    let topo = build_switch_ring(&mut world.fabric, &opts)?;
                    topo.hosts.first().copied().zip(topo.hosts.last().copied())
                }
                Topology::Star => {
                    let opts = StarOpts {
                        hosts: args.hosts.max(2),
                        ..StarOpts::default()
                    };
                    let topo = build_star_lan(&mut world.fabric, &opts)?;
                    topo.hosts.first().copied().zip(topo.hosts.last().copied())
                }
                Topology::Routed => {
                    let topo = build_routed_pair(&mut world.fabric)?;
                    let route = world
                        .fabric
                        .best_route(topo.h0, std::net::Ipv4Addr::new(192, 168, 2, 10))?;
                    println!(
                        "route h0 -> 192.168.2.10 via {} on {}",
                        route.gateway, route.interface
                    );
                    // 数据链路层不跨路由器，只在 LAN A 内收发
                    Some((topo.h0, topo.router))
                }
            };
            None
        }
    };

    let report = world.fabric.start_run(&mut sim);
    println!(
        "stp components={} blocked_cables={} roots={:?}",
        report.components.len(),
        report.blocked_cables.len(),
        report.roots().iter().map(|n| n.0).collect::<Vec<_>>()
    );

    match (&spec, &scenario) {
        (Some(spec), Some(scenario)) => spec.schedule_traffic(scenario, &world.fabric, &mut sim)?,
        _ => {
            if let Some((a, b)) = endpoints.filter(|(a, b)| a != b) {
                schedule_ping_pong(&world, &mut sim, a, b, args.frames)?;
            }
        }
    }

    sim.run_until(SimTime::from_millis(args.until_ms), &mut world);

    let s = &world.fabric.stats;
    println!(
        "done @ {}, delivered_frames={}, unicast={}, flooded={}, dropped_blocked={}, lost={}",
        sim.now(),
        s.delivered_frames,
        s.unicast_frames,
        s.flooded_frames,
        s.dropped_blocked,
        s.lost_frames
    );

    if let Some(path) = args.viz_json {
        log.lock().write_json(&path)?;
        eprintln!("wrote viz events to {}", path.display());
    }
    Ok(())
}
