//! Parking-lot 拥塞控制实验
//!
//! 构建 3 交换机 parking-lot 拓扑，整形两条瓶颈链路，按时间线启动 iperf3 流。
//! 默认使用 dry-run 引擎与虚拟时钟：只校验、记录命令，不真正等待。

use clap::Parser;
use parkinglot_rs::ExperimentError;
use parkinglot_rs::engine::{CommandReset, DryRunEngine, EnvironmentReset, NoopReset};
use parkinglot_rs::scenario::{
    CongestionControl, ExperimentConfig, ScenarioOrchestrator, plan_scenario,
};
use parkinglot_rs::sim::{Clock, VirtualClock, WallClock};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "parking-lot", about = "Parking-lot 拓扑：多瓶颈链路上的 TCP 拥塞控制竞争实验")]
struct Args {
    /// 内置场景：connectivity / staggered / competing
    #[arg(long, default_value = "staggered")]
    preset: String,

    /// 从 JSON 文件加载配置（优先于 --preset）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 挂在 S1 与 S3 上的主机数
    #[arg(long)]
    n: Option<i64>,

    /// 瓶颈链路带宽（Mbps）
    #[arg(long)]
    bandwidth_mbps: Option<f64>,

    /// 两条瓶颈链路的单向时延，如 `0ms,10ms`
    #[arg(long, value_delimiter = ',', num_args = 2)]
    delays: Option<Vec<String>>,

    /// 瓶颈链路随机丢包率（%）
    #[arg(long)]
    loss_percent: Option<f64>,

    /// 瓶颈链路队列大小（包）
    #[arg(long)]
    queue_pkts: Option<i64>,

    /// 按声明顺序覆盖各条流的拥塞控制，如 `cubic,bbr`
    #[arg(long, value_delimiter = ',')]
    cc: Vec<CongestionControl>,

    /// 最后一条流结束后的宽限期（秒）
    #[arg(long)]
    grace_secs: Option<f64>,

    /// 输出文件目录
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// 输出文件名末尾的变体标记
    #[arg(long)]
    variant: Option<String>,

    /// 把展开后的计划写成 JSON
    #[arg(long)]
    plan_json: Option<PathBuf>,

    /// 只生成计划，不运行
    #[arg(long, default_value_t = false)]
    plan_only: bool,

    /// 把运行报告写成 JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// 使用墙上时钟真实等待
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// 运行前执行 `mn -c` 等清理命令
    #[arg(long, default_value_t = false)]
    reset: bool,
}

fn resolve_config(args: &Args) -> Result<ExperimentConfig, ExperimentError> {
    let mut cfg = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::preset(&args.preset).ok_or_else(|| {
            ExperimentError::Configuration(format!(
                "unknown preset {:?}, expected one of {:?}",
                args.preset,
                ExperimentConfig::PRESETS
            ))
        })?,
    };
    if let Some(n) = args.n {
        cfg.n = n;
    }
    if let Some(bw) = args.bandwidth_mbps {
        cfg.bottleneck.bandwidth_mbps = bw;
    }
    if let Some(d) = &args.delays {
        if let [a, b] = d.as_slice() {
            cfg.bottleneck.delays = [a.clone(), b.clone()];
        }
    }
    if let Some(loss) = args.loss_percent {
        cfg.bottleneck.loss_percent = loss;
    }
    if let Some(q) = args.queue_pkts {
        cfg.bottleneck.queue_packets = q;
    }
    for (flow, cc) in cfg.flows.iter_mut().zip(&args.cc) {
        flow.congestion = cc.clone();
    }
    if let Some(g) = args.grace_secs {
        cfg.grace_secs = g;
    }
    if let Some(dir) = &args.out_dir {
        cfg.artifact_dir = dir.clone();
    }
    if let Some(v) = &args.variant {
        cfg.variant = Some(v.clone());
    }
    Ok(cfg)
}

fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cfg = match resolve_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error during {}: {e}", e.stage());
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.plan_json {
        let plan = match plan_scenario(&cfg) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("error during {}: {e}", e.stage());
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = write_json(path, &plan) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }
    if args.plan_only {
        return ExitCode::SUCCESS;
    }

    let mut engine = DryRunEngine::new();
    let mut reset: Box<dyn EnvironmentReset> = if args.reset {
        Box::new(CommandReset::default())
    } else {
        Box::new(NoopReset)
    };
    let mut clock: Box<dyn Clock> = if args.realtime {
        Box::new(WallClock::new())
    } else {
        Box::new(VirtualClock::new())
    };

    let report =
        match ScenarioOrchestrator::new(&cfg, &mut engine, reset.as_mut(), clock.as_mut()).run() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error during {}: {e}", e.stage());
                return ExitCode::FAILURE;
            }
        };

    println!(
        "scenario {} finished in state {:?} after {}s",
        report.name,
        report.final_state(),
        report.scenario_duration_secs,
    );
    println!(
        "  connectivity: sent={}, received={}, dropped={}%",
        report.connectivity.sent(),
        report.connectivity.received(),
        report.connectivity.dropped_percent(),
    );
    println!(
        "  warnings={}, possibly_truncated={}",
        report.warnings.len(),
        report.possibly_truncated.len(),
    );
    for l in &report.launches {
        println!(
            "launch t={}s host={} role={} {}",
            l.at_secs, l.host, l.role, l.command
        );
    }

    if let Some(path) = &args.report_json {
        if let Err(e) = write_json(path, &report) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
