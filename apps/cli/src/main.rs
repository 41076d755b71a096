//! # Stacker CLI
//!
//! 控制核心的命令行试验台，全部命令跑在进程内模拟台架上：
//!
//! ```bash
//! # 跑三轮取放循环
//! stacker-cli demo --cycles 3 --color red
//!
//! # 一次性遥测 + 链路诊断快照
//! stacker-cli status
//!
//! # 单发 DRIVE 命令并观察轮子脉宽
//! stacker-cli drive --vx 200 --wz -400
//! ```

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use stacker_sdk::sim::SimRig;
use stacker_sdk::{ColorId, ColorSensor, DriveModel, SeqStep, Sequencer, ShelfMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Stacker CLI - 分拣小车控制核心试验台
#[derive(Parser, Debug)]
#[command(name = "stacker-cli")]
#[command(about = "Command-line harness for the stacker control core", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在模拟台架上跑取放循环
    Demo {
        /// 完成多少轮后退出
        #[arg(short, long, default_value_t = 3)]
        cycles: u64,

        /// 模拟相机固定返回的颜色
        #[arg(long, default_value = "red", value_parser = parse_color)]
        color: ColorId,

        /// 使用麦克纳姆轮运动学
        #[arg(long)]
        mecanum: bool,
    },

    /// 遥测与链路诊断快照
    Status,

    /// 单发 DRIVE 命令
    Drive {
        /// 前向速度 (mm/s)
        #[arg(long, default_value_t = 200)]
        vx: i16,

        /// 角速度 (mrad/s)
        #[arg(long, default_value_t = 0)]
        wz: i16,

        /// 命令有效窗口 (ms)
        #[arg(long, default_value_t = 500)]
        hold_ms: u16,
    },
}

fn parse_color(s: &str) -> Result<ColorId, String> {
    match s.to_ascii_lowercase().as_str() {
        "red" => Ok(ColorId::Red),
        "green" => Ok(ColorId::Green),
        "blue" => Ok(ColorId::Blue),
        "yellow" => Ok(ColorId::Yellow),
        "white" => Ok(ColorId::White),
        "black" => Ok(ColorId::Black),
        "none" => Ok(ColorId::None),
        other => Err(format!("unknown color: {other}")),
    }
}

/// 固定颜色的模拟相机
struct FixedCamera(ColorId);

impl ColorSensor for FixedCamera {
    fn detect_color(&mut self) -> ColorId {
        self.0
    }
}

fn main() -> Result<()> {
    stacker_sdk::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            cycles,
            color,
            mecanum,
        } => demo(cycles, color, mecanum),
        Commands::Status => status(),
        Commands::Drive { vx, wz, hold_ms } => drive(vx, wz, hold_ms),
    }
}

fn demo(cycles: u64, color: ColorId, mecanum: bool) -> Result<()> {
    let model = if mecanum {
        DriveModel::Mecanum
    } else {
        DriveModel::Differential
    };
    let (mut rig, mut link) = SimRig::new(model);
    link.init()?;
    let mut seq = Sequencer::new(link, FixedCamera(color), ShelfMap::default());

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    info!(cycles, ?color, ?model, "demo starting");
    let mut last_step = SeqStep::Init;
    while running.load(Ordering::SeqCst) && seq.cycles() < cycles {
        let now = Instant::now();
        seq.tick(now);
        rig.node.tick(now);
        if seq.step() != last_step {
            last_step = seq.step();
            println!("step -> {:?} (cycles done: {})", last_step, seq.cycles());
        }
        spin_sleep::sleep(Duration::from_millis(10));
    }

    let s0 = seq.link_mut().status0()?;
    println!(
        "done: {} cycles, node state {:?}, seq_ack {}, err 0x{:04X}",
        seq.cycles(),
        s0.state,
        s0.seq_ack,
        s0.err_flags.0
    );
    Ok(())
}

fn status() -> Result<()> {
    let (mut rig, mut link) = SimRig::new(DriveModel::Differential);
    link.init()?;
    rig.node.tick(Instant::now());

    let s0 = link.status0()?;
    let s1 = link.status1()?;
    let power = link.power()?;
    let lines = link.lines()?;
    let odo = link.odometry()?;
    println!("state:    {:?}  seq_ack {}  err 0x{:04X}", s0.state, s0.seq_ack, s0.err_flags.0);
    println!("lift:     {} mm   grip: {} deg", s1.elev_mm, s1.grip_deg);
    println!("power:    {} mV  estop {}", power.vbatt_mv, power.estop);
    println!("lines:    L {} R {} (threshold {})", lines.left, lines.right, lines.threshold);
    println!("odometry: L {} R {}", odo.left, odo.right);
    println!("link:     {:#?}", link.diagnostics());
    Ok(())
}

fn drive(vx: i16, wz: i16, hold_ms: u16) -> Result<()> {
    if hold_ms == 0 {
        bail!("hold window must be nonzero");
    }
    let (mut rig, mut link) = SimRig::new(DriveModel::Differential);
    link.init()?;
    link.drive(vx, 0, wz, hold_ms)?;
    rig.node.tick(Instant::now() + Duration::from_millis(1));

    let fb = link.drive_feedback()?;
    let s0 = link.status0()?;
    println!(
        "state {:?}  wheels [FL {} FR {}] us  err 0x{:04X}",
        s0.state, fb.wheel_us[0], fb.wheel_us[1], s0.err_flags.0
    );
    Ok(())
}
