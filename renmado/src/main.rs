mod app;
mod arranger;
mod core;
mod error;
mod ipc;
#[cfg(target_os = "macos")]
mod macos;
mod manager;
mod mirror;
mod native;
mod platform;
#[cfg(target_os = "windows")]
mod win32;

use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use ipc::IpcClient;
use renmado_ipc::{
    CellSize, Command, EventFilter, KeyEventKind, MirrorOptions, MouseEventKind, Response,
};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Renmado - tile and drive a group of browser windows as one
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Monitors(MonitorsCmd),
    Arrange(ArrangeCmd),
    Bounds(BoundsCmd),
    Windows(WindowsCmd),
    Mouse(MouseCmd),
    MousePopup(MousePopupCmd),
    Key(KeyCmd),
    Wheel(WheelCmd),
    IsActive(IsActiveCmd),
    GroupStart(GroupStartCmd),
    GroupStop(GroupStopCmd),
    GroupStatus(GroupStatusCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the renmado daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// path to a JSON config file
    #[argh(option)]
    config: Option<PathBuf>,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// List connected monitors
#[derive(FromArgs)]
#[argh(subcommand, name = "monitors")]
struct MonitorsCmd {}

/// Tile the main window of each process into a grid
#[derive(FromArgs)]
#[argh(subcommand, name = "arrange")]
struct ArrangeCmd {
    /// pid placed in the first cell
    #[argh(positional)]
    main_pid: i32,
    /// pids placed in the following cells
    #[argh(positional, greedy)]
    child_pids: Vec<i32>,
    /// number of grid columns
    #[argh(option, default = "2")]
    columns: u32,
    /// cell width in pixels (0 = fit the monitor)
    #[argh(option, default = "0")]
    width: u32,
    /// cell height in pixels (0 = fit the monitor)
    #[argh(option, default = "0")]
    height: u32,
    /// gap between cells in pixels
    #[argh(option, default = "0")]
    spacing: u32,
    /// index into the `monitors` listing
    #[argh(option, default = "0")]
    monitor: i32,
}

/// Print the main window bounds of a process
#[derive(FromArgs)]
#[argh(subcommand, name = "bounds")]
struct BoundsCmd {
    /// process id
    #[argh(positional)]
    pid: i32,
}

/// List the classified windows of a process
#[derive(FromArgs)]
#[argh(subcommand, name = "windows")]
struct WindowsCmd {
    /// process id
    #[argh(positional)]
    pid: i32,
}

/// Deliver a mouse event to a process's main window at a screen point
#[derive(FromArgs)]
#[argh(subcommand, name = "mouse")]
struct MouseCmd {
    /// process id
    #[argh(positional)]
    pid: i32,
    /// screen x
    #[argh(positional)]
    x: i32,
    /// screen y
    #[argh(positional)]
    y: i32,
    /// mousemove, mousedown, mouseup, rightdown or rightup
    #[argh(positional)]
    event: MouseEventKind,
}

/// Deliver a mouse event, matching the master's popup in the slave
#[derive(FromArgs)]
#[argh(subcommand, name = "mouse-popup")]
struct MousePopupCmd {
    /// master process id
    #[argh(positional)]
    master_pid: i32,
    /// slave process id
    #[argh(positional)]
    slave_pid: i32,
    /// screen x
    #[argh(positional)]
    x: i32,
    /// screen y
    #[argh(positional)]
    y: i32,
    /// mousemove, mousedown, mouseup, rightdown or rightup
    #[argh(positional)]
    event: MouseEventKind,
}

/// Deliver a key transition to a process
#[derive(FromArgs)]
#[argh(subcommand, name = "key")]
struct KeyCmd {
    /// process id
    #[argh(positional)]
    pid: i32,
    /// platform virtual key code
    #[argh(positional)]
    key_code: u32,
    /// keydown or keyup
    #[argh(positional)]
    event: KeyEventKind,
}

/// Deliver a wheel event to a process (put `--` before negative deltas)
#[derive(FromArgs)]
#[argh(subcommand, name = "wheel")]
struct WheelCmd {
    /// process id
    #[argh(positional)]
    pid: i32,
    /// horizontal delta, 120 per notch
    #[argh(positional)]
    delta_x: i32,
    /// vertical delta, 120 per notch
    #[argh(positional)]
    delta_y: i32,
}

/// Check whether a process owns the foreground window
#[derive(FromArgs)]
#[argh(subcommand, name = "is-active")]
struct IsActiveCmd {
    /// process id
    #[argh(positional)]
    pid: i32,
}

/// Start mirroring the master's input to the slaves
#[derive(FromArgs)]
#[argh(subcommand, name = "group-start")]
struct GroupStartCmd {
    /// master process id
    #[argh(positional)]
    master_pid: i32,
    /// slave process ids
    #[argh(positional, greedy)]
    slave_pids: Vec<i32>,
    /// do not mirror mouse buttons and movement
    #[argh(switch)]
    no_mouse: bool,
    /// do not mirror key transitions
    #[argh(switch)]
    no_keyboard: bool,
    /// do not mirror the wheel
    #[argh(switch)]
    no_wheel: bool,
}

/// Stop the running mirroring session
#[derive(FromArgs)]
#[argh(subcommand, name = "group-stop")]
struct GroupStopCmd {}

/// Show the mirroring session status
#[derive(FromArgs)]
#[argh(subcommand, name = "group-status")]
struct GroupStatusCmd {}

/// Stream daemon events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// only mirrored-input notifications
    #[argh(switch)]
    control: bool,
    /// only session started/stopped events
    #[argh(switch)]
    session: bool,
}

/// Quit the renmado daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            let args: Vec<&str> = vec!["renmado", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("renmado starting");
            let config = core::Config::load(cmd.config.as_deref())?;
            app::App::run(config)
        }
        Some(SubCommand::Version(_)) => {
            println!("renmado {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => ipc::subscribe_and_print(EventFilter {
            control: cmd.control,
            session: cmd.session,
        }),
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { kind, message } => {
            eprintln!("Error: {} ({:?})", message, kind);
            std::process::exit(1);
        }
        Response::Monitors { monitors } => {
            for m in monitors {
                println!(
                    "{}: {}x{} @ ({},{}){}",
                    m.index,
                    m.width,
                    m.height,
                    m.x,
                    m.y,
                    if m.is_primary { " primary" } else { "" }
                );
            }
        }
        Response::Arranged { report } => {
            println!("arranged={} failed={}", report.arranged, report.failed);
            if !report.skipped_pids.is_empty() {
                println!("skipped: {:?}", report.skipped_pids);
            }
        }
        Response::Bounds { bounds } => {
            if !bounds.success {
                std::process::exit(1);
            }
            println!(
                "{}x{} @ ({},{})",
                bounds.width, bounds.height, bounds.x, bounds.y
            );
        }
        Response::Windows { windows } => {
            for w in windows {
                println!(
                    "{}: {} [{}x{} @ ({},{})]{}",
                    w.id,
                    w.title,
                    w.width,
                    w.height,
                    w.x,
                    w.y,
                    if w.is_extension { " extension" } else { "" }
                );
            }
        }
        Response::Delivered { success } => {
            if !success {
                std::process::exit(1);
            }
        }
        Response::Active { active } => {
            println!("{}", active);
        }
        Response::GroupControl { status } => {
            println!("{}", status);
        }
        Response::GroupStatus { status } => {
            println!("Active: {}", status.is_active);
            if let Some(master) = status.master_pid {
                println!("Master: {}", master);
                println!("Slaves: {:?}", status.slave_pids);
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Monitors(_) => Command::GetMonitors,
        SubCommand::Arrange(cmd) => Command::ArrangeWindows {
            main_pid: cmd.main_pid,
            child_pids: cmd.child_pids,
            columns: cmd.columns,
            size: CellSize::new(cmd.width, cmd.height),
            spacing: cmd.spacing,
            monitor_index: cmd.monitor,
        },
        SubCommand::Bounds(cmd) => Command::GetWindowBounds { pid: cmd.pid },
        SubCommand::Windows(cmd) => Command::ListWindows { pid: cmd.pid },
        SubCommand::Mouse(cmd) => Command::SendMouseEvent {
            pid: cmd.pid,
            x: cmd.x,
            y: cmd.y,
            event: cmd.event,
        },
        SubCommand::MousePopup(cmd) => Command::SendMouseEventWithPopupMatching {
            master_pid: cmd.master_pid,
            slave_pid: cmd.slave_pid,
            x: cmd.x,
            y: cmd.y,
            event: cmd.event,
        },
        SubCommand::Key(cmd) => Command::SendKeyboardEvent {
            pid: cmd.pid,
            key_code: cmd.key_code,
            event: cmd.event,
        },
        SubCommand::Wheel(cmd) => Command::SendWheelEvent {
            pid: cmd.pid,
            delta_x: cmd.delta_x,
            delta_y: cmd.delta_y,
        },
        SubCommand::IsActive(cmd) => Command::IsProcessWindowActive { pid: cmd.pid },
        SubCommand::GroupStart(cmd) => {
            // Without switches the daemon's configured defaults apply
            let options = (cmd.no_mouse || cmd.no_keyboard || cmd.no_wheel).then(|| {
                MirrorOptions {
                    mouse: !cmd.no_mouse,
                    keyboard: !cmd.no_keyboard,
                    wheel: !cmd.no_wheel,
                    ..MirrorOptions::default()
                }
            });
            Command::StartGroupControl {
                master_pid: cmd.master_pid,
                slave_pids: cmd.slave_pids,
                options,
            }
        }
        SubCommand::GroupStop(_) => Command::UninstallHooks,
        SubCommand::GroupStatus(_) => Command::GetGroupStatus,
        SubCommand::Quit(_) => Command::Quit,
    }
}
