use clap::Parser;
use crossbeam::channel::{unbounded, Receiver, Sender};
use patchsync::{
    app::{ClockApp, Console, NodeApp, OfflineApp},
    cli::{parse_command, source_id, Args, Command, Role},
    frame_loop::FrameLoop,
    logging,
    scheduler::{Scheduler, ThreadScheduler},
    sequencer::presets,
    Behavior, ClockGenerator, Monitor, Node, NodeOptions, NoteConsumer, Settings, Transport,
    UdpTransport, Visualizer,
};
use std::io::{self, BufRead};
use std::sync::Arc;

fn main() {
    let args = Args::parse();
    let node_name = args.node_name();
    let settings = load_settings(&args);

    if let Err(e) = logging::init_logger(&node_name, &settings.log_level) {
        eprintln!("Logging disabled: {}", e);
    }
    log::info!("Starting '{}' as {:?}", node_name, args.role);

    let commands = spawn_console_reader();
    let frame_loop = FrameLoop::new(settings.frame_interval(), commands);

    match args.role.clone() {
        Role::Clock { autostart, .. } => {
            let node = start_node(&node_name, Monitor::new(), &settings);
            let generator = ClockGenerator::new(settings.bpm, settings.bpm_range());
            let mut app = ClockApp::new(node, generator);
            if autostart {
                app.toggle();
            }
            frame_loop.run(&mut app);
            app.finish();
        }
        Role::Rhythm => run_node(&frame_loop, &node_name, presets::simple_kick(), &settings),
        Role::Drums => run_node(&frame_loop, &node_name, presets::drum_kit(), &settings),
        Role::Synth { channels } => {
            let consumer = NoteConsumer::new().with_channels(channels);
            run_node(&frame_loop, &node_name, consumer, &settings);
        }
        Role::Monitor => run_node(&frame_loop, &node_name, Monitor::new(), &settings),
        Role::Visual => run_node(&frame_loop, &node_name, Visualizer::new(), &settings),
        Role::Offline => {
            let mut app = OfflineApp::new(&node_name, presets::offline_kick());
            frame_loop.run(&mut app);
            app.finish();
        }
    }

    log::info!("'{}' exiting", node_name);
}

fn fail(message: String) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}

fn load_settings(args: &Args) -> Settings {
    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => fail(format!("Error loading settings: {}", e)),
    };
    args.apply_overrides(&mut settings);
    if let Err(e) = settings.validate() {
        fail(format!("Invalid settings: {}", e));
    }
    settings
}

fn start_node<B: Behavior>(node_name: &str, behavior: B, settings: &Settings) -> Node<B> {
    let config = settings.transport_config(node_name);
    let transport: Arc<dyn Transport> = match UdpTransport::open(&config, source_id(node_name)) {
        Ok(transport) => Arc::new(transport),
        Err(e) => fail(format!("Error opening transport: {}", e)),
    };
    let options = NodeOptions {
        stop_timeout: settings.stop_timeout(),
        ..NodeOptions::default()
    };
    match Node::start(node_name, behavior, transport, options) {
        Ok(node) => node,
        Err(e) => fail(format!("Error starting node: {}", e)),
    }
}

fn run_node<B: Console>(
    frame_loop: &FrameLoop<Command>,
    node_name: &str,
    behavior: B,
    settings: &Settings,
) {
    let mut app = NodeApp::new(start_node(node_name, behavior, settings));
    frame_loop.run(&mut app);
    app.finish();
}

/// Forwards parsed console lines to the frame loop. The channel closes at EOF.
fn spawn_console_reader() -> Receiver<Command> {
    let (tx, rx) = unbounded();
    if let Err(e) = ThreadScheduler::new().spawn("console", move || read_console(tx)) {
        log::warn!("No console input: {}", e);
    }
    rx
}

fn read_console(tx: Sender<Command>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            None => eprintln!("Unknown command: {}", line.trim()),
        }
    }
    log::debug!("Console input closed");
}
