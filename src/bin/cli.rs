//! spatium CLI: headless trajectory playback and state files.
//!
//! Usage:
//!   sp-cli [--mode dome|cube] [--sources N] [--shape circle-cw]
//!          [--link circular] [--elevation-link equal] [--elevation-shape up-down]
//!          [--duration SECONDS] [--seconds SECONDS] [--back-and-forth]
//!          [--load state.sptm] [--save state.sptm]
//!
//! `RUST_LOG=debug` shows session and state-file logging.

use sp_master::{
    event_channel, ElevationPolicy, ElevationShape, PositionPolicy, Session, SessionConfig,
    SpatMode, TrajectoryAxis, TrajectoryShape, MAX_SOURCES,
};
use std::{env, fs, process};

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
    }

    let mode = option(&args, "--mode").map_or(SpatMode::Dome, |name| {
        SpatMode::from_name(name).unwrap_or_else(|| fail(&format!("unknown mode {}", name)))
    });
    let sources = option(&args, "--sources").map_or(2, |n| {
        n.parse::<usize>()
            .ok()
            .filter(|n| (1..=MAX_SOURCES).contains(n))
            .unwrap_or_else(|| fail(&format!("--sources must be 1..={}", MAX_SOURCES)))
    });
    let duration = seconds_option(&args, "--duration").unwrap_or(5.0);
    let run_for = seconds_option(&args, "--seconds").unwrap_or(duration);

    let config = SessionConfig {
        mode,
        source_count: sources,
        cycle_duration: duration,
        ..SessionConfig::default()
    };
    let tick = config.tick_interval();
    let mut session = Session::new(config);

    if let Some(path) = option(&args, "--load") {
        let data = fs::read(path).unwrap_or_else(|e| fail(&format!("Failed to read {}: {}", path, e)));
        session
            .load(&data)
            .unwrap_or_else(|e| fail(&format!("Failed to load {}: {}", path, e)));
        println!("Loaded {} ({} sources)", path, session.source_count());
    }

    if let Some(name) = option(&args, "--link") {
        let policy = PositionPolicy::from_name(name)
            .unwrap_or_else(|| fail(&format!("unknown link policy {}", name)));
        session.set_position_policy(policy);
    }
    if let Some(name) = option(&args, "--elevation-link") {
        let policy = ElevationPolicy::from_name(name)
            .unwrap_or_else(|| fail(&format!("unknown elevation link policy {}", name)));
        session.set_elevation_policy(policy);
    }
    if let Some(name) = option(&args, "--shape") {
        let shape = TrajectoryShape::from_name(name)
            .unwrap_or_else(|| fail(&format!("unknown shape {}", name)));
        session.set_position_shape(shape);
    }
    if let Some(name) = option(&args, "--elevation-shape") {
        let shape = ElevationShape::from_name(name)
            .unwrap_or_else(|| fail(&format!("unknown elevation shape {}", name)));
        session.set_elevation_shape(shape);
    }
    if args.iter().any(|a| a == "--back-and-forth") {
        session.set_back_and_forth(TrajectoryAxis::Position, true);
        session.set_back_and_forth(TrajectoryAxis::Elevation, true);
    }

    let (sender, mut receiver) = event_channel(4096);
    session.add_listener(Box::new(sender));

    println!("Mode:     {}", session.mode().name());
    println!("Sources:  {}", session.source_count());
    println!("Link:     {} / {}", session.position_policy().name(), session.elevation_policy().name());
    println!("Shape:    {:?}", session.trajectory_kind(TrajectoryAxis::Position));
    println!("Cycle:    {:.2} s, running {:.2} s", duration, run_for);
    println!();
    print_positions(&session);

    session.play();
    let ticks = (run_for / tick).round() as u64;
    let per_second = (1.0 / tick).round().max(1.0) as u64;
    for i in 1..=ticks {
        session.tick(tick);
        if i % per_second == 0 || i == ticks {
            println!("t = {:6.2} s", session.elapsed());
            print_positions(&session);
        }
    }
    session.stop();

    let events = receiver.drain().count();
    println!();
    println!("Events:   {} delivered, {} dropped", events, receiver.dropped());

    if let Some(path) = option(&args, "--save") {
        let data = session
            .save()
            .unwrap_or_else(|e| fail(&format!("Failed to encode state: {}", e)));
        fs::write(path, &data).unwrap_or_else(|e| fail(&format!("Failed to write {}: {}", path, e)));
        println!("Saved {} bytes to {}", data.len(), path);
    }
}

fn option<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn seconds_option(args: &[String], flag: &str) -> Option<f64> {
    option(args, flag).map(|v| {
        v.parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or_else(|| fail(&format!("{} takes a positive number of seconds", flag)))
    })
}

fn print_positions(session: &Session) {
    for source in session.sources() {
        println!(
            "  #{:<2} x {:.3} y {:.3}  az {:7.2}°  el {:6.2}°  d {:.3}",
            source.id(),
            source.x(),
            source.y(),
            source.azimuth().to_degrees().get(),
            source.elevation().to_degrees().get(),
            source.distance()
        );
    }
}

fn usage() -> ! {
    eprintln!(
        "Usage: sp-cli [--mode dome|cube] [--sources N] [--shape NAME] [--link POLICY]\n\
         \x20             [--elevation-link POLICY] [--elevation-shape NAME]\n\
         \x20             [--duration S] [--seconds S] [--back-and-forth]\n\
         \x20             [--load FILE] [--save FILE]"
    );
    eprintln!();
    let shapes: Vec<&str> = TrajectoryShape::ALL.iter().map(|s| s.name()).collect();
    let links: Vec<&str> = PositionPolicy::ALL.iter().map(|p| p.name()).collect();
    let elevation_links: Vec<&str> = ElevationPolicy::ALL.iter().map(|p| p.name()).collect();
    eprintln!("Shapes:          {}", shapes.join(", "));
    eprintln!("Links:           {}", links.join(", "));
    eprintln!("Elevation links: {}", elevation_links.join(", "));
    process::exit(1);
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
