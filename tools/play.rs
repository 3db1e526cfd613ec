/// Play — interactive terminal shell for walking a story.
///
/// Usage: play [--scenes <path>] [--seed <n>]
///
/// Commands:
///   look                       — show the current scene
///   next                       — continue from narration to interaction
///   choose <n>                 — take choice n (1-based)
///   game                       — start the scene's own mini-game
///   key down|up <name>         — press or release a key (w, ArrowUp, ...)
///   press|drag|release <x> <y> — pointer events in play-field units
///   wait <ms>                  — let time pass (frames run every 16 ms)
///   draw                       — print the latest mini-game frame
///   gallery                    — list endings
///   history                    — list visited scenes
///   help                       — list commands
///   quit                       — exit

use carbon_journey::core::controller::{NarrativeController, Step};
use carbon_journey::core::geometry::Point;
use carbon_journey::core::input::{InputEvent, Key};
use carbon_journey::core::render::TextRenderer;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FRAME_MS: u64 = 16;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbon_journey=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut scenes_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenes" if i + 1 < args.len() => {
                i += 1;
                scenes_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = NarrativeController::builder().seed(seed);
    if let Some(ref path) = scenes_path {
        builder = builder.scenes_file(path);
    }
    let mut controller = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let mut renderer = TextRenderer::default();

    println!("Carbon Atom's Journey ({} scenes, seed {})", controller.graph().len(), seed);
    println!("Type 'help' for commands.\n");
    print_scene(&controller);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("play> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                controller.shutdown();
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "look" | "l" => print_scene(&controller),
            "next" | "n" => match controller.continue_story() {
                Ok(()) => print_scene(&controller),
                Err(e) => println!("Can't continue: {}", e),
            },
            "choose" | "c" => {
                let Some(n) = parts.get(1).and_then(|s| s.parse::<usize>().ok()) else {
                    println!("Usage: choose <n>");
                    continue;
                };
                match controller.choose(n.saturating_sub(1)) {
                    Ok(resolution) => println!("{:?}", resolution),
                    Err(e) => println!("Can't choose: {}", e),
                }
            }
            "game" | "g" => match controller.start_scene_game() {
                Ok(kind) => {
                    println!("{}: {}", kind.banner(), kind.rules());
                }
                Err(e) => println!("No game to start: {}", e),
            },
            "key" => {
                let (Some(dir), Some(name)) = (parts.get(1), parts.get(2)) else {
                    println!("Usage: key down|up <name>");
                    continue;
                };
                let Some(key) = Key::from_name(name) else {
                    println!("Unknown key: {}", name);
                    continue;
                };
                let event = match *dir {
                    "down" => InputEvent::KeyDown(key),
                    "up" => InputEvent::KeyUp(key),
                    other => {
                        println!("Expected 'down' or 'up', got '{}'", other);
                        continue;
                    }
                };
                if !controller.input(event) {
                    println!("No mini-game is running.");
                }
            }
            "press" | "drag" | "release" => {
                let coords = (
                    parts.get(1).and_then(|s| s.parse::<f32>().ok()),
                    parts.get(2).and_then(|s| s.parse::<f32>().ok()),
                );
                let (Some(x), Some(y)) = coords else {
                    println!("Usage: {} <x> <y>", cmd);
                    continue;
                };
                let at = Point::new(x, y);
                let event = match cmd.as_str() {
                    "press" => InputEvent::PointerDown(at),
                    "drag" => InputEvent::PointerMove(at),
                    _ => InputEvent::PointerUp(at),
                };
                if !controller.input(event) {
                    println!("No mini-game is running.");
                    continue;
                }
                // Pointer events are sampled per frame, so run one.
                advance(&mut controller, &mut renderer, FRAME_MS);
            }
            "wait" | "w" => {
                let ms = parts
                    .get(1)
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(500);
                advance(&mut controller, &mut renderer, ms);
            }
            "draw" | "d" => match (controller.mini_game(), renderer.last()) {
                (Some(_), Some(picture)) => print!("{}", picture),
                (Some(_), None) => println!("No frame drawn yet; try 'wait'."),
                (None, _) => println!("No mini-game is running."),
            },
            "gallery" => {
                for card in controller.gallery() {
                    if card.unlocked {
                        println!("  [x] {}", card.title);
                        if let Some(narration) = card.narration {
                            println!("      {}", narration);
                        }
                    } else {
                        println!("  [ ] ???");
                    }
                }
                println!(
                    "{}/{} endings unlocked",
                    controller.unlocks().unlocked_count(),
                    controller.unlocks().endings().len()
                );
            }
            "history" => {
                if controller.history().is_empty() {
                    println!("(nowhere yet)");
                }
                for (i, id) in controller.history().iter().enumerate() {
                    println!("  {:>3}. {}", i + 1, id);
                }
                println!("  now: {}", controller.current_id());
            }
            _ => println!("Unknown command: {}. Type 'help'.", cmd),
        }
    }
}

/// Run frames until `ms` of virtual time have passed, reporting anything
/// the reader would notice.
fn advance(controller: &mut NarrativeController, renderer: &mut TextRenderer, ms: u64) {
    let before = controller.current_id().clone();
    let had_game = controller.mini_game().is_some();
    let mut left = ms;
    while left > 0 {
        let step = left.min(FRAME_MS);
        let outcome = controller.tick(Duration::from_millis(step), renderer);
        if outcome.is_terminal() {
            println!("Mini-game result: {:?}", outcome);
        }
        left -= step;
    }

    if had_game && controller.mini_game().is_none() {
        println!("The mini-game is over.");
    }
    if controller.current_id() != &before {
        print_scene(controller);
    }
    if let Some(notice) = controller.notification() {
        println!("*** New Ending Unlocked! {} ***", notice.title);
    }
}

fn print_scene(controller: &NarrativeController) {
    let view = controller.view();
    println!("\n== {} ==", view.title);
    if view.transitioning {
        println!("(the screen goes black...)");
        return;
    }
    println!("{}", view.narration);

    if view.step == Step::Interaction {
        if let Some(npc) = view.npc {
            match &npc.dialogue {
                Some(line) => println!("\n{}: \"{}\"", npc.name, line),
                None => println!("\n{} is here.", npc.name),
            }
        }
    }
    if let Some(kind) = view.scene_game {
        println!("\n{}: {} (type 'game')", kind.banner(), kind.rules());
    }
    if let Some(kind) = view.active_game {
        println!("\n[{} in progress]", kind.label());
    }
    if view.can_continue {
        println!("\n(type 'next' to continue)");
    }
    for (i, choice) in view.choices.iter().enumerate() {
        let gate = choice
            .mini_game
            .map(|k| format!(" [{}]", k.label()))
            .unwrap_or_default();
        match &choice.description {
            Some(desc) => println!("  {}. {} ({}){}", i + 1, choice.text, desc, gate),
            None => println!("  {}. {}{}", i + 1, choice.text, gate),
        }
    }
    println!();
}

fn print_usage() {
    println!("Usage: play [--scenes <path>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  look                       show the current scene");
    println!("  next                       continue from narration to interaction");
    println!("  choose <n>                 take choice n");
    println!("  game                       start the scene's own mini-game");
    println!("  key down|up <name>         press or release a key (w, a, s, d, arrows)");
    println!("  press|drag|release <x> <y> pointer events in play-field units");
    println!("  wait [ms]                  let time pass (default 500)");
    println!("  draw                       print the latest mini-game frame");
    println!("  gallery                    list endings");
    println!("  history                    list visited scenes");
    println!("  quit                       exit");
}
