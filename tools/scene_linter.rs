/// Scene Linter — validates a scene file and reports reachability problems.
///
/// Usage: scene_linter <story.ron | --builtin>

use carbon_journey::core::graph::SceneGraph;
use carbon_journey::schema::scene::MiniGameKind;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbon_journey=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: scene_linter <story.ron | --builtin>");
        process::exit(0);
    }

    let loaded = if args[1] == "--builtin" {
        SceneGraph::carbon_journey()
    } else {
        let path = Path::new(&args[1]);
        if !path.is_file() {
            eprintln!("ERROR: Path '{}' does not exist", args[1]);
            process::exit(1);
        }
        SceneGraph::load_from_ron(path)
    };

    let graph = match loaded {
        Ok(graph) => graph,
        Err(e) => {
            println!("\n=== Scene Lint Report ===\n");
            println!("ERROR: {}", e);
            println!("\nSummary: 1 errors, 0 warnings");
            process::exit(1);
        }
    };

    println!(
        "Loaded {} scenes ({} endings), start: {}",
        graph.len(),
        graph.endings().count(),
        graph.start()
    );

    let warnings = lint_graph(&graph);

    println!("\n=== Scene Lint Report ===\n");

    if warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    print_gates(&graph);

    println!("\nSummary: 0 errors, {} warnings", warnings.len());
}

fn lint_graph(graph: &SceneGraph) -> Vec<String> {
    let mut warnings = Vec::new();
    let reachable = graph.reachable_from(graph.start().as_str());

    for scene in graph.iter() {
        if reachable.contains(scene.id.as_str()) {
            continue;
        }
        if scene.is_ending {
            warnings.push(format!(
                "ending '{}' can never be unlocked from '{}'",
                scene.id,
                graph.start()
            ));
        } else {
            warnings.push(format!("scene '{}' is unreachable", scene.id));
        }
    }

    // An ending that cannot lead anywhere traps the reader for good.
    for scene in graph.endings() {
        if scene.choices.is_empty() {
            warnings.push(format!("ending '{}' offers no way to replay", scene.id));
        }
    }

    // Every scene should be able to reach some ending.
    for scene in graph.iter().filter(|s| !s.is_ending) {
        let onward = graph.reachable_from(scene.id.as_str());
        let ends = graph
            .endings()
            .any(|e| onward.contains(e.id.as_str()));
        if !ends {
            warnings.push(format!("scene '{}' cannot reach any ending", scene.id));
        }
    }

    warnings
}

fn print_gates(graph: &SceneGraph) {
    let mut gates: Vec<(String, MiniGameKind)> = Vec::new();
    for scene in graph.iter() {
        if let Some(kind) = scene.mini_game {
            gates.push((format!("{} (in scene)", scene.id), kind));
        }
        for choice in &scene.choices {
            if let Some(kind) = choice.mini_game {
                gates.push((format!("{} -> {}", scene.id, choice.next), kind));
            }
        }
    }
    if gates.is_empty() {
        return;
    }
    println!("\nMini-game gates:");
    for (edge, kind) in gates {
        println!("  {:<9} {}", kind.label(), edge);
    }
}
