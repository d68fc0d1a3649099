//=========================================================================
// Aetheric Scene Demo
//=========================================================================
//
// Small scene exercising both loops:
//   hud (Always)              Space toggles pause, logs a heartbeat
//     └─ orb (Pausable)       ping-pong tween across the window
//          └─ trail           blinks every half second
//
// Usage:
//   aetheric_demo [--config path/to/config.yaml]
//
// Logging goes through env_logger (`RUST_LOG=debug` for structure
// changes, `trace` for per-frame input).
//
//=========================================================================

use std::time::Duration;

use aetheric_scene::prelude::*;
use log::{error, info};

//=== Draw List ===========================================================

/// Frame type of the demo renderer: one text command per visible node.
#[derive(Debug, Default)]
struct DrawList(Vec<String>);

/// Renderer that logs a summary of every hundredth frame.
#[derive(Default)]
struct LogRenderer {
    frames: u64,
}

impl Renderer for LogRenderer {
    type Frame = DrawList;

    fn begin_frame(&mut self, _size: (u32, u32)) -> Self::Frame {
        DrawList::default()
    }

    fn end_frame(&mut self, frame: Self::Frame) {
        self.frames += 1;
        if self.frames % 100 == 0 {
            info!(target: "demo", "frame {}: {}", self.frames, frame.0.join(", "));
        }
    }
}

fn draw_list(ctx: &mut dyn DrawingContext) -> Result<&mut DrawList, HookError> {
    ctx.downcast_mut::<DrawList>().ok_or_else(|| "demo visuals need a DrawList frame".into())
}

//=== Nodes ===============================================================

struct Hud;

impl Node for Hud {
    fn ready(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
        schedule_heartbeat(ctx.tree_mut());
        Ok(())
    }

    fn process(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
        if ctx.input().is_key_pressed(KeyCode::Space) {
            let paused = !ctx.tree().paused();
            ctx.tree_mut().set_paused(paused);
            info!(target: "demo", "{}", if paused { "Paused" } else { "Resumed" });
        }
        Ok(())
    }
}

fn schedule_heartbeat(tree: &mut SceneTree) {
    tree.create_timer_with(Duration::from_secs(1), |tree| {
        info!(target: "demo", "heartbeat at tick {}", tree.tick_count());
        schedule_heartbeat(tree);
        Ok(())
    });
}

struct Orb {
    x: f32,
}

impl Node for Orb {
    fn ready(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
        let id = ctx.id();
        start_lap(ctx.tree_mut(), id);
        Ok(())
    }

    fn as_visual_mut(&mut self) -> Option<&mut dyn Visual> {
        Some(self)
    }
}

impl Visual for Orb {
    fn draw(&mut self, ctx: &mut dyn DrawingContext) -> HookResult {
        draw_list(ctx)?.0.push(format!("orb@{:.0}", self.x));
        Ok(())
    }
}

/// One ping-pong lap; the trailing callback queues the next one.
fn start_lap(tree: &mut SceneTree, orb: NodeId) {
    tree.create_tween(orb, ProcessMode::Inherit)
        .tween_property(0.0, 600.0, Duration::from_secs(2), Easing::SineInOut, set_x)
        .tween_property(600.0, 0.0, Duration::from_secs(2), Easing::SineInOut, set_x)
        .callback(move |tree| {
            info!(target: "demo", "orb finished a lap");
            start_lap(tree, orb);
            Ok(())
        });
}

fn set_x(node: &mut dyn Node, value: f32) {
    if let Some(orb) = node.downcast_mut::<Orb>() {
        orb.x = value;
    }
}

#[derive(Default)]
struct Trail {
    lit: bool,
    elapsed: Duration,
}

impl Node for Trail {
    fn process(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
        self.elapsed += ctx.delta();
        if self.elapsed >= Duration::from_millis(500) {
            self.elapsed = Duration::ZERO;
            self.lit = !self.lit;
        }
        Ok(())
    }

    fn as_visual_mut(&mut self) -> Option<&mut dyn Visual> {
        Some(self)
    }
}

impl Visual for Trail {
    fn visible(&self) -> bool {
        self.lit
    }

    fn draw(&mut self, ctx: &mut dyn DrawingContext) -> HookResult {
        draw_list(ctx)?.0.push("trail".to_string());
        Ok(())
    }
}

fn build_scene(tree: &mut SceneTree) -> Result<(), SceneError> {
    let hud = tree.insert("hud", Hud);
    tree.set_process_mode(hud, ProcessMode::Always)?;

    let orb = tree.insert("orb", Orb { x: 0.0 });
    let trail = tree.insert("trail", Trail::default());
    tree.add_child(hud, orb)?;
    tree.add_child(orb, trail)?;

    tree.set_root(hud)?;
    Ok(())
}

//=== Entry Point =========================================================

fn run() -> Result<(), EngineError> {
    let args: Vec<String> = std::env::args().collect();
    let mut builder = EngineBuilder::new().with_title("Aetheric Scene Demo");

    if let Some(i) = args.iter().position(|a| a == "--config") {
        let path = args.get(i + 1).ok_or_else(|| {
            EngineError::Config(aetheric_scene::config::ConfigError::Invalid {
                field: "--config",
                reason: "expected a file path",
            })
        })?;
        builder = builder.from_config(&AppConfig::load(path)?);
    }

    builder
        .with_renderer(LogRenderer::default())
        .build()
        .init(build_scene)?
        .run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}
