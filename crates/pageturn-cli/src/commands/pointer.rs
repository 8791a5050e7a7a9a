use anyhow::Result;

use pageturn_core::pointer::PointerFeedback;
use pageturn_core::scroll::ScrollConfigExt;
use pageturn_core::AppConfig;

/// Sweep the pointer in a circle, hovering a link and then the menu items
pub fn run(config: &AppConfig, items: usize, frames: usize) -> Result<()> {
    let viewport = config.scroll.viewport();
    let tick = config.scroll.animation_tick_duration();
    let mut feedback = PointerFeedback::new(viewport, items);

    let radius = viewport.width.min(viewport.height) / 3.0;
    let step = |quarter: usize| frames * (quarter + 1) / 4;

    for frame in 0..frames {
        let angle = frame as f64 / frames.max(1) as f64 * std::f64::consts::TAU;
        feedback.pointer_moved(
            viewport.width / 2.0 + radius * angle.cos(),
            viewport.height / 2.0 + radius * angle.sin(),
        );

        if frame == step(0) {
            feedback.link_enter();
        } else if frame == step(0) + 10 {
            feedback.link_leave();
        } else if frame == step(1) && items > 0 {
            feedback.menu_enter();
            feedback.item_enter(0);
        } else if frame == step(2) && items > 1 {
            feedback.item_enter(1);
        } else if frame + 15 == frames {
            feedback.menu_leave();
        }

        let state = feedback.frame(tick);
        if frame % 10 == 0 || frame + 1 == frames {
            println!("{}", serde_json::to_string(&state)?);
        }
    }

    let total = tick * frames as u32;
    println!(
        "Simulated {} frames ({:.2}s), hovered item: {:?}",
        frames,
        total.as_secs_f64(),
        feedback.current()
    );
    Ok(())
}
