//! Drop a ball and print its move events
//!
//! Runs against the in-process engine double unless built with the
//! `native` feature.

use planar::{BodyDef, ShapeDef, ShapeGeometry, Vec2, World, WorldDef};

fn main() -> planar::Result<()> {
    tracing_subscriber::fmt::init();

    println!("planar2d {}", planar::version());

    let mut world = World::new(&WorldDef::default())?;
    let ball = world.create_body(&BodyDef::dynamic().with_position(Vec2::new(0.0, 10.0)))?;
    world.create_shape(
        &ball,
        &ShapeDef::default().with_restitution(0.4),
        ShapeGeometry::Circle {
            center: Vec2::ZERO,
            radius: 0.5,
        },
    )?;

    for frame in 0..120 {
        world.step_and_collect(1.0 / 60.0, 4, |event| {
            if let Some(body) = &event.body {
                println!(
                    "frame {frame:3}  body {}  at ({:7.3}, {:7.3}){}",
                    body.raw_id().index1,
                    event.transform.p.x,
                    event.transform.p.y,
                    if event.fell_asleep { "  (fell asleep)" } else { "" },
                );
            }
        });
    }

    world.destroy();
    Ok(())
}
