//! Built-in showcase parts

use clap::ValueEnum;
use glam::{DVec2, DVec3};
use sdfcad_core::blend::Blend;
use sdfcad_core::sdf2::{Sdf2Ext, Sdf2Node, Smoother, circle, line, rectangle, regular_polygon};
use sdfcad_core::sdf3::{self, Sdf3Ext, Sdf3Node, cuboid, cylinder};
use std::fmt;

/// A built part: a solid or a flat profile
pub enum Shape {
    Solid(Sdf3Node),
    Profile(Sdf2Node),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Part {
    /// Rounded block with a through bore
    Block,
    /// Lower half of a two-piece box with rounded walls
    BoxBase,
    /// Upper half of the same box
    BoxLid,
    /// Hexagonal bars: straight, twisted both ways and both twists combined
    Extrusions,
    /// Hexagonal bars tapered while extruding
    Tapered,
    /// Flat washer with a bolt circle
    Washer,
    /// Mounting plate with a grid of holes
    Plate,
    /// L bracket with rounded corners and a slot
    Bracket,
}

impl Part {
    pub fn name(self) -> &'static str {
        match self {
            Part::Block => "block",
            Part::BoxBase => "box-base",
            Part::BoxLid => "box-lid",
            Part::Extrusions => "extrusions",
            Part::Tapered => "tapered",
            Part::Washer => "washer",
            Part::Plate => "plate",
            Part::Bracket => "bracket",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Part::Block => "rounded block with a through bore",
            Part::BoxBase => "lower half of a two-piece box",
            Part::BoxLid => "upper half of a two-piece box",
            Part::Extrusions => "straight and twisted hexagonal bars",
            Part::Tapered => "hexagonal bars tapered while extruding",
            Part::Washer => "flat washer with a bolt circle (2D)",
            Part::Plate => "mounting plate with a grid of holes (2D)",
            Part::Bracket => "L bracket with rounded corners (2D)",
        }
    }

    pub fn build(self) -> sdfcad_core::Result<Shape> {
        Ok(match self {
            Part::Block => Shape::Solid(block()?),
            Part::BoxBase => Shape::Solid(two_piece_box(false)?),
            Part::BoxLid => Shape::Solid(two_piece_box(true)?),
            Part::Extrusions => Shape::Solid(extrusions()?),
            Part::Tapered => Shape::Solid(tapered()?),
            Part::Washer => Shape::Profile(washer()?),
            Part::Plate => Shape::Profile(plate()?),
            Part::Bracket => Shape::Profile(bracket()?),
        })
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn block() -> sdfcad_core::Result<Sdf3Node> {
    let body = cuboid(DVec3::new(30.0, 20.0, 10.0), 1.0)?;
    let bore = cylinder(12.0, 4.0, 0.0)?;
    Ok(body.smooth_difference(bore, Blend::round(0.5)?))
}

const BOX_SIZE: DVec3 = DVec3::new(30.0, 40.0, 30.0);
const BOX_WALL: f64 = 3.0;
const BOX_RADIUS: f64 = 6.0;
/// Lid split height as a fraction of the box height
const BOX_SPLIT: f64 = 0.75;

/// Walls are offsets of a sharp core box, so corners come out rounded
fn two_piece_box(lid: bool) -> sdfcad_core::Result<Sdf3Node> {
    let inner_ofs = BOX_RADIUS - BOX_WALL;
    let outer_ofs = inner_ofs + BOX_WALL;
    let core = cuboid(BOX_SIZE - outer_ofs, 0.0)?.into_node();
    let shell = core
        .clone()
        .offset(outer_ofs)
        .difference(core.offset(inner_ofs));

    let split = DVec3::new(0.0, 0.0, (BOX_SPLIT - 0.5) * BOX_SIZE.z);
    let keep = if lid { DVec3::Z } else { DVec3::NEG_Z };
    shell.cut(split, keep)
}

fn hexagon() -> sdfcad_core::Result<Sdf2Node> {
    Ok(regular_polygon(6, 20.0)?.offset(8.0))
}

fn extrusions() -> sdfcad_core::Result<Sdf3Node> {
    let tau = std::f64::consts::TAU;
    let straight = hexagon()?.extrude(100.0)?;
    let forward = hexagon()?.twist_extrude(100.0, tau)?;
    let reverse = hexagon()?.twist_extrude(100.0, -tau)?;
    let combined = forward.clone().union(reverse.clone());

    let d = 60.0;
    sdf3::union_all(
        vec![
            straight.translate(DVec3::new(0.0, -1.5 * d, 0.0)),
            forward.translate(DVec3::new(0.0, -0.5 * d, 0.0)),
            reverse.translate(DVec3::new(0.0, 0.5 * d, 0.0)),
            combined.translate(DVec3::new(0.0, 1.5 * d, 0.0)),
        ],
        Blend::Hard,
    )
}

fn tapered() -> sdfcad_core::Result<Sdf3Node> {
    let scale = DVec2::new(0.25, 0.5);
    let plain = hexagon()?.scale_extrude(80.0, scale)?;
    let twisted = hexagon()?.scale_twist_extrude(80.0, std::f64::consts::PI, scale)?;
    Ok(plain
        .translate(DVec3::new(0.0, -30.0, 0.0))
        .union(twisted.translate(DVec3::new(0.0, 30.0, 0.0))))
}

fn washer() -> sdfcad_core::Result<Sdf2Node> {
    let bolts = circle(2.5)?.translate(DVec2::new(14.0, 0.0)).rotate_copy(6)?;
    Ok(circle(20.0)?.difference(circle(8.0)?).difference(bolts))
}

fn plate() -> sdfcad_core::Result<Sdf2Node> {
    let holes = circle(2.0)?
        .array(glam::UVec2::new(4, 3), DVec2::new(15.0, 12.0))?
        .translate(DVec2::new(-22.5, -12.0));
    Ok(rectangle(DVec2::new(70.0, 40.0), 4.0)?.difference(holes))
}

/// Outer corners get a large radius, the inside corner a small fillet
fn bracket() -> sdfcad_core::Result<Sdf2Node> {
    let mut outline = Smoother::new(true);
    outline
        .add_smooth(DVec2::new(0.0, 0.0), 8, 6.0)?
        .add_smooth(DVec2::new(60.0, 0.0), 8, 4.0)?
        .add_smooth(DVec2::new(60.0, 10.0), 4, 2.0)?
        .add_smooth(DVec2::new(10.0, 10.0), 6, 3.0)?
        .add_smooth(DVec2::new(10.0, 40.0), 4, 2.0)?
        .add_smooth(DVec2::new(0.0, 40.0), 8, 4.0)?;
    let slot = line(12.0, 2.5)?.translate(DVec2::new(38.0, 5.0));
    Ok(outline.polygon()?.difference(slot))
}
