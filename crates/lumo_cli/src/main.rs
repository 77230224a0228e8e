//! Command-line front end: renders a built-in demo scene to a PNG.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use lumo_math::Vec3;
use lumo_scene::{DirectionalLight, Material, Primitive, Texture};
use lumo_tracer::{render, Camera, RenderConfig, TracerScene};

struct Options {
    config: RenderConfig,
    output: String,
}

fn print_usage() {
    eprintln!("Usage: lumo [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --width N     Output width in pixels (default 640)");
    eprintln!("  --height N    Output height in pixels (default 480)");
    eprintln!("  --spp N       Samples per pixel (default 200)");
    eprintln!("  --depth N     Maximum path depth (default 5)");
    eprintln!("  --clamp X     Per-bounce radiance clamp (default 15)");
    eprintln!("  --seed N      Master random seed (default 0)");
    eprintln!("  --output PATH Output PNG path (default lumo.png)");
    eprintln!("  --help        Show this message");
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut config = RenderConfig::default();
    let mut output = String::from("lumo.png");

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("missing value for {name}"))
        };
        match arg.as_str() {
            "--width" => config.width = value("--width")?.parse().context("--width")?,
            "--height" => config.height = value("--height")?.parse().context("--height")?,
            "--spp" => {
                config.samples_per_pixel = value("--spp")?.parse().context("--spp")?;
            }
            "--depth" => config.max_depth = value("--depth")?.parse().context("--depth")?,
            "--clamp" => config.clamp = value("--clamp")?.parse().context("--clamp")?,
            "--seed" => config.seed = value("--seed")?.parse().context("--seed")?,
            "--output" => output = value("--output")?,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => bail!("unknown option: {other}"),
        }
    }

    if config.width == 0 || config.height == 0 {
        bail!("image dimensions must be nonzero");
    }
    if config.samples_per_pixel == 0 {
        bail!("samples per pixel must be nonzero");
    }
    if config.clamp <= 0.0 {
        bail!("radiance clamp must be positive");
    }

    Ok(Options { config, output })
}

/// Procedural checkerboard, one texel per cell.
fn checker_texture(size: u32, a: Vec3, b: Vec3) -> Texture {
    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let c = if (x + y) % 2 == 0 { a } else { b };
            pixels.push([c.x, c.y, c.z, 1.0]);
        }
    }
    Texture::new(size, size, pixels)
}

/// Demo scene: grey floor, a checkered panel, a gold mirror panel and
/// a matte box under one directional light.
fn demo_scene() -> Result<(TracerScene, DirectionalLight, Camera)> {
    let floor = Primitive::quad(
        Vec3::ZERO,
        Vec3::X * 10.0,
        Vec3::NEG_Z * 10.0,
        Material::new(Vec3::splat(0.6), 0.8, 0.0),
    );

    let checker = Arc::new(checker_texture(
        8,
        Vec3::new(0.9, 0.9, 0.9),
        Vec3::new(0.2, 0.3, 0.8),
    ));
    let flat_normal = Arc::new(Texture::solid_color(Vec3::new(0.5, 0.5, 1.0)));
    let full_rough = Arc::new(Texture::solid_color(Vec3::ONE));
    let panel = Primitive::quad(
        Vec3::new(-1.5, 1.0, -3.0),
        Vec3::X * 2.0,
        Vec3::Y * 2.0,
        Material::new(Vec3::ONE, 0.9, 0.0).with_maps(checker, flat_normal, full_rough),
    );

    let mirror = Primitive::quad(
        Vec3::new(1.5, 1.0, -3.0),
        Vec3::X * 2.0,
        Vec3::Y * 2.0,
        Material::new(Vec3::new(1.0, 0.78, 0.34), 0.05, 1.0),
    );

    let block = Primitive::cuboid(
        Vec3::new(0.0, 0.5, -2.0),
        Vec3::splat(0.5),
        Material::new(Vec3::new(0.8, 0.25, 0.2), 0.6, 0.0),
    );

    let scene = TracerScene::build(&[floor, panel, mirror, block])?;

    let light = DirectionalLight::new(Vec3::new(-0.4, -1.0, -0.3), Vec3::ONE, 4.0);
    let camera = Camera::look_at(
        Vec3::new(0.0, 1.6, 3.5),
        Vec3::new(0.0, 0.9, -2.0),
        Vec3::Y,
        60.0,
    );

    Ok((scene, light, camera))
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_options(std::env::args().skip(1))?;
    let (scene, light, camera) = demo_scene()?;

    let start = Instant::now();
    let image = render(&scene, &light, &camera, &options.config);
    log::info!(
        "Rendered {}x{} at {} spp in {:.2}s",
        options.config.width,
        options.config.height,
        options.config.samples_per_pixel,
        start.elapsed().as_secs_f32()
    );

    image
        .save_png(&options.output)
        .with_context(|| format!("failed to write {}", options.output))?;
    log::info!("Wrote {}", options.output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        parse_options(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.config.samples_per_pixel, 200);
        assert_eq!(options.config.max_depth, 5);
        assert_eq!(options.config.clamp, 15.0);
        assert_eq!(options.output, "lumo.png");
    }

    #[test]
    fn test_all_control_parameters() {
        let options = parse(&[
            "--width", "320", "--height", "180", "--spp", "64", "--depth", "3", "--clamp",
            "4.5", "--seed", "7", "--output", "out.png",
        ])
        .unwrap();

        assert_eq!(options.config.width, 320);
        assert_eq!(options.config.height, 180);
        assert_eq!(options.config.samples_per_pixel, 64);
        assert_eq!(options.config.max_depth, 3);
        assert_eq!(options.config.clamp, 4.5);
        assert_eq!(options.config.seed, 7);
        assert_eq!(options.output, "out.png");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--spp"]).is_err());
        assert!(parse(&["--spp", "0"]).is_err());
        assert!(parse(&["--clamp", "-1"]).is_err());
        assert!(parse(&["--width", "0"]).is_err());
    }
}
