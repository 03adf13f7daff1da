mod demo;
mod viewer;

use molraster::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use molraster::{Colix, EngineConfig, Font, Graphics3D};
use sdl2::keyboard::Keycode;

use demo::{Molecule, View};
use viewer::{Display, FpsCounter, InputEvent, RenderTarget};

/// Radians per second around the vertical axis
const SPIN_RATE: f32 = 0.6;

struct Args {
    config: EngineConfig,
    vsync: bool,
}

/// Parse command line arguments. A `--config` file is loaded first so the
/// other flags override it regardless of their order.
fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or_else(|| "--config needs a path".to_string())?;
            EngineConfig::load(path).map_err(|e| e.to_string())?
        },
        None => EngineConfig::default(),
    };
    let mut vsync = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => vsync = false,
            "--antialias" => config.antialias = true,
            "--no-clear-thread" => config.clear_thread = false,
            "--config" => i += 1,
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    if let Ok(w) = args[i + 1].parse::<u32>() {
                        config.width = w;
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    if let Ok(h) = args[i + 1].parse::<u32>() {
                        config.height = h;
                    }
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < args.len() {
                    // WxH, e.g. 1920x1080
                    if let Some((w, h)) = args[i + 1].split_once('x') {
                        if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                            config.width = w;
                            config.height = h;
                        }
                    }
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: molraster [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  --width W, -w W       Set window width (default: {})",
                    DEFAULT_WIDTH
                );
                println!(
                    "  --height H, -h H      Set window height (default: {})",
                    DEFAULT_HEIGHT
                );
                println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1920x1080)");
                println!("  --antialias           Render at 2x and downsample");
                println!("  --no-clear-thread     Clear frame buffers on the render thread");
                println!("  --config PATH         Load engine settings from a JSON file");
                println!("  --no-vsync            Disable VSync for uncapped framerate");
                println!("  --help                Show this help message");
                std::process::exit(0);
            },
            other => log::warn!("ignoring unknown argument {:?}", other),
        }
        i += 1;
    }

    if config.width == 0 || config.height == 0 {
        return Err(format!(
            "invalid resolution {}x{}",
            config.width, config.height
        ));
    }
    Ok(Args { config, vsync })
}

fn main() -> Result<(), String> {
    env_logger::init();
    let Args { config, vsync } = parse_args()?;
    let (width, height) = (config.width, config.height);

    let (mut display, texture_creator) = Display::with_options("molraster", width, height, vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;
    let mut g3d = Graphics3D::from_config(&config);

    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let mut paused = false;

    let molecule = Molecule::caffeine();
    let buffer_scale = g3d.scale();
    let mut view = View::new(width as i32 * buffer_scale, height as i32 * buffer_scale);

    println!("=== molraster ===");
    println!("Resolution: {}x{}", width, height);
    println!(
        "Antialias: {}  Clear thread: {}",
        if config.antialias { "ON" } else { "OFF" },
        if config.clear_thread { "ON" } else { "OFF" }
    );
    if vsync {
        println!("VSync: ON (60fps locked). Use --no-vsync for uncapped.");
    } else {
        println!("VSync: OFF (uncapped framerate)");
    }
    println!("Use --help for command line options.");
    println!("Controls:");
    println!("  Space      - Pause rotation");
    println!("  Up/Down    - Tilt");
    println!("  +/-        - Zoom");
    println!("  L          - Toggle atom labels");
    println!("  S          - Toggle specular highlights");
    println!("  F          - Toggle FPS display");
    println!("  Escape     - Quit");

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::Space => paused = !paused,
                    Keycode::Up => view.rotate_x -= 0.1,
                    Keycode::Down => view.rotate_x += 0.1,
                    Keycode::Equals | Keycode::Plus | Keycode::KpPlus => view.zoom *= 1.1,
                    Keycode::Minus | Keycode::KpMinus => view.zoom /= 1.1,
                    Keycode::L => view.show_labels = !view.show_labels,
                    Keycode::S => {
                        let on = !g3d.lighting().specular;
                        g3d.set_specular(on);
                    },
                    Keycode::F => show_fps = !show_fps,
                    _ => {},
                },
            }
        }

        if !paused {
            view.rotate_y += SPIN_RATE * dt;
        }

        g3d.begin_rendering();
        demo::render(&mut g3d, &molecule, &view);

        // FPS overlay (press F to toggle)
        if show_fps {
            let (min_fps, max_fps) = fps_counter.min_max_fps();
            let ms = fps_counter.avg_frame_time_ms();
            let fps_text = format!(
                "FPS {} avg  {} min  {} max  {}ms",
                avg_fps as u32, min_fps as u32, max_fps as u32, ms as u32
            );
            g3d.set_font(Font::default());
            let y = view.height - 4 * buffer_scale;
            g3d.set_colix(Colix::BLACK);
            g3d.draw_string(&fps_text, 5, y + 1, 1);
            g3d.set_colix(Colix::YELLOW);
            g3d.draw_string(&fps_text, 4, y, 0);
        }
        g3d.end_rendering();

        if let Some(image) = g3d.image() {
            display.present(&mut target, &image)?;
        }
    }

    g3d.release();
    Ok(())
}
