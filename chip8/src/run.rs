use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chip8_core::{Chip8, Cycle, CLOCK_SPEED, TIMER_HZ};
use chip8_display::Display;

use crate::keymap::keymap;

/// Runs `rom` until the window is closed or the machine faults
///
/// # Arguments
/// * `rom` path to a ROM file
/// * `scale` the size multiplier for each pixel
/// * `seed` makes random numbers reproducible when set
pub fn run(rom: &Path, scale: u32, seed: Option<u64>) -> Result<()> {
    let mut chip8 = match seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };

    // Load ROM
    let program =
        fs::read(rom).with_context(|| format!("unable to read ROM {}", rom.display()))?;
    chip8.load_rom(&program).context("unable to load ROM")?;
    info!("loaded {} ({} bytes)", rom.display(), program.len());

    // Get SDL2 context
    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl, scale).map_err(anyhow::Error::msg)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    // Set initial timing
    let cycle_time = Duration::from_nanos(CLOCK_SPEED);
    let timer_period = Duration::from_nanos(1_000_000_000 / TIMER_HZ);
    let mut last_cycle = Instant::now();
    let mut last_tick = last_cycle;

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = keymap(key) {
                        chip8.key_press(kc);
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = keymap(key) {
                        chip8.key_release(kc);
                    }
                }
                _ => continue,
            };
        }

        // Update state
        if let Cycle::Executed { redraw: true } = chip8.step().context("emulation halted")? {
            display
                .render(chip8.frame_buffer())
                .map_err(anyhow::Error::msg)?;
        }

        // Timers follow the wall clock no matter how many cycles ran
        while last_tick.elapsed() >= timer_period {
            chip8.tick_timers();
            last_tick += timer_period;
        }

        // Handle timing
        let elapsed_cycle_time = last_cycle.elapsed();
        if cycle_time > elapsed_cycle_time {
            thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = Instant::now();
    }

    info!("window closed");
    Ok(())
}
