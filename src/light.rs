//! Ambient light → key colour.
//!
//! The light task samples the sensor every few seconds and publishes a
//! colour that the UI uses when it lights keys. Purely cosmetic: a stale
//! colour is harmless, so the only guarantee is that a reader never sees
//! a half-written colour.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::Error;
use crate::game::LedColor;

/// Ambient-light sensor collaborator.
pub trait AmbientLight {
    /// Raw ALS count.
    fn read_ambient(&mut self) -> Result<u32, Error>;
}

/// Map a raw ALS count to a key colour: brighter rooms push toward warm
/// red/green, darker rooms toward blue.
pub fn color_for_ambient(raw: u32) -> LedColor {
    let r = saturate(raw / 10);
    let g = saturate(raw / 20);
    LedColor::new(r, g, u8::MAX - r)
}

fn saturate(v: u32) -> u8 {
    v.min(u8::MAX as u32) as u8
}

/// Last-writer-wins colour cell, read as one atomic snapshot.
pub struct SharedColor {
    packed: AtomicU32,
}

impl SharedColor {
    pub const fn new(initial: LedColor) -> Self {
        Self {
            packed: AtomicU32::new(initial.pack()),
        }
    }

    pub fn store(&self, color: LedColor) {
        self.packed.store(color.pack(), Ordering::Relaxed);
    }

    pub fn load(&self) -> LedColor {
        LedColor::unpack(self.packed.load(Ordering::Relaxed))
    }
}

/// Take one sensor reading and publish the derived colour.
pub fn sample_into<A: AmbientLight>(sensor: &mut A, shared: &SharedColor) -> Result<LedColor, Error> {
    let raw = sensor.read_ambient()?;
    let color = color_for_ambient(raw);
    shared.store(color);
    debug!("Light: raw={} -> {}", raw, color);
    Ok(color)
}
