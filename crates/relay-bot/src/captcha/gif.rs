//! Animated noise captcha
//!
//! The code is drawn as a mask over a looping strip of black and white noise.
//! Pixels inside the mask scroll the noise one way and pixels outside scroll
//! it the other, so any single frame is pure noise and the letters only show
//! up in motion.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use rand::Rng;
use relay_core::{Captcha, CaptchaError, CaptchaGenerator};

use super::font::{self, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Characters a code is drawn from; look-alikes are left out
pub const CODE_ALPHABET: &str = "ABCEFHJKLMNPRTVXYZ";
pub const CODE_LEN: usize = 5;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 120;
const FRAMES: u32 = 30;
/// Noise rows moved per frame
const SCROLL_SPEED: u32 = 2;
/// A full loop moves the noise by exactly its own height
const NOISE_HEIGHT: u32 = FRAMES * SCROLL_SPEED;
const FRAME_DELAY_MS: u32 = 40;

/// Pixels per glyph cell
const SCALE: u32 = 10;
const GLYPH_GAP: u32 = 10;
const TEXT_LEFT: u32 = 15;
const TEXT_TOP: u32 = 25;

/// NeuQuant speed; 1 is best quality, 30 fastest
const ENCODER_SPEED: i32 = 10;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Default, Clone, Copy)]
pub struct GifCaptcha;

impl GifCaptcha {
    pub fn new() -> Self {
        Self
    }

    /// Random code of `CODE_LEN` characters
    pub fn random_code(rng: &mut impl Rng) -> String {
        let alphabet = CODE_ALPHABET.as_bytes();
        (0..CODE_LEN)
            .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
            .collect()
    }

    /// Animated GIF showing `code`
    pub fn render(code: &str, rng: &mut impl Rng) -> Result<Vec<u8>, CaptchaError> {
        let mask = text_mask(code)?;
        let noise: Vec<bool> = (0..WIDTH * NOISE_HEIGHT).map(|_| rng.gen_bool(0.5)).collect();

        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut out, ENCODER_SPEED);
            encoder.set_repeat(Repeat::Infinite).map_err(render_error)?;
            for index in 0..FRAMES {
                let frame = Frame::from_parts(
                    draw_frame(index, &mask, &noise),
                    0,
                    0,
                    Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1),
                );
                encoder.encode_frame(frame).map_err(render_error)?;
            }
        }
        Ok(out)
    }
}

impl CaptchaGenerator for GifCaptcha {
    fn generate(&self) -> Result<Captcha, CaptchaError> {
        let mut rng = rand::thread_rng();
        let code = Self::random_code(&mut rng);
        let image = Self::render(&code, &mut rng)?;
        Ok(Captcha { code, image })
    }
}

fn render_error(err: image::ImageError) -> CaptchaError {
    CaptchaError::Render(err.to_string())
}

/// Row-major `WIDTH x HEIGHT` mask of the pixels covered by `code`
fn text_mask(code: &str) -> Result<Vec<bool>, CaptchaError> {
    let mut mask = vec![false; (WIDTH * HEIGHT) as usize];
    let advance = GLYPH_WIDTH * SCALE + GLYPH_GAP;

    for (index, c) in code.chars().enumerate() {
        let rows = font::glyph(c)
            .ok_or_else(|| CaptchaError::Render(format!("no glyph for {c:?}")))?;
        let left = TEXT_LEFT + index as u32 * advance;
        for y in 0..GLYPH_HEIGHT * SCALE {
            for x in 0..GLYPH_WIDTH * SCALE {
                let (px, py) = (left + x, TEXT_TOP + y);
                if px < WIDTH && py < HEIGHT && font::is_set(&rows, x / SCALE, y / SCALE) {
                    mask[(py * WIDTH + px) as usize] = true;
                }
            }
        }
    }
    Ok(mask)
}

fn draw_frame(index: u32, mask: &[bool], noise: &[bool]) -> RgbaImage {
    let shift = index * SCROLL_SPEED % NOISE_HEIGHT;
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let inside = mask[(y * WIDTH + x) as usize];
        // Text scrolls up, background scrolls down
        let noise_y = if inside {
            (y + shift) % NOISE_HEIGHT
        } else {
            (y + NOISE_HEIGHT - shift) % NOISE_HEIGHT
        };
        if noise[(noise_y * WIDTH + x) as usize] {
            WHITE
        } else {
            BLACK
        }
    })
}
