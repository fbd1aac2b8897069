//! Captcha rendering

mod font;
mod gif;

pub use gif::{GifCaptcha, CODE_ALPHABET, CODE_LEN};
