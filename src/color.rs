use crate::error::{RastermarkError, RastermarkResult};

/// Maximum value of a red/green/blue channel.
pub const CHANNEL_MAX: i32 = 255;
/// Maximum alpha value. 0 is fully opaque, 127 fully transparent (GD
/// convention, kept as the externally visible contract).
pub const ALPHA_MAX: i32 = 127;

/// Validated RGBA-like color used for text overlays and borders.
///
/// Channels are `[0, 255]`; alpha is `[0, 127]` where 0 means opaque and 127
/// means transparent. Setters take plain integers and re-validate, so a
/// constructed `Color` is always in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Color {
    pub fn new(red: i32, green: i32, blue: i32, alpha: i32) -> RastermarkResult<Self> {
        let mut color = Self::default();
        color.set_red(red)?;
        color.set_green(green)?;
        color.set_blue(blue)?;
        color.set_alpha(alpha)?;
        Ok(color)
    }

    /// Fully opaque color from RGB channels.
    pub fn rgb(red: i32, green: i32, blue: i32) -> RastermarkResult<Self> {
        Self::new(red, green, blue, 0)
    }

    pub fn set_red(&mut self, red: i32) -> RastermarkResult<&mut Self> {
        self.red = validate_channel(red)?;
        Ok(self)
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn set_green(&mut self, green: i32) -> RastermarkResult<&mut Self> {
        self.green = validate_channel(green)?;
        Ok(self)
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn set_blue(&mut self, blue: i32) -> RastermarkResult<&mut Self> {
        self.blue = validate_channel(blue)?;
        Ok(self)
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    pub fn set_alpha(&mut self, alpha: i32) -> RastermarkResult<&mut Self> {
        self.alpha = validate_alpha(alpha)?;
        Ok(self)
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Straight-alpha RGBA8 for the graphics backend, mapping alpha 0..=127
    /// (opaque..transparent) onto 255..=0.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let a = u16::from(ALPHA_MAX as u8 - self.alpha);
        let max = ALPHA_MAX as u16;
        let a8 = ((a * 255 + max / 2) / max) as u8;
        [self.red, self.green, self.blue, a8]
    }
}

pub(crate) fn validate_channel(value: i32) -> RastermarkResult<u8> {
    if !(0..=CHANNEL_MAX).contains(&value) {
        return Err(RastermarkError::invalid_value(
            "color component out of range",
        ));
    }
    Ok(value as u8)
}

pub(crate) fn validate_alpha(alpha: i32) -> RastermarkResult<u8> {
    if !(0..=ALPHA_MAX).contains(&alpha) {
        return Err(RastermarkError::invalid_value("alpha out of range"));
    }
    Ok(alpha as u8)
}
