//! Turning dialog input into a validated geometry request.

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Largest width or height a layer may have.
pub const MAX_DIMENSION: u32 = 524_288;

/// Measurement unit of dialog values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    #[default]
    Pixel,
    /// Relative to the current size of the item.
    Percent,
    Inch,
    Millimeter,
    Point,
    Pica,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Pixel,
        Unit::Percent,
        Unit::Inch,
        Unit::Millimeter,
        Unit::Point,
        Unit::Pica,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Convert `value` in this unit to pixels.
    ///
    /// `reference` is the current length in pixels, used by `Percent`;
    /// `resolution` is in pixels per inch.
    pub fn to_pixels(self, value: f64, reference: u32, resolution: f64) -> f64 {
        match self {
            Unit::Pixel => value,
            Unit::Percent => value * reference as f64 / 100.0,
            Unit::Inch => value * resolution,
            Unit::Millimeter => value * resolution / 25.4,
            Unit::Point => value * resolution / 72.0,
            Unit::Pica => value * resolution / 6.0,
        }
    }

    /// Convert pixels to this unit.
    pub fn from_pixels(self, pixels: f64, reference: u32, resolution: f64) -> f64 {
        match self {
            Unit::Pixel => pixels,
            Unit::Percent if reference == 0 => 0.0,
            Unit::Percent => pixels * 100.0 / reference as f64,
            Unit::Inch => pixels / resolution,
            Unit::Millimeter => pixels * 25.4 / resolution,
            Unit::Point => pixels * 72.0 / resolution,
            Unit::Pica => pixels * 6.0 / resolution,
        }
    }
}

/// Raw values from a resize or scale dialog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryInput {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub unit: Unit,
}

impl GeometryInput {
    /// Pixel input without offsets.
    pub fn pixels(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            offset_x: 0.0,
            offset_y: 0.0,
            unit: Unit::Pixel,
        }
    }

    pub fn with_offset(mut self, offset_x: f64, offset_y: f64) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }
}

/// A geometry change with a positive target size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryRequest {
    width: u32,
    height: u32,
    offset_x: i32,
    offset_y: i32,
    unit: Unit,
}

impl GeometryRequest {
    /// Validate a request.
    ///
    /// # Errors
    ///
    /// `InvalidDimensions` when either side is zero or negative,
    /// `DimensionsTooLarge` when either side exceeds [`MAX_DIMENSION`].
    pub fn new(
        width: i64,
        height: i64,
        offset_x: i32,
        offset_y: i32,
        unit: Unit,
    ) -> Result<Self, CommandError> {
        if width <= 0 || height <= 0 {
            return Err(CommandError::InvalidDimensions { width, height });
        }
        if width > MAX_DIMENSION as i64 || height > MAX_DIMENSION as i64 {
            return Err(CommandError::DimensionsTooLarge { width, height });
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
            offset_x,
            offset_y,
            unit,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn offset_x(&self) -> i32 {
        self.offset_x
    }

    pub fn offset_y(&self) -> i32 {
        self.offset_y
    }

    /// The unit the values were entered in.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Resolve dialog input against the item's current size.
///
/// Values are converted to pixels and rounded. Non-finite values count as
/// zero and are rejected.
pub fn resolve(
    input: &GeometryInput,
    current: (u32, u32),
    resolution: f64,
) -> Result<GeometryRequest, CommandError> {
    let unit = input.unit;
    let width = round(unit.to_pixels(input.width, current.0, resolution));
    let height = round(unit.to_pixels(input.height, current.1, resolution));
    let offset_x = round(unit.to_pixels(input.offset_x, current.0, resolution));
    let offset_y = round(unit.to_pixels(input.offset_y, current.1, resolution));

    GeometryRequest::new(
        width,
        height,
        offset_x.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        offset_y.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        unit,
    )
}

fn round(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}
