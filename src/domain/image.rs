//! Image preprocessing: raw upload bytes to a fixed-shape model input tensor

use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageReader;
use serde::Deserialize;

use super::DomainError;

/// Default square input resolution for the classifiers
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Memory layout of the model input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]` (Keras exports)
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`
    Nchw,
}

/// Preprocessing parameters; must match what the models were trained with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    pub size: u32,
    pub layout: TensorLayout,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::default(),
        }
    }
}

/// A batch-of-one RGB image tensor with values in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl ImageTensor {
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Result<Self, DomainError> {
        let expected: usize = shape.iter().product();

        if expected != data.len() {
            return Err(DomainError::internal(format!(
                "tensor shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }

        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode, stretch-resize to `size x size`, scale to [0, 1], add a batch axis.
pub fn preprocess(bytes: &[u8], config: &PreprocessConfig) -> Result<ImageTensor, DomainError> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DomainError::decode(e.to_string()))?
        .decode()
        .map_err(|e| DomainError::decode(e.to_string()))?;

    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, config.size, config.size, FilterType::CatmullRom);

    let side = config.size as usize;
    let pixels = side * side;
    let mut data = vec![0.0f32; pixels * 3];

    match config.layout {
        TensorLayout::Nhwc => {
            for (value, &channel) in data.iter_mut().zip(resized.as_raw().iter()) {
                *value = f32::from(channel) / 255.0;
            }
        }
        TensorLayout::Nchw => {
            for (i, pixel) in resized.pixels().enumerate() {
                for c in 0..3 {
                    data[c * pixels + i] = f32::from(pixel.0[c]) / 255.0;
                }
            }
        }
    }

    let shape = match config.layout {
        TensorLayout::Nhwc => [1, side, side, 3],
        TensorLayout::Nchw => [1, 3, side, side],
    };

    ImageTensor::new(shape, data)
}
