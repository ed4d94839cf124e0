//! Ribbon textures decoded from PNG.

use std::{io::Read, path::Path};

use crate::error::ChainError;

/// A sampled 2D texture and its default view.
pub struct ChainTexture {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
    /// Width and height in texels.
    pub size: (u32, u32),
}

impl ChainTexture {
    /// Upload tightly packed RGBA8 `pixels` as an sRGB texture.
    #[must_use]
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size: (width, height),
        }
    }

    /// 1x1 opaque white texture bound for untextured draws.
    #[must_use]
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba8(device, queue, "White Texture", 1, 1, &[255; 4])
    }

    /// Load and upload the PNG at `path`.
    pub fn from_png_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, ChainError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ChainError::Texture(format!("{}: {e}", path.display())))?;
        let image = decode_png(std::io::BufReader::new(file))
            .map_err(|e| ChainError::Texture(format!("{}: {e}", path.display())))?;
        log::debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            image.width,
            image.height
        );
        Ok(Self::from_rgba8(
            device,
            queue,
            &path.display().to_string(),
            image.width,
            image.height,
            &image.pixels,
        ))
    }
}

/// Decoded image in RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major.
    pub pixels: Vec<u8>,
}

/// Decode a PNG stream into RGBA8.
///
/// Palette and low-bit-depth images are expanded, 16-bit channels are
/// stripped to 8 bits, and grey/RGB sources get an opaque alpha channel.
pub fn decode_png(reader: impl Read) -> Result<DecodedImage, ChainError> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| ChainError::Texture(format!("invalid png: {e}")))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ChainError::Texture(format!("invalid png: {e}")))?;
    buf.truncate(info.buffer_size());

    let pixels = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(ChainError::Texture(
                "palette image was not expanded".to_owned(),
            ));
        }
    };

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(color: png::ColorType, width: u32, height: u32, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn rgb_gains_opaque_alpha() {
        let bytes = encode(png::ColorType::Rgb, 2, 1, &[10, 20, 30, 40, 50, 60]);
        let image = decode_png(bytes.as_slice()).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn grey_alpha_is_splatted() {
        let bytes = encode(png::ColorType::GrayscaleAlpha, 1, 1, &[90, 128]);
        let image = decode_png(bytes.as_slice()).unwrap();
        assert_eq!(image.pixels, vec![90, 90, 90, 128]);
    }

    #[test]
    fn rgba_passes_through() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let bytes = encode(png::ColorType::Rgba, 1, 2, &data);
        assert_eq!(decode_png(bytes.as_slice()).unwrap().pixels, data.to_vec());
    }

    #[test]
    fn garbage_is_a_texture_error() {
        assert!(matches!(
            decode_png(&b"not a png"[..]),
            Err(ChainError::Texture(_))
        ));
    }
}
