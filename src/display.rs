use png::{ColorType, Decoder, Transformations};

/// Pixel layouts written to the framebuffer for a given bit depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8 bit luminance, BT.709 weights
    L8,
    /// 16 bit, red in the high bits, little-endian
    Bgr565,
    /// 32 bit, one byte per channel in R, G, B, A order
    Rgba32,
}

impl PixelFormat {
    pub fn for_depth(bits_per_pixel: u32) -> Option<PixelFormat> {
        match bits_per_pixel {
            8 => Some(PixelFormat::L8),
            15 | 16 => Some(PixelFormat::Bgr565),
            32 => Some(PixelFormat::Rgba32),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::L8 => 1,
            PixelFormat::Bgr565 => 2,
            PixelFormat::Rgba32 => 4,
        }
    }

    fn encode_pixel(&self, rgba: &[u8], out: &mut Vec<u8>) {
        let (r, g, b) = (rgba[0] as u32, rgba[1] as u32, rgba[2] as u32);
        match self {
            PixelFormat::L8 => out.push(((r * 2126 + g * 7152 + b * 722) / 10000) as u8),
            PixelFormat::Bgr565 => {
                let packed = ((r >> 3) << 11 | (g >> 2) << 5 | (b >> 3)) as u16;
                out.extend_from_slice(&packed.to_le_bytes());
            }
            PixelFormat::Rgba32 => out.extend_from_slice(&rgba[..4]),
        }
    }
}

/// A decoded image held as 8 bit RGBA.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub buffer: Vec<u8>,
}

impl Frame {
    /// Decodes a PNG of any colour type and bit depth into RGBA.
    pub fn from_png(data: &[u8]) -> Result<Frame, png::DecodingError> {
        let mut decoder = Decoder::new(data);
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

        let mut png_reader = decoder.read_info()?;
        let mut raw = vec![0; png_reader.output_buffer_size()];
        let info = png_reader.next_frame(raw.as_mut())?;
        raw.truncate(info.buffer_size());

        // After EXPAND every sample is 8 bits; only the channel count differs.
        let buffer = match info.color_type {
            ColorType::Rgba => raw,
            ColorType::Rgb => raw
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 0xFF])
                .collect(),
            ColorType::GrayscaleAlpha => raw
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            ColorType::Grayscale | ColorType::Indexed => {
                raw.iter().flat_map(|&l| [l, l, l, 0xFF]).collect()
            }
        };

        Ok(Frame {
            width: info.width,
            height: info.height,
            buffer,
        })
    }

    /// Nearest-neighbour scale to exactly `width` x `height`.
    pub fn resize(&self, width: u32, height: u32) -> Frame {
        if width == self.width && height == self.height {
            return self.clone();
        }

        let mut buffer = Vec::with_capacity(width as usize * height as usize * 4);
        if self.width > 0 && self.height > 0 {
            for y in 0..height as u64 {
                let src_y = y * self.height as u64 / height as u64;
                for x in 0..width as u64 {
                    let src_x = x * self.width as u64 / width as u64;
                    let offset = ((src_y * self.width as u64 + src_x) * 4) as usize;
                    buffer.extend_from_slice(&self.buffer[offset..offset + 4]);
                }
            }
        } else {
            buffer.resize(width as usize * height as usize * 4, 0);
        }

        Frame {
            width,
            height,
            buffer,
        }
    }

    /// Packs the frame into the framebuffer's pixel layout.
    pub fn encode(&self, format: PixelFormat) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.buffer.len() / 4 * format.bytes_per_pixel());
        self.buffer
            .chunks_exact(4)
            .for_each(|rgba| format.encode_pixel(rgba, &mut out));
        out
    }
}

/// Builds a frame where consecutive pixels alternate between every byte
/// 0x00 and every byte 0x80, starting with 0x00.
pub fn test_pattern(width: u32, height: u32, bits_per_pixel: u32) -> Vec<u8> {
    let bytes_per_pixel = (bits_per_pixel / 8) as usize;
    let pixels = width as usize * height as usize;
    if bytes_per_pixel == 0 {
        return Vec::new();
    }

    let mut data = Vec::with_capacity(pixels * bytes_per_pixel);
    for pixel in 0..pixels {
        let value = if pixel % 2 == 0 { 0x00 } else { 0x80 };
        data.extend(std::iter::repeat(value).take(bytes_per_pixel));
    }
    data
}
