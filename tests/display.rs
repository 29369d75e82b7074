use png::{BitDepth, ColorType, Encoder};
use rawfb::display::{test_pattern, Frame, PixelFormat};

fn encode_png(width: u32, height: u32, color: ColorType, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header().expect("Unable to write PNG header");
        writer
            .write_image_data(data)
            .expect("Unable to write PNG data");
    }
    out
}

#[test]
fn pixel_format_follows_bit_depth() {
    assert_eq!(PixelFormat::for_depth(8), Some(PixelFormat::L8));
    assert_eq!(PixelFormat::for_depth(15), Some(PixelFormat::Bgr565));
    assert_eq!(PixelFormat::for_depth(16), Some(PixelFormat::Bgr565));
    assert_eq!(PixelFormat::for_depth(32), Some(PixelFormat::Rgba32));
    assert_eq!(PixelFormat::for_depth(24), None);
    assert_eq!(PixelFormat::for_depth(0), None);
}

#[test]
fn test_pattern_alternates_whole_pixels() {
    let pattern = test_pattern(3, 1, 16);

    assert_eq!(pattern, vec![0x00, 0x00, 0x80, 0x80, 0x00, 0x00]);
    assert_eq!(test_pattern(800, 480, 32).len(), 1_536_000);
    assert!(test_pattern(800, 480, 0).is_empty());
}

#[test]
fn rgb_png_decodes_to_opaque_rgba() {
    let png = encode_png(2, 1, ColorType::Rgb, &[255, 0, 0, 0, 0, 255]);

    let frame = Frame::from_png(&png).unwrap();

    assert_eq!((frame.width, frame.height), (2, 1));
    assert_eq!(frame.buffer, vec![255, 0, 0, 255, 0, 0, 255, 255]);
}

#[test]
fn grayscale_png_decodes_to_rgba() {
    let png = encode_png(1, 2, ColorType::Grayscale, &[10, 200]);

    let frame = Frame::from_png(&png).unwrap();

    assert_eq!(frame.buffer, vec![10, 10, 10, 255, 200, 200, 200, 255]);
}

#[test]
fn garbage_is_not_a_png() {
    assert!(Frame::from_png(b"definitely not a png").is_err());
}

#[test]
fn resize_uses_nearest_neighbour() {
    let frame = Frame {
        width: 2,
        height: 1,
        buffer: vec![1, 1, 1, 1, 2, 2, 2, 2],
    };

    let scaled = frame.resize(4, 2);

    assert_eq!((scaled.width, scaled.height), (4, 2));
    let row = [1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2];
    assert_eq!(&scaled.buffer[..16], &row);
    assert_eq!(&scaled.buffer[16..], &row);
    assert_eq!(scaled.resize(1, 1).buffer, vec![1, 1, 1, 1]);
}

#[test]
fn encode_packs_each_format() {
    let frame = Frame {
        width: 2,
        height: 1,
        buffer: vec![255, 0, 0, 255, 255, 255, 255, 128],
    };

    assert_eq!(frame.encode(PixelFormat::Rgba32), frame.buffer);
    assert_eq!(frame.encode(PixelFormat::Bgr565), vec![0x00, 0xF8, 0xFF, 0xFF]);
    assert_eq!(frame.encode(PixelFormat::L8), vec![54, 255]);
}
