// THEORY:
// The `Pixel` module is the lowest-level data container in the engine. It is a
// "dumb" record of one 8-bit RGB sample with no knowledge of where in the image
// it came from. Radiographs are conceptually grayscale, but uploads arrive as
// 3-channel images (scanners and phone cameras re-encode them), so the engine
// keeps the three channels around: the spread *between* them is itself a signal
// (a colorful image is almost certainly not an X-ray).
//
// The only derived quantity a pixel knows how to produce is its luminance, the
// fixed luma combination used everywhere grayscale is needed. Keeping the
// weights here, in one place, guarantees every module sees the same grayscale.

pub mod pixel {
    type Byte = u8;
    type Channel = Byte;
    type Luminance = f64;

    const CHANNELS: usize = 3;

    /// A "dumb" data container for a single 8-bit RGB sample.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// A gray sample replicated across all three channels.
        pub fn gray(intensity: Channel) -> Self {
            Pixel::new(intensity, intensity, intensity)
        }

        /// The luma combination used for every grayscale derivation in the engine.
        pub fn luminance(&self) -> Luminance {
            0.299 * self.red as f64 + 0.587 * self.green as f64 + 0.114 * self.blue as f64
        }

        /// Luminance rounded back into the 8-bit intensity domain.
        pub fn luminance_u8(&self) -> Channel {
            self.luminance().round().min(255.0) as Channel
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::Pixel;

    #[test]
    fn luminance_of_gray_is_identity() {
        let p = Pixel::gray(128);
        assert!((p.luminance() - 128.0).abs() < 1e-9);
        assert_eq!(p.luminance_u8(), 128);
    }

    #[test]
    fn luminance_weights_sum_to_one() {
        let white = Pixel::new(255, 255, 255);
        assert_eq!(white.luminance_u8(), 255);
    }

    #[test]
    fn pure_red_luminance() {
        let red = Pixel::new(255, 0, 0);
        // 0.299 * 255 = 76.245, rounds to 76.
        assert_eq!(red.luminance_u8(), 76);
    }
}
